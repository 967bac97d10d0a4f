//! Image pipeline commands: qualify, fallback and a simulated resolve

use super::pipeline_context;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use shelf_core::image::{
    strip_transform_params, LoadAttempt, Placeholder, PipelineListener, RetryPolicy,
    ScriptedLoader, TransformHints,
};
use shelf_core::{ImagePipeline, ImageRequest, ImageSlot, Resolution, Tier};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Flags for `resolve`
pub struct ResolveOptions {
    pub alt: String,
    pub fail: u32,
    pub fail_fallback: bool,
    pub base_delay_ms: Option<u64>,
    pub json: bool,
}

/// Resolve output
#[derive(Serialize)]
struct ResolveReport {
    qualified: String,
    fallback: String,
    attempts: Vec<LoadAttempt>,
    resolution: Option<Resolution>,
}

/// Print the qualified (or stripped) form of a source
pub fn qualify(
    source: &str,
    width: Option<u32>,
    height: Option<u32>,
    quality: Option<u8>,
    strip: bool,
    config: Option<&Path>,
) -> Result<()> {
    let ctx = pipeline_context(config)?;

    let output = if strip {
        strip_transform_params(&ctx.qualifier, source)
    } else {
        if !ctx.qualifier.is_provider_url(source) {
            tracing::info!("Not a known image provider, leaving the URL unchanged");
        }
        ctx.qualifier.qualify(
            source,
            TransformHints {
                width,
                height,
                quality,
            },
        )
    };

    println!("{}", output);
    Ok(())
}

/// Print the fallback image a source would degrade to
pub fn fallback(source: &str, config: Option<&Path>) -> Result<()> {
    let ctx = pipeline_context(config)?;
    println!("{}", ctx.fallbacks.select(source));
    Ok(())
}

/// Reports terminal events through the spinner
struct SpinnerListener {
    pb: ProgressBar,
}

impl PipelineListener for SpinnerListener {
    fn on_loaded(&self, resolution: &Resolution) {
        tracing::debug!(tier = ?resolution.tier, "image displayed");
        self.pb.set_message("Displayed");
    }

    fn on_error(&self, placeholder: &Placeholder) {
        tracing::warn!("{}", placeholder.alt);
    }
}

/// Drive a book cover through the pipeline against a scripted loader
pub async fn resolve(source: &str, options: ResolveOptions, config: Option<&Path>) -> Result<()> {
    let mut ctx = pipeline_context(config)?;
    if let Some(ms) = options.base_delay_ms {
        let policy = RetryPolicy::new(ctx.retry.max_retries, Duration::from_millis(ms));
        ctx = ctx.with_retry(policy);
    }
    let ctx = Arc::new(ctx);

    let request = ImageRequest::book_cover(source, options.alt.as_str()).with_priority(true);
    let pipeline = ImagePipeline::new(request, Arc::clone(&ctx));
    let qualified = pipeline.qualified_source().to_string();
    let fallback = pipeline.fallback_source().to_string();

    let mut loader = ScriptedLoader::new();
    if options.fail > 0 {
        loader = loader.fail_times(qualified.as_str(), options.fail);
    }
    if options.fail_fallback {
        loader = loader.always_fail(fallback.as_str());
    }

    // Set up spinner
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Loading image...");

    let slot = ImageSlot::new(pipeline);
    let listener = SpinnerListener { pb: pb.clone() };
    let resolution = slot.run(&loader, &listener).await;
    pb.finish_and_clear();

    let report = ResolveReport {
        qualified,
        fallback,
        attempts: slot.history().await,
        resolution,
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Qualified:  {}", report.qualified);
    for attempt in &report.attempts {
        println!(
            "Attempt {}:  {:?}  {}",
            attempt.attempt_number, attempt.outcome, attempt.source_variant
        );
    }
    match &report.resolution {
        Some(resolution) => match resolution.tier {
            Tier::Primary => println!("Displayed:  primary  {}", resolution.source),
            Tier::Fallback => println!("Displayed:  fallback  {}", resolution.source),
            Tier::Placeholder => println!("Displayed:  placeholder ({})", options.alt),
        },
        None => println!("Displayed:  nothing"),
    }

    Ok(())
}
