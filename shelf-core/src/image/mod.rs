//! Image display pipeline
//!
//! A cover image goes through a fixed chain of tiers:
//! qualified provider URL, bounded retries with cache busting, one
//! deterministic fallback image and finally an inline placeholder that
//! cannot fail. [`ImagePipeline`] models the chain as a sans-IO state
//! machine; [`ImageSlot`] drives it against an [`ImageLoader`].

mod driver;
mod fallback;
mod loader;
mod pipeline;
mod placeholder;
mod qualifier;
mod retry;
mod visibility;

pub use driver::{ImageSlot, NoopListener, PipelineListener};
pub use fallback::{FallbackSelector, BOOK_COVER_FALLBACKS};
pub use loader::{ImageLoader, ScriptedLoader};
pub use pipeline::{
    AttemptOutcome, AttemptTicket, DisplayState, Effect, ImagePipeline, LoadAttempt, Resolution,
    Tier,
};
pub use placeholder::{Placeholder, UNAVAILABLE_TEXT};
pub use qualifier::{
    strip_transform_params, Qualifier, TransformHints, DEFAULT_PROVIDER_HOSTS, DEFAULT_QUALITY,
};
pub use retry::{cache_busted, RetryPolicy};
pub use visibility::{GateOptions, Rect, VisibilityGate};

use crate::config::PipelineConfig;
use crate::error::{Result, ShelfError};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A request to show one image in one display slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Source as given by the calling view, before qualification
    pub original_source: String,

    /// Alternative text for the image
    pub alt: String,

    pub width: Option<u32>,
    pub height: Option<u32>,

    /// Quality 0-100
    pub quality: Option<u8>,

    /// Above-the-fold images skip the visibility gate
    pub priority: bool,
}

impl ImageRequest {
    pub fn new(source: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            original_source: source.into(),
            alt: alt.into(),
            width: None,
            height: None,
            quality: None,
            priority: false,
        }
    }

    /// Set the display box
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the quality, clamped to 100
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality.min(100));
        self
    }

    /// Mark as a priority load
    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    /// Cover preset: 200x300 at quality 80
    pub fn book_cover(source: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new(source, alt).with_size(200, 300).with_quality(80)
    }

    /// Thumbnail preset: 100x150 at quality 70
    pub fn thumbnail(source: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new(source, alt).with_size(100, 150).with_quality(70)
    }

    pub fn hints(&self) -> TransformHints {
        TransformHints {
            width: self.width,
            height: self.height,
            quality: self.quality,
        }
    }
}

/// Source of wall-clock time for cache-busting parameters
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Everything a pipeline needs that is shared across display slots.
///
/// Built once and handed out behind an `Arc`; nothing in it changes after
/// construction.
#[derive(Debug)]
pub struct PipelineContext {
    pub qualifier: Qualifier,
    pub fallbacks: FallbackSelector,
    pub retry: RetryPolicy,
    pub gate: GateOptions,
    pub clock: Box<dyn Clock>,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self {
            qualifier: Qualifier::default(),
            fallbacks: FallbackSelector::default(),
            retry: RetryPolicy::default(),
            gate: GateOptions::default(),
            clock: Box::new(SystemClock),
        }
    }
}

impl PipelineContext {
    /// Build the runtime context from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let qualifier = Qualifier::new(config.provider_hosts.as_slice(), config.default_quality)
            .map_err(|e| ShelfError::Config(format!("invalid provider host: {}", e)))?;
        let fallbacks = FallbackSelector::new(config.fallback_images.iter().cloned())
            .ok_or_else(|| ShelfError::Config("fallback image list is empty".to_string()))?;

        Ok(Self {
            qualifier,
            fallbacks,
            retry: config.retry,
            gate: config.gate,
            clock: Box::new(SystemClock),
        })
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
