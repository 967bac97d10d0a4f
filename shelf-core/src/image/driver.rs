//! Async driver that performs pipeline effects

use super::{
    DisplayState, Effect, ImageLoader, ImagePipeline, ImageRequest, LoadAttempt, Placeholder, Rect,
    Resolution,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Notifications exposed to the calling view
pub trait PipelineListener: Send + Sync {
    /// A terminal image (primary, fallback or placeholder) is on display
    fn on_loaded(&self, _resolution: &Resolution) {}

    /// Every network tier failed and the placeholder is on display
    fn on_error(&self, _placeholder: &Placeholder) {}
}

/// Listener that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl PipelineListener for NoopListener {}

/// Shared handle to one display slot.
///
/// `run` drives the pipeline; `observe`, `supersede` and `teardown` may be
/// called from other tasks while it runs. Callbacks that arrive after a
/// teardown or supersede are dropped by the pipeline itself.
#[derive(Clone)]
pub struct ImageSlot {
    pipeline: Arc<Mutex<ImagePipeline>>,
    wake: Arc<Notify>,
}

impl ImageSlot {
    pub fn new(pipeline: ImagePipeline) -> Self {
        Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Snapshot of the current display state
    pub async fn state(&self) -> DisplayState {
        self.pipeline.lock().await.state().clone()
    }

    /// Finished attempts of the current cycle
    pub async fn history(&self) -> Vec<LoadAttempt> {
        self.pipeline.lock().await.history().to_vec()
    }

    /// Feed a visibility observation
    pub async fn observe(&self, element: Rect, viewport: Rect) -> bool {
        let opened = self.pipeline.lock().await.observe(element, viewport);
        if opened {
            self.wake.notify_one();
        }
        opened
    }

    /// Open the gate unconditionally
    pub async fn reveal(&self) {
        self.pipeline.lock().await.reveal();
        self.wake.notify_one();
    }

    /// Replace the request. The current `run` winds down; call `run` again to
    /// drive the new one.
    pub async fn supersede(&self, request: ImageRequest) {
        self.pipeline.lock().await.supersede(request);
        self.wake.notify_one();
    }

    /// Unmount the slot
    pub async fn teardown(&self) {
        self.pipeline.lock().await.teardown();
        self.wake.notify_one();
    }

    /// Drive the pipeline until its cycle ends or is cancelled.
    ///
    /// Waits for the visibility gate first. Returns the terminal resolution,
    /// or `None` if the slot was torn down or superseded before resolving.
    pub async fn run(
        &self,
        loader: &dyn ImageLoader,
        listener: &dyn PipelineListener,
    ) -> Option<Resolution> {
        let mut queue: VecDeque<Effect> = loop {
            {
                let mut pipeline = self.pipeline.lock().await;
                if *pipeline.state() == DisplayState::Idle {
                    break pipeline.begin().into();
                }
                if *pipeline.state() != DisplayState::Deferred {
                    return None;
                }
            }
            self.wake.notified().await;
        };

        let mut resolved = None;
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Load { ticket, url } => {
                    let outcome = loader.load(&url).await;
                    let mut pipeline = self.pipeline.lock().await;
                    let next = match outcome {
                        Ok(()) => pipeline.load_succeeded(ticket),
                        Err(e) => {
                            tracing::debug!(url = %url, error = %e, "load attempt failed");
                            pipeline.load_failed(ticket)
                        }
                    };
                    queue.extend(next);
                }
                Effect::ScheduleRetry { ticket, delay } => {
                    tokio::time::sleep(delay).await;
                    queue.extend(self.pipeline.lock().await.retry_elapsed(ticket));
                }
                Effect::Loaded(resolution) => {
                    listener.on_loaded(&resolution);
                    resolved = Some(resolution);
                }
                Effect::Failed(placeholder) => listener.on_error(&placeholder),
            }
        }
        resolved
    }
}
