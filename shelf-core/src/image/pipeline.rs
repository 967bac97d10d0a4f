//! Sans-IO state machine for one display slot

use super::{ImageRequest, PipelineContext, Placeholder, VisibilityGate};
use super::{cache_busted, Rect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a single load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    Pending,
    Success,
    Failure,
}

/// One load of one concrete URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadAttempt {
    /// 0 for the first primary load, counting up through retries and the fallback
    pub attempt_number: u32,

    /// URL actually requested; differs from the qualified URL only by
    /// cache-busting parameters on retries
    pub source_variant: String,

    pub outcome: AttemptOutcome,
}

impl LoadAttempt {
    fn pending(attempt_number: u32, source_variant: String) -> Self {
        Self {
            attempt_number,
            source_variant,
            outcome: AttemptOutcome::Pending,
        }
    }
}

/// Proof that a callback belongs to the attempt the pipeline is waiting on.
///
/// Tickets from a superseded or torn-down request never match again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptTicket {
    pub generation: u64,
    pub attempt: u32,
}

/// Which tier produced the displayed image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// The qualified source itself
    Primary,
    /// Degraded but resolved: the assigned fallback image
    Fallback,
    /// The inline placeholder
    Placeholder,
}

/// Terminal result of a load cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Logical source on display (the qualified URL for the primary tier)
    pub source: String,
    pub tier: Tier,
}

/// Current node of the display state machine
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    /// Gate open, nothing requested yet
    Idle,
    /// Waiting for the visibility gate
    Deferred,
    /// Primary source (or a retry of it) in flight
    Loading(LoadAttempt),
    /// Backing off before the next retry
    RetryPending { failures: u32, delay: Duration },
    /// Fallback image in flight
    LoadingFallback(LoadAttempt),
    /// Image shown from a network tier
    Displayed(Resolution),
    /// Every network tier failed
    Placeholder(Placeholder),
    /// Slot torn down; nothing changes any more
    Unmounted,
}

impl DisplayState {
    /// Whether a loading indicator should be shown
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            DisplayState::Loading(_)
                | DisplayState::RetryPending { .. }
                | DisplayState::LoadingFallback(_)
        )
    }

    /// Whether the cycle has reached a rendered end state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DisplayState::Displayed(_) | DisplayState::Placeholder(_) | DisplayState::Unmounted
        )
    }
}

/// Work the pipeline asks its driver to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start loading `url`; report back with `ticket`
    Load { ticket: AttemptTicket, url: String },

    /// Call `retry_elapsed(ticket)` after `delay`
    ScheduleRetry {
        ticket: AttemptTicket,
        delay: Duration,
    },

    /// Load-completion notification, fired once per cycle
    Loaded(Resolution),

    /// Error notification, fired only when the placeholder is reached
    Failed(Placeholder),
}

/// State machine for one display slot.
///
/// Callers feed platform events in and perform the returned [`Effect`]s.
/// Every failure moves to the next tier, so a cycle always ends in
/// [`DisplayState::Displayed`] or [`DisplayState::Placeholder`].
#[derive(Debug)]
pub struct ImagePipeline {
    ctx: Arc<PipelineContext>,
    request: ImageRequest,
    qualified: String,
    gate: VisibilityGate,
    generation: u64,
    state: DisplayState,
    failures: u32,
    history: Vec<LoadAttempt>,
}

impl ImagePipeline {
    pub fn new(request: ImageRequest, ctx: Arc<PipelineContext>) -> Self {
        let qualified = ctx
            .qualifier
            .qualify(&request.original_source, request.hints());
        let gate = VisibilityGate::new(request.priority, ctx.gate);
        let state = if gate.is_open() {
            DisplayState::Idle
        } else {
            DisplayState::Deferred
        };

        Self {
            ctx,
            request,
            qualified,
            gate,
            generation: 0,
            state,
            failures: 0,
            history: Vec::new(),
        }
    }

    pub fn request(&self) -> &ImageRequest {
        &self.request
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Qualified form of the request's source
    pub fn qualified_source(&self) -> &str {
        &self.qualified
    }

    /// Fallback assigned to the request's source
    pub fn fallback_source(&self) -> &str {
        self.ctx.fallbacks.select(&self.request.original_source)
    }

    /// Finished attempts of the current cycle, oldest first
    pub fn history(&self) -> &[LoadAttempt] {
        &self.history
    }

    /// Loads issued in the current cycle, including one still in flight
    pub fn attempts_made(&self) -> usize {
        let in_flight = matches!(
            self.state,
            DisplayState::Loading(_) | DisplayState::LoadingFallback(_)
        );
        self.history.len() + usize::from(in_flight)
    }

    /// Retries of the primary source issued so far
    pub fn retries_issued(&self) -> u32 {
        let primary = self
            .history
            .iter()
            .filter(|a| a.attempt_number <= self.ctx.retry.max_retries)
            .count() as u32;
        let in_flight = u32::from(matches!(self.state, DisplayState::Loading(_)));
        (primary + in_flight).saturating_sub(1)
    }

    pub fn is_gate_open(&self) -> bool {
        self.gate.is_open()
    }

    /// Report the element's position relative to the viewport.
    ///
    /// Returns `true` when this observation opened the gate; the slot is then
    /// ready for [`begin`](Self::begin).
    pub fn observe(&mut self, element: Rect, viewport: Rect) -> bool {
        if self.state == DisplayState::Unmounted {
            return false;
        }
        let opened = self.gate.observe(element, viewport);
        if opened {
            self.open_gate();
        }
        opened
    }

    /// Open the gate without a geometry check
    pub fn reveal(&mut self) {
        if self.state == DisplayState::Unmounted {
            return;
        }
        self.open_gate();
    }

    fn open_gate(&mut self) {
        if self.state == DisplayState::Deferred {
            tracing::debug!(source = %self.request.original_source, "visibility gate opened");
            self.state = DisplayState::Idle;
        }
    }

    /// Start the cycle. Does nothing unless the slot is idle with an open gate.
    pub fn begin(&mut self) -> Vec<Effect> {
        if self.state != DisplayState::Idle {
            return Vec::new();
        }
        tracing::debug!(
            source = %self.request.original_source,
            qualified = %self.qualified,
            "loading image"
        );
        let url = self.qualified.clone();
        self.issue_primary(0, url)
    }

    /// The attempt behind `ticket` loaded
    pub fn load_succeeded(&mut self, ticket: AttemptTicket) -> Vec<Effect> {
        if !self.is_current(ticket) {
            tracing::trace!(?ticket, "ignoring stale load completion");
            return Vec::new();
        }

        let (attempt, resolution) = match std::mem::replace(&mut self.state, DisplayState::Idle) {
            DisplayState::Loading(attempt) => (
                attempt,
                Resolution {
                    source: self.qualified.clone(),
                    tier: Tier::Primary,
                },
            ),
            DisplayState::LoadingFallback(attempt) => {
                let source = attempt.source_variant.clone();
                (
                    attempt,
                    Resolution {
                        source,
                        tier: Tier::Fallback,
                    },
                )
            }
            other => {
                self.state = other;
                return Vec::new();
            }
        };

        tracing::debug!(
            source = %resolution.source,
            tier = ?resolution.tier,
            attempt = attempt.attempt_number,
            "image loaded"
        );
        self.finish(attempt, AttemptOutcome::Success);
        self.state = DisplayState::Displayed(resolution.clone());
        vec![Effect::Loaded(resolution)]
    }

    /// The attempt behind `ticket` failed
    pub fn load_failed(&mut self, ticket: AttemptTicket) -> Vec<Effect> {
        if !self.is_current(ticket) {
            tracing::trace!(?ticket, "ignoring stale load failure");
            return Vec::new();
        }

        match std::mem::replace(&mut self.state, DisplayState::Idle) {
            DisplayState::Loading(attempt) => {
                tracing::warn!(
                    source = %attempt.source_variant,
                    attempt = attempt.attempt_number + 1,
                    max_retries = self.ctx.retry.max_retries,
                    "image load failed"
                );
                self.finish(attempt, AttemptOutcome::Failure);
                self.failures += 1;

                if self.ctx.retry.should_retry(self.failures) {
                    let delay = self.ctx.retry.delay_for(self.failures - 1);
                    self.state = DisplayState::RetryPending {
                        failures: self.failures,
                        delay,
                    };
                    return vec![Effect::ScheduleRetry {
                        ticket: self.ticket(self.failures),
                        delay,
                    }];
                }
                self.issue_fallback()
            }
            DisplayState::LoadingFallback(attempt) => {
                tracing::warn!(source = %attempt.source_variant, "fallback image failed");
                self.finish(attempt, AttemptOutcome::Failure);
                self.show_placeholder()
            }
            other => {
                self.state = other;
                Vec::new()
            }
        }
    }

    /// The backoff scheduled with `ticket` has elapsed
    pub fn retry_elapsed(&mut self, ticket: AttemptTicket) -> Vec<Effect> {
        let pending = match self.state {
            DisplayState::RetryPending { failures, .. } => failures,
            _ => {
                tracing::trace!(?ticket, "ignoring retry timer outside backoff");
                return Vec::new();
            }
        };
        if ticket.generation != self.generation || ticket.attempt != pending {
            tracing::trace!(?ticket, "ignoring stale retry timer");
            return Vec::new();
        }

        let url = cache_busted(&self.qualified, pending, self.ctx.clock.now_millis());
        tracing::debug!(source = %url, retry = pending, "retrying image");
        self.issue_primary(pending, url)
    }

    /// Replace the request. Outstanding tickets are invalidated and the slot
    /// starts over (deferred again unless the new request has priority).
    pub fn supersede(&mut self, request: ImageRequest) {
        if self.state == DisplayState::Unmounted {
            return;
        }
        tracing::debug!(
            old = %self.request.original_source,
            new = %request.original_source,
            "image request superseded"
        );
        let generation = self.generation + 1;
        *self = Self::new(request, Arc::clone(&self.ctx));
        self.generation = generation;
    }

    /// Tear the slot down; later callbacks are ignored
    pub fn teardown(&mut self) {
        if self.state != DisplayState::Unmounted {
            tracing::debug!(source = %self.request.original_source, "image slot torn down");
        }
        self.generation += 1;
        self.state = DisplayState::Unmounted;
    }

    fn ticket(&self, attempt: u32) -> AttemptTicket {
        AttemptTicket {
            generation: self.generation,
            attempt,
        }
    }

    fn is_current(&self, ticket: AttemptTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match &self.state {
            DisplayState::Loading(a) | DisplayState::LoadingFallback(a) => {
                a.attempt_number == ticket.attempt
            }
            _ => false,
        }
    }

    fn finish(&mut self, mut attempt: LoadAttempt, outcome: AttemptOutcome) {
        attempt.outcome = outcome;
        self.history.push(attempt);
    }

    fn issue_primary(&mut self, attempt_number: u32, url: String) -> Vec<Effect> {
        self.state = DisplayState::Loading(LoadAttempt::pending(attempt_number, url.clone()));
        vec![Effect::Load {
            ticket: self.ticket(attempt_number),
            url,
        }]
    }

    fn issue_fallback(&mut self) -> Vec<Effect> {
        let attempt_number = self.failures;
        let url = self.fallback_source().to_string();
        tracing::info!(
            source = %self.request.original_source,
            fallback = %url,
            "retries exhausted, switching to fallback image"
        );
        self.state = DisplayState::LoadingFallback(LoadAttempt::pending(attempt_number, url.clone()));
        vec![Effect::Load {
            ticket: self.ticket(attempt_number),
            url,
        }]
    }

    fn show_placeholder(&mut self) -> Vec<Effect> {
        let placeholder = Placeholder::new(
            self.request.width,
            self.request.height,
            &self.request.alt,
        );
        tracing::warn!(
            source = %self.request.original_source,
            "all image tiers failed, showing placeholder"
        );
        let resolution = Resolution {
            source: placeholder.to_data_uri(),
            tier: Tier::Placeholder,
        };
        self.state = DisplayState::Placeholder(placeholder.clone());
        vec![Effect::Loaded(resolution), Effect::Failed(placeholder)]
    }
}
