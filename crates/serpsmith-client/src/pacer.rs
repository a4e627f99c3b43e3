//! Minimum-interval pacing per endpoint class.
//!
//! Each class keeps the instant of its last dispatch behind an async mutex.
//! A caller that arrives early sleeps until the class is eligible while still
//! holding the lock, so concurrent callers serialize in arrival order. Calls
//! are delayed, never dropped or reordered.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use serpsmith_core::RateIntervals;

use crate::error::ApiError;

/// Outbound endpoint classes with independent pacing intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    Serp,
    Generative,
    Scrape,
    Nlp,
}

impl std::fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointClass::Serp => write!(f, "serp"),
            EndpointClass::Generative => write!(f, "generative"),
            EndpointClass::Scrape => write!(f, "scrape"),
            EndpointClass::Nlp => write!(f, "nlp"),
        }
    }
}

struct Slot {
    interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl Slot {
    fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            last_dispatch: Mutex::new(None),
        }
    }
}

/// Shared dispatch pacer. One instance is owned by the [`crate::ApiClient`]
/// and injected everywhere; no ambient static state, so tests can drive it
/// under a paused tokio clock.
pub struct Pacer {
    serp: Slot,
    generative: Slot,
    scrape: Slot,
    nlp: Slot,
}

impl Pacer {
    #[must_use]
    pub fn new(intervals: &RateIntervals) -> Self {
        Self {
            serp: Slot::new(intervals.serp_ms),
            generative: Slot::new(intervals.generative_ms),
            scrape: Slot::new(intervals.scrape_ms),
            nlp: Slot::new(intervals.nlp_ms),
        }
    }

    fn slot(&self, class: EndpointClass) -> &Slot {
        match class {
            EndpointClass::Serp => &self.serp,
            EndpointClass::Generative => &self.generative,
            EndpointClass::Scrape => &self.scrape,
            EndpointClass::Nlp => &self.nlp,
        }
    }

    /// Blocks until `class` is eligible for dispatch, then records the
    /// dispatch instant. The slot lock is held across the wait so callers
    /// serialize; tokio's mutex queues them fairly in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Cancelled`] if `cancel` fires while waiting.
    pub async fn acquire(
        &self,
        class: EndpointClass,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let slot = self.slot(class);
        let mut last = slot.last_dispatch.lock().await;

        if let Some(prev) = *last {
            let eligible_at = prev + slot.interval;
            if eligible_at > Instant::now() {
                tokio::select! {
                    () = tokio::time::sleep_until(eligible_at) => {}
                    () = cancel.cancelled() => return Err(ApiError::Cancelled),
                }
            }
        }

        *last = Some(Instant::now());
        Ok(())
    }
}
