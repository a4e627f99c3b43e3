//! TTL + single-flight memoization for expensive pipeline lookups.
//!
//! Sits in front of the SERP collector and content extractor. Guarantees
//! at-most-one concurrent computation per key: the first caller becomes the
//! leader and runs the computation; concurrent callers for the same key await
//! the leader's result over a watch channel instead of duplicating the
//! external call. Failed computations are never committed, so the cache only
//! ever holds fully successful units.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use serpsmith_core::CacheMode;

/// Operation kinds with independently configured TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Serp,
    Extract,
    Analyze,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Serp => write!(f, "serp"),
            OperationKind::Extract => write!(f, "extract"),
            OperationKind::Analyze => write!(f, "analyze"),
        }
    }
}

/// Composite cache key: what was computed, for which subject (normalized
/// keyword or URL), under which tuning configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: OperationKind,
    pub subject: String,
    pub config_fingerprint: String,
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}@{}", self.kind, self.subject, self.config_fingerprint)
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("computation for {key} failed: {message}")]
    ComputeFailed { key: String, message: String },

    #[error("in-flight computation for {key} was dropped before completing")]
    Abandoned { key: String },
}

#[derive(Debug, Clone)]
enum FlightState<V> {
    Pending,
    Done(Result<V, String>),
}

enum Slot<V> {
    Ready { value: V, stored_at: Instant },
    InFlight(watch::Receiver<FlightState<V>>),
}

/// Shared TTL cache with single-flight coordination.
///
/// `V` is the cached value; clones are handed out, so values are expected to
/// be cheap to clone (or wrapped in `Arc` by the caller).
pub struct Cache<V> {
    mode: CacheMode,
    slots: Mutex<HashMap<CacheKey, Slot<V>>>,
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(mode: CacheMode) -> Self {
        Self {
            mode,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, computing it if absent or expired.
    ///
    /// Expired entries are treated as absent in [`CacheMode::Strict`]. In
    /// [`CacheMode::StaleWhileRevalidate`] a stale value is returned
    /// immediately and `compute` runs in the background to refresh the entry.
    ///
    /// A leader that is dropped before committing (caller task aborted, client
    /// disconnect) does not poison the key: waiters observe the closed flight,
    /// evict it, and the next caller computes fresh.
    ///
    /// # Errors
    ///
    /// - [`CacheError::ComputeFailed`] if the computation (this caller's or
    ///   the in-flight leader's) failed; nothing is cached in that case.
    /// - [`CacheError::Abandoned`] if this caller already consumed its
    ///   computation and the slot state is inconsistent; not reachable through
    ///   normal leader/follower interleavings.
    pub async fn get_or_compute<F, Fut>(
        self: &Arc<Self>,
        key: CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, String>> + Send + 'static,
    {
        let mut compute = Some(compute);
        loop {
            let mut rx = {
                let mut slots = self.slots.lock().await;
                match slots.get(&key) {
                    Some(Slot::Ready { value, stored_at }) if stored_at.elapsed() < ttl => {
                        tracing::debug!(key = %key, "cache hit");
                        return Ok(value.clone());
                    }
                    Some(Slot::Ready { value, .. })
                        if self.mode == CacheMode::StaleWhileRevalidate =>
                    {
                        tracing::debug!(key = %key, "stale cache hit, revalidating in background");
                        let stale = value.clone();
                        let Some(compute) = compute.take() else {
                            return Err(CacheError::Abandoned {
                                key: key.to_string(),
                            });
                        };
                        let (tx, rx) = watch::channel(FlightState::Pending);
                        slots.insert(key.clone(), Slot::InFlight(rx));
                        drop(slots);

                        let cache = Arc::clone(self);
                        let fut = compute();
                        tokio::spawn(async move {
                            let result = fut.await;
                            if let Err(message) = cache.commit(&key, result, &tx).await {
                                tracing::warn!(
                                    key = %key,
                                    error = %message,
                                    "background revalidation failed, stale entry evicted"
                                );
                            }
                        });
                        return Ok(stale);
                    }
                    Some(Slot::InFlight(rx)) => rx.clone(),
                    _ => {
                        // Absent or expired under strict mode: become the leader.
                        let Some(compute) = compute.take() else {
                            return Err(CacheError::Abandoned {
                                key: key.to_string(),
                            });
                        };
                        let (tx, rx) = watch::channel(FlightState::Pending);
                        slots.insert(key.clone(), Slot::InFlight(rx));
                        drop(slots);

                        let result = compute().await;
                        let committed = self.commit(&key, result, &tx).await;
                        return committed.map_err(|message| CacheError::ComputeFailed {
                            key: key.to_string(),
                            message,
                        });
                    }
                }
            };

            // Follower path: await the leader's outcome.
            tracing::debug!(key = %key, "awaiting in-flight computation");
            let outcome = loop {
                if let FlightState::Done(result) = rx.borrow().clone() {
                    break Some(result);
                }
                if rx.changed().await.is_err() {
                    break None;
                }
            };
            match outcome {
                Some(result) => {
                    return result.map_err(|message| CacheError::ComputeFailed {
                        key: key.to_string(),
                        message,
                    });
                }
                None => {
                    // The leader was dropped without committing. Evict the
                    // dead flight (unless a newer one replaced it) and retry.
                    tracing::debug!(key = %key, "in-flight leader dropped, retrying");
                    let mut slots = self.slots.lock().await;
                    if let Some(Slot::InFlight(current)) = slots.get(&key) {
                        if current.same_channel(&rx) {
                            slots.remove(&key);
                        }
                    }
                }
            }
        }
    }

    /// Commits a finished computation: successes become `Ready` entries,
    /// failures clear the slot so the next caller recomputes.
    async fn commit(
        &self,
        key: &CacheKey,
        result: Result<V, String>,
        tx: &watch::Sender<FlightState<V>>,
    ) -> Result<V, String> {
        let mut slots = self.slots.lock().await;
        match &result {
            Ok(value) => {
                slots.insert(
                    key.clone(),
                    Slot::Ready {
                        value: value.clone(),
                        stored_at: Instant::now(),
                    },
                );
            }
            Err(message) => {
                tracing::debug!(key = %key, error = %message, "computation failed, not cached");
                slots.remove(key);
            }
        }
        drop(slots);
        let _ = tx.send(FlightState::Done(result.clone()));
        result
    }

    /// Drops every entry. Intended for tests and administrative resets.
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }
}
