//! Per-resource async fetch tracking with staleness guards.
//!
//! One `ResourceLoader` per logical resource kind (metrics, analyses, video
//! page, analytics, comments). Every `load` call takes a fresh sequence
//! ticket; when the fetch settles, the result is applied only if that ticket
//! is still the newest issued for the loader. A superseded response is
//! discarded on arrival — soft cancellation, no aborting of the underlying
//! transport call.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use pulse_proto::DashError;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchStatus<T> {
    #[default]
    Idle,
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> FetchStatus<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchStatus::Pending)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchStatus::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// Sequence ticket captured at issue time. Compared against the loader's
/// latest sequence at settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// What became of one `load` call.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    /// This call was still the newest when its fetch settled; the status now
    /// reflects the carried result.
    Fresh(Result<T, DashError>),
    /// A later call superseded this one; nothing was applied.
    Stale,
}

impl<T> LoadOutcome<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, LoadOutcome::Stale)
    }
}

struct State<T> {
    seq: u64,
    status: FetchStatus<T>,
}

pub struct ResourceLoader<T> {
    inner: Arc<Mutex<State<T>>>,
    label: &'static str,
}

impl<T> Clone for ResourceLoader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            label: self.label,
        }
    }
}

impl<T: Clone> ResourceLoader<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                seq: 0,
                status: FetchStatus::Idle,
            })),
            label,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // Recover the guard if a panicking test thread poisoned the lock.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issue a fresh ticket and mark the resource pending. Any in-flight
    /// fetch holding an older ticket is now stale.
    pub fn begin(&self) -> Ticket {
        let mut s = self.lock();
        s.seq += 1;
        s.status = FetchStatus::Pending;
        Ticket(s.seq)
    }

    /// Settle a fetch. This is the guaranteed finaliser: every completion
    /// path of `load` runs through here, so a current ticket always moves the
    /// status away from `Pending` — success and failure alike.
    pub fn settle(&self, ticket: Ticket, result: Result<T, DashError>) -> LoadOutcome<T> {
        let mut s = self.lock();
        if ticket.0 != s.seq {
            debug!(resource = self.label, "discarding stale response");
            return LoadOutcome::Stale;
        }
        match result {
            Ok(value) => {
                s.status = FetchStatus::Ready(value.clone());
                LoadOutcome::Fresh(Ok(value))
            }
            Err(err) => {
                s.status = FetchStatus::Failed(err.to_string());
                LoadOutcome::Fresh(Err(err))
            }
        }
    }

    /// Run one fetch under a fresh ticket: last-sequence-wins against any
    /// concurrent call on the same loader.
    pub async fn load<Fut>(&self, fetch: Fut) -> LoadOutcome<T>
    where
        Fut: Future<Output = Result<T, DashError>>,
    {
        let ticket = self.begin();
        let result = fetch.await;
        self.settle(ticket, result)
    }

    /// Drop any value and invalidate in-flight fetches (their responses will
    /// arrive stale).
    pub fn clear(&self) {
        let mut s = self.lock();
        s.seq += 1;
        s.status = FetchStatus::Idle;
    }

    pub fn status(&self) -> FetchStatus<T> {
        self.lock().status.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().status.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn success_and_failure_both_leave_pending() {
        let loader: ResourceLoader<u32> = ResourceLoader::new("test");
        assert_eq!(loader.status(), FetchStatus::Idle);

        let outcome = loader.load(async { Ok(7) }).await;
        assert!(matches!(outcome, LoadOutcome::Fresh(Ok(7))));
        assert_eq!(loader.status(), FetchStatus::Ready(7));

        let outcome = loader
            .load(async { Err(DashError::Transport("boom".into())) })
            .await;
        assert!(matches!(outcome, LoadOutcome::Fresh(Err(_))));
        assert!(matches!(loader.status(), FetchStatus::Failed(_)));
        assert!(!loader.is_pending());
    }

    #[tokio::test]
    async fn later_request_wins_over_slower_earlier_one() {
        let loader: ResourceLoader<&'static str> = ResourceLoader::new("details");
        let (tx_a, rx_a) = oneshot::channel::<()>();

        // A issued first, resolves only when released.
        let slow = {
            let loader = loader.clone();
            tokio::spawn(async move {
                loader
                    .load(async {
                        let _ = rx_a.await;
                        Ok("first click")
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        // B issued second, resolves immediately.
        let outcome = loader.load(async { Ok("second click") }).await;
        assert!(matches!(outcome, LoadOutcome::Fresh(Ok("second click"))));

        // Release A; its response must be discarded.
        let _ = tx_a.send(());
        let a_outcome = slow.await.unwrap();
        assert!(a_outcome.is_stale());
        assert_eq!(loader.status(), FetchStatus::Ready("second click"));
    }

    #[tokio::test]
    async fn stale_error_does_not_clobber_fresh_value() {
        let loader: ResourceLoader<u32> = ResourceLoader::new("metrics");
        let early = loader.begin();
        // A newer call lands and settles first.
        let outcome = loader.load(async { Ok(42) }).await;
        assert!(matches!(outcome, LoadOutcome::Fresh(Ok(42))));

        // The earlier fetch comes back with a failure; it must be ignored.
        let outcome = loader.settle(early, Err(DashError::Transport("late timeout".into())));
        assert!(outcome.is_stale());
        assert_eq!(loader.status(), FetchStatus::Ready(42));
    }

    #[tokio::test]
    async fn clear_invalidates_in_flight_ticket() {
        let loader: ResourceLoader<u32> = ResourceLoader::new("comments");
        let ticket = loader.begin();
        loader.clear();
        assert!(loader.settle(ticket, Ok(1)).is_stale());
        assert_eq!(loader.status(), FetchStatus::Idle);
    }
}
