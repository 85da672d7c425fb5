//! Quota-gated, single-flight trigger for the full-analysis job.
//!
//! The counter is server-owned: after a confirmed run the gate re-reads
//! `/api/user` and adopts whatever the server reports, rather than
//! incrementing a local copy. Success does not imply increment — a prior
//! partial failure may have consumed the slot already.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use pulse_proto::api::{UserSnapshot, ANALYSIS_LIMIT};
use pulse_proto::DashError;
use tracing::{info, warn};

use crate::client::ApiClient;

#[derive(Debug, Clone)]
struct QuotaState {
    count: u32,
    limit: u32,
    last_analysis: Option<DateTime<Utc>>,
    busy: bool,
}

pub struct QuotaGate {
    api: Arc<ApiClient>,
    state: Mutex<QuotaState>,
}

impl QuotaGate {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: Mutex::new(QuotaState {
                count: 0,
                limit: ANALYSIS_LIMIT,
                last_analysis: None,
                busy: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QuotaState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adopt an authoritative `/api/user` snapshot (initial load or post-run
    /// re-read). A count above the limit is clamped so the invariant
    /// `count <= limit` holds even against a misbehaving server.
    pub fn seed(&self, user: &UserSnapshot) {
        let mut s = self.lock();
        if user.analysis_count > s.limit {
            warn!(
                count = user.analysis_count,
                limit = s.limit,
                "server reported a count above the limit; clamping"
            );
        }
        s.count = user.analysis_count.min(s.limit);
        s.last_analysis = user.last_analysis;
    }

    pub fn count(&self) -> u32 {
        self.lock().count
    }

    pub fn remaining(&self) -> u32 {
        let s = self.lock();
        s.limit - s.count
    }

    pub fn last_analysis(&self) -> Option<DateTime<Utc>> {
        self.lock().last_analysis
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn can_analyze(&self) -> bool {
        let s = self.lock();
        s.count < s.limit && !s.busy
    }

    /// True once any analysis has completed for this user.
    pub fn has_run(&self) -> bool {
        let s = self.lock();
        s.count > 0 || s.last_analysis.is_some()
    }

    /// Run the full-analysis job, single-flight.
    ///
    /// Local rejections (`QuotaExceeded`, `AlreadyInProgress`) happen before
    /// any network call. A second caller while one is in flight is rejected,
    /// never queued. On remote success the returned snapshot is the server's
    /// authoritative state, already adopted.
    pub async fn request_full_analysis(&self, channel: &str) -> Result<UserSnapshot, DashError> {
        {
            let mut s = self.lock();
            if s.count >= s.limit {
                return Err(DashError::QuotaExceeded);
            }
            if s.busy {
                return Err(DashError::AlreadyInProgress);
            }
            s.busy = true;
        }

        info!(channel, "starting full analysis");
        let outcome = self.run_remote(channel).await;

        let mut s = self.lock();
        s.busy = false;
        match outcome {
            Ok(user) => {
                if user.analysis_count > s.limit {
                    warn!(
                        count = user.analysis_count,
                        limit = s.limit,
                        "server reported a count above the limit; clamping"
                    );
                }
                s.count = user.analysis_count.min(s.limit);
                s.last_analysis = user.last_analysis;
                info!(count = s.count, "full analysis complete");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "full analysis failed; count unchanged");
                Err(e)
            }
        }
    }

    async fn run_remote(&self, channel: &str) -> Result<UserSnapshot, DashError> {
        self.api
            .analyze_channel_complete(channel)
            .await
            .map_err(DashError::for_analysis)?;
        // Authoritative re-read: trusting the server's counter avoids drift
        // when a confirmation response was lost on a previous attempt.
        self.api.user().await.map_err(DashError::for_analysis)
    }

    #[cfg(test)]
    pub(crate) fn force_busy(&self, busy: bool) {
        self.lock().busy = busy;
    }

    #[cfg(test)]
    pub(crate) fn force_count(&self, count: u32) {
        self.lock().count = count;
    }
}
