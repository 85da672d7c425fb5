//! New-content detection and the update-offer decision flow.
//!
//! A cheap remote query, no quota consumed. Three-phase machine:
//! Idle → Checking → { Idle | UpdatesOffered }. While an offer is pending the
//! poller ignores further polls; resolving the offer (accept or defer)
//! returns it to Idle.

use std::sync::{Arc, Mutex, MutexGuard};

use pulse_proto::api::UserSnapshot;
use pulse_proto::DashError;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::quota::QuotaGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Checking,
    UpdatesOffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nothing new since the last analysis; informational, no state change.
    NoNewContent,
    /// New content found; the poller now awaits accept or defer.
    UpdatesOffered,
    /// A check or an unresolved offer was already in progress.
    Ignored,
}

pub struct UpdatePoller {
    api: Arc<ApiClient>,
    phase: Mutex<UpdatePhase>,
}

impl UpdatePoller {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            phase: Mutex::new(UpdatePhase::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UpdatePhase> {
        self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn phase(&self) -> UpdatePhase {
        *self.lock()
    }

    /// Query the collaborator for content newer than the last analysis.
    /// Ignored unless the poller is idle.
    pub async fn check_for_updates(&self, channel: &str) -> Result<CheckOutcome, DashError> {
        {
            let mut p = self.lock();
            if *p != UpdatePhase::Idle {
                debug!(phase = ?*p, "update check ignored");
                return Ok(CheckOutcome::Ignored);
            }
            *p = UpdatePhase::Checking;
        }

        let result = self.api.check_channel_updates(channel).await;

        let mut p = self.lock();
        match result {
            Ok(true) => {
                info!(channel, "new content found since last analysis");
                *p = UpdatePhase::UpdatesOffered;
                Ok(CheckOutcome::UpdatesOffered)
            }
            Ok(false) => {
                *p = UpdatePhase::Idle;
                Ok(CheckOutcome::NoNewContent)
            }
            Err(e) => {
                *p = UpdatePhase::Idle;
                Err(e.for_update_check())
            }
        }
    }

    /// Resolve a pending offer by running the full analysis through the
    /// quota gate, then dismiss the offer. A concurrent accept that lost the
    /// race keeps the offer open for the winning call to dismiss.
    pub async fn accept_and_analyze(
        &self,
        quota: &QuotaGate,
        channel: &str,
    ) -> Result<UserSnapshot, DashError> {
        if *self.lock() != UpdatePhase::UpdatesOffered {
            return Err(DashError::UpdateCheckFailed(
                "no pending update offer".to_string(),
            ));
        }

        let result = quota.request_full_analysis(channel).await;
        match &result {
            Err(DashError::AlreadyInProgress) => {}
            _ => *self.lock() = UpdatePhase::Idle,
        }
        result
    }

    /// Dismiss a pending offer without analyzing. Returns whether there was
    /// one to dismiss.
    pub fn defer(&self) -> bool {
        let mut p = self.lock();
        if *p == UpdatePhase::UpdatesOffered {
            *p = UpdatePhase::Idle;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    pub(crate) fn force_phase(&self, phase: UpdatePhase) {
        *self.lock() = phase;
    }
}
