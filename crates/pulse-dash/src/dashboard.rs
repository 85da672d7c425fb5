//! Dashboard controller — wires the orchestration components together.
//!
//! The host shell drives this type and renders from its snapshots. Every
//! failure settles its loader and surfaces exactly one notice, so the shell
//! can never be left on a stuck loading indicator.

use std::sync::Arc;
use std::time::Duration;

use pulse_proto::api::ChannelMetrics;
use pulse_proto::config::Config;
use pulse_proto::engagement::{self, EngagementComparison};
use pulse_proto::DashError;
use tracing::debug;

use crate::client::ApiClient;
use crate::export::{ExportArtifact, Exporter};
use crate::notify::NotificationScheduler;
use crate::quota::QuotaGate;
use crate::resource::{FetchStatus, LoadOutcome, ResourceLoader};
use crate::selection::SelectionSync;
use crate::updates::{CheckOutcome, UpdatePoller};

/// Read-only session input owned by the host shell. Token issuance and
/// storage are the auth collaborator's concern.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub channel_name: String,
}

pub struct Dashboard {
    session: Session,
    pub quota: QuotaGate,
    pub updates: UpdatePoller,
    pub selection: SelectionSync,
    pub notices: NotificationScheduler,
    exporter: Exporter,
    metrics: ResourceLoader<ChannelMetrics>,
    api: Arc<ApiClient>,
}

impl Dashboard {
    pub fn new(config: &Config, session: Session) -> Result<Self, DashError> {
        let api = Arc::new(ApiClient::new(
            config.server.base_url.clone(),
            session.token.clone(),
            Duration::from_secs(config.server.timeout_secs),
        )?);
        Ok(Self {
            quota: QuotaGate::new(Arc::clone(&api)),
            updates: UpdatePoller::new(Arc::clone(&api)),
            selection: SelectionSync::new(Arc::clone(&api), config.videos.per_page),
            notices: NotificationScheduler::new(),
            exporter: Exporter::new(Arc::clone(&api)),
            metrics: ResourceLoader::new("channel_metrics"),
            api,
            session,
        })
    }

    /// Initial load: channel metrics and the authoritative quota snapshot,
    /// fetched concurrently.
    pub async fn bootstrap(&self) -> Result<(), DashError> {
        let (metrics, user) =
            futures_util::future::join(self.metrics.load(self.api.metrics()), self.api.user())
                .await;
        self.quota.seed(&user?);
        if let LoadOutcome::Fresh(Err(e)) = metrics {
            return Err(e);
        }
        Ok(())
    }

    pub fn metrics_status(&self) -> FetchStatus<ChannelMetrics> {
        self.metrics.status()
    }

    async fn reload_metrics(&self) {
        // Failures settle the loader into Failed; the triggering operation
        // has already surfaced its own notice.
        if let LoadOutcome::Fresh(Err(e)) = self.metrics.load(self.api.metrics()).await {
            debug!(error = %e, "metrics reload failed");
        }
    }

    /// Run the quota-gated full analysis and refresh the channel metrics.
    pub async fn run_full_analysis(&self) -> Result<(), DashError> {
        match self
            .quota
            .request_full_analysis(&self.session.channel_name)
            .await
        {
            Ok(_) => {
                self.reload_metrics().await;
                self.notices.success("Analysis complete");
                Ok(())
            }
            Err(e) => {
                self.notices.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Cheap new-content probe. A negative result is informational; a
    /// positive one leaves the poller awaiting `accept_updates` or
    /// `defer_updates` and refreshes the metrics snapshot.
    pub async fn check_updates(&self) -> Result<CheckOutcome, DashError> {
        match self
            .updates
            .check_for_updates(&self.session.channel_name)
            .await
        {
            Ok(CheckOutcome::NoNewContent) => {
                self.notices
                    .info("No new videos since the last analysis");
                Ok(CheckOutcome::NoNewContent)
            }
            Ok(CheckOutcome::UpdatesOffered) => {
                self.reload_metrics().await;
                Ok(CheckOutcome::UpdatesOffered)
            }
            Ok(CheckOutcome::Ignored) => Ok(CheckOutcome::Ignored),
            Err(e) => {
                self.notices.error(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn accept_updates(&self) -> Result<(), DashError> {
        match self
            .updates
            .accept_and_analyze(&self.quota, &self.session.channel_name)
            .await
        {
            Ok(_) => {
                self.reload_metrics().await;
                self.notices.success("Analysis complete");
                Ok(())
            }
            Err(e) => {
                self.notices.error(e.to_string());
                Err(e)
            }
        }
    }

    pub fn defer_updates(&self) -> bool {
        self.updates.defer()
    }

    pub async fn select_page(&self, page: u32) -> Result<(), DashError> {
        self.selection.select_page(page).await.map_err(|e| {
            self.notices.error(e.to_string());
            e
        })
    }

    pub async fn select_video(&self, video_id: &str) -> Result<bool, DashError> {
        self.selection.select_video(video_id).await.map_err(|e| {
            self.notices.error(e.to_string());
            e
        })
    }

    /// Comparison of the selected video against the channel average.
    /// Available once both the selection's analytics and the channel metrics
    /// are ready; recomputed on every call, never stored.
    pub fn engagement_comparison(&self) -> Option<EngagementComparison> {
        let analytics = self.selection.analytics_status();
        let metrics = self.metrics.status();
        match (analytics.ready(), metrics.ready()) {
            (Some(a), Some(m)) => Some(engagement::compare(&a.performance, m)),
            _ => None,
        }
    }

    pub async fn export_latest(&self) -> Result<ExportArtifact, DashError> {
        match self.exporter.export_latest(self.quota.count()).await {
            Ok(artifact) => {
                self.notices.success(format!("Export ready: {}", artifact.filename));
                Ok(artifact)
            }
            Err(e) => {
                self.notices.error(e.to_string());
                Err(e)
            }
        }
    }
}
