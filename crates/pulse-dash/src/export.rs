//! Export of the most recent completed analysis as a downloadable artifact.
//!
//! Stateless and idempotent per call; disabling re-entry while one export is
//! in flight is the host UI's job.

use std::sync::{Arc, OnceLock};

use pulse_proto::DashError;
use regex::Regex;
use tracing::info;

use crate::client::ApiClient;

/// Used when the server sends no usable Content-Disposition filename.
pub const DEFAULT_EXPORT_FILENAME: &str = "channel_analysis.csv";

/// Opaque artifact handed to the host environment's download mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct Exporter {
    api: Arc<ApiClient>,
}

impl Exporter {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch the newest analysis id and its derived artifact.
    ///
    /// `analyses_run` is the caller's quota count; when it is zero the call
    /// fails with `NoAnalysisAvailable` before any network I/O.
    pub async fn export_latest(&self, analyses_run: u32) -> Result<ExportArtifact, DashError> {
        if analyses_run == 0 {
            return Err(DashError::NoAnalysisAvailable);
        }

        let analyses = self.api.analyses().await.map_err(DashError::for_export)?;
        let latest = analyses.first().ok_or(DashError::NoAnalysisAvailable)?;

        let (bytes, disposition) = self
            .api
            .export_analysis(latest.id)
            .await
            .map_err(DashError::for_export)?;

        let filename = disposition
            .as_deref()
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string());

        info!(analysis_id = latest.id, filename, size = bytes.len(), "export ready");
        Ok(ExportArtifact { filename, bytes })
    }
}

/// Extract the suggested filename from a Content-Disposition header.
/// Quotes are optional; a malformed or empty value yields `None` and the
/// caller falls back to the fixed default.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"filename="?([^";]+)"?"#).expect("filename pattern is valid")
    });
    let name = re.captures(header)?.get(1)?.as_str().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
