use thiserror::Error;

/// Error taxonomy for the orchestration layer.
///
/// Transport and schema failures are converted into one of these kinds at the
/// operation boundary; a raw `reqwest`/`serde` error never escapes a
/// component. `QuotaExceeded`, `AlreadyInProgress` and `NoAnalysisAvailable`
/// are local precondition rejections raised before any I/O.
#[derive(Debug, Error)]
pub enum DashError {
    /// 401 from any endpoint. The host shell clears the session and redirects
    /// to its login entry point.
    #[error("session expired or invalid, sign in again")]
    Unauthorized,

    /// 404 with the server-provided message when one parses.
    #[error("{0}")]
    NotFound(String),

    #[error("analysis limit reached")]
    QuotaExceeded,

    #[error("an analysis is already running")]
    AlreadyInProgress,

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("update check failed: {0}")]
    UpdateCheckFailed(String),

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("no completed analysis to export")]
    NoAnalysisAvailable,

    /// Response arrived but did not match the endpoint schema.
    #[error("malformed response from server: {0}")]
    Parse(String),

    /// Network-level failure (connect, timeout, non-2xx without a mapped kind).
    #[error("request failed: {0}")]
    Transport(String),
}

impl DashError {
    fn payload(self) -> Result<String, DashError> {
        match self {
            DashError::Transport(msg) | DashError::Parse(msg) => Ok(msg),
            other => Err(other),
        }
    }

    /// Fold transport/schema failures into `AnalysisFailed`; auth, not-found
    /// and local rejections pass through untouched.
    pub fn for_analysis(self) -> Self {
        self.payload().map_or_else(|e| e, DashError::AnalysisFailed)
    }

    /// Fold transport/schema failures into `UpdateCheckFailed`.
    pub fn for_update_check(self) -> Self {
        self.payload().map_or_else(|e| e, DashError::UpdateCheckFailed)
    }

    /// Fold transport/schema failures into `ExportFailed`.
    pub fn for_export(self) -> Self {
        self.payload().map_or_else(|e| e, DashError::ExportFailed)
    }
}
