//! Authenticated client for the analysis collaborator API.
//!
//! The only module that talks HTTP. Status codes and schema violations are
//! mapped into `DashError` here, so the rest of the crate never sees a raw
//! transport error.

use std::time::Duration;

use pulse_proto::api::{
    AnalysesResponse, AnalysisSummary, AnalyticsResponse, ApiMessage, ChannelMetrics, Comment,
    CommentsResponse, UpdateCheck, UserSnapshot, VideoAnalytics, VideoPage, VideosResponse,
};
use pulse_proto::DashError;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

const TOKEN_HEADER: &str = "x-access-token";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Serialize)]
struct ChannelRequest<'a> {
    channel_name: &'a str,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DashError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashError::Transport(e.to_string()))?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            http,
            base_url,
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<Response, DashError> {
        debug!(path, "GET");
        let resp = self
            .http
            .get(self.url(path))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| DashError::Transport(e.to_string()))?;
        map_status(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DashError> {
        decode(self.get(path).await?).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DashError> {
        debug!(path, "POST");
        let resp = self
            .http
            .post(self.url(path))
            .header(TOKEN_HEADER, &self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| DashError::Transport(e.to_string()))?;
        decode(map_status(resp).await?).await
    }

    // ── Endpoints ─────────────────────────────────────────────────────────

    pub async fn metrics(&self) -> Result<ChannelMetrics, DashError> {
        self.get_json("/api/metrics").await
    }

    pub async fn user(&self) -> Result<UserSnapshot, DashError> {
        self.get_json("/api/user").await
    }

    /// Trigger the expensive full-analysis job. The response body is
    /// informational only; completion is confirmed by re-reading `/api/user`.
    pub async fn analyze_channel_complete(&self, channel_name: &str) -> Result<(), DashError> {
        let _: serde_json::Value = self
            .post_json("/api/analyze-channel-complete", &ChannelRequest { channel_name })
            .await?;
        Ok(())
    }

    pub async fn check_channel_updates(&self, channel_name: &str) -> Result<bool, DashError> {
        let check: UpdateCheck = self
            .post_json("/api/check-channel-updates", &ChannelRequest { channel_name })
            .await?;
        Ok(check.has_updates)
    }

    pub async fn videos(&self, page: u32, per_page: u32) -> Result<VideoPage, DashError> {
        let resp: VideosResponse = self
            .get_json(&format!("/api/videos?page={page}&per_page={per_page}"))
            .await?;
        Ok(VideoPage::from_response(resp, page))
    }

    pub async fn video_analytics(&self, video_id: &str) -> Result<VideoAnalytics, DashError> {
        let resp: AnalyticsResponse = self
            .get_json(&format!("/api/videos/{video_id}/analytics"))
            .await?;
        if !resp.success {
            return Err(DashError::NotFound(
                resp.message
                    .unwrap_or_else(|| "no analytics for this video".to_string()),
            ));
        }
        resp.into_analytics().ok_or_else(|| {
            DashError::Parse("analytics response missing engagement/sentiment/performance".into())
        })
    }

    pub async fn video_comments(&self, video_id: &str) -> Result<Vec<Comment>, DashError> {
        let resp: CommentsResponse = self
            .get_json(&format!("/api/videos/{video_id}/comments"))
            .await?;
        if !resp.success {
            return Err(DashError::NotFound(
                resp.message
                    .unwrap_or_else(|| "no comments for this video".to_string()),
            ));
        }
        Ok(resp.comments)
    }

    /// Completed analyses, most recent first.
    pub async fn analyses(&self) -> Result<Vec<AnalysisSummary>, DashError> {
        let resp: AnalysesResponse = self.get_json("/api/analyses").await?;
        Ok(resp.analyses)
    }

    /// Fetch the derived artifact for one analysis as opaque bytes, together
    /// with the raw Content-Disposition header when the server sent one.
    pub async fn export_analysis(&self, id: i64) -> Result<(Vec<u8>, Option<String>), DashError> {
        let resp = self.get(&format!("/api/export-analysis/{id}")).await?;
        let disposition = resp
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| DashError::Transport(e.to_string()))?
            .to_vec();
        Ok((bytes, disposition))
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, DashError> {
    resp.json::<T>()
        .await
        .map_err(|e| DashError::Parse(e.to_string()))
}

/// 401 means the session is gone; 404 carries the server's message for an
/// empty-state render; everything else non-2xx is a transport failure the
/// calling component folds into its own kind.
async fn map_status(resp: Response) -> Result<Response, DashError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = error_message(resp).await;
    match status {
        StatusCode::UNAUTHORIZED => Err(DashError::Unauthorized),
        StatusCode::NOT_FOUND => Err(DashError::NotFound(
            message.unwrap_or_else(|| "not available".to_string()),
        )),
        _ => Err(DashError::Transport(match message {
            Some(m) => format!("HTTP {}: {}", status.as_u16(), m),
            None => format!("HTTP {}", status.as_u16()),
        })),
    }
}

async fn error_message(resp: Response) -> Option<String> {
    let body = resp.bytes().await.ok()?;
    serde_json::from_slice::<ApiMessage>(&body).ok()?.message
}
