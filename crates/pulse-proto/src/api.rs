//! Wire schemas for the analysis collaborator's REST API.
//!
//! Every endpoint gets an explicit serde schema validated at the boundary.
//! A response that does not match is a parse error, never a silently
//! defaulted zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full analyses allowed per user. The server enforces the same limit; the
/// client checks it locally to refuse without a network round trip.
pub const ANALYSIS_LIMIT: u32 = 5;

/// Channel-wide totals, replaced wholesale after every successful analysis
/// or update check. `GET /api/metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub subscribers: u64,
    pub videos: u64,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

/// Authoritative per-user analysis state. `GET /api/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub analysis_count: u32,
    pub last_analysis: Option<DateTime<Utc>>,
}

/// `POST /api/check-channel-updates` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCheck {
    pub has_updates: bool,
}

/// One video as listed by `GET /api/videos`. Immutable once fetched for a
/// given page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub thumbnail: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    /// Total page count as computed by the server. This is the only page
    /// count the client trusts; it never recomputes pages from a total.
    pub pages: u32,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideosResponse {
    pub videos: Vec<Video>,
    pub pagination: Pagination,
}

/// One page of the channel's video list.
/// Invariant: `1 <= page <= total_pages` and `total_pages >= 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoPage {
    pub videos: Vec<Video>,
    pub page: u32,
    pub total_pages: u32,
}

impl VideoPage {
    /// Assemble a page from the wire response, trusting the server's page
    /// count. An empty channel reports `pages: 0`; normalise to the
    /// single-empty-page representation so the invariant holds.
    pub fn from_response(resp: VideosResponse, page: u32) -> Self {
        if resp.pagination.pages == 0 {
            tracing::debug!("server reported zero pages; normalising to one empty page");
        }
        let total_pages = resp.pagination.pages.max(1);
        Self {
            videos: resp.videos,
            page: page.clamp(1, total_pages),
            total_pages,
        }
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.videos.iter().any(|v| v.video_id == video_id)
    }
}

/// Comment sentiment label assigned by the analysis job. Unknown labels are
/// a schema violation, not a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// One analysed comment. `GET /api/videos/{id}/comments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub likes: u64,
    pub sentiment: Sentiment,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Engagement-over-time series for one video, one data point per analysis
/// run. Presentation extras in the payload (colors etc.) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<EngagementDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementDataset {
    pub label: String,
    pub data: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

/// Most recent observed statistics for one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoPerformance {
    pub current_views: u64,
    pub current_likes: u64,
    pub current_comments: u64,
}

/// `GET /api/videos/{id}/analytics` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalytics {
    pub engagement: EngagementSeries,
    pub sentiment: SentimentBreakdown,
    pub performance: VideoPerformance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub engagement: Option<EngagementSeries>,
    #[serde(default)]
    pub sentiment: Option<SentimentBreakdown>,
    #[serde(default)]
    pub performance: Option<VideoPerformance>,
}

impl AnalyticsResponse {
    /// A successful response must carry all three sections; anything less is
    /// a schema violation the caller turns into a parse error.
    pub fn into_analytics(self) -> Option<VideoAnalytics> {
        Some(VideoAnalytics {
            engagement: self.engagement?,
            sentiment: self.sentiment?,
            performance: self.performance?,
        })
    }
}

/// One completed analysis run. `GET /api/analyses`, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: i64,
    pub channel_name: String,
    pub date: DateTime<Utc>,
    pub subscribers: u64,
    pub videos: u64,
    pub views: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysesResponse {
    pub analyses: Vec<AnalysisSummary>,
}

/// Error body shape shared by all endpoints: `{"message": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}
