//! Engagement comparison math — one video against the channel average.
//!
//! Derived on every selection or metrics refresh, never persisted. All
//! divisions are total functions: a zero denominator yields a zero result,
//! never NaN or infinity.

use serde::Serialize;

use crate::api::{ChannelMetrics, VideoPerformance};

/// One tracked field compared against the channel average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldComparison {
    pub current: u64,
    pub average: f64,
    /// Rounded percent delta against the average; 0 when the average is 0
    /// (no direction bias on an empty channel).
    pub delta_pct: i64,
    /// True when the video is at or above the channel average.
    pub above_average: bool,
}

/// Per-1000-views rate, video vs. channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatePair {
    pub video: f64,
    pub channel: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngagementComparison {
    pub views: FieldComparison,
    pub likes: FieldComparison,
    pub comments: FieldComparison,
    pub likes_per_thousand: RatePair,
    pub comments_per_thousand: RatePair,
}

fn field(current: u64, average: f64) -> FieldComparison {
    let delta_pct = if average == 0.0 {
        0
    } else {
        ((current as f64 / average - 1.0) * 100.0).round() as i64
    };
    FieldComparison {
        current,
        average,
        delta_pct,
        above_average: current as f64 >= average,
    }
}

fn per_thousand(count: u64, views: u64) -> f64 {
    if views == 0 {
        0.0
    } else {
        count as f64 / views as f64 * 1000.0
    }
}

/// Channel-average per-video values derived from the wholesale totals.
/// A channel with zero videos averages to zero everywhere.
fn average(total: u64, videos: u64) -> f64 {
    if videos == 0 {
        0.0
    } else {
        total as f64 / videos as f64
    }
}

pub fn compare(perf: &VideoPerformance, metrics: &ChannelMetrics) -> EngagementComparison {
    let n = metrics.videos;
    EngagementComparison {
        views: field(perf.current_views, average(metrics.views, n)),
        likes: field(perf.current_likes, average(metrics.likes, n)),
        comments: field(perf.current_comments, average(metrics.comments, n)),
        likes_per_thousand: RatePair {
            video: per_thousand(perf.current_likes, perf.current_views),
            channel: per_thousand(metrics.likes, metrics.views),
        },
        comments_per_thousand: RatePair {
            video: per_thousand(perf.current_comments, perf.current_views),
            channel: per_thousand(metrics.comments, metrics.views),
        },
    }
}
