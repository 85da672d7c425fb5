#![allow(dead_code)]

//! In-process mock of the analysis collaborator API, bound to an ephemeral
//! port. Tests drive the real reqwest client against it and assert on
//! per-endpoint hit counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub struct MockState {
    /// Server-side analysis counter returned by `/api/user`.
    pub analysis_count: u32,
    pub last_analysis: Option<String>,
    /// Whether a completed analyze call bumps `analysis_count`. Leaving this
    /// false simulates the race where the server already charged the slot.
    pub analyze_increments: bool,
    pub analyze_delay: Duration,
    pub analyze_fails: bool,
    pub has_updates: bool,
    pub metrics: Value,
    /// Page payloads, 1-based: `pages[0]` answers `?page=1`.
    pub pages: Vec<Value>,
    pub analytics: HashMap<String, Value>,
    pub analytics_delay: HashMap<String, Duration>,
    pub comments: HashMap<String, Value>,
    pub analyses: Value,
    pub export_disposition: Option<String>,
    pub export_bytes: Vec<u8>,
    /// When set, requests must carry this x-access-token or get a 401.
    pub require_token: Option<String>,
    /// Analysis id of the last export request, for assertions.
    pub exported_id: Option<i64>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            analysis_count: 0,
            last_analysis: None,
            analyze_increments: true,
            analyze_delay: Duration::ZERO,
            analyze_fails: false,
            has_updates: false,
            metrics: json!({
                "subscribers": 1000, "videos": 4, "views": 400,
                "likes": 40, "comments": 20
            }),
            pages: Vec::new(),
            analytics: HashMap::new(),
            analytics_delay: HashMap::new(),
            comments: HashMap::new(),
            analyses: json!({ "analyses": [] }),
            export_disposition: None,
            export_bytes: b"csv-bytes".to_vec(),
            require_token: None,
            exported_id: None,
        }
    }
}

#[derive(Default)]
pub struct Hits {
    pub metrics: AtomicU32,
    pub user: AtomicU32,
    pub analyze: AtomicU32,
    pub check_updates: AtomicU32,
    pub videos: AtomicU32,
    pub analytics: AtomicU32,
    pub comments: AtomicU32,
    pub analyses: AtomicU32,
    pub export: AtomicU32,
}

impl Hits {
    pub fn analyze_count(&self) -> u32 {
        self.analyze.load(Ordering::SeqCst)
    }
}

pub struct MockCollab {
    pub base_url: String,
    pub state: Arc<Mutex<MockState>>,
    pub hits: Arc<Hits>,
}

#[derive(Clone)]
struct App {
    state: Arc<Mutex<MockState>>,
    hits: Arc<Hits>,
}

impl App {
    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_token(&self, headers: &HeaderMap) -> Result<(), Response> {
        let required = self.lock().require_token.clone();
        if let Some(required) = required {
            let presented = headers
                .get("x-access-token")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if presented != required {
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Token is invalid" })),
                )
                    .into_response());
            }
        }
        Ok(())
    }
}

pub async fn spawn(initial: MockState) -> MockCollab {
    let state = Arc::new(Mutex::new(initial));
    let hits = Arc::new(Hits::default());
    let app = App {
        state: Arc::clone(&state),
        hits: Arc::clone(&hits),
    };

    let router = Router::new()
        .route("/api/metrics", get(metrics))
        .route("/api/user", get(user))
        .route("/api/analyze-channel-complete", post(analyze))
        .route("/api/check-channel-updates", post(check_updates))
        .route("/api/videos", get(videos))
        .route("/api/videos/:id/analytics", get(analytics))
        .route("/api/videos/:id/comments", get(comments))
        .route("/api/analyses", get(analyses))
        .route("/api/export-analysis/:id", get(export))
        .with_state(app);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock collaborator");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    MockCollab {
        base_url: format!("http://{addr}"),
        state,
        hits,
    }
}

async fn metrics(State(app): State<App>, headers: HeaderMap) -> Response {
    app.hits.metrics.fetch_add(1, Ordering::SeqCst);
    if let Err(resp) = app.check_token(&headers) {
        return resp;
    }
    Json(app.lock().metrics.clone()).into_response()
}

async fn user(State(app): State<App>, headers: HeaderMap) -> Response {
    app.hits.user.fetch_add(1, Ordering::SeqCst);
    if let Err(resp) = app.check_token(&headers) {
        return resp;
    }
    let s = app.lock();
    Json(json!({
        "analysis_count": s.analysis_count,
        "last_analysis": s.last_analysis,
    }))
    .into_response()
}

async fn analyze(State(app): State<App>) -> Response {
    app.hits.analyze.fetch_add(1, Ordering::SeqCst);
    let (delay, fails, increments) = {
        let s = app.lock();
        (s.analyze_delay, s.analyze_fails, s.analyze_increments)
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if fails {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "analysis blew up" })),
        )
            .into_response();
    }
    let mut s = app.lock();
    if increments {
        s.analysis_count += 1;
    }
    s.last_analysis = Some("2025-06-01T10:00:00Z".to_string());
    Json(json!({ "message": "ok" })).into_response()
}

async fn check_updates(State(app): State<App>) -> Response {
    app.hits.check_updates.fetch_add(1, Ordering::SeqCst);
    let has_updates = app.lock().has_updates;
    Json(json!({ "has_updates": has_updates })).into_response()
}

async fn videos(State(app): State<App>, Query(params): Query<HashMap<String, String>>) -> Response {
    app.hits.videos.fetch_add(1, Ordering::SeqCst);
    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let s = app.lock();
    match s.pages.get(page.saturating_sub(1)) {
        Some(payload) => Json(payload.clone()).into_response(),
        None => Json(json!({ "videos": [], "pagination": { "pages": s.pages.len().max(1) } }))
            .into_response(),
    }
}

async fn analytics(State(app): State<App>, Path(id): Path<String>) -> Response {
    app.hits.analytics.fetch_add(1, Ordering::SeqCst);
    let (payload, delay) = {
        let s = app.lock();
        (
            s.analytics.get(&id).cloned(),
            s.analytics_delay.get(&id).copied().unwrap_or_default(),
        )
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    match payload {
        Some(p) => Json(p).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Video not found" })),
        )
            .into_response(),
    }
}

async fn comments(State(app): State<App>, Path(id): Path<String>) -> Response {
    app.hits.comments.fetch_add(1, Ordering::SeqCst);
    let payload = app.lock().comments.get(&id).cloned();
    match payload {
        Some(p) => Json(p).into_response(),
        None => Json(json!({ "success": true, "comments": [] })).into_response(),
    }
}

async fn analyses(State(app): State<App>) -> Response {
    app.hits.analyses.fetch_add(1, Ordering::SeqCst);
    Json(app.lock().analyses.clone()).into_response()
}

async fn export(State(app): State<App>, Path(id): Path<i64>) -> Response {
    app.hits.export.fetch_add(1, Ordering::SeqCst);
    let (disposition, bytes) = {
        let mut s = app.lock();
        s.exported_id = Some(id);
        (s.export_disposition.clone(), s.export_bytes.clone())
    };
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, "text/csv".parse().expect("header"));
    if let Some(d) = disposition {
        if let Ok(value) = d.parse() {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }
    (headers, bytes).into_response()
}

// ── Payload builders ─────────────────────────────────────────────────────────

pub fn video_json(id: &str, views: u64, likes: u64, comments: u64) -> Value {
    json!({
        "video_id": id,
        "title": format!("video {id}"),
        "views": views,
        "likes": likes,
        "comments": comments,
        "thumbnail": format!("https://img.example/vi/{id}/hqdefault.jpg"),
        "published_at": "2025-05-01T12:00:00Z",
    })
}

pub fn page_json(videos: Vec<Value>, pages: u32) -> Value {
    let per_page = videos.len();
    json!({
        "videos": videos,
        "pagination": { "pages": pages, "per_page": per_page },
    })
}

pub fn analytics_json(views: u64, likes: u64, comments: u64) -> Value {
    json!({
        "success": true,
        "engagement": {
            "labels": ["01/05/2025"],
            "datasets": [{ "label": "Views", "data": [views] }],
        },
        "sentiment": { "positive": 3, "neutral": 1, "negative": 1 },
        "performance": {
            "current_views": views,
            "current_likes": likes,
            "current_comments": comments,
        },
    })
}

pub fn analysis_summary_json(id: i64) -> Value {
    json!({
        "id": id,
        "channel_name": "somechannel",
        "date": "2025-06-01T10:00:00Z",
        "subscribers": 1000,
        "videos": 4,
        "views": 400,
        "comments": 20,
    })
}
