//! Keeps the paginated video list and the detailed selection consistent.
//!
//! The selection is a weak reference (id) into the most recently fetched
//! page. A refresh that drops the selected id falls back to the first item
//! of the new page (or none when empty) — a stale id is never retained.
//! Detail fetches ride their own loaders, so a rapid double-click cannot let
//! the first click's slower response overwrite the second click's state.

use std::sync::{Arc, Mutex, MutexGuard};

use pulse_proto::api::{Comment, Video, VideoAnalytics, VideoPage};
use pulse_proto::DashError;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::resource::{FetchStatus, LoadOutcome, ResourceLoader};

struct ListState {
    page: u32,
    total_pages: u32,
    videos: Vec<Video>,
    selected: Option<String>,
}

pub struct SelectionSync {
    api: Arc<ApiClient>,
    per_page: u32,
    pages: ResourceLoader<VideoPage>,
    analytics: ResourceLoader<VideoAnalytics>,
    comments: ResourceLoader<Vec<Comment>>,
    state: Mutex<ListState>,
}

/// Decide what the selection becomes after a page refresh: kept when the id
/// survived, first item otherwise, none on an empty page. The bool reports
/// whether a detail re-fetch is needed.
fn reconcile_selection(previous: Option<&str>, videos: &[Video]) -> (Option<String>, bool) {
    if let Some(id) = previous {
        if videos.iter().any(|v| v.video_id == id) {
            return (Some(id.to_string()), false);
        }
    }
    match videos.first() {
        Some(v) => (Some(v.video_id.clone()), true),
        None => (None, previous.is_some()),
    }
}

impl SelectionSync {
    pub fn new(api: Arc<ApiClient>, per_page: u32) -> Self {
        Self {
            api,
            per_page,
            pages: ResourceLoader::new("video_page"),
            analytics: ResourceLoader::new("video_analytics"),
            comments: ResourceLoader::new("video_comments"),
            state: Mutex::new(ListState {
                page: 1,
                total_pages: 1,
                videos: Vec::new(),
                selected: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn selected_id(&self) -> Option<String> {
        self.lock().selected.clone()
    }

    pub fn selected_video(&self) -> Option<Video> {
        let s = self.lock();
        let id = s.selected.as_deref()?;
        s.videos.iter().find(|v| v.video_id == id).cloned()
    }

    pub fn videos(&self) -> Vec<Video> {
        self.lock().videos.clone()
    }

    /// `(page, total_pages)` of the most recently applied fetch.
    pub fn page_position(&self) -> (u32, u32) {
        let s = self.lock();
        (s.page, s.total_pages)
    }

    pub fn page_status(&self) -> FetchStatus<VideoPage> {
        self.pages.status()
    }

    pub fn analytics_status(&self) -> FetchStatus<VideoAnalytics> {
        self.analytics.status()
    }

    pub fn comments_status(&self) -> FetchStatus<Vec<Comment>> {
        self.comments.status()
    }

    /// Fetch a page (clamped to the known range) and reconcile the selection
    /// against its items.
    pub async fn select_page(&self, page: u32) -> Result<(), DashError> {
        let target = {
            let s = self.lock();
            page.clamp(1, s.total_pages)
        };

        match self.pages.load(self.api.videos(target, self.per_page)).await {
            LoadOutcome::Stale => Ok(()),
            LoadOutcome::Fresh(Err(e)) => Err(e),
            LoadOutcome::Fresh(Ok(fetched)) => {
                let refetch = {
                    let mut s = self.lock();
                    let (selected, changed) =
                        reconcile_selection(s.selected.as_deref(), &fetched.videos);
                    if changed {
                        debug!(previous = ?s.selected, now = ?selected, "selection reconciled after page refresh");
                    }
                    s.page = fetched.page;
                    s.total_pages = fetched.total_pages;
                    s.videos = fetched.videos;
                    s.selected = selected.clone();
                    changed.then_some(selected)
                };
                match refetch {
                    // Selection survived the refresh; details stay valid.
                    None => Ok(()),
                    Some(Some(id)) => self.fetch_details(&id).await,
                    Some(None) => {
                        self.analytics.clear();
                        self.comments.clear();
                        Ok(())
                    }
                }
            }
        }
    }

    /// Select one video of the current page and fetch its details. An id not
    /// on the current page is a caller bug; it is ignored with a warning.
    pub async fn select_video(&self, video_id: &str) -> Result<bool, DashError> {
        {
            let mut s = self.lock();
            if !s.videos.iter().any(|v| v.video_id == video_id) {
                warn!(video_id, "selection ignored: id not on the current page");
                return Ok(false);
            }
            s.selected = Some(video_id.to_string());
        }
        self.fetch_details(video_id).await?;
        Ok(true)
    }

    /// Detail fetches under fresh tickets; both loaders settle independently
    /// and stale responses are discarded on arrival.
    async fn fetch_details(&self, video_id: &str) -> Result<(), DashError> {
        let (analytics, comments) = futures_util::future::join(
            self.analytics.load(self.api.video_analytics(video_id)),
            self.comments.load(self.api.video_comments(video_id)),
        )
        .await;
        if let LoadOutcome::Fresh(Err(e)) = analytics {
            return Err(e);
        }
        if let LoadOutcome::Fresh(Err(e)) = comments {
            return Err(e);
        }
        Ok(())
    }
}
