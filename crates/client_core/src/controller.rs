use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    browse::{BrowseState, PendingFetch, RequestToken},
    source::PostSource,
};

/// Drives [`BrowseState`] against a [`PostSource`].
///
/// Operations return as soon as the transition is recorded; fetches run on
/// spawned tasks and their results reach consumers through [`subscribe`].
/// Must be used from within a tokio runtime.
///
/// [`subscribe`]: RemoteCollectionController::subscribe
pub struct RemoteCollectionController {
    source: Arc<dyn PostSource>,
    state: watch::Sender<BrowseState>,
    discarded: AtomicU64,
}

impl RemoteCollectionController {
    pub fn new(source: Arc<dyn PostSource>, page_size: u32) -> Arc<Self> {
        let (state, _) = watch::channel(BrowseState::new(page_size));
        Arc::new(Self {
            source,
            state,
            discarded: AtomicU64::new(0),
        })
    }

    pub fn source(&self) -> &Arc<dyn PostSource> {
        &self.source
    }

    pub fn snapshot(&self) -> BrowseState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BrowseState> {
        self.state.subscribe()
    }

    /// Waits until no request is outstanding and returns the resulting state.
    pub async fn settled(&self) -> BrowseState {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|state| !state.is_loading())
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    /// Number of responses dropped because a newer request had been issued.
    pub fn discarded_responses(&self) -> u64 {
        self.discarded.load(Ordering::SeqCst)
    }

    pub fn load_page(self: &Arc<Self>, page: u32) -> RequestToken {
        self.issue(|state| state.begin_listing(page))
    }

    pub fn search(self: &Arc<Self>, query: &str) -> RequestToken {
        self.issue(|state| state.begin_search(query))
    }

    pub fn clear_search(self: &Arc<Self>) -> RequestToken {
        self.issue(BrowseState::begin_clear_search)
    }

    /// `None` when already on the last page or while searching.
    pub fn next_page(self: &Arc<Self>) -> Option<RequestToken> {
        self.issue_if(BrowseState::begin_next_page)
    }

    /// `None` when already on the first page or while searching.
    pub fn previous_page(self: &Arc<Self>) -> Option<RequestToken> {
        self.issue_if(BrowseState::begin_previous_page)
    }

    pub fn retry(self: &Arc<Self>) -> RequestToken {
        self.issue(BrowseState::begin_retry)
    }

    fn issue<F>(self: &Arc<Self>, transition: F) -> RequestToken
    where
        F: FnOnce(&mut BrowseState) -> PendingFetch,
    {
        self.issue_if(|state| Some(transition(state)))
            .unwrap_or_else(|| self.snapshot().latest_request())
    }

    fn issue_if<F>(self: &Arc<Self>, transition: F) -> Option<RequestToken>
    where
        F: FnOnce(&mut BrowseState) -> Option<PendingFetch>,
    {
        let mut pending = None;
        self.state.send_if_modified(|state| {
            pending = transition(state);
            pending.is_some()
        });
        let pending = pending?;
        self.dispatch(pending);
        Some(pending.token())
    }

    fn dispatch(self: &Arc<Self>, pending: PendingFetch) {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            match pending {
                PendingFetch::Page { token, query } => {
                    debug!(token = token.0, page = query.page, "browse: fetching page");
                    let result = controller.source.fetch_page(query).await;
                    controller.settle(token, |state| state.apply_page(token, result));
                }
                PendingFetch::Everything { token } => {
                    debug!(token = token.0, "browse: fetching collection for search");
                    let result = controller.source.fetch_all().await;
                    controller.settle(token, |state| state.apply_search(token, result));
                }
            }
        });
    }

    fn settle<F>(&self, token: RequestToken, apply: F)
    where
        F: FnOnce(&mut BrowseState) -> bool,
    {
        if self.state.send_if_modified(apply) {
            let state = self.state.borrow();
            match state.error() {
                Some(error) => warn!("browse: request {} failed: {error}", token.0),
                None => debug!(
                    token = token.0,
                    page = state.page(),
                    total_pages = state.total_pages(),
                    items = state.items().len(),
                    "browse: applied response"
                ),
            }
        } else {
            self.discarded.fetch_add(1, Ordering::SeqCst);
            debug!(token = token.0, "browse: discarded superseded response");
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
