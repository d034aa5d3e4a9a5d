//! Browsing state over the remote post collection.
//!
//! Every user action is a pure transition on [`BrowseState`] that issues a
//! [`RequestToken`] and describes the fetch to run ([`PendingFetch`]). A fetch
//! result is applied only when its token is still the latest one issued, so a
//! slow response can never overwrite the outcome of a later action.

use shared::{
    domain::Post,
    protocol::{total_pages, PageQuery, PostPage},
};

use crate::error::NetworkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseMode {
    /// Paged listing of the last applied response; `1 <= page <= total_pages`
    /// always holds.
    Listing { page: u32, total_pages: u32 },
    /// Search results are a single unpaged page.
    Searching { query: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Fetch that a transition asks the caller to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingFetch {
    Page { token: RequestToken, query: PageQuery },
    Everything { token: RequestToken },
}

impl PendingFetch {
    pub fn token(&self) -> RequestToken {
        match self {
            Self::Page { token, .. } | Self::Everything { token } => *token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseState {
    mode: BrowseMode,
    items: Vec<Post>,
    page_size: u32,
    phase: Phase,
    error: Option<String>,
    last_query: String,
    total_count: Option<u64>,
    /// Listing page of the latest request; committed to `mode` on success.
    requested_page: u32,
    latest_request: RequestToken,
}

impl BrowseState {
    pub fn new(page_size: u32) -> Self {
        Self {
            mode: BrowseMode::Listing {
                page: 1,
                total_pages: 1,
            },
            items: Vec::new(),
            page_size: page_size.max(1),
            phase: Phase::Idle,
            error: None,
            last_query: String::new(),
            total_count: None,
            requested_page: 1,
            latest_request: RequestToken::default(),
        }
    }

    pub fn mode(&self) -> &BrowseMode {
        &self.mode
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.mode, BrowseMode::Searching { .. })
    }

    pub fn items(&self) -> &[Post] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        match self.mode {
            BrowseMode::Listing { page, .. } => page,
            BrowseMode::Searching { .. } => 1,
        }
    }

    pub fn total_pages(&self) -> u32 {
        match self.mode {
            BrowseMode::Listing { total_pages, .. } => total_pages,
            BrowseMode::Searching { .. } => 1,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    /// Total reported by the last applied response.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn latest_request(&self) -> RequestToken {
        self.latest_request
    }

    /// Listing page asked for by the latest request, which may differ from
    /// [`page`](Self::page) while loading or after a failure.
    pub fn requested_page(&self) -> u32 {
        self.requested_page
    }

    pub fn has_next(&self) -> bool {
        !self.is_searching() && self.page() < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        !self.is_searching() && self.page() > 1
    }

    pub fn shows_pagination(&self) -> bool {
        !self.is_searching() && self.total_pages() > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn issue(&mut self) -> RequestToken {
        self.latest_request = RequestToken(self.latest_request.0 + 1);
        self.latest_request
    }

    fn start_loading(&mut self) {
        self.phase = Phase::Loading;
        self.error = None;
    }

    /// Switches to listing and requests `page` (0 is treated as 1). Items and
    /// pagination stay at the last applied response until the new one arrives.
    pub fn begin_listing(&mut self, page: u32) -> PendingFetch {
        let page = page.max(1);
        if self.is_searching() {
            self.mode = BrowseMode::Listing {
                page: 1,
                total_pages: 1,
            };
        }
        self.requested_page = page;
        self.start_loading();
        PendingFetch::Page {
            token: self.issue(),
            query: PageQuery {
                page,
                limit: self.page_size,
            },
        }
    }

    /// Leaves search mode and reloads the first page.
    pub fn begin_clear_search(&mut self) -> PendingFetch {
        self.last_query.clear();
        self.begin_listing(1)
    }

    /// A blank query clears the search instead.
    pub fn begin_search(&mut self, query: &str) -> PendingFetch {
        if query.trim().is_empty() {
            return self.begin_clear_search();
        }

        self.last_query = query.to_string();
        self.mode = BrowseMode::Searching {
            query: query.to_string(),
        };
        self.start_loading();
        PendingFetch::Everything {
            token: self.issue(),
        }
    }

    /// Page that relative navigation starts from: the one in flight while
    /// loading, otherwise the one shown.
    fn navigation_base(&self) -> u32 {
        if self.is_loading() {
            self.requested_page.min(self.total_pages())
        } else {
            self.page()
        }
    }

    /// `None` while searching or on the last page.
    pub fn begin_next_page(&mut self) -> Option<PendingFetch> {
        let base = self.navigation_base();
        if self.is_searching() || base >= self.total_pages() {
            return None;
        }
        Some(self.begin_listing(base + 1))
    }

    /// `None` while searching or on the first page.
    pub fn begin_previous_page(&mut self) -> Option<PendingFetch> {
        let base = self.navigation_base();
        if self.is_searching() || base <= 1 {
            return None;
        }
        Some(self.begin_listing(base - 1))
    }

    /// Re-issues the latest request: the requested listing page or the
    /// current search.
    pub fn begin_retry(&mut self) -> PendingFetch {
        match self.mode.clone() {
            BrowseMode::Listing { .. } => self.begin_listing(self.requested_page),
            BrowseMode::Searching { query } => self.begin_search(&query),
        }
    }

    /// Applies a page response. Returns `false` and leaves the state untouched
    /// when `token` has been superseded.
    ///
    /// A request past the last page is clamped to the last page but keeps the
    /// items the source returned for it, which is usually none.
    pub fn apply_page(
        &mut self,
        token: RequestToken,
        result: Result<PostPage, NetworkError>,
    ) -> bool {
        if token != self.latest_request {
            return false;
        }
        if self.is_searching() {
            return false;
        }

        match result {
            Ok(response) => {
                let total = response.effective_total();
                let pages = total_pages(total, self.page_size);
                self.mode = BrowseMode::Listing {
                    page: self.requested_page.clamp(1, pages),
                    total_pages: pages,
                };
                self.items = response.posts;
                self.total_count = Some(total);
                self.phase = Phase::Loaded;
            }
            Err(err) => {
                self.error = Some(format!("Failed to load posts: {err}"));
                self.phase = Phase::Errored;
            }
        }
        true
    }

    /// Applies the unpaged collection to the active search. Returns `false`
    /// when `token` has been superseded.
    pub fn apply_search(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Post>, NetworkError>,
    ) -> bool {
        if token != self.latest_request {
            return false;
        }
        let BrowseMode::Searching { query } = &self.mode else {
            return false;
        };

        match result {
            Ok(posts) => {
                self.items = filter_posts(posts, query);
                self.total_count = Some(self.items.len() as u64);
                self.phase = Phase::Loaded;
            }
            Err(err) => {
                self.error = Some(format!("Failed to search posts: {err}"));
                self.phase = Phase::Errored;
            }
        }
        true
    }
}

/// Case-insensitive substring match on title or body, keeping source order.
pub fn filter_posts(posts: Vec<Post>, query: &str) -> Vec<Post> {
    let needle = query.to_lowercase();
    posts
        .into_iter()
        .filter(|post| post.matches_query(&needle))
        .collect()
}

#[cfg(test)]
#[path = "tests/browse_tests.rs"]
mod tests;
