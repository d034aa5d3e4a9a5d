use serde::{Deserialize, Serialize};

use crate::domain::Post;

/// Response header carrying the size of the unpaged collection.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "_page")]
    pub page: u32,
    #[serde(rename = "_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    /// `None` when the source did not report a total count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl PostPage {
    /// Total count reported by the source, or the page length when absent.
    pub fn effective_total(&self) -> u64 {
        self.total_count.unwrap_or(self.posts.len() as u64)
    }
}

/// Number of pages needed to show `total_count` items, never less than one.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
