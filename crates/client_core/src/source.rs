use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Post, PostId, User},
    protocol::{PageQuery, PostPage, TOTAL_COUNT_HEADER},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::NetworkError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Read-only remote collection of posts.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_page(&self, query: PageQuery) -> Result<PostPage, NetworkError>;
    /// Unpaged collection, in source order.
    async fn fetch_all(&self) -> Result<Vec<Post>, NetworkError>;
    async fn fetch_post(&self, id: PostId) -> Result<Post, NetworkError>;
    async fn fetch_users(&self) -> Result<Vec<User>, NetworkError>;
}

pub struct HttpPostSource {
    http: Client,
    base_url: Url,
}

impl HttpPostSource {
    pub fn new(base_url: &str) -> Result<Self, NetworkError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NetworkError::Transport {
                url: base_url.to_string(),
                reason: err.to_string(),
            })?;
        Self::with_client(base_url, http)
    }

    pub fn with_client(base_url: &str, http: Client) -> Result<Self, NetworkError> {
        let mut base_url = Url::parse(base_url.trim())
            .map_err(|err| NetworkError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl(format!(
                "{base_url}: not usable as a base url"
            )));
        }
        // Keep any path prefix when joining endpoint names onto the base.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, NetworkError> {
        self.base_url
            .join(path)
            .map_err(|err| NetworkError::InvalidUrl(format!("{path}: {err}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: Option<&PageQuery>,
    ) -> Result<(T, HeaderMap), NetworkError> {
        let mut request = self.http.get(url.clone());
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await.map_err(|err| {
            warn!("posts: GET {url} failed: {err}");
            NetworkError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("posts: GET {url} returned status={}", status.as_u16());
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = response.headers().clone();
        let body = response.json::<T>().await.map_err(|err| {
            warn!("posts: GET {url} returned an undecodable body: {err}");
            NetworkError::Decode {
                url: url.to_string(),
                reason: err.to_string(),
            }
        })?;
        Ok((body, headers))
    }
}

#[async_trait]
impl PostSource for HttpPostSource {
    async fn fetch_page(&self, query: PageQuery) -> Result<PostPage, NetworkError> {
        let url = self.endpoint("posts")?;
        let (posts, headers) = self.get_json::<Vec<Post>>(url, Some(&query)).await?;
        let total_count = parse_total_count(&headers);
        debug!(
            page = query.page,
            limit = query.limit,
            returned = posts.len(),
            total = ?total_count,
            "posts: fetched page"
        );
        Ok(PostPage { posts, total_count })
    }

    async fn fetch_all(&self) -> Result<Vec<Post>, NetworkError> {
        let url = self.endpoint("posts")?;
        let (posts, _) = self.get_json::<Vec<Post>>(url, None).await?;
        Ok(posts)
    }

    async fn fetch_post(&self, id: PostId) -> Result<Post, NetworkError> {
        let url = self.endpoint(&format!("posts/{}", id.0))?;
        let (post, _) = self.get_json::<Post>(url, None).await?;
        Ok(post)
    }

    async fn fetch_users(&self) -> Result<Vec<User>, NetworkError> {
        let url = self.endpoint("users")?;
        let (users, _) = self.get_json::<Vec<User>>(url, None).await?;
        Ok(users)
    }
}

/// A missing or unparsable header counts as "no total reported".
fn parse_total_count(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(TOTAL_COUNT_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
