//! Client-side state core: a locally persisted task list and a browser over a
//! remote, paginated and searchable post collection. The two are independent;
//! a presentation layer wires user events to them and renders their state.

pub mod browse;
pub mod controller;
pub mod error;
pub mod source;
pub mod task_store;

pub use browse::{filter_posts, BrowseMode, BrowseState, PendingFetch, Phase, RequestToken};
pub use controller::RemoteCollectionController;
pub use error::{NetworkError, PersistenceError, TaskStoreError};
pub use source::{HttpPostSource, PostSource, DEFAULT_REQUEST_TIMEOUT};
pub use task_store::{StoreOutcome, TaskStore};

#[cfg(test)]
#[path = "tests/fixtures.rs"]
pub(crate) mod fixtures;
