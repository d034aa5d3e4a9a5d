//! Single-slot snapshot persistence.
//!
//! A slot holds one serialized document that is read once at startup and
//! overwritten wholesale on every write. Backends: in-memory (tests), a JSON
//! file on disk, and a row in a SQLite table.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;

mod file_slot;
mod memory;
mod sqlite;

pub use file_slot::FileSlot;
pub use memory::MemorySlot;
pub use sqlite::{SqliteSlot, Storage};

/// Slot name used for the task list snapshot.
pub const TASKS_SLOT_KEY: &str = "tasks";

#[async_trait]
pub trait SnapshotSlot: Send + Sync {
    /// Returns `None` when nothing has been written to the slot yet.
    async fn read_snapshot(&self) -> Result<Option<String>>;
    async fn write_snapshot(&self, payload: &str) -> Result<()>;
    fn describe(&self) -> String;
}

#[async_trait]
impl<S> SnapshotSlot for Arc<S>
where
    S: SnapshotSlot + ?Sized,
{
    async fn read_snapshot(&self) -> Result<Option<String>> {
        (**self).read_snapshot().await
    }

    async fn write_snapshot(&self, payload: &str) -> Result<()> {
        (**self).write_snapshot(payload).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Opens the slot named `key` behind `storage_url`.
///
/// `sqlite:` URLs select the SQLite backend; anything else is treated as the
/// path of a JSON file holding the slot.
pub async fn open_slot(storage_url: &str, key: &str) -> Result<Arc<dyn SnapshotSlot>> {
    let storage_url = storage_url.trim();
    if storage_url.starts_with("sqlite:") {
        let database_url = normalize_database_url(storage_url);
        let storage = Storage::new(&database_url)
            .await
            .with_context(|| format!("failed to open snapshot database '{database_url}'"))?;
        return Ok(Arc::new(storage.slot(key)));
    }

    if storage_url.is_empty() {
        anyhow::bail!("storage url must not be empty");
    }
    Ok(Arc::new(FileSlot::new(storage_url)))
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim().replace('\\', "/");

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.starts_with("sqlite://")
    {
        return raw_database_url;
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{path}");
    }

    format!("sqlite://{raw_database_url}")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
