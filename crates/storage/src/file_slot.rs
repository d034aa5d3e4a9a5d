use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::SnapshotSlot;

/// Slot backed by a single file. Writes go to a sibling temp file first and are
/// renamed into place so a crash never leaves a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotSlot for FileSlot {
    async fn read_snapshot(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read snapshot '{}'", self.path.display())),
        }
    }

    async fn write_snapshot(&self, payload: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create snapshot directory '{}'", parent.display())
            })?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, payload)
            .await
            .with_context(|| format!("failed to write snapshot '{}'", temp_path.display()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("failed to replace snapshot '{}'", self.path.display()))?;

        debug!(
            "storage: wrote snapshot path={} bytes={}",
            self.path.display(),
            payload.len()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
