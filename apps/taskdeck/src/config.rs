use std::{fs, path::Path, time::Duration};

use shared::protocol::{DEFAULT_API_BASE_URL, DEFAULT_PAGE_SIZE};
use tracing::warn;

pub const CONFIG_FILE: &str = "taskdeck.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
    /// `sqlite:` URL or path of a JSON snapshot file.
    pub storage_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: 15,
            storage_url: "sqlite://./data/taskdeck.db".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then `config_path` if it exists, then environment variables.
pub fn load_settings(config_path: &Path) -> Settings {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

pub fn load_settings_with<F>(config_path: &Path, env: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match raw.parse::<toml::Table>() {
            Ok(table) => apply_file(&mut settings, &table),
            Err(err) => warn!(
                "config: ignoring unparsable '{}': {err}",
                config_path.display()
            ),
        }
    }

    apply_env(&mut settings, env);
    settings
}

fn apply_file(settings: &mut Settings, table: &toml::Table) {
    if let Some(v) = table_string(table, "api_base_url") {
        settings.api_base_url = v;
    }
    if let Some(v) = table_string(table, "page_size").and_then(|v| parse_page_size(&v)) {
        settings.page_size = v;
    }
    if let Some(v) = table_string(table, "request_timeout_secs").and_then(|v| parse_timeout(&v)) {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = table_string(table, "storage_url") {
        settings.storage_url = v;
    }
}

fn apply_env<F>(settings: &mut Settings, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = env("TASKDECK_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__PAGE_SIZE").and_then(|v| parse_page_size(&v)) {
        settings.page_size = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS").and_then(|v| parse_timeout(&v)) {
        settings.request_timeout_secs = v;
    }

    if let Some(v) = env("TASKDECK_STORAGE_URL") {
        settings.storage_url = v;
    }
    if let Some(v) = env("APP__STORAGE_URL") {
        settings.storage_url = v;
    }
}

/// Accepts both `page_size = 20` and `page_size = "20"`.
fn table_string(table: &toml::Table, key: &str) -> Option<String> {
    match table.get(key)? {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Integer(v) => Some(v.to_string()),
        other => {
            warn!("config: ignoring '{key}' of type {}", other.type_str());
            None
        }
    }
}

fn parse_page_size(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|size| *size > 0)
}

fn parse_timeout(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|secs| *secs > 0)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
