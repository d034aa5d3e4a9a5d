use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::{ensure_sqlite_parent_dir_exists, SnapshotSlot};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // An in-memory database lives per connection, so keep exactly one.
        let max_connections = if database_url.starts_with("sqlite::memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub fn slot(&self, key: impl Into<String>) -> SqliteSlot {
        SqliteSlot {
            storage: self.clone(),
            key: key.into(),
        }
    }

    pub async fn read_slot(&self, key: &str) -> Result<Option<String>> {
        let payload = sqlx::query_scalar::<_, String>(
            "SELECT payload FROM snapshot_slots WHERE slot_key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to read snapshot slot '{key}'"))?;
        Ok(payload)
    }

    pub async fn write_slot(&self, key: &str, payload: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO snapshot_slots (slot_key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(slot_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write snapshot slot '{key}'"))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteSlot {
    storage: Storage,
    key: String,
}

impl SqliteSlot {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl SnapshotSlot for SqliteSlot {
    async fn read_snapshot(&self) -> Result<Option<String>> {
        self.storage.read_slot(&self.key).await
    }

    async fn write_snapshot(&self, payload: &str) -> Result<()> {
        self.storage.write_slot(&self.key, payload).await
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.key)
    }
}
