use super::*;

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/tasks.db"),
        "sqlite://./data/tasks.db"
    );
}

#[test]
fn keeps_memory_and_double_slash_urls() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("  sqlite://data/tasks.db "),
        "sqlite://data/tasks.db"
    );
}

#[test]
fn single_colon_sqlite_url_gains_slashes() {
    assert_eq!(
        normalize_database_url("sqlite:data\\tasks.db"),
        "sqlite://data/tasks.db"
    );
}

#[test]
fn sqlite_path_ignores_memory_and_query_suffix() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/tasks.db?mode=rwc"),
        Some(PathBuf::from("./data/tasks.db"))
    );
}

#[tokio::test]
async fn memory_slot_starts_empty_and_keeps_last_write() {
    let slot = MemorySlot::new();
    assert_eq!(slot.read_snapshot().await.expect("read"), None);

    slot.write_snapshot("[1]").await.expect("first write");
    slot.write_snapshot("[2]").await.expect("second write");

    assert_eq!(slot.read_snapshot().await.expect("read").as_deref(), Some("[2]"));
    assert_eq!(slot.write_count(), 2);
}

#[tokio::test]
async fn memory_slot_injected_failures_do_not_touch_payload() {
    let slot = MemorySlot::with_payload("[]");
    slot.set_fail_writes(true);
    assert!(slot.write_snapshot("[9]").await.is_err());
    assert_eq!(slot.payload().await.as_deref(), Some("[]"));
    assert_eq!(slot.write_count(), 0);

    slot.set_fail_reads(true);
    assert!(slot.read_snapshot().await.is_err());
}

#[tokio::test]
async fn file_slot_reads_none_for_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let slot = FileSlot::new(dir.path().join("tasks.json"));
    assert_eq!(slot.read_snapshot().await.expect("read"), None);
}

#[tokio::test]
async fn file_slot_creates_parent_dirs_and_overwrites() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("deeper").join("tasks.json");
    let slot = FileSlot::new(&path);

    slot.write_snapshot(r#"[{"a":1}]"#).await.expect("write");
    slot.write_snapshot("[]").await.expect("overwrite");

    assert!(path.exists(), "snapshot file should exist: {}", path.display());
    assert_eq!(std::fs::read_to_string(&path).expect("raw"), "[]");
    assert!(
        !path.with_file_name("tasks.json.tmp").exists(),
        "temp file should be renamed away"
    );
    assert_eq!(slot.read_snapshot().await.expect("read").as_deref(), Some("[]"));
}

#[tokio::test]
async fn sqlite_slot_round_trips_and_isolates_keys() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");

    let tasks = storage.slot("tasks");
    let other = storage.slot("other");
    assert_eq!(tasks.read_snapshot().await.expect("read"), None);

    tasks.write_snapshot("[1]").await.expect("write");
    tasks.write_snapshot("[1,2]").await.expect("upsert");
    other.write_snapshot("{}").await.expect("other write");

    assert_eq!(
        tasks.read_snapshot().await.expect("read").as_deref(),
        Some("[1,2]")
    );
    assert_eq!(other.read_snapshot().await.expect("read").as_deref(), Some("{}"));
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("tasks.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.write_slot("tasks", "[]").await.expect("write");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn open_slot_selects_backend_from_url() {
    let dir = tempfile::tempdir().expect("tempdir");

    let file_slot = open_slot(&dir.path().join("t.json").to_string_lossy(), TASKS_SLOT_KEY)
        .await
        .expect("file slot");
    assert!(file_slot.describe().starts_with("file:"));

    let sqlite_slot = open_slot("sqlite::memory:", TASKS_SLOT_KEY)
        .await
        .expect("sqlite slot");
    assert_eq!(sqlite_slot.describe(), "sqlite:tasks");

    assert!(open_slot("   ", TASKS_SLOT_KEY).await.is_err());
}
