use std::fs;
use std::path::PathBuf;

use assistant_service::Thread;
use serde_json::json;
use session_store::{store_path, SessionStoreError, ThreadOrigin, ThreadStore};
use tempfile::TempDir;

fn thread(id: &str) -> Thread {
    Thread {
        id: id.to_string(),
        created_at: 1_700_000_000,
    }
}

fn write_record(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("store.json");
    fs::write(&path, contents).expect("record should be written");
    (dir, path)
}

#[test]
fn load_returns_none_when_file_is_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ThreadStore::in_dir(dir.path());

    assert_eq!(store.path(), store_path(dir.path()));
    assert!(store.load().expect("missing file is not an error").is_none());
}

#[test]
fn save_creates_parent_dirs_and_writes_record_shape() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ThreadStore::in_dir(dir.path());

    store.save(&thread("thread_abc")).expect("save");

    let raw = fs::read_to_string(store.path()).expect("record file");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(
        value,
        json!({"thread": {"id": "thread_abc", "created_at": 1_700_000_000}})
    );
    let leftovers: Vec<_> = fs::read_dir(store.path().parent().expect("parent"))
        .expect("read dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files must be renamed away");
}

#[test]
fn loading_twice_yields_the_same_thread_id() {
    let (_dir, path) = write_record(r#"{"thread":{"id":"thread_1","created_at":5}}"#);
    let store = ThreadStore::at(&path);

    let first = store.load().expect("first load").expect("thread");
    let second = store.load().expect("second load").expect("thread");
    assert_eq!(first.id, "thread_1");
    assert_eq!(first, second);
}

#[test]
fn load_rejects_corrupt_record_instead_of_overwriting() {
    let (_dir, path) = write_record("{not json");
    let store = ThreadStore::at(&path);

    let error = store.load().expect_err("corrupt record must fail");
    assert!(matches!(error, SessionStoreError::JsonParse { .. }));
    assert_eq!(fs::read_to_string(&path).expect("file kept"), "{not json");
}

#[test]
fn load_or_create_replaces_an_unparseable_record() {
    let (_dir, path) = write_record("{not json");
    let store = ThreadStore::at(&path);

    let (thread, origin) = store
        .load_or_create(|| -> Result<Thread, SessionStoreError> { Ok(thread("thread_fresh")) })
        .expect("corrupt record is replaced");

    assert_eq!(origin, ThreadOrigin::Created);
    assert_eq!(thread.id, "thread_fresh");
    let reloaded = store.load().expect("record is valid again").expect("thread");
    assert_eq!(reloaded.id, "thread_fresh");
}

#[test]
fn load_or_create_replaces_an_empty_thread_id() {
    let (_dir, path) = write_record(r#"{"thread":{"id":"","created_at":0}}"#);
    let store = ThreadStore::at(&path);

    let (thread, origin) = store
        .load_or_create(|| -> Result<Thread, SessionStoreError> { Ok(thread("thread_fresh")) })
        .expect("empty id is replaced");

    assert_eq!(origin, ThreadOrigin::Created);
    assert_eq!(thread.id, "thread_fresh");
}

#[test]
fn load_rejects_empty_thread_id() {
    let (_dir, path) = write_record(r#"{"thread":{"id":"","created_at":0}}"#);

    let error = ThreadStore::at(&path).load().expect_err("empty id must fail");
    assert!(matches!(error, SessionStoreError::EmptyThreadId { .. }));
}

#[test]
fn load_or_create_creates_once_then_reuses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ThreadStore::in_dir(dir.path());
    let mut creations = 0;

    let (created, origin) = store
        .load_or_create(|| -> Result<Thread, SessionStoreError> {
            creations += 1;
            Ok(thread("thread_new"))
        })
        .expect("create");
    assert_eq!(origin, ThreadOrigin::Created);

    let (loaded, origin) = store
        .load_or_create(|| -> Result<Thread, SessionStoreError> {
            creations += 1;
            Ok(thread("thread_other"))
        })
        .expect("load");
    assert_eq!(origin, ThreadOrigin::Loaded);
    assert_eq!(loaded.id, created.id);
    assert_eq!(creations, 1);
}

#[test]
fn load_or_create_does_not_persist_failed_creation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ThreadStore::in_dir(dir.path());

    let result = store.load_or_create(|| {
        Err(SessionStoreError::EmptyThreadId {
            path: PathBuf::from("remote"),
        })
    });

    assert!(result.is_err());
    assert!(!store.path().exists());
}
