// tests/targets.rs

use std::fs;
use std::io::Write;

use dagbuild::{LocalTarget, MemoryStore, Target, TargetError};
use tempfile::TempDir;

fn leftovers(dir: &std::path::Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".dagbuild-"))
        .collect()
}

#[test]
fn local_target_commits_atomically() {
    let dir = TempDir::new().unwrap();
    let target = LocalTarget::new(dir.path().join("nested/out.txt"));
    assert!(!target.exists());

    let mut writer = target.open_write().unwrap();
    writer.write_all(b"hello ").unwrap();
    writer.write_all(b"world").unwrap();
    assert!(!target.exists(), "nothing visible before commit");

    writer.commit().unwrap();

    assert!(target.exists());
    assert_eq!(target.read_to_string().unwrap(), "hello world");
    assert!(leftovers(&dir.path().join("nested")).is_empty());
}

#[test]
fn dropped_writer_leaves_no_artifact() {
    let dir = TempDir::new().unwrap();
    let target = LocalTarget::new(dir.path().join("out.txt"));

    {
        let mut writer = target.open_write().unwrap();
        writer.write_all(b"partial").unwrap();
    }

    assert!(!target.exists());
    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn commit_replaces_previous_contents() {
    let dir = TempDir::new().unwrap();
    let target = LocalTarget::new(dir.path().join("out.txt"));

    target.write_bytes(b"first").unwrap();
    target.write_bytes(b"second").unwrap();

    assert_eq!(target.read_to_string().unwrap(), "second");
}

#[test]
fn reading_a_missing_local_target_is_not_found() {
    let dir = TempDir::new().unwrap();
    let target = LocalTarget::new(dir.path().join("absent.txt"));

    match target.read_to_string() {
        Err(TargetError::NotFound(location)) => assert!(location.ends_with("absent.txt")),
        other => panic!("Expected NotFound, got: {:?}", other),
    }
}

#[test]
fn remove_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let target = LocalTarget::new(dir.path().join("out.txt"));
    target.write_bytes(b"x").unwrap();

    target.remove().unwrap();
    assert!(!target.exists());
    target.remove().unwrap();
}

#[test]
fn memory_targets_share_their_store() {
    let store = MemoryStore::new();
    let writer_view = store.target("k");
    let reader_view = store.clone().target("k");

    assert!(!reader_view.exists());
    writer_view.write_bytes(b"shared").unwrap();

    assert!(reader_view.exists());
    assert_eq!(reader_view.read_to_string().unwrap(), "shared");
    assert_eq!(reader_view.location(), "memory://k");
    assert_eq!(store.len(), 1);
}

#[test]
fn memory_writer_is_invisible_until_commit() {
    let store = MemoryStore::new();
    let target = store.target("k");

    let mut writer = target.open_write().unwrap();
    writer.write_all(b"pending").unwrap();
    assert!(!target.exists());
    drop(writer);
    assert!(store.is_empty());
}

#[test]
fn denied_writes_fail_with_io_error() {
    let store = MemoryStore::new();
    store.deny_writes("locked");

    match store.target("locked").write_bytes(b"x") {
        Err(TargetError::Io { location, source }) => {
            assert_eq!(location, "memory://locked");
            assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
        }
        other => panic!("Expected Io error, got: {:?}", other),
    }
    assert!(store.get("locked").is_none());
}
