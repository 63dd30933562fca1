//! Tests for Store
//!
//! These tests verify:
//! - Lazy creation of the storage root and data file
//! - Basic get/set/delete operations
//! - The persisted file format
//! - Corrupt file detection
//! - Persistence across store handles
//! - Concurrent access in serialized and unserialized modes

use std::fs;
use std::sync::Arc;
use std::thread;

use flatkv::{Command, Config, FlatKvError, Store};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path());
    (temp_dir, store)
}

fn setup_unserialized_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .serialize_access(false)
        .build();
    (temp_dir, Store::open(&config))
}

fn read_data_file(store: &Store) -> String {
    fs::read_to_string(store.data_path()).unwrap()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_store_open_is_lazy() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("kv");

    let store = Store::open_path(&root);

    assert!(!root.exists());
    assert_eq!(store.root(), root.as_path());
    assert_eq!(store.data_path(), root.join("data.json").as_path());
}

#[test]
fn test_store_first_access_creates_root_and_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("nested").join("dirs").join("kv");
    let store = Store::open_path(&root);

    assert_eq!(store.get(b"anything").unwrap(), Vec::<u8>::new());

    assert!(root.is_dir());
    assert_eq!(read_data_file(&store), "{}");
}

#[test]
fn test_store_default_is_serialized() {
    let (_temp, store) = setup_temp_store();
    assert!(store.is_serialized());

    let (_temp, store) = setup_unserialized_store();
    assert!(!store.is_serialized());
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_store_get_on_empty() {
    let (_temp, store) = setup_temp_store();

    let keys: [&[u8]; 3] = [b"key", b"", b"\xFF\xFE"];
    for key in keys {
        assert_eq!(store.get(key).unwrap(), Vec::<u8>::new());
    }
}

#[test]
fn test_store_get_set_delete_get_sequence() {
    let (_temp, store) = setup_temp_store();

    assert_eq!(store.get(b"key").unwrap(), b"".to_vec());
    store.set(b"key", b"value").unwrap();
    assert_eq!(store.get(b"key").unwrap(), b"value".to_vec());
    store.delete(b"key").unwrap();
    assert_eq!(store.get(b"key").unwrap(), b"".to_vec());
}

#[test]
fn test_store_set_overwrite() {
    let (_temp, store) = setup_temp_store();

    store.set(b"key", b"value1").unwrap();
    store.set(b"key", b"value2").unwrap();

    assert_eq!(store.get(b"key").unwrap(), b"value2".to_vec());
    assert_eq!(store.snapshot().unwrap().len(), 1);
}

#[test]
fn test_store_get_after_set_awkward_values() {
    let (_temp, store) = setup_temp_store();

    let cases: [(&[u8], &[u8]); 7] = [
        (b"empty", b""),
        (b"", b"empty key"),
        (b"control", b"\x00\x01\x02\x1B\x7F\r\n\t"),
        (b"quotes", br#""quoted" and 'single' and \backslash\"#),
        (b"json", br#"{"a2V5":"dmFsdWU="}"#),
        (b"invalid utf8", b"\xC3\x28\xA0\xA1\xF0\x28\x8C\xBC"),
        (b"\xFF\xFE\x00", b"binary key"),
    ];

    for (key, value) in &cases {
        store.set(key, value).unwrap();
    }

    for (key, value) in &cases {
        assert_eq!(store.get(key).unwrap(), value.to_vec());
    }
}

#[test]
fn test_store_large_value() {
    let (_temp, store) = setup_temp_store();

    let large_value = vec![0xAB; 500_000];
    store.set(b"large_key", &large_value).unwrap();

    assert_eq!(store.get(b"large_key").unwrap(), large_value);
}

#[test]
fn test_store_delete_absent_key_twice() {
    let (_temp, store) = setup_temp_store();
    store.set(b"keep", b"me").unwrap();
    let before = store.snapshot().unwrap();

    store.delete(b"missing").unwrap();
    store.delete(b"missing").unwrap();

    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn test_store_delete_leaves_other_keys() {
    let (_temp, store) = setup_temp_store();

    store.set(b"key1", b"value1").unwrap();
    store.set(b"key2", b"value2").unwrap();
    store.delete(b"key1").unwrap();

    assert_eq!(store.get(b"key1").unwrap(), b"".to_vec());
    assert_eq!(store.get(b"key2").unwrap(), b"value2".to_vec());
}

#[test]
fn test_store_execute_commands() {
    let (_temp, store) = setup_temp_store();

    let set = Command::Set {
        key: b"k".to_vec(),
        value: b"v".to_vec(),
    };
    assert!(set.is_mutation());
    assert_eq!(store.execute(set).unwrap(), None);

    let get = Command::Get { key: b"k".to_vec() };
    assert_eq!(get.key(), b"k");
    assert_eq!(store.execute(get).unwrap(), Some(b"v".to_vec()));

    assert_eq!(store.execute(Command::Delete { key: b"k".to_vec() }).unwrap(), None);
    assert_eq!(
        store.execute(Command::Get { key: b"k".to_vec() }).unwrap(),
        Some(Vec::new())
    );
}

// =============================================================================
// File Format Tests
// =============================================================================

#[test]
fn test_store_file_format() {
    let (_temp, store) = setup_temp_store();

    store.set(b"key", b"value").unwrap();

    assert_eq!(read_data_file(&store), r#"{"a2V5":"dmFsdWU="}"#);
}

#[test]
fn test_store_reads_hand_written_file() {
    let (temp, store) = setup_temp_store();
    fs::write(temp.path().join("data.json"), r#"{"a2V5":"dmFsdWU="}"#).unwrap();

    assert_eq!(store.get(b"key").unwrap(), b"value".to_vec());
}

#[test]
fn test_store_get_does_not_rewrite_file() {
    let (temp, store) = setup_temp_store();
    // Unpadded and with whitespace: a rewrite would normalize both
    let original = "{ \"a2V5\" : \"dmFsdWU\" }";
    fs::write(temp.path().join("data.json"), original).unwrap();

    assert_eq!(store.get(b"key").unwrap(), b"value".to_vec());
    assert_eq!(store.get(b"other").unwrap(), b"".to_vec());

    assert_eq!(read_data_file(&store), original);
}

#[test]
fn test_store_delete_absent_key_rewrites_file() {
    let (temp, store) = setup_temp_store();
    fs::write(temp.path().join("data.json"), "{ \"a2V5\" : \"dmFsdWU\" }").unwrap();

    store.delete(b"missing").unwrap();

    assert_eq!(read_data_file(&store), r#"{"a2V5":"dmFsdWU="}"#);
}

// =============================================================================
// Corruption Tests
// =============================================================================

fn assert_corrupt<T: std::fmt::Debug>(result: flatkv::Result<T>) {
    match result {
        Err(FlatKvError::CorruptStore { .. }) => {}
        other => panic!("Expected CorruptStore, got {:?}", other),
    }
}

#[test]
fn test_store_corrupt_file_detected_by_all_operations() {
    let (temp, store) = setup_temp_store();
    let data_path = temp.path().join("data.json");
    fs::write(&data_path, b"this is not json").unwrap();

    assert_corrupt(store.get(b"key"));
    assert_corrupt(store.set(b"key", b"value"));
    assert_corrupt(store.delete(b"key"));
    assert_corrupt(store.snapshot());

    // Never reset to empty
    assert_eq!(fs::read(&data_path).unwrap(), b"this is not json".to_vec());
}

#[test]
fn test_store_invalid_base64_is_corrupt() {
    let (temp, store) = setup_temp_store();
    fs::write(temp.path().join("data.json"), r#"{"a2V5":"not base64!"}"#).unwrap();

    assert_corrupt(store.get(b"key"));
}

#[test]
fn test_store_non_string_member_is_corrupt() {
    let (temp, store) = setup_temp_store();
    fs::write(temp.path().join("data.json"), r#"{"a2V5":["dmFsdWU="]}"#).unwrap();

    assert_corrupt(store.get(b"key"));
}

#[test]
fn test_store_empty_file_is_corrupt() {
    let (temp, store) = setup_temp_store();
    fs::write(temp.path().join("data.json"), b"").unwrap();

    assert_corrupt(store.get(b"key"));
}

#[test]
fn test_store_corrupt_error_names_data_file() {
    let (temp, store) = setup_temp_store();
    fs::write(temp.path().join("data.json"), b"[").unwrap();

    match store.get(b"key") {
        Err(FlatKvError::CorruptStore { path, reason }) => {
            assert_eq!(path, temp.path().join("data.json"));
            assert!(!reason.is_empty());
        }
        other => panic!("Expected CorruptStore, got {:?}", other),
    }
}

// =============================================================================
// Storage Root Tests
// =============================================================================

#[test]
fn test_store_root_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("not_a_dir");
    fs::write(&root, b"occupied").unwrap();

    let store = Store::open_path(&root);

    assert!(matches!(
        store.get(b"key"),
        Err(FlatKvError::StorageUnavailable { .. })
    ));
    assert!(matches!(
        store.set(b"key", b"value"),
        Err(FlatKvError::StorageUnavailable { .. })
    ));
}

#[test]
fn test_store_data_file_is_a_directory() {
    let (temp, store) = setup_temp_store();
    fs::create_dir(temp.path().join("data.json")).unwrap();

    assert!(matches!(
        store.get(b"key"),
        Err(FlatKvError::StorageUnavailable { .. })
    ));
}

#[test]
fn test_store_root_recreated_after_removal() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("kv");
    let store = Store::open_path(&root);

    store.set(b"key", b"value").unwrap();
    fs::remove_dir_all(&root).unwrap();

    // Starts over from an empty file
    assert_eq!(store.get(b"key").unwrap(), b"".to_vec());
    store.set(b"key", b"again").unwrap();
    assert_eq!(store.get(b"key").unwrap(), b"again".to_vec());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_store_persists_across_handles() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = Store::open_path(temp_dir.path());
        store.set(b"key1", b"value1").unwrap();
        store.set(b"key2", b"value2").unwrap();
        store.delete(b"key1").unwrap();
    }

    let store = Store::open_path(temp_dir.path());
    assert_eq!(store.get(b"key1").unwrap(), b"".to_vec());
    assert_eq!(store.get(b"key2").unwrap(), b"value2".to_vec());
}

#[test]
fn test_store_observes_external_modification() {
    let (temp, store) = setup_temp_store();
    store.set(b"key", b"value").unwrap();

    // "b3RoZXI=" is "other"
    fs::write(temp.path().join("data.json"), r#"{"a2V5":"b3RoZXI="}"#).unwrap();

    assert_eq!(store.get(b"key").unwrap(), b"other".to_vec());
}

#[test]
fn test_store_snapshot() {
    let (_temp, store) = setup_temp_store();
    store.set(b"a", b"1").unwrap();
    store.set(b"b", b"2").unwrap();

    let snapshot = store.snapshot().unwrap();

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get(b"a".as_slice()), Some(&b"1".to_vec()));
    assert_eq!(snapshot.get(b"b".as_slice()), Some(&b"2".to_vec()));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_store_serialized_concurrent_writes_keep_every_update() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);

    let mut handles = vec![];
    for t in 0..4 {
        let store_clone = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..10 {
                let key = format!("thread{}_key{}", t, i);
                let value = format!("thread{}_value{}", t, i);
                store_clone.set(key.as_bytes(), value.as_bytes()).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.len(), 40);
    for t in 0..4 {
        for i in 0..10 {
            let key = format!("thread{}_key{}", t, i);
            let expected = format!("thread{}_value{}", t, i);
            assert_eq!(store.get(key.as_bytes()).unwrap(), expected.into_bytes());
        }
    }
}

#[test]
fn test_store_unserialized_concurrent_writes_last_writer_wins() {
    let (_temp, store) = setup_unserialized_store();
    let store = Arc::new(store);

    // Materialize the file before the race
    store.get(b"shared").unwrap();

    // Equal-length values keep every full rewrite the same size
    let values: Vec<String> = (0..8).map(|t| format!("writer-{}", t)).collect();

    let mut handles = vec![];
    for value in values.clone() {
        let store_clone = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            // A racing reader may observe a half-rewritten file; such
            // attempts fail and are not part of the outcome
            let _ = store_clone.set(b"shared", value.as_bytes());
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let winner = store.get(b"shared").unwrap();
    assert!(
        values.iter().any(|v| v.as_bytes() == winner.as_slice()),
        "Unexpected value {:?}",
        String::from_utf8_lossy(&winner)
    );
}
