// Unit tests for the preference store: best-effort persistence of the
// remembered address and credential.

use crate::prefs::{ADDRESS_KEY, JsonFileStore, KeyValueStore, MemoryStore, remembered_address};

#[test]
fn given_memory_store_when_set_get_remove_then_round_trips() {
    let store = MemoryStore::new();

    assert_eq!(store.get("missing"), None);

    store.set("key", "value");
    assert_eq!(store.get("key"), Some(String::from("value")));

    store.remove("key");
    assert_eq!(store.get("key"), None);
}

/// **VALUE**: Verifies the address prefill default: absent or
/// non-numeric stored values yield 0 instead of failing.
#[test]
fn given_stored_address_when_recalled_then_numeric_or_zero() {
    let store = MemoryStore::new();
    assert_eq!(remembered_address(&store), 0);

    store.set(ADDRESS_KEY, "1234");
    assert_eq!(remembered_address(&store), 1234);

    store.set(ADDRESS_KEY, "not a number");
    assert_eq!(remembered_address(&store), 0);
}

/// **VALUE**: Verifies file-backed preferences survive a reopen.
///
/// **WHY THIS MATTERS**: This is the localStorage analog: the
/// remembered address and credential must outlive the process.
#[test]
fn given_file_store_when_reopened_then_entries_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");

    {
        let store = JsonFileStore::open(path.clone());
        store.set(ADDRESS_KEY, "99");
        store.set("pager_auth", "secret");
    }

    let reopened = JsonFileStore::open(path);
    assert_eq!(reopened.get(ADDRESS_KEY), Some(String::from("99")));
    assert_eq!(reopened.get("pager_auth"), Some(String::from("secret")));
}

/// **VALUE**: Verifies a missing or corrupt preference file degrades
/// to an empty store instead of blocking startup.
#[test]
fn given_missing_or_corrupt_file_when_opened_then_empty_store() {
    let dir = tempfile::tempdir().unwrap();

    let missing = JsonFileStore::open(dir.path().join("nope.json"));
    assert_eq!(missing.get(ADDRESS_KEY), None);

    let corrupt_path = dir.path().join("corrupt.json");
    std::fs::write(&corrupt_path, "{ this is not json").unwrap();
    let corrupt = JsonFileStore::open(corrupt_path);
    assert_eq!(corrupt.get(ADDRESS_KEY), None);
}

#[test]
fn given_file_store_when_removed_then_removal_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");

    let store = JsonFileStore::open(path.clone());
    store.set("pager_auth", "secret");
    store.remove("pager_auth");

    let reopened = JsonFileStore::open(path);
    assert_eq!(reopened.get("pager_auth"), None);
}
