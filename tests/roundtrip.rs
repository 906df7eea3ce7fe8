use std::sync::Arc;

use chunked_secrets::{
    AccountScope, ChunkConfig, ChunkedStore, Error, KeyMode, MemoryStore, SecretStore,
};

fn chunked(limit: usize) -> (Arc<MemoryStore>, ChunkedStore) {
    let memory = Arc::new(MemoryStore::with_payload_limit(Some(limit)));
    let store = ChunkedStore::new(memory.clone(), "app");
    (memory, store)
}

#[tokio::test]
async fn round_trip_preserves_bytes() {
    let (_, store) = chunked(4);
    let secret = b"a long secret that spans several entries".to_vec();

    store.write(None, "secret", &secret, false).await.unwrap();
    let read = store.read(None, "secret", false, false).await.unwrap();

    assert_eq!(read, secret);
}

#[tokio::test]
async fn chunk_count_and_key_naming() {
    let (memory, store) = chunked(4);

    store.write(None, "secret", b"0123456789", false).await.unwrap();

    // ceil(10 / 4) entries, first under the plain key.
    assert_eq!(
        memory.entry_keys("app"),
        vec!["secret", "secret.1", "secret.2"]
    );
}

#[tokio::test]
async fn payload_boundary_fills_entries_exactly() {
    let (memory, store) = chunked(4);

    store.write(None, "exact", b"01234567", false).await.unwrap();
    assert_eq!(memory.entry_keys("app"), vec!["exact", "exact.1"]);

    store.write(None, "plus-one", b"012345678", false).await.unwrap();
    assert_eq!(
        memory.entry_keys("app").len(),
        2 + 3,
        "one extra byte takes one extra entry"
    );
}

#[tokio::test]
async fn uncapped_store_uses_a_single_entry() {
    let memory = Arc::new(MemoryStore::new());
    let store = ChunkedStore::new(memory.clone(), "app");
    assert_eq!(store.config().chunk_size(), None);

    let secret = vec![7u8; 100_000];
    store.write(None, "secret", &secret, false).await.unwrap();

    assert_eq!(memory.entry_keys("app"), vec!["secret"]);
    assert_eq!(store.read(None, "secret", false, false).await.unwrap(), secret);
}

#[tokio::test]
async fn scoped_round_trip_namespaces_keys() {
    let (memory, store) = chunked(4);
    let scope = AccountScope::new("https://cloud.example.com", "alice");

    store
        .write(Some(&scope), "password", b"0123456789", false)
        .await
        .unwrap();

    let keys = memory.entry_keys("app");
    assert_eq!(keys[0], "password:https://cloud.example.com/:alice");
    assert_eq!(keys[1], "password:https://cloud.example.com/:alice.1");

    let read = store
        .read(Some(&scope), "password", false, false)
        .await
        .unwrap();
    assert_eq!(read, b"0123456789");
}

#[tokio::test]
async fn truncation_at_chunk_limit_is_silent() {
    // Data beyond the chunk budget is dropped, not reported, on both the
    // write and the read side. Pinned as the compatibility behaviour; a
    // caller that must not lose bytes checks `ChunkConfig::max_payload`.
    let memory = Arc::new(MemoryStore::with_payload_limit(Some(4)));
    let store = ChunkedStore::builder(memory.clone(), "app")
        .config(ChunkConfig::capped(4, 3))
        .build();

    let oversized = b"01234567890123456789".to_vec();
    store.write(None, "secret", &oversized, false).await.unwrap();

    assert_eq!(memory.entry_keys("app").len(), 3);

    let read = store.read(None, "secret", false, false).await.unwrap();
    assert_eq!(read, &oversized[..12]);
}

#[tokio::test]
async fn missing_key_returns_not_found() {
    let (_, store) = chunked(4);

    let err = store.read(None, "absent", false, false).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn empty_secret_stores_no_entries() {
    let (memory, store) = chunked(4);

    store.write(None, "empty", b"", false).await.unwrap();
    assert!(memory.entry_keys("app").is_empty());

    let err = store.read(None, "empty", false, false).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn migration_mode_locates_legacy_entries() {
    let (memory, store) = chunked(4);
    let scope = AccountScope::new("https://cloud.example.com", "alice");

    // An entry written before account ids were folded into keys.
    let legacy_key = chunked_secrets::derive_key("password", Some(&scope), KeyMode::Migration, 0);
    memory
        .write_entry("app", &legacy_key, b"old")
        .await
        .unwrap();

    let read = store
        .read(Some(&scope), "password", true, false)
        .await
        .unwrap();
    assert_eq!(read, b"old");

    let err = store
        .read(Some(&scope), "password", false, false)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn key_prefix_is_applied_once_per_key() {
    let memory = Arc::new(MemoryStore::with_payload_limit(Some(4)));
    let store = ChunkedStore::builder(memory.clone(), "app")
        .key_prefix("myapp_")
        .build();

    store.write(None, "secret", b"0123456789", false).await.unwrap();

    assert_eq!(
        memory.entry_keys("app"),
        vec!["myapp_secret", "myapp_secret.1", "myapp_secret.2"]
    );
    assert_eq!(
        store.read(None, "secret", false, false).await.unwrap(),
        b"0123456789"
    );
}

#[tokio::test]
async fn overwrite_with_equal_or_longer_value_replaces_it() {
    let (_, store) = chunked(4);

    store.write(None, "secret", b"short", false).await.unwrap();
    store.write(None, "secret", b"0123456789", false).await.unwrap();

    let read = store.read(None, "secret", false, false).await.unwrap();
    assert_eq!(read, b"0123456789");
}

#[tokio::test]
async fn shorter_overwrite_leaves_stale_chunks_in_place() {
    // Writes never clean up entries beyond the chunks they produce, so a
    // shorter overwrite leaves the old tail behind and a read appends it.
    let (_, store) = chunked(4);

    store.write(None, "secret", b"0123456789", false).await.unwrap();
    store.write(None, "secret", b"new", false).await.unwrap();

    let read = store.read(None, "secret", false, false).await.unwrap();
    assert_eq!(read, b"new456789");
}

#[tokio::test]
async fn oversized_write_error_is_surfaced() {
    // A store cap smaller than the configured chunk size makes the backend
    // reject chunk 0; the job surfaces the failure instead of retrying.
    let memory = Arc::new(MemoryStore::with_payload_limit(Some(2)));
    let store = ChunkedStore::builder(memory, "app")
        .config(ChunkConfig::capped(4, 10))
        .build();

    let err = store.write(None, "secret", b"0123", false).await.unwrap_err();
    assert!(matches!(err, Error::Backend(_)));
}
