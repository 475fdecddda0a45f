//! Attribute store behavior end to end: key shapes in the backend, alias
//! routing, unresolved no-ops, typed codec access, and the adapter stores.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use roam_cache::{CacheClient, CacheConfig, JsonCodec};
use roam_session::{
    KeyedAttributeStore, RecordStore, SessionAttributeStore, SessionBlobStore, SessionContext,
};
use roam_testkit::MockBackend;

fn cache_for(backend: &MockBackend) -> Arc<CacheClient> {
    Arc::new(CacheClient::new(CacheConfig::single(backend.addr())))
}

fn store_for(backend: &MockBackend) -> SessionAttributeStore {
    SessionAttributeStore::new(cache_for(backend))
}

#[tokio::test]
async fn attributes_live_under_the_canonical_prefix() {
    let backend = MockBackend::spawn().await;
    let store = store_for(&backend);

    let ctx = SessionContext::new("abc");
    assert!(store.set(&ctx, "cart", b"three items").await);

    // Direct backend inspection: prefix ÷ session ÷ name.
    assert_eq!(backend.get_raw("SESSION-abc-cart"), Some(b"three items".to_vec()));
    assert_eq!(store.get(&ctx, "cart").await, Some(b"three items".to_vec()));
}

#[tokio::test]
async fn aliased_session_reads_and_writes_the_canonical_namespace() {
    let backend = MockBackend::spawn().await;
    let store = store_for(&backend);

    // Mapping X -> Y stored; every operation under X lands on SESSION-Y-*.
    backend.insert_raw("SESSION-X", b"Y");
    let ctx = SessionContext::new("X");

    assert!(store.set(&ctx, "n", b"v").await);
    assert_eq!(backend.get_raw("SESSION-Y-n"), Some(b"v".to_vec()));
    assert_eq!(backend.get_raw("SESSION-X-n"), None);
    assert_eq!(store.get(&ctx, "n").await, Some(b"v".to_vec()));

    // The same attribute is visible under the canonical id directly.
    let canonical_ctx = SessionContext::new("Y");
    assert_eq!(store.get(&canonical_ctx, "n").await, Some(b"v".to_vec()));
}

#[tokio::test]
async fn list_names_returns_bare_attribute_names() {
    let backend = MockBackend::spawn().await;
    let store = store_for(&backend);

    let ctx = SessionContext::new("abc");
    assert!(store.set(&ctx, "cart", b"1").await);
    assert!(store.set(&ctx, "user", b"2").await);

    let names = store.list_names(&ctx).await;
    assert_eq!(
        names.into_iter().collect::<Vec<_>>(),
        vec!["cart".to_string(), "user".to_string()]
    );
}

#[tokio::test]
async fn remove_deletes_one_attribute() {
    let backend = MockBackend::spawn().await;
    let store = store_for(&backend);

    let ctx = SessionContext::new("abc");
    assert!(store.set(&ctx, "cart", b"1").await);
    assert!(store.remove(&ctx, "cart").await);
    assert_eq!(store.get(&ctx, "cart").await, None);
}

#[tokio::test]
async fn clear_wipes_attributes_but_keeps_alias_mappings() {
    let backend = MockBackend::spawn().await;
    let store = store_for(&backend);

    backend.insert_raw("SESSION-X", b"Y");
    let ctx = SessionContext::new("X");
    assert!(store.set(&ctx, "a", b"1").await);
    assert!(store.set(&ctx, "b", b"2").await);

    assert!(store.clear(&ctx).await);
    assert!(store.list_names(&ctx).await.is_empty());
    // The alias entry survives a per-session clear...
    assert_eq!(backend.get_raw("SESSION-X"), Some(b"Y".to_vec()));

    // ...and dies with the whole namespace.
    store.clear_all().await;
    assert!(backend.is_empty());
}

#[tokio::test]
async fn unresolved_identity_makes_every_operation_a_no_op() {
    let backend = MockBackend::spawn().await;
    let store = store_for(&backend);

    let ctx = SessionContext::anonymous();
    assert_eq!(store.get(&ctx, "cart").await, None);
    assert!(!store.set(&ctx, "cart", b"v").await);
    assert!(!store.remove(&ctx, "cart").await);
    assert!(store.list_names(&ctx).await.is_empty());
    assert!(!store.clear(&ctx).await);
    assert!(backend.is_empty());
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Cart {
    items: Vec<String>,
    total_cents: u64,
}

#[tokio::test]
async fn typed_access_round_trips_through_a_codec() {
    let backend = MockBackend::spawn().await;
    let store = store_for(&backend);
    let codec = JsonCodec::<Cart>::new();

    let ctx = SessionContext::new("abc");
    let cart = Cart {
        items: vec!["boots".to_string()],
        total_cents: 18999,
    };
    assert!(store.set_value(&ctx, "cart", &codec, &cart).await);
    assert_eq!(store.get_value(&ctx, "cart", &codec).await, Some(cart));
}

#[tokio::test]
async fn undecodable_attribute_counts_as_a_miss() {
    let backend = MockBackend::spawn().await;
    let store = store_for(&backend);
    let codec = JsonCodec::<Cart>::new();

    backend.insert_raw("SESSION-abc-cart", b"not json at all");
    let ctx = SessionContext::new("abc");

    assert_eq!(store.get_value(&ctx, "cart", &codec).await, None);
    // The raw bytes are still there; only the typed view treats it as a miss.
    assert_eq!(
        store.get(&ctx, "cart").await,
        Some(b"not json at all".to_vec())
    );
}

#[tokio::test]
async fn destroyed_store_degrades_to_no_ops() {
    let backend = MockBackend::spawn().await;
    let store = store_for(&backend);

    let ctx = SessionContext::new("abc");
    assert!(store.set(&ctx, "cart", b"v").await);
    store.destroy().await;

    assert!(!store.set(&ctx, "cart", b"v2").await);
    assert_eq!(store.get(&ctx, "cart").await, None);
}

#[tokio::test]
async fn blob_store_round_trips_whole_sessions() {
    let backend = MockBackend::spawn().await;
    let blobs = SessionBlobStore::new(cache_for(&backend));

    assert!(blobs.save("s1", b"serialized session").await);
    assert!(blobs.save("s2", b"another").await);

    assert_eq!(blobs.load("s1").await, Some(b"serialized session".to_vec()));
    assert_eq!(backend.get_raw("SESSIONBLOB-s1"), Some(b"serialized session".to_vec()));

    assert_eq!(
        blobs.ids().await.into_iter().collect::<Vec<_>>(),
        vec!["s1".to_string(), "s2".to_string()]
    );
    assert_eq!(blobs.len().await, 2);

    assert!(blobs.remove("s1").await);
    assert_eq!(blobs.load("s1").await, None);

    blobs.clear().await;
    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn blob_store_ttl_save_applies_an_expiry() {
    let backend = MockBackend::spawn().await;
    let blobs = SessionBlobStore::new(cache_for(&backend));

    assert!(blobs.save_with_ttl("s1", b"blob", 60).await);
    assert_eq!(blobs.load("s1").await, Some(b"blob".to_vec()));
}

#[tokio::test]
async fn record_store_keeps_numbered_records_per_session() {
    let backend = MockBackend::spawn().await;
    let records = RecordStore::new(cache_for(&backend));

    assert!(records.store("s1", 1, b"page one").await);
    assert!(records.store("s1", 2, b"page two").await);
    assert!(records.store("s2", 1, b"other session").await);

    assert_eq!(backend.get_raw("page-s1-1"), Some(b"page one".to_vec()));
    assert_eq!(records.get("s1", 2).await, Some(b"page two".to_vec()));

    assert!(records.remove("s1", 1).await);
    assert_eq!(records.get("s1", 1).await, None);
    assert_eq!(records.get("s2", 1).await, Some(b"other session".to_vec()));
}

#[tokio::test]
async fn record_store_remove_all_only_touches_one_session() {
    let backend = MockBackend::spawn().await;
    let records = RecordStore::new(cache_for(&backend));

    assert!(records.store("s1", 1, b"a").await);
    assert!(records.store("s1", 2, b"b").await);
    assert!(records.store("s2", 1, b"c").await);

    assert_eq!(records.remove_all("s1").await, 2);
    assert_eq!(records.get("s1", 1).await, None);
    assert_eq!(records.get("s2", 1).await, Some(b"c".to_vec()));
}
