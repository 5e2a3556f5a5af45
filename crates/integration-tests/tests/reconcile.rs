//! Integration tests for guest-to-account reconciliation.
//!
//! Runs the reconciler end to end against the in-memory document and guest
//! stores, with fault injection for the failure paths.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tokio::sync::broadcast::error::TryRecvError;

use threadline_core::{
    CollectionPath, DesignId, DocumentPath, GUEST_BAG_KEY, GUEST_WISHLIST_KEY, UserId,
};
use threadline_integration_tests::{guest_with, seed_design};
use threadline_storefront::events::{EventBus, StorefrontEvent};
use threadline_storefront::services::{BagOutcome, SessionReconciler, WishlistOutcome};
use threadline_storefront::store::{DocumentStore, GuestStore, MemoryDocumentStore};

fn reconciler(store: &MemoryDocumentStore, events: &EventBus) -> SessionReconciler<MemoryDocumentStore> {
    SessionReconciler::new(store.clone(), events.clone())
}

async fn drafts_of(store: &MemoryDocumentStore, user: &str) -> Vec<Value> {
    let collection = CollectionPath::user_drafts(&UserId::new(user)).unwrap();
    store
        .list_documents(&collection)
        .await
        .unwrap()
        .into_iter()
        .map(|doc| Value::Object(doc.fields))
        .collect()
}

async fn wishlist_entry(store: &MemoryDocumentStore, user: &str, design: &str) -> Option<Value> {
    let path = DocumentPath::wishlist_entry(&UserId::new(user), &DesignId::new(design)).unwrap();
    store.get_document(&path).await.unwrap().map(Value::Object)
}

// ============================================================================
// Bag
// ============================================================================

#[tokio::test]
async fn test_bag_migrates_drafts_and_clears_guest_bag() {
    let store = MemoryDocumentStore::new();
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let guest = guest_with(
        Some(r#"[{"id":"g1","_displayDetails":{"title":"Rose"},"fabric":"silk","color":"red"}]"#),
        None,
    );

    let report = reconciler(&store, &events)
        .on_user_authenticated(&guest, &UserId::new("u1"))
        .await;

    assert!(report.bag_migrated());
    assert!(!guest.contains_key(GUEST_BAG_KEY).await);

    let drafts = drafts_of(&store, "u1").await;
    assert_eq!(drafts, vec![json!({"fabric": "silk", "color": "red"})]);

    // Exactly one notification.
    let event = rx.try_recv().unwrap();
    assert_eq!(
        event,
        StorefrontEvent::BagUpdated {
            user_id: UserId::new("u1")
        }
    );
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_bag_creates_one_draft_per_item() {
    let store = MemoryDocumentStore::new();
    let events = EventBus::default();
    let guest = guest_with(
        Some(r#"[{"id":"a","fabric":"linen"},{"id":"b","fabric":"linen"},{"fabric":"wool","measurements":{"chest":96}}]"#),
        None,
    );

    let outcome = reconciler(&store, &events)
        .migrate_bag(&guest, &UserId::new("u1"))
        .await;

    let BagOutcome::Migrated {
        drafts, cleared, ..
    } = outcome
    else {
        panic!("expected migrated, got {outcome:?}");
    };
    assert_eq!(drafts.len(), 3);
    assert!(cleared);

    let stored = drafts_of(&store, "u1").await;
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|d| d.get("id").is_none()));
    assert!(stored.contains(&json!({"fabric": "wool", "measurements": {"chest": 96}})));
}

#[tokio::test]
async fn test_empty_bag_makes_no_store_calls() {
    let store = MemoryDocumentStore::new();
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let guest = guest_with(Some("[]"), None);

    let outcome = reconciler(&store, &events)
        .migrate_bag(&guest, &UserId::new("u1"))
        .await;

    assert_eq!(outcome, BagOutcome::Empty);
    assert_eq!(store.operation_count(), 0);
    assert_eq!(
        guest.get(GUEST_BAG_KEY).await.unwrap().as_deref(),
        Some("[]")
    );
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_bag_write_failure_keeps_guest_bag() {
    let store = MemoryDocumentStore::new();
    store.fail_create_number(2).await;
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let raw = r#"[{"fabric":"silk"},{"fabric":"linen"},{"fabric":"wool"}]"#;
    let guest = guest_with(Some(raw), None);

    let outcome = reconciler(&store, &events)
        .migrate_bag(&guest, &UserId::new("u1"))
        .await;

    let BagOutcome::Failed {
        attempted,
        failed,
        created,
    } = outcome
    else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(attempted, 3);
    assert_eq!(failed, 1);
    // Successful creates are not rolled back.
    assert_eq!(created.len(), 2);
    assert_eq!(drafts_of(&store, "u1").await.len(), 2);

    assert_eq!(guest.get(GUEST_BAG_KEY).await.unwrap().as_deref(), Some(raw));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_bag_retry_after_failure_duplicates_earlier_drafts() {
    let store = MemoryDocumentStore::new();
    store.fail_create_number(2).await;
    let events = EventBus::default();
    let guest = guest_with(Some(r#"[{"fabric":"silk"},{"fabric":"wool"}]"#), None);
    let user = UserId::new("u1");
    let reconciler = reconciler(&store, &events);

    let first = reconciler.migrate_bag(&guest, &user).await;
    let BagOutcome::Failed { created, .. } = first else {
        panic!("expected failure, got {first:?}");
    };
    assert_eq!(created.len(), 1);
    assert!(guest.contains_key(GUEST_BAG_KEY).await);

    store.clear_faults().await;
    let second = reconciler.migrate_bag(&guest, &user).await;
    assert!(matches!(second, BagOutcome::Migrated { .. }));
    assert!(!guest.contains_key(GUEST_BAG_KEY).await);

    // The draft that survived the failed attempt is created again.
    let drafts = drafts_of(&store, "u1").await;
    assert_eq!(drafts.len(), 3);
    let silk = drafts.iter().filter(|d| d["fabric"] == "silk").count();
    let wool = drafts.iter().filter(|d| d["fabric"] == "wool").count();
    assert_eq!(silk + wool, 3);
    assert!(silk == 2 || wool == 2);
}

#[tokio::test]
async fn test_bag_skips_elements_that_are_not_objects() {
    let store = MemoryDocumentStore::new();
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let guest = guest_with(Some(r#"[{"fabric":"silk"}, 5]"#), None);

    let outcome = reconciler(&store, &events)
        .migrate_bag(&guest, &UserId::new("u1"))
        .await;

    let BagOutcome::Migrated {
        drafts,
        skipped,
        cleared,
    } = outcome
    else {
        panic!("expected migrated, got {outcome:?}");
    };
    assert_eq!(drafts.len(), 1);
    assert_eq!(skipped, 1);
    assert!(cleared);
    assert!(!guest.contains_key(GUEST_BAG_KEY).await);
    assert_eq!(drafts_of(&store, "u1").await, vec![json!({"fabric": "silk"})]);
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn test_malformed_bag_is_treated_as_empty() {
    let store = MemoryDocumentStore::new();
    let events = EventBus::default();
    let guest = guest_with(Some("{not json"), None);

    let outcome = reconciler(&store, &events)
        .migrate_bag(&guest, &UserId::new("u1"))
        .await;

    assert_eq!(outcome, BagOutcome::Empty);
    assert_eq!(store.operation_count(), 0);
    assert!(guest.contains_key(GUEST_BAG_KEY).await);
}

// ============================================================================
// Wishlist
// ============================================================================

#[tokio::test]
async fn test_wishlist_snapshots_existing_and_skips_missing() {
    let store = MemoryDocumentStore::new();
    seed_design(&store, "d1", json!({"name": "Rose Hoop", "price": "42.00"})).await;
    let events = EventBus::default();
    let guest = guest_with(None, Some(r#"["d1","d2"]"#));

    let started = Utc::now();
    let outcome = reconciler(&store, &events)
        .migrate_wishlist(&guest, &UserId::new("u1"))
        .await;
    let finished = Utc::now();

    assert_eq!(
        outcome,
        WishlistOutcome::Settled {
            saved: vec![DesignId::new("d1")],
            missing: vec![DesignId::new("d2")],
            failed: vec![],
            malformed: 0,
            cleared: true,
        }
    );
    assert!(!guest.contains_key(GUEST_WISHLIST_KEY).await);

    let entry = wishlist_entry(&store, "u1", "d1").await.unwrap();
    assert_eq!(entry["name"], "Rose Hoop");
    assert_eq!(entry["price"], "42.00");
    assert_eq!(entry["id"], "d1");

    let saved_at: DateTime<Utc> = entry["saved_at"].as_str().unwrap().parse().unwrap();
    assert!(started <= saved_at && saved_at <= finished);

    assert!(wishlist_entry(&store, "u1", "d2").await.is_none());
}

#[tokio::test]
async fn test_wishlist_clears_even_when_every_item_fails() {
    let store = MemoryDocumentStore::new();
    seed_design(&store, "d1", json!({"name": "Rose Hoop"})).await;
    seed_design(&store, "d2", json!({"name": "Tulip"})).await;
    store.fail_reads_at("designs/d1").await;
    store.fail_writes_at("users/u1/wishlist").await;
    let events = EventBus::default();
    let guest = guest_with(None, Some(r#"["d1","d2","d3"]"#));

    let outcome = reconciler(&store, &events)
        .migrate_wishlist(&guest, &UserId::new("u1"))
        .await;

    let WishlistOutcome::Settled {
        saved,
        missing,
        mut failed,
        cleared,
        ..
    } = outcome
    else {
        panic!("expected settled, got {outcome:?}");
    };
    assert!(saved.is_empty());
    assert_eq!(missing, vec![DesignId::new("d3")]);
    failed.sort();
    assert_eq!(failed, vec![DesignId::new("d1"), DesignId::new("d2")]);
    assert!(cleared);
    assert!(!guest.contains_key(GUEST_WISHLIST_KEY).await);
}

#[tokio::test]
async fn test_wishlist_skips_malformed_ids_and_still_clears() {
    let store = MemoryDocumentStore::new();
    seed_design(&store, "d1", json!({"name": "Rose Hoop"})).await;
    let events = EventBus::default();
    let guest = guest_with(Some(r#"[{"fabric":"silk"}, 5]"#), Some(r#"["d1", 5]"#));
    let user = UserId::new("u1");

    let report = reconciler(&store, &events)
        .on_user_authenticated(&guest, &user)
        .await;

    assert_eq!(
        report.wishlist,
        WishlistOutcome::Settled {
            saved: vec![DesignId::new("d1")],
            missing: vec![],
            failed: vec![],
            malformed: 1,
            cleared: true,
        }
    );
    assert!(report.bag_migrated());
    assert!(wishlist_entry(&store, "u1", "d1").await.is_some());
    assert!(!guest.contains_key(GUEST_WISHLIST_KEY).await);
    assert!(!guest.contains_key(GUEST_BAG_KEY).await);

    // Nothing is left to re-run on the next sign-in.
    let again = reconciler(&store, &events)
        .on_user_authenticated(&guest, &user)
        .await;
    assert_eq!(again.bag, BagOutcome::Empty);
    assert_eq!(again.wishlist, WishlistOutcome::Empty);
    assert_eq!(drafts_of(&store, "u1").await.len(), 1);
}

#[tokio::test]
async fn test_wishlist_failure_does_not_affect_other_items() {
    let store = MemoryDocumentStore::new();
    seed_design(&store, "d1", json!({"name": "Rose Hoop"})).await;
    seed_design(&store, "d2", json!({"name": "Tulip"})).await;
    store.fail_writes_at("users/u1/wishlist/d1").await;
    let events = EventBus::default();
    let guest = guest_with(None, Some(r#"["d1","d2"]"#));

    reconciler(&store, &events)
        .migrate_wishlist(&guest, &UserId::new("u1"))
        .await;

    assert!(wishlist_entry(&store, "u1", "d1").await.is_none());
    assert!(wishlist_entry(&store, "u1", "d2").await.is_some());
}

#[tokio::test]
async fn test_wishlist_rerun_overwrites_same_entry() {
    let store = MemoryDocumentStore::new();
    seed_design(&store, "d1", json!({"name": "Rose Hoop", "price": "42.00"})).await;
    let events = EventBus::default();
    let reconciler = reconciler(&store, &events);
    let user = UserId::new("u1");

    let first_guest = guest_with(None, Some(r#"["d1"]"#));
    reconciler.migrate_wishlist(&first_guest, &user).await;

    seed_design(&store, "d1", json!({"name": "Rose Hoop", "price": "45.00"})).await;
    let second_guest = guest_with(None, Some(r#"["d1"]"#));
    reconciler.migrate_wishlist(&second_guest, &user).await;

    let collection = CollectionPath::user_wishlist(&user).unwrap();
    let entries = store.list_documents(&collection).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fields["price"], "45.00");
}

#[tokio::test]
async fn test_wishlist_does_not_emit_bag_updated() {
    let store = MemoryDocumentStore::new();
    seed_design(&store, "d1", json!({"name": "Rose Hoop"})).await;
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let guest = guest_with(None, Some(r#"["d1"]"#));

    reconciler(&store, &events)
        .migrate_wishlist(&guest, &UserId::new("u1"))
        .await;

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

// ============================================================================
// Both passes
// ============================================================================

#[tokio::test]
async fn test_passes_are_independent() {
    let store = MemoryDocumentStore::new();
    seed_design(&store, "d1", json!({"name": "Rose Hoop"})).await;
    store.fail_writes_at("users/u1/drafts").await;
    let events = EventBus::default();
    let guest = guest_with(Some(r#"[{"fabric":"silk"}]"#), Some(r#"["d1"]"#));

    let report = reconciler(&store, &events)
        .on_user_authenticated(&guest, &UserId::new("u1"))
        .await;

    assert!(matches!(report.bag, BagOutcome::Failed { .. }));
    assert!(matches!(report.wishlist, WishlistOutcome::Settled { .. }));
    assert!(guest.contains_key(GUEST_BAG_KEY).await);
    assert!(!guest.contains_key(GUEST_WISHLIST_KEY).await);
    assert!(wishlist_entry(&store, "u1", "d1").await.is_some());
}

#[tokio::test]
async fn test_guest_state_stays_with_signed_in_user() {
    let store = MemoryDocumentStore::new();
    let events = EventBus::default();
    let guest = guest_with(Some(r#"[{"fabric":"silk"}]"#), None);

    reconciler(&store, &events)
        .on_user_authenticated(&guest, &UserId::new("u1"))
        .await;

    assert_eq!(drafts_of(&store, "u1").await.len(), 1);
    assert!(drafts_of(&store, "u2").await.is_empty());
}
