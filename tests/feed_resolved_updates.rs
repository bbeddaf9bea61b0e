// tests/feed_resolved_updates.rs
//
// Issue updates only surface when they move an issue into `resolved`.

mod common;

use common::*;
use jeevadhara_live::store::{memory::MemoryStore, Collection};
use jeevadhara_live::FeedVariant;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn status_transition_to_resolved_emits_once() {
    let store = Arc::new(MemoryStore::new());
    store.seed(Collection::Issues, issue(7, 60, "reported", "Kochi, Kerala"));

    let feed = mounted(&store, FeedVariant::Live).await;
    assert!(feed.items().is_empty());

    // Unrelated edit: still reported, nothing happens.
    store
        .update(Collection::Issues, &json!(7), json!({ "title": "Drain blocked" }))
        .unwrap();

    let before = revision(&feed);
    store
        .update(
            Collection::Issues,
            &json!(7),
            json!({ "status": "resolved", "resolved_at": chrono::Utc::now().to_rfc3339() }),
        )
        .unwrap();
    wait_revision(&feed, before).await;
    assert_eq!(ids(&feed), vec!["resolution-7"]);
    assert_eq!(feed.items()[0].title, "Drain blocked");

    // Editing the already-resolved issue must not duplicate it.
    let after = revision(&feed);
    store
        .update(Collection::Issues, &json!(7), json!({ "description": "Fixed by ward 12" }))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(revision(&feed), after);
    assert_eq!(feed.items().len(), 1);

    feed.unmount().await;
}

#[tokio::test]
async fn issue_inserts_are_not_watched() {
    let store = Arc::new(MemoryStore::new());
    let feed = mounted(&store, FeedVariant::Compact).await;
    let before = revision(&feed);
    store.insert(Collection::Issues, issue(1, 0, "resolved", "Delhi"));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(revision(&feed), before);
    feed.unmount().await;
}
