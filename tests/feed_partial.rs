// tests/feed_partial.rs
//
// Failing or malformed sources degrade to partial data, never to an error.

mod common;

use chrono::Utc;
use common::*;
use jeevadhara_live::store::{memory::MemoryStore, Collection};
use jeevadhara_live::FeedVariant;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn one_failing_source_keeps_the_others() {
    let store = Arc::new(MemoryStore::new());
    store.seed(Collection::Issues, issue(1, 2, "resolved", "Delhi"));
    store.seed(Collection::Donations, donation(2, 1, "Delhi", false));
    store.seed(Collection::Milestones, milestone(3, 3, "Delhi"));
    store.fail_reads(Collection::Donations);

    let feed = mounted(&store, FeedVariant::Compact).await;
    assert_eq!(ids(&feed), vec!["resolution-1", "milestone-3"]);
    feed.unmount().await;
}

#[tokio::test]
async fn all_sources_failing_falls_back_to_samples() {
    let store = Arc::new(MemoryStore::new());
    for c in Collection::ALL {
        store.fail_reads(c);
    }
    let feed = mounted(&store, FeedVariant::Compact).await;
    let view = feed.view_at(Utc::now());
    assert!(!view.loading);
    assert!(view.is_sample);
    feed.unmount().await;
}

#[tokio::test]
async fn malformed_rows_are_skipped_at_load_and_live() {
    let store = Arc::new(MemoryStore::new());
    store.seed(Collection::Donations, donation(1, 5, "Delhi", false));
    store.seed(
        Collection::Donations,
        json!({ "id": 2, "domain": "air", "created_at": Utc::now().to_rfc3339(), "amount": -50 }),
    );
    store.seed(
        Collection::Milestones,
        json!({ "id": 3, "domain": "noise", "created_at": Utc::now().to_rfc3339() }),
    );

    let feed = mounted(&store, FeedVariant::Compact).await;
    assert_eq!(ids(&feed), vec!["donation-1"]);

    // A bad live row is dropped; the next good one still arrives.
    store.insert(Collection::Donations, json!({ "id": 4, "amount": 10 }));
    let before = revision(&feed);
    store.insert(Collection::Donations, donation(5, 0, "Delhi", false));
    wait_revision(&feed, before).await;
    assert_eq!(ids(&feed), vec!["donation-5", "donation-1"]);

    assert!(feed
        .items()
        .iter()
        .filter_map(|i| i.amount)
        .all(|a| a >= 0.0));
    feed.unmount().await;
}

#[tokio::test]
async fn subscription_recovers_after_channel_failure() {
    let store = Arc::new(MemoryStore::new());
    store.fail_listens(Collection::Milestones);

    let feed = jeevadhara_live::LiveFeed::mount(store.clone(), FeedVariant::Compact, fast_retry());
    feed.loaded().await;
    wait_listeners(&store, 2).await;
    assert_eq!(store.active_listeners(), 2);

    store.restore_listens(Collection::Milestones);
    wait_listeners(&store, 3).await;

    let before = revision(&feed);
    store.insert(Collection::Milestones, milestone(1, 0, "Delhi"));
    wait_revision(&feed, before).await;
    assert_eq!(ids(&feed), vec!["milestone-1"]);
    feed.unmount().await;
}
