// tests/feed_unmount.rs
//
// After unmount (or drop) no subscription updates the feed and every
// listener is released.

mod common;

use common::*;
use jeevadhara_live::store::{memory::MemoryStore, Collection};
use jeevadhara_live::{FeedVariant, LiveFeed};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn unmount_stops_updates_and_releases_listeners() {
    let store = Arc::new(MemoryStore::new());
    store.seed(Collection::Donations, donation(1, 3, "Delhi", false));
    let feed = mounted(&store, FeedVariant::Compact).await;
    assert_eq!(feed.active_subscriptions(), 3);

    let rx = feed.updates();
    let last = rx.borrow().revision;

    feed.unmount().await;
    wait_detached(&store).await;

    store.insert(Collection::Donations, donation(2, 0, "Delhi", false));
    store.insert(Collection::Milestones, milestone(3, 0, "Delhi"));
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(rx.borrow().revision, last);
}

#[tokio::test]
async fn dropping_the_feed_also_releases_listeners() {
    let store = Arc::new(MemoryStore::new());
    let feed = mounted(&store, FeedVariant::Live).await;
    drop(feed);
    wait_detached(&store).await;
}

#[tokio::test]
async fn unmount_during_initial_load_never_subscribes() {
    let store = Arc::new(MemoryStore::new());
    let feed = LiveFeed::mount(store.clone(), FeedVariant::Live, fast_retry());
    feed.unmount().await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.active_listeners(), 0);
}
