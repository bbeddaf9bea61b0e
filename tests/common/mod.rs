// tests/common/mod.rs
//
// Shared fixtures for the feed integration tests.
#![allow(dead_code)]

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use std::time::Duration;

use jeevadhara_live::feed::aggregator::FeedStatus;
use jeevadhara_live::store::memory::MemoryStore;
use jeevadhara_live::{LiveFeed, RetryPolicy};

pub const WAIT: Duration = Duration::from_secs(5);

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        base: Duration::from_millis(5),
        max: Duration::from_millis(20),
        max_retries: 0,
    }
}

fn ago(minutes: i64) -> String {
    (Utc::now() - ChronoDuration::minutes(minutes)).to_rfc3339()
}

pub fn issue(id: i64, minutes_ago: i64, status: &str, location: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Issue {id}"),
        "description": "Reported by residents",
        "domain": "water",
        "location_name": location,
        "status": status,
        "resolved_at": if status == "resolved" { Value::String(ago(minutes_ago)) } else { Value::Null },
        "updated_at": ago(minutes_ago),
    })
}

pub fn donation(id: i64, minutes_ago: i64, location: &str, anonymous: bool) -> Value {
    json!({
        "id": id,
        "project_name": format!("Project {id}"),
        "domain": "air",
        "location_name": location,
        "donor_name": "Meera Iyer",
        "is_anonymous": anonymous,
        "amount": 1000 + id,
        "created_at": ago(minutes_ago),
    })
}

pub fn milestone(id: i64, minutes_ago: i64, location: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Milestone {id}"),
        "domain": "waste",
        "location_name": location,
        "achieved_by_name": "Swachh Collective",
        "achieved_by_type": "ngo",
        "metric_value": 12.5,
        "metric_unit": "tons",
        "created_at": ago(minutes_ago),
    })
}

/// Wait until at least `n` change listeners are attached to the store.
pub async fn wait_listeners(store: &MemoryStore, n: usize) {
    tokio::time::timeout(WAIT, async {
        while store.active_listeners() < n {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("listeners attached");
}

/// Wait until no change listeners remain.
pub async fn wait_detached(store: &MemoryStore) {
    tokio::time::timeout(WAIT, async {
        while store.active_listeners() > 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("listeners detached");
}

pub fn revision(feed: &LiveFeed) -> u64 {
    feed.updates().borrow().revision
}

/// Wait until the feed publishes a revision past `after`.
pub async fn wait_revision(feed: &LiveFeed, after: u64) -> FeedStatus {
    let mut rx = feed.updates();
    let status = tokio::time::timeout(WAIT, rx.wait_for(|s| s.revision > after))
        .await
        .expect("feed updated in time")
        .expect("feed alive");
    *status
}

pub async fn mounted(store: &std::sync::Arc<MemoryStore>, variant: jeevadhara_live::FeedVariant) -> LiveFeed {
    let feed = LiveFeed::mount(store.clone(), variant, fast_retry());
    tokio::time::timeout(WAIT, feed.loaded())
        .await
        .expect("initial load finished");
    wait_listeners(store, 3).await;
    feed
}

pub fn ids(feed: &LiveFeed) -> Vec<String> {
    feed.items().into_iter().map(|i| i.id).collect()
}
