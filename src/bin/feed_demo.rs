//! Demo that drives an in-process store through a mount, a few live events, and an unmount.

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use jeevadhara_live::store::{memory::MemoryStore, Collection};
use jeevadhara_live::{FeedVariant, LiveFeed, RetryPolicy};

fn print_view(feed: &LiveFeed, label: &str) {
    let view = feed.view();
    println!(
        "-- {label}: {} items{}",
        view.items.len(),
        if view.is_sample { " (samples)" } else { "" }
    );
    for it in &view.items {
        println!(
            "   [{:<10}] {:<45} {:<25} {}",
            it.kind.as_str(),
            it.title,
            it.location,
            it.timestamp.format("%H:%M:%S")
        );
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store.seed(
        Collection::Issues,
        json!({
            "id": 1, "title": "Garbage pile cleared", "domain": "waste",
            "location_name": "Mysuru, Karnataka", "status": "resolved",
            "resolved_at": (now - Duration::minutes(30)).to_rfc3339()
        }),
    );
    store.seed(
        Collection::Donations,
        json!({
            "id": 7, "project_name": "Lake Revival", "domain": "water",
            "location_name": "Bengaluru, Karnataka", "donor_name": "Ravi",
            "is_anonymous": true, "amount": 1500,
            "created_at": (now - Duration::minutes(10)).to_rfc3339()
        }),
    );

    let feed = LiveFeed::mount(store.clone(), FeedVariant::Compact, RetryPolicy::default());
    print_view(&feed, "mounting");
    feed.loaded().await;
    print_view(&feed, "loaded");

    let mut updates = feed.updates();
    for _ in 0..50 {
        if store.active_listeners() >= 3 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    store.insert(
        Collection::Milestones,
        json!({
            "id": 3, "title": "5,000 saplings planted", "domain": "air",
            "location_name": "Pune, Maharashtra", "achieved_by_name": "Green Pune",
            "metric_value": 5000, "metric_unit": "saplings",
            "created_at": Utc::now().to_rfc3339()
        }),
    );
    let _ = updates.changed().await;
    print_view(&feed, "after milestone");

    feed.unmount().await;
    println!("feed-demo done");
}
