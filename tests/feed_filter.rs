// tests/feed_filter.rs
//
// Dashboard filters on a known fixture list.

mod common;

use chrono::{TimeZone, Utc};
use common::*;
use jeevadhara_live::feed::filter::{FeedFilter, FilterParams};
use jeevadhara_live::feed::item::{Domain, FeedItem, FeedKind};
use jeevadhara_live::store::{memory::MemoryStore, Collection};
use jeevadhara_live::FeedVariant;
use std::sync::Arc;

fn item(id: &str, kind: FeedKind, location: &str) -> FeedItem {
    FeedItem {
        id: id.into(),
        kind,
        title: id.into(),
        description: String::new(),
        domain: Domain::Water,
        location: location.into(),
        timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        contributor: None,
        amount: matches!(kind, FeedKind::Donation).then_some(100.0),
        metric: None,
    }
}

fn fixture() -> Vec<FeedItem> {
    vec![
        item("d1", FeedKind::Donation, "Bengaluru, Karnataka"),
        item("d2", FeedKind::Donation, "Mumbai, Maharashtra"),
        item("r1", FeedKind::Resolution, "Mysuru, Karnataka"),
        item("d3", FeedKind::Donation, "hubballi, KARNATAKA"),
        item("m1", FeedKind::Milestone, "Karnataka coast"),
    ]
}

fn filter(kind: &str, region: &str) -> FeedFilter {
    FeedFilter::from_params(&FilterParams {
        kind: Some(kind.into()),
        region: Some(region.into()),
    })
    .unwrap()
}

#[test]
fn donation_in_karnataka_is_exact_subset() {
    let out = filter("donation", "Karnataka").apply(&fixture());
    let ids: Vec<_> = out.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["d1", "d3"]);
}

#[test]
fn all_and_all_regions_keep_everything() {
    assert_eq!(filter("all", "all").apply(&fixture()).len(), 5);
    let out = filter("all", "Karnataka").apply(&fixture());
    assert_eq!(out.len(), 4);
    let out = filter("milestone", "all").apply(&fixture());
    assert_eq!(out.len(), 1);
}

#[tokio::test]
async fn filters_apply_to_capped_live_list_without_requery() {
    let store = Arc::new(MemoryStore::new());
    store.seed(Collection::Donations, donation(1, 1, "Bengaluru, Karnataka", false));
    store.seed(Collection::Donations, donation(2, 2, "Delhi", false));
    store.seed(Collection::Issues, issue(3, 3, "resolved", "Mysuru, Karnataka"));

    let feed = mounted(&store, FeedVariant::Live).await;
    // Reads failing now must not matter: filtering never goes back to the store.
    for c in Collection::ALL {
        store.fail_reads(c);
    }

    let view = feed.filtered_view_at(&filter("donation", "karnataka"), Utc::now());
    let ids: Vec<_> = view.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["donation-1"]);
    assert_eq!(feed.items().len(), 3);

    feed.unmount().await;
}
