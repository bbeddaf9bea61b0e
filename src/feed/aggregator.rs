//! # Live feed aggregator
//! Merges resolved issues, donations and milestones into one bounded,
//! newest-first list and keeps it current from three change subscriptions.
//!
//! Lifecycle:
//! 1. `mount` returns immediately with `loading = true` and spawns the load task.
//! 2. The load task reads the three sources concurrently. A failing source
//!    counts as zero rows; partial data beats no data.
//! 3. Rows are decoded, merged, sorted newest first and capped; `loading` flips off.
//! 4. Three subscriptions open: issue updates (only transitions to resolved),
//!    donation inserts, milestone inserts. Each qualifying row is prepended,
//!    evicting the oldest item once the cap is reached.
//! 5. `unmount` (or drop) stops everything; no update lands after it.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::feed::buffer::FeedBuffer;
use crate::feed::filter::FeedFilter;
use crate::feed::item::FeedItem;
use crate::feed::rows::{SourceRow, RESOLVED_STATUS};
use crate::feed::samples::FeedView;
use crate::feed::variant::FeedVariant;
use crate::realtime::{subscribe, RetryPolicy, Subscription};
use crate::store::{ChangeEvent, ChangeKind, Collection, ReadQuery, RowStore};

/// Render trigger published on every list or loading-flag change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedStatus {
    pub revision: u64,
    pub loading: bool,
}

#[derive(Debug)]
struct FeedState {
    buffer: FeedBuffer,
    loading: bool,
    mounted: bool,
}

struct Shared {
    variant: FeedVariant,
    state: Mutex<FeedState>,
    status: watch::Sender<FeedStatus>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, st: &FeedState) {
        gauge!("feed_items", "variant" => self.variant.as_str()).set(st.buffer.len() as f64);
        self.status.send_modify(|s| {
            s.revision += 1;
            s.loading = st.loading;
        });
    }

    /// Prepend a realtime item unless unmounted or already present.
    fn apply_realtime(&self, item: FeedItem) {
        let mut st = self.lock();
        if !st.mounted {
            return;
        }
        if st.buffer.contains_id(&item.id) {
            tracing::debug!(id = %item.id, "duplicate realtime item ignored");
            return;
        }
        tracing::debug!(id = %item.id, kind = %item.kind, "realtime item");
        if st.buffer.push_front(item).is_some() {
            counter!("feed_evicted_total").increment(1);
        }
        self.publish(&st);
    }
}

pub struct LiveFeed {
    shared: Arc<Shared>,
    loader: Option<JoinHandle<()>>,
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
}

impl LiveFeed {
    /// Start the feed. Returns at once; the initial load runs in the background.
    pub fn mount(store: Arc<dyn RowStore>, variant: FeedVariant, policy: RetryPolicy) -> Self {
        let (status, _) = watch::channel(FeedStatus {
            revision: 0,
            loading: true,
        });
        let shared = Arc::new(Shared {
            variant,
            state: Mutex::new(FeedState {
                buffer: FeedBuffer::with_cap(variant.cap()),
                loading: true,
                mounted: true,
            }),
            status,
        });
        let subscriptions = Arc::new(Mutex::new(Vec::new()));

        let loader = {
            let shared = shared.clone();
            let subscriptions = subscriptions.clone();
            tokio::spawn(async move {
                let items = initial_load(store.as_ref(), variant).await;
                {
                    let mut st = shared.lock();
                    if !st.mounted {
                        return;
                    }
                    st.buffer.load(items);
                    st.loading = false;
                    tracing::info!(
                        variant = variant.as_str(),
                        items = st.buffer.len(),
                        store = store.name(),
                        "feed loaded"
                    );
                    shared.publish(&st);
                }

                let opened = open_subscriptions(store, shared.clone(), policy);
                let still_mounted = shared.lock().mounted;
                if still_mounted {
                    subscriptions
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .extend(opened);
                }
            })
        };

        Self {
            shared,
            loader: Some(loader),
            subscriptions,
        }
    }

    pub fn variant(&self) -> FeedVariant {
        self.shared.variant
    }

    pub fn is_loading(&self) -> bool {
        self.shared.lock().loading
    }

    /// Current live items, newest first. Never includes samples.
    pub fn items(&self) -> Vec<FeedItem> {
        self.shared.lock().buffer.to_vec()
    }

    /// Render trigger; changes on every list update and loading transition.
    pub fn updates(&self) -> watch::Receiver<FeedStatus> {
        self.shared.status.subscribe()
    }

    /// Wait until the initial load has completed.
    pub async fn loaded(&self) {
        let mut rx = self.updates();
        // The sender lives as long as `self`, so this cannot fail while borrowed.
        let _ = rx.wait_for(|s| !s.loading).await;
    }

    /// Number of subscriptions currently running.
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|s| s.is_active())
            .count()
    }

    /// What the widget should render at `now`: live items, or samples if empty.
    pub fn view_at(&self, now: DateTime<Utc>) -> FeedView {
        let (loading, live) = {
            let st = self.shared.lock();
            (st.loading, st.buffer.to_vec())
        };
        FeedView::resolve(self.shared.variant, loading, live, now)
    }

    pub fn view(&self) -> FeedView {
        self.view_at(Utc::now())
    }

    /// Dashboard rendering: resolve the view, then apply `filter` to what is displayed.
    pub fn filtered_view_at(&self, filter: &FeedFilter, now: DateTime<Utc>) -> FeedView {
        let mut view = self.view_at(now);
        view.items = filter.apply(&view.items);
        view
    }

    /// Tear down: no state update happens after this returns.
    pub async fn unmount(mut self) {
        self.shared.lock().mounted = false;
        if let Some(loader) = self.loader.take() {
            loader.abort();
            let _ = loader.await;
        }
        let subs: Vec<Subscription> = std::mem::take(
            &mut *self
                .subscriptions
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );
        for sub in subs {
            sub.shutdown().await;
        }
        tracing::info!(variant = self.shared.variant.as_str(), "feed unmounted");
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.shared.lock().mounted = false;
        if let Some(loader) = self.loader.take() {
            loader.abort();
        }
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

/// True when an issue update moves the row into `resolved`.
///
/// Without an old image only the new status can be checked; duplicates are
/// then caught by id when the item is applied.
pub fn resolved_transition(ev: &ChangeEvent) -> bool {
    let is_resolved = |row: &Value| {
        row.get("status")
            .and_then(Value::as_str)
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(RESOLVED_STATUS))
    };
    if !is_resolved(&ev.new) {
        return false;
    }
    match &ev.old {
        Some(old) if old.get("status").is_some() => !is_resolved(old),
        _ => true,
    }
}

/// Decode rows from one source, skipping (and logging) invalid ones.
pub fn decode_rows(collection: Collection, rows: Vec<Value>) -> Vec<FeedItem> {
    let mut out = Vec::with_capacity(rows.len());
    for raw in rows {
        match SourceRow::decode(collection, raw) {
            Ok(row) => out.push(row.into_item()),
            Err(e) => {
                counter!("feed_rejected_rows_total", "collection" => collection.table())
                    .increment(1);
                tracing::warn!(error = %e, %collection, "row rejected");
            }
        }
    }
    out
}

async fn fetch_source(store: &dyn RowStore, query: ReadQuery) -> Vec<FeedItem> {
    let collection = query.collection;
    match store.fetch_recent(&query).await {
        Ok(rows) => {
            counter!("feed_initial_rows_total", "collection" => collection.table())
                .increment(rows.len() as u64);
            decode_rows(collection, rows)
        }
        Err(e) => {
            counter!("feed_source_errors_total", "collection" => collection.table()).increment(1);
            tracing::warn!(error = ?e, %collection, "initial load failed; treating as empty");
            Vec::new()
        }
    }
}

/// Read all three sources concurrently and concatenate the decoded items.
pub async fn initial_load(store: &dyn RowStore, variant: FeedVariant) -> Vec<FeedItem> {
    let n = variant.page_size();
    let (mut issues, mut donations, mut milestones) = tokio::join!(
        fetch_source(
            store,
            ReadQuery::recent(Collection::Issues, n).filter_eq("status", RESOLVED_STATUS)
        ),
        fetch_source(store, ReadQuery::recent(Collection::Donations, n)),
        fetch_source(store, ReadQuery::recent(Collection::Milestones, n)),
    );
    let mut all = Vec::with_capacity(issues.len() + donations.len() + milestones.len());
    all.append(&mut issues);
    all.append(&mut donations);
    all.append(&mut milestones);
    all
}

fn open_subscriptions(
    store: Arc<dyn RowStore>,
    shared: Arc<Shared>,
    policy: RetryPolicy,
) -> Vec<Subscription> {
    let specs: [(Collection, ChangeKind, fn(&ChangeEvent) -> bool); 3] = [
        (Collection::Issues, ChangeKind::Update, resolved_transition),
        (Collection::Donations, ChangeKind::Insert, |_| true),
        (Collection::Milestones, ChangeKind::Insert, |_| true),
    ];
    specs
        .into_iter()
        .map(|(collection, kind, filter)| {
            let shared = shared.clone();
            subscribe(
                store.clone(),
                collection,
                kind,
                filter,
                move |ev: ChangeEvent| match SourceRow::decode(ev.collection, ev.new) {
                    Ok(row) => {
                        counter!("feed_realtime_items_total", "collection" => collection.table())
                            .increment(1);
                        shared.apply_realtime(row.into_item());
                    }
                    Err(e) => {
                        counter!("feed_rejected_rows_total", "collection" => collection.table())
                            .increment(1);
                        tracing::warn!(error = %e, %collection, "realtime row rejected");
                    }
                },
                policy,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(new: Value, old: Option<Value>) -> ChangeEvent {
        ChangeEvent {
            collection: Collection::Issues,
            kind: ChangeKind::Update,
            new,
            old,
        }
    }

    #[test]
    fn resolved_transition_requires_status_change() {
        assert!(resolved_transition(&update(
            json!({ "status": "resolved" }),
            Some(json!({ "status": "in_progress" }))
        )));
        // Edit of an already-resolved issue does not re-emit.
        assert!(!resolved_transition(&update(
            json!({ "status": "resolved" }),
            Some(json!({ "status": "resolved" }))
        )));
        // Old image without columns (primary key only) falls back to new status.
        assert!(resolved_transition(&update(
            json!({ "status": "resolved" }),
            Some(json!({ "id": 1 }))
        )));
        assert!(!resolved_transition(&update(json!({ "status": "reported" }), None)));
    }

    #[test]
    fn decode_rows_skips_invalid() {
        let items = decode_rows(
            Collection::Donations,
            vec![
                json!({ "id": 1, "domain": "air", "created_at": "2024-01-01T00:00:00Z", "amount": 10 }),
                json!({ "id": 2, "domain": "air", "created_at": "2024-01-01T00:00:00Z", "amount": -1 }),
                json!("garbage"),
            ],
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "donation-1");
    }
}
