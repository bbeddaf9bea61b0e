// src/store/memory.rs
//! In-process row store with broadcast change notifications.
//!
//! Backs the integration tests, the demo binary, and the service when no
//! hosted backend is configured. Reads and listens can be made to fail per
//! collection to exercise the feed's degraded paths.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::{broadcast, mpsc};

use super::{ChangeEvent, ChangeKind, ChangeStream, Collection, ReadQuery, RowStore};

const CHANNEL_CAPACITY: usize = 256;

pub struct MemoryStore {
    tables: Mutex<HashMap<Collection, Vec<Value>>>,
    failing_reads: Mutex<HashSet<Collection>>,
    failing_listens: Mutex<HashSet<Collection>>,
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tables: Mutex::new(HashMap::new()),
            failing_reads: Mutex::new(HashSet::new()),
            failing_listens: Mutex::new(HashSet::new()),
            tx,
        }
    }

    /// Seed a row without emitting a change event.
    pub fn seed(&self, collection: Collection, row: Value) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.entry(collection).or_default().push(row);
    }

    /// Insert a row and notify listeners.
    pub fn insert(&self, collection: Collection, row: Value) {
        self.seed(collection, row.clone());
        self.emit(ChangeEvent {
            collection,
            kind: ChangeKind::Insert,
            new: row,
            old: None,
        });
    }

    /// Merge `patch` into the row with `id` and notify listeners with both images.
    pub fn update(&self, collection: Collection, id: &Value, patch: Value) -> Result<()> {
        let (old, new) = {
            let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
            let rows = tables.entry(collection).or_default();
            let row = rows
                .iter_mut()
                .find(|r| r.get("id") == Some(id))
                .ok_or_else(|| anyhow!("{collection}: no row with id {id}"))?;
            let old = row.clone();
            if let (Value::Object(dst), Value::Object(src)) = (&mut *row, patch) {
                for (k, v) in src {
                    dst.insert(k, v);
                }
            }
            (old, row.clone())
        };
        self.emit(ChangeEvent {
            collection,
            kind: ChangeKind::Update,
            new,
            old: Some(old),
        });
        Ok(())
    }

    /// Make bulk reads of `collection` fail.
    pub fn fail_reads(&self, collection: Collection) {
        self.failing_reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection);
    }

    /// Make opening listeners on `collection` fail until `restore_listens`.
    pub fn fail_listens(&self, collection: Collection) {
        self.failing_listens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection);
    }

    pub fn restore_listens(&self, collection: Collection) {
        self.failing_listens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&collection);
    }

    /// Number of listener forwarders still attached.
    pub fn active_listeners(&self) -> usize {
        self.tx.receiver_count()
    }

    fn emit(&self, ev: ChangeEvent) {
        // No receivers is fine: nobody is mounted.
        let _ = self.tx.send(ev);
    }
}

fn order_key(collection: Collection, row: &Value) -> Option<DateTime<Utc>> {
    let parse = |field: &str| {
        row.get(field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
    };
    match collection {
        Collection::Issues => parse("resolved_at").or_else(|| parse("updated_at")),
        _ => parse(collection.order_column()),
    }
}

fn matches_eq(row: &Value, eq: &Option<(String, String)>) -> bool {
    match eq {
        None => true,
        Some((col, want)) => match row.get(col) {
            Some(Value::String(s)) => s == want,
            Some(other) => other.to_string() == *want,
            None => false,
        },
    }
}

#[async_trait::async_trait]
impl RowStore for MemoryStore {
    async fn fetch_recent(&self, query: &ReadQuery) -> Result<Vec<Value>> {
        if self
            .failing_reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&query.collection)
        {
            return Err(anyhow!("{}: simulated read failure", query.collection));
        }

        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<Value> = tables
            .get(&query.collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| matches_eq(r, &query.eq))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| {
            order_key(query.collection, b).cmp(&order_key(query.collection, a))
        });
        rows.truncate(query.limit);
        Ok(rows)
    }

    async fn listen(&self, collection: Collection, kind: ChangeKind) -> Result<ChangeStream> {
        if self
            .failing_listens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&collection)
        {
            return Err(anyhow!("{collection}: simulated channel failure"));
        }

        let mut rx = self.tx.subscribe();
        let (tx, out) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) if ev.collection == collection && ev.kind == kind => {
                            if tx.send(ev).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(%collection, skipped = n, "memory listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_orders_newest_first_and_limits() {
        let store = MemoryStore::new();
        for (id, ts) in [(1, "2024-01-01T00:00:00Z"), (2, "2024-03-01T00:00:00Z"), (3, "2024-02-01T00:00:00Z")] {
            store.seed(Collection::Donations, json!({ "id": id, "created_at": ts }));
        }
        let rows = store
            .fetch_recent(&ReadQuery::recent(Collection::Donations, 2))
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().filter_map(|r| r["id"].as_i64()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn eq_filter_applies() {
        let store = MemoryStore::new();
        store.seed(Collection::Issues, json!({ "id": 1, "status": "open" }));
        store.seed(Collection::Issues, json!({ "id": 2, "status": "resolved" }));
        let q = ReadQuery::recent(Collection::Issues, 10).filter_eq("status", "resolved");
        let rows = store.fetch_recent(&q).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 2);
    }

    #[tokio::test]
    async fn listener_only_sees_its_collection_and_kind() {
        let store = MemoryStore::new();
        let mut rx = store
            .listen(Collection::Issues, ChangeKind::Update)
            .await
            .unwrap();
        store.insert(Collection::Issues, json!({ "id": 1, "status": "open" }));
        store.insert(Collection::Donations, json!({ "id": 1 }));
        store
            .update(Collection::Issues, &json!(1), json!({ "status": "resolved" }))
            .unwrap();

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, ChangeKind::Update);
        assert_eq!(ev.new["status"], "resolved");
        assert_eq!(ev.old.unwrap()["status"], "open");
    }

    #[tokio::test]
    async fn dropping_stream_detaches_forwarder() {
        let store = MemoryStore::new();
        let rx = store
            .listen(Collection::Milestones, ChangeKind::Insert)
            .await
            .unwrap();
        assert_eq!(store.active_listeners(), 1);
        drop(rx);
        for _ in 0..50 {
            if store.active_listeners() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(store.active_listeners(), 0);
    }
}
