// src/store/rest.rs
//! Hosted backend adapter (PostgREST-style HTTP API).
//!
//! Bulk reads map directly onto `GET /rest/v1/{table}`. Change listening is a
//! polling loop over the same endpoint using a monotonically advancing
//! timestamp cursor; after repeated poll failures the stream ends so the
//! subscription layer can reconnect with backoff.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use super::{ChangeEvent, ChangeKind, ChangeStream, Collection, ReadQuery, RowStore};

const MAX_CONSECUTIVE_POLL_FAILURES: u32 = 3;
const POLL_PAGE: usize = 50;

#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    api_key: String,
    client: Client,
    timeout: Duration,
    poll_interval: Duration,
    /// Cursors left behind by listeners whose stream ended, keyed by what they watched.
    cursors: Arc<Mutex<HashMap<(Collection, ChangeKind), DateTime<Utc>>>>,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            cursors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn lock_cursors(&self) -> MutexGuard<'_, HashMap<(Collection, ChangeKind), DateTime<Utc>>> {
        self.cursors.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table())
    }

    async fn get_rows(&self, collection: Collection, params: &[(String, String)]) -> Result<Vec<Value>> {
        let resp = self
            .client
            .get(self.table_url(collection))
            .timeout(self.timeout)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(params)
            .send()
            .await
            .with_context(|| format!("GET {collection}"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("GET {collection} status"))?;
        let rows: Vec<Value> = resp
            .json()
            .await
            .with_context(|| format!("decode {collection} body"))?;
        Ok(rows)
    }
}

/// Query parameters for a most-recent-first bulk read.
pub fn read_params(query: &ReadQuery) -> Vec<(String, String)> {
    let mut params = vec![
        ("select".to_string(), "*".to_string()),
        (
            "order".to_string(),
            format!("{}.desc.nullslast", query.collection.order_column()),
        ),
        ("limit".to_string(), query.limit.to_string()),
    ];
    if let Some((col, val)) = &query.eq {
        params.push((col.clone(), format!("eq.{val}")));
    }
    params
}

/// Column whose advance marks a change of `kind`. Issue updates follow
/// `resolved_at`, so edits to an issue that is already resolved never show up
/// as a change.
pub fn cursor_column(collection: Collection, kind: ChangeKind) -> &'static str {
    match (collection, kind) {
        (Collection::Issues, ChangeKind::Update) => "resolved_at",
        (_, ChangeKind::Insert) => "created_at",
        (_, ChangeKind::Update) => "updated_at",
    }
}

fn format_cursor(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Query parameters for one poll: rows whose cursor moved past `since`, oldest
/// first. Without a cursor every row that has one qualifies.
pub fn poll_params(
    collection: Collection,
    kind: ChangeKind,
    since: Option<DateTime<Utc>>,
) -> Vec<(String, String)> {
    let col = cursor_column(collection, kind);
    let bound = match since {
        Some(ts) => format!("gt.{}", format_cursor(ts)),
        None => "not.is.null".to_string(),
    };
    vec![
        ("select".to_string(), "*".to_string()),
        (col.to_string(), bound),
        ("order".to_string(), format!("{col}.asc")),
        ("limit".to_string(), POLL_PAGE.to_string()),
    ]
}

/// Query parameters for the newest row by cursor column; seeds a fresh listener.
pub fn latest_params(collection: Collection, kind: ChangeKind) -> Vec<(String, String)> {
    let col = cursor_column(collection, kind);
    vec![
        ("select".to_string(), "*".to_string()),
        (col.to_string(), "not.is.null".to_string()),
        ("order".to_string(), format!("{col}.desc.nullslast")),
        ("limit".to_string(), "1".to_string()),
    ]
}

fn row_cursor(row: &Value, collection: Collection, kind: ChangeKind) -> Option<DateTime<Utc>> {
    row.get(cursor_column(collection, kind))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

#[async_trait::async_trait]
impl RowStore for RestStore {
    async fn fetch_recent(&self, query: &ReadQuery) -> Result<Vec<Value>> {
        self.get_rows(query.collection, &read_params(query)).await
    }

    async fn listen(&self, collection: Collection, kind: ChangeKind) -> Result<ChangeStream> {
        let key = (collection, kind);
        let resumed = self.lock_cursors().remove(&key);

        // The open request checks the backend is reachable and, for a fresh
        // listener, takes the starting cursor from the backend's own rows.
        let latest = match self
            .get_rows(collection, &latest_params(collection, kind))
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                if let Some(ts) = resumed {
                    self.lock_cursors().insert(key, ts);
                }
                return Err(e.context(format!("open {kind} listener on {collection}")));
            }
        };
        let mut since =
            resumed.or_else(|| latest.first().and_then(|r| row_cursor(r, collection, kind)));
        tracing::debug!(
            %collection,
            %kind,
            resumed = resumed.is_some(),
            since = ?since,
            "poll listener open"
        );

        let (tx, rx) = mpsc::channel(POLL_PAGE);
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            let mut failures = 0u32;
            loop {
                tokio::select! {
                    _ = tx.closed() => return,
                    _ = ticker.tick() => {}
                }
                match store
                    .get_rows(collection, &poll_params(collection, kind, since))
                    .await
                {
                    Ok(rows) => {
                        failures = 0;
                        for row in rows {
                            if let Some(ts) = row_cursor(&row, collection, kind) {
                                since = Some(since.map_or(ts, |s| s.max(ts)));
                            }
                            let ev = ChangeEvent {
                                collection,
                                kind,
                                new: row,
                                old: None,
                            };
                            if tx.send(ev).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        counter!("feed_poll_errors_total", "collection" => collection.table())
                            .increment(1);
                        tracing::warn!(error = ?e, %collection, failures, "poll failed");
                        if failures >= MAX_CONSECUTIVE_POLL_FAILURES {
                            break;
                        }
                    }
                }
            }
            // Hand the cursor to the next listener so the reconnect resumes here.
            if let Some(ts) = since {
                store.lock_cursors().insert(key, ts);
            }
        });
        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
