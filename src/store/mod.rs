// src/store/mod.rs
//! External row-store seam.
//!
//! The feed only ever reads recent rows and listens for change events; the
//! store owns the data. Two adapters exist: an in-process store for tests and
//! offline demos, and a REST adapter for the hosted backend.

pub mod memory;
pub mod rest;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc;

/// The three logical collections the feed consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Issues,
    Donations,
    Milestones,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Issues,
        Collection::Donations,
        Collection::Milestones,
    ];

    /// Table name on the backend.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Issues => "issues",
            Collection::Donations => "donations",
            Collection::Milestones => "milestones",
        }
    }

    /// Column used for most-recent-first ordering in bulk reads.
    pub fn order_column(&self) -> &'static str {
        match self {
            Collection::Issues => "resolved_at",
            Collection::Donations | Collection::Milestones => "created_at",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => f.write_str("INSERT"),
            ChangeKind::Update => f.write_str("UPDATE"),
        }
    }
}

/// A row-level change notification.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub new: Value,
    /// Previous row image, when the backend supplies one.
    pub old: Option<Value>,
}

/// Bulk read: equality filter, most-recent-first, limited.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadQuery {
    pub collection: Collection,
    pub eq: Option<(String, String)>,
    pub limit: usize,
}

impl ReadQuery {
    pub fn recent(collection: Collection, limit: usize) -> Self {
        Self {
            collection,
            eq: None,
            limit,
        }
    }

    pub fn filter_eq(mut self, column: &str, value: &str) -> Self {
        self.eq = Some((column.to_string(), value.to_string()));
        self
    }
}

/// Receiving end of a change listener. Dropping it releases the listener.
pub type ChangeStream = mpsc::Receiver<ChangeEvent>;

#[async_trait::async_trait]
pub trait RowStore: Send + Sync {
    /// Most-recent-first rows matching `query`.
    async fn fetch_recent(&self, query: &ReadQuery) -> Result<Vec<Value>>;

    /// Open a change listener for one collection and event kind.
    async fn listen(&self, collection: Collection, kind: ChangeKind) -> Result<ChangeStream>;

    fn name(&self) -> &'static str;
}
