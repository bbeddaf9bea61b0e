//! Display-ready feed entries.
//!
//! A [`FeedItem`] is a normalized projection over one row of the issues,
//! donations or milestones collection. Items are built once and never
//! mutated; a status change upstream produces a brand-new item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which source collection produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Resolution,
    Donation,
    Milestone,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Resolution => "resolution",
            FeedKind::Donation => "donation",
            FeedKind::Milestone => "milestone",
        }
    }

    /// Parse a kind tag (case-insensitive). Returns `None` for unknown tags.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resolution" => Some(FeedKind::Resolution),
            "donation" => Some(FeedKind::Donation),
            "milestone" => Some(FeedKind::Milestone),
            _ => None,
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environmental category. Drives icon/colour selection only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Water,
    Air,
    Waste,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Water => "water",
            Domain::Air => "air",
            Domain::Waste => "waste",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water" => Some(Domain::Water),
            "air" => Some(Domain::Air),
            "waste" => Some(Domain::Waste),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantified milestone achievement, e.g. `{ value: 500.0, unit: "trees" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    /// `{kind}-{row id}`; unique within one feed list.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FeedKind,
    pub title: String,
    pub description: String,
    pub domain: Domain,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
}

/// Build the collision-free item id for a source row.
pub fn item_id(kind: FeedKind, row_id: &str) -> String {
    format!("{}-{}", kind.as_str(), row_id)
}
