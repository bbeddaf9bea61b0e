//! Typed source rows and the row → [`FeedItem`] derivation rules.
//!
//! Rows arrive as loose JSON (bulk reads and change payloads alike). They are
//! decoded into one variant per collection and validated here, so malformed
//! rows are rejected at the boundary instead of leaking empty fields into the feed.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::feed::item::{item_id, Domain, FeedItem, FeedKind, Metric};
use crate::store::Collection;

pub const ANONYMOUS_DONOR: &str = "Anonymous Donor";
pub const DEFAULT_ISSUE_TITLE: &str = "Environmental issue resolved";
pub const DEFAULT_ISSUE_DESCRIPTION: &str = "A community-reported issue has been resolved.";
pub const DEFAULT_DONATION_TITLE: &str = "New donation received";
pub const DEFAULT_MILESTONE_TITLE: &str = "Milestone achieved";
pub const UNKNOWN_LOCATION: &str = "Unknown location";
pub const RESOLVED_STATUS: &str = "resolved";

const MAX_TEXT_CHARS: usize = 280;

#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("malformed {collection} row: {reason}")]
    Malformed {
        collection: Collection,
        reason: String,
    },
    #[error("{collection} row {id}: missing {field}")]
    MissingField {
        collection: Collection,
        id: String,
        field: &'static str,
    },
    #[error("{collection} row {id}: unknown domain {domain:?}")]
    UnknownDomain {
        collection: Collection,
        id: String,
        domain: String,
    },
    #[error("donation row {id}: invalid amount {amount}")]
    InvalidAmount { id: String, amount: f64 },
}

/// Row ids come back as integers or uuids depending on the table.
fn de_row_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    match v {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueRow {
    #[serde(deserialize_with = "de_row_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub domain: String,
    #[serde(default, alias = "location")]
    pub location_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationRow {
    #[serde(deserialize_with = "de_row_id")]
    pub id: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub domain: String,
    #[serde(default, alias = "location")]
    pub location_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MilestoneRow {
    #[serde(deserialize_with = "de_row_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub domain: String,
    #[serde(default, alias = "location")]
    pub location_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub achieved_by_name: Option<String>,
    #[serde(default)]
    pub achieved_by_type: Option<String>,
    #[serde(default)]
    pub metric_value: Option<f64>,
    #[serde(default)]
    pub metric_unit: Option<String>,
}

/// One decoded row, tagged by its source collection.
#[derive(Debug, Clone)]
pub enum SourceRow {
    Issue(IssueRow),
    Donation(DonationRow),
    Milestone(MilestoneRow),
}

impl SourceRow {
    /// Decode and validate a raw JSON row from `collection`.
    pub fn decode(collection: Collection, raw: Value) -> Result<Self, RowError> {
        let malformed = |e: serde_json::Error| RowError::Malformed {
            collection,
            reason: e.to_string(),
        };
        let row = match collection {
            Collection::Issues => SourceRow::Issue(serde_json::from_value(raw).map_err(malformed)?),
            Collection::Donations => {
                SourceRow::Donation(serde_json::from_value(raw).map_err(malformed)?)
            }
            Collection::Milestones => {
                SourceRow::Milestone(serde_json::from_value(raw).map_err(malformed)?)
            }
        };
        row.validate()?;
        Ok(row)
    }

    pub fn collection(&self) -> Collection {
        match self {
            SourceRow::Issue(_) => Collection::Issues,
            SourceRow::Donation(_) => Collection::Donations,
            SourceRow::Milestone(_) => Collection::Milestones,
        }
    }

    pub fn row_id(&self) -> &str {
        match self {
            SourceRow::Issue(r) => &r.id,
            SourceRow::Donation(r) => &r.id,
            SourceRow::Milestone(r) => &r.id,
        }
    }

    fn domain_raw(&self) -> &str {
        match self {
            SourceRow::Issue(r) => &r.domain,
            SourceRow::Donation(r) => &r.domain,
            SourceRow::Milestone(r) => &r.domain,
        }
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            SourceRow::Issue(r) => r.resolved_at.or(r.updated_at),
            SourceRow::Donation(r) => r.created_at,
            SourceRow::Milestone(r) => r.created_at,
        }
    }

    fn validate(&self) -> Result<(), RowError> {
        let collection = self.collection();
        let id = self.row_id().to_string();

        if Domain::parse(self.domain_raw()).is_none() {
            return Err(RowError::UnknownDomain {
                collection,
                id,
                domain: self.domain_raw().to_string(),
            });
        }
        if self.timestamp().is_none() {
            let field = match self {
                SourceRow::Issue(_) => "resolved_at/updated_at",
                _ => "created_at",
            };
            return Err(RowError::MissingField {
                collection,
                id,
                field,
            });
        }
        if let SourceRow::Donation(d) = self {
            if !d.amount.is_finite() || d.amount < 0.0 {
                return Err(RowError::InvalidAmount {
                    id,
                    amount: d.amount,
                });
            }
        }
        Ok(())
    }

    /// Project the row into a feed item. Infallible once `decode` succeeded.
    pub fn into_item(self) -> FeedItem {
        // validate() guarantees both of these; the fallbacks only keep this total.
        let domain = Domain::parse(self.domain_raw()).unwrap_or(Domain::Water);
        let timestamp = self.timestamp().unwrap_or_else(Utc::now);

        match self {
            SourceRow::Issue(r) => FeedItem {
                id: item_id(FeedKind::Resolution, &r.id),
                kind: FeedKind::Resolution,
                title: text_or(r.title.as_deref(), DEFAULT_ISSUE_TITLE),
                description: text_or(r.description.as_deref(), DEFAULT_ISSUE_DESCRIPTION),
                domain,
                location: text_or(r.location_name.as_deref(), UNKNOWN_LOCATION),
                timestamp,
                contributor: None,
                amount: None,
                metric: None,
            },
            SourceRow::Donation(r) => {
                let title = match non_empty(r.project_name.as_deref()) {
                    Some(project) => format!("Donation to {project}"),
                    None => DEFAULT_DONATION_TITLE.to_string(),
                };
                let description = non_empty(r.message.as_deref()).unwrap_or_else(|| {
                    format!(
                        "{} contributed towards {} restoration",
                        format_inr(r.amount),
                        domain
                    )
                });
                let contributor = if r.is_anonymous {
                    Some(ANONYMOUS_DONOR.to_string())
                } else {
                    non_empty(r.donor_name.as_deref())
                };
                FeedItem {
                    id: item_id(FeedKind::Donation, &r.id),
                    kind: FeedKind::Donation,
                    title,
                    description,
                    domain,
                    location: text_or(r.location_name.as_deref(), UNKNOWN_LOCATION),
                    timestamp,
                    contributor,
                    amount: Some(r.amount),
                    metric: None,
                }
            }
            SourceRow::Milestone(r) => {
                let metric = match (r.metric_value, non_empty(r.metric_unit.as_deref())) {
                    (Some(value), Some(unit)) if value.is_finite() => Some(Metric { value, unit }),
                    _ => None,
                };
                let contributor = non_empty(r.achieved_by_name.as_deref())
                    .or_else(|| non_empty(r.achieved_by_type.as_deref()).map(|t| portal_label(&t)));
                FeedItem {
                    id: item_id(FeedKind::Milestone, &r.id),
                    kind: FeedKind::Milestone,
                    title: text_or(r.title.as_deref(), DEFAULT_MILESTONE_TITLE),
                    description: text_or(r.description.as_deref(), ""),
                    domain,
                    location: text_or(r.location_name.as_deref(), UNKNOWN_LOCATION),
                    timestamp,
                    contributor,
                    amount: None,
                    metric,
                }
            }
        }
    }
}

/// Human label for an `achieved_by_type` value (`ngo` → `NGO`).
fn portal_label(kind: &str) -> String {
    match kind.to_ascii_lowercase().as_str() {
        "ngo" => "NGO".to_string(),
        "government" => "Government".to_string(),
        "citizen" => "Citizen".to_string(),
        "research" => "Research team".to_string(),
        _ => kind.to_string(),
    }
}

/// Rupee amount with Indian digit grouping, e.g. `₹1,25,000`.
pub fn format_inr(amount: f64) -> String {
    let whole = amount.max(0.0).round() as u64;
    let digits = whole.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }
    let (head, last3) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (h, t) = rest.split_at(rest.len() - 2);
        groups.push(t);
        rest = h;
    }
    groups.push(rest);
    groups.reverse();
    format!("₹{},{}", groups.join(","), last3)
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(normalize_display_text).filter(|t| !t.is_empty())
}

fn text_or(s: Option<&str>, default: &str) -> String {
    non_empty(s).unwrap_or_else(|| default.to_string())
}

/// Normalize user-entered text for display: decode entities, strip tags,
/// collapse whitespace, cap length.
pub fn normalize_display_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn issue_falls_back_to_updated_at_and_default_title() {
        let row = SourceRow::decode(
            Collection::Issues,
            json!({
                "id": 12,
                "domain": "water",
                "location_name": "Bengaluru, Karnataka",
                "status": "resolved",
                "updated_at": "2024-03-01T10:00:00Z"
            }),
        )
        .unwrap();
        let item = row.into_item();
        assert_eq!(item.id, "resolution-12");
        assert_eq!(item.title, DEFAULT_ISSUE_TITLE);
        assert_eq!(item.timestamp.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn resolved_at_wins_over_updated_at() {
        let item = SourceRow::decode(
            Collection::Issues,
            json!({
                "id": "a1",
                "title": "Lake cleanup",
                "domain": "water",
                "resolved_at": "2024-03-02T00:00:00Z",
                "updated_at": "2024-03-05T00:00:00Z"
            }),
        )
        .unwrap()
        .into_item();
        assert_eq!(item.timestamp.to_rfc3339(), "2024-03-02T00:00:00+00:00");
        assert_eq!(item.location, UNKNOWN_LOCATION);
    }

    #[test]
    fn anonymous_donation_hides_donor_name() {
        let item = SourceRow::decode(
            Collection::Donations,
            json!({
                "id": 5,
                "project_name": "Yamuna Revival",
                "domain": "water",
                "location_name": "Delhi",
                "created_at": "2024-03-01T10:00:00Z",
                "donor_name": "Priya Sharma",
                "is_anonymous": true,
                "amount": 2500
            }),
        )
        .unwrap()
        .into_item();
        assert_eq!(item.contributor.as_deref(), Some(ANONYMOUS_DONOR));
        assert_eq!(item.title, "Donation to Yamuna Revival");
        assert_eq!(item.amount, Some(2500.0));
        assert!(item.description.contains("₹2,500"));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = SourceRow::decode(
            Collection::Donations,
            json!({
                "id": 9,
                "domain": "air",
                "created_at": "2024-03-01T10:00:00Z",
                "amount": -10.0
            }),
        )
        .unwrap_err();
        assert!(matches!(err, RowError::InvalidAmount { .. }));
    }

    #[test]
    fn unknown_domain_and_missing_timestamp_fail_fast() {
        let err = SourceRow::decode(
            Collection::Milestones,
            json!({ "id": 1, "domain": "soil", "created_at": "2024-03-01T10:00:00Z" }),
        )
        .unwrap_err();
        assert!(matches!(err, RowError::UnknownDomain { .. }));

        let err = SourceRow::decode(Collection::Milestones, json!({ "id": 1, "domain": "air" }))
            .unwrap_err();
        assert!(matches!(err, RowError::MissingField { .. }));

        let err = SourceRow::decode(Collection::Issues, json!({ "title": "no id" })).unwrap_err();
        assert!(matches!(err, RowError::Malformed { .. }));
    }

    #[test]
    fn milestone_metric_needs_value_and_unit() {
        let item = SourceRow::decode(
            Collection::Milestones,
            json!({
                "id": 3,
                "title": "1000 saplings planted",
                "domain": "air",
                "created_at": "2024-03-01T10:00:00Z",
                "achieved_by_type": "ngo",
                "metric_value": 1000,
                "metric_unit": "saplings"
            }),
        )
        .unwrap()
        .into_item();
        assert_eq!(item.contributor.as_deref(), Some("NGO"));
        assert_eq!(
            item.metric,
            Some(Metric {
                value: 1000.0,
                unit: "saplings".into()
            })
        );

        let item = SourceRow::decode(
            Collection::Milestones,
            json!({ "id": 4, "domain": "air", "created_at": "2024-03-01T10:00:00Z", "metric_value": 2 }),
        )
        .unwrap()
        .into_item();
        assert!(item.metric.is_none());
    }

    #[test]
    fn display_text_is_cleaned() {
        assert_eq!(
            normalize_display_text("  <b>Clean&nbsp;air</b>\n\n drive "),
            "Clean air drive"
        );
    }

    #[test]
    fn inr_grouping() {
        assert_eq!(format_inr(999.0), "₹999");
        assert_eq!(format_inr(1000.0), "₹1,000");
        assert_eq!(format_inr(125000.0), "₹1,25,000");
        assert_eq!(format_inr(12345678.0), "₹1,23,45,678");
    }
}
