//! Dashboard filters, applied at render time to the already-capped list.

use serde::Deserialize;

use crate::feed::item::{FeedItem, FeedKind};

/// Regions offered by the dashboard's region picker.
pub const REGIONS: &[&str] = &[
    "Karnataka",
    "Maharashtra",
    "Delhi",
    "Tamil Nadu",
    "Kerala",
    "Uttar Pradesh",
    "West Bengal",
    "Gujarat",
    "Rajasthan",
    "Punjab",
];

const ALL: &str = "all";

/// Raw query-string form: `?type=donation&region=Karnataka`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedFilter {
    /// `None` = all types.
    pub kind: Option<FeedKind>,
    /// `None` = all regions. Matched as a case-insensitive substring of `location`.
    pub region: Option<String>,
}

impl FeedFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Interpret query params. Unknown type tags are rejected.
    pub fn from_params(p: &FilterParams) -> Result<Self, String> {
        let kind = match p.kind.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case(ALL) => None,
            Some(s) => Some(FeedKind::parse(s).ok_or_else(|| format!("unknown type {s:?}"))?),
        };
        let region = match p.region.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case(ALL) || s.eq_ignore_ascii_case("all regions") => {
                None
            }
            Some(s) => Some(s.to_string()),
        };
        Ok(Self { kind, region })
    }

    pub fn matches(&self, item: &FeedItem) -> bool {
        if self.kind.is_some_and(|k| k != item.kind) {
            return false;
        }
        match &self.region {
            None => true,
            Some(r) => item
                .location
                .to_lowercase()
                .contains(&r.to_lowercase()),
        }
    }

    pub fn apply(&self, items: &[FeedItem]) -> Vec<FeedItem> {
        items.iter().filter(|i| self.matches(i)).cloned().collect()
    }
}
