use serde::{Deserialize, Serialize};

/// The two feed widgets: the compact home-page feed and the full live dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedVariant {
    Compact,
    #[serde(alias = "dashboard")]
    Live,
}

impl FeedVariant {
    /// Rows requested per source during the initial load.
    pub fn page_size(&self) -> usize {
        match self {
            FeedVariant::Compact => 10,
            FeedVariant::Live => 20,
        }
    }

    /// Maximum number of items kept in memory.
    pub fn cap(&self) -> usize {
        match self {
            FeedVariant::Compact => 15,
            FeedVariant::Live => 30,
        }
    }

    /// Only the dashboard exposes type/region filters.
    pub fn supports_filters(&self) -> bool {
        matches!(self, FeedVariant::Live)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedVariant::Compact => "compact",
            FeedVariant::Live => "live",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Some(FeedVariant::Compact),
            "live" | "dashboard" => Some(FeedVariant::Live),
            _ => None,
        }
    }
}
