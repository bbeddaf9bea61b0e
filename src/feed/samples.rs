//! Hand-authored example events shown while the live feed is empty.
//!
//! Samples are presentation only: they are never stored in a [`FeedBuffer`]
//! and never mixed with live items. Each variant has its own list.
//!
//! [`FeedBuffer`]: crate::feed::buffer::FeedBuffer

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::feed::item::{Domain, FeedItem, FeedKind, Metric};
use crate::feed::rows::ANONYMOUS_DONOR;
use crate::feed::variant::FeedVariant;

struct Sample {
    id: &'static str,
    kind: FeedKind,
    title: &'static str,
    description: &'static str,
    domain: Domain,
    location: &'static str,
    minutes_ago: i64,
    contributor: Option<&'static str>,
    amount: Option<f64>,
    metric: Option<(f64, &'static str)>,
}

const COMPACT_SAMPLES: &[Sample] = &[
    Sample {
        id: "sample-1",
        kind: FeedKind::Resolution,
        title: "Sewage overflow fixed near Bellandur Lake",
        description: "Municipal crew cleared the blocked outlet reported by residents.",
        domain: Domain::Water,
        location: "Bengaluru, Karnataka",
        minutes_ago: 2,
        contributor: None,
        amount: None,
        metric: None,
    },
    Sample {
        id: "sample-2",
        kind: FeedKind::Donation,
        title: "Donation to Clean Air Delhi",
        description: "For roadside air-quality monitors.",
        domain: Domain::Air,
        location: "New Delhi, Delhi",
        minutes_ago: 7,
        contributor: Some(ANONYMOUS_DONOR),
        amount: Some(5000.0),
        metric: None,
    },
    Sample {
        id: "sample-3",
        kind: FeedKind::Milestone,
        title: "Versova beach cleanup crosses a milestone",
        description: "Volunteers cleared plastic waste over twelve weekends.",
        domain: Domain::Waste,
        location: "Mumbai, Maharashtra",
        minutes_ago: 15,
        contributor: Some("Versova Residents Volunteers"),
        amount: None,
        metric: Some((25.0, "tons")),
    },
    Sample {
        id: "sample-4",
        kind: FeedKind::Resolution,
        title: "Illegal dumping site cleared",
        description: "Ward office removed debris and installed signage.",
        domain: Domain::Waste,
        location: "Chennai, Tamil Nadu",
        minutes_ago: 32,
        contributor: None,
        amount: None,
        metric: None,
    },
];

const LIVE_SAMPLES: &[Sample] = &[
    Sample {
        id: "sample-live-1",
        kind: FeedKind::Donation,
        title: "Donation to Cauvery Riverbank Restoration",
        description: "Supporting native plantings along the riverbank.",
        domain: Domain::Water,
        location: "Mysuru, Karnataka",
        minutes_ago: 1,
        contributor: Some("Ananya Rao"),
        amount: Some(10000.0),
        metric: None,
    },
    Sample {
        id: "sample-live-2",
        kind: FeedKind::Resolution,
        title: "Industrial smoke complaint resolved",
        description: "Pollution control board sealed the non-compliant chimney.",
        domain: Domain::Air,
        location: "Ludhiana, Punjab",
        minutes_ago: 4,
        contributor: None,
        amount: None,
        metric: None,
    },
    Sample {
        id: "sample-live-3",
        kind: FeedKind::Milestone,
        title: "Urban forest reaches planting target",
        description: "Miyawaki plots completed across three wards.",
        domain: Domain::Air,
        location: "Pune, Maharashtra",
        minutes_ago: 9,
        contributor: Some("Green Pune Foundation"),
        amount: None,
        metric: Some((10000.0, "saplings")),
    },
    Sample {
        id: "sample-live-4",
        kind: FeedKind::Donation,
        title: "Donation to Bengaluru Lakes Trust",
        description: "Desilting equipment for Hebbal lake.",
        domain: Domain::Water,
        location: "Bengaluru, Karnataka",
        minutes_ago: 14,
        contributor: Some(ANONYMOUS_DONOR),
        amount: Some(2500.0),
        metric: None,
    },
    Sample {
        id: "sample-live-5",
        kind: FeedKind::Resolution,
        title: "Overflowing bins replaced",
        description: "Segregated bins installed at the market.",
        domain: Domain::Waste,
        location: "Kochi, Kerala",
        minutes_ago: 22,
        contributor: None,
        amount: None,
        metric: None,
    },
    Sample {
        id: "sample-live-6",
        kind: FeedKind::Milestone,
        title: "Groundwater recharge wells completed",
        description: "Rainwater harvesting wells commissioned in schools.",
        domain: Domain::Water,
        location: "Jaipur, Rajasthan",
        minutes_ago: 40,
        contributor: Some("Jal Sahayog Research Group"),
        amount: None,
        metric: Some((120.0, "wells")),
    },
];

/// Materialize the sample list for `variant`, timestamped relative to `now`.
pub fn sample_items(variant: FeedVariant, now: DateTime<Utc>) -> Vec<FeedItem> {
    let table = match variant {
        FeedVariant::Compact => COMPACT_SAMPLES,
        FeedVariant::Live => LIVE_SAMPLES,
    };
    table
        .iter()
        .map(|s| FeedItem {
            id: s.id.to_string(),
            kind: s.kind,
            title: s.title.to_string(),
            description: s.description.to_string(),
            domain: s.domain,
            location: s.location.to_string(),
            timestamp: now - Duration::minutes(s.minutes_ago),
            contributor: s.contributor.map(str::to_string),
            amount: s.amount,
            metric: s.metric.map(|(value, unit)| Metric {
                value,
                unit: unit.to_string(),
            }),
        })
        .collect()
}

/// What a feed widget renders.
#[derive(Debug, Clone, Serialize)]
pub struct FeedView {
    pub loading: bool,
    /// True when `items` is the sample list rather than live data.
    pub is_sample: bool,
    pub items: Vec<FeedItem>,
}

impl FeedView {
    /// Substitute samples wholesale when no live items exist.
    pub fn resolve(
        variant: FeedVariant,
        loading: bool,
        live: Vec<FeedItem>,
        now: DateTime<Utc>,
    ) -> Self {
        if live.is_empty() && !loading {
            Self {
                loading,
                is_sample: true,
                items: sample_items(variant, now),
            }
        } else {
            Self {
                loading,
                is_sample: false,
                items: live,
            }
        }
    }
}
