// src/feed/mod.rs
pub mod aggregator;
pub mod buffer;
pub mod filter;
pub mod item;
pub mod rows;
pub mod samples;
pub mod variant;

pub use aggregator::{FeedStatus, LiveFeed};
pub use filter::{FeedFilter, FilterParams, REGIONS};
pub use item::{Domain, FeedItem, FeedKind, Metric};
pub use samples::FeedView;
pub use variant::FeedVariant;
