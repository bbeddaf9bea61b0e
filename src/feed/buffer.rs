//! Bounded newest-first feed list.
//!
//! Bulk loads are merged, sorted by timestamp descending, and truncated.
//! Realtime insertions are prepended without re-sorting (new events are
//! assumed near-present) and evict exactly the oldest entry once full.

use std::collections::VecDeque;

use crate::feed::item::FeedItem;

#[derive(Debug, Clone)]
pub struct FeedBuffer {
    items: VecDeque<FeedItem>,
    cap: usize,
}

impl FeedBuffer {
    pub fn with_cap(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            items: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.items.iter().any(|it| it.id == id)
    }

    /// Replace the contents with `items`, sorted newest first and capped.
    pub fn load(&mut self, mut items: Vec<FeedItem>) {
        // Stable sort keeps source order for equal timestamps.
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items.truncate(self.cap);
        self.items = items.into();
    }

    /// Prepend one item. Returns the evicted item, if any.
    pub fn push_front(&mut self, item: FeedItem) -> Option<FeedItem> {
        self.items.push_front(item);
        if self.items.len() > self.cap {
            self.items.pop_back()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedItem> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<FeedItem> {
        self.items.iter().cloned().collect()
    }
}
