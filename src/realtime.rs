//! # Realtime subscriptions
//! Scoped change subscriptions over a [`RowStore`].
//!
//! `subscribe` spawns one task per subscription that opens a change listener,
//! filters events with a predicate, and hands qualifying events to a
//! synchronous callback. The returned [`Subscription`] is the only teardown
//! path: `close()` (or dropping it) stops the task and releases the listener.
//!
//! Listeners that fail to open, or whose stream ends, are reopened with
//! exponential backoff.

use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::store::{ChangeEvent, ChangeKind, Collection, RowStore};

/// Reconnect policy for a subscription.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub max: Duration,
    /// 0 means retry forever.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max: Duration::from_secs(30),
            max_retries: 0,
        }
    }
}

impl RetryPolicy {
    /// Delay before reconnect attempt `attempt` (1-based): `base << (attempt - 1)`, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(20);
        let ms = (self.base.as_millis() as u64).saturating_mul(1u64 << shift);
        Duration::from_millis(ms).min(self.max)
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_retries > 0 && attempt > self.max_retries
    }
}

/// Handle to a running subscription. Closing is idempotent; dropping closes.
#[derive(Debug)]
pub struct Subscription {
    collection: Collection,
    kind: ChangeKind,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop delivering events and release the listener.
    pub fn close(&mut self) {
        if let Some(h) = self.handle.take() {
            h.abort();
            tracing::debug!(collection = %self.collection, kind = %self.kind, "subscription closed");
        }
    }

    /// Close and wait until the task has fully stopped.
    pub async fn shutdown(mut self) {
        if let Some(h) = self.handle.take() {
            h.abort();
            let _ = h.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Subscribe to `kind` events on `collection`, invoking `on_event` for every
/// event accepted by `filter`. The callback runs on the subscription task and
/// must not block.
pub fn subscribe<P, F>(
    store: Arc<dyn RowStore>,
    collection: Collection,
    kind: ChangeKind,
    filter: P,
    mut on_event: F,
    policy: RetryPolicy,
) -> Subscription
where
    P: Fn(&ChangeEvent) -> bool + Send + 'static,
    F: FnMut(ChangeEvent) + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut attempt = 0u32;
        loop {
            match store.listen(collection, kind).await {
                Ok(mut rx) => {
                    attempt = 0;
                    tracing::info!(%collection, %kind, store = store.name(), "subscription open");
                    while let Some(ev) = rx.recv().await {
                        if filter(&ev) {
                            on_event(ev);
                        }
                    }
                    tracing::warn!(%collection, %kind, "change stream ended");
                }
                Err(e) => {
                    tracing::warn!(error = ?e, %collection, %kind, attempt, "subscription failed");
                }
            }

            attempt += 1;
            if policy.exhausted(attempt) {
                tracing::warn!(%collection, %kind, "giving up on subscription; feed stays static");
                break;
            }
            counter!("feed_subscription_retries_total", "collection" => collection.table())
                .increment(1);
            tokio::time::sleep(policy.delay(attempt)).await;
        }
    });

    Subscription {
        collection,
        kind,
        handle: Some(handle),
    }
}
