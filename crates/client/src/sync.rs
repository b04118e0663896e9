//! Polling message feed.
//!
//! The storefront has no push channel. [`MessageFeed`] refetches the full
//! visible message set on a timer and replaces its snapshot wholesale.
//!
//! Every fetch takes a sequence number when it is issued. A response is
//! applied only if its sequence is newer than the one already applied, so a
//! slow response from an earlier tick can never overwrite a newer snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use bazaar_core::{Message, Projection, UserId};

use crate::client::ApiClient;
use crate::error::ClientError;

/// How often the feed refetches messages.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// The message set as of one applied fetch.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Sequence of the fetch that produced this snapshot; 0 before the first.
    pub sequence: u64,
    /// Visible messages, oldest first. Empty when logged out.
    pub messages: Arc<[Message]>,
    /// When the fetch was applied.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Replace the message set if `sequence` is newer than the applied one.
    ///
    /// Returns whether the snapshot changed.
    pub fn apply(
        &mut self,
        sequence: u64,
        messages: Vec<Message>,
        fetched_at: DateTime<Utc>,
    ) -> bool {
        if sequence <= self.sequence {
            return false;
        }
        self.sequence = sequence;
        self.messages = messages.into();
        self.fetched_at = Some(fetched_at);
        true
    }

    /// Group the snapshot into conversations as seen by `principal`.
    #[must_use]
    pub fn projection(&self, principal: UserId) -> Projection {
        Projection::build(&self.messages, principal)
    }
}

/// Shared, polling view of `/api/messages`.
///
/// Cheap to clone; clones share the sequence counter and the snapshot.
#[derive(Clone)]
pub struct MessageFeed {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    client: ApiClient,
    next_sequence: AtomicU64,
    snapshots: watch::Sender<Snapshot>,
}

impl MessageFeed {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::default());
        Self {
            inner: Arc::new(FeedInner {
                client,
                next_sequence: AtomicU64::new(0),
                snapshots,
            }),
        }
    }

    /// The client used for fetching and sending.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Receive every applied snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshots.subscribe()
    }

    /// The latest applied snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Fetch the message set once.
    ///
    /// A 401 is treated as an empty message set. Returns whether the response
    /// was applied; `false` means a newer fetch had already landed.
    ///
    /// # Errors
    ///
    /// Returns any other client error.
    pub async fn refresh(&self) -> Result<bool, ClientError> {
        let sequence = self.next_sequence();
        let messages = match self.inner.client.messages().await {
            Ok(messages) => messages,
            Err(e) if e.is_unauthorized() => Vec::new(),
            Err(e) => return Err(e),
        };

        let applied = self.apply(sequence, messages);
        if !applied {
            debug!(sequence, "Discarded stale message poll");
        }
        Ok(applied)
    }

    /// Send a message, then refetch immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails. A failed refetch is only logged.
    pub async fn send(
        &self,
        receiver_id: Option<UserId>,
        content: &str,
    ) -> Result<Message, ClientError> {
        let message = self.inner.client.send_message(receiver_id, content).await?;
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "Refetch after send failed");
        }
        Ok(message)
    }

    /// Start polling every `interval`.
    ///
    /// Each tick spawns its own fetch, so a slow request never delays the
    /// next one. Fetch failures are logged at debug and otherwise ignored.
    #[must_use = "dropping the handle stops polling"]
    pub fn spawn(&self, interval: Duration) -> PollerHandle {
        let feed = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut fetches = JoinSet::new();

            loop {
                ticker.tick().await;
                while fetches.try_join_next().is_some() {}

                let feed = feed.clone();
                fetches.spawn(async move {
                    if let Err(e) = feed.refresh().await {
                        debug!(error = %e, "Message poll failed");
                    }
                });
            }
        });

        PollerHandle { task }
    }

    fn next_sequence(&self) -> u64 {
        self.inner.next_sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn apply(&self, sequence: u64, messages: Vec<Message>) -> bool {
        self.inner
            .snapshots
            .send_if_modified(|snapshot| snapshot.apply(sequence, messages, Utc::now()))
    }
}

/// Running poll loop. Dropping it stops the loop and any fetch in flight.
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling.
    pub fn stop(self) {
        drop(self);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::MessageId;

    use super::*;

    fn message(id: i32, content: &str) -> Message {
        Message {
            id: MessageId::new(id),
            sender_id: UserId::new(2),
            receiver_id: None,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    fn feed() -> MessageFeed {
        // Nothing listens here; these tests never hit the network
        MessageFeed::new(ApiClient::new("http://127.0.0.1:9").unwrap())
    }

    #[test]
    fn test_newer_sequence_replaces_messages() {
        let mut snapshot = Snapshot::default();
        assert!(snapshot.apply(1, vec![message(1, "hello")], Utc::now()));
        assert!(snapshot.apply(2, vec![message(1, "hello"), message(2, "còn hàng không?")], Utc::now()));

        assert_eq!(snapshot.sequence, 2);
        assert_eq!(snapshot.messages.len(), 2);
        assert!(snapshot.fetched_at.is_some());
    }

    #[test]
    fn test_stale_sequence_is_discarded() {
        let mut snapshot = Snapshot::default();
        // Fetch 2 lands before fetch 1
        assert!(snapshot.apply(2, vec![message(1, "hello"), message(2, "newer")], Utc::now()));
        assert!(!snapshot.apply(1, vec![message(1, "hello")], Utc::now()));

        assert_eq!(snapshot.sequence, 2);
        assert_eq!(snapshot.messages.len(), 2);
    }

    #[test]
    fn test_same_sequence_applies_once() {
        let mut snapshot = Snapshot::default();
        assert!(snapshot.apply(1, vec![message(1, "hello")], Utc::now()));
        assert!(!snapshot.apply(1, Vec::new(), Utc::now()));
        assert_eq!(snapshot.messages.len(), 1);
    }

    #[test]
    fn test_empty_set_replaces_messages() {
        let mut snapshot = Snapshot::default();
        snapshot.apply(1, vec![message(1, "hello")], Utc::now());
        assert!(snapshot.apply(2, Vec::new(), Utc::now()));
        assert!(snapshot.messages.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_only_see_applied_snapshots() {
        let feed = feed();
        let mut rx = feed.subscribe();

        let first = feed.next_sequence();
        let second = feed.next_sequence();
        assert!(first < second);

        assert!(feed.apply(second, vec![message(1, "hello")]));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().sequence, second);

        assert!(!feed.apply(first, Vec::new()));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(feed.snapshot().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_sequence() {
        let feed = feed();
        let other = feed.clone();
        let a = feed.next_sequence();
        let b = other.next_sequence();
        assert_eq!(b, a + 1);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_poller() {
        let feed = feed();
        let handle = feed.spawn(Duration::from_secs(3600));
        let poll_task = handle.task.abort_handle();
        assert!(!handle.is_finished());

        handle.stop();
        tokio::task::yield_now().await;
        // Give the runtime a moment to process the abort
        for _ in 0..10 {
            if poll_task.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(poll_task.is_finished());
    }
}
