//! Broadcasts inserts, updates and deletes of stored records to live subscribers.
//!
//! Handlers publish a [ChangeEvent] after a successful write. Subscribers, such as the
//! live dashboard, pick the [RecordKind]s they care about and reconcile a local snapshot
//! instead of re-querying the database on every change.

mod snapshot;

pub use snapshot::{CategorySnapshot, TransactionSnapshot};

use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId},
    transaction::{Transaction, TransactionId},
};

/// How many events a subscriber may fall behind before it starts missing events.
pub const DEFAULT_CHANGE_FEED_CAPACITY: usize = 256;

/// The kinds of stored records that can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// [Transaction] records.
    Transactions,
    /// [Category] records.
    Categories,
}

/// A single change to a record of type `T` with an ID of type `Id`.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T, Id> {
    /// A new record was stored.
    Inserted(T),
    /// An existing record was modified, holds the new version.
    Updated(T),
    /// The record with this ID was removed.
    Deleted(Id),
}

/// A change to one of the stored records.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A transaction owned by `user_id` changed.
    Transaction {
        /// The owner of the transaction.
        user_id: UserID,
        /// What happened to the transaction.
        change: Change<Transaction, TransactionId>,
    },
    /// A category changed. Categories are shared by all users.
    Category(Change<Category, CategoryId>),
}

impl ChangeEvent {
    /// The kind of record this event is about.
    pub fn kind(&self) -> RecordKind {
        match self {
            ChangeEvent::Transaction { .. } => RecordKind::Transactions,
            ChangeEvent::Category(_) => RecordKind::Categories,
        }
    }
}

/// The sending half of the change feed, cheap to clone and share between handlers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Create a change feed that buffers up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self { sender }
    }

    /// Send `event` to every current subscriber.
    ///
    /// Publishing never fails: with no subscribers the event is simply dropped.
    pub fn publish(&self, event: ChangeEvent) {
        let kind = event.kind();

        match self.sender.send(event) {
            Ok(receiver_count) => {
                tracing::debug!("published {kind:?} change to {receiver_count} subscriber(s)")
            }
            Err(_) => tracing::debug!("dropped {kind:?} change, there are no subscribers"),
        }
    }

    /// Listen for changes to the records in `kinds`.
    ///
    /// Only events published after this call are received.
    pub fn subscribe(&self, kinds: &[RecordKind]) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            kinds: kinds.to_vec(),
        }
    }

    /// The number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_FEED_CAPACITY)
    }
}

/// The receiving half of the change feed, filtered to a set of [RecordKind]s.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    kinds: Vec<RecordKind>,
}

impl Subscription {
    /// Wait for the next event of a subscribed kind.
    ///
    /// # Errors
    ///
    /// Returns [Error::ChangeFeedLagged] with the number of skipped events if this
    /// subscriber fell too far behind. The subscription is still usable afterwards,
    /// but any local snapshot should be reloaded.
    ///
    /// Returns [Error::ChangeFeedClosed] once every [ChangeFeed] has been dropped.
    pub async fn recv(&mut self) -> Result<ChangeEvent, Error> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.kinds.contains(&event.kind()) => return Ok(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("change feed subscriber lagged behind by {skipped} events");
                    return Err(Error::ChangeFeedLagged(skipped));
                }
                Err(RecvError::Closed) => return Err(Error::ChangeFeedClosed),
            }
        }
    }
}

#[cfg(test)]
mod change_feed_tests {
    use time::macros::date;

    use crate::{
        Error,
        auth::UserID,
        category::{Category, CategoryName},
        transaction::{Transaction, TransactionType},
    };

    use super::{Change, ChangeEvent, ChangeFeed, RecordKind};

    fn transaction_event(id: i64) -> ChangeEvent {
        ChangeEvent::Transaction {
            user_id: UserID::new(1),
            change: Change::Inserted(Transaction {
                id,
                amount: -10.0,
                category: "Food".to_owned(),
                type_: TransactionType::Expense,
                date: date!(2024 - 01 - 15),
                user_id: UserID::new(1),
            }),
        }
    }

    fn category_event(id: i64) -> ChangeEvent {
        ChangeEvent::Category(Change::Inserted(Category {
            id,
            name: CategoryName::new_unchecked("Food"),
            type_: None,
        }))
    }

    #[test]
    fn publish_without_subscribers_does_not_fail() {
        let feed = ChangeFeed::default();

        feed.publish(transaction_event(1));

        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let feed = ChangeFeed::default();
        let mut subscription = feed.subscribe(&[RecordKind::Transactions]);

        feed.publish(transaction_event(1));

        assert_eq!(subscription.recv().await, Ok(transaction_event(1)));
    }

    #[tokio::test]
    async fn subscriber_skips_other_kinds() {
        let feed = ChangeFeed::default();
        let mut subscription = feed.subscribe(&[RecordKind::Categories]);

        feed.publish(transaction_event(1));
        feed.publish(category_event(2));

        assert_eq!(subscription.recv().await, Ok(category_event(2)));
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let feed = ChangeFeed::default();
        let mut first = feed.subscribe(&[RecordKind::Transactions]);
        let mut second = feed.subscribe(&[RecordKind::Transactions, RecordKind::Categories]);

        feed.publish(transaction_event(1));

        assert_eq!(first.recv().await, Ok(transaction_event(1)));
        assert_eq!(second.recv().await, Ok(transaction_event(1)));
    }

    #[tokio::test]
    async fn slow_subscriber_gets_lagged_error() {
        let feed = ChangeFeed::new(2);
        let mut subscription = feed.subscribe(&[RecordKind::Transactions]);

        for id in 1..=4 {
            feed.publish(transaction_event(id));
        }

        assert_eq!(subscription.recv().await, Err(Error::ChangeFeedLagged(2)));
        assert_eq!(subscription.recv().await, Ok(transaction_event(3)));
    }

    #[tokio::test]
    async fn dropping_the_feed_closes_subscriptions() {
        let feed = ChangeFeed::default();
        let mut subscription = feed.subscribe(&[RecordKind::Transactions]);

        drop(feed);

        assert_eq!(subscription.recv().await, Err(Error::ChangeFeedClosed));
    }

    #[test]
    fn event_kind_matches_record() {
        assert_eq!(transaction_event(1).kind(), RecordKind::Transactions);
        assert_eq!(category_event(1).kind(), RecordKind::Categories);
    }
}
