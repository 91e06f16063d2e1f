//! Observable state holding the current list of petitions.
//!
//! The list is only ever replaced wholesale. Every replacement bumps a
//! version counter and is announced to all observers, either as a
//! [StoreChange] on a channel or by firing registered [Condition]s.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

use crate::model::Petition;

/// A Send + Sync, cheaply clonable container for the current petition list.
///
/// Clones share the same underlying state, so a clone can be handed to the
/// fetch pipeline while the render layer keeps another.
#[derive(Default, Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
}

struct StoreInner {
    petitions: Arc<[Petition]>,
    /// Number of replacements so far, 0 means nothing was ever published
    version: u64,
    /// Last ticket handed out by [Store::begin_fetch]
    issued: u64,
    /// Ticket of the newest fetch which published
    published: u64,
    observers: Vec<flume::Sender<StoreChange>>,
    notifications: Vec<Notification>,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            petitions: Arc::from(Vec::new()),
            version: 0,
            issued: 0,
            published: 0,
            observers: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

impl StoreInner {
    fn replace(&mut self, petitions: Vec<Petition>) -> StoreChange {
        self.petitions = Arc::from(petitions);
        self.version += 1;
        let change = StoreChange {
            version: self.version,
            len: self.petitions.len(),
        };
        // observers whose receiver was dropped are pruned here
        self.observers.retain(|tx| tx.send(change).is_ok());
        self.fire_notifications();
        change
    }

    /// Check all notifications and fire those with satisfied conditions
    fn fire_notifications(&mut self) {
        let petitions = Arc::clone(&self.petitions);
        self.notifications = self
            .notifications
            .drain(..)
            .filter_map(|x| x.check(&petitions))
            .collect();
    }
}

/// Announcement of a replacement of the petition list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    /// Version of the store after the replacement
    pub version: u64,
    /// Number of petitions now held
    pub len: usize,
}

/// Whether the store has ever received a list.
///
/// The list itself cannot tell "still loading" from "loaded, but empty",
/// the version counter can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing has been published yet
    Loading,
    /// At least one list has been published
    Loaded {
        /// Number of petitions in the current list
        count: usize,
    },
}

/// Identifies one fetch attempt. Tickets are handed out in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

/// Result of trying to publish a fetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The list was replaced
    Published(StoreChange),
    /// A fetch issued later already published, this result was dropped
    Stale {
        /// Ticket of the dropped result
        ticket: FetchTicket,
        /// Ticket of the result currently held
        current: FetchTicket,
    },
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // the inner state is consistent after every statement, so a poisoned
        // lock is still usable
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current list in server order
    pub fn petitions(&self) -> Arc<[Petition]> {
        Arc::clone(&self.lock().petitions)
    }

    /// Find a petition in the current list by its id
    pub fn get(&self, id: &str) -> Option<Petition> {
        self.lock().petitions.iter().find(|p| p.id == id).cloned()
    }

    /// Number of petitions currently held
    pub fn len(&self) -> usize {
        self.lock().petitions.len()
    }

    /// True if the current list is empty. This is also the case before the
    /// first fetch completed, see [Store::load_state].
    pub fn is_empty(&self) -> bool {
        self.lock().petitions.is_empty()
    }

    /// Number of replacements so far. A render layer may poll this and
    /// re-render whenever it changes.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Distinguish the initial state from a published (possibly empty) list
    pub fn load_state(&self) -> LoadState {
        let guard = self.lock();
        match guard.version {
            0 => LoadState::Loading,
            _ => LoadState::Loaded {
                count: guard.petitions.len(),
            },
        }
    }

    /// Replace the whole list unconditionally and notify all observers.
    ///
    /// This bypasses fetch tickets, it is meant for seeding a store.
    pub fn replace(&self, petitions: Vec<Petition>) -> StoreChange {
        self.lock().replace(petitions)
    }

    /// Take a ticket for a new fetch attempt
    pub fn begin_fetch(&self) -> FetchTicket {
        let mut guard = self.lock();
        guard.issued += 1;
        FetchTicket(guard.issued)
    }

    /// Publish the result of the fetch identified by `ticket`.
    ///
    /// If a fetch which was started later already published, the result is
    /// older than what the store holds and gets dropped. The latest started
    /// fetch therefore always wins, regardless of completion order.
    pub fn publish(&self, ticket: FetchTicket, petitions: Vec<Petition>) -> PublishOutcome {
        let mut guard = self.lock();
        if ticket.0 < guard.published {
            let current = FetchTicket(guard.published);
            debug!(?ticket, ?current, "Dropping stale fetch result");
            return PublishOutcome::Stale { ticket, current };
        }
        guard.published = ticket.0;
        PublishOutcome::Published(guard.replace(petitions))
    }

    /// Subscribe to replacements of the list.
    ///
    /// Every replacement is sent to the returned receiver, which the
    /// presentation layer drains on whatever thread or task it renders on.
    /// Dropping the receiver ends the subscription.
    pub fn subscribe(&self) -> flume::Receiver<StoreChange> {
        let (tx, rx) = flume::unbounded();
        self.lock().observers.push(tx);
        rx
    }

    /// Async stream of replacements, see [Store::subscribe]
    pub fn changes(&self) -> flume::r#async::RecvStream<'static, StoreChange> {
        self.subscribe().into_stream()
    }

    /// Notify once a condition on the list is satisfied.
    ///
    /// The condition is evaluated immediately and after every replacement.
    /// The returned receiver resolves the first time it holds. Conditions run
    /// while the store is locked and must not call back into it.
    pub fn notify(&self, condition: impl Condition) -> oneshot::Receiver<()> {
        let (notification, on_complete) = Notification::new(condition);
        let mut guard = self.lock();
        let petitions = Arc::clone(&guard.petitions);
        if let Some(pending) = notification.check(&petitions) {
            guard.notifications.push(pending);
        }
        on_complete
    }
}

/// A Notification consisting of a condition to evaluate and a oneshot to
/// complete once the condition has been satisfied
struct Notification {
    condition: Box<dyn Condition>,
    on_complete: oneshot::Sender<()>,
}

impl Notification {
    fn new(condition: impl Condition) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let notification = Self {
            condition: Box::new(condition),
            on_complete: tx,
        };
        (notification, rx)
    }

    /// Check if condition is satisfied and fire notification if true.
    /// Firing the notification destroys it, hence this returns `Option<Self>`.
    /// A notification nobody waits on anymore is dropped without evaluating it.
    fn check(self, petitions: &[Petition]) -> Option<Self> {
        if self.on_complete.is_closed() {
            return None;
        }
        if self.condition.evaluate(petitions) {
            // receiver may have been dropped, nobody to tell then
            let _ = self.on_complete.send(());
            None
        } else {
            Some(self)
        }
    }
}

/// Condition over the current list, see [Store::notify]
pub trait Condition: Send + Sync + 'static {
    /// Once this returns true the notification fires and is removed
    fn evaluate(&self, petitions: &[Petition]) -> bool;
}
impl<X> Condition for X
where
    X: Fn(&[Petition]) -> bool + Send + Sync + 'static,
{
    fn evaluate(&self, petitions: &[Petition]) -> bool {
        self(petitions)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;
    use tokio::time::timeout;

    use super::*;

    fn is_send_sync<T: Send + Sync>(_: T) {}

    fn petition(id: &str) -> Petition {
        Petition {
            id: id.to_string(),
            title: format!("title {id}"),
            body: format!("body {id}"),
            signature_count: 1,
            url: format!("https://petitions.example/{id}"),
        }
    }

    #[test]
    fn test_is_send_sync() {
        is_send_sync(Store::new());
    }

    #[test]
    fn starts_empty_and_loading() {
        let store = Store::new();
        assert!(store.is_empty());
        assert_eq!(store.version(), 0);
        assert_eq!(store.load_state(), LoadState::Loading);
    }

    #[test]
    fn replace_is_wholesale() {
        let store = Store::new();
        store.replace(vec![petition("a"), petition("b")]);
        store.replace(vec![petition("c")]);
        let ids: Vec<_> = store.petitions().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, ["c"]);
        assert_eq!(store.version(), 2);
        assert!(store.get("a").is_none());
        assert_eq!(store.get("c"), Some(petition("c")));
    }

    #[test]
    fn empty_publish_is_loaded() {
        let store = Store::new();
        store.replace(Vec::new());
        assert!(store.is_empty());
        assert_eq!(store.load_state(), LoadState::Loaded { count: 0 });
    }

    #[test]
    fn clones_share_state() {
        let store = Store::new();
        let other = store.clone();
        other.replace(vec![petition("a")]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn subscribers_see_every_replacement() {
        let store = Store::new();
        let rx = store.subscribe();
        store.replace(vec![petition("a")]);
        store.replace(Vec::new());
        let changes: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            changes,
            [
                StoreChange { version: 1, len: 1 },
                StoreChange { version: 2, len: 0 }
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let store = Store::new();
        let rx = store.subscribe();
        drop(rx);
        store.replace(vec![petition("a")]);
        assert!(store.lock().observers.is_empty());
    }

    #[test]
    fn stale_ticket_is_dropped() {
        let store = Store::new();
        let first = store.begin_fetch();
        let second = store.begin_fetch();
        assert!(first < second);

        assert!(matches!(
            store.publish(second, vec![petition("new")]),
            PublishOutcome::Published(_)
        ));
        assert_eq!(
            store.publish(first, vec![petition("old")]),
            PublishOutcome::Stale {
                ticket: first,
                current: second
            }
        );
        assert_eq!(store.get("new"), Some(petition("new")));
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn in_order_tickets_both_publish() {
        let store = Store::new();
        let first = store.begin_fetch();
        let second = store.begin_fetch();
        store.publish(first, vec![petition("old")]);
        store.publish(second, vec![petition("new")]);
        assert_eq!(store.version(), 2);
        assert_eq!(store.get("new"), Some(petition("new")));
    }

    #[tokio::test]
    async fn test_notify_replace() {
        let store = Store::new();
        let fut = store.notify(|p: &[Petition]| p.iter().any(|x| x.id == "42"));
        store.replace(vec![petition("1")]);
        store.replace(vec![petition("42")]);
        timeout(Duration::from_millis(10), fut)
            .await
            .unwrap()
            .unwrap();
        assert!(store.lock().notifications.is_empty());
    }

    #[tokio::test]
    async fn test_notify_already_satisfied() {
        let store = Store::new();
        store.replace(vec![petition("1")]);
        let fut = store.notify(|p: &[Petition]| !p.is_empty());
        timeout(Duration::from_millis(10), fut)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_notify_pending() {
        let store = Store::new();
        let fut = store.notify(|p: &[Petition]| p.len() > 3);
        store.replace(vec![petition("1")]);
        assert!(timeout(Duration::from_millis(10), fut).await.is_err());
    }

    #[test]
    fn abandoned_notifications_are_pruned() {
        let store = Store::new();
        for _ in 0..100 {
            drop(store.notify(|p: &[Petition]| p.len() > 1000));
        }
        let kept = store.notify(|p: &[Petition]| p.len() > 1000);
        assert_eq!(store.lock().notifications.len(), 101);

        store.replace(Vec::new());
        assert_eq!(store.lock().notifications.len(), 1);
        drop(kept);
        store.replace(Vec::new());
        assert!(store.lock().notifications.is_empty());
    }

    #[tokio::test]
    async fn changes_stream() {
        let store = Store::new();
        let mut changes = store.changes();
        store.replace(vec![petition("a")]);
        let change = timeout(Duration::from_millis(10), changes.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change, StoreChange { version: 1, len: 1 });
    }
}
