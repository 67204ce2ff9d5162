//! History store port
//!
//! Defines the realtime, per-identity history collection: subscribe, append,
//! delete and unsubscribe. Implementations (adapters) live in the
//! infrastructure layer.

use async_trait::async_trait;
use pestwatch_domain::{HistoryRecord, NewHistoryRecord, RecordId, Session};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from history writes (append and delete)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("Identity not ready; history writes are disabled")]
    IdentityNotReady,

    #[error("History store unavailable: {0}")]
    Unavailable(String),

    #[error("History storage error: {0}")]
    Storage(String),
}

/// Errors from history subscriptions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenError {
    #[error("Identity not ready; history is unavailable")]
    IdentityNotReady,

    #[error("History subscription closed")]
    Closed,

    #[error("History storage error: {0}")]
    Storage(String),
}

/// One delivery on a subscription: the full current snapshot, or the error
/// that ended the subscription.
///
/// Snapshots arrive in store order; consumers sort them for display.
pub type SnapshotEvent = Result<Vec<HistoryRecord>, ListenError>;

/// Disposable handle releasing a store listener.
///
/// Cloneable; the listener is released at most once no matter how many clones
/// call [`unsubscribe`](Self::unsubscribe).
#[derive(Clone)]
pub struct UnsubscribeHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    released: AtomicBool,
    release: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl UnsubscribeHandle {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                released: AtomicBool::new(false),
                release: Mutex::new(Some(Box::new(release))),
            }),
        }
    }

    /// Release the listener. Returns `true` only for the call that actually
    /// released it; later calls are no-ops.
    pub fn unsubscribe(&self) -> bool {
        if self.inner.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        let release = match self.inner.release.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(release) = release {
            release();
        }
        true
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for UnsubscribeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsubscribeHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// A live history subscription.
///
/// The first event is the snapshot current at subscribe time. Dropping the
/// subscription unsubscribes.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<SnapshotEvent>,
    handle: UnsubscribeHandle,
}

impl Subscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<SnapshotEvent>, handle: UnsubscribeHandle) -> Self {
        Self { receiver, handle }
    }

    /// Wait for the next snapshot. Returns `None` once the store has dropped
    /// this listener (after unsubscribe or store shutdown).
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.receiver.recv().await
    }

    pub fn handle(&self) -> UnsubscribeHandle {
        self.handle.clone()
    }

    pub fn unsubscribe(&self) -> bool {
        self.handle.unsubscribe()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

/// Realtime, per-identity history collection
///
/// Every operation is scoped to the identity of a ready [`Session`] and is
/// refused while the session is not ready.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Subscribe to the identity's collection.
    ///
    /// Delivers the current snapshot immediately, then a new snapshot after
    /// every create or delete, in the same order for every subscriber.
    async fn subscribe(&self, session: &Session) -> Result<Subscription, ListenError>;

    /// Append a record; the store assigns its id and creation time.
    async fn append(
        &self,
        session: &Session,
        record: NewHistoryRecord,
    ) -> Result<RecordId, WriteError>;

    /// Delete a record. Deleting an id that is not present succeeds and
    /// changes nothing.
    async fn delete_by_id(&self, session: &Session, id: &RecordId) -> Result<(), WriteError>;

    /// One-shot read of the current snapshot.
    async fn snapshot(&self, session: &Session) -> Result<Vec<HistoryRecord>, ListenError> {
        let mut subscription = self.subscribe(session).await?;
        let first = subscription.next().await.unwrap_or(Err(ListenError::Closed));
        subscription.unsubscribe();
        first
    }
}
