//! History view use case
//!
//! Keeps the latest newest-first snapshot of an identity's history for a UI
//! surface, together with loading and error state.

use crate::ports::activity_logger::{ActivityEvent, ActivityLogger, NoActivityLogger};
use crate::ports::history_store::{HistoryStore, ListenError, UnsubscribeHandle, WriteError};
use crate::use_cases::shared::require_identity;
use pestwatch_domain::{HistoryRecord, RecordId, Session, ValidationError, sort_newest_first};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What a history surface renders
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryViewState {
    /// Latest snapshot, newest first
    pub records: Vec<HistoryRecord>,
    /// True until the first snapshot (or error) arrives
    pub loading: bool,
    /// Persistent banner once the subscription broke
    pub error: Option<ListenError>,
}

impl Default for HistoryViewState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

/// A mounted history view
///
/// Mounting subscribes to the store; every pushed snapshot is re-sorted and
/// published. Deletions go through the store and show up with the next
/// snapshot. Dropping the view unmounts it.
pub struct HistoryView<H: HistoryStore + 'static> {
    store: Arc<H>,
    session: Session,
    activity: Arc<dyn ActivityLogger>,
    state_rx: watch::Receiver<HistoryViewState>,
    handle: UnsubscribeHandle,
}

impl<H: HistoryStore + 'static> HistoryView<H> {
    /// Mount the view for a ready session.
    ///
    /// A subscription that cannot be established is not an error here: the
    /// view mounts with the error banner set.
    pub async fn mount(store: Arc<H>, session: Session) -> Result<Self, ValidationError> {
        Self::mount_with_activity(store, session, Arc::new(NoActivityLogger)).await
    }

    pub async fn mount_with_activity(
        store: Arc<H>,
        session: Session,
        activity: Arc<dyn ActivityLogger>,
    ) -> Result<Self, ValidationError> {
        let identity = require_identity(&session)?;
        debug!("Mounting history view for {}", identity);

        let (state_tx, state_rx) = watch::channel(HistoryViewState::default());

        let handle = match store.subscribe(&session).await {
            Ok(mut subscription) => {
                let handle = subscription.handle();
                tokio::spawn(async move {
                    while let Some(event) = subscription.next().await {
                        match event {
                            Ok(mut records) => {
                                sort_newest_first(&mut records);
                                state_tx.send_modify(|state| {
                                    state.records = records;
                                    state.loading = false;
                                    state.error = None;
                                });
                            }
                            Err(e) => {
                                warn!("History subscription failed: {}", e);
                                state_tx.send_modify(|state| {
                                    state.loading = false;
                                    state.error = Some(e);
                                });
                                break;
                            }
                        }
                    }
                    debug!("History view listener finished");
                });
                handle
            }
            Err(e) => {
                warn!("Could not subscribe to history: {}", e);
                state_tx.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(e);
                });
                UnsubscribeHandle::new(|| {})
            }
        };

        Ok(Self {
            store,
            session,
            activity,
            state_rx,
            handle,
        })
    }

    /// Current view state
    pub fn view(&self) -> HistoryViewState {
        self.state_rx.borrow().clone()
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.state_rx.borrow().records.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state_rx.borrow().loading
    }

    pub fn error(&self) -> Option<ListenError> {
        self.state_rx.borrow().error.clone()
    }

    /// Wait for the next state change. Returns `false` once the view will
    /// not change any more.
    pub async fn changed(&mut self) -> bool {
        self.state_rx.changed().await.is_ok()
    }

    /// Receiver observing every published state
    pub fn watch(&self) -> watch::Receiver<HistoryViewState> {
        self.state_rx.clone()
    }

    /// Delete a record. The view itself is updated by the store's next
    /// snapshot.
    pub async fn delete(&self, id: &RecordId) -> Result<(), WriteError> {
        self.store.delete_by_id(&self.session, id).await?;
        info!("Deleted history record {}", id);
        self.activity.log(ActivityEvent::new(
            "history_deleted",
            json!({ "id": id.as_str() }),
        ));
        Ok(())
    }

    /// Release the store listener. Returns `true` only the first time.
    pub fn unmount(&self) -> bool {
        let released = self.handle.unsubscribe();
        if released {
            debug!("History view unmounted");
        }
        released
    }

    pub fn is_mounted(&self) -> bool {
        !self.handle.is_released()
    }
}

impl<H: HistoryStore + 'static> Drop for HistoryView<H> {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::history_store::{SnapshotEvent, Subscription};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pestwatch_domain::{IdentityId, IdentityOrigin, NewHistoryRecord, PredictionResult};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    type Senders = Arc<Mutex<Vec<Option<mpsc::UnboundedSender<SnapshotEvent>>>>>;

    #[derive(Default)]
    struct FakeStore {
        senders: Senders,
        initial: Vec<HistoryRecord>,
        released: Arc<AtomicUsize>,
        deleted: Mutex<Vec<RecordId>>,
        refuse: bool,
    }

    impl FakeStore {
        fn with_initial(initial: Vec<HistoryRecord>) -> Self {
            Self {
                initial,
                ..Self::default()
            }
        }

        fn emit(&self, event: SnapshotEvent) {
            for tx in self.senders.lock().unwrap().iter().flatten() {
                let _ = tx.send(event.clone());
            }
        }
    }

    #[async_trait]
    impl HistoryStore for FakeStore {
        async fn subscribe(&self, _session: &Session) -> Result<Subscription, ListenError> {
            if self.refuse {
                return Err(ListenError::Storage("permission denied".into()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            tx.send(Ok(self.initial.clone())).unwrap();

            let mut senders = self.senders.lock().unwrap();
            let slot = senders.len();
            senders.push(Some(tx));

            let senders = Arc::clone(&self.senders);
            let released = Arc::clone(&self.released);
            let handle = UnsubscribeHandle::new(move || {
                senders.lock().unwrap()[slot] = None;
                released.fetch_add(1, Ordering::SeqCst);
            });
            Ok(Subscription::new(rx, handle))
        }

        async fn append(
            &self,
            _session: &Session,
            _record: NewHistoryRecord,
        ) -> Result<RecordId, WriteError> {
            Ok(RecordId::generate())
        }

        async fn delete_by_id(&self, _session: &Session, id: &RecordId) -> Result<(), WriteError> {
            self.deleted.lock().unwrap().push(id.clone());
            Ok(())
        }
    }

    fn ready_session() -> Session {
        Session::resolved(
            IdentityId::from_provider("uid-1").unwrap(),
            IdentityOrigin::Provider,
        )
    }

    fn record(id: &str, minute: u32) -> HistoryRecord {
        let fields = NewHistoryRecord::from_prediction(&PredictionResult::new("aphids"), None, None);
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 9, minute, 0).unwrap();
        HistoryRecord::create(RecordId::new(id), fields, at)
    }

    async fn wait_for<H: HistoryStore>(
        view: &mut HistoryView<H>,
        done: impl Fn(&HistoryViewState) -> bool,
    ) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !done(&view.view()) {
                assert!(view.changed().await);
            }
        })
        .await
        .expect("view never reached the expected state");
    }

    fn ids(records: &[HistoryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id().as_str()).collect()
    }

    #[tokio::test]
    async fn test_mount_refuses_unready_session() {
        let result = HistoryView::mount(Arc::new(FakeStore::default()), Session::unresolved()).await;
        assert!(matches!(result, Err(ValidationError::IdentityNotReady)));
    }

    #[tokio::test]
    async fn test_snapshots_sorted_newest_first() {
        let store = Arc::new(FakeStore::with_initial(vec![
            record("a", 1),
            record("c", 3),
            record("b", 2),
        ]));
        let mut view = HistoryView::mount(Arc::clone(&store), ready_session())
            .await
            .unwrap();

        wait_for(&mut view, |s| !s.loading).await;
        assert_eq!(ids(&view.records()), vec!["c", "b", "a"]);

        store.emit(Ok(vec![record("a", 1), record("d", 4)]));
        wait_for(&mut view, |s| s.records.len() == 2).await;
        assert_eq!(ids(&view.records()), vec!["d", "a"]);
    }

    #[tokio::test]
    async fn test_listen_error_sets_banner() {
        let store = Arc::new(FakeStore::default());
        let mut view = HistoryView::mount(Arc::clone(&store), ready_session())
            .await
            .unwrap();
        wait_for(&mut view, |s| !s.loading).await;

        store.emit(Err(ListenError::Storage("quota exceeded".into())));
        wait_for(&mut view, |s| s.error.is_some()).await;

        assert_eq!(
            view.error(),
            Some(ListenError::Storage("quota exceeded".into()))
        );
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_refused_subscription_mounts_with_banner() {
        let store = Arc::new(FakeStore {
            refuse: true,
            ..FakeStore::default()
        });
        let view = HistoryView::mount(store, ready_session()).await.unwrap();

        assert!(!view.is_loading());
        assert!(matches!(view.error(), Some(ListenError::Storage(_))));
    }

    #[tokio::test]
    async fn test_delete_waits_for_next_snapshot() {
        let store = Arc::new(FakeStore::with_initial(vec![record("a", 1), record("b", 2)]));
        let mut view = HistoryView::mount(Arc::clone(&store), ready_session())
            .await
            .unwrap();
        wait_for(&mut view, |s| !s.loading).await;

        view.delete(&RecordId::new("a")).await.unwrap();
        assert_eq!(*store.deleted.lock().unwrap(), vec![RecordId::new("a")]);
        assert_eq!(view.records().len(), 2);

        store.emit(Ok(vec![record("b", 2)]));
        wait_for(&mut view, |s| s.records.len() == 1).await;
        assert_eq!(ids(&view.records()), vec!["b"]);
    }

    #[tokio::test]
    async fn test_double_unmount_is_noop() {
        let store = Arc::new(FakeStore::default());
        let view = HistoryView::mount(Arc::clone(&store), ready_session())
            .await
            .unwrap();

        assert!(view.is_mounted());
        assert!(view.unmount());
        assert!(!view.unmount());
        assert!(!view.is_mounted());

        drop(view);
        assert_eq!(store.released.load(Ordering::SeqCst), 1);
    }
}
