//! Realtime history store held in process memory
//!
//! Collections are keyed by their path
//! (`artifacts/<namespace>/users/<identity>/pest_predictions`). Every
//! subscriber of a collection gets its own unbounded channel; fan-out happens
//! under the store lock so all subscribers observe snapshots in the same
//! order.
//!
//! A backing file may be shared by several processes. Mutations run under an
//! exclusive lock on `<file>.lock`: the file is re-read, changed and renamed
//! into place before any subscriber is notified. Each write bumps a revision
//! counter, and a directory watcher adopts newer revisions written by others.

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use pestwatch_application::{
    HistoryStore, ListenError, SnapshotEvent, Subscription, UnsubscribeHandle, WriteError,
};
use pestwatch_domain::{HistoryRecord, NewHistoryRecord, RecordId, Session, collection_path};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Errors opening a file-backed store
#[derive(Error, Debug)]
pub enum StoreOpenError {
    #[error("Failed to read history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History file {path} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk layout: collection path -> records in insertion order
#[derive(Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    revision: u64,
    collections: BTreeMap<String, Vec<HistoryRecord>>,
}

impl StoreFile {
    /// Read the file; a missing file is empty at revision 0.
    fn read(path: &Path) -> Result<Self, StoreOpenError> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                StoreOpenError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(StoreOpenError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn write(&self, path: &Path) -> Result<(), WriteError> {
        let json = serde_json::to_string_pretty(self).map_err(storage)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(storage)?;
        std::fs::rename(&tmp, path).map_err(storage)?;
        Ok(())
    }
}

/// Exclusive advisory lock on the `.lock` sidecar of a store file
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.with_extension("lock"))?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn storage(e: impl ToString) -> WriteError {
    WriteError::Storage(e.to_string())
}

/// Apply `mutate` to the freshest file contents under the cross-process lock.
///
/// The file is rewritten with the next revision only when `mutate` reports a
/// change. Returns what is on disk afterwards and whether it was rewritten.
fn mutate_locked<F>(path: &Path, mutate: F) -> Result<(StoreFile, bool), WriteError>
where
    F: FnOnce(&mut StoreFile) -> bool,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(storage)?;
    }
    let _lock = FileLock::acquire(path).map_err(storage)?;

    let mut stored = StoreFile::read(path).map_err(storage)?;
    if !mutate(&mut stored) {
        return Ok((stored, false));
    }
    stored.revision += 1;
    stored.collections.retain(|_, records| !records.is_empty());
    stored.write(path)?;
    Ok((stored, true))
}

type Listener = mpsc::UnboundedSender<SnapshotEvent>;

#[derive(Default)]
struct Collection {
    records: Vec<HistoryRecord>,
    listeners: HashMap<u64, Listener>,
}

impl Collection {
    /// Push the current snapshot to every listener, dropping closed ones.
    fn publish(&mut self) {
        let records = &self.records;
        self.listeners
            .retain(|_, listener| listener.send(Ok(records.clone())).is_ok());
    }
}

#[derive(Default)]
struct State {
    collections: HashMap<String, Collection>,
    next_listener: u64,
    revision: u64,
}

impl State {
    /// Take over a newer file revision, publishing every collection it changes.
    ///
    /// Older or equal revisions are ignored, so a write is published once no
    /// matter whether the writer or the file watcher lands it first.
    fn adopt(&mut self, stored: StoreFile) -> bool {
        if stored.revision <= self.revision {
            return false;
        }
        self.revision = stored.revision;

        let mut incoming = stored.collections;
        for (key, collection) in self.collections.iter_mut() {
            let records = incoming.remove(key).unwrap_or_default();
            if collection.records != records {
                collection.records = records;
                collection.publish();
            }
        }
        for (key, records) in incoming {
            self.collections.insert(
                key,
                Collection {
                    records,
                    listeners: HashMap::new(),
                },
            );
        }
        true
    }
}

fn lock_state(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Re-read the file after another writer touched it.
fn reload(path: &Path, state: &Weak<Mutex<State>>) {
    let Some(state) = state.upgrade() else {
        return;
    };
    match StoreFile::read(path) {
        Ok(stored) => {
            let revision = stored.revision;
            if lock_state(&state).adopt(stored) {
                debug!("Adopted history revision {} from {}", revision, path.display());
            }
        }
        Err(e) => warn!("Could not reload history: {}", e),
    }
}

/// Watch the file's directory; the file itself is replaced on every write.
fn watch_file(path: &Path, state: Weak<Mutex<State>>) -> notify::Result<RecommendedWatcher> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let target = path.to_path_buf();
    let file_name = path.file_name().map(|n| n.to_os_string());

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!("History watcher error: {}", e);
                return;
            }
        };
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }
        let touched = event
            .paths
            .iter()
            .any(|p| p.file_name() == file_name.as_deref());
        if touched {
            reload(&target, &state);
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Realtime history store held in process memory
pub struct MemoryHistoryStore {
    namespace: String,
    file: Option<PathBuf>,
    state: Arc<Mutex<State>>,
    _watcher: Option<RecommendedWatcher>,
}

impl MemoryHistoryStore {
    /// Memory-only store
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            file: None,
            state: Arc::new(Mutex::new(State::default())),
            _watcher: None,
        }
    }

    /// Store backed by a JSON file. A missing file starts empty.
    ///
    /// Writes made to the same file by other processes reach this store's
    /// subscribers while it stays open.
    pub fn open(namespace: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, StoreOpenError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreOpenError::Io {
                path: path.clone(),
                source,
            })?;
        }
        let stored = StoreFile::read(&path)?;
        info!(
            "Opened history file {} ({} collections, revision {})",
            path.display(),
            stored.collections.len(),
            stored.revision
        );
        Ok(Self::backed(namespace, path, stored))
    }

    fn backed(namespace: impl Into<String>, path: PathBuf, stored: StoreFile) -> Self {
        let state = Arc::new(Mutex::new(State {
            collections: stored
                .collections
                .into_iter()
                .map(|(key, records)| {
                    (
                        key,
                        Collection {
                            records,
                            listeners: HashMap::new(),
                        },
                    )
                })
                .collect(),
            next_listener: 0,
            revision: stored.revision,
        }));

        let watcher = match watch_file(&path, Arc::downgrade(&state)) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(
                    "Not watching {} for outside changes: {}",
                    path.display(),
                    e
                );
                None
            }
        };

        Self {
            namespace: namespace.into(),
            file: Some(path),
            state,
            _watcher: watcher,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// End every subscription with [`ListenError::Closed`].
    pub fn shutdown(&self) {
        let mut state = self.lock();
        for collection in state.collections.values_mut() {
            for (_, listener) in collection.listeners.drain() {
                let _ = listener.send(Err(ListenError::Closed));
            }
        }
        debug!("History store shut down");
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        lock_state(&self.state)
    }

    fn key(&self, session: &Session) -> Option<String> {
        session
            .identity()
            .map(|identity| collection_path(&self.namespace, identity))
    }

    /// Run a locked read-modify-write of the backing file off the runtime
    /// threads, then adopt the result.
    async fn mutate_file<F>(&self, path: &Path, mutate: F) -> Result<bool, WriteError>
    where
        F: FnOnce(&mut StoreFile) -> bool + Send + 'static,
    {
        let path = path.to_path_buf();
        let (stored, changed) =
            tokio::task::spawn_blocking(move || mutate_locked(&path, mutate))
                .await
                .map_err(storage)?
                .inspect_err(|e| warn!("Could not persist history: {}", e))?;
        self.lock().adopt(stored);
        Ok(changed)
    }

    /// Pick up writes the watcher may not have delivered yet.
    async fn refresh(&self) {
        let Some(path) = self.file.clone() else {
            return;
        };
        let read = tokio::task::spawn_blocking(move || StoreFile::read(&path)).await;
        match read {
            Ok(Ok(stored)) => {
                self.lock().adopt(stored);
            }
            Ok(Err(e)) => warn!("Could not refresh history: {}", e),
            Err(e) => warn!("History refresh task failed: {}", e),
        }
    }
}

fn release_listener(state: &Weak<Mutex<State>>, key: &str, id: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = lock_state(&state);
    if let Some(collection) = state.collections.get_mut(key) {
        collection.listeners.remove(&id);
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn subscribe(&self, session: &Session) -> Result<Subscription, ListenError> {
        let key = self.key(session).ok_or(ListenError::IdentityNotReady)?;
        self.refresh().await;
        let (tx, rx) = mpsc::unbounded_channel();

        let id = {
            let mut state = self.lock();
            let id = state.next_listener;
            state.next_listener += 1;

            let collection = state.collections.entry(key.clone()).or_default();
            // Current snapshot first; the channel is unbounded so this never blocks
            let _ = tx.send(Ok(collection.records.clone()));
            collection.listeners.insert(id, tx);
            id
        };
        debug!("Listener {} subscribed to {}", id, key);

        let weak = Arc::downgrade(&self.state);
        let handle = UnsubscribeHandle::new(move || {
            release_listener(&weak, &key, id);
            debug!("Listener {} unsubscribed", id);
        });
        Ok(Subscription::new(rx, handle))
    }

    async fn append(
        &self,
        session: &Session,
        record: NewHistoryRecord,
    ) -> Result<RecordId, WriteError> {
        let key = self.key(session).ok_or(WriteError::IdentityNotReady)?;
        let id = RecordId::generate();
        let record = HistoryRecord::create(id.clone(), record, Utc::now());

        match &self.file {
            Some(path) => {
                let collection = key.clone();
                self.mutate_file(path, move |stored| {
                    stored.collections.entry(collection).or_default().push(record);
                    true
                })
                .await?;
            }
            None => {
                let mut state = self.lock();
                let collection = state.collections.entry(key.clone()).or_default();
                collection.records.push(record);
                collection.publish();
            }
        }

        debug!("Appended {} to {}", id, key);
        Ok(id)
    }

    async fn delete_by_id(&self, session: &Session, id: &RecordId) -> Result<(), WriteError> {
        let key = self.key(session).ok_or(WriteError::IdentityNotReady)?;

        let removed = match &self.file {
            Some(path) => {
                let (collection, target) = (key.clone(), id.clone());
                self.mutate_file(path, move |stored| {
                    let Some(records) = stored.collections.get_mut(&collection) else {
                        return false;
                    };
                    let before = records.len();
                    records.retain(|r| r.id() != &target);
                    records.len() != before
                })
                .await?
            }
            None => {
                let mut state = self.lock();
                let collection = state.collections.entry(key.clone()).or_default();
                let index = collection.records.iter().position(|r| r.id() == id);
                if let Some(index) = index {
                    collection.records.remove(index);
                    collection.publish();
                }
                index.is_some()
            }
        };

        if removed {
            debug!("Deleted {} from {}", id, key);
        } else {
            debug!("Delete of absent record {} ignored", id);
        }
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use pestwatch_domain::{IdentityId, IdentityOrigin, PredictionResult, sort_newest_first};
    use std::time::Duration;

    fn session(id: &str) -> Session {
        Session::resolved(IdentityId::from_provider(id).unwrap(), IdentityOrigin::Provider)
    }

    fn fields(label: &str) -> NewHistoryRecord {
        NewHistoryRecord::from_prediction(&PredictionResult::new(label), Some("note"), None)
    }

    async fn next_snapshot(subscription: &mut Subscription) -> Vec<HistoryRecord> {
        tokio::time::timeout(Duration::from_secs(1), subscription.next())
            .await
            .expect("no snapshot delivered")
            .expect("subscription ended")
            .expect("subscription failed")
    }

    async fn assert_quiet(subscription: &mut Subscription) {
        let waited = tokio::time::timeout(Duration::from_millis(50), subscription.next()).await;
        assert!(waited.is_err(), "unexpected snapshot delivered");
    }

    fn labels(records: &[HistoryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.label()).collect()
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_snapshot_first() {
        let store = MemoryHistoryStore::new("pestpredictionapp");
        let user = session("u1");
        store.append(&user, fields("aphids")).await.unwrap();

        let mut subscription = store.subscribe(&user).await.unwrap();
        let first = next_snapshot(&mut subscription).await;

        assert_eq!(labels(&first), vec!["aphids"]);
        assert_eq!(first[0].text(), Some("note"));
    }

    #[tokio::test]
    async fn test_two_subscribers_see_same_sequence() {
        let store = MemoryHistoryStore::new("pestpredictionapp");
        let user = session("u1");
        let mut a = store.subscribe(&user).await.unwrap();
        let mut b = store.subscribe(&user).await.unwrap();
        assert!(next_snapshot(&mut a).await.is_empty());
        assert!(next_snapshot(&mut b).await.is_empty());

        let first = store.append(&user, fields("aphids")).await.unwrap();
        store.append(&user, fields("mites")).await.unwrap();
        store.delete_by_id(&user, &first).await.unwrap();

        for subscription in [&mut a, &mut b] {
            assert_eq!(labels(&next_snapshot(subscription).await), vec!["aphids"]);
            assert_eq!(
                labels(&next_snapshot(subscription).await),
                vec!["aphids", "mites"]
            );
            assert_eq!(labels(&next_snapshot(subscription).await), vec!["mites"]);
        }
    }

    #[tokio::test]
    async fn test_new_record_sorts_first() {
        let store = MemoryHistoryStore::new("pestpredictionapp");
        let user = session("u1");
        store.append(&user, fields("aphids")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let newest = store.append(&user, fields("whiteflies")).await.unwrap();

        let mut records = store.snapshot(&user).await.unwrap();
        sort_newest_first(&mut records);

        assert_eq!(records[0].id(), &newest);
        assert!(records[0].created_at() >= records[1].created_at());
    }

    #[tokio::test]
    async fn test_delete_absent_id_is_silent() {
        let store = MemoryHistoryStore::new("pestpredictionapp");
        let user = session("u1");
        store.append(&user, fields("aphids")).await.unwrap();
        let mut subscription = store.subscribe(&user).await.unwrap();
        next_snapshot(&mut subscription).await;

        store
            .delete_by_id(&user, &RecordId::new("missing"))
            .await
            .unwrap();

        assert_quiet(&mut subscription).await;
        assert_eq!(store.snapshot(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_identities_are_isolated() {
        let store = MemoryHistoryStore::new("pestpredictionapp");
        let alice = session("alice");
        let bob = session("bob");
        let mut bob_sub = store.subscribe(&bob).await.unwrap();
        next_snapshot(&mut bob_sub).await;

        let id = store.append(&alice, fields("aphids")).await.unwrap();
        store.delete_by_id(&bob, &id).await.unwrap();

        assert_quiet(&mut bob_sub).await;
        assert_eq!(store.snapshot(&alice).await.unwrap().len(), 1);
        assert!(store.snapshot(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unready_session_is_refused() {
        let store = MemoryHistoryStore::new("pestpredictionapp");
        let unready = Session::unresolved();

        assert!(matches!(
            store.subscribe(&unready).await,
            Err(ListenError::IdentityNotReady)
        ));
        assert_eq!(
            store.append(&unready, fields("aphids")).await,
            Err(WriteError::IdentityNotReady)
        );
        assert_eq!(
            store.delete_by_id(&unready, &RecordId::new("x")).await,
            Err(WriteError::IdentityNotReady)
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_ends_stream() {
        let store = MemoryHistoryStore::new("pestpredictionapp");
        let user = session("u1");
        let mut subscription = store.subscribe(&user).await.unwrap();
        next_snapshot(&mut subscription).await;

        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());
        store.append(&user, fields("aphids")).await.unwrap();

        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_shutdown_reports_closed() {
        let store = MemoryHistoryStore::new("pestpredictionapp");
        let user = session("u1");
        let mut subscription = store.subscribe(&user).await.unwrap();
        next_snapshot(&mut subscription).await;

        store.shutdown();

        assert_eq!(subscription.next().await, Some(Err(ListenError::Closed)));
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("history.json");
        let user = session("u1");

        let kept = {
            let store = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
            let gone = store.append(&user, fields("aphids")).await.unwrap();
            let kept = store.append(&user, fields("mealybugs")).await.unwrap();
            store.delete_by_id(&user, &gone).await.unwrap();
            kept
        };

        let reopened = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
        let records = reopened.snapshot(&user).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), &kept);
        assert_eq!(records[0].label(), "mealybugs");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("artifacts/pestpredictionapp/users/u1/pest_predictions"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            MemoryHistoryStore::open("pestpredictionapp", &path),
            Err(StoreOpenError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_collection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail
        let path = dir.path().join("history.json");
        std::fs::create_dir_all(&path).unwrap();
        let store = MemoryHistoryStore::backed("pestpredictionapp", path, StoreFile::default());
        let user = session("u1");
        let mut subscription = store.subscribe(&user).await.unwrap();
        next_snapshot(&mut subscription).await;

        let err = store.append(&user, fields("aphids")).await.unwrap_err();

        assert!(matches!(err, WriteError::Storage(_)));
        assert_quiet(&mut subscription).await;
        assert!(store.snapshot(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_without_revision_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let user = session("u1");
        let seeded = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
        seeded.append(&user, fields("aphids")).await.unwrap();
        drop(seeded);

        let mut raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        raw.as_object_mut().unwrap().remove("revision");
        std::fs::write(&path, raw.to_string()).unwrap();

        let store = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
        assert_eq!(labels(&store.snapshot(&user).await.unwrap()), vec!["aphids"]);
        store.append(&user, fields("mites")).await.unwrap();
        assert_eq!(
            labels(&store.snapshot(&user).await.unwrap()),
            vec!["aphids", "mites"]
        );
    }

    #[tokio::test]
    async fn test_stores_sharing_a_file_keep_each_others_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let user = session("u1");
        let first = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
        let second = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();

        second.append(&user, fields("mites")).await.unwrap();
        first.append(&user, fields("aphids")).await.unwrap();

        let reopened = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
        assert_eq!(
            labels(&reopened.snapshot(&user).await.unwrap()),
            vec!["mites", "aphids"]
        );
        assert_eq!(
            labels(&first.snapshot(&user).await.unwrap()),
            vec!["mites", "aphids"]
        );
    }

    #[tokio::test]
    async fn test_delete_reaches_record_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let user = session("u1");
        let first = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
        let second = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();

        let id = second.append(&user, fields("thrips")).await.unwrap();
        first.delete_by_id(&user, &id).await.unwrap();

        assert!(second.snapshot(&user).await.unwrap().is_empty());
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains(id.as_str()));
    }

    #[tokio::test]
    async fn test_subscriber_sees_write_from_another_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let user = session("u1");
        let watching = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
        let writer = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
        let mut subscription = watching.subscribe(&user).await.unwrap();
        assert!(next_snapshot(&mut subscription).await.is_empty());

        writer.append(&user, fields("whiteflies")).await.unwrap();

        let update = tokio::time::timeout(Duration::from_secs(5), subscription.next())
            .await
            .expect("outside write never delivered")
            .unwrap()
            .unwrap();
        assert_eq!(labels(&update), vec!["whiteflies"]);
    }

    #[tokio::test]
    async fn test_own_write_is_published_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = MemoryHistoryStore::open("pestpredictionapp", &path).unwrap();
        let user = session("u1");
        let mut subscription = store.subscribe(&user).await.unwrap();
        next_snapshot(&mut subscription).await;

        store.append(&user, fields("aphids")).await.unwrap();

        assert_eq!(labels(&next_snapshot(&mut subscription).await), vec!["aphids"]);
        let waited = tokio::time::timeout(Duration::from_millis(300), subscription.next()).await;
        assert!(waited.is_err(), "write published twice");
    }
}
