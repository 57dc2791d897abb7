//! The assembled engine: store + monitor + router + orchestrator.
//!
//! [`Satchel`] is the surface handed to UI and other collaborators. It
//! owns the auto-drain task and exposes the published operations:
//! submit-request, the connectivity and sync-status streams,
//! trigger-sync, and conflict-log management.

use crate::connectivity::ConnectivityMonitor;
use crate::error::SyncResult;
use crate::orchestrator::{DrainOutcome, SyncConfig, SyncOrchestrator, SyncStatus};
use crate::router::RequestRouter;
use crate::transport::RemoteTransport;
use satchel_storage::{LocalStore, StorageResult};
use satchel_types::{ClientResponse, Conflict, Method};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{OnceCell, watch};
use tokio::task::JoinHandle;

/// Lazily opened, shared local store.
///
/// Concurrent initializers converge on one underlying handle: the first
/// caller runs the open (migrations and seeding included) and everyone
/// else awaits the same cell.
pub struct StoreCell {
    path: PathBuf,
    cell: OnceCell<Arc<LocalStore>>,
}

impl StoreCell {
    /// Creates a cell for the store at `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Returns the store, opening it on first call.
    pub async fn get(&self) -> StorageResult<Arc<LocalStore>> {
        self.cell
            .get_or_try_init(|| async { LocalStore::open(&self.path).map(Arc::new) })
            .await
            .cloned()
    }
}

/// Configuration for [`Satchel::open`].
#[derive(Debug, Clone)]
pub struct SatchelConfig {
    /// Path of the SQLite store.
    pub db_path: PathBuf,
    /// Initial connectivity state.
    pub start_online: bool,
    /// Orchestrator settings.
    pub sync: SyncConfig,
}

impl SatchelConfig {
    /// Config with defaults for the given store path.
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            start_online: true,
            sync: SyncConfig::default(),
        }
    }
}

/// The offline-first engine, fully wired.
pub struct Satchel {
    store: Arc<LocalStore>,
    connectivity: Arc<ConnectivityMonitor>,
    router: RequestRouter,
    orchestrator: Arc<SyncOrchestrator>,
    auto_drain: JoinHandle<()>,
}

impl Satchel {
    /// Opens the store and wires the engine against the given transport.
    /// Spawns the auto-drain task.
    pub async fn open(
        config: SatchelConfig,
        transport: Arc<dyn RemoteTransport>,
    ) -> SyncResult<Self> {
        let cell = StoreCell::new(&config.db_path);
        let store = cell.get().await?;
        Ok(Self::with_store(store, config, transport))
    }

    /// Wires the engine around an already opened store.
    pub fn with_store(
        store: Arc<LocalStore>,
        config: SatchelConfig,
        transport: Arc<dyn RemoteTransport>,
    ) -> Self {
        let connectivity = Arc::new(ConnectivityMonitor::new(config.start_online));
        let router = RequestRouter::new(
            Arc::clone(&store),
            Arc::clone(&connectivity),
            Arc::clone(&transport),
        );
        let orchestrator = Arc::new(SyncOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&connectivity),
            transport,
            config.sync,
        ));
        let auto_drain = orchestrator.spawn_auto_drain();
        Self {
            store,
            connectivity,
            router,
            orchestrator,
            auto_drain,
        }
    }

    // ── Requests ─────────────────────────────────────────────────

    /// Submits a request through the routing policy.
    pub async fn submit_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> SyncResult<ClientResponse> {
        self.router.submit(method, url, body).await
    }

    // ── Connectivity ─────────────────────────────────────────────

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Feeds in the platform reachability signal.
    pub fn set_online(&self, online: bool) -> bool {
        self.connectivity.set_online(online)
    }

    /// Live connectivity stream.
    pub fn observe_connectivity(&self) -> watch::Receiver<bool> {
        self.connectivity.observe()
    }

    // ── Sync ─────────────────────────────────────────────────────

    /// Current sync status.
    pub fn sync_status(&self) -> SyncStatus {
        self.orchestrator.status()
    }

    /// Live sync-status stream.
    pub fn observe_sync_status(&self) -> watch::Receiver<SyncStatus> {
        self.orchestrator.observe_status()
    }

    /// Fire-and-forget drain request.
    pub fn trigger_sync(&self) {
        self.orchestrator.trigger_sync();
    }

    /// Runs a drain and waits for its outcome.
    pub async fn drain(&self) -> SyncResult<DrainOutcome> {
        self.orchestrator.drain().await
    }

    // ── Conflict log ─────────────────────────────────────────────

    /// Lists parked conflicts.
    pub fn list_conflicts(&self) -> SyncResult<Vec<Conflict>> {
        Ok(self.store.list_conflicts()?)
    }

    /// Removes a conflict (operator action). Idempotent.
    pub fn remove_conflict(&self, id: i64) -> SyncResult<()> {
        Ok(self.store.remove_conflict(id)?)
    }

    /// Direct access to the local store.
    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }
}

impl Drop for Satchel {
    fn drop(&mut self) {
        self.auto_drain.abort();
    }
}
