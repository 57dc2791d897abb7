//! Sync orchestration: draining the outbox against the backend.
//!
//! The orchestrator is a two-state machine (Idle → Draining → Idle). A
//! drain replays the queued mutations strictly in enqueue order, one in
//! flight at a time, and classifies each outcome:
//!
//! - 2xx: remove from the outbox, keep going
//! - 4xx: relocate to the conflict log, keep going
//! - anything else (5xx, transport failure, timeout): stop immediately,
//!   leaving this item and everything after it queued for the next drain
//!
//! Status is published on every transition through a watch channel; the
//! status value is owned exclusively by the orchestrator.

use crate::connectivity::ConnectivityMonitor;
use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteTransport;
use satchel_storage::LocalStore;
use satchel_types::{PendingMutation, RemoteRequest, RemoteResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Per-item timeout on remote calls during a drain. A timeout is
    /// treated like any other transient failure: the drain stops and the
    /// item stays queued.
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Snapshot of the current sync state, published on every transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Whether a drain is in progress.
    pub is_syncing: bool,
    /// Size of the drain snapshot.
    pub total_items: usize,
    /// Items replayed successfully so far.
    pub completed_items: usize,
    /// Items moved to the conflict log so far.
    pub failed_items: usize,
}

/// Terminal result of one drain request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The snapshot was fully processed.
    Completed {
        /// Mutations applied remotely.
        completed: usize,
        /// Mutations parked in the conflict log.
        conflicts: usize,
    },
    /// A transient failure stopped the drain; the remaining items are
    /// still queued and will be retried on the next drain.
    Aborted {
        completed: usize,
        conflicts: usize,
        /// Description of the failure that stopped the drain.
        error: String,
    },
    /// A drain was already in progress; nothing was done.
    AlreadyRunning,
    /// Offline; nothing was done.
    Offline,
}

/// Drains the pending-mutation outbox whenever connectivity allows.
pub struct SyncOrchestrator {
    store: Arc<LocalStore>,
    connectivity: Arc<ConnectivityMonitor>,
    transport: Arc<dyn RemoteTransport>,
    config: SyncConfig,
    status_tx: watch::Sender<SyncStatus>,
    draining: AtomicBool,
}

impl SyncOrchestrator {
    /// Creates a new orchestrator in the Idle state.
    pub fn new(
        store: Arc<LocalStore>,
        connectivity: Arc<ConnectivityMonitor>,
        transport: Arc<dyn RemoteTransport>,
        config: SyncConfig,
    ) -> Self {
        let (status_tx, _rx) = watch::channel(SyncStatus::default());
        Self {
            store,
            connectivity,
            transport,
            config,
            status_tx,
            draining: AtomicBool::new(false),
        }
    }

    /// Current status value.
    pub fn status(&self) -> SyncStatus {
        *self.status_tx.borrow()
    }

    /// Returns a live stream of status values. The receiver's initial
    /// value is the current status.
    pub fn observe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Runs one drain pass, unless offline or one is already running.
    ///
    /// Items enqueued after the snapshot is taken stay queued for the
    /// next drain.
    pub async fn drain(&self) -> SyncResult<DrainOutcome> {
        if !self.connectivity.is_online() {
            debug!("drain requested while offline; ignoring");
            return Ok(DrainOutcome::Offline);
        }
        // Single-active-drain gate. Concurrent triggers are no-ops.
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("drain requested while already draining; ignoring");
            return Ok(DrainOutcome::AlreadyRunning);
        }

        let result = self.drain_snapshot().await;

        // Terminal transition: back to Idle, status reset to all-zero.
        self.status_tx.send_replace(SyncStatus::default());
        self.draining.store(false, Ordering::Release);
        result
    }

    async fn drain_snapshot(&self) -> SyncResult<DrainOutcome> {
        let snapshot = self.store.list_pending()?;
        let total = snapshot.len();
        let mut completed = 0;
        let mut conflicts = 0;

        self.publish(total, completed, conflicts);
        if total == 0 {
            return Ok(DrainOutcome::Completed {
                completed,
                conflicts,
            });
        }
        info!("draining {total} pending mutations");

        for item in snapshot {
            match self.replay(&item).await {
                Ok(response) if response.is_success() => {
                    self.store.remove_pending(item.id)?;
                    completed += 1;
                    debug!("replayed {} {} (status {})", item.method, item.url, response.status);
                    self.publish(total, completed, conflicts);
                }
                Ok(response) if response.is_client_error() => {
                    let error = rejection_message(&response);
                    self.store.move_to_conflict(item.id, &error)?;
                    conflicts += 1;
                    warn!(
                        "mutation {} ({} {}) rejected by backend, moved to conflict log: {error}",
                        item.id, item.method, item.url
                    );
                    self.publish(total, completed, conflicts);
                }
                Ok(response) => {
                    let error = format!("server returned status {}", response.status);
                    warn!("drain stopped at mutation {}: {error}", item.id);
                    return Ok(DrainOutcome::Aborted {
                        completed,
                        conflicts,
                        error,
                    });
                }
                Err(e) => {
                    warn!("drain stopped at mutation {}: {e}", item.id);
                    return Ok(DrainOutcome::Aborted {
                        completed,
                        conflicts,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!("drain complete: {completed} replayed, {conflicts} conflicts");
        Ok(DrainOutcome::Completed {
            completed,
            conflicts,
        })
    }

    async fn replay(&self, item: &PendingMutation) -> SyncResult<RemoteResponse> {
        let body = if item.payload.is_null() {
            None
        } else {
            Some(item.payload.clone())
        };
        let request = RemoteRequest::new(item.method, &item.url, body);
        match tokio::time::timeout(self.config.request_timeout, self.transport.send(&request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout),
        }
    }

    fn publish(&self, total: usize, completed: usize, failed: usize) {
        self.status_tx.send_replace(SyncStatus {
            is_syncing: true,
            total_items: total,
            completed_items: completed,
            failed_items: failed,
        });
    }

    /// Fire-and-forget drain request. No-op while offline or draining.
    pub fn trigger_sync(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.drain().await {
                warn!("triggered drain failed: {e}");
            }
        });
    }

    /// Spawns the task that drains automatically on each offline→online
    /// transition. The task runs until the monitor is dropped or the
    /// handle is aborted.
    pub fn spawn_auto_drain(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let mut rx = this.connectivity.observe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if online {
                    info!("connectivity restored, starting drain");
                    if let Err(e) = this.drain().await {
                        warn!("auto drain failed: {e}");
                    }
                }
            }
        })
    }
}

fn rejection_message(response: &RemoteResponse) -> String {
    match &response.body {
        Some(body) => format!("rejected with status {}: {body}", response.status),
        None => format!("rejected with status {}", response.status),
    }
}
