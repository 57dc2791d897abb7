//! Connectivity tracking.
//!
//! The monitor is the single source of truth for "is the remote
//! reachable". The platform reachability signal is fed in through
//! [`ConnectivityMonitor::set_online`]; everything else observes.
//!
//! Observation is a watch channel: receivers start with the current value
//! and see exactly one emission per transition. Repeated identical states
//! emit nothing, and a slow observer never blocks the publisher.

use tokio::sync::watch;
use tracing::debug;

/// Tracks online/offline state and publishes transitions.
///
/// No persisted state and no failure modes; a thin wrapper whose
/// transition events schedule the router and orchestrator.
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Current reachability, sampled at call time.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Feeds in the platform reachability signal. Returns `true` if this
    /// was a transition (and was therefore published).
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|state| {
            if *state != online {
                *state = online;
                true
            } else {
                false
            }
        });
        if changed {
            debug!("connectivity transition: online={online}");
        }
        changed
    }

    /// Returns a live stream of connectivity values. The receiver's
    /// initial value is the current state.
    pub fn observe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
