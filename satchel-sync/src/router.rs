//! Request routing: the offline/online dispatch policy.
//!
//! Every caller request goes through [`RequestRouter::submit`], which
//! consults the connectivity monitor and picks one of four actions:
//!
//! | Connectivity | Kind     | Action                                      |
//! |--------------|----------|---------------------------------------------|
//! | online       | read     | forward; cache 2xx bodies by URL            |
//! | online       | mutation | forward unchanged, no local bookkeeping     |
//! | offline      | read     | serve cache, or fail `ServiceUnavailable`   |
//! | offline      | mutation | queue to the outbox, reply optimistically   |

use crate::connectivity::ConnectivityMonitor;
use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteTransport;
use satchel_storage::LocalStore;
use satchel_types::{ClientResponse, Method, RemoteRequest};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes requests to the remote transport or the local store.
pub struct RequestRouter {
    store: Arc<LocalStore>,
    connectivity: Arc<ConnectivityMonitor>,
    transport: Arc<dyn RemoteTransport>,
}

impl RequestRouter {
    /// Creates a new router.
    pub fn new(
        store: Arc<LocalStore>,
        connectivity: Arc<ConnectivityMonitor>,
        transport: Arc<dyn RemoteTransport>,
    ) -> Self {
        Self {
            store,
            connectivity,
            transport,
        }
    }

    /// Submits a request, honoring the dispatch table above.
    ///
    /// Offline mutations never error from the caller's point of view:
    /// they are queued durably and answered with a synthesized success.
    pub async fn submit(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> SyncResult<ClientResponse> {
        if self.connectivity.is_online() {
            self.submit_online(method, url, body).await
        } else if method.is_mutation() {
            self.queue_mutation(method, url, body)
        } else {
            self.serve_cached(url)
        }
    }

    async fn submit_online(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> SyncResult<ClientResponse> {
        let request = RemoteRequest::new(method, url, body);
        let response = self.transport.send(&request).await?;

        // Only successful reads populate the cache; mutation responses
        // never do.
        if method == Method::Get && response.is_success() {
            if let Some(data) = &response.body {
                if let Err(e) = self.store.put_cache(url, data) {
                    warn!("failed to cache response for {url} (continuing): {e}");
                }
            }
        }

        Ok(ClientResponse::remote(response))
    }

    fn serve_cached(&self, url: &str) -> SyncResult<ClientResponse> {
        match self.store.get_cache(url)? {
            Some(entry) => {
                debug!("offline read of {url} served from cache");
                Ok(ClientResponse::cached(entry.data))
            }
            None => Err(SyncError::ServiceUnavailable {
                url: url.to_string(),
            }),
        }
    }

    fn queue_mutation(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> SyncResult<ClientResponse> {
        let payload = body.unwrap_or(Value::Null);
        let mutation = self.store.enqueue_mutation(url, method, payload)?;
        debug!(
            "offline {method} {url} queued as pending mutation {}",
            mutation.id
        );

        let message = match method {
            Method::Post => "create queued for sync",
            Method::Put => "update queued for sync",
            Method::Delete => "delete queued for sync",
            Method::Get => unreachable!("reads are never queued"),
        };
        Ok(ClientResponse::queued(json!({
            "success": true,
            "queued": true,
            "message": message,
        })))
    }
}
