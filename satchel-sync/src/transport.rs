//! Remote transport abstraction.
//!
//! Defines the trait the router and orchestrator speak to the backend
//! through, allowing the engine to work with any HTTP-shaped remote.
//!
//! An `Err` from [`RemoteTransport::send`] means the request may not have
//! reached the backend at all (connection failure, timeout). An `Ok`
//! response carries the real status code; classification by status class
//! is the caller's job via [`RemoteResponse`].

use crate::error::SyncResult;
use async_trait::async_trait;
use satchel_types::{RemoteRequest, RemoteResponse};

/// A transport that can deliver requests to the remote backend.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Sends a request and waits for the response.
    async fn send(&self, request: &RemoteRequest) -> SyncResult<RemoteResponse>;
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use crate::error::SyncError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A scripted transport: outcomes are queued up front and consumed
    /// one per call, while every request sent is recorded for assertion.
    ///
    /// When the script runs dry, calls succeed with an empty 200.
    #[derive(Default)]
    pub struct MockTransport {
        script: Mutex<VecDeque<SyncResult<RemoteResponse>>>,
        sent: Mutex<Vec<RemoteRequest>>,
    }

    impl MockTransport {
        /// Creates an empty mock (every call returns 200).
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a response for the next unscripted call.
        pub fn push_response(&self, response: RemoteResponse) {
            self.script.lock().unwrap().push_back(Ok(response));
        }

        /// Queues a status-only response.
        pub fn push_status(&self, status: u16) {
            self.push_response(RemoteResponse::new(status, None));
        }

        /// Queues a transport-level failure.
        pub fn push_error(&self, error: SyncError) {
            self.script.lock().unwrap().push_back(Err(error));
        }

        /// All requests sent so far, in order.
        pub fn sent(&self) -> Vec<RemoteRequest> {
            self.sent.lock().unwrap().clone()
        }

        /// Number of requests sent so far.
        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RemoteTransport for MockTransport {
        async fn send(&self, request: &RemoteRequest) -> SyncResult<RemoteResponse> {
            self.sent.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RemoteResponse::new(200, None)))
        }
    }
}
