//! Request and response types for the remote transport contract.
//!
//! The backend is reachable only through a conventional HTTP-shaped
//! contract: method, URL, optional JSON body, status code. Responses are
//! tagged by status class here, once, so no other layer inspects shapes
//! at runtime.

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// HTTP method understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Whether this method changes state on the backend.
    ///
    /// Mutations are queueable while offline; reads are served from cache.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

/// A request destined for the remote backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URL (path or absolute; the transport resolves it).
    pub url: String,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl RemoteRequest {
    /// Creates a new remote request.
    pub fn new(method: Method, url: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            url: url.into(),
            body,
        }
    }
}

/// A response received from the remote backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResponse {
    /// HTTP status code.
    pub status: u16,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl RemoteResponse {
    /// Creates a new remote response.
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// 2xx — the request was applied.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 4xx — the backend rejected the request as invalid; retrying the
    /// same payload cannot succeed.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// Where a response handed to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// The real backend response, passed through unchanged.
    Remote,
    /// Served from the local response cache while offline.
    Cache,
    /// Synthesized optimistic reply for a mutation queued while offline.
    Queued,
}

/// The response the router hands back to callers.
///
/// Identical in shape to [`RemoteResponse`] plus a source tag, so UI code
/// can distinguish live data from cached or optimistic replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientResponse {
    /// HTTP status code (synthesized responses use 200).
    pub status: u16,
    /// JSON body.
    pub body: Value,
    /// Provenance of this response.
    pub source: ResponseSource,
}

impl ClientResponse {
    /// Wraps a real backend response.
    pub fn remote(response: RemoteResponse) -> Self {
        Self {
            status: response.status,
            body: response.body.unwrap_or(Value::Null),
            source: ResponseSource::Remote,
        }
    }

    /// Wraps a cache hit.
    pub fn cached(data: Value) -> Self {
        Self {
            status: 200,
            body: data,
            source: ResponseSource::Cache,
        }
    }

    /// Wraps an optimistic reply for a queued mutation.
    pub fn queued(body: Value) -> Self {
        Self {
            status: 200,
            body,
            source: ResponseSource::Queued,
        }
    }
}
