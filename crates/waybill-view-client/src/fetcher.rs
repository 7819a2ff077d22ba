//! The resource fetcher seam.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use waybill_view_core::Identifier;

/// Fetch a resource body by identifier.
///
/// A single attempt: implementations do not retry. Network, status, and
/// parse failures all surface as [`FetchError`].
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch and parse the resource named by `id`.
    async fn fetch(&self, id: &Identifier) -> Result<Value, FetchError>;
}

#[async_trait]
impl<F: ResourceFetcher + ?Sized> ResourceFetcher for Arc<F> {
    async fn fetch(&self, id: &Identifier) -> Result<Value, FetchError> {
        (**self).fetch(id).await
    }
}

/// Errors that can occur while fetching a resource.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Fetcher initialization failed
    #[error("client init error: {0}")]
    Init(String),
    /// Identifier cannot be turned into a request
    #[error("invalid identifier {id}: {message}")]
    InvalidIdentifier {
        /// Offending identifier
        id: String,
        /// Why it was rejected
        message: String,
    },
    /// HTTP request failed
    #[error("request error: {0}")]
    Request(String),
    /// Server returned an error status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error body from the server
        message: String,
    },
    /// Response body is not valid JSON
    #[error("parse error: {0}")]
    Parse(String),
    /// No such resource
    #[error("resource not found: {0}")]
    NotFound(String),
}
