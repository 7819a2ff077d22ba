//! In-memory resource fetcher.
//!
//! Serves bodies from a map of identifier to JSON. Used for offline fixture
//! files and as the fetcher in tests, where per-identifier delays and
//! failures make completion order and error paths reproducible.

use crate::fetcher::{FetchError, ResourceFetcher};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use waybill_view_core::Identifier;

/// Fetcher backed by an in-memory resource map.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    resources: HashMap<Identifier, Value>,
    delays: HashMap<Identifier, Duration>,
    failures: HashSet<Identifier>,
    log: Mutex<Vec<Identifier>>,
}

impl StaticFetcher {
    /// Create an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fetcher from a JSON object mapping identifiers to bodies.
    ///
    /// # Errors
    ///
    /// Returns error if the value is not a JSON object.
    pub fn from_json(value: Value) -> Result<Self, FetchError> {
        let Value::Object(map) = value else {
            return Err(FetchError::Parse(
                "fixture must be a JSON object of identifier -> body".to_string(),
            ));
        };

        let mut fetcher = Self::new();
        for (id, body) in map {
            fetcher.insert(id, body);
        }
        Ok(fetcher)
    }

    /// Load a fixture file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a JSON object.
    pub async fn load(path: &Path) -> Result<Self, FetchError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FetchError::Init(format!("failed to read {}: {e}", path.display())))?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

        let fetcher = Self::from_json(value)?;
        tracing::debug!(
            path = %path.display(),
            resources = fetcher.resources.len(),
            "Loaded fixture resources"
        );
        Ok(fetcher)
    }

    /// Add or replace a resource body.
    pub fn insert(&mut self, id: impl Into<Identifier>, body: Value) {
        self.resources.insert(id.into(), body);
    }

    /// Builder form of [`StaticFetcher::insert`].
    #[must_use]
    pub fn with(mut self, id: impl Into<Identifier>, body: Value) -> Self {
        self.insert(id, body);
        self
    }

    /// Delay every fetch of `id` by `delay`.
    #[must_use]
    pub fn with_delay(mut self, id: impl Into<Identifier>, delay: Duration) -> Self {
        self.delays.insert(id.into(), delay);
        self
    }

    /// Make every fetch of `id` fail.
    #[must_use]
    pub fn with_failure(mut self, id: impl Into<Identifier>) -> Self {
        self.failures.insert(id.into());
        self
    }

    /// Identifiers requested so far, in request order.
    #[must_use]
    pub fn requests(&self) -> Vec<Identifier> {
        self.log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Number of fetches issued so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.log.lock().map(|log| log.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ResourceFetcher for StaticFetcher {
    async fn fetch(&self, id: &Identifier) -> Result<Value, FetchError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(id.clone());
        }

        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }

        if self.failures.contains(id) {
            return Err(FetchError::Request(format!("injected failure for {id}")));
        }

        self.resources
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}
