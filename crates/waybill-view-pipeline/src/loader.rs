//! Shipment loading tied to a view's lifetime.
//!
//! A loader owns at most one resolution run. Loading another root, or
//! dropping the loader, cancels the previous run so a stale shipment is
//! never delivered to the view.

use crate::resolver::{ResolveError, Resolver};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use waybill_view_client::ResourceFetcher;
use waybill_view_core::{Identifier, Shipment};

struct ActiveRun {
    root: Identifier,
    cancel: CancellationToken,
}

/// Runs shipment resolutions on behalf of a single view.
pub struct ShipmentLoader<F> {
    resolver: Arc<Resolver<F>>,
    active: Option<ActiveRun>,
}

impl<F: ResourceFetcher + 'static> ShipmentLoader<F> {
    /// Create a loader around a resolver.
    pub fn new(resolver: Resolver<F>) -> Self {
        Self {
            resolver: Arc::new(resolver),
            active: None,
        }
    }

    /// Start resolving `root`, cancelling any run still in flight.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn load(&mut self, root: Identifier) -> JoinHandle<Result<Shipment, ResolveError>> {
        self.cancel();

        let cancel = CancellationToken::new();
        self.active = Some(ActiveRun {
            root: root.clone(),
            cancel: cancel.clone(),
        });

        tracing::debug!(%root, "Loading shipment");

        let resolver = Arc::clone(&self.resolver);
        tokio::spawn(async move {
            let result = resolver.resolve_with_cancel(&root, &cancel).await;
            if let Err(err) = &result {
                if !matches!(err, ResolveError::Cancelled) {
                    tracing::error!(error = %err, %root, "Failed to resolve shipment");
                }
            }
            result
        })
    }

    /// Root of the run most recently started.
    pub fn current(&self) -> Option<&Identifier> {
        self.active.as_ref().map(|run| &run.root)
    }

    /// Cancel the active run, if any.
    pub fn cancel(&mut self) {
        if let Some(run) = self.active.take() {
            tracing::debug!(root = %run.root, "Cancelling shipment load");
            run.cancel.cancel();
        }
    }
}

impl<F> Drop for ShipmentLoader<F> {
    fn drop(&mut self) {
        if let Some(run) = self.active.take() {
            run.cancel.cancel();
        }
    }
}
