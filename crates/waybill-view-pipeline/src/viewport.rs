//! Container width tracking.
//!
//! The hosting view pushes its width on mount and on every resize. Layout
//! consumers pull a stream of [`LayoutMetrics`]; since only the latest width
//! matters, widths that change faster than the consumer reads are skipped.

use futures::stream::{self, Stream};
use tokio::sync::watch;
use waybill_view_core::{compute_metrics, LayoutMetrics};

/// Latest known width of the chart container.
#[derive(Debug)]
pub struct Viewport {
    width: watch::Sender<u32>,
}

impl Viewport {
    /// Track a container that currently measures `width` pixels.
    #[must_use]
    pub fn new(width: u32) -> Self {
        let (tx, _rx) = watch::channel(width);
        Self { width: tx }
    }

    /// Record a resize.
    pub fn resize(&self, width: u32) {
        let previous = self.width.send_replace(width);
        if previous != width {
            tracing::trace!(previous, width, "Viewport resized");
        }
    }

    /// Current container width.
    #[must_use]
    pub fn width(&self) -> u32 {
        *self.width.borrow()
    }

    /// Metrics for the current width.
    #[must_use]
    pub fn metrics(&self) -> LayoutMetrics {
        compute_metrics(self.width())
    }

    /// Stream of metrics: the current value first, then one per resize.
    ///
    /// The stream ends when the viewport is dropped.
    pub fn layout_updates(&self) -> impl Stream<Item = LayoutMetrics> + Send + 'static {
        layout_updates(self.width.subscribe())
    }
}

/// Turn a width channel into a stream of layout metrics.
pub fn layout_updates(
    widths: watch::Receiver<u32>,
) -> impl Stream<Item = LayoutMetrics> + Send + 'static {
    stream::unfold((widths, true), |(mut widths, first)| async move {
        if !first && widths.changed().await.is_err() {
            return None;
        }
        let width = *widths.borrow_and_update();
        Some((compute_metrics(width), (widths, false)))
    })
}
