//! Responsive chart layout.

use serde::{Deserialize, Serialize};

/// Fixed chart height in pixels.
pub const CHART_HEIGHT: u32 = 360;

/// Horizontal pixels per x-axis tick.
pub const PIXELS_PER_TICK: u32 = 100;

/// Chart dimensions derived from the container width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    /// Chart width in pixels
    pub width: u32,
    /// Chart height in pixels
    pub height: u32,
    /// Number of x-axis ticks to request
    pub tick_count: u32,
}

/// Compute chart metrics for a container of the given width.
///
/// # Examples
///
/// ```
/// use waybill_view_core::compute_metrics;
///
/// let metrics = compute_metrics(250);
/// assert_eq!(metrics.height, 360);
/// assert_eq!(metrics.tick_count, 3);
/// ```
#[must_use]
pub fn compute_metrics(container_width: u32) -> LayoutMetrics {
    LayoutMetrics {
        width: container_width,
        height: CHART_HEIGHT,
        tick_count: container_width.div_ceil(PIXELS_PER_TICK),
    }
}

impl LayoutMetrics {
    /// A chart is only drawn once the container has a size.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width and height left for the plot once margins are taken off.
    #[must_use]
    pub fn plot_area(&self, margins: ChartMargins) -> (u32, u32) {
        (
            self.width
                .saturating_sub(margins.left)
                .saturating_sub(margins.right),
            self.height
                .saturating_sub(margins.top)
                .saturating_sub(margins.bottom),
        )
    }
}

/// Space reserved around the plot for axes and rotated tick labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartMargins {
    /// Top margin
    pub top: u32,
    /// Right margin (marker legends)
    pub right: u32,
    /// Bottom margin (rotated time labels)
    pub bottom: u32,
    /// Left margin (value axis)
    pub left: u32,
}

impl Default for ChartMargins {
    fn default() -> Self {
        Self {
            top: 10,
            right: 70,
            bottom: 100,
            left: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_count_rounds_up() {
        assert_eq!(compute_metrics(250).tick_count, 3);
        assert_eq!(compute_metrics(1000).tick_count, 10);
        assert_eq!(compute_metrics(1001).tick_count, 11);
        assert_eq!(compute_metrics(1).tick_count, 1);
    }

    #[test]
    fn height_is_fixed() {
        for width in [0, 250, 1000, 4096] {
            assert_eq!(compute_metrics(width).height, 360);
        }
    }

    #[test]
    fn zero_width_is_not_renderable() {
        let metrics = compute_metrics(0);
        assert_eq!(metrics.tick_count, 0);
        assert!(!metrics.is_renderable());
        assert!(compute_metrics(320).is_renderable());
    }

    #[test]
    fn plot_area_subtracts_margins() {
        let metrics = compute_metrics(1000);
        assert_eq!(metrics.plot_area(ChartMargins::default()), (900, 250));
        assert_eq!(compute_metrics(50).plot_area(ChartMargins::default()), (0, 250));
    }
}
