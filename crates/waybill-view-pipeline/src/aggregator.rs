//! Telemetry aggregation.
//!
//! Telemetry is best-effort: a sensor whose measurements cannot be fetched
//! or decoded gets an empty series instead of an error.

use waybill_view_client::ResourceFetcher;
use waybill_view_core::{
    build_markers, project, ChartTheme, Event, EventFilter, Marker, Point, Sensor,
    SensorMeasurement, Telemetry,
};

/// Builds chart telemetry for a sensor.
pub struct TelemetryAggregator<F> {
    fetcher: F,
    filter: EventFilter,
}

impl<F: ResourceFetcher> TelemetryAggregator<F> {
    /// Aggregator marking the default ship departure/arrival events.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            filter: EventFilter::default(),
        }
    }

    /// Replace the event allow-list.
    #[must_use]
    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Fetch the sensor's series and derive markers from `events`.
    pub async fn aggregate(
        &self,
        sensor: &Sensor,
        events: &[Event],
        theme: &ChartTheme,
    ) -> Telemetry {
        let points = self.points(sensor).await;
        let markers = self.markers(events, theme);

        tracing::debug!(
            sensor_id = %sensor.id,
            points = points.len(),
            markers = markers.len(),
            "Aggregated telemetry"
        );

        Telemetry::new(sensor, points, markers)
    }

    /// Fetch and project the sensor's measurements.
    ///
    /// Returns an empty series on any failure.
    pub async fn points(&self, sensor: &Sensor) -> Vec<Point> {
        let id = sensor.measurements_id();

        let body = match self.fetcher.fetch(&id).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, measurements_id = %id, "Failed to fetch measurements");
                return Vec::new();
            }
        };

        if body.is_null() {
            return Vec::new();
        }

        match serde_json::from_value::<Vec<SensorMeasurement>>(body) {
            Ok(measurements) => project(&measurements),
            Err(err) => {
                tracing::warn!(error = %err, measurements_id = %id, "Failed to decode measurements");
                Vec::new()
            }
        }
    }

    /// Markers for `events` in the given theme.
    ///
    /// Call again when the event log or theme changes; nothing is cached.
    pub fn markers(&self, events: &[Event], theme: &ChartTheme) -> Vec<Marker> {
        build_markers(events, &self.filter, theme)
    }
}
