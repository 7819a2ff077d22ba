//! Command implementations.
//!
//! Each command returns a JSON document; `main` only prints it.

use crate::config::ViewerConfig;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use waybill_view_client::{HttpFetcher, ResourceFetcher, StaticFetcher};
use waybill_view_core::{
    compute_metrics, format_tick, format_tooltip, ChartMargins, ChartTheme, Event, Identifier,
    LayoutMetrics, Sensor, Telemetry,
};
use waybill_view_pipeline::{ResolutionPlan, Resolver, TelemetryAggregator};

/// Select the fetcher the configuration asks for.
pub async fn build_fetcher(config: &ViewerConfig) -> Result<Arc<dyn ResourceFetcher>> {
    if let Some(path) = &config.fixtures {
        tracing::info!(path = %path.display(), "Using fixture fetcher");
        let fetcher = StaticFetcher::load(path)
            .await
            .with_context(|| format!("Failed to load fixtures from {}", path.display()))?;
        return Ok(Arc::new(fetcher));
    }

    tracing::info!(base_url = %config.http.base_url, "Using HTTP fetcher");
    let fetcher = HttpFetcher::new(config.http.clone()).context("Failed to create HTTP fetcher")?;
    Ok(Arc::new(fetcher))
}

/// Resolve a shipment and render it as JSON.
pub async fn shipment(
    fetcher: Arc<dyn ResourceFetcher>,
    config: &ViewerConfig,
    id: &str,
) -> Result<Value> {
    let plan = if config.resolve_parties {
        ResolutionPlan::shipment_with_parties()
    } else {
        ResolutionPlan::shipment()
    };
    let resolver = Resolver::with_plan(fetcher, plan);

    let shipment = resolver
        .resolve(&Identifier::new(id))
        .await
        .with_context(|| format!("Failed to resolve shipment {id}"))?;

    serde_json::to_value(&shipment).context("Failed to encode shipment")
}

/// One rendered point label.
#[derive(Debug, Serialize)]
struct PointLabel {
    tick: String,
    tooltip: String,
}

#[derive(Debug, Serialize)]
struct TelemetryReport {
    #[serde(flatten)]
    telemetry: Telemetry,
    theme: ChartTheme,
    labels: Vec<PointLabel>,
}

/// Aggregate telemetry for `sensor_json` against the event log in `events_path`.
pub async fn telemetry(
    fetcher: Arc<dyn ResourceFetcher>,
    config: &ViewerConfig,
    sensor_json: &str,
    events_path: &Path,
) -> Result<Value> {
    let sensor: Sensor = serde_json::from_str(sensor_json).context("Invalid sensor JSON")?;
    let events = load_events(events_path).await?;
    let theme = ChartTheme::for_mode(config.theme);

    let aggregator = TelemetryAggregator::new(fetcher).with_filter(config.marker_events.clone());
    let telemetry = aggregator.aggregate(&sensor, &events, &theme).await;

    let labels = telemetry
        .points
        .iter()
        .map(|point| PointLabel {
            tick: format_tick(&point.x),
            tooltip: format_tooltip(&point.x),
        })
        .collect();

    serde_json::to_value(TelemetryReport {
        telemetry,
        theme,
        labels,
    })
    .context("Failed to encode telemetry")
}

/// Read an event log (JSON array) from disk.
pub async fn load_events(path: &Path) -> Result<Vec<Event>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read events from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid event log in {}", path.display()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutReport {
    #[serde(flatten)]
    metrics: LayoutMetrics,
    renderable: bool,
    margins: ChartMargins,
    plot_width: u32,
    plot_height: u32,
}

/// Layout metrics for a container `width` pixels wide.
pub fn layout(width: &str) -> Result<Value> {
    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("Invalid width: {width}"))?;
    let metrics = compute_metrics(width);
    let margins = ChartMargins::default();
    let (plot_width, plot_height) = metrics.plot_area(margins);

    serde_json::to_value(LayoutReport {
        metrics,
        renderable: metrics.is_renderable(),
        margins,
        plot_width,
        plot_height,
    })
    .context("Failed to encode layout")
}
