//! Sensor telemetry projection and chart markers.

use crate::model::{Event, Identifier, Sensor, SensorMeasurement, Timestamp};
use crate::theme::ChartTheme;
use serde::{Deserialize, Serialize};

/// Event name of a port departure.
pub const SHIP_DEPARTED: &str = "(SHIP) Ship departed from Port";

/// Event name of a port arrival.
pub const SHIP_ARRIVED: &str = "(SHIP) Ship arrived to Port";

/// Value of the fixed warning threshold line.
pub const WARNING_THRESHOLD: f64 = 30.0;

/// Legend of the warning threshold line.
pub const WARNING_LEGEND: &str = "WARNING";

const WARNING_COLOUR: &str = "#d97025";
const EVENT_STROKE: &str = "#000";
const MARKER_STROKE_WIDTH: u32 = 2;

/// Chart-ready sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Measurement time
    pub x: Timestamp,
    /// Measured value
    pub y: f64,
}

impl From<&SensorMeasurement> for Point {
    fn from(m: &SensorMeasurement) -> Self {
        Self {
            x: m.measurement_timestamp,
            y: m.generic_measurement.value,
        }
    }
}

/// Project measurements to points, keeping their order.
///
/// Measurements are expected in chronological order and are not re-sorted.
#[must_use]
pub fn project(measurements: &[SensorMeasurement]) -> Vec<Point> {
    measurements.iter().map(Point::from).collect()
}

/// Chart axis a marker is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Time axis (vertical line)
    X,
    /// Value axis (horizontal line)
    Y,
}

/// Position of a marker on its axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerValue {
    /// Point in time on the x axis
    Time(Timestamp),
    /// Value on the y axis
    Number(f64),
}

/// Direction the legend text runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendOrientation {
    /// Along the x axis
    Horizontal,
    /// Along the y axis
    Vertical,
}

/// Line and label styling of a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    /// Line colour
    pub stroke: String,
    /// Line width in pixels
    pub stroke_width: u32,
    /// Legend text colour
    pub text_fill: String,
    /// Legend direction
    pub legend_orientation: LegendOrientation,
    /// Legend anchor, when not the renderer default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_position: Option<String>,
}

/// Annotation overlaid on a chart axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Axis the marker line crosses
    pub axis: Axis,
    /// Position on that axis
    pub value: MarkerValue,
    /// Label
    pub legend: String,
    /// Styling
    pub style: MarkerStyle,
}

impl Marker {
    /// Vertical marker at the time of a tracking event.
    #[must_use]
    pub fn for_event(event: &Event, theme: &ChartTheme) -> Self {
        Self {
            axis: Axis::X,
            value: MarkerValue::Time(event.date_time),
            legend: event.event_name.clone(),
            style: MarkerStyle {
                stroke: EVENT_STROKE.to_string(),
                stroke_width: MARKER_STROKE_WIDTH,
                text_fill: theme.legend_text.clone(),
                legend_orientation: LegendOrientation::Vertical,
                legend_position: None,
            },
        }
    }

    /// Horizontal warning threshold line.
    #[must_use]
    pub fn warning() -> Self {
        Self {
            axis: Axis::Y,
            value: MarkerValue::Number(WARNING_THRESHOLD),
            legend: WARNING_LEGEND.to_string(),
            style: MarkerStyle {
                stroke: WARNING_COLOUR.to_string(),
                stroke_width: MARKER_STROKE_WIDTH,
                text_fill: WARNING_COLOUR.to_string(),
                legend_orientation: LegendOrientation::Horizontal,
                legend_position: Some("top".to_string()),
            },
        }
    }
}

/// Allow-list of event names that get a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventFilter {
    names: Vec<String>,
}

impl EventFilter {
    /// Filter keeping exactly the given event names.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the event gets a marker.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.names.iter().any(|name| *name == event.event_name)
    }

    /// Names on the allow-list.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::new([SHIP_DEPARTED, SHIP_ARRIVED])
    }
}

/// Derive chart markers from the event log.
///
/// One x-axis marker per allowed event, in log order, followed by the
/// single warning marker.
#[must_use]
pub fn build_markers(events: &[Event], filter: &EventFilter, theme: &ChartTheme) -> Vec<Marker> {
    events
        .iter()
        .filter(|event| filter.matches(event))
        .map(|event| Marker::for_event(event, theme))
        .chain(std::iter::once(Marker::warning()))
        .collect()
}

/// Label for an x-axis tick.
#[must_use]
pub fn format_tick(time: &Timestamp) -> String {
    time.format("%d/%m/%y, %H:%M:%S").to_string()
}

/// Long form used for point tooltips, e.g. `June 1, 2021 9:05 AM`.
#[must_use]
pub fn format_tooltip(time: &Timestamp) -> String {
    time.format("%B %-d, %Y %-I:%M %p").to_string()
}

/// Aggregated telemetry for one sensor chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Series identifier (the sensor id)
    pub series_id: Identifier,
    /// Caption shown above the chart
    pub caption: String,
    /// Points in measurement order
    pub points: Vec<Point>,
    /// Overlay markers
    pub markers: Vec<Marker>,
}

impl Telemetry {
    /// Assemble telemetry for a sensor.
    #[must_use]
    pub fn new(sensor: &Sensor, points: Vec<Point>, markers: Vec<Marker>) -> Self {
        Self {
            series_id: sensor.id.clone(),
            caption: sensor.caption(),
            points,
            markers,
        }
    }
}
