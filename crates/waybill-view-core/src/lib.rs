//! # waybill-view Core
//!
//! Data model and pure derivations for the waybill viewer.
//!
//! This crate provides:
//! - Shipment view model with `{ "id": ... }` link stubs that resolve in place
//! - Sensor telemetry projection and chart marker derivation
//! - Responsive chart layout metrics
//! - Light and dark chart themes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod layout;
pub mod model;
pub mod telemetry;
pub mod theme;

pub use layout::{compute_metrics, ChartMargins, LayoutMetrics};
pub use model::{
    Event, GenericMeasurement, Identifier, Link, ModelError, Party, Resource, ResourceRef, Sensor,
    SensorMeasurement, Shipment, Timestamp, Waybill,
};
pub use telemetry::{
    build_markers, format_tick, format_tooltip, project, Axis, EventFilter, Marker, MarkerValue,
    Point, Telemetry,
};
pub use theme::{ChartTheme, ThemeError, ThemeMode};
