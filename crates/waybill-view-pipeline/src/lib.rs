//! # waybill-view Pipeline
//!
//! The two data-shaping pipelines of the viewer:
//!
//! 1. **Reference resolution**: fetch a root shipment and replace its link
//!    stubs according to a [`ResolutionPlan`]. Strict: any failure aborts
//!    the run and no partial shipment is produced.
//! 2. **Telemetry aggregation**: fetch a sensor's measurements and derive
//!    chart markers from the event log. Lenient: a failed fetch yields an
//!    empty series.
//!
//! [`Viewport`] turns container resizes into fresh layout metrics, and
//! [`ShipmentLoader`] ties resolution runs to a view so stale runs are
//! cancelled.
//!
//! ```
//! use serde_json::json;
//! use waybill_view_client::StaticFetcher;
//! use waybill_view_core::Identifier;
//! use waybill_view_pipeline::Resolver;
//!
//! # tokio_test::block_on(async {
//! let fetcher = StaticFetcher::new()
//!     .with("urn:s1", json!({
//!         "deliveryLocation": {"id": "urn:l1"},
//!         "waybillNumber": {"id": "urn:w1"}
//!     }))
//!     .with("urn:l1", json!({"id": "urn:l1", "city": "Hamburg"}))
//!     .with("urn:w1", json!({"id": "urn:w1", "containedWaybills": []}));
//!
//! let shipment = Resolver::new(fetcher)
//!     .resolve(&Identifier::new("urn:s1"))
//!     .await
//!     .unwrap();
//! assert!(shipment.is_fully_resolved());
//! # });
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod loader;
pub mod plan;
pub mod resolver;
pub mod viewport;

pub use aggregator::TelemetryAggregator;
pub use loader::ShipmentLoader;
pub use plan::{FieldPath, PathError, PlanBuilder, PlanError, ResolutionPlan, ResolutionStep};
pub use resolver::{ResolveError, Resolver};
pub use viewport::Viewport;
