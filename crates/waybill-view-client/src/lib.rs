//! # waybill-view Client
//!
//! The "fetch resource by identifier" collaborator.
//!
//! - [`ResourceFetcher`]: the async seam the pipelines depend on
//! - [`HttpFetcher`]: reqwest-backed implementation for live servers
//! - [`StaticFetcher`]: in-memory implementation for fixtures and tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fetcher;
pub mod fixture;
pub mod http;

pub use fetcher::{FetchError, ResourceFetcher};
pub use fixture::StaticFetcher;
pub use http::{HttpFetcher, HttpFetcherConfig};
