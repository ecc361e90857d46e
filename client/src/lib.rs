//! Marketplace API client library.
//!
//! The crate is split along the same hexagonal lines as a server would be:
//!
//! - [`domain`] holds the request-dispatch engine: operation keys, endpoint
//!   descriptors, the registry, the session, the error normaliser, the
//!   post-processor and the [`Dispatcher`] itself.
//! - [`endpoints`] holds the per-domain endpoint tables and validators.
//! - [`cache`] holds the reactive, deduplicating per-domain stores built on
//!   top of the dispatcher.
//! - [`outbound`] holds the reqwest-backed transport adapter.
//! - [`MarketplaceClient`] wires everything together.

pub mod cache;
mod client;
pub mod config;
pub mod domain;
pub mod endpoints;
pub mod outbound;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::{ClientBuildError, ClientBuilder, MarketplaceClient};
pub use domain::{ApiError, Dispatcher, ErrorKind, OperationKey, Params, Payload};
