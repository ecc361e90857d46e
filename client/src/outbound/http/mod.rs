//! HTTP outbound adapter.
//!
//! Thin reqwest implementation of the `Transport` port.

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;
