//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed implementation of the
//!   [`Transport`](crate::domain::ports::Transport) port.
//!
//! Adapters translate between port types and wire representations. Status
//! interpretation, authentication and retries-or-not are decided upstream.

pub mod http;
