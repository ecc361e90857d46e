//! Driven ports: the only edges the dispatch core talks through.
//!
//! Each trait exposes strongly typed errors so adapters map their failures
//! into predictable variants instead of returning `anyhow::Result`.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_store;
mod transport;

#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{CredentialStore, InMemoryCredentialStore};
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{
    HttpRequest, HttpResponse, MultipartField, RequestBody, Transport, TransportError,
};
