//! Request-dispatch core.
//!
//! Purpose: resolve an operation key to its endpoint descriptor, shape and
//! issue exactly one request through the [`ports::Transport`] port, and turn
//! every failure into a closed [`ApiError`] taxonomy.
//!
//! Public surface:
//! - [`Dispatcher`] - the only component that issues network calls.
//! - [`EndpointRegistry`] / [`EndpointDescriptor`] - operation shapes.
//! - [`Session`] - current credential and identity.
//! - [`ApiError`] / [`ErrorKind`] - normalised failures.
//! - [`Operation`] - compile-time mapping from key to request/response types.

mod dispatcher;
mod endpoint;
mod error;
pub mod models;
mod normalizer;
mod operation_key;
pub mod operations;
mod params;
mod payload;
pub mod ports;
mod post_process;
mod registry;
mod request;
mod session;

pub use self::dispatcher::Dispatcher;
pub use self::endpoint::{
    EndpointDescriptor, FileUpload, HttpMethod, ResponseKind, ValidationError, Validator,
};
pub use self::error::{ApiError, ErrorKind};
pub use self::operation_key::{OperationKey, UnknownOperationKey};
pub use self::operations::Operation;
pub use self::params::{FilePart, IntoParams, Params, ParamsError, Upload};
pub(crate) use self::params::serialize_into_params;
pub use self::payload::{FromPayload, Payload, PayloadError};
pub(crate) use self::payload::{decode_json, json_from_payload};
pub use self::registry::{EndpointRegistry, EndpointTable, RegistryError};
pub use self::session::{AuthHeader, Credentials, Session};
