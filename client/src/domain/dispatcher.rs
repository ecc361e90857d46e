//! Request dispatcher: the only component that issues network calls.
//!
//! Every dispatch runs the same pipeline. It resolves the descriptor,
//! performs the auth pre-flight, substitutes the path, validates the input
//! and shapes the request. It then awaits the transport once and finishes
//! with decoding and post-processing. Everything except the transport call
//! is synchronous, so a dispatch suspends at exactly one point.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::normalizer::{self, Failure};
use super::ports::{HttpResponse, Transport};
use super::post_process::{self, hook_for};
use super::request::prepare;
use super::{
    ApiError, EndpointRegistry, ErrorKind, FromPayload, IntoParams, Operation, OperationKey,
    Params, Payload, ResponseKind, Session,
};

const NO_CONTENT: u16 = 204;

/// Resolves operation keys and issues requests through a [`Transport`].
///
/// Cloning is cheap; clones share the registry, transport and session.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<EndpointRegistry>,
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
}

impl Dispatcher {
    /// Build a dispatcher over explicit collaborators.
    pub fn new(
        registry: Arc<EndpointRegistry>,
        transport: Arc<dyn Transport>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            registry,
            transport,
            session,
        }
    }

    /// Session consulted for authentication.
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Registry used for lookups.
    #[must_use]
    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Dispatch `key` with a loosely typed parameter bag.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for every failure; the failure has already
    /// been logged.
    pub async fn dispatch(&self, key: OperationKey, params: Params) -> Result<Payload, ApiError> {
        self.run(key, params)
            .await
            .map_err(|failure| report(key.as_str(), &failure))
    }

    /// Dispatch by string key, e.g. from a command line or script.
    ///
    /// An unrecognised name fails with [`ErrorKind::UnknownOperation`]
    /// without touching the transport.
    ///
    /// # Errors
    ///
    /// As for [`Self::dispatch`].
    pub async fn dispatch_named(&self, name: &str, params: Params) -> Result<Payload, ApiError> {
        match name.parse::<OperationKey>() {
            Ok(key) => self.dispatch(key, params).await,
            Err(_) => Err(report(name, &Failure::UnknownOperation)),
        }
    }

    /// Dispatch a typed operation.
    ///
    /// Input that cannot be encoded fails as Validation; a response that
    /// does not decode into `O::Output` fails as Unknown.
    ///
    /// # Errors
    ///
    /// As for [`Self::dispatch`].
    pub async fn call<O: Operation>(&self, input: O::Input) -> Result<O::Output, ApiError> {
        let outcome = async {
            let params = input
                .into_params()
                .map_err(|err| Failure::validation(err.to_string()))?;
            let payload = self.run(O::KEY, params).await?;
            O::Output::from_payload(payload).map_err(|err| Failure::decode(err.to_string()))
        }
        .await;
        outcome.map_err(|failure| report(O::KEY.as_str(), &failure))
    }

    /// Forget the current credential and derived profile state.
    pub fn logout(&self) {
        self.session.clear();
        info!("session cleared");
    }

    async fn run(&self, key: OperationKey, params: Params) -> Result<Payload, Failure> {
        let descriptor = self.registry.lookup(key)?;
        let request = prepare(descriptor, params, &self.session)?;
        let response_kind = request.response_kind;
        let method = request.method;

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(Failure::Transport)?;

        let status = response.status;
        let payload = self.finish(key, response_kind, response)?;
        debug!(endpoint = key.as_str(), %method, status, "dispatch succeeded");
        Ok(payload)
    }

    fn finish(
        &self,
        key: OperationKey,
        response_kind: ResponseKind,
        response: HttpResponse,
    ) -> Result<Payload, Failure> {
        if !response.is_success() {
            return Err(Failure::Status {
                status: response.status,
                body: response.body,
            });
        }
        if response.status == NO_CONTENT || response.body.is_empty() {
            return Ok(Payload::NoContent);
        }

        let payload = match response_kind {
            ResponseKind::Binary => Payload::Binary(response.body),
            ResponseKind::Structured => Payload::Json(
                serde_json::from_slice(&response.body)
                    .map_err(|err| Failure::decode(err.to_string()))?,
            ),
        };
        post_process::apply(hook_for(key), payload, &self.session)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("operations", &self.registry.len())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Normalise and log a failure. The only place dispatch failures are logged.
fn report(endpoint: &str, failure: &Failure) -> ApiError {
    let error = normalizer::normalize(endpoint, failure);
    let kind = error.kind();
    let status = error.http_status();
    match kind {
        ErrorKind::Network | ErrorKind::Unknown => {
            error!(endpoint, ?kind, ?status, detail = %failure, "dispatch failed");
        }
        _ => {
            warn!(endpoint, ?kind, ?status, detail = %failure, "dispatch failed");
        }
    }
    error
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
