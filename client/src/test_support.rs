//! Shared test doubles for cache and facade tests.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! integration tests under `tests/`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use serde_json::Value;

use crate::domain::HttpMethod;
use crate::domain::ports::{HttpRequest, HttpResponse, Transport, TransportError};

#[derive(Debug, Clone)]
struct Route {
    method: HttpMethod,
    path: String,
    outcome: Result<HttpResponse, TransportError>,
}

/// Transport answering from canned routes and recording every request.
///
/// Clones share the request log, so a test can keep one handle while the
/// client owns another. Unmatched routes answer `404` with an empty body.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    routes: Vec<Route>,
    latency: Duration,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl RecordingTransport {
    /// Transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with a JSON document.
    #[must_use]
    pub fn respond_json(self, method: HttpMethod, path: &str, status: u16, body: Value) -> Self {
        self.respond_bytes(method, path, status, body.to_string().into_bytes())
    }

    /// Answer `method path` with raw bytes.
    #[must_use]
    pub fn respond_bytes(
        mut self,
        method: HttpMethod,
        path: &str,
        status: u16,
        body: impl Into<Bytes>,
    ) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_owned(),
            outcome: Ok(HttpResponse::new(status, body)),
        });
        self
    }

    /// Fail `method path` without a response.
    #[must_use]
    pub fn fail(mut self, method: HttpMethod, path: &str, error: TransportError) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_owned(),
            outcome: Err(error),
        });
        self
    }

    /// Delay every answer, so concurrent callers overlap.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log().clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.log().len()
    }

    /// Number of requests received for `method path`, ignoring the query.
    #[must_use]
    pub fn calls_to(&self, method: HttpMethod, path: &str) -> usize {
        self.log()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    fn log(&self) -> MutexGuard<'_, Vec<HttpRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn answer(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.routes
            .iter()
            .find(|route| route.method == request.method && route.path == request.path)
            .map_or_else(
                || Ok(HttpResponse::new(404, Bytes::new())),
                |route| route.outcome.clone(),
            )
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log().push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.answer(&request)
    }
}

/// Clock whose time only moves when a test says so.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Clock frozen at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move time forward by `delta`.
    ///
    /// # Panics
    ///
    /// Panics when `delta` does not fit in a [`TimeDelta`].
    pub fn advance(&self, delta: Duration) {
        let step = match TimeDelta::from_std(delta) {
            Ok(step) => step,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += step;
    }

    /// Move time forward by whole seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}
