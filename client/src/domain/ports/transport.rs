//! Driven port for the HTTP primitive.
//!
//! The dispatcher owns request shaping; adapters only move bytes. A
//! response with any status code is a successful `execute`; only the absence
//! of a response is a [`TransportError`].

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::define_port_error;
use crate::domain::{AuthHeader, FilePart, HttpMethod, ResponseKind};

/// Request body shaped by the dispatcher.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body (read and delete operations).
    #[default]
    Empty,
    /// JSON document.
    Json(Value),
    /// Multipart form in field order.
    Multipart(Vec<MultipartField>),
}

/// One multipart form field.
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartField {
    /// File part.
    File {
        /// Form field name.
        name: String,
        /// File contents and metadata.
        file: FilePart,
    },
    /// Text part.
    Text {
        /// Form field name.
        name: String,
        /// String-coerced value.
        value: String,
    },
}

/// Fully shaped outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path with every placeholder substituted, relative to the base URL.
    pub path: String,
    /// Query pairs in render order.
    pub query: Vec<(String, String)>,
    /// Body.
    pub body: RequestBody,
    /// Authorization header, present only for authenticated operations.
    pub authorization: Option<AuthHeader>,
    /// Expected response interpretation.
    pub response_kind: ResponseKind,
}

impl HttpRequest {
    /// Rendered query string including the leading `?`, or `None` when
    /// there are no query pairs.
    ///
    /// # Examples
    /// ```
    /// use marketplace_client::domain::ports::{HttpRequest, RequestBody};
    /// use marketplace_client::domain::{HttpMethod, ResponseKind};
    ///
    /// let request = HttpRequest {
    ///     method: HttpMethod::Get,
    ///     path: "/jobs".to_owned(),
    ///     query: vec![("status".to_owned(), "open".to_owned())],
    ///     body: RequestBody::Empty,
    ///     authorization: None,
    ///     response_kind: ResponseKind::Structured,
    /// };
    /// assert_eq!(request.query_string().as_deref(), Some("?status=open"));
    /// ```
    #[must_use]
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        Some(format!("?{encoded}"))
    }

    /// Path followed by the rendered query string.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self.query_string() {
            Some(query) => format!("{}{query}", self.path),
            None => self.path.clone(),
        }
    }
}

/// Raw response returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body bytes (possibly empty).
    pub body: Bytes,
}

impl HttpResponse {
    /// Build a response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Failures raised when no HTTP response was received.
    pub enum TransportError {
        /// The fixed request timeout elapsed.
        Timeout => "request timed out: {message}",
        /// The server could not be reached or the connection dropped.
        Connection => "connection failed: {message}",
        /// The request could not be built or sent for another reason.
        Other => "transport failed: {message}",
    }
}

impl TransportError {
    /// Whether no response was received because of the network.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connection { .. })
    }
}

/// Port for issuing one HTTP request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return whatever response arrives.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let response = transport.execute(request).await?;
    /// assert!(response.is_success());
    /// # Ok::<(), marketplace_client::domain::ports::TransportError>(())
    /// ```
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
