//! Reqwest-backed transport adapter.
//!
//! This adapter owns wire details only: URL assembly, headers, body encoding
//! and the fixed request timeout. Status codes are returned untouched; the
//! dispatcher decides what they mean.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Url};

use crate::domain::ports::{
    HttpRequest, HttpResponse, MultipartField, RequestBody, Transport, TransportError,
};
use crate::domain::{HttpMethod, ResponseKind};

const DEFAULT_USER_AGENT: &str = concat!("marketplace-client/", env!("CARGO_PKG_VERSION"));

/// Transport issuing requests against one API base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    user_agent: String,
}

impl ReqwestTransport {
    /// Build a transport with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_user_agent(base_url, timeout, DEFAULT_USER_AGENT)
    }

    /// Build a transport with an explicit timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_user_agent(
        base_url: Url,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            user_agent: user_agent.into(),
        })
    }

    /// Base URL every request path is appended to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = resolve_url(&self.base_url, &request)?;
        let mut builder = self
            .client
            .request(method(request.method), url)
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .header(reqwest::header::ACCEPT, accept(request.response_kind));
        if let Some(authorization) = &request.authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization.expose());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(document) => builder.json(&document),
            RequestBody::Multipart(fields) => builder.multipart(multipart_form(fields)?),
        };

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(HttpResponse::new(status, body))
    }
}

/// Append the request path to the base URL, keeping the base path prefix.
fn resolve_url(base: &Url, request: &HttpRequest) -> Result<Url, TransportError> {
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), request.path);
    let mut url = Url::parse(&joined)
        .map_err(|error| TransportError::other(format!("invalid request URL: {error}")))?;
    if !request.query.is_empty() {
        url.query_pairs_mut().extend_pairs(request.query.iter());
    }
    Ok(url)
}

const fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

const fn accept(kind: ResponseKind) -> &'static str {
    match kind {
        ResponseKind::Structured => "application/json",
        ResponseKind::Binary => "*/*",
    }
}

fn multipart_form(fields: Vec<MultipartField>) -> Result<Form, TransportError> {
    fields.into_iter().try_fold(Form::new(), |form, field| match field {
        MultipartField::File { name, file } => {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.file_name)
                .mime_str(&file.content_type)
                .map_err(|error| {
                    TransportError::other(format!("invalid content type for `{name}`: {error}"))
                })?;
            Ok(form.part(name, part))
        }
        MultipartField::Text { name, value } => Ok(form.text(name, value)),
    })
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else if error.is_connect() || error.is_request() || error.is_body() {
        TransportError::connection(error.to_string())
    } else {
        TransportError::other(error.to_string())
    }
}
