//! Endpoint descriptors: the static shape of one backend operation.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use super::OperationKey;

/// HTTP method used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Full update.
    Put,
    /// Partial update.
    Patch,
    /// Delete.
    Delete,
}

impl HttpMethod {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether structured parameters travel in the body rather than the
    /// query string.
    #[must_use]
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a successful response body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// JSON document.
    #[default]
    Structured,
    /// Raw byte stream (images, icons, media).
    Binary,
}

/// Multipart field metadata for file-upload endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileUpload {
    /// Form field name the file part(s) are sent under.
    pub field_name: &'static str,
    /// Whether more than one file may be sent.
    pub multiple: bool,
}

/// Local precondition failure raised by a [`Validator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    field: Option<String>,
    message: String,
}

impl ValidationError {
    /// Validation failure not tied to one field.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// Validation failure for the named field.
    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Offending field, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Human-readable reason.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Checks structured parameters after path placeholders have been consumed.
pub type Validator = fn(&Map<String, Value>) -> Result<(), ValidationError>;

/// Static description of one backend operation.
///
/// ## Invariants
/// - Immutable once placed in an [`super::EndpointRegistry`].
/// - Every `{placeholder}` in the path template must be satisfied from the
///   caller's parameters, otherwise dispatch fails before any I/O.
///
/// # Examples
/// ```
/// use marketplace_client::domain::{EndpointDescriptor, HttpMethod, OperationKey};
///
/// let descriptor = EndpointDescriptor::get(OperationKey::GetJob, "/jobs/{job_id}");
/// assert_eq!(descriptor.method(), HttpMethod::Get);
/// assert!(descriptor.requires_auth());
/// assert_eq!(descriptor.placeholders().collect::<Vec<_>>(), vec!["job_id"]);
/// ```
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    key: OperationKey,
    method: HttpMethod,
    path_template: &'static str,
    requires_auth: bool,
    validator: Option<Validator>,
    file_upload: Option<FileUpload>,
    response: ResponseKind,
}

impl EndpointDescriptor {
    /// Authenticated, structured descriptor with no validator.
    #[must_use]
    pub fn new(key: OperationKey, method: HttpMethod, path_template: &'static str) -> Self {
        Self {
            key,
            method,
            path_template,
            requires_auth: true,
            validator: None,
            file_upload: None,
            response: ResponseKind::Structured,
        }
    }

    /// `GET` descriptor.
    #[must_use]
    pub fn get(key: OperationKey, path_template: &'static str) -> Self {
        Self::new(key, HttpMethod::Get, path_template)
    }

    /// `POST` descriptor.
    #[must_use]
    pub fn post(key: OperationKey, path_template: &'static str) -> Self {
        Self::new(key, HttpMethod::Post, path_template)
    }

    /// `PUT` descriptor.
    #[must_use]
    pub fn put(key: OperationKey, path_template: &'static str) -> Self {
        Self::new(key, HttpMethod::Put, path_template)
    }

    /// `PATCH` descriptor.
    #[must_use]
    pub fn patch(key: OperationKey, path_template: &'static str) -> Self {
        Self::new(key, HttpMethod::Patch, path_template)
    }

    /// `DELETE` descriptor.
    #[must_use]
    pub fn delete(key: OperationKey, path_template: &'static str) -> Self {
        Self::new(key, HttpMethod::Delete, path_template)
    }

    /// Mark the operation as callable without a session.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Attach a local validator.
    #[must_use]
    pub fn validated_by(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Send the request as multipart, placing files under `field_name`.
    #[must_use]
    pub fn uploads(mut self, field_name: &'static str, multiple: bool) -> Self {
        self.file_upload = Some(FileUpload {
            field_name,
            multiple,
        });
        self
    }

    /// Expect a raw byte stream instead of JSON.
    #[must_use]
    pub fn binary(mut self) -> Self {
        self.response = ResponseKind::Binary;
        self
    }

    /// Operation key.
    #[must_use]
    pub fn key(&self) -> OperationKey {
        self.key
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path template with `{name}` placeholders.
    #[must_use]
    pub fn path_template(&self) -> &'static str {
        self.path_template
    }

    /// Whether a session is required.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Configured validator, if any.
    #[must_use]
    pub fn validator(&self) -> Option<Validator> {
        self.validator
    }

    /// File-upload metadata, if this is a multipart endpoint.
    #[must_use]
    pub fn file_upload(&self) -> Option<FileUpload> {
        self.file_upload
    }

    /// Expected response body interpretation.
    #[must_use]
    pub fn response_kind(&self) -> ResponseKind {
        self.response
    }

    /// Placeholder names in template order.
    pub fn placeholders(&self) -> impl Iterator<Item = &'static str> {
        let mut rest = self.path_template;
        std::iter::from_fn(move || {
            let open = rest.find('{')?;
            let after = rest.get(open + 1..)?;
            let close = after.find('}')?;
            let name = after.get(..close)?;
            rest = after.get(close + 1..).unwrap_or("");
            Some(name)
        })
    }
}
