//! Parameter bag handed to the dispatcher.
//!
//! Structured fields are kept as a JSON object so the same bag can feed path
//! placeholders, validators, query strings, JSON bodies and multipart text
//! fields. Raw binary payloads travel separately as [`FilePart`]s.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// One file destined for a multipart upload.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    /// File contents.
    pub bytes: Bytes,
}

impl FilePart {
    /// Build a file part.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Errors raised while turning typed input into a [`Params`] bag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// Input serialised to something other than a JSON object.
    #[error("operation parameters must serialise to an object")]
    NotAnObject,
    /// Input could not be serialised at all.
    #[error("operation parameters could not be serialised: {message}")]
    Serialize {
        /// Serializer message.
        message: String,
    },
}

/// Structured parameters plus optional binary payloads.
///
/// A field explicitly set to `null` behaves exactly like an absent field: it
/// never satisfies a path placeholder and is never rendered into a query
/// string or multipart form.
///
/// # Examples
/// ```
/// use marketplace_client::Params;
///
/// let params = Params::new().with("status", "open").with("limit", None::<u32>);
/// assert_eq!(params.fields().len(), 2);
/// assert!(params.files().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    fields: Map<String, Value>,
    files: Vec<FilePart>,
}

impl Params {
    /// Empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialise any `Serialize` value into a bag.
    ///
    /// `()` and other values serialising to `null` produce an empty bag.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] when the value is not an object.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ParamsError> {
        let encoded = serde_json::to_value(value).map_err(|error| ParamsError::Serialize {
            message: error.to_string(),
        })?;
        match encoded {
            Value::Object(fields) => Ok(Self {
                fields,
                files: Vec::new(),
            }),
            Value::Null => Ok(Self::new()),
            _ => Err(ParamsError::NotAnObject),
        }
    }

    /// Add or replace one structured field.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Append one file.
    #[must_use]
    pub fn with_file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    /// Add or replace one structured field in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Structured fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Binary payloads.
    #[must_use]
    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub(crate) fn into_parts(self) -> (Map<String, Value>, Vec<FilePart>) {
        (self.fields, self.files)
    }
}

/// Conversion from typed operation input into a [`Params`] bag.
pub trait IntoParams {
    /// Perform the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] when the input cannot be represented.
    fn into_params(self) -> Result<Params, ParamsError>;
}

impl IntoParams for Params {
    fn into_params(self) -> Result<Params, ParamsError> {
        Ok(self)
    }
}

impl IntoParams for () {
    fn into_params(self) -> Result<Params, ParamsError> {
        Ok(Params::new())
    }
}

/// Structured input paired with files for multipart operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload<T> {
    /// Structured fields (including path identifiers).
    pub fields: T,
    /// Files in upload order.
    pub files: Vec<FilePart>,
}

impl<T> Upload<T> {
    /// Pair structured input with files.
    pub fn new(fields: T, files: Vec<FilePart>) -> Self {
        Self { fields, files }
    }
}

impl<T: IntoParams> IntoParams for Upload<T> {
    fn into_params(self) -> Result<Params, ParamsError> {
        let mut params = self.fields.into_params()?;
        params.files.extend(self.files);
        Ok(params)
    }
}

/// Implement [`IntoParams`] for serialisable input structs.
macro_rules! serialize_into_params {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::domain::IntoParams for $ty {
                fn into_params(
                    self,
                ) -> Result<$crate::domain::Params, $crate::domain::ParamsError> {
                    $crate::domain::Params::from_serialize(&self)
                }
            }
        )*
    };
}

pub(crate) use serialize_into_params;
