//! Successful dispatch results and their typed decoding.

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Decoded JSON document (after post-processing).
    Json(Value),
    /// Raw byte stream for binary-resource reads.
    Binary(Bytes),
    /// Success status with an empty body.
    NoContent,
}

impl Payload {
    /// Whether the server answered with no body.
    #[must_use]
    pub fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }

    /// Borrow the JSON document, if any.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Errors raised while decoding a [`Payload`] into a typed output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The server returned no body but the operation expects one.
    #[error("expected a response body but the server returned none")]
    Missing,
    /// The payload shape does not match what the operation expects.
    #[error("expected a {expected} response")]
    UnexpectedShape {
        /// Expected payload kind.
        expected: &'static str,
    },
    /// JSON did not match the output type.
    #[error("response did not match the expected shape: {message}")]
    Decode {
        /// Deserializer message.
        message: String,
    },
}

/// Conversion from a [`Payload`] into an operation's output type.
pub trait FromPayload: Sized {
    /// Perform the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] when the payload does not fit.
    fn from_payload(payload: Payload) -> Result<Self, PayloadError>;
}

impl FromPayload for Payload {
    fn from_payload(payload: Payload) -> Result<Self, PayloadError> {
        Ok(payload)
    }
}

impl FromPayload for () {
    fn from_payload(_payload: Payload) -> Result<Self, PayloadError> {
        Ok(())
    }
}

impl FromPayload for Value {
    fn from_payload(payload: Payload) -> Result<Self, PayloadError> {
        match payload {
            Payload::Json(value) => Ok(value),
            Payload::NoContent => Ok(Value::Null),
            Payload::Binary(_) => Err(PayloadError::UnexpectedShape { expected: "JSON" }),
        }
    }
}

impl FromPayload for Bytes {
    fn from_payload(payload: Payload) -> Result<Self, PayloadError> {
        match payload {
            Payload::Binary(bytes) => Ok(bytes),
            Payload::NoContent => Ok(Bytes::new()),
            Payload::Json(_) => Err(PayloadError::UnexpectedShape { expected: "binary" }),
        }
    }
}

impl<T: serde::de::DeserializeOwned> FromPayload for Vec<T> {
    fn from_payload(payload: Payload) -> Result<Self, PayloadError> {
        decode_json(payload)
    }
}

/// Decode a JSON payload into `T`.
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    payload: Payload,
) -> Result<T, PayloadError> {
    match payload {
        Payload::Json(value) => {
            serde_json::from_value(value).map_err(|error| PayloadError::Decode {
                message: error.to_string(),
            })
        }
        Payload::NoContent => Err(PayloadError::Missing),
        Payload::Binary(_) => Err(PayloadError::UnexpectedShape { expected: "JSON" }),
    }
}

/// Implement [`FromPayload`] for JSON-decoded output types.
macro_rules! json_from_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::domain::FromPayload for $ty {
                fn from_payload(
                    payload: $crate::domain::Payload,
                ) -> Result<Self, $crate::domain::PayloadError> {
                    $crate::domain::decode_json(payload)
                }
            }
        )*
    };
}

pub(crate) use json_from_payload;

#[cfg(test)]
mod tests {
    //! Regression coverage for payload decoding.

    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Widget {
        name: String,
    }

    #[test]
    fn decodes_json_payloads() {
        let widget: Widget = decode_json(Payload::Json(json!({"name": "cog"}))).expect("decode");
        assert_eq!(
            widget,
            Widget {
                name: "cog".to_owned()
            }
        );
    }

    #[test]
    fn missing_body_is_an_error_for_json_outputs() {
        let err = decode_json::<Widget>(Payload::NoContent).expect_err("missing");
        assert_eq!(err, PayloadError::Missing);
    }

    #[test]
    fn binary_outputs_reject_json() {
        let err = Bytes::from_payload(Payload::Json(json!({}))).expect_err("shape");
        assert!(matches!(err, PayloadError::UnexpectedShape { .. }));
    }

    #[test]
    fn unit_outputs_accept_no_content() {
        assert!(<()>::from_payload(Payload::NoContent).is_ok());
    }
}
