//! Classifies every dispatch failure into exactly one [`ErrorKind`].

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use super::ports::TransportError;
use super::{ApiError, ErrorKind};

const MESSAGE_CHAR_LIMIT: usize = 200;
const BODY_PREVIEW_CHAR_LIMIT: usize = 160;

/// Raw failure observed somewhere in the dispatch pipeline.
///
/// `Display` is diagnostic detail for the log line only; it never reaches
/// [`ApiError::message`].
#[derive(Debug, Error)]
pub(crate) enum Failure {
    #[error("operation is not registered")]
    UnknownOperation,
    #[error("operation requires a session")]
    AuthenticationRequired,
    #[error("local validation failed: {message}")]
    Validation { message: String },
    #[error("status {status}: {}", body_preview(.body))]
    Status { status: u16, body: Bytes },
    #[error("{0}")]
    Transport(TransportError),
    #[error("response decode failed: {message}")]
    Decode { message: String },
}

impl Failure {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Map a failure to its kind.
pub(crate) fn classify(failure: &Failure) -> ErrorKind {
    match failure {
        Failure::UnknownOperation => ErrorKind::UnknownOperation,
        Failure::AuthenticationRequired => ErrorKind::Authentication,
        Failure::Validation { .. } => ErrorKind::Validation,
        Failure::Status { status, .. } => classify_status(*status),
        Failure::Transport(error) if error.is_network() => ErrorKind::Network,
        Failure::Transport(_) | Failure::Decode { .. } => ErrorKind::Unknown,
    }
}

fn classify_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Authentication,
        404 => ErrorKind::NotFound,
        500.. => ErrorKind::Network,
        400..=499 => ErrorKind::Validation,
        _ => ErrorKind::Unknown,
    }
}

/// Build the [`ApiError`] for a failure raised by `endpoint_key`.
pub(crate) fn normalize(endpoint_key: &str, failure: &Failure) -> ApiError {
    let kind = classify(failure);
    let (message, http_status) = match failure {
        Failure::Validation { message } => (clip(message), None),
        Failure::Status { status, body } => {
            let message = server_message(body)
                .or_else(|| reason_phrase(*status))
                .unwrap_or_else(|| kind.default_message().to_owned());
            (message, Some(*status))
        }
        Failure::Transport(error) => (transport_message(error, kind), None),
        Failure::UnknownOperation | Failure::AuthenticationRequired | Failure::Decode { .. } => {
            (kind.default_message().to_owned(), None)
        }
    };
    ApiError::new(kind, message, http_status, endpoint_key)
}

fn transport_message(error: &TransportError, kind: ErrorKind) -> String {
    match error {
        TransportError::Timeout { .. } => "the request timed out".to_owned(),
        TransportError::Connection { .. } => "could not reach the server".to_owned(),
        TransportError::Other { .. } => kind.default_message().to_owned(),
    }
}

fn reason_phrase(status: u16) -> Option<String> {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_owned)
}

/// Extract a structured message from a JSON error body.
fn server_message(body: &[u8]) -> Option<String> {
    let document: Value = serde_json::from_slice(body).ok()?;
    let candidate = text_or_message(document.get("message"))
        .or_else(|| text_or_message(document.get("error")))
        .or_else(|| text_or_message(document.get("detail")))
        .or_else(|| {
            document
                .get("errors")
                .and_then(Value::as_array)
                .and_then(|errors| text_or_message(errors.first()))
        })?;
    let trimmed = candidate.trim();
    (!trimmed.is_empty()).then(|| clip(trimmed))
}

fn text_or_message(value: Option<&Value>) -> Option<&str> {
    match value? {
        Value::String(text) => Some(text.as_str()),
        Value::Object(fields) => fields.get("message").and_then(Value::as_str),
        _ => None,
    }
}

fn clip(message: &str) -> String {
    let clipped: String = message.chars().take(MESSAGE_CHAR_LIMIT).collect();
    if message.chars().count() > MESSAGE_CHAR_LIMIT {
        format!("{clipped}...")
    } else {
        clipped
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact
        .chars()
        .take(BODY_PREVIEW_CHAR_LIMIT)
        .collect::<String>();
    if compact.chars().count() > BODY_PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for failure classification and messages.

    use super::*;
    use rstest::rstest;

    fn status(code: u16, body: &str) -> Failure {
        Failure::Status {
            status: code,
            body: Bytes::from(body.to_owned()),
        }
    }

    #[rstest]
    #[case::unauthorised(401, ErrorKind::Authentication)]
    #[case::forbidden(403, ErrorKind::Authentication)]
    #[case::missing(404, ErrorKind::NotFound)]
    #[case::server_error(500, ErrorKind::Network)]
    #[case::bad_gateway(502, ErrorKind::Network)]
    #[case::unavailable(503, ErrorKind::Network)]
    #[case::bad_request(400, ErrorKind::Validation)]
    #[case::conflict(409, ErrorKind::Validation)]
    #[case::unprocessable(422, ErrorKind::Validation)]
    #[case::too_many(429, ErrorKind::Validation)]
    #[case::redirect(302, ErrorKind::Unknown)]
    fn maps_statuses_to_kinds(#[case] code: u16, #[case] expected: ErrorKind) {
        assert_eq!(classify(&status(code, "")), expected);
    }

    #[rstest]
    #[case::timeout(TransportError::timeout("30s elapsed"), ErrorKind::Network)]
    #[case::dropped(TransportError::connection("reset by peer"), ErrorKind::Network)]
    #[case::other(TransportError::other("builder error"), ErrorKind::Unknown)]
    fn maps_transport_failures_to_kinds(
        #[case] error: TransportError,
        #[case] expected: ErrorKind,
    ) {
        assert_eq!(classify(&Failure::Transport(error)), expected);
    }

    #[test]
    fn local_failures_keep_their_kind() {
        assert_eq!(
            classify(&Failure::UnknownOperation),
            ErrorKind::UnknownOperation
        );
        assert_eq!(
            classify(&Failure::AuthenticationRequired),
            ErrorKind::Authentication
        );
        assert_eq!(
            classify(&Failure::validation("title is required")),
            ErrorKind::Validation
        );
        assert_eq!(classify(&Failure::decode("eof")), ErrorKind::Unknown);
    }

    #[rstest]
    #[case::message_field(r#"{"message": "Job is closed"}"#, "Job is closed")]
    #[case::error_string(r#"{"error": "Title taken"}"#, "Title taken")]
    #[case::error_object(r#"{"error": {"message": "Nested"}}"#, "Nested")]
    #[case::detail(r#"{"detail": "Detail text"}"#, "Detail text")]
    #[case::errors_array(r#"{"errors": [{"message": "First"}, "Second"]}"#, "First")]
    fn prefers_structured_server_messages(#[case] body: &str, #[case] expected: &str) {
        let error = normalize("create-job", &status(422, body));
        assert_eq!(error.message(), expected);
        assert_eq!(error.http_status(), Some(422));
        assert_eq!(error.endpoint_key(), "create-job");
    }

    #[test]
    fn falls_back_to_reason_phrase_then_default() {
        let error = normalize("get-job", &status(404, "<html>nope</html>"));
        assert_eq!(error.message(), "Not Found");

        let error = normalize("get-job", &status(599, ""));
        assert_eq!(error.message(), ErrorKind::Network.default_message());
    }

    #[test]
    fn transport_messages_hide_diagnostics() {
        let error = normalize(
            "list-jobs",
            &Failure::Transport(TransportError::connection(
                "tcp connect error: 10.0.0.5:8080 refused",
            )),
        );
        assert_eq!(error.kind(), ErrorKind::Network);
        assert_eq!(error.message(), "could not reach the server");
        assert!(!error.user_message().contains("10.0.0.5"));
        assert_eq!(error.http_status(), None);
    }

    #[test]
    fn long_server_messages_are_clipped() {
        let long = "x".repeat(500);
        let body = format!(r#"{{"message": "{long}"}}"#);
        let error = normalize("create-job", &status(400, &body));
        assert_eq!(error.message().chars().count(), MESSAGE_CHAR_LIMIT + 3);
    }

    #[test]
    fn user_message_is_one_line_with_kind_label() {
        let error = normalize("get-profile", &status(401, r#"{"message": "Token expired"}"#));
        assert_eq!(error.user_message(), "Not signed in: Token expired");
    }
}
