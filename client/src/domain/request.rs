//! Synchronous request shaping: everything the dispatcher does before the
//! single suspension point at the transport call.

use serde_json::{Map, Value};

use super::normalizer::Failure;
use super::ports::{HttpRequest, MultipartField, RequestBody};
use super::{EndpointDescriptor, FilePart, FileUpload, Params, Session};

/// Build the outgoing request for `descriptor`, or fail before any I/O.
pub(crate) fn prepare(
    descriptor: &EndpointDescriptor,
    params: Params,
    session: &Session,
) -> Result<HttpRequest, Failure> {
    let authorization = if descriptor.requires_auth() {
        Some(session.auth_header().ok_or(Failure::AuthenticationRequired)?)
    } else {
        None
    };

    let (mut fields, files) = params.into_parts();
    let path = substitute_path(descriptor.path_template(), &mut fields)?;

    if let Some(validator) = descriptor.validator() {
        validator(&fields).map_err(|error| Failure::validation(error.to_string()))?;
    }

    let (query, body) = match descriptor.file_upload() {
        Some(upload) => (Vec::new(), multipart_body(upload, fields, files)?),
        None if !files.is_empty() => {
            return Err(Failure::validation(
                "this operation does not accept file uploads",
            ));
        }
        None if descriptor.method().carries_body() => {
            (Vec::new(), RequestBody::Json(Value::Object(fields)))
        }
        None => (query_pairs(fields), RequestBody::Empty),
    };

    Ok(HttpRequest {
        method: descriptor.method(),
        path,
        query,
        body,
        authorization,
        response_kind: descriptor.response_kind(),
    })
}

/// Replace every `{name}` with the same-named field, consuming it.
pub(crate) fn substitute_path(
    template: &str,
    fields: &mut Map<String, Value>,
) -> Result<String, Failure> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let (literal, tail) = rest.split_at(open);
        path.push_str(literal);
        let Some(close) = tail.find('}') else {
            path.push_str(tail);
            return Ok(path);
        };
        let name = tail.get(1..close).unwrap_or_default();
        let value = fields
            .remove(name)
            .as_ref()
            .and_then(path_segment)
            .ok_or_else(|| Failure::validation(format!("missing path parameter `{name}`")))?;
        path.push_str(&urlencoding::encode(&value));
        rest = tail.get(close + 1..).unwrap_or_default();
    }
    path.push_str(rest);
    Ok(path)
}

fn path_segment(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Render structured fields as query pairs, dropping nulls entirely.
pub(crate) fn query_pairs(fields: Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        match value {
            Value::Null => {}
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter_map(scalar_text)
                    .map(|text| (name.clone(), text)),
            ),
            other => {
                if let Some(text) = scalar_text(&other) {
                    pairs.push((name, text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        compound @ (Value::Array(_) | Value::Object(_)) => Some(compound.to_string()),
    }
}

/// Files first under the configured field name, then text fields.
fn multipart_body(
    upload: FileUpload,
    fields: Map<String, Value>,
    files: Vec<FilePart>,
) -> Result<RequestBody, Failure> {
    if files.is_empty() {
        return Err(Failure::validation(format!(
            "a file is required for `{}`",
            upload.field_name
        )));
    }
    if !upload.multiple && files.len() > 1 {
        return Err(Failure::validation(format!(
            "only one file may be sent as `{}`",
            upload.field_name
        )));
    }

    let mut parts: Vec<MultipartField> = files
        .into_iter()
        .map(|file| MultipartField::File {
            name: upload.field_name.to_owned(),
            file,
        })
        .collect();
    parts.extend(fields.into_iter().filter_map(|(name, value)| {
        scalar_text(&value).map(|text| MultipartField::Text { name, value: text })
    }));
    Ok(RequestBody::Multipart(parts))
}
