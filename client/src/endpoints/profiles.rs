//! Profile endpoints.

use serde_json::{Map, Value};

use super::max_chars;
use crate::domain::{EndpointDescriptor, EndpointTable, OperationKey, ValidationError};

const MAX_BIO_CHARS: usize = 500;

pub(super) fn table() -> EndpointTable {
    EndpointTable::new(
        "profiles",
        vec![
            EndpointDescriptor::get(OperationKey::GetProfile, "/profiles/{username}"),
            EndpointDescriptor::patch(OperationKey::UpdateProfile, "/profiles/me")
                .validated_by(validate_update),
            EndpointDescriptor::post(OperationKey::UploadProfilePicture, "/profiles/me/picture")
                .uploads("picture", false),
            EndpointDescriptor::get(
                OperationKey::GetProfilePicture,
                "/profiles/{username}/picture",
            )
            .public()
            .binary(),
        ],
    )
}

fn validate_update(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    max_chars(fields, "bio", MAX_BIO_CHARS)
}
