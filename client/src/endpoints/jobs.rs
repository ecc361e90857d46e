//! Job endpoints.

use serde_json::{Map, Value};

use super::{positive_number, require_text};
use crate::domain::{EndpointDescriptor, EndpointTable, OperationKey, ValidationError};

pub(super) fn table() -> EndpointTable {
    EndpointTable::new(
        "jobs",
        vec![
            EndpointDescriptor::get(OperationKey::ListJobs, "/jobs"),
            EndpointDescriptor::get(OperationKey::GetJob, "/jobs/{job_id}"),
            EndpointDescriptor::post(OperationKey::CreateJob, "/jobs").validated_by(validate_new),
            EndpointDescriptor::put(OperationKey::UpdateJob, "/jobs/{job_id}")
                .validated_by(validate_update),
            EndpointDescriptor::delete(OperationKey::DeleteJob, "/jobs/{job_id}"),
            EndpointDescriptor::post(OperationKey::UploadJobImages, "/jobs/{job_id}/images")
                .uploads("images", true),
            EndpointDescriptor::get(OperationKey::GetJobImage, "/jobs/{job_id}/images/{image_id}")
                .binary(),
        ],
    )
}

fn validate_new(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    require_text(fields, "title")?;
    positive_number(fields, "budget", true)
}

fn validate_update(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    if fields.contains_key("title") {
        require_text(fields, "title")?;
    }
    positive_number(fields, "budget", false)
}
