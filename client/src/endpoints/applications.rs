//! Application endpoints.

use serde_json::{Map, Value};

use super::require_text;
use crate::domain::{EndpointDescriptor, EndpointTable, OperationKey, ValidationError};

pub(super) fn table() -> EndpointTable {
    EndpointTable::new(
        "applications",
        vec![
            EndpointDescriptor::get(OperationKey::ListMyApplications, "/applications/mine"),
            EndpointDescriptor::get(OperationKey::ListJobApplications, "/jobs/{job_id}/applications"),
            EndpointDescriptor::post(OperationKey::SubmitApplication, "/jobs/{job_id}/applications")
                .validated_by(validate_submission),
            EndpointDescriptor::delete(
                OperationKey::WithdrawApplication,
                "/applications/{application_id}",
            ),
            EndpointDescriptor::post(
                OperationKey::AcceptApplication,
                "/applications/{application_id}/accept",
            ),
            EndpointDescriptor::post(
                OperationKey::RejectApplication,
                "/applications/{application_id}/reject",
            ),
        ],
    )
}

fn validate_submission(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    require_text(fields, "coverLetter").map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submissions_need_a_cover_letter() {
        let Value::Object(empty) = json!({"coverLetter": "  "}) else {
            panic!("object");
        };
        let err = validate_submission(&empty).expect_err("blank letter");
        assert_eq!(err.field(), Some("coverLetter"));
    }
}
