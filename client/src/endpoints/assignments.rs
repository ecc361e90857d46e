//! Assignment endpoints.

use crate::domain::{EndpointDescriptor, EndpointTable, OperationKey};

pub(super) fn table() -> EndpointTable {
    EndpointTable::new(
        "assignments",
        vec![
            EndpointDescriptor::get(OperationKey::ListAssignments, "/assignments"),
            EndpointDescriptor::patch(
                OperationKey::CompleteAssignment,
                "/assignments/{assignment_id}/complete",
            ),
        ],
    )
}
