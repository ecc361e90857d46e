//! Conversation and messaging endpoints.

use serde_json::{Map, Value};

use super::require_text;
use crate::domain::{EndpointDescriptor, EndpointTable, OperationKey, ValidationError};

pub(super) fn table() -> EndpointTable {
    EndpointTable::new(
        "conversations",
        vec![
            EndpointDescriptor::get(OperationKey::ListConversations, "/conversations"),
            EndpointDescriptor::get(
                OperationKey::ListMessages,
                "/conversations/{conversation_id}/messages",
            ),
            EndpointDescriptor::post(
                OperationKey::SendMessage,
                "/conversations/{conversation_id}/messages",
            )
            .validated_by(validate_message),
            EndpointDescriptor::post(
                OperationKey::SendAttachment,
                "/conversations/{conversation_id}/attachments",
            )
            .uploads("attachment", false),
            EndpointDescriptor::patch(
                OperationKey::MarkConversationRead,
                "/conversations/{conversation_id}/read",
            ),
        ],
    )
}

fn validate_message(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    require_text(fields, "body").map(|_| ())
}
