//! Category endpoints. Both are public.

use crate::domain::{EndpointDescriptor, EndpointTable, OperationKey};

pub(super) fn table() -> EndpointTable {
    EndpointTable::new(
        "categories",
        vec![
            EndpointDescriptor::get(OperationKey::ListCategories, "/categories").public(),
            EndpointDescriptor::get(OperationKey::GetCategoryIcon, "/categories/{category_id}/icon")
                .public()
                .binary(),
        ],
    )
}
