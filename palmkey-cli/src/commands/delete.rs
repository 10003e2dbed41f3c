//! Delete command implementation.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use palmkey_core::TemplateStore;

use crate::response::{emit, DeleteResponse};

/// Execute the delete command.
pub fn execute(store: Arc<TemplateStore>, identity: String) -> Result<()> {
    info!(identity, "Deleting palm registration");

    if store.delete(&identity) {
        emit(&DeleteResponse {
            success: true,
            message: "Palm registration deleted successfully".to_string(),
        })
    } else {
        emit(&DeleteResponse {
            success: false,
            message: "No palm registered for this identity".to_string(),
        })
    }
}
