//! List command implementation.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use palmkey_core::TemplateStore;

use crate::response::{emit, ListResponse};

/// Execute the list command.
pub fn execute(store: Arc<TemplateStore>) -> Result<()> {
    let records = store.list_all()?;
    info!(count = records.len(), "Listed registered palms");

    emit(&ListResponse {
        success: true,
        count: records.len(),
        records,
    })
}
