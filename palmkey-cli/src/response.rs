//! JSON envelopes written to stdout.
//!
//! Stdout carries exactly one JSON document per invocation; all diagnostics
//! go to stderr through `tracing`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use palmkey_core::RegistrationSummary;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RegisterData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub identity: String,
    pub signature: String,
    pub registered_at: DateTime<Utc>,
}

impl RegisterResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecognizeResponse {
    pub success: bool,
    #[serde(rename = "match")]
    pub matched: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RecognizeData>,
}

#[derive(Debug, Serialize)]
pub struct RecognizeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub threshold: f64,
}

impl RecognizeResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            matched: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub records: Vec<RegistrationSummary>,
}

/// Catch-all envelope for unhandled internal failures.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
}

impl FailureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Write one envelope to stdout as pretty-printed JSON.
pub fn emit<T: Serialize>(response: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(response).context("Failed to serialize response")?;
    println!("{json}");
    Ok(())
}
