//! REST API types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::StatusMessage;
use crate::transform::pipeline::IngestReport;

/// Response sent after an upload was published.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready" when no issues were found, "warning" otherwise
    pub status: String,

    /// Message also shown in the status region
    pub message: String,

    pub report: IngestReport,
}

impl UploadResponse {
    pub fn new(message: impl Into<String>, report: IngestReport) -> Self {
        let clean = report.issues.is_empty()
            && report.skipped.is_empty()
            && report.shape_warnings.is_empty();
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: if clean { "ready" } else { "warning" }.to_string(),
            message: message.into(),
            report,
        }
    }
}

/// Data-quality issues of the current model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub revision: u64,
    pub issue_count: usize,
    pub issues: Vec<String>,
}

impl ValidationResponse {
    pub fn new(revision: u64, issues: Vec<String>) -> Self {
        Self {
            revision,
            issue_count: issues.len(),
            issues,
        }
    }
}

/// Current status region content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Option<StatusMessage>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}
