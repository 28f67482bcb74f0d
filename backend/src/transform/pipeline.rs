//! High-level upload pipeline: decode → transform → publish → validate.
//!
//! Work is split in two so callers can decode without holding the state:
//!
//! - [`prepare_upload`] decodes and transforms; it never touches the state.
//! - [`commit_upload`] publishes the prepared update and runs the checks.
//!
//! Any error is raised before publishing, so a failed upload leaves the
//! current model exactly as it was.
//!
//! # Example
//!
//! ```rust,ignore
//! use salesload::{ingest, DashboardConfig, DashboardState, RenderHooks, UploadedFile};
//!
//! let mut state = DashboardState::new();
//! let file = UploadedFile::read("sales.xlsx")?;
//! let report = ingest(&mut state, &RenderHooks::none(), Some(file), &DashboardConfig::default())?;
//! println!("{} branches, {} issues", report.branches.len(), report.issues.len());
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::api::logs::{log_info, log_success, log_warning, log_warning_indent};
use crate::config::DashboardConfig;
use crate::error::{IngestError, IngestResult};
use crate::parser::{decode, Decoded, FileKind};
use crate::state::{DashboardState, RenderHooks};
use crate::validation::{check_shape, validate_value};

use super::{transform_table, SkippedRecord};

/// Raw file as handed over by the file picker or an HTTP upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn read<P: AsRef<Path>>(path: P) -> IngestResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(crate::error::DecodeError::from)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }
}

/// What an upload did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub file_name: String,
    pub kind: String,
    /// Data rows read (0 for JSON uploads).
    pub rows_read: usize,
    /// Records written into the model.
    pub applied: usize,
    pub skipped: Vec<SkippedRecord>,
    /// Branches in the uploaded data.
    pub branches: Vec<String>,
    /// Schema mismatches of a JSON upload. Reported, not enforced.
    pub shape_warnings: Vec<String>,
    /// Data-quality issues of the model after publishing.
    pub issues: Vec<String>,
    /// State revision after publishing.
    pub revision: u64,
}

/// A decoded and transformed upload, not yet published.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpload {
    pub update: Map<String, Value>,
    pub report: IngestReport,
}

/// Decode and transform an upload.
pub fn prepare_upload(file: &UploadedFile, config: &DashboardConfig) -> IngestResult<PreparedUpload> {
    let kind = FileKind::from_file_name(&file.name)?;
    log_info(format!("📄 Processing {} file: {} ({} bytes)", kind.label(), file.name, file.bytes.len()));

    let mut report = IngestReport {
        file_name: file.name.clone(),
        kind: kind.label().to_string(),
        ..IngestReport::default()
    };

    let update = match decode(&file.bytes, kind)? {
        Decoded::Table(table) => {
            log_success(format!("Read {} data rows", table.rows.len()));
            log_info(format!("Columns: {}", table.header.join(", ")));

            let outcome = transform_table(&table, config)?;
            log_success(outcome.summary());
            print_skipped(&outcome.skipped);

            report.rows_read = outcome.rows_read;
            report.applied = outcome.applied;
            report.skipped = outcome.skipped;
            report.branches = outcome.model.branches.clone();
            outcome.model.to_object()?
        }
        Decoded::Document(map) => {
            // JSON uploads are assumed to be model-shaped and merged as-is.
            log_info("Checking JSON against the dashboard model...");
            if let Err(errors) = check_shape(&Value::Object(map.clone())) {
                log_warning(format!("JSON does not match the dashboard model ({} problems)", errors.len()));
                for err in errors.iter().take(5) {
                    log_warning_indent(err.clone(), 1);
                }
                report.shape_warnings = errors;
            }
            report.branches = map
                .get("branches")
                .and_then(Value::as_array)
                .map(|b| b.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default();
            map
        }
    };

    Ok(PreparedUpload { update, report })
}

/// Publish a prepared upload and check the resulting model.
pub fn commit_upload(
    state: &mut DashboardState,
    hooks: &RenderHooks,
    prepared: PreparedUpload,
) -> IngestReport {
    let PreparedUpload { update, mut report } = prepared;

    state.publish(update, hooks);
    report.revision = state.revision();
    log_success(format!("Dashboard data updated (revision {})", report.revision));

    report.issues = state
        .snapshot()
        .map(|model| validate_value(&model))
        .unwrap_or_default();
    print_issues(&report.issues);

    report
}

/// Full upload: fails with [`IngestError::MissingInput`] when no file is given.
pub fn ingest(
    state: &mut DashboardState,
    hooks: &RenderHooks,
    file: Option<UploadedFile>,
    config: &DashboardConfig,
) -> IngestResult<IngestReport> {
    let file = file.ok_or(IngestError::MissingInput)?;
    let prepared = prepare_upload(&file, config)?;
    Ok(commit_upload(state, hooks, prepared))
}

/// Convert a file on disk into a standalone model, without any shared state.
pub fn convert_file<P: AsRef<Path>>(
    path: P,
    config: &DashboardConfig,
) -> IngestResult<(Map<String, Value>, IngestReport)> {
    let mut state = DashboardState::new();
    let report = ingest(&mut state, &RenderHooks::none(), Some(UploadedFile::read(path)?), config)?;
    let model = state.current().cloned().unwrap_or_default();
    Ok((model, report))
}

/// Print skipped records grouped by reason.
fn print_skipped(skipped: &[SkippedRecord]) {
    if skipped.is_empty() {
        return;
    }
    log_warning(format!("{} rows skipped", skipped.len()));

    let mut reasons: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for skip in skipped {
        reasons.entry(skip.reason.to_string()).or_default().push(skip.row);
    }

    for (reason, rows) in reasons.iter().take(5) {
        let row_sample: Vec<String> = rows.iter().take(5).map(|r| r.to_string()).collect();
        let more = if rows.len() > 5 { format!("... +{}", rows.len() - 5) } else { String::new() };
        log_warning_indent(format!("• {} (rows: {}{})", reason, row_sample.join(", "), more), 1);
    }
}

fn print_issues(issues: &[String]) {
    if issues.is_empty() {
        log_success("No data-quality issues found");
        return;
    }
    log_warning(format!("{} data-quality issue(s)", issues.len()));
    for issue in issues.iter().take(5) {
        log_warning_indent(issue.clone(), 1);
    }
}
