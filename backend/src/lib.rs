//! # Salesload - branch sales ingestion for the business dashboard
//!
//! Salesload turns an uploaded JSON, Excel or CSV file into the dashboard's
//! canonical branch × month × year model and publishes it to an owned state
//! slot that dashboard views render from.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Upload file │────▶│   Decoder   │────▶│  Transform  │────▶│  Publisher  │
//! │ json/xlsx/  │     │ (by ext.)   │     │ + validate  │     │ merge+hooks │
//! │ csv         │     └─────────────┘     └─────────────┘     └─────────────┘
//! └─────────────┘            │ JSON object (merged as-is)            ▲
//!                            └───────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salesload::{ingest, DashboardConfig, DashboardState, RenderHooks, UploadedFile};
//!
//! let config = DashboardConfig::from_env();
//! let mut state = DashboardState::new();
//! let hooks = RenderHooks::none().with_refresh(|| println!("re-render"));
//!
//! let report = ingest(&mut state, &hooks, Some(UploadedFile::read("sales.xlsx")?), &config)?;
//! println!("{} rows applied, {} issues", report.applied, report.issues.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error hierarchy
//! - [`config`] - Environment-driven configuration
//! - [`models`] - Domain models (Month, FlatTable, BusinessData)
//! - [`parser`] - File decoding (JSON, Excel, CSV)
//! - [`transform`] - Flat table to model, and the upload pipeline
//! - [`validation`] - Data-quality checks and JSON shape check
//! - [`state`] - Current model slot, render hooks, status board
//! - [`export`] - JSON export and Excel template
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Decoding
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// State and output
pub mod export;
pub mod state;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{DecodeError, ExportError, IngestError, SchemaError, ServerError};

// =============================================================================
// Re-exports - Config & Models
// =============================================================================

pub use config::DashboardConfig;

pub use models::{BusinessData, Cell, FlatRecord, FlatTable, Month, TableRow, YearData};

// =============================================================================
// Re-exports - Decoding
// =============================================================================

pub use parser::{decode, decode_file, Decoded, FileKind};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    transform_table,
    ColumnMap,
    SkipReason,
    SkippedRecord,
    TransformOutcome,
    REQUIRED_COLUMNS,
};

pub use transform::pipeline::{
    commit_upload,
    convert_file,
    ingest,
    prepare_upload,
    IngestReport,
    PreparedUpload,
    UploadedFile,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{check_shape, validate, validate_value};

// =============================================================================
// Re-exports - State & Export
// =============================================================================

pub use state::{DashboardState, RenderHooks, Severity, StatusBoard, StatusMessage};

pub use export::{export_json, export_state, template_file, template_workbook, ExportFile};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
