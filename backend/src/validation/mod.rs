//! Consistency checks over the dashboard model.
//!
//! Two independent layers:
//!
//! ## Data-quality heuristics ([`validate`])
//! - at least one branch
//! - both year maps present
//! - for every branch × month, sales without orders and orders without
//!   sales, checked separately for 2024 and 2025
//!
//! These never block publication; they produce human-readable issue strings.
//!
//! ## Shape check ([`check_shape`])
//! JSON uploads skip row transformation and are merged as-is. They are
//! checked against the embedded `schemas/business-data.json` (Draft 7) so a
//! mismatch is reported, but the payload is still merged.
//!
//! # Example
//!
//! ```rust,ignore
//! use salesload::{validate, BusinessData, DashboardConfig};
//!
//! let model = BusinessData::with_branches(["Hamdan"], &DashboardConfig::default());
//! assert!(validate(&model).is_empty());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::models::{BusinessData, Month, YearData, SUPPORTED_YEARS};

static BUSINESS_DATA_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/business-data.json"))
        .expect("Invalid embedded schema")
});

/// Run the data-quality checks. An empty result means no issues were found.
pub fn validate(model: &BusinessData) -> Vec<String> {
    let mut issues = Vec::new();

    if model.branches.is_empty() {
        issues.push("No branches in data".to_string());
    }

    if model.data_2024.is_none() || model.data_2025.is_none() {
        issues.push("Sales data is incomplete".to_string());
    }

    for branch in &model.branches {
        for month in Month::ALL {
            for year in SUPPORTED_YEARS {
                if let Some(data) = model.year(year) {
                    check_cell(data, branch, month, year, &mut issues);
                }
            }
        }
    }

    issues
}

fn check_cell(data: &YearData, branch: &str, month: Month, year: i32, issues: &mut Vec<String>) {
    let sales = data.sales_at(branch, month);
    let orders = data.orders_at(branch, month);

    if sales > 0.0 && orders == 0 {
        issues.push(format!("{} {}: sales without orders in {}", branch, month.code(), year));
    }
    if orders > 0 && sales == 0.0 {
        issues.push(format!("{} {}: orders without sales in {}", branch, month.code(), year));
    }
}

/// Validate an untyped model, such as the merged current state.
///
/// A value that does not fit the canonical model yields a single issue.
pub fn validate_value(value: &Value) -> Vec<String> {
    match serde_json::from_value::<BusinessData>(value.clone()) {
        Ok(model) => validate(&model),
        Err(e) => vec![format!("Data does not match the dashboard model: {}", e)],
    }
}

/// Validate a JSON object against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every error if invalid
pub fn validate_schema(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a structured upload against the canonical model schema.
pub fn check_shape(data: &Value) -> Result<(), Vec<String>> {
    validate_schema(&BUSINESS_DATA_SCHEMA, data)
}
