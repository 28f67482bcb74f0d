//! Transformation module.
//!
//! Turns a decoded flat table into the canonical [`BusinessData`] model:
//!
//! ```text
//! Flat table (one row per branch/month/year)     BusinessData
//! ┌───────────────────────────────────────┐     ┌──────────────────────────────┐
//! │ Hamdan  Jan 2024  500  10             │     │ branches: [Hamdan, Khalidiya]│
//! │ Hamdan  Feb 2024  650  12             │  →  │ data2024.sales.Hamdan[0..12] │
//! │ Khalidiya Jan 2025 300  7             │     │ data2025.orders.Khalidiya[..]│
//! └───────────────────────────────────────┘     └──────────────────────────────┘
//! ```
//!
//! - Columns: header resolution ([`columns::ColumnMap`])
//! - Coerce: lenient numeric parsing
//! - Pipeline: decode → transform → validate → publish

pub mod coerce;
pub mod columns;
pub mod pipeline;

use serde::Serialize;
use std::fmt;

use crate::api::logs::log_warning;
use crate::config::DashboardConfig;
use crate::error::SchemaError;
use crate::models::{BusinessData, FlatRecord, FlatTable, Month};

pub use columns::{ColumnMap, REQUIRED_COLUMNS};
pub use pipeline::*;

/// Why a record left no trace in the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SkipReason {
    /// The branch cell was empty.
    MissingBranch,
    /// The month cell is not one of the twelve codes.
    UnknownMonth(String),
    /// The year has no target series (only 2024 and 2025 do).
    UnsupportedYear(Option<i32>),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBranch => write!(f, "missing branch"),
            Self::UnknownMonth(m) => write!(f, "invalid month '{}'", m),
            Self::UnsupportedYear(Some(y)) => write!(f, "unsupported year {}", y),
            Self::UnsupportedYear(None) => write!(f, "missing year"),
        }
    }
}

/// A record that was dropped during transformation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub row: usize,
    pub reason: SkipReason,
}

/// Result of transforming one flat table.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    pub model: BusinessData,
    /// Data rows read from the table.
    pub rows_read: usize,
    /// Records written into a series slot.
    pub applied: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl TransformOutcome {
    pub fn summary(&self) -> String {
        format!(
            "Read {} rows: {} applied, {} skipped, {} branches",
            self.rows_read,
            self.applied,
            self.skipped.len(),
            self.model.branches.len()
        )
    }
}

/// Transform a flat table into the canonical model.
///
/// Every discovered branch gets zero-filled series in all four year/kind maps
/// before any record is applied. Records are then applied in input order and
/// later records overwrite earlier ones for the same branch, month and year.
///
/// Fails only when the header lacks one of [`REQUIRED_COLUMNS`].
pub fn transform_table(
    table: &FlatTable,
    config: &DashboardConfig,
) -> Result<TransformOutcome, SchemaError> {
    let columns = ColumnMap::resolve(&table.header)?;

    let records: Vec<FlatRecord> = table
        .rows
        .iter()
        .map(|row| columns.record(row.number, &row.cells))
        .collect();

    let mut model = BusinessData::with_branches(
        records.iter().filter_map(|r| r.branch.clone()),
        config,
    );

    let mut applied = 0;
    let mut skipped = Vec::new();

    for record in &records {
        match apply_record(&mut model, record) {
            Ok(()) => applied += 1,
            Err(reason) => {
                log_warning(format!("Row {}: {}, skipped", record.row, reason));
                skipped.push(SkippedRecord {
                    row: record.row,
                    reason,
                });
            }
        }
    }

    Ok(TransformOutcome {
        model,
        rows_read: records.len(),
        applied,
        skipped,
    })
}

/// Write one record into its (branch, month, year) slot, or explain why not.
fn apply_record(model: &mut BusinessData, record: &FlatRecord) -> Result<(), SkipReason> {
    let month = Month::from_code(&record.month)
        .ok_or_else(|| SkipReason::UnknownMonth(record.month.clone()))?;
    let branch = record.branch.as_deref().ok_or(SkipReason::MissingBranch)?;

    let year_data = record
        .year
        .and_then(|y| model.year_mut(y))
        .ok_or(SkipReason::UnsupportedYear(record.year))?;

    // Branch series were allocated up front from the same records.
    if year_data.set(branch, month, record.sales, record.orders) {
        Ok(())
    } else {
        Err(SkipReason::MissingBranch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, TableRow, SUPPORTED_YEARS};

    fn table(rows: Vec<Vec<Cell>>) -> FlatTable {
        let header = REQUIRED_COLUMNS.iter().map(|&c| Cell::from(c)).collect();
        FlatTable::from_grid(std::iter::once(header).chain(rows).collect()).unwrap()
    }

    fn row(branch: &str, month: &str, year: i32, sales: f64, orders: i32) -> Vec<Cell> {
        vec![branch.into(), month.into(), year.into(), sales.into(), orders.into()]
    }

    #[test]
    fn test_single_record() {
        let out = transform_table(
            &table(vec![row("Hamdan", "Jan", 2024, 500.0, 10)]),
            &DashboardConfig::default(),
        )
        .unwrap();
        let model = &out.model;

        let d24 = model.data_2024.as_ref().unwrap();
        let d25 = model.data_2025.as_ref().unwrap();
        assert_eq!(d24.sales["Hamdan"][0], 500.0);
        assert_eq!(d24.orders["Hamdan"][0], 10);

        let other_slots: f64 = d24.sales["Hamdan"][1..].iter().sum::<f64>()
            + d25.sales["Hamdan"].iter().sum::<f64>();
        let other_orders: i64 =
            d24.orders["Hamdan"][1..].iter().sum::<i64>() + d25.orders["Hamdan"].iter().sum::<i64>();
        assert_eq!(other_slots, 0.0);
        assert_eq!(other_orders, 0);
        assert_eq!(out.applied, 1);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn test_branches_first_seen_order() {
        let out = transform_table(
            &table(vec![
                row("Khalidiya", "Jan", 2024, 1.0, 1),
                row("Hamdan", "Jan", 2024, 1.0, 1),
                row("Khalidiya", "Feb", 2025, 1.0, 1),
                row("Mussafah", "Mar", 2024, 1.0, 1),
            ]),
            &DashboardConfig::default(),
        )
        .unwrap();

        assert_eq!(out.model.branches, vec!["Khalidiya", "Hamdan", "Mussafah"]);
        assert_eq!(out.model.branch_names["Hamdan"], "Crispy Chicken - Hamdan");
    }

    #[test]
    fn test_last_write_wins() {
        let out = transform_table(
            &table(vec![
                row("Hamdan", "Jan", 2024, 100.0, 5),
                row("Hamdan", "Jan", 2024, 150.0, 6),
            ]),
            &DashboardConfig::default(),
        )
        .unwrap();

        let d24 = out.model.data_2024.unwrap();
        assert_eq!(d24.sales["Hamdan"][0], 150.0);
        assert_eq!(d24.orders["Hamdan"][0], 6);
    }

    #[test]
    fn test_unknown_month_is_skipped_without_writes() {
        let out = transform_table(
            &table(vec![
                row("Hamdan", "January", 2024, 999.0, 9),
                row("Hamdan", "13", 2025, 999.0, 9),
            ]),
            &DashboardConfig::default(),
        )
        .unwrap();

        assert_eq!(out.model.branches, vec!["Hamdan"]);
        for year in SUPPORTED_YEARS {
            let data = out.model.year(year).unwrap();
            assert_eq!(data.sales["Hamdan"], vec![0.0; 12]);
            assert_eq!(data.orders["Hamdan"], vec![0; 12]);
        }
        assert_eq!(out.applied, 0);
        assert_eq!(
            out.skipped[0],
            SkippedRecord { row: 2, reason: SkipReason::UnknownMonth("January".into()) }
        );
    }

    #[test]
    fn test_unsupported_year_has_no_effect() {
        let out = transform_table(
            &table(vec![row("Hamdan", "Jan", 2023, 777.0, 7)]),
            &DashboardConfig::default(),
        )
        .unwrap();

        assert_eq!(out.model.branches, vec!["Hamdan"]);
        assert_eq!(out.model.data_2024.as_ref().unwrap().sales["Hamdan"], vec![0.0; 12]);
        assert_eq!(out.model.data_2025.as_ref().unwrap().sales["Hamdan"], vec![0.0; 12]);
        assert_eq!(out.skipped[0].reason, SkipReason::UnsupportedYear(Some(2023)));
    }

    #[test]
    fn test_malformed_numbers_default_to_zero() {
        let out = transform_table(
            &table(vec![vec![
                "Hamdan".into(),
                "Apr".into(),
                "2025".into(),
                "n/a".into(),
                Cell::Empty,
            ]]),
            &DashboardConfig::default(),
        )
        .unwrap();

        assert_eq!(out.applied, 1);
        let d25 = out.model.data_2025.unwrap();
        assert_eq!(d25.sales["Hamdan"][3], 0.0);
        assert_eq!(d25.orders["Hamdan"][3], 0);
    }

    #[test]
    fn test_missing_branch_row_is_skipped() {
        let out = transform_table(
            &table(vec![
                vec![Cell::Empty, "Jan".into(), 2024.into(), 5.0.into(), 1.into()],
                row("Hamdan", "Jan", 2024, 5.0, 1),
            ]),
            &DashboardConfig::default(),
        )
        .unwrap();

        assert_eq!(out.model.branches, vec!["Hamdan"]);
        assert_eq!(out.skipped[0].reason, SkipReason::MissingBranch);
        assert_eq!(out.summary(), "Read 2 rows: 1 applied, 1 skipped, 1 branches");
    }

    #[test]
    fn test_month_is_checked_before_branch() {
        let out = transform_table(
            &table(vec![vec![Cell::Empty, "Jnu".into(), 2024.into(), 5.0.into(), 1.into()]]),
            &DashboardConfig::default(),
        )
        .unwrap();

        assert_eq!(out.skipped[0].reason, SkipReason::UnknownMonth("Jnu".into()));
        assert!(out.model.branches.is_empty());
    }

    #[test]
    fn test_skip_rows_count_blank_lines() {
        let out = transform_table(
            &table(vec![
                row("Hamdan", "Jan", 2024, 5.0, 1),
                vec![Cell::Empty; 5],
                row("Hamdan", "Jnu", 2024, 5.0, 1),
            ]),
            &DashboardConfig::default(),
        )
        .unwrap();

        assert_eq!(out.rows_read, 2);
        assert_eq!(
            out.skipped,
            vec![SkippedRecord { row: 4, reason: SkipReason::UnknownMonth("Jnu".into()) }]
        );
    }

    #[test]
    fn test_missing_columns_fail_fast() {
        let bad = FlatTable {
            header: vec!["Branch".into(), "Month".into()],
            rows: vec![TableRow {
                number: 2,
                cells: vec!["Hamdan".into(), "Jan".into()],
            }],
        };
        let err = transform_table(&bad, &DashboardConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Year, Sales, Orders"));
    }

    #[test]
    fn test_header_only_table() {
        let out = transform_table(&table(vec![]), &DashboardConfig::default()).unwrap();
        assert!(out.model.branches.is_empty());
        assert_eq!(out.model.months.len(), 12);
        assert!(out.model.data_2024.as_ref().unwrap().sales.is_empty());
    }
}
