//! Domain models for the Salesload ingestion pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Month`] - Closed enumeration of the twelve month codes
//! - [`Cell`] / [`FlatTable`] - Decoder output, addressed positionally
//! - [`FlatRecord`] - One typed input row
//! - [`YearData`] - Per-branch sales and orders series for one year
//! - [`BusinessData`] - The canonical dashboard model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::config::DashboardConfig;

/// Length of every per-branch series.
pub const MONTHS_PER_YEAR: usize = 12;

/// Years that have a target series in the model.
pub const SUPPORTED_YEARS: [i32; 2] = [2024, 2025];

// =============================================================================
// Month
// =============================================================================

/// A calendar month, identified in files by its three-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// All months in calendar order.
    pub const ALL: [Month; MONTHS_PER_YEAR] = [
        Self::Jan,
        Self::Feb,
        Self::Mar,
        Self::Apr,
        Self::May,
        Self::Jun,
        Self::Jul,
        Self::Aug,
        Self::Sep,
        Self::Oct,
        Self::Nov,
        Self::Dec,
    ];

    /// Resolve an exact three-letter code (`"Jan"`). Anything else is `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Position in the year, 0-based.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Jan => "Jan",
            Self::Feb => "Feb",
            Self::Mar => "Mar",
            Self::Apr => "Apr",
            Self::May => "May",
            Self::Jun => "Jun",
            Self::Jul => "Jul",
            Self::Aug => "Aug",
            Self::Sep => "Sep",
            Self::Oct => "Oct",
            Self::Nov => "Nov",
            Self::Dec => "Dec",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Self::Jan => "January",
            Self::Feb => "February",
            Self::Mar => "March",
            Self::Apr => "April",
            Self::May => "May",
            Self::Jun => "June",
            Self::Jul => "July",
            Self::Aug => "August",
            Self::Sep => "September",
            Self::Oct => "October",
            Self::Nov => "November",
            Self::Dec => "December",
        }
    }
}

// =============================================================================
// Flat table (decoder output)
// =============================================================================

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// True for `Empty` and for whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell as text. Whole numbers print without a fractional part.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(n as f64)
    }
}

/// Header row plus data rows, columns addressed by position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatTable {
    pub header: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// A data row and where it sits in the source sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    /// 1-based sheet row number.
    pub number: usize,
    pub cells: Vec<Cell>,
}

impl FlatTable {
    /// Split an array-of-arrays into header (row 0) and data rows, with the
    /// header on sheet row 1.
    ///
    /// Returns `None` when there is no header row at all.
    pub fn from_grid(grid: Vec<Vec<Cell>>) -> Option<Self> {
        Self::from_grid_at(grid, 1)
    }

    /// Same as [`FlatTable::from_grid`] with the header on `header_row`.
    pub fn from_grid_at(grid: Vec<Vec<Cell>>, header_row: usize) -> Option<Self> {
        Self::from_numbered_rows(
            grid.into_iter()
                .enumerate()
                .map(|(i, cells)| (header_row + i, cells)),
        )
    }

    /// Build from rows that already carry their sheet row number; the first
    /// row is the header.
    ///
    /// Blank rows are dropped without renumbering the rest.
    pub fn from_numbered_rows<I>(rows: I) -> Option<Self>
    where
        I: IntoIterator<Item = (usize, Vec<Cell>)>,
    {
        let mut rows = rows.into_iter();
        let (_, header) = rows.next()?;
        let header = header
            .iter()
            .map(|c| c.to_text().unwrap_or_default())
            .collect();
        let rows = rows
            .filter(|(_, cells)| !cells.iter().all(Cell::is_blank))
            .map(|(number, cells)| TableRow { number, cells })
            .collect();
        Some(Self { header, rows })
    }
}

/// One data row decoded through the resolved header.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    /// 1-based spreadsheet row number (the header is row 1).
    pub row: usize,
    pub branch: Option<String>,
    pub month: String,
    pub year: Option<i32>,
    pub sales: f64,
    pub orders: i64,
}

// =============================================================================
// Canonical model
// =============================================================================

/// Sales and orders per branch for one year, each a 12-slot series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YearData {
    #[serde(default)]
    pub sales: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub orders: BTreeMap<String, Vec<i64>>,
}

impl YearData {
    /// Zero-fill both series for a branch.
    pub fn allocate(&mut self, branch: &str) {
        self.sales.insert(branch.to_string(), vec![0.0; MONTHS_PER_YEAR]);
        self.orders.insert(branch.to_string(), vec![0; MONTHS_PER_YEAR]);
    }

    /// Overwrite one month for a branch. Returns `false` if the branch was never allocated.
    pub fn set(&mut self, branch: &str, month: Month, sales: f64, orders: i64) -> bool {
        match (self.sales.get_mut(branch), self.orders.get_mut(branch)) {
            (Some(s), Some(o)) if s.len() == MONTHS_PER_YEAR && o.len() == MONTHS_PER_YEAR => {
                s[month.index()] = sales;
                o[month.index()] = orders;
                true
            }
            _ => false,
        }
    }

    pub fn sales_at(&self, branch: &str, month: Month) -> f64 {
        self.sales
            .get(branch)
            .and_then(|s| s.get(month.index()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn orders_at(&self, branch: &str, month: Month) -> i64 {
        self.orders
            .get(branch)
            .and_then(|o| o.get(month.index()))
            .copied()
            .unwrap_or(0)
    }
}

/// The canonical dashboard model: branches × months × years of sales and orders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessData {
    pub branches: Vec<String>,
    #[serde(rename = "branchNames")]
    pub branch_names: BTreeMap<String, String>,
    pub months: Vec<String>,
    #[serde(rename = "monthNames")]
    pub month_names: BTreeMap<String, String>,
    #[serde(rename = "deliveryPercentages")]
    pub delivery_percentages: BTreeMap<i32, f64>,
    #[serde(rename = "data2024", skip_serializing_if = "Option::is_none")]
    pub data_2024: Option<YearData>,
    #[serde(rename = "data2025", skip_serializing_if = "Option::is_none")]
    pub data_2025: Option<YearData>,
    #[serde(rename = "userEntries")]
    pub user_entries: Vec<Value>,
}

impl BusinessData {
    /// Build a model for the given branches with every series zero-filled.
    ///
    /// Duplicate branches are kept once, in first-seen order.
    pub fn with_branches<I, S>(branches: I, config: &DashboardConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut model = Self {
            months: Month::ALL.iter().map(|m| m.code().to_string()).collect(),
            month_names: Month::ALL
                .iter()
                .map(|m| (m.code().to_string(), m.full_name().to_string()))
                .collect(),
            delivery_percentages: config.delivery_percentages.clone(),
            data_2024: Some(YearData::default()),
            data_2025: Some(YearData::default()),
            ..Self::default()
        };

        for branch in branches {
            let branch = branch.into();
            if model.branches.contains(&branch) {
                continue;
            }
            model
                .branch_names
                .insert(branch.clone(), config.branch_label(&branch));
            for year in SUPPORTED_YEARS {
                if let Some(data) = model.year_mut(year) {
                    data.allocate(&branch);
                }
            }
            model.branches.push(branch);
        }

        model
    }

    pub fn year(&self, year: i32) -> Option<&YearData> {
        match year {
            2024 => self.data_2024.as_ref(),
            2025 => self.data_2025.as_ref(),
            _ => None,
        }
    }

    pub fn year_mut(&mut self, year: i32) -> Option<&mut YearData> {
        match year {
            2024 => self.data_2024.as_mut(),
            2025 => self.data_2025.as_mut(),
            _ => None,
        }
    }

    /// Top-level JSON object form, the unit of the publisher's shallow merge.
    pub fn to_object(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(serde::ser::Error::custom("model did not serialize to an object")),
        }
    }
}
