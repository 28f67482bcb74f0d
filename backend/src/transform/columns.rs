//! Header resolution.
//!
//! The header row is resolved once per file into a [`ColumnMap`]; data rows
//! are then read positionally through it.

use crate::error::SchemaError;
use crate::models::{Cell, FlatRecord};

use super::coerce;

/// Columns every import must declare, in template order.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Branch", "Month", "Year", "Sales", "Orders"];

/// Position of each required column in the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub branch: usize,
    pub month: usize,
    pub year: usize,
    pub sales: usize,
    pub orders: usize,
}

impl ColumnMap {
    /// Resolve column positions from header labels.
    ///
    /// Labels match exactly after trimming. When a label repeats, the last
    /// occurrence wins. Extra columns are ignored.
    pub fn resolve(header: &[String]) -> Result<Self, SchemaError> {
        let find = |name: &str| header.iter().rposition(|h| h.trim() == name);

        let positions: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|c| find(c)).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.to_string())
            .collect();

        match positions.as_slice() {
            [Some(branch), Some(month), Some(year), Some(sales), Some(orders)] => Ok(Self {
                branch: *branch,
                month: *month,
                year: *year,
                sales: *sales,
                orders: *orders,
            }),
            _ => Err(SchemaError::MissingColumns(missing)),
        }
    }

    /// Decode one data row. Cells beyond the end of a short row read as empty.
    pub fn record(&self, row: usize, cells: &[Cell]) -> FlatRecord {
        let empty = Cell::Empty;
        let at = |idx: usize| cells.get(idx).unwrap_or(&empty);

        FlatRecord {
            row,
            branch: at(self.branch)
                .to_text()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            month: at(self.month)
                .to_text()
                .map(|m| m.trim().to_string())
                .unwrap_or_default(),
            year: coerce::year(at(self.year)),
            sales: coerce::sales(at(self.sales)),
            orders: coerce::orders(at(self.orders)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_resolve_template_order() {
        let map = ColumnMap::resolve(&header(&REQUIRED_COLUMNS)).unwrap();
        assert_eq!(
            map,
            ColumnMap { branch: 0, month: 1, year: 2, sales: 3, orders: 4 }
        );
    }

    #[test]
    fn test_resolve_any_order_with_extras() {
        let map =
            ColumnMap::resolve(&header(&["Notes", "Orders", " Year ", "Month", "Sales", "Branch"]))
                .unwrap();
        assert_eq!(map.branch, 5);
        assert_eq!(map.orders, 1);
        assert_eq!(map.year, 2);
    }

    #[test]
    fn test_resolve_missing_columns() {
        let err = ColumnMap::resolve(&header(&["Branch", "Month", "Year"])).unwrap_err();
        let SchemaError::MissingColumns(missing) = err;
        assert_eq!(missing, vec!["Sales", "Orders"]);
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        assert!(ColumnMap::resolve(&header(&["branch", "Month", "Year", "Sales", "Orders"])).is_err());
    }

    #[test]
    fn test_short_row_reads_empty() {
        let map = ColumnMap::resolve(&header(&REQUIRED_COLUMNS)).unwrap();
        let record = map.record(2, &[Cell::from("Hamdan"), Cell::from("Jan")]);

        assert_eq!(record.branch.as_deref(), Some("Hamdan"));
        assert_eq!(record.month, "Jan");
        assert_eq!(record.year, None);
        assert_eq!(record.sales, 0.0);
        assert_eq!(record.orders, 0);
    }

    #[test]
    fn test_numeric_branch_rendered_as_text() {
        let map = ColumnMap::resolve(&header(&REQUIRED_COLUMNS)).unwrap();
        let record = map.record(
            2,
            &[Cell::Number(101.0), "Feb".into(), 2024.into(), "99.5".into(), 4.into()],
        );
        assert_eq!(record.branch.as_deref(), Some("101"));
        assert_eq!(record.year, Some(2024));
        assert_eq!(record.sales, 99.5);
        assert_eq!(record.orders, 4);
    }
}
