//! Lenient numeric coercion for spreadsheet cells.
//!
//! Text cells contribute their leading numeric prefix (`"12.5 kg"` → 12.5);
//! anything without one is `None`. Callers decide the fallback.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Cell;

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("valid float regex")
});

static INT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+").expect("valid int regex"));

/// Coerce a cell to a finite float.
pub fn coerce_float(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => FLOAT_PREFIX.find(s.trim_start())?.as_str().parse().ok()?,
        Cell::Empty | Cell::Bool(_) => return None,
    };
    value.is_finite().then_some(value)
}

/// Coerce a cell to an integer, truncating toward zero.
pub fn coerce_int(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(n.trunc() as i64),
        Cell::Text(s) => INT_PREFIX.find(s.trim_start())?.as_str().parse().ok(),
        _ => None,
    }
}

/// Sales amount, 0 when missing or non-numeric.
pub fn sales(cell: &Cell) -> f64 {
    coerce_float(cell).unwrap_or(0.0)
}

/// Order count, 0 when missing or non-numeric.
pub fn orders(cell: &Cell) -> i64 {
    coerce_int(cell).unwrap_or(0)
}

/// Calendar year, `None` when missing, non-numeric or out of `i32` range.
pub fn year(cell: &Cell) -> Option<i32> {
    coerce_int(cell).and_then(|y| i32::try_from(y).ok())
}
