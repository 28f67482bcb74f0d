//! Export of the current model and generation of the blank import template.

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use serde_json::{Map, Value};
use std::path::Path;

use crate::config::DashboardConfig;
use crate::error::{ExportError, ExportResult};
use crate::models::{Month, SUPPORTED_YEARS};
use crate::state::DashboardState;
use crate::transform::REQUIRED_COLUMNS;

/// Sheet name used by the template workbook.
pub const TEMPLATE_SHEET: &str = "Data";

/// Branch used for the template's placeholder rows.
pub const TEMPLATE_BRANCH: &str = "Hamdan";

/// A file ready to be offered as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Serialize a model as indented JSON.
pub fn export_json(model: &Map<String, Value>) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(model)?)
}

/// `<brand-slug>-data-<YYYY-MM-DD>.json`
pub fn export_file_name(config: &DashboardConfig, date: NaiveDate) -> String {
    format!("{}-data-{}.json", config.brand_slug(), date.format("%Y-%m-%d"))
}

/// `<brand-slug>-template.xlsx`
pub fn template_file_name(config: &DashboardConfig) -> String {
    format!("{}-template.xlsx", config.brand_slug())
}

/// Export the whole current model, named for `date`.
pub fn export_state(
    state: &DashboardState,
    config: &DashboardConfig,
    date: NaiveDate,
) -> ExportResult<ExportFile> {
    let model = state.current().ok_or(ExportError::NoData)?;
    Ok(ExportFile {
        file_name: export_file_name(config, date),
        content_type: "application/json",
        bytes: export_json(model)?.into_bytes(),
    })
}

/// Build the blank import template as `.xlsx` bytes.
///
/// One sheet with the five import columns and a zeroed placeholder row per
/// month of the first supported year.
pub fn template_workbook() -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET)?;

    for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }

    for (i, month) in Month::ALL.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, TEMPLATE_BRANCH)?;
        sheet.write_string(row, 1, month.code())?;
        sheet.write_number(row, 2, SUPPORTED_YEARS[0])?;
        sheet.write_number(row, 3, 0)?;
        sheet.write_number(row, 4, 0)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Template as a download.
pub fn template_file(config: &DashboardConfig) -> ExportResult<ExportFile> {
    Ok(ExportFile {
        file_name: template_file_name(config),
        content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        bytes: template_workbook()?,
    })
}

/// Write a download to disk.
pub fn save(file: &ExportFile, path: &Path) -> ExportResult<()> {
    std::fs::write(path, &file.bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BusinessData;
    use crate::parser::decode_workbook;
    use crate::state::RenderHooks;
    use crate::transform::transform_table;

    #[test]
    fn test_file_names() {
        let config = DashboardConfig::default();
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(export_file_name(&config, date), "crispy-chicken-data-2025-03-09.json");
        assert_eq!(template_file_name(&config), "crispy-chicken-template.xlsx");
    }

    #[test]
    fn test_export_without_data() {
        let err = export_state(
            &DashboardState::new(),
            &DashboardConfig::default(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::NoData));
    }

    #[test]
    fn test_export_is_indented_json() {
        let config = DashboardConfig::default();
        let mut state = DashboardState::new();
        let model = BusinessData::with_branches(["Hamdan"], &config);
        state.publish(model.to_object().unwrap(), &RenderHooks::none());

        let file = export_state(&state, &config, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).unwrap();
        let text = String::from_utf8(file.bytes).unwrap();
        assert!(text.starts_with("{\n  \""));
        assert_eq!(file.content_type, "application/json");

        let back: BusinessData = serde_json::from_str(&text).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_template_reimports() {
        let bytes = template_workbook().unwrap();
        let table = decode_workbook(&bytes).unwrap();

        assert_eq!(table.header, REQUIRED_COLUMNS.map(String::from).to_vec());
        assert_eq!(table.rows.len(), 12);

        let out = transform_table(&table, &DashboardConfig::default()).unwrap();
        assert_eq!(out.model.branches, vec![TEMPLATE_BRANCH]);
        assert_eq!(out.applied, 12);
        assert!(out.skipped.is_empty());
    }
}
