//! Report and table export
//!
//! Discrepancy reports render to the four-column `ID,COLUMN,EXPECTED,
//! ACTUAL` table (CSV) or to the full report structure (JSON).
//! Transformed snapshots can be written back to CSV so a transform run
//! is materialized for later reconciliation.

use crate::error::{Result, SurveyrecError};
use crate::report::ReconciliationReport;
use crate::table::TableSnapshot;
use std::path::Path;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Determine format from file extension.
    pub fn from_extension(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(ExportFormat::Csv),
            Some("json") => Ok(ExportFormat::Json),
            Some(ext) => Err(SurveyrecError::invalid_input(format!(
                "Unsupported export extension: {ext}"
            ))),
            None => Err(SurveyrecError::invalid_input("No file extension provided")),
        }
    }
}

/// Write a reconciliation report to `path` in the given format.
pub fn write_report(
    report: &ReconciliationReport,
    path: &Path,
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(["ID", "COLUMN", "EXPECTED", "ACTUAL"])?;
            for record in &report.records {
                writer.write_record([
                    record.identity.id_text(),
                    record.column.clone(),
                    record.expected.canonical_text(),
                    record.actual.canonical_text(),
                ])?;
            }
            writer.flush()?;
        }
        ExportFormat::Json => {
            let file = std::fs::File::create(path)?;
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), report)?;
        }
    }
    Ok(())
}

/// Write a table snapshot to CSV, cells in canonical text (null renders
/// empty, integral numbers without a fractional part).
pub fn write_table(table: &TableSnapshot, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.canonical_text()))?;
    }
    writer.flush()?;
    Ok(())
}
