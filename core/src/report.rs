//! Reconciliation engine entry point and report aggregation

use crate::align::{AlignmentMode, KeyAligner};
use crate::compare::{CellComparator, Discrepancy, RowPresenceAnalyzer};
use crate::error::Result;
use crate::schema::SchemaDiff;
use crate::table::TableSnapshot;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default participant identifier column
pub const DEFAULT_KEY_COLUMN: &str = "ID";

/// Configuration surface consumed by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Key column to align on; positional fallback when absent from
    /// either table
    pub key_column: String,
    /// Maximum number of records kept in the report; 0 = unlimited. The
    /// summary is always computed over the full untruncated sequence.
    pub limit: usize,
    /// Fail with a typed SchemaMismatch instead of comparing common
    /// columns when the column sets differ
    pub strict_schema: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            limit: 0,
            strict_schema: false,
        }
    }
}

/// Discrepancy count for one column, ranked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnCount {
    pub column: String,
    pub count: usize,
}

/// Complete output of one reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub mode: AlignmentMode,
    pub schema: SchemaDiff,
    /// Cell discrepancies column-major, then missing-in-new rows, then
    /// missing-in-ref rows; possibly truncated (see `truncated`)
    pub records: Vec<Discrepancy>,
    /// Per-column discrepancy counts, descending, first-seen order on
    /// ties; always covers the full untruncated record sequence
    pub summary: Vec<ColumnCount>,
    pub aligned_identities: usize,
    pub cell_count: usize,
    pub missing_in_new: usize,
    pub missing_in_ref: usize,
    pub truncated: bool,
}

impl ReconciliationReport {
    pub fn total_discrepancies(&self) -> usize {
        self.cell_count + self.missing_in_new + self.missing_in_ref
    }

    pub fn has_discrepancies(&self) -> bool {
        self.total_discrepancies() > 0
    }

    /// Build the ordered report from the two discrepancy streams.
    fn build(
        mode: AlignmentMode,
        schema: SchemaDiff,
        aligned_identities: usize,
        cells: Vec<Discrepancy>,
        rows: Vec<Discrepancy>,
        limit: usize,
    ) -> Self {
        let cell_count = cells.len();
        let missing_in_new = rows
            .iter()
            .filter(|r| {
                matches!(&r.actual, crate::table::CellValue::Text(t) if t == crate::compare::MISSING_IN_NEW)
            })
            .count();
        let missing_in_ref = rows.len() - missing_in_new;

        let mut records = cells;
        records.extend(rows);

        let summary = Self::summarize(&records);

        let truncated = limit > 0 && records.len() > limit;
        if truncated {
            records.truncate(limit);
        }

        Self {
            mode,
            schema,
            records,
            summary,
            aligned_identities,
            cell_count,
            missing_in_new,
            missing_in_ref,
            truncated,
        }
    }

    /// Rank columns by discrepancy count, descending; ties keep the
    /// first-seen column order of the record sequence.
    fn summarize(records: &[Discrepancy]) -> Vec<ColumnCount> {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for record in records {
            *counts.entry(record.column.as_str()).or_insert(0) += 1;
        }
        let mut ranked: Vec<ColumnCount> = counts
            .into_iter()
            .map(|(column, count)| ColumnCount {
                column: column.to_string(),
                count,
            })
            .collect();
        // stable sort keeps insertion (first-seen) order within equal counts
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }
}

/// Run the full reconciliation: schema diff, key alignment, row-presence
/// analysis, cell comparison, aggregation. Pure with respect to its
/// inputs; independent runs can proceed in parallel.
pub fn reconcile(
    reference: &TableSnapshot,
    new: &TableSnapshot,
    options: &ReconcileOptions,
) -> Result<ReconciliationReport> {
    let schema = SchemaDiff::between(reference, new);
    if options.strict_schema {
        schema.require_match()?;
    }

    let alignment = KeyAligner::align(reference, new, &options.key_column);
    let presence = RowPresenceAnalyzer::analyze(reference, new, &alignment);
    let common = SchemaDiff::common_columns(reference, new);
    let cells = CellComparator::compare(reference, new, &alignment, &presence, &common);
    let rows = RowPresenceAnalyzer::missing_records(&presence, &alignment);

    Ok(ReconciliationReport::build(
        alignment.mode.clone(),
        schema,
        alignment.index.len(),
        cells,
        rows,
        options.limit,
    ))
}
