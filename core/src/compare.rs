//! Cell-level comparison and row-presence analysis
//!
//! A discrepancy IS the reporting mechanism for data mismatches: cells
//! that differ become cell discrepancies, rows that exist on only one
//! side become row-presence discrepancies, and neither condition is an
//! error. Structural gaps are reported exactly once — an identity absent
//! (or all-null) on either side is excluded from cell comparison and
//! surfaces only through its row-presence record.

use crate::align::{Alignment, AlignmentMode, RowIdentity};
use crate::table::{CellValue, TableSnapshot};
use serde::{Deserialize, Serialize};

/// Column marker carried by row-presence discrepancies
pub const ROW_MARKER: &str = "__ROW__";

/// Sentinel pair for rows present in the reference but missing in new
pub const ROW_PRESENT_IN_REF: &str = "ROW_PRESENT_IN_REF";
pub const MISSING_IN_NEW: &str = "MISSING_IN_NEW";

/// Sentinel pair for rows present in new but missing in the reference
pub const MISSING_IN_REF: &str = "MISSING_IN_REF";
pub const ROW_PRESENT_IN_NEW: &str = "ROW_PRESENT_IN_NEW";

/// One cell-level or row-level difference between the two tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub identity: RowIdentity,
    /// Column name, or [`ROW_MARKER`] for row-presence records
    pub column: String,
    /// Value on the reference side
    pub expected: CellValue,
    /// Value on the new side
    pub actual: CellValue,
}

impl Discrepancy {
    pub fn is_row_presence(&self) -> bool {
        self.column == ROW_MARKER
    }
}

/// Per-identity presence flags for both sides, parallel to the aligned
/// index
#[derive(Debug, Clone)]
pub struct RowPresence {
    pub in_ref: Vec<bool>,
    pub in_new: Vec<bool>,
}

impl RowPresence {
    /// Present on both sides, i.e. eligible for cell comparison.
    pub fn on_both_sides(&self, index_pos: usize) -> bool {
        self.in_ref[index_pos] && self.in_new[index_pos]
    }
}

/// Determines which identities exist on only one side
pub struct RowPresenceAnalyzer;

impl RowPresenceAnalyzer {
    /// Compute presence for every identity in the aligned index. An
    /// identity is present in a table when that table has a row for it
    /// AND at least one non-key column of that row is non-null; an
    /// all-null row counts as absent, matching reindex semantics.
    pub fn analyze(
        reference: &TableSnapshot,
        new: &TableSnapshot,
        alignment: &Alignment,
    ) -> RowPresence {
        let key = match &alignment.mode {
            AlignmentMode::Keyed { column } => Some(column.as_str()),
            AlignmentMode::Positional { .. } => None,
        };
        let mut in_ref = Vec::with_capacity(alignment.index.len());
        let mut in_new = Vec::with_capacity(alignment.index.len());
        for identity in &alignment.index {
            in_ref.push(Self::present(reference, alignment.ref_row(identity), key));
            in_new.push(Self::present(new, alignment.new_row(identity), key));
        }
        RowPresence { in_ref, in_new }
    }

    fn present(table: &TableSnapshot, row: Option<usize>, key: Option<&str>) -> bool {
        let Some(row) = row else {
            return false;
        };
        let key_pos = key.and_then(|k| table.column_index(k));
        table
            .row(row)
            .map(|cells| {
                cells
                    .iter()
                    .enumerate()
                    .any(|(pos, cell)| Some(pos) != key_pos && !cell.is_null())
            })
            .unwrap_or(false)
    }

    /// Emit the row-presence discrepancies: all missing-in-new records in
    /// aligned order, then all missing-in-ref records in aligned order.
    pub fn missing_records(presence: &RowPresence, alignment: &Alignment) -> Vec<Discrepancy> {
        let mut records = Vec::new();
        for (pos, identity) in alignment.index.iter().enumerate() {
            if presence.in_ref[pos] && !presence.in_new[pos] {
                records.push(Discrepancy {
                    identity: identity.clone(),
                    column: ROW_MARKER.to_string(),
                    expected: CellValue::Text(ROW_PRESENT_IN_REF.to_string()),
                    actual: CellValue::Text(MISSING_IN_NEW.to_string()),
                });
            }
        }
        for (pos, identity) in alignment.index.iter().enumerate() {
            if presence.in_new[pos] && !presence.in_ref[pos] {
                records.push(Discrepancy {
                    identity: identity.clone(),
                    column: ROW_MARKER.to_string(),
                    expected: CellValue::Text(MISSING_IN_REF.to_string()),
                    actual: CellValue::Text(ROW_PRESENT_IN_NEW.to_string()),
                });
            }
        }
        records
    }
}

/// Computes per-cell discrepancies over the aligned identity space
pub struct CellComparator;

impl CellComparator {
    /// Compare every common column (key column excluded) column-major:
    /// for each column in reference order, walk the aligned index and
    /// emit a discrepancy wherever the two cells are not equal under the
    /// null-aware policy. Identities that are not present on both sides
    /// are skipped; their gap is already a row-presence discrepancy.
    pub fn compare(
        reference: &TableSnapshot,
        new: &TableSnapshot,
        alignment: &Alignment,
        presence: &RowPresence,
        common_columns: &[String],
    ) -> Vec<Discrepancy> {
        let key = match &alignment.mode {
            AlignmentMode::Keyed { column } => Some(column.as_str()),
            AlignmentMode::Positional { .. } => None,
        };
        let mut discrepancies = Vec::new();
        for column in common_columns {
            if Some(column.as_str()) == key {
                continue;
            }
            let ref_pos = match reference.column_index(column) {
                Some(pos) => pos,
                None => continue,
            };
            let new_pos = match new.column_index(column) {
                Some(pos) => pos,
                None => continue,
            };
            for (index_pos, identity) in alignment.index.iter().enumerate() {
                if !presence.on_both_sides(index_pos) {
                    continue;
                }
                let expected = alignment
                    .ref_row(identity)
                    .and_then(|row| reference.cell_at(row, ref_pos))
                    .cloned()
                    .unwrap_or(CellValue::Null);
                let actual = alignment
                    .new_row(identity)
                    .and_then(|row| new.cell_at(row, new_pos))
                    .cloned()
                    .unwrap_or(CellValue::Null);
                if !expected.same_as(&actual) {
                    discrepancies.push(Discrepancy {
                        identity: identity.clone(),
                        column: column.clone(),
                        expected,
                        actual,
                    });
                }
            }
        }
        discrepancies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::KeyAligner;
    use crate::schema::SchemaDiff;

    fn snap(columns: &[&str], rows: Vec<Vec<CellValue>>) -> TableSnapshot {
        TableSnapshot::new(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    fn run(
        reference: &TableSnapshot,
        new: &TableSnapshot,
        key: &str,
    ) -> (Vec<Discrepancy>, Vec<Discrepancy>) {
        let alignment = KeyAligner::align(reference, new, key);
        let presence = RowPresenceAnalyzer::analyze(reference, new, &alignment);
        let cells = CellComparator::compare(
            reference,
            new,
            &alignment,
            &presence,
            &SchemaDiff::common_columns(reference, new),
        );
        let rows = RowPresenceAnalyzer::missing_records(&presence, &alignment);
        (cells, rows)
    }

    #[test]
    fn test_identical_tables_produce_nothing() {
        let t = snap(
            &["ID", "a"],
            vec![vec!["1".into(), "x".into()], vec!["2".into(), "y".into()]],
        );
        let (cells, rows) = run(&t, &t, "ID");
        assert!(cells.is_empty());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_cell_mismatch_reports_expected_and_actual() {
        let reference = snap(&["ID", "a"], vec![vec!["1".into(), "x".into()]]);
        let new = snap(&["ID", "a"], vec![vec!["1".into(), "y".into()]]);
        let (cells, rows) = run(&reference, &new, "ID");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].column, "a");
        assert_eq!(cells[0].expected, CellValue::Text("x".into()));
        assert_eq!(cells[0].actual, CellValue::Text("y".into()));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_null_on_one_side_is_a_discrepancy() {
        let reference = snap(
            &["ID", "a", "b"],
            vec![vec!["1".into(), CellValue::Null, "k".into()]],
        );
        let new = snap(
            &["ID", "a", "b"],
            vec![vec!["1".into(), "x".into(), "k".into()]],
        );
        let (cells, _) = run(&reference, &new, "ID");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].column, "a");
        assert_eq!(cells[0].expected, CellValue::Null);
    }

    #[test]
    fn test_no_type_coercion_between_text_and_number() {
        let reference = snap(&["ID", "a"], vec![vec!["1".into(), CellValue::Number(9.0)]]);
        let new = snap(&["ID", "a"], vec![vec!["1".into(), "9".into()]]);
        let (cells, _) = run(&reference, &new, "ID");
        assert_eq!(cells.len(), 1);
    }

    #[test]
    fn test_one_sided_rows_become_presence_records_not_cell_records() {
        let reference = snap(
            &["ID", "a"],
            vec![
                vec!["A".into(), "1".into()],
                vec!["A".into(), "2".into()],
                vec!["B".into(), "3".into()],
            ],
        );
        let new = snap(
            &["ID", "a"],
            vec![
                vec!["A".into(), "1".into()],
                vec!["B".into(), "3".into()],
                vec!["B".into(), "4".into()],
            ],
        );
        let (cells, rows) = run(&reference, &new, "ID");
        // (A,1) only in reference, (B,1) only in new; no cell records for
        // either gap
        assert!(cells.is_empty());
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].identity,
            RowIdentity::Key { value: "A".into(), occurrence: 1 }
        );
        assert_eq!(rows[0].expected, CellValue::Text(ROW_PRESENT_IN_REF.into()));
        assert_eq!(rows[0].actual, CellValue::Text(MISSING_IN_NEW.into()));
        assert_eq!(
            rows[1].identity,
            RowIdentity::Key { value: "B".into(), occurrence: 1 }
        );
        assert_eq!(rows[1].expected, CellValue::Text(MISSING_IN_REF.into()));
        assert_eq!(rows[1].actual, CellValue::Text(ROW_PRESENT_IN_NEW.into()));
    }

    #[test]
    fn test_all_null_row_counts_as_absent() {
        let reference = snap(
            &["ID", "a"],
            vec![vec!["1".into(), CellValue::Null]],
        );
        let new = snap(&["ID", "a"], vec![vec!["1".into(), "x".into()]]);
        let (cells, rows) = run(&reference, &new, "ID");
        // the gap is reported once, as a row record
        assert!(cells.is_empty());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].expected, CellValue::Text(MISSING_IN_REF.into()));
    }

    #[test]
    fn test_positional_fallback_compares_overlapping_prefix_only() {
        let reference = snap(
            &["a"],
            vec![vec!["x".into()], vec!["y".into()], vec!["z".into()]],
        );
        let new = snap(
            &["a"],
            vec![
                vec!["x".into()],
                vec!["q".into()],
                vec!["z".into()],
                vec!["extra1".into()],
                vec!["extra2".into()],
            ],
        );
        let (cells, rows) = run(&reference, &new, "ID");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].identity, RowIdentity::Position(1));
        // rows 3 and 4 of the longer table are outside the comparison scope
        assert!(rows.is_empty());
    }

    #[test]
    fn test_symmetry_swaps_expected_and_actual() {
        let reference = snap(
            &["ID", "a"],
            vec![vec!["1".into(), "x".into()], vec!["2".into(), "w".into()]],
        );
        let new = snap(&["ID", "a"], vec![vec!["1".into(), "y".into()]]);

        let (cells_fwd, rows_fwd) = run(&reference, &new, "ID");
        let (cells_rev, rows_rev) = run(&new, &reference, "ID");

        assert_eq!(cells_fwd.len(), cells_rev.len());
        assert_eq!(cells_fwd[0].expected, cells_rev[0].actual);
        assert_eq!(cells_fwd[0].actual, cells_rev[0].expected);

        assert_eq!(rows_fwd.len(), 1);
        assert_eq!(rows_rev.len(), 1);
        assert_eq!(rows_fwd[0].identity, rows_rev[0].identity);
        assert_eq!(rows_fwd[0].actual, CellValue::Text(MISSING_IN_NEW.into()));
        assert_eq!(rows_rev[0].expected, CellValue::Text(MISSING_IN_REF.into()));
    }
}
