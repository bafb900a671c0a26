//! Row-identity alignment between two tables
//!
//! The aligner builds a single ordered identity space covering both
//! tables. With a usable key column, every row gets a composite identity
//! of (canonical key text, duplicate-occurrence index); unique keys
//! degrade gracefully to occurrence 0, so the composite form is the
//! uniform representation. Without a usable key column the aligner falls
//! back to positional identities over the overlapping row prefix.

use crate::table::TableSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Logical identity of a row, stable across both tables in a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RowIdentity {
    /// Key-based identity: canonical key text plus 0-based rank among rows
    /// sharing that key, in first-seen order
    Key { value: String, occurrence: usize },
    /// 0-based row ordinal, used only in positional fallback mode
    Position(usize),
}

impl RowIdentity {
    /// The identity's key component for display and export: the key text,
    /// or the positional ordinal rendered as text.
    pub fn id_text(&self) -> String {
        match self {
            RowIdentity::Key { value, .. } => value.clone(),
            RowIdentity::Position(pos) => pos.to_string(),
        }
    }
}

/// How the identity space was built; chosen once per run and applied
/// uniformly to both tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum AlignmentMode {
    Keyed { column: String },
    /// Degraded mode: comparison scope is the overlapping prefix of both
    /// tables; rows past the shorter table are not examined
    Positional { rows: usize },
}

/// The unified identity space plus each side's identity-to-row mapping
#[derive(Debug, Clone)]
pub struct Alignment {
    pub mode: AlignmentMode,
    /// Ordered union of identities from both tables, each unique
    pub index: Vec<RowIdentity>,
    ref_rows: HashMap<RowIdentity, usize>,
    new_rows: HashMap<RowIdentity, usize>,
}

impl Alignment {
    /// Row ordinal of the identity in the reference table, if any.
    pub fn ref_row(&self, identity: &RowIdentity) -> Option<usize> {
        self.ref_rows.get(identity).copied()
    }

    /// Row ordinal of the identity in the new table, if any.
    pub fn new_row(&self, identity: &RowIdentity) -> Option<usize> {
        self.new_rows.get(identity).copied()
    }
}

/// Builds the aligned identity space for a pair of tables
pub struct KeyAligner;

impl KeyAligner {
    /// Align two tables on `key_column`. Duplicate keys and keys present
    /// on only one side are structural, never errors. If either table
    /// lacks the key column, falls back to positional identities over
    /// `0..min(rows)`.
    pub fn align(reference: &TableSnapshot, new: &TableSnapshot, key_column: &str) -> Alignment {
        if !reference.has_column(key_column) || !new.has_column(key_column) {
            return Self::align_positional(reference, new);
        }

        let ref_identities = Self::keyed_identities(reference, key_column);
        let new_identities = Self::keyed_identities(new, key_column);

        // Sorted set union, matching the deterministic order the report
        // emission contract requires.
        let union: BTreeSet<RowIdentity> = ref_identities
            .keys()
            .chain(new_identities.keys())
            .cloned()
            .collect();

        Alignment {
            mode: AlignmentMode::Keyed {
                column: key_column.to_string(),
            },
            index: union.into_iter().collect(),
            ref_rows: ref_identities,
            new_rows: new_identities,
        }
    }

    fn align_positional(reference: &TableSnapshot, new: &TableSnapshot) -> Alignment {
        let rows = reference.row_count().min(new.row_count());
        let index: Vec<RowIdentity> = (0..rows).map(RowIdentity::Position).collect();
        let mapping: HashMap<RowIdentity, usize> =
            index.iter().cloned().zip(0..rows).collect();
        Alignment {
            mode: AlignmentMode::Positional { rows },
            index,
            ref_rows: mapping.clone(),
            new_rows: mapping,
        }
    }

    /// Assign each row its composite identity: canonical key text plus the
    /// 0-based first-seen rank within its key group. Null keys render as
    /// empty text and group together like any other duplicate value.
    fn keyed_identities(table: &TableSnapshot, key_column: &str) -> HashMap<RowIdentity, usize> {
        let key_pos = table
            .column_index(key_column)
            .expect("key column checked by caller");
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut identities = HashMap::with_capacity(table.row_count());
        for row in 0..table.row_count() {
            let value = table
                .cell_at(row, key_pos)
                .map(|c| c.canonical_text())
                .unwrap_or_default();
            let occurrence = occurrences.entry(value.clone()).or_insert(0);
            identities.insert(
                RowIdentity::Key {
                    value,
                    occurrence: *occurrence,
                },
                row,
            );
            *occurrence += 1;
        }
        identities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn keyed_table(keys: &[&str]) -> TableSnapshot {
        TableSnapshot::new(
            vec!["ID".into(), "v".into()],
            keys.iter()
                .enumerate()
                .map(|(i, k)| {
                    vec![
                        CellValue::Text(k.to_string()),
                        CellValue::Number(i as f64),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_keys_expand_to_occurrence_indices() {
        let reference = keyed_table(&["A", "A", "B"]);
        let new = keyed_table(&["A", "B", "B"]);
        let alignment = KeyAligner::align(&reference, &new, "ID");

        assert_eq!(
            alignment.index,
            vec![
                RowIdentity::Key { value: "A".into(), occurrence: 0 },
                RowIdentity::Key { value: "A".into(), occurrence: 1 },
                RowIdentity::Key { value: "B".into(), occurrence: 0 },
                RowIdentity::Key { value: "B".into(), occurrence: 1 },
            ]
        );
        let a1 = RowIdentity::Key { value: "A".into(), occurrence: 1 };
        let b1 = RowIdentity::Key { value: "B".into(), occurrence: 1 };
        assert_eq!(alignment.ref_row(&a1), Some(1));
        assert_eq!(alignment.new_row(&a1), None);
        assert_eq!(alignment.ref_row(&b1), None);
        assert_eq!(alignment.new_row(&b1), Some(2));
    }

    #[test]
    fn test_unique_keys_get_occurrence_zero() {
        let reference = keyed_table(&["X", "Y"]);
        let alignment = KeyAligner::align(&reference, &reference, "ID");
        assert!(alignment
            .index
            .iter()
            .all(|id| matches!(id, RowIdentity::Key { occurrence: 0, .. })));
        assert_eq!(alignment.index.len(), 2);
    }

    #[test]
    fn test_positional_fallback_truncates_to_shorter_table() {
        let reference = keyed_table(&["A", "B", "C"]);
        let new = keyed_table(&["A", "B", "C", "D", "E"]);
        let alignment = KeyAligner::align(&reference, &new, "MISSING");

        assert_eq!(alignment.mode, AlignmentMode::Positional { rows: 3 });
        assert_eq!(
            alignment.index,
            vec![
                RowIdentity::Position(0),
                RowIdentity::Position(1),
                RowIdentity::Position(2),
            ]
        );
        // rows 3 and 4 of the longer side are never examined
        assert_eq!(alignment.new_row(&RowIdentity::Position(3)), None);
    }

    #[test]
    fn test_null_keys_group_as_empty_text() {
        let table = TableSnapshot::new(
            vec!["ID".into()],
            vec![vec![CellValue::Null], vec![CellValue::Null]],
        )
        .unwrap();
        let alignment = KeyAligner::align(&table, &table, "ID");
        assert_eq!(
            alignment.index,
            vec![
                RowIdentity::Key { value: "".into(), occurrence: 0 },
                RowIdentity::Key { value: "".into(), occurrence: 1 },
            ]
        );
    }

    #[test]
    fn test_numeric_and_text_keys_share_canonical_text() {
        let reference = TableSnapshot::new(
            vec!["ID".into()],
            vec![vec![CellValue::Number(1001.0)]],
        )
        .unwrap();
        let new = TableSnapshot::new(
            vec!["ID".into()],
            vec![vec![CellValue::Text("1001".into())]],
        )
        .unwrap();
        let alignment = KeyAligner::align(&reference, &new, "ID");
        assert_eq!(alignment.index.len(), 1);
        assert_eq!(alignment.ref_row(&alignment.index[0]), Some(0));
        assert_eq!(alignment.new_row(&alignment.index[0]), Some(0));
    }
}
