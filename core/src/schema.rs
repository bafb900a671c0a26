//! Cross-table column-set comparison

use crate::error::{Result, SurveyrecError};
use crate::table::TableSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column-set differences between the reference and new tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Columns present in the reference but absent from the new table
    pub missing_in_new: Vec<String>,
    /// Columns present in the new table but absent from the reference
    pub extra_in_new: Vec<String>,
    /// Same column set, different order
    pub order_differs: bool,
}

impl SchemaDiff {
    /// Compute the diff between two headers, preserving each side's
    /// column order in the reported lists.
    pub fn between(reference: &TableSnapshot, new: &TableSnapshot) -> Self {
        let ref_set: HashSet<&str> = reference.columns().iter().map(|c| c.as_str()).collect();
        let new_set: HashSet<&str> = new.columns().iter().map(|c| c.as_str()).collect();

        let missing_in_new = reference
            .columns()
            .iter()
            .filter(|c| !new_set.contains(c.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        let extra_in_new = new
            .columns()
            .iter()
            .filter(|c| !ref_set.contains(c.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        let order_differs = missing_in_new.is_empty()
            && extra_in_new.is_empty()
            && reference.columns() != new.columns();

        Self {
            missing_in_new,
            extra_in_new,
            order_differs,
        }
    }

    /// True when both tables carry exactly the same column set (order may
    /// still differ; see [`SchemaDiff::order_differs`]).
    pub fn is_match(&self) -> bool {
        self.missing_in_new.is_empty() && self.extra_in_new.is_empty()
    }

    /// Convert a non-matching diff into the typed strict-mode failure.
    pub fn require_match(&self) -> Result<()> {
        if self.is_match() {
            Ok(())
        } else {
            Err(SurveyrecError::SchemaMismatch {
                missing_in_new: self.missing_in_new.clone(),
                extra_in_new: self.extra_in_new.clone(),
            })
        }
    }

    /// Common columns in reference order.
    pub fn common_columns(reference: &TableSnapshot, new: &TableSnapshot) -> Vec<String> {
        reference
            .columns()
            .iter()
            .filter(|c| new.has_column(c))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(columns: &[&str]) -> TableSnapshot {
        TableSnapshot::new(columns.iter().map(|c| c.to_string()).collect(), vec![]).unwrap()
    }

    #[test]
    fn test_missing_and_extra_columns() {
        let reference = snap(&["ID", "a", "b"]);
        let new = snap(&["ID", "b", "c"]);
        let diff = SchemaDiff::between(&reference, &new);
        assert_eq!(diff.missing_in_new, vec!["a"]);
        assert_eq!(diff.extra_in_new, vec!["c"]);
        assert!(!diff.is_match());
        assert!(diff.require_match().is_err());
    }

    #[test]
    fn test_same_set_different_order() {
        let reference = snap(&["a", "b"]);
        let new = snap(&["b", "a"]);
        let diff = SchemaDiff::between(&reference, &new);
        assert!(diff.is_match());
        assert!(diff.order_differs);
        assert!(diff.require_match().is_ok());
    }

    #[test]
    fn test_common_columns_keep_reference_order() {
        let reference = snap(&["ID", "a", "b", "c"]);
        let new = snap(&["c", "a", "ID"]);
        assert_eq!(
            SchemaDiff::common_columns(&reference, &new),
            vec!["ID", "a", "c"]
        );
    }
}
