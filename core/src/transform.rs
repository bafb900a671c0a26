//! Config-driven remapping of raw survey exports onto a canonical schema
//!
//! The transform is peripheral glue in front of the reconciliation
//! engine: it renames heterogeneous source columns to canonical
//! destinations, filters incomplete responses, joins a roster lookup on
//! the normalized participant id, and runs the derive rules that add
//! classification columns. The source-to-destination mapping is
//! externally supplied configuration, never a hard-coded table; a null
//! destination drops the source column.

use crate::classify;
use crate::error::{Result, SurveyrecError};
use crate::table::{CellValue, TableSnapshot};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Keep only rows whose `column` equals `equals` (canonical text match)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub equals: String,
}

/// Participant identifier handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySpec {
    #[serde(default = "default_key_column")]
    pub column: String,
    /// Strip non-digits from the identifier (document numbers arrive
    /// with prefixes and punctuation)
    #[serde(default = "default_true")]
    pub digits_only: bool,
}

fn default_key_column() -> String {
    crate::report::DEFAULT_KEY_COLUMN.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for KeySpec {
    fn default() -> Self {
        Self {
            column: default_key_column(),
            digits_only: true,
        }
    }
}

/// Left join of a roster table on the normalized key; matched lookup
/// columns overwrite the mapped values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Key column name inside the lookup table
    #[serde(default = "default_key_column")]
    pub key_column: String,
    /// Lookup columns to carry into the output
    pub columns: Vec<String>,
}

/// Post-mapping enrichment, applied in configuration order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DeriveRule {
    /// Generation label from a birth-year column
    Generation { source: String, target: String },
    /// Net-promoter band from a 0-10 score column
    NetPromoter { source: String, target: String },
    /// Trim/uppercase/collapse a free-text column in place
    CleanLabel { column: String },
    /// Copy one output column into another
    Copy { source: String, target: String },
    /// Fill a column with a fixed value
    Constant {
        column: String,
        value: String,
        #[serde(default)]
        only_if_null: bool,
    },
}

/// Full transform description, deserialized from `surveyrec.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Canonical output header, order-significant
    pub output_columns: Vec<String>,
    /// Source name -> destination name; a null destination drops the
    /// source column
    #[serde(default)]
    pub mapping: IndexMap<String, Option<String>>,
    #[serde(default)]
    pub filter: Option<RowFilter>,
    #[serde(default)]
    pub key: KeySpec,
    #[serde(default)]
    pub lookup: Option<LookupConfig>,
    #[serde(default)]
    pub derive: Vec<DeriveRule>,
}

/// Applies a [`TransformConfig`] to raw input tables
pub struct Transformer<'a> {
    config: &'a TransformConfig,
}

impl<'a> Transformer<'a> {
    pub fn new(config: &'a TransformConfig) -> Result<Self> {
        if config.output_columns.is_empty() {
            return Err(SurveyrecError::invalid_input(
                "transform output_columns must not be empty",
            ));
        }
        let known: std::collections::HashSet<&str> =
            config.output_columns.iter().map(|c| c.as_str()).collect();
        for destination in config.mapping.values().flatten() {
            if !known.contains(destination.as_str()) {
                return Err(SurveyrecError::invalid_input(format!(
                    "mapping destination '{destination}' is not an output column"
                )));
            }
        }
        Ok(Self { config })
    }

    /// Transform a raw export into a canonical-schema snapshot. The
    /// optional `lookup` table is left-joined on the normalized key;
    /// rows whose key finds no lookup match are kept and logged.
    pub fn apply(
        &self,
        input: &TableSnapshot,
        lookup: Option<&TableSnapshot>,
    ) -> Result<TableSnapshot> {
        let config = self.config;
        let out_pos: HashMap<&str, usize> = config
            .output_columns
            .iter()
            .enumerate()
            .map(|(pos, name)| (name.as_str(), pos))
            .collect();
        let key_out = out_pos.get(config.key.column.as_str()).copied();
        let lookup_index = self.build_lookup_index(lookup)?;

        let mut rows = Vec::new();
        let mut unmatched = 0usize;
        for row in 0..input.row_count() {
            if let Some(filter) = &config.filter {
                let keep = input
                    .cell(row, &filter.column)
                    .map(|c| c.canonical_text() == filter.equals)
                    .unwrap_or(false);
                if !keep {
                    continue;
                }
            }

            let mut out = vec![CellValue::Null; config.output_columns.len()];
            for (source, destination) in &config.mapping {
                let Some(destination) = destination else {
                    continue; // dropped source column
                };
                if let Some(cell) = input.cell(row, source) {
                    out[out_pos[destination.as_str()]] = cell.clone();
                }
            }

            // normalize the participant id before the lookup join
            if let Some(pos) = key_out {
                out[pos] = self.normalize_key(&out[pos]);
            }

            if let (Some((lookup_table, index)), Some(spec)) =
                (lookup_index.as_ref(), config.lookup.as_ref())
            {
                let key_text = key_out
                    .map(|pos| out[pos].canonical_text())
                    .unwrap_or_default();
                match index.get(key_text.as_str()) {
                    Some(&lookup_row) => {
                        for column in &spec.columns {
                            if let (Some(&pos), Some(cell)) = (
                                out_pos.get(column.as_str()),
                                lookup_table.cell(lookup_row, column),
                            ) {
                                out[pos] = cell.clone();
                            }
                        }
                    }
                    None => unmatched += 1,
                }
            }

            self.apply_derive_rules(&mut out, &out_pos);
            rows.push(out);
        }

        if unmatched > 0 {
            log::warn!("{unmatched} row(s) found no match in the lookup table");
        }

        TableSnapshot::new(config.output_columns.clone(), rows)
    }

    fn normalize_key(&self, value: &CellValue) -> CellValue {
        if self.config.key.digits_only {
            classify::normalize_digits(value)
        } else if value.is_null() {
            CellValue::Null
        } else {
            CellValue::Text(value.canonical_text())
        }
    }

    /// Normalized key text -> first matching lookup row.
    #[allow(clippy::type_complexity)]
    fn build_lookup_index<'t>(
        &self,
        lookup: Option<&'t TableSnapshot>,
    ) -> Result<Option<(&'t TableSnapshot, HashMap<String, usize>)>> {
        let (Some(table), Some(spec)) = (lookup, self.config.lookup.as_ref()) else {
            return Ok(None);
        };
        let key_pos = table.column_index(&spec.key_column).ok_or_else(|| {
            SurveyrecError::invalid_input(format!(
                "lookup table has no '{}' column",
                spec.key_column
            ))
        })?;
        let mut index = HashMap::new();
        for row in 0..table.row_count() {
            let key = self.normalize_key(table.cell_at(row, key_pos).unwrap_or(&CellValue::Null));
            if key.is_null() {
                continue;
            }
            // first match wins
            index.entry(key.canonical_text()).or_insert(row);
        }
        Ok(Some((table, index)))
    }

    fn apply_derive_rules(&self, out: &mut [CellValue], out_pos: &HashMap<&str, usize>) {
        for rule in &self.config.derive {
            match rule {
                DeriveRule::Generation { source, target } => {
                    if let (Some(&src), Some(&dst)) =
                        (out_pos.get(source.as_str()), out_pos.get(target.as_str()))
                    {
                        out[dst] = match classify::generation_label(&out[src]) {
                            Some(label) => CellValue::Text(label.to_string()),
                            None => CellValue::Null,
                        };
                    } else {
                        log::warn!("generation rule references unknown column(s)");
                    }
                }
                DeriveRule::NetPromoter { source, target } => {
                    if let (Some(&src), Some(&dst)) =
                        (out_pos.get(source.as_str()), out_pos.get(target.as_str()))
                    {
                        out[dst] = match classify::net_promoter_class(&out[src]) {
                            Some(label) => CellValue::Text(label.to_string()),
                            None => CellValue::Null,
                        };
                    } else {
                        log::warn!("net_promoter rule references unknown column(s)");
                    }
                }
                DeriveRule::CleanLabel { column } => {
                    if let Some(&pos) = out_pos.get(column.as_str()) {
                        out[pos] = classify::clean_label(&out[pos]);
                    } else {
                        log::warn!("clean_label rule references unknown column '{column}'");
                    }
                }
                DeriveRule::Copy { source, target } => {
                    if let (Some(&src), Some(&dst)) =
                        (out_pos.get(source.as_str()), out_pos.get(target.as_str()))
                    {
                        out[dst] = out[src].clone();
                    } else {
                        log::warn!("copy rule references unknown column(s)");
                    }
                }
                DeriveRule::Constant {
                    column,
                    value,
                    only_if_null,
                } => {
                    if let Some(&pos) = out_pos.get(column.as_str()) {
                        if !only_if_null || out[pos].is_null() {
                            out[pos] = CellValue::Text(value.clone());
                        }
                    } else {
                        log::warn!("constant rule references unknown column '{column}'");
                    }
                }
            }
        }
    }
}
