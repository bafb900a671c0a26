//! # surveyrec-core
//!
//! Core library for surveyrec - identifier-aligned reconciliation of
//! survey datasets. Two in-memory tables are aligned on a participant
//! key (duplicate keys expand into stable composite identities,
//! missing keys fall back to positional alignment), compared cell by
//! cell under a null-aware equality policy, and checked for rows
//! present on only one side. The result is one ordered, deterministic
//! sequence of discrepancy records plus a ranked per-column summary.
//!
//! This crate provides the core functionality that can be used by
//! different interfaces (CLI, report pipelines, etc.).

pub mod align;
pub mod classify;
pub mod compare;
pub mod config;
pub mod error;
pub mod export;
pub mod report;
pub mod schema;
pub mod table;
pub mod transform;

// Re-export the most commonly used types for convenience
pub use align::{Alignment, AlignmentMode, KeyAligner, RowIdentity};
pub use compare::{CellComparator, Discrepancy, RowPresenceAnalyzer, ROW_MARKER};
pub use config::Config;
pub use error::{Result, SurveyrecError};
pub use export::{write_report, write_table, ExportFormat};
pub use report::{reconcile, ReconcileOptions, ReconciliationReport, DEFAULT_KEY_COLUMN};
pub use schema::SchemaDiff;
pub use table::{CellValue, TableSnapshot};
pub use transform::{TransformConfig, Transformer};
