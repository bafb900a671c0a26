//! Command-line interface for surveyrec

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "surveyrec")]
#[command(about = "Identifier-aligned reconciliation of survey datasets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override config file location (default: surveyrec.toml discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile a generated dataset against a reference dataset
    Compare {
        /// Reference dataset (expected values)
        reference: PathBuf,

        /// New dataset (actual values)
        new: PathBuf,

        /// Key column to align rows on
        #[arg(long)]
        key: Option<String>,

        /// Maximum number of discrepancies to keep (0 = unlimited)
        #[arg(long)]
        limit: Option<usize>,

        /// Fail when the column sets differ instead of comparing the
        /// common columns
        #[arg(long)]
        strict_schema: bool,

        /// Export the discrepancy table (.csv or .json)
        #[arg(long)]
        export: Option<PathBuf>,

        /// Number of summary rows to print
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare only the column sets of two datasets
    Schema {
        /// Reference dataset
        reference: PathBuf,

        /// New dataset
        new: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remap a raw survey export onto the canonical schema
    Transform {
        /// Raw input dataset
        input: PathBuf,

        /// Roster table joined on the participant id
        #[arg(long)]
        lookup: Option<PathBuf>,

        /// Where to write the transformed dataset (CSV)
        #[arg(long, short)]
        output: PathBuf,
    },
}
