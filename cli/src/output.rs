//! Output formatting utilities

use surveyrec_core::align::AlignmentMode;
use surveyrec_core::report::ReconciliationReport;
use surveyrec_core::schema::SchemaDiff;

/// Pretty printer for surveyrec output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a full reconciliation report: schema section, discrepancy
    /// table, ranked summary.
    pub fn print_report(report: &ReconciliationReport, top: usize) {
        match &report.mode {
            AlignmentMode::Keyed { column } => {
                println!("🔍 Reconciliation aligned on '{column}'");
            }
            AlignmentMode::Positional { rows } => {
                println!("🔍 Reconciliation by position (degraded mode)");
                println!("   No usable key column; comparing the first {rows} row(s) only");
            }
        }

        Self::print_schema_section(&report.schema);

        if !report.has_discrepancies() {
            println!("└─ ✅ Cells and rows: all reconciled ({} identities)", report.aligned_identities);
            return;
        }

        println!(
            "├─ ❌ Discrepancies: {} ({} cell, {} missing in new, {} missing in reference)",
            report.total_discrepancies(),
            report.cell_count,
            report.missing_in_new,
            report.missing_in_ref
        );

        println!("├─ {:<20} {:<24} {:<20} {:<20}", "ID", "COLUMN", "EXPECTED", "ACTUAL");
        for record in &report.records {
            println!(
                "│  {:<20} {:<24} {:<20} {:<20}",
                record.identity.id_text(),
                record.column,
                record.expected.canonical_text(),
                record.actual.canonical_text()
            );
        }
        if report.truncated {
            println!(
                "│  ... ({} more not shown; raise --limit or export for the full detail)",
                report.total_discrepancies() - report.records.len()
            );
        }

        println!("└─ Top columns by discrepancy count:");
        let shown = report.summary.iter().take(top);
        let last = report.summary.len().min(top);
        for (i, entry) in shown.enumerate() {
            let prefix = if i + 1 == last { "   └─" } else { "   ├─" };
            println!("{} {}: {}", prefix, entry.column, entry.count);
        }
    }

    fn print_schema_section(diff: &SchemaDiff) {
        if diff.is_match() && !diff.order_differs {
            println!("├─ ✅ Columns: identical (same set and order)");
        } else {
            Self::print_schema_lines(diff, "├─ ");
        }
    }

    /// Print a standalone column-set diff.
    pub fn print_schema_diff(diff: &SchemaDiff) {
        if diff.is_match() && !diff.order_differs {
            println!("✅ Columns: identical (same set and order)");
        } else {
            Self::print_schema_lines(diff, "");
        }
    }

    fn print_schema_lines(diff: &SchemaDiff, prefix: &str) {
        if !diff.missing_in_new.is_empty() {
            println!(
                "{prefix}❌ Missing in new ({}): {}",
                diff.missing_in_new.len(),
                diff.missing_in_new.join(", ")
            );
        }
        if !diff.extra_in_new.is_empty() {
            println!(
                "{prefix}❌ Extra in new ({}): {}",
                diff.extra_in_new.len(),
                diff.extra_in_new.join(", ")
            );
        }
        if diff.order_differs {
            println!("{prefix}⚠️  Same column set but the order differs");
        }
    }
}
