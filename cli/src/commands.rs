//! Command implementations for surveyrec CLI

use crate::cli::Commands;
use crate::output::PrettyPrinter;
use anyhow::{bail, Context};
use std::path::Path;
use surveyrec_core::export::{write_report, write_table, ExportFormat};
use surveyrec_core::report::reconcile;
use surveyrec_core::schema::SchemaDiff;
use surveyrec_core::table::TableSnapshot;
use surveyrec_core::transform::Transformer;
use surveyrec_core::Config;

/// Execute a command, returning the process exit code.
pub fn execute_command(command: Commands, config_path: Option<&Path>) -> anyhow::Result<i32> {
    let config = match config_path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load()?,
    };

    match command {
        Commands::Compare {
            reference,
            new,
            key,
            limit,
            strict_schema,
            export,
            top,
            json,
        } => compare_command(
            &config,
            &reference,
            &new,
            key,
            limit,
            strict_schema,
            export.as_deref(),
            top,
            json,
        ),
        Commands::Schema {
            reference,
            new,
            json,
        } => schema_command(&reference, &new, json),
        Commands::Transform {
            input,
            lookup,
            output,
        } => transform_command(&config, &input, lookup.as_deref(), &output),
    }
}

#[allow(clippy::too_many_arguments)]
fn compare_command(
    config: &Config,
    reference_path: &Path,
    new_path: &Path,
    key: Option<String>,
    limit: Option<usize>,
    strict_schema: bool,
    export: Option<&Path>,
    top: usize,
    json: bool,
) -> anyhow::Result<i32> {
    let mut options = config.reconcile.to_options();
    if let Some(key) = key {
        options.key_column = key;
    }
    if let Some(limit) = limit {
        options.limit = limit;
    }
    options.strict_schema = options.strict_schema || strict_schema;

    log::debug!("loading reference from {}", reference_path.display());
    let mut reference = TableSnapshot::from_path(reference_path)?;
    log::debug!("loading new dataset from {}", new_path.display());
    let mut new = TableSnapshot::from_path(new_path)?;
    reference.normalize_key_column(&options.key_column);
    new.normalize_key_column(&options.key_column);

    let report = reconcile(&reference, &new, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        PrettyPrinter::print_report(&report, top);
    }

    if let Some(path) = export {
        let format = ExportFormat::from_extension(path)?;
        write_report(&report, path, format)?;
        if !json {
            println!("Detail exported to {}", path.display());
        }
    }

    Ok(if report.has_discrepancies() { 1 } else { 0 })
}

fn schema_command(reference_path: &Path, new_path: &Path, json: bool) -> anyhow::Result<i32> {
    let reference = TableSnapshot::from_path(reference_path)?;
    let new = TableSnapshot::from_path(new_path)?;
    let diff = SchemaDiff::between(&reference, &new);

    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    } else {
        PrettyPrinter::print_schema_diff(&diff);
    }

    let identical = diff.is_match() && !diff.order_differs;
    Ok(if identical { 0 } else { 1 })
}

fn transform_command(
    config: &Config,
    input_path: &Path,
    lookup_path: Option<&Path>,
    output_path: &Path,
) -> anyhow::Result<i32> {
    let Some(transform_config) = &config.transform else {
        bail!("no [transform] section in the config file; nothing to apply");
    };

    let input = TableSnapshot::from_path(input_path)?;
    let lookup = lookup_path.map(TableSnapshot::from_path).transpose()?;

    let transformer = Transformer::new(transform_config)?;
    let output = transformer.apply(&input, lookup.as_ref())?;
    write_table(&output, output_path)?;

    println!(
        "Wrote {} with {} rows and {} columns",
        output_path.display(),
        output.row_count(),
        output.columns().len()
    );
    Ok(0)
}
