use super::CliError;
use super::helpers::{SubstringPairing, discover_grid_files, load_plan, pair_grid_files};
use super::loaders::{FallbackGridLoader, GridLoader};
use anyhow::Context;
use rastercmp_core::common::constants::SUMMARY_PRECISION;
use rastercmp_core::domain::{CompareError, require_grids};
use rastercmp_core::modules::agreement::{RoundingPolicy, compare_all};
use rastercmp_core::modules::report::{
    AgreementRow, AgreementTable, render_agreement_table, render_similarity_report,
};
use rastercmp_core::modules::serialization::write_text_artifact;
use rastercmp_core::modules::similarity::analyze;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(clap::Args)]
pub(super) struct AgreementArgs {
    /// Directory holding the serial and kernel grids
    #[arg(long, default_value = "../tiffs")]
    grids_dir: PathBuf,

    /// Directory that receives one CSV table per configuration
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// File name pattern of the grids to compare
    #[arg(long, default_value = "*.tif")]
    pattern: String,

    /// JSON comparison plan (defaults to the six standard configurations)
    #[arg(long)]
    plan: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct SimilarityArgs {
    /// First grid (normalization reference for the percent difference)
    grid_a: PathBuf,

    /// Second grid
    grid_b: PathBuf,

    /// Coordinate reported regardless of discrepancies, as ROW,COL
    #[arg(long, value_parser = parse_probe)]
    probe: Option<(usize, usize)>,

    /// JSON comparison plan supplying similarity settings
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_probe(value: &str) -> Result<(usize, usize), String> {
    let (row, col) = value
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{}'", value))?;
    let row = row
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid row '{}'", row.trim()))?;
    let col = col
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid column '{}'", col.trim()))?;
    Ok((row, col))
}

pub(super) fn run_agreement_command(args: AgreementArgs) -> Result<i32, CliError> {
    let plan = load_plan(args.plan.as_deref())?;

    if !args.grids_dir.is_dir() {
        return Err(CliError::Compare(CompareError::input_validation(
            "INPUT.GRIDS_DIR",
            format!("grid directory '{}' was not found", args.grids_dir.display()),
        )));
    }

    let files = discover_grid_files(&args.grids_dir, &args.pattern)?;
    if files.is_empty() {
        println!(
            "No files matching '{}' found in '{}'.",
            args.pattern,
            args.grids_dir.display()
        );
        return Ok(0);
    }
    info!(count = files.len(), dir = %args.grids_dir.display(), "found grid files");

    let pairs = pair_grid_files(&files, &SubstringPairing::default());
    let loader = FallbackGridLoader::default();
    let mut tables = plan
        .configurations
        .iter()
        .copied()
        .map(AgreementTable::new)
        .collect::<Vec<_>>();

    for pair in &pairs {
        let kernel_name = pair.kernel_name();
        let serial_name = pair.serial_name();
        info!(kernel = %kernel_name, serial = %serial_name, case = %pair.case_id, "comparing");

        let kernel_grid = loader
            .load(&pair.kernel_path)
            .inspect_err(|error| warn!(%error, "kernel grid unavailable"))
            .ok();
        let serial_grid = loader
            .load(&pair.serial_path)
            .inspect_err(|error| warn!(%error, "serial grid unavailable"))
            .ok();
        let (kernel_grid, serial_grid) =
            match require_grids(kernel_grid.as_ref(), serial_grid.as_ref()) {
                Ok(grids) => grids,
                Err(error) => {
                    warn!(kernel = %kernel_name, %error, "skipping pair");
                    continue;
                }
            };

        let results = compare_all(kernel_grid, serial_grid, &plan.configurations)
            .map_err(CliError::Compare)?;
        for (table, (config, result)) in tables.iter_mut().zip(&results) {
            debug!(
                %config,
                mismatches = result.mismatch_count,
                total = result.total_cells,
                median = result.median_abs_diff,
                "agreement computed"
            );
            table
                .rows
                .push(AgreementRow::new(&kernel_name, &serial_name, result));
        }
    }

    if tables.iter().all(|table| table.rows.is_empty()) {
        println!("No comparisons were performed.");
        return Ok(0);
    }

    println!("Results written to:");
    for table in &tables {
        let path = args.output_dir.join(table.file_name());
        write_text_artifact(&path, &table.to_csv()).map_err(|source| {
            CliError::Compare(CompareError::io_system(
                "IO.TABLE_WRITE",
                format!("failed to write agreement table '{}': {}", path.display(), source),
            ))
        })?;
        println!("  - {}", path.display());
    }

    for policy in [RoundingPolicy::Floor, RoundingPolicy::Round] {
        let summary = tables.iter().find(|table| {
            table.config.policy == policy && table.config.precision == SUMMARY_PRECISION
        });
        if let Some(table) = summary {
            println!();
            println!("{}", render_agreement_table(table));
        }
    }

    Ok(0)
}

pub(super) fn run_similarity_command(args: SimilarityArgs) -> Result<i32, CliError> {
    let plan = load_plan(args.plan.as_deref())?;
    let loader = FallbackGridLoader::default();

    let grid_a = loader
        .load(&args.grid_a)
        .map_err(|error| CliError::Compare(error.into()))?;
    let grid_b = loader
        .load(&args.grid_b)
        .map_err(|error| CliError::Compare(error.into()))?;

    let report =
        analyze(&grid_a, &grid_b, &plan.similarity, args.probe).map_err(CliError::Compare)?;

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{}", rendered);
    } else {
        println!("{}", render_similarity_report(&report));
    }
    Ok(0)
}
