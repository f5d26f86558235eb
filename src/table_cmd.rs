//! Table command: build one tidy table and write it as CSV.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use gcmeval_evaluate::{
    TidyTable, climatology_table, daily_table, gridded_table, mean_field_table,
    spatiotemporal_table, timeseries_table,
};
use tracing::{info, info_span};

use crate::cli::{TableArgs, TableKind};
use crate::config::GcmevalConfig;
use crate::convert;

/// Run the table pipeline.
pub fn run(args: TableArgs, verbose: bool) -> Result<()> {
    let _cmd = info_span!("table", kind = args.kind.file_stem()).entered();
    let config = GcmevalConfig::load(&args.config)?;

    if args.kind != TableKind::Climatology && args.vars.len() != 1 {
        bail!(
            "the {} table takes exactly one --var, got {}",
            args.kind.file_stem(),
            args.vars.len()
        );
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&config, &args));
    if output.exists() && !args.force {
        info!(path = %output.display(), "output exists, skipping (use --force to recompute)");
        return Ok(());
    }

    let mask = convert::build_mask(&config, args.region)?;
    let eval_config = convert::build_evaluate_config(&config, mask, verbose)?;
    let point = args
        .point
        .as_deref()
        .map(|name| convert::build_point(&config, name))
        .transpose()?;

    let table = match args.kind {
        TableKind::Climatology => {
            let mappings = convert::build_variable_mappings(&config);
            let statistics = &config.evaluation.climatology_statistics;
            let monthly = climatology_table(&eval_config, &args.vars, &mappings, statistics)?;
            monthly.monthly_climatology()
        }
        TableKind::Daily => {
            let Some(point) = point else {
                bail!("the daily table needs --point");
            };
            let (names, _) = convert::variable_settings(&config, &args.vars[0]);
            let daily = convert::build_daily_sources(&config.paths)?;
            daily_table(&eval_config, &names, &daily, point)?
        }
        kind => {
            let (names, settings) = convert::variable_settings(&config, &args.vars[0]);
            let statistics = &settings.statistics;
            let scales = &settings.time_scales;
            match kind {
                TableKind::Boxplot => {
                    if point.is_some() {
                        bail!("the boxplot table does not take --point");
                    }
                    gridded_table(&eval_config, &names, statistics, scales)?
                }
                TableKind::Timeseries => {
                    timeseries_table(&eval_config, &names, statistics, scales, point)?
                }
                TableKind::MeanField => {
                    mean_field_table(&eval_config, &names, statistics, scales, point)?
                }
                _ => spatiotemporal_table(&eval_config, &names, statistics, scales, point)?,
            }
        }
    };

    write_table(&table, &output)
}

/// `<output_dir>/<kind>_<vars>[_<point>][_region<id>].csv`
fn default_output(config: &GcmevalConfig, args: &TableArgs) -> PathBuf {
    let mut name = format!("{}_{}", args.kind.file_stem(), args.vars.join("-"));
    if let Some(point) = &args.point {
        name.push('_');
        name.push_str(point);
    }
    if let Some(region) = args.region {
        name.push_str(&format!("_region{region}"));
    }
    name.push_str(".csv");
    config.paths.output_dir.join(name)
}

fn write_table(table: &TidyTable, output: &std::path::Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    table
        .write_csv_path(output)
        .with_context(|| format!("failed to write CSV: {}", output.display()))?;
    info!(
        path = %output.display(),
        rows = table.len(),
        datasets = table.dataset_types().len(),
        "table written"
    );
    Ok(())
}
