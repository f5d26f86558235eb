//! Spectrum command: Fourier spectra of daily point series, one set per
//! dataset, written as JSON.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use gcmeval_evaluate::{TidyTable, daily_table};
use gcmeval_spectral::{SpectralSeries, Spectrum, compute_spectrum};
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::cli::SpectrumArgs;
use crate::config::{FourierToml, GcmevalConfig};
use crate::convert;

/// Spectra of one dataset.
#[derive(Debug, Serialize)]
struct DatasetSpectra {
    dataset_type: String,
    n_days: usize,
    spectra: Vec<Spectrum>,
}

/// Run the spectrum pipeline.
pub fn run(args: SpectrumArgs, verbose: bool) -> Result<()> {
    let _cmd = info_span!("spectrum", var = %args.var, point = %args.point).entered();
    let config = GcmevalConfig::load(&args.config)?;

    let output = args.output.clone().unwrap_or_else(|| {
        config
            .paths
            .output_dir
            .join(format!("spectrum_{}_{}.json", args.var, args.point))
    });
    if output.exists() && !args.force {
        info!(path = %output.display(), "output exists, skipping (use --force to recompute)");
        return Ok(());
    }

    let mask = convert::build_mask(&config, None)?;
    let eval_config = convert::build_evaluate_config(&config, mask, verbose)?;
    let point = convert::build_point(&config, &args.point)?;
    let (names, _) = convert::variable_settings(&config, &args.var);
    let daily = convert::build_daily_sources(&config.paths)?;

    let table = daily_table(&eval_config, &names, &daily, point)?;
    let series = series_by_dataset(&table)?;
    let result = spectra_for(&series, &config.fourier);

    write_json(&result, &output)
}

/// Split a daily table into one dated series per dataset type.
fn series_by_dataset(table: &TidyTable) -> Result<BTreeMap<String, SpectralSeries>> {
    let mut out = BTreeMap::new();
    for dataset_type in table.dataset_types() {
        let mut points: Vec<_> = table
            .filter_dataset(dataset_type)
            .filter_map(|r| r.time.map(|t| (t, r.value)))
            .collect();
        points.sort_by_key(|&(t, _)| t);
        let (times, values) = points.into_iter().unzip();
        let series = SpectralSeries::new(times, values)
            .with_context(|| format!("invalid daily series for {dataset_type}"))?;
        out.insert(dataset_type.to_string(), series);
    }
    Ok(out)
}

fn spectra_for(
    series: &BTreeMap<String, SpectralSeries>,
    fourier: &FourierToml,
) -> Vec<DatasetSpectra> {
    series
        .iter()
        .map(|(dataset_type, s)| {
            let mut spectra = Vec::new();
            for &timestep in &fourier.timesteps {
                for &axis in &fourier.axes {
                    let spectrum = compute_spectrum(s, timestep, axis, fourier.n_top);
                    debug!(
                        dataset_type = %dataset_type,
                        %timestep,
                        %axis,
                        length = spectrum.length(),
                        "spectrum computed"
                    );
                    spectra.push(spectrum);
                }
            }
            DatasetSpectra {
                dataset_type: dataset_type.clone(),
                n_days: s.len(),
                spectra,
            }
        })
        .collect()
}

fn write_json(result: &[DatasetSpectra], output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(result).context("failed to serialise spectra")?;
    std::fs::write(output, json)
        .with_context(|| format!("failed to write JSON: {}", output.display()))?;
    info!(path = %output.display(), datasets = result.len(), "spectra written");
    Ok(())
}
