//! Pure conversion functions: TOML config structs -> crate API config types.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use gcmeval_evaluate::{DailySources, EvaluateConfig, Point, VariableNames};
use gcmeval_io::{MaskSource, RegionColumns, load_mask, read_region_mask};
use tracing::info;

use crate::config::*;

/// Builds the [`EvaluateConfig`] shared by every table.
pub fn build_evaluate_config(
    config: &GcmevalConfig,
    mask: MaskSource,
    verbose: bool,
) -> Result<EvaluateConfig> {
    let eval = &config.evaluation;
    let built = EvaluateConfig::new(
        &config.paths.ref_dir,
        &config.paths.sim_dir,
        &eval.ref_name,
        &eval.sim_prefix,
        eval.year_start,
        eval.year_end,
    )?
    .with_gcms(eval.gcms.iter().cloned())
    .with_mask(mask)
    .with_verbose(verbose)
    .with_allow_partial(eval.allow_partial);
    Ok(built)
}

/// Converts one `[variables.<name>]` table into [`VariableNames`].
pub fn build_variable_names(var: &str, v: &VariableToml) -> VariableNames {
    let mut names = VariableNames::new(var);
    if let Some(name) = &v.r#ref {
        names = names.with_ref(name);
    }
    if let Some(name) = &v.sim {
        names = names.with_sim(name);
    }
    if let Some(name) = &v.ref_in_nc {
        names = names.with_ref_in_nc(name);
    }
    if let Some(name) = &v.sim_in_nc {
        names = names.with_sim_in_nc(name);
    }
    names
}

/// Name mappings for every configured variable.
pub fn build_variable_mappings(config: &GcmevalConfig) -> BTreeMap<String, VariableNames> {
    config
        .variables
        .iter()
        .map(|(var, v)| (var.clone(), build_variable_names(var, v)))
        .collect()
}

/// Looks up the settings of `var`.
///
/// A variable with no `[variables]` entry uses its own name everywhere and
/// the default statistics and time scales.
pub fn variable_settings(config: &GcmevalConfig, var: &str) -> (VariableNames, VariableToml) {
    match config.variables.get(var) {
        Some(v) => (build_variable_names(var, v), v.clone()),
        None => (VariableNames::new(var), VariableToml::default()),
    }
}

/// Resolves a `[points]` name.
pub fn build_point(config: &GcmevalConfig, name: &str) -> Result<Point> {
    let p = config.points.get(name).ok_or_else(|| {
        let available: Vec<_> = config.points.keys().collect();
        anyhow!("unknown point {name:?} (available: {available:?})")
    })?;
    Ok(Point::new(p.lat, p.lon))
}

/// Daily directory templates; both must be configured.
pub fn build_daily_sources(paths: &PathsToml) -> Result<DailySources> {
    match (&paths.daily_ref_dir, &paths.daily_sim_dir) {
        (Some(ref_dir), Some(sim_dir)) => Ok(DailySources {
            ref_dir: ref_dir.clone(),
            sim_dir: sim_dir.clone(),
        }),
        _ => bail!("daily data needs both [paths].daily_ref_dir and [paths].daily_sim_dir"),
    }
}

/// Builds the mask source for a run.
///
/// Without `region`, the configured mask file (if any) is used as is. With
/// `region`, the region's cells are intersected with the mask file.
pub fn build_mask(config: &GcmevalConfig, region: Option<i64>) -> Result<MaskSource> {
    let Some(region_id) = region else {
        return Ok(config
            .paths
            .mask
            .clone()
            .map_or(MaskSource::None, MaskSource::Path));
    };

    let Some(regions) = &config.regions else {
        bail!("--region {region_id} given but no [regions] section is configured");
    };
    let columns = RegionColumns::new(&regions.id_column, &regions.label_column)
        .with_code(&regions.code_column);
    let region_mask = read_region_mask(
        &regions.file,
        &regions.variable,
        &regions.metadata,
        &columns,
    )
    .with_context(|| format!("failed to read region mask: {}", regions.file.display()))?;

    if region_mask.label_for(region_id).is_none() {
        bail!(
            "region {region_id} is not listed in {}",
            regions.metadata.display()
        );
    }
    info!(
        region_id,
        label = region_mask.label_for(region_id).unwrap_or_default(),
        "using region mask"
    );

    let mut mask = region_mask.mask_for(region_id)?;
    if let Some(path) = &config.paths.mask {
        let land = load_mask(path)
            .with_context(|| format!("failed to read mask: {}", path.display()))?;
        mask = mask.intersect(&land)?;
    }
    Ok(MaskSource::Mask(mask))
}
