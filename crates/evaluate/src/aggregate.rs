//! Multi-source aggregator: read the reference and every GCM and fold the
//! fields into one tidy table.
//!
//! | Function | Files | Reduction | Rows |
//! |----------|-------|-----------|------|
//! | [`gridded_table`] | `_mean.nc` | none | bucket x cell |
//! | [`timeseries_table`] | `_merged.nc` | spatial mean | time step |
//! | [`mean_field_table`] | `_mean.nc` | time mean | bucket x cell |
//! | [`spatiotemporal_table`] | `_merged.nc` | none | time step x cell |
//! | [`climatology_table`] | monthly `_merged.nc` | spatial mean | variable x time step |
//! | [`daily_table`] | raw daily files | nearest cell | day |

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use gcmeval_calendar::{TimeLabel, TimeScale};
use gcmeval_grid::{
    GridError, GriddedField, TimeAxis, mean_over_space, mean_over_time, rename_variable,
    select_nearest, slice_dates, standardize,
};
use gcmeval_io::{read_fields_concat, reference_daily_files, simulation_daily_files};
use tracing::{info, warn};

use crate::config::{EvaluateConfig, Point, VariableNames};
use crate::error::EvaluateError;
use crate::source::{MaskStage, ReadOptions, Source, read_one_source};
use crate::table::{TidyRecord, TidyTable};
use crate::units::UnitConversion;

// ---------------------------------------------------------------------------
// Row construction
// ---------------------------------------------------------------------------

/// Columns shared by every row produced from one field.
struct RowMeta<'a> {
    dataset_type: &'a str,
    statistic: &'a str,
    var: Option<&'a str>,
}

impl RowMeta<'_> {
    fn record(
        &self,
        label: TimeLabel,
        time: Option<NaiveDate>,
        cell: Option<(f64, f64)>,
        value: f64,
    ) -> TidyRecord {
        TidyRecord {
            dataset_type: self.dataset_type.to_string(),
            time_scale: label,
            statistic: self.statistic.to_string(),
            time,
            lat: cell.map(|c| c.0),
            lon: cell.map(|c| c.1),
            var: self.var.map(str::to_string),
            value,
        }
    }
}

/// Label and date of every time step of `field` read at `scale`.
///
/// Dated seasonal rows are labelled with the season of their month, dated
/// monthly rows with their month.
fn step_labels(
    field: &GriddedField,
    scale: TimeScale,
) -> Result<Vec<(TimeLabel, Option<NaiveDate>)>, EvaluateError> {
    let labels = match field.time() {
        TimeAxis::Dates(dates) => dates
            .iter()
            .map(|d| {
                let month = d.month() as u8;
                let label = match scale {
                    TimeScale::Annual => TimeLabel::Annual,
                    TimeScale::Seasonal => TimeLabel::season_of_month(month)?,
                    TimeScale::Monthly => TimeLabel::month(month)?,
                    TimeScale::Daily => TimeLabel::Daily,
                };
                Ok((label, Some(*d)))
            })
            .collect::<Result<Vec<_>, GridError>>()?,
        TimeAxis::Seasons(seasons) => seasons
            .iter()
            .map(|s| (TimeLabel::Season(*s), None))
            .collect(),
        TimeAxis::Months(months) => months
            .iter()
            .map(|m| Ok((TimeLabel::month(*m)?, None)))
            .collect::<Result<Vec<_>, GridError>>()?,
        TimeAxis::Static => match scale {
            TimeScale::Annual => vec![(TimeLabel::Annual, None)],
            TimeScale::Daily => vec![(TimeLabel::Daily, None)],
            TimeScale::Seasonal | TimeScale::Monthly => {
                return Err(GridError::UnexpectedTimeAxis {
                    expected: "season or month",
                    got: field.time().kind(),
                }
                .into());
            }
        },
    };
    Ok(labels)
}

/// One row per time step and cell.
fn push_cells(
    table: &mut TidyTable,
    field: &GriddedField,
    scale: TimeScale,
    meta: &RowMeta<'_>,
    var: &str,
    keep_time: bool,
) -> Result<(), EvaluateError> {
    let values = field.values(var)?;
    for (t, (label, date)) in step_labels(field, scale)?.into_iter().enumerate() {
        let time = if keep_time { date } else { None };
        for (y, &lat) in field.lats().iter().enumerate() {
            for (x, &lon) in field.lons().iter().enumerate() {
                let value = values[field.index(t, y, x)];
                table.push(meta.record(label, time, Some((lat, lon)), value));
            }
        }
    }
    Ok(())
}

/// One row per time step holding the mean over valid cells.
fn push_spatial_means(
    table: &mut TidyTable,
    field: &GriddedField,
    scale: TimeScale,
    meta: &RowMeta<'_>,
    var: &str,
) -> Result<(), EvaluateError> {
    let means = mean_over_space(field, var)?;
    for ((label, date), value) in step_labels(field, scale)?.into_iter().zip(means) {
        table.push(meta.record(label, date, None, value));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Source iteration
// ---------------------------------------------------------------------------

fn sources(config: &EvaluateConfig) -> impl Iterator<Item = Source> + '_ {
    std::iter::once(Source::Reference).chain(config.gcms().iter().cloned().map(Source::Simulation))
}

/// Whether a failed read of `source` is skipped rather than propagated.
fn skip_failure(
    config: &EvaluateConfig,
    source: &Source,
    options: Option<&ReadOptions>,
    err: &EvaluateError,
) -> bool {
    let Source::Simulation(gcm) = source else {
        return false;
    };
    let no_bias = options.is_none_or(|o| o.bias_types().is_empty());
    if config.allow_partial() && no_bias && err.is_missing_input() {
        warn!(gcm = %gcm, error = %err, "skipping GCM with missing input");
        return true;
    }
    false
}

/// Read the reference and then every GCM for one statistic, calling `visit`
/// with each source's dataset type, time scale and main field.
fn for_each_source<F>(
    config: &EvaluateConfig,
    names: &VariableNames,
    statistic: &str,
    time_scales: &[TimeScale],
    options: &ReadOptions,
    mut visit: F,
) -> Result<(), EvaluateError>
where
    F: FnMut(&str, TimeScale, &GriddedField) -> Result<(), EvaluateError>,
{
    for source in sources(config) {
        let fields = match read_one_source(
            config,
            names,
            std::slice::from_ref(&source),
            statistic,
            time_scales,
            options,
        ) {
            Ok(fields) => fields,
            Err(e) if skip_failure(config, &source, Some(options), &e) => continue,
            Err(e) => return Err(e),
        };

        let dataset_type = source.dataset_type(config);
        let key = source.key(config);
        for &scale in time_scales {
            if let Some(field) = fields.get(scale, &key) {
                visit(&dataset_type, scale, field)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Multi-year means per time bucket and grid cell, for boxplots.
///
/// # Errors
///
/// Propagates [`read_one_source`] errors.
pub fn gridded_table(
    config: &EvaluateConfig,
    names: &VariableNames,
    statistics: &[String],
    time_scales: &[TimeScale],
) -> Result<TidyTable, EvaluateError> {
    let options = ReadOptions::mean();
    let mut table = TidyTable::new();
    for statistic in statistics {
        for_each_source(config, names, statistic, time_scales, &options, |dataset_type, scale, field| {
            let meta = RowMeta {
                dataset_type,
                statistic,
                var: None,
            };
            push_cells(&mut table, field, scale, &meta, names.var(), false)
        })?;
    }
    Ok(table)
}

/// Spatial mean of each time step of the merged series.
///
/// With `point`, the series of the nearest cell.
///
/// # Errors
///
/// Propagates [`read_one_source`] errors.
pub fn timeseries_table(
    config: &EvaluateConfig,
    names: &VariableNames,
    statistics: &[String],
    time_scales: &[TimeScale],
    point: Option<Point>,
) -> Result<TidyTable, EvaluateError> {
    let options = ReadOptions::merged().with_point(point);
    let mut table = TidyTable::new();
    for statistic in statistics {
        for_each_source(config, names, statistic, time_scales, &options, |dataset_type, scale, field| {
            let meta = RowMeta {
                dataset_type,
                statistic,
                var: None,
            };
            push_spatial_means(&mut table, field, scale, &meta, names.var())
        })?;
    }
    Ok(table)
}

/// Per-cell means over time: annual files are averaged over all years,
/// seasonal and monthly files per bucket.
///
/// Coordinates are rounded and the point selected before masking.
///
/// # Errors
///
/// Propagates [`read_one_source`] errors.
pub fn mean_field_table(
    config: &EvaluateConfig,
    names: &VariableNames,
    statistics: &[String],
    time_scales: &[TimeScale],
    point: Option<Point>,
) -> Result<TidyTable, EvaluateError> {
    let options = ReadOptions::mean()
        .with_mask_stage(MaskStage::Last)
        .with_point(point);
    let mut table = TidyTable::new();
    for statistic in statistics {
        for_each_source(config, names, statistic, time_scales, &options, |dataset_type, scale, field| {
            let meta = RowMeta {
                dataset_type,
                statistic,
                var: None,
            };
            if scale == TimeScale::Annual {
                let field = mean_over_time(field);
                push_cells(&mut table, &field, scale, &meta, names.var(), false)
            } else {
                push_cells(&mut table, field, scale, &meta, names.var(), false)
            }
        })?;
    }
    Ok(table)
}

/// Every time step of every cell of the merged series.
///
/// # Errors
///
/// Propagates [`read_one_source`] errors.
pub fn spatiotemporal_table(
    config: &EvaluateConfig,
    names: &VariableNames,
    statistics: &[String],
    time_scales: &[TimeScale],
    point: Option<Point>,
) -> Result<TidyTable, EvaluateError> {
    let options = ReadOptions::merged().with_point(point);
    let mut table = TidyTable::new();
    for statistic in statistics {
        for_each_source(config, names, statistic, time_scales, &options, |dataset_type, scale, field| {
            let meta = RowMeta {
                dataset_type,
                statistic,
                var: None,
            };
            push_cells(&mut table, field, scale, &meta, names.var(), true)
        })?;
    }
    Ok(table)
}

/// Spatial mean of each month of the monthly merged series, for several
/// variables at once.
///
/// Rows carry the canonical variable in `var`. Pass the result through
/// [`TidyTable::monthly_climatology`] for one value per month.
///
/// # Errors
///
/// - [`EvaluateError::MissingVariableMapping`] if a variable has no entry in
///   `mappings`.
/// - Propagates [`read_one_source`] errors.
pub fn climatology_table(
    config: &EvaluateConfig,
    variables: &[String],
    mappings: &BTreeMap<String, VariableNames>,
    statistics: &[String],
) -> Result<TidyTable, EvaluateError> {
    let options = ReadOptions::merged();
    let mut table = TidyTable::new();
    for var in variables {
        let names = mappings
            .get(var)
            .ok_or_else(|| EvaluateError::MissingVariableMapping { var: var.clone() })?;
        for statistic in statistics {
            for_each_source(
                config,
                names,
                statistic,
                &[TimeScale::Monthly],
                &options,
                |dataset_type, scale, field| {
                    let meta = RowMeta {
                        dataset_type,
                        statistic,
                        var: Some(names.var()),
                    };
                    push_spatial_means(&mut table, field, scale, &meta, names.var())
                },
            )?;
        }
    }
    Ok(table)
}

/// Where raw daily files live.
///
/// Directory templates may contain `#VAR#` and, for simulations, `#GCM#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySources {
    pub ref_dir: String,
    pub sim_dir: String,
}

/// Daily values at the cell nearest to `point`, for the evaluation period.
///
/// Simulated values are converted to reference units. Rows have an empty
/// statistic.
///
/// # Errors
///
/// - [`EvaluateError::Io`] if no daily files match.
/// - [`EvaluateError::Grid`] if a file lacks the variable or the time axis.
pub fn daily_table(
    config: &EvaluateConfig,
    names: &VariableNames,
    daily: &DailySources,
    point: Point,
) -> Result<TidyTable, EvaluateError> {
    let start = NaiveDate::from_ymd_opt(config.year_start(), 1, 1);
    let end = NaiveDate::from_ymd_opt(config.year_end(), 12, 31);
    let (Some(start), Some(end)) = (start, end) else {
        return Err(EvaluateError::InvalidConfig {
            reason: format!(
                "years {}..{} are out of range",
                config.year_start(),
                config.year_end()
            ),
        });
    };

    let mut table = TidyTable::new();
    for source in sources(config) {
        let read = || -> Result<GriddedField, EvaluateError> {
            let (files, in_nc) = match &source {
                Source::Reference => (
                    reference_daily_files(
                        &daily.ref_dir,
                        names.var_ref(),
                        config.year_start(),
                        config.year_end(),
                    )?,
                    names.var_ref_in_nc(),
                ),
                Source::Simulation(gcm) => (
                    simulation_daily_files(&daily.sim_dir, gcm, names.var_sim())?,
                    names.var_sim_in_nc(),
                ),
            };
            if config.verbose() {
                info!(n_files = files.len(), dataset = %source.dataset_type(config), "reading daily files");
            }
            let field = standardize(read_fields_concat(&files)?);
            let field = rename_variable(field, in_nc, names.var());
            let field = slice_dates(&field, start, end)?;
            let field = select_nearest(&field, point.lat, point.lon)?;
            match (&source, UnitConversion::for_variable(names.var())) {
                (Source::Simulation(_), Some(conversion)) => conversion.convert(field, names.var()),
                _ => Ok(field),
            }
        };

        let field = match read() {
            Ok(field) => field,
            Err(e) if skip_failure(config, &source, None, &e) => continue,
            Err(e) => return Err(e),
        };
        let dataset_type = source.dataset_type(config);
        let meta = RowMeta {
            dataset_type: &dataset_type,
            statistic: "",
            var: None,
        };
        push_cells(&mut table, &field, TimeScale::Daily, &meta, names.var(), true)?;
    }
    Ok(table)
}
