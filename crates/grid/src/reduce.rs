//! Temporal and spatial reductions, selections and concatenation.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use gcmeval_calendar::Season;
use gcmeval_stats::nan_mean_iter;

use crate::error::GridError;
use crate::field::{GriddedField, TimeAxis, Variable};

// ---------------------------------------------------------------------------
// Temporal grouping
// ---------------------------------------------------------------------------

/// Average each cell over the time steps of each season.
///
/// The output axis lists the seasons present in the input, in calendar order
/// (DJF, MAM, JJA, SON). All December, January and February steps pool into
/// one DJF bucket regardless of year.
///
/// # Errors
///
/// Returns [`GridError::UnexpectedTimeAxis`] unless the field has a
/// [`TimeAxis::Dates`] axis.
pub fn group_by_season(field: &GriddedField) -> Result<GriddedField, GridError> {
    let dates = field.time().dates()?;
    let mut groups: BTreeMap<Season, Vec<usize>> = BTreeMap::new();
    for (t, d) in dates.iter().enumerate() {
        let season = Season::from_month(d.month() as u8)?;
        groups.entry(season).or_default().push(t);
    }
    let seasons = groups.keys().copied().collect();
    let members: Vec<Vec<usize>> = groups.into_values().collect();
    Ok(reduce_time(field, &members, TimeAxis::Seasons(seasons)))
}

/// Average each cell over the time steps of each calendar month.
///
/// The output axis lists the months present in the input, ascending.
///
/// # Errors
///
/// Returns [`GridError::UnexpectedTimeAxis`] unless the field has a
/// [`TimeAxis::Dates`] axis.
pub fn group_by_month(field: &GriddedField) -> Result<GriddedField, GridError> {
    let dates = field.time().dates()?;
    let mut groups: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (t, d) in dates.iter().enumerate() {
        groups.entry(d.month() as u8).or_default().push(t);
    }
    let months = groups.keys().copied().collect();
    let members: Vec<Vec<usize>> = groups.into_values().collect();
    Ok(reduce_time(field, &members, TimeAxis::Months(months)))
}

/// Average each cell over all time steps, producing a static field.
///
/// Missing values are skipped; a cell missing at every step stays missing.
pub fn mean_over_time(field: &GriddedField) -> GriddedField {
    let all: Vec<usize> = (0..field.n_time()).collect();
    reduce_time(field, &[all], TimeAxis::Static)
}

fn reduce_time(field: &GriddedField, groups: &[Vec<usize>], axis: TimeAxis) -> GriddedField {
    let n_cells = field.n_cells();
    let variables = field
        .variables()
        .iter()
        .map(|(name, var)| {
            let src = var.values();
            let mut out = Vec::with_capacity(groups.len() * n_cells);
            for members in groups {
                for c in 0..n_cells {
                    out.push(nan_mean_iter(members.iter().map(|&t| src[t * n_cells + c])));
                }
            }
            (name.clone(), Variable::new(out, var.units().map(str::to_string)))
        })
        .collect();
    field.rebuild(axis, field.lats().to_vec(), field.lons().to_vec(), variables)
}

// ---------------------------------------------------------------------------
// Spatial reduction and selection
// ---------------------------------------------------------------------------

/// Mean of `var` over all grid cells, one value per time slice.
///
/// Masked cells are skipped; a slice with no valid cell yields `NaN`.
///
/// # Errors
///
/// Returns [`GridError::MissingVariable`] if the field has no such variable.
pub fn mean_over_space(field: &GriddedField, var: &str) -> Result<Vec<f64>, GridError> {
    let values = field.values(var)?;
    let n_cells = field.n_cells();
    if n_cells == 0 {
        return Ok(vec![f64::NAN; field.n_time()]);
    }
    Ok(values
        .chunks(n_cells)
        .map(|slice| nan_mean_iter(slice.iter().copied()))
        .collect())
}

/// Reduce the field to the single grid cell nearest to `(lat, lon)`.
///
/// Nearest is decided independently along each axis by absolute distance;
/// the first of two equidistant coordinates wins.
///
/// # Errors
///
/// Returns [`GridError::EmptyGrid`] if the field has no latitude or
/// longitude points.
pub fn select_nearest(field: &GriddedField, lat: f64, lon: f64) -> Result<GriddedField, GridError> {
    let y = nearest_index(field.lats(), lat).ok_or(GridError::EmptyGrid)?;
    let x = nearest_index(field.lons(), lon).ok_or(GridError::EmptyGrid)?;
    let variables = field
        .variables()
        .iter()
        .map(|(name, var)| {
            let src = var.values();
            let out = (0..field.n_time())
                .map(|t| src[field.index(t, y, x)])
                .collect();
            (name.clone(), Variable::new(out, var.units().map(str::to_string)))
        })
        .collect();
    Ok(field.rebuild(
        field.time().clone(),
        vec![field.lats()[y]],
        vec![field.lons()[x]],
        variables,
    ))
}

fn nearest_index(coords: &[f64], target: f64) -> Option<usize> {
    coords
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &c)| {
            let d = (c - target).abs();
            match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((i, d)),
            }
        })
        .map(|(i, _)| i)
}

/// Keep only `var`, dropping every other gridded variable.
///
/// # Errors
///
/// Returns [`GridError::MissingVariable`] if the field has no such variable.
pub fn select_variable(field: &GriddedField, var: &str) -> Result<GriddedField, GridError> {
    let kept = field
        .variable(var)
        .cloned()
        .ok_or_else(|| GridError::MissingVariable {
            name: var.to_string(),
        })?;
    let variables = BTreeMap::from([(var.to_string(), kept)]);
    Ok(field.rebuild(
        field.time().clone(),
        field.lats().to_vec(),
        field.lons().to_vec(),
        variables,
    ))
}

/// Apply `f` to every value of `var`, leaving other variables untouched.
///
/// # Errors
///
/// Returns [`GridError::MissingVariable`] if the field has no such variable.
pub fn map_values(
    mut field: GriddedField,
    var: &str,
    f: impl Fn(f64) -> f64,
) -> Result<GriddedField, GridError> {
    let target = field
        .variables_mut()
        .get_mut(var)
        .ok_or_else(|| GridError::MissingVariable {
            name: var.to_string(),
        })?;
    for v in target.values_mut().iter_mut() {
        *v = f(*v);
    }
    Ok(field)
}

// ---------------------------------------------------------------------------
// Time slicing and concatenation
// ---------------------------------------------------------------------------

/// Keep the time steps with `start <= date <= end`.
///
/// # Errors
///
/// Returns [`GridError::UnexpectedTimeAxis`] unless the field has a
/// [`TimeAxis::Dates`] axis.
pub fn slice_dates(
    field: &GriddedField,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<GriddedField, GridError> {
    let dates = field.time().dates()?;
    let keep: Vec<usize> = dates
        .iter()
        .enumerate()
        .filter(|(_, d)| **d >= start && **d <= end)
        .map(|(t, _)| t)
        .collect();
    let kept_dates = keep.iter().map(|&t| dates[t]).collect();
    Ok(take_time(field, &keep, TimeAxis::Dates(kept_dates)))
}

fn take_time(field: &GriddedField, steps: &[usize], axis: TimeAxis) -> GriddedField {
    let n_cells = field.n_cells();
    let variables = field
        .variables()
        .iter()
        .map(|(name, var)| {
            let src = var.values();
            let mut out = Vec::with_capacity(steps.len() * n_cells);
            for &t in steps {
                out.extend_from_slice(&src[t * n_cells..(t + 1) * n_cells]);
            }
            (name.clone(), Variable::new(out, var.units().map(str::to_string)))
        })
        .collect();
    field.rebuild(axis, field.lats().to_vec(), field.lons().to_vec(), variables)
}

/// Concatenate dated fields along time and sort the result by date.
///
/// All parts must share one grid. The variables of the first part define the
/// output; each must be present in every other part.
///
/// # Errors
///
/// - [`GridError::EmptyGrid`] if `parts` is empty.
/// - [`GridError::UnexpectedTimeAxis`] if a part is not dated.
/// - [`GridError::CoordinateMismatch`] if the parts' grids differ.
/// - [`GridError::MissingVariable`] if a part lacks one of the first part's
///   variables.
pub fn concat_time(parts: Vec<GriddedField>) -> Result<GriddedField, GridError> {
    let Some(first) = parts.first() else {
        return Err(GridError::EmptyGrid);
    };

    let mut dates: Vec<NaiveDate> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if part.lats() != first.lats() {
            return Err(GridError::CoordinateMismatch {
                dim: first.lat_dim().to_string(),
                reason: format!("part {i} has a different latitude axis"),
            });
        }
        if part.lons() != first.lons() {
            return Err(GridError::CoordinateMismatch {
                dim: first.lon_dim().to_string(),
                reason: format!("part {i} has a different longitude axis"),
            });
        }
        dates.extend_from_slice(part.time().dates()?);
    }

    let n_cells = first.n_cells();
    let mut variables = BTreeMap::new();
    for (name, var) in first.variables() {
        let mut values = Vec::with_capacity(dates.len() * n_cells);
        for part in &parts {
            values.extend_from_slice(part.values(name)?);
        }
        variables.insert(
            name.clone(),
            Variable::new(values, var.units().map(str::to_string)),
        );
    }
    let joined = first.rebuild(
        TimeAxis::Dates(dates.clone()),
        first.lats().to_vec(),
        first.lons().to_vec(),
        variables,
    );

    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&t| dates[t]);
    let sorted_dates = order.iter().map(|&t| dates[t]).collect();
    Ok(take_time(&joined, &order, TimeAxis::Dates(sorted_dates)))
}
