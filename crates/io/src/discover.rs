//! Raw-file discovery and multi-file reads.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gcmeval_grid::{GriddedField, concat_time, select_variable, slice_dates, standardize};
use glob::Pattern;
use tracing::{debug, warn};

use crate::error::IoError;
use crate::netcdf_read::read_field;

/// Placeholder replaced by the on-disk variable name in directory templates.
pub const VAR_PLACEHOLDER: &str = "#VAR#";

/// Placeholder replaced by the GCM id in directory templates.
pub const GCM_PLACEHOLDER: &str = "#GCM#";

/// Substitute `#VAR#` and, when given, `#GCM#` in a directory template.
pub fn fill_placeholders(template: &str, var: &str, gcm: Option<&str>) -> String {
    let filled = template.replace(VAR_PLACEHOLDER, var);
    match gcm {
        Some(gcm) => filled.replace(GCM_PLACEHOLDER, gcm),
        None => filled,
    }
}

/// Find per-year reference files matching `*{var}*{year}*.nc` in the
/// directory template, for every year of `year_start..=year_end`.
///
/// Years without a match are skipped with a warning.
///
/// # Errors
///
/// - [`IoError::Pattern`] if the resulting pattern is malformed.
/// - [`IoError::NoFilesMatched`] if no year matches any file.
pub fn reference_daily_files(
    dir_template: &str,
    var: &str,
    year_start: i32,
    year_end: i32,
) -> Result<Vec<PathBuf>, IoError> {
    let dir = fill_placeholders(dir_template, var, None);
    let mut files = Vec::new();
    for year in year_start..=year_end {
        let pattern = file_pattern(&dir, &format!("*{}*{year}*.nc", Pattern::escape(var)));
        let found = glob_sorted(&pattern)?;
        if found.is_empty() {
            warn!(year, pattern = %pattern, "no reference files for year");
        }
        files.extend(found);
    }
    if files.is_empty() {
        return Err(IoError::NoFilesMatched {
            pattern: file_pattern(&dir, &format!("*{var}*{{{year_start}..{year_end}}}*.nc")),
        });
    }
    Ok(files)
}

/// Find simulation files matching `*{var}*.nc` in the directory template
/// after substituting `gcm` and `var`.
///
/// # Errors
///
/// - [`IoError::Pattern`] if the resulting pattern is malformed.
/// - [`IoError::NoFilesMatched`] if nothing matches.
pub fn simulation_daily_files(
    dir_template: &str,
    gcm: &str,
    var: &str,
) -> Result<Vec<PathBuf>, IoError> {
    let dir = fill_placeholders(dir_template, var, Some(gcm));
    let pattern = file_pattern(&dir, &format!("*{}*.nc", Pattern::escape(var)));
    let files = glob_sorted(&pattern)?;
    if files.is_empty() {
        return Err(IoError::NoFilesMatched { pattern });
    }
    Ok(files)
}

fn file_pattern(dir: &str, name_pattern: &str) -> String {
    let escaped = Pattern::escape(dir);
    Path::new(&escaped)
        .join(name_pattern)
        .to_string_lossy()
        .into_owned()
}

fn glob_sorted(pattern: &str) -> Result<Vec<PathBuf>, IoError> {
    let paths = glob::glob(pattern).map_err(|e| IoError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    let mut files: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
    files.sort();
    debug!(pattern, matched = files.len(), "globbed files");
    Ok(files)
}

/// Read several files and concatenate them along time, sorted by date.
///
/// # Errors
///
/// - [`IoError::NoFilesMatched`] if `paths` is empty.
/// - Any [`read_field`](crate::read_field) error.
/// - [`IoError::Grid`] if the files do not share one grid or variable set.
pub fn read_fields_concat(paths: &[PathBuf]) -> Result<GriddedField, IoError> {
    if paths.is_empty() {
        return Err(IoError::NoFilesMatched {
            pattern: "(empty file list)".to_string(),
        });
    }
    let parts = paths
        .iter()
        .map(|p| read_field(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(concat_time(parts)?)
}

/// Read a time window of one variable from several files, as used for
/// animations.
///
/// Files are concatenated along time, sliced to `start..=end`, given
/// standard dimension names, and reduced to `var`.
///
/// # Errors
///
/// Propagates [`read_fields_concat`] errors, and returns [`IoError::Grid`]
/// if `var` is missing.
pub fn read_time_slice(
    files: &[PathBuf],
    start: NaiveDate,
    end: NaiveDate,
    var: &str,
) -> Result<GriddedField, IoError> {
    let field = read_fields_concat(files)?;
    let field = slice_dates(&field, start, end)?;
    let field = standardize(field);
    Ok(select_variable(&field, var)?)
}
