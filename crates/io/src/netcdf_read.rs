//! NetCDF extraction into [`GriddedField`]s.

use std::path::Path;

use chrono::{Datelike, NaiveDate, TimeDelta};
use gcmeval_grid::{GriddedField, TimeAxis};
use netcdf::AttributeValue;
use tracing::debug;

use crate::error::IoError;

/// Names tried, in order, for the latitude coordinate.
const LAT_NAMES: &[&str] = &["lat", "latitude", "y"];

/// Names tried, in order, for the longitude coordinate.
const LON_NAMES: &[&str] = &["lon", "longitude", "x"];

/// Name of the time coordinate.
const TIME_NAME: &str = "time";

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

/// Read every gridded variable of a NetCDF file into one [`GriddedField`].
///
/// - Latitude and longitude are found under `lat`/`latitude`/`y` and
///   `lon`/`longitude`/`x`; the names found are kept as the field's
///   dimension names so that [`standardize`](gcmeval_grid::standardize) can
///   canonicalise them later.
/// - A `time` coordinate with CF `"<unit> since <date>"` units becomes a
///   [`TimeAxis::Dates`] axis; files without one are [`TimeAxis::Static`].
/// - Variables dimensioned `(time, lat, lon)` or `(lat, lon)` are gridded
///   (2-D variables are repeated over every time step); everything else
///   numeric, such as `time_bnds`, is kept as an auxiliary variable.
/// - `_FillValue` / `missing_value` cells are replaced by `NaN`.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] if `path` does not exist.
/// - [`IoError::MissingVariable`] if no latitude or longitude coordinate is
///   present.
/// - [`IoError::InvalidTime`] if the time units or calendar are unsupported.
pub fn read_field(path: &Path) -> Result<GriddedField, IoError> {
    let file = open_file(path)?;

    let lat_name = find_coordinate(&file, LAT_NAMES, path)?;
    let lon_name = find_coordinate(&file, LON_NAMES, path)?;
    let lats = read_1d_f64(&file, &[lat_name], path)?;
    let lons = read_1d_f64(&file, &[lon_name], path)?;
    let time = read_time_axis(&file, path)?;
    let n_time = time.len();
    let has_time = matches!(time, TimeAxis::Dates(_));

    let mut field = GriddedField::new(time, lats, lons).with_dim_names(lat_name, lon_name);

    for var in file.variables() {
        let name = var.name();
        if name == lat_name || name == lon_name || name == TIME_NAME {
            continue;
        }
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let dims: Vec<&str> = dims.iter().map(String::as_str).collect();

        let is_3d = has_time && dims == [TIME_NAME, lat_name, lon_name];
        let is_2d = dims == [lat_name, lon_name];

        let mut values = match var.get_values::<f64, _>(..) {
            Ok(v) => v,
            Err(e) => {
                debug!(variable = %name, error = %e, "skipping non-numeric variable");
                continue;
            }
        };
        mask_fill_values(&var, &mut values);

        if is_3d || is_2d {
            if is_2d && n_time > 1 {
                values = values.repeat(n_time);
            }
            let units = string_attribute(&var, "units");
            field = field.with_variable(name, values, units)?;
        } else {
            field = field.with_auxiliary(name, values);
        }
    }

    debug!(
        path = %path.display(),
        n_time,
        n_lat = field.lats().len(),
        n_lon = field.lons().len(),
        variables = field.variable_names().count(),
        "read netcdf field"
    );
    Ok(field)
}

/// Return the first of `candidates` that names a variable in `file`.
fn find_coordinate(
    file: &netcdf::File,
    candidates: &[&'static str],
    path: &Path,
) -> Result<&'static str, IoError> {
    candidates
        .iter()
        .copied()
        .find(|name| file.variable(name).is_some())
        .ok_or_else(|| IoError::MissingVariable {
            name: candidates.first().copied().unwrap_or("unknown").to_string(),
            path: path.to_path_buf(),
        })
}

/// Read a 1-D `f64` variable, trying each alias in order.
///
/// Returns the data from the first alias that matches. If none match,
/// returns [`IoError::MissingVariable`] with the first alias as the name.
pub(crate) fn read_1d_f64(
    file: &netcdf::File,
    aliases: &[&str],
    path: &Path,
) -> Result<Vec<f64>, IoError> {
    for &alias in aliases {
        if let Some(var) = file.variable(alias) {
            return Ok(var.get_values::<f64, _>(..)?);
        }
    }

    let name = aliases.first().copied().unwrap_or("unknown");
    Err(IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Replace values equal to the variable's `_FillValue` or `missing_value`
/// attribute with `NaN`.
fn mask_fill_values(var: &netcdf::Variable, values: &mut [f64]) {
    let fills: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|attr| numeric_attribute(var, attr))
        .collect();
    if fills.is_empty() {
        return;
    }
    for v in values.iter_mut() {
        if fills.contains(v) {
            *v = f64::NAN;
        }
    }
}

fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Option<f64> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Schar(v) => Some(f64::from(v)),
        AttributeValue::Longlong(v) => Some(v as f64),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().map(|&f| f64::from(f)),
        _ => None,
    }
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Time decoding
// ---------------------------------------------------------------------------

/// Calendars the time decoder understands.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CfCalendar {
    Gregorian,
    NoLeap,
}

impl CfCalendar {
    fn parse(name: &str) -> Result<Self, IoError> {
        match name.to_ascii_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(CfCalendar::Gregorian),
            "noleap" | "365_day" => Ok(CfCalendar::NoLeap),
            other => Err(IoError::InvalidTime {
                reason: format!("unsupported calendar '{other}'"),
            }),
        }
    }
}

fn read_time_axis(file: &netcdf::File, path: &Path) -> Result<TimeAxis, IoError> {
    let Some(var) = file.variable(TIME_NAME) else {
        return Ok(TimeAxis::Static);
    };
    let units = string_attribute(&var, "units").ok_or_else(|| IoError::InvalidTime {
        reason: format!(
            "time variable in {} has no 'units' attribute",
            path.display()
        ),
    })?;
    let calendar = CfCalendar::parse(
        &string_attribute(&var, "calendar").unwrap_or_else(|| "standard".to_string()),
    )?;
    let (days_per_unit, base) = parse_time_units(&units)?;
    let offsets = var.get_values::<f64, _>(..)?;
    let dates = offsets_to_dates(base, &offsets, days_per_unit, calendar)?;
    Ok(TimeAxis::Dates(dates))
}

/// Parse CF units like `"days since 1990-01-01 00:00:00"` into the length of
/// one unit in days and the base date.
fn parse_time_units(units: &str) -> Result<(f64, NaiveDate), IoError> {
    let parts: Vec<&str> = units.split_whitespace().collect();
    if parts.len() < 3 || parts[1] != "since" {
        return Err(IoError::InvalidTime {
            reason: format!("unexpected time units format: '{units}'"),
        });
    }

    let days_per_unit = match parts[0] {
        "days" | "day" | "d" => 1.0,
        "hours" | "hour" | "h" => 1.0 / 24.0,
        "minutes" | "minute" => 1.0 / 1440.0,
        "seconds" | "second" | "s" => 1.0 / 86_400.0,
        other => {
            return Err(IoError::InvalidTime {
                reason: format!("unsupported time unit '{other}'"),
            });
        }
    };

    // The date may carry a trailing 'T..' time component.
    let date_str = parts[2].split('T').next().unwrap_or(parts[2]);
    let base = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
        IoError::InvalidTime {
            reason: format!("failed to parse base date '{date_str}': {e}"),
        }
    })?;
    Ok((days_per_unit, base))
}

/// Convert offsets from `base` into calendar dates, flooring to whole days.
fn offsets_to_dates(
    base: NaiveDate,
    offsets: &[f64],
    days_per_unit: f64,
    calendar: CfCalendar,
) -> Result<Vec<NaiveDate>, IoError> {
    offsets
        .iter()
        .map(|&offset| {
            let days = (offset * days_per_unit).floor() as i64;
            let date = match calendar {
                CfCalendar::Gregorian => base.checked_add_signed(TimeDelta::days(days)),
                CfCalendar::NoLeap => add_noleap_days(base, days),
            };
            date.ok_or_else(|| IoError::InvalidTime {
                reason: format!("date overflow adding {days} days to {base}"),
            })
        })
        .collect()
}

/// Cumulative day count before each month in a 365-day year.
const NOLEAP_MONTH_START: [i64; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];

/// Add `days` to `base` in a calendar where every year has 365 days.
fn add_noleap_days(base: NaiveDate, days: i64) -> Option<NaiveDate> {
    let month0 = base.month0() as usize;
    // Feb 29 does not exist in this calendar; treat it as Feb 28.
    let month_len = NOLEAP_MONTH_START[month0 + 1] - NOLEAP_MONTH_START[month0];
    let day0 = i64::from(base.day0()).min(month_len - 1);
    let total = NOLEAP_MONTH_START[month0] + day0 + days;
    let year = base.year() + i32::try_from(total.div_euclid(365)).ok()?;
    let doy = total.rem_euclid(365);
    let month0 = NOLEAP_MONTH_START.iter().rposition(|&start| start <= doy)?;
    let day = doy - NOLEAP_MONTH_START[month0] + 1;
    NaiveDate::from_ymd_opt(year, month0 as u32 + 1, day as u32)
}
