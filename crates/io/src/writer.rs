//! NetCDF writer for [`GriddedField`]s.

use std::path::Path;

use chrono::NaiveDate;
use gcmeval_grid::{GridError, GriddedField, TimeAxis};
use tracing::debug;

use crate::error::IoError;

/// Fill value written in place of `NaN`.
pub const FILL_VALUE: f64 = 1.0e20;

/// Epoch of the `time` coordinate written by [`write_netcdf`].
const TIME_EPOCH: &str = "days since 1970-01-01 00:00:00";

/// Write a field as a CF-style NetCDF file.
///
/// Dated fields get a `time` dimension with `days since 1970-01-01` units on
/// the standard calendar; static fields have no time dimension. Missing
/// values are written as [`FILL_VALUE`] with a matching `_FillValue`
/// attribute, so [`read_field`](crate::read_field) restores them as `NaN`.
/// Auxiliary variables are written flat along their own `<name>_len`
/// dimension.
///
/// # Errors
///
/// - [`IoError::Grid`] wrapping [`GridError::UnexpectedTimeAxis`] for
///   season- or month-indexed fields, which have no CF time encoding.
/// - [`IoError::Netcdf`] if the file cannot be created or written.
pub fn write_netcdf(field: &GriddedField, path: &Path) -> Result<(), IoError> {
    let dates = match field.time() {
        TimeAxis::Dates(d) => Some(d.as_slice()),
        TimeAxis::Static => None,
        other => {
            return Err(GridError::UnexpectedTimeAxis {
                expected: "dates or static",
                got: other.kind(),
            }
            .into());
        }
    };

    let mut file = netcdf::create(path)?;
    let lat_dim = field.lat_dim();
    let lon_dim = field.lon_dim();

    if let Some(dates) = dates {
        file.add_dimension("time", dates.len())?;
    }
    file.add_dimension(lat_dim, field.lats().len())?;
    file.add_dimension(lon_dim, field.lons().len())?;

    {
        let mut var = file.add_variable::<f64>(lat_dim, &[lat_dim])?;
        var.put_values(field.lats(), ..)?;
        var.put_attribute("units", "degrees_north")?;
    }
    {
        let mut var = file.add_variable::<f64>(lon_dim, &[lon_dim])?;
        var.put_values(field.lons(), ..)?;
        var.put_attribute("units", "degrees_east")?;
    }
    if let Some(dates) = dates {
        let offsets = days_since_epoch(dates);
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_values(&offsets, ..)?;
        var.put_attribute("units", TIME_EPOCH)?;
        var.put_attribute("calendar", "standard")?;
    }

    let dims: Vec<&str> = if dates.is_some() {
        vec!["time", lat_dim, lon_dim]
    } else {
        vec![lat_dim, lon_dim]
    };
    for name in field.variable_names() {
        let Some(variable) = field.variable(name) else {
            continue;
        };
        let values: Vec<f64> = variable
            .values()
            .iter()
            .map(|&v| if v.is_nan() { FILL_VALUE } else { v })
            .collect();
        let mut var = file.add_variable::<f64>(name, &dims)?;
        var.put_attribute("_FillValue", FILL_VALUE)?;
        if let Some(units) = variable.units() {
            var.put_attribute("units", units)?;
        }
        var.put_values(&values, ..)?;
    }

    for name in field.auxiliary_names() {
        let Some(values) = field.auxiliary(name) else {
            continue;
        };
        let dim = format!("{name}_len");
        file.add_dimension(&dim, values.len())?;
        let mut var = file.add_variable::<f64>(name, &[dim.as_str()])?;
        var.put_values(values, ..)?;
    }

    debug!(path = %path.display(), "wrote netcdf field");
    Ok(())
}

fn days_since_epoch(dates: &[NaiveDate]) -> Vec<f64> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    dates
        .iter()
        .map(|d| (*d - epoch).num_days() as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_offsets() {
        let dates = [
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(1970, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(1969, 12, 31).unwrap(),
        ];
        assert_eq!(days_since_epoch(&dates), vec![0.0, 31.0, -1.0]);
    }

    #[test]
    fn seasonal_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let field = GriddedField::new(
            TimeAxis::Months(vec![1, 2]),
            vec![0.0],
            vec![0.0],
        );
        let err = write_netcdf(&field, &dir.path().join("out.nc")).unwrap_err();
        assert!(matches!(
            err,
            IoError::Grid(GridError::UnexpectedTimeAxis { got: "month", .. })
        ));
    }
}
