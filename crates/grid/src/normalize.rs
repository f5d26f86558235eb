//! Coordinate and variable-name normalisation.

use crate::field::{CANONICAL_LAT, CANONICAL_LON, GriddedField};

/// Source names that are renamed to the canonical `lat` dimension.
pub const LAT_ALIASES: &[&str] = &["latitude", "y"];

/// Source names that are renamed to the canonical `lon` dimension.
pub const LON_ALIASES: &[&str] = &["longitude", "x"];

/// Decimal places used when rounding coordinates of data fields.
pub const DEFAULT_DIGITS: u32 = 4;

/// Rename latitude/longitude dimensions to the canonical `lat` / `lon`.
///
/// Idempotent; a field whose dimensions already carry the canonical names,
/// or carry names outside the alias lists, is returned unchanged.
pub fn standardize(field: GriddedField) -> GriddedField {
    let field = LAT_ALIASES
        .iter()
        .fold(field, |f, alias| rename_variable(f, alias, CANONICAL_LAT));
    LON_ALIASES
        .iter()
        .fold(field, |f, alias| rename_variable(f, alias, CANONICAL_LON))
}

/// Round every latitude and longitude value to `digits` decimal places.
///
/// Sources written by different tools disagree in the last bits of their
/// coordinates (e.g. `50.00000001` vs `50.0`); rounding makes coordinate
/// sets exactly comparable for masking and joins.
pub fn round_coordinates(mut field: GriddedField, digits: u32) -> GriddedField {
    let scale = 10f64.powi(digits as i32);
    let (lats, lons) = field.coords_mut();
    for v in lats.iter_mut().chain(lons.iter_mut()) {
        *v = (*v * scale).round() / scale;
    }
    field
}

/// Rename a variable or spatial dimension from `old` to `new`.
///
/// No-op when the field has nothing named `old`.
pub fn rename_variable(mut field: GriddedField, old: &str, new: &str) -> GriddedField {
    if old == new || !field.contains(old) {
        return field;
    }

    if let Some(var) = field.variables_mut().remove(old) {
        field.variables_mut().insert(new.to_string(), var);
    }
    if let Some(aux) = field.auxiliary_mut().remove(old) {
        field.auxiliary_mut().insert(new.to_string(), aux);
    }

    let lat_dim = if field.lat_dim() == old {
        new.to_string()
    } else {
        field.lat_dim().to_string()
    };
    let lon_dim = if field.lon_dim() == old {
        new.to_string()
    } else {
        field.lon_dim().to_string()
    };
    field.set_dim_names(lat_dim, lon_dim);
    field
}

/// Remove a gridded or auxiliary variable if present.
pub fn drop_variable(mut field: GriddedField, name: &str) -> GriddedField {
    field.variables_mut().remove(name);
    field.auxiliary_mut().remove(name);
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::TimeAxis;

    fn field_with_dims(lat: &str, lon: &str) -> GriddedField {
        GriddedField::new(TimeAxis::Static, vec![-35.00000001, -34.95], vec![149.05, 149.1])
            .with_dim_names(lat, lon)
            .with_variable("pr", vec![1.0, 2.0, 3.0, 4.0], None)
            .unwrap()
    }

    #[test]
    fn standardize_renames_long_names() {
        let f = standardize(field_with_dims("latitude", "longitude"));
        assert_eq!(f.lat_dim(), "lat");
        assert_eq!(f.lon_dim(), "lon");
    }

    #[test]
    fn standardize_is_idempotent() {
        let once = standardize(field_with_dims("latitude", "longitude"));
        let twice = standardize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn standardize_leaves_unknown_names() {
        let f = standardize(field_with_dims("rlat", "rlon"));
        assert_eq!(f.lat_dim(), "rlat");
        assert_eq!(f.lon_dim(), "rlon");
    }

    #[test]
    fn round_coordinates_four_digits() {
        let f = round_coordinates(field_with_dims("lat", "lon"), DEFAULT_DIGITS);
        assert_eq!(f.lats(), &[-35.0, -34.95]);
        assert_eq!(f.lons(), &[149.05, 149.1]);
    }

    #[test]
    fn round_coordinates_is_stable() {
        let once = round_coordinates(field_with_dims("lat", "lon"), 3);
        let twice = round_coordinates(once.clone(), 3);
        assert_eq!(once, twice);
    }

    #[test]
    fn rename_variable_moves_values() {
        let f = rename_variable(field_with_dims("lat", "lon"), "pr", "rain_day");
        assert!(f.variable("pr").is_none());
        assert_eq!(f.values("rain_day").unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn rename_variable_absent_is_noop() {
        let before = field_with_dims("lat", "lon");
        let after = rename_variable(before.clone(), "tasmax", "temp_max_day");
        assert_eq!(before, after);
    }

    #[test]
    fn drop_variable_removes_auxiliary() {
        let f = field_with_dims("lat", "lon").with_auxiliary("time_bnds", vec![0.0, 1.0]);
        let f = drop_variable(f, "time_bnds");
        assert_eq!(f.auxiliary_names().count(), 0);
        assert!(f.variable("pr").is_some());
    }
}
