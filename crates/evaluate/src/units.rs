//! Unit conversions applied to raw daily model output.

use std::fmt;

use gcmeval_grid::{GriddedField, map_values};
use tracing::info;

use crate::error::EvaluateError;

const KELVIN_OFFSET: f64 = 273.15;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Conversion from model units to reference units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitConversion {
    /// K to degrees Celsius.
    KelvinToCelsius,
    /// kg m-2 s-1 to mm per day.
    PerSecondToPerDay,
}

impl UnitConversion {
    /// Conversion needed for simulated values of a canonical variable.
    pub fn for_variable(var: &str) -> Option<Self> {
        match var {
            "temp_max_day" | "temp_min_day" => Some(UnitConversion::KelvinToCelsius),
            "rain_day" => Some(UnitConversion::PerSecondToPerDay),
            _ => None,
        }
    }

    pub fn apply(self, value: f64) -> f64 {
        match self {
            UnitConversion::KelvinToCelsius => value - KELVIN_OFFSET,
            UnitConversion::PerSecondToPerDay => value * SECONDS_PER_DAY,
        }
    }

    /// Convert every value of `var` in `field`.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluateError::Grid`] if `var` is not in the field.
    pub fn convert(self, field: GriddedField, var: &str) -> Result<GriddedField, EvaluateError> {
        info!(var, conversion = %self, "converting simulated units");
        Ok(map_values(field, var, |v| self.apply(v))?)
    }
}

impl fmt::Display for UnitConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitConversion::KelvinToCelsius => f.write_str("K -> degC"),
            UnitConversion::PerSecondToPerDay => f.write_str("kg m-2 s-1 -> mm/day"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gcmeval_grid::TimeAxis;

    #[test]
    fn conversion_by_variable() {
        assert_eq!(
            UnitConversion::for_variable("temp_min_day"),
            Some(UnitConversion::KelvinToCelsius)
        );
        assert_eq!(
            UnitConversion::for_variable("rain_day"),
            Some(UnitConversion::PerSecondToPerDay)
        );
        assert_eq!(UnitConversion::for_variable("qtot"), None);
    }

    #[test]
    fn values() {
        assert_relative_eq!(UnitConversion::KelvinToCelsius.apply(300.0), 26.85, epsilon = 1e-9);
        assert_relative_eq!(UnitConversion::PerSecondToPerDay.apply(1.0), 86_400.0);
        assert!(UnitConversion::KelvinToCelsius.apply(f64::NAN).is_nan());
    }

    #[test]
    fn convert_field() {
        let field = GriddedField::new(TimeAxis::Static, vec![0.0], vec![0.0, 1.0])
            .with_variable("temp_max_day", vec![273.15, 283.15], None)
            .unwrap();
        let out = UnitConversion::KelvinToCelsius
            .convert(field, "temp_max_day")
            .unwrap();
        let v = out.values("temp_max_day").unwrap();
        assert_relative_eq!(v[0], 0.0);
        assert_relative_eq!(v[1], 10.0, epsilon = 1e-9);
    }
}
