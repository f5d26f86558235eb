//! Gridded field data model.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use gcmeval_calendar::Season;

use crate::error::GridError;

/// Canonical name of the latitude dimension.
pub const CANONICAL_LAT: &str = "lat";

/// Canonical name of the longitude dimension.
pub const CANONICAL_LON: &str = "lon";

// ---------------------------------------------------------------------------
// TimeAxis
// ---------------------------------------------------------------------------

/// Leading axis of a [`GriddedField`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxis {
    /// Raw time steps.
    Dates(Vec<NaiveDate>),
    /// Seasonal buckets after grouping by season.
    Seasons(Vec<Season>),
    /// Calendar-month buckets (1..=12) after grouping by month.
    Months(Vec<u8>),
    /// No time dimension; the field holds a single slice.
    Static,
}

impl TimeAxis {
    /// Number of slices along the axis. A static axis holds one slice.
    pub fn len(&self) -> usize {
        match self {
            TimeAxis::Dates(d) => d.len(),
            TimeAxis::Seasons(s) => s.len(),
            TimeAxis::Months(m) => m.len(),
            TimeAxis::Static => 1,
        }
    }

    /// Returns `true` if the axis holds no slices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the axis kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TimeAxis::Dates(_) => "dates",
            TimeAxis::Seasons(_) => "season",
            TimeAxis::Months(_) => "month",
            TimeAxis::Static => "static",
        }
    }

    /// The dates of a [`TimeAxis::Dates`] axis.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UnexpectedTimeAxis`] for any other axis kind.
    pub fn dates(&self) -> Result<&[NaiveDate], GridError> {
        match self {
            TimeAxis::Dates(d) => Ok(d),
            other => Err(GridError::UnexpectedTimeAxis {
                expected: "dates",
                got: other.kind(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Variable
// ---------------------------------------------------------------------------

/// One gridded data variable, flattened in `[t, lat, lon]` row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    values: Vec<f64>,
    units: Option<String>,
}

impl Variable {
    /// Flattened values; missing cells are `NaN`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Units attribute, if the source file carried one.
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub(crate) fn new(values: Vec<f64>, units: Option<String>) -> Self {
        Self { values, units }
    }

    pub(crate) fn values_mut(&mut self) -> &mut Vec<f64> {
        &mut self.values
    }
}

// ---------------------------------------------------------------------------
// GriddedField
// ---------------------------------------------------------------------------

/// A set of variables sharing one `(time, lat, lon)` grid.
///
/// The field also remembers the dimension names it was read with, so that
/// [`standardize`](crate::standardize) can map source names onto the
/// canonical `lat` / `lon` pair, and keeps non-gridded auxiliary variables
/// such as `time_bnds` until they are explicitly dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    lat_dim: String,
    lon_dim: String,
    time: TimeAxis,
    lats: Vec<f64>,
    lons: Vec<f64>,
    variables: BTreeMap<String, Variable>,
    auxiliary: BTreeMap<String, Vec<f64>>,
}

impl GriddedField {
    /// Create an empty field over the given axes with canonical dimension names.
    pub fn new(time: TimeAxis, lats: Vec<f64>, lons: Vec<f64>) -> Self {
        Self {
            lat_dim: CANONICAL_LAT.to_string(),
            lon_dim: CANONICAL_LON.to_string(),
            time,
            lats,
            lons,
            variables: BTreeMap::new(),
            auxiliary: BTreeMap::new(),
        }
    }

    /// Set the names of the latitude and longitude dimensions.
    pub fn with_dim_names(mut self, lat_dim: impl Into<String>, lon_dim: impl Into<String>) -> Self {
        self.lat_dim = lat_dim.into();
        self.lon_dim = lon_dim.into();
        self
    }

    /// Add (or replace) a gridded variable.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::LengthMismatch`] if `values` does not hold exactly
    /// `n_time * n_lat * n_lon` entries.
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
        units: Option<String>,
    ) -> Result<Self, GridError> {
        let name = name.into();
        let expected = self.n_time() * self.n_cells();
        if values.len() != expected {
            return Err(GridError::LengthMismatch {
                name,
                expected,
                got: values.len(),
            });
        }
        self.variables.insert(name, Variable::new(values, units));
        Ok(self)
    }

    /// Add (or replace) a non-gridded auxiliary variable.
    pub fn with_auxiliary(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.auxiliary.insert(name.into(), values);
        self
    }

    /// Name of the latitude dimension.
    pub fn lat_dim(&self) -> &str {
        &self.lat_dim
    }

    /// Name of the longitude dimension.
    pub fn lon_dim(&self) -> &str {
        &self.lon_dim
    }

    /// Leading time (or time-bucket) axis.
    pub fn time(&self) -> &TimeAxis {
        &self.time
    }

    /// Latitude coordinate values.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Longitude coordinate values.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Number of slices along the time axis.
    pub fn n_time(&self) -> usize {
        self.time.len()
    }

    /// Number of grid cells in one slice.
    pub fn n_cells(&self) -> usize {
        self.lats.len() * self.lons.len()
    }

    /// Flat index of `(t, y, x)` into a variable's values.
    pub fn index(&self, t: usize, y: usize, x: usize) -> usize {
        (t * self.lats.len() + y) * self.lons.len() + x
    }

    /// Look up a gridded variable.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Values of a gridded variable.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MissingVariable`] if the field has no such variable.
    pub fn values(&self, name: &str) -> Result<&[f64], GridError> {
        self.variables
            .get(name)
            .map(Variable::values)
            .ok_or_else(|| GridError::MissingVariable {
                name: name.to_string(),
            })
    }

    /// Names of the gridded variables, sorted.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Values of an auxiliary variable.
    pub fn auxiliary(&self, name: &str) -> Option<&[f64]> {
        self.auxiliary.get(name).map(Vec::as_slice)
    }

    /// Names of the auxiliary variables, sorted.
    pub fn auxiliary_names(&self) -> impl Iterator<Item = &str> {
        self.auxiliary.keys().map(String::as_str)
    }

    /// Returns `true` if `name` is a gridded or auxiliary variable or a
    /// spatial dimension of this field.
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
            || self.auxiliary.contains_key(name)
            || self.lat_dim == name
            || self.lon_dim == name
    }

    // -- crate-internal mutation used by the transformation modules ---------

    pub(crate) fn set_dim_names(&mut self, lat_dim: String, lon_dim: String) {
        self.lat_dim = lat_dim;
        self.lon_dim = lon_dim;
    }

    pub(crate) fn coords_mut(&mut self) -> (&mut Vec<f64>, &mut Vec<f64>) {
        (&mut self.lats, &mut self.lons)
    }

    pub(crate) fn variables_mut(&mut self) -> &mut BTreeMap<String, Variable> {
        &mut self.variables
    }

    pub(crate) fn auxiliary_mut(&mut self) -> &mut BTreeMap<String, Vec<f64>> {
        &mut self.auxiliary
    }

    pub(crate) fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    /// Rebuild the field with a new time axis and grid, keeping dimension
    /// names and auxiliary variables, and replacing every gridded variable.
    pub(crate) fn rebuild(
        &self,
        time: TimeAxis,
        lats: Vec<f64>,
        lons: Vec<f64>,
        variables: BTreeMap<String, Variable>,
    ) -> Self {
        Self {
            lat_dim: self.lat_dim.clone(),
            lon_dim: self.lon_dim.clone(),
            time,
            lats,
            lons,
            variables,
            auxiliary: self.auxiliary.clone(),
        }
    }
}
