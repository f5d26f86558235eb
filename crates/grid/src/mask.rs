//! Boolean spatial masks.

use tracing::warn;

use crate::error::GridError;
use crate::field::GriddedField;

/// A boolean field over `(lat, lon)`, row-major with latitude slowest.
///
/// Masks are matched to data fields by exact coordinate equality, so both
/// sides must have been rounded to the same precision beforehand.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    lats: Vec<f64>,
    lons: Vec<f64>,
    valid: Vec<bool>,
}

impl Mask {
    /// Create a mask from coordinates and a row-major validity vector.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::LengthMismatch`] if `valid` does not hold
    /// `lats.len() * lons.len()` entries.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, valid: Vec<bool>) -> Result<Self, GridError> {
        let expected = lats.len() * lons.len();
        if valid.len() != expected {
            return Err(GridError::LengthMismatch {
                name: "mask".to_string(),
                expected,
                got: valid.len(),
            });
        }
        Ok(Self { lats, lons, valid })
    }

    /// Derive a mask from the first slice of `var` in `field`, marking cells
    /// where `keep` returns `true`. Missing (`NaN`) cells are never kept.
    ///
    /// # Errors
    ///
    /// - [`GridError::MissingVariable`] if `var` is not in the field.
    /// - [`GridError::LengthMismatch`] if the field holds no full slice, as
    ///   with an empty time axis.
    pub fn from_field(
        field: &GriddedField,
        var: &str,
        keep: impl Fn(f64) -> bool,
    ) -> Result<Self, GridError> {
        let values = field.values(var)?;
        let n_cells = field.n_cells();
        let slice = values.get(..n_cells).ok_or_else(|| GridError::LengthMismatch {
            name: var.to_string(),
            expected: n_cells,
            got: values.len(),
        })?;
        let valid = slice
            .iter()
            .map(|&v| !v.is_nan() && keep(v))
            .collect();
        Self::new(field.lats().to_vec(), field.lons().to_vec(), valid)
    }

    /// Latitude coordinates.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Longitude coordinates.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Number of cells marked valid.
    pub fn n_valid(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// Validity at an exact coordinate pair, or `None` if the mask has no
    /// such cell.
    pub fn is_valid_at(&self, lat: f64, lon: f64) -> Option<bool> {
        let y = self.lats.iter().position(|&v| v == lat)?;
        let x = self.lons.iter().position(|&v| v == lon)?;
        Some(self.valid[y * self.lons.len() + x])
    }

    /// Cell-wise AND with `other`, on this mask's grid.
    ///
    /// Cells of `self` that `other` does not cover become invalid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::GridMismatch`] if the two masks share no cell.
    pub fn intersect(&self, other: &Mask) -> Result<Mask, GridError> {
        let lookup = CoordinateLookup::build(&self.lats, &self.lons, &other.lats, &other.lons);
        if !lookup.overlaps() {
            return Err(GridError::GridMismatch {
                field_cells: self.valid.len(),
                mask_cells: other.valid.len(),
            });
        }
        let nx = self.lons.len();
        let valid = self
            .valid
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                v && lookup
                    .cell(i / nx, i % nx)
                    .is_some_and(|j| other.valid[j])
            })
            .collect();
        Mask::new(self.lats.clone(), self.lons.clone(), valid)
    }

    /// Set every value of every variable to `NaN` where the mask is false or
    /// does not cover the cell.
    ///
    /// This is a per-cell filter, not a multiplication: kept values are
    /// untouched, including zeros.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::GridMismatch`] if the field and the mask share no
    /// cell, which would otherwise silently produce an all-missing field.
    pub fn apply(&self, mut field: GriddedField) -> Result<GriddedField, GridError> {
        let lookup = CoordinateLookup::build(field.lats(), field.lons(), &self.lats, &self.lons);
        if !lookup.overlaps() {
            return Err(GridError::GridMismatch {
                field_cells: field.n_cells(),
                mask_cells: self.valid.len(),
            });
        }

        let n_cells = field.n_cells();
        let nx = field.lons().len();
        let mut uncovered = 0usize;
        let keep: Vec<bool> = (0..n_cells)
            .map(|c| match lookup.cell(c / nx, c % nx) {
                Some(j) => self.valid[j],
                None => {
                    uncovered += 1;
                    false
                }
            })
            .collect();

        if uncovered > 0 {
            warn!(
                uncovered,
                n_cells, "mask does not cover every grid cell; uncovered cells set to missing"
            );
        }

        for var in field.variables_mut().values_mut() {
            for (i, v) in var.values_mut().iter_mut().enumerate() {
                if !keep[i % n_cells] {
                    *v = f64::NAN;
                }
            }
        }
        Ok(field)
    }
}

/// Index of each target coordinate in a source grid, by exact equality.
struct CoordinateLookup {
    lat_idx: Vec<Option<usize>>,
    lon_idx: Vec<Option<usize>>,
    source_nx: usize,
}

impl CoordinateLookup {
    fn build(lats: &[f64], lons: &[f64], source_lats: &[f64], source_lons: &[f64]) -> Self {
        let find = |coords: &[f64], source: &[f64]| -> Vec<Option<usize>> {
            coords
                .iter()
                .map(|c| source.iter().position(|s| s == c))
                .collect()
        };
        Self {
            lat_idx: find(lats, source_lats),
            lon_idx: find(lons, source_lons),
            source_nx: source_lons.len(),
        }
    }

    fn overlaps(&self) -> bool {
        self.lat_idx.iter().any(Option::is_some) && self.lon_idx.iter().any(Option::is_some)
    }

    fn cell(&self, y: usize, x: usize) -> Option<usize> {
        Some(self.lat_idx[y]? * self.source_nx + self.lon_idx[x]?)
    }
}
