//! Mask sources and mask application.

use std::path::{Path, PathBuf};

use gcmeval_grid::{GriddedField, Mask, standardize};
use tracing::debug;

use crate::error::IoError;
use crate::netcdf_read::read_field;

/// Name of the variable read from mask files.
pub const MASK_VAR: &str = "mask";

/// Where a spatial mask comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MaskSource {
    /// No masking.
    #[default]
    None,
    /// A NetCDF file whose `mask` variable equals 1 on kept cells.
    Path(PathBuf),
    /// An already-built mask.
    Mask(Mask),
}

impl MaskSource {
    /// Load the mask this source describes, if any.
    ///
    /// # Errors
    ///
    /// Propagates [`load_mask`] errors for [`MaskSource::Path`].
    pub fn resolve(&self) -> Result<Option<Mask>, IoError> {
        match self {
            MaskSource::None => Ok(None),
            MaskSource::Path(path) => load_mask(path).map(Some),
            MaskSource::Mask(mask) => Ok(Some(mask.clone())),
        }
    }
}

impl From<Mask> for MaskSource {
    fn from(mask: Mask) -> Self {
        MaskSource::Mask(mask)
    }
}

impl From<PathBuf> for MaskSource {
    fn from(path: PathBuf) -> Self {
        MaskSource::Path(path)
    }
}

/// Read a mask file: standardise its dimension names and keep the cells
/// where the `mask` variable equals 1.
///
/// Coordinates are used as stored; the data fields the mask is applied to
/// are expected to share the mask's grid exactly.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] if `path` does not exist.
/// - [`IoError::Grid`] if the file has no `mask` variable.
pub fn load_mask(path: &Path) -> Result<Mask, IoError> {
    debug!(path = %path.display(), "loading mask");
    let field = standardize(read_field(path)?);
    let mask = Mask::from_field(&field, MASK_VAR, |v| v == 1.0)?;
    debug!(n_valid = mask.n_valid(), "mask loaded");
    Ok(mask)
}

/// Apply a mask source to a field.
///
/// [`MaskSource::None`] returns the field unchanged; otherwise every value
/// outside the mask becomes `NaN`.
///
/// # Errors
///
/// - Propagates [`load_mask`] errors for [`MaskSource::Path`].
/// - [`IoError::Grid`] wrapping
///   [`GridError::GridMismatch`](gcmeval_grid::GridError::GridMismatch) if the
///   mask and field share no grid cell.
pub fn apply_mask(field: GriddedField, source: &MaskSource) -> Result<GriddedField, IoError> {
    match source {
        MaskSource::None => Ok(field),
        MaskSource::Path(path) => Ok(load_mask(path)?.apply(field)?),
        MaskSource::Mask(mask) => Ok(mask.apply(field)?),
    }
}
