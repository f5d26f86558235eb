//! Region-id masks and their metadata table.

use std::path::Path;

use gcmeval_grid::{GriddedField, Mask, round_coordinates, select_variable, standardize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::IoError;
use crate::netcdf_read::read_field;

/// Decimal places region-mask coordinates are rounded to.
pub const REGION_DIGITS: u32 = 3;

/// One row of the region metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCode {
    /// Value of the region in the region-id grid.
    pub region_id: i64,
    /// Human-readable region name.
    pub label: String,
    /// Short code used in output names.
    pub code: String,
}

/// Column names to pick from the region metadata CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionColumns {
    id: String,
    label: String,
    code: String,
}

impl RegionColumns {
    /// Select the id and label columns; the code column defaults to `code`.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            code: "code".to_string(),
        }
    }

    /// Set the code column name.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }
}

/// A region-id grid together with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMask {
    field: GriddedField,
    var: String,
    codes: Vec<RegionCode>,
}

impl RegionMask {
    /// The region-id grid, with standard dimension names and coordinates
    /// rounded to [`REGION_DIGITS`].
    pub fn field(&self) -> &GriddedField {
        &self.field
    }

    /// All metadata rows, in file order.
    pub fn codes(&self) -> &[RegionCode] {
        &self.codes
    }

    /// Boolean mask of the cells belonging to `region_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Grid`] if the region variable is missing, which
    /// cannot happen for a mask built by [`read_region_mask`].
    pub fn mask_for(&self, region_id: i64) -> Result<Mask, IoError> {
        let target = region_id as f64;
        Ok(Mask::from_field(&self.field, &self.var, |v| v == target)?)
    }

    /// Label of `region_id`, if the metadata lists it.
    pub fn label_for(&self, region_id: i64) -> Option<&str> {
        self.lookup(region_id).map(|r| r.label.as_str())
    }

    /// Short code of `region_id`, if the metadata lists it.
    pub fn code_for(&self, region_id: i64) -> Option<&str> {
        self.lookup(region_id).map(|r| r.code.as_str())
    }

    fn lookup(&self, region_id: i64) -> Option<&RegionCode> {
        self.codes.iter().find(|r| r.region_id == region_id)
    }
}

/// Read a region-id grid and its metadata CSV.
///
/// The grid's dimension names are standardised and its coordinates rounded
/// to [`REGION_DIGITS`] decimal places; only `region_var` is kept. The CSV
/// must contain the id, label and code columns named in `columns`; other
/// columns are ignored. Cell values are read verbatim, so an empty label
/// stays empty.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] if either file does not exist.
/// - [`IoError::Grid`] if `region_var` is not in the grid.
/// - [`IoError::MissingColumn`] if a requested column is absent.
/// - [`IoError::Csv`] if the table is malformed or an id is not an integer.
pub fn read_region_mask(
    region_file: &Path,
    region_var: &str,
    metadata_file: &Path,
    columns: &RegionColumns,
) -> Result<RegionMask, IoError> {
    let field = standardize(read_field(region_file)?);
    let field = round_coordinates(field, REGION_DIGITS);
    let field = select_variable(&field, region_var)?;
    let codes = read_region_codes(metadata_file, columns)?;
    debug!(
        path = %region_file.display(),
        regions = codes.len(),
        "read region mask"
    );
    Ok(RegionMask {
        field,
        var: region_var.to_string(),
        codes,
    })
}

fn read_region_codes(path: &Path, columns: &RegionColumns) -> Result<Vec<RegionCode>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| IoError::MissingColumn {
                name: name.to_string(),
                path: path.to_path_buf(),
            })
    };
    let id_idx = column(&columns.id)?;
    let label_idx = column(&columns.label)?;
    let code_idx = column(&columns.code)?;

    let mut codes = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field_at = |i: usize| record.get(i).unwrap_or_default();
        let raw_id = field_at(id_idx).trim();
        let region_id = parse_region_id(raw_id).ok_or_else(|| IoError::Csv {
            reason: format!("region id '{raw_id}' in {} is not an integer", path.display()),
        })?;
        codes.push(RegionCode {
            region_id,
            label: field_at(label_idx).to_string(),
            code: field_at(code_idx).to_string(),
        });
    }
    Ok(codes)
}

/// Accept `7` as well as `7.0`, which spreadsheet exports produce.
fn parse_region_id(raw: &str) -> Option<i64> {
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.fract() == 0.0 && f.is_finite()).then_some(f as i64)
}
