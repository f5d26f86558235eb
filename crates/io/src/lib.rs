//! # gcmeval-io
//!
//! Turn climate NetCDF files into [`GriddedField`](gcmeval_grid::GriddedField)s
//! and locate them on disk. Bridges external file layouts into the
//! in-memory model of `gcmeval-grid`.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `netcdf_read` | [`read_field`]: coordinates, CF time decoding, fill values |
//! | `writer` | [`write_netcdf`]: CF-style output of a field |
//! | `naming` | [`FileTemplate`], [`FileKind`]: statistic file-name templates |
//! | `mask` | [`MaskSource`], [`load_mask`], [`apply_mask`] |
//! | `region` | [`read_region_mask`]: region-id grid plus metadata CSV |
//! | `discover` | Daily file globbing and multi-file concatenation |

mod discover;
mod error;
mod mask;
mod naming;
mod netcdf_read;
mod region;
mod writer;

pub use discover::{
    GCM_PLACEHOLDER, VAR_PLACEHOLDER, fill_placeholders, read_fields_concat, read_time_slice,
    reference_daily_files, simulation_daily_files,
};
pub use error::IoError;
pub use mask::{MASK_VAR, MaskSource, apply_mask, load_mask};
pub use naming::{FileKind, FileTemplate, bias_dir};
pub use netcdf_read::read_field;
pub use region::{REGION_DIGITS, RegionCode, RegionColumns, RegionMask, read_region_mask};
pub use writer::{FILL_VALUE, write_netcdf};
