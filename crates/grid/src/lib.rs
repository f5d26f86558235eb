//! # gcmeval-grid
//!
//! In-memory gridded climate fields and the pure transformations applied to
//! them between reading a file and flattening it into a tidy table.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["GriddedField (from file)"] -->|"drop_variable / rename_variable"| B["canonical variable"]
//!     B -->|"standardize()"| C["lat / lon dims"]
//!     C -->|"Mask::apply()"| D["masked"]
//!     D -->|"round_coordinates()"| E["joinable coordinates"]
//!     E -->|"group_by_season() / group_by_month()"| F["season / month axis"]
//!     E -->|"mean_over_time() / mean_over_space()"| G["reduced"]
//! ```
//!
//! Every transformation takes the field by value and returns a new one, so
//! stages compose explicitly and can be tested in isolation.

mod error;
mod field;
mod mask;
mod normalize;
mod reduce;

pub use error::GridError;
pub use field::{CANONICAL_LAT, CANONICAL_LON, GriddedField, TimeAxis, Variable};
pub use mask::Mask;
pub use normalize::{
    DEFAULT_DIGITS, LAT_ALIASES, LON_ALIASES, drop_variable, rename_variable, round_coordinates,
    standardize,
};
pub use reduce::{
    concat_time, group_by_month, group_by_season, map_values, mean_over_space, mean_over_time,
    select_nearest, select_variable, slice_dates,
};
