//! gcmeval evaluation: read the reference dataset and every GCM run, and
//! fold them into tidy long-format tables.
//!
//! ```text
//! EvaluateConfig ──► read_one_source ──► SourceFields ──► *_table ──► TidyTable
//!   (paths, mask)     (one dataset)      (scale → key)    (reduce)     (CSV)
//! ```
//!
//! [`read_one_source`] resolves file names, regroups seasonal/monthly mean
//! files to buckets, attaches lag-1 and bias products, and normalises every
//! field. The `*_table` functions call it for the reference first and then
//! for each GCM.

mod aggregate;
mod config;
mod error;
mod pairing;
mod source;
mod table;
mod units;

pub use aggregate::{
    DailySources, climatology_table, daily_table, gridded_table, mean_field_table,
    spatiotemporal_table, timeseries_table,
};
pub use config::{EvaluateConfig, Point, VariableNames};
pub use error::EvaluateError;
pub use pairing::{
    PairedValue, SpatialCorrelation, pair_with_reference, spatial_correlation,
    spatial_correlations,
};
pub use source::{
    BiasType, MaskStage, ReadOptions, Source, SourceFields, SourceKey, read_one_source,
};
pub use table::{TidyRecord, TidyTable};
pub use units::UnitConversion;
