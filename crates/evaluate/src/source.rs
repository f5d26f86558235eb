//! Single-source reader: locate, load and normalise the statistic files of
//! the reference or one GCM.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use gcmeval_calendar::TimeScale;
use gcmeval_grid::{
    DEFAULT_DIGITS, GriddedField, Mask, drop_variable, group_by_month, group_by_season,
    rename_variable, round_coordinates, select_nearest, standardize,
};
use gcmeval_io::{FileKind, FileTemplate, bias_dir, read_field};
use tracing::{debug, info};

use crate::config::{EvaluateConfig, Point, VariableNames};
use crate::error::EvaluateError;

/// Auxiliary variable dropped from every loaded file.
const TIME_BOUNDS: &str = "time_bnds";

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Kind of pre-computed bias product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BiasType {
    /// Absolute bias (simulation minus reference).
    Abs,
    /// Relative bias.
    Rel,
    /// Bias in lag-1 autocorrelation; one value per cell, never regrouped.
    Lag1Corr,
    /// Absolute bias of the linear trend; never regrouped.
    TrendAbs,
}

impl BiasType {
    /// Every bias type.
    pub const ALL: [BiasType; 4] = [
        BiasType::Abs,
        BiasType::Rel,
        BiasType::Lag1Corr,
        BiasType::TrendAbs,
    ];

    /// File-name stem, e.g. `bias_abs`.
    pub fn stem(self) -> &'static str {
        match self {
            BiasType::Abs => "bias_abs",
            BiasType::Rel => "bias_rel",
            BiasType::Lag1Corr => "bias_lag1corr",
            BiasType::TrendAbs => "bias_trend_abs",
        }
    }

    /// Whether seasonal/monthly files are regrouped to season/month buckets.
    pub fn regroups(self) -> bool {
        matches!(self, BiasType::Abs | BiasType::Rel)
    }
}

impl fmt::Display for BiasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

/// Key of one loaded field within a time scale.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKey {
    /// Reference statistic, keyed by reference name.
    Reference(String),
    /// Simulation statistic, keyed by `"{prefix}_{gcm}"`.
    Simulation(String),
    /// Lag-1 autocorrelation companion of a reference or simulation source.
    Lag1Corr(String),
    /// Bias product of the simulation against the reference.
    Bias(BiasType),
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKey::Reference(name) | SourceKey::Simulation(name) => f.write_str(name),
            SourceKey::Lag1Corr(name) => write!(f, "{name}_lag1corr"),
            SourceKey::Bias(bias) => write!(f, "{bias}"),
        }
    }
}

/// Which dataset to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The reference dataset.
    Reference,
    /// One GCM run.
    Simulation(String),
}

impl Source {
    /// Dataset type of rows produced from this source.
    pub fn dataset_type(&self, config: &EvaluateConfig) -> String {
        match self {
            Source::Reference => config.ref_name().to_string(),
            Source::Simulation(gcm) => config.sim_name(gcm),
        }
    }

    /// Key of the main statistic field of this source.
    pub fn key(&self, config: &EvaluateConfig) -> SourceKey {
        match self {
            Source::Reference => SourceKey::Reference(self.dataset_type(config)),
            Source::Simulation(_) => SourceKey::Simulation(self.dataset_type(config)),
        }
    }

    fn dir(&self, config: &EvaluateConfig) -> PathBuf {
        match self {
            Source::Reference => config.ref_dir().to_path_buf(),
            Source::Simulation(gcm) => config.sim_dir().join(gcm),
        }
    }

    fn file_var<'a>(&self, names: &'a VariableNames) -> &'a str {
        match self {
            Source::Reference => names.var_ref(),
            Source::Simulation(_) => names.var_sim(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReadOptions
// ---------------------------------------------------------------------------

/// Position of masking within the normalisation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskStage {
    /// Mask on stored coordinates, then round and select the point.
    #[default]
    BeforeRounding,
    /// Round, select the point, then mask on rounded coordinates.
    Last,
}

/// What to read for each source and how to reduce it.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    file_kind: FileKind,
    mask_stage: MaskStage,
    point: Option<Point>,
    bias_types: Vec<BiasType>,
}

impl ReadOptions {
    /// Read `_mean.nc` files, regrouped to season/month buckets, masked
    /// before rounding.
    pub fn mean() -> Self {
        Self::default()
    }

    /// Read `_merged.nc` time series, keeping their dates, masked last.
    pub fn merged() -> Self {
        Self {
            file_kind: FileKind::Merged,
            mask_stage: MaskStage::Last,
            ..Self::default()
        }
    }

    /// Override where masking happens.
    pub fn with_mask_stage(mut self, stage: MaskStage) -> Self {
        self.mask_stage = stage;
        self
    }

    /// Reduce every field to the grid cell nearest to `point`.
    pub fn with_point(mut self, point: Option<Point>) -> Self {
        self.point = point;
        self
    }

    /// Also read these bias products of the simulation source.
    pub fn with_bias_types(mut self, bias_types: impl Into<Vec<BiasType>>) -> Self {
        self.bias_types = bias_types.into();
        self
    }

    /// File kind read for reference and simulation sources.
    pub fn file_kind(&self) -> FileKind {
        self.file_kind
    }

    /// Where masking happens.
    pub fn mask_stage(&self) -> MaskStage {
        self.mask_stage
    }

    /// Nearest-neighbour selection point, if any.
    pub fn point(&self) -> Option<Point> {
        self.point
    }

    /// Bias products to read.
    pub fn bias_types(&self) -> &[BiasType] {
        &self.bias_types
    }
}

// ---------------------------------------------------------------------------
// SourceFields
// ---------------------------------------------------------------------------

/// Loaded fields, by time scale and then by source key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFields {
    fields: BTreeMap<TimeScale, BTreeMap<SourceKey, GriddedField>>,
}

impl SourceFields {
    /// Field of `key` at `scale`.
    pub fn get(&self, scale: TimeScale, key: &SourceKey) -> Option<&GriddedField> {
        self.fields.get(&scale)?.get(key)
    }

    /// Keys loaded at `scale`, sorted.
    pub fn keys(&self, scale: TimeScale) -> impl Iterator<Item = &SourceKey> {
        self.fields.get(&scale).into_iter().flat_map(BTreeMap::keys)
    }

    /// Time scales with at least one field.
    pub fn time_scales(&self) -> impl Iterator<Item = TimeScale> + '_ {
        self.fields.keys().copied()
    }

    /// Total number of loaded fields.
    pub fn len(&self) -> usize {
        self.fields.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, scale: TimeScale, key: SourceKey, field: GriddedField) {
        self.fields.entry(scale).or_default().insert(key, field);
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Load every requested source at every requested time scale.
///
/// For each time scale, the statistic file of each source is read; with
/// [`FileKind::Mean`], seasonal and monthly fields are regrouped to
/// season/month buckets and an existing `_lag1corr.nc` companion is loaded
/// as [`SourceKey::Lag1Corr`]. Bias products in `options` are read from the
/// `bias_{ref_name}` directory of the simulation source's GCM.
///
/// Every loaded field then goes through one normalisation pass: drop
/// `time_bnds`, rename both source-specific in-file names to the canonical
/// variable, standardise dimension names, and then
/// - [`MaskStage::BeforeRounding`]: mask, round coordinates, select the point;
/// - [`MaskStage::Last`]: round coordinates, select the point, mask.
///
/// # Errors
///
/// - [`EvaluateError::InvalidConfig`] if bias types are requested without a
///   simulation source, or a daily time scale is requested.
/// - [`EvaluateError::Io`] with `FileNotFound` if any required file is
///   absent. Missing lag-1 companions are not an error.
/// - [`EvaluateError::Grid`] if regrouping or masking fails.
pub fn read_one_source(
    config: &EvaluateConfig,
    names: &VariableNames,
    sources: &[Source],
    statistic: &str,
    time_scales: &[TimeScale],
    options: &ReadOptions,
) -> Result<SourceFields, EvaluateError> {
    let bias_gcm = sources.iter().find_map(|s| match s {
        Source::Simulation(gcm) => Some(gcm.as_str()),
        Source::Reference => None,
    });
    if !options.bias_types.is_empty() && bias_gcm.is_none() {
        return Err(EvaluateError::InvalidConfig {
            reason: "bias products need a simulation source".to_string(),
        });
    }
    if time_scales.contains(&TimeScale::Daily) {
        return Err(EvaluateError::InvalidConfig {
            reason: "daily data has no pre-computed statistic files".to_string(),
        });
    }

    let mut loaded = SourceFields::default();
    for &scale in time_scales {
        let template = FileTemplate::new(
            names.var(),
            scale,
            statistic,
            config.year_start(),
            config.year_end(),
        );

        for source in sources {
            let dir = source.dir(config);
            let source_template = template.with_var(source.file_var(names));
            let name = source.dataset_type(config);

            let path = dir.join(source_template.source_file(&name, options.file_kind)?);
            let field = load(config, &path)?;
            let field = match options.file_kind {
                FileKind::Mean => regroup(field, scale)?,
                FileKind::Merged => field,
            };
            loaded.insert(scale, source.key(config), field);

            if options.file_kind == FileKind::Mean {
                let path = dir.join(source_template.lag1corr_file(&name)?);
                if path.exists() {
                    loaded.insert(scale, SourceKey::Lag1Corr(name), load(config, &path)?);
                }
            }
        }

        if let Some(gcm) = bias_gcm {
            let dir = config.sim_dir().join(gcm).join(bias_dir(config.ref_name()));
            for &bias in &options.bias_types {
                let path = dir.join(template.bias_file(bias.stem())?);
                let field = load(config, &path)?;
                let field = if bias.regroups() {
                    regroup(field, scale)?
                } else {
                    field
                };
                loaded.insert(scale, SourceKey::Bias(bias), field);
            }
        }
    }

    let mask = config.mask().resolve()?;
    let mut normalised = SourceFields::default();
    for (scale, by_key) in loaded.fields {
        for (key, field) in by_key {
            let field = normalise(field, names, mask.as_ref(), options)?;
            normalised.insert(scale, key, field);
        }
    }
    Ok(normalised)
}

fn load(config: &EvaluateConfig, path: &Path) -> Result<GriddedField, EvaluateError> {
    if config.verbose() {
        info!(path = %path.display(), "reading");
    } else {
        debug!(path = %path.display(), "reading");
    }
    Ok(read_field(path)?)
}

fn regroup(field: GriddedField, scale: TimeScale) -> Result<GriddedField, EvaluateError> {
    Ok(match scale {
        TimeScale::Seasonal => group_by_season(&field)?,
        TimeScale::Monthly => group_by_month(&field)?,
        TimeScale::Annual | TimeScale::Daily => field,
    })
}

fn normalise(
    field: GriddedField,
    names: &VariableNames,
    mask: Option<&Mask>,
    options: &ReadOptions,
) -> Result<GriddedField, EvaluateError> {
    let field = drop_variable(field, TIME_BOUNDS);
    let field = rename_variable(field, names.var_ref_in_nc(), names.var());
    let field = rename_variable(field, names.var_sim_in_nc(), names.var());
    let field = standardize(field);

    let apply_mask = |field: GriddedField| -> Result<GriddedField, EvaluateError> {
        match mask {
            Some(mask) => Ok(mask.apply(field)?),
            None => Ok(field),
        }
    };
    let select_point = |field: GriddedField| -> Result<GriddedField, EvaluateError> {
        match options.point {
            Some(p) => Ok(select_nearest(&field, p.lat, p.lon)?),
            None => Ok(field),
        }
    };

    match options.mask_stage {
        MaskStage::BeforeRounding => {
            let field = apply_mask(field)?;
            let field = round_coordinates(field, DEFAULT_DIGITS);
            select_point(field)
        }
        MaskStage::Last => {
            let field = round_coordinates(field, DEFAULT_DIGITS);
            let field = select_point(field)?;
            apply_mask(field)
        }
    }
}
