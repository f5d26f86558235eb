//! Evaluation configuration.

use std::path::{Path, PathBuf};

use gcmeval_io::MaskSource;
use serde::{Deserialize, Serialize};

use crate::error::EvaluateError;

// ---------------------------------------------------------------------------
// VariableNames
// ---------------------------------------------------------------------------

/// Names under which one canonical variable appears in each source.
///
/// Unset names fall back in a fixed chain: the reference and simulation
/// file-name variables default to the canonical name, and the in-file
/// variable names default to the corresponding file-name variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNames {
    var: String,
    var_ref: Option<String>,
    var_sim: Option<String>,
    var_ref_in_nc: Option<String>,
    var_sim_in_nc: Option<String>,
}

impl VariableNames {
    /// Names for `var` with every source-specific name defaulted.
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            var_ref: None,
            var_sim: None,
            var_ref_in_nc: None,
            var_sim_in_nc: None,
        }
    }

    /// Set the variable name used in reference file names.
    pub fn with_ref(mut self, name: impl Into<String>) -> Self {
        self.var_ref = Some(name.into());
        self
    }

    /// Set the variable name used in simulation file names.
    pub fn with_sim(mut self, name: impl Into<String>) -> Self {
        self.var_sim = Some(name.into());
        self
    }

    /// Set the variable name inside reference files.
    pub fn with_ref_in_nc(mut self, name: impl Into<String>) -> Self {
        self.var_ref_in_nc = Some(name.into());
        self
    }

    /// Set the variable name inside simulation files.
    pub fn with_sim_in_nc(mut self, name: impl Into<String>) -> Self {
        self.var_sim_in_nc = Some(name.into());
        self
    }

    /// Canonical variable name used in every output.
    pub fn var(&self) -> &str {
        &self.var
    }

    /// Variable name in reference file names.
    pub fn var_ref(&self) -> &str {
        self.var_ref.as_deref().unwrap_or(&self.var)
    }

    /// Variable name in simulation file names.
    pub fn var_sim(&self) -> &str {
        self.var_sim.as_deref().unwrap_or(&self.var)
    }

    /// Variable name inside reference files.
    pub fn var_ref_in_nc(&self) -> &str {
        self.var_ref_in_nc.as_deref().unwrap_or(self.var_ref())
    }

    /// Variable name inside simulation files.
    pub fn var_sim_in_nc(&self) -> &str {
        self.var_sim_in_nc.as_deref().unwrap_or(self.var_sim())
    }
}

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A location for nearest-neighbour selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

// ---------------------------------------------------------------------------
// EvaluateConfig
// ---------------------------------------------------------------------------

/// Sources, period and masking shared by every read of one evaluation.
#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    ref_dir: PathBuf,
    sim_dir: PathBuf,
    ref_name: String,
    sim_prefix: String,
    gcms: Vec<String>,
    year_start: i32,
    year_end: i32,
    mask: MaskSource,
    verbose: bool,
    allow_partial: bool,
}

impl EvaluateConfig {
    /// Create a configuration with no GCMs, no mask, and partial coverage
    /// disallowed.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluateError::InvalidConfig`] if `year_start > year_end`
    /// or either name is empty.
    pub fn new(
        ref_dir: impl Into<PathBuf>,
        sim_dir: impl Into<PathBuf>,
        ref_name: impl Into<String>,
        sim_prefix: impl Into<String>,
        year_start: i32,
        year_end: i32,
    ) -> Result<Self, EvaluateError> {
        let ref_name = ref_name.into();
        let sim_prefix = sim_prefix.into();
        if year_start > year_end {
            return Err(EvaluateError::InvalidConfig {
                reason: format!("year_start {year_start} is after year_end {year_end}"),
            });
        }
        if ref_name.is_empty() {
            return Err(EvaluateError::InvalidConfig {
                reason: "reference name is empty".to_string(),
            });
        }
        if sim_prefix.is_empty() {
            return Err(EvaluateError::InvalidConfig {
                reason: "simulation prefix is empty".to_string(),
            });
        }
        Ok(Self {
            ref_dir: ref_dir.into(),
            sim_dir: sim_dir.into(),
            ref_name,
            sim_prefix,
            gcms: Vec::new(),
            year_start,
            year_end,
            mask: MaskSource::None,
            verbose: false,
            allow_partial: false,
        })
    }

    /// Set the GCM ids to evaluate, in output order.
    pub fn with_gcms<I, S>(mut self, gcms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gcms = gcms.into_iter().map(Into::into).collect();
        self
    }

    /// Set the mask applied to every gridded read.
    pub fn with_mask(mut self, mask: impl Into<MaskSource>) -> Self {
        self.mask = mask.into();
        self
    }

    /// Log each resolved path at info level instead of debug.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Skip GCMs whose files are missing instead of failing.
    pub fn with_allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    /// Directory holding the reference files.
    pub fn ref_dir(&self) -> &Path {
        &self.ref_dir
    }

    /// Directory holding one sub-directory per GCM.
    pub fn sim_dir(&self) -> &Path {
        &self.sim_dir
    }

    /// Dataset type of the reference rows.
    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    /// Prefix of simulation dataset types.
    pub fn sim_prefix(&self) -> &str {
        &self.sim_prefix
    }

    /// GCM ids, in output order.
    pub fn gcms(&self) -> &[String] {
        &self.gcms
    }

    /// First year of the evaluation period.
    pub fn year_start(&self) -> i32 {
        self.year_start
    }

    /// Last year of the evaluation period.
    pub fn year_end(&self) -> i32 {
        self.year_end
    }

    /// Mask applied to gridded reads.
    pub fn mask(&self) -> &MaskSource {
        &self.mask
    }

    /// Whether resolved paths are logged at info level.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether missing GCM files are skipped.
    pub fn allow_partial(&self) -> bool {
        self.allow_partial
    }

    /// Dataset type of one GCM: `"{sim_prefix}_{gcm}"`.
    pub fn sim_name(&self, gcm: &str) -> String {
        format!("{}_{gcm}", self.sim_prefix)
    }

    /// Every dataset type this configuration produces, reference first.
    pub fn dataset_types(&self) -> Vec<String> {
        std::iter::once(self.ref_name.clone())
            .chain(self.gcms.iter().map(|g| self.sim_name(g)))
            .collect()
    }
}
