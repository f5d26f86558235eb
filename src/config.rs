use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gcmeval_calendar::TimeScale;
use gcmeval_spectral::{SpectralAxis, Timestep};
use serde::Deserialize;

/// Top-level gcmeval configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GcmevalConfig {
    /// Input and output locations.
    pub paths: PathsToml,

    /// Datasets and evaluation period.
    pub evaluation: EvaluationToml,

    /// Per-variable name mappings and statistics, keyed by canonical name.
    #[serde(default)]
    pub variables: BTreeMap<String, VariableToml>,

    /// Named locations for point tables and spectra.
    #[serde(default)]
    pub points: BTreeMap<String, PointToml>,

    /// Spectral analysis settings.
    #[serde(default)]
    pub fourier: FourierToml,

    /// Optional region mask.
    #[serde(default)]
    pub regions: Option<RegionsToml>,
}

impl GcmevalConfig {
    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&toml_str).context("failed to parse TOML config")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsToml {
    /// Directory of reference statistic files.
    pub ref_dir: PathBuf,
    /// Directory with one statistic sub-directory per GCM.
    pub sim_dir: PathBuf,
    /// Where default-named outputs are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Land/sea mask NetCDF file with a `mask` variable.
    #[serde(default)]
    pub mask: Option<PathBuf>,
    /// Raw daily reference directory; may contain `#VAR#`.
    #[serde(default)]
    pub daily_ref_dir: Option<String>,
    /// Raw daily simulation directory; may contain `#GCM#` and `#VAR#`.
    #[serde(default)]
    pub daily_sim_dir: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationToml {
    pub ref_name: String,
    pub sim_prefix: String,
    pub gcms: Vec<String>,
    pub year_start: i32,
    pub year_end: i32,
    #[serde(default)]
    pub allow_partial: bool,
    /// Statistics read for every variable of the climatology table.
    #[serde(default = "default_statistics")]
    pub climatology_statistics: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct VariableToml {
    /// Variable name in reference file names.
    #[serde(default)]
    pub r#ref: Option<String>,
    /// Variable name in simulation file names.
    #[serde(default)]
    pub sim: Option<String>,
    #[serde(default)]
    pub ref_in_nc: Option<String>,
    #[serde(default)]
    pub sim_in_nc: Option<String>,
    #[serde(default = "default_statistics")]
    pub statistics: Vec<String>,
    #[serde(default = "default_time_scales")]
    pub time_scales: Vec<TimeScale>,
}

impl Default for VariableToml {
    fn default() -> Self {
        Self {
            r#ref: None,
            sim: None,
            ref_in_nc: None,
            sim_in_nc: None,
            statistics: default_statistics(),
            time_scales: default_time_scales(),
        }
    }
}

fn default_statistics() -> Vec<String> {
    vec!["mean".to_string()]
}
fn default_time_scales() -> Vec<TimeScale> {
    vec![TimeScale::Annual, TimeScale::Seasonal]
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct PointToml {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FourierToml {
    #[serde(default = "default_timesteps")]
    pub timesteps: Vec<Timestep>,
    #[serde(default = "default_axes")]
    pub axes: Vec<SpectralAxis>,
    #[serde(default = "default_n_top")]
    pub n_top: usize,
}

impl Default for FourierToml {
    fn default() -> Self {
        Self {
            timesteps: default_timesteps(),
            axes: default_axes(),
            n_top: default_n_top(),
        }
    }
}

fn default_timesteps() -> Vec<Timestep> {
    vec![Timestep::Daily, Timestep::Monthly]
}
fn default_axes() -> Vec<SpectralAxis> {
    vec![SpectralAxis::Wavelength, SpectralAxis::Frequency]
}
fn default_n_top() -> usize {
    3
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionsToml {
    /// NetCDF file holding the region-id grid.
    pub file: PathBuf,
    /// Name of the region-id variable.
    pub variable: String,
    /// CSV file describing each region.
    pub metadata: PathBuf,
    pub id_column: String,
    pub label_column: String,
    #[serde(default = "default_code_column")]
    pub code_column: String,
}

fn default_code_column() -> String {
    "code".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[paths]
ref_dir = "/data/awap"
sim_dir = "/data/isimip"

[evaluation]
ref_name = "AWAP"
sim_prefix = "ISIMIP"
gcms = ["CNRM-CM5", "GFDL-ESM2M"]
year_start = 1976
year_end = 2005
"#;

    #[test]
    fn minimal_config_defaults() {
        let config: GcmevalConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("."));
        assert!(config.paths.mask.is_none());
        assert!(!config.evaluation.allow_partial);
        assert_eq!(config.evaluation.climatology_statistics, vec!["mean".to_string()]);
        assert!(config.variables.is_empty());
        assert_eq!(config.fourier.n_top, 3);
        assert_eq!(config.fourier.timesteps, vec![Timestep::Daily, Timestep::Monthly]);
        assert!(config.regions.is_none());
    }

    #[test]
    fn variables_and_points() {
        let text = format!(
            "{MINIMAL}
[variables.temp_max_day]
sim = \"tasmax\"
statistics = [\"mean\", \"pctl99\"]
time_scales = [\"annual\", \"monthly\"]

[points.canberra]
lat = -35.28
lon = 149.13
"
        );
        let config: GcmevalConfig = toml::from_str(&text).unwrap();
        let v = &config.variables["temp_max_day"];
        assert_eq!(v.sim.as_deref(), Some("tasmax"));
        assert_eq!(v.r#ref, None);
        assert_eq!(v.time_scales, vec![TimeScale::Annual, TimeScale::Monthly]);
        assert_eq!(config.points["canberra"].lat, -35.28);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = format!("{MINIMAL}\n[fourier]\nn_peaks = 3\n");
        assert!(toml::from_str::<GcmevalConfig>(&text).is_err());
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let text = MINIMAL.replace("ref_name = \"AWAP\"\n", "");
        assert!(toml::from_str::<GcmevalConfig>(&text).is_err());
    }
}
