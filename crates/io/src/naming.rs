//! Input file-name templates.
//!
//! Pre-computed statistic files follow one naming scheme:
//!
//! ```text
//! {name}_{var}_{code}{statistic}_{year_start}_{year_end}_mean.nc
//! {name}_{var}_{code}{statistic}_{year_start}_{year_end}_merged.nc
//! {name}_{var}_{code}{statistic}_{year_start}_{year_end}_lag1corr.nc
//! bias_{ref}/{bias_stem}_{var}_{code}{statistic}_{year_start}_{year_end}.nc
//! ```
//!
//! where `code` is the time-scale file code (`year`, `seas`, `mon`).

use std::fmt;

use gcmeval_calendar::TimeScale;

use crate::error::IoError;

/// Which pre-computed product of a source to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Multi-year mean per time bucket (`_mean.nc`).
    #[default]
    Mean,
    /// Merged time series of per-period values (`_merged.nc`).
    Merged,
}

impl FileKind {
    /// File-name suffix without the extension.
    pub fn suffix(self) -> &'static str {
        match self {
            FileKind::Mean => "mean",
            FileKind::Merged => "merged",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// The `(variable, time scale, statistic, period)` part shared by every
/// statistic file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTemplate {
    var: String,
    time_scale: TimeScale,
    statistic: String,
    year_start: i32,
    year_end: i32,
}

impl FileTemplate {
    /// Create a template for one variable, time scale, statistic and period.
    pub fn new(
        var: impl Into<String>,
        time_scale: TimeScale,
        statistic: impl Into<String>,
        year_start: i32,
        year_end: i32,
    ) -> Self {
        Self {
            var: var.into(),
            time_scale,
            statistic: statistic.into(),
            year_start,
            year_end,
        }
    }

    /// Return a copy naming a different variable.
    pub fn with_var(&self, var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            ..self.clone()
        }
    }

    /// Time scale of the template.
    pub fn time_scale(&self) -> TimeScale {
        self.time_scale
    }

    /// Statistic label of the template.
    pub fn statistic(&self) -> &str {
        &self.statistic
    }

    fn core(&self) -> Result<String, IoError> {
        let code = self.time_scale.file_code()?;
        Ok(format!(
            "{}_{}{}_{}_{}",
            self.var, code, self.statistic, self.year_start, self.year_end
        ))
    }

    /// `{name}_{core}_{mean|merged}.nc`
    ///
    /// # Errors
    ///
    /// Fails for [`TimeScale::Daily`], which has no pre-computed files.
    pub fn source_file(&self, name: &str, kind: FileKind) -> Result<String, IoError> {
        Ok(format!("{name}_{}_{}.nc", self.core()?, kind.suffix()))
    }

    /// `{name}_{core}_lag1corr.nc`
    ///
    /// # Errors
    ///
    /// Fails for [`TimeScale::Daily`].
    pub fn lag1corr_file(&self, name: &str) -> Result<String, IoError> {
        Ok(format!("{name}_{}_lag1corr.nc", self.core()?))
    }

    /// `{bias_stem}_{core}.nc`
    ///
    /// # Errors
    ///
    /// Fails for [`TimeScale::Daily`].
    pub fn bias_file(&self, bias_stem: &str) -> Result<String, IoError> {
        Ok(format!("{bias_stem}_{}.nc", self.core()?))
    }
}

/// Sub-directory of a GCM directory holding biases against `ref_name`.
pub fn bias_dir(ref_name: &str) -> String {
    format!("bias_{ref_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(scale: TimeScale) -> FileTemplate {
        FileTemplate::new("rain_day", scale, "mean", 1976, 2005)
    }

    #[test]
    fn mean_file_name() {
        let name = template(TimeScale::Annual)
            .source_file("AWAP", FileKind::Mean)
            .unwrap();
        assert_eq!(name, "AWAP_rain_day_yearmean_1976_2005_mean.nc");
    }

    #[test]
    fn merged_file_name() {
        let name = template(TimeScale::Seasonal)
            .source_file("ISIMIP_GCM1", FileKind::Merged)
            .unwrap();
        assert_eq!(name, "ISIMIP_GCM1_rain_day_seasmean_1976_2005_merged.nc");
    }

    #[test]
    fn lag1corr_file_name() {
        let name = template(TimeScale::Monthly).lag1corr_file("AWAP").unwrap();
        assert_eq!(name, "AWAP_rain_day_monmean_1976_2005_lag1corr.nc");
    }

    #[test]
    fn bias_file_name() {
        let t = FileTemplate::new("temp_max_day", TimeScale::Annual, "pctl90", 1976, 2005);
        assert_eq!(
            t.bias_file("bias_rel").unwrap(),
            "bias_rel_temp_max_day_yearpctl90_1976_2005.nc"
        );
        assert_eq!(bias_dir("AWAP"), "bias_AWAP");
    }

    #[test]
    fn with_var_keeps_rest() {
        let t = template(TimeScale::Annual).with_var("pr");
        assert_eq!(
            t.source_file("CMIP", FileKind::Mean).unwrap(),
            "CMIP_pr_yearmean_1976_2005_mean.nc"
        );
    }

    #[test]
    fn daily_has_no_template() {
        assert!(template(TimeScale::Daily).source_file("AWAP", FileKind::Mean).is_err());
    }
}
