//! Fourier magnitude spectra and their dominant components.

use std::fmt;
use std::str::FromStr;

use num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::error::SpectralError;
use crate::series::SpectralSeries;

/// Components below this index are dropped from frequency spectra; they
/// carry the mean and trend.
const MIN_FREQUENCY_COMPONENT: usize = 3;

/// Sampling interval of the analysed series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timestep {
    Daily,
    /// Daily input averaged to calendar months first.
    Monthly,
}

impl Timestep {
    /// Samples per year, converting component frequencies to cycles/year.
    pub fn per_year(self) -> f64 {
        match self {
            Timestep::Daily => 365.0,
            Timestep::Monthly => 12.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Timestep::Daily => "daily",
            Timestep::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Timestep {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Timestep::Daily),
            "monthly" => Ok(Timestep::Monthly),
            _ => Err(SpectralError::UnknownName {
                kind: "timestep",
                name: s.to_string(),
            }),
        }
    }
}

/// Abscissa of a spectrum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectralAxis {
    /// Period in samples (days or months); components longer than half the
    /// series are dropped.
    Wavelength,
    /// Cycles per year; the three lowest components are dropped.
    Frequency,
}

impl SpectralAxis {
    pub fn name(self) -> &'static str {
        match self {
            SpectralAxis::Wavelength => "wavelength",
            SpectralAxis::Frequency => "frequency",
        }
    }
}

impl fmt::Display for SpectralAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpectralAxis {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wavelength" => Ok(SpectralAxis::Wavelength),
            "frequency" => Ok(SpectralAxis::Frequency),
            _ => Err(SpectralError::UnknownName {
                kind: "axis",
                name: s.to_string(),
            }),
        }
    }
}

/// A dominant component of a spectrum.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Peak {
    /// Fourier component index.
    pub component: usize,
    /// Wavelength or frequency of the component.
    pub axis_value: f64,
    pub magnitude: f64,
}

/// Magnitude spectrum of one series on one axis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Spectrum {
    axis: SpectralAxis,
    timestep: Timestep,
    length: usize,
    components: Vec<usize>,
    axis_values: Vec<f64>,
    magnitudes: Vec<f64>,
    peaks: Vec<Peak>,
}

impl Spectrum {
    pub fn axis(&self) -> SpectralAxis {
        self.axis
    }

    pub fn timestep(&self) -> Timestep {
        self.timestep
    }

    /// Effective series length L in days or months.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Fourier component index of each retained entry.
    pub fn components(&self) -> &[usize] {
        &self.components
    }

    /// Wavelength or frequency of each retained entry.
    pub fn axis_values(&self) -> &[f64] {
        &self.axis_values
    }

    /// Absolute DFT value of each retained entry.
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// Dominant components, largest magnitude first.
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// Indices of the `n_top` largest finite magnitudes.
///
/// The finite magnitudes are sorted descending and the first `n_top` taken
/// without removing duplicates; each taken value then contributes every
/// index holding it, in ascending order. Equal magnitudes therefore report
/// their indices more than once, and the result may exceed `n_top`.
pub fn top_peak_indices(magnitudes: &[f64], n_top: usize) -> Vec<usize> {
    let mut sorted: Vec<f64> = magnitudes.iter().copied().filter(|m| m.is_finite()).collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.truncate(n_top);

    sorted
        .iter()
        .flat_map(|&top| {
            magnitudes
                .iter()
                .enumerate()
                .filter(move |&(_, &m)| m == top)
                .map(|(i, _)| i)
        })
        .collect()
}

/// Compute the magnitude spectrum of `series` and its `n_top` peaks.
///
/// Monthly timesteps resample the series to calendar-month means first. The
/// DFT runs over the (resampled) values; the first `min(L / 2, n)`
/// magnitudes are kept, where L is the effective length. On the wavelength
/// axis component k maps to `L / k` and is kept for `k >= 1` with
/// `L / k <= L / 2`; on the frequency axis it maps to
/// `k / L * samples_per_year` and is kept for `k >= 3`.
///
/// An empty series yields an empty spectrum.
pub fn compute_spectrum(
    series: &SpectralSeries,
    timestep: Timestep,
    axis: SpectralAxis,
    n_top: usize,
) -> Spectrum {
    let series = match timestep {
        Timestep::Daily => series.clone(),
        Timestep::Monthly => series.to_monthly(),
    };
    let length = series.length(timestep);
    let all = magnitudes(series.values());
    let n_kept = (length / 2).min(all.len());
    let l = length as f64;

    let mut components = Vec::new();
    let mut axis_values = Vec::new();
    let mut kept = Vec::new();
    for (k, &m) in all.iter().enumerate().take(n_kept) {
        let value = match axis {
            SpectralAxis::Wavelength => {
                let w = l / k as f64;
                if !w.is_finite() || w > l / 2.0 {
                    continue;
                }
                w
            }
            SpectralAxis::Frequency => {
                if k < MIN_FREQUENCY_COMPONENT {
                    continue;
                }
                k as f64 / l * timestep.per_year()
            }
        };
        components.push(k);
        axis_values.push(value);
        kept.push(m);
    }

    let peaks = top_peak_indices(&kept, n_top)
        .into_iter()
        .map(|i| Peak {
            component: components[i],
            axis_value: axis_values[i],
            magnitude: kept[i],
        })
        .collect();

    Spectrum {
        axis,
        timestep,
        length,
        components,
        axis_values,
        magnitudes: kept,
        peaks,
    }
}

/// Absolute values of the unnormalised forward DFT.
fn magnitudes(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut buffer: Vec<Complex<f64>> = values.iter().map(|&x| Complex::new(x, 0.0)).collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);
    buffer.iter().map(|c| c.norm()).collect()
}
