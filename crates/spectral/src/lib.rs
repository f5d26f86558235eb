//! # gcmeval-spectral
//!
//! Fourier magnitude spectra of point time series and their dominant
//! periodic components.
//!
//! ## Analysis Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["SpectralSeries::new(times, values)?"] -->|"validate"| B["SpectralSeries"]
//!     B -->|".to_monthly()"| B
//!     B -->|"compute_spectrum(&s, timestep, axis, n_top)"| C["Spectrum"]
//!     C --> D[".axis_values()"]
//!     C --> E[".magnitudes()"]
//!     C --> F[".peaks()"]
//! ```
//!
//! ## Axes
//!
//! | Axis | Component k maps to | Kept |
//! |------|---------------------|------|
//! | [`SpectralAxis::Wavelength`] | `L / k` samples | `L / k <= L / 2` |
//! | [`SpectralAxis::Frequency`] | `k / L * 365` or `* 12` cycles/year | `k >= 3` |
//!
//! ## Quick Start
//!
//! ```ignore
//! use gcmeval_spectral::{SpectralAxis, SpectralSeries, Timestep, compute_spectrum};
//!
//! let series = SpectralSeries::new(dates, values)?;
//! let spectrum = compute_spectrum(&series, Timestep::Monthly, SpectralAxis::Frequency, 3);
//! for peak in spectrum.peaks() {
//!     println!("{:.2} cycles/year", peak.axis_value);
//! }
//! ```

mod error;
mod series;
mod spectrum;

pub use error::SpectralError;
pub use series::SpectralSeries;
pub use spectrum::{
    Peak, SpectralAxis, Spectrum, Timestep, compute_spectrum, top_peak_indices,
};
