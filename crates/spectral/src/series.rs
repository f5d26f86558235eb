//! Dated point series and monthly resampling.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use gcmeval_calendar::{elapsed_days, elapsed_months, month_start};
use gcmeval_stats::nan_mean;

use crate::error::SpectralError;
use crate::spectrum::Timestep;

/// Values at strictly increasing dates.
///
/// # Example
///
/// ```ignore
/// use gcmeval_spectral::SpectralSeries;
///
/// let series = SpectralSeries::new(dates, values)?;
/// let monthly = series.to_monthly();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralSeries {
    times: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl SpectralSeries {
    /// Creates a series after validating it.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SpectralError::LengthMismatch`] | `times.len() != values.len()` |
    /// | [`SpectralError::UnorderedTimes`] | a timestamp is not after its predecessor |
    pub fn new(times: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, SpectralError> {
        if times.len() != values.len() {
            return Err(SpectralError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SpectralError::UnorderedTimes { index: i + 1 });
        }
        Ok(Self { times, values })
    }

    pub fn times(&self) -> &[NaiveDate] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean per calendar month, stamped at the first of the month.
    ///
    /// Every month from the first to the last timestamp is present; months
    /// without a finite value are `NaN`.
    pub fn to_monthly(&self) -> SpectralSeries {
        let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) else {
            return self.clone();
        };

        let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for (&t, &v) in self.times.iter().zip(&self.values) {
            buckets.entry(month_start(t)).or_default().push(v);
        }

        let mut times = Vec::new();
        let mut values = Vec::new();
        let end = month_start(last);
        let mut month = month_start(first);
        while month <= end {
            times.push(month);
            values.push(buckets.get(&month).map_or(f64::NAN, |v| nan_mean(v)));
            match month.checked_add_months(Months::new(1)) {
                Some(next) => month = next,
                None => break,
            }
        }
        SpectralSeries { times, values }
    }

    /// Effective length: elapsed days (daily) or months (monthly) from the
    /// first to the last timestamp. Zero for an empty series.
    pub fn length(&self, timestep: Timestep) -> usize {
        let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) else {
            return 0;
        };
        match timestep {
            Timestep::Daily => elapsed_days(first, last),
            Timestep::Monthly => elapsed_months(first, last),
        }
    }
}
