//! Tidy long-format tables.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use gcmeval_calendar::{Season, TimeLabel};
use gcmeval_stats::nan_mean_iter;
use serde::Serialize;

use crate::error::EvaluateError;

/// One value of one dataset at one time label, optionally at one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyRecord {
    /// Reference name or `"{prefix}_{gcm}"`.
    pub dataset_type: String,
    pub time_scale: TimeLabel,
    pub statistic: String,
    /// Date of the time step for series-like tables.
    pub time: Option<NaiveDate>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Canonical variable name, set by multi-variable tables.
    pub var: Option<String>,
    pub value: f64,
}

impl TidyRecord {
    /// Calendar year of the time step.
    pub fn year(&self) -> Option<i32> {
        self.time.map(|d| d.year())
    }

    /// Calendar month of the time step, or of a monthly label.
    pub fn month(&self) -> Option<u8> {
        match (self.time, self.time_scale) {
            (Some(d), _) => u8::try_from(d.month()).ok(),
            (None, TimeLabel::Month(m)) => Some(m),
            (None, _) => None,
        }
    }

    /// Season of the time step, or of a seasonal label.
    pub fn season(&self) -> Option<Season> {
        match self.time_scale {
            TimeLabel::Season(s) => Some(s),
            _ => self.month().and_then(|m| Season::from_month(m).ok()),
        }
    }
}

/// CSV layout of a record, with the derived calendar columns.
#[derive(Serialize)]
struct CsvRow<'a> {
    dataset_type: &'a str,
    time_scale: TimeLabel,
    statistic: &'a str,
    var: Option<&'a str>,
    time: Option<NaiveDate>,
    year: Option<i32>,
    month: Option<u8>,
    season: Option<Season>,
    lat: Option<f64>,
    lon: Option<f64>,
    value: f64,
}

impl<'a> From<&'a TidyRecord> for CsvRow<'a> {
    fn from(r: &'a TidyRecord) -> Self {
        Self {
            dataset_type: &r.dataset_type,
            time_scale: r.time_scale,
            statistic: &r.statistic,
            var: r.var.as_deref(),
            time: r.time,
            year: r.year(),
            month: r.month(),
            season: r.season(),
            lat: r.lat,
            lon: r.lon,
            value: r.value,
        }
    }
}

/// An ordered collection of tidy records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TidyTable {
    records: Vec<TidyRecord>,
}

impl TidyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TidyRecord) {
        self.records.push(record);
    }

    /// Append all records of `other`, keeping their order.
    pub fn append(&mut self, other: TidyTable) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[TidyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct dataset types.
    pub fn dataset_types(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.dataset_type.as_str()).collect()
    }

    /// Distinct time-scale labels.
    pub fn time_labels(&self) -> BTreeSet<TimeLabel> {
        self.records.iter().map(|r| r.time_scale).collect()
    }

    /// Records of one dataset type.
    pub fn filter_dataset<'a>(
        &'a self,
        dataset_type: &'a str,
    ) -> impl Iterator<Item = &'a TidyRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.dataset_type == dataset_type)
    }

    /// Average monthly rows over years, per dataset type, statistic and
    /// variable. Missing values are ignored; the result has no dates.
    pub fn monthly_climatology(&self) -> TidyTable {
        type Key<'a> = (&'a str, &'a str, Option<&'a str>, u8);
        let mut groups: BTreeMap<Key<'_>, Vec<f64>> = BTreeMap::new();
        for r in &self.records {
            if let TimeLabel::Month(m) = r.time_scale {
                groups
                    .entry((&r.dataset_type, &r.statistic, r.var.as_deref(), m))
                    .or_default()
                    .push(r.value);
            }
        }

        let records = groups
            .into_iter()
            .map(|((dataset_type, statistic, var, month), values)| TidyRecord {
                dataset_type: dataset_type.to_string(),
                time_scale: TimeLabel::Month(month),
                statistic: statistic.to_string(),
                time: None,
                lat: None,
                lon: None,
                var: var.map(str::to_string),
                value: nan_mean_iter(values),
            })
            .collect();
        TidyTable { records }
    }

    /// Write the table as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluateError::Output`] if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), EvaluateError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for record in &self.records {
            wtr.serialize(CsvRow::from(record))?;
        }
        wtr.flush().map_err(|e| EvaluateError::Output {
            reason: e.to_string(),
        })
    }

    /// Write the table as CSV to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluateError::Output`] if the file cannot be created or
    /// written.
    pub fn write_csv_path(&self, path: &Path) -> Result<(), EvaluateError> {
        let file = File::create(path).map_err(|e| EvaluateError::Output {
            reason: format!("{}: {e}", path.display()),
        })?;
        self.write_csv(file)
    }
}

impl FromIterator<TidyRecord> for TidyTable {
    fn from_iter<I: IntoIterator<Item = TidyRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
