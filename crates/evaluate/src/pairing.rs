//! Reference/simulation pairing and spatial correlation.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use gcmeval_calendar::TimeLabel;
use gcmeval_stats::pearson_correlation;
use serde::Serialize;

use crate::table::{TidyRecord, TidyTable};

/// A simulated value next to the reference value of the same cell and time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedValue {
    pub dataset_type: String,
    pub time_scale: TimeLabel,
    pub statistic: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub reference: f64,
    pub simulated: f64,
}

/// Correlation across cells for one simulation, time label and statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialCorrelation {
    pub dataset_type: String,
    pub time_scale: TimeLabel,
    pub statistic: String,
    /// Number of pairs with both values present.
    pub n: usize,
    /// `None` with fewer than three complete pairs.
    pub r: Option<f64>,
}

/// Row identity shared by a reference row and its simulated counterparts.
/// Coordinates compare by bit pattern; they are rounded on read.
type JoinKey = (TimeLabel, String, Option<NaiveDate>, Option<u64>, Option<u64>, Option<String>);

fn join_key(r: &TidyRecord) -> JoinKey {
    (
        r.time_scale,
        r.statistic.clone(),
        r.time,
        r.lat.map(f64::to_bits),
        r.lon.map(f64::to_bits),
        r.var.clone(),
    )
}

/// Pair every non-reference row with the reference row sharing its time
/// label, statistic, time, cell and variable. Rows without a reference
/// counterpart are dropped.
pub fn pair_with_reference(table: &TidyTable, ref_name: &str) -> Vec<PairedValue> {
    let reference: HashMap<JoinKey, f64> = table
        .filter_dataset(ref_name)
        .map(|r| (join_key(r), r.value))
        .collect();

    table
        .records()
        .iter()
        .filter(|r| r.dataset_type != ref_name)
        .filter_map(|r| {
            let reference = *reference.get(&join_key(r))?;
            Some(PairedValue {
                dataset_type: r.dataset_type.clone(),
                time_scale: r.time_scale,
                statistic: r.statistic.clone(),
                lat: r.lat,
                lon: r.lon,
                reference,
                simulated: r.value,
            })
        })
        .collect()
}

/// Pearson correlation of reference vs simulated values over all pairs of
/// one dataset type.
pub fn spatial_correlation(pairs: &[PairedValue], dataset_type: &str) -> Option<f64> {
    let (x, y): (Vec<f64>, Vec<f64>) = pairs
        .iter()
        .filter(|p| p.dataset_type == dataset_type)
        .map(|p| (p.reference, p.simulated))
        .unzip();
    pearson_correlation(&x, &y)
}

/// [`spatial_correlation`] per dataset type, time label and statistic.
pub fn spatial_correlations(pairs: &[PairedValue]) -> Vec<SpatialCorrelation> {
    let mut groups: BTreeMap<(&str, TimeLabel, &str), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for p in pairs {
        let (x, y) = groups
            .entry((p.dataset_type.as_str(), p.time_scale, p.statistic.as_str()))
            .or_default();
        x.push(p.reference);
        y.push(p.simulated);
    }

    groups
        .into_iter()
        .map(|((dataset_type, time_scale, statistic), (x, y))| SpatialCorrelation {
            dataset_type: dataset_type.to_string(),
            time_scale,
            statistic: statistic.to_string(),
            n: x
                .iter()
                .zip(&y)
                .filter(|(a, b)| a.is_finite() && b.is_finite())
                .count(),
            r: pearson_correlation(&x, &y),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cell(dataset: &str, lat: f64, value: f64) -> TidyRecord {
        TidyRecord {
            dataset_type: dataset.to_string(),
            time_scale: TimeLabel::Annual,
            statistic: "mean".to_string(),
            time: None,
            lat: Some(lat),
            lon: Some(149.0),
            var: None,
            value,
        }
    }

    fn table() -> TidyTable {
        let mut rows = Vec::new();
        for (i, lat) in [-36.0, -35.0, -34.0, -33.0].into_iter().enumerate() {
            let v = i as f64;
            rows.push(cell("AWAP", lat, v));
            rows.push(cell("ISIMIP_GCM1", lat, 2.0 * v + 1.0));
            rows.push(cell("ISIMIP_GCM2", lat, -v));
        }
        // No reference at this cell.
        rows.push(cell("ISIMIP_GCM1", -10.0, 5.0));
        rows.into_iter().collect()
    }

    #[test]
    fn pairs_join_on_cell() {
        let pairs = pair_with_reference(&table(), "AWAP");
        assert_eq!(pairs.len(), 8);
        let p = pairs
            .iter()
            .find(|p| p.dataset_type == "ISIMIP_GCM1" && p.lat == Some(-34.0))
            .unwrap();
        assert_eq!((p.reference, p.simulated), (2.0, 5.0));
    }

    #[test]
    fn correlation_per_dataset() {
        let pairs = pair_with_reference(&table(), "AWAP");
        assert_relative_eq!(spatial_correlation(&pairs, "ISIMIP_GCM1").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(spatial_correlation(&pairs, "ISIMIP_GCM2").unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(spatial_correlation(&pairs, "ISIMIP_GCM3"), None);
    }

    #[test]
    fn grouped_correlations() {
        let pairs = pair_with_reference(&table(), "AWAP");
        let all = spatial_correlations(&pairs);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].dataset_type, "ISIMIP_GCM1");
        assert_eq!(all[0].n, 4);
    }
}
