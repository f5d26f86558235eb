//! End-to-end tests: statistic files on disk to tidy tables.

use std::collections::BTreeMap;
use std::path::Path;

use approx::assert_relative_eq;
use chrono::NaiveDate;
use gcmeval_calendar::{Season, TimeLabel, TimeScale};
use gcmeval_evaluate::{
    BiasType, DailySources, EvaluateConfig, EvaluateError, Point, ReadOptions, Source, SourceKey,
    VariableNames, climatology_table, daily_table, gridded_table, mean_field_table,
    pair_with_reference, read_one_source, spatial_correlation, spatiotemporal_table,
    timeseries_table,
};
use gcmeval_grid::{GriddedField, TimeAxis};
use gcmeval_io::{MaskSource, write_netcdf};
use tempfile::tempdir;

const LATS: [f64; 2] = [-35.0, -34.95];
const LONS: [f64; 2] = [149.0, 149.05];

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_field(path: &Path, time: TimeAxis, var: &str, values: Vec<f64>) {
    write_field_on(path, &LATS, time, var, values);
}

fn write_field_on(path: &Path, lats: &[f64], time: TimeAxis, var: &str, values: Vec<f64>) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let field = GriddedField::new(time, lats.to_vec(), LONS.to_vec())
        .with_dim_names("latitude", "longitude")
        .with_variable(var, values, Some("mm/day".to_string()))
        .unwrap();
    write_netcdf(&field, path).unwrap();
}

fn stats(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Reference `AWAP` and one GCM `GCM1` whose files name the variable `pr`.
struct Layout {
    dir: tempfile::TempDir,
}

impl Layout {
    fn new() -> Self {
        Self { dir: tempdir().unwrap() }
    }

    fn ref_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("ref")
    }

    fn sim_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("sim")
    }

    fn config(&self) -> EvaluateConfig {
        EvaluateConfig::new(self.ref_dir(), self.sim_dir(), "AWAP", "ISIMIP", 1976, 2005)
            .unwrap()
            .with_gcms(["GCM1"])
    }

    fn names(&self) -> VariableNames {
        VariableNames::new("rain_day").with_sim_in_nc("pr")
    }

    fn write_annual_means(&self) {
        write_field(
            &self.ref_dir().join("AWAP_rain_day_yearmean_1976_2005_mean.nc"),
            TimeAxis::Dates(vec![ymd(1990, 7, 1)]),
            "rain_day",
            vec![1.0, 2.0, 3.0, 4.0],
        );
        write_field(
            &self.sim_dir().join("GCM1/ISIMIP_GCM1_rain_day_yearmean_1976_2005_mean.nc"),
            TimeAxis::Dates(vec![ymd(1990, 7, 1)]),
            "pr",
            vec![2.0, 4.0, 6.0, 8.0],
        );
    }
}

#[test]
fn annual_gridded_table_has_every_dataset() {
    let layout = Layout::new();
    layout.write_annual_means();

    let table = gridded_table(
        &layout.config(),
        &layout.names(),
        &stats(&["mean"]),
        &[TimeScale::Annual],
    )
    .unwrap();

    assert_eq!(table.len(), 8);
    assert_eq!(
        table.dataset_types().into_iter().collect::<Vec<_>>(),
        vec!["AWAP", "ISIMIP_GCM1"]
    );
    assert!(table.records().iter().all(|r| r.time_scale == TimeLabel::Annual));
    assert!(table.records().iter().all(|r| r.time.is_none()));

    let sim: Vec<f64> = table.filter_dataset("ISIMIP_GCM1").map(|r| r.value).collect();
    assert_eq!(sim, vec![2.0, 4.0, 6.0, 8.0]);

    let pairs = pair_with_reference(&table, "AWAP");
    assert_eq!(pairs.len(), 4);
    assert_relative_eq!(
        spatial_correlation(&pairs, "ISIMIP_GCM1").unwrap(),
        1.0,
        epsilon = 1e-12
    );
}

#[test]
fn seasonal_mean_files_are_regrouped() {
    let layout = Layout::new();
    let dates = vec![ymd(1990, 1, 16), ymd(1990, 4, 16), ymd(1990, 7, 16), ymd(1990, 10, 16)];
    let values: Vec<f64> = (0..16).map(|i| i as f64).collect();
    write_field(
        &layout.ref_dir().join("AWAP_rain_day_seasmean_1976_2005_mean.nc"),
        TimeAxis::Dates(dates),
        "rain_day",
        values,
    );
    let config = layout.config().with_gcms(Vec::<String>::new());

    let table = gridded_table(
        &config,
        &layout.names(),
        &stats(&["mean"]),
        &[TimeScale::Seasonal],
    )
    .unwrap();

    let labels: Vec<String> = table
        .time_labels()
        .into_iter()
        .map(|l| l.to_string())
        .collect();
    assert_eq!(labels, vec!["DJF", "MAM", "JJA", "SON"]);
    let jja: Vec<f64> = table
        .records()
        .iter()
        .filter(|r| r.time_scale == TimeLabel::Season(Season::Jja))
        .map(|r| r.value)
        .collect();
    assert_eq!(jja, vec![8.0, 9.0, 10.0, 11.0]);
}

#[test]
fn timeseries_relabels_seasons_and_averages_space() {
    let layout = Layout::new();
    let dates = vec![ymd(1990, 1, 16), ymd(1990, 4, 16)];
    write_field(
        &layout.ref_dir().join("AWAP_rain_day_seasmean_1976_2005_merged.nc"),
        TimeAxis::Dates(dates.clone()),
        "rain_day",
        vec![1.0, 2.0, 3.0, 4.0, 10.0, 10.0, 10.0, f64::NAN],
    );
    write_field(
        &layout.sim_dir().join("GCM1/ISIMIP_GCM1_rain_day_seasmean_1976_2005_merged.nc"),
        TimeAxis::Dates(dates),
        "pr",
        vec![0.0; 8],
    );

    let table = timeseries_table(
        &layout.config(),
        &layout.names(),
        &stats(&["mean"]),
        &[TimeScale::Seasonal],
        None,
    )
    .unwrap();

    let awap: Vec<_> = table.filter_dataset("AWAP").collect();
    assert_eq!(awap.len(), 2);
    assert_eq!(awap[0].time_scale, TimeLabel::Season(Season::Djf));
    assert_eq!(awap[1].time_scale, TimeLabel::Season(Season::Mam));
    assert_relative_eq!(awap[0].value, 2.5);
    assert_relative_eq!(awap[1].value, 10.0);
    assert_eq!(awap[1].year(), Some(1990));
    assert_eq!(awap[0].lat, None);
}

#[test]
fn point_selection_uses_nearest_cell() {
    let layout = Layout::new();
    write_field(
        &layout.ref_dir().join("AWAP_rain_day_yearmean_1976_2005_merged.nc"),
        TimeAxis::Dates(vec![ymd(1990, 7, 1)]),
        "rain_day",
        vec![1.0, 2.0, 3.0, 4.0],
    );
    let config = layout.config().with_gcms(Vec::<String>::new());

    let table = timeseries_table(
        &config,
        &layout.names(),
        &stats(&["mean"]),
        &[TimeScale::Annual],
        Some(Point::new(-34.96, 149.04)),
    )
    .unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.records()[0].value, 4.0);
}

#[test]
fn mask_sets_excluded_cells_missing() {
    let layout = Layout::new();
    layout.write_annual_means();
    let mask_path = layout.dir.path().join("mask.nc");
    write_field(
        &mask_path,
        TimeAxis::Static,
        "mask",
        vec![1.0, 1.0, 1.0, 0.0],
    );
    let config = layout.config().with_mask(MaskSource::Path(mask_path));

    let table = gridded_table(&config, &layout.names(), &stats(&["mean"]), &[TimeScale::Annual])
        .unwrap();
    let awap: Vec<f64> = table.filter_dataset("AWAP").map(|r| r.value).collect();
    assert_eq!(&awap[..3], &[1.0, 2.0, 3.0]);
    assert!(awap[3].is_nan());
}

#[test]
fn missing_gcm_file_propagates_unless_partial() {
    let layout = Layout::new();
    layout.write_annual_means();
    let config = layout.config().with_gcms(["GCM1", "GCM2"]);

    let err = gridded_table(&config, &layout.names(), &stats(&["mean"]), &[TimeScale::Annual])
        .unwrap_err();
    assert!(err.is_missing_input());
    assert!(err.to_string().contains("ISIMIP_GCM2_rain_day_yearmean_1976_2005_mean.nc"));

    let table = gridded_table(
        &config.with_allow_partial(true),
        &layout.names(),
        &stats(&["mean"]),
        &[TimeScale::Annual],
    )
    .unwrap();
    assert_eq!(
        table.dataset_types().into_iter().collect::<Vec<_>>(),
        vec!["AWAP", "ISIMIP_GCM1"]
    );
}

#[test]
fn bias_and_lag1_products_are_loaded() {
    let layout = Layout::new();
    layout.write_annual_means();
    write_field(
        &layout
            .sim_dir()
            .join("GCM1/bias_AWAP/bias_abs_rain_day_yearmean_1976_2005.nc"),
        TimeAxis::Dates(vec![ymd(1990, 7, 1)]),
        "rain_day",
        vec![1.0, 2.0, 3.0, 4.0],
    );
    write_field(
        &layout
            .sim_dir()
            .join("GCM1/ISIMIP_GCM1_rain_day_yearmean_1976_2005_lag1corr.nc"),
        TimeAxis::Static,
        "pr",
        vec![0.5; 4],
    );

    let fields = read_one_source(
        &layout.config(),
        &layout.names(),
        &[Source::Reference, Source::Simulation("GCM1".to_string())],
        "mean",
        &[TimeScale::Annual],
        &ReadOptions::mean().with_bias_types([BiasType::Abs]),
    )
    .unwrap();

    let keys: Vec<String> = fields.keys(TimeScale::Annual).map(|k| k.to_string()).collect();
    assert_eq!(
        keys,
        vec!["AWAP", "ISIMIP_GCM1", "ISIMIP_GCM1_lag1corr", "bias_abs"]
    );
    let lag1 = fields
        .get(TimeScale::Annual, &SourceKey::Lag1Corr("ISIMIP_GCM1".to_string()))
        .unwrap();
    assert_eq!(lag1.lat_dim(), "lat");
    assert_eq!(lag1.values("rain_day").unwrap(), &[0.5; 4]);
    assert!(!lag1.contains("time_bnds"));
}

#[test]
fn trend_bias_is_loaded_without_regrouping() {
    let layout = Layout::new();
    let dates = vec![ymd(1990, 1, 16), ymd(1990, 7, 16)];
    write_field(
        &layout.ref_dir().join("AWAP_rain_day_seasmean_1976_2005_mean.nc"),
        TimeAxis::Dates(dates.clone()),
        "rain_day",
        vec![1.0; 8],
    );
    write_field(
        &layout.sim_dir().join("GCM1/ISIMIP_GCM1_rain_day_seasmean_1976_2005_mean.nc"),
        TimeAxis::Dates(dates.clone()),
        "pr",
        vec![2.0; 8],
    );
    write_field(
        &layout
            .sim_dir()
            .join("GCM1/bias_AWAP/bias_trend_abs_rain_day_seasmean_1976_2005.nc"),
        TimeAxis::Dates(dates.clone()),
        "rain_day",
        vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8],
    );

    let fields = read_one_source(
        &layout.config(),
        &layout.names(),
        &[Source::Reference, Source::Simulation("GCM1".to_string())],
        "mean",
        &[TimeScale::Seasonal],
        &ReadOptions::mean().with_bias_types([BiasType::TrendAbs]),
    )
    .unwrap();

    let keys: Vec<String> = fields.keys(TimeScale::Seasonal).map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["AWAP", "ISIMIP_GCM1", "bias_trend_abs"]);

    let trend = fields
        .get(TimeScale::Seasonal, &SourceKey::Bias(BiasType::TrendAbs))
        .unwrap();
    assert_eq!(trend.time(), &TimeAxis::Dates(dates));
    assert_eq!(trend.values("rain_day").unwrap()[4], 0.5);

    // The main fields are regrouped to season buckets.
    let awap = fields
        .get(TimeScale::Seasonal, &SourceKey::Reference("AWAP".to_string()))
        .unwrap();
    assert_eq!(awap.time(), &TimeAxis::Seasons(vec![Season::Djf, Season::Jja]));
}

#[test]
fn mean_field_averages_each_cell_over_time() {
    let layout = Layout::new();
    write_field(
        &layout.ref_dir().join("AWAP_rain_day_yearmean_1976_2005_mean.nc"),
        TimeAxis::Dates(vec![ymd(1990, 7, 1), ymd(1991, 7, 1)]),
        "rain_day",
        vec![1.0, 2.0, 3.0, 4.0, 3.0, f64::NAN, 5.0, f64::NAN],
    );
    let config = layout.config().with_gcms(Vec::<String>::new());

    let table = mean_field_table(
        &config,
        &layout.names(),
        &stats(&["mean"]),
        &[TimeScale::Annual],
        None,
    )
    .unwrap();

    assert_eq!(table.len(), 4);
    let records = table.records();
    assert!(records.iter().all(|r| r.time_scale == TimeLabel::Annual));
    assert!(records.iter().all(|r| r.time.is_none()));
    let values: Vec<f64> = records.iter().map(|r| r.value).collect();
    assert_relative_eq!(values[0], 2.0);
    assert_relative_eq!(values[1], 2.0);
    assert_relative_eq!(values[2], 4.0);
    assert_relative_eq!(values[3], 4.0);
    assert_eq!((records[3].lat, records[3].lon), (Some(-34.95), Some(149.05)));
}

#[test]
fn mean_field_masks_after_rounding() {
    let layout = Layout::new();
    let unrounded = [-35.00000001, -34.95000002];
    write_field_on(
        &layout.ref_dir().join("AWAP_rain_day_yearmean_1976_2005_mean.nc"),
        &unrounded,
        TimeAxis::Dates(vec![ymd(1990, 7, 1)]),
        "rain_day",
        vec![1.0, 2.0, 3.0, 4.0],
    );
    let mask_path = layout.dir.path().join("mask.nc");
    write_field(
        &mask_path,
        TimeAxis::Static,
        "mask",
        vec![1.0, 1.0, 1.0, 0.0],
    );
    let config = layout
        .config()
        .with_gcms(Vec::<String>::new())
        .with_mask(MaskSource::Path(mask_path));

    let table = mean_field_table(
        &config,
        &layout.names(),
        &stats(&["mean"]),
        &[TimeScale::Annual],
        None,
    )
    .unwrap();

    let records = table.records();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].lat, Some(-35.0));
    let values: Vec<f64> = records.iter().map(|r| r.value).collect();
    assert_eq!(&values[..3], &[1.0, 2.0, 3.0]);
    assert!(values[3].is_nan());
}

#[test]
fn spatiotemporal_keeps_dates_and_labels_seasons() {
    let layout = Layout::new();
    let dates = vec![
        ymd(1990, 1, 16),
        ymd(1990, 4, 16),
        ymd(1990, 7, 16),
        ymd(1990, 10, 16),
    ];
    write_field(
        &layout.ref_dir().join("AWAP_rain_day_seasmean_1976_2005_merged.nc"),
        TimeAxis::Dates(dates.clone()),
        "rain_day",
        (0..16).map(|i| i as f64).collect(),
    );
    let config = layout.config().with_gcms(Vec::<String>::new());

    let table = spatiotemporal_table(
        &config,
        &layout.names(),
        &stats(&["mean"]),
        &[TimeScale::Seasonal],
        None,
    )
    .unwrap();

    // One row per (date, cell).
    assert_eq!(table.len(), 16);
    let expected = [Season::Djf, Season::Mam, Season::Jja, Season::Son];
    for (i, record) in table.records().iter().enumerate() {
        let step = i / 4;
        assert_eq!(record.time, Some(dates[step]));
        assert_eq!(record.time_scale, TimeLabel::Season(expected[step]));
        assert_eq!(record.value, i as f64);
        assert!(record.lat.is_some() && record.lon.is_some());
    }
    assert_eq!(table.records()[9].season(), Some(Season::Jja));
}

#[test]
fn climatology_needs_a_mapping_per_variable() {
    let layout = Layout::new();
    let config = layout.config();
    let err = climatology_table(
        &config,
        &stats(&["qtot"]),
        &BTreeMap::new(),
        &stats(&["mean"]),
    )
    .unwrap_err();
    assert!(matches!(err, EvaluateError::MissingVariableMapping { .. }));
}

#[test]
fn climatology_by_month() {
    let layout = Layout::new();
    let dates = vec![ymd(1990, 1, 1), ymd(1990, 2, 1), ymd(1991, 1, 1)];
    write_field(
        &layout.ref_dir().join("AWAP_rain_day_monmean_1976_2005_merged.nc"),
        TimeAxis::Dates(dates),
        "rain_day",
        vec![1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0],
    );
    let config = layout.config().with_gcms(Vec::<String>::new());
    let mut mappings = BTreeMap::new();
    mappings.insert("rain_day".to_string(), layout.names());

    let table = climatology_table(&config, &stats(&["rain_day"]), &mappings, &stats(&["mean"]))
        .unwrap();
    assert_eq!(table.len(), 3);
    assert!(table.records().iter().all(|r| r.var.as_deref() == Some("rain_day")));

    let clim = table.monthly_climatology();
    let values: Vec<(TimeLabel, f64)> = clim.records().iter().map(|r| (r.time_scale, r.value)).collect();
    assert_eq!(values, vec![(TimeLabel::Month(1), 2.0), (TimeLabel::Month(2), 2.0)]);
}

#[test]
fn daily_simulation_units_are_converted() {
    let layout = Layout::new();
    let dates = vec![ymd(1989, 12, 31), ymd(1990, 1, 1), ymd(1990, 1, 2)];
    write_field(
        &layout.dir.path().join("daily/rain_day/AWAP_rain_day_1990.nc"),
        TimeAxis::Dates(dates[1..].to_vec()),
        "rain_day",
        vec![5.0; 8],
    );
    write_field(
        &layout.dir.path().join("cmip/GCM1/pr/pr_day_GCM1.nc"),
        TimeAxis::Dates(dates),
        "pr",
        vec![1.0; 12],
    );

    let config = EvaluateConfig::new(layout.ref_dir(), layout.sim_dir(), "AWAP", "ISIMIP", 1990, 1990)
        .unwrap()
        .with_gcms(["GCM1"]);
    let daily = DailySources {
        ref_dir: layout.dir.path().join("daily/#VAR#").display().to_string(),
        sim_dir: layout.dir.path().join("cmip/#GCM#/#VAR#").display().to_string(),
    };
    let names = VariableNames::new("rain_day").with_sim("pr");

    let table = daily_table(&config, &names, &daily, Point::new(-35.0, 149.0)).unwrap();

    let sim: Vec<_> = table.filter_dataset("ISIMIP_GCM1").collect();
    // 1989-12-31 is outside the evaluation period.
    assert_eq!(sim.len(), 2);
    assert_relative_eq!(sim[0].value, 86_400.0);
    assert_eq!(sim[0].time, Some(ymd(1990, 1, 1)));
    assert_eq!(sim[0].time_scale, TimeLabel::Daily);

    let awap: Vec<_> = table.filter_dataset("AWAP").collect();
    assert_eq!(awap.len(), 2);
    assert_relative_eq!(awap[0].value, 5.0);
    assert_eq!((awap[0].lat, awap[0].lon), (Some(-35.0), Some(149.0)));
}
