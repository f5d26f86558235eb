//! Integration tests for reading NetCDF files into gridded fields.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gcmeval_grid::{GriddedField, TimeAxis, standardize};
use gcmeval_io::{IoError, read_field, read_fields_concat, read_time_slice, write_netcdf};
use tempfile::tempdir;

// ---------------------------------------------------------------------------
// Helper: programmatic NetCDF fixture builder
// ---------------------------------------------------------------------------

/// A minimal model-style file: `latitude`/`longitude` dims, a `pr` variable
/// with a `_FillValue`, and a `time_bnds` companion.
struct Fixture {
    lats: Vec<f64>,
    lons: Vec<f64>,
    /// Day offsets of each time step.
    times: Vec<f64>,
    time_units: &'static str,
    calendar: &'static str,
    /// Flat `pr` data in `[t, lat, lon]` order.
    pr: Vec<f64>,
    fill_value: Option<f64>,
}

impl Fixture {
    fn new(nt: usize) -> Self {
        let lats = vec![-35.000_000_01, -34.95];
        let lons = vec![149.0, 149.05];
        let n = nt * lats.len() * lons.len();
        Self {
            lats,
            lons,
            times: (0..nt).map(|t| t as f64).collect(),
            time_units: "days since 2000-01-01 00:00:00",
            calendar: "standard",
            pr: (0..n).map(|i| i as f64).collect(),
            fill_value: None,
        }
    }

    fn with_times(mut self, times: Vec<f64>) -> Self {
        assert_eq!(times.len(), self.times.len());
        self.times = times;
        self
    }

    fn with_calendar(mut self, calendar: &'static str) -> Self {
        self.calendar = calendar;
        self
    }

    fn with_fill_value_at(mut self, index: usize, fill: f64) -> Self {
        self.pr[index] = fill;
        self.fill_value = Some(fill);
        self
    }

    fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = netcdf::create(&path).expect("create NetCDF file");
        let nt = self.times.len();

        file.add_dimension("time", nt).expect("add dim time");
        file.add_dimension("latitude", self.lats.len())
            .expect("add dim latitude");
        file.add_dimension("longitude", self.lons.len())
            .expect("add dim longitude");
        file.add_dimension("bnds", 2).expect("add dim bnds");

        {
            let mut var = file
                .add_variable::<f64>("latitude", &["latitude"])
                .expect("add var latitude");
            var.put_values(&self.lats, ..).expect("put latitude");
        }
        {
            let mut var = file
                .add_variable::<f64>("longitude", &["longitude"])
                .expect("add var longitude");
            var.put_values(&self.lons, ..).expect("put longitude");
        }
        {
            let mut var = file
                .add_variable::<f64>("time", &["time"])
                .expect("add var time");
            var.put_values(&self.times, ..).expect("put time");
            var.put_attribute("units", self.time_units)
                .expect("add time units");
            var.put_attribute("calendar", self.calendar)
                .expect("add time calendar");
        }
        {
            let bounds: Vec<f64> = self.times.iter().flat_map(|&t| [t, t + 1.0]).collect();
            let mut var = file
                .add_variable::<f64>("time_bnds", &["time", "bnds"])
                .expect("add var time_bnds");
            var.put_values(&bounds, ..).expect("put time_bnds");
        }
        {
            let mut var = file
                .add_variable::<f64>("pr", &["time", "latitude", "longitude"])
                .expect("add var pr");
            if let Some(fv) = self.fill_value {
                var.put_attribute("_FillValue", fv).expect("add _FillValue");
            }
            var.put_attribute("units", "kg m-2 s-1").expect("add units");
            var.put_values(&self.pr, ..).expect("put pr");
        }
        path
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn reads_grid_time_and_auxiliary() {
    let dir = tempdir().unwrap();
    let path = Fixture::new(3).write(dir.path(), "pr.nc");

    let field = read_field(&path).unwrap();
    assert_eq!(field.lat_dim(), "latitude");
    assert_eq!(field.lon_dim(), "longitude");
    assert_eq!(field.lats(), &[-35.000_000_01, -34.95]);
    assert_eq!(
        field.time(),
        &TimeAxis::Dates(vec![ymd(2000, 1, 1), ymd(2000, 1, 2), ymd(2000, 1, 3)])
    );
    assert_eq!(field.values("pr").unwrap().len(), 12);
    assert_eq!(field.variable("pr").unwrap().units(), Some("kg m-2 s-1"));
    assert_eq!(field.auxiliary_names().collect::<Vec<_>>(), vec!["time_bnds"]);

    let field = standardize(field);
    assert_eq!(field.lat_dim(), "lat");
    assert_eq!(field.lon_dim(), "lon");
}

#[test]
fn fill_values_become_missing() {
    let dir = tempdir().unwrap();
    let path = Fixture::new(2)
        .with_fill_value_at(5, -9999.0)
        .write(dir.path(), "pr.nc");

    let field = read_field(&path).unwrap();
    let values = field.values("pr").unwrap();
    assert!(values[5].is_nan());
    assert_eq!(values.iter().filter(|v| v.is_nan()).count(), 1);
    assert_eq!(values[4], 4.0);
}

#[test]
fn noleap_calendar_dates() {
    let dir = tempdir().unwrap();
    let path = Fixture::new(2)
        .with_times(vec![58.0, 59.0])
        .with_calendar("noleap")
        .write(dir.path(), "pr.nc");

    let field = read_field(&path).unwrap();
    assert_eq!(
        field.time(),
        &TimeAxis::Dates(vec![ymd(2000, 2, 28), ymd(2000, 3, 1)])
    );
}

#[test]
fn unsupported_calendar_is_error() {
    let dir = tempdir().unwrap();
    let path = Fixture::new(1)
        .with_calendar("360_day")
        .write(dir.path(), "pr.nc");
    assert!(matches!(
        read_field(&path),
        Err(IoError::InvalidTime { .. })
    ));
}

#[test]
fn missing_file() {
    let err = read_field(Path::new("/nonexistent/AWAP_rain_day.nc")).unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }));
}

#[test]
fn write_then_read_static_field_keeps_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mask.nc");
    let field = GriddedField::new(TimeAxis::Static, vec![-35.0, -34.0], vec![149.0])
        .with_variable("mask", vec![1.0, f64::NAN], None)
        .unwrap();
    write_netcdf(&field, &path).unwrap();

    let back = read_field(&path).unwrap();
    assert_eq!(back.time(), &TimeAxis::Static);
    let v = back.values("mask").unwrap();
    assert_eq!(v[0], 1.0);
    assert!(v[1].is_nan());
}

#[test]
fn concat_and_slice_across_files() {
    let dir = tempdir().unwrap();
    // Second year written first to check the result is date-sorted.
    let y2001 = Fixture::new(2)
        .with_times(vec![366.0, 367.0])
        .write(dir.path(), "pr_2001.nc");
    let y2000 = Fixture::new(2)
        .with_times(vec![0.0, 1.0])
        .write(dir.path(), "pr_2000.nc");

    let all = read_fields_concat(&[y2001.clone(), y2000.clone()]).unwrap();
    assert_eq!(all.n_time(), 4);
    assert_eq!(all.time().dates().unwrap()[0], ymd(2000, 1, 1));

    let window = read_time_slice(&[y2000, y2001], ymd(2000, 1, 2), ymd(2001, 1, 1), "pr").unwrap();
    assert_eq!(
        window.time(),
        &TimeAxis::Dates(vec![ymd(2000, 1, 2), ymd(2001, 1, 1)])
    );
    assert_eq!(window.lat_dim(), "lat");
    assert_eq!(window.variable_names().collect::<Vec<_>>(), vec!["pr"]);
}
