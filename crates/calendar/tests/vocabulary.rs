use chrono::{Datelike, NaiveDate};
use gcmeval_calendar::{Season, TimeLabel, TimeScale, elapsed_months, month_to_season};

#[test]
fn seasonal_labels_follow_calendar_months_over_a_year() {
    let mut date = NaiveDate::from_ymd_opt(2001, 1, 15).unwrap();
    let mut seen = Vec::new();
    for _ in 0..12 {
        let label = TimeLabel::season_of_month(date.month() as u8).unwrap();
        seen.push(label.to_string());
        date = date
            .checked_add_months(chrono::Months::new(1))
            .expect("valid month step");
    }
    assert_eq!(
        seen,
        vec![
            "DJF", "DJF", "MAM", "MAM", "MAM", "JJA", "JJA", "JJA", "SON", "SON", "SON", "DJF"
        ]
    );
}

#[test]
fn each_season_has_three_months() {
    for season in Season::ALL {
        let n = (1..=12u8)
            .filter(|&m| month_to_season(m).unwrap() == season)
            .count();
        assert_eq!(n, 3, "{season} should span three months");
    }
}

#[test]
fn monthly_labels_belong_to_monthly_scale() {
    for m in 1..=12 {
        let label = TimeLabel::month(m).unwrap();
        assert_eq!(label.time_scale(), TimeScale::Monthly);
    }
}

#[test]
fn elapsed_months_of_monthly_series() {
    let start = NaiveDate::from_ymd_opt(1981, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2010, 12, 1).unwrap();
    assert_eq!(elapsed_months(start, end), 360);
}
