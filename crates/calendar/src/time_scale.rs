//! Time scales and the labels written into the `time_scale` column.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::CalendarError;
use crate::season::{Season, month_abbr};

/// Temporal resolution at which a statistic was aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    /// One value per year.
    Annual,
    /// One value per meteorological season.
    Seasonal,
    /// One value per calendar month.
    Monthly,
    /// Raw daily values.
    Daily,
}

impl TimeScale {
    /// Lower-case name, e.g. `"seasonal"`.
    pub fn name(self) -> &'static str {
        match self {
            TimeScale::Annual => "annual",
            TimeScale::Seasonal => "seasonal",
            TimeScale::Monthly => "monthly",
            TimeScale::Daily => "daily",
        }
    }

    /// Code used in pre-aggregated file names: `year`, `seas` or `mon`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::NoFileCode`] for [`TimeScale::Daily`], which
    /// is only ever read from raw per-year files.
    pub fn file_code(self) -> Result<&'static str, CalendarError> {
        match self {
            TimeScale::Annual => Ok("year"),
            TimeScale::Seasonal => Ok("seas"),
            TimeScale::Monthly => Ok("mon"),
            TimeScale::Daily => Err(CalendarError::NoFileCode {
                scale: self.name().to_string(),
            }),
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeScale {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "annual" => Ok(TimeScale::Annual),
            "seasonal" => Ok(TimeScale::Seasonal),
            "monthly" => Ok(TimeScale::Monthly),
            "daily" => Ok(TimeScale::Daily),
            _ => Err(CalendarError::UnknownTimeScale { name: s.to_string() }),
        }
    }
}

/// Value of the `time_scale` column of a tidy record.
///
/// Drawn from the closed vocabulary `annual`, `DJF`/`MAM`/`JJA`/`SON`,
/// `Jan`..`Dec` and `daily`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeLabel {
    /// Annual aggregate.
    Annual,
    /// Seasonal aggregate for one season.
    Season(Season),
    /// Monthly aggregate for one calendar month (1..=12).
    Month(u8),
    /// Daily value.
    Daily,
}

impl TimeLabel {
    /// Label for a calendar month.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidMonth`] if `month` is outside 1..=12.
    pub fn month(month: u8) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth { month });
        }
        Ok(TimeLabel::Month(month))
    }

    /// Seasonal label for the season containing `month`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidMonth`] if `month` is outside 1..=12.
    pub fn season_of_month(month: u8) -> Result<Self, CalendarError> {
        Season::from_month(month).map(TimeLabel::Season)
    }

    /// The time scale this label belongs to.
    pub fn time_scale(self) -> TimeScale {
        match self {
            TimeLabel::Annual => TimeScale::Annual,
            TimeLabel::Season(_) => TimeScale::Seasonal,
            TimeLabel::Month(_) => TimeScale::Monthly,
            TimeLabel::Daily => TimeScale::Daily,
        }
    }
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLabel::Annual => f.write_str("annual"),
            TimeLabel::Season(season) => f.write_str(season.code()),
            TimeLabel::Month(month) => f.write_str(month_abbr(*month).unwrap_or("???")),
            TimeLabel::Daily => f.write_str("daily"),
        }
    }
}

impl FromStr for TimeLabel {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "annual" => return Ok(TimeLabel::Annual),
            "daily" => return Ok(TimeLabel::Daily),
            _ => {}
        }
        if let Ok(season) = s.parse::<Season>() {
            return Ok(TimeLabel::Season(season));
        }
        (1..=12u8)
            .find(|&m| month_abbr(m).is_ok_and(|abbr| abbr.eq_ignore_ascii_case(s)))
            .map(TimeLabel::Month)
            .ok_or_else(|| CalendarError::UnknownTimeScale { name: s.to_string() })
    }
}

impl Serialize for TimeLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_codes() {
        assert_eq!(TimeScale::Annual.file_code().unwrap(), "year");
        assert_eq!(TimeScale::Seasonal.file_code().unwrap(), "seas");
        assert_eq!(TimeScale::Monthly.file_code().unwrap(), "mon");
        assert!(matches!(
            TimeScale::Daily.file_code(),
            Err(CalendarError::NoFileCode { .. })
        ));
    }

    #[test]
    fn time_scale_parse() {
        assert_eq!("annual".parse::<TimeScale>().unwrap(), TimeScale::Annual);
        assert_eq!("Seasonal".parse::<TimeScale>().unwrap(), TimeScale::Seasonal);
        assert_eq!("monthly".parse::<TimeScale>().unwrap(), TimeScale::Monthly);
        assert_eq!("daily".parse::<TimeScale>().unwrap(), TimeScale::Daily);
        assert!("weekly".parse::<TimeScale>().is_err());
    }

    #[test]
    fn label_display() {
        assert_eq!(TimeLabel::Annual.to_string(), "annual");
        assert_eq!(TimeLabel::Season(Season::Son).to_string(), "SON");
        assert_eq!(TimeLabel::Month(2).to_string(), "Feb");
        assert_eq!(TimeLabel::Daily.to_string(), "daily");
    }

    #[test]
    fn label_parse_covers_vocabulary() {
        let mut vocabulary = vec!["annual".to_string(), "daily".to_string()];
        vocabulary.extend(Season::ALL.iter().map(|s| s.to_string()));
        vocabulary.extend((1..=12).map(|m| month_abbr(m).unwrap().to_string()));

        for label in &vocabulary {
            let parsed: TimeLabel = label.parse().unwrap();
            assert_eq!(&parsed.to_string(), label);
        }
        assert!("seasonal".parse::<TimeLabel>().is_err());
    }

    #[test]
    fn season_of_month_labels() {
        assert_eq!(
            TimeLabel::season_of_month(1).unwrap(),
            TimeLabel::Season(Season::Djf)
        );
        assert_eq!(
            TimeLabel::season_of_month(7).unwrap(),
            TimeLabel::Season(Season::Jja)
        );
        assert!(TimeLabel::month(13).is_err());
    }

    #[test]
    fn label_time_scale() {
        assert_eq!(TimeLabel::Annual.time_scale(), TimeScale::Annual);
        assert_eq!(
            TimeLabel::Season(Season::Mam).time_scale(),
            TimeScale::Seasonal
        );
        assert_eq!(TimeLabel::Month(4).time_scale(), TimeScale::Monthly);
    }
}
