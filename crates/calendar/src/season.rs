//! Meteorological seasons.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Season of each month, indexed by `month - 1`.
const MONTH_TO_SEASON: [Season; 12] = [
    Season::Djf,
    Season::Djf,
    Season::Mam,
    Season::Mam,
    Season::Mam,
    Season::Jja,
    Season::Jja,
    Season::Jja,
    Season::Son,
    Season::Son,
    Season::Son,
    Season::Djf,
];

/// A three-month meteorological season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    /// December, January, February.
    #[serde(rename = "DJF")]
    Djf,
    /// March, April, May.
    #[serde(rename = "MAM")]
    Mam,
    /// June, July, August.
    #[serde(rename = "JJA")]
    Jja,
    /// September, October, November.
    #[serde(rename = "SON")]
    Son,
}

impl Season {
    /// All seasons in calendar order, starting with DJF.
    pub const ALL: [Season; 4] = [Season::Djf, Season::Mam, Season::Jja, Season::Son];

    /// Season containing calendar month `month`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidMonth`] if `month` is outside 1..=12.
    pub fn from_month(month: u8) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth { month });
        }
        Ok(MONTH_TO_SEASON[usize::from(month - 1)])
    }

    /// Three-letter code, e.g. `"DJF"`.
    pub fn code(self) -> &'static str {
        match self {
            Season::Djf => "DJF",
            Season::Mam => "MAM",
            Season::Jja => "JJA",
            Season::Son => "SON",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Season {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Season::ALL
            .into_iter()
            .find(|season| season.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| CalendarError::UnknownSeason { name: s.to_string() })
    }
}

/// Season code for a calendar month, e.g. `month_to_season(1) == Ok(Season::Djf)`.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidMonth`] if `month` is outside 1..=12.
pub fn month_to_season(month: u8) -> Result<Season, CalendarError> {
    Season::from_month(month)
}

/// Three-letter English month abbreviation (`1 -> "Jan"`).
///
/// # Errors
///
/// Returns [`CalendarError::InvalidMonth`] if `month` is outside 1..=12.
pub fn month_abbr(month: u8) -> Result<&'static str, CalendarError> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::InvalidMonth { month });
    }
    Ok(MONTH_ABBR[usize::from(month - 1)])
}
