//! # gcmeval-calendar
//!
//! The closed time-scale vocabulary shared by every gcmeval crate.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["TimeScale"] -->|".file_code()"| B["year / seas / mon"]
//!     C["month 1..=12"] -->|"Season::from_month()"| D["Season"]
//!     D --> E["TimeLabel"]
//!     C --> E
//!     E -->|"Display"| F["annual, DJF, Jan, daily"]
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use gcmeval_calendar::{Season, TimeLabel, TimeScale};
//!
//! assert_eq!(TimeScale::Seasonal.file_code().unwrap(), "seas");
//! assert_eq!(Season::from_month(12).unwrap(), Season::Djf);
//! assert_eq!(TimeLabel::Month(3).to_string(), "Mar");
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `season` | Meteorological seasons and the month-to-season lookup |
//! | `time_scale` | Time scales, their file codes and row labels |
//! | `elapsed` | Elapsed days and months between dates |
//! | `error` | Error types |

mod elapsed;
mod error;
mod season;
mod time_scale;

pub use elapsed::{AVERAGE_DAYS_PER_MONTH, elapsed_days, elapsed_months, month_start};
pub use error::CalendarError;
pub use season::{Season, month_abbr, month_to_season};
pub use time_scale::{TimeLabel, TimeScale};
