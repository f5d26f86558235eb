//! Error types for the gcmeval-calendar crate.

/// Error type for all fallible operations in the gcmeval-calendar crate.
///
/// Covers month numbers outside 1..=12, unknown time-scale or season names,
/// and time scales that have no on-disk file code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    /// Returned when a month number is outside the valid range 1..=12.
    #[error("invalid month: {month} (must be 1..=12)")]
    InvalidMonth {
        /// The invalid month number that was provided.
        month: u8,
    },

    /// Returned when a string does not name a known time scale.
    #[error("unknown time scale: '{name}' (expected annual, seasonal, monthly or daily)")]
    UnknownTimeScale {
        /// The unrecognised name.
        name: String,
    },

    /// Returned when a string does not name a known season.
    #[error("unknown season: '{name}' (expected DJF, MAM, JJA or SON)")]
    UnknownSeason {
        /// The unrecognised name.
        name: String,
    },

    /// Returned when a file code is requested for a time scale that has no
    /// pre-aggregated files.
    #[error("time scale '{scale}' has no file code")]
    NoFileCode {
        /// Name of the time scale.
        scale: String,
    },
}
