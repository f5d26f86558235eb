//! Error types for the gcmeval-spectral crate.

/// Error type for all fallible operations in the gcmeval-spectral crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpectralError {
    /// Timestamps and values differ in length.
    #[error("series has {times} timestamps but {values} values")]
    LengthMismatch {
        /// Number of timestamps.
        times: usize,
        /// Number of values.
        values: usize,
    },

    /// Timestamps are not strictly increasing.
    #[error("timestamps are not strictly increasing at index {index}")]
    UnorderedTimes {
        /// First index whose timestamp is not after its predecessor.
        index: usize,
    },

    /// An unknown timestep or axis name was given.
    #[error("unknown {kind} '{name}'")]
    UnknownName {
        /// What was being parsed (`timestep` or `axis`).
        kind: &'static str,
        /// The unrecognised name.
        name: String,
    },
}
