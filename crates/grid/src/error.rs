//! Error types for the gcmeval-grid crate.

use gcmeval_calendar::CalendarError;

/// Error type for all fallible operations in the gcmeval-grid crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A value array does not match the grid shape.
    #[error("'{name}' has {got} values, expected {expected}")]
    LengthMismatch {
        /// Name of the offending array.
        name: String,
        /// Expected number of values.
        expected: usize,
        /// Actual number of values.
        got: usize,
    },

    /// Mask and field coordinates share no grid cell after rounding.
    #[error("grid mismatch: none of the {field_cells} field cells match the {mask_cells} mask cells")]
    GridMismatch {
        /// Number of cells in the field.
        field_cells: usize,
        /// Number of cells in the mask.
        mask_cells: usize,
    },

    /// Two fields that must share a grid have different coordinates.
    #[error("coordinate mismatch on '{dim}': {reason}")]
    CoordinateMismatch {
        /// Dimension with differing coordinates.
        dim: String,
        /// What differs.
        reason: String,
    },

    /// The operation needs a different kind of time axis.
    #[error("expected a {expected} time axis, got {got}")]
    UnexpectedTimeAxis {
        /// Kind of axis the operation needs.
        expected: &'static str,
        /// Kind of axis the field has.
        got: &'static str,
    },

    /// A variable is not present in the field.
    #[error("variable '{name}' not found in field")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },

    /// The field has no latitude or longitude points.
    #[error("field has an empty lat/lon grid")]
    EmptyGrid,

    /// Calendar conversion failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_grid_mismatch() {
        let err = GridError::GridMismatch {
            field_cells: 4,
            mask_cells: 9,
        };
        assert_eq!(
            err.to_string(),
            "grid mismatch: none of the 4 field cells match the 9 mask cells"
        );
    }

    #[test]
    fn display_length_mismatch() {
        let err = GridError::LengthMismatch {
            name: "pr".to_string(),
            expected: 8,
            got: 6,
        };
        assert_eq!(err.to_string(), "'pr' has 6 values, expected 8");
    }

    #[test]
    fn calendar_error_is_transparent() {
        let err = GridError::from(CalendarError::InvalidMonth { month: 0 });
        assert_eq!(err.to_string(), "invalid month: 0 (must be 1..=12)");
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<GridError>();
    }
}
