//! Error types for box recommendation.

use thiserror::Error;

use crate::model::ValidationError;

/// Result type alias for box_fit operations.
pub type Result<T> = std::result::Result<T, BoxFitError>;

/// Errors that reject a call outright.
///
/// An item set that simply does not fit a box is not an error; it is
/// reported through `PackResult::feasible`.
#[derive(Debug, Error)]
pub enum BoxFitError {
    /// Product or container data violates the input contract.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A container dimension is non-positive or not finite.
    #[error("Degenerate container interior: {length} x {width} x {height}")]
    DegenerateContainer { length: f64, width: f64, height: f64 },

    /// Padding is negative or not finite.
    #[error("Padding must be a non-negative number, got: {0}")]
    InvalidPadding(f64),

    /// The catalog source could not be interpreted.
    #[error("Invalid catalog: {0}")]
    Catalog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoxFitError {
    /// Checks the padding value shared by the packer and the recommender.
    pub fn check_padding(padding: f64) -> Result<()> {
        if padding.is_finite() && padding >= 0.0 {
            Ok(())
        } else {
            Err(BoxFitError::InvalidPadding(padding))
        }
    }
}
