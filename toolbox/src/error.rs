//! Error type shared by all toolbox operations.

use thiserror::Error;

/// Grid axis an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Errors that can occur in toolbox operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Pixel settings for the {axis}-coordinate are underspecified: {reason}")]
    Underspecified { axis: Axis, reason: &'static str },

    #[error(
        "The {axis}-coordinate scale, limits, and pixel count are inconsistent (relative deviation {deviation:.3e})"
    )]
    Inconsistent { axis: Axis, deviation: f64 },

    #[error("Non-integer number of {axis} pixels: {pixels}")]
    NonIntegralPixelCount { axis: Axis, pixels: f64 },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Least-squares fit did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: String },

    #[error("Empty input: {what}")]
    EmptyInput { what: &'static str },

    #[error("Length mismatch for '{what}': expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Singular matrix in {context}")]
    SingularMatrix { context: &'static str },

    #[error("Not enough signal-to-noise in the whole set of pixels: {total_sn:.3} < target {target_sn:.3}")]
    InsufficientSignal { total_sn: f64, target_sn: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returns `LengthMismatch` unless `actual == expected`.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}
