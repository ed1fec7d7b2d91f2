//! Estimation errors.
//!
//! All fallible operations of the library return a [`KalmanError`].
//! A failed operation leaves the filter as it was on entry.

use thiserror::Error;

/// Error reported by a caller supplied model function.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// Kalman filter errors.
#[derive(Error, Debug)]
pub enum KalmanError {
    /// The labelled parameters do not select any filter variant.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(&'static str),

    /// A matrix shape disagrees with the deduced shape.
    #[error("{what} shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A step was given a different number of components than declared.
    #[error("{what} arity mismatch: expected {expected} components, found {found}")]
    ArityMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// A division could not be solved numerically.
    #[error("{0} singular")]
    Singular(&'static str),

    /// A covariance has a negative or NaN diagonal.
    #[error("{0} not PSD")]
    NotPositiveSemiDefinite(&'static str),

    /// A caller supplied model function failed.
    #[error("{binding} function failed: {source}")]
    CallableFailure {
        binding: &'static str,
        #[source]
        source: ModelError,
    },
}

impl KalmanError {
    pub(crate) fn callable(binding: &'static str) -> impl FnOnce(ModelError) -> KalmanError {
        move |source| KalmanError::CallableFailure { binding, source }
    }
}
