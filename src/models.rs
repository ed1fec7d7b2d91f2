#![allow(non_snake_case)]

//! Bayesian estimation models.
//!
//! State representations are modeled as structs.
//! Common Bayesian discrete system estimation operations are defined as traits.

use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixN, RealField, VectorN};
use nalgebra as na;

use crate::error::KalmanError;

/// Kalman State.
///
/// Linear representation as a state vector and the state covariance (symmetric positive semi-definite) matrix.
#[derive(PartialEq, Clone, Debug)]
pub struct KalmanState<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// State vector
    pub x: VectorN<N, D>,
    /// State covariance matrix (symmetric positive semi-definite)
    pub X: MatrixN<N, D>,
}

/// A state estimator.
///
pub trait Estimator<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D>,
{
    /// The estimator's estimate of the system's state.
    fn state(&self) -> Result<VectorN<N, D>, KalmanError>;
}

/// A Kalman filter (estimator).
///
/// The linear Kalman state representation x,X is used to represent the system.
pub trait KalmanEstimator<N: RealField, D: Dim>: Estimator<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// Initialise the estimator with a KalmanState.
    ///
    /// Returns the reciprocal condition number of the state covariance.
    fn init(&mut self, state: &KalmanState<N, D>) -> Result<N, KalmanError>;

    /// The estimator's estimate of the system's KalmanState.
    fn kalman_state(&self) -> Result<(N, KalmanState<N, D>), KalmanError>;
}
