#![allow(non_snake_case)]

//! Noise models.
//!
//! Linear additive noise models are represented as structs.
//! They build the process and output uncertainties of a filter, and can draw samples for simulations.

use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, VectorN, U1};
use na::storage::Storage;
use nalgebra as na;
use rand_core::RngCore;
use rand_distr::{Distribution, StandardNormal};

use crate::error::KalmanError;
use crate::linalg::{check_non_negativ, quadform_tr, rcond};

/// Additive noise.
///
/// Noise represented as a the noise variance vector.
pub struct UncorrelatedNoise<N: RealField, QD: Dim>
where
    DefaultAllocator: Allocator<N, QD>,
{
    /// Noise variance
    pub q: VectorN<N, QD>,
}

/// Additive noise.
///
/// Noise represented as a the noise covariance matrix.
#[derive(Clone, Debug)]
pub struct CorrelatedNoise<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    /// Noise covariance
    pub Q: MatrixN<N, D>,
}

/// Additive noise.
///
/// Noise represented as a the noise variance vector and a noise coupling matrix.
/// The noise covariance is G.q.G'.
pub struct CoupledNoise<N: RealField, D: Dim, QD: Dim>
where
    DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD>,
{
    /// Noise variance
    pub q: VectorN<N, QD>,
    /// Noise coupling
    pub G: MatrixMN<N, D, QD>,
}

impl<'a, N: RealField, D: Dim> CorrelatedNoise<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// Creates a CorrelatedNoise from an CoupledNoise.
    pub fn from_coupled<QD: Dim>(coupled: &'a CoupledNoise<N, D, QD>) -> Self
    where
        DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD>,
    {
        let d = coupled.G.data.shape().0;
        let mut Q = MatrixMN::zeros_generic(d, d);
        quadform_tr(&mut Q, N::one(), &coupled.G, &coupled.q, N::one());
        CorrelatedNoise { Q }
    }

    /// Creates a CorrelatedNoise from an UncorrelatedNoise.
    pub fn from_uncorrelated(uncorrelated: &'a UncorrelatedNoise<N, D>) -> Self {
        CorrelatedNoise {
            Q: MatrixN::from_diagonal(&uncorrelated.q),
        }
    }

    /// Checks the noise covariance is PSD, returning its reciprocal condition number.
    pub fn rcond(&self) -> Result<N, KalmanError> {
        let rcond = rcond::rcond_symetric(&self.Q);
        check_non_negativ(rcond, "Q")?;
        Ok(rcond)
    }

    /// Draw a zero mean sample of the noise.
    ///
    /// The covariance must be positive definite for its Cholesky factor L. The sample is L.n for a
    /// vector n of independent standard normal values.
    pub fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<VectorN<N, D>, KalmanError>
    where
        StandardNormal: Distribution<N>,
    {
        let L = self.Q.clone().cholesky().ok_or(KalmanError::NotPositiveSemiDefinite("Q"))?.unpack();
        let d = self.Q.data.shape().0;
        let n = VectorN::from_fn_generic(d, U1, |_, _| StandardNormal.sample(&mut *rng));

        Ok(L * n)
    }
}
