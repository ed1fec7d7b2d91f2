#![allow(non_snake_case)]

//! Covariance state estimation.
//!
//! A discrete Bayesian estimator that uses a Kalman state representation [`KalmanState`] of the system for estimation.
//! The Kalman state is simply the x,X pair the dimensions of both are the dimensions of the system.
//!
//! The linear Kalman state representation can also be used for non-linear systems by using linearised forms of the system model.
//!
//! The operations here are pure: each returns the new state, or the step quantities, leaving `self` unchanged.
//!
//! [`KalmanState`]: ../../models/struct.KalmanState.html

use na::{allocator::Allocator, DefaultAllocator, Dim, DimMin, MatrixMN, MatrixN, RealField, VectorN, U1};
use na::storage::Storage;
use nalgebra as na;

use crate::error::KalmanError;
use crate::linalg::{check_non_negativ, identity, rcond, symmetrize, Divide};
use crate::models::{Estimator, KalmanEstimator, KalmanState};

impl<N: RealField, D: Dim> KalmanState<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    pub fn new_zero(d: D) -> KalmanState<N, D> {
        KalmanState {
            x: VectorN::zeros_generic(d, U1),
            X: MatrixN::zeros_generic(d, d),
        }
    }

    /// The state after a prediction to `x_pred` with state transition `Fx` and additive process noise `Q`.
    pub fn predicted(&self, x_pred: VectorN<N, D>, Fx: &MatrixN<N, D>, Q: &MatrixN<N, D>) -> KalmanState<N, D> {
        // X = Fx.X.Fx' + Q
        let mut X = Q.clone();
        X.quadform_tr(N::one(), Fx, &self.X, N::one());

        KalmanState {
            x: x_pred,
            X: symmetrize(X),
        }
    }

    /// Innovation covariance and Kalman gain of an observation with model `Hx` and additive noise `R`.
    pub fn innovation_gain<ZD: DimMin<ZD, Output = ZD>>(
        &self,
        Hx: &MatrixMN<N, ZD, D>,
        R: &MatrixN<N, ZD>,
    ) -> Result<(MatrixN<N, ZD>, MatrixMN<N, D, ZD>), KalmanError>
    where
        DefaultAllocator: Allocator<N, ZD, ZD>
            + Allocator<N, ZD, D>
            + Allocator<N, D, ZD>
            + Allocator<(usize, usize), ZD>,
    {
        let XHt = &self.X * Hx.transpose();
        // S = Hx.X.Hx' + R
        let S = Hx * &XHt + R;
        // Kalman gain, X.Hx' / S
        let K = XHt.divide(&S).map_err(|_| KalmanError::Singular("S"))?;

        Ok((S, K))
    }

    /// The state after observing innovation `s` with gain `K`, model `Hx` and additive noise `R`.
    ///
    /// The covariance is updated in Joseph form so that it remains symmetric PSD for any gain.
    pub fn observed<ZD: Dim>(
        &self,
        K: &MatrixMN<N, D, ZD>,
        s: &VectorN<N, ZD>,
        Hx: &MatrixMN<N, ZD, D>,
        R: &MatrixN<N, ZD>,
    ) -> KalmanState<N, D>
    where
        DefaultAllocator: Allocator<N, ZD, ZD> + Allocator<N, ZD, D> + Allocator<N, D, ZD> + Allocator<N, ZD>,
    {
        let d = self.x.data.shape().0;
        let IKH = identity::<N, D, D>(d, d) - K * Hx;

        // X = (I-K.Hx).X.(I-K.Hx)' + K.R.K'
        let mut X = MatrixN::zeros_generic(d, d);
        X.quadform_tr(N::one(), K, R, N::zero());
        X.quadform_tr(N::one(), &IKH, &self.X, N::one());

        KalmanState {
            x: &self.x + K * s,
            X: symmetrize(X),
        }
    }
}

impl<N: RealField, D: Dim> Estimator<N, D> for KalmanState<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    fn state(&self) -> Result<VectorN<N, D>, KalmanError> {
        Ok(self.x.clone())
    }
}

impl<N: RealField, D: Dim> KalmanEstimator<N, D> for KalmanState<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    fn init(&mut self, state: &KalmanState<N, D>) -> Result<N, KalmanError> {
        let rcond = rcond::rcond_symetric(&state.X);
        check_non_negativ(rcond, "X")?;
        self.x = state.x.clone();
        self.X = state.X.clone();

        Ok(rcond)
    }

    fn kalman_state(&self) -> Result<(N, KalmanState<N, D>), KalmanError> {
        Ok((N::one(), self.clone()))
    }
}
