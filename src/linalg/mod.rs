#![allow(non_snake_case)]

//! Linear algebra capability used by the estimators.
//!
//! Matrix arithmetic is that of nalgebra. This module adds what a Kalman filter needs beyond it:
//! shaped zero and identity values, a division operator, symmetrisation and the quadratic forms used by
//! the noise models.

use na::constraint::{DimEq, ShapeConstraint};
use na::storage::{Storage, StorageMut};
use na::{allocator::Allocator, DefaultAllocator, Dim, DimMin, Matrix, MatrixMN, MatrixN, RealField, SquareMatrix, Vector};
use nalgebra as na;

use crate::error::KalmanError;

pub mod rcond;

/// The zero matrix of shape `r` x `c`.
pub fn zeros<N: RealField, R: Dim, C: Dim>(r: R, c: C) -> MatrixMN<N, R, C>
where
    DefaultAllocator: Allocator<N, R, C>,
{
    MatrixMN::zeros_generic(r, c)
}

/// The identity matrix of shape `r` x `c`.
///
/// Rectangular shapes have ones on the leading diagonal.
pub fn identity<N: RealField, R: Dim, C: Dim>(r: R, c: C) -> MatrixMN<N, R, C>
where
    DefaultAllocator: Allocator<N, R, C>,
{
    MatrixMN::identity_generic(r, c)
}

/// Symmetric part of a square matrix, `(M + M') / 2`.
pub fn symmetrize<N: RealField, D: Dim>(M: MatrixN<N, D>) -> MatrixN<N, D>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let two = N::one() + N::one();
    (M.transpose() + M) / two
}

/// Division of matrices.
///
/// `A.divide(&B)` returns the `X` satisfying `X * B = A`.
/// The denominator `B` is square and `A` has as many columns as `B`.
pub trait Divide<Denominator> {
    type Output;

    fn divide(&self, denominator: &Denominator) -> Result<Self::Output, KalmanError>;
}

/// Division by a square matrix using an LU factorisation with full pivoting.
///
/// Solves `B' * X' = A'` after equilibrating the rows and then the columns of `B'` to unit max norm,
/// so denominators mixing physical units are judged on their scaled pivots. Fails as singular if a
/// row or column is zero or holds a NaN, or the scaled pivots reciprocal condition number does not
/// exceed epsilon.
impl<N: RealField, R: Dim, C: DimMin<C, Output = C>> Divide<MatrixN<N, C>> for MatrixMN<N, R, C>
where
    DefaultAllocator: Allocator<N, R, C> + Allocator<N, C, R> + Allocator<N, C, C> + Allocator<(usize, usize), C>,
{
    type Output = MatrixMN<N, R, C>;

    fn divide(&self, denominator: &MatrixN<N, C>) -> Result<MatrixMN<N, R, C>, KalmanError> {
        let mut M = denominator.transpose();
        let row_scale = equilibrate_rows(&mut M)?;
        let mut Mt = M.transpose();
        let col_scale = equilibrate_rows(&mut Mt)?;
        let M = Mt.transpose();

        let lu = M.full_piv_lu();
        let rcond = rcond::rcond_pivots(&lu.u());
        if !(rcond > N::default_epsilon()) {
            return Err(KalmanError::Singular("denominator"));
        }

        let mut b = self.transpose();
        scale_rows(&mut b, &row_scale);
        let mut Xt = lu.solve(&b).ok_or(KalmanError::Singular("denominator"))?;
        scale_rows(&mut Xt, &col_scale);

        Ok(Xt.transpose())
    }
}

/// Scales each row of `M` by the reciprocal of its largest magnitude, returning the scales.
fn equilibrate_rows<N: RealField, R: Dim, C: Dim>(M: &mut MatrixMN<N, R, C>) -> Result<Vec<N>, KalmanError>
where
    DefaultAllocator: Allocator<N, R, C>,
{
    let mut scales = Vec::with_capacity(M.nrows());
    for i in 0..M.nrows() {
        let mut max = N::zero();
        for j in 0..M.ncols() {
            let v = M[(i, j)].abs();
            if v != v {
                return Err(KalmanError::Singular("denominator"));
            }
            if v > max {
                max = v;
            }
        }
        // Zero or infinite rows leave nothing to pivot on
        if !(max > N::zero()) {
            return Err(KalmanError::Singular("denominator"));
        }
        let scale = N::one() / max;
        if !(scale > N::zero()) {
            return Err(KalmanError::Singular("denominator"));
        }
        scales.push(scale);
    }
    scale_rows(M, &scales);
    Ok(scales)
}

fn scale_rows<N: RealField, R: Dim, C: Dim>(M: &mut MatrixMN<N, R, C>, scales: &[N])
where
    DefaultAllocator: Allocator<N, R, C>,
{
    for (i, &scale) in scales.iter().enumerate() {
        for j in 0..M.ncols() {
            M[(i, j)] *= scale;
        }
    }
}

/// Computes the quadratic form `self = alpha * lhs * mid * lhs.transpose() + beta * self`.
///
/// 'mid' is a diagonal matrix represented by a Vector.
pub fn quadform_tr<N: RealField, D1, S, R3, C3, S3, D4, S4>(
    mat: &mut SquareMatrix<N, D1, S>,
    alpha: N,
    lhs: &Matrix<N, R3, C3, S3>,
    mid: &Vector<N, D4, S4>,
    beta: N,
) where
    D1: Dim,
    S: StorageMut<N, D1, D1>,
    R3: Dim,
    C3: Dim,
    D4: Dim,
    S3: Storage<N, R3, C3>,
    S4: Storage<N, D4>,
    ShapeConstraint: DimEq<D1, R3> + DimEq<C3, D4>,
{
    if mid.nrows() == 0 {
        *mat *= beta;
        return;
    }
    mat.ger(alpha * mid[0], &lhs.column(0), &lhs.column(0), beta);

    for j in 1..mid.nrows() {
        mat.ger(alpha * mid[j], &lhs.column(j), &lhs.column(j), N::one());
    }
}

/// Checks the reciprocal condition number is >= 0.
///
/// IEC 559 NaN values are never true
pub fn check_non_negativ<N: RealField>(rcond: N, what: &'static str) -> Result<(), KalmanError> {
    if rcond >= N::zero() {
        Ok(())
    } else {
        Err(KalmanError::NotPositiveSemiDefinite(what))
    }
}
