#![allow(non_snake_case)]

//! Dimensional deduction.
//!
//! A filter is declared by its element type `N` and the dimensions of its state `D`, output `ZD` and input `UD`.
//! Every auxiliary matrix type is deduced from these as a quotient of a row space by a column space.
//! With static dimensions the shapes are checked by the type system. With `Dynamic` dimensions a [`Dimensions`]
//! value holds the runtime sizes and checks each matrix handed to or returned into the filter.
//!
//! [`Dimensions`]: struct.Dimensions.html

use na::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, Matrix, MatrixMN, Scalar, VectorN, U1};
use nalgebra as na;

use crate::error::KalmanError;

/// The type of a matrix mapping the column space `C` into the row space `R`.
pub type Quotient<N, R, C> = MatrixMN<N, R, C>;

/// State vector, size n.
pub type State<N, D> = VectorN<N, D>;
/// Output (measurement) vector, size m.
pub type Output<N, ZD> = VectorN<N, ZD>;
/// Input (control) vector, size k.
pub type Input<N, UD> = VectorN<N, UD>;

pub type EstimateUncertainty<N, D> = Quotient<N, D, D>;
pub type ProcessUncertainty<N, D> = Quotient<N, D, D>;
pub type OutputUncertainty<N, ZD> = Quotient<N, ZD, ZD>;
pub type StateTransition<N, D> = Quotient<N, D, D>;
pub type OutputModel<N, ZD, D> = Quotient<N, ZD, D>;
pub type InputControl<N, D, UD> = Quotient<N, D, UD>;

/// Gain, `EstimateUncertainty * OutputModel' / OutputUncertainty`.
pub type Gain<N, D, ZD> = Quotient<N, D, ZD>;
/// Innovation, the difference of two outputs.
pub type Innovation<N, ZD> = Output<N, ZD>;
pub type InnovationUncertainty<N, ZD> = OutputUncertainty<N, ZD>;

/// Storage for every matrix a filter of dimensions `D`, `ZD`, `UD` holds.
///
/// Implemented for any allocator, in practice `DefaultAllocator`, providing all the shapes.
pub trait KalmanAllocator<N: Scalar, D: Dim, ZD: Dim, UD: Dim>:
    Allocator<N, D, D>
    + Allocator<N, D>
    + Allocator<N, ZD, ZD>
    + Allocator<N, ZD>
    + Allocator<N, ZD, D>
    + Allocator<N, D, ZD>
    + Allocator<N, D, UD>
    + Allocator<N, UD>
    + Allocator<(usize, usize), ZD>
{
}

impl<N: Scalar, D: Dim, ZD: Dim, UD: Dim, A> KalmanAllocator<N, D, ZD, UD> for A where
    A: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, D, UD>
        + Allocator<N, UD>
        + Allocator<(usize, usize), ZD>
{
}

/// Runtime sizes of the state, output and input spaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions<D: Dim, ZD: Dim, UD: Dim> {
    pub state: D,
    pub output: ZD,
    pub input: UD,
}

impl<D: Dim, ZD: Dim, UD: Dim> Dimensions<D, ZD, UD> {
    pub fn new(state: D, output: ZD, input: UD) -> Self {
        Dimensions { state, output, input }
    }

    pub fn state_size(&self) -> usize {
        self.state.value()
    }

    pub fn output_size(&self) -> usize {
        self.output.value()
    }

    pub fn input_size(&self) -> usize {
        self.input.value()
    }

    /// True when an input space is declared.
    pub fn has_input(&self) -> bool {
        self.input_size() > 0
    }

    pub fn check_state<N: Scalar, S: Storage<N, D>>(&self, what: &'static str, x: &Matrix<N, D, U1, S>) -> Result<(), KalmanError> {
        check_shape(what, x, (self.state_size(), 1))
    }

    pub fn check_output<N: Scalar, S: Storage<N, ZD>>(&self, what: &'static str, z: &Matrix<N, ZD, U1, S>) -> Result<(), KalmanError> {
        check_shape(what, z, (self.output_size(), 1))
    }

    pub fn check_input<N: Scalar, S: Storage<N, UD>>(&self, what: &'static str, u: &Matrix<N, UD, U1, S>) -> Result<(), KalmanError> {
        check_shape(what, u, (self.input_size(), 1))
    }

    /// Check an n x n matrix: P, Q or F.
    pub fn check_state_square<N: Scalar, S: Storage<N, D, D>>(&self, what: &'static str, m: &Matrix<N, D, D, S>) -> Result<(), KalmanError> {
        check_shape(what, m, (self.state_size(), self.state_size()))
    }

    /// Check an m x m matrix: R.
    pub fn check_output_square<N: Scalar, S: Storage<N, ZD, ZD>>(&self, what: &'static str, m: &Matrix<N, ZD, ZD, S>) -> Result<(), KalmanError> {
        check_shape(what, m, (self.output_size(), self.output_size()))
    }

    /// Check an m x n matrix: H.
    pub fn check_output_model<N: Scalar, S: Storage<N, ZD, D>>(&self, what: &'static str, m: &Matrix<N, ZD, D, S>) -> Result<(), KalmanError> {
        check_shape(what, m, (self.output_size(), self.state_size()))
    }

    /// Check an n x k matrix: G.
    pub fn check_input_control<N: Scalar, S: Storage<N, D, UD>>(&self, what: &'static str, m: &Matrix<N, D, UD, S>) -> Result<(), KalmanError> {
        check_shape(what, m, (self.state_size(), self.input_size()))
    }

    /// Assemble an output vector from its components in declaration order.
    pub fn output_from<N: Scalar>(&self, components: &[N]) -> Result<Output<N, ZD>, KalmanError>
    where
        DefaultAllocator: Allocator<N, ZD>,
    {
        assemble("output", self.output, components)
    }

    /// Assemble an input vector from its components in declaration order.
    pub fn input_from<N: Scalar>(&self, components: &[N]) -> Result<Input<N, UD>, KalmanError>
    where
        DefaultAllocator: Allocator<N, UD>,
    {
        assemble("input", self.input, components)
    }
}

/// Deduce a dimension, static dimensions know their own size.
pub fn deduce<R: Dim>(known: Option<usize>) -> Option<R> {
    R::try_to_usize().or(known).map(R::from_usize)
}

pub(crate) fn check_arity(what: &'static str, expected: usize, found: usize) -> Result<(), KalmanError> {
    if expected == found {
        Ok(())
    } else {
        Err(KalmanError::ArityMismatch { what, expected, found })
    }
}

fn check_shape<N: Scalar, R: Dim, C: Dim, S: Storage<N, R, C>>(
    what: &'static str,
    m: &Matrix<N, R, C, S>,
    expected: (usize, usize),
) -> Result<(), KalmanError> {
    let found = m.shape();
    if found == expected {
        Ok(())
    } else {
        Err(KalmanError::ShapeMismatch { what, expected, found })
    }
}

fn assemble<N: Scalar, R: Dim>(what: &'static str, r: R, components: &[N]) -> Result<VectorN<N, R>, KalmanError>
where
    DefaultAllocator: Allocator<N, R>,
{
    check_arity(what, r.value(), components.len())?;
    Ok(VectorN::from_iterator_generic(r, U1, components.iter().cloned()))
}
