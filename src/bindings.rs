#![allow(non_snake_case)]

//! Model bindings.
//!
//! Each of the model matrices F, G, H, Q and R is bound either directly to a value, or to a function
//! computing the value when the filter steps. The transition function f and the observation function h
//! are always functions; by default the linear `F.x + G.u` and `H.x`.
//!
//! Model functions receive the caller's parameter pack for the step. The most recent packs are kept by the filter.

use std::fmt::Debug;

use na::{allocator::Allocator, DefaultAllocator, Dim, RealField};
use nalgebra as na;

use crate::dimensions::{
    Input, InputControl, Output, OutputModel, OutputUncertainty, ProcessUncertainty, State, StateTransition,
};
use crate::error::ModelError;

/// State transition matrix function `F(x, u, p...)`.
pub type StateTransitionFn<N, D, UD, PP> =
    dyn FnMut(&State<N, D>, &Input<N, UD>, &PP) -> Result<StateTransition<N, D>, ModelError>;

/// Process uncertainty function `Q(x, p...)`.
pub type ProcessUncertaintyFn<N, D, PP> = dyn FnMut(&State<N, D>, &PP) -> Result<ProcessUncertainty<N, D>, ModelError>;

/// Input control matrix function `G(p...)`.
pub type InputControlFn<N, D, UD, PP> = dyn FnMut(&PP) -> Result<InputControl<N, D, UD>, ModelError>;

/// Output model matrix function `H(x, us...)`.
pub type OutputModelFn<N, D, ZD, UP> = dyn FnMut(&State<N, D>, &UP) -> Result<OutputModel<N, ZD, D>, ModelError>;

/// Output uncertainty function `R(x, z, us...)`.
pub type OutputUncertaintyFn<N, D, ZD, UP> =
    dyn FnMut(&State<N, D>, &Output<N, ZD>, &UP) -> Result<OutputUncertainty<N, ZD>, ModelError>;

/// State transition function `f(x, u, p...)`, returning the predicted state.
pub type TransitionFn<N, D, ZD, UD, PP> =
    dyn FnMut(&Context<'_, N, D, ZD, UD>, &State<N, D>, &Input<N, UD>, &PP) -> Result<State<N, D>, ModelError>;

/// Observation function `h(x, us...)`, returning the expected output.
pub type ObservationFn<N, D, ZD, UD, UP> =
    dyn FnMut(&Context<'_, N, D, ZD, UD>, &State<N, D>, &UP) -> Result<Output<N, ZD>, ModelError>;

/// The model matrices in force while the transition or observation function is evaluated.
///
/// During a prediction F and G are those just computed for the step. During an update H is.
pub struct Context<'a, N: RealField, D: Dim, ZD: Dim, UD: Dim>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, ZD, D> + Allocator<N, D, UD>,
{
    pub F: &'a StateTransition<N, D>,
    pub G: &'a InputControl<N, D, UD>,
    pub H: &'a OutputModel<N, ZD, D>,
}

/// The linear transition `F.x + G.u`.
pub fn linear_transition<N: RealField, D: Dim, ZD: Dim, UD: Dim, PP>(
    context: &Context<'_, N, D, ZD, UD>,
    x: &State<N, D>,
    u: &Input<N, UD>,
    _: &PP,
) -> Result<State<N, D>, ModelError>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, ZD, D> + Allocator<N, D, UD> + Allocator<N, D> + Allocator<N, UD>,
{
    Ok(context.F * x + context.G * u)
}

/// The linear observation `H.x`.
pub fn linear_observation<N: RealField, D: Dim, ZD: Dim, UD: Dim, UP>(
    context: &Context<'_, N, D, ZD, UD>,
    x: &State<N, D>,
    _: &UP,
) -> Result<Output<N, ZD>, ModelError>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, ZD, D> + Allocator<N, D, UD> + Allocator<N, D> + Allocator<N, ZD>,
{
    Ok(context.H * x)
}

/// Either a value or a function computing the value.
pub enum Source<M, F: ?Sized> {
    Direct(M),
    Computed(Box<F>),
}

/// A model matrix bound to a value or a function.
///
/// The value of a computed binding is the last committed result of its function.
pub struct Binding<M, F: ?Sized> {
    value: M,
    function: Option<Box<F>>,
}

impl<M, F: ?Sized> Binding<M, F> {
    pub fn direct(value: M) -> Self {
        Binding { value, function: None }
    }

    /// A computed binding with `value` until the function is first committed.
    pub fn computed(value: M, function: Box<F>) -> Self {
        Binding { value, function: Some(function) }
    }

    /// Bind a source keeping the current value for a computed source.
    pub fn from_source(source: Source<M, F>, value: M) -> Self {
        match source {
            Source::Direct(value) => Binding::direct(value),
            Source::Computed(function) => Binding::computed(value, function),
        }
    }

    pub fn value(&self) -> &M {
        &self.value
    }

    pub fn is_computed(&self) -> bool {
        self.function.is_some()
    }

    /// Replace the binding. A direct source drops any function.
    pub fn set(&mut self, source: Source<M, F>) {
        match source {
            Source::Direct(value) => {
                self.value = value;
                self.function = None;
            }
            Source::Computed(function) => self.function = Some(function),
        }
    }

    /// Evaluate the function of a computed binding. The binding's value is not changed.
    pub(crate) fn refresh<E>(&mut self, call: impl FnOnce(&mut F) -> Result<M, E>) -> Result<Option<M>, E> {
        match self.function.as_deref_mut() {
            Some(function) => call(function).map(Some),
            None => Ok(None),
        }
    }

    /// Keep a refreshed value.
    pub(crate) fn commit(&mut self, refreshed: Option<M>) {
        if let Some(value) = refreshed {
            self.value = value;
        }
    }
}

/// A parameter pack passed through to the model functions of a step.
///
/// Implemented for tuples of up to six elements. The empty tuple is the empty pack.
pub trait Pack: Debug {
    /// Number of parameters.
    const ARITY: usize;

    /// Each parameter in declaration order, formatted with `Debug`.
    fn describe(&self) -> Vec<String>;
}

macro_rules! impl_pack {
    ($arity:expr; $($T:ident . $i:tt),*) => {
        impl<$($T: Debug),*> Pack for ($($T,)*) {
            const ARITY: usize = $arity;

            #[allow(unused_variables)]
            fn describe(&self) -> Vec<String> {
                vec![$(format!("{:?}", self.$i)),*]
            }
        }
    };
}

impl_pack!(0;);
impl_pack!(1; A.0);
impl_pack!(2; A.0, B.1);
impl_pack!(3; A.0, B.1, C.2);
impl_pack!(4; A.0, B.1, C.2, E.3);
impl_pack!(5; A.0, B.1, C.2, E.3, F.4);
impl_pack!(6; A.0, B.1, C.2, E.3, F.4, G.5);
