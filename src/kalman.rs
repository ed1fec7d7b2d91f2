#![allow(non_snake_case)]

//! Kalman filter.
//!
//! A [`Kalman`] filter estimates the state x of a system and its covariance P from a model of the system and
//! noisy outputs. It is constructed by a [`KalmanBuilder`] and then stepped by the caller with `predict` and
//! `update` in any order.
//!
//! Each step is all or nothing. Model functions are evaluated and the new estimate is computed before anything
//! is stored, so a step that fails leaves the filter as it was.
//!
//! [`Kalman`]: struct.Kalman.html
//! [`KalmanBuilder`]: ../builder/struct.KalmanBuilder.html

use log::{debug, trace};
use na::{DefaultAllocator, Dim, DimMin, RealField, U0, U1};
use nalgebra as na;

use crate::bindings::{
    Binding, Context, InputControlFn, ObservationFn, OutputModelFn, OutputUncertaintyFn, Pack, ProcessUncertaintyFn,
    Source, StateTransitionFn, TransitionFn,
};
use crate::builder::Variant;
use crate::dimensions::{
    check_arity, Dimensions, EstimateUncertainty, Gain, Innovation, InnovationUncertainty, Input, InputControl,
    KalmanAllocator, Output, OutputModel, OutputUncertainty, ProcessUncertainty, State, StateTransition,
};
use crate::error::{KalmanError, ModelError};
use crate::linalg::{check_non_negativ, rcond, zeros};
use crate::models::{Estimator, KalmanEstimator, KalmanState};

/// Kalman filter of state dimension `D`, output dimension `ZD` and input dimension `UD`.
///
/// `UP` and `PP` are the parameter packs of the update and predict steps, passed to the model functions.
/// Without an input the input dimension is `U0`.
pub struct Kalman<N: RealField, D: Dim, ZD: Dim = D, UD: Dim = U0, UP: Pack = (), PP: Pack = ()>
where
    DefaultAllocator: KalmanAllocator<N, D, ZD, UD>,
{
    pub(crate) variant: Variant,
    pub(crate) dimensions: Dimensions<D, ZD, UD>,
    pub(crate) state: KalmanState<N, D>,
    pub(crate) q: Binding<ProcessUncertainty<N, D>, ProcessUncertaintyFn<N, D, PP>>,
    pub(crate) r: Binding<OutputUncertainty<N, ZD>, OutputUncertaintyFn<N, D, ZD, UP>>,
    pub(crate) f: Binding<StateTransition<N, D>, StateTransitionFn<N, D, UD, PP>>,
    pub(crate) h: Binding<OutputModel<N, ZD, D>, OutputModelFn<N, D, ZD, UP>>,
    pub(crate) g: Binding<InputControl<N, D, UD>, InputControlFn<N, D, UD, PP>>,
    pub(crate) transition: Box<TransitionFn<N, D, ZD, UD, PP>>,
    pub(crate) observation: Box<ObservationFn<N, D, ZD, UD, UP>>,
    pub(crate) u: Input<N, UD>,
    pub(crate) z: Output<N, ZD>,
    pub(crate) y: Innovation<N, ZD>,
    pub(crate) s: InnovationUncertainty<N, ZD>,
    pub(crate) k: Gain<N, D, ZD>,
    pub(crate) prediction: Option<PP>,
    pub(crate) update: Option<UP>,
}

impl<N: RealField, D: Dim, ZD: DimMin<ZD, Output = ZD>, UD: Dim, UP: Pack, PP: Pack> Kalman<N, D, ZD, UD, UP, PP>
where
    DefaultAllocator: KalmanAllocator<N, D, ZD, UD>,
{
    /// Produces the a priori estimate of the next step without an input.
    ///
    /// The input is zero for this step. The last input is left as it was.
    pub fn predict(&mut self, arguments: PP) -> Result<(), KalmanError> {
        let u = zeros(self.dimensions.input, U1);
        self.predict_step(arguments, u, false)
    }

    /// Produces the a priori estimate of the next step with input `u`.
    pub fn predict_with_input(&mut self, arguments: PP, u: Input<N, UD>) -> Result<(), KalmanError> {
        check_arity("input", self.dimensions.input_size(), u.nrows())?;
        self.predict_step(arguments, u, true)
    }

    /// Produces the a priori estimate of the next step with the input components in declaration order.
    pub fn predict_with_components(&mut self, arguments: PP, u: &[N]) -> Result<(), KalmanError> {
        let u = self.dimensions.input_from(u)?;
        self.predict_step(arguments, u, true)
    }

    /// Produces the a posteriori estimate from the output `z`.
    pub fn update(&mut self, arguments: UP, z: Output<N, ZD>) -> Result<(), KalmanError> {
        check_arity("output", self.dimensions.output_size(), z.nrows())?;
        self.update_step(arguments, z)
    }

    /// Produces the a posteriori estimate from the output components in declaration order.
    pub fn update_with_components(&mut self, arguments: UP, z: &[N]) -> Result<(), KalmanError> {
        let z = self.dimensions.output_from(z)?;
        self.update_step(arguments, z)
    }

    fn predict_step(&mut self, arguments: PP, u: Input<N, UD>, keep_input: bool) -> Result<(), KalmanError> {
        let dimensions = self.dimensions;
        let x = &self.state.x;

        let F = self.f.refresh(|f| f(x, &u, &arguments)).map_err(KalmanError::callable("F"))?;
        if let Some(F) = &F {
            dimensions.check_state_square("F", F)?;
        }
        let Q = self.q.refresh(|q| q(x, &arguments)).map_err(KalmanError::callable("Q"))?;
        if let Some(Q) = &Q {
            dimensions.check_state_square("Q", Q)?;
        }
        let G = self.g.refresh(|g| g(&arguments)).map_err(KalmanError::callable("G"))?;
        if let Some(G) = &G {
            dimensions.check_input_control("G", G)?;
        }

        let F_now = match &F {
            Some(F) => F,
            None => self.f.value(),
        };
        let Q_now = match &Q {
            Some(Q) => Q,
            None => self.q.value(),
        };
        let G_now = match &G {
            Some(G) => G,
            None => self.g.value(),
        };
        let context = Context {
            F: F_now,
            G: G_now,
            H: self.h.value(),
        };
        let x_pred = (self.transition)(&context, x, &u, &arguments).map_err(KalmanError::callable("f"))?;
        dimensions.check_state("f(x)", &x_pred)?;

        let predicted = self.state.predicted(x_pred, F_now, Q_now);

        self.state = predicted;
        self.f.commit(F);
        self.q.commit(Q);
        self.g.commit(G);
        if keep_input {
            self.u = u;
        }
        self.prediction = Some(arguments);
        trace!("predict x={:?}", self.state.x.as_slice());

        Ok(())
    }

    fn update_step(&mut self, arguments: UP, z: Output<N, ZD>) -> Result<(), KalmanError> {
        let dimensions = self.dimensions;
        let x = &self.state.x;

        let H = self.h.refresh(|h| h(x, &arguments)).map_err(KalmanError::callable("H"))?;
        if let Some(H) = &H {
            dimensions.check_output_model("H", H)?;
        }
        let R = self.r.refresh(|r| r(x, &z, &arguments)).map_err(KalmanError::callable("R"))?;
        if let Some(R) = &R {
            dimensions.check_output_square("R", R)?;
        }

        let H_now = match &H {
            Some(H) => H,
            None => self.h.value(),
        };
        let R_now = match &R {
            Some(R) => R,
            None => self.r.value(),
        };
        let (S, K) = self.state.innovation_gain(H_now, R_now)?;

        let context = Context {
            F: self.f.value(),
            G: self.g.value(),
            H: H_now,
        };
        let z_pred = (self.observation)(&context, x, &arguments).map_err(KalmanError::callable("h"))?;
        dimensions.check_output("h(x)", &z_pred)?;
        let y = &z - z_pred;

        let observed = self.state.observed(&K, &y, H_now, R_now);

        self.state = observed;
        self.h.commit(H);
        self.r.commit(R);
        self.s = S;
        self.k = K;
        self.y = y;
        self.z = z;
        self.update = Some(arguments);
        trace!("update x={:?}", self.state.x.as_slice());

        Ok(())
    }
}

impl<N: RealField, D: Dim, ZD: Dim, UD: Dim, UP: Pack, PP: Pack> Kalman<N, D, ZD, UD, UP, PP>
where
    DefaultAllocator: KalmanAllocator<N, D, ZD, UD>,
{
    /// The filter variant selected at construction.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn dimensions(&self) -> &Dimensions<D, ZD, UD> {
        &self.dimensions
    }

    /// State estimate X.
    pub fn x(&self) -> &State<N, D> {
        &self.state.x
    }

    /// Estimated covariance P.
    pub fn p(&self) -> &EstimateUncertainty<N, D> {
        &self.state.X
    }

    /// Process noise covariance Q.
    pub fn q(&self) -> &ProcessUncertainty<N, D> {
        self.q.value()
    }

    /// Output noise covariance R.
    pub fn r(&self) -> &OutputUncertainty<N, ZD> {
        self.r.value()
    }

    /// State transition F.
    pub fn f(&self) -> &StateTransition<N, D> {
        self.f.value()
    }

    /// Output model H.
    pub fn h(&self) -> &OutputModel<N, ZD, D> {
        self.h.value()
    }

    /// Input control G.
    ///
    /// Variants without an input have the zero sized input dimension, and G is then the empty n x 0 matrix.
    pub fn g(&self) -> &InputControl<N, D, UD> {
        self.g.value()
    }

    /// Last input U.
    ///
    /// Empty for variants without an input. Holds the initial input until a step stores one.
    pub fn u(&self) -> &Input<N, UD> {
        &self.u
    }

    /// Last output Z.
    pub fn z(&self) -> &Output<N, ZD> {
        &self.z
    }

    /// Innovation Y of the last update.
    pub fn y(&self) -> &Innovation<N, ZD> {
        &self.y
    }

    /// Innovation covariance S of the last update.
    pub fn s(&self) -> &InnovationUncertainty<N, ZD> {
        &self.s
    }

    /// Gain K of the last update.
    pub fn k(&self) -> &Gain<N, D, ZD> {
        &self.k
    }

    /// Parameters of the last prediction, `None` before the first.
    ///
    /// The i-th parameter is `prediction_arguments().map(|p| p.i)`.
    pub fn prediction_arguments(&self) -> Option<&PP> {
        self.prediction.as_ref()
    }

    /// Parameters of the last update, `None` before the first.
    pub fn update_arguments(&self) -> Option<&UP> {
        self.update.as_ref()
    }

    pub fn set_x(&mut self, x: State<N, D>) -> Result<(), KalmanError> {
        self.dimensions.check_state("x", &x)?;
        self.state.x = x;
        debug!("set x");
        Ok(())
    }

    /// Set the estimated covariance P, which must be PSD.
    pub fn set_p(&mut self, P: EstimateUncertainty<N, D>) -> Result<(), KalmanError> {
        self.dimensions.check_state_square("P", &P)?;
        check_non_negativ(rcond::rcond_symetric(&P), "P")?;
        self.state.X = P;
        debug!("set P");
        Ok(())
    }

    pub fn set_q(&mut self, Q: ProcessUncertainty<N, D>) -> Result<(), KalmanError> {
        self.dimensions.check_state_square("Q", &Q)?;
        check_non_negativ(rcond::rcond_symetric(&Q), "Q")?;
        self.q.set(Source::Direct(Q));
        debug!("set Q");
        Ok(())
    }

    /// Compute Q at each prediction with `q(x, p...)`.
    pub fn set_q_fn(&mut self, q: impl FnMut(&State<N, D>, &PP) -> Result<ProcessUncertainty<N, D>, ModelError> + 'static) {
        self.q.set(Source::Computed(Box::new(q)));
        debug!("set Q function");
    }

    pub fn set_r(&mut self, R: OutputUncertainty<N, ZD>) -> Result<(), KalmanError> {
        self.dimensions.check_output_square("R", &R)?;
        check_non_negativ(rcond::rcond_symetric(&R), "R")?;
        self.r.set(Source::Direct(R));
        debug!("set R");
        Ok(())
    }

    /// Compute R at each update with `r(x, z, us...)`.
    pub fn set_r_fn(
        &mut self,
        r: impl FnMut(&State<N, D>, &Output<N, ZD>, &UP) -> Result<OutputUncertainty<N, ZD>, ModelError> + 'static,
    ) {
        self.r.set(Source::Computed(Box::new(r)));
        debug!("set R function");
    }

    pub fn set_f(&mut self, F: StateTransition<N, D>) -> Result<(), KalmanError> {
        self.dimensions.check_state_square("F", &F)?;
        self.f.set(Source::Direct(F));
        debug!("set F");
        Ok(())
    }

    /// Compute F at each prediction with `f(x, u, p...)`.
    pub fn set_f_fn(
        &mut self,
        f: impl FnMut(&State<N, D>, &Input<N, UD>, &PP) -> Result<StateTransition<N, D>, ModelError> + 'static,
    ) {
        self.f.set(Source::Computed(Box::new(f)));
        debug!("set F function");
    }

    pub fn set_h(&mut self, H: OutputModel<N, ZD, D>) -> Result<(), KalmanError> {
        self.dimensions.check_output_model("H", &H)?;
        self.h.set(Source::Direct(H));
        debug!("set H");
        Ok(())
    }

    /// Compute H at each update with `h(x, us...)`.
    pub fn set_h_fn(&mut self, h: impl FnMut(&State<N, D>, &UP) -> Result<OutputModel<N, ZD, D>, ModelError> + 'static) {
        self.h.set(Source::Computed(Box::new(h)));
        debug!("set H function");
    }

    pub fn set_g(&mut self, G: InputControl<N, D, UD>) -> Result<(), KalmanError> {
        self.dimensions.check_input_control("G", &G)?;
        self.g.set(Source::Direct(G));
        debug!("set G");
        Ok(())
    }

    /// Compute G at each prediction with `g(p...)`.
    pub fn set_g_fn(&mut self, g: impl FnMut(&PP) -> Result<InputControl<N, D, UD>, ModelError> + 'static) {
        self.g.set(Source::Computed(Box::new(g)));
        debug!("set G function");
    }

    /// Replace the state transition function f.
    pub fn set_transition(
        &mut self,
        transition: impl FnMut(&Context<'_, N, D, ZD, UD>, &State<N, D>, &Input<N, UD>, &PP) -> Result<State<N, D>, ModelError>
            + 'static,
    ) {
        self.transition = Box::new(transition);
        debug!("set transition function");
    }

    /// Replace the observation function h.
    pub fn set_observation(
        &mut self,
        observation: impl FnMut(&Context<'_, N, D, ZD, UD>, &State<N, D>, &UP) -> Result<Output<N, ZD>, ModelError> + 'static,
    ) {
        self.observation = Box::new(observation);
        debug!("set observation function");
    }
}

impl<N: RealField, D: Dim, ZD: Dim, UD: Dim, UP: Pack, PP: Pack> Estimator<N, D> for Kalman<N, D, ZD, UD, UP, PP>
where
    DefaultAllocator: KalmanAllocator<N, D, ZD, UD>,
{
    fn state(&self) -> Result<State<N, D>, KalmanError> {
        self.state.state()
    }
}

impl<N: RealField, D: Dim, ZD: Dim, UD: Dim, UP: Pack, PP: Pack> KalmanEstimator<N, D> for Kalman<N, D, ZD, UD, UP, PP>
where
    DefaultAllocator: KalmanAllocator<N, D, ZD, UD>,
{
    fn init(&mut self, state: &KalmanState<N, D>) -> Result<N, KalmanError> {
        self.dimensions.check_state("x", &state.x)?;
        self.dimensions.check_state_square("X", &state.X)?;
        self.state.init(state)
    }

    fn kalman_state(&self) -> Result<(N, KalmanState<N, D>), KalmanError> {
        self.state.kalman_state()
    }
}
