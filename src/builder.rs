#![allow(non_snake_case)]

//! Filter assembly.
//!
//! A [`KalmanBuilder`] takes any subset of the labelled filter parameters. Building selects the simplest
//! [`Variant`] accepting every given label, defaults the parameters that were not given and checks the
//! configuration is consistent.
//!
//! [`KalmanBuilder`]: struct.KalmanBuilder.html
//! [`Variant`]: enum.Variant.html

use log::debug;
use na::{DefaultAllocator, Dim, RealField, U0, U1};
use na::storage::Storage;
use nalgebra as na;

use crate::bindings::{
    linear_observation, linear_transition, Binding, Context, InputControlFn, ObservationFn, OutputModelFn, OutputUncertaintyFn,
    Pack, ProcessUncertaintyFn, Source, StateTransitionFn, TransitionFn,
};
use crate::dimensions::{
    deduce, Dimensions, EstimateUncertainty, Input, InputControl, KalmanAllocator, Output, OutputModel,
    OutputUncertainty, ProcessUncertainty, State, StateTransition,
};
use crate::error::{KalmanError, ModelError};
use crate::kalman::Kalman;
use crate::linalg::{check_non_negativ, identity, rcond, zeros};
use crate::models::KalmanState;

/// The role of a filter parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    State,
    Output,
    Input,
    EstimateUncertainty,
    ProcessUncertainty,
    OutputUncertainty,
    OutputModel,
    StateTransition,
    InputControl,
    Transition,
    Observation,
    UpdateTypes,
    PredictionTypes,
}

/// The filter variants, from the simplest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    /// Output is the state.
    PassThrough,
    /// Static gain observer.
    Observer,
    /// Linear transition without process noise shaping.
    Transition,
    /// Linear Kalman filter.
    Linear,
    /// Linear Kalman filter with an input.
    LinearInput,
    /// Extended Kalman filter with model functions.
    Extended,
}

const PASS_THROUGH: &[Label] = &[Label::State];
const OBSERVER: &[Label] = &[Label::State, Label::Output, Label::EstimateUncertainty, Label::OutputUncertainty];
const TRANSITION: &[Label] = &[
    Label::State,
    Label::Output,
    Label::EstimateUncertainty,
    Label::OutputUncertainty,
    Label::StateTransition,
];
const LINEAR: &[Label] = &[
    Label::State,
    Label::Output,
    Label::EstimateUncertainty,
    Label::OutputUncertainty,
    Label::StateTransition,
    Label::ProcessUncertainty,
    Label::OutputModel,
];
const LINEAR_INPUT: &[Label] = &[
    Label::State,
    Label::Output,
    Label::EstimateUncertainty,
    Label::OutputUncertainty,
    Label::StateTransition,
    Label::ProcessUncertainty,
    Label::OutputModel,
    Label::Input,
    Label::InputControl,
];
const EXTENDED: &[Label] = &[
    Label::State,
    Label::Output,
    Label::EstimateUncertainty,
    Label::OutputUncertainty,
    Label::StateTransition,
    Label::ProcessUncertainty,
    Label::OutputModel,
    Label::Input,
    Label::InputControl,
    Label::Transition,
    Label::Observation,
    Label::UpdateTypes,
    Label::PredictionTypes,
];

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::PassThrough,
        Variant::Observer,
        Variant::Transition,
        Variant::Linear,
        Variant::LinearInput,
        Variant::Extended,
    ];

    /// The labels a variant accepts.
    pub fn labels(self) -> &'static [Label] {
        match self {
            Variant::PassThrough => PASS_THROUGH,
            Variant::Observer => OBSERVER,
            Variant::Transition => TRANSITION,
            Variant::Linear => LINEAR,
            Variant::LinearInput => LINEAR_INPUT,
            Variant::Extended => EXTENDED,
        }
    }

    /// The simplest variant accepting all of `labels`.
    pub fn select(labels: &[Label]) -> Option<Variant> {
        Variant::ALL
            .iter()
            .copied()
            .find(|variant| labels.iter().all(|label| variant.labels().contains(label)))
    }
}

/// Builder of a [`Kalman`] filter from labelled parameters.
///
/// Every parameter except the state is optional. A parameter may be given once.
///
/// [`Kalman`]: ../kalman/struct.Kalman.html
pub struct KalmanBuilder<N: RealField, D: Dim, ZD: Dim = D, UD: Dim = U0, UP: Pack = (), PP: Pack = ()>
where
    DefaultAllocator: KalmanAllocator<N, D, ZD, UD>,
{
    labels: Vec<Label>,
    x: Option<State<N, D>>,
    z: Option<Output<N, ZD>>,
    u: Option<Input<N, UD>>,
    p: Option<EstimateUncertainty<N, D>>,
    q: Option<Source<ProcessUncertainty<N, D>, ProcessUncertaintyFn<N, D, PP>>>,
    r: Option<Source<OutputUncertainty<N, ZD>, OutputUncertaintyFn<N, D, ZD, UP>>>,
    h: Option<Source<OutputModel<N, ZD, D>, OutputModelFn<N, D, ZD, UP>>>,
    f: Option<Source<StateTransition<N, D>, StateTransitionFn<N, D, UD, PP>>>,
    g: Option<Source<InputControl<N, D, UD>, InputControlFn<N, D, UD, PP>>>,
    transition: Option<Box<TransitionFn<N, D, ZD, UD, PP>>>,
    observation: Option<Box<ObservationFn<N, D, ZD, UD, UP>>>,
}

impl<N: RealField, D: Dim, ZD: Dim, UD: Dim, UP: Pack + 'static, PP: Pack + 'static> Default
    for KalmanBuilder<N, D, ZD, UD, UP, PP>
where
    DefaultAllocator: KalmanAllocator<N, D, ZD, UD>,
{
    fn default() -> Self {
        KalmanBuilder::new()
    }
}

impl<N: RealField, D: Dim, ZD: Dim, UD: Dim, UP: Pack + 'static, PP: Pack + 'static> KalmanBuilder<N, D, ZD, UD, UP, PP>
where
    DefaultAllocator: KalmanAllocator<N, D, ZD, UD>,
{
    pub fn new() -> Self {
        KalmanBuilder {
            labels: Vec::new(),
            x: None,
            z: None,
            u: None,
            p: None,
            q: None,
            r: None,
            h: None,
            f: None,
            g: None,
            transition: None,
            observation: None,
        }
    }

    fn label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Initial state estimate X. Required.
    pub fn state(mut self, x: State<N, D>) -> Self {
        self.x = Some(x);
        self.label(Label::State)
    }

    /// Initial output Z, declaring the output space.
    pub fn output(mut self, z: Output<N, ZD>) -> Self {
        self.z = Some(z);
        self.label(Label::Output)
    }

    /// Initial input U, declaring the input space.
    pub fn input(mut self, u: Input<N, UD>) -> Self {
        self.u = Some(u);
        self.label(Label::Input)
    }

    /// Initial estimate covariance P.
    pub fn estimate_uncertainty(mut self, P: EstimateUncertainty<N, D>) -> Self {
        self.p = Some(P);
        self.label(Label::EstimateUncertainty)
    }

    pub fn process_uncertainty(mut self, Q: ProcessUncertainty<N, D>) -> Self {
        self.q = Some(Source::Direct(Q));
        self.label(Label::ProcessUncertainty)
    }

    /// Process noise covariance computed at each prediction as `q(x, p...)`.
    pub fn process_uncertainty_fn(
        mut self,
        q: impl FnMut(&State<N, D>, &PP) -> Result<ProcessUncertainty<N, D>, ModelError> + 'static,
    ) -> Self {
        self.q = Some(Source::Computed(Box::new(q)));
        self.label(Label::ProcessUncertainty)
    }

    pub fn output_uncertainty(mut self, R: OutputUncertainty<N, ZD>) -> Self {
        self.r = Some(Source::Direct(R));
        self.label(Label::OutputUncertainty)
    }

    /// Output noise covariance computed at each update as `r(x, z, us...)`.
    pub fn output_uncertainty_fn(
        mut self,
        r: impl FnMut(&State<N, D>, &Output<N, ZD>, &UP) -> Result<OutputUncertainty<N, ZD>, ModelError> + 'static,
    ) -> Self {
        self.r = Some(Source::Computed(Box::new(r)));
        self.label(Label::OutputUncertainty)
    }

    pub fn output_model(mut self, H: OutputModel<N, ZD, D>) -> Self {
        self.h = Some(Source::Direct(H));
        self.label(Label::OutputModel)
    }

    /// Output model computed at each update as `h(x, us...)`, the Jacobian of the observation function.
    pub fn output_model_fn(
        mut self,
        h: impl FnMut(&State<N, D>, &UP) -> Result<OutputModel<N, ZD, D>, ModelError> + 'static,
    ) -> Self {
        self.h = Some(Source::Computed(Box::new(h)));
        self.label(Label::OutputModel)
    }

    pub fn state_transition(mut self, F: StateTransition<N, D>) -> Self {
        self.f = Some(Source::Direct(F));
        self.label(Label::StateTransition)
    }

    /// State transition computed at each prediction as `f(x, u, p...)`, the Jacobian of the transition function.
    pub fn state_transition_fn(
        mut self,
        f: impl FnMut(&State<N, D>, &Input<N, UD>, &PP) -> Result<StateTransition<N, D>, ModelError> + 'static,
    ) -> Self {
        self.f = Some(Source::Computed(Box::new(f)));
        self.label(Label::StateTransition)
    }

    pub fn input_control(mut self, G: InputControl<N, D, UD>) -> Self {
        self.g = Some(Source::Direct(G));
        self.label(Label::InputControl)
    }

    /// Input control computed at each prediction as `g(p...)`.
    pub fn input_control_fn(
        mut self,
        g: impl FnMut(&PP) -> Result<InputControl<N, D, UD>, ModelError> + 'static,
    ) -> Self {
        self.g = Some(Source::Computed(Box::new(g)));
        self.label(Label::InputControl)
    }

    /// Non-linear state transition function.
    pub fn transition(
        mut self,
        transition: impl FnMut(&Context<'_, N, D, ZD, UD>, &State<N, D>, &Input<N, UD>, &PP) -> Result<State<N, D>, ModelError>
            + 'static,
    ) -> Self {
        self.transition = Some(Box::new(transition));
        self.label(Label::Transition)
    }

    /// Non-linear observation function.
    pub fn observation(
        mut self,
        observation: impl FnMut(&Context<'_, N, D, ZD, UD>, &State<N, D>, &UP) -> Result<Output<N, ZD>, ModelError> + 'static,
    ) -> Self {
        self.observation = Some(Box::new(observation));
        self.label(Label::Observation)
    }

    /// Declare the update parameter pack `UP`.
    pub fn update_types(self) -> Self {
        self.label(Label::UpdateTypes)
    }

    /// Declare the prediction parameter pack `PP`.
    pub fn prediction_types(self) -> Self {
        self.label(Label::PredictionTypes)
    }

    fn has(&self, label: Label) -> bool {
        self.labels.contains(&label)
    }

    fn check_labels(&self) -> Result<Variant, KalmanError> {
        if !self.has(Label::State) {
            return Err(KalmanError::UnsupportedConfiguration("state is required"));
        }
        for (i, label) in self.labels.iter().enumerate() {
            if self.labels[i + 1..].contains(label) {
                return Err(KalmanError::UnsupportedConfiguration("parameter given more than once"));
            }
        }
        if self.has(Label::InputControl) && !self.has(Label::Input) {
            return Err(KalmanError::UnsupportedConfiguration("input control without an input"));
        }
        if UP::ARITY > 0 && !self.has(Label::UpdateTypes) {
            return Err(KalmanError::UnsupportedConfiguration("update parameters without update types"));
        }
        if PP::ARITY > 0 && !self.has(Label::PredictionTypes) {
            return Err(KalmanError::UnsupportedConfiguration("prediction parameters without prediction types"));
        }

        Variant::select(&self.labels).ok_or(KalmanError::UnsupportedConfiguration("no variant accepts the parameters"))
    }

    /// Deduce the sizes of the output and input spaces.
    fn dimensions(&self, variant: Variant, d: D) -> Result<Dimensions<D, ZD, UD>, KalmanError> {
        let output_size = self
            .z
            .as_ref()
            .map(|z| z.nrows())
            .or_else(|| match &self.r {
                Some(Source::Direct(R)) => Some(R.nrows()),
                _ => None,
            })
            .or_else(|| match &self.h {
                Some(Source::Direct(H)) => Some(H.nrows()),
                _ => None,
            })
            .or_else(|| match variant {
                Variant::PassThrough => Some(d.value()),
                _ => None,
            });
        let zd = deduce::<ZD>(output_size)
            .ok_or(KalmanError::UnsupportedConfiguration("output size cannot be deduced"))?;

        let input_size = self.u.as_ref().map(|u| u.nrows()).or_else(|| match &self.g {
            Some(Source::Direct(G)) => Some(G.ncols()),
            _ => None,
        });
        let ud = deduce::<UD>(input_size.or(Some(0)))
            .ok_or(KalmanError::UnsupportedConfiguration("input size cannot be deduced"))?;

        Ok(Dimensions::new(d, zd, ud))
    }

    /// Build the filter.
    pub fn build(self) -> Result<Kalman<N, D, ZD, UD, UP, PP>, KalmanError> {
        let variant = self.check_labels()?;
        let d = match &self.x {
            Some(x) => x.data.shape().0,
            None => return Err(KalmanError::UnsupportedConfiguration("state is required")),
        };
        let dimensions = self.dimensions(variant, d)?;
        let (n, m, k) = (dimensions.state, dimensions.output, dimensions.input);

        if self.u.is_some() && !dimensions.has_input() {
            return Err(KalmanError::UnsupportedConfiguration("input with an empty input space"));
        }
        if variant == Variant::PassThrough && dimensions.output_size() != dimensions.state_size() {
            return Err(KalmanError::UnsupportedConfiguration("pass through output differs from the state"));
        }

        let x = self.x.unwrap_or_else(|| zeros(n, U1));
        let z = self.z.unwrap_or_else(|| zeros(m, U1));
        dimensions.check_output("z", &z)?;
        let u = self.u.unwrap_or_else(|| zeros(k, U1));
        dimensions.check_input("u", &u)?;
        let P = self.p.unwrap_or_else(|| identity(n, n));
        dimensions.check_state_square("P", &P)?;
        check_non_negativ(rcond::rcond_symetric(&P), "P")?;

        let q = bind(self.q, zeros(n, n));
        dimensions.check_state_square("Q", q.value())?;
        check_non_negativ(rcond::rcond_symetric(q.value()), "Q")?;
        let r = bind(self.r, zeros(m, m));
        dimensions.check_output_square("R", r.value())?;
        check_non_negativ(rcond::rcond_symetric(r.value()), "R")?;
        let f = bind(self.f, identity(n, n));
        dimensions.check_state_square("F", f.value())?;
        let h = bind(self.h, identity(m, n));
        dimensions.check_output_model("H", h.value())?;
        let g = bind(self.g, identity(n, k));
        dimensions.check_input_control("G", g.value())?;

        let transition: Box<TransitionFn<N, D, ZD, UD, PP>> = match self.transition {
            Some(transition) => transition,
            None => Box::new(linear_transition::<N, D, ZD, UD, PP>),
        };
        let observation: Box<ObservationFn<N, D, ZD, UD, UP>> = match self.observation {
            Some(observation) => observation,
            None => Box::new(linear_observation::<N, D, ZD, UD, UP>),
        };

        debug!(
            "built {:?} filter: state {}, output {}, input {}",
            variant,
            dimensions.state_size(),
            dimensions.output_size(),
            dimensions.input_size()
        );

        Ok(Kalman {
            variant,
            dimensions,
            state: KalmanState { x, X: P },
            q,
            r,
            f,
            h,
            g,
            transition,
            observation,
            u,
            z,
            y: zeros(m, U1),
            s: identity(m, m),
            k: identity(n, m),
            prediction: None,
            update: None,
        })
    }
}

fn bind<M, F: ?Sized>(source: Option<Source<M, F>>, default: M) -> Binding<M, F> {
    match source {
        Some(source) => Binding::from_source(source, default),
        None => Binding::direct(default),
    }
}
