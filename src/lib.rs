///
/// Kalman+Estimate the Kalman filter library.
/// Copyright (c) 2020 Michael Stevens
///
/// Bayesian Filtering is a probabilistic technique for data fusion. The technique combines a concise mathematical formulation of a system with observations of that system.
/// For discrete linear systems with Gaussian noise the Bayesian formulation results in the Kalman filter, an iterative data fusion solution that
/// combines observed outputs of the system with the system's dynamic model.
///
/// The library implements the discrete Kalman filter in its linear and extended forms over nalgebra matrices of static or dynamic size.
/// A filter is assembled by a [`KalmanBuilder`] from labelled parameters: the state, output and input, their uncertainties and the models
/// relating them. Each model matrix is bound either to a value or to a function of the state and the caller's step parameters.
/// The filter is then stepped with `predict` and `update`.
///
/// The covariance update is in Joseph form and the estimate covariance is kept symmetric after every step.
/// State represention is by the [`KalmanState`] struct. Estimation operations are defined by traits.
//
/// # Licensing
///
/// All Bayes++ source code files are copyright with the license conditions as given here. The copyright notice is that of the MIT license.
///  This in no way restricts any commercial use you may wish to make using our source code.
///  As long as you respect the copyright and license conditions, Michael Stevens is happy to for you to use it in any way you wish.
///
/// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction,
/// including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software,
/// and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
///
/// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
///
/// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
/// FITNESS FOR A PARTICULAR PURPOSE AND NON INFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY,
/// WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

pub mod bindings;
pub mod builder;
pub mod dimensions;
pub mod error;
pub mod estimators;
pub mod format;
pub mod kalman;
pub mod linalg;
pub mod models;
pub mod noise;

pub use bindings::{Context, Pack, Source};
pub use builder::{KalmanBuilder, Label, Variant};
pub use dimensions::Dimensions;
pub use error::{KalmanError, ModelError};
pub use kalman::Kalman;
pub use models::{Estimator, KalmanEstimator, KalmanState};
