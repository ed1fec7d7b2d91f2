//! Operation of a Kalman filter in a simple example.
//!
//! A filter with one state and constant noises.

use na::{Matrix1, Vector1};
use nalgebra as na;

use kalman_estimate::{Kalman, KalmanBuilder, KalmanError};

fn main() -> Result<(), KalmanError> {
    // Construct a filter initialy at 10 with no uncertainty, a constant state model and unit noises
    let mut filter: Kalman<f64, na::U1> = KalmanBuilder::new()
        .state(Vector1::new(10.))
        .estimate_uncertainty(Matrix1::new(0.))
        .state_transition(Matrix1::new(1.))
        .process_uncertainty(Matrix1::new(1.))
        .output_model(Matrix1::new(1.))
        .output_uncertainty(Matrix1::new(1.))
        .build()?;
    println!("Initial x{:.1} X{:.2}", filter.x(), filter.p());

    // Make a state prediction
    filter.predict(())?;
    println!("Predict x{:.1} X{:.2}", filter.x(), filter.p());

    // Make an observation that we appear to be at 11
    filter.update((), Vector1::new(11.))?;
    println!("Observe x{:.1} X{:.2}", filter.x(), filter.p());

    println!("{}", filter);
    Ok(())
}
