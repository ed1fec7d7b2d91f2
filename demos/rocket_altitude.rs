//! Estimate the altitude of a rocket from an altimeter, with the accelerometer as the filter input.
//!
//! The step time is passed to the prediction model functions. Run with `RUST_LOG=trace` to log each step.

use log::info;
use na::{Matrix1, Matrix1x2, Matrix2, Vector1, Vector2};
use nalgebra as na;

use kalman_estimate::{KalmanBuilder, KalmanError};

const GRAVITY: f64 = -9.8;
const ACCELEROMETER_NOISE: f64 = 0.1;

/// Altimeter measurement and accelerometer reading at each step.
const MEASUREMENTS: [(f64, f64); 12] = [
    (-32.4, 39.72),
    (-11.1, 40.02),
    (18., 39.97),
    (22.9, 39.81),
    (19.5, 39.75),
    (28.5, 39.6),
    (46.5, 39.77),
    (68.9, 39.83),
    (48.2, 39.73),
    (56.1, 39.87),
    (90.5, 39.81),
    (104.9, 39.92),
];

fn main() -> Result<(), KalmanError> {
    env_logger::init();

    let mut filter = KalmanBuilder::<f64, na::U2, na::U1, na::U1, (), (f64,)>::new()
        .state(Vector2::new(0., 0.))
        .estimate_uncertainty(Matrix2::new(500., 0., 0., 500.))
        .input(Vector1::new(0.))
        .process_uncertainty_fn(|_, &(dt,)| {
            let e = ACCELEROMETER_NOISE * ACCELEROMETER_NOISE;
            Ok(Matrix2::new(e * dt * dt * dt * dt / 4., e * dt * dt * dt / 2., e * dt * dt * dt / 2., e * dt * dt))
        })
        .state_transition_fn(|_, _, &(dt,)| Ok(Matrix2::new(1., dt, 0., 1.)))
        .input_control_fn(|&(dt,)| Ok(Vector2::new(0.5 * dt * dt, dt)))
        .output_model(Matrix1x2::new(1., 0.))
        .output_uncertainty(Matrix1::new(400.))
        .prediction_types()
        .build()?;
    info!("{:?} filter", filter.variant());

    let dt = 0.25;
    // At rest on the launch pad the accelerometer measures the opposite of gravity
    filter.predict_with_input((dt,), Vector1::new(-GRAVITY))?;

    for (i, &(altitude, acceleration)) in MEASUREMENTS.iter().enumerate() {
        filter.update((), Vector1::new(altitude))?;
        filter.predict_with_input((dt,), Vector1::new(acceleration + GRAVITY))?;
        info!("step {} innovation {:.2} gain {:.3}", i, filter.y()[0], filter.k()[0]);
        println!("altitude {:.2} velocity {:.2} variance {:.2}", filter.x()[0], filter.x()[1], filter.p()[(0, 0)]);
    }

    Ok(())
}
