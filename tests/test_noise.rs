//! Test the noise models and filter consistency against simulated noise.

#![allow(non_snake_case)]

use approx::assert_abs_diff_eq;
use na::{Matrix1, Matrix1x2, Matrix2, Vector1, Vector2};
use na::{U1, U2};
use nalgebra as na;
use rand::rngs::StdRng;
use rand::SeedableRng;

use kalman_estimate::noise::{CorrelatedNoise, CoupledNoise, UncorrelatedNoise};
use kalman_estimate::{Kalman, KalmanBuilder, KalmanError};

#[test]
fn test_noise_covariance() {
    let coupled = CoupledNoise {
        q: Vector1::new(3.),
        G: Vector2::new(1., 2.),
    };
    let correlated = CorrelatedNoise::from_coupled::<U1>(&coupled);
    assert_eq!(correlated.Q, Matrix2::new(3., 6., 6., 12.));
    assert_eq!(correlated.rcond().unwrap(), 0.25);

    let uncorrelated = UncorrelatedNoise::<f64, U2> { q: Vector2::new(2., 5.) };
    let correlated = CorrelatedNoise::from_uncorrelated(&uncorrelated);
    assert_eq!(correlated.Q, Matrix2::new(2., 0., 0., 5.));

    let negative = CorrelatedNoise { Q: Matrix2::new(2., 0., 0., -5.) };
    assert!(matches!(negative.rcond(), Err(KalmanError::NotPositiveSemiDefinite("Q"))));
}

#[test]
fn test_sample_statistics() {
    let mut rng = StdRng::seed_from_u64(7);
    let noise = CorrelatedNoise { Q: Matrix2::new(4., 1., 1., 2.) };

    let count = 20000;
    let mut mean = Vector2::zeros();
    let mut covariance = Matrix2::zeros();
    for _ in 0..count {
        let sample = noise.sample(&mut rng).unwrap();
        mean += sample;
        covariance += sample * sample.transpose();
    }
    mean /= count as f64;
    covariance /= count as f64;

    assert_abs_diff_eq!(mean, Vector2::zeros(), epsilon = 0.1);
    assert_abs_diff_eq!(covariance, noise.Q, epsilon = 0.2);
}

#[test]
fn test_sample_requires_positive_definite() {
    let mut rng = StdRng::seed_from_u64(7);
    let noise = CorrelatedNoise { Q: Matrix2::<f64>::zeros() };
    assert!(matches!(noise.sample(&mut rng), Err(KalmanError::NotPositiveSemiDefinite("Q"))));
}

#[test]
fn test_estimate_consistency() {
    // Normalised estimation error squared of a tracked random walk in velocity
    let mut rng = StdRng::seed_from_u64(11);
    let dt = 0.5;
    let q = 0.2;
    let Q = Matrix2::new(q * dt * dt * dt / 3., q * dt * dt / 2., q * dt * dt / 2., q * dt);
    let R = Matrix1::new(4.);
    let F = Matrix2::new(1., dt, 0., 1.);
    let H = Matrix1x2::new(1., 0.);
    let process = CorrelatedNoise { Q };
    let output = CorrelatedNoise { Q: R };

    let mut filter: Kalman<f64, U2, U1> = KalmanBuilder::new()
        .state(Vector2::new(0., 0.))
        .estimate_uncertainty(Matrix2::identity() * 10.)
        .state_transition(F)
        .process_uncertainty(Q)
        .output_model(H)
        .output_uncertainty(R)
        .build()
        .unwrap();

    let mut truth = Vector2::new(0., 1.);
    let steps = 3000;
    let mut nees = 0.;
    for step in 0..steps {
        truth = F * truth + process.sample(&mut rng).unwrap();
        filter.predict(()).unwrap();
        filter.update((), H * truth + output.sample(&mut rng).unwrap()).unwrap();

        if step >= 100 {
            let error = filter.x() - truth;
            nees += (error.transpose() * filter.p().try_inverse().unwrap() * error)[(0, 0)];
        }
    }
    nees /= (steps - 100) as f64;

    assert!(nees > 1.4 && nees < 2.6, "NEES {}", nees);
}
