//! Test failing steps and setters.
//!
//! A failed operation returns its error and leaves the filter as it was.

use std::cell::Cell;
use std::error::Error;
use std::rc::Rc;

use na::{DMatrix, DVector, Dynamic, Matrix1, Matrix1x2, Matrix2, Vector1, Vector2};
use na::{U1, U2};
use nalgebra as na;

use kalman_estimate::{Kalman, KalmanBuilder, KalmanError};

fn linear_filter() -> Kalman<f64, U2, U1, U1> {
    KalmanBuilder::new()
        .state(Vector2::new(1., 2.))
        .estimate_uncertainty(Matrix2::new(2., 0., 0., 3.))
        .input(Vector1::new(0.))
        .state_transition(Matrix2::new(1., 0.5, 0., 1.))
        .process_uncertainty(Matrix2::identity() * 0.1)
        .input_control(Vector2::new(0.5, 1.))
        .output_model(Matrix1x2::new(1., 0.))
        .output_uncertainty(Matrix1::new(1.))
        .build()
        .unwrap()
}

fn dynamic_filter() -> Kalman<f64, Dynamic, Dynamic> {
    KalmanBuilder::new()
        .state(DVector::from_vec(vec![1., 2.]))
        .state_transition(DMatrix::from_row_slice(2, 2, &[1., 0.5, 0., 1.]))
        .process_uncertainty(DMatrix::identity(2, 2) * 0.1)
        .output_model(DMatrix::from_row_slice(1, 2, &[1., 0.]))
        .output_uncertainty(DMatrix::identity(1, 1))
        .build()
        .unwrap()
}

fn assert_callable_failure(error: KalmanError, expected: &str) {
    match &error {
        KalmanError::CallableFailure { binding, .. } => assert_eq!(*binding, expected),
        error => panic!("unexpected {}", error),
    }
    assert_eq!(error.source().map(|source| source.to_string()), Some("model failure".to_string()));
}

#[test]
fn test_arity_mismatch() {
    let mut filter = linear_filter();
    let before = filter.to_string();

    let error = filter.predict_with_components((), &[1., 2.]).unwrap_err();
    assert!(matches!(error, KalmanError::ArityMismatch { what: "input", expected: 1, found: 2 }));
    let error = filter.update_with_components((), &[]).unwrap_err();
    assert!(matches!(error, KalmanError::ArityMismatch { what: "output", expected: 1, found: 0 }));
    assert_eq!(filter.to_string(), before);

    filter.predict_with_components((), &[2.]).unwrap();
    assert_eq!(filter.u(), &Vector1::new(2.));
    filter.update_with_components((), &[1.5]).unwrap();
    assert_eq!(filter.z(), &Vector1::new(1.5));
}

#[test]
fn test_dynamic_arity_mismatch() {
    let mut filter = dynamic_filter();
    let before = filter.to_string();

    let error = filter.update((), DVector::from_vec(vec![1., 2., 3.])).unwrap_err();
    assert!(matches!(error, KalmanError::ArityMismatch { what: "output", expected: 1, found: 3 }));
    let error = filter.predict_with_components((), &[1.]).unwrap_err();
    assert!(matches!(error, KalmanError::ArityMismatch { what: "input", expected: 0, found: 1 }));
    assert_eq!(filter.to_string(), before);
}

#[test]
fn test_prediction_callable_failure() {
    let mut filter = linear_filter();
    filter.predict_with_input((), Vector1::new(1.)).unwrap();
    filter.update((), Vector1::new(2.)).unwrap();
    let before = filter.to_string();

    filter.set_f_fn(|_, _, _| Err("model failure".into()));
    assert_callable_failure(filter.predict(()).unwrap_err(), "F");
    assert_eq!(filter.to_string(), before);
    filter.set_f(Matrix2::new(1., 0.5, 0., 1.)).unwrap();

    // A refreshed F is not kept when a later binding fails
    filter.set_f_fn(|_, _, _| Ok(Matrix2::identity() * 2.));
    filter.set_q_fn(|_, _| Err("model failure".into()));
    assert_callable_failure(filter.predict(()).unwrap_err(), "Q");
    assert_eq!(filter.to_string(), before);
    filter.set_f(Matrix2::new(1., 0.5, 0., 1.)).unwrap();
    filter.set_q(Matrix2::identity() * 0.1).unwrap();

    filter.set_g_fn(|_| Err("model failure".into()));
    assert_callable_failure(filter.predict_with_input((), Vector1::new(3.)).unwrap_err(), "G");
    assert_eq!(filter.to_string(), before);
    filter.set_g(Vector2::new(0.5, 1.)).unwrap();

    filter.set_transition(|_, _, _, _| Err("model failure".into()));
    assert_callable_failure(filter.predict_with_input((), Vector1::new(3.)).unwrap_err(), "f");
    assert_eq!(filter.to_string(), before);
}

#[test]
fn test_update_callable_failure() {
    let mut filter = linear_filter();
    filter.predict(()).unwrap();
    let before = filter.to_string();

    filter.set_h_fn(|_, _| Err("model failure".into()));
    assert_callable_failure(filter.update((), Vector1::new(2.)).unwrap_err(), "H");
    assert_eq!(filter.to_string(), before);
    filter.set_h(Matrix1x2::new(1., 0.)).unwrap();

    filter.set_r_fn(|_, _, _| Err("model failure".into()));
    assert_callable_failure(filter.update((), Vector1::new(2.)).unwrap_err(), "R");
    assert_eq!(filter.to_string(), before);
    filter.set_r(Matrix1::new(1.)).unwrap();

    filter.set_observation(|_, _, _| Err("model failure".into()));
    assert_callable_failure(filter.update((), Vector1::new(2.)).unwrap_err(), "h");
    assert_eq!(filter.to_string(), before);
}

#[test]
fn test_recovery_after_failure() {
    let failing = Rc::new(Cell::new(true));
    let mut filter = linear_filter();
    let mut reference = linear_filter();

    let failing_q = failing.clone();
    filter.set_q_fn(move |_, _| {
        if failing_q.get() {
            Err("model failure".into())
        } else {
            Ok(Matrix2::identity() * 0.1)
        }
    });

    assert_callable_failure(filter.predict(()).unwrap_err(), "Q");
    failing.set(false);
    filter.predict(()).unwrap();
    reference.predict(()).unwrap();

    assert_eq!(filter.x(), reference.x());
    assert_eq!(filter.p(), reference.p());
}

#[test]
fn test_computed_shape_mismatch() {
    let mut filter = dynamic_filter();
    let before = filter.to_string();

    filter.set_f_fn(|_, _, _| Ok(DMatrix::identity(3, 3)));
    let error = filter.predict(()).unwrap_err();
    assert!(matches!(error, KalmanError::ShapeMismatch { what: "F", .. }));
    filter.set_f(DMatrix::from_row_slice(2, 2, &[1., 0.5, 0., 1.])).unwrap();

    filter.set_transition(|_, _, _, _| Ok(DVector::zeros(3)));
    let error = filter.predict(()).unwrap_err();
    assert!(matches!(error, KalmanError::ShapeMismatch { what: "f(x)", expected: (2, 1), found: (3, 1) }));

    filter.set_r_fn(|_, _, _| Ok(DMatrix::identity(2, 2)));
    let error = filter.update((), DVector::from_vec(vec![1.])).unwrap_err();
    assert!(matches!(error, KalmanError::ShapeMismatch { what: "R", .. }));
    assert_eq!(filter.to_string(), before);
}

#[test]
fn test_singular_innovation() {
    let mut filter: Kalman<f64, U1> = KalmanBuilder::new()
        .state(Vector1::new(3.))
        .estimate_uncertainty(Matrix1::zeros())
        .output_uncertainty(Matrix1::zeros())
        .build()
        .unwrap();
    let before = filter.to_string();

    let error = filter.update((), Vector1::new(4.)).unwrap_err();
    assert!(matches!(error, KalmanError::Singular("S")));
    assert_eq!(filter.to_string(), before);
    assert!(filter.update_arguments().is_none());
}

#[test]
fn test_setters() {
    let mut filter = dynamic_filter();
    let before = filter.to_string();

    assert!(matches!(
        filter.set_x(DVector::zeros(3)).unwrap_err(),
        KalmanError::ShapeMismatch { what: "x", expected: (2, 1), found: (3, 1) }
    ));
    assert!(matches!(filter.set_p(DMatrix::identity(3, 3)).unwrap_err(), KalmanError::ShapeMismatch { what: "P", .. }));
    assert!(matches!(filter.set_q(DMatrix::identity(1, 1)).unwrap_err(), KalmanError::ShapeMismatch { what: "Q", .. }));
    assert!(matches!(filter.set_r(DMatrix::identity(2, 2)).unwrap_err(), KalmanError::ShapeMismatch { what: "R", .. }));
    assert!(matches!(filter.set_f(DMatrix::identity(2, 3)).unwrap_err(), KalmanError::ShapeMismatch { what: "F", .. }));
    assert!(matches!(filter.set_h(DMatrix::identity(2, 2)).unwrap_err(), KalmanError::ShapeMismatch { what: "H", .. }));
    assert!(matches!(filter.set_p(-DMatrix::identity(2, 2)).unwrap_err(), KalmanError::NotPositiveSemiDefinite("P")));
    assert!(matches!(filter.set_q(-DMatrix::identity(2, 2)).unwrap_err(), KalmanError::NotPositiveSemiDefinite("Q")));
    assert!(matches!(filter.set_r(-DMatrix::identity(1, 1)).unwrap_err(), KalmanError::NotPositiveSemiDefinite("R")));
    assert_eq!(filter.to_string(), before);

    filter.set_x(DVector::from_vec(vec![5., 6.])).unwrap();
    filter.set_p(DMatrix::identity(2, 2) * 4.).unwrap();
    assert_eq!(filter.x(), &DVector::from_vec(vec![5., 6.]));
    assert_eq!(filter.p(), &(DMatrix::identity(2, 2) * 4.));
}
