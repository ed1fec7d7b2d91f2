//! Test the displayed filter state.

use na::{Matrix1, Matrix2, Vector1, Vector2};
use na::{U1, U2};
use nalgebra as na;

use kalman_estimate::{Kalman, KalmanBuilder};

#[test]
fn test_scalar_display() {
    let mut filter: Kalman<f64, U1> = KalmanBuilder::new()
        .state(Vector1::new(0.))
        .estimate_uncertainty(Matrix1::new(1.))
        .output_uncertainty(Matrix1::new(1.))
        .build()
        .unwrap();

    assert_eq!(
        filter.to_string(),
        r#"{"f": 1, "h": 1, "k": 1, "p": 1, "q": 0, "r": 1, "s": 1, "x": 0, "y": 0, "z": 0}"#
    );

    filter.update((), Vector1::new(2.)).unwrap();
    assert_eq!(
        filter.to_string(),
        r#"{"f": 1, "h": 1, "k": 0.5, "p": 0.5, "q": 0, "r": 1, "s": 2, "x": 1, "y": 2, "z": 2}"#
    );
}

#[test]
fn test_display_with_input_and_parameters() {
    let mut filter = KalmanBuilder::<f64, U2, U1, U1, (), (f64,)>::new()
        .state(Vector2::new(1., 2.))
        .estimate_uncertainty(Matrix2::identity())
        .output_uncertainty(Matrix1::new(1.))
        .input(Vector1::new(0.))
        .input_control(Vector2::new(1., 0.))
        .prediction_types()
        .build()
        .unwrap();

    filter.predict_with_input((0.5,), Vector1::new(2.)).unwrap();

    assert_eq!(
        filter.to_string(),
        concat!(
            r#"{"f": [[1, 0], [0, 1]], "g": [1, 0], "h": [[1, 0]], "k": [1, 0], "p": [[1, 0], [0, 1]], "#,
            r#""prediction_0": 0.5, "q": [[0, 0], [0, 0]], "r": 1, "s": 1, "u": 2, "x": [3, 2], "y": 0, "z": 0}"#
        )
    );
}
