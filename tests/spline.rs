//! Smoothing behaviour of the material curve spline.

use magnetostatics::{
  geometry::Point,
  spline::{Spline, SplineParams},
};

use approx::assert_relative_eq;
use itertools::Itertools;

fn cubic(x: f64) -> f64 {
  1.0 + x + 0.5 * x * x - 0.2 * x * x * x
}

fn cubic_samples() -> Vec<Point> {
  (0..=40)
    .map(|i| {
      let x = 2.0 * i as f64 / 40.0;
      Point::new(x, cubic(x))
    })
    .collect()
}

fn params(alpha: f64, beta: f64) -> SplineParams {
  SplineParams {
    alpha,
    beta,
    partitions: 4,
    tolerance: 1e-14,
    max_iters: 200_000,
    ..Default::default()
  }
}

#[test]
fn unregularized_spline_reproduces_samples() {
  let samples = cubic_samples();
  let spline = Spline::fit(&samples, params(0.0, 0.0)).unwrap();
  assert_eq!(spline.elements().len(), 4);
  assert_eq!(spline.coeffs().len(), 10);
  for p in &samples {
    assert_relative_eq!(spline.value_at(p.x).unwrap(), p.y, epsilon = 1e-7);
  }
  // s'' = 1 - 1.2 x
  assert_relative_eq!(spline.second_derivative_at(0.5).unwrap(), 0.4, epsilon = 1e-5);
  // int_0^2 (1 - 1.2 x)^2 dx
  assert_relative_eq!(spline.roughness(), 1.04, epsilon = 1e-5);
}

#[test]
fn curvature_decreases_with_second_derivative_weight() {
  let samples = cubic_samples();
  let roughness: Vec<f64> = [1e-6, 1e-3, 1e-1, 10.0]
    .into_iter()
    .map(|beta| Spline::fit(&samples, params(0.0, beta)).unwrap().roughness())
    .collect();
  assert!(
    roughness.iter().tuple_windows().all(|(a, b)| a > b),
    "roughness not decreasing: {roughness:?}"
  );
}

#[test]
fn strong_first_derivative_weight_flattens_the_curve() {
  let samples = cubic_samples();
  let loose = Spline::fit(&samples, params(0.0, 0.0)).unwrap();
  let stiff = Spline::fit(&samples, params(1e3, 0.0)).unwrap();
  let slope = |s: &Spline| s.derivative_at(1.0).unwrap().abs();
  assert!(slope(&stiff) < 0.1 * slope(&loose));

  // the fit then tends to the sample mean
  let mean = samples.iter().map(|p| p.y).sum::<f64>() / samples.len() as f64;
  assert_relative_eq!(stiff.value_at(1.0).unwrap(), mean, epsilon = 5e-2);
}
