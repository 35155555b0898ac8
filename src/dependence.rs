//! Measured material curve $mu_r(B)$.

use crate::{
  error::{Error, Result},
  geometry::Point,
  spline::{Spline, SplineParams},
  VACUUM_PERMEABILITY,
};

use itertools::Itertools;
use std::fmt;

/// Ordered samples of a function of one argument, e.g. relative permeability over flux density.
#[derive(Debug, Clone)]
pub struct Dependence {
  function: String,
  argument: String,
  /// `(argument, function)` pairs, strictly ascending in the argument.
  samples: Vec<Point>,
}

impl Dependence {
  pub fn new(
    function: impl Into<String>,
    argument: impl Into<String>,
    samples: Vec<(f64, f64)>,
  ) -> Result<Self> {
    if samples.len() < 2 {
      return Err(Error::configuration("a dependence needs at least two samples"));
    }
    if !samples.iter().tuple_windows().all(|(a, b)| a.0 < b.0) {
      return Err(Error::configuration(
        "dependence samples must be strictly ascending in the argument",
      ));
    }
    if samples.iter().any(|&(b, mu)| b < 0.0 || !(mu > 0.0) || !mu.is_finite()) {
      return Err(Error::configuration(
        "flux densities must be nonnegative and permeabilities positive",
      ));
    }
    Ok(Self {
      function: function.into(),
      argument: argument.into(),
      samples: samples.into_iter().map(|(b, mu)| Point::new(b, mu)).collect(),
    })
  }

  /// Relative permeability over flux density.
  pub fn permeability_curve(samples: Vec<(f64, f64)>) -> Result<Self> {
    Self::new("mu", "B", samples)
  }

  pub fn function(&self) -> &str {
    &self.function
  }
  pub fn argument(&self) -> &str {
    &self.argument
  }
  pub fn samples(&self) -> &[Point] {
    &self.samples
  }
  pub fn first(&self) -> Point {
    self.samples[0]
  }
  pub fn last(&self) -> Point {
    self.samples[self.samples.len() - 1]
  }

  /// Smoothing spline through the samples.
  pub fn fit_spline(&self, params: SplineParams) -> Result<Spline> {
    Spline::fit(&self.samples, params)
  }

  /// Relative permeability at flux density magnitude `b`.
  ///
  /// Constant below the first sample, spline inside the sampled range,
  /// saturation towards vacuum beyond the last sample.
  pub fn relative_permeability(&self, spline: &Spline, b: f64) -> Result<f64> {
    let first = self.first();
    let last = self.last();
    if b <= first.x {
      Ok(first.y)
    } else if b >= last.x {
      Ok(saturation(last, b))
    } else {
      spline.value_at(b)
    }
  }

  /// Absolute permeability at flux density magnitude `b`.
  pub fn permeability(&self, spline: &Spline, b: f64) -> Result<f64> {
    Ok(VACUUM_PERMEABILITY * self.relative_permeability(spline, b)?)
  }
}

impl fmt::Display for Dependence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}({})", self.function, self.argument)
  }
}

/// $mu_r(B) = B / (B_"last" / mu_"last" + B - B_"last")$
///
/// Continuous at the last sample and tends to 1 for large $B$.
pub fn saturation(last: Point, b: f64) -> f64 {
  b / (last.x / last.y + b - last.x)
}

#[cfg(test)]
mod test {
  use super::{saturation, Dependence};
  use crate::{geometry::Point, spline::SplineParams, VACUUM_PERMEABILITY};

  use approx::assert_relative_eq;

  fn curve() -> Dependence {
    let samples = (0..=8)
      .map(|i| {
        let b = 0.25 * i as f64;
        (b, 1000.0 - 200.0 * b)
      })
      .collect();
    Dependence::permeability_curve(samples).unwrap()
  }

  #[test]
  fn three_regimes() {
    let curve = curve();
    let params = SplineParams {
      partitions: 2,
      tolerance: 1e-13,
      max_iters: 100_000,
      ..Default::default()
    };
    let spline = curve.fit_spline(params).unwrap();

    assert_relative_eq!(curve.relative_permeability(&spline, 0.0).unwrap(), 1000.0);
    assert_relative_eq!(
      curve.relative_permeability(&spline, 1.1).unwrap(),
      780.0,
      epsilon = 1e-4
    );
    assert_relative_eq!(
      curve.relative_permeability(&spline, 2.0).unwrap(),
      600.0,
      epsilon = 1e-9
    );
    let beyond = curve.relative_permeability(&spline, 2.5).unwrap();
    assert!(beyond < 600.0 && beyond > 1.0);
    assert_relative_eq!(
      curve.permeability(&spline, 1.1).unwrap(),
      780.0 * VACUUM_PERMEABILITY,
      max_relative = 1e-6
    );
  }

  #[test]
  fn saturation_is_continuous_and_tends_to_vacuum() {
    let last = Point::new(2.0, 600.0);
    assert_relative_eq!(saturation(last, 2.0), 600.0, epsilon = 1e-9);
    assert!((saturation(last, 1e9) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn unordered_samples_are_rejected() {
    let err = Dependence::permeability_curve(vec![(1.0, 10.0), (0.5, 20.0)]).unwrap_err();
    assert!(err.is_configuration());
    assert!(Dependence::permeability_curve(vec![(0.0, 10.0)]).is_err());
    assert_eq!(curve().to_string(), "mu(B)");
  }
}
