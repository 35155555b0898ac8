//! Smoothing spline from cubic Hermite finite elements.
//!
//! Minimizes
//! $sum_k (s(x_k) - y_k)^2 + alpha integral s'^2 + beta integral s''^2$
//! over $C^1$ piecewise cubics on an equidistant partition of the sample range.

pub mod band;

pub use band::{RelaxationReport, SymmetricBandMatrix};

use crate::{
  basis::{Basis1d, HermiteBasis},
  error::{Error, Result},
  geometry::{Interval, Point},
  quadrature::Integrator,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineParams {
  /// Weight of the first derivative regularizer.
  pub alpha: f64,
  /// Weight of the second derivative regularizer.
  pub beta: f64,
  pub partitions: usize,
  /// SOR relaxation factor.
  pub relaxation: f64,
  pub tolerance: f64,
  pub max_iters: usize,
}

impl Default for SplineParams {
  fn default() -> Self {
    Self {
      alpha: 0.0,
      beta: 0.0,
      partitions: 1,
      relaxation: 1.23,
      tolerance: 1e-15,
      max_iters: 1000,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Spline {
  params: SplineParams,
  elements: Vec<Interval>,
  coeffs: na::DVector<f64>,
  samples: Vec<Point>,
  integrator: Integrator,
  report: RelaxationReport,
}

impl Spline {
  /// Fits the spline to `samples`, which may be given in any order.
  pub fn fit(samples: &[Point], params: SplineParams) -> Result<Self> {
    Self::fit_with(samples, params, Integrator::default())
  }

  pub fn fit_with(samples: &[Point], params: SplineParams, integrator: Integrator) -> Result<Self> {
    if params.partitions == 0 {
      return Err(Error::configuration("spline needs at least one partition"));
    }
    if samples.len() < 2 {
      return Err(Error::configuration("spline needs at least two samples"));
    }
    if samples.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
      return Err(Error::configuration("spline samples must be finite"));
    }
    if !(0.0 < params.relaxation && params.relaxation < 2.0) {
      return Err(Error::configuration(format!(
        "relaxation factor {} outside (0,2)",
        params.relaxation
      )));
    }

    let mut samples = samples.to_vec();
    samples.sort_by(|a, b| a.x.total_cmp(&b.x));
    let elements = partition(samples[0].x, samples[samples.len() - 1].x, params.partitions)?;

    let basis = HermiteBasis;
    let ndofs = 2 * elements.len() + 2;
    let mut matrix = SymmetricBandMatrix::zeros(ndofs, basis.size() - 1);
    let mut vector = na::DVector::zeros(ndofs);

    let mut claimed = vec![false; samples.len()];
    for (ielem, element) in elements.iter().enumerate() {
      let h = element.length();
      let mut elmat = na::DMatrix::<f64>::zeros(basis.size(), basis.size());

      for (sample, claimed) in samples.iter().zip(claimed.iter_mut()) {
        if *claimed || !element.contains(sample.x) {
          continue;
        }
        *claimed = true;
        let xi = element.to_local(sample.x);
        for i in 0..basis.size() {
          let psi_i = basis.psi(i, xi, h);
          vector[2 * ielem + i] += sample.y * psi_i;
          for j in 0..basis.size() {
            elmat[(i, j)] += psi_i * basis.psi(j, xi, h);
          }
        }
      }

      for i in 0..basis.size() {
        for j in 0..basis.size() {
          let first = integrator.integrate_1d(
            |xi, h| basis.dpsi(i, xi, h) * basis.dpsi(j, xi, h),
            element,
          );
          let second = integrator.integrate_1d(
            |xi, h| basis.ddpsi(i, xi, h) * basis.ddpsi(j, xi, h),
            element,
          );
          elmat[(i, j)] += params.alpha * first + params.beta * second;
        }
      }

      for i in 0..basis.size() {
        for j in i..basis.size() {
          matrix.add(2 * ielem + i, 2 * ielem + j, elmat[(i, j)]);
        }
      }
    }

    if (0..ndofs).any(|i| matrix.get(i, i) <= 0.0) {
      return Err(Error::configuration(
        "spline system is singular, add samples or regularization",
      ));
    }

    let mut coeffs = na::DVector::zeros(ndofs);
    let report = matrix.sor(
      &vector,
      &mut coeffs,
      params.relaxation,
      params.tolerance,
      params.max_iters,
    );
    if !report.converged {
      tracing::warn!(
        "spline relaxation stopped after {} iterations with residual {:e}",
        report.iterations,
        report.residual
      );
    }

    Ok(Self {
      params,
      elements,
      coeffs,
      samples,
      integrator,
      report,
    })
  }

  pub fn params(&self) -> &SplineParams {
    &self.params
  }
  pub fn elements(&self) -> &[Interval] {
    &self.elements
  }
  pub fn coeffs(&self) -> &na::DVector<f64> {
    &self.coeffs
  }
  /// Samples sorted by argument.
  pub fn samples(&self) -> &[Point] {
    &self.samples
  }
  pub fn report(&self) -> &RelaxationReport {
    &self.report
  }
  pub fn domain(&self) -> Interval {
    Interval::new(
      self.elements[0].left(),
      self.elements[self.elements.len() - 1].right(),
    )
  }

  fn locate(&self, x: f64) -> Result<usize> {
    self
      .elements
      .iter()
      .position(|e| e.contains(x))
      .ok_or_else(|| {
        let domain = self.domain();
        Error::invariant(format!(
          "{x} lies outside the spline domain [{}, {}]",
          domain.left(),
          domain.right()
        ))
      })
  }

  fn combine<F>(&self, x: f64, eval: F) -> Result<f64>
  where
    F: Fn(usize, f64, f64) -> f64,
  {
    let ielem = self.locate(x)?;
    let element = &self.elements[ielem];
    let xi = element.to_local(x);
    let h = element.length();
    Ok(
      (0..HermiteBasis.size())
        .map(|i| self.coeffs[2 * ielem + i] * eval(i, xi, h))
        .sum(),
    )
  }

  pub fn value_at(&self, x: f64) -> Result<f64> {
    self.combine(x, |i, xi, h| HermiteBasis.psi(i, xi, h))
  }

  pub fn derivative_at(&self, x: f64) -> Result<f64> {
    self.combine(x, |i, xi, h| HermiteBasis.dpsi(i, xi, h))
  }

  pub fn second_derivative_at(&self, x: f64) -> Result<f64> {
    self.combine(x, |i, xi, h| HermiteBasis.ddpsi(i, xi, h))
  }

  /// $integral s''^2$ over the domain.
  pub fn roughness(&self) -> f64 {
    self
      .elements
      .iter()
      .enumerate()
      .map(|(ielem, element)| {
        self.integrator.integrate_1d(
          |xi, h| {
            let dd: f64 = (0..HermiteBasis.size())
              .map(|i| self.coeffs[2 * ielem + i] * HermiteBasis.ddpsi(i, xi, h))
              .sum();
            dd * dd
          },
          element,
        )
      })
      .sum()
  }

  /// Evaluates the spline from the left end of every element in steps of `step`,
  /// finishing with the right end of the domain.
  pub fn sample(&self, step: f64) -> Result<Vec<Point>> {
    if !(step > 0.0) {
      return Err(Error::configuration("sampling step must be positive"));
    }
    let mut points = Vec::new();
    for element in &self.elements {
      let mut x = element.left();
      while x < element.right() {
        points.push(Point::new(x, self.value_at(x)?));
        x += step;
      }
    }
    let right = self.domain().right();
    points.push(Point::new(right, self.value_at(right)?));
    Ok(points)
  }
}

/// Equidistant partition of `[min, max]`; the last element ends exactly at `max`.
fn partition(min: f64, max: f64, npartitions: usize) -> Result<Vec<Interval>> {
  if !(min < max) {
    return Err(Error::configuration(
      "spline samples must span a nondegenerate range",
    ));
  }
  let step = (max - min) / npartitions as f64;
  let elements = (0..npartitions)
    .map(|i| {
      let left = min + i as f64 * step;
      let right = if i + 1 == npartitions {
        max
      } else {
        min + (i + 1) as f64 * step
      };
      Interval::new(left, right)
    })
    .collect();
  Ok(elements)
}
