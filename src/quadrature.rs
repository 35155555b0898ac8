use crate::geometry::{Interval, Point, Rectangle};

/// A quadrature rule defined on the reference segment `[-1,1]`.
#[derive(Debug, Clone)]
pub struct QuadRule {
  nodes: Vec<f64>,
  weights: Vec<f64>,
}
impl QuadRule {
  pub fn new(nodes: Vec<f64>, weights: Vec<f64>) -> Self {
    assert_eq!(nodes.len(), weights.len());
    Self { nodes, weights }
  }

  /// Three point Gauss-Legendre rule, exact up to polynomial degree 5.
  pub fn gauss_order5() -> Self {
    let x = (3.0f64 / 5.0).sqrt();
    Self::new(vec![-x, 0.0, x], vec![5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0])
  }

  pub fn npoints(&self) -> usize {
    self.nodes.len()
  }
  pub fn nodes(&self) -> &[f64] {
    &self.nodes
  }
  pub fn weights(&self) -> &[f64] {
    &self.weights
  }

  pub fn apply_ref<F>(&self, f: F) -> f64
  where
    F: Fn(f64) -> f64,
  {
    self
      .nodes
      .iter()
      .zip(self.weights.iter())
      .map(|(&n, &w)| w * f(n))
      .sum()
  }
}

impl Default for QuadRule {
  fn default() -> Self {
    Self::gauss_order5()
  }
}

/// Tensor product integration over rectangles and mapped integration over intervals.
#[derive(Debug, Clone, Default)]
pub struct Integrator {
  rule: QuadRule,
}
impl Integrator {
  pub fn new(rule: QuadRule) -> Self {
    Self { rule }
  }

  pub fn rule(&self) -> &QuadRule {
    &self.rule
  }

  /// Integrates `f` over an axis-aligned rectangle. `f` receives physical points.
  pub fn integrate_2d<F>(&self, f: F, rect: &Rectangle) -> f64
  where
    F: Fn(&Point) -> f64,
  {
    let hx = rect.width();
    let hy = rect.height();
    let lb = rect.left_bottom();
    let rt = rect.right_top();

    let mut sum = 0.0;
    for (&qi, &wi) in self.rule.nodes.iter().zip(&self.rule.weights) {
      let x = (qi * hx + lb.x + rt.x) / 2.0;
      for (&qj, &wj) in self.rule.nodes.iter().zip(&self.rule.weights) {
        let y = (qj * hy + lb.y + rt.y) / 2.0;
        sum += wi * wj * f(&Point::new(x, y));
      }
    }
    sum * hx * hy / 4.0
  }

  /// Integrates over a physical interval.
  ///
  /// `f` receives the local coordinate in `[0,1]` and the interval length.
  pub fn integrate_1d<F>(&self, f: F, interval: &Interval) -> f64
  where
    F: Fn(f64, f64) -> f64,
  {
    let h = interval.length();
    self.rule.apply_ref(|q| f((q + 1.0) / 2.0, h)) * h / 2.0
  }
}
