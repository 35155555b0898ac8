/// Symmetric band matrix.
///
/// `bands[k][i]` holds the entry $(i, i+k)$, so band `k` has `n-k` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricBandMatrix {
  bands: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationReport {
  pub iterations: usize,
  pub residual: f64,
  pub converged: bool,
}

impl SymmetricBandMatrix {
  /// Zero matrix of size `n` with `bandwidth` off-diagonals on each side.
  pub fn zeros(n: usize, bandwidth: usize) -> Self {
    let bands = (0..=bandwidth)
      .map(|k| vec![0.0; n.saturating_sub(k)])
      .collect();
    Self { bands }
  }

  pub fn size(&self) -> usize {
    self.bands[0].len()
  }
  pub fn bandwidth(&self) -> usize {
    self.bands.len() - 1
  }

  pub fn get(&self, i: usize, j: usize) -> f64 {
    let (i, j) = if i <= j { (i, j) } else { (j, i) };
    self.bands.get(j - i).map_or(0.0, |band| band[i])
  }

  /// Adds to $(i, j)$ and, by symmetry, $(j, i)$.
  pub fn add(&mut self, i: usize, j: usize, value: f64) {
    let (i, j) = if i <= j { (i, j) } else { (j, i) };
    let k = j - i;
    assert!(
      k <= self.bandwidth(),
      "entry ({i},{j}) lies outside the band"
    );
    self.bands[k][i] += value;
  }

  fn row_dot(&self, i: usize, x: &na::DVector<f64>, skip_diag: bool) -> f64 {
    let n = self.size();
    let mut sum = if skip_diag { 0.0 } else { self.bands[0][i] * x[i] };
    for k in 1..=self.bandwidth() {
      if i >= k {
        sum += self.bands[k][i - k] * x[i - k];
      }
      if i + k < n {
        sum += self.bands[k][i] * x[i + k];
      }
    }
    sum
  }

  pub fn mul_vec(&self, x: &na::DVector<f64>) -> na::DVector<f64> {
    na::DVector::from_fn(self.size(), |i, _| self.row_dot(i, x, false))
  }

  /// Successive over-relaxation, improving `x` in place.
  pub fn sor(
    &self,
    b: &na::DVector<f64>,
    x: &mut na::DVector<f64>,
    relaxation: f64,
    tolerance: f64,
    max_iters: usize,
  ) -> RelaxationReport {
    let bnorm = b.norm();
    if bnorm == 0.0 {
      x.fill(0.0);
      return RelaxationReport {
        iterations: 0,
        residual: 0.0,
        converged: true,
      };
    }

    let mut residual = (b - self.mul_vec(x)).norm() / bnorm;
    let mut iterations = 0;
    while iterations < max_iters && residual >= tolerance {
      for i in 0..self.size() {
        let offdiag = self.row_dot(i, x, true);
        x[i] += relaxation * ((b[i] - offdiag) / self.bands[0][i] - x[i]);
      }
      iterations += 1;
      residual = (b - self.mul_vec(x)).norm() / bnorm;
    }

    RelaxationReport {
      iterations,
      residual,
      converged: residual < tolerance,
    }
  }

  pub fn to_dense(&self) -> na::DMatrix<f64> {
    let n = self.size();
    na::DMatrix::from_fn(n, n, |i, j| self.get(i, j))
  }
}
