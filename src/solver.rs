//! Linear solvers for the symmetric positive definite Galerkin system.

use crate::{
  error::{Error, Result},
  sparse::SparseMatrix,
};

use faer::solvers::SpSolver;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SolverMethod {
  /// Unpreconditioned conjugate gradient.
  ConjugateGradient,
  /// Conjugate gradient preconditioned by an incomplete Cholesky factorization.
  #[default]
  CholeskyConjugateGradient,
  /// Sparse direct Cholesky factorization.
  DirectCholesky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
  Uninitialized,
  MatrixSet,
  VectorSet,
  Computed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
  Converged,
  IterationLimitReached,
  Diverged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
  pub status: SolveStatus,
  pub iterations: usize,
  /// $norm(b - A x) / norm(b)$
  pub residual: f64,
  pub running_time: Duration,
}

#[derive(Debug, Clone)]
pub struct LinearSolver {
  method: SolverMethod,
  max_iters: usize,
  tolerance: f64,

  state: SolverState,
  matrix: Option<SparseMatrix>,
  vector: Option<na::DVector<f64>>,
  solution: Option<na::DVector<f64>>,
  report: Option<SolveReport>,
}

impl LinearSolver {
  pub fn new(method: SolverMethod, max_iters: usize, tolerance: f64) -> Self {
    Self {
      method,
      max_iters,
      tolerance,
      state: SolverState::Uninitialized,
      matrix: None,
      vector: None,
      solution: None,
      report: None,
    }
  }

  pub fn method(&self) -> SolverMethod {
    self.method
  }
  pub fn max_iters(&self) -> usize {
    self.max_iters
  }
  pub fn tolerance(&self) -> f64 {
    self.tolerance
  }
  pub fn state(&self) -> SolverState {
    self.state
  }

  /// Stores a copy of the system matrix.
  pub fn set_matrix(&mut self, matrix: &SparseMatrix) {
    self.matrix = Some(matrix.clone());
    self.update_state();
  }

  pub fn set_vector(&mut self, vector: na::DVector<f64>) {
    self.vector = Some(vector);
    self.update_state();
  }

  fn update_state(&mut self) {
    self.state = match (&self.matrix, &self.vector) {
      (Some(_), Some(_)) => SolverState::VectorSet,
      (Some(_), None) => SolverState::MatrixSet,
      _ => SolverState::Uninitialized,
    };
  }

  /// Last computed solution.
  pub fn solution(&self) -> Option<&na::DVector<f64>> {
    self.solution.as_ref()
  }
  pub fn report(&self) -> Option<&SolveReport> {
    self.report.as_ref()
  }
  pub fn running_time(&self) -> Option<Duration> {
    self.report.map(|r| r.running_time)
  }

  pub fn compute(&mut self) -> Result<SolveReport> {
    let matrix = self
      .matrix
      .as_ref()
      .ok_or_else(|| Error::invariant("solver matrix is not set"))?;
    let vector = self
      .vector
      .as_ref()
      .ok_or_else(|| Error::invariant("solver vector is not set"))?;
    if matrix.size() != vector.len() {
      return Err(Error::invariant(format!(
        "matrix of size {} and vector of length {} do not match",
        matrix.size(),
        vector.len()
      )));
    }

    let timer = Instant::now();
    let (solution, status, iterations, residual) = if vector.norm() == 0.0 {
      (na::DVector::zeros(vector.len()), SolveStatus::Converged, 0, 0.0)
    } else {
      match self.method {
        SolverMethod::ConjugateGradient => {
          conjugate_gradient(matrix, vector, |r| r.clone(), self.max_iters, self.tolerance)
        }
        SolverMethod::CholeskyConjugateGradient => {
          let factor = IncompleteCholesky::new(matrix)?;
          conjugate_gradient(
            matrix,
            vector,
            |r| factor.solve(r),
            self.max_iters,
            self.tolerance,
          )
        }
        SolverMethod::DirectCholesky => {
          let solution = DirectCholesky::new(matrix)?.solve(vector);
          let residual = (vector - matrix.mul_vec(&solution)).norm() / vector.norm();
          (solution, SolveStatus::Converged, 1, residual)
        }
      }
    };
    let report = SolveReport {
      status,
      iterations,
      residual,
      running_time: timer.elapsed(),
    };

    tracing::debug!(
      method = ?self.method,
      iterations,
      residual,
      elapsed = ?report.running_time,
      "linear solve finished"
    );
    match status {
      SolveStatus::Converged => {}
      SolveStatus::IterationLimitReached => tracing::warn!(
        "linear solver reached iteration limit {} with residual {residual:e}",
        self.max_iters
      ),
      SolveStatus::Diverged => tracing::warn!("linear solver diverged after {iterations} iterations"),
    }

    self.solution = Some(solution);
    self.report = Some(report);
    self.state = SolverState::Computed;
    Ok(report)
  }
}

/// Preconditioned conjugate gradient starting from zero.
///
/// `precondition` applies the inverse of the preconditioner.
fn conjugate_gradient<P>(
  matrix: &SparseMatrix,
  b: &na::DVector<f64>,
  precondition: P,
  max_iters: usize,
  tolerance: f64,
) -> (na::DVector<f64>, SolveStatus, usize, f64)
where
  P: Fn(&na::DVector<f64>) -> na::DVector<f64>,
{
  let bnorm = b.norm();
  let mut x = na::DVector::zeros(b.len());
  let mut r = b.clone();
  let mut z = precondition(&r);
  let mut p = z.clone();
  let mut rz = r.dot(&z);
  let mut residual = 1.0;

  for iter in 0..max_iters {
    let ap = matrix.mul_vec(&p);
    let alpha = rz / ap.dot(&p);
    x.axpy(alpha, &p, 1.0);
    r.axpy(-alpha, &ap, 1.0);

    residual = r.norm() / bnorm;
    if !residual.is_finite() {
      return (x, SolveStatus::Diverged, iter + 1, residual);
    }
    if residual < tolerance {
      return (x, SolveStatus::Converged, iter + 1, residual);
    }

    z = precondition(&r);
    let rz_new = r.dot(&z);
    let beta = rz_new / rz;
    rz = rz_new;
    p = &z + beta * &p;
  }

  (x, SolveStatus::IterationLimitReached, max_iters, residual)
}

/// Incomplete Cholesky factor $L$ with the sparsity of the lower triangle, $A approx L L^T$.
#[derive(Debug, Clone)]
pub struct IncompleteCholesky {
  diag: Vec<f64>,
  row_ptrs: Vec<usize>,
  col_indices: Vec<usize>,
  values: Vec<f64>,
}

impl IncompleteCholesky {
  pub fn new(matrix: &SparseMatrix) -> Result<Self> {
    let mut diag = matrix.diag().to_vec();
    let mut values = matrix.values().to_vec();
    let row_ptrs = matrix.row_ptrs();
    let cols = matrix.col_indices();

    for i in 0..matrix.size() {
      let mut sum_diag = 0.0;
      for k in row_ptrs[i]..row_ptrs[i + 1] {
        let j = cols[k];

        // merge intersection of row i (before k) and row j
        let mut sum = 0.0;
        let (mut ik, mut jk) = (row_ptrs[i], row_ptrs[j]);
        while ik < k && jk < row_ptrs[j + 1] {
          match cols[ik].cmp(&cols[jk]) {
            std::cmp::Ordering::Equal => {
              sum += values[ik] * values[jk];
              ik += 1;
              jk += 1;
            }
            std::cmp::Ordering::Less => ik += 1,
            std::cmp::Ordering::Greater => jk += 1,
          }
        }

        values[k] = (values[k] - sum) / diag[j];
        sum_diag += values[k] * values[k];
      }

      let pivot = diag[i] - sum_diag;
      if pivot <= 0.0 || !pivot.is_finite() {
        return Err(Error::Numerical(format!(
          "incomplete Cholesky breakdown at row {i} with pivot {pivot:e}"
        )));
      }
      diag[i] = pivot.sqrt();
    }

    Ok(Self {
      diag,
      row_ptrs: row_ptrs.to_vec(),
      col_indices: cols.to_vec(),
      values,
    })
  }

  /// Solves $L L^T x = b$ by forward and backward substitution.
  pub fn solve(&self, b: &na::DVector<f64>) -> na::DVector<f64> {
    let n = self.diag.len();

    let mut y = b.clone();
    for i in 0..n {
      let mut sum = 0.0;
      for k in self.row_ptrs[i]..self.row_ptrs[i + 1] {
        sum += self.values[k] * y[self.col_indices[k]];
      }
      y[i] = (y[i] - sum) / self.diag[i];
    }

    let mut x = na::DVector::zeros(n);
    for i in (0..n).rev() {
      x[i] = y[i] / self.diag[i];
      for k in self.row_ptrs[i]..self.row_ptrs[i + 1] {
        y[self.col_indices[k]] -= self.values[k] * x[i];
      }
    }
    x
  }
}

/// Sparse direct Cholesky factorization.
pub struct DirectCholesky {
  raw: faer::sparse::linalg::solvers::Cholesky<usize, f64>,
}
impl DirectCholesky {
  pub fn new(matrix: &SparseMatrix) -> Result<Self> {
    let raw = matrix
      .to_faer_csc()?
      .sp_cholesky(faer::Side::Upper)
      .map_err(|e| Error::Numerical(format!("sparse Cholesky failed: {e:?}")))?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &na::DVector<f64>) -> na::DVector<f64> {
    let b = faer::col::from_slice(b.as_slice());
    na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec())
  }
}
