//! Nonlinear magnetostatic solver.
//!
//! Picard iteration on the vector potential: every pass samples the
//! permeability of nonlinear areas from the flux density of the previous
//! iterate, reassembles, and corrects the running solution by solving for
//! the residual.

use crate::{
  assemble::MatrixAssembler,
  basis::Basis2d,
  boundary::{DirichletBoundary, DirichletMethod},
  dependence::Dependence,
  error::{Error, Result},
  geometry::Point,
  mesh::{AreaNumber, ElementIdx, Mesh},
  solver::{LinearSolver, SolveStatus},
  sparse::SparseMatrix,
  spline::Spline,
  VACUUM_PERMEABILITY,
};

use std::rc::Rc;

/// Material curve and stopping criteria of the Picard iteration.
#[derive(Debug, Clone)]
pub struct NonlinearSettings {
  pub dependence: Dependence,
  pub spline: Spline,
  /// Areas whose permeability follows the material curve.
  pub areas: Vec<AreaNumber>,
  /// Relative residual $norm(F - K A) / norm(F)$ to stop at.
  pub tolerance: f64,
  pub max_iters: usize,
}
impl NonlinearSettings {
  pub fn new(dependence: Dependence, spline: Spline, areas: Vec<AreaNumber>) -> Self {
    Self {
      dependence,
      spline,
      areas,
      tolerance: 1e-7,
      max_iters: 100,
    }
  }
  pub fn with_tolerance(mut self, tolerance: f64) -> Self {
    self.tolerance = tolerance;
    self
  }
  pub fn with_max_iters(mut self, max_iters: usize) -> Self {
    self.max_iters = max_iters;
    self
  }
}

/// Outcome of [`SolverFem::compute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Convergence {
  Converged { iterations: usize, residual: f64 },
  IterationLimitReached { iterations: usize, residual: f64 },
  Diverged { iterations: usize, residual: f64 },
}
impl Convergence {
  pub fn is_converged(&self) -> bool {
    matches!(self, Self::Converged { .. })
  }
  pub fn iterations(&self) -> usize {
    match *self {
      Self::Converged { iterations, .. }
      | Self::IterationLimitReached { iterations, .. }
      | Self::Diverged { iterations, .. } => iterations,
    }
  }
  pub fn residual(&self) -> f64 {
    match *self {
      Self::Converged { residual, .. }
      | Self::IterationLimitReached { residual, .. }
      | Self::Diverged { residual, .. } => residual,
    }
  }
}

/// Dense copies of the global matrix of the last assembly.
#[derive(Debug, Clone)]
pub struct Snapshots {
  pub before_boundaries: na::DMatrix<f64>,
  pub after_boundaries: na::DMatrix<f64>,
}

pub struct SolverFem<B: Basis2d> {
  mesh: Rc<Mesh>,
  solver: LinearSolver,
  assembler: MatrixAssembler<B>,
  boundaries: Vec<DirichletBoundary>,
  nonlinear: Option<NonlinearSettings>,
  dirichlet: DirichletMethod,
  capture_snapshots: bool,

  matrix: SparseMatrix,
  vector: na::DVector<f64>,
  permeabilities: Vec<f64>,
  solution: Option<na::DVector<f64>>,
  convergence: Option<Convergence>,
  snapshots: Option<Snapshots>,
}

impl<B: Basis2d> SolverFem<B> {
  pub fn builder() -> SolverFemBuilder<B> {
    SolverFemBuilder::default()
  }

  pub fn mesh(&self) -> &Rc<Mesh> {
    &self.mesh
  }
  pub fn boundaries(&self) -> &[DirichletBoundary] {
    &self.boundaries
  }
  pub fn linear_solver(&self) -> &LinearSolver {
    &self.solver
  }
  pub fn convergence(&self) -> Option<Convergence> {
    self.convergence
  }
  /// Absolute permeability per element used in the last assembly.
  pub fn permeabilities(&self) -> &[f64] {
    &self.permeabilities
  }
  pub fn snapshots(&self) -> Option<&Snapshots> {
    self.snapshots.as_ref()
  }

  pub fn solution(&self) -> Result<&na::DVector<f64>> {
    self
      .solution
      .as_ref()
      .ok_or_else(|| Error::invariant("no solution available before compute"))
  }

  /// Runs the Picard iteration, or a single linear solve without nonlinear settings.
  /// In the linear case the reported iterations are those of the linear solver.
  pub fn compute(&mut self) -> Result<Convergence> {
    let convergence = match self.nonlinear.take() {
      None => self.compute_linear(),
      Some(settings) => {
        let result = self.compute_nonlinear(&settings);
        self.nonlinear = Some(settings);
        result
      }
    }?;
    self.convergence = Some(convergence);
    Ok(convergence)
  }

  fn compute_linear(&mut self) -> Result<Convergence> {
    let mesh = Rc::clone(&self.mesh);
    self.permeabilities = (0..mesh.nelements())
      .map(|ielem| mesh.element_area(ielem).permeability())
      .collect();
    self.assemble_system();

    self.solver.set_matrix(&self.matrix);
    self.solver.set_vector(self.vector.clone());
    let report = self.solver.compute()?;
    self.solution = self.solver.solution().cloned();

    let (iterations, residual) = (report.iterations, report.residual);
    Ok(match report.status {
      SolveStatus::Converged => Convergence::Converged {
        iterations,
        residual,
      },
      SolveStatus::IterationLimitReached => Convergence::IterationLimitReached {
        iterations,
        residual,
      },
      SolveStatus::Diverged => Convergence::Diverged {
        iterations,
        residual,
      },
    })
  }

  fn compute_nonlinear(&mut self, settings: &NonlinearSettings) -> Result<Convergence> {
    let n = self.mesh.npoints();
    let mut constrained = vec![false; n];
    for boundary in &self.boundaries {
      constrained[boundary.node] = true;
    }

    let mut total = na::DVector::zeros(n);
    let mut residual = f64::INFINITY;
    for pass in 0..settings.max_iters {
      self.permeabilities = self.element_permeabilities(&total, settings)?;
      self.assemble_system();

      let defect = &self.vector - self.matrix.mul_vec(&total);
      let (mut defect_norm, mut load_norm) = (0.0, 0.0);
      for i in 0..n {
        if !constrained[i] {
          defect_norm += defect[i] * defect[i];
          load_norm += self.vector[i] * self.vector[i];
        }
      }
      residual = if load_norm > 0.0 {
        (defect_norm / load_norm).sqrt()
      } else {
        defect_norm.sqrt()
      };
      tracing::info!(pass, residual, "nonlinear pass");

      if !residual.is_finite() {
        tracing::warn!("nonlinear iteration diverged at pass {pass}");
        self.solution = Some(total);
        return Ok(Convergence::Diverged {
          iterations: pass,
          residual,
        });
      }
      // at least one solve, so that nonzero boundary values are picked up
      if pass > 0 && residual < settings.tolerance {
        self.solution = Some(total);
        return Ok(Convergence::Converged {
          iterations: pass,
          residual,
        });
      }

      self.solver.set_matrix(&self.matrix);
      self.solver.set_vector(defect);
      let report = self.solver.compute()?;
      if report.status != SolveStatus::Converged {
        tracing::warn!(
          "linear solve in pass {pass} ended with {:?}",
          report.status
        );
      }
      if let Some(increment) = self.solver.solution() {
        total += increment;
      }
    }

    tracing::warn!(
      "nonlinear iteration reached limit {} with residual {residual:e}",
      settings.max_iters
    );
    self.solution = Some(total);
    Ok(Convergence::IterationLimitReached {
      iterations: settings.max_iters,
      residual,
    })
  }

  /// Absolute permeability per element for the potential `potential`.
  fn element_permeabilities(
    &self,
    potential: &na::DVector<f64>,
    settings: &NonlinearSettings,
  ) -> Result<Vec<f64>> {
    (0..self.mesh.nelements())
      .map(|ielem| {
        let area = self.mesh.element_area(ielem);
        if settings.areas.contains(&area.number()) {
          let b = self.element_flux_density(ielem, potential);
          settings.dependence.permeability(&settings.spline, b)
        } else {
          Ok(area.permeability())
        }
      })
      .collect()
  }

  /// Clears and refills the global system for the current permeabilities and imposes the constraints.
  fn assemble_system(&mut self) {
    let permeabilities = &self.permeabilities;
    self
      .assembler
      .assemble_with(&mut self.matrix, &mut self.vector, |ielem| {
        permeabilities[ielem]
      });
    let before_boundaries = self
      .capture_snapshots
      .then(|| self.matrix.to_nalgebra_dense());
    self
      .dirichlet
      .apply(&self.boundaries, &mut self.matrix, &mut self.vector);
    if let Some(before_boundaries) = before_boundaries {
      self.snapshots = Some(Snapshots {
        before_boundaries,
        after_boundaries: self.matrix.to_nalgebra_dense(),
      });
    }
  }

  /// $|B|$ averaged over an element: $sqrt(mu_0 q^T K(mu_0) q / |K|)$.
  fn element_flux_density(&self, ielem: ElementIdx, potential: &na::DVector<f64>) -> f64 {
    let nodes = self.mesh.elements()[ielem].nodes();
    let q = na::DVector::from_iterator(nodes.len(), nodes.iter().map(|&i| potential[i]));
    let elmat = self.assembler.local_stiffness(ielem, VACUUM_PERMEABILITY);
    let energy = q.dot(&(elmat * &q)) * VACUUM_PERMEABILITY;
    let area = self.mesh.element_rect(ielem).area();
    (energy / area).max(0.0).sqrt()
  }

  fn locate(&self, p: &Point) -> Result<ElementIdx> {
    self.mesh.locate(p).ok_or_else(|| {
      Error::invariant(format!("point ({}, {}) lies outside the mesh", p.x, p.y))
    })
  }

  /// Vector potential at `p`.
  pub fn field_at(&self, p: &Point) -> Result<f64> {
    let solution = self.solution()?;
    let ielem = self.locate(p)?;
    let rect = self.mesh.element_rect(ielem);
    let lb = rect.left_bottom();
    let reference = Point::new((p.x - lb.x) / rect.width(), (p.y - lb.y) / rect.height());
    let basis = self.assembler.basis();
    Ok(
      self.mesh.elements()[ielem]
        .nodes()
        .iter()
        .enumerate()
        .map(|(ilocal, &iglobal)| solution[iglobal] * basis.psi(ilocal, &reference))
        .sum(),
    )
  }

  /// Magnitude of the flux density in the element containing `p`.
  pub fn flux_density_at(&self, p: &Point) -> Result<f64> {
    let solution = self.solution()?;
    let ielem = self.locate(p)?;
    Ok(self.element_flux_density(ielem, solution))
  }

  /// Root mean square of the nodal errors against `exact`.
  pub fn nodal_rms_error<F>(&self, exact: F) -> Result<f64>
  where
    F: Fn(&Point) -> f64,
  {
    let solution = self.solution()?;
    let sum: f64 = self
      .mesh
      .points()
      .iter()
      .zip(solution.iter())
      .map(|(p, &value)| (value - exact(p)).powi(2))
      .sum();
    Ok((sum / self.mesh.npoints() as f64).sqrt())
  }
}

/// Builder of [`SolverFem`]; mesh, solver, assembler and boundaries are required.
pub struct SolverFemBuilder<B: Basis2d> {
  mesh: Option<Rc<Mesh>>,
  solver: Option<LinearSolver>,
  assembler: Option<MatrixAssembler<B>>,
  boundaries: Option<Vec<DirichletBoundary>>,
  nonlinear: Option<NonlinearSettings>,
  dirichlet: DirichletMethod,
  capture_snapshots: bool,
}

impl<B: Basis2d> Default for SolverFemBuilder<B> {
  fn default() -> Self {
    Self {
      mesh: None,
      solver: None,
      assembler: None,
      boundaries: None,
      nonlinear: None,
      dirichlet: DirichletMethod::default(),
      capture_snapshots: false,
    }
  }
}

impl<B: Basis2d> SolverFemBuilder<B> {
  pub fn mesh(mut self, mesh: Rc<Mesh>) -> Self {
    self.mesh = Some(mesh);
    self
  }
  pub fn solver(mut self, solver: LinearSolver) -> Self {
    self.solver = Some(solver);
    self
  }
  pub fn assembler(mut self, assembler: MatrixAssembler<B>) -> Self {
    self.assembler = Some(assembler);
    self
  }
  pub fn boundaries(mut self, boundaries: Vec<DirichletBoundary>) -> Self {
    self.boundaries = Some(boundaries);
    self
  }
  pub fn nonlinear(mut self, settings: NonlinearSettings) -> Self {
    self.nonlinear = Some(settings);
    self
  }
  pub fn dirichlet_method(mut self, method: DirichletMethod) -> Self {
    self.dirichlet = method;
    self
  }
  pub fn capture_snapshots(mut self, capture: bool) -> Self {
    self.capture_snapshots = capture;
    self
  }

  pub fn build(self) -> Result<SolverFem<B>> {
    let mesh = self.mesh.ok_or_else(|| Error::configuration("mesh is not set"))?;
    let solver = self
      .solver
      .ok_or_else(|| Error::configuration("linear solver is not set"))?;
    let assembler = self
      .assembler
      .ok_or_else(|| Error::configuration("assembler is not set"))?;
    let boundaries = self
      .boundaries
      .ok_or_else(|| Error::configuration("boundaries are not set"))?;

    if !Rc::ptr_eq(&mesh, assembler.mesh()) {
      return Err(Error::configuration(
        "assembler was built for a different mesh",
      ));
    }
    if let Some(boundary) = boundaries.iter().find(|b| b.node >= mesh.npoints()) {
      return Err(Error::configuration(format!(
        "boundary node {} does not exist",
        boundary.node
      )));
    }
    if self.dirichlet == DirichletMethod::Penalty {
      if let Some(boundary) = boundaries.iter().find(|b| b.value != 0.0) {
        return Err(Error::configuration(format!(
          "penalty constraints must be homogeneous, node {} has value {}; use elimination",
          boundary.node, boundary.value
        )));
      }
    }
    if let Some(settings) = &self.nonlinear {
      if let Some(number) = settings
        .areas
        .iter()
        .find(|number| !mesh.areas().contains_key(*number))
      {
        return Err(Error::configuration(format!(
          "nonlinear area {number} does not exist"
        )));
      }
    }

    let matrix = SparseMatrix::from_mesh(&mesh);
    let vector = na::DVector::zeros(mesh.npoints());
    Ok(SolverFem {
      mesh,
      solver,
      assembler,
      boundaries,
      nonlinear: self.nonlinear,
      dirichlet: self.dirichlet,
      capture_snapshots: self.capture_snapshots,
      matrix,
      vector,
      permeabilities: Vec::new(),
      solution: None,
      convergence: None,
      snapshots: None,
    })
  }
}
