//! Linear magnetostatics on small structured meshes.

extern crate nalgebra as na;

use magnetostatics::{
  assemble::MatrixAssembler,
  basis::BilinearBasis,
  boundary::{BoundaryFlags, BoundaryHandler, DirichletBoundary, DirichletMethod},
  fem::SolverFem,
  geometry::Point,
  mesh::{Area, LinearMeshBuilder, Mesh, MeshParameters},
  quadrature::Integrator,
  solver::{LinearSolver, SolverMethod},
};

use approx::assert_relative_eq;
use std::rc::Rc;

fn unit_square(n: usize, current: f64) -> Rc<Mesh> {
  let params = MeshParameters::uniform([0.0, 1.0], [0.0, 1.0], [n, n], (1.0, current)).unwrap();
  Rc::new(Mesh::new(&params, &LinearMeshBuilder).unwrap())
}

fn linear_fem(
  mesh: &Rc<Mesh>,
  solver: LinearSolver,
  boundaries: Vec<DirichletBoundary>,
  dirichlet: DirichletMethod,
) -> SolverFem<BilinearBasis> {
  SolverFem::builder()
    .mesh(Rc::clone(mesh))
    .solver(solver)
    .assembler(MatrixAssembler::new(
      BilinearBasis,
      Integrator::default(),
      Rc::clone(mesh),
    ))
    .boundaries(boundaries)
    .dirichlet_method(dirichlet)
    .build()
    .unwrap()
}

/// Dirichlet data of the harmonic field $x + y$ on all borders.
fn harmonic_boundaries(mesh: &Mesh) -> Vec<DirichletBoundary> {
  BoundaryHandler::new(BoundaryFlags::all())
    .boundary_nodes(mesh)
    .into_iter()
    .map(|node| {
      let p = mesh.points()[node];
      DirichletBoundary::new(node, p.x + p.y)
    })
    .collect()
}

#[test]
fn cg_and_iccg_reproduce_linear_field() {
  let mesh = unit_square(2, 0.0);
  let exact = |p: &Point| p.x + p.y;

  let mut solutions = Vec::new();
  for method in [
    SolverMethod::ConjugateGradient,
    SolverMethod::CholeskyConjugateGradient,
  ] {
    let mut fem = linear_fem(
      &mesh,
      LinearSolver::new(method, 1000, 1e-13),
      harmonic_boundaries(&mesh),
      DirichletMethod::Elimination,
    );
    fem.compute().unwrap();
    for (p, &value) in mesh.points().iter().zip(fem.solution().unwrap().iter()) {
      assert_relative_eq!(value, exact(p), epsilon = 1e-10);
    }
    assert!(fem.nodal_rms_error(exact).unwrap() < 1e-10);
    solutions.push(fem.solution().unwrap().clone());
  }
  assert_relative_eq!(solutions[0], solutions[1], epsilon = 1e-10);
}

#[test]
fn penalty_rejects_nonzero_boundary_values() {
  let mesh = unit_square(2, 0.0);
  let err = SolverFem::builder()
    .mesh(Rc::clone(&mesh))
    .solver(LinearSolver::new(SolverMethod::ConjugateGradient, 1000, 1e-13))
    .assembler(MatrixAssembler::new(
      BilinearBasis,
      Integrator::default(),
      Rc::clone(&mesh),
    ))
    .boundaries(harmonic_boundaries(&mesh))
    .dirichlet_method(DirichletMethod::Penalty)
    .build()
    .err()
    .unwrap();
  assert!(err.is_configuration());

  // the same data is accepted and solved by elimination
  let mut fem = linear_fem(
    &mesh,
    LinearSolver::new(SolverMethod::ConjugateGradient, 1000, 1e-13),
    harmonic_boundaries(&mesh),
    DirichletMethod::Elimination,
  );
  assert!(fem.compute().unwrap().is_converged());
  assert_relative_eq!(fem.field_at(&Point::new(0.5, 0.5)).unwrap(), 1.0, epsilon = 1e-10);
}

#[test]
fn homogeneous_problem_has_zero_solution() {
  let mesh = unit_square(2, 0.0);
  let boundaries = BoundaryHandler::new(BoundaryFlags::all()).create_boundaries(&mesh);
  let mut fem = linear_fem(
    &mesh,
    LinearSolver::new(SolverMethod::CholeskyConjugateGradient, 1000, 1e-15),
    boundaries,
    DirichletMethod::Penalty,
  );
  let convergence = fem.compute().unwrap();
  assert!(convergence.is_converged());
  assert_eq!(convergence.iterations(), 0);
  assert!(fem.solution().unwrap().iter().all(|&v| v == 0.0));
  assert_eq!(fem.field_at(&Point::new(0.3, 0.6)).unwrap(), 0.0);
  assert_eq!(fem.flux_density_at(&Point::new(0.3, 0.6)).unwrap(), 0.0);
}

#[test]
fn field_interpolates_nodal_values() {
  let mesh = unit_square(4, 0.0);
  let mut fem = linear_fem(
    &mesh,
    LinearSolver::new(SolverMethod::DirectCholesky, 1, 0.0),
    harmonic_boundaries(&mesh),
    DirichletMethod::Elimination,
  );
  fem.compute().unwrap();

  for p in [Point::new(0.1, 0.9), Point::new(0.5, 0.5), Point::new(0.77, 0.23)] {
    assert_relative_eq!(fem.field_at(&p).unwrap(), p.x + p.y, epsilon = 1e-10);
    // |grad (x + y)| = sqrt(2)
    assert_relative_eq!(
      fem.flux_density_at(&p).unwrap(),
      2f64.sqrt(),
      epsilon = 1e-8
    );
  }
}

#[test]
fn iterative_solvers_match_direct_on_graded_coil_problem() {
  // coil in the lower left corner of an air box, graded towards the coil border
  let params = MeshParameters::new(
    vec![0.0, 0.02, 0.05],
    vec![0.0, 0.01, 0.05],
    vec![4, 6],
    vec![3, 5],
    vec![1.0, 1.3],
    vec![-1.2, 1.4],
    (1, 0),
    vec![
      Area::new(0, 1.0, 0.0, [0, 2], [0, 2]),
      Area::new(1, 1.0, 1e6, [0, 1], [0, 1]),
    ],
  )
  .unwrap();
  let mesh = Rc::new(Mesh::new(&params, &LinearMeshBuilder).unwrap());
  let flags = BoundaryFlags {
    top: true,
    right: true,
    ..Default::default()
  };
  let boundaries = BoundaryHandler::new(flags).create_boundaries(&mesh);

  let mut solutions = Vec::new();
  for method in [
    SolverMethod::DirectCholesky,
    SolverMethod::CholeskyConjugateGradient,
  ] {
    let mut fem = linear_fem(
      &mesh,
      LinearSolver::new(method, 10_000, 1e-12),
      boundaries.clone(),
      DirichletMethod::Penalty,
    );
    assert!(fem.compute().unwrap().is_converged());
    solutions.push(fem.solution().unwrap().clone());
  }

  let scale = solutions[0].amax();
  assert!(scale > 0.0);
  assert_relative_eq!(solutions[0], solutions[1], epsilon = 1e-6 * scale);
}
