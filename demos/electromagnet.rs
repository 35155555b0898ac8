//! Iron core magnetized by a rectangular coil, solved with the Picard iteration.

use magnetostatics::{
  assemble::MatrixAssembler,
  basis::BilinearBasis,
  boundary::{BoundaryFlags, BoundaryHandler},
  dependence::Dependence,
  fem::{NonlinearSettings, SolverFem},
  geometry::Point,
  io,
  mesh::{Area, LinearMeshBuilder, Mesh, MeshParameters},
  quadrature::Integrator,
  solver::{LinearSolver, SolverMethod},
  spline::SplineParams,
};

use std::{fs::File, io::BufWriter, rc::Rc};

const CORE: usize = 1;

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt::init();

  // air box [-0.1,0.1]x[0,0.1], core in the middle, coil to its right
  let params = MeshParameters::new(
    vec![-0.1, -0.02, 0.0, 0.02, 0.04, 0.1],
    vec![0.0, 0.03, 0.1],
    vec![8, 4, 4, 4, 8],
    vec![6, 8],
    vec![-1.2, 1.0, 1.0, 1.0, 1.2],
    vec![1.0, 1.2],
    (1, 1),
    vec![
      Area::new(0, 1.0, 0.0, [0, 5], [0, 2]),
      Area::new(CORE, 1000.0, 0.0, [1, 3], [0, 1]),
      Area::new(2, 1.0, 2e6, [3, 4], [0, 1]),
    ],
  )?;
  let mesh = Rc::new(Mesh::new(&params, &LinearMeshBuilder)?);

  // relative permeability of electrical steel over flux density
  let curve = Dependence::permeability_curve(vec![
    (0.0, 1000.0),
    (0.2, 2500.0),
    (0.5, 4000.0),
    (0.8, 3500.0),
    (1.1, 2400.0),
    (1.4, 1200.0),
    (1.7, 300.0),
    (2.0, 60.0),
  ])?;
  let spline = curve.fit_spline(SplineParams {
    partitions: 4,
    beta: 1e-4,
    max_iters: 100_000,
    tolerance: 1e-12,
    ..Default::default()
  })?;

  let boundaries = BoundaryHandler::new(BoundaryFlags {
    left: true,
    right: true,
    top: true,
    bottom: false,
  })
  .create_boundaries(&mesh);

  let mut fem = SolverFem::builder()
    .mesh(Rc::clone(&mesh))
    .solver(LinearSolver::new(
      SolverMethod::CholeskyConjugateGradient,
      1000,
      1e-15,
    ))
    .assembler(MatrixAssembler::new(
      BilinearBasis,
      Integrator::default(),
      Rc::clone(&mesh),
    ))
    .boundaries(boundaries)
    .nonlinear(NonlinearSettings::new(curve, spline, vec![CORE]).with_tolerance(1e-6))
    .build()?;

  let convergence = fem.compute()?;
  println!("{convergence:?}");
  for p in [Point::new(0.0, 0.01), Point::new(0.03, 0.01), Point::new(0.07, 0.05)] {
    println!(
      "A({:.3}, {:.3}) = {:e}, |B| = {:.4} T",
      p.x,
      p.y,
      fem.field_at(&p)?,
      fem.flux_density_at(&p)?
    );
  }

  std::fs::create_dir_all("out")?;
  io::write_mesh_points(&mut BufWriter::new(File::create("out/points")?), &mesh)?;
  io::write_mesh_elements(&mut BufWriter::new(File::create("out/elements")?), &mesh)?;
  io::write_solution(
    &mut BufWriter::new(File::create("out/solution")?),
    fem.solution()?,
  )?;

  Ok(())
}
