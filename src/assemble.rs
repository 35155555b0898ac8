//! Element matrices and global Galerkin assembly.

use crate::{
  basis::Basis2d,
  geometry::Rectangle,
  mesh::{ElementIdx, Mesh},
  quadrature::Integrator,
  sparse::SparseMatrix,
};

use once_cell::unsync::OnceCell;
use std::rc::Rc;

/// Element matrices on the unit reference square.
#[derive(Debug, Clone)]
pub struct ReferenceMatrices {
  /// $integral (diff psi_i)/(diff xi) (diff psi_j)/(diff xi)$
  pub stiffness_x: na::DMatrix<f64>,
  /// $integral (diff psi_i)/(diff eta) (diff psi_j)/(diff eta)$
  pub stiffness_y: na::DMatrix<f64>,
  /// $integral psi_i psi_j$
  pub mass: na::DMatrix<f64>,
}

impl ReferenceMatrices {
  pub fn compute(basis: &impl Basis2d, integrator: &Integrator) -> Self {
    let n = basis.size();
    let unit = Rectangle::unit();
    let stiffness_x = na::DMatrix::from_fn(n, n, |i, j| {
      integrator.integrate_2d(|p| basis.dpsi(i, 0, p) * basis.dpsi(j, 0, p), &unit)
    });
    let stiffness_y = na::DMatrix::from_fn(n, n, |i, j| {
      integrator.integrate_2d(|p| basis.dpsi(i, 1, p) * basis.dpsi(j, 1, p), &unit)
    });
    let mass = na::DMatrix::from_fn(n, n, |i, j| {
      integrator.integrate_2d(|p| basis.psi(i, p) * basis.psi(j, p), &unit)
    });
    Self {
      stiffness_x,
      stiffness_y,
      mass,
    }
  }
}

/// Assembles the global stiffness matrix and load vector of the
/// vector potential problem $-div(1/mu grad A) = J$.
pub struct MatrixAssembler<B: Basis2d> {
  mesh: Rc<Mesh>,
  basis: B,
  integrator: Integrator,
  reference: OnceCell<ReferenceMatrices>,
}

impl<B: Basis2d> MatrixAssembler<B> {
  pub fn new(basis: B, integrator: Integrator, mesh: Rc<Mesh>) -> Self {
    Self {
      mesh,
      basis,
      integrator,
      reference: OnceCell::new(),
    }
  }

  pub fn mesh(&self) -> &Rc<Mesh> {
    &self.mesh
  }
  pub fn basis(&self) -> &B {
    &self.basis
  }

  /// Reference matrices, computed on first use.
  pub fn reference(&self) -> &ReferenceMatrices {
    self
      .reference
      .get_or_init(|| ReferenceMatrices::compute(&self.basis, &self.integrator))
  }

  /// Local stiffness matrix of element `ielem` for permeability `mu`.
  pub fn local_stiffness(&self, ielem: ElementIdx, mu: f64) -> na::DMatrix<f64> {
    let rect = self.mesh.element_rect(ielem);
    let (hx, hy) = (rect.width(), rect.height());
    let reference = self.reference();
    (&reference.stiffness_x * (hy / hx) + &reference.stiffness_y * (hx / hy)) / mu
  }

  pub fn local_mass(&self, ielem: ElementIdx) -> na::DMatrix<f64> {
    let rect = self.mesh.element_rect(ielem);
    &self.reference().mass * rect.area()
  }

  /// Local load vector for the area's constant current density.
  pub fn local_load(&self, ielem: ElementIdx) -> na::DVector<f64> {
    let current = self.mesh.element_area(ielem).current();
    let ndofs = self.basis.size();
    self.local_mass(ielem) * na::DVector::from_element(ndofs, current)
  }

  /// Assembles using each area's fixed permeability.
  pub fn assemble(&self, matrix: &mut SparseMatrix, vector: &mut na::DVector<f64>) {
    let mesh = Rc::clone(&self.mesh);
    self.assemble_with(matrix, vector, |ielem| {
      mesh.element_area(ielem).permeability()
    });
  }

  /// Clears and refills `matrix` and `vector`.
  ///
  /// `permeability` yields the absolute permeability of every element.
  pub fn assemble_with<F>(
    &self,
    matrix: &mut SparseMatrix,
    vector: &mut na::DVector<f64>,
    permeability: F,
  ) where
    F: Fn(ElementIdx) -> f64,
  {
    assert_eq!(matrix.size(), self.mesh.npoints());
    assert_eq!(vector.len(), self.mesh.npoints());
    matrix.clear();
    vector.fill(0.0);

    for (ielem, element) in self.mesh.elements().iter().enumerate() {
      let nodes = element.nodes();
      let elmat = self.local_stiffness(ielem, permeability(ielem));
      let elvec = self.local_load(ielem);

      for (ilocal, &iglobal) in nodes.iter().enumerate() {
        vector[iglobal] += elvec[ilocal];
        for (jlocal, &jglobal) in nodes.iter().enumerate() {
          if iglobal >= jglobal {
            matrix.add(iglobal, jglobal, elmat[(ilocal, jlocal)]);
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::MatrixAssembler;
  use crate::{
    basis::BilinearBasis,
    mesh::{LinearMeshBuilder, Mesh, MeshParameters},
    quadrature::Integrator,
    sparse::SparseMatrix,
    VACUUM_PERMEABILITY,
  };

  use approx::assert_relative_eq;
  use std::rc::Rc;

  fn assembler(params: &MeshParameters) -> MatrixAssembler<BilinearBasis> {
    let mesh = Rc::new(Mesh::new(params, &LinearMeshBuilder).unwrap());
    MatrixAssembler::new(BilinearBasis, Integrator::default(), mesh)
  }

  #[test]
  fn reference_matrices_of_bilinear_square() {
    let params = MeshParameters::uniform([0.0, 1.0], [0.0, 1.0], [1, 1], (1.0, 0.0)).unwrap();
    let assembler = assembler(&params);
    let reference = assembler.reference();

    #[rustfmt::skip]
    let expected_x = na::DMatrix::from_row_slice(4, 4, &[
       2.0, -2.0,  1.0, -1.0,
      -2.0,  2.0, -1.0,  1.0,
       1.0, -1.0,  2.0, -2.0,
      -1.0,  1.0, -2.0,  2.0,
    ]) / 6.0;
    #[rustfmt::skip]
    let expected_y = na::DMatrix::from_row_slice(4, 4, &[
       2.0,  1.0, -2.0, -1.0,
       1.0,  2.0, -1.0, -2.0,
      -2.0, -1.0,  2.0,  1.0,
      -1.0, -2.0,  1.0,  2.0,
    ]) / 6.0;
    #[rustfmt::skip]
    let expected_mass = na::DMatrix::from_row_slice(4, 4, &[
      4.0, 2.0, 2.0, 1.0,
      2.0, 4.0, 1.0, 2.0,
      2.0, 1.0, 4.0, 2.0,
      1.0, 2.0, 2.0, 4.0,
    ]) / 36.0;

    assert_relative_eq!(reference.stiffness_x, expected_x, epsilon = 1e-14);
    assert_relative_eq!(reference.stiffness_y, expected_y, epsilon = 1e-14);
    assert_relative_eq!(reference.mass, expected_mass, epsilon = 1e-14);
  }

  #[test]
  fn galerkin_system_annihilates_constants() {
    let current = 3.0;
    let params =
      MeshParameters::uniform([0.0, 2.0], [0.0, 1.0], [4, 3], (1.0, current)).unwrap();
    let assembler = assembler(&params);
    let mesh = assembler.mesh().clone();

    let mut matrix = SparseMatrix::from_mesh(&mesh);
    let mut vector = na::DVector::zeros(mesh.npoints());
    assembler.assemble(&mut matrix, &mut vector);

    let ones = na::DVector::from_element(mesh.npoints(), 1.0);
    let scale = 1.0 / VACUUM_PERMEABILITY;
    assert!(matrix.mul_vec(&ones).amax() < 1e-12 * scale);
    assert_relative_eq!(vector.sum(), current * 2.0, epsilon = 1e-12);
    assert!(matrix.diag().iter().all(|&d| d > 0.0));
  }

  #[test]
  fn provider_scales_element_stiffness() {
    let params = MeshParameters::uniform([0.0, 1.0], [0.0, 1.0], [2, 2], (1.0, 0.0)).unwrap();
    let assembler = assembler(&params);
    let mesh = assembler.mesh().clone();

    let mut unit = SparseMatrix::from_mesh(&mesh);
    let mut halved = SparseMatrix::from_mesh(&mesh);
    let mut vector = na::DVector::zeros(mesh.npoints());
    assembler.assemble_with(&mut unit, &mut vector, |_| 1.0);
    assembler.assemble_with(&mut halved, &mut vector, |_| 2.0);

    let unit = unit.to_nalgebra_dense();
    let halved = halved.to_nalgebra_dense();
    assert_relative_eq!(unit, halved * 2.0, epsilon = 1e-14);
    // the center node couples to all four elements
    assert_relative_eq!(unit[(4, 4)], 4.0 * 2.0 / 3.0, epsilon = 1e-14);
  }
}
