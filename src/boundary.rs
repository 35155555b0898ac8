//! Dirichlet boundary conditions on the borders of the structured grid.

use crate::{
  mesh::{builder::node_index, Mesh, NodeIdx},
  sparse::SparseMatrix,
};

use itertools::Itertools;

/// Diagonal value forcing a constrained node to its prescribed value.
pub const PENALTY: f64 = 1e32;

/// Which borders of the domain carry a homogeneous Dirichlet condition.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryFlags {
  pub left: bool,
  pub right: bool,
  pub bottom: bool,
  pub top: bool,
}
impl BoundaryFlags {
  pub fn all() -> Self {
    Self {
      left: true,
      right: true,
      bottom: true,
      top: true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirichletBoundary {
  pub node: NodeIdx,
  pub value: f64,
}
impl DirichletBoundary {
  pub fn new(node: NodeIdx, value: f64) -> Self {
    Self { node, value }
  }
}

/// Enumerates the nodes of the flagged borders.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryHandler {
  flags: BoundaryFlags,
}
impl BoundaryHandler {
  pub fn new(flags: BoundaryFlags) -> Self {
    Self { flags }
  }

  pub fn flags(&self) -> BoundaryFlags {
    self.flags
  }

  /// Border nodes in the order top, bottom, left, right.
  /// Corner nodes shared by two flagged borders appear once, at their first occurrence.
  pub fn boundary_nodes(&self, mesh: &Mesh) -> Vec<NodeIdx> {
    let nx = mesh.nnodes_x();
    let ny = mesh.nnodes_y();
    let mut nodes = Vec::new();
    if self.flags.top {
      nodes.extend((0..nx).map(|i| node_index(i, ny - 1, nx)));
    }
    if self.flags.bottom {
      nodes.extend((0..nx).map(|i| node_index(i, 0, nx)));
    }
    if self.flags.left {
      nodes.extend((0..ny).map(|j| node_index(0, j, nx)));
    }
    if self.flags.right {
      nodes.extend((0..ny).map(|j| node_index(nx - 1, j, nx)));
    }
    nodes.into_iter().unique().collect()
  }

  /// Zero valued constraints on all flagged borders.
  pub fn create_boundaries(&self, mesh: &Mesh) -> Vec<DirichletBoundary> {
    self
      .boundary_nodes(mesh)
      .into_iter()
      .map(|node| DirichletBoundary::new(node, 0.0))
      .collect()
  }
}

/// How constraints are imposed on the assembled system.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DirichletMethod {
  #[default]
  Penalty,
  Elimination,
}

impl DirichletMethod {
  pub fn apply(
    &self,
    boundaries: &[DirichletBoundary],
    matrix: &mut SparseMatrix,
    vector: &mut na::DVector<f64>,
  ) {
    match self {
      Self::Penalty => apply_penalty(boundaries, matrix, vector),
      Self::Elimination => {
        let dof_coeffs: Vec<_> = boundaries.iter().map(|b| (b.node, b.value)).collect();
        fix_dofs_coeff(&dof_coeffs, matrix, vector);
      }
    }
  }
}

/// Penalty method: the diagonal of a constrained node is replaced by [`PENALTY`]
/// and its right-hand side by `PENALTY * value`.
pub fn apply_penalty(
  boundaries: &[DirichletBoundary],
  matrix: &mut SparseMatrix,
  vector: &mut na::DVector<f64>,
) {
  for boundary in boundaries {
    matrix.diag_mut()[boundary.node] = PENALTY;
    vector[boundary.node] = PENALTY * boundary.value;
  }
}

/// Fix DOFs of the FE solution by symmetric elimination.
///
/// Modifies matrix and vector, such that the solution has the given coefficients on the dofs.
/// $mat(A_0, 0; 0, I) vec(mu_0, mu_diff) = vec(phi - A_(0 diff) gamma, gamma)$
pub fn fix_dofs_coeff(
  dof_coeffs: &[(NodeIdx, f64)],
  matrix: &mut SparseMatrix,
  vector: &mut na::DVector<f64>,
) {
  let ndofs = matrix.size();
  let mut fixed = vec![None; ndofs];
  for &(idof, value) in dof_coeffs {
    fixed[idof] = Some(value);
  }
  let gamma = na::DVector::from_iterator(ndofs, fixed.iter().map(|v| v.unwrap_or(0.0)));

  // Move known values to the right-hand side.
  *vector -= matrix.mul_vec(&gamma);
  for &(idof, value) in dof_coeffs {
    vector[idof] = value;
  }

  // Zero all entries sharing a row or column with a fixed dof.
  for i in 0..ndofs {
    for k in matrix.row_range(i) {
      let j = matrix.col_indices()[k];
      if fixed[i].is_some() || fixed[j].is_some() {
        matrix.values_mut()[k] = 0.0;
      }
    }
  }
  for &(idof, _) in dof_coeffs {
    matrix.diag_mut()[idof] = 1.0;
  }
}
