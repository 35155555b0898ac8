//! Symmetric sparse matrix in lower-triangle profile storage.
//!
//! Only the diagonal and the strictly lower triangle are stored.
//! The sparsity pattern (portrait) is fixed at construction.

use crate::{
  error::{Error, Result},
  mesh::Mesh,
};

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
  diag: Vec<f64>,
  /// Row offsets into `col_indices` and `values`, length `n+1`.
  row_ptrs: Vec<usize>,
  /// Ascending column indices per row, all below the diagonal.
  col_indices: Vec<usize>,
  values: Vec<f64>,
}

impl SparseMatrix {
  /// Zero matrix with the given portrait.
  pub fn from_portrait(row_ptrs: Vec<usize>, col_indices: Vec<usize>) -> Self {
    assert!(!row_ptrs.is_empty(), "row pointers need a leading zero");
    assert_eq!(*row_ptrs.last().unwrap_or(&0), col_indices.len());
    let n = row_ptrs.len() - 1;
    for i in 0..n {
      let cols = &col_indices[row_ptrs[i]..row_ptrs[i + 1]];
      assert!(
        cols.iter().all(|&j| j < i) && cols.windows(2).all(|w| w[0] < w[1]),
        "row {i} of the portrait is not strictly lower and ascending"
      );
    }
    let nnz = col_indices.len();
    Self {
      diag: vec![0.0; n],
      row_ptrs,
      col_indices,
      values: vec![0.0; nnz],
    }
  }

  /// Portrait of the node connectivity of a mesh: all node pairs sharing an element.
  pub fn from_mesh(mesh: &Mesh) -> Self {
    let (row_ptrs, col_indices) = build_portrait(mesh);
    Self::from_portrait(row_ptrs, col_indices)
  }

  /// Builds from a dense symmetric matrix, keeping the nonzero lower entries.
  pub fn from_dense(dense: &na::DMatrix<f64>) -> Self {
    assert!(dense.is_square());
    let n = dense.nrows();
    let mut row_ptrs = vec![0];
    let mut col_indices = Vec::new();
    let mut values = Vec::new();
    for i in 0..n {
      for j in 0..i {
        if dense[(i, j)] != 0.0 {
          col_indices.push(j);
          values.push(dense[(i, j)]);
        }
      }
      row_ptrs.push(col_indices.len());
    }
    let mut matrix = Self::from_portrait(row_ptrs, col_indices);
    matrix.values = values;
    matrix.diag = dense.diagonal().iter().copied().collect();
    matrix
  }

  pub fn size(&self) -> usize {
    self.diag.len()
  }
  pub fn nnz_offdiag(&self) -> usize {
    self.values.len()
  }
  pub fn diag(&self) -> &[f64] {
    &self.diag
  }
  pub fn diag_mut(&mut self) -> &mut [f64] {
    &mut self.diag
  }
  pub fn row_ptrs(&self) -> &[usize] {
    &self.row_ptrs
  }
  pub fn col_indices(&self) -> &[usize] {
    &self.col_indices
  }
  pub fn values(&self) -> &[f64] {
    &self.values
  }
  pub fn values_mut(&mut self) -> &mut [f64] {
    &mut self.values
  }

  /// Range of stored entries of row `i`.
  pub fn row_range(&self, i: usize) -> std::ops::Range<usize> {
    self.row_ptrs[i]..self.row_ptrs[i + 1]
  }

  /// Storage position of the lower entry `(i, j)` with `j < i`.
  pub fn position(&self, i: usize, j: usize) -> Option<usize> {
    let range = self.row_range(i);
    let start = range.start;
    self.col_indices[range]
      .binary_search(&j)
      .ok()
      .map(|k| start + k)
  }

  /// Adds `value` to entry `(i, j)`.
  ///
  /// Panics if `(i, j)` is not in the lower triangle of the portrait.
  pub fn add(&mut self, i: usize, j: usize, value: f64) {
    if i == j {
      self.diag[i] += value;
      return;
    }
    assert!(i > j, "entry ({i},{j}) lies in the upper triangle");
    match self.position(i, j) {
      Some(k) => self.values[k] += value,
      None => panic!("entry ({i},{j}) is not part of the matrix portrait"),
    }
  }

  pub fn get(&self, i: usize, j: usize) -> f64 {
    if i == j {
      return self.diag[i];
    }
    let (i, j) = if i > j { (i, j) } else { (j, i) };
    self.position(i, j).map_or(0.0, |k| self.values[k])
  }

  /// Resets all values, keeping the portrait.
  pub fn clear(&mut self) {
    self.diag.fill(0.0);
    self.values.fill(0.0);
  }

  pub fn mul_vec(&self, x: &na::DVector<f64>) -> na::DVector<f64> {
    assert_eq!(x.len(), self.size());
    let mut y = na::DVector::zeros(self.size());
    for i in 0..self.size() {
      y[i] += self.diag[i] * x[i];
      for k in self.row_range(i) {
        let j = self.col_indices[k];
        y[i] += self.values[k] * x[j];
        y[j] += self.values[k] * x[i];
      }
    }
    y
  }

  /// All entries of the full symmetric matrix.
  pub fn full_triplets(&self) -> Vec<(usize, usize, f64)> {
    let mut triplets = Vec::with_capacity(self.size() + 2 * self.nnz_offdiag());
    for i in 0..self.size() {
      triplets.push((i, i, self.diag[i]));
      for k in self.row_range(i) {
        let j = self.col_indices[k];
        triplets.push((i, j, self.values[k]));
        triplets.push((j, i, self.values[k]));
      }
    }
    triplets
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let n = self.size();
    let mut coo = nas::CooMatrix::new(n, n);
    for (r, c, v) in self.full_triplets() {
      coo.push(r, c, v);
    }
    coo
  }

  pub fn to_nalgebra_csr(&self) -> nas::CsrMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> na::DMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_faer_csc(&self) -> Result<faer::sparse::SparseColMat<usize, f64>> {
    let n = self.size();
    faer::sparse::SparseColMat::try_new_from_triplets(n, n, &self.full_triplets())
      .map_err(|e| Error::Numerical(format!("sparse conversion failed: {e:?}")))
  }
}

/// Row pointers and column indices of the lower triangle of the node graph.
pub fn build_portrait(mesh: &Mesh) -> (Vec<usize>, Vec<usize>) {
  let mut rows = vec![BTreeSet::new(); mesh.npoints()];
  for element in mesh.elements() {
    for &i in element.nodes() {
      for &j in element.nodes() {
        if j < i {
          rows[i].insert(j);
        }
      }
    }
  }

  let mut row_ptrs = Vec::with_capacity(rows.len() + 1);
  row_ptrs.push(0);
  let mut col_indices = Vec::new();
  for row in rows {
    col_indices.extend(row);
    row_ptrs.push(col_indices.len());
  }
  (row_ptrs, col_indices)
}

#[cfg(test)]
mod test {
  use super::SparseMatrix;
  use crate::mesh::{LinearMeshBuilder, Mesh, MeshParameters};

  use approx::assert_relative_eq;

  /// 4x4 with a single stored off-diagonal entry (3,1).
  fn handbuilt() -> SparseMatrix {
    let mut m = SparseMatrix::from_portrait(vec![0, 0, 0, 0, 1], vec![1]);
    m.add(0, 0, 4.0);
    m.add(1, 1, 5.0);
    m.add(2, 2, 6.0);
    m.add(3, 3, 7.0);
    m.add(3, 1, -2.0);
    m
  }

  #[test]
  fn matvec_matches_dense_symmetric_product() {
    let m = handbuilt();
    #[rustfmt::skip]
    let dense = na::DMatrix::from_row_slice(4, 4, &[
      4.0, 0.0, 0.0, 0.0,
      0.0, 5.0, 0.0,-2.0,
      0.0, 0.0, 6.0, 0.0,
      0.0,-2.0, 0.0, 7.0,
    ]);
    assert_eq!(m.to_nalgebra_dense(), dense);

    let x = na::DVector::from_vec(vec![1.0, -1.0, 0.5, 2.0]);
    let expected = &dense * &x;
    let computed = m.mul_vec(&x);
    assert_relative_eq!(computed, expected, epsilon = 1e-14);
    let csr = m.to_nalgebra_csr();
    assert_relative_eq!(&csr * &x, expected, epsilon = 1e-14);
  }

  #[test]
  #[should_panic]
  fn upper_triangle_write_is_rejected() {
    let mut m = handbuilt();
    m.add(1, 3, 1.0);
  }

  #[test]
  #[should_panic]
  fn write_outside_portrait_is_rejected() {
    let mut m = handbuilt();
    m.add(2, 0, 1.0);
  }

  #[test]
  fn portrait_of_two_by_two_mesh() {
    let params = MeshParameters::uniform([0.0, 1.0], [0.0, 1.0], [2, 2], (1.0, 0.0)).unwrap();
    let mesh = Mesh::new(&params, &LinearMeshBuilder).unwrap();
    let m = SparseMatrix::from_mesh(&mesh);
    assert_eq!(m.size(), 9);
    assert_eq!(m.row_ptrs(), &[0, 0, 1, 2, 4, 8, 11, 13, 17, 20]);
    assert_eq!(&m.col_indices()[4..8], &[0, 1, 2, 3]);
    assert_eq!(&m.col_indices()[17..20], &[4, 5, 7]);
  }

  #[test]
  fn clear_keeps_portrait() {
    let mut m = handbuilt();
    m.clear();
    assert_eq!(m.nnz_offdiag(), 1);
    assert!(m.diag().iter().all(|&d| d == 0.0));
    assert_eq!(m.get(1, 3), 0.0);
  }
}
