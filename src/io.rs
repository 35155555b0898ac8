//! Plain text dumps for inspecting meshes, systems and solutions.

use crate::mesh::Mesh;

use std::io::{self, Write};

/// One matrix row per line, entries separated by spaces.
pub fn write_dense_matrix<W: Write>(writer: &mut W, matrix: &na::DMatrix<f64>) -> io::Result<()> {
  for row in matrix.row_iter() {
    let line = row.iter().map(|v| format!("{v:e}")).collect::<Vec<_>>();
    writeln!(writer, "{}", line.join(" "))?;
  }
  Ok(())
}

/// One element per line: the node indices followed by the area number.
pub fn write_mesh_elements<W: Write>(writer: &mut W, mesh: &Mesh) -> io::Result<()> {
  for element in mesh.elements() {
    for node in element.nodes() {
      write!(writer, "{node} ")?;
    }
    writeln!(writer, "{}", element.area())?;
  }
  Ok(())
}

pub fn write_mesh_points<W: Write>(writer: &mut W, mesh: &Mesh) -> io::Result<()> {
  for p in mesh.points() {
    writeln!(writer, "{} {}", p.x, p.y)?;
  }
  Ok(())
}

pub fn write_solution<W: Write>(writer: &mut W, solution: &na::DVector<f64>) -> io::Result<()> {
  for v in solution.iter() {
    writeln!(writer, "{v:e}")?;
  }
  Ok(())
}

#[cfg(test)]
mod test {
  use super::{write_dense_matrix, write_mesh_elements, write_mesh_points, write_solution};
  use crate::mesh::{LinearMeshBuilder, Mesh, MeshParameters};

  #[test]
  fn mesh_dumps() {
    let params = MeshParameters::uniform([0.0, 2.0], [0.0, 1.0], [2, 1], (1.0, 0.0)).unwrap();
    let mesh = Mesh::new(&params, &LinearMeshBuilder).unwrap();

    let mut elements = Vec::new();
    write_mesh_elements(&mut elements, &mesh).unwrap();
    assert_eq!(String::from_utf8(elements).unwrap(), "0 1 3 4 0\n1 2 4 5 0\n");

    let mut points = Vec::new();
    write_mesh_points(&mut points, &mesh).unwrap();
    let points = String::from_utf8(points).unwrap();
    assert_eq!(points.lines().count(), 6);
    assert_eq!(points.lines().nth(4), Some("1 1"));
  }

  #[test]
  fn matrix_and_solution_dumps() {
    let matrix = na::DMatrix::from_row_slice(2, 2, &[1.0, -0.5, -0.5, 2.0]);
    let mut out = Vec::new();
    write_dense_matrix(&mut out, &matrix).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "1e0 -5e-1\n-5e-1 2e0\n");

    let mut out = Vec::new();
    write_solution(&mut out, &na::DVector::from_vec(vec![0.25, 0.0])).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "2.5e-1\n0e0\n");
  }
}
