use super::{
  params::{AreaNumber, MeshParameters},
  FiniteElement,
};
use crate::{
  error::{Error, Result},
  geometry::Point,
};

use itertools::{iproduct, Itertools};

/// Strategy for turning mesh parameters into nodes and elements.
pub trait MeshBuilder {
  fn build(&self, params: &MeshParameters) -> Result<(Vec<Point>, Vec<FiniteElement>)>;
}

/// Bilinear quadrilaterals on the structured grid.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearMeshBuilder;
impl MeshBuilder for LinearMeshBuilder {
  fn build(&self, params: &MeshParameters) -> Result<(Vec<Point>, Vec<FiniteElement>)> {
    let xs = axis_nodes(params.lines_x(), params.splits_x(), params.ratios_x());
    let ys = axis_nodes(params.lines_y(), params.splits_y(), params.ratios_y());
    let nx = xs.len();

    // row-major, y outer
    let points: Vec<Point> = iproduct!(ys.iter(), xs.iter())
      .map(|(&y, &x)| Point::new(x, y))
      .collect();

    let elements = iproduct!(0..ys.len() - 1, 0..nx - 1)
      .map(|(j, i)| -> Result<FiniteElement> {
        let nodes = vec![
          node_index(i, j, nx),
          node_index(i + 1, j, nx),
          node_index(i, j + 1, nx),
          node_index(i + 1, j + 1, nx),
        ];
        let centroid = centroid(&points, &nodes);
        let area = classify(&centroid, params)?;
        Ok(FiniteElement::new(nodes, area))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok((points, elements))
  }
}

/// converts grid index to linear node index
pub fn node_index(i: usize, j: usize, nnodes_x: usize) -> usize {
  i + j * nnodes_x
}

/// Node coordinates along one axis.
///
/// A segment with ratio `k` is split into steps forming a geometric progression
/// with quotient `k` for `k > 0` and `1/|k|` for `k < 0`.
pub fn axis_nodes(lines: &[f64], splits: &[usize], ratios: &[f64]) -> Vec<f64> {
  let mut nodes = Vec::with_capacity(splits.iter().sum::<usize>() + 1);
  nodes.push(lines[0]);

  for (((&left, &right), &nsplits), &ratio) in lines
    .iter()
    .tuple_windows()
    .zip(splits)
    .zip(ratios)
  {
    let quotient = if ratio > 0.0 { ratio } else { 1.0 / ratio.abs() };
    let series: f64 = (0..nsplits).map(|k| quotient.powi(k as i32)).sum();
    let mut h = (right - left) / series;

    let mut x = left;
    for _ in 0..nsplits - 1 {
      x += h;
      nodes.push(x);
      h *= quotient;
    }
    nodes.push(right);
  }

  nodes
}

pub fn centroid(points: &[Point], nodes: &[usize]) -> Point {
  let n = nodes.len() as f64;
  let (sx, sy) = nodes
    .iter()
    .fold((0.0, 0.0), |(sx, sy), &i| (sx + points[i].x, sy + points[i].y));
  Point::new(sx / n, sy / n)
}

/// First area in descending number order whose breakpoint box contains `p`.
pub fn classify(p: &Point, params: &MeshParameters) -> Result<AreaNumber> {
  let lx = params.lines_x();
  let ly = params.lines_y();
  params
    .areas()
    .values()
    .find(|area| {
      let [x1, x2] = area.x_range();
      let [y1, y2] = area.y_range();
      p.x >= lx[x1] && p.x <= lx[x2] && p.y >= ly[y1] && p.y <= ly[y2]
    })
    .map(|area| area.number())
    .ok_or_else(|| {
      Error::configuration(format!(
        "element with centroid ({}, {}) lies in no area",
        p.x, p.y
      ))
    })
}
