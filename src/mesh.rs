//! Structured quadrilateral mesh.
//!
//! Nodes are ordered row-major (y outer), elements likewise.
//! Every element carries the number of the material area containing it.

pub mod builder;
pub mod params;

pub use builder::{LinearMeshBuilder, MeshBuilder};
pub use params::{Area, AreaNumber, Areas, MeshParameters};

use crate::{
  error::Result,
  geometry::{Point, Rectangle},
};

pub type NodeIdx = usize;
pub type ElementIdx = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiniteElement {
  /// bottom-left, bottom-right, top-left, top-right
  nodes: Vec<NodeIdx>,
  area: AreaNumber,
}
impl FiniteElement {
  pub fn new(nodes: Vec<NodeIdx>, area: AreaNumber) -> Self {
    Self { nodes, area }
  }
  pub fn nodes(&self) -> &[NodeIdx] {
    &self.nodes
  }
  pub fn area(&self) -> AreaNumber {
    self.area
  }
}

#[derive(Debug, Clone)]
pub struct Mesh {
  points: Vec<Point>,
  elements: Vec<FiniteElement>,
  areas: Areas,
  nnodes_x: usize,
  nnodes_y: usize,
}

impl Mesh {
  pub fn new(params: &MeshParameters, builder: &impl MeshBuilder) -> Result<Self> {
    let (points, elements) = builder.build(params)?;
    tracing::debug!(
      npoints = points.len(),
      nelements = elements.len(),
      "built structured mesh"
    );
    Ok(Self {
      points,
      elements,
      areas: params.areas().clone(),
      nnodes_x: params.nnodes_x(),
      nnodes_y: params.nnodes_y(),
    })
  }

  pub fn points(&self) -> &[Point] {
    &self.points
  }
  pub fn elements(&self) -> &[FiniteElement] {
    &self.elements
  }
  pub fn areas(&self) -> &Areas {
    &self.areas
  }
  pub fn npoints(&self) -> usize {
    self.points.len()
  }
  pub fn nelements(&self) -> usize {
    self.elements.len()
  }
  pub fn nnodes_x(&self) -> usize {
    self.nnodes_x
  }
  pub fn nnodes_y(&self) -> usize {
    self.nnodes_y
  }

  /// The area an element belongs to.
  pub fn element_area(&self, ielem: ElementIdx) -> &Area {
    let number = self.elements[ielem].area();
    // classification only produces existing numbers
    &self.areas[&number]
  }

  /// Bounding rectangle of an element.
  pub fn element_rect(&self, ielem: ElementIdx) -> Rectangle {
    let nodes = self.elements[ielem].nodes();
    Rectangle::new(self.points[nodes[0]], self.points[nodes[nodes.len() - 1]])
  }

  /// First element whose closed rectangle contains `p`.
  pub fn locate(&self, p: &Point) -> Option<ElementIdx> {
    if !self.extent().contains(p) {
      return None;
    }
    (0..self.nelements()).find(|&ielem| self.element_rect(ielem).contains(p))
  }

  /// Bounding rectangle of the whole mesh.
  pub fn extent(&self) -> Rectangle {
    Rectangle::new(self.points[0], self.points[self.npoints() - 1])
  }
}
