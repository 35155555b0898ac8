use crate::error::{Error, Result};

use indexmap::IndexMap;
use itertools::Itertools;

pub type AreaNumber = usize;

/// Material region given as index ranges into the axis breakpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
  number: AreaNumber,
  /// Relative permeability.
  permeability: f64,
  /// Current density.
  current: f64,
  x1: usize,
  x2: usize,
  y1: usize,
  y2: usize,
}
impl Area {
  pub fn new(
    number: AreaNumber,
    permeability: f64,
    current: f64,
    [x1, x2]: [usize; 2],
    [y1, y2]: [usize; 2],
  ) -> Self {
    Self {
      number,
      permeability,
      current,
      x1,
      x2,
      y1,
      y2,
    }
  }

  pub fn number(&self) -> AreaNumber {
    self.number
  }
  pub fn relative_permeability(&self) -> f64 {
    self.permeability
  }
  /// Absolute permeability.
  pub fn permeability(&self) -> f64 {
    crate::VACUUM_PERMEABILITY * self.permeability
  }
  pub fn current(&self) -> f64 {
    self.current
  }
  pub fn x_range(&self) -> [usize; 2] {
    [self.x1, self.x2]
  }
  pub fn y_range(&self) -> [usize; 2] {
    [self.y1, self.y2]
  }
}

/// Areas keyed by number, in descending number order.
pub type Areas = IndexMap<AreaNumber, Area>;

/// Description of a graded structured mesh.
#[derive(Debug, Clone)]
pub struct MeshParameters {
  lines_x: Vec<f64>,
  lines_y: Vec<f64>,
  splits_x: Vec<usize>,
  splits_y: Vec<usize>,
  ratios_x: Vec<f64>,
  ratios_y: Vec<f64>,
  nesting: (usize, usize),
  areas: Areas,
}

pub const MAX_NESTING: usize = 2;

impl MeshParameters {
  /// Validates the description and applies the nesting refinement.
  ///
  /// `areas` must be given in strictly ascending number order.
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    lines_x: Vec<f64>,
    lines_y: Vec<f64>,
    splits_x: Vec<usize>,
    splits_y: Vec<usize>,
    ratios_x: Vec<f64>,
    ratios_y: Vec<f64>,
    nesting: (usize, usize),
    areas: Vec<Area>,
  ) -> Result<Self> {
    validate_axis("x", &lines_x, &splits_x, &ratios_x)?;
    validate_axis("y", &lines_y, &splits_y, &ratios_y)?;

    if nesting.0 > MAX_NESTING || nesting.1 > MAX_NESTING {
      return Err(Error::configuration(format!(
        "nesting levels must lie in [0,{MAX_NESTING}], got {nesting:?}"
      )));
    }

    if areas.is_empty() {
      return Err(Error::configuration("at least one area is required"));
    }
    if !areas
      .iter()
      .tuple_windows()
      .all(|(a, b)| a.number < b.number)
    {
      return Err(Error::configuration(
        "area numbers must be sorted by ascending",
      ));
    }
    for area in &areas {
      let [x1, x2] = area.x_range();
      let [y1, y2] = area.y_range();
      if x1 >= x2 || x2 >= lines_x.len() || y1 >= y2 || y2 >= lines_y.len() {
        return Err(Error::configuration(format!(
          "area {} has invalid breakpoint ranges x={:?} y={:?}",
          area.number,
          area.x_range(),
          area.y_range()
        )));
      }
    }
    let areas = areas.into_iter().rev().map(|a| (a.number, a)).collect();

    let (splits_x, ratios_x) = refine(nesting.0, splits_x, ratios_x);
    let (splits_y, ratios_y) = refine(nesting.1, splits_y, ratios_y);

    Ok(Self {
      lines_x,
      lines_y,
      splits_x,
      splits_y,
      ratios_x,
      ratios_y,
      nesting,
      areas,
    })
  }

  /// Single area, uniform splits.
  pub fn uniform(
    [x0, x1]: [f64; 2],
    [y0, y1]: [f64; 2],
    [nx, ny]: [usize; 2],
    area: (f64, f64),
  ) -> Result<Self> {
    let (permeability, current) = area;
    Self::new(
      vec![x0, x1],
      vec![y0, y1],
      vec![nx],
      vec![ny],
      vec![1.0],
      vec![1.0],
      (0, 0),
      vec![Area::new(0, permeability, current, [0, 1], [0, 1])],
    )
  }

  pub fn lines_x(&self) -> &[f64] {
    &self.lines_x
  }
  pub fn lines_y(&self) -> &[f64] {
    &self.lines_y
  }
  pub fn splits_x(&self) -> &[usize] {
    &self.splits_x
  }
  pub fn splits_y(&self) -> &[usize] {
    &self.splits_y
  }
  pub fn ratios_x(&self) -> &[f64] {
    &self.ratios_x
  }
  pub fn ratios_y(&self) -> &[f64] {
    &self.ratios_y
  }
  pub fn nesting(&self) -> (usize, usize) {
    self.nesting
  }
  pub fn areas(&self) -> &Areas {
    &self.areas
  }

  pub fn ncells_x(&self) -> usize {
    self.splits_x.iter().sum()
  }
  pub fn ncells_y(&self) -> usize {
    self.splits_y.iter().sum()
  }
  pub fn nnodes_x(&self) -> usize {
    self.ncells_x() + 1
  }
  pub fn nnodes_y(&self) -> usize {
    self.ncells_y() + 1
  }
}

fn validate_axis(axis: &str, lines: &[f64], splits: &[usize], ratios: &[f64]) -> Result<()> {
  if lines.len() < 2 {
    return Err(Error::configuration(format!(
      "axis {axis} needs at least two breakpoints"
    )));
  }
  if !lines.iter().tuple_windows().all(|(a, b)| a < b) {
    return Err(Error::configuration(format!(
      "breakpoints of axis {axis} must be strictly increasing"
    )));
  }
  let nsegments = lines.len() - 1;
  if splits.len() != nsegments || ratios.len() != nsegments {
    return Err(Error::configuration(format!(
      "axis {axis} has {nsegments} segments but {} splits and {} ratios",
      splits.len(),
      ratios.len()
    )));
  }
  if splits.iter().any(|&s| s == 0) {
    return Err(Error::configuration(format!(
      "split counts of axis {axis} must be positive"
    )));
  }
  if ratios.iter().any(|&k| k == 0.0 || !k.is_finite()) {
    return Err(Error::configuration(format!(
      "grading ratios of axis {axis} must be finite and nonzero"
    )));
  }
  Ok(())
}

/// Nesting refinement: level `n` multiplies the splits by `2^n`
/// and takes the `2^n`-th root of the grading ratios.
fn refine(level: usize, splits: Vec<usize>, ratios: Vec<f64>) -> (Vec<usize>, Vec<f64>) {
  if level == 0 {
    return (splits, ratios);
  }
  let factor = 1 << level;
  let splits = splits.into_iter().map(|s| s * factor).collect();
  let ratios = ratios
    .into_iter()
    .map(|k| k.signum() * k.abs().powf(1.0 / factor as f64))
    .collect();
  (splits, ratios)
}

#[cfg(test)]
mod test {
  use super::{Area, MeshParameters};

  fn two_areas() -> Vec<Area> {
    vec![
      Area::new(0, 1.0, 0.0, [0, 2], [0, 1]),
      Area::new(1, 1000.0, 0.0, [0, 1], [0, 1]),
    ]
  }

  #[test]
  fn areas_are_stored_descending() {
    let params = MeshParameters::new(
      vec![0.0, 1.0, 2.0],
      vec![0.0, 1.0],
      vec![2, 2],
      vec![2],
      vec![1.0, 1.0],
      vec![1.0],
      (0, 0),
      two_areas(),
    )
    .unwrap();
    let numbers: Vec<_> = params.areas().keys().copied().collect();
    assert_eq!(numbers, vec![1, 0]);
  }

  #[test]
  fn descending_input_is_rejected() {
    let mut areas = two_areas();
    areas.reverse();
    let err = MeshParameters::new(
      vec![0.0, 1.0, 2.0],
      vec![0.0, 1.0],
      vec![2, 2],
      vec![2],
      vec![1.0, 1.0],
      vec![1.0],
      (0, 0),
      areas,
    )
    .unwrap_err();
    assert!(err.is_configuration());
  }

  #[test]
  fn nesting_out_of_range_is_rejected() {
    let err = MeshParameters::new(
      vec![0.0, 1.0],
      vec![0.0, 1.0],
      vec![2],
      vec![2],
      vec![1.0],
      vec![1.0],
      (3, 0),
      vec![Area::new(0, 1.0, 0.0, [0, 1], [0, 1])],
    )
    .unwrap_err();
    assert!(err.is_configuration());
  }

  #[test]
  fn nesting_refines_splits_and_ratios() {
    let params = MeshParameters::new(
      vec![0.0, 1.0],
      vec![0.0, 1.0],
      vec![3],
      vec![3],
      vec![16.0],
      vec![-16.0],
      (1, 2),
      vec![Area::new(0, 1.0, 0.0, [0, 1], [0, 1])],
    )
    .unwrap();
    assert_eq!(params.splits_x(), &[6]);
    assert_eq!(params.splits_y(), &[12]);
    assert!((params.ratios_x()[0] - 4.0).abs() < 1e-12);
    assert!((params.ratios_y()[0] + 2.0).abs() < 1e-12);
  }
}
