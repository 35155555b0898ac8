//! Shape functions on reference elements.

use crate::geometry::Point;

/// Scalar basis on the unit reference square.
pub trait Basis2d {
  fn size(&self) -> usize;

  /// Value of shape function `ibasis` at reference point `p`.
  fn psi(&self, ibasis: usize, p: &Point) -> f64;

  /// Partial derivative of shape function `ibasis` with respect to reference
  /// coordinate `ivar` (0 = ξ, 1 = η).
  fn dpsi(&self, ibasis: usize, ivar: usize, p: &Point) -> f64;
}

/// Basis on the unit reference interval, parameterized by the physical length `h`.
pub trait Basis1d {
  fn size(&self) -> usize;

  fn psi(&self, ibasis: usize, xi: f64, h: f64) -> f64;
  fn dpsi(&self, ibasis: usize, xi: f64, h: f64) -> f64;
  fn ddpsi(&self, ibasis: usize, xi: f64, h: f64) -> f64;
}

/// Tensor product of linear functions.
///
/// Local node order: bottom-left, bottom-right, top-left, top-right.
#[derive(Debug, Default, Clone, Copy)]
pub struct BilinearBasis;
impl Basis2d for BilinearBasis {
  fn size(&self) -> usize {
    4
  }

  fn psi(&self, ibasis: usize, p: &Point) -> f64 {
    let (x, y) = (p.x, p.y);
    match ibasis {
      0 => (1.0 - x) * (1.0 - y),
      1 => x * (1.0 - y),
      2 => (1.0 - x) * y,
      3 => x * y,
      _ => panic!("bilinear basis has no function {ibasis}"),
    }
  }

  fn dpsi(&self, ibasis: usize, ivar: usize, p: &Point) -> f64 {
    let (x, y) = (p.x, p.y);
    match (ivar, ibasis) {
      (0, 0) => y - 1.0,
      (0, 1) => 1.0 - y,
      (0, 2) => -y,
      (0, 3) => y,
      (1, 0) => x - 1.0,
      (1, 1) => -x,
      (1, 2) => 1.0 - x,
      (1, 3) => x,
      _ => panic!("bilinear basis has no derivative ({ibasis}, {ivar})"),
    }
  }
}

/// Cubic Hermite basis.
///
/// Degrees of freedom: value at left end, slope at left end,
/// value at right end, slope at right end.
/// Derivatives are taken with respect to the physical coordinate.
#[derive(Debug, Default, Clone, Copy)]
pub struct HermiteBasis;
impl Basis1d for HermiteBasis {
  fn size(&self) -> usize {
    4
  }

  fn psi(&self, ibasis: usize, xi: f64, h: f64) -> f64 {
    let xi2 = xi * xi;
    let xi3 = xi2 * xi;
    match ibasis {
      0 => 1.0 - 3.0 * xi2 + 2.0 * xi3,
      1 => h * (xi - 2.0 * xi2 + xi3),
      2 => 3.0 * xi2 - 2.0 * xi3,
      3 => h * (xi3 - xi2),
      _ => panic!("hermite basis has no function {ibasis}"),
    }
  }

  fn dpsi(&self, ibasis: usize, xi: f64, h: f64) -> f64 {
    match ibasis {
      0 => -6.0 * (xi - xi * xi) / h,
      1 => 1.0 - 4.0 * xi + 3.0 * xi * xi,
      2 => 6.0 * (xi - xi * xi) / h,
      3 => -2.0 * xi + 3.0 * xi * xi,
      _ => panic!("hermite basis has no function {ibasis}"),
    }
  }

  fn ddpsi(&self, ibasis: usize, xi: f64, h: f64) -> f64 {
    match ibasis {
      0 => -6.0 * (1.0 - 2.0 * xi) / (h * h),
      1 => (-4.0 + 6.0 * xi) / h,
      2 => 6.0 * (1.0 - 2.0 * xi) / (h * h),
      3 => (-2.0 + 6.0 * xi) / h,
      _ => panic!("hermite basis has no function {ibasis}"),
    }
  }
}
