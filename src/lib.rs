extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod basis;
pub mod boundary;
pub mod dependence;
pub mod error;
pub mod fem;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod quadrature;
pub mod solver;
pub mod sparse;
pub mod spline;

pub use error::{Error, Result};

/// $mu_0$ in H/m.
pub const VACUUM_PERMEABILITY: f64 = 4.0 * std::f64::consts::PI * 1e-7;
