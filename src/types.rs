use nalgebra::{Dyn, MatrixView, OMatrix, OVector, U1};

pub type VecD = OVector<f64, Dyn>;

pub type VecDView<'a> = MatrixView<'a, f64, Dyn, U1, U1, Dyn>;

pub type MatD = OMatrix<f64, Dyn, Dyn>;

/// The `(d+1) x (d+1)` grid of mixed Cartesian partial derivatives `SKL[k][l]`
/// returned by [`Surface::derivatives`][crate::surface::Surface::derivatives].
pub type DerivativeGrid = Vec<Vec<VecD>>;
