//! Implements the control net constituting the control grid of the surface.
//!
//! The net stores its weighted control points in rational homogeneous form
//! `(w*x, w*y[, w*z], w)` as the columns of a `(dim+1) x (r*s)` matrix.
//!
//! The canonical flattening is column-major in the v-direction: the point at
//! grid position `(i, j)` lives in column `i + j*r`, so the u-index `i`
//! varies fastest. Callers holding row-major data must transpose before
//! construction.

use crate::{
    surface::SurfaceError,
    types::{MatD, VecD, VecDView},
};

#[derive(PartialEq, Debug, Clone)]
pub struct ControlNet {
    Pw: MatD,
    r: usize,
    s: usize,
}

impl ControlNet {
    /// Builds a net of `r x s` weighted control points.
    ///
    /// # Arguments
    ///
    /// * `points` - a `dim x (r*s)` matrix of Cartesian coordinates, one point
    ///   per column, flattened with the u-index varying fastest.
    /// * `weights` - the `r*s` strictly positive weights in the same order.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::{dmatrix, dvector};
    /// use bsurfaces::surface::points::ControlNet;
    ///
    /// // A 2x2 net of 3D points.
    /// let net = ControlNet::new(
    ///     dmatrix![
    ///         0.0, 1.0, 0.0, 1.0; // x
    ///         0.0, 0.0, 1.0, 1.0; // y
    ///         0.0, 0.0, 0.0, 0.0; // z
    ///     ],
    ///     dvector![1.0, 1.0, 1.0, 1.0],
    ///     2,
    ///     2,
    /// )
    /// .unwrap();
    /// assert_eq!(net.cartesian(1, 0), dvector![1.0, 0.0, 0.0]);
    /// ```
    pub fn new(points: MatD, weights: VecD, r: usize, s: usize) -> Result<Self, SurfaceError> {
        let dim = points.nrows();
        if !(2..=3).contains(&dim) {
            return Err(SurfaceError::UnsupportedDimension { dim });
        }
        if points.ncols() != r * s || weights.len() != r * s {
            return Err(SurfaceError::DimensionMismatch {
                expected: r * s,
                points: points.ncols(),
                weights: weights.len(),
            });
        }
        if let Some(i) = weights.iter().position(|&w| w <= 0.0) {
            return Err(SurfaceError::InvalidWeight { index: i, weight: weights[i] });
        }

        let mut Pw = MatD::zeros(dim + 1, r * s);
        for (c, mut col) in Pw.column_iter_mut().enumerate() {
            let w = weights[c];
            for row in 0..dim {
                col[row] = w * points[(row, c)];
            }
            col[dim] = w;
        }
        Ok(ControlNet { Pw, r, s })
    }

    /// Wraps an already-homogeneous `(dim+1) x (r*s)` matrix, e.g. the output
    /// of knot insertion on an existing valid net.
    pub(crate) fn from_homogeneous(Pw: MatD, r: usize, s: usize) -> Self {
        debug_assert_eq!(Pw.ncols(), r * s);
        ControlNet { Pw, r, s }
    }

    /// The Cartesian dimension of the control points (2 or 3).
    pub fn dimension(&self) -> usize {
        self.Pw.nrows() - 1
    }

    /// The number of control points in the u-direction.
    pub fn count_u(&self) -> usize {
        self.r
    }

    /// The number of control points in the v-direction.
    pub fn count_v(&self) -> usize {
        self.s
    }

    pub fn count(&self) -> usize {
        self.r * self.s
    }

    /// The homogeneous `(dim+1) x (r*s)` coordinate matrix.
    pub fn homogeneous(&self) -> &MatD {
        &self.Pw
    }

    /// The homogeneous coordinates of the point at grid position `(i, j)`.
    pub fn point_w(&self, i: usize, j: usize) -> VecDView {
        self.Pw.column(i + j * self.r)
    }

    /// The Cartesian coordinates of the point at grid position `(i, j)`.
    pub fn cartesian(&self, i: usize, j: usize) -> VecD {
        let dim = self.dimension();
        let col = self.point_w(i, j);
        let w = col[dim];
        col.rows(0, dim) / w
    }

    /// The weight of the point at grid position `(i, j)`.
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        let dim = self.dimension();
        self.point_w(i, j)[dim]
    }

    /// Returns the net with the roles of the two directions exchanged, so
    /// that position `(i, j)` maps to `(j, i)`.
    pub(crate) fn transposed(&self) -> Self {
        let mut Pw = MatD::zeros(self.Pw.nrows(), self.count());
        for j in 0..self.s {
            for i in 0..self.r {
                Pw.column_mut(j + i * self.s).copy_from(&self.point_w(i, j));
            }
        }
        ControlNet { Pw, r: self.s, s: self.r }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{dmatrix, dvector};

    use super::*;

    fn net_example() -> ControlNet {
        // 3 x 2 grid of 2D points (i, j).
        ControlNet::new(
            dmatrix![
                0., 1., 2., 0., 1., 2.;
                0., 0., 0., 1., 1., 1.;
            ],
            dvector![1., 1., 1., 2., 2., 2.],
            3,
            2,
        )
        .unwrap()
    }

    #[test]
    fn dimension() {
        assert_eq!(net_example().dimension(), 2);
    }

    #[test]
    fn counts() {
        let net = net_example();
        assert_eq!(net.count_u(), 3);
        assert_eq!(net.count_v(), 2);
        assert_eq!(net.count(), 6);
    }

    #[test]
    fn stores_weighted_homogeneous_coordinates() {
        let net = net_example();
        assert_eq!(net.point_w(2, 1).clone_owned(), dvector![4., 2., 2.]);
        assert_eq!(net.weight(2, 1), 2.0);
    }

    #[test]
    fn cartesian_roundtrip() {
        let net = net_example();
        for j in 0..2 {
            for i in 0..3 {
                assert_eq!(net.cartesian(i, j), dvector![i as f64, j as f64]);
            }
        }
    }

    #[test]
    fn transposed_swaps_grid_roles() {
        let net = net_example().transposed();
        assert_eq!(net.count_u(), 2);
        assert_eq!(net.count_v(), 3);
        assert_eq!(net.cartesian(1, 2), dvector![2., 1.]);
    }

    #[test]
    fn rejects_count_mismatch() {
        let res = ControlNet::new(dmatrix![0., 1.; 0., 0.;], dvector![1., 1.], 2, 2);
        assert_eq!(res.unwrap_err(), SurfaceError::DimensionMismatch { expected: 4, points: 2, weights: 2 });
    }

    #[test]
    fn rejects_non_positive_weight() {
        let res = ControlNet::new(dmatrix![0., 1.; 0., 0.;], dvector![1., 0.], 2, 1);
        assert_eq!(res.unwrap_err(), SurfaceError::InvalidWeight { index: 1, weight: 0.0 });
    }

    #[test]
    fn rejects_unsupported_dimension() {
        let res = ControlNet::new(dmatrix![0., 1.;], dvector![1., 1.], 2, 1);
        assert_eq!(res.unwrap_err(), SurfaceError::UnsupportedDimension { dim: 1 });
    }
}
