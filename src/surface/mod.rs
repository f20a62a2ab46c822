//! Implements the rational tensor-product B-spline surface.
//!
//! A NURBS surface of degrees `p` and `q` maps a parameter pair `(u, v)`
//! from the product of the two knot-vector domains to a Cartesian point
//!
//! `S(u, v) = Σ_i Σ_j N_{i,p}(u) N_{j,q}(v) w_{ij} P_{ij} / Σ_i Σ_j N_{i,p}(u) N_{j,q}(v) w_{ij}`
//!
//! with the
//! - [knot vectors][knots] `U`, `V` of the two parametric directions,
//! - [spline basis functions][basis] `N` defined by them, and
//! - `r x s` [weighted control points][points] `P`, `w`.
//!
//! A surface is validated on construction and immutable afterwards.
//! Manipulations ([knot insertion][crate::manipulation::insert] and
//! [splitting][crate::manipulation::split]) return new, independently owned
//! surfaces.

use thiserror::Error;

use crate::{
    manipulation::{
        insert::{insert_u, insert_v, InsertError},
        split::{split_u, split_v, SplitError},
    },
    surface::{knots::KnotError, knots::Knots, points::ControlNet},
    types::{DerivativeGrid, MatD, VecD},
};

pub mod basis;
pub mod knots;
pub mod points;

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    knots_u: Knots,
    knots_v: Knots,
    points: ControlNet,
}

#[derive(Error, Debug, PartialEq)]
pub enum SurfaceError {
    #[error(transparent)]
    Knots(#[from] KnotError),

    #[error(
        "Expected {expected} control points and weights, \
        got {points} points and {weights} weights."
    )]
    DimensionMismatch { expected: usize, points: usize, weights: usize },

    #[error("Control points must be 2- or 3-dimensional, got dimension {dim}.")]
    UnsupportedDimension { dim: usize },

    #[error("Control point weights must be strictly positive, but weight {index} is {weight}.")]
    InvalidWeight { index: usize, weight: f64 },

    #[error(
        "The knot vectors support {expected_u} x {expected_v} control points, \
        but the net holds {got_u} x {got_v}."
    )]
    NetMismatch { expected_u: usize, expected_v: usize, got_u: usize, got_v: usize },

    #[error("The accumulated weight vanishes at `(u, v) = ({u}, {v})`; the surface is not evaluable there.")]
    NonInvertibleWeight { u: f64, v: f64 },
}

impl Surface {
    /// Returns a NURBS surface from two validated knot vectors and a control net.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::NetMismatch`] if the net shape does not satisfy
    /// `r = m_u - p` and `s = m_v - q`.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::{dmatrix, dvector};
    /// use bsurfaces::surface::{knots::Knots, points::ControlNet, Surface};
    ///
    /// // A flat bilinear patch over the unit square.
    /// let surface = Surface::new(
    ///     Knots::new(1, dvector![0., 0., 1., 1.]).unwrap(),
    ///     Knots::new(1, dvector![0., 0., 1., 1.]).unwrap(),
    ///     ControlNet::new(
    ///         dmatrix![
    ///             0., 1., 0., 1.;
    ///             0., 0., 1., 1.;
    ///             0., 0., 0., 0.;
    ///         ],
    ///         dvector![1., 1., 1., 1.],
    ///         2,
    ///         2,
    ///     )
    ///     .unwrap(),
    /// )
    /// .unwrap();
    /// assert_eq!(surface.evaluate(0.5, 0.5).unwrap(), dvector![0.5, 0.5, 0.]);
    /// ```
    pub fn new(knots_u: Knots, knots_v: Knots, points: ControlNet) -> Result<Self, SurfaceError> {
        let (expected_u, expected_v) = (knots_u.count(), knots_v.count());
        let (got_u, got_v) = (points.count_u(), points.count_v());

        if expected_u != got_u || expected_v != got_v {
            return Err(SurfaceError::NetMismatch { expected_u, expected_v, got_u, got_v });
        }
        Ok(Self { knots_u, knots_v, points })
    }

    pub fn degree_u(&self) -> usize {
        self.knots_u.degree()
    }

    pub fn degree_v(&self) -> usize {
        self.knots_v.degree()
    }

    pub fn knots_u(&self) -> &Knots {
        &self.knots_u
    }

    pub fn knots_v(&self) -> &Knots {
        &self.knots_v
    }

    pub fn points(&self) -> &ControlNet {
        &self.points
    }

    /// Returns the Cartesian dimension of the surface.
    pub fn dimension(&self) -> usize {
        self.points.dimension()
    }

    /// Evaluates the surface point at `(u, v)`.
    pub fn evaluate(&self, u: f64, v: f64) -> Result<VecD, SurfaceError> {
        let p = self.degree_u();
        let q = self.degree_v();

        let span_u = self.knots_u.find_span(u)?;
        let span_v = self.knots_v.find_span(v)?;

        let funs_u = basis::basis_funs(&self.knots_u, span_u, u);
        let funs_v = basis::basis_funs(&self.knots_v, span_v, v);

        let dim = self.dimension();
        let mut point_w = VecD::zeros(dim + 1);

        for j in 0..=q {
            let basis_v = funs_v[j];
            for i in 0..=p {
                point_w += basis_v * funs_u[i] * self.points.point_w(span_u - p + i, span_v - q + j);
            }
        }

        let w = point_w[dim];
        if w.abs() <= f64::EPSILON {
            return Err(SurfaceError::NonInvertibleWeight { u, v });
        }
        Ok(point_w.rows(0, dim) / w)
    }

    /// Evaluates the surface at a list of parameter pairs, preserving order.
    pub fn evaluate_many(&self, params: &[(f64, f64)]) -> Result<Vec<VecD>, SurfaceError> {
        params.iter().map(|&(u, v)| self.evaluate(u, v)).collect()
    }

    /// Evaluates all mixed Cartesian partial derivatives `SKL[k][l]` for
    /// `k, l <= max_order` at `(u, v)`.
    ///
    /// The homogeneous tensor-product derivatives and the weight derivatives
    /// are computed independently per direction and combined by the
    /// generalized quotient rule in increasing total order, so that rational
    /// mixed derivatives of any order come out exactly [Piegl1997, A4.4].
    /// `SKL[0][0]` equals [`Surface::evaluate`]; components of order beyond
    /// the degree vanish for non-rational surfaces.
    pub fn derivatives(&self, u: f64, v: f64, max_order: usize) -> Result<DerivativeGrid, SurfaceError> {
        let p = self.degree_u();
        let q = self.degree_v();
        let d = max_order;

        let span_u = self.knots_u.find_span(u)?;
        let span_v = self.knots_v.find_span(v)?;

        let ders_u = basis::ders_basis_funs(&self.knots_u, span_u, u, d);
        let ders_v = basis::ders_basis_funs(&self.knots_v, span_v, v, d);

        let dim = self.dimension();

        // Homogeneous derivatives A^(k,l); rows beyond the degree stay zero.
        let mut aders: Vec<Vec<VecD>> = vec![vec![VecD::zeros(dim + 1); d + 1]; d + 1];
        for k in 0..=d.min(p) {
            for l in 0..=d.min(q) {
                let target = &mut aders[k][l];
                for j in 0..=q {
                    let basis_v = ders_v[(l, j)];
                    for i in 0..=p {
                        *target +=
                            basis_v * ders_u[(k, i)] * self.points.point_w(span_u - p + i, span_v - q + j);
                    }
                }
            }
        }

        let w00 = aders[0][0][dim];
        if w00.abs() <= f64::EPSILON {
            return Err(SurfaceError::NonInvertibleWeight { u, v });
        }

        let binom = binomials(d);

        // Peel the weight off order by order; every summand only refers to
        // derivatives of strictly lower total order.
        let mut skl: DerivativeGrid = vec![vec![VecD::zeros(dim); d + 1]; d + 1];
        for k in 0..=d {
            for l in 0..=d {
                let mut acc = aders[k][l].rows(0, dim).clone_owned();
                for i in 0..=k {
                    for j in 0..=l {
                        if i == 0 && j == 0 {
                            continue;
                        }
                        let coeff = binom[(k, i)] * binom[(l, j)] * aders[i][j][dim];
                        acc -= coeff * &skl[k - i][l - j];
                    }
                }
                skl[k][l] = acc / w00;
            }
        }
        Ok(skl)
    }

    /// Assembles a surface from parts whose invariants are already
    /// guaranteed, e.g. the output of knot insertion on a valid surface.
    pub(crate) fn from_parts_unchecked(knots_u: Knots, knots_v: Knots, points: ControlNet) -> Self {
        debug_assert_eq!(knots_u.count(), points.count_u());
        debug_assert_eq!(knots_v.count(), points.count_v());
        Self { knots_u, knots_v, points }
    }

    /// Returns the surface with `u` inserted `times` times into the u-knot-vector.
    ///
    /// See [`insert_u`].
    pub fn insert_knot_u(&self, u: f64, times: usize) -> Result<Self, InsertError> {
        insert_u(self, u, times)
    }

    /// Returns the surface with `v` inserted `times` times into the v-knot-vector.
    ///
    /// See [`insert_v`].
    pub fn insert_knot_v(&self, v: f64, times: usize) -> Result<Self, InsertError> {
        insert_v(self, v, times)
    }

    /// Splits the surface into two at the parameter `u`.
    ///
    /// See [`split_u`].
    pub fn split_at_u(&self, u: f64) -> Result<(Self, Self), SplitError> {
        split_u(self, u)
    }

    /// Splits the surface into two at the parameter `v`.
    ///
    /// See [`split_v`].
    pub fn split_at_v(&self, v: f64) -> Result<(Self, Self), SplitError> {
        split_v(self, v)
    }

    /// Returns the surface with the roles of the parametric directions
    /// exchanged: `S'(u, v) = S(v, u)`. The image is unchanged, which lets
    /// the v-direction manipulations reuse their u-direction counterparts.
    pub(crate) fn swapped(&self) -> Self {
        Surface {
            knots_u: self.knots_v.clone(),
            knots_v: self.knots_u.clone(),
            points: self.points.transposed(),
        }
    }
}

/// Returns the Pascal triangle of binomial coefficients up to `C(n, n)`.
fn binomials(n: usize) -> MatD {
    let mut binom = MatD::zeros(n + 1, n + 1);
    for i in 0..=n {
        binom[(i, 0)] = 1.0;
        binom[(i, i)] = 1.0;
    }
    for i in 2..=n {
        for k in 1..i {
            binom[(i, k)] = binom[(i - 1, k - 1)] + binom[(i - 1, k)];
        }
    }
    binom
}
