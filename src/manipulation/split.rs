//! Splits a surface into two independent surfaces along an iso-parameter line.
//!
//! Splitting first raises the multiplicity of the split parameter to the
//! degree by [knot insertion][super::insert], which decouples the control
//! points on either side, and then partitions the knot vector and the control
//! net. Both halves are reparameterized onto the unit domain.

use thiserror::Error;

use super::insert::{insert_u, InsertError};
use crate::{
    surface::{knots, knots::Knots, points::ControlNet, Surface},
    types::{MatD, VecD},
};

#[derive(Error, Debug, PartialEq)]
pub enum SplitError {
    #[error("Parameter `u = {u}` lies outside the open interval `({lower_bound}, {upper_bound})`.")]
    OutOfBounds { u: f64, lower_bound: f64, upper_bound: f64 },

    #[error(
        "Cannot split at `u = {u}`: its multiplicity {multiplicity} exceeds \
        the degree `p = {p}`, so the surface is already disconnected there."
    )]
    MultiplicityTooHigh { u: f64, p: usize, multiplicity: usize },

    #[error(transparent)]
    Insert(#[from] InsertError),
}

/// Splits the surface at `u` into the part below and the part above.
///
/// Both returned surfaces carry u-knot-vectors normalized to `[0, 1]`, so the
/// lower part evaluates as `S(u * a, v)` and the upper part as
/// `S(u + (1 - u) * a, v)` for `a` in `[0, 1]`.
pub fn split_u(surface: &Surface, u: f64) -> Result<(Surface, Surface), SplitError> {
    let p = surface.degree_u();

    if !surface.knots_u().is_interior(u) {
        let (lower_bound, upper_bound) = surface.knots_u().domain();
        return Err(SplitError::OutOfBounds { u, lower_bound, upper_bound });
    }

    let multiplicity = surface.knots_u().multiplicity(u);
    if multiplicity > p {
        return Err(SplitError::MultiplicityTooHigh { u, p, multiplicity });
    }

    let refined = if multiplicity < p { insert_u(surface, u, p - multiplicity)? } else { surface.clone() };

    let U = refined.knots_u().vector();
    // Interiority is unaffected by the refinement, so the lookup cannot fail.
    let k = refined.knots_u().find_span(u).expect("parameter inside the knot domain");

    let mut U_left: VecD = U.rows(0, k + 1).into_owned().insert_row(k + 1, u);
    let mut U_right: VecD = U.rows(k - p + 1, U.len() - (k - p + 1)).into_owned().insert_row(0, u);
    knots::normalize(&mut U_left);
    knots::normalize(&mut U_right);

    let r_left = U_left.len() - p - 1;
    let r_right = U_right.len() - p - 1;
    let (Pw_left, Pw_right) = partition_net(refined.points(), r_left, r_right);

    let common_v = refined.knots_v().clone();
    let lower = Surface::from_parts_unchecked(
        Knots::from_vector_unchecked(p, U_left),
        common_v.clone(),
        ControlNet::from_homogeneous(Pw_left, r_left, refined.points().count_v()),
    );
    let upper = Surface::from_parts_unchecked(
        Knots::from_vector_unchecked(p, U_right),
        common_v,
        ControlNet::from_homogeneous(Pw_right, r_right, refined.points().count_v()),
    );
    Ok((lower, upper))
}

/// Splits the surface at `v` into the part below and the part above.
///
/// See [`split_u`].
pub fn split_v(surface: &Surface, v: f64) -> Result<(Surface, Surface), SplitError> {
    let (lower, upper) = split_u(&surface.swapped(), v)?;
    Ok((lower.swapped(), upper.swapped()))
}

/// Copies the first `r_left` and the last `r_right` u-columns of every v-row
/// into two new homogeneous nets. The column on the split line is shared.
fn partition_net(points: &ControlNet, r_left: usize, r_right: usize) -> (MatD, MatD) {
    let Pw = points.homogeneous();
    let (r, s) = (points.count_u(), points.count_v());

    let mut Pw_left = MatD::zeros(Pw.nrows(), r_left * s);
    let mut Pw_right = MatD::zeros(Pw.nrows(), r_right * s);
    for j in 0..s {
        for i in 0..r_left {
            Pw_left.column_mut(i + j * r_left).copy_from(&Pw.column(i + j * r));
        }
        for i in 0..r_right {
            Pw_right.column_mut(i + j * r_right).copy_from(&Pw.column((r - r_right + i) + j * r));
        }
    }
    (Pw_left, Pw_right)
}
