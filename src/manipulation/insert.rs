//! Inserts additional knots into one parametric direction of a surface.
//!
//! The insertion follows Boehm's algorithm, generalized to the tensor
//! product: inserting into the u-knot-vector blends adjacent u-neighbours of
//! the homogeneous control net independently for every fixed v-index. The
//! returned surface evaluates to the same points and derivatives as the
//! input everywhere on the domain.

use thiserror::Error;

use crate::{
    surface::{knots::Knots, points::ControlNet, Surface},
    types::{MatD, VecD},
};

#[derive(Error, Debug, PartialEq)]
pub enum InsertError {
    #[error("Parameter `u = {u}` lies outside the open interval `({lower_bound}, {upper_bound})`.")]
    OutOfBounds { u: f64, lower_bound: f64, upper_bound: f64 },

    #[error(
        "The knot `u = {u}` has a multiplicity of {multiplicity} already. \
        Inserting it {times} more times would exceed the maximum multiplicity \
        `p+1 = {limit}` corresponding to the degree."
    )]
    MultiplicityExceeded { u: f64, multiplicity: usize, times: usize, limit: usize },
}

/// Returns the surface with `u` inserted `times` times into the u-knot-vector.
///
/// # Arguments
/// * `u` - The knot to be inserted; must lie strictly inside the u-domain.
/// * `times` - The number of insertions.
pub fn insert_u(surface: &Surface, u: f64, times: usize) -> Result<Surface, InsertError> {
    let p = surface.degree_u();

    if !surface.knots_u().is_interior(u) {
        let (lower_bound, upper_bound) = surface.knots_u().domain();
        return Err(InsertError::OutOfBounds { u, lower_bound, upper_bound });
    }

    let multiplicity = surface.knots_u().multiplicity(u);
    if multiplicity + times > p + 1 {
        return Err(InsertError::MultiplicityExceeded { u, multiplicity, times, limit: p + 1 });
    }

    let mut knots_u = surface.knots_u().clone();
    let mut Pw = surface.points().homogeneous().clone();
    let mut r = surface.points().count_u();
    let s = surface.points().count_v();

    for _ in 0..times {
        (knots_u, Pw) = insert_single(knots_u, Pw, r, s, u);
        r += 1;
    }

    Ok(Surface::from_parts_unchecked(
        knots_u,
        surface.knots_v().clone(),
        ControlNet::from_homogeneous(Pw, r, s),
    ))
}

/// Returns the surface with `v` inserted `times` times into the v-knot-vector.
///
/// See [`insert_u`].
pub fn insert_v(surface: &Surface, v: f64, times: usize) -> Result<Surface, InsertError> {
    Ok(insert_u(&surface.swapped(), v, times)?.swapped())
}

/// One Boehm insertion of `u` into an `r x s` homogeneous net.
///
/// Only the points `k-p+1` to `k-multiplicity` of every v-row change, where
/// `k` is the span containing `u`.
fn insert_single(knots: Knots, Pw: MatD, r: usize, s: usize, u: f64) -> (Knots, MatD) {
    let p = knots.degree();
    // Interiority was checked by the caller, so the span lookup cannot fail.
    let k = knots.find_span(u).expect("parameter inside the knot domain");
    let multiplicity = knots.multiplicity(u);
    let U = knots.vector();

    let mut alphas = vec![0.0; p + 1];
    for i in (k - p + 1)..=(k - multiplicity) {
        alphas[i - (k - p + 1)] = (u - U[i]) / (U[i + p] - U[i]);
    }

    let mut Pw_new = MatD::zeros(Pw.nrows(), (r + 1) * s);
    for j in 0..s {
        let old = |i: usize| Pw.column(i + j * r);

        for i in 0..=(k - p) {
            Pw_new.column_mut(i + j * (r + 1)).copy_from(&old(i));
        }
        for i in (k - p + 1)..=(k - multiplicity) {
            let alpha = alphas[i - (k - p + 1)];
            Pw_new
                .column_mut(i + j * (r + 1))
                .copy_from(&(alpha * old(i) + (1.0 - alpha) * old(i - 1)));
        }
        for i in (k - multiplicity + 1)..=r {
            Pw_new.column_mut(i + j * (r + 1)).copy_from(&old(i - 1));
        }
    }

    let U_new: VecD = U.clone().insert_row(k + 1, u);
    (Knots::from_vector_unchecked(p, U_new), Pw_new)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;
    use rstest::rstest;

    use crate::surface::test_surfaces::wave_surface;

    use super::*;

    fn parameter_grid() -> Vec<(f64, f64)> {
        let mut grid = Vec::new();
        for i in 0..=10 {
            for j in 0..=10 {
                grid.push((i as f64 / 10.0, j as f64 / 10.0));
            }
        }
        grid
    }

    #[test]
    fn extends_knot_vector_and_net() {
        let surface = wave_surface();
        let inserted = insert_u(&surface, 0.5, 1).unwrap();

        assert_eq!(
            inserted.knots_u().vector(),
            &dvector![0., 0., 0., 0.34, 0.5, 0.57, 0.86, 1., 1., 1.]
        );
        assert_eq!(inserted.knots_v(), surface.knots_v());
        assert_eq!(inserted.points().count_u(), surface.points().count_u() + 1);
        assert_eq!(inserted.points().count_v(), surface.points().count_v());
    }

    #[rstest(u, times, case(0.5, 1), case(0.2, 2), case(0.34, 1), case(0.86, 2))]
    fn preserves_shape_in_u(u: f64, times: usize) {
        let surface = wave_surface();
        let inserted = insert_u(&surface, u, times).unwrap();

        for &(a, b) in &parameter_grid() {
            assert_abs_diff_eq!(
                inserted.evaluate(a, b).unwrap(),
                surface.evaluate(a, b).unwrap(),
                epsilon = 1e-9
            );
        }
    }

    #[rstest(v, times, case(0.5, 1), case(0.124, 2))]
    fn preserves_shape_in_v(v: f64, times: usize) {
        let surface = wave_surface();
        let inserted = insert_v(&surface, v, times).unwrap();

        for &(a, b) in &parameter_grid() {
            assert_abs_diff_eq!(
                inserted.evaluate(a, b).unwrap(),
                surface.evaluate(a, b).unwrap(),
                epsilon = 1e-9
            );
        }
    }

    #[rstest(u, v, case(0.3, 0.7), case(0.5, 0.5))]
    fn preserves_derivatives(u: f64, v: f64) {
        let surface = wave_surface();
        let inserted = insert_u(&surface, 0.5, 1).unwrap();

        let skl_before = surface.derivatives(u, v, 2).unwrap();
        let skl_after = inserted.derivatives(u, v, 2).unwrap();
        for k in 0..=2 {
            for l in 0..=2 {
                assert_abs_diff_eq!(skl_before[k][l], skl_after[k][l], epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn repeated_insertion_up_to_full_multiplicity() {
        let surface = wave_surface();
        let p = surface.degree_u();

        // Inserting up to multiplicity p+1 is legal, one more is not.
        let full = insert_u(&surface, 0.5, p + 1).unwrap();
        assert_eq!(full.knots_u().multiplicity(0.5), p + 1);

        let res = insert_u(&full, 0.5, 1);
        assert_eq!(
            res.unwrap_err(),
            InsertError::MultiplicityExceeded { u: 0.5, multiplicity: p + 1, times: 1, limit: p + 1 }
        );
    }

    #[test]
    fn insertion_at_existing_knot_counts_its_multiplicity() {
        let surface = wave_surface();
        let res = insert_u(&surface, 0.34, 3);
        assert_eq!(
            res.unwrap_err(),
            InsertError::MultiplicityExceeded { u: 0.34, multiplicity: 1, times: 3, limit: 3 }
        );
    }

    #[rstest(u, case(0.0), case(1.0), case(-0.2), case(1.5))]
    fn rejects_boundary_and_outside_parameters(u: f64) {
        let surface = wave_surface();
        let res = insert_u(&surface, u, 1);
        assert_eq!(res.unwrap_err(), InsertError::OutOfBounds { u, lower_bound: 0.0, upper_bound: 1.0 });
    }
}
