//! Integrates scalar fields over a surface with adaptive quadrature.
//!
//! The integral `∫∫ f(S(u, v)) √(E G - F²) du dv` is evaluated as a nested
//! one-dimensional quadrature: an outer adaptive Simpson rule over the
//! u-domain whose integrand is itself an adaptive Simpson integral over the
//! v-domain. Each inner sample costs one first-order derivative evaluation,
//! which yields the surface point and the area jacobian at once.
//!
//! Intervals are refined until the Richardson error estimate of the Simpson
//! rule satisfies the [`Tolerance`]; refinement beyond [`MAX_DEPTH`] levels
//! aborts with [`GeometryError::QuadratureDepthExceeded`].

use super::{jacobian_of, GeometryError};
use crate::{surface::Surface, types::VecD};

/// The maximum number of interval-halving levels of the adaptive quadrature.
pub const MAX_DEPTH: usize = 32;

/// The termination criterion of the adaptive quadrature.
///
/// An interval is accepted once its error estimate drops below
/// `max(absolute, relative * |integral|)`. The absolute part is distributed
/// over subintervals, so the bound holds for the total integral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance { absolute: 1e-6, relative: 1e-6 }
    }
}

/// Integrates `integrand` over the surface with respect to the area measure.
///
/// # Arguments
///
/// * `integrand` - the scalar field, evaluated at Cartesian surface points.
///   The constant `|_| 1.0` yields the surface area.
/// * `tol` - the termination criterion, applied per parametric direction.
///
/// # Examples
/// ```
/// use bsurfaces::geometry::{integrate, Tolerance};
/// # use nalgebra::{dmatrix, dvector};
/// # use bsurfaces::surface::{knots::Knots, points::ControlNet, Surface};
/// # let surface = Surface::new(
/// #     Knots::new(1, dvector![0., 0., 1., 1.]).unwrap(),
/// #     Knots::new(1, dvector![0., 0., 1., 1.]).unwrap(),
/// #     ControlNet::new(
/// #         dmatrix![0., 1., 0., 1.; 0., 0., 1., 1.; 0., 0., 0., 0.;],
/// #         dvector![1., 1., 1., 1.],
/// #         2,
/// #         2,
/// #     ).unwrap(),
/// # ).unwrap();
/// let area = integrate(&surface, |_| 1.0, Tolerance::default()).unwrap();
/// assert!((area - 1.0).abs() < 1e-9);
/// ```
pub fn integrate(
    surface: &Surface,
    integrand: impl Fn(&VecD) -> f64,
    tol: Tolerance,
) -> Result<f64, GeometryError> {
    let (u_lo, u_hi) = surface.knots_u().domain();
    let (v_lo, v_hi) = surface.knots_v().domain();

    let outer = |u: f64| {
        let inner = |v: f64| {
            let mut skl = surface.derivatives(u, v, 1)?;
            let tangent_v = skl[0].remove(1);
            let tangent_u = skl[1].remove(0);
            let point = skl[0].remove(0);
            Ok(jacobian_of(&tangent_u, &tangent_v) * integrand(&point))
        };
        adaptive_simpson(&inner, v_lo, v_hi, tol)
    };
    adaptive_simpson(&outer, u_lo, u_hi, tol)
}

fn adaptive_simpson<F>(f: &F, a: f64, b: f64, tol: Tolerance) -> Result<f64, GeometryError>
where
    F: Fn(f64) -> Result<f64, GeometryError>,
{
    let m = 0.5 * (a + b);
    let fa = f(a)?;
    let fm = f(m)?;
    let fb = f(b)?;
    let whole = simpson(a, b, fa, fm, fb);
    refine(f, a, b, fa, fm, fb, whole, tol, MAX_DEPTH)
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn refine<F>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tol: Tolerance,
    depth: usize,
) -> Result<f64, GeometryError>
where
    F: Fn(f64) -> Result<f64, GeometryError>,
{
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm)?;
    let frm = f(rm)?;

    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;

    // The Simpson error of the halved intervals is delta/15 [Richardson].
    if delta.abs() <= 15.0 * tol.absolute.max(tol.relative * (left + right).abs()) {
        return Ok(left + right + delta / 15.0);
    }
    if depth == 0 {
        return Err(GeometryError::QuadratureDepthExceeded { max_depth: MAX_DEPTH });
    }

    let half = Tolerance { absolute: 0.5 * tol.absolute, ..tol };
    Ok(refine(f, a, m, fa, flm, fm, left, half, depth - 1)?
        + refine(f, m, b, fm, frm, fb, right, half, depth - 1)?)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;
    use rstest::rstest;

    use crate::surface::test_surfaces::{flat_unit_patch, grid_surface, quarter_cylinder, wave_surface};

    use super::*;

    #[test]
    fn area_of_flat_unit_patch() {
        let area = integrate(&flat_unit_patch(), |_| 1.0, Tolerance::default()).unwrap();
        assert_relative_eq!(area, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn area_of_stretched_patch() {
        let surface = grid_surface(
            1,
            1,
            dvector![0., 0., 1., 1.],
            dvector![0., 0., 1., 1.],
            |i, j| [2.0 * i as f64, 3.0 * j as f64, 0.0],
            None,
        );
        let area = integrate(&surface, |_| 1.0, Tolerance::default()).unwrap();
        assert_relative_eq!(area, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn area_of_quarter_cylinder() {
        // A quarter circle of radius one extruded over a unit height.
        let area = integrate(&quarter_cylinder(), |_| 1.0, Tolerance::default()).unwrap();
        assert_relative_eq!(area, std::f64::consts::FRAC_PI_2, epsilon = 1e-6);
    }

    #[test]
    fn weighted_field_over_flat_patch() {
        // ∫∫ u du dv over the unit square.
        let integral = integrate(&flat_unit_patch(), |p| p[0], Tolerance::default()).unwrap();
        assert_relative_eq!(integral, 0.5, epsilon = 1e-9);
    }

    #[rstest(coarse, fine, case(1e-3, 1e-4), case(1e-4, 1e-6))]
    fn tightening_the_tolerance_converges(coarse: f64, fine: f64) {
        let surface = wave_surface();
        let field = |p: &crate::types::VecD| p[0] * p[1] * p[2] * p[1].exp() / 500.0;

        let rough = integrate(&surface, field, Tolerance { absolute: coarse, relative: coarse }).unwrap();
        let tight = integrate(&surface, field, Tolerance { absolute: fine, relative: fine }).unwrap();

        assert!(rough.is_finite());
        assert_relative_eq!(rough, tight, max_relative = 1e-2);
    }

    #[test]
    fn unreachable_tolerance_exceeds_depth() {
        let res = integrate(&wave_surface(), |_| 1.0, Tolerance { absolute: 0.0, relative: 0.0 });
        assert_eq!(res.unwrap_err(), GeometryError::QuadratureDepthExceeded { max_depth: MAX_DEPTH });
    }
}
