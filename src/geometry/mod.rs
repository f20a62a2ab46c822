//! Differential geometry of a surface: tangents, normals, the area jacobian
//! and [surface integrals][integration].
//!
//! All quantities derive from the first-order partial derivatives
//! `S_u = ∂S/∂u` and `S_v = ∂S/∂v` and the first fundamental form
//!
//! `E = S_u · S_u`, `F = S_u · S_v`, `G = S_v · S_v`.

use thiserror::Error;

use crate::{
    surface::{Surface, SurfaceError},
    types::VecD,
};

pub mod integration;

pub use integration::{integrate, Tolerance, MAX_DEPTH};

/// The squared-norm threshold below which a cross product of tangents is
/// treated as vanishing.
const DEGENERACY_EPS: f64 = 1e-12;

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("Surface normals are only defined for 3-dimensional surfaces, got dimension {dim}.")]
    DimensionMismatch { dim: usize },

    #[error(
        "The quadrature did not reach the requested tolerance within \
        {max_depth} levels of interval refinement."
    )]
    QuadratureDepthExceeded { max_depth: usize },
}

/// The unit surface normal at a parameter pair, with a degeneracy marker.
///
/// At parameter values where the tangents are parallel or vanish (e.g. on a
/// collapsed edge of the control net) no normal direction exists. This is a
/// property of the point, not a failure of the query, so it is reported as
/// `degenerate = true` with a zero vector instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceNormal {
    pub vector: VecD,
    pub degenerate: bool,
}

/// Returns the surface point and the first partial derivatives
/// `(S, S_u, S_v)` at `(u, v)` from a single derivative evaluation.
pub fn tangents(surface: &Surface, u: f64, v: f64) -> Result<(VecD, VecD, VecD), GeometryError> {
    let mut skl = surface.derivatives(u, v, 1)?;
    let tangent_v = skl[0].remove(1);
    let tangent_u = skl[1].remove(0);
    let point = skl[0].remove(0);
    Ok((point, tangent_u, tangent_v))
}

/// Returns the unit normal `S_u x S_v / |S_u x S_v|` at `(u, v)`.
///
/// # Errors
///
/// [`GeometryError::DimensionMismatch`] for 2-dimensional surfaces, which
/// have no normal within their plane.
pub fn normal(surface: &Surface, u: f64, v: f64) -> Result<SurfaceNormal, GeometryError> {
    let dim = surface.dimension();
    if dim != 3 {
        return Err(GeometryError::DimensionMismatch { dim });
    }

    let (_, su, sv) = tangents(surface, u, v)?;
    let cross = su.cross(&sv);
    if cross.norm_squared() <= DEGENERACY_EPS {
        return Ok(SurfaceNormal { vector: VecD::zeros(dim), degenerate: true });
    }
    let norm = cross.norm();
    Ok(SurfaceNormal { vector: cross / norm, degenerate: false })
}

/// Returns the area jacobian `sqrt(E G - F^2)` at `(u, v)`.
///
/// This is the local area-scaling factor of the parameterization; it
/// vanishes exactly where the surface is degenerate.
pub fn jacobian(surface: &Surface, u: f64, v: f64) -> Result<f64, GeometryError> {
    let (_, su, sv) = tangents(surface, u, v)?;
    Ok(jacobian_of(&su, &sv))
}

/// The area jacobian from precomputed tangents. Rounding can push the
/// discriminant slightly negative at degenerate points, so it is clamped.
pub(crate) fn jacobian_of(su: &VecD, sv: &VecD) -> f64 {
    let e = su.dot(su);
    let f = su.dot(sv);
    let g = sv.dot(sv);
    (e * g - f * f).max(0.0).sqrt()
}
