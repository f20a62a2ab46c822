//#![warn(missing_docs)]
#![allow(non_snake_case)]
//! **bsurfaces** is a library for rational tensor-product B-spline (NURBS)
//! surfaces and their derivatives based on [nalgebra].
//!
//! ## Features
//! - Create 2D and 3D [surfaces][surface::Surface] of arbitrary polynomial
//!   degrees `p` and `q` from clamped [knot vectors][surface::knots] and a
//!   weighted [control net][surface::points].
//! - [Surface evaluation][surface::Surface::evaluate] and exact mixed partial
//!   [derivatives][surface::Surface::derivatives] of any order.
//! - [Surface manipulation][manipulation]
//!   - [knot insertion][manipulation::insert]
//!   - [splitting][manipulation::split]
//! - [Differential geometry][geometry]: tangents, normals, the area jacobian,
//!   and adaptive [surface integration][geometry::integration].
//! - Built with [nalgebra](https://crates.io/crates/nalgebra) to store point
//!   data in contiguous arrays
//!
//! ## What are NURBS surfaces?
//!
//! A NURBS surface is a parametric function of two variables `(u, v)` mapping
//! the product of two finite intervals into 2D or 3D space. It is built as a
//! tensor product of piecewise polynomials of degrees `p` and `q`, blended by
//! rational weights. The piecewise definition keeps the polynomial degrees
//! low while allowing complex shapes, and the weights make exact conics such
//! as cylinders and spheres representable. Evaluations and manipulations are
//! fast and numerically stable because only a local `(p+1) x (q+1)` block of
//! control points influences any parameter pair.

//! ## Literature:
//! |            |                                                                                                                                        |
//! |-----------:|:---------------------------------------------------------------------------------------------------------------------------------------|
//! | Piegl1997  | Piegl, L., Tiller, W. The NURBS Book. Monographs in Visual Communication. Springer, Berlin, Heidelberg, 2nd ed., 1997.                 |
//! | Boehm1980  | Boehm, W., Inserting new knots into B-spline curves, Comput. Des., 12(4) (1980) 199–201.                                               |
//! | Lyness1969 | Lyness, J. N., Notes on the adaptive Simpson quadrature routine, J. ACM, 16(3) (1969) 483–495.                                         |

pub mod geometry;
pub mod manipulation;
pub mod surface;
pub mod types;
