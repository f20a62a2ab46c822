//! Implements shape-preserving manipulations of a surface.
//!
//! All manipulations consume the surface by reference and return new,
//! independently owned surfaces evaluating to the same image.

pub mod insert;
pub mod split;
