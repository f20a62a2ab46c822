//! Implements the knot vector defining the [spline basis functions][super::basis]
//! of one parametric direction.
//!
//! A knot vector for a clamped direction of degree `p` with `r` control points
//! consists of `m+1 = r+p+1` scalar values in ascending order, with the first
//! and last value repeated `p+1` times. The interval `[U_p, U_{m-p}]` is
//! called the 'domain'.
//!
//! Knot comparisons are tolerant: two knots within [`KNOT_ULPS`] units in the
//! last place are considered equal.

use approx::ulps_eq;
use thiserror::Error;

use crate::types::VecD;

/// The tolerance with which two knots are considered equal.
pub const KNOT_ULPS: u32 = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct Knots {
    U: VecD,
    p: usize,
}

#[derive(Error, Debug, PartialEq)]
pub enum KnotError {
    #[error("The knot vector is not in non-decreasing order at index {index}.")]
    NotSorted { index: usize },

    #[error(
        "A clamped knot vector of degree `p = {p}` must repeat its first and \
        last value `p+1` times, but the multiplicity at the {end} end is {multiplicity}."
    )]
    NotClamped { p: usize, end: &'static str, multiplicity: usize },

    #[error(
        "The interior knot `u = {u}` has multiplicity {multiplicity}, \
        exceeding the maximum of `p+1 = {limit}`."
    )]
    MultiplicityTooHigh { u: f64, multiplicity: usize, limit: usize },

    #[error("A knot vector of degree `p = {p}` requires at least `2(p+1) = {required}` knots, got {len}.")]
    TooShort { p: usize, required: usize, len: usize },

    #[error("Parameter `u = {u}` lies outside the interval `[{lower_bound}, {upper_bound}]`.")]
    ParameterOutOfBounds { u: f64, lower_bound: f64, upper_bound: f64 },
}

/// Tolerant less-than for knots.
pub(crate) fn knot_lt(u1: f64, u2: f64) -> bool {
    u1 < u2 && !knot_eq(u1, u2)
}

/// Tolerant equality for knots.
pub(crate) fn knot_eq(u1: f64, u2: f64) -> bool {
    ulps_eq!(u1, u2, max_ulps = KNOT_ULPS)
}

/// Returns the index at which `u` would be inserted into the sorted slice to
/// keep it sorted, placing `u` after any tolerantly-equal run.
fn upper_bound(arr: &[f64], u: f64) -> usize {
    let comp = |val: &f64| {
        if *val < u || knot_eq(*val, u) {
            std::cmp::Ordering::Less
        } else {
            std::cmp::Ordering::Greater
        }
    };
    arr.binary_search_by(comp).unwrap_or_else(|index| index)
}

impl Knots {
    /// Returns a validated clamped knot vector of the given degree.
    ///
    /// # Errors
    ///
    /// - [`KnotError::TooShort`] if fewer than `2(p+1)` knots are supplied.
    /// - [`KnotError::NotSorted`] if the sequence decreases anywhere.
    /// - [`KnotError::NotClamped`] if either end value is repeated fewer than `p+1` times.
    /// - [`KnotError::MultiplicityTooHigh`] if any interior value is repeated more than `p+1` times.
    pub fn new(degree: usize, vector: VecD) -> Result<Self, KnotError> {
        let p = degree;
        let len = vector.len();
        let required = 2 * (p + 1);

        if len < required {
            return Err(KnotError::TooShort { p, required, len });
        }

        for i in 0..len - 1 {
            if vector[i] > vector[i + 1] && !knot_eq(vector[i], vector[i + 1]) {
                return Err(KnotError::NotSorted { index: i + 1 });
            }
        }

        let head_mult = vector.iter().take_while(|&&u| knot_eq(u, vector[0])).count();
        if head_mult < p + 1 {
            return Err(KnotError::NotClamped { p, end: "lower", multiplicity: head_mult });
        }

        let tail_mult = vector.iter().rev().take_while(|&&u| knot_eq(u, vector[len - 1])).count();
        if tail_mult < p + 1 {
            return Err(KnotError::NotClamped { p, end: "upper", multiplicity: tail_mult });
        }

        let knots = Knots { U: vector, p };
        for (u, multiplicity) in knots.multiplicities() {
            if knots.is_interior(u) && multiplicity > p + 1 {
                return Err(KnotError::MultiplicityTooHigh { u, multiplicity, limit: p + 1 });
            }
        }
        Ok(knots)
    }

    /// Wraps a knot vector whose invariants are already guaranteed, e.g. one
    /// produced by knot insertion from an existing valid vector.
    pub(crate) fn from_vector_unchecked(degree: usize, vector: VecD) -> Self {
        Knots { U: vector, p: degree }
    }

    pub fn vector(&self) -> &VecD {
        &self.U
    }

    pub fn degree(&self) -> usize {
        self.p
    }

    pub fn len(&self) -> usize {
        self.U.len()
    }

    pub fn is_empty(&self) -> bool {
        self.U.is_empty()
    }

    /// The number of basis functions (and of control points) this vector supports.
    pub fn count(&self) -> usize {
        self.len() - self.p - 1
    }

    /// The closed parameter interval `[U_p, U_{m-p}]` on which evaluation is defined.
    pub fn domain(&self) -> (f64, f64) {
        (self.U[self.p], self.U[self.len() - 1 - self.p])
    }

    pub fn contains(&self, u: f64) -> bool {
        let (lo, hi) = self.domain();
        (u > lo || knot_eq(u, lo)) && (u < hi || knot_eq(u, hi))
    }

    /// Whether `u` lies strictly inside the open domain interior.
    pub fn is_interior(&self, u: f64) -> bool {
        let (lo, hi) = self.domain();
        knot_lt(lo, u) && knot_lt(u, hi)
    }

    /// Returns the span index `i` such that `U_i <= u < U_{i+1}`.
    ///
    /// At the closed upper boundary `u = U_{m-p}` the last non-empty span is
    /// returned so that evaluation remains defined there.
    pub fn find_span(&self, u: f64) -> Result<usize, KnotError> {
        if !self.contains(u) {
            let (lower_bound, upper_bound) = self.domain();
            return Err(KnotError::ParameterOutOfBounds { u, lower_bound, upper_bound });
        }

        let last = self.len() - 1 - self.p;
        if knot_eq(u, self.U[last]) {
            // Walk left over any repeated upper knots onto the last non-empty span.
            let mut i = last - 1;
            while i > self.p && knot_eq(self.U[i], u) {
                i -= 1;
            }
            return Ok(i);
        }

        let low = self.p;
        let idx = upper_bound(&self.U.as_slice()[low..], u) + low;
        Ok(idx - 1)
    }

    /// Counts the tolerant repeats of `u` in the knot vector.
    pub fn multiplicity(&self, u: f64) -> usize {
        self.U.iter().filter(|&&x| knot_eq(x, u)).count()
    }

    /// Returns the run-length list of distinct knot values and their multiplicities.
    pub fn multiplicities(&self) -> Vec<(f64, usize)> {
        let mut out: Vec<(f64, usize)> = Vec::new();

        for &u in self.U.iter() {
            match out.last_mut() {
                Some((value, multiplicity)) if knot_eq(*value, u) => *multiplicity += 1,
                _ => out.push((u, 1)),
            }
        }
        out
    }

    /// Whether the domain is the unit interval `[0, 1]`, tolerantly.
    pub fn is_normed(&self) -> bool {
        let (lo, hi) = self.domain();
        knot_eq(lo, 0.0) && knot_eq(hi, 1.0)
    }

    /// Rescales the knot vector onto `[0, 1]`.
    pub fn normalize(&mut self) -> &mut Self {
        normalize(&mut self.U);
        self
    }
}

pub fn is_sorted(knots: &VecD) -> bool {
    let mut it = knots.iter();
    match it.next() {
        None => true,
        Some(first) => it
            .scan(first, |state, next| {
                let cmp = *state <= next;
                *state = next;
                Some(cmp)
            })
            .all(|b| b),
    }
}

pub fn is_clamped(knots: &VecD, degree: usize) -> bool {
    let clamp_size = degree + 1;

    let first = knots[0];
    let last = knots[knots.len() - 1];
    let is_head_clamped = knots.iter().take(clamp_size).all(|&u| knot_eq(u, first));
    let is_tail_clamped = knots.iter().rev().take(clamp_size).all(|&u| knot_eq(u, last));

    is_head_clamped && is_tail_clamped
}

pub fn normalize(knots: &mut VecD) {
    let old_lim = (knots.min(), knots.max());

    rescale(knots, old_lim, (0.0, 1.0))
}

pub fn rescale(knots: &mut VecD, old_lim: (f64, f64), new_lim: (f64, f64)) {
    let n = knots.len();
    *knots -= VecD::repeat(n, old_lim.0);
    *knots /= old_lim.1 - old_lim.0;
    *knots *= new_lim.1 - new_lim.0;
    *knots += VecD::repeat(n, new_lim.0);
}

#[cfg(test)]
mod tests {
    use nalgebra::dvector;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    /// A degree-two clamped knot vector with three internal knots.
    fn knots() -> Knots {
        Knots::new(2, dvector![0., 0., 0., 0.25, 0.5, 0.75, 1., 1., 1.]).unwrap()
    }

    #[rstest]
    fn count(knots: Knots) {
        assert_eq!(knots.count(), 6);
    }

    #[rstest]
    fn domain(knots: Knots) {
        assert_eq!(knots.domain(), (0.0, 1.0));
    }

    #[test]
    fn rejects_unsorted() {
        let res = Knots::new(1, dvector![0., 0., 0.5, 0.4, 1., 1.]);
        assert_eq!(res.unwrap_err(), KnotError::NotSorted { index: 3 });
    }

    #[test]
    fn rejects_unclamped() {
        let res = Knots::new(2, dvector![0., 0., 0.25, 0.5, 0.75, 1., 1., 1.]);
        assert_eq!(res.unwrap_err(), KnotError::NotClamped { p: 2, end: "lower", multiplicity: 2 });

        let res = Knots::new(2, dvector![0., 0., 0., 0.25, 0.5, 0.75, 1., 1.]);
        assert_eq!(res.unwrap_err(), KnotError::NotClamped { p: 2, end: "upper", multiplicity: 2 });
    }

    #[test]
    fn rejects_too_short() {
        let res = Knots::new(2, dvector![0., 0., 0., 1., 1.]);
        assert_eq!(res.unwrap_err(), KnotError::TooShort { p: 2, required: 6, len: 5 });
    }

    #[test]
    fn rejects_excessive_interior_multiplicity() {
        let res = Knots::new(1, dvector![0., 0., 0.5, 0.5, 0.5, 1., 1.]);
        assert_eq!(res.unwrap_err(), KnotError::MultiplicityTooHigh { u: 0.5, multiplicity: 3, limit: 2 });
    }

    #[test]
    fn accepts_full_interior_multiplicity() {
        // p+1 repeats disconnect the surface but remain a valid modeling state.
        assert!(Knots::new(1, dvector![0., 0., 0.5, 0.5, 1., 1.]).is_ok());
    }

    #[rstest(
        u,
        expected,
        case(0.0, 2),
        case(0.1, 2),
        case(0.25, 3),
        case(0.3, 3),
        case(0.5, 4),
        case(0.75, 5),
        case(0.99, 5),
        case(1.0, 5)
    )]
    fn find_span(knots: Knots, u: f64, expected: usize) {
        assert_eq!(knots.find_span(u).unwrap(), expected);
    }

    #[test]
    fn find_span_upper_boundary_with_repeats() {
        // An interior knot repeated up to the boundary must not yield an empty span.
        let knots = Knots::new(2, dvector![0., 0., 0., 0.5, 0.5, 1., 1., 1.]).unwrap();
        assert_eq!(knots.find_span(1.0).unwrap(), 4);
    }

    #[rstest(u, case(-0.1), case(1.1))]
    fn find_span_out_of_domain(knots: Knots, u: f64) {
        assert_eq!(
            knots.find_span(u),
            Err(KnotError::ParameterOutOfBounds { u, lower_bound: 0.0, upper_bound: 1.0 })
        );
    }

    #[test]
    fn multiplicity() {
        let knots = Knots::new(2, dvector![0., 0., 0., 0.25, 0.5, 0.5, 0.75, 1., 1., 1.]).unwrap();

        assert_eq!(knots.multiplicity(0.2), 0);
        assert_eq!(knots.multiplicity(0.25), 1);
        assert_eq!(knots.multiplicity(0.5), 2);
        assert_eq!(knots.multiplicity(0.), 3);
        assert_eq!(knots.multiplicity(1.), 3);
    }

    #[test]
    fn multiplicity_is_tolerant() {
        let u = 0.5f64;
        let knots = Knots::new(1, dvector![0., 0., u, u.next_up(), 1., 1.]).unwrap();
        assert_eq!(knots.multiplicity(u), 2);
    }

    #[test]
    fn multiplicities() {
        let knots = Knots::new(2, dvector![0., 0., 0., 0.25, 0.5, 0.5, 1., 1., 1.]).unwrap();
        assert_eq!(knots.multiplicities(), vec![(0.0, 3), (0.25, 1), (0.5, 2), (1.0, 3)]);
    }

    #[test]
    fn normalize_rescales_domain() {
        let mut knots = Knots::new(1, dvector![1.0, 1.0, 1.5, 2.0, 2.0]).unwrap();

        assert!(!knots.is_normed());
        knots.normalize();
        assert!(knots.is_normed());
        assert_eq!(knots.vector(), &dvector![0.0, 0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn is_normed_is_tolerant() {
        let knots = Knots::new(1, dvector![0.0, 0.0, 0.5, 1.0f64.next_down(), 1.0f64.next_down()]).unwrap();
        assert!(knots.is_normed());
    }

    #[test]
    fn is_sorted_test() {
        assert!(is_sorted(&dvector![0.0, 0.0, 0.5, 1.0, 1.0]));
        assert!(!is_sorted(&dvector![0.0, 1.0, 0.5, 1.0, 1.0]));
    }

    #[test]
    fn is_clamped_test() {
        assert!(is_clamped(&dvector![0.0, 0.0, 0.5, 1.0, 1.0], 1));
        assert!(!is_clamped(&dvector![0.0, 0.5, 0.75, 1.0, 1.0], 1));
    }
}
