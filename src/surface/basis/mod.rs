//! Evaluates the basis spline functions using the Cox-de Boor-Mansfield
//! recurrence relation.
//!
//! The recurrence is evaluated iteratively over a triangular table of
//! normalized knot-span differences, so that every basis value is obtained
//! from its two lower-degree neighbours. Knot spans of zero width collapse
//! the corresponding blend, which the difference table handles without
//! explicit division-by-zero guards.
//!
//! Derivatives are obtained by recording the full triangular table of
//! undifferentiated computations and combining per-order correction
//! coefficients [Piegl1997, A2.3]. All functions are pure and can be called
//! concurrently without synchronization.

use crate::{
    surface::knots::Knots,
    types::{MatD, VecD},
};

/// Evaluates the `p+1` nonzero basis functions `N_{span-p},...,N_{span}` at `u`.
///
/// `span` must be the index returned by [`Knots::find_span`] for `u`.
pub fn basis_funs(knots: &Knots, span: usize, u: f64) -> VecD {
    let p = knots.degree();
    let U = knots.vector();

    let mut funs = VecD::zeros(p + 1);
    funs[0] = 1.0;

    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    for j in 1..=p {
        left[j] = u - U[span + 1 - j];
        right[j] = U[span + j] - u;

        let mut saved = 0.0;
        for r in 0..j {
            let temp = funs[r] / (right[r + 1] + left[j - r]);
            funs[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        funs[j] = saved;
    }
    funs
}

/// Evaluates the nonzero basis functions and their derivatives up to `max_order`.
///
/// Returns a `(max_order+1) x (p+1)` table whose row `k` holds the `k`-th
/// derivatives of `N_{span-p},...,N_{span}` at `u`. Row `0` equals
/// [`basis_funs`]. Rows with `k > p` are identically zero, as the `(p+1)`-th
/// derivative of a degree-`p` polynomial vanishes.
pub fn ders_basis_funs(knots: &Knots, span: usize, u: f64, max_order: usize) -> MatD {
    let p = knots.degree();
    let U = knots.vector();
    let n = max_order.min(p);

    let mut ders = MatD::zeros(max_order + 1, p + 1);

    // ndu stores the basis values of all degrees 0..=p in its upper triangle
    // and the knot differences in its lower triangle.
    let mut ndu = MatD::zeros(p + 1, p + 1);
    ndu[(0, 0)] = 1.0;

    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    for j in 1..=p {
        left[j] = u - U[span + 1 - j];
        right[j] = U[span + j] - u;

        let mut saved = 0.0;
        for r in 0..j {
            ndu[(j, r)] = right[r + 1] + left[j - r];
            let temp = ndu[(r, j - 1)] / ndu[(j, r)];

            ndu[(r, j)] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[(j, j)] = saved;
    }

    for j in 0..=p {
        ders[(0, j)] = ndu[(j, p)];
    }

    // Two alternating rows of correction coefficients per basis function.
    let mut a = MatD::zeros(2, p + 1);

    for r in 0..=p {
        let mut s1 = 0;
        let mut s2 = 1;
        a.fill(0.0);
        a[(0, 0)] = 1.0;

        for k in 1..=n {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = p - k;

            if r >= k {
                a[(s2, 0)] = a[(s1, 0)] / ndu[(pk + 1, rk as usize)];
                d = a[(s2, 0)] * ndu[(rk as usize, pk)];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r <= pk + 1 { k - 1 } else { p - r };

            for j in j1..=j2 {
                let col = (rk + j as isize) as usize;
                a[(s2, j)] = (a[(s1, j)] - a[(s1, j - 1)]) / ndu[(pk + 1, col)];
                d += a[(s2, j)] * ndu[(col, pk)];
            }

            if r <= pk {
                a[(s2, k)] = -a[(s1, k - 1)] / ndu[(pk + 1, r)];
                d += a[(s2, k)] * ndu[(r, pk)];
            }

            ders[(k, r)] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Multiply through by p!/(p-k)!.
    let mut factor = p as f64;
    for k in 1..=n {
        for j in 0..=p {
            ders[(k, j)] *= factor;
        }
        factor *= (p - k) as f64;
    }
    ders
}
