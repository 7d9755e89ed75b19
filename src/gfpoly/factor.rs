//! Polynomial factorization over GF(2^128)
//!
//! The three stages of the classical factoring pipeline:
//!
//! 1. **SFF**: square-free factorization. Characteristic 2 needs the
//!    square detour: when the derivative vanishes the polynomial is a
//!    perfect square, so we recurse on its square root with doubled
//!    exponents.
//! 2. **DDF**: distinct-degree factorization of a square-free monic
//!    input, separating the product of all irreducible factors of each
//!    degree d via `gcd(f, x^(q^d) - x)` with q = 2^128.
//! 3. **EDF**: equal-degree factorization (randomized Cantor–Zassenhaus).
//!    Because 3 divides q^d - 1, raising a random polynomial to
//!    `(q^d - 1)/3` modulo f lands in the cubic-residue subgroup on each
//!    irreducible component, and `gcd(h^e - 1, f)` splits f with
//!    probability bounded away from zero per draw.
//!
//! The RNG for EDF is injected so test runs can be replayed.

use num_bigint::BigUint;
use num_traits::One;
use rand::{Rng, RngCore};

use super::GfPoly;
use crate::error::{CoreError, CoreResult};
use crate::gf128::FieldElement;

/// Square-free factorization.
///
/// Returns `(factor, exponent)` pairs, each factor monic and square-free,
/// pairwise coprime, with the product of `factor^exponent` equal to
/// `monic(f)`. The list is sorted by the polynomial order.
///
/// # Errors
/// `CoreError::Domain` for the zero polynomial.
pub fn sff(f: &GfPoly) -> CoreResult<Vec<(GfPoly, u64)>> {
    if f.is_zero() {
        return Err(CoreError::Domain("cannot factor the zero polynomial".into()));
    }
    let mut factors = sff_monic(&f.monic())?;
    factors.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(factors)
}

fn sff_monic(f: &GfPoly) -> CoreResult<Vec<(GfPoly, u64)>> {
    let derivative = f.diff();
    let c = f.gcd(&derivative);
    // w carries the square-free part still to be peeled off
    let mut w = f.divmod(&c)?.0;
    let mut c_rest = c;
    let mut factors = Vec::new();
    let mut exponent = 1u64;

    while !w.is_one() {
        let y = w.gcd(&c_rest);
        if w != y {
            let peeled = w.divmod(&y)?.0;
            factors.push((peeled.monic(), exponent));
        }
        w = y;
        c_rest = c_rest.divmod(&w)?.0;
        exponent += 1;
    }

    // whatever remains of c is a perfect square (all exponents even)
    if !c_rest.is_one() {
        for (factor, inner_exponent) in sff_monic(&c_rest.sqrt()?)? {
            factors.push((factor, 2 * inner_exponent));
        }
    }
    Ok(factors)
}

/// Distinct-degree factorization of a square-free monic polynomial.
///
/// Returns `(factor, degree)` pairs where each factor is the product of all
/// monic irreducible factors of exactly that degree, sorted by the
/// polynomial order.
///
/// # Errors
/// `CoreError::Domain` for the zero polynomial.
pub fn ddf(f: &GfPoly) -> CoreResult<Vec<(GfPoly, u64)>> {
    if f.is_zero() {
        return Err(CoreError::Domain("cannot factor the zero polynomial".into()));
    }
    let f_monic = f.monic();
    let q = BigUint::one() << 128;
    let x = GfPoly::x();

    let mut factors: Vec<(GfPoly, u64)> = Vec::new();
    let mut f_star = f_monic.clone();
    // h tracks x^(q^d) mod f_star across rounds
    let mut h = x.clone();
    let mut d = 1u64;

    loop {
        let deg = match f_star.coeffs().len().checked_sub(1) {
            Some(deg) => deg,
            None => break,
        };
        if (deg as u64) < 2 * d {
            break;
        }
        h = h.powmod(&q, &f_star)?;
        let g = h.add(&x).gcd(&f_star);
        if !g.is_one() {
            factors.push((g.monic(), d));
            f_star = f_star.divmod(&g)?.0.monic();
            h = h.rem(&f_star)?;
        }
        d += 1;
    }

    if !f_star.is_one() {
        let remaining_deg = (f_star.coeffs().len() - 1) as u64;
        factors.push((f_star, remaining_deg));
    } else if factors.is_empty() {
        factors.push((f_monic, 1));
    }

    factors.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(factors)
}

/// Equal-degree factorization (Cantor–Zassenhaus).
///
/// `f` must be square-free, monic (it is normalized here) and a product of
/// irreducible factors of degree exactly `d`. Returns the `d`-degree monic
/// factors in the polynomial sort order.
///
/// # Errors
/// `CoreError::Domain` when `f` is zero, `d` is zero or `deg(f)` is not a
/// multiple of `d`.
pub fn edf(f: &GfPoly, d: usize, rng: &mut dyn RngCore) -> CoreResult<Vec<GfPoly>> {
    if f.is_zero() {
        return Err(CoreError::Domain("cannot factor the zero polynomial".into()));
    }
    if d == 0 {
        return Err(CoreError::Domain("factor degree must be positive".into()));
    }
    let f_monic = f.monic();
    let deg = f_monic.coeffs().len() - 1;
    if deg % d != 0 {
        return Err(CoreError::Domain(format!(
            "degree {} is not a multiple of the factor degree {}",
            deg, d
        )));
    }
    let factor_count = deg / d;

    // 3 divides q^d - 1 for q = 2^128, so the cubic-residue exponent splits
    let exponent = ((BigUint::one() << (128 * d)) - 1u32) / 3u32;

    let mut parts = vec![f_monic];
    while parts.len() < factor_count {
        let h = random_nonzero_poly(rng, deg);
        let g = h.powmod(&exponent, f)?.add(&GfPoly::one());

        let snapshot = parts.clone();
        for part in &snapshot {
            if part.coeffs().len() - 1 <= d {
                continue;
            }
            let j = part.gcd(&g);
            if j.is_one() || j == *part {
                continue;
            }
            let quotient = part.divmod(&j)?.0;
            if let Some(pos) = parts.iter().position(|p| p == part) {
                parts.remove(pos);
            }
            for piece in [j.monic(), quotient.monic()] {
                // pieces below the target degree cannot occur for valid input
                if piece.coeffs().len() - 1 >= d {
                    parts.push(piece);
                }
            }
        }
    }

    let mut factors: Vec<GfPoly> = parts
        .into_iter()
        .filter(|p| p.coeffs().len() - 1 == d && !p.is_one())
        .map(|p| p.monic())
        .collect();
    factors.sort();
    Ok(factors)
}

/// Draws a uniformly random non-zero polynomial of degree in `[1, max_deg)`.
fn random_nonzero_poly(rng: &mut dyn RngCore, max_deg: usize) -> GfPoly {
    let upper = max_deg.max(2);
    let degree = rng.random_range(1..upper);
    let mut coeffs: Vec<FieldElement> = (0..=degree)
        .map(|_| FieldElement::new(rng.random::<u128>()))
        .collect();
    if coeffs.iter().all(|c| c.is_zero()) {
        coeffs[0] = FieldElement::ONE;
    }
    GfPoly::new(coeffs)
}
