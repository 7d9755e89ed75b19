//! Univariate polynomials with coefficients in GF(2^128)
//!
//! Coefficients are stored lowest degree first, index = degree. Every
//! polynomial is kept *normalized*: trailing zero coefficients are stripped,
//! and the zero polynomial is the empty coefficient vector. The degree of
//! the zero polynomial is the sentinel [`Degree::NegInfinity`], which is
//! ordered below every finite degree but never mixed into index arithmetic.
//!
//! All operations return normalized results. Factorization (square-free,
//! distinct-degree, equal-degree) lives in the [`factor`] submodule.

pub mod factor;

use num_bigint::BigUint;
use num_traits::Zero;
use std::cmp::Ordering;

use crate::encoding::{field_from_b64, field_to_b64};
use crate::error::{CoreError, CoreResult};
use crate::gf128::FieldElement;

/// Degree of a polynomial; the zero polynomial has no finite degree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Degree {
    NegInfinity,
    Finite(usize),
}

/// A normalized polynomial over GF(2^128), lowest-degree coefficient first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GfPoly {
    coeffs: Vec<FieldElement>,
}

impl GfPoly {
    /// Builds a polynomial from coefficients, stripping trailing zeros.
    pub fn new(mut coeffs: Vec<FieldElement>) -> Self {
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        GfPoly { coeffs }
    }

    /// The zero polynomial.
    pub fn zero() -> Self {
        GfPoly { coeffs: Vec::new() }
    }

    /// The constant polynomial 1.
    pub fn one() -> Self {
        GfPoly {
            coeffs: vec![FieldElement::ONE],
        }
    }

    /// The polynomial X.
    pub fn x() -> Self {
        GfPoly {
            coeffs: vec![FieldElement::ZERO, FieldElement::ONE],
        }
    }

    /// A constant polynomial (zero when the constant is zero).
    pub fn constant(c: FieldElement) -> Self {
        GfPoly::new(vec![c])
    }

    /// Parses a polynomial from base64-encoded GCM-block coefficients.
    pub fn from_b64_coeffs(coeffs: &[String]) -> CoreResult<Self> {
        let parsed = coeffs
            .iter()
            .map(|s| field_from_b64(s))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(GfPoly::new(parsed))
    }

    /// Serializes the coefficient list as base64 GCM blocks.
    ///
    /// The zero polynomial serializes as a single zero coefficient so that
    /// the JSON surface never emits an empty list.
    pub fn to_b64_coeffs(&self) -> Vec<String> {
        if self.coeffs.is_empty() {
            return vec![field_to_b64(FieldElement::ZERO)];
        }
        self.coeffs.iter().map(|c| field_to_b64(*c)).collect()
    }

    /// Returns the degree, with [`Degree::NegInfinity`] for zero.
    pub fn degree(&self) -> Degree {
        match self.coeffs.len() {
            0 => Degree::NegInfinity,
            n => Degree::Finite(n - 1),
        }
    }

    /// Degree as an index; `None` for the zero polynomial.
    fn deg_index(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0].is_one()
    }

    /// The coefficient of x^i (zero beyond the degree).
    pub fn coeff(&self, i: usize) -> FieldElement {
        self.coeffs.get(i).copied().unwrap_or(FieldElement::ZERO)
    }

    /// The normalized coefficient slice, lowest degree first.
    pub fn coeffs(&self) -> &[FieldElement] {
        &self.coeffs
    }

    /// The leading coefficient; `None` for the zero polynomial.
    pub fn leading_coeff(&self) -> Option<FieldElement> {
        self.coeffs.last().copied()
    }

    /// Coefficient-wise addition (XOR in characteristic 2).
    pub fn add(&self, other: &GfPoly) -> GfPoly {
        let n = self.coeffs.len().max(other.coeffs.len());
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            out.push(self.coeff(i) + other.coeff(i));
        }
        GfPoly::new(out)
    }

    /// Schoolbook convolution.
    ///
    /// For non-zero inputs the result degree is exactly the sum of the
    /// input degrees (fields have no zero divisors).
    pub fn mul(&self, other: &GfPoly) -> GfPoly {
        if self.is_zero() || other.is_zero() {
            return GfPoly::zero();
        }
        let mut out = vec![FieldElement::ZERO; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                out[i + j] = out[i + j] + a * b;
            }
        }
        let product = GfPoly::new(out);
        debug_assert_eq!(
            product.coeffs.len(),
            self.coeffs.len() + other.coeffs.len() - 1
        );
        product
    }

    /// Long division: returns `(quotient, remainder)` with
    /// `self = quotient * divisor + remainder` and
    /// `deg(remainder) < deg(divisor)`.
    ///
    /// # Errors
    /// `CoreError::Domain` when the divisor is the zero polynomial.
    pub fn divmod(&self, divisor: &GfPoly) -> CoreResult<(GfPoly, GfPoly)> {
        let divisor_deg = divisor
            .deg_index()
            .ok_or_else(|| CoreError::Domain("division by zero polynomial".into()))?;
        if self.coeffs.len() <= divisor_deg {
            return Ok((GfPoly::zero(), self.clone()));
        }

        let lead_inv = divisor.coeffs[divisor_deg]
            .inv()
            .expect("leading coefficient is non-zero");

        let mut remainder = self.coeffs.clone();
        let mut quotient = vec![FieldElement::ZERO; self.coeffs.len() - divisor_deg];

        while remainder.len() > divisor_deg {
            let deg_r = remainder.len() - 1;
            let shift = deg_r - divisor_deg;
            let factor = remainder[deg_r] * lead_inv;
            quotient[shift] = quotient[shift] + factor;

            for (i, &d) in divisor.coeffs.iter().enumerate() {
                remainder[i + shift] = remainder[i + shift] + d * factor;
            }
            // the leading term cancelled by construction
            while remainder.last().is_some_and(|c| c.is_zero()) {
                remainder.pop();
            }
        }

        Ok((GfPoly::new(quotient), GfPoly::new(remainder)))
    }

    /// Remainder of the division by `divisor`.
    pub fn rem(&self, divisor: &GfPoly) -> CoreResult<GfPoly> {
        Ok(self.divmod(divisor)?.1)
    }

    /// Scales the polynomial so its leading coefficient is 1.
    ///
    /// The zero polynomial stays zero.
    pub fn monic(&self) -> GfPoly {
        match self.leading_coeff() {
            None => GfPoly::zero(),
            Some(lead) if lead.is_one() => self.clone(),
            Some(lead) => {
                let lead_inv = lead.inv().expect("leading coefficient is non-zero");
                GfPoly::new(self.coeffs.iter().map(|&c| c * lead_inv).collect())
            }
        }
    }

    /// Greatest common divisor (Euclid), returned monic.
    ///
    /// `gcd(0, 0) = 0` and `gcd(p, 0) = monic(p)`.
    pub fn gcd(&self, other: &GfPoly) -> GfPoly {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let r = a.rem(&b).expect("divisor is non-zero in Euclid loop");
            a = b;
            b = r;
        }
        a.monic()
    }

    /// Exponentiation by square-and-multiply; `p^0 = 1`.
    pub fn pow(&self, exponent: &BigUint) -> GfPoly {
        if exponent.is_zero() {
            return GfPoly::one();
        }
        let mut result = GfPoly::one();
        let mut base = self.clone();
        let nbits = exponent.bits();
        for i in 0..nbits {
            if exponent.bit(i) {
                result = result.mul(&base);
            }
            if i + 1 < nbits {
                base = base.mul(&base);
            }
        }
        result
    }

    /// Exponentiation modulo `modulus`, reducing after every step.
    ///
    /// # Errors
    /// `CoreError::Domain` when `modulus` is the zero polynomial.
    pub fn powmod(&self, exponent: &BigUint, modulus: &GfPoly) -> CoreResult<GfPoly> {
        if modulus.is_zero() {
            return Err(CoreError::Domain("reduction by zero polynomial".into()));
        }
        if modulus.is_one() {
            // everything is congruent to zero mod 1
            return Ok(GfPoly::zero());
        }
        if exponent.is_zero() {
            return Ok(GfPoly::one());
        }
        if self.is_zero() {
            return Ok(GfPoly::zero());
        }

        let mut result = GfPoly::one();
        let mut base = self.rem(modulus)?;
        let nbits = exponent.bits();
        for i in 0..nbits {
            if exponent.bit(i) {
                result = result.mul(&base).rem(modulus)?;
            }
            if i + 1 < nbits {
                base = base.mul(&base).rem(modulus)?;
            }
        }
        Ok(result)
    }

    /// Formal derivative.
    ///
    /// In characteristic 2 every even-degree term vanishes: the derivative
    /// of `c_i x^i` is `(i mod 2) c_i x^(i-1)`.
    pub fn diff(&self) -> GfPoly {
        if self.coeffs.len() <= 1 {
            return GfPoly::zero();
        }
        let out = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &c)| if i % 2 == 1 { c } else { FieldElement::ZERO })
            .collect();
        GfPoly::new(out)
    }

    /// Square root of a square polynomial.
    ///
    /// Squaring in characteristic 2 maps `sum c_i x^i` to
    /// `sum c_i^2 x^(2i)`, so a square has zero odd-degree coefficients and
    /// its root takes the field square root of every even coefficient.
    ///
    /// # Errors
    /// `CoreError::Domain` when an odd-degree coefficient is non-zero.
    pub fn sqrt(&self) -> CoreResult<GfPoly> {
        for (i, c) in self.coeffs.iter().enumerate() {
            if i % 2 == 1 && !c.is_zero() {
                return Err(CoreError::Domain(format!(
                    "not a square: non-zero coefficient at odd degree {}",
                    i
                )));
            }
        }
        Ok(GfPoly::new(
            self.coeffs.iter().step_by(2).map(|c| c.sqrt()).collect(),
        ))
    }

    /// Evaluates the polynomial at a point via Horner's scheme.
    pub fn eval(&self, x: FieldElement) -> FieldElement {
        let mut acc = FieldElement::ZERO;
        for &c in self.coeffs.iter().rev() {
            acc = acc * x + c;
        }
        acc
    }
}

impl PartialOrd for GfPoly {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GfPoly {
    /// Total order used by the `sort` operation: degree ascending, ties
    /// broken by comparing coefficients from the highest degree downwards
    /// on their numeric encoding.
    fn cmp(&self, other: &Self) -> Ordering {
        match self.coeffs.len().cmp(&other.coeffs.len()) {
            Ordering::Equal => {
                for i in (0..self.coeffs.len()).rev() {
                    match self.coeffs[i].cmp(&other.coeffs[i]) {
                        Ordering::Equal => continue,
                        non_eq => return non_eq,
                    }
                }
                Ordering::Equal
            }
            non_eq => non_eq,
        }
    }
}

impl std::ops::Add for &GfPoly {
    type Output = GfPoly;

    fn add(self, other: &GfPoly) -> GfPoly {
        GfPoly::add(self, other)
    }
}

impl std::ops::Mul for &GfPoly {
    type Output = GfPoly;

    fn mul(self, other: &GfPoly) -> GfPoly {
        GfPoly::mul(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(vals: &[u128]) -> GfPoly {
        GfPoly::new(vals.iter().map(|&v| FieldElement::new(v)).collect())
    }

    fn poly_b64(coeffs: &[&str]) -> GfPoly {
        let owned: Vec<String> = coeffs.iter().map(|s| s.to_string()).collect();
        GfPoly::from_b64_coeffs(&owned).unwrap()
    }

    // A = c0 + c1 X + X^2 and B = (x^7+x^2+x+1) + X, with c0, c1 the field
    // elements used across the gf128 tests
    const C0: u128 = 0x1000000000000000000000000004880;
    const C1: u128 = 0x40;

    fn sample_a() -> GfPoly {
        poly(&[C0, C1, 1])
    }

    fn sample_b() -> GfPoly {
        poly(&[0x87, 1])
    }

    #[test]
    fn test_normalization_strips_trailing_zeros() {
        let p = poly(&[1, 2, 0, 0]);
        assert_eq!(p.coeffs().len(), 2);
        assert_eq!(p.degree(), Degree::Finite(1));
        assert!(poly(&[0, 0]).is_zero());
        assert_eq!(poly(&[]).degree(), Degree::NegInfinity);
    }

    #[test]
    fn test_degree_sentinel_orders_below_finite() {
        assert!(Degree::NegInfinity < Degree::Finite(0));
        assert!(Degree::Finite(1) < Degree::Finite(2));
    }

    #[test]
    fn test_add() {
        let s = sample_a().add(&sample_b());
        assert_eq!(
            s,
            poly_b64(&[
                "4BIAAAAAAAAAAAAAAAAAgA==",
                "ggAAAAAAAAAAAAAAAAAAAA==",
                "gAAAAAAAAAAAAAAAAAAAAA==",
            ])
        );
        // adding a polynomial to itself cancels in characteristic 2
        assert!(sample_a().add(&sample_a()).is_zero());
    }

    #[test]
    fn test_mul() {
        let p = sample_a().mul(&sample_b());
        assert_eq!(
            p,
            poly_b64(&[
                "Ad2kAAAAAAAAAAAAAAAA4Q==",
                "ApYAAAAAAAAAAAAAAAAAgA==",
                "4wAAAAAAAAAAAAAAAAAAAA==",
                "gAAAAAAAAAAAAAAAAAAAAA==",
            ])
        );
        assert_eq!(p.degree(), Degree::Finite(3));
        assert!(sample_a().mul(&GfPoly::zero()).is_zero());
    }

    #[test]
    fn test_divmod() {
        let (q, r) = sample_a().divmod(&sample_b()).unwrap();
        assert_eq!(
            q,
            poly_b64(&["4wAAAAAAAAAAAAAAAAAAAA==", "gAAAAAAAAAAAAAAAAAAAAA=="])
        );
        assert_eq!(r, poly_b64(&["qpQAAAAAAAAAAAAAAAAAgA=="]));
        // reconstruction law
        assert_eq!(q.mul(&sample_b()).add(&r), sample_a());
        assert!(r.degree() < sample_b().degree());
    }

    #[test]
    fn test_divmod_small_by_large() {
        let (q, r) = sample_b().divmod(&sample_a()).unwrap();
        assert!(q.is_zero());
        assert_eq!(r, sample_b());
    }

    #[test]
    fn test_divmod_by_zero_fails() {
        assert!(matches!(
            sample_a().divmod(&GfPoly::zero()),
            Err(CoreError::Domain(_))
        ));
    }

    #[test]
    fn test_gcd() {
        // gcd(A*B, B*(1 + X)) = monic(B) = B
        let left = sample_a().mul(&sample_b());
        let right = sample_b().mul(&poly(&[1, 1]));
        assert_eq!(left.gcd(&right), sample_b());
    }

    #[test]
    fn test_gcd_with_zero() {
        let scaled = GfPoly::new(
            sample_a()
                .coeffs()
                .iter()
                .map(|&c| c * FieldElement::new(3))
                .collect(),
        );
        assert_eq!(scaled.gcd(&GfPoly::zero()), sample_a().monic());
        assert!(GfPoly::zero().gcd(&GfPoly::zero()).is_zero());
    }

    #[test]
    fn test_monic() {
        let three = FieldElement::new(3);
        let scaled = GfPoly::new(sample_a().coeffs().iter().map(|&c| c * three).collect());
        let m = scaled.monic();
        assert_eq!(m.leading_coeff(), Some(FieldElement::ONE));
        assert_eq!(m, sample_a());
        assert!(GfPoly::zero().monic().is_zero());
    }

    #[test]
    fn test_pow() {
        let b5 = sample_b().pow(&BigUint::from(5u32));
        assert_eq!(
            b5,
            poly_b64(&[
                "7/EADhAAAAAAAAAAAAAAAA==",
                "iIAACAAAAAAAAAAAAAAAAA==",
                "AAAAAAAAAAAAAAAAAAAAAA==",
                "AAAAAAAAAAAAAAAAAAAAAA==",
                "4QAAAAAAAAAAAAAAAAAAAA==",
                "gAAAAAAAAAAAAAAAAAAAAA==",
            ])
        );
        assert!(sample_a().pow(&BigUint::from(0u32)).is_one());
    }

    #[test]
    fn test_powmod() {
        let z = sample_b()
            .powmod(&BigUint::from(1000u32), &sample_a())
            .unwrap();
        assert_eq!(
            z,
            poly_b64(&["kssf/nLUDo53qtvrJy38Vg==", "3kbr63sVU22ODbe0D6N5ew=="])
        );
        // agreement with plain pow followed by reduction
        let direct = sample_b()
            .pow(&BigUint::from(1000u32))
            .rem(&sample_a())
            .unwrap();
        assert_eq!(z, direct);
    }

    #[test]
    fn test_powmod_edge_cases() {
        let e = BigUint::from(7u32);
        assert!(sample_a().powmod(&e, &GfPoly::one()).unwrap().is_zero());
        assert!(sample_a()
            .powmod(&BigUint::from(0u32), &sample_b())
            .unwrap()
            .is_one());
        assert!(GfPoly::zero().powmod(&e, &sample_b()).unwrap().is_zero());
        assert!(sample_a().powmod(&e, &GfPoly::zero()).is_err());
    }

    #[test]
    fn test_diff() {
        let d = poly(&[1, 2, 3, 4, 5, 6]).diff();
        assert_eq!(d, poly(&[2, 0, 4, 0, 6]));
        assert!(poly(&[42]).diff().is_zero());
        // derivative of a square vanishes in characteristic 2
        let sq = sample_a().mul(&sample_a());
        assert!(sq.diff().is_zero());
    }

    #[test]
    fn test_sqrt() {
        let sq = sample_a().mul(&sample_a());
        assert_eq!(sq.sqrt().unwrap(), sample_a());
    }

    #[test]
    fn test_sqrt_of_non_square_fails() {
        assert!(matches!(
            sample_b().sqrt(),
            Err(CoreError::Domain(_))
        ));
    }

    #[test]
    fn test_eval() {
        // A(x) at the root structure: A = (X + c0)(X + c1) has roots c0, c1
        let p = poly(&[C0, 1]).mul(&poly(&[C1, 1]));
        assert!(p.eval(FieldElement::new(C0)).is_zero());
        assert!(p.eval(FieldElement::new(C1)).is_zero());
        assert!(!p.eval(FieldElement::ONE).is_zero());
    }

    #[test]
    fn test_sort_order() {
        let mut polys = vec![
            poly(&[3, 1]),
            poly(&[2, 1]),
            poly(&[1]),
            poly(&[0, 0, 1]),
            poly(&[5]),
        ];
        polys.sort();
        assert_eq!(
            polys,
            vec![
                poly(&[1]),
                poly(&[5]),
                poly(&[2, 1]),
                poly(&[3, 1]),
                poly(&[0, 0, 1]),
            ]
        );
    }

    #[test]
    fn test_zero_poly_serializes_as_single_zero() {
        assert_eq!(
            GfPoly::zero().to_b64_coeffs(),
            vec!["AAAAAAAAAAAAAAAAAAAAAA==".to_string()]
        );
        assert!(GfPoly::from_b64_coeffs(&[]).unwrap().is_zero());
    }
}
