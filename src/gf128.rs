//! GF(2^128) arithmetic under the AES-GCM reduction polynomial
//!
//! Elements are polynomials over F_2 of degree < 128, reduced modulo
//!
//! ```text
//! x^128 + x^7 + x^2 + x + 1
//! ```
//!
//! # Representation
//! An element is stored as a `u128` in *numeric* encoding: bit i is the
//! coefficient of x^i. This is the only representation the arithmetic ever
//! sees; the GCM block encoding (bit-reflected bytes, as GHASH consumes
//! them) lives exclusively in [`crate::encoding`] and never leaks in here.
//!
//! # Operations
//! - Addition/subtraction: XOR (characteristic 2)
//! - Multiplication: carry-less 256-bit product, then reduction
//! - Inversion: Fermat, `a^(2^128 - 2)`
//! - Square root: Frobenius, `a^(2^127)`

use num_bigint::BigUint;
use num_traits::Zero;
use std::ops::{Add, Mul, Neg, Sub};

use crate::error::{CoreError, CoreResult};

/// Low 128 bits of the reduction polynomial: x^7 + x^2 + x + 1.
///
/// The x^128 term is implied; reduction substitutes x^128 by this value.
pub const REDUCTION_LOW: u128 = (1 << 7) | (1 << 2) | (1 << 1) | 1;

/// An element of GF(2^128) in numeric encoding (bit i = coefficient of x^i).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldElement(u128);

impl FieldElement {
    /// The additive identity.
    pub const ZERO: FieldElement = FieldElement(0);
    /// The multiplicative identity (the constant polynomial 1).
    pub const ONE: FieldElement = FieldElement(1);
    /// The polynomial x.
    pub const X: FieldElement = FieldElement(2);

    /// Wraps a raw coefficient vector.
    #[inline]
    pub const fn new(bits: u128) -> Self {
        FieldElement(bits)
    }

    /// Returns the raw coefficient vector (bit i = coefficient of x^i).
    #[inline]
    pub const fn bits(self) -> u128 {
        self.0
    }

    /// Checks for the additive identity.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checks for the multiplicative identity.
    #[inline]
    pub fn is_one(self) -> bool {
        self.0 == 1
    }

    /// Multiplies two field elements.
    ///
    /// Carry-less multiplication into a 256-bit intermediate followed by
    /// reduction modulo x^128 + x^7 + x^2 + x + 1.
    pub fn gf_mul(self, other: FieldElement) -> FieldElement {
        let (hi, lo) = clmul(self.0, other.0);
        FieldElement(reduce(hi, lo))
    }

    /// Exponentiation by an arbitrary-precision non-negative exponent.
    ///
    /// Square-and-multiply, O(log e) field multiplications. By convention
    /// `pow(a, 0) = 1` for every `a`, including `a = 0`.
    pub fn pow(self, exponent: &BigUint) -> FieldElement {
        if exponent.is_zero() {
            return FieldElement::ONE;
        }
        let mut result = FieldElement::ONE;
        let mut base = self;
        let nbits = exponent.bits();
        for i in 0..nbits {
            if exponent.bit(i) {
                result = result.gf_mul(base);
            }
            if i + 1 < nbits {
                base = base.gf_mul(base);
            }
        }
        result
    }

    /// Exponentiation by a fixed-width exponent (internal fast path).
    fn pow_u128(self, exponent: u128) -> FieldElement {
        if exponent == 0 {
            return FieldElement::ONE;
        }
        let mut result = FieldElement::ONE;
        let mut base = self;
        let nbits = 128 - exponent.leading_zeros();
        for i in 0..nbits {
            if (exponent >> i) & 1 == 1 {
                result = result.gf_mul(base);
            }
            if i + 1 < nbits {
                base = base.gf_mul(base);
            }
        }
        result
    }

    /// Computes the multiplicative inverse.
    ///
    /// Uses Fermat's little theorem in the 2^128-element field:
    /// `a^(-1) = a^(2^128 - 2)`.
    ///
    /// # Errors
    /// `CoreError::Domain` for the zero element.
    pub fn inv(self) -> CoreResult<FieldElement> {
        if self.is_zero() {
            return Err(CoreError::Domain("zero has no multiplicative inverse".into()));
        }
        Ok(self.pow_u128(u128::MAX - 1))
    }

    /// Divides `self` by `other` (`self * other^(-1)`).
    ///
    /// # Errors
    /// `CoreError::Domain` when `other` is zero.
    pub fn div(self, other: FieldElement) -> CoreResult<FieldElement> {
        Ok(self.gf_mul(other.inv()?))
    }

    /// Division with remainder on field elements.
    ///
    /// In a field every division is exact, so this is `(self / other, 0)`;
    /// it exists because the JSON surface carries a divmod operation.
    pub fn divmod(self, other: FieldElement) -> CoreResult<(FieldElement, FieldElement)> {
        Ok((self.div(other)?, FieldElement::ZERO))
    }

    /// Computes the square root.
    ///
    /// Squaring is the Frobenius automorphism in characteristic 2, so every
    /// element has the unique square root `a^(2^127)`.
    pub fn sqrt(self) -> FieldElement {
        self.pow_u128(1 << 127)
    }
}

impl Add for FieldElement {
    type Output = FieldElement;

    /// Addition in GF(2^128) is XOR.
    #[inline]
    fn add(self, other: FieldElement) -> FieldElement {
        FieldElement(self.0 ^ other.0)
    }
}

#[allow(clippy::suspicious_arithmetic_impl)]
impl Sub for FieldElement {
    type Output = FieldElement;

    /// Subtraction equals addition in characteristic 2.
    #[inline]
    fn sub(self, other: FieldElement) -> FieldElement {
        self + other
    }
}

impl Neg for FieldElement {
    type Output = FieldElement;

    /// Negation is the identity (−1 = 1 in F_2).
    #[inline]
    fn neg(self) -> FieldElement {
        self
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;

    fn mul(self, other: FieldElement) -> FieldElement {
        self.gf_mul(other)
    }
}

impl std::fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldElement({:#034x})", self.0)
    }
}

/// Carry-less 128 x 128 -> 256 bit multiplication.
///
/// Returns `(hi, lo)` with the product polynomial split at degree 128.
fn clmul(a: u128, b: u128) -> (u128, u128) {
    let mut hi = 0u128;
    let mut lo = 0u128;
    for i in 0..128u32 {
        if (b >> i) & 1 == 1 {
            lo ^= a << i;
            if i > 0 {
                hi ^= a >> (128 - i);
            }
        }
    }
    (hi, lo)
}

/// Reduces a 256-bit product modulo x^128 + x^7 + x^2 + x + 1.
///
/// Substitutes x^128 by the low reduction part twice: the first fold leaves
/// at most 7 bits above position 127, the second fold clears them.
fn reduce(hi: u128, lo: u128) -> u128 {
    // hi * (x^7 + x^2 + x + 1), split again at bit 128; the multiplier has
    // degree 7, so at most 7 bits spill over
    let fold_lo = (hi << 7) ^ (hi << 2) ^ (hi << 1) ^ hi;
    let fold_hi = (hi >> 121) ^ (hi >> 126) ^ (hi >> 127);
    debug_assert!(fold_hi < (1 << 7));
    // the second fold fits entirely below bit 128
    let second = (fold_hi << 7) ^ (fold_hi << 2) ^ (fold_hi << 1) ^ fold_hi;
    lo ^ fold_lo ^ second
}
