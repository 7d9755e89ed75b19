//! GCM nonce-reuse key recovery and tag forgery
//!
//! Two messages authenticated under the same key and nonce share the GHASH
//! key H and the tag mask `AES_K(Y_0)`. Writing each tag as the evaluation
//! of the message's GHASH polynomial at H plus the mask, the sum of the two
//! tag equations is a polynomial over GF(2^128) that vanishes at H. The
//! attack factors that polynomial, enumerates its roots in the field and
//! uses a third captured message to pick the right candidate, after which
//! any message of the attacker's choosing can be tagged.

use rand::RngCore;

use crate::encoding::{block_to_field, field_to_block, Block};
use crate::error::{CoreError, CoreResult};
use crate::gcm::length_block;
use crate::gf128::FieldElement;
use crate::gfpoly::{factor, GfPoly};

/// One captured GCM message: associated data, ciphertext and its tag.
#[derive(Debug, Clone)]
pub struct TaggedMessage {
    pub ad: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Block,
}

/// The message the attacker wants a valid tag for.
#[derive(Debug, Clone)]
pub struct ForgeryRequest {
    pub ad: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// Result of a successful crack.
#[derive(Debug, Clone)]
pub struct CrackResult {
    /// The recovered GHASH key.
    pub h: FieldElement,
    /// The recovered tag mask `AES_K(Y_0)`.
    pub mask: FieldElement,
    /// Valid tag for the forgery request.
    pub forged_tag: Block,
    /// More than one candidate key verified (should not happen with
    /// genuine captures; the first verified candidate is returned).
    pub ambiguous: bool,
}

/// Builds the symbolic GHASH polynomial of a message.
///
/// The blocks of `pad(A) || pad(C) || L` become coefficients of descending
/// powers of the indeterminate, so that evaluating at H yields exactly
/// `GHASH(H, A, C)`.
pub fn ghash_poly(ad: &[u8], ct: &[u8]) -> GfPoly {
    let x = GfPoly::x();
    let mut s = GfPoly::zero();

    let mut absorb = |data: &[u8]| {
        for chunk in data.chunks(16) {
            let mut block = [0u8; 16];
            block[..chunk.len()].copy_from_slice(chunk);
            s = s.add(&GfPoly::constant(block_to_field(&block))).mul(&x);
        }
    };
    absorb(ad);
    absorb(ct);

    let l = length_block(ad.len(), ct.len());
    s.add(&GfPoly::constant(block_to_field(&l))).mul(&x)
}

/// `G_a(X) + G_b(X) + (T_a + T_b)`, made monic. H is a root.
fn attack_poly(s_a: &GfPoly, tag_a: &Block, s_b: &GfPoly, tag_b: &Block) -> GfPoly {
    let tag_sum = block_to_field(tag_a) + block_to_field(tag_b);
    s_a.add(s_b).add(&GfPoly::constant(tag_sum)).monic()
}

/// Enumerates all roots of `f` in GF(2^128) via SFF, DDF and degree-1 EDF.
fn field_roots(f: &GfPoly, rng: &mut dyn RngCore) -> CoreResult<Vec<FieldElement>> {
    if f.is_zero() || f.is_one() {
        return Ok(Vec::new());
    }
    let mut roots = Vec::new();
    for (square_free, _) in factor::sff(f)? {
        for (product, degree) in factor::ddf(&square_free)? {
            if degree != 1 {
                continue;
            }
            for linear in factor::edf(&product, 1, rng)? {
                // a monic linear factor X + r has the root r
                roots.push(linear.coeff(0));
            }
        }
    }
    Ok(roots)
}

/// Recovers `(H, AES_K(Y_0))` from three tag-sharing messages and forges a
/// tag for the requested message.
///
/// # Errors
/// `CoreError::NoSolution` when no candidate key is consistent with the
/// third message.
pub fn recover_and_forge(
    m1: &TaggedMessage,
    m2: &TaggedMessage,
    m3: &TaggedMessage,
    forgery: &ForgeryRequest,
    rng: &mut dyn RngCore,
) -> CoreResult<CrackResult> {
    let s1 = ghash_poly(&m1.ad, &m1.ciphertext);
    let s2 = ghash_poly(&m2.ad, &m2.ciphertext);
    let s3 = ghash_poly(&m3.ad, &m3.ciphertext);

    let f12 = attack_poly(&s1, &m1.tag, &s2, &m2.tag);
    let f13 = attack_poly(&s1, &m1.tag, &s3, &m3.tag);

    // H is a common root, so the gcd is usually a much smaller polynomial
    // to factor; fall back to the full polynomials when it degenerates
    let common = f12.gcd(&f13);
    let mut candidates = if common.is_one() {
        Vec::new()
    } else {
        field_roots(&common, rng)?
    };
    if candidates.is_empty() {
        candidates = field_roots(&f12, rng)?;
    }
    if candidates.is_empty() {
        candidates = field_roots(&f13, rng)?;
    }

    let t1 = block_to_field(&m1.tag);
    let t3 = block_to_field(&m3.tag);
    let mut verified = Vec::new();
    for h in candidates {
        let mask = t1 + s1.eval(h);
        if mask + s3.eval(h) == t3 {
            verified.push((h, mask));
        }
    }

    let (h, mask) = *verified.first().ok_or_else(|| {
        CoreError::NoSolution("no candidate GHASH key verified against the third message".into())
    })?;

    let s_forgery = ghash_poly(&forgery.ad, &forgery.ciphertext);
    let forged_tag = field_to_block(mask + s_forgery.eval(h));

    Ok(CrackResult {
        h,
        mask,
        forged_tag,
        ambiguous: verified.len() > 1,
    })
}
