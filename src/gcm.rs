//! AES-128 in Galois/Counter Mode, built on the local block cipher
//!
//! The construction follows NIST SP 800-38D:
//!
//! ```text
//! H   = AES_K(0^128)
//! Y_0 = N || 0x00000001            (96-bit nonce)
//! Y_0 = GHASH(H, "", N)            (any other nonce length)
//! C_i = P_i xor AES_K(Y_i)         with Y_i = inc32^i(Y_0), i >= 1
//! T   = GHASH(H, A, C) xor AES_K(Y_0)
//! ```
//!
//! Unlike a production AEAD, the encrypt path also *returns* the GHASH key
//! `H` and the length block `L`: the nonce-reuse attack tooling needs both.
//! The decrypt path reports tag validity but still yields the plaintext, as
//! an analysis aid.

use crate::aes::{encrypt_block_with_keys, round_keys, RoundKeys};
use crate::encoding::{block_to_field, field_to_block, Block};
use crate::gf128::FieldElement;

/// Output of [`gcm_encrypt`]; exposes the internals downstream tooling needs.
#[derive(Debug, Clone)]
pub struct GcmEncrypted {
    pub ciphertext: Vec<u8>,
    pub tag: Block,
    /// The GHASH key `AES_K(0^128)` in GCM block encoding.
    pub h: Block,
    /// The length block fed into GHASH last.
    pub l: Block,
}

/// Output of [`gcm_decrypt`].
#[derive(Debug, Clone)]
pub struct GcmDecrypted {
    pub plaintext: Vec<u8>,
    /// Whether the recomputed tag matched the supplied one.
    pub authentic: bool,
}

/// Builds the GHASH length block: 64-bit big-endian bit lengths of A and C.
pub fn length_block(ad_len: usize, ct_len: usize) -> Block {
    let mut l = [0u8; 16];
    l[0..8].copy_from_slice(&((ad_len as u64) * 8).to_be_bytes());
    l[8..16].copy_from_slice(&((ct_len as u64) * 8).to_be_bytes());
    l
}

/// GHASH over associated data and ciphertext.
///
/// Both inputs are zero-padded to full 16-byte blocks; the length block is
/// absorbed last. Returns the hash value (numeric encoding) together with
/// the length block.
pub fn ghash(h: FieldElement, ad: &[u8], ct: &[u8]) -> (FieldElement, Block) {
    let mut x = FieldElement::ZERO;

    let mut absorb = |data: &[u8]| {
        for chunk in data.chunks(16) {
            let mut block = [0u8; 16];
            block[..chunk.len()].copy_from_slice(chunk);
            x = (x + block_to_field(&block)) * h;
        }
    };
    absorb(ad);
    absorb(ct);

    let l = length_block(ad.len(), ct.len());
    x = (x + block_to_field(&l)) * h;

    (x, l)
}

/// Increments the low 32 bits of a counter block (big-endian, mod 2^32).
fn inc32(block: &mut Block) {
    let counter = u32::from_be_bytes([block[12], block[13], block[14], block[15]]);
    block[12..16].copy_from_slice(&counter.wrapping_add(1).to_be_bytes());
}

/// Derives the initial counter block from the nonce.
fn derive_y0(h: FieldElement, nonce: &[u8]) -> Block {
    if nonce.len() == 12 {
        let mut y0 = [0u8; 16];
        y0[..12].copy_from_slice(nonce);
        y0[15] = 1;
        y0
    } else {
        let (hash, _) = ghash(h, &[], nonce);
        field_to_block(hash)
    }
}

/// Counter-mode keystream application, shared by both directions.
fn ctr_apply(round_keys: &RoundKeys, y0: &Block, data: &[u8]) -> Vec<u8> {
    let mut ctr = *y0;
    let mut out = Vec::with_capacity(data.len());
    for chunk in data.chunks(16) {
        inc32(&mut ctr);
        let keystream = encrypt_block_with_keys(&ctr, round_keys);
        out.extend(chunk.iter().zip(keystream.iter()).map(|(d, k)| d ^ k));
    }
    out
}

/// Computes the tag `GHASH(H, A, C) xor AES_K(Y_0)`.
fn compute_tag(
    round_keys: &RoundKeys,
    h: FieldElement,
    y0: &Block,
    ad: &[u8],
    ct: &[u8],
) -> (Block, Block) {
    let e_y0 = encrypt_block_with_keys(y0, round_keys);
    let (hash, l) = ghash(h, ad, ct);
    let tag = field_to_block(hash + block_to_field(&e_y0));
    (tag, l)
}

/// AES-128-GCM encryption.
pub fn gcm_encrypt(key: &[u8; 16], nonce: &[u8], plaintext: &[u8], ad: &[u8]) -> GcmEncrypted {
    let round_keys = round_keys(key);
    let h_block = encrypt_block_with_keys(&[0u8; 16], &round_keys);
    let h = block_to_field(&h_block);

    let y0 = derive_y0(h, nonce);
    let ciphertext = ctr_apply(&round_keys, &y0, plaintext);
    let (tag, l) = compute_tag(&round_keys, h, &y0, ad, &ciphertext);

    GcmEncrypted {
        ciphertext,
        tag,
        h: h_block,
        l,
    }
}

/// AES-128-GCM decryption.
///
/// The plaintext is returned regardless of the tag check; `authentic` tells
/// the caller whether the supplied tag was the correct one.
pub fn gcm_decrypt(
    key: &[u8; 16],
    nonce: &[u8],
    ciphertext: &[u8],
    ad: &[u8],
    tag: &Block,
) -> GcmDecrypted {
    let round_keys = round_keys(key);
    let h_block = encrypt_block_with_keys(&[0u8; 16], &round_keys);
    let h = block_to_field(&h_block);

    let y0 = derive_y0(h, nonce);
    let (expected_tag, _) = compute_tag(&round_keys, h, &y0, ad, ciphertext);
    let plaintext = ctr_apply(&round_keys, &y0, ciphertext);

    GcmDecrypted {
        plaintext,
        authentic: expected_tag == *tag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    fn h16(s: &str) -> [u8; 16] {
        h(s).try_into().unwrap()
    }

    #[test]
    fn test_nist_empty_plaintext() {
        // zero key, zero nonce, no data: T = AES_K(Y_0)
        let out = gcm_encrypt(&[0u8; 16], &[0u8; 12], &[], &[]);
        assert!(out.ciphertext.is_empty());
        assert_eq!(out.h, h16("66e94bd4ef8a2c3b884cfa59ca342b2e"));
        assert_eq!(out.tag, h16("58e2fccefa7e3061367f1d57a4e7455a"));
        assert_eq!(out.l, [0u8; 16]);
    }

    #[test]
    fn test_nist_single_zero_block() {
        let out = gcm_encrypt(&[0u8; 16], &[0u8; 12], &[0u8; 16], &[]);
        assert_eq!(out.ciphertext, h("0388dace60b6a392f328c2b971b2fe78"));
        assert_eq!(out.tag, h16("ab6e47d42cec13bdf53a67b21257bddf"));
        assert_eq!(out.l, h16("00000000000000000000000000000080"));
    }

    #[test]
    fn test_nist_aad_and_partial_block() {
        // GCM spec test case 4: 60 byte plaintext, 20 byte AAD
        let key = h16("feffe9928665731c6d6a8f9467308308");
        let nonce = h("cafebabefacedbaddecaf888");
        let plaintext = h(
            "d9313225f88406e5a55909c5aff5269a86a7a9531534f7da2e4c303d8a318a72\
             1c3c0c95956809532fcf0e2449a6b525b16aedf5aa0de657ba637b39",
        );
        let ad = h("feedfacedeadbeeffeedfacedeadbeefabaddad2");

        let out = gcm_encrypt(&key, &nonce, &plaintext, &ad);
        assert_eq!(
            out.ciphertext,
            h("42831ec2217774244b7221b784d0d49ce3aa212f2c02a4e035c17e2329aca12e\
               21d514b25466931c7d8f6a5aac84aa051ba30b396a0aac973d58e091")
        );
        assert_eq!(out.tag, h16("5bc94fbc3221a5db94fae95ae7121a47"));
        assert_eq!(out.h, h16("b83b533708bf535d0aa6e52980d53b78"));
        assert_eq!(out.l, h16("00000000000000a000000000000001e0"));
    }

    #[test]
    fn test_non_96_bit_nonce() {
        // GCM spec test case 5: 8 byte nonce, Y_0 = GHASH(H, "", N)
        let key = h16("feffe9928665731c6d6a8f9467308308");
        let nonce = h("cafebabefacedbad");
        let plaintext = h(
            "d9313225f88406e5a55909c5aff5269a86a7a9531534f7da2e4c303d8a318a72\
             1c3c0c95956809532fcf0e2449a6b525b16aedf5aa0de657ba637b39",
        );
        let ad = h("feedfacedeadbeeffeedfacedeadbeefabaddad2");

        let out = gcm_encrypt(&key, &nonce, &plaintext, &ad);
        assert_eq!(
            out.ciphertext,
            h("61353b4c2806934a777ff51fa22a4755699b2a714fcdc6f83766e5f97b6c7423\
               73806900e49f24b22b097544d4896b424989b5e1ebac0f07c23f4598")
        );
        assert_eq!(out.tag, h16("3612d2e79e3b0785561be14aaca2fccb"));
    }

    #[test]
    fn test_roundtrip() {
        let key = h16("2b7e151628aed2a6abf7158809cf4f3c");
        let nonce = h("000102030405060708090a0b");
        let plaintext = b"attack at dawn, retreat at dusk";
        let ad = b"header";

        let enc = gcm_encrypt(&key, &nonce, plaintext, ad);
        let dec = gcm_decrypt(&key, &nonce, &enc.ciphertext, ad, &enc.tag);
        assert!(dec.authentic);
        assert_eq!(dec.plaintext, plaintext);
    }

    #[test]
    fn test_tampered_tag_detected() {
        let key = h16("2b7e151628aed2a6abf7158809cf4f3c");
        let nonce = h("000102030405060708090a0b");
        let enc = gcm_encrypt(&key, &nonce, b"payload", b"");

        let mut bad_tag = enc.tag;
        bad_tag[0] ^= 1;
        let dec = gcm_decrypt(&key, &nonce, &enc.ciphertext, b"", &bad_tag);
        assert!(!dec.authentic);
        // plaintext still comes back for analysis
        assert_eq!(dec.plaintext, b"payload");
    }

    #[test]
    fn test_ghash_linearity_in_h() {
        // GHASH with H = 0 maps everything to zero
        let (x, _) = ghash(FieldElement::ZERO, b"some aad", b"some ct");
        assert!(x.is_zero());
    }
}
