//! GCM block codec and base64 boundary helpers
//!
//! The JSON surface carries field elements as base64-encoded 16-byte blocks
//! in the AES-GCM bit order: within each byte the most significant bit is
//! the *lowest*-degree coefficient. Internally all arithmetic runs on the
//! numeric encoding (bit i = coefficient of x^i, see [`crate::gf128`]).
//!
//! This module is the single place where the two encodings meet. Reversing
//! the byte order of a block and mirroring the bits inside each byte is the
//! same as reversing all 128 bits at once, which is how the bridge is
//! implemented.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{CoreError, CoreResult};
use crate::gf128::FieldElement;

/// A 16-byte block in GCM encoding.
pub type Block = [u8; 16];

/// Decodes a GCM-encoded block into a field element.
pub fn block_to_field(block: &Block) -> FieldElement {
    FieldElement::new(u128::from_be_bytes(*block).reverse_bits())
}

/// Encodes a field element as a GCM block (inverse of [`block_to_field`]).
pub fn field_to_block(x: FieldElement) -> Block {
    x.bits().reverse_bits().to_be_bytes()
}

/// Decodes base64 into raw bytes.
pub fn decode_b64(s: &str) -> CoreResult<Vec<u8>> {
    Ok(BASE64.decode(s)?)
}

/// Encodes raw bytes as base64.
pub fn encode_b64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decodes base64 that must contain exactly one 16-byte block.
pub fn decode_block(s: &str) -> CoreResult<Block> {
    let bytes = decode_b64(s)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CoreError::Encoding(format!("expected a 16 byte block, got {} bytes", len)))
}

/// Decodes a base64 GCM block straight into a field element.
pub fn field_from_b64(s: &str) -> CoreResult<FieldElement> {
    Ok(block_to_field(&decode_block(s)?))
}

/// Encodes a field element as a base64 GCM block.
pub fn field_to_b64(x: FieldElement) -> String {
    encode_b64(&field_to_block(x))
}
