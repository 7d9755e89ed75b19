//! Typed argument records for the JSON action surface
//!
//! Each action deserializes its `arguments` object into one of these
//! records; unknown fields are ignored so job files may carry extra
//! metadata. Integers on the surface follow the lenient convention of the
//! course job files: a JSON number, or a string in decimal / `0x` hex /
//! `0o` octal / `0b` binary notation.

use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{CoreError, CoreResult};

/// One entry of the job file.
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub action: String,
    #[serde(default)]
    pub arguments: Value,
}

// ============================================================================
// Field element actions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GfPairArgs {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Deserialize)]
pub struct GfElementArgs {
    pub x: String,
}

#[derive(Debug, Deserialize)]
pub struct GfPowArgs {
    pub b: String,
    pub e: Value,
}

// ============================================================================
// Polynomial actions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PolyPairArgs {
    #[serde(rename = "A")]
    pub a: Vec<String>,
    #[serde(rename = "B")]
    pub b: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolyMonicArgs {
    #[serde(rename = "A")]
    pub a: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolyFactorArgs {
    #[serde(rename = "F")]
    pub f: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolySqrtArgs {
    #[serde(rename = "S")]
    pub s: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolyPowArgs {
    #[serde(rename = "B")]
    pub b: Vec<String>,
    pub e: Value,
}

#[derive(Debug, Deserialize)]
pub struct PolyPowmodArgs {
    #[serde(rename = "B")]
    pub b: Vec<String>,
    #[serde(rename = "M")]
    pub m: Vec<String>,
    pub e: Value,
}

#[derive(Debug, Deserialize)]
pub struct PolySortArgs {
    pub polys: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct PolyEdfArgs {
    #[serde(rename = "F")]
    pub f: Vec<String>,
    pub d: usize,
}

// ============================================================================
// GCM actions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GcmEncryptArgs {
    pub key: String,
    pub nonce: String,
    pub plaintext: String,
    pub ad: String,
}

#[derive(Debug, Deserialize)]
pub struct GcmDecryptArgs {
    pub key: String,
    pub nonce: String,
    pub ciphertext: String,
    pub ad: String,
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct CapturedMessageArgs {
    #[serde(default)]
    pub associated_data: Option<String>,
    pub ciphertext: String,
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgeryArgs {
    #[serde(default)]
    pub associated_data: Option<String>,
    pub ciphertext: String,
}

#[derive(Debug, Deserialize)]
pub struct GcmCrackArgs {
    pub m1: CapturedMessageArgs,
    pub m2: CapturedMessageArgs,
    pub m3: CapturedMessageArgs,
    pub forgery: ForgeryArgs,
}

// ============================================================================
// Attack actions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PaddingOracleArgs {
    pub hostname: String,
    pub port: u16,
    /// Server-side key slot, announced at the start of every session.
    pub key_id: u16,
    pub iv: String,
    pub ciphertext: String,
    /// Optional per-request timeout override in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RsaFactorArgs {
    pub moduli: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CalcArgs {
    pub lhs: Value,
    pub rhs: Value,
    pub op: String,
}

// ============================================================================
// Integer parsing and rendering
// ============================================================================

/// Largest magnitude rendered as a plain JSON number (2^53, the integer
/// range JSON consumers can represent losslessly).
const JSON_SAFE_LIMIT: u64 = 1 << 53;

/// Parses a possibly signed integer from a JSON number or string.
pub fn parse_signed(value: &Value, name: &str) -> CoreResult<BigInt> {
    match value {
        Value::Number(num) => {
            if let Some(i) = num.as_i64() {
                Ok(BigInt::from(i))
            } else if let Some(u) = num.as_u64() {
                Ok(BigInt::from(u))
            } else {
                Err(CoreError::Encoding(format!(
                    "{} must be an integer, got {}",
                    name, num
                )))
            }
        }
        Value::String(s) => parse_prefixed(s.trim()).ok_or_else(|| {
            CoreError::Encoding(format!("{} is not a valid integer literal: {:?}", name, s))
        }),
        other => Err(CoreError::Encoding(format!(
            "{} must be a number or string, got {}",
            name, other
        ))),
    }
}

/// Parses a non-negative integer; a negative value is a domain violation.
pub fn parse_unsigned(value: &Value, name: &str) -> CoreResult<BigUint> {
    let signed = parse_signed(value, name)?;
    signed
        .to_biguint()
        .ok_or_else(|| CoreError::Domain(format!("{} must be non-negative", name)))
}

/// Parses a string literal with an optional sign and `0x`/`0o`/`0b` prefix.
fn parse_prefixed(s: &str) -> Option<BigInt> {
    let (negative, magnitude_str) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, digits) = if let Some(rest) = magnitude_str
        .strip_prefix("0x")
        .or_else(|| magnitude_str.strip_prefix("0X"))
    {
        (16, rest)
    } else if let Some(rest) = magnitude_str
        .strip_prefix("0o")
        .or_else(|| magnitude_str.strip_prefix("0O"))
    {
        (8, rest)
    } else if let Some(rest) = magnitude_str
        .strip_prefix("0b")
        .or_else(|| magnitude_str.strip_prefix("0B"))
    {
        (2, rest)
    } else {
        (10, magnitude_str)
    };
    let magnitude = BigUint::parse_bytes(digits.as_bytes(), radix)?;
    let value = BigInt::from(magnitude);
    Some(if negative { -value } else { value })
}

/// Renders an unsigned integer: a JSON number when small enough, a decimal
/// string otherwise.
pub fn unsigned_reply(value: &BigUint) -> Value {
    match value.to_u64() {
        Some(small) if small < JSON_SAFE_LIMIT => json!(small),
        _ => json!(value.to_string()),
    }
}

/// Renders a `calc` result: a JSON number inside the 32-bit signed range,
/// a hex string (`0x…`/`-0x…`) beyond it.
pub fn int32_or_hex_reply(value: &BigInt) -> Value {
    const LIMIT: i64 = 1 << 31;
    match value.to_i64() {
        Some(small) if (-LIMIT..LIMIT).contains(&small) => json!(small),
        _ => json!(format!("{:#x}", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_and_string() {
        assert_eq!(parse_signed(&json!(42), "x").unwrap(), BigInt::from(42));
        assert_eq!(parse_signed(&json!("42"), "x").unwrap(), BigInt::from(42));
        assert_eq!(parse_signed(&json!("-17"), "x").unwrap(), BigInt::from(-17));
        assert_eq!(parse_signed(&json!("0x2a"), "x").unwrap(), BigInt::from(42));
        assert_eq!(parse_signed(&json!("0b101"), "x").unwrap(), BigInt::from(5));
        assert_eq!(parse_signed(&json!("0o17"), "x").unwrap(), BigInt::from(15));
    }

    #[test]
    fn test_parse_huge_decimal_string() {
        let huge = "340282366920938463463374607431768211456"; // 2^128
        let parsed = parse_unsigned(&json!(huge), "x").unwrap();
        assert_eq!(parsed, BigUint::from(1u32) << 128);
    }

    #[test]
    fn test_negative_exponent_is_domain_error() {
        assert!(matches!(
            parse_unsigned(&json!(-1), "e"),
            Err(CoreError::Domain(_))
        ));
        assert!(matches!(
            parse_unsigned(&json!("-0x10"), "e"),
            Err(CoreError::Domain(_))
        ));
    }

    #[test]
    fn test_garbage_is_encoding_error() {
        assert!(matches!(
            parse_signed(&json!("12zz"), "x"),
            Err(CoreError::Encoding(_))
        ));
        assert!(matches!(
            parse_signed(&json!(1.5), "x"),
            Err(CoreError::Encoding(_))
        ));
        assert!(matches!(
            parse_signed(&json!([1]), "x"),
            Err(CoreError::Encoding(_))
        ));
    }

    #[test]
    fn test_unsigned_reply_switches_to_decimal_strings() {
        assert_eq!(unsigned_reply(&BigUint::from(7u32)), json!(7));
        let big = BigUint::from(1u32) << 64;
        assert_eq!(
            unsigned_reply(&big),
            json!("18446744073709551616")
        );
    }

    #[test]
    fn test_int32_or_hex_reply_switches_at_the_32_bit_boundary() {
        assert_eq!(int32_or_hex_reply(&BigInt::from(-9)), json!(-9));
        assert_eq!(
            int32_or_hex_reply(&BigInt::from((1i64 << 31) - 1)),
            json!(2147483647)
        );
        assert_eq!(
            int32_or_hex_reply(&BigInt::from(-(1i64 << 31))),
            json!(-2147483648i64)
        );
        assert_eq!(
            int32_or_hex_reply(&BigInt::from(1i64 << 31)),
            json!("0x80000000")
        );
        assert_eq!(
            int32_or_hex_reply(&BigInt::from(-(1i64 << 31) - 1)),
            json!("-0x80000001")
        );
        assert_eq!(
            int32_or_hex_reply(&BigInt::from(1u128 << 64)),
            json!("0x10000000000000000")
        );
    }
}
