//! Action dispatch: route an action name to its typed core entry point
//!
//! Every handler parses the `arguments` object into its record from
//! [`super::types`], calls the core and renders the reply object. Failures
//! of any kind become `{"error": …}` replies; the job keeps running.

use num_bigint::BigInt;
use num_traits::Zero;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::types::*;
use crate::encoding::{decode_b64, decode_block, encode_b64, field_from_b64, field_to_b64};
use crate::error::{CoreError, CoreResult};
use crate::gcm;
use crate::gcm_crack::{self, ForgeryRequest, TaggedMessage};
use crate::gfpoly::{factor, GfPoly};
use crate::padding_oracle::{self, transport::DEFAULT_TIMEOUT, OracleConfig};
use crate::rsa_factor::{self, FactorOutcome};

/// Routes one test case; never fails, errors become error replies.
pub fn dispatch(action: &str, arguments: &Value) -> Value {
    match run_action(action, arguments) {
        Ok(reply) => reply,
        Err(err) => json!({ "error": format!("action failed: {}", err) }),
    }
}

fn run_action(action: &str, arguments: &Value) -> CoreResult<Value> {
    match action {
        "gfmul" => gf_mul(arguments),
        "gfdiv" => gf_div(arguments),
        "gfinv" => gf_inv(arguments),
        "gfpow" => gf_pow(arguments),
        "gfsqrt" => gf_sqrt(arguments),
        "gfdivmod" => gf_divmod(arguments),
        "gfpoly_add" => gfpoly_add(arguments),
        "gfpoly_mul" => gfpoly_mul(arguments),
        "gfpoly_divmod" => gfpoly_divmod(arguments),
        "gfpoly_gcd" => gfpoly_gcd(arguments),
        "gfpoly_pow" => gfpoly_pow(arguments),
        "gfpoly_powmod" => gfpoly_powmod(arguments),
        "gfpoly_sort" => gfpoly_sort(arguments),
        "gfpoly_make_monic" => gfpoly_make_monic(arguments),
        "gfpoly_sqrt" => gfpoly_sqrt(arguments),
        "gfpoly_diff" => gfpoly_diff(arguments),
        "gfpoly_factor_sff" => gfpoly_factor_sff(arguments),
        "gfpoly_factor_ddf" => gfpoly_factor_ddf(arguments),
        "gfpoly_factor_edf" => gfpoly_factor_edf(arguments),
        "gcm_encrypt" => gcm_encrypt(arguments),
        "gcm_decrypt" => gcm_decrypt(arguments),
        "gcm_crack" => gcm_crack_action(arguments),
        "padding_oracle" => padding_oracle_action(arguments),
        "rsa_factor" => rsa_factor_action(arguments),
        "calc" => calc(arguments),
        other => Err(CoreError::Encoding(format!("unknown action {:?}", other))),
    }
}

fn parse_args<T: DeserializeOwned>(arguments: &Value) -> CoreResult<T> {
    serde_json::from_value(arguments.clone())
        .map_err(|e| CoreError::Encoding(format!("invalid arguments: {}", e)))
}

// ============================================================================
// Field element actions
// ============================================================================

fn gf_mul(arguments: &Value) -> CoreResult<Value> {
    let args: GfPairArgs = parse_args(arguments)?;
    let a = field_from_b64(&args.a)?;
    let b = field_from_b64(&args.b)?;
    Ok(json!({ "y": field_to_b64(a * b) }))
}

fn gf_div(arguments: &Value) -> CoreResult<Value> {
    let args: GfPairArgs = parse_args(arguments)?;
    let a = field_from_b64(&args.a)?;
    let b = field_from_b64(&args.b)?;
    Ok(json!({ "q": field_to_b64(a.div(b)?) }))
}

fn gf_inv(arguments: &Value) -> CoreResult<Value> {
    let args: GfElementArgs = parse_args(arguments)?;
    let x = field_from_b64(&args.x)?;
    Ok(json!({ "y": field_to_b64(x.inv()?) }))
}

fn gf_pow(arguments: &Value) -> CoreResult<Value> {
    let args: GfPowArgs = parse_args(arguments)?;
    let base = field_from_b64(&args.b)?;
    let exponent = parse_unsigned(&args.e, "e")?;
    Ok(json!({ "y": field_to_b64(base.pow(&exponent)) }))
}

fn gf_sqrt(arguments: &Value) -> CoreResult<Value> {
    let args: GfElementArgs = parse_args(arguments)?;
    let x = field_from_b64(&args.x)?;
    Ok(json!({ "y": field_to_b64(x.sqrt()) }))
}

fn gf_divmod(arguments: &Value) -> CoreResult<Value> {
    let args: GfPairArgs = parse_args(arguments)?;
    let a = field_from_b64(&args.a)?;
    let b = field_from_b64(&args.b)?;
    let (q, r) = a.divmod(b)?;
    Ok(json!({ "q": field_to_b64(q), "r": field_to_b64(r) }))
}

// ============================================================================
// Polynomial actions
// ============================================================================

fn gfpoly_add(arguments: &Value) -> CoreResult<Value> {
    let args: PolyPairArgs = parse_args(arguments)?;
    let a = GfPoly::from_b64_coeffs(&args.a)?;
    let b = GfPoly::from_b64_coeffs(&args.b)?;
    Ok(json!({ "S": a.add(&b).to_b64_coeffs() }))
}

fn gfpoly_mul(arguments: &Value) -> CoreResult<Value> {
    let args: PolyPairArgs = parse_args(arguments)?;
    let a = GfPoly::from_b64_coeffs(&args.a)?;
    let b = GfPoly::from_b64_coeffs(&args.b)?;
    Ok(json!({ "P": a.mul(&b).to_b64_coeffs() }))
}

fn gfpoly_divmod(arguments: &Value) -> CoreResult<Value> {
    let args: PolyPairArgs = parse_args(arguments)?;
    let a = GfPoly::from_b64_coeffs(&args.a)?;
    let b = GfPoly::from_b64_coeffs(&args.b)?;
    let (q, r) = a.divmod(&b)?;
    Ok(json!({ "Q": q.to_b64_coeffs(), "R": r.to_b64_coeffs() }))
}

fn gfpoly_gcd(arguments: &Value) -> CoreResult<Value> {
    let args: PolyPairArgs = parse_args(arguments)?;
    let a = GfPoly::from_b64_coeffs(&args.a)?;
    let b = GfPoly::from_b64_coeffs(&args.b)?;
    Ok(json!({ "G": a.gcd(&b).to_b64_coeffs() }))
}

fn gfpoly_pow(arguments: &Value) -> CoreResult<Value> {
    let args: PolyPowArgs = parse_args(arguments)?;
    let base = GfPoly::from_b64_coeffs(&args.b)?;
    let exponent = parse_unsigned(&args.e, "e")?;
    Ok(json!({ "Z": base.pow(&exponent).to_b64_coeffs() }))
}

fn gfpoly_powmod(arguments: &Value) -> CoreResult<Value> {
    let args: PolyPowmodArgs = parse_args(arguments)?;
    let base = GfPoly::from_b64_coeffs(&args.b)?;
    let modulus = GfPoly::from_b64_coeffs(&args.m)?;
    let exponent = parse_unsigned(&args.e, "e")?;
    Ok(json!({ "Z": base.powmod(&exponent, &modulus)?.to_b64_coeffs() }))
}

fn gfpoly_sort(arguments: &Value) -> CoreResult<Value> {
    let args: PolySortArgs = parse_args(arguments)?;
    let mut polys = args
        .polys
        .iter()
        .map(|coeffs| GfPoly::from_b64_coeffs(coeffs))
        .collect::<CoreResult<Vec<_>>>()?;
    polys.sort();
    let sorted: Vec<_> = polys.iter().map(|p| p.to_b64_coeffs()).collect();
    Ok(json!({ "sorted": sorted }))
}

fn gfpoly_make_monic(arguments: &Value) -> CoreResult<Value> {
    let args: PolyMonicArgs = parse_args(arguments)?;
    let a = GfPoly::from_b64_coeffs(&args.a)?;
    Ok(json!({ "A*": a.monic().to_b64_coeffs() }))
}

fn gfpoly_sqrt(arguments: &Value) -> CoreResult<Value> {
    let args: PolySqrtArgs = parse_args(arguments)?;
    let s = GfPoly::from_b64_coeffs(&args.s)?;
    Ok(json!({ "R": s.sqrt()?.to_b64_coeffs() }))
}

fn gfpoly_diff(arguments: &Value) -> CoreResult<Value> {
    let args: PolyFactorArgs = parse_args(arguments)?;
    let f = GfPoly::from_b64_coeffs(&args.f)?;
    Ok(json!({ "F'": f.diff().to_b64_coeffs() }))
}

fn gfpoly_factor_sff(arguments: &Value) -> CoreResult<Value> {
    let args: PolyFactorArgs = parse_args(arguments)?;
    let f = GfPoly::from_b64_coeffs(&args.f)?;
    let factors: Vec<Value> = factor::sff(&f)?
        .iter()
        .map(|(factor, exponent)| {
            json!({ "factor": factor.to_b64_coeffs(), "exponent": exponent })
        })
        .collect();
    Ok(json!({ "factors": factors }))
}

fn gfpoly_factor_ddf(arguments: &Value) -> CoreResult<Value> {
    let args: PolyFactorArgs = parse_args(arguments)?;
    let f = GfPoly::from_b64_coeffs(&args.f)?;
    let factors: Vec<Value> = factor::ddf(&f)?
        .iter()
        .map(|(factor, degree)| json!({ "factor": factor.to_b64_coeffs(), "degree": degree }))
        .collect();
    Ok(json!({ "factors": factors }))
}

fn gfpoly_factor_edf(arguments: &Value) -> CoreResult<Value> {
    let args: PolyEdfArgs = parse_args(arguments)?;
    let f = GfPoly::from_b64_coeffs(&args.f)?;
    let mut rng = rand::rng();
    let factors: Vec<Value> = factor::edf(&f, args.d, &mut rng)?
        .iter()
        .map(|factor| json!(factor.to_b64_coeffs()))
        .collect();
    Ok(json!({ "factors": factors }))
}

// ============================================================================
// GCM actions
// ============================================================================

fn decode_aes_key(b64: &str) -> CoreResult<[u8; 16]> {
    let bytes = decode_b64(b64)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CoreError::Encoding(format!("AES-128 key must be 16 bytes, got {}", len)))
}

fn gcm_encrypt(arguments: &Value) -> CoreResult<Value> {
    let args: GcmEncryptArgs = parse_args(arguments)?;
    let key = decode_aes_key(&args.key)?;
    let nonce = decode_b64(&args.nonce)?;
    let plaintext = decode_b64(&args.plaintext)?;
    let ad = decode_b64(&args.ad)?;

    let out = gcm::gcm_encrypt(&key, &nonce, &plaintext, &ad);
    Ok(json!({
        "ciphertext": encode_b64(&out.ciphertext),
        "tag": encode_b64(&out.tag),
        "L": encode_b64(&out.l),
        "H": encode_b64(&out.h),
    }))
}

fn gcm_decrypt(arguments: &Value) -> CoreResult<Value> {
    let args: GcmDecryptArgs = parse_args(arguments)?;
    let key = decode_aes_key(&args.key)?;
    let nonce = decode_b64(&args.nonce)?;
    let ciphertext = decode_b64(&args.ciphertext)?;
    let ad = decode_b64(&args.ad)?;
    let tag = decode_block(&args.tag)?;

    let out = gcm::gcm_decrypt(&key, &nonce, &ciphertext, &ad, &tag);
    Ok(json!({
        "plaintext": encode_b64(&out.plaintext),
        "authentic": out.authentic,
    }))
}

fn parse_captured(message: &CapturedMessageArgs) -> CoreResult<TaggedMessage> {
    let ad = match &message.associated_data {
        Some(b64) => decode_b64(b64)?,
        None => Vec::new(),
    };
    Ok(TaggedMessage {
        ad,
        ciphertext: decode_b64(&message.ciphertext)?,
        tag: decode_block(&message.tag)?,
    })
}

fn gcm_crack_action(arguments: &Value) -> CoreResult<Value> {
    let args: GcmCrackArgs = parse_args(arguments)?;
    let m1 = parse_captured(&args.m1)?;
    let m2 = parse_captured(&args.m2)?;
    let m3 = parse_captured(&args.m3)?;
    let forgery = ForgeryRequest {
        ad: match &args.forgery.associated_data {
            Some(b64) => decode_b64(b64)?,
            None => Vec::new(),
        },
        ciphertext: decode_b64(&args.forgery.ciphertext)?,
    };

    let mut rng = rand::rng();
    let result = gcm_crack::recover_and_forge(&m1, &m2, &m3, &forgery, &mut rng)?;

    let mut reply = Map::new();
    reply.insert("tag".into(), json!(encode_b64(&result.forged_tag)));
    reply.insert("H".into(), json!(field_to_b64(result.h)));
    reply.insert("mask".into(), json!(field_to_b64(result.mask)));
    if result.ambiguous {
        reply.insert("ambiguous".into(), json!(true));
    }
    Ok(Value::Object(reply))
}

// ============================================================================
// Attack actions
// ============================================================================

fn padding_oracle_action(arguments: &Value) -> CoreResult<Value> {
    let args: PaddingOracleArgs = parse_args(arguments)?;
    let iv = decode_block(&args.iv)?;
    let ciphertext = decode_b64(&args.ciphertext)?;

    let config = OracleConfig {
        hostname: args.hostname,
        port: args.port,
        key_id: args.key_id,
        timeout: args
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT),
    };
    let plaintext = padding_oracle::recover_plaintext(&config, &iv, &ciphertext)?;
    Ok(json!({ "plaintext": encode_b64(&plaintext) }))
}

fn rsa_factor_action(arguments: &Value) -> CoreResult<Value> {
    let args: RsaFactorArgs = parse_args(arguments)?;
    let moduli = args
        .moduli
        .iter()
        .map(|m| {
            let n = parse_unsigned(m, "modulus")?;
            if n.bits() < 4 {
                return Err(CoreError::Domain(format!(
                    "modulus {} is below the 4 bit minimum",
                    n
                )));
            }
            Ok(n)
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let factors: Vec<Value> = rsa_factor::batch_gcd(&moduli)
        .iter()
        .map(|outcome| match outcome {
            FactorOutcome::Factored(g) => unsigned_reply(g),
            FactorOutcome::Coprime => json!("coprime"),
            FactorOutcome::Shared => json!("shared"),
        })
        .collect();
    Ok(json!({ "factors": factors }))
}

// ============================================================================
// Glue
// ============================================================================

fn calc(arguments: &Value) -> CoreResult<Value> {
    let args: CalcArgs = parse_args(arguments)?;
    let lhs = parse_signed(&args.lhs, "lhs")?;
    let rhs = parse_signed(&args.rhs, "rhs")?;

    let result: BigInt = match args.op.trim() {
        "+" => lhs + rhs,
        "-" => lhs - rhs,
        "*" => lhs * rhs,
        "/" => {
            if rhs.is_zero() {
                return Err(CoreError::Domain("division by zero".into()));
            }
            // BigInt division truncates toward zero
            lhs / rhs
        }
        other => {
            return Err(CoreError::Encoding(format!("invalid operator {:?}", other)));
        }
    };
    Ok(json!({ "answer": int32_or_hex_reply(&result) }))
}
