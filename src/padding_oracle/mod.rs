//! CBC padding-oracle attack
//!
//! The oracle decrypts a target ciphertext block under a caller-chosen IV
//! and reveals whether the result ends in valid PKCS#7 padding. Plaintext
//! bytes are recovered right to left: for byte position p, the bytes to
//! the right are fixed so they decrypt to the pad value `16 - p`, and all
//! 256 guesses for position p go out in a single batch. A guess that makes
//! the padding valid reveals the plaintext byte directly, because the
//! candidate IV byte is constructed as `guess ^ pad ^ prev[p]`.
//!
//! On positions where more than one guess validates (the real last byte
//! and an accidental longer padding), each surviving guess is re-tested
//! with a neighbouring byte flipped; only the true one stays valid.

pub mod transport;

use std::time::Duration;

use crate::encoding::Block;
use crate::error::{CoreError, CoreResult};
use self::transport::{OracleTransport, DEFAULT_TIMEOUT};

/// Where and how to reach the oracle.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub hostname: String,
    pub port: u16,
    /// Server-side key slot, sent at the start of every session.
    pub key_id: u16,
    pub timeout: Duration,
}

impl OracleConfig {
    pub fn new(hostname: impl Into<String>, port: u16, key_id: u16) -> Self {
        OracleConfig {
            hostname: hostname.into(),
            port,
            key_id,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Recovers the full CBC plaintext for `ciphertext` under the oracle's key.
///
/// One oracle session is opened per ciphertext block; the previous block
/// (the IV for the first one) provides the XOR chain.
///
/// # Errors
/// `CoreError::Encoding` for a ciphertext that is not a positive multiple
/// of 16 bytes, `Transport`/`OracleProtocol` for oracle failures.
pub fn recover_plaintext(
    config: &OracleConfig,
    iv: &Block,
    ciphertext: &[u8],
) -> CoreResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return Err(CoreError::Encoding(format!(
            "ciphertext length {} is not a positive multiple of 16",
            ciphertext.len()
        )));
    }

    let mut plaintext = Vec::with_capacity(ciphertext.len());
    let mut prev: Block = *iv;
    for chunk in ciphertext.chunks(16) {
        let target: Block = chunk.try_into().expect("chunk length checked above");
        let mut session =
            OracleTransport::connect(&config.hostname, config.port, config.timeout)?;
        let block_plaintext = attack_block(&mut session, config.key_id, &prev, &target)?;
        session.finish()?;
        plaintext.extend_from_slice(&block_plaintext);
        prev = target;
    }
    Ok(plaintext)
}

/// Builds the candidate IV for one guess at one byte position.
fn candidate_block(prev: &Block, known: &Block, position: usize, pad: u8, guess: u8) -> Block {
    let mut q = [0u8; 16];
    for j in position + 1..16 {
        q[j] = known[j] ^ pad ^ prev[j];
    }
    q[position] = guess ^ pad ^ prev[position];
    q
}

/// Recovers the 16 plaintext bytes of one ciphertext block.
fn attack_block(
    session: &mut OracleTransport,
    key_id: u16,
    prev: &Block,
    target: &Block,
) -> CoreResult<Block> {
    session.begin(key_id, target)?;

    let mut plaintext = [0u8; 16];
    for position in (0..16).rev() {
        let pad = (16 - position) as u8;

        let candidates: Vec<Block> = (0..=255u8)
            .map(|guess| candidate_block(prev, &plaintext, position, pad, guess))
            .collect();
        let verdicts = session.query(&candidates)?;

        let hits: Vec<u8> = verdicts
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 1)
            .map(|(guess, _)| guess as u8)
            .collect();

        plaintext[position] = match hits.as_slice() {
            [] => {
                return Err(CoreError::OracleProtocol(format!(
                    "oracle reported no valid padding for byte {}",
                    position
                )))
            }
            [only] => *only,
            _ => disambiguate(session, prev, &plaintext, position, pad, &hits)?,
        };
    }
    Ok(plaintext)
}

/// Separates the true guess from accidental longer paddings.
///
/// Flipping a byte left of the current position destroys any padding that
/// extends past it, while a genuine `pad`-length padding is unaffected.
fn disambiguate(
    session: &mut OracleTransport,
    prev: &Block,
    known: &Block,
    position: usize,
    pad: u8,
    hits: &[u8],
) -> CoreResult<u8> {
    let flip_index = if position > 0 { position - 1 } else { 1 };
    for &guess in hits {
        let mut q = candidate_block(prev, known, position, pad, guess);
        q[flip_index] ^= 0xff;
        let verdict = session.query(&[q])?;
        if verdict[0] == 1 {
            return Ok(guess);
        }
    }
    Err(CoreError::OracleProtocol(format!(
        "no candidate survived disambiguation at byte {}",
        position
    )))
}
