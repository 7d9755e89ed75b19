//! Cryptanalysis toolkit for batch JSON jobs
//!
//! The crate implements the computation core of a course tool that reads a
//! job file of independent test cases and answers each with one JSON reply
//! line: arithmetic in GF(2^128) under the AES-GCM reduction polynomial,
//! polynomial arithmetic and factorization over that field, a
//! first-principles AES-128-GCM, nonce-reuse tag forgery, a CBC
//! padding-oracle client and batch-GCD factoring of RSA modulus sets.

/// AES-128 block primitive
pub mod aes;
/// GCM block codec and base64 boundary helpers
pub mod encoding;
/// Shared error kinds
pub mod error;
/// AES-128-GCM encryption and decryption
pub mod gcm;
/// GCM nonce-reuse key recovery and forgery
pub mod gcm_crack;
/// GF(2^128) field arithmetic
pub mod gf128;
/// Polynomials over GF(2^128) and their factorization
pub mod gfpoly;
/// JSON job surface and action dispatch
pub mod job;
/// Padding-oracle client and CBC attack
pub mod padding_oracle;
/// Batch-GCD RSA factoring
pub mod rsa_factor;
