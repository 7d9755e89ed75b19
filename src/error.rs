//! Error types shared by all core components
//!
//! Every fallible core operation returns `CoreResult<T>`. The variants map
//! one-to-one onto the failure classes of the toolkit: mathematical
//! precondition violations, malformed encodings, attacks without a unique
//! answer, and transport/protocol failures of the remote oracle.

use std::io;

/// Errors surfaced by the computation core.
///
/// The dispatcher converts these into `{"error": …}` reply objects; a failed
/// test case never aborts the job as a whole.
#[derive(Debug)]
pub enum CoreError {
    /// A mathematical precondition was violated (inverse of zero, division
    /// by the zero polynomial, square root of a non-square, …).
    Domain(String),
    /// Invalid base64, wrong block length or an unparseable integer.
    Encoding(String),
    /// An attack terminated without finding any consistent answer.
    NoSolution(String),
    /// An attack found more than one consistent answer.
    Ambiguous(String),
    /// Network I/O towards the padding oracle failed.
    Transport(io::Error),
    /// The oracle answered, but its response violates the wire protocol.
    OracleProtocol(String),
}

/// Result alias used throughout the core.
pub type CoreResult<T> = Result<T, CoreError>;

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::Domain(msg) => write!(f, "domain error: {}", msg),
            CoreError::Encoding(msg) => write!(f, "encoding error: {}", msg),
            CoreError::NoSolution(msg) => write!(f, "no solution: {}", msg),
            CoreError::Ambiguous(msg) => write!(f, "ambiguous result: {}", msg),
            CoreError::Transport(e) => write!(f, "transport error: {}", e),
            CoreError::OracleProtocol(msg) => write!(f, "oracle protocol error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<io::Error> for CoreError {
    fn from(err: io::Error) -> Self {
        CoreError::Transport(err)
    }
}

impl From<base64::DecodeError> for CoreError {
    fn from(err: base64::DecodeError) -> Self {
        CoreError::Encoding(format!("invalid base64: {}", err))
    }
}
