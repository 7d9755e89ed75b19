//! Wire client for the remote padding oracle
//!
//! The protocol is a raw binary request-response exchange over TCP, one
//! session per target ciphertext block:
//!
//! ```text
//! client -> server    2 bytes    key id, little-endian (session setup)
//! client -> server   16 bytes    target ciphertext block (session setup)
//! client -> server    2 bytes    candidate count, little-endian (0 ends the session)
//! client -> server   16 * count  candidate IV blocks
//! server -> client    count      one verdict byte per candidate (1 = valid padding)
//! ```
//!
//! Requests never pipeline; every batch waits for its verdict bytes. All
//! socket operations honor the configured timeout, and dropping the
//! transport closes the underlying stream on every exit path.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::encoding::Block;
use crate::error::{CoreError, CoreResult};

/// Per-request timeout used when the caller does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest candidate batch the protocol allows.
pub const MAX_BATCH: usize = 256;

/// An open oracle session for one target ciphertext block.
pub struct OracleTransport {
    stream: TcpStream,
}

impl OracleTransport {
    /// Connects to the oracle and applies the timeout to all socket I/O.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> CoreResult<Self> {
        let mut last_err: Option<io::Error> = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    return Ok(OracleTransport { stream });
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(CoreError::Transport(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "hostname resolved to no addresses")
        })))
    }

    /// Opens the session: announces the key id, then the target block.
    pub fn begin(&mut self, key_id: u16, target: &Block) -> CoreResult<()> {
        self.stream.write_all(&key_id.to_le_bytes())?;
        self.stream.write_all(target)?;
        Ok(())
    }

    /// Submits a batch of candidate blocks and reads one verdict byte each.
    pub fn query(&mut self, candidates: &[Block]) -> CoreResult<Vec<u8>> {
        if candidates.is_empty() || candidates.len() > MAX_BATCH {
            return Err(CoreError::OracleProtocol(format!(
                "batch size {} outside 1..={}",
                candidates.len(),
                MAX_BATCH
            )));
        }

        let count = candidates.len() as u16;
        let mut request = Vec::with_capacity(2 + candidates.len() * 16);
        request.extend_from_slice(&count.to_le_bytes());
        for block in candidates {
            request.extend_from_slice(block);
        }
        self.stream.write_all(&request)?;

        let mut verdicts = vec![0u8; candidates.len()];
        self.stream.read_exact(&mut verdicts)?;
        if let Some(bad) = verdicts.iter().find(|&&v| v > 1) {
            return Err(CoreError::OracleProtocol(format!(
                "verdict byte {:#04x} is neither 0 nor 1",
                bad
            )));
        }
        Ok(verdicts)
    }

    /// Ends the session with a zero-count batch and closes the stream.
    pub fn finish(mut self) -> CoreResult<()> {
        self.stream.write_all(&0u16.to_le_bytes())?;
        Ok(())
    }
}
