// Byte stream transport layer module

pub mod tcp;

pub use tcp::TcpTransport;

use crate::common::error::{Error, Result};

/// An ordered, reliable byte stream between the two peers.
///
/// The primitives mirror socket behavior: both may move fewer bytes than
/// asked for. Protocol code goes through the exact-count helpers instead.
pub trait Transport {
    /// Sends up to `bytes.len()` bytes, returning how many were accepted.
    fn send(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Receives at most `max` bytes, blocking until something arrives. An
    /// empty result means the peer closed the stream.
    fn receive(&mut self, max: usize) -> Result<Vec<u8>>;

    /// Sends the whole buffer.
    fn send_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut sent = 0;
        while sent < bytes.len() {
            let n = self.send(&bytes[sent..])?;
            if n == 0 {
                return Err(Error::TransportClosed {
                    expected: bytes.len(),
                    got: sent,
                });
            }
            sent += n;
        }
        Ok(())
    }

    /// Receives exactly `len` bytes; a close short of that is an error.
    fn receive_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len);
        while buf.len() < len {
            let piece = self.receive(len - buf.len())?;
            if piece.is_empty() {
                return Err(Error::TransportClosed {
                    expected: len,
                    got: buf.len(),
                });
            }
            buf.extend_from_slice(&piece);
        }
        Ok(buf)
    }

    /// Like [`receive_exact`](Transport::receive_exact), except a stream
    /// already at end-of-file yields `None` instead of an error. A close
    /// in the middle of the `len` bytes is still an error.
    fn receive_exact_or_eof(&mut self, len: usize) -> Result<Option<Vec<u8>>> {
        let first = self.receive(len)?;
        if first.is_empty() {
            return Ok(None);
        }
        let mut buf = first;
        while buf.len() < len {
            let piece = self.receive(len - buf.len())?;
            if piece.is_empty() {
                return Err(Error::TransportClosed {
                    expected: len,
                    got: buf.len(),
                });
            }
            buf.extend_from_slice(&piece);
        }
        Ok(Some(buf))
    }
}
