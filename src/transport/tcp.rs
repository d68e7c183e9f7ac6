// Plain TCP adapter for the transport seam

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};

use log::debug;

use crate::common::error::Result;
use crate::transport::Transport;

const RECV_BUFFER_LEN: usize = 65535;

pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        debug!("connected to {}", addr);
        Self::new(stream)
    }

    /// Wraps an already established stream, e.g. one from an accept loop.
    pub fn new(stream: TcpStream) -> Result<Self> {
        // Packets are tiny; waiting for coalescing only adds latency.
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        Ok(self.stream.write(bytes)?)
    }

    fn receive(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; max.min(RECV_BUFFER_LEN)];
        let n = self.stream.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    use crate::common::error::Error;

    #[test]
    fn test_loopback_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let peer = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut transport = TcpTransport::new(stream).unwrap();
            let request = transport.receive_exact(4).unwrap();
            assert_eq!(request, b"0110");
            transport.send_all(b"01101011").unwrap();
        });

        let mut transport = TcpTransport::connect(addr).unwrap();
        transport.send_all(b"0110").unwrap();
        assert_eq!(transport.receive_exact(8).unwrap(), b"01101011");
        peer.join().unwrap();
    }

    #[test]
    fn test_early_close_is_transport_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let peer = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut transport = TcpTransport::new(stream).unwrap();
            transport.send_all(b"01").unwrap();
            // Dropping here closes the stream with six bytes still owed.
        });

        let mut transport = TcpTransport::connect(addr).unwrap();
        let err = transport.receive_exact(8).unwrap_err();
        assert!(matches!(
            err,
            Error::TransportClosed {
                expected: 8,
                got: 2
            }
        ));
        peer.join().unwrap();
    }

    #[test]
    fn test_clean_eof_reads_as_none() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let peer = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let mut transport = TcpTransport::connect(addr).unwrap();
        assert_eq!(transport.receive_exact_or_eof(16).unwrap(), None);
        peer.join().unwrap();
    }
}
