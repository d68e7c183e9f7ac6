// Server module - responder side of the exchange

mod session;

pub use session::{ResponderSession, SessionReport};

use std::net::{SocketAddr, TcpListener, TcpStream};

use log::{error, info};

use crate::common::config::ServerConfig;
use crate::common::error::Result;
use crate::transport::TcpTransport;

/// TCP responder that serves reversal sessions one connection at a time.
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
}

impl Server {
    pub fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr)?;
        info!("listening on {}", listener.local_addr()?);
        Ok(Self { config, listener })
    }

    /// The bound address, with the real port when binding asked for port
    /// zero.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts and serves connections forever. A session that fails only
    /// takes its own connection down; the loop moves on to the next one.
    pub fn run(&self) -> Result<()> {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept failed: {}", e);
                    continue;
                }
            };
            match self.handle(stream) {
                Ok(report) if report.granted => info!(
                    "session complete: {} chunks plus {} remainder bits",
                    report.chunks, report.remainder_bits
                ),
                Ok(_) => info!("session refused"),
                Err(e) => error!("session failed: {}", e),
            }
        }
        Ok(())
    }

    /// Accepts a single connection, serves it, and returns its report.
    pub fn serve_one(&self) -> Result<SessionReport> {
        let (stream, _) = self.listener.accept()?;
        self.handle(stream)
    }

    fn handle(&self, stream: TcpStream) -> Result<SessionReport> {
        if let Ok(peer) = stream.peer_addr() {
            info!("connection from {}", peer);
        }
        let mut transport = TcpTransport::new(stream)?;
        let mut session =
            ResponderSession::new(self.config.wire, self.config.max_chunks, &mut transport);
        session.run()
    }
}
