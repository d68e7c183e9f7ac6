// Client module - initiator side of the exchange

mod session;

pub use session::{InitiatorSession, SessionOutcome, SessionState, TransferSummary};

use std::io::Write;

use log::info;
use rand::Rng;

use crate::common::config::ClientConfig;
use crate::common::error::Result;
use crate::transport::TcpTransport;

/// Connects to the responder and exchanges `document`, writing reversed
/// chunks to `sink` as they arrive.
pub fn transfer<W: Write, R: Rng>(
    config: &ClientConfig,
    document: &str,
    sink: &mut W,
    rng: &mut R,
) -> Result<SessionOutcome> {
    info!("connecting to {}", config.server_addr);
    let mut transport = TcpTransport::connect(config.server_addr)?;

    let mut session = InitiatorSession::new(config.wire, &mut transport, sink);
    session.run(document, config.chunk_range, rng)
}
