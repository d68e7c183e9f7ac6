// Responder session: clearance policy and the reverse-echo loop

use log::{debug, warn};

use crate::chunking::MAX_REMAINDER_BITS;
use crate::common::config::WireConfig;
use crate::common::error::{Error, Result};
use crate::protocol::{Packet, PacketCodec, PacketKind};
use crate::transport::Transport;

/// What one responder session did, for the accept loop's log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub granted: bool,
    pub chunks: u64,
    pub remainder_bits: u64,
}

/// Answers one initiator over a transport: grants or refuses clearance,
/// then reverses every chunk it is sent until the initiator hangs up.
pub struct ResponderSession<'a, T: Transport> {
    codec: PacketCodec,
    transport: &'a mut T,
    max_chunks: Option<u64>,
}

impl<'a, T: Transport> ResponderSession<'a, T> {
    pub fn new(wire: WireConfig, max_chunks: Option<u64>, transport: &'a mut T) -> Self {
        Self {
            codec: PacketCodec::new(wire),
            transport,
            max_chunks,
        }
    }

    pub fn run(&mut self) -> Result<SessionReport> {
        let header = self.transport.receive_exact(self.codec.header_len())?;
        let announced = match self.codec.decode(&header)? {
            Packet::Initialize { chunk_count } => chunk_count,
            other => {
                return Err(Error::Protocol(format!(
                    "expected an initialization, got {:?}",
                    other.kind()
                )))
            }
        };
        debug!("initiator announced {} chunks", announced);

        if let Some(cap) = self.max_chunks {
            if announced > cap {
                // Refusal echoes the initialization back. Its kind field is
                // not Agreement, which the initiator reads as denial.
                warn!("refusing session: {} chunks exceeds cap of {}", announced, cap);
                let echo = self.codec.encode(&Packet::initialize(announced));
                self.transport.send_all(&echo)?;
                return Ok(SessionReport {
                    granted: false,
                    chunks: 0,
                    remainder_bits: 0,
                });
            }
        }

        self.transport.send_all(&self.codec.encode(&Packet::Agreement))?;

        for index in 0..announced {
            self.answer_chunk(index)?;
        }
        let remainder_bits = self.answer_remainder()?;

        Ok(SessionReport {
            granted: true,
            chunks: announced,
            remainder_bits,
        })
    }

    /// Reads one whole-byte chunk request, framed by its own length field,
    /// and answers with the payload reversed.
    fn answer_chunk(&mut self, index: u64) -> Result<()> {
        let header = self.transport.receive_exact(self.codec.header_len())?;
        let length = match self.codec.decode(&header)? {
            Packet::ReverseRequest { length, .. } => length,
            other => {
                return Err(Error::Protocol(format!(
                    "expected a reverse request, got {:?}",
                    other.kind()
                )))
            }
        };

        let payload = self.transport.receive_exact((length * 8) as usize)?;
        let payload = String::from_utf8(payload)
            .map_err(|_| Error::MalformedPacket("chunk payload is not valid UTF-8".to_string()))?;
        debug!("chunk {}: reversing {} bit characters", index, payload.len());

        let reversed: String = payload.chars().rev().collect();
        self.transport
            .send_all(&self.codec.encode(&Packet::reverse_answer(reversed)))
    }

    /// Handles the optional sub-byte tail. It arrives answer-tagged with a
    /// length field of zero, so the header says nothing about its size; one
    /// bounded read picks up the one to seven trailing bit characters,
    /// which travel in the same send as their header. A clean close here
    /// means the document was byte-aligned and the session is over.
    fn answer_remainder(&mut self) -> Result<u64> {
        let header = match self
            .transport
            .receive_exact_or_eof(self.codec.header_len())?
        {
            Some(header) => header,
            None => return Ok(0),
        };

        let packet = self.codec.decode(&header)?;
        if packet.kind() != PacketKind::ReverseAnswer {
            return Err(Error::Protocol(format!(
                "expected a remainder packet, got {:?}",
                packet.kind()
            )));
        }

        let tail = self.transport.receive(MAX_REMAINDER_BITS)?;
        if tail.is_empty() {
            return Err(Error::TransportClosed {
                expected: 1,
                got: 0,
            });
        }
        let payload = String::from_utf8(tail).map_err(|_| {
            Error::MalformedPacket("remainder payload is not valid UTF-8".to_string())
        })?;
        debug!("remainder: reversing {} bit characters", payload.len());

        let reversed: String = payload.chars().rev().collect();
        self.transport
            .send_all(&self.codec.encode(&Packet::reverse_request(reversed)))?;
        Ok(payload.len() as u64)
    }
}
