// Initiator session: clearance handshake and the chunk exchange loop

use std::io::Write;
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::Rng;

use crate::chunking::{ChunkPlan, ChunkRange};
use crate::common::config::WireConfig;
use crate::common::error::{Error, Result};
use crate::protocol::{Packet, PacketCodec, PacketKind};
use crate::transport::Transport;

/// Phases an initiator session moves through. The session only ever moves
/// forward; a denied or failed exchange ends in `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingAgreement,
    Exchanging,
    Complete,
    Aborted,
}

/// How a session ended when no hard error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every chunk, and any remainder, was exchanged. The sink holds the
    /// transformed document.
    Completed(TransferSummary),
    /// The responder answered the initialization with the given kind
    /// instead of clearance. Nothing was exchanged.
    Denied(PacketKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSummary {
    pub chunks: u64,
    pub remainder_bits: u64,
    pub bits_exchanged: u64,
    pub elapsed: Duration,
}

/// Drives one document exchange over a transport, writing each reversed
/// chunk to the sink as soon as its answer arrives.
pub struct InitiatorSession<'a, T: Transport, W: Write> {
    codec: PacketCodec,
    transport: &'a mut T,
    sink: &'a mut W,
    state: SessionState,
}

impl<'a, T: Transport, W: Write> InitiatorSession<'a, T, W> {
    pub fn new(wire: WireConfig, transport: &'a mut T, sink: &'a mut W) -> Self {
        Self {
            codec: PacketCodec::new(wire),
            transport,
            sink,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the full exchange for `document`, a string of binary digit
    /// characters.
    pub fn run<R: Rng>(
        &mut self,
        document: &str,
        range: ChunkRange,
        rng: &mut R,
    ) -> Result<SessionOutcome> {
        let started = Instant::now();
        let plan = ChunkPlan::plan(document.len() as u64, range, rng);
        debug!(
            "planned {} chunks plus {} remainder bits for {} bit characters",
            plan.chunk_count(),
            plan.remainder_bits(),
            document.len()
        );

        self.send_initialization(&plan)?;
        if let Some(answered) = self.confirm_clearance()? {
            self.state = SessionState::Aborted;
            info!("responder denied clearance, answered with {:?}", answered);
            return Ok(SessionOutcome::Denied(answered));
        }

        self.state = SessionState::Exchanging;
        let bits_exchanged = self.exchange_chunks(document, &plan)?;
        self.state = SessionState::Complete;

        Ok(SessionOutcome::Completed(TransferSummary {
            chunks: plan.chunk_count(),
            remainder_bits: plan.remainder_bits(),
            bits_exchanged,
            elapsed: started.elapsed(),
        }))
    }

    fn send_initialization(&mut self, plan: &ChunkPlan) -> Result<()> {
        let init = self.codec.encode(&Packet::initialize(plan.chunk_count()));
        self.transport.send_all(&init)?;
        self.state = SessionState::AwaitingAgreement;
        debug!("announced {} chunks", plan.chunk_count());
        Ok(())
    }

    /// Reads the agreement-sized reply and checks its kind field. Returns
    /// `None` when clearance was granted, otherwise the kind the responder
    /// actually answered with.
    fn confirm_clearance(&mut self) -> Result<Option<PacketKind>> {
        let reply = self.transport.receive_exact(self.codec.agreement_len())?;
        let kind = self.codec.peek_kind(&reply)?;
        if kind == PacketKind::Agreement {
            Ok(None)
        } else {
            Ok(Some(kind))
        }
    }

    fn exchange_chunks(&mut self, document: &str, plan: &ChunkPlan) -> Result<u64> {
        let mut bits_exchanged = 0u64;

        for (index, (start, end)) in plan.ranges().enumerate() {
            let slice = &document[start as usize..end as usize];
            let reversed = self.exchange(Packet::reverse_request(slice.to_string()))?;
            info!(
                "chunk {}/{}: {} bit characters reversed",
                index + 1,
                plan.chunk_count(),
                reversed.len()
            );
            self.sink.write_all(reversed.as_bytes())?;
            self.sink.flush()?;
            bits_exchanged += end - start;
        }

        if plan.remainder_bits() > 0 {
            // The sub-byte tail travels with the request and answer kinds
            // swapped; the peer expects exactly this tagging.
            let tail = &document[plan.aligned_bits() as usize..];
            let reversed = self.exchange(Packet::reverse_answer(tail.to_string()))?;
            info!("remainder: {} bit characters reversed", reversed.len());
            self.sink.write_all(reversed.as_bytes())?;
            self.sink.flush()?;
            bits_exchanged += plan.remainder_bits();
        }

        Ok(bits_exchanged)
    }

    /// Sends one request and blocks for its reply, which is read at
    /// exactly the size of the request since the answer mirrors it byte
    /// for byte.
    fn exchange(&mut self, request: Packet) -> Result<String> {
        let encoded = self.codec.encode(&request);
        self.transport.send_all(&encoded)?;

        let reply = self.transport.receive_exact(encoded.len())?;
        let packet = self.codec.decode(&reply)?;
        let kind = packet.kind();
        packet.into_payload().ok_or_else(|| {
            Error::Protocol(format!("chunk reply of kind {:?} carries no payload", kind))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// In-memory responder. Each sent packet is decoded and the reply the
    /// wire protocol prescribes is queued for the next receive.
    struct EchoResponder {
        codec: PacketCodec,
        inbox: Vec<u8>,
        sent: Vec<Packet>,
        grant: bool,
        drop_chunk_replies: bool,
    }

    impl EchoResponder {
        fn new() -> Self {
            Self {
                codec: PacketCodec::new(WireConfig::default()),
                inbox: Vec::new(),
                sent: Vec::new(),
                grant: true,
                drop_chunk_replies: false,
            }
        }

        fn denying() -> Self {
            Self {
                grant: false,
                ..Self::new()
            }
        }

        fn vanishing_after_agreement() -> Self {
            Self {
                drop_chunk_replies: true,
                ..Self::new()
            }
        }

        fn reversed(payload: &str) -> String {
            payload.chars().rev().collect()
        }
    }

    impl Transport for EchoResponder {
        fn send(&mut self, bytes: &[u8]) -> Result<usize> {
            let packet = self.codec.decode(bytes)?;
            let reply = match &packet {
                Packet::Initialize { chunk_count } => {
                    if self.grant {
                        self.codec.encode(&Packet::Agreement)
                    } else {
                        self.codec.encode(&Packet::initialize(*chunk_count))
                    }
                }
                Packet::ReverseRequest { payload, .. } if !self.drop_chunk_replies => self
                    .codec
                    .encode(&Packet::reverse_answer(Self::reversed(payload))),
                Packet::ReverseAnswer { payload, .. } if !self.drop_chunk_replies => self
                    .codec
                    .encode(&Packet::reverse_request(Self::reversed(payload))),
                _ => Bytes::new(),
            };
            self.inbox.extend_from_slice(&reply);
            self.sent.push(packet);
            Ok(bytes.len())
        }

        fn receive(&mut self, max: usize) -> Result<Vec<u8>> {
            let take = max.min(self.inbox.len());
            Ok(self.inbox.drain(..take).collect())
        }
    }

    fn expected_output(document: &str, plan: &ChunkPlan) -> String {
        let mut out = String::new();
        for (start, end) in plan.ranges() {
            out.extend(document[start as usize..end as usize].chars().rev());
        }
        if plan.remainder_bits() > 0 {
            out.extend(document[plan.aligned_bits() as usize..].chars().rev());
        }
        out
    }

    fn run_session(
        responder: &mut EchoResponder,
        document: &str,
        range: ChunkRange,
        seed: u64,
    ) -> (Result<SessionOutcome>, Vec<u8>, SessionState) {
        let mut sink = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut session = InitiatorSession::new(WireConfig::default(), responder, &mut sink);
        let outcome = session.run(document, range, &mut rng);
        let state = session.state();
        (outcome, sink, state)
    }

    #[test]
    fn test_aligned_document_exchange() {
        let document = "0101101011001100";
        let range = ChunkRange::new(1, 2).unwrap();
        let mut responder = EchoResponder::new();

        let (outcome, sink, state) = run_session(&mut responder, document, range, 7);
        let summary = match outcome.unwrap() {
            SessionOutcome::Completed(summary) => summary,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(state, SessionState::Complete);
        assert_eq!(summary.remainder_bits, 0);
        assert_eq!(summary.bits_exchanged, 16);

        let plan = ChunkPlan::plan(16, range, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(summary.chunks, plan.chunk_count());
        assert_eq!(String::from_utf8(sink).unwrap(), expected_output(document, &plan));

        assert_eq!(
            responder.sent[0],
            Packet::Initialize {
                chunk_count: plan.chunk_count()
            }
        );
        let requests = &responder.sent[1..];
        assert_eq!(requests.len() as u64, plan.chunk_count());
        for request in requests {
            match request {
                Packet::ReverseRequest { payload, length } => {
                    assert_eq!(payload.len() % 8, 0);
                    assert_eq!(*length as usize, payload.len() / 8);
                }
                other => panic!("unexpected packet: {:?}", other),
            }
        }
    }

    #[test]
    fn test_remainder_is_answer_tagged() {
        let document = "01011010110011000110";
        let range = ChunkRange::new(1, 2).unwrap();
        let mut responder = EchoResponder::new();

        let (outcome, sink, _) = run_session(&mut responder, document, range, 3);
        let summary = match outcome.unwrap() {
            SessionOutcome::Completed(summary) => summary,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(summary.remainder_bits, 4);
        assert_eq!(summary.bits_exchanged, 20);

        let last = responder.sent.last().unwrap();
        assert_eq!(
            *last,
            Packet::ReverseAnswer {
                length: 0,
                payload: "0110".to_string()
            }
        );
        let answer_tagged = responder
            .sent
            .iter()
            .filter(|packet| packet.kind() == PacketKind::ReverseAnswer)
            .count();
        assert_eq!(answer_tagged, 1);

        let plan = ChunkPlan::plan(20, range, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(String::from_utf8(sink).unwrap(), expected_output(document, &plan));
    }

    #[test]
    fn test_denial_aborts_before_chunks() {
        let mut responder = EchoResponder::denying();
        let range = ChunkRange::new(1, 4).unwrap();

        let (outcome, sink, state) = run_session(&mut responder, "01011010", range, 5);

        assert_eq!(
            outcome.unwrap(),
            SessionOutcome::Denied(PacketKind::Initialize)
        );
        assert_eq!(state, SessionState::Aborted);
        assert!(sink.is_empty());
        assert_eq!(responder.sent.len(), 1);
        assert!(matches!(responder.sent[0], Packet::Initialize { .. }));
    }

    #[test]
    fn test_vanishing_responder() {
        let mut responder = EchoResponder::vanishing_after_agreement();
        let range = ChunkRange::new(1, 1).unwrap();

        let (outcome, sink, _) = run_session(&mut responder, "0101101011001100", range, 2);

        assert!(matches!(
            outcome.unwrap_err(),
            Error::TransportClosed { .. }
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_empty_document_session() {
        let mut responder = EchoResponder::new();
        let range = ChunkRange::new(1, 4).unwrap();

        let (outcome, sink, state) = run_session(&mut responder, "", range, 1);
        let summary = match outcome.unwrap() {
            SessionOutcome::Completed(summary) => summary,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(state, SessionState::Complete);
        assert_eq!(summary.chunks, 0);
        assert_eq!(summary.bits_exchanged, 0);
        assert!(sink.is_empty());
        assert_eq!(responder.sent, vec![Packet::Initialize { chunk_count: 0 }]);
    }
}
