//! Bit-field packet codec.
//!
//! Every header field is written as zero-padded, most-significant-first
//! binary digit characters, one transport byte per digit. With the default
//! widths (kind 2 logical bytes, length 4 logical bytes) the layouts are:
//!
//! ```text
//! Initialize                        48 wire bytes
//! +------------------+--------------------------+
//! | kind (16 digits) | chunk count (32 digits)  |
//! +------------------+--------------------------+
//!
//! Agreement                         16 wire bytes
//! +------------------+
//! | kind (16 digits) |
//! +------------------+
//!
//! ReverseRequest / ReverseAnswer    48 wire bytes + payload
//! +------------------+--------------------------+-----------------+
//! | kind (16 digits) | length (32 digits)       | bit characters  |
//! +------------------+--------------------------+-----------------+
//! ```
//!
//! The payload is not length-prefixed by its own exact size: `length` is a
//! byte-length floor and the remainder packet carries up to seven digits
//! past it. Decoding therefore treats everything after the header as
//! payload and leaves framing to the session layer.

use bytes::{Bytes, BytesMut};

use crate::common::config::WireConfig;
use crate::common::error::{Error, Result};
use crate::protocol::packet::{Packet, PacketKind};

#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    wire: WireConfig,
}

impl PacketCodec {
    pub fn new(wire: WireConfig) -> Self {
        Self { wire }
    }

    /// Wire length of a full header (kind field plus auxiliary field).
    pub fn header_len(&self) -> usize {
        self.wire.type_bits() + self.wire.len_bits()
    }

    /// Wire length of an `Agreement` packet, which is a kind field alone.
    pub fn agreement_len(&self) -> usize {
        self.wire.type_bits()
    }

    pub fn encode(&self, packet: &Packet) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len(packet));
        self.put_field(&mut buf, packet.kind().tag(), self.wire.type_bits());
        match packet {
            Packet::Initialize { chunk_count } => {
                self.put_field(&mut buf, *chunk_count, self.wire.len_bits());
            }
            Packet::Agreement => {}
            Packet::ReverseRequest { length, payload }
            | Packet::ReverseAnswer { length, payload } => {
                self.put_field(&mut buf, *length, self.wire.len_bits());
                buf.extend_from_slice(payload.as_bytes());
            }
        }
        buf.freeze()
    }

    /// Reads only the leading kind field. The agreement check uses this on
    /// an agreement-sized read, so a longer packet behind it is ignored.
    pub fn peek_kind(&self, bytes: &[u8]) -> Result<PacketKind> {
        let tag = self.read_field(bytes, 0, self.wire.type_bits())?;
        PacketKind::try_from(tag)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Packet> {
        let kind = self.peek_kind(bytes)?;
        match kind {
            PacketKind::Initialize => {
                let chunk_count =
                    self.read_field(bytes, self.wire.type_bits(), self.wire.len_bits())?;
                Ok(Packet::Initialize { chunk_count })
            }
            PacketKind::Agreement => Ok(Packet::Agreement),
            PacketKind::ReverseRequest | PacketKind::ReverseAnswer => {
                let length =
                    self.read_field(bytes, self.wire.type_bits(), self.wire.len_bits())?;
                let payload = std::str::from_utf8(&bytes[self.header_len()..])
                    .map_err(|_| {
                        Error::MalformedPacket("payload is not valid UTF-8".to_string())
                    })?
                    .to_string();
                Ok(match kind {
                    PacketKind::ReverseRequest => Packet::ReverseRequest { length, payload },
                    _ => Packet::ReverseAnswer { length, payload },
                })
            }
        }
    }

    fn encoded_len(&self, packet: &Packet) -> usize {
        match packet {
            Packet::Initialize { .. } => self.header_len(),
            Packet::Agreement => self.agreement_len(),
            Packet::ReverseRequest { payload, .. } | Packet::ReverseAnswer { payload, .. } => {
                self.header_len() + payload.len()
            }
        }
    }

    /// Writes `value` as exactly `width` binary digit characters. A value
    /// too wide for its field is a caller bug, not a wire condition.
    fn put_field(&self, buf: &mut BytesMut, value: u64, width: usize) {
        let field = format!("{:0width$b}", value, width = width);
        assert!(
            field.len() == width,
            "field value {} does not fit in {} binary digits",
            value,
            width
        );
        buf.extend_from_slice(field.as_bytes());
    }

    fn read_field(&self, bytes: &[u8], start: usize, width: usize) -> Result<u64> {
        let end = start + width;
        if bytes.len() < end {
            return Err(Error::MalformedPacket(format!(
                "truncated header: need {} bytes, got {}",
                end,
                bytes.len()
            )));
        }
        let digits = std::str::from_utf8(&bytes[start..end])
            .map_err(|_| Error::MalformedPacket("header field is not ASCII".to_string()))?;
        u64::from_str_radix(digits, 2).map_err(|_| {
            Error::MalformedPacket(format!("non-binary digit in header field {:?}", digits))
        })
    }
}
