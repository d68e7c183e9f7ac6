// Packet kinds and their in-memory representation

use crate::common::error::Error;

/// Discriminant carried in every packet's leading kind field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketKind {
    Initialize = 1,
    Agreement = 2,
    ReverseRequest = 3,
    ReverseAnswer = 4,
}

impl PacketKind {
    pub fn tag(&self) -> u64 {
        *self as u64
    }
}

impl TryFrom<u64> for PacketKind {
    type Error = Error;

    fn try_from(tag: u64) -> Result<Self, Error> {
        match tag {
            1 => Ok(PacketKind::Initialize),
            2 => Ok(PacketKind::Agreement),
            3 => Ok(PacketKind::ReverseRequest),
            4 => Ok(PacketKind::ReverseAnswer),
            other => Err(Error::MalformedPacket(format!("unknown kind tag {}", other))),
        }
    }
}

/// One protocol packet.
///
/// `ReverseRequest` and `ReverseAnswer` share a layout; only the kind tag
/// tells them apart. Their `length` field holds the payload's byte-length
/// floor (`payload.len() / 8`), so the trailing sub-byte remainder always
/// travels with a length of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Initialize { chunk_count: u64 },
    Agreement,
    ReverseRequest { length: u64, payload: String },
    ReverseAnswer { length: u64, payload: String },
}

impl Packet {
    pub fn initialize(chunk_count: u64) -> Self {
        Packet::Initialize { chunk_count }
    }

    pub fn reverse_request(payload: String) -> Self {
        let length = (payload.len() / 8) as u64;
        Packet::ReverseRequest { length, payload }
    }

    pub fn reverse_answer(payload: String) -> Self {
        let length = (payload.len() / 8) as u64;
        Packet::ReverseAnswer { length, payload }
    }

    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Initialize { .. } => PacketKind::Initialize,
            Packet::Agreement => PacketKind::Agreement,
            Packet::ReverseRequest { .. } => PacketKind::ReverseRequest,
            Packet::ReverseAnswer { .. } => PacketKind::ReverseAnswer,
        }
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            Packet::ReverseRequest { payload, .. } | Packet::ReverseAnswer { payload, .. } => {
                Some(payload)
            }
            _ => None,
        }
    }

    pub fn into_payload(self) -> Option<String> {
        match self {
            Packet::ReverseRequest { payload, .. } | Packet::ReverseAnswer { payload, .. } => {
                Some(payload)
            }
            _ => None,
        }
    }
}
