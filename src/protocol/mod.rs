// Protocol module - packet definitions and the wire codec

pub mod codec;
pub mod packet;

pub use codec::PacketCodec;
pub use packet::{Packet, PacketKind};
