//! KiNET output system
//!
//! KiNET is a little-endian UDP protocol for driving LED fixture
//! controllers. Every datagram starts with the magic `0x0401DC4A`.
//!
//! ## v1 DMXOUT (type 0x0101)
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | magic |
//! | 4 | 2 | version (0x0001) |
//! | 6 | 2 | type (0x0101) |
//! | 8 | 4 | sequence |
//! | 12 | 1 | port |
//! | 13 | 1 | padding |
//! | 14 | 2 | flags |
//! | 16 | 4 | timer |
//! | 20 | 4 | universe |
//! | 24 | n | payload |
//!
//! There is no length field; receivers use the datagram size minus 24.
//!
//! ## v2 PORTOUT (type 0x0108)
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | magic |
//! | 4 | 2 | version (0x0002) |
//! | 6 | 2 | type (0x0108) |
//! | 8 | 4 | sequence |
//! | 12 | 4 | universe / port id |
//! | 16 | 1 | port |
//! | 17 | 1 | padding |
//! | 18 | 2 | flags (bit 0 = sync) |
//! | 20 | 2 | payload length |
//! | 22 | n | payload |
//! | 22 + n | 4 | zero trailer |
//!
//! The whole v2 frame is `26 + n` bytes.
//!
//! ## Example Usage
//!
//! ```rust
//! use kinet_control::kinet::{KinetPacket, ProtocolVersion, KINET_MAGIC};
//!
//! let packet = KinetPacket::new(ProtocolVersion::V2, 2, vec![0, 255, 0], 0);
//! let bytes = packet.encode();
//! assert_eq!(bytes[0..4], KINET_MAGIC.to_le_bytes());
//! assert_eq!(bytes.len(), 26 + 3);
//! ```

pub mod packet;
pub mod sender;

pub use packet::{
    DmxOutPacket, KinetPacket, PortOutPacket, ProtocolVersion, KINET_MAGIC, PORTOUT_FLAG_SYNC,
};
pub use sender::{KinetSender, DEFAULT_KINET_PORT};
