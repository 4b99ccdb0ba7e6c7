//! KiNET packet encoding (v1 DMXOUT, v2 PORTOUT)
//!
//! Packets are immutable values; encoding is a pure function to bytes.
//! Equality and hashing are structural and include the payload.

use kinet_core::UniverseFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First four bytes of every KiNET datagram
pub const KINET_MAGIC: u32 = 0x0401_DC4A;

/// Sync bit in the v2 flags field
pub const PORTOUT_FLAG_SYNC: u16 = 0x0001;

const V1_VERSION: u16 = 0x0001;
const V1_TYPE_DMXOUT: u16 = 0x0101;
const V1_HEADER_LEN: usize = 24;

const V2_VERSION: u16 = 0x0002;
const V2_TYPE_PORTOUT: u16 = 0x0108;
const V2_HEADER_LEN: usize = 22;
const V2_TRAILER_LEN: usize = 4;

/// Which packet variant to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// DMXOUT
    #[default]
    V1,
    /// PORTOUT
    V2,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

/// KiNET v1 DMXOUT packet
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DmxOutPacket {
    pub sequence: u32,
    pub port: u8,
    pub flags: u16,
    pub timer: u32,
    pub universe: u32,
    pub data: Vec<u8>,
}

impl DmxOutPacket {
    /// Packet for a universe with every other field at zero
    pub fn new(universe: u32, data: Vec<u8>) -> Self {
        Self {
            universe,
            data,
            ..Self::default()
        }
    }

    /// Append the wire bytes to `buf`
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(V1_HEADER_LEN + self.data.len());

        buf.extend_from_slice(&KINET_MAGIC.to_le_bytes());
        buf.extend_from_slice(&V1_VERSION.to_le_bytes());
        buf.extend_from_slice(&V1_TYPE_DMXOUT.to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.push(self.port);
        buf.push(0); // padding
        buf.extend_from_slice(&self.flags.to_le_bytes());
        buf.extend_from_slice(&self.timer.to_le_bytes());
        buf.extend_from_slice(&self.universe.to_le_bytes());
        buf.extend_from_slice(&self.data);
    }
}

/// KiNET v2 PORTOUT packet
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PortOutPacket {
    pub sequence: u32,
    /// Universe or port id
    pub universe: u32,
    pub port: u8,
    pub flags: u16,
    pub data: Vec<u8>,
}

impl PortOutPacket {
    /// Packet for a universe with every other field at zero
    pub fn new(universe: u32, data: Vec<u8>) -> Self {
        Self {
            universe,
            data,
            ..Self::default()
        }
    }

    /// Whether the sync flag is set
    pub fn is_sync(&self) -> bool {
        self.flags & PORTOUT_FLAG_SYNC != 0
    }

    /// Append the wire bytes to `buf`
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(V2_HEADER_LEN + self.data.len() + V2_TRAILER_LEN);

        // Payloads are at most one universe, far below u16::MAX
        let length = self.data.len().min(u16::MAX as usize) as u16;

        buf.extend_from_slice(&KINET_MAGIC.to_le_bytes());
        buf.extend_from_slice(&V2_VERSION.to_le_bytes());
        buf.extend_from_slice(&V2_TYPE_PORTOUT.to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.universe.to_le_bytes());
        buf.push(self.port);
        buf.push(0); // padding
        buf.extend_from_slice(&self.flags.to_le_bytes());
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&self.data);
        buf.extend_from_slice(&[0u8; V2_TRAILER_LEN]);
    }
}

/// A KiNET packet of either version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KinetPacket {
    DmxOut(DmxOutPacket),
    PortOut(PortOutPacket),
}

impl KinetPacket {
    /// Build a packet of the given version for one universe
    pub fn new(version: ProtocolVersion, universe: u32, data: Vec<u8>, sequence: u32) -> Self {
        match version {
            ProtocolVersion::V1 => Self::DmxOut(DmxOutPacket {
                sequence,
                ..DmxOutPacket::new(universe, data)
            }),
            ProtocolVersion::V2 => Self::PortOut(PortOutPacket {
                sequence,
                ..PortOutPacket::new(universe, data)
            }),
        }
    }

    /// Wrap a packed universe payload
    pub fn from_frame(version: ProtocolVersion, frame: &UniverseFrame, sequence: u32) -> Self {
        Self::new(version, frame.universe, frame.data.to_vec(), sequence)
    }

    /// Protocol version of this packet
    pub fn version(&self) -> ProtocolVersion {
        match self {
            Self::DmxOut(_) => ProtocolVersion::V1,
            Self::PortOut(_) => ProtocolVersion::V2,
        }
    }

    /// Addressed universe (port id for v2)
    pub fn universe(&self) -> u32 {
        match self {
            Self::DmxOut(p) => p.universe,
            Self::PortOut(p) => p.universe,
        }
    }

    /// Raw DMX payload
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::DmxOut(p) => &p.data,
            Self::PortOut(p) => &p.data,
        }
    }

    /// Size of the encoded datagram
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::DmxOut(p) => V1_HEADER_LEN + p.data.len(),
            Self::PortOut(p) => V2_HEADER_LEN + p.data.len() + V2_TRAILER_LEN,
        }
    }

    /// Encode to a fresh buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf
    }

    /// Append the wire bytes to `buf`
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Self::DmxOut(p) => p.encode_into(buf),
            Self::PortOut(p) => p.encode_into(buf),
        }
    }
}
