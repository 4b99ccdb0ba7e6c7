//! KinetPlayer Control - Fixture Controller Output
//!
//! This crate turns packed DMX universes into KiNET datagrams:
//! - **Codec**: KiNET v1 DMXOUT and v2 PORTOUT packet encoding
//! - **Transport**: best-effort UDP sender with a lazily created socket
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kinet_control::{KinetPacket, KinetSender, ProtocolVersion};
//!
//! # async fn demo() {
//! let sender = KinetSender::new("10.0.0.20");
//! let packet = KinetPacket::new(ProtocolVersion::V1, 1, vec![255, 0, 0], 0);
//! sender.send(&packet).await;
//! sender.close();
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`kinet`] - KiNET packets and sender
//! - [`error`] - Error types

#![allow(missing_docs)]

/// Error types
pub mod error;

/// KiNET output
pub mod kinet;

// Re-exports
pub use error::{ControlError, Result};
pub use kinet::{
    DmxOutPacket, KinetPacket, KinetSender, PortOutPacket, ProtocolVersion, DEFAULT_KINET_PORT,
    KINET_MAGIC, PORTOUT_FLAG_SYNC,
};
