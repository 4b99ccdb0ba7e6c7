//! Best-effort KiNET transport
//!
//! Delivery is at most once: failures are logged and dropped, nothing is
//! retried.

use super::packet::KinetPacket;
use crate::{error::ControlError, Result};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Default KiNET UDP port
pub const DEFAULT_KINET_PORT: u16 = 6038;

/// KiNET sender for one destination controller
///
/// The UDP socket is created on the first send and reused afterwards.
/// The destination is resolved on every send, so a DNS change takes effect
/// on the next packet.
#[derive(Debug)]
pub struct KinetSender {
    destination: String,
    port: u16,
    socket: Mutex<Option<Arc<UdpSocket>>>,
}

impl KinetSender {
    /// Create a sender for `destination` (host name or IP) on the default port
    pub fn new(destination: impl Into<String>) -> Self {
        Self::with_port(destination, DEFAULT_KINET_PORT)
    }

    /// Create a sender for `destination` on a specific UDP port
    pub fn with_port(destination: impl Into<String>, port: u16) -> Self {
        Self {
            destination: destination.into(),
            port,
            socket: Mutex::new(None),
        }
    }

    /// Destination host
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Destination UDP port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether a socket is currently open
    pub fn has_socket(&self) -> bool {
        self.socket.lock().is_some()
    }

    /// Send a packet, logging and discarding any failure
    pub async fn send(&self, packet: &KinetPacket) {
        if let Err(e) = self.try_send(packet).await {
            tracing::warn!(
                "Dropped KiNET packet for universe {} -> {}:{}: {}",
                packet.universe(),
                self.destination,
                self.port,
                e
            );
        }
    }

    /// Send a packet and report the outcome
    ///
    /// Returns the number of bytes written.
    pub async fn try_send(&self, packet: &KinetPacket) -> Result<usize> {
        let socket = self.socket()?;
        let target = self.resolve().await?;

        let bytes = packet.encode();
        let written = socket.send_to(&bytes, target).await?;

        tracing::trace!(
            "Sent KiNET {} packet for universe {} ({} bytes) to {}",
            packet.version(),
            packet.universe(),
            written,
            target
        );

        Ok(written)
    }

    /// Release the socket.
    ///
    /// A send already in flight keeps its own handle and finishes on its own.
    /// The next send opens a new socket.
    pub fn close(&self) {
        if self.socket.lock().take().is_some() {
            tracing::debug!("KiNET sender socket closed ({})", self.destination);
        }
    }

    fn socket(&self) -> Result<Arc<UdpSocket>> {
        let mut slot = self.socket.lock();
        if let Some(socket) = slot.as_ref() {
            return Ok(Arc::clone(socket));
        }

        let std_socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
        std_socket.set_broadcast(true)?;
        std_socket.set_nonblocking(true)?;
        let socket = Arc::new(UdpSocket::from_std(std_socket)?);

        tracing::info!(
            "KiNET sender socket opened on {:?} -> {}:{}",
            socket.local_addr().ok(),
            self.destination,
            self.port
        );

        *slot = Some(Arc::clone(&socket));
        Ok(socket)
    }

    async fn resolve(&self) -> Result<SocketAddr> {
        let resolve_error = |reason: String| ControlError::Resolve {
            host: self.destination.clone(),
            reason,
        };

        let addrs: Vec<SocketAddr> =
            tokio::net::lookup_host((self.destination.as_str(), self.port))
                .await
                .map_err(|e| resolve_error(e.to_string()))?
                .collect();

        // The socket is bound to an IPv4 wildcard
        addrs
            .iter()
            .copied()
            .find(SocketAddr::is_ipv4)
            .or_else(|| addrs.first().copied())
            .ok_or_else(|| resolve_error("no addresses returned".to_string()))
    }
}

impl Drop for KinetSender {
    fn drop(&mut self) {
        self.close();
    }
}
