// crates/pppoe-rs/src/discovery/wait.rs
//! Deadline-driven wait loops for PADO and PADS.
//!
//! Both loops share the same skeleton: compute an absolute deadline once,
//! then drain the discovery socket, silently skipping frames that are not
//! for us, until an acceptable packet arrives or the deadline expires.
//! Signal-interrupted waits are treated as spurious wakeups.

use super::interpret;
use super::{AcOffer, DiscoveryConnection, DiscoveryState};
use super::filter::packet_is_for_me;
use crate::frame::codec::DiscoveryPacket;
use crate::hal::{DiscoveryInterface, PppoeError};
use crate::types::{DiscoveryCode, SESSION_ID_RESERVED, SESSION_ID_UNSET};
use alloc::string::String;
use alloc::vec::Vec;
use log::{debug, info, trace, warn};

/// Receive buffer large enough for a maximum-size Ethernet frame.
pub(crate) const RX_BUFFER_SIZE: usize = 1518;

impl DiscoveryConnection {
    /// Parses a received frame and applies the host-identity filter.
    ///
    /// Returns `None` for anything that must be skipped, emitting the
    /// mandated diagnostics on the way out.
    fn parse_and_filter<'a>(&self, buffer: &'a [u8]) -> Option<DiscoveryPacket<'a>> {
        let packet = match DiscoveryPacket::parse(buffer) {
            Ok(packet) => packet,
            Err(PppoeError::BogusLength { declared, received }) => {
                warn!(
                    "dropping frame with bogus PPPoE length {} ({} bytes on the wire)",
                    declared, received
                );
                return None;
            }
            Err(e) => {
                trace!("ignoring non-discovery frame: {}", e);
                return None;
            }
        };
        if !packet_is_for_me(&packet, self.local_mac, self.config.host_uniq.as_deref()) {
            trace!("ignoring frame not addressed to this client");
            return None;
        }
        Some(packet)
    }

    /// Drains the socket until an acceptable PADO arrives or the deadline
    /// expires. Acceptance latches the peer MAC and moves the state to
    /// `ReceivedPado`; a timeout returns with the state unchanged.
    ///
    /// In probe mode (`offers` present) every distinct acceptable PADO is
    /// recorded instead, and the loop keeps draining until the deadline.
    pub(crate) fn wait_for_pado<I: DiscoveryInterface>(
        &mut self,
        iface: &mut I,
        timeout_us: u64,
        mut offers: Option<&mut Vec<AcOffer>>,
    ) -> Result<(), PppoeError> {
        let deadline = iface.now_us().saturating_add(timeout_us);
        let mut buffer = [0u8; RX_BUFFER_SIZE];
        loop {
            // One clock read per iteration; the deadline itself is cached.
            let now = iface.now_us();
            if now >= deadline {
                return Ok(());
            }
            let received = match iface.receive_frame(&mut buffer, deadline - now) {
                Ok(0) => continue,
                Ok(n) => n,
                // Spurious wakeup: recompute the remaining time and reissue.
                Err(PppoeError::Interrupted) => continue,
                Err(e) => return Err(e),
            };
            let Some(packet) = self.parse_and_filter(&buffer[..received]) else {
                continue;
            };
            if packet.code != DiscoveryCode::Pado {
                trace!("ignoring {:?} while waiting for PADO", packet.code);
                continue;
            }
            let source = packet.eth.source_mac;
            if source.is_broadcast() {
                warn!("ignoring PADO from broadcast source address");
                continue;
            }
            if let Some(required) = self.config.peer_mac {
                if source != required {
                    debug!("ignoring PADO from {} (bound to {})", source, required);
                    continue;
                }
            }
            let eval = interpret::evaluate_pado(&self.config, &packet);
            if eval.got_error && !self.config.persist {
                return Err(PppoeError::AcReportedError);
            }
            if !eval.acceptable() {
                debug!("rejecting unusable PADO from {}", source);
                continue;
            }
            let ac_name =
                String::from_utf8_lossy(eval.ac_name.as_deref().unwrap_or_default()).into_owned();
            if let Some(list) = offers.as_mut() {
                if !list.iter().any(|o| o.source == source && o.ac_name == ac_name) {
                    info!("found access concentrator {} at {}", ac_name, source);
                    self.num_pados += 1;
                    list.push(AcOffer {
                        ac_name,
                        service_name: String::from_utf8_lossy(
                            eval.service_name.as_deref().unwrap_or_default(),
                        )
                        .into_owned(),
                        cookie: eval.cookie.map(|tag| tag.value),
                        source,
                    });
                }
                // Probe mode keeps enumerating until the deadline.
                continue;
            }
            // Everything echoed in the PADR comes from exactly this offer.
            self.cookie = eval.cookie;
            self.relay_id = eval.relay_id;
            self.remote_max_payload = eval.max_payload;
            self.peer_mac = source;
            self.state = DiscoveryState::ReceivedPado;
            info!("accepted offer from {} ({})", source, ac_name);
            return Ok(());
        }
    }

    /// Drains the socket until a clean PADS arrives from the latched peer
    /// or the deadline expires. Acceptance binds the session id and moves
    /// the state to `Session`; a timeout returns with the state unchanged.
    pub(crate) fn wait_for_pads<I: DiscoveryInterface>(
        &mut self,
        iface: &mut I,
        timeout_us: u64,
    ) -> Result<(), PppoeError> {
        let deadline = iface.now_us().saturating_add(timeout_us);
        let mut buffer = [0u8; RX_BUFFER_SIZE];
        loop {
            let now = iface.now_us();
            if now >= deadline {
                return Ok(());
            }
            let received = match iface.receive_frame(&mut buffer, deadline - now) {
                Ok(0) => continue,
                Ok(n) => n,
                Err(PppoeError::Interrupted) => continue,
                Err(e) => return Err(e),
            };
            let Some(packet) = self.parse_and_filter(&buffer[..received]) else {
                continue;
            };
            // Only the concentrator we sent the PADR to may confirm.
            if packet.eth.source_mac != self.peer_mac {
                debug!(
                    "ignoring {:?} from {} (expected {})",
                    packet.code, packet.eth.source_mac, self.peer_mac
                );
                continue;
            }
            if packet.code != DiscoveryCode::Pads {
                trace!("ignoring {:?} while waiting for PADS", packet.code);
                continue;
            }
            interpret::interpret_pads(self, &packet);
            if self.pads_had_error {
                if self.config.persist {
                    debug!("discarding PADS carrying an error tag");
                    continue;
                }
                return Err(PppoeError::AcReportedError);
            }
            self.session = packet.session;
            self.state = DiscoveryState::Session;
            // RFC 2516 reserves 0x0000 and 0xFFFF; tolerate but flag them.
            if self.session == SESSION_ID_UNSET || self.session == SESSION_ID_RESERVED {
                warn!(
                    "access concentrator assigned non-RFC session id {:#06x}",
                    self.session
                );
            }
            info!("session {:#06x} established with {}", self.session, self.peer_mac);
            return Ok(());
        }
    }
}
