// crates/pppoe-rs/src/discovery/filter.rs
//! Host-identity filtering, applied before any tag interpretation.

use crate::frame::basic::MacAddress;
use crate::frame::codec::DiscoveryPacket;
use crate::frame::tag::Tag;

/// Decides whether an arriving frame is addressed to this client.
///
/// The destination MAC must be ours. When a Host-Uniq correlator is
/// configured, the frame must additionally carry a Host-Uniq tag whose value
/// matches byte-for-byte; this runs before any code-specific interpretation,
/// so replies meant for other clients behind a shared MAC never reach the
/// interpreters. Broadcast-source PADOs are rejected later by the driver,
/// not here.
pub fn packet_is_for_me(
    packet: &DiscoveryPacket<'_>,
    local_mac: MacAddress,
    host_uniq: Option<&[u8]>,
) -> bool {
    if packet.eth.destination_mac != local_mac {
        return false;
    }
    match host_uniq {
        None => true,
        Some(expected) => packet
            .tags()
            .any(|tag| matches!(tag, Tag::HostUniq(value) if value == expected)),
    }
}
