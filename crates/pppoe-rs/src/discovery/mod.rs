// crates/pppoe-rs/src/discovery/mod.rs
//! The discovery half of the PPPoE link-establishment handshake.
//!
//! The client broadcasts a PADI, collects PADO offers, requests one with a
//! PADR and ends up with a bound session id from the PADS. Everything here
//! runs on one logical thread of control; the connection record is mutated
//! only from within the wait loop and the driver.

pub mod driver;
pub mod filter;
pub mod interpret;
pub mod wait;

use crate::frame::basic::MacAddress;
use crate::frame::tag::RawTag;
use crate::types::PADI_TIMEOUT_S;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Service name sentinel: omit the Service-Name tag from PADI entirely.
///
/// Workaround for access concentrators that violate RFC 2516 by choking on
/// a zero-length Service-Name tag.
pub const NO_SERVICE_NAME_SENTINEL: &str = "NO-SERVICE-NAME-NON-RFC-COMPLIANT";

/// Discovery phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Initial,
    SentPadi,
    ReceivedPado,
    SentPadr,
    /// Terminal: a session id is bound.
    Session,
}

/// Static configuration for a discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Requested service. `None` sends a zero-length Service-Name tag;
    /// [`NO_SERVICE_NAME_SENTINEL`] omits the tag from PADI entirely.
    pub service_name: Option<String>,
    /// When set, offers naming any other access concentrator are rejected.
    pub ac_name: Option<String>,
    /// Opaque correlator sent in every packet; replies that do not echo it
    /// byte-for-byte are dropped.
    pub host_uniq: Option<Vec<u8>>,
    /// Restart discovery forever instead of giving up after the retry cap.
    pub persist: bool,
    /// Initial per-attempt timeout, in seconds. Doubled after each
    /// unsuccessful wait outside probe mode.
    pub discovery_timeout_s: u32,
    /// Skip the exchange and bind `session_id`/`peer_mac` directly.
    pub skip_discovery: bool,
    /// With `skip_discovery`: terminate the bound session with a PADT.
    pub kill_session: bool,
    /// Preset session id for `skip_discovery`.
    pub session_id: u16,
    /// Peer to bind with `skip_discovery`, or a required offer source otherwise.
    pub peer_mac: Option<MacAddress>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            service_name: None,
            ac_name: None,
            host_uniq: None,
            persist: false,
            discovery_timeout_s: PADI_TIMEOUT_S,
            skip_discovery: false,
            kill_session: false,
            session_id: 0,
            peer_mac: None,
        }
    }
}

/// Connection record for one discovery run.
///
/// Owned exclusively by the driver; the tag interpreters mutate it
/// synchronously from within the wait loop.
#[derive(Debug)]
pub struct DiscoveryConnection {
    pub(crate) config: DiscoveryConfig,
    pub(crate) local_mac: MacAddress,
    pub(crate) peer_mac: MacAddress,
    pub(crate) state: DiscoveryState,
    pub(crate) session: u16,
    /// AC-Cookie captured from the accepted PADO, echoed verbatim in PADR.
    pub(crate) cookie: Option<RawTag>,
    /// Relay-Session-Id captured from PADO or PADS, echoed verbatim.
    pub(crate) relay_id: Option<RawTag>,
    /// PPP-Max-Payload advertised by the concentrator (RFC 4638), when valid.
    pub(crate) remote_max_payload: Option<u16>,
    /// Error tag seen while interpreting a PADS.
    pub(crate) pads_had_error: bool,
    /// Distinct offers recorded during a probe.
    pub num_pados: u32,
    pub padi_attempts: u32,
    pub padr_attempts: u32,
}

impl DiscoveryConnection {
    pub fn new(local_mac: MacAddress, config: DiscoveryConfig) -> Self {
        Self {
            config,
            local_mac,
            peer_mac: MacAddress::BROADCAST,
            state: DiscoveryState::Initial,
            session: 0,
            cookie: None,
            relay_id: None,
            remote_max_payload: None,
            pads_had_error: false,
            num_pados: 0,
            padi_attempts: 0,
            padr_attempts: 0,
        }
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    pub fn local_mac(&self) -> MacAddress {
        self.local_mac
    }

    /// The access concentrator the client latched onto. Broadcast until a
    /// PADO has been accepted.
    pub fn peer_mac(&self) -> MacAddress {
        self.peer_mac
    }

    /// The session id bound by the PADS exchange, in host order.
    /// Meaningful only in [`DiscoveryState::Session`].
    pub fn session_id(&self) -> u16 {
        self.session
    }

    /// The MRU the concentrator advertised via PPP-Max-Payload, if any.
    pub fn remote_max_payload(&self) -> Option<u16> {
        self.remote_max_payload
    }
}

/// One access concentrator discovered in probe mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcOffer {
    pub ac_name: String,
    pub service_name: String,
    pub cookie: Option<Vec<u8>>,
    pub source: MacAddress,
}

impl fmt::Display for AcOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) service '{}'",
            self.ac_name, self.source, self.service_name
        )?;
        if let Some(cookie) = &self.cookie {
            write!(f, " cookie {}", hex::encode(cookie))?;
        }
        Ok(())
    }
}
