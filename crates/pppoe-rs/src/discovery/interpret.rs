// crates/pppoe-rs/src/discovery/interpret.rs
//! Tag interpreters for PADO and PADS payloads.

use super::{DiscoveryConfig, DiscoveryConnection};
use crate::frame::codec::DiscoveryPacket;
use crate::frame::tag::{RawTag, Tag};
use crate::types::PPPOE_MTU;
use alloc::string::String;
use alloc::vec::Vec;
use log::{debug, error, warn};

/// Per-frame evaluation record built while walking a PADO's tags.
///
/// The `*_ok` flags start out true when the corresponding option is
/// unconfigured ("accept anything") and false otherwise. Echo tags are
/// captured here first; the wait loop copies them into the connection only
/// when the offer is actually accepted.
#[derive(Debug, Default)]
pub struct PadoEvaluation {
    /// AC-Name value, when the tag was present.
    pub ac_name: Option<Vec<u8>>,
    /// Service-Name value, when the tag was present.
    pub service_name: Option<Vec<u8>>,
    /// The offer satisfies the configured access concentrator name.
    pub ac_name_ok: bool,
    /// The offer satisfies the configured service.
    pub service_name_ok: bool,
    /// An error tag was present.
    pub got_error: bool,
    /// AC-Cookie snapshot, to be echoed verbatim in PADR.
    pub cookie: Option<RawTag>,
    /// Relay-Session-Id snapshot, to be echoed verbatim.
    pub relay_id: Option<RawTag>,
    /// Validated PPP-Max-Payload advertisement (RFC 4638).
    pub max_payload: Option<u16>,
}

impl PadoEvaluation {
    /// The offer is usable: both identity tags present, both constraints
    /// met, and no error reported.
    pub fn acceptable(&self) -> bool {
        self.ac_name.is_some()
            && self.service_name.is_some()
            && self.ac_name_ok
            && self.service_name_ok
            && !self.got_error
    }
}

fn log_error_tag(name: &str, value: &[u8]) {
    error!("{} from access concentrator: {}", name, String::from_utf8_lossy(value));
}

/// RFC 4638: a well-formed PPP-Max-Payload carries a 16-bit MRU no smaller
/// than the standard PPPoE MTU. Anything else is ignored.
fn parse_max_payload(value: &[u8]) -> Option<u16> {
    match <[u8; 2]>::try_from(value) {
        Ok(raw) => {
            let mru = u16::from_be_bytes(raw);
            if mru >= PPPOE_MTU {
                Some(mru)
            } else {
                warn!("ignoring PPP-Max-Payload below the standard PPPoE MTU: {}", mru);
                None
            }
        }
        Err(_) => {
            warn!("ignoring PPP-Max-Payload tag of length {}", value.len());
            None
        }
    }
}

/// Walks a PADO's tags, filling an evaluation record.
pub(crate) fn evaluate_pado(
    config: &DiscoveryConfig,
    packet: &DiscoveryPacket<'_>,
) -> PadoEvaluation {
    let mut eval = PadoEvaluation {
        ac_name_ok: config.ac_name.is_none(),
        service_name_ok: config.service_name.is_none(),
        ..PadoEvaluation::default()
    };

    for tag in packet.tags() {
        match tag {
            Tag::AcName(value) => {
                if let Some(want) = &config.ac_name {
                    eval.ac_name_ok = value == want.as_bytes();
                }
                eval.ac_name = Some(value.to_vec());
            }
            Tag::ServiceName(value) => {
                // A zero-length service always matches the "any service"
                // policy, even against a configured name.
                if value.is_empty() {
                    eval.service_name_ok = true;
                } else if let Some(want) = &config.service_name {
                    eval.service_name_ok = value == want.as_bytes();
                }
                eval.service_name = Some(value.to_vec());
            }
            Tag::AcCookie(_) => eval.cookie = Some(RawTag::capture(&tag)),
            Tag::RelaySessionId(_) => eval.relay_id = Some(RawTag::capture(&tag)),
            Tag::PppMaxPayload(value) => {
                if let Some(mru) = parse_max_payload(value) {
                    eval.max_payload = Some(mru);
                }
            }
            Tag::ServiceNameError(value) => {
                eval.got_error = true;
                log_error_tag("Service-Name-Error", value);
            }
            Tag::AcSystemError(value) => {
                eval.got_error = true;
                log_error_tag("AC-System-Error", value);
            }
            Tag::GenericError(value) => {
                eval.got_error = true;
                log_error_tag("Generic-Error", value);
            }
            Tag::HostUniq(_) | Tag::Unknown { .. } => {}
        }
    }
    eval
}

/// Walks a PADS's tags, latching the relay id and the error flag into the
/// connection.
pub(crate) fn interpret_pads(conn: &mut DiscoveryConnection, packet: &DiscoveryPacket<'_>) {
    conn.pads_had_error = false;
    for tag in packet.tags() {
        match tag {
            Tag::ServiceName(value) => {
                debug!("PADS confirmed service '{}'", String::from_utf8_lossy(value));
            }
            Tag::RelaySessionId(_) => conn.relay_id = Some(RawTag::capture(&tag)),
            Tag::PppMaxPayload(value) => {
                if let Some(mru) = parse_max_payload(value) {
                    conn.remote_max_payload = Some(mru);
                }
            }
            Tag::ServiceNameError(value) => {
                conn.pads_had_error = true;
                log_error_tag("Service-Name-Error", value);
            }
            Tag::AcSystemError(value) => {
                conn.pads_had_error = true;
                log_error_tag("AC-System-Error", value);
            }
            Tag::GenericError(value) => {
                conn.pads_had_error = true;
                log_error_tag("Generic-Error", value);
            }
            _ => {}
        }
    }
}
