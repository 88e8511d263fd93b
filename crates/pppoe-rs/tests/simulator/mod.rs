// crates/pppoe-rs/tests/simulator/mod.rs
pub mod interface;

pub use interface::{Responder, SimulatedInterface};

use pppoe_rs::frame::basic::MacAddress;
use pppoe_rs::frame::codec::{DiscoveryBuilder, DiscoveryPacket};
use pppoe_rs::frame::tag::{
    TAG_AC_COOKIE, TAG_AC_NAME, TAG_HOST_UNIQ, TAG_PPP_MAX_PAYLOAD, TAG_RELAY_SESSION_ID,
    TAG_SERVICE_NAME, Tag,
};
use pppoe_rs::types::DiscoveryCode;

/// A scripted access concentrator living on the virtual segment.
///
/// Answers PADIs with a PADO and PADRs addressed to it with a PADS,
/// echoing the client's Host-Uniq unless configured not to.
pub struct FakeAccessConcentrator {
    pub mac: MacAddress,
    pub ac_name: String,
    pub service_name: String,
    pub cookie: Option<Vec<u8>>,
    pub relay_id: Option<Vec<u8>>,
    pub session: u16,
    /// Echo the client's Host-Uniq tag in replies.
    pub echo_host_uniq: bool,
    /// PPP-Max-Payload value advertised in PADO and PADS (RFC 4638).
    pub max_payload: Option<u16>,
    /// Error tag attached to every PADO, e.g. (TAG_AC_SYSTEM_ERROR, "busy").
    pub pado_error: Option<(u16, String)>,
    /// Error tag attached to every PADS.
    pub pads_error: Option<(u16, String)>,
    /// Stay silent for the first N PADIs.
    pub ignore_padis: u32,
    padis_seen: u32,
}

impl FakeAccessConcentrator {
    pub fn new(mac: [u8; 6], ac_name: &str) -> Self {
        Self {
            mac: MacAddress::new(mac),
            ac_name: ac_name.to_string(),
            service_name: String::new(),
            cookie: None,
            relay_id: None,
            session: 0x1234,
            echo_host_uniq: true,
            max_payload: None,
            pado_error: None,
            pads_error: None,
            ignore_padis: 0,
            padis_seen: 0,
        }
    }

    fn echo_client_host_uniq(&self, request: &DiscoveryPacket<'_>, builder: &mut DiscoveryBuilder) {
        if !self.echo_host_uniq {
            return;
        }
        if let Some(Tag::HostUniq(value)) = request
            .tags()
            .find(|tag| matches!(tag, Tag::HostUniq(_)))
        {
            builder.add_tag(TAG_HOST_UNIQ, value);
        }
    }

    fn build_pado(&self, padi: &DiscoveryPacket<'_>) -> Vec<u8> {
        let mut builder =
            DiscoveryBuilder::new(padi.eth.source_mac, self.mac, DiscoveryCode::Pado, 0);
        builder.add_tag(TAG_AC_NAME, self.ac_name.as_bytes());
        builder.add_tag(TAG_SERVICE_NAME, self.service_name.as_bytes());
        if let Some(cookie) = &self.cookie {
            builder.add_tag(TAG_AC_COOKIE, cookie);
        }
        if let Some(relay) = &self.relay_id {
            builder.add_tag(TAG_RELAY_SESSION_ID, relay);
        }
        self.echo_client_host_uniq(padi, &mut builder);
        if let Some(max_payload) = self.max_payload {
            builder.add_tag(TAG_PPP_MAX_PAYLOAD, &max_payload.to_be_bytes());
        }
        if let Some((kind, message)) = &self.pado_error {
            builder.add_tag(*kind, message.as_bytes());
        }
        builder.finish()
    }

    fn build_pads(&self, padr: &DiscoveryPacket<'_>) -> Vec<u8> {
        let mut builder = DiscoveryBuilder::new(
            padr.eth.source_mac,
            self.mac,
            DiscoveryCode::Pads,
            self.session,
        );
        builder.add_tag(TAG_SERVICE_NAME, self.service_name.as_bytes());
        if let Some(relay) = &self.relay_id {
            builder.add_tag(TAG_RELAY_SESSION_ID, relay);
        }
        self.echo_client_host_uniq(padr, &mut builder);
        if let Some(max_payload) = self.max_payload {
            builder.add_tag(TAG_PPP_MAX_PAYLOAD, &max_payload.to_be_bytes());
        }
        if let Some((kind, message)) = &self.pads_error {
            builder.add_tag(*kind, message.as_bytes());
        }
        builder.finish()
    }
}

impl Responder for FakeAccessConcentrator {
    fn handle(&mut self, frame: &[u8]) -> Vec<Vec<u8>> {
        let Ok(packet) = DiscoveryPacket::parse(frame) else {
            return Vec::new();
        };
        match packet.code {
            DiscoveryCode::Padi => {
                self.padis_seen += 1;
                if self.padis_seen <= self.ignore_padis {
                    return Vec::new();
                }
                vec![self.build_pado(&packet)]
            }
            DiscoveryCode::Padr if packet.eth.destination_mac == self.mac => {
                vec![self.build_pads(&packet)]
            }
            _ => Vec::new(),
        }
    }
}

/// Decodes the frames a test transmitted, for assertions on the exchange.
pub fn sent_codes(tx_history: &[Vec<u8>]) -> Vec<DiscoveryCode> {
    tx_history
        .iter()
        .filter_map(|frame| DiscoveryPacket::parse(frame).ok())
        .map(|packet| packet.code)
        .collect()
}

/// Finds the first transmitted frame with the given code.
pub fn find_sent(tx_history: &[Vec<u8>], code: DiscoveryCode) -> Option<&Vec<u8>> {
    tx_history
        .iter()
        .find(|frame| DiscoveryPacket::parse(frame).map(|p| p.code) == Ok(code))
}
