// crates/pppoe-rs/src/frame/codec.rs
//! Parsing and construction of discovery frames.

use crate::frame::basic::{ETHERNET_HEADER_SIZE, EthernetHeader, MacAddress};
use crate::frame::tag::{RawTag, TAG_HEADER_SIZE, TagIter};
use crate::hal::PppoeError;
use crate::types::{DiscoveryCode, HDR_SIZE, MAX_PPPOE_PAYLOAD, VERTYPE};
use alloc::vec::Vec;

// Fixed PPPoE header layout, relative to the start of the frame:
// vertype (1), code (1), session (2, BE), length (2, BE).
const OFF_VERTYPE: usize = ETHERNET_HEADER_SIZE;
const OFF_CODE: usize = ETHERNET_HEADER_SIZE + 1;
const OFF_SESSION: usize = ETHERNET_HEADER_SIZE + 2;
const OFF_LENGTH: usize = ETHERNET_HEADER_SIZE + 4;

/// A parsed, borrowed view of a received discovery frame.
///
/// Borrowing keeps the receive path allocation-free; tag values handed out
/// by [`DiscoveryPacket::tags`] point into the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryPacket<'a> {
    pub eth: EthernetHeader,
    pub code: DiscoveryCode,
    /// Session id, in host order. Zero for all discovery packets except PADS/PADT.
    pub session: u16,
    payload: &'a [u8],
}

impl<'a> DiscoveryPacket<'a> {
    /// Parses a raw Ethernet frame as a PPPoE discovery packet.
    ///
    /// The declared payload length plus the fixed headers must fit within
    /// the bytes actually received; a violation is reported as
    /// [`PppoeError::BogusLength`] so the caller can drop the frame.
    pub fn parse(buffer: &'a [u8]) -> Result<Self, PppoeError> {
        if buffer.len() < HDR_SIZE {
            return Err(PppoeError::InvalidEthernetFrame);
        }
        let eth = EthernetHeader::parse(buffer)?;
        if buffer[OFF_VERTYPE] != VERTYPE {
            return Err(PppoeError::InvalidDiscoveryFrame);
        }
        let code = DiscoveryCode::try_from(buffer[OFF_CODE])?;
        let session = u16::from_be_bytes([buffer[OFF_SESSION], buffer[OFF_SESSION + 1]]);
        let declared = u16::from_be_bytes([buffer[OFF_LENGTH], buffer[OFF_LENGTH + 1]]);
        if usize::from(declared) + HDR_SIZE > buffer.len() {
            return Err(PppoeError::BogusLength {
                declared,
                received: buffer.len() as u16,
            });
        }
        Ok(Self {
            eth,
            code,
            session,
            payload: &buffer[HDR_SIZE..HDR_SIZE + usize::from(declared)],
        })
    }

    /// Walks the tags within the declared payload window.
    pub fn tags(&self) -> TagIter<'a> {
        TagIter::new(self.payload)
    }

    /// The declared payload window.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

/// Cursor-based encoder for outgoing discovery frames.
///
/// The Ethernet and fixed PPPoE headers are written up front; tags are
/// appended behind a cursor, and the PPPoE `length` field is written last
/// by [`DiscoveryBuilder::finish`] as the sum of tag bytes emitted.
pub struct DiscoveryBuilder {
    buffer: [u8; HDR_SIZE + MAX_PPPOE_PAYLOAD],
    cursor: usize,
}

impl DiscoveryBuilder {
    pub fn new(dest: MacAddress, src: MacAddress, code: DiscoveryCode, session: u16) -> Self {
        let mut buffer = [0u8; HDR_SIZE + MAX_PPPOE_PAYLOAD];
        EthernetHeader::new(dest, src).write_to(&mut buffer);
        buffer[OFF_VERTYPE] = VERTYPE;
        buffer[OFF_CODE] = code as u8;
        buffer[OFF_SESSION..OFF_SESSION + 2].copy_from_slice(&session.to_be_bytes());
        Self { buffer, cursor: 0 }
    }

    /// Appends one tag.
    ///
    /// # Panics
    /// Panics if the tag would overrun the payload capacity of a standard
    /// Ethernet frame. Outgoing discovery payloads are bounded and small;
    /// overrunning the window is a programming error, not a runtime
    /// condition to recover from.
    pub fn add_tag(&mut self, kind: u16, value: &[u8]) -> &mut Self {
        assert!(
            self.cursor + TAG_HEADER_SIZE + value.len() <= MAX_PPPOE_PAYLOAD,
            "discovery payload overrun while appending tag {:#06x}",
            kind
        );
        let base = HDR_SIZE + self.cursor;
        self.buffer[base..base + 2].copy_from_slice(&kind.to_be_bytes());
        self.buffer[base + 2..base + 4].copy_from_slice(&(value.len() as u16).to_be_bytes());
        self.buffer[base + 4..base + 4 + value.len()].copy_from_slice(value);
        self.cursor += TAG_HEADER_SIZE + value.len();
        self
    }

    /// Appends a previously captured tag verbatim (same type, length, value).
    pub fn echo_tag(&mut self, tag: &RawTag) -> &mut Self {
        self.add_tag(tag.kind, &tag.value)
    }

    /// Writes the final `length` field and returns the frame bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let length = self.cursor as u16;
        self.buffer[OFF_LENGTH..OFF_LENGTH + 2].copy_from_slice(&length.to_be_bytes());
        self.buffer[..HDR_SIZE + self.cursor].to_vec()
    }
}
