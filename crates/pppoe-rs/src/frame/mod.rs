// crates/pppoe-rs/src/frame/mod.rs
//! Defines the structures and logic for PPPoE Active Discovery frames.

pub mod basic;
pub mod codec;
pub mod tag;

pub use basic::{EthernetHeader, MacAddress};
pub use codec::{DiscoveryBuilder, DiscoveryPacket};
pub use tag::{RawTag, Tag, TagIter};
