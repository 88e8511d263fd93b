#![cfg_attr(not(feature = "std"), no_std)]

// 'alloc' is used for dynamic allocation (e.g., Vec<u8> for frames)
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod hal;

// --- Wire Format ---
pub mod frame;

// --- Discovery State Machine ---
pub mod discovery;

// --- Top-level Exports ---
pub use hal::{DiscoveryInterface, MruNegotiator, PppoeError};
pub use frame::basic::MacAddress;
pub use frame::codec::{DiscoveryBuilder, DiscoveryPacket};
pub use frame::tag::{RawTag, Tag, TagIter};
pub use discovery::{
    AcOffer, DiscoveryConfig, DiscoveryConnection, DiscoveryState, NO_SERVICE_NAME_SENTINEL,
};
pub use types::DiscoveryCode;
