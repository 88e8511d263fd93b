// crates/pppoe-rs-linux/src/lib.rs
#![cfg(target_os = "linux")]

use pnet::datalink::{self, Channel, NetworkInterface as PnetInterface};
use pppoe_rs::hal::{DiscoveryInterface, PppoeError};
use pppoe_rs::types::ETHERTYPE_DISCOVERY;
use std::io;
use std::time::{Duration, Instant};

/// How long each underlying read blocks before the deadline is re-checked.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Raw Ethernet discovery transport for Linux, built on `pnet`.
///
/// The channel runs promiscuous with a short read timeout; `receive_frame`
/// re-arms the read until the caller's deadline passes, and only hands back
/// frames carrying the PPPoE Discovery EtherType, as the HAL contract
/// requires.
pub struct LinuxPnetInterface {
    tx: Box<dyn datalink::DataLinkSender>,
    rx: Box<dyn datalink::DataLinkReceiver>,
    pnet_iface: PnetInterface,
    mac_address: [u8; 6],
    epoch: Instant,
}

impl LinuxPnetInterface {
    pub fn new(interface_name: &str) -> Result<Self, String> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface: &PnetInterface| iface.name == interface_name)
            .ok_or_else(|| format!("Interface '{}' not found", interface_name))?;

        let mac_address = interface.mac.ok_or("Interface has no MAC address")?.into();

        // Configure the channel to be promiscuous and have a short read timeout.
        let config = datalink::Config {
            read_timeout: Some(POLL_INTERVAL),
            promiscuous: true,
            ..Default::default()
        };

        let (tx, rx) = match datalink::channel(&interface, config) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => return Err("Unsupported channel type".to_string()),
            Err(e) => return Err(e.to_string()),
        };

        Ok(Self {
            tx,
            rx,
            pnet_iface: interface,
            mac_address,
            epoch: Instant::now(),
        })
    }

    /// Name of the underlying network interface.
    pub fn name(&self) -> &str {
        &self.pnet_iface.name
    }
}

fn is_discovery_frame(frame: &[u8]) -> bool {
    frame.len() >= 14 && frame[12..14] == ETHERTYPE_DISCOVERY.to_be_bytes()
}

impl DiscoveryInterface for LinuxPnetInterface {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), PppoeError> {
        self.tx
            .send_to(frame, None)
            .ok_or(PppoeError::IoError)? // For channel closed
            .map_err(|_| PppoeError::IoError)?; // For OS error
        Ok(())
    }

    fn receive_frame(&mut self, buffer: &mut [u8], timeout_us: u64) -> Result<usize, PppoeError> {
        let deadline = Instant::now() + Duration::from_micros(timeout_us);
        loop {
            match self.rx.next() {
                Ok(frame) => {
                    // The HAL contract hands the core discovery traffic only.
                    if !is_discovery_frame(frame) {
                        if Instant::now() >= deadline {
                            return Ok(0);
                        }
                        continue;
                    }
                    let len = frame.len();
                    if buffer.len() < len {
                        return Err(PppoeError::BufferTooShort);
                    }
                    buffer[..len].copy_from_slice(frame);
                    return Ok(len);
                }
                Err(e) => match e.kind() {
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                        if Instant::now() >= deadline {
                            return Ok(0);
                        }
                    }
                    // Surfaced to the wait loop, which re-arms the wait.
                    io::ErrorKind::Interrupted => return Err(PppoeError::Interrupted),
                    _ => return Err(PppoeError::IoError),
                },
            }
        }
    }

    fn local_mac_address(&self) -> [u8; 6] {
        self.mac_address
    }

    fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }
}
