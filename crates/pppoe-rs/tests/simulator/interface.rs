// crates/pppoe-rs/tests/simulator/interface.rs
use pppoe_rs::hal::{DiscoveryInterface, PppoeError};
use std::collections::VecDeque;

/// Reacts to one frame the client transmitted, returning any replies to
/// queue on the virtual wire.
pub trait Responder {
    fn handle(&mut self, frame: &[u8]) -> Vec<Vec<u8>>;
}

/// A simulated discovery transport that buffers frames in memory and runs
/// on virtual time, so timeout and backoff behavior is deterministic.
pub struct SimulatedInterface {
    local_mac: [u8; 6],
    now_us: u64,
    /// Incoming frames (wire to client).
    rx_queue: VecDeque<Vec<u8>>,
    /// Every frame the client transmitted, in order.
    pub tx_history: Vec<Vec<u8>>,
    /// Timeout handed to each receive call, for backoff assertions.
    pub waits_us: Vec<u64>,
    /// Scripted access concentrators answering transmitted frames.
    responders: Vec<Box<dyn Responder>>,
    /// Virtual delay charged to each successful receive.
    pub frame_latency_us: u64,
    /// Receives to abort with `Interrupted` before delivering anything.
    pub pending_interruptions: u32,
}

impl SimulatedInterface {
    pub fn new(local_mac: [u8; 6]) -> Self {
        Self {
            local_mac,
            now_us: 0,
            rx_queue: VecDeque::new(),
            tx_history: Vec::new(),
            waits_us: Vec::new(),
            responders: Vec::new(),
            frame_latency_us: 1_000,
            pending_interruptions: 0,
        }
    }

    pub fn add_responder(&mut self, responder: Box<dyn Responder>) {
        self.responders.push(responder);
    }

    /// Pushes a frame into the receive buffer (simulating arrival from the wire).
    pub fn push_rx(&mut self, frame: Vec<u8>) {
        self.rx_queue.push_back(frame);
    }

    pub fn now(&self) -> u64 {
        self.now_us
    }
}

impl DiscoveryInterface for SimulatedInterface {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), PppoeError> {
        self.tx_history.push(frame.to_vec());
        let mut replies = Vec::new();
        for responder in &mut self.responders {
            replies.extend(responder.handle(frame));
        }
        self.rx_queue.extend(replies);
        Ok(())
    }

    fn receive_frame(&mut self, buffer: &mut [u8], timeout_us: u64) -> Result<usize, PppoeError> {
        self.waits_us.push(timeout_us);
        if self.pending_interruptions > 0 {
            self.pending_interruptions -= 1;
            self.now_us += self.frame_latency_us;
            return Err(PppoeError::Interrupted);
        }
        if let Some(frame) = self.rx_queue.pop_front() {
            if buffer.len() < frame.len() {
                return Err(PppoeError::BufferTooShort);
            }
            self.now_us += self.frame_latency_us;
            buffer[..frame.len()].copy_from_slice(&frame);
            Ok(frame.len())
        } else {
            // Nothing on the wire: the full wait elapses.
            self.now_us += timeout_us;
            Ok(0)
        }
    }

    fn local_mac_address(&self) -> [u8; 6] {
        self.local_mac
    }

    fn now_us(&self) -> u64 {
        self.now_us
    }
}
