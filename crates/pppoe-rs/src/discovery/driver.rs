// crates/pppoe-rs/src/discovery/driver.rs
//! The discovery driver: PADI/PADR retry loops, backoff and termination.

use super::{AcOffer, DiscoveryConnection, DiscoveryState, NO_SERVICE_NAME_SENTINEL};
use crate::frame::basic::MacAddress;
use crate::frame::codec::DiscoveryBuilder;
use crate::frame::tag::{TAG_HOST_UNIQ, TAG_PPP_MAX_PAYLOAD, TAG_SERVICE_NAME};
use crate::hal::{DiscoveryInterface, MruNegotiator, PppoeError};
use crate::types::{DiscoveryCode, MAX_PADI_ATTEMPTS, PPPOE_MTU};
use alloc::vec::Vec;
use log::{debug, error, info};

/// Result of one full PADI-to-PADS cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    /// PADS accepted; the connection is in `Session`.
    Established,
    /// Retries exhausted. A persistent client restarts the cycle from PADI;
    /// anyone else gives up.
    Retry,
}

impl DiscoveryConnection {
    /// Runs discovery to completion.
    ///
    /// Returns the bound session id once the connection reaches
    /// [`DiscoveryState::Session`]. Retry exhaustion without `persist` is
    /// reported as [`PppoeError::DiscoveryTimeout`], a fatal error tag as
    /// [`PppoeError::AcReportedError`], and transport failures propagate
    /// unchanged. With `persist` the exchange restarts from PADI until it
    /// succeeds.
    pub fn discover<I: DiscoveryInterface>(
        &mut self,
        iface: &mut I,
        mut lcp: Option<&mut dyn MruNegotiator>,
    ) -> Result<u16, PppoeError> {
        if self.config.skip_discovery {
            return self.bind_preset_session(iface);
        }
        // Only advertise PPP-Max-Payload when the local PPP stack actually
        // wants more than the standard PPPoE MTU (RFC 4638).
        let advertised_mru = lcp
            .as_ref()
            .map(|negotiator| negotiator.mru_want())
            .filter(|&want| want > PPPOE_MTU);
        loop {
            match self.run_cycle(iface, advertised_mru)? {
                CycleOutcome::Established => {
                    if let Some(negotiator) = lcp.as_mut() {
                        self.clamp_mru(*negotiator);
                    }
                    return Ok(self.session);
                }
                CycleOutcome::Retry if self.config.persist => {
                    debug!("discovery timed out; restarting from PADI");
                    self.reset_for_restart();
                }
                CycleOutcome::Retry => {
                    error!("discovery gave up after {} attempts", MAX_PADI_ATTEMPTS);
                    return Err(PppoeError::DiscoveryTimeout);
                }
            }
        }
    }

    /// Probe mode: enumerate access concentrators without requesting a
    /// session.
    ///
    /// Sends PADI up to the retry cap with a constant per-attempt timeout,
    /// so a full probe completes in bounded time, and records every distinct
    /// offer that passes the filters. No PADR is ever sent; whether an empty
    /// result is a failure is the caller's call.
    pub fn probe<I: DiscoveryInterface>(
        &mut self,
        iface: &mut I,
    ) -> Result<Vec<AcOffer>, PppoeError> {
        let timeout_us = self.initial_timeout_us();
        let mut offers = Vec::new();
        self.padi_attempts = 0;
        while self.padi_attempts < MAX_PADI_ATTEMPTS {
            self.padi_attempts += 1;
            self.send_padi(iface, None)?;
            self.wait_for_pado(iface, timeout_us, Some(&mut offers))?;
        }
        info!("{} access concentrator(s) found", offers.len());
        Ok(offers)
    }

    /// One PADI phase followed by one PADR phase, doubling the per-attempt
    /// timeout after each unsuccessful wait.
    fn run_cycle<I: DiscoveryInterface>(
        &mut self,
        iface: &mut I,
        advertised_mru: Option<u16>,
    ) -> Result<CycleOutcome, PppoeError> {
        let initial_timeout_us = self.initial_timeout_us();

        let mut timeout_us = initial_timeout_us;
        self.padi_attempts = 0;
        while self.state != DiscoveryState::ReceivedPado {
            self.padi_attempts += 1;
            if self.padi_attempts > MAX_PADI_ATTEMPTS {
                return Ok(CycleOutcome::Retry);
            }
            self.send_padi(iface, advertised_mru)?;
            self.wait_for_pado(iface, timeout_us, None)?;
            timeout_us *= 2;
        }

        let mut timeout_us = initial_timeout_us;
        self.padr_attempts = 0;
        while self.state != DiscoveryState::Session {
            self.padr_attempts += 1;
            if self.padr_attempts > MAX_PADI_ATTEMPTS {
                // A dead PADR exchange restarts from PADI, not PADR.
                return Ok(CycleOutcome::Retry);
            }
            self.send_padr(iface, advertised_mru)?;
            self.wait_for_pads(iface, timeout_us)?;
            timeout_us *= 2;
        }
        Ok(CycleOutcome::Established)
    }

    /// Clears the per-cycle latches so a persistent restart renegotiates
    /// from a clean slate.
    fn reset_for_restart(&mut self) {
        self.state = DiscoveryState::Initial;
        self.peer_mac = MacAddress::BROADCAST;
        self.cookie = None;
        self.relay_id = None;
        self.remote_max_payload = None;
        self.pads_had_error = false;
    }

    fn initial_timeout_us(&self) -> u64 {
        u64::from(self.config.discovery_timeout_s) * 1_000_000
    }

    /// RFC 4638: clamp the local MRU to what the concentrator confirmed, or
    /// to the standard PPPoE MTU when it stayed silent.
    fn clamp_mru(&self, negotiator: &mut dyn MruNegotiator) {
        let limit = self.remote_max_payload.unwrap_or(PPPOE_MTU);
        if negotiator.mru_want() > limit || negotiator.mru_allow() > limit {
            debug!("clamping LCP MRU to {}", limit);
            negotiator.clamp(limit);
        }
    }

    /// Binds the preconfigured session without any discovery exchange, and
    /// tears it down immediately when kill-session was requested.
    fn bind_preset_session<I: DiscoveryInterface>(
        &mut self,
        iface: &mut I,
    ) -> Result<u16, PppoeError> {
        let peer = self.config.peer_mac.ok_or(PppoeError::MissingPeerAddress)?;
        self.peer_mac = peer;
        self.session = self.config.session_id;
        self.state = DiscoveryState::Session;
        if self.config.kill_session {
            info!("terminating session {:#06x} with {}", self.session, self.peer_mac);
            self.send_padt(iface)?;
        }
        Ok(self.session)
    }

    /// Broadcasts a PADI carrying the configured service, the Host-Uniq
    /// correlator, and the PPP-Max-Payload advertisement when jumbo frames
    /// are in play.
    fn send_padi<I: DiscoveryInterface>(
        &mut self,
        iface: &mut I,
        advertised_mru: Option<u16>,
    ) -> Result<(), PppoeError> {
        let mut builder = DiscoveryBuilder::new(
            MacAddress::BROADCAST,
            self.local_mac,
            DiscoveryCode::Padi,
            0,
        );
        match self.config.service_name.as_deref() {
            // Workaround for concentrators that choke on a zero-length
            // Service-Name: the sentinel omits the tag entirely.
            Some(NO_SERVICE_NAME_SENTINEL) => {}
            Some(name) => {
                builder.add_tag(TAG_SERVICE_NAME, name.as_bytes());
            }
            None => {
                builder.add_tag(TAG_SERVICE_NAME, &[]);
            }
        }
        if let Some(uniq) = &self.config.host_uniq {
            builder.add_tag(TAG_HOST_UNIQ, uniq);
        }
        if let Some(mru) = advertised_mru {
            builder.add_tag(TAG_PPP_MAX_PAYLOAD, &mru.to_be_bytes());
        }
        debug!("sending PADI (attempt {}/{})", self.padi_attempts, MAX_PADI_ATTEMPTS);
        iface.send_frame(&builder.finish())?;
        self.state = DiscoveryState::SentPadi;
        Ok(())
    }

    /// Sends a PADR to the latched peer, echoing the cookie and relay id
    /// captured from the accepted offer byte-for-byte.
    fn send_padr<I: DiscoveryInterface>(
        &mut self,
        iface: &mut I,
        advertised_mru: Option<u16>,
    ) -> Result<(), PppoeError> {
        let mut builder =
            DiscoveryBuilder::new(self.peer_mac, self.local_mac, DiscoveryCode::Padr, 0);
        let service = match self.config.service_name.as_deref() {
            Some(NO_SERVICE_NAME_SENTINEL) | None => &[][..],
            Some(name) => name.as_bytes(),
        };
        builder.add_tag(TAG_SERVICE_NAME, service);
        if let Some(uniq) = &self.config.host_uniq {
            builder.add_tag(TAG_HOST_UNIQ, uniq);
        }
        if let Some(cookie) = &self.cookie {
            builder.echo_tag(cookie);
        }
        if let Some(relay) = &self.relay_id {
            builder.echo_tag(relay);
        }
        if let Some(mru) = advertised_mru {
            builder.add_tag(TAG_PPP_MAX_PAYLOAD, &mru.to_be_bytes());
        }
        debug!(
            "sending PADR to {} (attempt {}/{})",
            self.peer_mac, self.padr_attempts, MAX_PADI_ATTEMPTS
        );
        iface.send_frame(&builder.finish())?;
        self.state = DiscoveryState::SentPadr;
        Ok(())
    }

    /// Sends a PADT for the bound session.
    ///
    /// RFC 2516 lets either endpoint terminate; the correlator and echo
    /// tags ride along when held so relays can route the teardown.
    pub fn send_padt<I: DiscoveryInterface>(&mut self, iface: &mut I) -> Result<(), PppoeError> {
        let mut builder = DiscoveryBuilder::new(
            self.peer_mac,
            self.local_mac,
            DiscoveryCode::Padt,
            self.session,
        );
        if let Some(uniq) = &self.config.host_uniq {
            builder.add_tag(TAG_HOST_UNIQ, uniq);
        }
        if let Some(cookie) = &self.cookie {
            builder.echo_tag(cookie);
        }
        if let Some(relay) = &self.relay_id {
            builder.echo_tag(relay);
        }
        iface.send_frame(&builder.finish())
    }
}
