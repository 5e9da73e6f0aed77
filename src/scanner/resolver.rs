//! Target MAC resolution.
//!
//! Resolution walks a fixed chain of sources:
//!
//! 1. Broadcast an ARP request and listen for a reply addressed to us
//! 2. Look the address up in the host's ARP table
//! 3. Resolve the default gateway through the same chain, once
//!
//! A missing reply or table entry moves to the next source. Failing to open
//! a socket or send the request ends resolution immediately.

use pnet::packet::ethernet::EtherTypes;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::ScanSettings;
use crate::error::{ScanError, ScanResult};
use crate::net::{transmit, FrameReceiver, InterfaceInfo, Link, SystemTables};
use crate::packet::{build_arp_request, match_arp_reply};
use crate::types::MacAddress;

/// Where the resolver is in its fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    /// About to broadcast an ARP request.
    Requested,
    /// Request sent; listening for the reply.
    AwaitingReply,
    /// No reply; consulting the host ARP table.
    FallbackTable,
    /// Not cached; resolving the default gateway instead.
    FallbackGateway,
    Resolved(MacAddress),
    Failed,
}

/// Resolves IPv4 addresses on the local segment to MAC addresses.
pub struct AddressResolver {
    link: Arc<dyn Link>,
    tables: Arc<dyn SystemTables>,
    local: InterfaceInfo,
    reply_timeout: Duration,
}

impl AddressResolver {
    pub fn new(
        link: Arc<dyn Link>,
        tables: Arc<dyn SystemTables>,
        local: InterfaceInfo,
        settings: &ScanSettings,
    ) -> Self {
        Self {
            link,
            tables,
            local,
            reply_timeout: settings.reply_timeout(),
        }
    }

    /// Resolve `target` to the MAC frames for it should be sent to.
    ///
    /// Off-segment targets resolve to the default gateway's MAC.
    pub fn resolve(&self, target: Ipv4Addr) -> ScanResult<MacAddress> {
        match self.run(target, false)? {
            ResolveState::Resolved(mac) => {
                info!(%target, %mac, "destination MAC resolved");
                Ok(mac)
            }
            _ => Err(ScanError::ResolutionFailed(target)),
        }
    }

    /// Drive the chain for `target` to a terminal state.
    ///
    /// `via_gateway` is set while resolving the gateway itself, which stops
    /// the chain from recursing a second time.
    fn run(&self, target: Ipv4Addr, via_gateway: bool) -> ScanResult<ResolveState> {
        let mut state = ResolveState::Requested;
        let mut receiver: Option<Box<dyn FrameReceiver>> = None;

        loop {
            debug!(%target, ?state, "resolver step");
            state = match state {
                ResolveState::Requested => {
                    // Listen before asking so a fast reply is not missed.
                    receiver = Some(self.link.open_receiver(EtherTypes::Arp)?);
                    self.broadcast_request(target)?;
                    ResolveState::AwaitingReply
                }
                ResolveState::AwaitingReply => {
                    let rx = receiver.as_deref_mut().ok_or_else(|| {
                        ScanError::ListenerFailed("ARP receiver not open".to_string())
                    })?;
                    match self.await_reply(rx, target)? {
                        Some(mac) => ResolveState::Resolved(mac),
                        None => ResolveState::FallbackTable,
                    }
                }
                ResolveState::FallbackTable => {
                    receiver = None;
                    match self.tables.arp_lookup(target) {
                        Some(mac) => ResolveState::Resolved(mac),
                        None => ResolveState::FallbackGateway,
                    }
                }
                ResolveState::FallbackGateway => self.resolve_gateway(target, via_gateway)?,
                terminal @ (ResolveState::Resolved(_) | ResolveState::Failed) => {
                    return Ok(terminal)
                }
            };
        }
    }

    fn broadcast_request(&self, target: Ipv4Addr) -> ScanResult<()> {
        let frame = build_arp_request(self.local.mac, self.local.ip, target)?;
        let mut sender = self.link.open_sender()?;
        transmit(sender.as_mut(), &frame)?;
        debug!(%target, "arp request broadcast");
        Ok(())
    }

    fn await_reply(
        &self,
        receiver: &mut dyn FrameReceiver,
        target: Ipv4Addr,
    ) -> ScanResult<Option<MacAddress>> {
        let deadline = Instant::now() + self.reply_timeout;

        while Instant::now() < deadline {
            if let Some(frame) = receiver.recv()? {
                if let Some(mac) = match_arp_reply(frame, self.local.mac, self.local.ip, target) {
                    debug!(%target, %mac, "arp reply received");
                    return Ok(Some(mac));
                }
            }
        }

        debug!(%target, timeout = ?self.reply_timeout, "no arp reply");
        Ok(None)
    }

    fn resolve_gateway(&self, target: Ipv4Addr, via_gateway: bool) -> ScanResult<ResolveState> {
        if via_gateway {
            return Ok(ResolveState::Failed);
        }

        let Some(gateway) = self.tables.default_gateway(&self.local.name) else {
            warn!(device = %self.local.name, "no default gateway found");
            return Ok(ResolveState::Failed);
        };

        if gateway == target {
            debug!(%gateway, "target is the gateway, nothing further to try");
            return Ok(ResolveState::Failed);
        }

        info!(%target, %gateway, "falling back to the default gateway's MAC");
        match self.run(gateway, true)? {
            resolved @ ResolveState::Resolved(_) => Ok(resolved),
            _ => Ok(ResolveState::Failed),
        }
    }
}
