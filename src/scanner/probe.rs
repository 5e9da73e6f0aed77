//! ICMP echo liveness check.

use pnet::packet::ethernet::EtherTypes;
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::ScanSettings;
use crate::error::ScanResult;
use crate::net::{transmit, InterfaceInfo, Link};
use crate::packet::{build_icmp_echo, match_echo_reply};
use crate::types::MacAddress;

/// Outcome of a liveness probe. A silent host is `Dead`, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Alive,
    Dead,
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Alive => write!(f, "up"),
            Liveness::Dead => write!(f, "down"),
        }
    }
}

/// Sends one echo request and waits for the target to answer.
pub struct LivenessProber {
    link: Arc<dyn Link>,
    local: InterfaceInfo,
    reply_timeout: Duration,
}

impl LivenessProber {
    pub fn new(link: Arc<dyn Link>, local: InterfaceInfo, settings: &ScanSettings) -> Self {
        Self {
            link,
            local,
            reply_timeout: settings.reply_timeout(),
        }
    }

    /// Ping `target` at `target_mac` once.
    ///
    /// Any ICMP packet from the target to us within the reply timeout counts
    /// as alive. Errors only when a socket cannot be opened or the request
    /// cannot be sent.
    pub fn probe(&self, target: Ipv4Addr, target_mac: MacAddress) -> ScanResult<Liveness> {
        let mut receiver = self.link.open_receiver(EtherTypes::Ipv4)?;

        let frame = build_icmp_echo(self.local.ip, target, self.local.mac, target_mac)?;
        let mut sender = self.link.open_sender()?;
        transmit(sender.as_mut(), &frame)?;
        debug!(%target, "echo request sent");

        let deadline = Instant::now() + self.reply_timeout;
        while Instant::now() < deadline {
            if let Some(frame) = receiver.recv()? {
                if match_echo_reply(frame, self.local.mac, self.local.ip, target) {
                    info!(%target, "target is up");
                    return Ok(Liveness::Alive);
                }
            }
        }

        info!(%target, timeout = ?self.reply_timeout, "no echo reply");
        Ok(Liveness::Dead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use crate::net::sim::{self, SimLink, REMOTE_IP, REMOTE_MAC};
    use crate::packet::frame::IP_FRAME_LEN;

    fn prober(link: &Arc<SimLink>) -> LivenessProber {
        LivenessProber::new(link.clone(), sim::local_interface(), &sim::fast_settings())
    }

    #[test]
    fn test_alive_on_echo_reply() {
        let link = Arc::new(SimLink::new(sim::remote_host(REMOTE_IP, REMOTE_MAC, &[])));
        assert_eq!(prober(&link).probe(REMOTE_IP, REMOTE_MAC).unwrap(), Liveness::Alive);

        let sent = link.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), IP_FRAME_LEN);
        assert_eq!(&sent[0][0..6], &REMOTE_MAC.octets());
    }

    #[test]
    fn test_dead_when_silent() {
        let link = Arc::new(SimLink::silent());
        let started = Instant::now();
        assert_eq!(prober(&link).probe(REMOTE_IP, REMOTE_MAC).unwrap(), Liveness::Dead);
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_replies_from_other_hosts_ignored() {
        let other = Ipv4Addr::new(10, 0, 0, 9);
        let link = Arc::new(SimLink::new(sim::remote_host(other, REMOTE_MAC, &[])));
        // The host only answers for its own address, so probing it under a
        // different target address sees nothing that matches.
        assert_eq!(prober(&link).probe(REMOTE_IP, REMOTE_MAC).unwrap(), Liveness::Dead);
    }

    #[test]
    fn test_socket_failure_is_error() {
        let link = Arc::new(SimLink::silent().refuse_receivers());
        assert!(matches!(
            prober(&link).probe(REMOTE_IP, REMOTE_MAC),
            Err(ScanError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_transmit_failure_is_error() {
        let link = Arc::new(SimLink::silent().fail_sends_after(0));
        assert!(matches!(
            prober(&link).probe(REMOTE_IP, REMOTE_MAC),
            Err(ScanError::TransmitFailure(_))
        ));
    }

    #[test]
    fn test_liveness_display() {
        assert_eq!(Liveness::Alive.to_string(), "up");
        assert_eq!(Liveness::Dead.to_string(), "down");
    }
}
