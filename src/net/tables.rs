//! The host's ARP and routing tables.
//!
//! Lookups shell out to `arp` and `route` and parse their tabular output.
//! A failed command, a missing row and an unparsable field all read as
//! "not found"; the resolver treats these tables as best-effort fallbacks.

use std::net::Ipv4Addr;
use std::process::Command;
use tracing::{debug, trace};

use crate::types::MacAddress;

/// Column of `arp -a <ip>` output that holds the hardware address.
const ARP_MAC_COLUMN: usize = 3;

const ARP_MISS_MARKER: &str = "no match found";

const DEFAULT_ROUTE: &str = "0.0.0.0";

/// Queries against the host's ARP and route tables.
pub trait SystemTables: Send + Sync {
    /// Cached hardware address of `ip`.
    fn arp_lookup(&self, ip: Ipv4Addr) -> Option<MacAddress>;

    /// Default gateway reachable through `device`.
    fn default_gateway(&self, device: &str) -> Option<Ipv4Addr>;
}

/// [`SystemTables`] backed by the `arp` and `route` utilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTables;

impl CommandTables {
    fn run(program: &str, args: &[&str]) -> Option<String> {
        match Command::new(program).args(args).output() {
            Ok(output) => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            Err(e) => {
                debug!(program, error = %e, "table query failed");
                None
            }
        }
    }
}

impl SystemTables for CommandTables {
    fn arp_lookup(&self, ip: Ipv4Addr) -> Option<MacAddress> {
        let output = Self::run("arp", &["-a", &ip.to_string()])?;
        let mac = parse_arp_output(&output);
        debug!(%ip, found = mac.is_some(), "arp table lookup");
        mac
    }

    fn default_gateway(&self, device: &str) -> Option<Ipv4Addr> {
        let output = Self::run("route", &["-n"])?;
        let gateway = parse_default_gateway(&output, device);
        debug!(device, gateway = ?gateway, "route table lookup");
        gateway
    }
}

/// Extract the MAC from the first line of `arp -a <ip>` output.
///
/// `? (10.0.0.1) at 52:54:00:12:35:02 [ether] on eth0` yields the fourth
/// token; "no match found" and `<incomplete>` entries yield `None`.
pub fn parse_arp_output(output: &str) -> Option<MacAddress> {
    let line = output.lines().next()?;
    if line.contains(ARP_MISS_MARKER) {
        return None;
    }
    let token = line.split_whitespace().nth(ARP_MAC_COLUMN)?;
    trace!(token, "arp table token");
    token.parse().ok()
}

/// Find the default route through `device` in `route -n` output.
///
/// The matching row starts with `0.0.0.0` and names the device; the token
/// after it is the gateway. A `0.0.0.0` gateway means none.
pub fn parse_default_gateway(output: &str, device: &str) -> Option<Ipv4Addr> {
    output
        .lines()
        .filter(|line| line.split_whitespace().any(|token| token == device))
        .find_map(|line| {
            let mut tokens = line.split_whitespace();
            if tokens.next()? != DEFAULT_ROUTE {
                return None;
            }
            tokens.next()?.parse::<Ipv4Addr>().ok()
        })
        .filter(|gateway| !gateway.is_unspecified())
}
