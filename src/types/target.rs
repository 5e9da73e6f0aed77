//! The fully-resolved description of one scan.

use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

use super::{MacAddress, ProbePorts};

/// Everything the sender and listener need to know about one scan.
///
/// Built once after interface discovery and MAC resolution, then shared
/// read-only (behind an `Arc`) by both halves of the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanTarget {
    pub source_ip: Ipv4Addr,
    pub source_mac: MacAddress,
    pub target_ip: Ipv4Addr,
    pub target_mac: MacAddress,
    pub ports: ProbePorts,
}

impl ScanTarget {
    pub fn new(
        source_ip: Ipv4Addr,
        source_mac: MacAddress,
        target_ip: Ipv4Addr,
        target_mac: MacAddress,
        ports: ProbePorts,
    ) -> Self {
        Self {
            source_ip,
            source_mac,
            target_ip,
            target_mac,
            ports,
        }
    }

    /// Number of SYN probes this scan will send.
    pub fn probe_count(&self) -> usize {
        self.ports.len()
    }

    /// True when the sender walks a contiguous range rather than a list.
    pub fn is_range_scan(&self) -> bool {
        matches!(self.ports, ProbePorts::Range(_))
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) ports {}", self.target_ip, self.target_mac, self.ports)
    }
}
