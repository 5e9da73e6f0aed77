//! Scanner module - resolution, liveness and SYN scanning.
//!
//! [`run_scan`] drives one target from a resolved MAC to a finished
//! [`ScanReport`]: an ICMP liveness probe, then, if the target answered, a
//! SYN scan of the selected ports. Blocking components run on tokio's
//! blocking pool.

pub mod probe;
pub mod resolver;
pub mod syn;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::ScanSettings;
use crate::error::ScanResult;
use crate::net::{InterfaceInfo, Link};
use crate::services::get_service_description;
use crate::types::{MacAddress, ProbePorts, ScanTarget};

pub use probe::{Liveness, LivenessProber};
pub use resolver::{AddressResolver, ResolveState};
pub use syn::SynScanner;

/// An open port and its well-known service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenPort {
    pub port: u16,
    pub service: &'static str,
}

impl OpenPort {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            service: get_service_description(port),
        }
    }
}

/// Complete results of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: Ipv4Addr,
    pub target_mac: MacAddress,
    pub interface: InterfaceInfo,
    pub selection: String,
    pub liveness: Liveness,
    pub ports_probed: usize,
    /// In the order the SYN-ACKs arrived.
    pub open_ports: Vec<OpenPort>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ScanReport {
    /// Open ports sorted by number, for display.
    pub fn open_ports_sorted(&self) -> Vec<OpenPort> {
        let mut ports = self.open_ports.clone();
        ports.sort_by_key(|p| p.port);
        ports
    }
}

/// Configuration for a scan.
pub struct ScanConfig {
    pub interface: InterfaceInfo,
    pub target: Ipv4Addr,
    pub target_mac: MacAddress,
    pub ports: ProbePorts,
    pub settings: ScanSettings,
    /// Show a progress bar while SYNs are sent.
    pub verbose: bool,
}

/// Probe the target and, if it is up, SYN scan it.
pub async fn run_scan(link: Arc<dyn Link>, config: ScanConfig) -> ScanResult<ScanReport> {
    let started_at = Utc::now();
    let start_time = Instant::now();
    let selection = config.ports.to_string();

    let prober = LivenessProber::new(Arc::clone(&link), config.interface.clone(), &config.settings);
    let (target, target_mac) = (config.target, config.target_mac);
    let liveness =
        tokio::task::spawn_blocking(move || prober.probe(target, target_mac)).await??;

    let (ports_probed, open) = match liveness {
        Liveness::Alive => {
            let scan_target = Arc::new(ScanTarget::new(
                config.interface.ip,
                config.interface.mac,
                config.target,
                config.target_mac,
                config.ports,
            ));
            let total = scan_target.probe_count();

            let mut scanner = SynScanner::new(link, &config.settings);
            if config.verbose {
                scanner = scanner.with_progress(progress_bar(total));
            }
            (total, scanner.scan(scan_target).await?)
        }
        Liveness::Dead => {
            info!(target = %config.target, "target is down, skipping port scan");
            (0, Vec::new())
        }
    };

    Ok(ScanReport {
        target: config.target,
        target_mac: config.target_mac,
        interface: config.interface,
        selection,
        liveness,
        ports_probed,
        open_ports: open.into_iter().map(OpenPort::new).collect(),
        started_at,
        completed_at: Utc::now(),
        duration_ms: start_time.elapsed().as_millis() as u64,
    })
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} SYNs ({percent}%)",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}
