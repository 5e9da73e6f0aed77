//! Scan command implementation.
//!
//! Discovers the interface, resolves the target's MAC, then hands off to
//! [`run_scan`] and prints the report.

use clap::Args;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::config::ScanSettings;
use crate::error::{CliResult, ScanError};
use crate::net::{CommandTables, DatalinkLink, Link};
use crate::output;
use crate::scanner::{run_scan, AddressResolver, ScanConfig};
use crate::types::{parse_target_ip, PortSpec, ProbePorts};

/// Scan one IPv4 target for open TCP ports.
#[derive(Args, Debug)]
pub struct ScanCommand {
    /// Target IPv4 address (first and last octet must be non-zero; `-ip` also works)
    #[arg(long, value_name = "IPv4", value_parser = parse_target_ip)]
    pub ip: Ipv4Addr,

    /// Network interface to send and listen on (`-dev` also works)
    #[arg(long, value_name = "IFACE")]
    pub dev: String,

    /// Scan every TCP port between 1 and 65535
    #[arg(short, long)]
    pub full: bool,

    /// Ports to scan (e.g. "80", "22,80,443", "1-1024", "22,8000-9000")
    #[arg(short, long, value_name = "SPEC", conflicts_with = "full")]
    pub ports: Option<PortSpec>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl ScanCommand {
    /// Ports this run will probe. Defaults to the common-ports table.
    pub fn probe_ports(&self) -> ProbePorts {
        if self.full {
            ProbePorts::full()
        } else if let Some(spec) = &self.ports {
            spec.clone().into_probe_ports()
        } else {
            ProbePorts::common()
        }
    }

    /// Execute the scan command.
    pub async fn execute(&self, verbose: bool, quiet: bool, config: Option<&Path>) -> CliResult<()> {
        if !is_root() {
            output::print_warning("raw sockets usually require root privileges.");
        }

        let settings = ScanSettings::resolve(config)?;
        let ports = self.probe_ports();
        let plain = self.output == OutputFormat::Plain;

        let datalink = DatalinkLink::for_interface(&self.dev, settings.poll_interval())?;
        let local = datalink.info()?;
        debug!(device = %local.name, index = local.index, mac = %local.mac, ip = %local.ip, "interface discovered");
        let link: Arc<dyn Link> = Arc::new(datalink);

        let resolver = AddressResolver::new(
            Arc::clone(&link),
            Arc::new(CommandTables),
            local.clone(),
            &settings,
        );
        let target = self.ip;
        let target_mac = tokio::task::spawn_blocking(move || resolver.resolve(target))
            .await
            .map_err(ScanError::from)??;

        if plain && !quiet {
            output::print_information(&local, target, target_mac, &ports)?;
        }

        let report = run_scan(
            link,
            ScanConfig {
                interface: local,
                target,
                target_mac,
                ports,
                settings,
                verbose: verbose && plain,
            },
        )
        .await?;

        output::print_results(&report, self.output)?;
        Ok(())
    }
}

/// Check if running with root privileges.
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}
