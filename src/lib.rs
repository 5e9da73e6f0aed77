//! # rawscan - Raw-Socket IPv4 Reconnaissance
//!
//! rawscan builds Ethernet frames by hand and puts them on the wire through a
//! Layer-2 channel. One run:
//!
//! 1. Resolves the target's MAC with a broadcast ARP request, falling back to
//!    the host ARP table and then to the default gateway
//! 2. Sends a single ICMP echo request to check the target is up
//! 3. SYN scans the selected TCP ports while a listener collects SYN-ACKs
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use rawscan::config::ScanSettings;
//! use rawscan::net::{DatalinkLink, Link};
//! use rawscan::scanner::{run_scan, ScanConfig};
//! use rawscan::types::ProbePorts;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ScanSettings::default();
//!     let datalink = DatalinkLink::for_interface("eth0", settings.poll_interval())?;
//!     let interface = datalink.info()?;
//!     let link: Arc<dyn Link> = Arc::new(datalink);
//!
//!     let report = run_scan(link, ScanConfig {
//!         interface,
//!         target: "192.168.1.1".parse()?,
//!         target_mac: "aa:bb:cc:dd:ee:ff".parse()?,
//!         ports: ProbePorts::common(),
//!         settings,
//!         verbose: false,
//!     })
//!     .await?;
//!
//!     for port in report.open_ports_sorted() {
//!         println!("{} {}", port.port, port.service);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - MAC addresses, target validation, port selections
//! - [`packet`] - Checksums, frame builders and reply matchers
//! - [`net`] - Link seams, the pnet datalink backend and system tables
//! - [`scanner`] - Address resolution, liveness probing and SYN scanning
//! - [`config`] - Scan settings
//! - [`error`] - Error types
//! - [`output`] - Output formatting utilities

pub mod cli;
pub mod config;
pub mod error;
pub mod net;
pub mod output;
pub mod packet;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use scanner::{run_scan, Liveness, ScanConfig, ScanReport};
pub use types::{MacAddress, Port, PortSpec, ProbePorts, ScanTarget};
