//! Command-line surface.
//!
//! One flat command: `rawscan --ip <IPv4> --dev <IFACE> [OPTIONS]`.

mod scan;

pub use scan::ScanCommand;

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::CliResult;

/// rawscan - ARP, ICMP and TCP SYN recon over raw Ethernet frames.
///
/// Resolves the target's MAC address, checks that it answers ping and then
/// SYN scans it. Needs raw socket privileges.
#[derive(Parser, Debug)]
#[command(name = "rawscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Raw-socket IPv4 port scanner", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub scan: ScanCommand,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and skip the information block
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Run the scan described by the arguments.
    pub async fn run(&self) -> CliResult<()> {
        self.scan
            .execute(self.verbose > 0, self.quiet, self.config.as_deref())
            .await
    }
}

/// Single-dash long flags accepted for compatibility, and their clap form.
const LEGACY_FLAGS: [(&str, &str); 2] = [("-ip", "--ip"), ("-dev", "--dev")];

/// Rewrite `-ip` and `-dev` to `--ip` and `--dev`; every other argument is
/// passed through untouched.
pub fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| arg == *legacy)
                .map_or(arg, |(_, long)| OsString::from(long))
        })
        .collect()
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProbePorts;
    use std::net::Ipv4Addr;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("rawscan").chain(args.iter().copied()))
    }

    #[test]
    fn test_required_arguments() {
        let cli = parse(&["--ip", "192.168.12.1", "--dev", "enp4s0"]).unwrap();
        assert_eq!(cli.scan.ip, Ipv4Addr::new(192, 168, 12, 1));
        assert_eq!(cli.scan.dev, "enp4s0");
        assert_eq!(cli.scan.output, OutputFormat::Plain);
        assert!(matches!(cli.scan.probe_ports(), ProbePorts::List(ref p) if p.len() == 54));

        assert!(parse(&["--dev", "enp4s0"]).is_err());
        assert!(parse(&["--ip", "192.168.12.1"]).is_err());
    }

    #[test]
    fn test_strict_ip_validation() {
        assert!(parse(&["--ip", "0.168.12.1", "--dev", "eth0"]).is_err());
        assert!(parse(&["--ip", "192.168.12.0", "--dev", "eth0"]).is_err());
        assert!(parse(&["--ip", "192.168.12.256", "--dev", "eth0"]).is_err());
        assert!(parse(&["--ip", "192.168.12", "--dev", "eth0"]).is_err());
    }

    #[test]
    fn test_port_selection() {
        let full = parse(&["--ip", "10.0.0.1", "--dev", "eth0", "-f"]).unwrap();
        assert_eq!(full.scan.probe_ports().len(), 65535);
        assert!(matches!(full.scan.probe_ports(), ProbePorts::Range(_)));

        let range = parse(&["--ip", "10.0.0.1", "--dev", "eth0", "-p", "1-1024"]).unwrap();
        assert!(matches!(range.scan.probe_ports(), ProbePorts::Range(r) if r.len() == 1024));

        let list = parse(&["--ip", "10.0.0.1", "--dev", "eth0", "-p", "443,22,80"]).unwrap();
        let ports: Vec<u16> = list.scan.probe_ports().iter().map(u16::from).collect();
        assert_eq!(ports, vec![22, 80, 443]);

        assert!(parse(&["--ip", "10.0.0.1", "--dev", "eth0", "-f", "-p", "80"]).is_err());
        assert!(parse(&["--ip", "10.0.0.1", "--dev", "eth0", "-p", "0"]).is_err());
    }

    #[test]
    fn test_log_level() {
        let base = ["--ip", "10.0.0.1", "--dev", "eth0"];
        let with = |extra: &[&str]| {
            let mut args = base.to_vec();
            args.extend_from_slice(extra);
            parse(&args).unwrap().log_level()
        };
        assert_eq!(with(&[]), "warn");
        assert_eq!(with(&["-v"]), "info");
        assert_eq!(with(&["-vv"]), "debug");
        assert_eq!(with(&["-vvvv"]), "trace");
        assert_eq!(with(&["-q"]), "error");
        assert!(parse(&["--ip", "10.0.0.1", "--dev", "eth0", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_single_dash_flags() {
        let args = ["rawscan", "-ip", "192.168.12.1", "-dev", "enp4s0", "-f"].map(OsString::from);
        let cli = Cli::try_parse_from(normalize_args(args)).unwrap();
        assert_eq!(cli.scan.ip, Ipv4Addr::new(192, 168, 12, 1));
        assert_eq!(cli.scan.dev, "enp4s0");
        assert!(cli.scan.full);

        let args = ["rawscan", "-p", "22", "-v"].map(OsString::from);
        assert_eq!(normalize_args(args.clone()), args.to_vec());
    }

    #[test]
    fn test_output_format() {
        let cli = parse(&["--ip", "10.0.0.1", "--dev", "eth0", "-o", "json"]).unwrap();
        assert_eq!(cli.scan.output, OutputFormat::Json);
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
