//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use console::style;
use std::io::{self, Write};
use std::net::Ipv4Addr;

use crate::net::InterfaceInfo;
use crate::scanner::{Liveness, ScanReport};
use crate::types::{MacAddress, ProbePorts};

const RULE: &str = "───────────────────────────────────";

/// Print the information block shown once the target's MAC is known.
pub fn print_information(
    local: &InterfaceInfo,
    target: Ipv4Addr,
    target_mac: MacAddress,
    ports: &ProbePorts,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_information(&mut out, local, target, target_mac, ports)
}

/// Write the information block to `out`.
pub fn write_information<W: Write>(
    out: &mut W,
    local: &InterfaceInfo,
    target: Ipv4Addr,
    target_mac: MacAddress,
    ports: &ProbePorts,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style("Information").cyan().bold())?;
    writeln!(out, "{}", style("-----------").cyan())?;
    writeln!(out)?;
    writeln!(out, "Destination IP:             {}", target)?;
    writeln!(out, "Destination ports:          {}", ports)?;
    writeln!(out, "Destination MAC address:    {}", target_mac)?;
    writeln!(out, "Local network device:       {}", local.name)?;
    writeln!(out, "Local device index:         {}", local.index)?;
    writeln!(out, "Local MAC address:          {}", local.mac)?;
    writeln!(out, "Local IP address:           {}", local.ip)?;
    writeln!(out)?;
    Ok(())
}

/// Print a report in human-readable plain text format.
pub fn print_plain(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, report)
}

/// Write a report to `out`.
pub fn write_report<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    if report.liveness == Liveness::Dead {
        writeln!(
            out,
            "Target IP ({}) is {} or not responding to ping requests",
            report.target,
            style("down").red()
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "Target IP ({}) is {}.",
        report.target,
        style("up").green().bold()
    )?;
    writeln!(out)?;

    let open = report.open_ports_sorted();
    if open.is_empty() {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
    } else {
        writeln!(out, "  {}", style(RULE).dim())?;
        writeln!(
            out,
            "  {:>6}  {:<8}  {}",
            style("PORT").bold(),
            style("STATE").bold(),
            style("SERVICE").bold()
        )?;
        writeln!(out, "  {}", style(RULE).dim())?;
        for port in &open {
            writeln!(
                out,
                "  {:>6}  {:<8}  {}",
                port.port,
                style("open").green().bold(),
                port.service
            )?;
        }
        writeln!(out, "  {}", style(RULE).dim())?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "  {} {} ports probed in {:.2}s, {} open",
        style("Statistics:").bold(),
        report.ports_probed,
        report.duration_ms as f64 / 1000.0,
        style(open.len()).green().bold()
    )?;
    writeln!(out)?;
    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
