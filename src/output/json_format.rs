//! JSON output formatting.

use crate::scanner::ScanReport;
use std::io;

/// Render a report as pretty-printed JSON.
pub fn to_json(report: &ScanReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Print a report in JSON format.
pub fn print_json(report: &ScanReport) -> io::Result<()> {
    let json = to_json(report).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}
