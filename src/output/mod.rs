//! Output formatting module.
//!
//! Provides formatters for plain text and JSON output of scan reports.

mod json_format;
mod plain;

pub use json_format::{print_json, to_json};
pub use plain::{
    print_error, print_information, print_plain, print_warning, write_information, write_report,
};

use crate::cli::OutputFormat;
use crate::scanner::ScanReport;
use std::io;

/// Format and print a scan report according to the specified format.
pub fn print_results(report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::print_plain(report),
        OutputFormat::Json => json_format::print_json(report),
    }
}
