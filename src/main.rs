//! rawscan - raw-socket IPv4 port scanner.
//!
//! Usage:
//!   rawscan --ip <IPv4> --dev <IFACE> [-f | -p <SPEC>] [-o plain|json] [-v...] [-q]

use clap::Parser;
use rawscan::cli::{self, Cli};
use rawscan::output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            // Usage problems are not failures.
            let _ = e.print();
            std::process::exit(0);
        }
    };

    // RUST_LOG overrides -v/-q
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run().await {
        output::print_error(&e.to_string());
        std::process::exit(-1);
    }
}
