//! Configuration management for rawscan.
//!
//! Provides XDG-compliant settings storage. Settings are read once and
//! handed to each component; nothing reads them from global state.

mod settings;

pub use settings::{Paths, ScanSettings};
