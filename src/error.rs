//! Error types for rawscan.
//!
//! Uses `thiserror` for ergonomic error definitions. Each layer has its own
//! enum; `CliError` folds them together for the binary.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::{AddressError, PortError};

/// Main error type for resolution, probing and scanning.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Raw socket error: {0}")]
    RawSocket(String),

    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("Interface {name} has no usable {what}")]
    InterfaceAddress { name: String, what: &'static str },

    #[error("Transmit failure: {0}")]
    TransmitFailure(String),

    #[error("Listener failed: {0}")]
    ListenerFailed(String),

    #[error("Cannot resolve MAC address of {0}")]
    ResolutionFailed(Ipv4Addr),

    #[error("Scan aborted after {sent} of {total} probes: {reason}")]
    ScanAborted {
        sent: usize,
        total: usize,
        reason: String,
    },

    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ScanError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors raised while loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("invalid setting: {0}")]
    InvalidValue(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level error for the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
