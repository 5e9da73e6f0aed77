//! Scan settings and their on-disk location.
//!
//! Every timing constant the scanner uses lives in [`ScanSettings`], loaded
//! once at startup and passed explicitly to each component.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/rawscan)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Resolve paths using XDG directories.
    pub fn new() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "rawscan", "rawscan").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Timing and source-port parameters for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// ARP and ICMP listen deadline.
    pub reply_timeout_ms: u64,
    /// Longest single receive wait in every listener.
    pub poll_interval_ms: u64,
    /// Wait after the last SYN before the listener is told to stop.
    pub settle_ms: u64,
    /// Inter-packet delay when sending over a contiguous range.
    pub range_delay_us: u64,
    /// Inter-packet delay when sending an explicit port list.
    pub list_delay_us: u64,
    /// Slack added to the expected scan time to bound the listener.
    pub listener_grace_ms: u64,
    /// Seed of the source-port generator.
    pub source_port_seed: u64,
    /// Lowest source port drawn; the highest is 65535.
    pub source_port_min: u16,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            reply_timeout_ms: 7000,
            poll_interval_ms: 100,
            settle_ms: 5000,
            range_delay_us: 100,
            list_delay_us: 100_000,
            listener_grace_ms: 30_000,
            source_port_seed: 0,
            source_port_min: 1000,
        }
    }
}

impl ScanSettings {
    /// Load from `path` if given, else the default settings file if it
    /// exists, else defaults.
    pub fn resolve(path: Option<&Path>) -> ConfigResult<Self> {
        let settings = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default location.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::new()?.settings_file();

        if !file.exists() {
            debug!(path = %file.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), "settings loaded");
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Reject values no scan can run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.source_port_min == 0 {
            return Err(ConfigError::InvalidValue(
                "source_port_min must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn listener_grace(&self) -> Duration {
        Duration::from_millis(self.listener_grace_ms)
    }

    /// Inter-packet delay for range (`true`) or list (`false`) sends.
    pub fn send_delay(&self, range: bool) -> Duration {
        if range {
            Duration::from_micros(self.range_delay_us)
        } else {
            Duration::from_micros(self.list_delay_us)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = ScanSettings::default();
        assert_eq!(settings.reply_timeout(), Duration::from_secs(7));
        assert_eq!(settings.poll_interval(), Duration::from_millis(100));
        assert_eq!(settings.settle(), Duration::from_secs(5));
        assert_eq!(settings.send_delay(true), Duration::from_micros(100));
        assert_eq!(settings.send_delay(false), Duration::from_millis(100));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"settle_ms": 250, "source_port_seed": 7}}"#).unwrap();

        let settings = ScanSettings::resolve(Some(file.path())).unwrap();
        assert_eq!(settings.settle_ms, 250);
        assert_eq!(settings.source_port_seed, 7);
        assert_eq!(settings.reply_timeout_ms, 7000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"poll_interval_ms": 0}}"#).unwrap();
        assert!(matches!(
            ScanSettings::resolve(Some(file.path())),
            Err(ConfigError::InvalidValue(_))
        ));

        let settings = ScanSettings {
            source_port_min: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_malformed_and_missing_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ScanSettings::load_from(file.path()),
            Err(ConfigError::InvalidFormat(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ScanSettings::load_from(&dir.path().join("absent.json")),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
