//! Engine configuration
//!
//! Construction-time settings for the session engine: which devices a scan
//! accepts, how long a scan runs, how much live history is retained, and
//! where decoded measurements are routed.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Vendor naming convention the discovery filter matches against
pub const DEFAULT_VENDOR_PREFIX: &str = "Movesense";

/// Where decoded measurements are routed
///
/// Replaces the forked live-only / persisting controller implementations
/// with one engine parameterized by its sink capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SinkMode {
    /// Append to the live ring only; nothing is persisted
    #[default]
    LiveOnly,
    /// Persist measurements only; the live ring is not fed
    PersistOnly,
    /// Feed the live ring and persist every measurement
    LiveAndPersist,
}

impl SinkMode {
    pub fn feeds_live(&self) -> bool {
        matches!(self, SinkMode::LiveOnly | SinkMode::LiveAndPersist)
    }

    pub fn persists(&self) -> bool {
        matches!(self, SinkMode::PersistOnly | SinkMode::LiveAndPersist)
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Display-name prefix a discovered device must carry to be accepted
    pub vendor_prefix: String,

    /// Seconds a scan runs before stopping itself
    pub scan_timeout_secs: u64,

    /// Live buffer capacity per serial and signal group, counted across
    /// all three axes combined
    pub live_buffer_cap: usize,

    /// SQLite database path; required when the sink mode persists
    pub database_path: Option<PathBuf>,

    /// Measurement routing
    pub sink: SinkMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vendor_prefix: DEFAULT_VENDOR_PREFIX.to_string(),
            scan_timeout_secs: 10,
            live_buffer_cap: 150,
            database_path: None,
            sink: SinkMode::LiveOnly,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn scan_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scan_timeout_secs)
    }
}
