use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::protocol::{WRITE_CHARACTERISTIC, WRITE_SERVICE};
use crate::registry::RegistrySnapshot;
use crate::Result;

/// Connection settings shared by every connection manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// How long a discovery scan runs before giving up (milliseconds)
    pub scan_window_ms: u64,
    /// GATT service commands are written to
    pub service: Uuid,
    /// Characteristic commands are written to
    pub characteristic: Uuid,
    /// How often a connected device is asked whether it is still connected (milliseconds)
    pub liveness_interval_ms: u64,
}

impl LinkConfig {
    pub fn scan_window(&self) -> Duration {
        Duration::from_millis(self.scan_window_ms)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms.max(1))
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            scan_window_ms: 5_000,
            service: WRITE_SERVICE,
            characteristic: WRITE_CHARACTERISTIC,
            liveness_interval_ms: 1_000,
        }
    }
}

/// Schedule engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Re-send the power command on later ticks when a schedule toggle was dropped
    pub resync_dropped_toggles: bool,
    /// Interval between host loop iterations (milliseconds)
    pub tick_interval_ms: u64,
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resync_dropped_toggles: false,
            tick_interval_ms: 100,
        }
    }
}

/// Settings document: connection and engine configuration plus the device registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub link: LinkConfig,
    pub engine: EngineConfig,
    pub registry: RegistrySnapshot,
}

impl Settings {
    /// Loads settings from a JSON file; a missing file yields defaults
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        debug!("Loaded {} devices", settings.registry.devices.len());
        Ok(settings)
    }

    /// Writes settings as pretty JSON, creating parent directories
    #[instrument(skip(self))]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved {} devices", self.registry.devices.len());
        Ok(())
    }
}
