use crate::prelude::*;

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    /// YAML capture of table payloads, table id to hex string
    pub capture_file: Option<String>,

    /// Tables to decode; empty means every known table
    #[serde(default = "Vec::new")]
    pub tables: Vec<u16>,

    /// Overrides the firmware revision read from table 1, e.g. "2.008"
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub firmware: Option<Revision>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub hardware: Option<Revision>,

    pub ge_meter: Option<bool>,

    #[serde(default = "Config::default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "Config::default_pretty")]
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: Self::default_loglevel(),
            capture_file: None,
            tables: Vec::new(),
            firmware: None,
            hardware: None,
            ge_meter: None,
            timeout_ms: Self::default_timeout_ms(),
            pretty: Self::default_pretty(),
        }
    }
}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        info!("Reading configuration from {}", file);
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("config.rs:error reading {}: {}", file, err))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn loglevel(&self) -> &str {
        &self.loglevel
    }

    pub fn capture_file(&self) -> Option<&str> {
        self.capture_file.as_deref()
    }

    pub fn tables(&self) -> Vec<TableId> {
        self.tables.iter().copied().map(TableId).collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }

    pub fn log(&self) {
        info!("Configuration loaded successfully:");
        info!("  Capture File: {}", self.capture_file.as_deref().unwrap_or("(none)"));
        if self.tables.is_empty() {
            info!("  Tables: all known");
        } else {
            info!("  Tables: {:?}", self.tables);
        }
        info!(
            "  Firmware: {}",
            self.firmware.map(|r| r.to_string()).unwrap_or_else(|| "from table 1".to_string())
        );
        info!(
            "  Hardware: {}",
            self.hardware.map(|r| r.to_string()).unwrap_or_else(|| "from table 1".to_string())
        );
        info!(
            "  GE Meter: {}",
            self.ge_meter.map(|g| g.to_string()).unwrap_or_else(|| "from table 1".to_string())
        );
        info!("  Timeout: {}ms", self.timeout_ms);
        info!("  Log Level: {}", self.loglevel);
    }

    fn validate(&self) -> Result<()> {
        if self.loglevel.parse::<log::LevelFilter>().is_err() {
            bail!("loglevel must be one of off, error, warn, info, debug, trace");
        }

        if self.timeout_ms == 0 {
            return Err(anyhow!("config.rs:Invalid timeout_ms: 0"));
        }

        if let Some(file) = &self.capture_file {
            if file.is_empty() {
                return Err(anyhow!("config.rs:capture_file cannot be empty"));
            }
        }

        Ok(())
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_timeout_ms() -> u64 {
        5000
    }

    fn default_pretty() -> bool {
        false
    }
}
