// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Configuration module
//!
//! Warning/critical thresholds are business numbers that change without a
//! rebuild, so they live in the TOML config alongside the operational
//! settings. The defaults below are the provisional values agreed with
//! fleet operations.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Threshold tables, one per channel
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "FleetPulse".to_string(),
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            database: DatabaseConfig::default(),
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("fleetpulse"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database path
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/fleetpulse.db"),
        }
    }
}

/// A warning/critical threshold pair for one metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Band {
    /// Value at or above which the metric is HIGH
    pub warning: f64,
    /// Value at or above which the metric is CRITICAL
    pub critical: f64,
}

/// Threshold tables, one per channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thresholds {
    /// Emission channel table
    pub emission: EmissionThresholds,
    /// GPS/speed channel table
    pub speed: SpeedThresholds,
    /// OBD channel table
    pub obd: ObdThresholds,
}

/// Emission channel thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionThresholds {
    /// CO2 percentage band
    pub co2: Band,
    /// CO percentage band
    pub co: Band,
    /// HC ppm band
    pub hc: Band,
    /// NOx ppm band
    pub nox: Band,
    /// PM2.5 band
    pub pm25: Band,
}

impl Default for EmissionThresholds {
    fn default() -> Self {
        Self {
            co2: Band { warning: 12.0, critical: 15.0 },
            co: Band { warning: 0.5, critical: 1.0 },
            hc: Band { warning: 200.0, critical: 400.0 },
            nox: Band { warning: 1000.0, critical: 2000.0 },
            pm25: Band { warning: 150.0, critical: 250.0 },
        }
    }
}

/// GPS/speed channel thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedThresholds {
    /// Speed band, km/h
    pub speed: Band,
    /// Minimum acceptable horizontal accuracy, meters; fixes reporting a
    /// larger value are flagged as poor accuracy
    pub accuracy_minimum: f64,
    /// Expected device reporting interval, seconds
    pub tracking_interval_secs: u64,
}

impl Default for SpeedThresholds {
    fn default() -> Self {
        Self {
            speed: Band { warning: 100.0, critical: 120.0 },
            accuracy_minimum: 50.0,
            tracking_interval_secs: 300,
        }
    }
}

/// RPM operating bands
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RpmBands {
    /// Below this the engine is idling abnormally low
    pub idle: f64,
    /// Upper bound of normal cruising RPM
    pub normal: f64,
    /// Sustained high RPM
    pub high: f64,
    /// Redline
    pub critical: f64,
}

/// Engine temperature bands, Celsius
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TemperatureBands {
    /// Normal operating temperature
    pub normal: f64,
    /// Overheating onset
    pub high: f64,
    /// Severe overheating
    pub critical: f64,
}

/// Throttle position bands, percent
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThrottleBands {
    /// At or below this the throttle is closed
    pub closed: f64,
    /// Partial throttle upper bound
    pub partial: f64,
    /// Full throttle onset
    pub full: f64,
}

/// Active fault-code count limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaultCodeLimits {
    /// More than this many active codes is notable
    pub max_active: usize,
    /// More than this many is a warning
    pub warning_limit: usize,
    /// More than this many is critical
    pub critical_limit: usize,
}

/// Performance score grade boundaries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceGrades {
    /// Score at or above which the grade is excellent
    pub excellent: f64,
    /// Good grade boundary
    pub good: f64,
    /// Fair grade boundary
    pub fair: f64,
    /// Poor grade boundary; below this the grade is failing
    pub poor: f64,
}

/// OBD channel thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObdThresholds {
    /// RPM bands
    pub rpm: RpmBands,
    /// Engine temperature bands
    pub engine_temperature: TemperatureBands,
    /// Throttle position bands
    pub throttle_position: ThrottleBands,
    /// Fault-code count limits
    pub fault_codes: FaultCodeLimits,
    /// Performance grade boundaries
    pub performance: PerformanceGrades,
}

impl Default for ObdThresholds {
    fn default() -> Self {
        Self {
            rpm: RpmBands {
                idle: 800.0,
                normal: 3000.0,
                high: 5000.0,
                critical: 8000.0,
            },
            engine_temperature: TemperatureBands {
                normal: 90.0,
                high: 105.0,
                critical: 120.0,
            },
            throttle_position: ThrottleBands {
                closed: 5.0,
                partial: 50.0,
                full: 90.0,
            },
            fault_codes: FaultCodeLimits {
                max_active: 2,
                warning_limit: 3,
                critical_limit: 5,
            },
            performance: PerformanceGrades {
                excellent: 90.0,
                good: 75.0,
                fair: 60.0,
                poor: 40.0,
            },
        }
    }
}
