// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Reading types - one timestamped sensor sample per vehicle and channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Telemetry channels supported by FleetPulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Exhaust-gas emission readings (CO2, CO, O2, HC, NOx, PM2.5)
    Emission,
    /// Onboard diagnostics (RPM, temperature, throttle, fault codes)
    Obd,
    /// GPS fixes (position, speed, accuracy)
    Gps,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Emission => write!(f, "emission"),
            Channel::Obd => write!(f, "obd"),
            Channel::Gps => write!(f, "gps"),
        }
    }
}

/// Exhaust-gas emission metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionMetrics {
    /// CO2 concentration, percent of exhaust volume [0, 20]
    pub co2_percentage: f64,
    /// CO concentration, percent [0, 10]
    pub co_percentage: f64,
    /// O2 concentration, percent [0, 25]
    pub o2_percentage: f64,
    /// Unburned hydrocarbons, ppm [0, 10000]
    pub hc_ppm: f64,
    /// Nitrogen oxides, ppm [0, 5000]
    pub nox_ppm: Option<f64>,
    /// Fine particulate level [0, 500]
    pub pm25_level: Option<f64>,
}

/// Onboard-diagnostic metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObdMetrics {
    /// Engine speed, revolutions per minute [0, 10000]
    pub rpm: Option<f64>,
    /// Throttle position, percent [0, 100]
    pub throttle_position: f64,
    /// Engine coolant temperature, Celsius [-40, 200]
    pub engine_temperature: Option<f64>,
    /// Free-form engine status string reported by the device
    pub engine_status: Option<String>,
    /// Active diagnostic trouble codes; order carries no meaning
    pub fault_codes: Vec<String>,
}

/// GPS fix metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsMetrics {
    /// Latitude in decimal degrees [-90, 90]
    pub latitude: f64,
    /// Longitude in decimal degrees [-180, 180]
    pub longitude: f64,
    /// Ground speed, km/h [0, 500]
    pub speed: f64,
    /// Horizontal accuracy estimate, meters [0, 1000]
    pub accuracy: Option<f64>,
    /// Whether the device considers itself actively tracking
    pub tracking_status: bool,
}

/// Channel-specific payload of a reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "metrics", rename_all = "lowercase")]
pub enum ReadingBody {
    /// Emission channel payload
    Emission(EmissionMetrics),
    /// OBD channel payload
    Obd(ObdMetrics),
    /// GPS channel payload
    Gps(GpsMetrics),
}

impl ReadingBody {
    /// Channel this payload belongs to
    pub fn channel(&self) -> Channel {
        match self {
            ReadingBody::Emission(_) => Channel::Emission,
            ReadingBody::Obd(_) => Channel::Obd,
            ReadingBody::Gps(_) => Channel::Gps,
        }
    }
}

/// A persisted telemetry reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Store-assigned identifier
    pub id: i64,
    /// Owning vehicle
    pub vehicle_id: i64,
    /// Reporting device
    pub tracking_device_id: i64,
    /// Plate number of the owning vehicle at ingestion time
    pub plate_number: String,
    /// Device-reported sample time
    pub timestamp: DateTime<Utc>,
    /// Channel-specific metrics
    pub body: ReadingBody,
    /// Ingestion time
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker; only ever set on emission readings
    pub deleted_at: Option<DateTime<Utc>>,
    /// Set when the reading was persisted but its alert batch failed,
    /// so it can be picked up for alert reprocessing
    pub alerting_failed: bool,
}

impl Reading {
    /// Channel of this reading
    pub fn channel(&self) -> Channel {
        self.body.channel()
    }

    /// GPS metrics, if this is a GPS reading
    pub fn gps(&self) -> Option<&GpsMetrics> {
        match &self.body {
            ReadingBody::Gps(m) => Some(m),
            _ => None,
        }
    }

    /// OBD metrics, if this is an OBD reading
    pub fn obd(&self) -> Option<&ObdMetrics> {
        match &self.body {
            ReadingBody::Obd(m) => Some(m),
            _ => None,
        }
    }

    /// Emission metrics, if this is an emission reading
    pub fn emission(&self) -> Option<&EmissionMetrics> {
        match &self.body {
            ReadingBody::Emission(m) => Some(m),
            _ => None,
        }
    }
}

/// A validated reading ready to be persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReading {
    /// Owning vehicle
    pub vehicle_id: i64,
    /// Reporting device
    pub tracking_device_id: i64,
    /// Plate number resolved by the orchestrator
    pub plate_number: String,
    /// Sample time
    pub timestamp: DateTime<Utc>,
    /// Channel-specific metrics
    pub body: ReadingBody,
}
