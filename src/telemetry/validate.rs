// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Reading validation
//!
//! Required-field checking is exhaustive: every missing field is reported
//! in one error. Range checking is fail-fast: fields are checked in a
//! fixed order and the first out-of-range value aborts validation.
//! Referential checks (vehicle/device existence) belong to the engine,
//! not here; validation is a pure function of the DTO.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::reading::{EmissionMetrics, GpsMetrics, ObdMetrics, ReadingBody};

/// Validation failure, surfaced to the caller with the offending field name(s)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// One or more required fields were absent
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    /// A numeric field fell outside its permitted range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Offending field
        field: &'static str,
        /// Observed value
        value: f64,
        /// Lower bound, inclusive
        min: f64,
        /// Upper bound, inclusive
        max: f64,
    },
    /// A foreign-key id was zero or negative
    #[error("{field} must be a positive integer, got {value}")]
    NotPositive {
        /// Offending field
        field: &'static str,
        /// Observed value
        value: i64,
    },
}

/// Inbound emission reading, as parsed off the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmissionReadingDto {
    /// Owning vehicle id
    pub vehicle_id: Option<i64>,
    /// Reporting device id
    pub tracking_device_id: Option<i64>,
    /// Plate number; resolved from the vehicle record when absent
    pub plate_number: Option<String>,
    /// Sample time; defaults to ingestion time when absent
    pub timestamp: Option<DateTime<Utc>>,
    /// CO2 percentage
    pub co2_percentage: Option<f64>,
    /// CO percentage
    pub co_percentage: Option<f64>,
    /// O2 percentage
    pub o2_percentage: Option<f64>,
    /// HC ppm
    pub hc_ppm: Option<f64>,
    /// NOx ppm
    pub nox_ppm: Option<f64>,
    /// PM2.5 level
    pub pm25_level: Option<f64>,
}

/// Inbound OBD reading
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObdReadingDto {
    /// Owning vehicle id
    pub vehicle_id: Option<i64>,
    /// Reporting device id
    pub tracking_device_id: Option<i64>,
    /// Plate number; resolved from the vehicle record when absent
    pub plate_number: Option<String>,
    /// Sample time; defaults to ingestion time when absent
    pub timestamp: Option<DateTime<Utc>>,
    /// Engine RPM
    pub rpm: Option<f64>,
    /// Throttle position percent
    pub throttle_position: Option<f64>,
    /// Engine temperature, Celsius
    pub engine_temperature: Option<f64>,
    /// Device-reported engine status
    pub engine_status: Option<String>,
    /// Active fault codes
    pub fault_codes: Option<Vec<String>>,
}

/// Inbound GPS reading
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpsReadingDto {
    /// Owning vehicle id
    pub vehicle_id: Option<i64>,
    /// Reporting device id
    pub tracking_device_id: Option<i64>,
    /// Plate number; resolved from the vehicle record when absent
    pub plate_number: Option<String>,
    /// Sample time; defaults to ingestion time when absent
    pub timestamp: Option<DateTime<Utc>>,
    /// Latitude, degrees
    pub latitude: Option<f64>,
    /// Longitude, degrees
    pub longitude: Option<f64>,
    /// Speed, km/h
    pub speed: Option<f64>,
    /// Horizontal accuracy, meters
    pub accuracy: Option<f64>,
    /// Whether the device considers itself tracking
    pub tracking_status: Option<bool>,
}

/// Inbound reading, any channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum ReadingDto {
    /// Emission channel
    Emission(EmissionReadingDto),
    /// OBD channel
    Obd(ObdReadingDto),
    /// GPS channel
    Gps(GpsReadingDto),
}

/// A DTO that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedReading {
    /// Owning vehicle id, positive
    pub vehicle_id: i64,
    /// Reporting device id, positive
    pub tracking_device_id: i64,
    /// Plate number if the device supplied one
    pub plate_number: Option<String>,
    /// Sample time if the device supplied one
    pub timestamp: Option<DateTime<Utc>>,
    /// Validated channel metrics
    pub body: ReadingBody,
}

/// Validate an inbound reading.
pub fn validate(dto: &ReadingDto) -> Result<ValidatedReading, ValidationError> {
    match dto {
        ReadingDto::Emission(d) => validate_emission(d),
        ReadingDto::Obd(d) => validate_obd(d),
        ReadingDto::Gps(d) => validate_gps(d),
    }
}

fn require<T: Copy>(
    missing: &mut Vec<String>,
    name: &'static str,
    value: Option<T>,
) -> Option<T> {
    if value.is_none() {
        missing.push(name.to_string());
    }
    value
}

fn check_ids(vehicle_id: i64, tracking_device_id: i64) -> Result<(), ValidationError> {
    if vehicle_id <= 0 {
        return Err(ValidationError::NotPositive {
            field: "vehicle_id",
            value: vehicle_id,
        });
    }
    if tracking_device_id <= 0 {
        return Err(ValidationError::NotPositive {
            field: "tracking_device_id",
            value: tracking_device_id,
        });
    }
    Ok(())
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

fn check_range_opt(
    field: &'static str,
    value: Option<f64>,
    min: f64,
    max: f64,
) -> Result<Option<f64>, ValidationError> {
    value.map(|v| check_range(field, v, min, max)).transpose()
}

fn validate_emission(d: &EmissionReadingDto) -> Result<ValidatedReading, ValidationError> {
    let mut missing = Vec::new();
    let vehicle_id = require(&mut missing, "vehicle_id", d.vehicle_id);
    let tracking_device_id = require(&mut missing, "tracking_device_id", d.tracking_device_id);
    let co2 = require(&mut missing, "co2_percentage", d.co2_percentage);
    let co = require(&mut missing, "co_percentage", d.co_percentage);
    let o2 = require(&mut missing, "o2_percentage", d.o2_percentage);
    let hc = require(&mut missing, "hc_ppm", d.hc_ppm);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let (vehicle_id, tracking_device_id) = (vehicle_id.unwrap(), tracking_device_id.unwrap());
    check_ids(vehicle_id, tracking_device_id)?;

    let metrics = EmissionMetrics {
        co2_percentage: check_range("co2_percentage", co2.unwrap(), 0.0, 20.0)?,
        co_percentage: check_range("co_percentage", co.unwrap(), 0.0, 10.0)?,
        o2_percentage: check_range("o2_percentage", o2.unwrap(), 0.0, 25.0)?,
        hc_ppm: check_range("hc_ppm", hc.unwrap(), 0.0, 10000.0)?,
        nox_ppm: check_range_opt("nox_ppm", d.nox_ppm, 0.0, 5000.0)?,
        pm25_level: check_range_opt("pm25_level", d.pm25_level, 0.0, 500.0)?,
    };

    Ok(ValidatedReading {
        vehicle_id,
        tracking_device_id,
        plate_number: d.plate_number.clone(),
        timestamp: d.timestamp,
        body: ReadingBody::Emission(metrics),
    })
}

fn validate_obd(d: &ObdReadingDto) -> Result<ValidatedReading, ValidationError> {
    let mut missing = Vec::new();
    let vehicle_id = require(&mut missing, "vehicle_id", d.vehicle_id);
    let tracking_device_id = require(&mut missing, "tracking_device_id", d.tracking_device_id);
    let throttle = require(&mut missing, "throttle_position", d.throttle_position);
    if d.fault_codes.is_none() {
        missing.push("fault_codes".to_string());
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let (vehicle_id, tracking_device_id) = (vehicle_id.unwrap(), tracking_device_id.unwrap());
    check_ids(vehicle_id, tracking_device_id)?;

    let metrics = ObdMetrics {
        rpm: check_range_opt("rpm", d.rpm, 0.0, 10000.0)?,
        throttle_position: check_range("throttle_position", throttle.unwrap(), 0.0, 100.0)?,
        engine_temperature: check_range_opt("engine_temperature", d.engine_temperature, -40.0, 200.0)?,
        engine_status: d.engine_status.clone(),
        fault_codes: d.fault_codes.clone().unwrap(),
    };

    Ok(ValidatedReading {
        vehicle_id,
        tracking_device_id,
        plate_number: d.plate_number.clone(),
        timestamp: d.timestamp,
        body: ReadingBody::Obd(metrics),
    })
}

fn validate_gps(d: &GpsReadingDto) -> Result<ValidatedReading, ValidationError> {
    let mut missing = Vec::new();
    let vehicle_id = require(&mut missing, "vehicle_id", d.vehicle_id);
    let tracking_device_id = require(&mut missing, "tracking_device_id", d.tracking_device_id);
    let latitude = require(&mut missing, "latitude", d.latitude);
    let longitude = require(&mut missing, "longitude", d.longitude);
    let speed = require(&mut missing, "speed", d.speed);
    let tracking_status = require(&mut missing, "tracking_status", d.tracking_status);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let (vehicle_id, tracking_device_id) = (vehicle_id.unwrap(), tracking_device_id.unwrap());
    check_ids(vehicle_id, tracking_device_id)?;

    let metrics = GpsMetrics {
        latitude: check_range("latitude", latitude.unwrap(), -90.0, 90.0)?,
        longitude: check_range("longitude", longitude.unwrap(), -180.0, 180.0)?,
        speed: check_range("speed", speed.unwrap(), 0.0, 500.0)?,
        accuracy: check_range_opt("accuracy", d.accuracy, 0.0, 1000.0)?,
        tracking_status: tracking_status.unwrap(),
    };

    Ok(ValidatedReading {
        vehicle_id,
        tracking_device_id,
        plate_number: d.plate_number.clone(),
        timestamp: d.timestamp,
        body: ReadingBody::Gps(metrics),
    })
}
