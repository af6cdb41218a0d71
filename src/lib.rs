// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! FleetPulse - Vehicle Telemetry Analysis & Alerting Engine
//!
//! Receives periodic sensor readings from vehicle tracking devices
//! (exhaust-gas emissions, onboard diagnostics, GPS fixes), validates
//! them, classifies each reading against configurable warning/critical
//! thresholds, derives an operational status for the owning vehicle,
//! generates alerts when thresholds are crossed, and computes aggregate
//! statistics and geospatial route analysis over historical readings.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     FleetPulse Engine                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐  ┌──────────┐  ┌───────────┐  ┌────────────┐  │
//! │  │ Validate │→ │ Classify │→ │  Alert    │→ │  Vehicle   │  │
//! │  │          │  │          │  │ Generator │  │  Status    │  │
//! │  └──────────┘  └──────────┘  └───────────┘  └────────────┘  │
//! │       ↓             ↓              ↓              ↓         │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │      Stores (readings, vehicles, devices, alerts)    │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod alerts;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod store;
pub mod telemetry;

// Re-exports for convenience
pub use alerts::{Alert, AlertData};
pub use analysis::{Classification, Severity};
pub use config::{Config, Thresholds};
pub use engine::{Engine, EngineError, IngestOutcome};
pub use telemetry::{Channel, Reading, ReadingBody, TrackingDevice, Vehicle, VehicleStatus};

/// FleetPulse version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FleetPulse name
pub const NAME: &str = "FleetPulse";
