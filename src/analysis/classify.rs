// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Threshold classification
//!
//! Pure function of (reading, thresholds): no store access, no state.
//! A reading is CRITICAL if any single metric reaches its critical
//! threshold, HIGH if any reaches its warning threshold, NORMAL
//! otherwise. Absent optional metrics never contribute.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{Band, Thresholds};
use crate::telemetry::ReadingBody;

/// Severity level assigned to a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// All metrics below their warning thresholds
    Normal,
    /// At least one metric at or above warning, none at critical
    High,
    /// At least one metric at or above its critical threshold
    Critical,
}

/// Classifier output for one reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Overall severity level
    pub level: Severity,
    /// Per-metric flag: did the metric reach its warning threshold?
    /// Absent optional metrics are present in the map with `false`.
    pub exceeds: BTreeMap<String, bool>,
    /// GPS only: fix accuracy worse than the configured minimum.
    /// Independent of the speed level.
    pub poor_accuracy: bool,
}

impl Classification {
    fn normal() -> Self {
        Self {
            level: Severity::Normal,
            exceeds: BTreeMap::new(),
            poor_accuracy: false,
        }
    }
}

fn band_severity(value: f64, band: &Band) -> Severity {
    if value >= band.critical {
        Severity::Critical
    } else if value >= band.warning {
        Severity::High
    } else {
        Severity::Normal
    }
}

/// Severity of one metric against a band, `Normal` when absent.
fn metric_severity(value: Option<f64>, band: &Band) -> Severity {
    value.map(|v| band_severity(v, band)).unwrap_or(Severity::Normal)
}

/// Classify a reading against the configured threshold tables.
pub fn classify(body: &ReadingBody, thresholds: &Thresholds) -> Classification {
    match body {
        ReadingBody::Emission(m) => {
            let t = &thresholds.emission;
            let metrics = [
                ("co2", metric_severity(Some(m.co2_percentage), &t.co2)),
                ("co", metric_severity(Some(m.co_percentage), &t.co)),
                ("hc", metric_severity(Some(m.hc_ppm), &t.hc)),
                ("nox", metric_severity(m.nox_ppm, &t.nox)),
                ("pm25", metric_severity(m.pm25_level, &t.pm25)),
            ];
            from_metrics(&metrics)
        }
        ReadingBody::Obd(m) => {
            let t = &thresholds.obd;
            let rpm_band = Band {
                warning: t.rpm.high,
                critical: t.rpm.critical,
            };
            let temp_band = Band {
                warning: t.engine_temperature.high,
                critical: t.engine_temperature.critical,
            };
            let faults = m.fault_codes.len();
            let fault_severity = if faults > t.fault_codes.critical_limit {
                Severity::Critical
            } else if faults > t.fault_codes.warning_limit {
                Severity::High
            } else {
                Severity::Normal
            };
            let metrics = [
                ("rpm", metric_severity(m.rpm, &rpm_band)),
                (
                    "engine_temperature",
                    metric_severity(m.engine_temperature, &temp_band),
                ),
                ("fault_codes", fault_severity),
            ];
            from_metrics(&metrics)
        }
        ReadingBody::Gps(m) => {
            let t = &thresholds.speed;
            let metrics = [("speed", band_severity(m.speed, &t.speed))];
            let mut c = from_metrics(&metrics);
            // Accuracy is flagged independently and never raises the level.
            c.poor_accuracy = m.accuracy.map(|a| a > t.accuracy_minimum).unwrap_or(false);
            c
        }
    }
}

fn from_metrics(metrics: &[(&str, Severity)]) -> Classification {
    let mut c = Classification::normal();
    for (name, severity) in metrics {
        c.exceeds
            .insert(name.to_string(), *severity >= Severity::High);
        if *severity > c.level {
            c.level = *severity;
        }
    }
    c
}
