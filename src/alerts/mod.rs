// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Alert generation
//!
//! Pure: turns a classified reading into zero or more alert records, one
//! per breached metric. Persistence and owner attribution happen in the
//! engine; a batch is written all-or-nothing and no store call is made
//! when nothing fired.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Classification;
use crate::config::{Band, Thresholds};
use crate::telemetry::ReadingBody;

/// An alert before owner attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertData {
    /// Machine-readable alert kind, e.g. `emission_co2`
    pub alert_type: String,
    /// Human-readable title; prefixed "Critical" at critical severity
    pub title: String,
    /// Full message including plate number, value and threshold
    pub message: String,
    /// Formatted measured value with unit
    pub trigger_value: String,
    /// Formatted `"<metric> > <threshold>"`
    pub trigger_threshold: String,
    /// Vehicle the alert concerns
    pub vehicle_id: i64,
}

/// A persisted alert record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Store identifier
    pub id: String,
    /// Machine-readable alert kind
    pub alert_type: String,
    /// Title
    pub title: String,
    /// Message
    pub message: String,
    /// Formatted measured value with unit
    pub trigger_value: String,
    /// Formatted threshold expression
    pub trigger_threshold: String,
    /// Vehicle the alert concerns
    pub vehicle_id: i64,
    /// Owner the batch is attributed to
    pub user_id: i64,
    /// Unread on creation; never mutated by this engine
    pub is_read: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Attribute an [`AlertData`] to a vehicle owner.
    pub fn from_data(data: AlertData, user_id: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            alert_type: data.alert_type,
            title: data.title,
            message: data.message,
            trigger_value: data.trigger_value,
            trigger_threshold: data.trigger_threshold,
            vehicle_id: data.vehicle_id,
            user_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

struct MetricAlertSpec<'a> {
    /// Key in the threshold expression, e.g. "co2"
    key: &'a str,
    /// Subject in titles, e.g. "CO2 Emission Level"
    subject: &'a str,
    /// Alert kind
    alert_type: &'a str,
    value: f64,
    unit: &'a str,
    decimals: usize,
    band: Band,
}

fn metric_alert(spec: &MetricAlertSpec<'_>, plate: &str, vehicle_id: i64) -> Option<AlertData> {
    let (severity_word, threshold) = if spec.value >= spec.band.critical {
        ("Critical", spec.band.critical)
    } else if spec.value >= spec.band.warning {
        ("High", spec.band.warning)
    } else {
        return None;
    };

    let trigger_value = format!("{:.*}{}", spec.decimals, spec.value, spec.unit);
    Some(AlertData {
        alert_type: spec.alert_type.to_string(),
        title: format!("{severity_word} {}", spec.subject),
        message: format!(
            "Vehicle {plate}: {} reached {trigger_value} ({} threshold {threshold})",
            spec.subject.to_lowercase(),
            severity_word.to_lowercase(),
        ),
        trigger_value,
        trigger_threshold: format!("{} > {threshold}", spec.key),
        vehicle_id,
    })
}

/// Generate alerts for a classified reading. One alert per breached
/// metric; multiple alerts can fire from a single reading.
pub fn generate(
    body: &ReadingBody,
    classification: &Classification,
    thresholds: &Thresholds,
    vehicle_id: i64,
    plate_number: &str,
) -> Vec<AlertData> {
    let mut alerts = Vec::new();
    match body {
        ReadingBody::Emission(m) => {
            let t = &thresholds.emission;
            let specs = [
                MetricAlertSpec {
                    key: "co2",
                    subject: "CO2 Emission Level",
                    alert_type: "emission_co2",
                    value: m.co2_percentage,
                    unit: "%",
                    decimals: 2,
                    band: t.co2,
                },
                MetricAlertSpec {
                    key: "co",
                    subject: "CO Emission Level",
                    alert_type: "emission_co",
                    value: m.co_percentage,
                    unit: "%",
                    decimals: 2,
                    band: t.co,
                },
                MetricAlertSpec {
                    key: "hc",
                    subject: "HC Emission Level",
                    alert_type: "emission_hc",
                    value: m.hc_ppm,
                    unit: " ppm",
                    decimals: 1,
                    band: t.hc,
                },
            ];
            for spec in &specs {
                alerts.extend(metric_alert(spec, plate_number, vehicle_id));
            }
            if let Some(nox) = m.nox_ppm {
                alerts.extend(metric_alert(
                    &MetricAlertSpec {
                        key: "nox",
                        subject: "NOx Emission Level",
                        alert_type: "emission_nox",
                        value: nox,
                        unit: " ppm",
                        decimals: 1,
                        band: t.nox,
                    },
                    plate_number,
                    vehicle_id,
                ));
            }
            if let Some(pm25) = m.pm25_level {
                alerts.extend(metric_alert(
                    &MetricAlertSpec {
                        key: "pm25",
                        subject: "PM2.5 Level",
                        alert_type: "emission_pm25",
                        value: pm25,
                        unit: " µg/m³",
                        decimals: 1,
                        band: t.pm25,
                    },
                    plate_number,
                    vehicle_id,
                ));
            }
        }
        ReadingBody::Obd(m) => {
            let t = &thresholds.obd;
            if let Some(rpm) = m.rpm {
                alerts.extend(metric_alert(
                    &MetricAlertSpec {
                        key: "rpm",
                        subject: "Engine RPM",
                        alert_type: "obd_rpm",
                        value: rpm,
                        unit: " RPM",
                        decimals: 0,
                        band: Band {
                            warning: t.rpm.high,
                            critical: t.rpm.critical,
                        },
                    },
                    plate_number,
                    vehicle_id,
                ));
            }
            if let Some(temp) = m.engine_temperature {
                alerts.extend(metric_alert(
                    &MetricAlertSpec {
                        key: "engine_temperature",
                        subject: "Engine Temperature",
                        alert_type: "obd_temperature",
                        value: temp,
                        unit: " °C",
                        decimals: 1,
                        band: Band {
                            warning: t.engine_temperature.high,
                            critical: t.engine_temperature.critical,
                        },
                    },
                    plate_number,
                    vehicle_id,
                ));
            }
            let faults = m.fault_codes.len();
            let limits = &t.fault_codes;
            // Count limits are strict greater-than, so they do not fit the
            // generic band helper.
            let fault_alert = if faults > limits.critical_limit {
                Some(("Critical", limits.critical_limit))
            } else if faults > limits.warning_limit {
                Some(("High", limits.warning_limit))
            } else {
                None
            };
            if let Some((severity_word, limit)) = fault_alert {
                alerts.push(AlertData {
                    alert_type: "obd_fault_codes".to_string(),
                    title: format!("{severity_word} Fault Code Count"),
                    message: format!(
                        "Vehicle {plate_number}: {faults} active fault codes ({} limit {limit})",
                        severity_word.to_lowercase(),
                    ),
                    trigger_value: format!("{faults} fault codes"),
                    trigger_threshold: format!("fault_codes > {limit}"),
                    vehicle_id,
                });
            }
        }
        ReadingBody::Gps(m) => {
            let t = &thresholds.speed;
            if let Some(mut alert) = metric_alert(
                &MetricAlertSpec {
                    key: "speed",
                    subject: "Speed Violation",
                    alert_type: "speed_violation",
                    value: m.speed,
                    unit: " km/h",
                    decimals: 1,
                    band: t.speed,
                },
                plate_number,
                vehicle_id,
            ) {
                // "High Speed Violation" reads oddly; keep the canonical title.
                if m.speed < t.speed.critical {
                    alert.title = "Speed Violation Warning".to_string();
                }
                alerts.push(alert);
            }
            // Poor accuracy is alerted independently of the speed level.
            if classification.poor_accuracy {
                if let Some(accuracy) = m.accuracy {
                    alerts.push(AlertData {
                        alert_type: "gps_accuracy".to_string(),
                        title: "Poor GPS Accuracy".to_string(),
                        message: format!(
                            "Vehicle {plate_number}: GPS accuracy degraded to {accuracy:.1} m \
                             (minimum {})",
                            t.accuracy_minimum,
                        ),
                        trigger_value: format!("{accuracy:.1} m"),
                        trigger_threshold: format!("accuracy > {}", t.accuracy_minimum),
                        vehicle_id,
                    });
                }
            }
        }
    }
    alerts
}
