// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Vehicle status derivation
//!
//! Each channel derives its own status from a classified reading; the
//! result is written into that channel's slot only. Merging across
//! channels happens at read time (`ChannelStatuses::merged`).

use crate::analysis::{Classification, Severity, STATIONARY_SPEED_KMH};
use crate::config::Thresholds;
use crate::telemetry::{ReadingBody, VehicleStatus};

/// Derive the channel status for a classified reading.
pub fn derive_status(
    body: &ReadingBody,
    classification: &Classification,
    thresholds: &Thresholds,
) -> VehicleStatus {
    match body {
        ReadingBody::Emission(_) => {
            if classification.level >= Severity::High {
                VehicleStatus::TopPolluting
            } else {
                VehicleStatus::NormalEmission
            }
        }
        ReadingBody::Gps(m) => {
            if m.speed >= thresholds.speed.speed.warning {
                VehicleStatus::Speeding
            } else if m.speed < STATIONARY_SPEED_KMH {
                VehicleStatus::Stationary
            } else {
                VehicleStatus::Moving
            }
        }
        ReadingBody::Obd(m) => {
            let t = &thresholds.obd;
            let faults = m.fault_codes.len();
            let overheating = m
                .engine_temperature
                .map(|v| v >= t.engine_temperature.high)
                .unwrap_or(false);
            let redline = m.rpm.map(|v| v >= t.rpm.critical).unwrap_or(false);
            if faults > t.fault_codes.critical_limit || overheating || redline {
                VehicleStatus::UnderMaintenance
            } else if faults > t.fault_codes.max_active {
                VehicleStatus::TopPolluting
            } else {
                VehicleStatus::NormalEmission
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classify;
    use crate::telemetry::{EmissionMetrics, GpsMetrics, ObdMetrics};

    fn status_of(body: ReadingBody) -> VehicleStatus {
        let t = Thresholds::default();
        let c = classify(&body, &t);
        derive_status(&body, &c, &t)
    }

    fn gps(speed: f64) -> ReadingBody {
        ReadingBody::Gps(GpsMetrics {
            latitude: 0.0,
            longitude: 0.0,
            speed,
            accuracy: None,
            tracking_status: true,
        })
    }

    fn obd(rpm: Option<f64>, temp: Option<f64>, faults: usize) -> ReadingBody {
        ReadingBody::Obd(ObdMetrics {
            rpm,
            throttle_position: 20.0,
            engine_temperature: temp,
            engine_status: None,
            fault_codes: (0..faults).map(|i| format!("P{i:04}")).collect(),
        })
    }

    #[test]
    fn emission_high_is_top_polluting() {
        let body = ReadingBody::Emission(EmissionMetrics {
            co2_percentage: 13.0,
            co_percentage: 0.1,
            o2_percentage: 15.0,
            hc_ppm: 50.0,
            nox_ppm: None,
            pm25_level: None,
        });
        assert_eq!(status_of(body), VehicleStatus::TopPolluting);
    }

    #[test]
    fn gps_speed_bands() {
        assert_eq!(status_of(gps(2.0)), VehicleStatus::Stationary);
        assert_eq!(status_of(gps(60.0)), VehicleStatus::Moving);
        assert_eq!(status_of(gps(100.0)), VehicleStatus::Speeding);
        assert_eq!(status_of(gps(130.0)), VehicleStatus::Speeding);
    }

    #[test]
    fn obd_maintenance_triggers() {
        assert_eq!(status_of(obd(Some(8000.0), None, 0)), VehicleStatus::UnderMaintenance);
        assert_eq!(status_of(obd(None, Some(110.0), 0)), VehicleStatus::UnderMaintenance);
        assert_eq!(status_of(obd(None, None, 6)), VehicleStatus::UnderMaintenance);
        assert_eq!(status_of(obd(None, None, 3)), VehicleStatus::TopPolluting);
        assert_eq!(status_of(obd(Some(2000.0), Some(85.0), 0)), VehicleStatus::NormalEmission);
    }
}
