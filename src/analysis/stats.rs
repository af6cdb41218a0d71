// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Window statistics
//!
//! Operates on an in-memory window of readings fetched by the caller;
//! single pass, no incremental state. An empty window yields a
//! zero-filled result, never an error. Percentage-style metrics are
//! rounded to 3 decimals, ppm/temperature-style metrics to 1 decimal,
//! severity percentages to 1 decimal.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::classify::{classify, Severity};
use super::geo::{bounding_box_area_km2, haversine_km, BoundingBox};
use crate::config::Thresholds;
use crate::telemetry::{Channel, Reading, ReadingBody};

/// Severity bucket counts and percentages over a window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityBuckets {
    /// NORMAL readings
    pub normal: usize,
    /// HIGH readings
    pub high: usize,
    /// CRITICAL readings
    pub critical: usize,
    /// NORMAL share, percent, 1 decimal
    pub normal_pct: f64,
    /// HIGH share, percent, 1 decimal
    pub high_pct: f64,
    /// CRITICAL share, percent, 1 decimal
    pub critical_pct: f64,
}

/// Emission channel statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionStats {
    /// Readings in the window
    pub count: usize,
    /// Mean CO2 percentage, 3 decimals
    pub avg_co2_percentage: f64,
    /// Mean CO percentage, 3 decimals
    pub avg_co_percentage: f64,
    /// Mean O2 percentage, 3 decimals
    pub avg_o2_percentage: f64,
    /// Mean HC ppm, 1 decimal
    pub avg_hc_ppm: f64,
    /// Mean NOx ppm over readings that reported it, 1 decimal
    pub avg_nox_ppm: f64,
    /// Mean PM2.5 over readings that reported it, 1 decimal
    pub avg_pm25_level: f64,
    /// Severity distribution
    pub buckets: SeverityBuckets,
}

/// OBD channel statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObdStats {
    /// Readings in the window
    pub count: usize,
    /// Mean RPM over readings that reported it, 1 decimal
    pub avg_rpm: f64,
    /// Mean throttle position, 3 decimals
    pub avg_throttle_position: f64,
    /// Mean engine temperature over readings that reported it, 1 decimal
    pub avg_engine_temperature: f64,
    /// Severity distribution
    pub buckets: SeverityBuckets,
    /// Fault codes by frequency, top 10 descending
    pub fault_code_histogram: Vec<(String, usize)>,
    /// Distinct plates with at least one active fault, sorted
    pub plates_with_faults: Vec<String>,
}

/// GPS channel statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsStats {
    /// Readings in the window
    pub count: usize,
    /// Sum of consecutive great-circle distances after sorting by
    /// timestamp ascending, km
    pub total_distance_km: f64,
    /// Mean speed, 1 decimal
    pub avg_speed: f64,
    /// Maximum speed
    pub max_speed: f64,
    /// Readings at or above the speed warning threshold
    pub speed_violations: usize,
    /// Violation share, percent, 1 decimal
    pub speed_violation_pct: f64,
    /// Geographic extent of the window
    pub bounding_box: Option<BoundingBox>,
    /// Approximate extent area, km²
    pub area_km2: f64,
}

/// Channel-specific statistics result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum StatsResult {
    /// Emission window
    Emission(EmissionStats),
    /// OBD window
    Obd(ObdStats),
    /// GPS window
    Gps(GpsStats),
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_to(part as f64 * 100.0 / total as f64, 1)
    }
}

fn mean(sum: f64, count: usize, decimals: i32) -> f64 {
    if count == 0 {
        0.0
    } else {
        round_to(sum / count as f64, decimals)
    }
}

fn buckets(readings: &[&Reading], thresholds: &Thresholds) -> SeverityBuckets {
    let mut b = SeverityBuckets::default();
    for r in readings {
        match classify(&r.body, thresholds).level {
            Severity::Normal => b.normal += 1,
            Severity::High => b.high += 1,
            Severity::Critical => b.critical += 1,
        }
    }
    let total = readings.len();
    b.normal_pct = pct(b.normal, total);
    b.high_pct = pct(b.high, total);
    b.critical_pct = pct(b.critical, total);
    b
}

/// Aggregate a window of readings for one channel.
///
/// Readings not belonging to `channel` are ignored, so callers can pass
/// a mixed window without pre-filtering.
pub fn aggregate(readings: &[Reading], channel: Channel, thresholds: &Thresholds) -> StatsResult {
    let window: Vec<&Reading> = readings.iter().filter(|r| r.channel() == channel).collect();
    match channel {
        Channel::Emission => StatsResult::Emission(aggregate_emission(&window, thresholds)),
        Channel::Obd => StatsResult::Obd(aggregate_obd(&window, thresholds)),
        Channel::Gps => StatsResult::Gps(aggregate_gps(&window, thresholds)),
    }
}

fn aggregate_emission(window: &[&Reading], thresholds: &Thresholds) -> EmissionStats {
    let count = window.len();
    let mut stats = EmissionStats {
        count,
        buckets: buckets(window, thresholds),
        ..Default::default()
    };
    if count == 0 {
        return stats;
    }

    let (mut co2, mut co, mut o2, mut hc) = (0.0, 0.0, 0.0, 0.0);
    let (mut nox_sum, mut nox_n) = (0.0, 0usize);
    let (mut pm_sum, mut pm_n) = (0.0, 0usize);
    for r in window {
        if let ReadingBody::Emission(m) = &r.body {
            co2 += m.co2_percentage;
            co += m.co_percentage;
            o2 += m.o2_percentage;
            hc += m.hc_ppm;
            if let Some(v) = m.nox_ppm {
                nox_sum += v;
                nox_n += 1;
            }
            if let Some(v) = m.pm25_level {
                pm_sum += v;
                pm_n += 1;
            }
        }
    }
    stats.avg_co2_percentage = mean(co2, count, 3);
    stats.avg_co_percentage = mean(co, count, 3);
    stats.avg_o2_percentage = mean(o2, count, 3);
    stats.avg_hc_ppm = mean(hc, count, 1);
    stats.avg_nox_ppm = mean(nox_sum, nox_n, 1);
    stats.avg_pm25_level = mean(pm_sum, pm_n, 1);
    stats
}

fn aggregate_obd(window: &[&Reading], thresholds: &Thresholds) -> ObdStats {
    let count = window.len();
    let mut stats = ObdStats {
        count,
        buckets: buckets(window, thresholds),
        ..Default::default()
    };
    if count == 0 {
        return stats;
    }

    let (mut rpm_sum, mut rpm_n) = (0.0, 0usize);
    let mut throttle = 0.0;
    let (mut temp_sum, mut temp_n) = (0.0, 0usize);
    let mut histogram: BTreeMap<String, usize> = BTreeMap::new();
    let mut plates: BTreeSet<String> = BTreeSet::new();
    for r in window {
        if let ReadingBody::Obd(m) = &r.body {
            if let Some(v) = m.rpm {
                rpm_sum += v;
                rpm_n += 1;
            }
            throttle += m.throttle_position;
            if let Some(v) = m.engine_temperature {
                temp_sum += v;
                temp_n += 1;
            }
            for code in &m.fault_codes {
                *histogram.entry(code.clone()).or_insert(0) += 1;
            }
            if !m.fault_codes.is_empty() {
                plates.insert(r.plate_number.clone());
            }
        }
    }
    stats.avg_rpm = mean(rpm_sum, rpm_n, 1);
    stats.avg_throttle_position = mean(throttle, count, 3);
    stats.avg_engine_temperature = mean(temp_sum, temp_n, 1);

    let mut by_freq: Vec<(String, usize)> = histogram.into_iter().collect();
    // Descending by count; code order breaks ties deterministically.
    by_freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    by_freq.truncate(10);
    stats.fault_code_histogram = by_freq;
    stats.plates_with_faults = plates.into_iter().collect();
    stats
}

fn aggregate_gps(window: &[&Reading], thresholds: &Thresholds) -> GpsStats {
    let count = window.len();
    let mut stats = GpsStats {
        count,
        ..Default::default()
    };
    if count == 0 {
        return stats;
    }

    let mut sorted: Vec<&Reading> = window.to_vec();
    sorted.sort_by_key(|r| r.timestamp);

    let mut speed_sum = 0.0;
    let mut max_speed: f64 = 0.0;
    let mut violations = 0usize;
    let mut bbox: Option<BoundingBox> = None;
    let mut total_distance = 0.0;
    let mut prev_point: Option<(f64, f64)> = None;
    for r in &sorted {
        if let ReadingBody::Gps(m) = &r.body {
            speed_sum += m.speed;
            max_speed = max_speed.max(m.speed);
            if m.speed >= thresholds.speed.speed.warning {
                violations += 1;
            }
            match bbox.as_mut() {
                Some(b) => b.extend(m.latitude, m.longitude),
                None => bbox = Some(BoundingBox::around(m.latitude, m.longitude)),
            }
            let point = (m.latitude, m.longitude);
            if let Some(prev) = prev_point {
                total_distance += haversine_km(prev, point);
            }
            prev_point = Some(point);
        }
    }

    stats.total_distance_km = total_distance;
    stats.avg_speed = mean(speed_sum, count, 1);
    stats.max_speed = max_speed;
    stats.speed_violations = violations;
    stats.speed_violation_pct = pct(violations, count);
    stats.area_km2 = bbox.as_ref().map(bounding_box_area_km2).unwrap_or(0.0);
    stats.bounding_box = bbox;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{EmissionMetrics, GpsMetrics, ObdMetrics};
    use chrono::{Duration, TimeZone, Utc};

    fn reading(id: i64, plate: &str, offset_min: i64, body: ReadingBody) -> Reading {
        let ts = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap() + Duration::minutes(offset_min);
        Reading {
            id,
            vehicle_id: 1,
            tracking_device_id: 1,
            plate_number: plate.to_string(),
            timestamp: ts,
            body,
            created_at: ts,
            deleted_at: None,
            alerting_failed: false,
        }
    }

    fn emission(co2: f64) -> ReadingBody {
        ReadingBody::Emission(EmissionMetrics {
            co2_percentage: co2,
            co_percentage: 0.1,
            o2_percentage: 15.0,
            hc_ppm: 50.0,
            nox_ppm: None,
            pm25_level: None,
        })
    }

    fn gps(lat: f64, lon: f64, speed: f64) -> ReadingBody {
        ReadingBody::Gps(GpsMetrics {
            latitude: lat,
            longitude: lon,
            speed,
            accuracy: None,
            tracking_status: true,
        })
    }

    #[test]
    fn empty_window_is_zero_filled() {
        let t = Thresholds::default();
        match aggregate(&[], Channel::Emission, &t) {
            StatsResult::Emission(s) => assert_eq!(s, EmissionStats::default()),
            _ => panic!("wrong channel"),
        }
        match aggregate(&[], Channel::Gps, &t) {
            StatsResult::Gps(s) => assert_eq!(s, GpsStats::default()),
            _ => panic!("wrong channel"),
        }
    }

    #[test]
    fn single_reading_averages_are_its_own_values() {
        let t = Thresholds::default();
        let window = vec![reading(1, "B 1234 XYZ", 0, emission(4.5))];
        match aggregate(&window, Channel::Emission, &t) {
            StatsResult::Emission(s) => {
                assert_eq!(s.count, 1);
                assert_eq!(s.avg_co2_percentage, 4.5);
                assert_eq!(s.avg_hc_ppm, 50.0);
                assert_eq!(s.buckets.normal, 1);
                assert_eq!(s.buckets.high_pct, 0.0);
                assert_eq!(s.buckets.critical_pct, 0.0);
            }
            _ => panic!("wrong channel"),
        }
    }

    #[test]
    fn severity_percentages_round_to_one_decimal() {
        let t = Thresholds::default();
        // one critical (co2 >= 15), two normal
        let window = vec![
            reading(1, "A", 0, emission(16.0)),
            reading(2, "A", 1, emission(4.0)),
            reading(3, "A", 2, emission(4.0)),
        ];
        match aggregate(&window, Channel::Emission, &t) {
            StatsResult::Emission(s) => {
                assert_eq!(s.buckets.critical, 1);
                assert_eq!(s.buckets.critical_pct, 33.3);
                assert_eq!(s.buckets.normal_pct, 66.7);
            }
            _ => panic!("wrong channel"),
        }
    }

    #[test]
    fn gps_route_distance_sorts_by_timestamp() {
        let t = Thresholds::default();
        // Inserted out of order; sorted route is (0,0) -> (0,1) -> (0,2)
        let window = vec![
            reading(2, "A", 60, gps(0.0, 1.0, 50.0)),
            reading(1, "A", 0, gps(0.0, 0.0, 40.0)),
            reading(3, "A", 120, gps(0.0, 2.0, 110.0)),
        ];
        match aggregate(&window, Channel::Gps, &t) {
            StatsResult::Gps(s) => {
                assert!((s.total_distance_km - 2.0 * 111.19).abs() < 0.2);
                assert_eq!(s.max_speed, 110.0);
                assert_eq!(s.speed_violations, 1);
                assert_eq!(s.speed_violation_pct, 33.3);
                let b = s.bounding_box.unwrap();
                assert_eq!(b.min_lon, 0.0);
                assert_eq!(b.max_lon, 2.0);
            }
            _ => panic!("wrong channel"),
        }
    }

    #[test]
    fn fault_histogram_top_codes_descending() {
        let t = Thresholds::default();
        let obd = |codes: &[&str]| {
            ReadingBody::Obd(ObdMetrics {
                rpm: Some(2000.0),
                throttle_position: 20.0,
                engine_temperature: Some(85.0),
                engine_status: None,
                fault_codes: codes.iter().map(|s| s.to_string()).collect(),
            })
        };
        let window = vec![
            reading(1, "AA-1", 0, obd(&["P0300", "P0171"])),
            reading(2, "AA-2", 1, obd(&["P0300"])),
            reading(3, "AA-3", 2, obd(&[])),
        ];
        match aggregate(&window, Channel::Obd, &t) {
            StatsResult::Obd(s) => {
                assert_eq!(
                    s.fault_code_histogram,
                    vec![("P0300".to_string(), 2), ("P0171".to_string(), 1)]
                );
                assert_eq!(s.plates_with_faults, vec!["AA-1".to_string(), "AA-2".to_string()]);
                assert_eq!(s.avg_rpm, 2000.0);
            }
            _ => panic!("wrong channel"),
        }
    }

    #[test]
    fn other_channels_are_ignored() {
        let t = Thresholds::default();
        let window = vec![
            reading(1, "A", 0, emission(4.0)),
            reading(2, "A", 1, gps(0.0, 0.0, 10.0)),
        ];
        match aggregate(&window, Channel::Emission, &t) {
            StatsResult::Emission(s) => assert_eq!(s.count, 1),
            _ => panic!("wrong channel"),
        }
    }
}
