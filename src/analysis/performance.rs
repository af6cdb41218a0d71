// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! OBD performance scoring
//!
//! Deterministic, rule-based score in [0, 100]. Penalties are additive
//! and independent across the RPM, temperature and fault-code
//! categories; within a category only the worst applicable penalty
//! fires. Engine health is classified from the same inputs but does not
//! depend on the score.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ObdThresholds;
use crate::telemetry::ObdMetrics;

/// Engine health classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineHealth {
    /// No concerning indicators
    Healthy,
    /// Elevated fault count or temperature
    Warning,
    /// Redline RPM, severe overheating or excess fault codes
    Critical,
}

/// Letter-style grade derived from the performance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceGrade {
    /// Score at or above the excellent boundary
    Excellent,
    /// Good band
    Good,
    /// Fair band
    Fair,
    /// Poor band
    Poor,
    /// Below the poor boundary
    Failing,
}

impl fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PerformanceGrade::Excellent => "excellent",
            PerformanceGrade::Good => "good",
            PerformanceGrade::Fair => "fair",
            PerformanceGrade::Poor => "poor",
            PerformanceGrade::Failing => "failing",
        };
        write!(f, "{s}")
    }
}

/// Weighted health score, starting at 100 and clamped to [0, 100].
pub fn performance_score(m: &ObdMetrics, t: &ObdThresholds) -> f64 {
    let mut score: f64 = 100.0;

    if let Some(rpm) = m.rpm {
        if rpm > t.rpm.high {
            score -= 20.0;
        } else if rpm > t.rpm.normal {
            score -= 10.0;
        } else if rpm < t.rpm.idle {
            score -= 15.0;
        }
    }

    if let Some(temp) = m.engine_temperature {
        if temp >= t.engine_temperature.critical {
            score -= 30.0;
        } else if temp >= t.engine_temperature.high {
            score -= 15.0;
        }
    }

    let faults = m.fault_codes.len();
    if faults > t.fault_codes.critical_limit {
        score -= 40.0;
    } else if faults > t.fault_codes.warning_limit {
        score -= 20.0;
    } else if faults > t.fault_codes.max_active {
        score -= 10.0;
    }

    score.clamp(0.0, 100.0)
}

/// Engine health, independent of the score.
pub fn engine_health(m: &ObdMetrics, t: &ObdThresholds) -> EngineHealth {
    let faults = m.fault_codes.len();
    let temp = m.engine_temperature;
    let rpm = m.rpm;

    if faults > t.fault_codes.critical_limit
        || temp.map(|v| v >= t.engine_temperature.critical).unwrap_or(false)
        || rpm.map(|v| v >= t.rpm.critical).unwrap_or(false)
    {
        EngineHealth::Critical
    } else if faults > t.fault_codes.max_active
        || temp.map(|v| v >= t.engine_temperature.high).unwrap_or(false)
    {
        EngineHealth::Warning
    } else {
        EngineHealth::Healthy
    }
}

/// Map a score onto the configured grade boundaries.
pub fn performance_grade(score: f64, t: &ObdThresholds) -> PerformanceGrade {
    let g = &t.performance;
    if score >= g.excellent {
        PerformanceGrade::Excellent
    } else if score >= g.good {
        PerformanceGrade::Good
    } else if score >= g.fair {
        PerformanceGrade::Fair
    } else if score >= g.poor {
        PerformanceGrade::Poor
    } else {
        PerformanceGrade::Failing
    }
}
