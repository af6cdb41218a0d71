// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Geospatial math for the GPS channel
//!
//! Great-circle distance and bearing, bounding-box approximation for
//! radius searches, and route-leg analysis between consecutive fixes.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::telemetry::{GpsMetrics, Reading};

/// Mean Earth radius, km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Below this speed (km/h) a vehicle counts as stationary
pub const STATIONARY_SPEED_KMH: f64 = 5.0;

/// Approximate km per degree of latitude
const KM_PER_DEGREE: f64 = 111.0;

/// Haversine great-circle distance in km between two (lat, lon) pairs.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Initial bearing in degrees from `a` to `b`, normalized to [0, 360).
/// 0 = north, 90 = east.
pub fn bearing_deg(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlon = lon2 - lon1;

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Rectangular lat/lon box used to pre-filter radius-search candidates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge
    pub min_lat: f64,
    /// Northern edge
    pub max_lat: f64,
    /// Western edge
    pub min_lon: f64,
    /// Eastern edge
    pub max_lon: f64,
}

impl BoundingBox {
    /// Whether a point lies inside the box (edges inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Grow the box to include a point.
    pub fn extend(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }

    /// Box around a single point.
    pub fn around(lat: f64, lon: f64) -> Self {
        Self {
            min_lat: lat,
            max_lat: lat,
            min_lon: lon,
            max_lon: lon,
        }
    }
}

/// Bounding box approximating a circle of `radius_km` around `center`.
///
/// One degree of latitude is taken as 111 km; the longitude delta is
/// widened by the cosine of the center latitude.
pub fn bounding_box(center: (f64, f64), radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let lon_delta = radius_km / (KM_PER_DEGREE * center.0.to_radians().cos());
    BoundingBox {
        min_lat: center.0 - lat_delta,
        max_lat: center.0 + lat_delta,
        min_lon: center.1 - lon_delta,
        max_lon: center.1 + lon_delta,
    }
}

/// Approximate area in km² of a geographic bounding box:
/// `Δlat · Δlon · 111² · cos(avg_lat)`.
pub fn bounding_box_area_km2(b: &BoundingBox) -> f64 {
    let avg_lat = (b.min_lat + b.max_lat) / 2.0;
    (b.max_lat - b.min_lat)
        * (b.max_lon - b.min_lon)
        * KM_PER_DEGREE
        * KM_PER_DEGREE
        * avg_lat.to_radians().cos()
}

/// Format an elapsed duration as `"<h>h <m>m"`, omitting the hour
/// component when zero.
pub fn format_elapsed(d: Duration) -> String {
    let total_minutes = d.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// One leg between two consecutive GPS readings of the same vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Great-circle distance, km
    pub distance_km: f64,
    /// Initial bearing, degrees [0, 360)
    pub bearing_deg: f64,
    /// Elapsed time, `"<h>h <m>m"` format
    pub elapsed: String,
    /// Speed delta, current minus previous, km/h
    pub speed_change: f64,
}

/// Compute the leg from a previous GPS reading to the current one.
pub fn route_leg(previous: &Reading, current: &Reading) -> Option<RouteLeg> {
    let prev: &GpsMetrics = previous.gps()?;
    let cur: &GpsMetrics = current.gps()?;
    let from = (prev.latitude, prev.longitude);
    let to = (cur.latitude, cur.longitude);
    Some(RouteLeg {
        distance_km: haversine_km(from, to),
        bearing_deg: bearing_deg(from, to),
        elapsed: format_elapsed(current.timestamp - previous.timestamp),
        speed_change: cur.speed - prev.speed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn distance_to_self_is_zero() {
        assert!(haversine_km((48.1, 11.5), (48.1, 11.5)).abs() < EPS);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = (52.52, 13.405);
        let b = (48.137, 11.575);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < EPS);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_km((0.0, 0.0), (0.0, 1.0));
        assert!((d - 111.19).abs() < 0.05, "got {d}");
    }

    #[test]
    fn bearing_north_and_east() {
        let north = bearing_deg((10.0, 20.0), (11.0, 20.0));
        assert!(north.abs() < 0.01 || (north - 360.0).abs() < 0.01, "got {north}");

        let east = bearing_deg((0.0, 0.0), (0.0, 1.0));
        assert!((east - 90.0).abs() < 0.01, "got {east}");
    }

    #[test]
    fn bounding_box_widens_with_latitude() {
        let equator = bounding_box((0.0, 0.0), 10.0);
        let north = bounding_box((60.0, 0.0), 10.0);
        let eq_width = equator.max_lon - equator.min_lon;
        let north_width = north.max_lon - north.min_lon;
        assert!(north_width > eq_width);
        // lat delta is latitude-independent
        assert!(((equator.max_lat - equator.min_lat) - (north.max_lat - north.min_lat)).abs() < EPS);
    }

    #[test]
    fn bounding_box_contains_circle_points() {
        let center = (45.0, 9.0);
        let b = bounding_box(center, 5.0);
        assert!(b.contains(45.0, 9.0));
        assert!(b.contains(45.04, 9.0));
        assert!(!b.contains(45.2, 9.0));
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::minutes(60)), "1h 0m");
        assert_eq!(format_elapsed(Duration::minutes(75)), "1h 15m");
        assert_eq!(format_elapsed(Duration::minutes(42)), "42m");
        assert_eq!(format_elapsed(Duration::seconds(59)), "0m");
    }

    #[test]
    fn box_area_at_equator() {
        let b = BoundingBox {
            min_lat: 0.0,
            max_lat: 1.0,
            min_lon: 0.0,
            max_lon: 1.0,
        };
        let area = bounding_box_area_km2(&b);
        // 1° x 1° near the equator is roughly 111 x 111 km
        assert!((area - 111.0 * 111.0 * (0.5f64.to_radians().cos())).abs() < 1.0);
    }
}
