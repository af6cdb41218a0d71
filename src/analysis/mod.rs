//! Analysis module - threshold classification, geospatial math,
//! OBD performance scoring and window statistics

mod classify;
mod geo;
mod performance;
mod stats;

pub use classify::{classify, Classification, Severity};
pub use geo::{
    bearing_deg, bounding_box, bounding_box_area_km2, format_elapsed, haversine_km, route_leg,
    BoundingBox, RouteLeg, EARTH_RADIUS_KM, STATIONARY_SPEED_KMH,
};
pub use performance::{engine_health, performance_grade, performance_score, EngineHealth, PerformanceGrade};
pub use stats::{aggregate, EmissionStats, GpsStats, ObdStats, SeverityBuckets, StatsResult};
