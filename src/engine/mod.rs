// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Ingestion orchestrator and query surface
//!
//! Composes validation, classification, alert generation and status
//! derivation over the four store seams. Each request is an independent
//! unit of work; all cross-request state lives in the stores. The
//! device heartbeat is fully synchronous: it is awaited before the
//! ingestion result is returned.

mod status;

pub use status::derive_status;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::alerts::{self, Alert};
use crate::analysis::{
    aggregate, bounding_box, classify, engine_health, haversine_km, performance_grade,
    performance_score, route_leg, Classification, EngineHealth, PerformanceGrade, RouteLeg,
    StatsResult, STATIONARY_SPEED_KMH,
};
use crate::config::Config;
use crate::store::{AlertStore, DeviceStore, Page, ReadingFilter, ReadingStore, VehicleStore};
use crate::telemetry::{
    validate, Channel, NewReading, Reading, ReadingBody, ReadingDto, ValidationError,
    VehicleStatus,
};

/// Engine error taxonomy.
///
/// Validation and not-found errors are raised immediately and never
/// retried; store failures are wrapped once with the original message
/// preserved. The orchestrator never reports partial success.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input failed validation
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// A referenced vehicle, device or reading does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Identifier that was looked up
        id: i64,
    },
    /// Unexpected store failure, wrapped once
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result of one successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// The persisted reading
    pub reading: Reading,
    /// Threshold classification
    pub classification: Classification,
    /// Status written into this channel's slot
    pub channel_status: VehicleStatus,
    /// Merged vehicle-level status after this ingestion
    pub vehicle_status: VehicleStatus,
    /// Alerts written in this batch
    pub alerts_generated: usize,
    /// The alert records themselves
    pub alerts: Vec<Alert>,
}

/// OBD diagnostics attached to an enriched reading
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    /// Weighted health score, [0, 100]
    pub score: f64,
    /// Grade band for the score
    pub grade: PerformanceGrade,
    /// Engine health, independent of the score
    pub health: EngineHealth,
}

/// Route context attached to an enriched GPS reading
#[derive(Debug, Clone, Serialize)]
pub struct RouteAnalysis {
    /// Leg from the immediately preceding reading, if any
    pub from_previous: Option<RouteLeg>,
    /// Leg to the immediately following reading, if any
    pub to_next: Option<RouteLeg>,
    /// Speed below the stationary cutoff
    pub is_stationary: bool,
}

/// A reading enriched with classification and channel diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedReading {
    /// The stored reading
    pub reading: Reading,
    /// Threshold classification
    pub classification: Classification,
    /// OBD only
    pub performance: Option<PerformanceReport>,
    /// GPS only
    pub route: Option<RouteAnalysis>,
}

/// Statistics query filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsFilter {
    /// Restrict to one vehicle
    pub vehicle_id: Option<i64>,
    /// Inclusive timestamp range bounding the window
    pub range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// A GPS reading with its distance from a query center
#[derive(Debug, Clone, Serialize)]
pub struct LocatedReading {
    /// The reading
    pub reading: Reading,
    /// Great-circle distance from the query center, km
    pub distance_km: f64,
}

/// Result of a location-radius query
#[derive(Debug, Clone, Serialize)]
pub struct LocationResult {
    /// Readings inside the circle, ascending by distance
    pub readings: Page<LocatedReading>,
    /// Query center latitude
    pub center_lat: f64,
    /// Query center longitude
    pub center_lon: f64,
    /// Query radius, km
    pub radius_km: f64,
    /// Searched circle area, km²
    pub search_area_km2: f64,
}

/// Speed summary over the whole filtered set, not just the page
#[derive(Debug, Clone, Serialize)]
pub struct SpeedSummary {
    /// Mean speed, 1 decimal
    pub average_speed: f64,
    /// Readings at or above the warning threshold
    pub violations: usize,
}

/// Result of a speed-range query
#[derive(Debug, Clone, Serialize)]
pub struct SpeedResult {
    /// One page of matching readings, newest first
    pub readings: Page<Reading>,
    /// Summary over the entire filtered set
    pub summary: SpeedSummary,
}

/// The telemetry engine
pub struct Engine {
    readings: Arc<dyn ReadingStore>,
    vehicles: Arc<dyn VehicleStore>,
    devices: Arc<dyn DeviceStore>,
    alerts: Arc<dyn AlertStore>,
    config: Arc<Config>,
}

impl Engine {
    /// Engine over four separate stores.
    pub fn new(
        readings: Arc<dyn ReadingStore>,
        vehicles: Arc<dyn VehicleStore>,
        devices: Arc<dyn DeviceStore>,
        alerts: Arc<dyn AlertStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            readings,
            vehicles,
            devices,
            alerts,
            config,
        }
    }

    /// Engine over one backend implementing every store trait.
    pub fn with_store<S>(store: Arc<S>, config: Arc<Config>) -> Self
    where
        S: ReadingStore + VehicleStore + DeviceStore + AlertStore + 'static,
    {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            config,
        )
    }

    /// Ingest one reading: validate, persist, heartbeat, classify,
    /// alert, update status, return the enriched result.
    pub async fn ingest(&self, dto: &ReadingDto) -> Result<IngestOutcome, EngineError> {
        let validated = validate(dto)?;

        let vehicle = self
            .vehicles
            .get(validated.vehicle_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "vehicle",
                id: validated.vehicle_id,
            })?;
        let device = self
            .devices
            .get(validated.tracking_device_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "tracking device",
                id: validated.tracking_device_id,
            })?;

        let plate_number = validated
            .plate_number
            .unwrap_or_else(|| vehicle.plate_number.clone());
        let reading = self
            .readings
            .create(NewReading {
                vehicle_id: vehicle.id,
                tracking_device_id: device.id,
                plate_number,
                timestamp: validated.timestamp.unwrap_or_else(Utc::now),
                body: validated.body,
            })
            .await?;
        debug!(
            "Stored {} reading {} for vehicle {}",
            reading.channel(),
            reading.id,
            vehicle.id
        );

        // Synchronous heartbeat: awaited before anything else proceeds.
        self.devices.touch_heartbeat(device.id).await?;

        let classification = classify(&reading.body, &self.config.thresholds);
        let alert_data = alerts::generate(
            &reading.body,
            &classification,
            &self.config.thresholds,
            vehicle.id,
            &reading.plate_number,
        );

        let stored_alerts = if alert_data.is_empty() {
            Vec::new()
        } else {
            let batch: Vec<Alert> = alert_data
                .into_iter()
                .map(|d| Alert::from_data(d, vehicle.user_id))
                .collect();
            match self.alerts.create_many(&batch).await {
                Ok(count) => {
                    info!(
                        "Wrote {count} alert(s) for vehicle {} (reading {})",
                        vehicle.id, reading.id
                    );
                    batch
                }
                Err(e) => {
                    // The reading is already persisted; mark it so alerting
                    // can be reprocessed, then surface the failure.
                    warn!(
                        "Alert batch failed for reading {}: {e:#}; marking for reprocessing",
                        reading.id
                    );
                    self.readings.mark_alerting_failed(reading.id).await?;
                    return Err(EngineError::Internal(e.context("alert batch write failed")));
                }
            }
        };

        let channel_status = derive_status(&reading.body, &classification, &self.config.thresholds);
        self.vehicles
            .update_channel_status(vehicle.id, reading.channel(), channel_status)
            .await?;

        let mut statuses = vehicle.statuses;
        statuses.set(reading.channel(), channel_status);

        Ok(IngestOutcome {
            classification,
            channel_status,
            vehicle_status: statuses.merged(),
            alerts_generated: stored_alerts.len(),
            alerts: stored_alerts,
            reading,
        })
    }

    /// Fetch one reading enriched with classification and, per channel,
    /// performance diagnostics or route context.
    pub async fn get_by_id(
        &self,
        channel: Channel,
        id: i64,
    ) -> Result<EnrichedReading, EngineError> {
        let reading = self
            .readings
            .find_by_id(channel, id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "reading",
                id,
            })?;
        let classification = classify(&reading.body, &self.config.thresholds);

        let performance = reading.obd().map(|m| {
            let t = &self.config.thresholds.obd;
            let score = performance_score(m, t);
            PerformanceReport {
                score,
                grade: performance_grade(score, t),
                health: engine_health(m, t),
            }
        });

        let route = match reading.gps() {
            Some(m) => {
                let previous = self
                    .readings
                    .find_previous(reading.vehicle_id, Channel::Gps, reading.timestamp)
                    .await?;
                let next = self
                    .readings
                    .find_next(reading.vehicle_id, Channel::Gps, reading.timestamp)
                    .await?;
                Some(RouteAnalysis {
                    from_previous: previous.as_ref().and_then(|p| route_leg(p, &reading)),
                    to_next: next.as_ref().and_then(|n| route_leg(&reading, n)),
                    is_stationary: m.speed < STATIONARY_SPEED_KMH,
                })
            }
            None => None,
        };

        Ok(EnrichedReading {
            reading,
            classification,
            performance,
            route,
        })
    }

    /// Re-validate and replace the metrics of an existing reading.
    pub async fn update_reading(
        &self,
        id: i64,
        dto: &ReadingDto,
    ) -> Result<Reading, EngineError> {
        let validated = validate(dto)?;
        let channel = validated.body.channel();
        self.readings
            .find_by_id(channel, id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "reading",
                id,
            })?;
        Ok(self.readings.update_metrics(id, validated.body).await?)
    }

    /// Soft-delete an emission reading.
    pub async fn delete_emission_reading(&self, id: i64) -> Result<(), EngineError> {
        self.readings
            .find_by_id(Channel::Emission, id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "reading",
                id,
            })?;
        Ok(self.readings.soft_delete(id).await?)
    }

    /// Aggregate statistics over a bounded window.
    pub async fn get_statistics(
        &self,
        channel: Channel,
        filter: &StatsFilter,
    ) -> Result<StatsResult, EngineError> {
        let store_filter = ReadingFilter {
            channel: Some(channel),
            vehicle_id: filter.vehicle_id,
            range: filter.range,
            ..Default::default()
        };
        let window = self.readings.find_all_for_statistics(&store_filter).await?;
        Ok(aggregate(&window, channel, &self.config.thresholds))
    }

    /// GPS readings within `radius_km` of a center, ascending by
    /// distance. A bounding box pre-filters candidates in the store;
    /// the exact circle filter runs here.
    pub async fn get_by_location_radius(
        &self,
        center_lat: f64,
        center_lon: f64,
        radius_km: f64,
        page: u32,
        limit: u32,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<LocationResult, EngineError> {
        let center = (center_lat, center_lon);
        let store_filter = ReadingFilter {
            channel: Some(Channel::Gps),
            range,
            bbox: Some(bounding_box(center, radius_km)),
            ..Default::default()
        };
        let candidates = self.readings.find_all_for_statistics(&store_filter).await?;

        let mut located: Vec<LocatedReading> = candidates
            .into_iter()
            .filter_map(|reading| {
                let m = reading.gps()?;
                let distance_km = haversine_km(center, (m.latitude, m.longitude));
                (distance_km <= radius_km).then_some(LocatedReading {
                    reading,
                    distance_km,
                })
            })
            .collect();
        located.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        let total = located.len() as u64;
        let limit_n = limit.max(1) as usize;
        let offset = (page.max(1) as usize - 1) * limit_n;
        let items: Vec<LocatedReading> = located.into_iter().skip(offset).take(limit_n).collect();

        Ok(LocationResult {
            readings: Page::new(items, page, limit, total),
            center_lat,
            center_lon,
            radius_km,
            search_area_km2: PI * radius_km * radius_km,
        })
    }

    /// GPS readings with speed in `[min, max]`, paged, plus a summary
    /// over the entire filtered set.
    pub async fn get_by_speed_range(
        &self,
        min: f64,
        max: f64,
        page: u32,
        limit: u32,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<SpeedResult, EngineError> {
        let store_filter = ReadingFilter {
            channel: Some(Channel::Gps),
            range,
            speed: Some((min, max)),
            ..Default::default()
        };
        let (items, total) = self
            .readings
            .find_with_filters(&store_filter, page, limit)
            .await?;

        let all = self.readings.find_all_for_statistics(&store_filter).await?;
        let warning = self.config.thresholds.speed.speed.warning;
        let mut speed_sum = 0.0;
        let mut violations = 0usize;
        for reading in &all {
            if let ReadingBody::Gps(m) = &reading.body {
                speed_sum += m.speed;
                if m.speed >= warning {
                    violations += 1;
                }
            }
        }
        let average_speed = if all.is_empty() {
            0.0
        } else {
            (speed_sum / all.len() as f64 * 10.0).round() / 10.0
        };

        Ok(SpeedResult {
            readings: Page::new(items, page, limit, total),
            summary: SpeedSummary {
                average_speed,
                violations,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Band;
    use crate::store::memory::MemoryStore;
    use crate::telemetry::{
        ChannelStatuses, DeviceStatus, EmissionReadingDto, GpsReadingDto, ObdReadingDto,
        TrackingDevice, Vehicle,
    };
    use chrono::{Duration, TimeZone};

    fn setup(config: Config) -> (Engine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.insert_vehicle(Vehicle {
            id: 1,
            plate_number: "B 1234 XYZ".into(),
            user_id: 42,
            statuses: ChannelStatuses::default(),
        });
        store.insert_device(TrackingDevice {
            id: 1,
            last_ping: None,
            status: DeviceStatus::Active,
        });
        let engine = Engine::with_store(store.clone(), Arc::new(config));
        (engine, store)
    }

    fn emission_dto(co2: f64) -> ReadingDto {
        ReadingDto::Emission(EmissionReadingDto {
            vehicle_id: Some(1),
            tracking_device_id: Some(1),
            co2_percentage: Some(co2),
            co_percentage: Some(0.1),
            o2_percentage: Some(15.0),
            hc_ppm: Some(50.0),
            ..Default::default()
        })
    }

    fn gps_dto(lat: f64, lon: f64, speed: f64, offset_min: i64) -> ReadingDto {
        ReadingDto::Gps(GpsReadingDto {
            vehicle_id: Some(1),
            tracking_device_id: Some(1),
            latitude: Some(lat),
            longitude: Some(lon),
            speed: Some(speed),
            tracking_status: Some(true),
            timestamp: Some(
                Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
                    + Duration::minutes(offset_min),
            ),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn critical_emission_scenario() {
        // co2 1.2 against critical 1.0 is CRITICAL, TOP_POLLUTING, one alert
        let mut config = Config::default();
        config.thresholds.emission.co2 = Band {
            warning: 0.8,
            critical: 1.0,
        };
        let (engine, store) = setup(config);

        let outcome = engine.ingest(&emission_dto(1.2)).await.unwrap();
        assert_eq!(outcome.classification.level, crate::Severity::Critical);
        assert_eq!(outcome.channel_status, VehicleStatus::TopPolluting);
        assert_eq!(outcome.vehicle_status, VehicleStatus::TopPolluting);
        assert_eq!(outcome.alerts_generated, 1);
        assert_eq!(outcome.alerts[0].title, "Critical CO2 Emission Level");
        assert_eq!(outcome.alerts[0].user_id, 42);
        assert_eq!(store.alert_batches(), vec![1]);
        // Plate resolved from the vehicle record
        assert_eq!(outcome.reading.plate_number, "B 1234 XYZ");
    }

    #[tokio::test]
    async fn critical_speed_scenario() {
        let (engine, _store) = setup(Config::default());
        let outcome = engine.ingest(&gps_dto(0.0, 0.0, 130.0, 0)).await.unwrap();
        assert_eq!(outcome.classification.level, crate::Severity::Critical);
        assert_eq!(outcome.channel_status, VehicleStatus::Speeding);
        assert_eq!(outcome.alerts_generated, 1);
        assert_eq!(outcome.alerts[0].title, "Critical Speed Violation");
    }

    #[tokio::test]
    async fn heartbeat_is_touched_before_returning() {
        let (engine, store) = setup(Config::default());
        assert_eq!(store.heartbeat_touches(), 0);
        engine.ingest(&emission_dto(5.0)).await.unwrap();
        // Fully synchronous semantics: the touch completed within ingest.
        assert_eq!(store.heartbeat_touches(), 1);
        assert!(store.device(1).unwrap().last_ping.is_some());
    }

    #[tokio::test]
    async fn normal_reading_makes_no_alert_store_call() {
        let (engine, store) = setup(Config::default());
        let outcome = engine.ingest(&emission_dto(5.0)).await.unwrap();
        assert_eq!(outcome.alerts_generated, 0);
        assert!(store.alert_batches().is_empty());
        assert_eq!(outcome.channel_status, VehicleStatus::NormalEmission);
    }

    #[tokio::test]
    async fn alert_write_failure_marks_reading_for_reprocessing() {
        let (engine, store) = setup(Config::default());
        store.fail_next_alert_write();

        let err = engine.ingest(&gps_dto(0.0, 0.0, 130.0, 0)).await.unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));

        // The reading survived and carries the compensation mark.
        let reading = store.reading(1).unwrap();
        assert!(reading.alerting_failed);
        assert!(store.stored_alerts().is_empty());
    }

    #[tokio::test]
    async fn unknown_vehicle_is_not_found() {
        let (engine, _store) = setup(Config::default());
        let dto = ReadingDto::Emission(EmissionReadingDto {
            vehicle_id: Some(99),
            tracking_device_id: Some(1),
            co2_percentage: Some(5.0),
            co_percentage: Some(0.1),
            o2_percentage: Some(15.0),
            hc_ppm: Some(50.0),
            ..Default::default()
        });
        let err = engine.ingest(&dto).await.unwrap_err();
        match err {
            EngineError::NotFound { entity, id } => {
                assert_eq!(entity, "vehicle");
                assert_eq!(id, 99);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn validation_error_reaches_the_caller() {
        let (engine, store) = setup(Config::default());
        let dto = ReadingDto::Emission(EmissionReadingDto::default());
        let err = engine.ingest(&dto).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        // Nothing persisted, no heartbeat
        assert_eq!(store.heartbeat_touches(), 0);
    }

    #[tokio::test]
    async fn route_analysis_between_consecutive_fixes() {
        let (engine, _store) = setup(Config::default());
        engine.ingest(&gps_dto(0.0, 0.0, 40.0, 0)).await.unwrap();
        let second = engine.ingest(&gps_dto(0.0, 1.0, 50.0, 60)).await.unwrap();

        let enriched = engine
            .get_by_id(Channel::Gps, second.reading.id)
            .await
            .unwrap();
        let route = enriched.route.unwrap();
        let leg = route.from_previous.unwrap();
        assert!((leg.distance_km - 111.19).abs() < 0.05, "got {}", leg.distance_km);
        assert!((leg.bearing_deg - 90.0).abs() < 0.01, "got {}", leg.bearing_deg);
        assert_eq!(leg.elapsed, "1h 0m");
        assert_eq!(leg.speed_change, 10.0);
        assert!(route.to_next.is_none());
        assert!(!route.is_stationary);
    }

    #[tokio::test]
    async fn obd_enrichment_reports_performance() {
        let (engine, _store) = setup(Config::default());
        let dto = ReadingDto::Obd(ObdReadingDto {
            vehicle_id: Some(1),
            tracking_device_id: Some(1),
            throttle_position: Some(80.0),
            rpm: Some(9000.0),
            fault_codes: Some((0..6).map(|i| format!("P030{i}")).collect()),
            ..Default::default()
        });
        let outcome = engine.ingest(&dto).await.unwrap();
        assert_eq!(outcome.channel_status, VehicleStatus::UnderMaintenance);

        let enriched = engine.get_by_id(Channel::Obd, outcome.reading.id).await.unwrap();
        let perf = enriched.performance.unwrap();
        assert_eq!(perf.score, 40.0);
        assert_eq!(perf.health, EngineHealth::Critical);
        assert_eq!(perf.grade, PerformanceGrade::Poor);
        assert!(enriched.route.is_none());
    }

    #[tokio::test]
    async fn statistics_over_ingested_window() {
        let (engine, _store) = setup(Config::default());
        engine.ingest(&emission_dto(4.0)).await.unwrap();
        engine.ingest(&emission_dto(6.0)).await.unwrap();

        let stats = engine
            .get_statistics(Channel::Emission, &StatsFilter::default())
            .await
            .unwrap();
        match stats {
            StatsResult::Emission(s) => {
                assert_eq!(s.count, 2);
                assert_eq!(s.avg_co2_percentage, 5.0);
                assert_eq!(s.buckets.normal_pct, 100.0);
            }
            _ => panic!("wrong channel"),
        }
    }

    #[tokio::test]
    async fn empty_statistics_window_is_zero_filled() {
        let (engine, _store) = setup(Config::default());
        let stats = engine
            .get_statistics(Channel::Gps, &StatsFilter::default())
            .await
            .unwrap();
        match stats {
            StatsResult::Gps(s) => {
                assert_eq!(s.count, 0);
                assert_eq!(s.total_distance_km, 0.0);
            }
            _ => panic!("wrong channel"),
        }
    }

    #[tokio::test]
    async fn location_radius_query_filters_and_sorts() {
        let (engine, _store) = setup(Config::default());
        // ~0 km, ~15.7 km and ~111 km from the center
        engine.ingest(&gps_dto(45.0, 9.0, 30.0, 0)).await.unwrap();
        engine.ingest(&gps_dto(45.1414, 9.0, 30.0, 1)).await.unwrap();
        engine.ingest(&gps_dto(46.0, 9.0, 30.0, 2)).await.unwrap();

        let result = engine
            .get_by_location_radius(45.0, 9.0, 20.0, 1, 10, None)
            .await
            .unwrap();
        assert_eq!(result.readings.total, 2);
        assert!(result.readings.items[0].distance_km < result.readings.items[1].distance_km);
        assert!((result.search_area_km2 - PI * 400.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn speed_range_query_pages_and_summarizes() {
        let (engine, _store) = setup(Config::default());
        for (i, speed) in [40.0, 80.0, 110.0, 130.0].iter().enumerate() {
            engine
                .ingest(&gps_dto(0.0, 0.0, *speed, i as i64))
                .await
                .unwrap();
        }

        let result = engine
            .get_by_speed_range(50.0, 200.0, 1, 2, None)
            .await
            .unwrap();
        assert_eq!(result.readings.total, 3);
        assert_eq!(result.readings.items.len(), 2);
        assert_eq!(result.readings.total_pages, 2);
        // Summary covers the whole filtered set: (80 + 110 + 130) / 3
        assert_eq!(result.summary.average_speed, 106.7);
        assert_eq!(result.summary.violations, 2);
    }

    #[tokio::test]
    async fn update_reading_revalidates() {
        let (engine, _store) = setup(Config::default());
        let outcome = engine.ingest(&emission_dto(5.0)).await.unwrap();

        let mut bad = EmissionReadingDto {
            vehicle_id: Some(1),
            tracking_device_id: Some(1),
            co2_percentage: Some(30.0),
            co_percentage: Some(0.1),
            o2_percentage: Some(15.0),
            hc_ppm: Some(50.0),
            ..Default::default()
        };
        let err = engine
            .update_reading(outcome.reading.id, &ReadingDto::Emission(bad.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        bad.co2_percentage = Some(7.0);
        let updated = engine
            .update_reading(outcome.reading.id, &ReadingDto::Emission(bad))
            .await
            .unwrap();
        assert_eq!(updated.emission().unwrap().co2_percentage, 7.0);
    }

    #[tokio::test]
    async fn soft_deleted_emission_reading_is_gone() {
        let (engine, _store) = setup(Config::default());
        let outcome = engine.ingest(&emission_dto(5.0)).await.unwrap();
        engine.delete_emission_reading(outcome.reading.id).await.unwrap();
        let err = engine
            .get_by_id(Channel::Emission, outcome.reading.id)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
