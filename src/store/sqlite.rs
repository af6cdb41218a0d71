// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! SQLite-backed store implementation
//!
//! All four store traits over one database file. GPS position and speed
//! are denormalized into columns so radius and speed queries can
//! pre-filter in SQL; the full metric payload is kept as JSON.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use super::{AlertStore, DeviceStore, ReadingFilter, ReadingStore, VehicleStore};
use crate::alerts::Alert;
use crate::config::DatabaseConfig;
use crate::telemetry::{
    Channel, ChannelStatuses, DeviceStatus, NewReading, Reading, ReadingBody, TrackingDevice,
    Vehicle, VehicleStatus,
};

/// SQLite store implementing every engine-facing store trait
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&config.path)?;
        let store = Self::from_connection(conn)?;
        info!("Database opened at {:?}", config.path);
        Ok(store)
    }

    /// In-memory database, used by tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;
            PRAGMA temp_store = MEMORY;
        "#,
        )?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            -- Telemetry readings, all channels
            CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                channel TEXT NOT NULL,
                vehicle_id INTEGER NOT NULL,
                tracking_device_id INTEGER NOT NULL,
                plate_number TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                metrics TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                speed REAL,
                created_at TEXT NOT NULL,
                deleted_at TEXT,
                alerting_failed INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_readings_vehicle_ts ON readings(vehicle_id, timestamp);
            CREATE INDEX IF NOT EXISTS idx_readings_channel_ts ON readings(channel, timestamp);

            -- Vehicles with per-channel status slots
            CREATE TABLE IF NOT EXISTS vehicles (
                id INTEGER PRIMARY KEY,
                plate_number TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                emission_status TEXT,
                obd_status TEXT,
                gps_status TEXT
            );

            -- Tracking devices
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY,
                last_ping TEXT,
                status TEXT NOT NULL DEFAULT 'active'
            );

            -- Generated alerts
            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                alert_type TEXT NOT NULL,
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                trigger_value TEXT NOT NULL,
                trigger_threshold TEXT NOT NULL,
                vehicle_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_alerts_user ON alerts(user_id, created_at);
        "#,
        )?;
        Ok(())
    }

    /// Register a vehicle. Upserts on id.
    pub fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"INSERT OR REPLACE INTO vehicles
               (id, plate_number, user_id, emission_status, obd_status, gps_status)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                vehicle.id,
                vehicle.plate_number,
                vehicle.user_id,
                vehicle.statuses.emission.map(|s| s.to_string()),
                vehicle.statuses.obd.map(|s| s.to_string()),
                vehicle.statuses.gps.map(|s| s.to_string()),
            ],
        )?;
        Ok(())
    }

    /// Register a tracking device. Upserts on id.
    pub fn insert_device(&self, device: &TrackingDevice) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO devices (id, last_ping, status) VALUES (?1, ?2, ?3)",
            params![
                device.id,
                device.last_ping.map(|t| t.to_rfc3339()),
                match device.status {
                    DeviceStatus::Active => "active",
                    DeviceStatus::Inactive => "inactive",
                },
            ],
        )?;
        Ok(())
    }

    /// Alerts stored for one user, newest first.
    pub fn alerts_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<Alert>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, alert_type, title, message, trigger_value, trigger_threshold, \
             vehicle_id, user_id, is_read, created_at \
             FROM alerts WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok(Alert {
                id: row.get(0)?,
                alert_type: row.get(1)?,
                title: row.get(2)?,
                message: row.get(3)?,
                trigger_value: row.get(4)?,
                trigger_threshold: row.get(5)?,
                vehicle_id: row.get(6)?,
                user_id: row.get(7)?,
                is_read: row.get::<_, i64>(8)? != 0,
                created_at: parse_ts_sql(9, &row.get::<_, String>(9)?)?,
            })
        })?;
        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row?);
        }
        Ok(alerts)
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| anyhow!("bad timestamp {s:?}: {e}"))?
        .with_timezone(&Utc))
}

// For query_map closures that must return rusqlite errors.
fn parse_ts_sql(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn channel_str(channel: Channel) -> &'static str {
    match channel {
        Channel::Emission => "emission",
        Channel::Obd => "obd",
        Channel::Gps => "gps",
    }
}

fn status_from_str(s: &str) -> Option<VehicleStatus> {
    match s {
        "normal_emission" => Some(VehicleStatus::NormalEmission),
        "top_polluting" => Some(VehicleStatus::TopPolluting),
        "under_maintenance" => Some(VehicleStatus::UnderMaintenance),
        "stationary" => Some(VehicleStatus::Stationary),
        "moving" => Some(VehicleStatus::Moving),
        "speeding" => Some(VehicleStatus::Speeding),
        _ => None,
    }
}

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, i64, i64, String, String, String, String, Option<String>, i64)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

const READING_COLUMNS: &str = "id, vehicle_id, tracking_device_id, plate_number, timestamp, \
                               metrics, created_at, deleted_at, alerting_failed";

fn build_reading(
    (id, vehicle_id, tracking_device_id, plate_number, timestamp, metrics, created_at, deleted_at, alerting_failed): (
        i64,
        i64,
        i64,
        String,
        String,
        String,
        String,
        Option<String>,
        i64,
    ),
) -> Result<Reading> {
    Ok(Reading {
        id,
        vehicle_id,
        tracking_device_id,
        plate_number,
        timestamp: parse_ts(&timestamp)?,
        body: serde_json::from_str(&metrics)?,
        created_at: parse_ts(&created_at)?,
        deleted_at: deleted_at.as_deref().map(parse_ts).transpose()?,
        alerting_failed: alerting_failed != 0,
    })
}

fn filter_sql(filter: &ReadingFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses = vec!["deleted_at IS NULL".to_string()];
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(channel) = filter.channel {
        values.push(Box::new(channel_str(channel)));
        clauses.push(format!("channel = ?{}", values.len()));
    }
    if let Some(vehicle_id) = filter.vehicle_id {
        values.push(Box::new(vehicle_id));
        clauses.push(format!("vehicle_id = ?{}", values.len()));
    }
    if let Some((start, end)) = filter.range {
        values.push(Box::new(start.to_rfc3339()));
        clauses.push(format!("timestamp >= ?{}", values.len()));
        values.push(Box::new(end.to_rfc3339()));
        clauses.push(format!("timestamp <= ?{}", values.len()));
    }
    if let Some(bbox) = filter.bbox {
        values.push(Box::new(bbox.min_lat));
        values.push(Box::new(bbox.max_lat));
        clauses.push(format!(
            "latitude BETWEEN ?{} AND ?{}",
            values.len() - 1,
            values.len()
        ));
        values.push(Box::new(bbox.min_lon));
        values.push(Box::new(bbox.max_lon));
        clauses.push(format!(
            "longitude BETWEEN ?{} AND ?{}",
            values.len() - 1,
            values.len()
        ));
    }
    if let Some((min, max)) = filter.speed {
        values.push(Box::new(min));
        values.push(Box::new(max));
        clauses.push(format!(
            "speed BETWEEN ?{} AND ?{}",
            values.len() - 1,
            values.len()
        ));
    }

    (clauses.join(" AND "), values)
}

#[async_trait]
impl ReadingStore for SqliteStore {
    async fn create(&self, reading: NewReading) -> Result<Reading> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now();
        let metrics = serde_json::to_string(&reading.body)?;
        let (lat, lon, speed) = match &reading.body {
            ReadingBody::Gps(m) => (Some(m.latitude), Some(m.longitude), Some(m.speed)),
            _ => (None, None, None),
        };
        conn.execute(
            r#"INSERT INTO readings
               (channel, vehicle_id, tracking_device_id, plate_number, timestamp, metrics,
                latitude, longitude, speed, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                channel_str(reading.body.channel()),
                reading.vehicle_id,
                reading.tracking_device_id,
                reading.plate_number,
                reading.timestamp.to_rfc3339(),
                metrics,
                lat,
                lon,
                speed,
                created_at.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Reading {
            id,
            vehicle_id: reading.vehicle_id,
            tracking_device_id: reading.tracking_device_id,
            plate_number: reading.plate_number,
            timestamp: reading.timestamp,
            body: reading.body,
            created_at,
            deleted_at: None,
            alerting_failed: false,
        })
    }

    async fn find_by_id(&self, channel: Channel, id: i64) -> Result<Option<Reading>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM readings \
             WHERE id = ?1 AND channel = ?2 AND deleted_at IS NULL"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id, channel_str(channel)])?;
        match rows.next()? {
            Some(row) => Ok(Some(build_reading(reading_from_row(row)?)?)),
            None => Ok(None),
        }
    }

    async fn find_with_filters(
        &self,
        filter: &ReadingFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Reading>, u64)> {
        let conn = self.conn.lock().unwrap();
        let (where_sql, values) = filter_sql(filter);

        let count_sql = format!("SELECT COUNT(*) FROM readings WHERE {where_sql}");
        let total: i64 = conn.query_row(
            &count_sql,
            params_from_iter(values.iter().map(|v| v.as_ref())),
            |row| row.get(0),
        )?;

        let limit = limit.max(1);
        let offset = (page.max(1) - 1) as i64 * limit as i64;
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM readings WHERE {where_sql} \
             ORDER BY timestamp DESC LIMIT {limit} OFFSET {offset}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values.iter().map(|v| v.as_ref())))?;
        let mut readings = Vec::new();
        while let Some(row) = rows.next()? {
            readings.push(build_reading(reading_from_row(row)?)?);
        }
        Ok((readings, total as u64))
    }

    async fn find_all_for_statistics(&self, filter: &ReadingFilter) -> Result<Vec<Reading>> {
        let conn = self.conn.lock().unwrap();
        let (where_sql, values) = filter_sql(filter);
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM readings WHERE {where_sql} ORDER BY timestamp ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values.iter().map(|v| v.as_ref())))?;
        let mut readings = Vec::new();
        while let Some(row) = rows.next()? {
            readings.push(build_reading(reading_from_row(row)?)?);
        }
        Ok(readings)
    }

    async fn find_previous(
        &self,
        vehicle_id: i64,
        channel: Channel,
        before: DateTime<Utc>,
    ) -> Result<Option<Reading>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM readings \
             WHERE vehicle_id = ?1 AND channel = ?2 AND timestamp < ?3 AND deleted_at IS NULL \
             ORDER BY timestamp DESC LIMIT 1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![vehicle_id, channel_str(channel), before.to_rfc3339()])?;
        match rows.next()? {
            Some(row) => Ok(Some(build_reading(reading_from_row(row)?)?)),
            None => Ok(None),
        }
    }

    async fn find_next(
        &self,
        vehicle_id: i64,
        channel: Channel,
        after: DateTime<Utc>,
    ) -> Result<Option<Reading>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM readings \
             WHERE vehicle_id = ?1 AND channel = ?2 AND timestamp > ?3 AND deleted_at IS NULL \
             ORDER BY timestamp ASC LIMIT 1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![vehicle_id, channel_str(channel), after.to_rfc3339()])?;
        match rows.next()? {
            Some(row) => Ok(Some(build_reading(reading_from_row(row)?)?)),
            None => Ok(None),
        }
    }

    async fn update_metrics(&self, id: i64, body: ReadingBody) -> Result<Reading> {
        let conn = self.conn.lock().unwrap();
        let metrics = serde_json::to_string(&body)?;
        let (lat, lon, speed) = match &body {
            ReadingBody::Gps(m) => (Some(m.latitude), Some(m.longitude), Some(m.speed)),
            _ => (None, None, None),
        };
        let updated = conn.execute(
            "UPDATE readings SET metrics = ?1, latitude = ?2, longitude = ?3, speed = ?4 \
             WHERE id = ?5 AND deleted_at IS NULL",
            params![metrics, lat, lon, speed, id],
        )?;
        if updated == 0 {
            return Err(anyhow!("reading {id} not found"));
        }

        let sql = format!("SELECT {READING_COLUMNS} FROM readings WHERE id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => build_reading(reading_from_row(row)?),
            None => Err(anyhow!("reading {id} not found")),
        }
    }

    async fn soft_delete(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE readings SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    async fn mark_alerting_failed(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE readings SET alerting_failed = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }
}

#[async_trait]
impl VehicleStore for SqliteStore {
    async fn get(&self, id: i64) -> Result<Option<Vehicle>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, plate_number, user_id, emission_status, obd_status, gps_status \
             FROM vehicles WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => {
                let emission: Option<String> = row.get(3)?;
                let obd: Option<String> = row.get(4)?;
                let gps: Option<String> = row.get(5)?;
                Ok(Some(Vehicle {
                    id: row.get(0)?,
                    plate_number: row.get(1)?,
                    user_id: row.get(2)?,
                    statuses: ChannelStatuses {
                        emission: emission.as_deref().and_then(status_from_str),
                        obd: obd.as_deref().and_then(status_from_str),
                        gps: gps.as_deref().and_then(status_from_str),
                    },
                }))
            }
            None => Ok(None),
        }
    }

    async fn update_channel_status(
        &self,
        id: i64,
        channel: Channel,
        status: VehicleStatus,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let column = match channel {
            Channel::Emission => "emission_status",
            Channel::Obd => "obd_status",
            Channel::Gps => "gps_status",
        };
        let sql = format!("UPDATE vehicles SET {column} = ?1 WHERE id = ?2");
        let updated = conn.execute(&sql, params![status.to_string(), id])?;
        if updated == 0 {
            return Err(anyhow!("vehicle {id} not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceStore for SqliteStore {
    async fn get(&self, id: i64) -> Result<Option<TrackingDevice>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, last_ping, status FROM devices WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => {
                let last_ping: Option<String> = row.get(1)?;
                let status: String = row.get(2)?;
                Ok(Some(TrackingDevice {
                    id: row.get(0)?,
                    last_ping: last_ping.as_deref().map(parse_ts).transpose()?,
                    status: if status == "inactive" {
                        DeviceStatus::Inactive
                    } else {
                        DeviceStatus::Active
                    },
                }))
            }
            None => Ok(None),
        }
    }

    async fn touch_heartbeat(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE devices SET last_ping = ?1, status = 'active' WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        if updated == 0 {
            return Err(anyhow!("device {id} not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for SqliteStore {
    async fn create_many(&self, alerts: &[Alert]) -> Result<usize> {
        if alerts.is_empty() {
            return Ok(0);
        }
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        let mut count = 0;
        for alert in alerts {
            tx.execute(
                r#"INSERT INTO alerts
                   (id, alert_type, title, message, trigger_value, trigger_threshold,
                    vehicle_id, user_id, is_read, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
                params![
                    alert.id,
                    alert.alert_type,
                    alert.title,
                    alert.message,
                    alert.trigger_value,
                    alert.trigger_threshold,
                    alert.vehicle_id,
                    alert.user_id,
                    alert.is_read as i64,
                    alert.created_at.to_rfc3339(),
                ],
            )?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{EmissionMetrics, GpsMetrics};
    use chrono::{Duration, TimeZone};

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn seeded() -> SqliteStore {
        let s = store();
        s.insert_vehicle(&Vehicle {
            id: 1,
            plate_number: "B 1234 XYZ".into(),
            user_id: 10,
            statuses: ChannelStatuses::default(),
        })
        .unwrap();
        s.insert_device(&TrackingDevice {
            id: 1,
            last_ping: None,
            status: DeviceStatus::Active,
        })
        .unwrap();
        s
    }

    fn new_emission(vehicle_id: i64, offset_min: i64) -> NewReading {
        NewReading {
            vehicle_id,
            tracking_device_id: 1,
            plate_number: "B 1234 XYZ".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
                + Duration::minutes(offset_min),
            body: ReadingBody::Emission(EmissionMetrics {
                co2_percentage: 5.0,
                co_percentage: 0.1,
                o2_percentage: 15.0,
                hc_ppm: 50.0,
                nox_ppm: None,
                pm25_level: None,
            }),
        }
    }

    fn new_gps(vehicle_id: i64, lat: f64, lon: f64, speed: f64, offset_min: i64) -> NewReading {
        NewReading {
            vehicle_id,
            tracking_device_id: 1,
            plate_number: "B 1234 XYZ".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
                + Duration::minutes(offset_min),
            body: ReadingBody::Gps(GpsMetrics {
                latitude: lat,
                longitude: lon,
                speed,
                accuracy: None,
                tracking_status: true,
            }),
        }
    }

    #[tokio::test]
    async fn create_and_find_round_trip() {
        let s = seeded();
        let created = s.create(new_emission(1, 0)).await.unwrap();
        let found = s.find_by_id(Channel::Emission, created.id).await.unwrap().unwrap();
        assert_eq!(found.plate_number, "B 1234 XYZ");
        assert_eq!(found.body, created.body);
        // Wrong channel does not match
        assert!(s.find_by_id(Channel::Gps, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn soft_deleted_readings_disappear_from_queries() {
        let s = seeded();
        let created = s.create(new_emission(1, 0)).await.unwrap();
        s.soft_delete(created.id).await.unwrap();
        assert!(s
            .find_by_id(Channel::Emission, created.id)
            .await
            .unwrap()
            .is_none());
        let all = s
            .find_all_for_statistics(&ReadingFilter::channel(Channel::Emission))
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn previous_and_next_by_timestamp() {
        let s = seeded();
        let a = s.create(new_gps(1, 0.0, 0.0, 40.0, 0)).await.unwrap();
        let b = s.create(new_gps(1, 0.0, 1.0, 50.0, 60)).await.unwrap();

        let prev = s
            .find_previous(1, Channel::Gps, b.timestamp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(prev.id, a.id);

        let next = s
            .find_next(1, Channel::Gps, a.timestamp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.id, b.id);

        assert!(s
            .find_previous(1, Channel::Gps, a.timestamp)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn bbox_and_speed_filters() {
        let s = seeded();
        s.create(new_gps(1, 0.0, 0.0, 40.0, 0)).await.unwrap();
        s.create(new_gps(1, 10.0, 10.0, 130.0, 1)).await.unwrap();

        let filter = ReadingFilter {
            channel: Some(Channel::Gps),
            bbox: Some(crate::analysis::BoundingBox {
                min_lat: -1.0,
                max_lat: 1.0,
                min_lon: -1.0,
                max_lon: 1.0,
            }),
            ..Default::default()
        };
        let hits = s.find_all_for_statistics(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);

        let filter = ReadingFilter {
            channel: Some(Channel::Gps),
            speed: Some((100.0, 200.0)),
            ..Default::default()
        };
        let (items, total) = s.find_with_filters(&filter, 1, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].gps().unwrap().speed, 130.0);
    }

    #[tokio::test]
    async fn pagination_totals() {
        let s = seeded();
        for i in 0..5 {
            s.create(new_emission(1, i)).await.unwrap();
        }
        let filter = ReadingFilter::channel(Channel::Emission);
        let (items, total) = s.find_with_filters(&filter, 2, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn channel_status_writes_are_independent() {
        let s = seeded();
        s.update_channel_status(1, Channel::Gps, VehicleStatus::Speeding)
            .await
            .unwrap();
        s.update_channel_status(1, Channel::Emission, VehicleStatus::TopPolluting)
            .await
            .unwrap();
        let v = VehicleStore::get(&s, 1).await.unwrap().unwrap();
        assert_eq!(v.statuses.gps, Some(VehicleStatus::Speeding));
        assert_eq!(v.statuses.emission, Some(VehicleStatus::TopPolluting));
        assert_eq!(v.statuses.obd, None);
        assert_eq!(v.statuses.merged(), VehicleStatus::TopPolluting);
    }

    #[tokio::test]
    async fn heartbeat_touch_updates_last_ping() {
        let s = seeded();
        s.touch_heartbeat(1).await.unwrap();
        let d = DeviceStore::get(&s, 1).await.unwrap().unwrap();
        assert!(d.last_ping.is_some());
        assert_eq!(d.status, DeviceStatus::Active);
    }

    #[tokio::test]
    async fn alert_batch_insert_counts() {
        let s = seeded();
        let alerts: Vec<Alert> = (0..3)
            .map(|i| {
                Alert::from_data(
                    crate::alerts::AlertData {
                        alert_type: "speed_violation".into(),
                        title: format!("Alert {i}"),
                        message: "m".into(),
                        trigger_value: "130.0 km/h".into(),
                        trigger_threshold: "speed > 120".into(),
                        vehicle_id: 1,
                    },
                    10,
                )
            })
            .collect();
        assert_eq!(s.create_many(&alerts).await.unwrap(), 3);
        assert_eq!(s.alerts_for_user(10, 10).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn corrupt_alert_timestamp_surfaces_as_error() {
        let s = seeded();
        let alert = Alert::from_data(
            crate::alerts::AlertData {
                alert_type: "speed_violation".into(),
                title: "Critical Speed Violation".into(),
                message: "m".into(),
                trigger_value: "130.0 km/h".into(),
                trigger_threshold: "speed > 120".into(),
                vehicle_id: 1,
            },
            10,
        );
        s.create_many(std::slice::from_ref(&alert)).await.unwrap();
        s.conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE alerts SET created_at = 'not-a-timestamp' WHERE id = ?1",
                params![alert.id],
            )
            .unwrap();
        assert!(s.alerts_for_user(10, 10).is_err());
    }

    #[tokio::test]
    async fn mark_alerting_failed_is_visible() {
        let s = seeded();
        let created = s.create(new_emission(1, 0)).await.unwrap();
        s.mark_alerting_failed(created.id).await.unwrap();
        let found = s.find_by_id(Channel::Emission, created.id).await.unwrap().unwrap();
        assert!(found.alerting_failed);
    }
}
