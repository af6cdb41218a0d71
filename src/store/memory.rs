// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! In-memory store
//!
//! Backs engine tests and throwaway runs. Records heartbeat touches and
//! alert batches so tests can assert side-effect semantics, and can be
//! told to fail the next alert write to exercise the compensation path.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{AlertStore, DeviceStore, ReadingFilter, ReadingStore, VehicleStore};
use crate::alerts::Alert;
use crate::telemetry::{
    Channel, NewReading, Reading, ReadingBody, TrackingDevice, Vehicle, VehicleStatus,
};

/// In-memory implementation of every store trait
#[derive(Default)]
pub struct MemoryStore {
    readings: Mutex<Vec<Reading>>,
    vehicles: Mutex<HashMap<i64, Vehicle>>,
    devices: Mutex<HashMap<i64, TrackingDevice>>,
    alerts: Mutex<Vec<Alert>>,
    next_id: AtomicI64,
    /// Completed heartbeat touches
    heartbeat_touches: AtomicUsize,
    /// Alert batch sizes, in write order
    alert_batches: Mutex<Vec<usize>>,
    fail_next_alert_write: AtomicBool,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Register a vehicle.
    pub fn insert_vehicle(&self, vehicle: Vehicle) {
        self.vehicles.lock().unwrap().insert(vehicle.id, vehicle);
    }

    /// Register a tracking device.
    pub fn insert_device(&self, device: TrackingDevice) {
        self.devices.lock().unwrap().insert(device.id, device);
    }

    /// Heartbeats completed so far.
    pub fn heartbeat_touches(&self) -> usize {
        self.heartbeat_touches.load(Ordering::SeqCst)
    }

    /// Sizes of alert batches written so far.
    pub fn alert_batches(&self) -> Vec<usize> {
        self.alert_batches.lock().unwrap().clone()
    }

    /// All alerts written so far.
    pub fn stored_alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }

    /// Make the next `create_many` call fail.
    pub fn fail_next_alert_write(&self) {
        self.fail_next_alert_write.store(true, Ordering::SeqCst);
    }

    /// Direct access to a stored reading.
    pub fn reading(&self, id: i64) -> Option<Reading> {
        self.readings.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    /// Device record, if registered.
    pub fn device(&self, id: i64) -> Option<TrackingDevice> {
        self.devices.lock().unwrap().get(&id).cloned()
    }

    fn matches(reading: &Reading, filter: &ReadingFilter) -> bool {
        if reading.deleted_at.is_some() {
            return false;
        }
        if let Some(channel) = filter.channel {
            if reading.channel() != channel {
                return false;
            }
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            if reading.vehicle_id != vehicle_id {
                return false;
            }
        }
        if let Some((start, end)) = filter.range {
            if reading.timestamp < start || reading.timestamp > end {
                return false;
            }
        }
        if let Some(bbox) = filter.bbox {
            match reading.gps() {
                Some(m) if bbox.contains(m.latitude, m.longitude) => {}
                _ => return false,
            }
        }
        if let Some((min, max)) = filter.speed {
            match reading.gps() {
                Some(m) if m.speed >= min && m.speed <= max => {}
                _ => return false,
            }
        }
        true
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn create(&self, reading: NewReading) -> Result<Reading> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = Reading {
            id,
            vehicle_id: reading.vehicle_id,
            tracking_device_id: reading.tracking_device_id,
            plate_number: reading.plate_number,
            timestamp: reading.timestamp,
            body: reading.body,
            created_at: Utc::now(),
            deleted_at: None,
            alerting_failed: false,
        };
        self.readings.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, channel: Channel, id: i64) -> Result<Option<Reading>> {
        Ok(self
            .readings
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.channel() == channel && r.deleted_at.is_none())
            .cloned())
    }

    async fn find_with_filters(
        &self,
        filter: &ReadingFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Reading>, u64)> {
        let readings = self.readings.lock().unwrap();
        let mut matching: Vec<Reading> = readings
            .iter()
            .filter(|r| Self::matches(r, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let total = matching.len() as u64;
        let limit = limit.max(1) as usize;
        let offset = (page.max(1) as usize - 1) * limit;
        let items = matching.into_iter().skip(offset).take(limit).collect();
        Ok((items, total))
    }

    async fn find_all_for_statistics(&self, filter: &ReadingFilter) -> Result<Vec<Reading>> {
        let readings = self.readings.lock().unwrap();
        let mut matching: Vec<Reading> = readings
            .iter()
            .filter(|r| Self::matches(r, filter))
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.timestamp);
        Ok(matching)
    }

    async fn find_previous(
        &self,
        vehicle_id: i64,
        channel: Channel,
        before: DateTime<Utc>,
    ) -> Result<Option<Reading>> {
        let readings = self.readings.lock().unwrap();
        Ok(readings
            .iter()
            .filter(|r| {
                r.vehicle_id == vehicle_id
                    && r.channel() == channel
                    && r.timestamp < before
                    && r.deleted_at.is_none()
            })
            .max_by_key(|r| r.timestamp)
            .cloned())
    }

    async fn find_next(
        &self,
        vehicle_id: i64,
        channel: Channel,
        after: DateTime<Utc>,
    ) -> Result<Option<Reading>> {
        let readings = self.readings.lock().unwrap();
        Ok(readings
            .iter()
            .filter(|r| {
                r.vehicle_id == vehicle_id
                    && r.channel() == channel
                    && r.timestamp > after
                    && r.deleted_at.is_none()
            })
            .min_by_key(|r| r.timestamp)
            .cloned())
    }

    async fn update_metrics(&self, id: i64, body: ReadingBody) -> Result<Reading> {
        let mut readings = self.readings.lock().unwrap();
        let reading = readings
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .ok_or_else(|| anyhow!("reading {id} not found"))?;
        reading.body = body;
        Ok(reading.clone())
    }

    async fn soft_delete(&self, id: i64) -> Result<()> {
        let mut readings = self.readings.lock().unwrap();
        if let Some(reading) = readings.iter_mut().find(|r| r.id == id) {
            reading.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn mark_alerting_failed(&self, id: i64) -> Result<()> {
        let mut readings = self.readings.lock().unwrap();
        if let Some(reading) = readings.iter_mut().find(|r| r.id == id) {
            reading.alerting_failed = true;
        }
        Ok(())
    }
}

#[async_trait]
impl VehicleStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Vehicle>> {
        Ok(self.vehicles.lock().unwrap().get(&id).cloned())
    }

    async fn update_channel_status(
        &self,
        id: i64,
        channel: Channel,
        status: VehicleStatus,
    ) -> Result<()> {
        let mut vehicles = self.vehicles.lock().unwrap();
        let vehicle = vehicles
            .get_mut(&id)
            .ok_or_else(|| anyhow!("vehicle {id} not found"))?;
        vehicle.statuses.set(channel, status);
        Ok(())
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<TrackingDevice>> {
        Ok(self.devices.lock().unwrap().get(&id).cloned())
    }

    async fn touch_heartbeat(&self, id: i64) -> Result<()> {
        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .get_mut(&id)
            .ok_or_else(|| anyhow!("device {id} not found"))?;
        device.last_ping = Some(Utc::now());
        self.heartbeat_touches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn create_many(&self, alerts: &[Alert]) -> Result<usize> {
        if self.fail_next_alert_write.swap(false, Ordering::SeqCst) {
            bail!("alert store unavailable");
        }
        self.alert_batches.lock().unwrap().push(alerts.len());
        self.alerts.lock().unwrap().extend_from_slice(alerts);
        Ok(alerts.len())
    }
}
