// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Storage seam
//!
//! The engine consumes four narrow store interfaces and never assumes a
//! particular backend. [`sqlite::SqliteStore`] is the bundled reference
//! implementation; [`memory::MemoryStore`] backs tests.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::Alert;
use crate::analysis::BoundingBox;
use crate::telemetry::{Channel, NewReading, Reading, ReadingBody, TrackingDevice, Vehicle, VehicleStatus};

/// Predicate for reading queries; all fields are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct ReadingFilter {
    /// Restrict to one channel
    pub channel: Option<Channel>,
    /// Restrict to one vehicle
    pub vehicle_id: Option<i64>,
    /// Inclusive timestamp range
    pub range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// GPS only: lat/lon bounding box pre-filter
    pub bbox: Option<BoundingBox>,
    /// GPS only: inclusive speed range, km/h
    pub speed: Option<(f64, f64)>,
}

impl ReadingFilter {
    /// Filter for one channel.
    pub fn channel(channel: Channel) -> Self {
        Self {
            channel: Some(channel),
            ..Default::default()
        }
    }
}

/// One page of query results with pagination bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Matching items across all pages
    pub total: u64,
    /// Page count
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Assemble a page from a slice of results and the total match count.
    pub fn new(items: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = ((total + limit as u64 - 1) / limit as u64) as u32;
        Self {
            items,
            page: page.max(1),
            limit,
            total,
            total_pages,
        }
    }
}

/// Durable store of telemetry readings
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Persist a validated reading, returning the stored record.
    async fn create(&self, reading: NewReading) -> Result<Reading>;

    /// Fetch one reading by channel and id. Soft-deleted rows are not
    /// returned.
    async fn find_by_id(&self, channel: Channel, id: i64) -> Result<Option<Reading>>;

    /// Page through readings matching a filter, newest first. Returns the
    /// page items and the total match count.
    async fn find_with_filters(
        &self,
        filter: &ReadingFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Reading>, u64)>;

    /// Fetch the entire matching window for aggregation. The caller is
    /// responsible for bounding the window.
    async fn find_all_for_statistics(&self, filter: &ReadingFilter) -> Result<Vec<Reading>>;

    /// Latest reading of `channel` for the vehicle strictly before
    /// `before`.
    async fn find_previous(
        &self,
        vehicle_id: i64,
        channel: Channel,
        before: DateTime<Utc>,
    ) -> Result<Option<Reading>>;

    /// Earliest reading of `channel` for the vehicle strictly after
    /// `after`.
    async fn find_next(
        &self,
        vehicle_id: i64,
        channel: Channel,
        after: DateTime<Utc>,
    ) -> Result<Option<Reading>>;

    /// Replace the metrics of an existing reading.
    async fn update_metrics(&self, id: i64, body: ReadingBody) -> Result<Reading>;

    /// Soft-delete an emission reading.
    async fn soft_delete(&self, id: i64) -> Result<()>;

    /// Flag a persisted reading whose alert batch failed, so it can be
    /// found for reprocessing.
    async fn mark_alerting_failed(&self, id: i64) -> Result<()>;
}

/// Store of vehicle records
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Fetch a vehicle by id.
    async fn get(&self, id: i64) -> Result<Option<Vehicle>>;

    /// Write one channel's status slot.
    async fn update_channel_status(
        &self,
        id: i64,
        channel: Channel,
        status: VehicleStatus,
    ) -> Result<()>;
}

/// Store of tracking-device records
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Fetch a device by id.
    async fn get(&self, id: i64) -> Result<Option<TrackingDevice>>;

    /// Update the device heartbeat to now.
    async fn touch_heartbeat(&self, id: i64) -> Result<()>;
}

/// Store of alert records
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Insert a batch of alerts, all-or-nothing. Returns the inserted
    /// count.
    async fn create_many(&self, alerts: &[Alert]) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math() {
        let p: Page<i32> = Page::new(vec![1, 2, 3], 1, 3, 7);
        assert_eq!(p.total_pages, 3);

        let p: Page<i32> = Page::new(vec![], 1, 10, 0);
        assert_eq!(p.total_pages, 0);

        let p: Page<i32> = Page::new(vec![1], 1, 5, 5);
        assert_eq!(p.total_pages, 1);
    }
}
