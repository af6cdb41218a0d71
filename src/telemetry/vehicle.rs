// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! Vehicle and tracking-device records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Channel;

/// Operational status derived from telemetry.
///
/// Each channel writes only its own slot in [`ChannelStatuses`]; the
/// vehicle-level status is computed by [`ChannelStatuses::merged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    /// Emissions within thresholds
    NormalEmission,
    /// Emission classification HIGH or worse, or excess fault codes
    TopPolluting,
    /// OBD indicates the vehicle needs service
    UnderMaintenance,
    /// GPS speed below the stationary cutoff
    Stationary,
    /// GPS speed in the normal driving band
    Moving,
    /// GPS speed at or above the warning threshold
    Speeding,
}

impl VehicleStatus {
    /// Precedence rank used when merging channel statuses. Higher wins.
    fn rank(self) -> u8 {
        match self {
            VehicleStatus::UnderMaintenance => 5,
            VehicleStatus::TopPolluting => 4,
            VehicleStatus::Speeding => 3,
            VehicleStatus::Moving => 2,
            VehicleStatus::Stationary => 1,
            VehicleStatus::NormalEmission => 0,
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VehicleStatus::NormalEmission => "normal_emission",
            VehicleStatus::TopPolluting => "top_polluting",
            VehicleStatus::UnderMaintenance => "under_maintenance",
            VehicleStatus::Stationary => "stationary",
            VehicleStatus::Moving => "moving",
            VehicleStatus::Speeding => "speeding",
        };
        write!(f, "{s}")
    }
}

/// Per-channel status slots.
///
/// The three telemetry pipelines used to race on a single shared status
/// field; each pipeline now owns one slot and readers merge on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatuses {
    /// Last status written by the emission pipeline
    pub emission: Option<VehicleStatus>,
    /// Last status written by the OBD pipeline
    pub obd: Option<VehicleStatus>,
    /// Last status written by the GPS pipeline
    pub gps: Option<VehicleStatus>,
}

impl ChannelStatuses {
    /// Write one channel's slot.
    pub fn set(&mut self, channel: Channel, status: VehicleStatus) {
        match channel {
            Channel::Emission => self.emission = Some(status),
            Channel::Obd => self.obd = Some(status),
            Channel::Gps => self.gps = Some(status),
        }
    }

    /// Merge the slots into one vehicle-level status.
    ///
    /// Precedence: UnderMaintenance > TopPolluting > Speeding > Moving >
    /// Stationary > NormalEmission. Empty slots are ignored; a vehicle
    /// with no telemetry yet reads as NormalEmission.
    pub fn merged(&self) -> VehicleStatus {
        [self.emission, self.obd, self.gps]
            .into_iter()
            .flatten()
            .max_by_key(|s| s.rank())
            .unwrap_or(VehicleStatus::NormalEmission)
    }
}

/// A registered vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Store-assigned identifier
    pub id: i64,
    /// Registration plate
    pub plate_number: String,
    /// Owning user; alerts are attributed to this account
    pub user_id: i64,
    /// Per-channel operational statuses
    pub statuses: ChannelStatuses,
}

/// Tracking-device operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Device is reporting
    Active,
    /// Device has not reported recently
    Inactive,
}

/// A tracking device installed in a vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingDevice {
    /// Store-assigned identifier
    pub id: i64,
    /// Last heartbeat, touched on every successful ingestion
    pub last_ping: Option<DateTime<Utc>>,
    /// Device status
    pub status: DeviceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_status_defaults_to_normal() {
        assert_eq!(
            ChannelStatuses::default().merged(),
            VehicleStatus::NormalEmission
        );
    }

    #[test]
    fn merged_status_follows_precedence() {
        let mut s = ChannelStatuses::default();
        s.set(Channel::Gps, VehicleStatus::Moving);
        assert_eq!(s.merged(), VehicleStatus::Moving);

        s.set(Channel::Emission, VehicleStatus::TopPolluting);
        assert_eq!(s.merged(), VehicleStatus::TopPolluting);

        s.set(Channel::Gps, VehicleStatus::Speeding);
        assert_eq!(s.merged(), VehicleStatus::TopPolluting);

        s.set(Channel::Obd, VehicleStatus::UnderMaintenance);
        assert_eq!(s.merged(), VehicleStatus::UnderMaintenance);
    }

    #[test]
    fn channel_write_only_touches_own_slot() {
        let mut s = ChannelStatuses::default();
        s.set(Channel::Obd, VehicleStatus::UnderMaintenance);
        s.set(Channel::Gps, VehicleStatus::Stationary);
        assert_eq!(s.emission, None);
        assert_eq!(s.obd, Some(VehicleStatus::UnderMaintenance));
        assert_eq!(s.gps, Some(VehicleStatus::Stationary));
    }
}
