//! Telemetry domain types - readings, vehicles, tracking devices

mod reading;
mod validate;
mod vehicle;

pub use reading::{Channel, EmissionMetrics, GpsMetrics, NewReading, ObdMetrics, Reading, ReadingBody};
pub use validate::{
    validate, EmissionReadingDto, GpsReadingDto, ObdReadingDto, ReadingDto, ValidatedReading,
    ValidationError,
};
pub use vehicle::{ChannelStatuses, DeviceStatus, TrackingDevice, Vehicle, VehicleStatus};
