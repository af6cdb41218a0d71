// Copyright (c) 2026 fleetpulse contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/fleetpulse/fleetpulse-rs

//! FleetPulse - Vehicle Telemetry Analysis & Alerting Engine
//!
//! Command-line frontend over the engine: ingest readings from JSON
//! files, query aggregate statistics, and run geospatial and speed
//! searches against the local database.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fleetpulse::engine::StatsFilter;
use fleetpulse::store::sqlite::SqliteStore;
use fleetpulse::telemetry::{
    ChannelStatuses, DeviceStatus, ReadingDto, TrackingDevice, Vehicle,
};
use fleetpulse::{Channel, Config, Engine, VERSION};

/// FleetPulse - Vehicle Telemetry Analysis & Alerting Engine
#[derive(Parser, Debug)]
#[command(name = "fleetpulse")]
#[command(author = "FleetPulse Project")]
#[command(version = VERSION)]
#[command(about = "Vehicle telemetry analysis and alerting")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Database path, overriding the configured one
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a vehicle and its tracking device
    Register {
        /// Vehicle id
        #[arg(long)]
        vehicle: i64,
        /// Plate number
        #[arg(long)]
        plate: String,
        /// Owning user id
        #[arg(long)]
        user: i64,
        /// Tracking device id
        #[arg(long)]
        device: i64,
    },
    /// Ingest readings from a JSON file (one object or an array)
    Ingest {
        /// Path to the readings file
        file: PathBuf,
    },
    /// Aggregate statistics for one channel
    Stats {
        /// Channel: emission, obd or gps
        channel: String,
        /// Restrict to one vehicle
        #[arg(long)]
        vehicle: Option<i64>,
    },
    /// GPS readings within a radius of a point
    Near {
        /// Center latitude, degrees
        lat: f64,
        /// Center longitude, degrees
        lon: f64,
        /// Search radius, km
        radius: f64,
        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,
        /// Page size
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// GPS readings with speed inside a range
    Speed {
        /// Minimum speed, km/h
        min: f64,
        /// Maximum speed, km/h
        max: f64,
        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,
        /// Page size
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

fn parse_channel(s: &str) -> Result<Channel> {
    match s {
        "emission" => Ok(Channel::Emission),
        "obd" => Ok(Channel::Obd),
        "gps" => Ok(Channel::Gps),
        other => bail!("unknown channel {other:?}, expected emission, obd or gps"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("FleetPulse v{VERSION}");

    // Load or create configuration
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;
    if let Some(database) = args.database {
        config.database.path = database;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args.command))
}

async fn run(config: Config, command: Command) -> Result<()> {
    let store = Arc::new(SqliteStore::open(&config.database)?);
    let engine = Engine::with_store(store.clone(), Arc::new(config));

    match command {
        Command::Register {
            vehicle,
            plate,
            user,
            device,
        } => {
            store.insert_vehicle(&Vehicle {
                id: vehicle,
                plate_number: plate.clone(),
                user_id: user,
                statuses: ChannelStatuses::default(),
            })?;
            store.insert_device(&TrackingDevice {
                id: device,
                last_ping: None,
                status: DeviceStatus::Active,
            })?;
            info!("Registered vehicle {vehicle} ({plate}) with device {device}");
        }
        Command::Ingest { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let dtos: Vec<ReadingDto> = if content.trim_start().starts_with('[') {
                serde_json::from_str(&content)?
            } else {
                vec![serde_json::from_str(&content)?]
            };

            let total = dtos.len();
            let mut alerts = 0usize;
            for dto in &dtos {
                let outcome = engine.ingest(dto).await?;
                alerts += outcome.alerts_generated;
                info!(
                    "Reading {} ({}) classified {:?}, vehicle status {}",
                    outcome.reading.id,
                    outcome.reading.channel(),
                    outcome.classification.level,
                    outcome.vehicle_status,
                );
            }
            info!("Ingested {total} reading(s), {alerts} alert(s) generated");
        }
        Command::Stats { channel, vehicle } => {
            let channel = parse_channel(&channel)?;
            let filter = StatsFilter {
                vehicle_id: vehicle,
                range: None,
            };
            let stats = engine.get_statistics(channel, &filter).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Near {
            lat,
            lon,
            radius,
            page,
            limit,
        } => {
            let result = engine
                .get_by_location_radius(lat, lon, radius, page, limit, None)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Speed {
            min,
            max,
            page,
            limit,
        } => {
            let result = engine.get_by_speed_range(min, max, page, limit, None).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
