//! Configuration structures for the TPMS telemetry simulator
//!
//! This module contains the simulation configuration structure and validation logic
//! used to control the behavior and parameters of the simulation system.

use super::{AnomalyKind, AnomalyMode, OutputFormat, VehicleClass};
use crate::route::LegalSpeedPolicy;
use crate::vehicle::SUPPORTED_WHEEL_COUNTS;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Command line arguments structure
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "tpms-simulator",
    version = "1.0.0",
    about = "TPMS Telemetry Simulator - Generates tire pressure and temperature telemetry for vehicle fleets",
    long_about = "Generates per-vehicle tire pressure, tire temperature and GPS readings for a simulated trip, with optional traffic events and deliberately corrupted records for validating ingestion pipelines.

EXAMPLES:
    # Three cars from San Diego to Los Angeles
    tpms-simulator --vehicles 3 --wheels 4 --start \"San Diego, CA\" --end \"Los Angeles, CA\" --speed 65 --temp 75 --type regular

    # Stationary monitoring in a shop (speed 0)
    tpms-simulator --vehicles 2 --start \"Phoenix, AZ\" --end \"Tucson, AZ\" --speed 0 --temp 72

    # Heavy trucks with traffic events and 5% mixed data anomalies
    tpms-simulator --wheels 10 --type heavy_duty --traffic-events --data-anomalies --anomaly-rate 0.05

    # Generate configuration template
    tpms-simulator --print-config > my-config.json

    # Validate configuration without running
    tpms-simulator --config my-config.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Number of vehicles to simulate
    #[arg(long, help = "Number of vehicles to simulate")]
    pub vehicles: Option<usize>,

    /// Number of wheels per vehicle
    #[arg(long, help = "Number of wheels per vehicle (4, 6, 8 or 10)")]
    pub wheels: Option<u8>,

    /// Starting location
    #[arg(long, help = "Starting location (\"City, ST\" or \"lat,lon\")")]
    pub start: Option<String>,

    /// Ending location
    #[arg(long, help = "Ending location (\"City, ST\" or \"lat,lon\")")]
    pub end: Option<String>,

    /// Average speed in mph
    #[arg(long, help = "Average speed in mph (0 selects stationary mode)")]
    pub speed: Option<f64>,

    /// Ambient temperature in Fahrenheit
    #[arg(long, allow_hyphen_values = true, help = "Average ambient temperature in Fahrenheit")]
    pub temp: Option<f64>,

    /// Vehicle class
    #[arg(long = "type", help = "Vehicle type (regular or heavy_duty)")]
    pub vehicle_type: Option<String>,

    /// Tenant name
    #[arg(long, help = "Tenant name (generated when omitted)")]
    pub tenant: Option<String>,

    /// Update interval in minutes
    #[arg(long, help = "Data update interval in minutes")]
    pub interval: Option<u32>,

    /// Enable traffic event simulation
    #[arg(long, help = "Enable traffic events (congestion, stops, failures, accidents)")]
    pub traffic_events: bool,

    /// Enable data anomaly injection
    #[arg(long, help = "Enable injection of data-quality anomalies")]
    pub data_anomalies: bool,

    /// Fraction of rows to corrupt
    #[arg(long, help = "Fraction of rows to corrupt (0.0-1.0)")]
    pub anomaly_rate: Option<f64>,

    /// Anomaly selection mode
    #[arg(long, help = "Anomaly mode (single or mixed)")]
    pub anomaly_mode: Option<String>,

    /// Fixed corruption kind for single mode
    #[arg(
        long,
        help = "Corruption kind used in single mode",
        long_help = "Corruption kind used for the whole run in single mode (e.g. null_value, out_of_range_value, duplicate_record). Chosen at random when omitted."
    )]
    pub anomaly_kind: Option<String>,

    /// Legal speed policy for stationary-mode duration
    #[arg(long, help = "Legal speed policy for stationary mode (auto, intrastate or interstate)")]
    pub legal_speed: Option<String>,

    /// Route distance override in miles
    #[arg(long, help = "Use this route distance in miles instead of the straight-line estimate")]
    pub distance_miles: Option<f64>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Trip start time
    #[arg(long, help = "Trip start time (RFC 3339, defaults to now)")]
    pub start_time: Option<String>,

    /// Ingestion lag in minutes
    #[arg(long, help = "Minutes between read_at and ingested_at")]
    pub ingestion_lag: Option<u32>,

    /// Output format for generated rows
    #[arg(long, help = "Output format (json or csv)")]
    pub output_format: Option<String>,

    /// Output file path
    #[arg(short, long, help = "Output file path (generated when omitted)")]
    pub output: Option<String>,

    /// Sort rows by ingestion time before writing
    #[arg(long, help = "Sort rows by ingested_at, vin, sensor_id before writing")]
    pub sort_by_ingestion: bool,

    /// Directory for rolling log files
    #[arg(long, help = "Also write JSON logs to daily files in this directory")]
    pub log_dir: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Number of vehicles to simulate
    pub vehicle_count: Option<usize>,
    /// Number of wheels per vehicle
    pub wheel_count: Option<u8>,
    /// Starting location
    pub start_location: Option<String>,
    /// Ending location
    pub end_location: Option<String>,
    /// Average speed in mph
    pub average_speed_mph: Option<f64>,
    /// Ambient temperature in Fahrenheit
    pub ambient_temperature_f: Option<f64>,
    /// Vehicle class
    pub vehicle_class: Option<VehicleClass>,
    /// Tenant name
    pub tenant: Option<String>,
    /// Update interval in minutes
    pub interval_minutes: Option<u32>,
    /// Enable traffic events
    pub enable_traffic_events: Option<bool>,
    /// Enable data anomalies
    pub enable_data_anomalies: Option<bool>,
    /// Fraction of rows to corrupt
    pub anomaly_rate: Option<f64>,
    /// Anomaly selection mode
    pub anomaly_mode: Option<AnomalyMode>,
    /// Fixed corruption kind for single mode
    pub anomaly_kind: Option<AnomalyKind>,
    /// Legal speed policy for stationary mode
    pub legal_speed_policy: Option<LegalSpeedPolicy>,
    /// Route distance override in miles
    pub distance_miles: Option<f64>,
    /// Random seed
    pub seed: Option<u64>,
    /// Trip start time
    pub start_time: Option<DateTime<Utc>>,
    /// Ingestion lag in minutes
    pub ingestion_lag_minutes: Option<u32>,
    /// Output format
    pub output_format: Option<String>,
    /// Output file path
    pub output: Option<String>,
    /// Sort rows by ingestion time
    pub sort_by_ingestion: Option<bool>,
}

/// Configuration for a telemetry simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of vehicles to simulate
    pub vehicle_count: usize,

    /// Number of wheels per vehicle (4, 6, 8 or 10)
    pub wheel_count: u8,

    /// Starting location ("City, ST" or "lat,lon")
    pub start_location: String,

    /// Ending location ("City, ST" or "lat,lon")
    pub end_location: String,

    /// Average speed in mph; 0 selects stationary mode
    pub average_speed_mph: f64,

    /// Ambient temperature in Fahrenheit
    pub ambient_temperature_f: f64,

    /// Vehicle class, which selects the pressure band
    pub vehicle_class: VehicleClass,

    /// Tenant name; generated from the run seed when absent
    pub tenant: Option<String>,

    /// Minutes between consecutive readings
    pub interval_minutes: u32,

    /// Overlay stochastic traffic events on moving vehicles
    pub enable_traffic_events: bool,

    /// Corrupt a fraction of rows with data-quality defects
    pub enable_data_anomalies: bool,

    /// Probability that a row is corrupted (0.0-1.0)
    pub anomaly_rate: f64,

    /// Single or mixed corruption kinds
    pub anomaly_mode: AnomalyMode,

    /// Corruption kind used in single mode; drawn from the run seed when absent
    pub anomaly_kind: Option<AnomalyKind>,

    /// Legal speed used for stationary-mode trip duration
    pub legal_speed_policy: LegalSpeedPolicy,

    /// Route distance override in miles
    pub distance_miles: Option<f64>,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Trip start time; defaults to the current minute
    pub start_time: Option<DateTime<Utc>>,

    /// Minutes between read_at and ingested_at
    pub ingestion_lag_minutes: u32,

    /// Output format for generated rows
    pub output_format: String,

    /// Output file path
    pub output: Option<String>,

    /// Sort rows by (ingested_at, vin, sensor_id) before writing
    pub sort_by_ingestion: bool,
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),

    /// A command line value could not be parsed
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Name of the offending option
        field: String,
        /// Parser message
        value: String,
    },
}

/// Validation errors for simulation configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    /// Vehicle count is invalid
    #[error("Vehicle count must be greater than 0, got {0}")]
    InvalidVehicleCount(usize),

    /// Wheel count is not a supported layout
    #[error("Number of wheels must be 4, 6, 8, or 10, got {0}")]
    InvalidWheelCount(u8),

    /// Speed is negative or not a number
    #[error("Average speed must be a finite value >= 0, got {0}")]
    InvalidSpeed(f64),

    /// Ambient temperature is not a number
    #[error("Ambient temperature must be finite, got {0}")]
    InvalidTemperature(f64),

    /// Interval is zero
    #[error("Update interval must be at least 1 minute, got {0}")]
    InvalidInterval(u32),

    /// Distance override is negative or not a number
    #[error("Route distance must be a finite value >= 0, got {0}")]
    InvalidDistance(f64),

    /// Percentage value is out of range
    #[error("Invalid percentage for {field}: {value} (must be between 0.0 and 1.0)")]
    InvalidPercentage {
        /// Name of the field with invalid percentage
        field: String,
        /// The invalid percentage value
        value: f64,
    },

    /// A location is empty
    #[error("Location must not be empty: {0}")]
    MissingLocation(String),

    /// A fixed corruption kind was combined with mixed mode
    #[error("Anomaly kind {kind} can only be fixed in single mode, but mode is {mode}")]
    UnresolvableAnomalyMode {
        /// Requested corruption kind
        kind: AnomalyKind,
        /// Configured mode
        mode: AnomalyMode,
    },
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vehicle_count: 1,
            wheel_count: 4,
            start_location: "San Diego, CA".to_string(),
            end_location: "Los Angeles, CA".to_string(),
            average_speed_mph: 65.0,
            ambient_temperature_f: 75.0,
            vehicle_class: VehicleClass::Regular,
            tenant: None,
            interval_minutes: 5,
            enable_traffic_events: false,
            enable_data_anomalies: false,
            anomaly_rate: 0.05,
            anomaly_mode: AnomalyMode::Mixed,
            anomaly_kind: None,
            legal_speed_policy: LegalSpeedPolicy::Auto,
            distance_miles: None,
            seed: None,
            start_time: None,
            ingestion_lag_minutes: 2,
            output_format: "json".to_string(),
            output: None,
            sort_by_ingestion: false,
        }
    }
}

impl SimulationConfig {
    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config = Self::default();

        // Load from config file if specified
        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // Override with command line arguments (CLI takes precedence)
        Self::apply_cli_overrides(&mut config, args)?;

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            vehicle_count: file.vehicle_count.unwrap_or(defaults.vehicle_count),
            wheel_count: file.wheel_count.unwrap_or(defaults.wheel_count),
            start_location: file.start_location.unwrap_or(defaults.start_location),
            end_location: file.end_location.unwrap_or(defaults.end_location),
            average_speed_mph: file.average_speed_mph.unwrap_or(defaults.average_speed_mph),
            ambient_temperature_f: file
                .ambient_temperature_f
                .unwrap_or(defaults.ambient_temperature_f),
            vehicle_class: file.vehicle_class.unwrap_or(defaults.vehicle_class),
            tenant: file.tenant.or(defaults.tenant),
            interval_minutes: file.interval_minutes.unwrap_or(defaults.interval_minutes),
            enable_traffic_events: file
                .enable_traffic_events
                .unwrap_or(defaults.enable_traffic_events),
            enable_data_anomalies: file
                .enable_data_anomalies
                .unwrap_or(defaults.enable_data_anomalies),
            anomaly_rate: file.anomaly_rate.unwrap_or(defaults.anomaly_rate),
            anomaly_mode: file.anomaly_mode.unwrap_or(defaults.anomaly_mode),
            anomaly_kind: file.anomaly_kind.or(defaults.anomaly_kind),
            legal_speed_policy: file.legal_speed_policy.unwrap_or(defaults.legal_speed_policy),
            distance_miles: file.distance_miles.or(defaults.distance_miles),
            seed: file.seed.or(defaults.seed),
            start_time: file.start_time.or(defaults.start_time),
            ingestion_lag_minutes: file
                .ingestion_lag_minutes
                .unwrap_or(defaults.ingestion_lag_minutes),
            output_format: file.output_format.unwrap_or(defaults.output_format),
            output: file.output.or(defaults.output),
            sort_by_ingestion: file.sort_by_ingestion.unwrap_or(defaults.sort_by_ingestion),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) -> Result<(), ConfigError> {
        if let Some(value) = args.vehicles {
            config.vehicle_count = value;
        }
        if let Some(value) = args.wheels {
            config.wheel_count = value;
        }
        if let Some(value) = args.start {
            config.start_location = value;
        }
        if let Some(value) = args.end {
            config.end_location = value;
        }
        if let Some(value) = args.speed {
            config.average_speed_mph = value;
        }
        if let Some(value) = args.temp {
            config.ambient_temperature_f = value;
        }
        if let Some(value) = args.vehicle_type {
            config.vehicle_class = parse_option("type", &value)?;
        }
        if let Some(value) = args.tenant {
            config.tenant = Some(value);
        }
        if let Some(value) = args.interval {
            config.interval_minutes = value;
        }
        if let Some(value) = args.anomaly_rate {
            config.anomaly_rate = value;
        }
        if let Some(value) = args.anomaly_mode {
            config.anomaly_mode = parse_option("anomaly-mode", &value)?;
        }
        if let Some(value) = args.anomaly_kind {
            config.anomaly_kind = Some(parse_option("anomaly-kind", &value)?);
        }
        if let Some(value) = args.legal_speed {
            config.legal_speed_policy = parse_option("legal-speed", &value)?;
        }
        if let Some(value) = args.distance_miles {
            config.distance_miles = Some(value);
        }
        if let Some(value) = args.seed {
            config.seed = Some(value);
        }
        if let Some(value) = args.start_time {
            let parsed = DateTime::parse_from_rfc3339(&value).map_err(|e| ConfigError::InvalidValue {
                field: "start-time".to_string(),
                value: format!("{} ({})", value, e),
            })?;
            config.start_time = Some(parsed.with_timezone(&Utc));
        }
        if let Some(value) = args.ingestion_lag {
            config.ingestion_lag_minutes = value;
        }
        if let Some(value) = args.output_format {
            config.output_format = value;
        }
        if let Some(value) = args.output {
            config.output = Some(value);
        }

        // Switches only ever turn features on; the file decides otherwise
        if args.traffic_events {
            config.enable_traffic_events = true;
        }
        if args.data_anomalies {
            config.enable_data_anomalies = true;
        }
        if args.sort_by_ingestion {
            config.sort_by_ingestion = true;
        }

        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.vehicle_count == 0 {
            return Err(ConfigValidationError::InvalidVehicleCount(self.vehicle_count));
        }

        if !SUPPORTED_WHEEL_COUNTS.contains(&self.wheel_count) {
            return Err(ConfigValidationError::InvalidWheelCount(self.wheel_count));
        }

        if !self.average_speed_mph.is_finite() || self.average_speed_mph < 0.0 {
            return Err(ConfigValidationError::InvalidSpeed(self.average_speed_mph));
        }

        if !self.ambient_temperature_f.is_finite() {
            return Err(ConfigValidationError::InvalidTemperature(self.ambient_temperature_f));
        }

        if self.interval_minutes == 0 {
            return Err(ConfigValidationError::InvalidInterval(self.interval_minutes));
        }

        if let Some(distance) = self.distance_miles {
            if !distance.is_finite() || distance < 0.0 {
                return Err(ConfigValidationError::InvalidDistance(distance));
            }
        }

        if self.start_location.trim().is_empty() {
            return Err(ConfigValidationError::MissingLocation("start_location".to_string()));
        }
        if self.end_location.trim().is_empty() {
            return Err(ConfigValidationError::MissingLocation("end_location".to_string()));
        }

        self.validate_percentage("anomaly_rate", self.anomaly_rate)?;

        if let (Some(kind), AnomalyMode::Mixed) = (self.anomaly_kind, self.anomaly_mode) {
            return Err(ConfigValidationError::UnresolvableAnomalyMode {
                kind,
                mode: self.anomaly_mode,
            });
        }

        Ok(())
    }

    /// Helper method to validate percentage values
    fn validate_percentage(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigValidationError::InvalidPercentage {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    /// Whether the run simulates parked vehicles
    pub fn is_stationary(&self) -> bool {
        self.average_speed_mph == 0.0
    }

    /// Get the output format as an enum value
    pub fn get_output_format(&self) -> Result<OutputFormat, String> {
        self.output_format.parse()
    }
}

fn parse_option<T>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|e: String| ConfigError::InvalidValue {
        field: field.to_string(),
        value: e,
    })
}
