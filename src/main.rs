// TPMS Telemetry Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/tpms-telemetry-simulator --vehicles 3 --seed 42
// ```
//
// Or with traffic events and anomalies:
//
// ```console
// $ ./target/release/tpms-telemetry-simulator --traffic-events --data-anomalies --anomaly-rate 0.1 --verbose
// ```

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::process;
use tpms_telemetry_simulator::route::{provider_for, RoutePlan, StaticGeocoder};
use tpms_telemetry_simulator::simulation::{LoggingConfig, SimulationEngine, SimulationOutput};
use tpms_telemetry_simulator::telemetry::{default_filename, RowWriter};
use tpms_telemetry_simulator::types::config::CliArgs;
use tpms_telemetry_simulator::types::SimulationConfig;
use tpms_telemetry_simulator::vehicle::cycle_count;
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();

    if args.print_config {
        match SimulationConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    let mut logging = LoggingConfig::for_verbosity(args.verbose, args.debug);
    if let Some(dir) = &args.log_dir {
        logging = logging.with_file_logging(dir);
    }
    let guard = match logging.init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    let result = run(args);
    if let Err(e) = &result {
        error!("Simulation failed: {:#}", e);
    }

    // Flush buffered log lines before exiting
    drop(guard);
    if result.is_err() {
        process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let dry_run = args.dry_run;
    let config = SimulationConfig::from_cli_args(args).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    let format = config
        .get_output_format()
        .map_err(anyhow::Error::msg)
        .context("Invalid output format")?;
    info!("Configuration loaded and validated successfully");

    let provider = provider_for(config.distance_miles);
    let plan = RoutePlan::resolve(&config, &StaticGeocoder::new(), provider.as_ref())
        .with_context(|| format!("Failed to resolve route {} -> {}", config.start_location, config.end_location))?;

    if dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config, &plan);
        return Ok(());
    }

    print_startup_banner(&config, &plan);

    let engine = SimulationEngine::new(config, plan).context("Failed to create simulation engine")?;
    let output = engine.run().context("Telemetry generation failed")?;

    let path = match &engine.config().output {
        Some(path) => path.clone(),
        None => default_filename(engine.config().is_stationary(), format, Utc::now()),
    };
    RowWriter::new(format)
        .write_file(&output.rows, &path)
        .with_context(|| format!("Failed to write rows to {}", path))?;

    print_final_statistics(&output, &path);
    Ok(())
}

/// Print startup banner and configuration summary
fn print_startup_banner(config: &SimulationConfig, plan: &RoutePlan) {
    eprintln!("TPMS Telemetry Simulator");
    eprintln!("========================");
    eprintln!("Synthetic tire pressure and temperature telemetry for a vehicle fleet");
    eprintln!();

    print_configuration_summary(config, plan);
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig, plan: &RoutePlan) {
    eprintln!("Configuration:");
    eprintln!("  Vehicles: {}", config.vehicle_count);
    eprintln!("  Wheels per Vehicle: {}", config.wheel_count);
    eprintln!("  Vehicle Class: {}", config.vehicle_class);
    eprintln!("  Route: {} -> {}", config.start_location, config.end_location);
    eprintln!("  Distance: {:.1} miles", plan.distance_miles);
    if config.is_stationary() {
        eprintln!("  Mode: stationary (sized at legal speed {:.0} mph)", plan.legal_speed_mph);
    } else {
        eprintln!("  Average Speed: {:.1} mph", config.average_speed_mph);
    }
    eprintln!("  Ambient Temperature: {:.1} F", config.ambient_temperature_f);
    eprintln!("  Interval: {} minutes", config.interval_minutes);
    eprintln!("  Traffic Events: {}", if config.enable_traffic_events { "enabled" } else { "disabled" });
    if config.enable_data_anomalies {
        eprintln!(
            "  Data Anomalies: {:.1}% ({} mode{})",
            config.anomaly_rate * 100.0,
            config.anomaly_mode,
            config.anomaly_kind.map(|k| format!(", {}", k)).unwrap_or_default()
        );
    } else {
        eprintln!("  Data Anomalies: disabled");
    }
    eprintln!("  Output Format: {}", config.output_format);
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }

    let hours = plan.duration_hours(config.average_speed_mph);
    let cycles = cycle_count(hours, config.interval_minutes);
    eprintln!("\nEstimated Scale:");
    eprintln!("  Trip Duration: {:.2} hours", hours);
    eprintln!("  Intervals per Vehicle: ~{}", cycles);
    eprintln!(
        "  Rows: ~{}",
        config.vehicle_count * cycles as usize * (2 * config.wheel_count as usize + 1)
    );
    eprintln!();
}

/// Print the end-of-run report
fn print_final_statistics(output: &SimulationOutput, path: &str) {
    eprintln!("{}", output.statistics.generate_summary_output());
    eprintln!("Tenant: {}", output.tenant);
    eprintln!("Run: {}", output.run_id);
    eprintln!("Rows written to: {}", path);
}
