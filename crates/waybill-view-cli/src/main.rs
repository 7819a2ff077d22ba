//! # waybill-view CLI
//!
//! Resolves shipment view models, aggregates sensor telemetry and reports
//! chart layout from the command line.

use anyhow::{Context, Result};
use serde_json::Value;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::ViewerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "shipment" => {
            if args.len() < 3 {
                eprintln!("Usage: waybill-view shipment <id>");
                std::process::exit(1);
            }
            let config = ViewerConfig::from_env()?;
            let fetcher = commands::build_fetcher(&config).await?;
            print_json(&commands::shipment(fetcher, &config, &args[2]).await?)?;
        }
        "telemetry" => {
            if args.len() < 4 {
                eprintln!("Usage: waybill-view telemetry <sensor-json> <events-json-file>");
                std::process::exit(1);
            }
            let config = ViewerConfig::from_env()?;
            let fetcher = commands::build_fetcher(&config).await?;
            let report =
                commands::telemetry(fetcher, &config, &args[2], Path::new(&args[3])).await?;
            print_json(&report)?;
        }
        "layout" => {
            if args.len() < 3 {
                eprintln!("Usage: waybill-view layout <width>");
                std::process::exit(1);
            }
            print_json(&commands::layout(&args[2])?)?;
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn print_help() {
    println!(
        r#"waybill-view

USAGE:
    waybill-view <COMMAND> [ARGS]

COMMANDS:
    shipment <id>                             Resolve a shipment and print its view model
    telemetry <sensor-json> <events-file>     Aggregate sensor telemetry with event markers
    layout <width>                            Print chart layout metrics for a container width
    help                                      Show this help message

ENVIRONMENT:
    WAYBILL_VIEW_BASE_URL          Base URL for relative identifiers (default http://localhost:8080)
    WAYBILL_VIEW_TIMEOUT_SECS      Request timeout in seconds (default 30)
    WAYBILL_VIEW_BEARER_TOKEN      Bearer token sent with every request
    WAYBILL_VIEW_CA_CERT           PEM file with a custom CA certificate
    WAYBILL_VIEW_FIXTURES          JSON file of identifier -> body; used instead of HTTP
    WAYBILL_VIEW_RESOLVE_PARTIES   "true" to also resolve party details
    WAYBILL_VIEW_THEME             "light" or "dark"
    WAYBILL_VIEW_MARKER_EVENTS     JSON array of event names drawn as markers
    RUST_LOG                       Log filter (default info)

EXAMPLES:
    waybill-view shipment "https://api.example.org/shipments/S1"
    waybill-view telemetry '{{"id":"urn:sensor:1","sensorName":"Reefer","sensorSerialNumber":"SN-1"}}' events.json
    waybill-view layout 800
"#
    );
}
