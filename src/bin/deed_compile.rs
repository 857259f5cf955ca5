//! Deed Compiler CLI
//!
//! Compiles a batch of deed records against a surveyed-corner registry
//! and writes the resulting GeoJSON feature collection to stdout.
//! Per-document failures are logged to stderr and skipped; the batch
//! always completes.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (default: info)
//!
//! ## Usage
//!
//! ```bash
//! deed_compile corners.json deeds.json > parcels.geojson
//! ```
//!
//! `corners.json` maps registry labels ("24 27 12 SE") to `[x, y]`
//! working-grid coordinates in U.S. survey feet. `deeds.json` is an
//! array of deed records.

use std::fs;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use aliquot_compiler::{CornerRegistry, DeedRecord, DescriptionCompiler};

/// Initialize the tracing subscriber on stderr, keeping stdout clean
/// for the emitted GeoJSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "deed_compile=info,aliquot_compiler=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(registry_path: &str, deeds_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let registry_json = fs::read_to_string(registry_path)?;
    let registry = CornerRegistry::from_json(&registry_json)?;
    info!(corners = registry.len(), path = registry_path, "loaded corner registry");

    let deeds_json = fs::read_to_string(deeds_path)?;
    let records: Vec<DeedRecord> = serde_json::from_str(&deeds_json)?;
    info!(documents = records.len(), path = deeds_path, "loaded deed records");

    let mut compiler = DescriptionCompiler::new(registry);
    let collection = compiler.compile_batch(&records);
    info!(features = collection.features.len(), "compiled batch");

    serde_json::to_writer_pretty(std::io::stdout().lock(), &collection)?;
    println!();
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <corners.json> <deeds.json>", args[0]);
        return ExitCode::from(2);
    }

    match run(&args[1], &args[2]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "compilation aborted");
            ExitCode::FAILURE
        }
    }
}
