//! Coverage worker.
//!
//! Runs a single GetCoverage request against a YAML coverage catalog and
//! writes the resulting raster next to a JSON description of it. Failures
//! are printed as WCS exception reports.

mod output;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use coverage_processor::{CoverageProcessorConfig, CoverageService, InMemoryCatalog};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wcs_common::{Envelope, ExceptionCode, QueryRequest, WcsError};

#[derive(Parser, Debug)]
#[command(name = "coverage-worker")]
#[command(about = "Run WCS GetCoverage requests against a coverage catalog")]
struct Args {
    /// Coverage catalog file
    #[arg(short, long, env = "WCS_CATALOG", default_value = "config/coverages.yaml")]
    catalog: PathBuf,

    /// GetCoverage request as a JSON file
    #[arg(short, long)]
    request: PathBuf,

    /// Output path prefix; writes <output>.f32 and <output>.json
    #[arg(short, long, default_value = "coverage")]
    output: PathBuf,

    /// Replace the request's bounding box: "min0,min1,max0,max1[,crs]"
    #[arg(long)]
    bbox: Option<String>,

    /// Read timeout in seconds
    #[arg(long, env = "WCS_READ_TIMEOUT_SECS")]
    read_timeout: Option<u64>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = CoverageProcessorConfig::from_env();
    if let Some(secs) = args.read_timeout {
        config.read_timeout = Duration::from_secs(secs);
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let catalog = InMemoryCatalog::from_yaml_file(&args.catalog)?;
    let reader = catalog.raw_file_reader();
    info!(
        coverages = catalog.len(),
        readable = reader.len(),
        "Loaded coverage catalog"
    );
    let service = CoverageService::new(Arc::new(catalog), Arc::new(reader), config);

    let mut request = load_request(&args.request)?;
    if let Some(bbox) = &args.bbox {
        if let Err(e) = apply_bbox(&mut request, bbox) {
            return report_and_exit(&e);
        }
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling request");
            on_interrupt.cancel();
        }
    });

    match service.get_coverage(&request, &cancel).await {
        Ok(result) => {
            let written = output::write_result(&args.output, &request.coverage_id, &result)?;
            let metrics = service.metrics().snapshot().await;
            info!(
                data = %written.data.display(),
                metadata = %written.metadata.display(),
                read_ms = metrics.read_times.avg_ms,
                resample_ms = metrics.pipeline_times.avg_ms,
                "Coverage written"
            );
            Ok(())
        }
        Err(e) => report_and_exit(&e),
    }
}

/// Read a JSON GetCoverage request.
fn load_request(path: &Path) -> Result<QueryRequest> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read request {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse request {}", path.display()))
}

/// Replace the request envelope with a WCS BoundingBox value.
fn apply_bbox(request: &mut QueryRequest, bbox: &str) -> Result<(), WcsError> {
    let envelope = Envelope::from_bbox_string(bbox, None)?;
    request.domain_subset.envelope = Some(envelope);
    Ok(())
}

/// Print the exception report on stdout and exit.
///
/// Client errors exit with 2, server-side failures with 1.
fn report_and_exit(error: &WcsError) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&error.to_report())?);
    let status = match error.code() {
        ExceptionCode::InvalidParameterValue => 2,
        ExceptionCode::NoApplicableCode => 1,
    };
    std::process::exit(status)
}
