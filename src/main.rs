//! orbitcast - headless driver for the orbit data pipeline
//!
//! Loads the catalog, runs a few ticks of interpolated animation and
//! optionally describes one object.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use orbitcast::data::{CacheManager, FileFetcher, MemoryStore, SystemClock};
use orbitcast::{
    format_duration, Duration, Instant, LogTelemetry, OrbitPipeline, PipelineConfig, Propagator,
    Telemetry,
};

#[derive(Parser, Debug)]
#[command(name = "orbitcast", about = "Propagate and animate a TLE catalog")]
struct Cli {
    /// JSON pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read element sets from a local file (plain or gzipped) instead of upstream
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Number of coarse ticks to run
    #[arg(long, default_value_t = 3)]
    ticks: usize,

    /// Frames rendered per tick
    #[arg(long, default_value_t = 4)]
    frames_per_tick: usize,

    /// Override the configured tick period, seconds
    #[arg(long)]
    tick_period: Option<f64>,

    /// Print an orbit summary for the named object
    #[arg(long)]
    describe: Option<String>,
}

fn now() -> Instant {
    let now = chrono::Utc::now();
    Instant::from_unixtime(now.timestamp_millis() as f64 / 1000.0)
}

fn build_pipeline(cli: &Cli, config: PipelineConfig) -> Result<OrbitPipeline> {
    let Some(path) = &cli.catalog else {
        return OrbitPipeline::new(config).context("Failed to set up pipeline");
    };

    log::info!("Reading element sets from {}", path.display());
    let telemetry: Arc<dyn Telemetry> = Arc::new(LogTelemetry::new());
    let cache = CacheManager::new(
        Box::new(MemoryStore::new()),
        Box::new(FileFetcher::new(path)),
        Arc::new(SystemClock),
        Arc::clone(&telemetry),
        config.cache_key.clone(),
        config.cache_max_age(),
    );
    let propagator = Propagator::new()
        .with_telemetry(Arc::clone(&telemetry))
        .with_parallel_threshold(config.parallel_threshold);
    OrbitPipeline::with_parts(config, cache, propagator, telemetry)
        .context("Failed to set up pipeline")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(period) = cli.tick_period {
        config = config.with_tick_period_secs(period);
    }
    let tick_period = config.tick_period_secs;

    let mut pipeline = build_pipeline(&cli, config)?;
    let (catalog, outcome) = pipeline
        .load_catalog()
        .context("Satellite data unavailable")?;
    println!("Loaded {} objects ({:?})", catalog.len(), outcome);
    println!("{}", pipeline.stats());

    let start = now();
    let frames = cli.frames_per_tick.max(1);
    for tick in 0..cli.ticks {
        let target = start + Duration::from_seconds(tick as f64 * tick_period);
        let report = pipeline.tick(target);
        println!(
            "Tick {}: {}/{} propagated",
            tick,
            report.succeeded,
            report.total()
        );

        for _ in 0..frames {
            let frame = pipeline.advance_frame(tick_period / frames as f64);
            let visible = frame.positions.iter().filter(|p| p.is_some()).count();
            log::debug!("  t = {:.2}, {} visible", frame.fraction, visible);
        }
    }

    if let Some(name) = &cli.describe {
        let set = pipeline
            .find(name)
            .ok_or_else(|| anyhow!("No object matching {:?}", name))?
            .clone();
        println!("{}", pipeline.describe(&set, &start));

        match pipeline.sample_orbit_path(&set, &start) {
            Ok(path) => println!(
                "Orbit path: {} points over {}, closure gap {:.1} km",
                path.points.len(),
                format_duration(path.period_s),
                path.closure_gap_km()
            ),
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}
