//! Consumer-facing facade over the orbit data pipeline

use std::sync::Arc;

use satkit::Instant;

use crate::animation::{FramePositions, TickEngine};
use crate::config::PipelineConfig;
use crate::data::{
    self, CacheManager, CacheOutcome, CatalogStats, ElementSet, FileStore, HttpFetcher,
    SystemClock,
};
use crate::describe::{self, OrbitSummary};
use crate::error::Result;
use crate::propagation::{
    self, BatchReport, OrbitPath, PropagatedBatch, PropagationWorker, Propagator,
};
use crate::telemetry::{LogTelemetry, Telemetry};

/// Cache -> parser -> classifier -> engine -> adapter -> interpolation.
///
/// `tick` and `advance_frame` must be called sequentially; the animation
/// state is owned here and never shared.
pub struct OrbitPipeline {
    config: PipelineConfig,
    cache: CacheManager,
    propagator: Propagator,
    telemetry: Arc<dyn Telemetry>,
    engine: TickEngine,
    stats: CatalogStats,
}

impl OrbitPipeline {
    /// Pipeline fetching over HTTP and caching on disk
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let telemetry: Arc<dyn Telemetry> = Arc::new(LogTelemetry::new());
        let fetcher = HttpFetcher::new(config.upstream_url.clone(), config.http_timeout())?;
        let cache = CacheManager::new(
            Box::new(FileStore::new(config.cache_dir.clone())),
            Box::new(fetcher),
            Arc::new(SystemClock),
            Arc::clone(&telemetry),
            config.cache_key.clone(),
            config.cache_max_age(),
        );
        let propagator = Propagator::new()
            .with_telemetry(Arc::clone(&telemetry))
            .with_parallel_threshold(config.parallel_threshold);

        Self::with_parts(config, cache, propagator, telemetry)
    }

    /// Pipeline over injected collaborators
    pub fn with_parts(
        config: PipelineConfig,
        cache: CacheManager,
        propagator: Propagator,
        telemetry: Arc<dyn Telemetry>,
    ) -> Result<Self> {
        config.validate()?;
        let engine = TickEngine::new(
            Arc::from(Vec::new()),
            propagator.clone(),
            config.tick_period_secs,
        );

        Ok(Self {
            config,
            cache,
            propagator,
            telemetry,
            engine,
            stats: CatalogStats::default(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// Load (or reload) the catalog and restart the animation on it
    pub fn load_catalog(&mut self) -> Result<(&[ElementSet], CacheOutcome)> {
        let (sets, outcome) = data::load_catalog(&self.cache, self.telemetry.as_ref())?;
        self.stats = CatalogStats::from_sets(&sets);
        self.engine.replace_catalog(Arc::from(sets));
        let catalog: &[ElementSet] = self.engine.catalog();
        Ok((catalog, outcome))
    }

    pub fn catalog(&self) -> &[ElementSet] {
        self.engine.catalog()
    }

    pub fn stats(&self) -> CatalogStats {
        self.stats
    }

    /// Case-insensitive lookup; an exact name match wins over a substring match
    pub fn find(&self, name: &str) -> Option<&ElementSet> {
        let needle = name.trim().to_lowercase();
        let catalog = self.catalog();
        catalog
            .iter()
            .find(|set| set.name().to_lowercase() == needle)
            .or_else(|| {
                catalog
                    .iter()
                    .find(|set| set.name().to_lowercase().contains(&needle))
            })
    }

    /// Coarse tick: propagate the catalog to `target_time`
    pub fn tick(&mut self, target_time: Instant) -> &BatchReport {
        self.engine.on_tick(target_time)
    }

    /// Install a batch produced by [`spawn_worker`](Self::spawn_worker)
    pub fn apply_batch(&mut self, batch: PropagatedBatch) -> bool {
        self.engine.apply_batch(batch)
    }

    /// Per-frame interpolated positions, scene km, catalog order
    pub fn advance_frame(&mut self, delta_s: f64) -> FramePositions {
        self.engine.on_frame(delta_s)
    }

    /// Takes effect at the next tick
    pub fn set_tick_period(&mut self, tick_period_s: f64) {
        self.engine.set_tick_period(tick_period_s);
    }

    pub fn engine(&self) -> &TickEngine {
        &self.engine
    }

    /// Background worker propagating the current catalog
    pub fn spawn_worker(&self) -> PropagationWorker {
        PropagationWorker::spawn(self.propagator.clone(), Arc::clone(self.engine.catalog()))
    }

    /// One orbital period around `center_time`, or an error if any sample fails
    pub fn sample_orbit_path(&self, set: &ElementSet, center_time: &Instant) -> Result<OrbitPath> {
        propagation::sample_orbit(
            &self.propagator,
            set,
            center_time,
            self.config.orbit_path_samples,
        )
    }

    pub fn describe(&self, set: &ElementSet, at_time: &Instant) -> OrbitSummary {
        describe::describe(&self.propagator, set, at_time)
    }

    /// Tick engine for a single object, sharing this pipeline's propagator
    pub fn single_object_engine(&self, set: &ElementSet) -> TickEngine {
        TickEngine::single(set.clone(), self.propagator.clone(), self.config.tick_period_secs)
    }
}
