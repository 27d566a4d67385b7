//! Catalog loading: cache -> parser -> regime classifier

use super::{parse_element_sets, CacheManager, CacheOutcome, ElementSet, OrbitalRegime};
use crate::error::Result;
use crate::telemetry::Telemetry;

/// Load and parse the catalog, going to the upstream mirror only when the
/// cached copy is absent, stale or corrupt.
pub fn load_catalog(
    cache: &CacheManager,
    telemetry: &dyn Telemetry,
) -> Result<(Vec<ElementSet>, CacheOutcome)> {
    const SPAN: &str = "Loaded element sets";
    telemetry.start(SPAN);

    let result = cache.load_with(|text| {
        const PARSE_SPAN: &str = "Parsed element sets";
        telemetry.start(PARSE_SPAN);
        let sets = parse_element_sets(text);
        telemetry.end(PARSE_SPAN);
        sets
    });
    telemetry.end(SPAN);

    match result {
        Ok((sets, outcome)) => {
            let stats = CatalogStats::from_sets(&sets);
            log::info!("Ingested {} element sets ({:?}): {}", sets.len(), outcome, stats);
            Ok((sets, outcome))
        }
        Err(e) => {
            telemetry.error(&format!("Catalog unavailable: {}", e));
            Err(e)
        }
    }
}

/// Object counts per regime
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_objects: usize,
    pub low_earth_orbit: usize,
    pub medium_earth_orbit: usize,
    pub geostationary: usize,
    pub other: usize,
}

impl CatalogStats {
    pub fn from_sets(sets: &[ElementSet]) -> Self {
        let mut stats = Self::default();
        stats.total_objects = sets.len();

        for set in sets {
            match set.regime() {
                OrbitalRegime::LowEarthOrbit => stats.low_earth_orbit += 1,
                OrbitalRegime::MediumEarthOrbit => stats.medium_earth_orbit += 1,
                OrbitalRegime::Geostationary => stats.geostationary += 1,
                OrbitalRegime::Other => stats.other += 1,
            }
        }

        stats
    }

    pub fn count(&self, regime: OrbitalRegime) -> usize {
        match regime {
            OrbitalRegime::LowEarthOrbit => self.low_earth_orbit,
            OrbitalRegime::MediumEarthOrbit => self.medium_earth_orbit,
            OrbitalRegime::Geostationary => self.geostationary,
            OrbitalRegime::Other => self.other,
        }
    }
}

impl std::fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} LEO, {} MEO, {} GEO, {} other",
            self.low_earth_orbit, self.medium_earth_orbit, self.geostationary, self.other
        )
    }
}
