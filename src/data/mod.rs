//! Element set ingestion: fetching, caching, parsing and regime classification

pub mod cache;
pub(crate) mod element_set;
pub mod fetch;
mod loader;
pub mod regime;

pub use cache::{
    BlobMetadata, CacheManager, CacheOutcome, Clock, FileStore, KeyValueStore, ManualClock,
    MemoryStore, StoredBlob, SystemClock,
};
pub use element_set::{parse_element_sets, ElementLineError, ElementSet, Elements};
pub use fetch::{
    decode_payload, FileFetcher, HttpFetcher, StaticFetcher, UpstreamFetcher,
    CELESTRAK_ACTIVE_URL,
};
pub use loader::{load_catalog, CatalogStats};
pub use regime::{
    classify, classify_shape, OrbitShape, OrbitalRegime, EARTH_RADIUS_KM, MU_EARTH_KM3_S2,
    SECONDS_PER_DAY,
};
