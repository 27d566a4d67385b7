//! Upstream sources for raw element set text

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

/// CelesTrak "active" group in three-line TLE format
pub const CELESTRAK_ACTIVE_URL: &str =
    "https://celestrak.org/NORAD/elements/gp.php?GROUP=active&FORMAT=tle";

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Produces the raw feed text on a cache miss
pub trait UpstreamFetcher: Send + Sync {
    fn fetch_raw_text(&self) -> Result<String>;
}

/// HTTP GET against a fixed endpoint
pub struct HttpFetcher {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::FetchFailed(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl UpstreamFetcher for HttpFetcher {
    fn fetch_raw_text(&self) -> Result<String> {
        log::info!("Fetching element sets from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| Error::FetchFailed(format!("{}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::FetchFailed(format!(
                "{} returned status {}",
                self.url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| Error::FetchFailed(format!("Failed to read response: {}", e)))?;
        decode_payload(&bytes)
    }
}

/// Reads a local catalog file, plain or gzipped
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UpstreamFetcher for FileFetcher {
    fn fetch_raw_text(&self) -> Result<String> {
        let bytes = fs::read(&self.path)
            .map_err(|e| Error::FetchFailed(format!("{:?}: {}", self.path, e)))?;
        decode_payload(&bytes)
    }
}

/// Serves a fixed text, for embedded catalogs
pub struct StaticFetcher {
    text: String,
}

impl StaticFetcher {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl UpstreamFetcher for StaticFetcher {
    fn fetch_raw_text(&self) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// Decode a feed payload to text, inflating it first if it is gzipped.
///
/// The mirror serves `active.txt.gz`; depending on the transport the
/// body may or may not already be inflated.
pub fn decode_payload(bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(bytes)
            .read_to_string(&mut text)
            .map_err(|e| Error::FetchFailed(format!("Failed to decompress payload: {}", e)))?;
        return Ok(text);
    }

    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::FetchFailed("payload is neither gzip nor UTF-8 text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::element_set::tests::ISS;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_plain_and_gzip() {
        assert_eq!(decode_payload(ISS.as_bytes()).unwrap(), ISS);
        assert_eq!(decode_payload(&gzip(ISS)).unwrap(), ISS);
    }

    #[test]
    fn test_decode_rejects_binary() {
        assert!(matches!(
            decode_payload(&[0x00, 0xff, 0xfe]),
            Err(Error::FetchFailed(_))
        ));
        // Gzip magic with a truncated stream
        assert!(matches!(
            decode_payload(&[0x1F, 0x8B, 0x08]),
            Err(Error::FetchFailed(_))
        ));
    }

    #[test]
    fn test_file_fetcher() {
        let path = std::env::temp_dir().join(format!("orbitcast-fetch-{}.txt.gz", std::process::id()));
        fs::write(&path, gzip(ISS)).unwrap();
        assert_eq!(FileFetcher::new(&path).fetch_raw_text().unwrap(), ISS);
        let _ = fs::remove_file(&path);

        let missing = FileFetcher::new("/nonexistent/orbitcast/catalog.txt");
        assert!(matches!(missing.fetch_raw_text(), Err(Error::FetchFailed(_))));
    }
}
