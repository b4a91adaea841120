//! Collaborators a tile load talks to: the network fetcher, the persistent
//! byte store, and the decoder producing [`TileImage`]s.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fxhash::FxHashMap;
use image::RgbaImage;
use once_cell::sync::Lazy;

use crate::{MapError, Result};

/// Shared async HTTP client for tile fetching. Public tile servers reject
/// requests without a User-Agent.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("offline-map/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to a default HTTP client: {e}");
            reqwest::Client::new()
        })
});

/// Fetches the raw bytes behind a tile URL
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`TileFetcher`] over HTTP(S)
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

#[async_trait]
impl TileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("fetching tile {url}");
        let response = HTTP_CLIENT.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MapError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        let data = response.bytes().await?.to_vec();
        log::debug!("downloaded {url} ({} bytes)", data.len());
        Ok(data)
    }
}

/// Byte-level tile storage keyed by URL that outlives a session
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Stored bytes for `url`, `None` on a miss
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, url: &str, bytes: Vec<u8>) -> Result<()>;
}

/// In-process [`PersistentStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    name: String,
    entries: Mutex<FxHashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn open(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(url))
            .unwrap_or(false)
    }

    fn poisoned(&self) -> MapError {
        MapError::Store(format!("store '{}' lock poisoned", self.name))
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.lock().map_err(|_| self.poisoned())?;
        Ok(entries.get(url).cloned())
    }

    async fn put(&self, url: &str, bytes: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| self.poisoned())?;
        entries.insert(url.to_string(), bytes);
        Ok(())
    }
}

/// A decoded tile ready to composite
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    pixels: RgbaImage,
}

impl TileImage {
    /// Decodes PNG or JPEG bytes, guessing the format from the content
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self { pixels })
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Natural width in pixels
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Natural height in pixels
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::test_utils::png_bytes;

    #[test]
    fn test_decode_png() {
        let image = TileImage::decode(&png_bytes(256, [10, 20, 30, 255])).unwrap();
        assert_eq!((image.width(), image.height()), (256, 256));
        assert_eq!(image.pixels().get_pixel(3, 7).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            TileImage::decode(b"not an image"),
            Err(MapError::Image(_))
        ));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::open("tiles");
        futures::executor::block_on(async {
            assert_eq!(store.get("a").await.unwrap(), None);
            store.put("a", vec![1, 2, 3]).await.unwrap();
            assert_eq!(store.get("a").await.unwrap(), Some(vec![1, 2, 3]));
        });
        assert!(store.contains("a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.name(), "tiles");
    }
}
