#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use offline_map::prelude::*;
use offline_map::tiles::TileFetcher;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A solid `size` x `size` PNG
pub fn png_bytes(size: u32, color: [u8; 4]) -> Vec<u8> {
    let pixels = RgbaImage::from_pixel(size, size, Rgba(color));
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(pixels.as_raw(), size, size, ColorType::Rgba8)
        .unwrap();
    out
}

/// Serves a solid tile for every URL, optionally after a delay
pub struct TestFetcher {
    body: Vec<u8>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl TestFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::with_delay(None))
    }

    pub fn with_delay(delay: Option<Duration>) -> Self {
        Self {
            body: png_bytes(256, [30, 120, 60, 255]),
            delay,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    /// Fetched URLs for one zoom level
    pub fn urls_at_zoom(&self, zoom: u8) -> Vec<String> {
        let marker = format!("/{zoom}/");
        self.urls()
            .into_iter()
            .filter(|url| url.contains(&marker))
            .collect()
    }
}

#[async_trait]
impl TileFetcher for TestFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.body.clone())
    }
}

/// A map at downtown Vancouver, zoom 12, driven by a queued spawner
pub fn queued_map(fetcher: Arc<TestFetcher>) -> (MapView, Arc<QueuedSpawner>) {
    let spawner = Arc::new(QueuedSpawner::new());
    let map = MapBuilder::new()
        .with_center(LatLng::new(49.2827, -123.1207))
        .with_zoom(12)
        .with_map_server("http://tiles.test")
        .with_fetcher(fetcher)
        .with_spawner(spawner.clone())
        .build()
        .unwrap();
    (map, spawner)
}

pub fn ms(start: Instant, millis: u64) -> Instant {
    start + Duration::from_millis(millis)
}
