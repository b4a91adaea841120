//! Two-tier tile cache.
//!
//! The in-memory table maps a tile URL to its [`TileState`]. A miss marks the
//! entry `Pending` and spawns a load that reads the optional persistent store,
//! falls back to the network, decodes, and reports a [`TileCompletion`] over a
//! channel. Completions are applied on the owning thread in
//! [`TileCache::drain_completions`], the only place an entry leaves `Pending`.
//!
//! Entries are never retried and never evicted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use fxhash::FxHashMap;

use super::loader::{PersistentStore, TileFetcher, TileImage};
use super::source::TileKey;
use crate::runtime::{spawn_on, AsyncSpawner};
use crate::Result;

/// Lifecycle of one cache entry
#[derive(Debug, Clone)]
pub enum TileState {
    Pending,
    Loaded(Arc<TileImage>),
    Failed,
}

impl TileState {
    pub fn is_pending(&self) -> bool {
        matches!(self, TileState::Pending)
    }
}

/// What a [`TileCache::request`] can hand back synchronously
#[derive(Debug, Clone)]
pub enum TileLookup {
    /// Decoded and ready to draw now
    Ready(Arc<TileImage>),
    /// A load is in flight; a completion will follow
    Deferred,
    /// The load failed earlier; this tile is never drawn
    Unavailable,
}

/// Message a finished load sends back to the cache owner
#[derive(Debug)]
pub struct TileCompletion {
    pub key: TileKey,
    /// Integer zoom that was active when the tile was requested
    pub captured_zoom: u8,
    pub outcome: Result<Arc<TileImage>>,
}

/// A completion after its entry transition has been applied
#[derive(Debug, Clone)]
pub struct SettledTile {
    pub key: TileKey,
    pub captured_zoom: u8,
    /// `None` when the load failed
    pub image: Option<Arc<TileImage>>,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub pending: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Loads that went to the network
    pub network_fetches: usize,
    /// Loads served from the persistent store
    pub store_hits: usize,
}

#[derive(Debug, Default)]
struct LoadCounters {
    network_fetches: AtomicUsize,
    store_hits: AtomicUsize,
}

/// Owner of the tile table; one per map view
pub struct TileCache {
    entries: FxHashMap<String, TileState>,
    fetcher: Arc<dyn TileFetcher>,
    store: Option<Arc<dyn PersistentStore>>,
    spawner: Arc<dyn AsyncSpawner>,
    completion_tx: Sender<TileCompletion>,
    completion_rx: Receiver<TileCompletion>,
    counters: Arc<LoadCounters>,
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("entries", &self.entries.len())
            .field("store", &self.store.is_some())
            .field("stats", &self.stats())
            .finish()
    }
}

impl TileCache {
    pub fn new(fetcher: Arc<dyn TileFetcher>, spawner: Arc<dyn AsyncSpawner>) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        Self {
            entries: FxHashMap::default(),
            fetcher,
            store: None,
            spawner,
            completion_tx,
            completion_rx,
            counters: Arc::new(LoadCounters::default()),
        }
    }

    /// Adds the persistent byte tier (read-through and write-through)
    pub fn with_store(mut self, store: Option<Arc<dyn PersistentStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Looks up `key`, starting a load on first sight.
    ///
    /// `captured_zoom` travels with the load so the consumer can discard a
    /// paint that no longer matches the camera. A key that is already
    /// pending does not start a second load.
    pub fn request(&mut self, key: &TileKey, captured_zoom: u8) -> TileLookup {
        let url = key.url();
        match self.entries.get(&url) {
            Some(TileState::Loaded(image)) => return TileLookup::Ready(image.clone()),
            Some(TileState::Failed) => return TileLookup::Unavailable,
            Some(TileState::Pending) => return TileLookup::Deferred,
            None => {}
        }

        self.entries.insert(url.clone(), TileState::Pending);
        self.spawn_load(key.clone(), url, captured_zoom);
        TileLookup::Deferred
    }

    fn spawn_load(&self, key: TileKey, url: String, captured_zoom: u8) {
        let fetcher = self.fetcher.clone();
        let store = self.store.clone();
        let counters = self.counters.clone();
        let tx = self.completion_tx.clone();

        log::debug!("loading tile {url} (zoom {captured_zoom})");
        spawn_on(self.spawner.as_ref(), async move {
            let (outcome, fresh_bytes) =
                load_tile(&url, fetcher.as_ref(), store.as_deref(), &counters).await;
            if tx
                .send(TileCompletion {
                    key,
                    captured_zoom,
                    outcome,
                })
                .is_err()
            {
                log::debug!("tile cache dropped before {url} completed");
            }

            // Network bytes go to the store only after the tile is delivered
            if let (Some(store), Some(bytes)) = (store, fresh_bytes) {
                if let Err(e) = store.put(&url, bytes).await {
                    log::warn!("failed to persist {url}: {e}");
                }
            }
        });
    }

    /// Applies every completion received so far.
    ///
    /// Each entry moves from `Pending` to `Loaded` or `Failed` exactly once; a
    /// completion for an entry that has already settled is discarded.
    pub fn drain_completions(&mut self) -> Vec<SettledTile> {
        let mut settled = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            if let Some(tile) = self.apply(completion) {
                settled.push(tile);
            }
        }
        settled
    }

    /// Like [`Self::drain_completions`], but waits up to `timeout` for the
    /// first completion when none has arrived yet
    pub fn wait_completions(&mut self, timeout: Duration) -> Vec<SettledTile> {
        match self.completion_rx.recv_timeout(timeout) {
            Ok(completion) => {
                let mut settled: Vec<_> = self.apply(completion).into_iter().collect();
                settled.extend(self.drain_completions());
                settled
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Vec::new(),
        }
    }

    fn apply(&mut self, completion: TileCompletion) -> Option<SettledTile> {
        let url = completion.key.url();
        let entry = match self.entries.get_mut(&url) {
            Some(entry) if entry.is_pending() => entry,
            _ => {
                log::warn!("ignoring duplicate completion for {url}");
                return None;
            }
        };

        let image = match completion.outcome {
            Ok(image) => {
                log::debug!("tile {url} loaded");
                *entry = TileState::Loaded(image.clone());
                Some(image)
            }
            Err(e) => {
                log::warn!("tile {url} failed: {e}");
                *entry = TileState::Failed;
                None
            }
        };

        Some(SettledTile {
            key: completion.key,
            captured_zoom: completion.captured_zoom,
            image,
        })
    }

    pub fn state(&self, key: &TileKey) -> Option<&TileState> {
        self.entries.get(&key.url())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any load has not been applied yet
    pub fn has_pending(&self) -> bool {
        self.entries.values().any(TileState::is_pending)
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            network_fetches: self.counters.network_fetches.load(Ordering::Relaxed),
            store_hits: self.counters.store_hits.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        for state in self.entries.values() {
            match state {
                TileState::Pending => stats.pending += 1,
                TileState::Loaded(_) => stats.loaded += 1,
                TileState::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

/// Resolves one tile. Returns the decoded image plus, for network loads, the
/// raw bytes to persist.
async fn load_tile(
    url: &str,
    fetcher: &dyn TileFetcher,
    store: Option<&dyn PersistentStore>,
    counters: &LoadCounters,
) -> (Result<Arc<TileImage>>, Option<Vec<u8>>) {
    if let Some(store) = store {
        match store.get(url).await {
            Ok(Some(bytes)) => match TileImage::decode(&bytes) {
                Ok(image) => {
                    counters.store_hits.fetch_add(1, Ordering::Relaxed);
                    log::debug!("tile {url} served from store");
                    return (Ok(Arc::new(image)), None);
                }
                Err(e) => log::warn!("stored tile {url} is unreadable, refetching: {e}"),
            },
            Ok(None) => {}
            Err(e) => log::warn!("tile store unavailable for {url}: {e}"),
        }
    }

    counters.network_fetches.fetch_add(1, Ordering::Relaxed);
    let bytes = match fetcher.fetch(url).await {
        Ok(bytes) => bytes,
        Err(e) => return (Err(e), None),
    };
    match TileImage::decode(&bytes) {
        Ok(image) => (Ok(Arc::new(image)), Some(bytes)),
        Err(e) => (Err(e), None),
    }
}
