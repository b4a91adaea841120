pub mod cache;
pub mod loader;
pub mod source;
pub mod spiral;

// Re-exports for convenience
pub use cache::{CacheStats, SettledTile, TileCache, TileCompletion, TileLookup, TileState};
pub use loader::{HttpFetcher, MemoryStore, PersistentStore, TileFetcher, TileImage};
pub use source::{TileKey, XyzServer};
pub use spiral::{spiral, Spiral, ViewportCell};
