use serde::{Deserialize, Serialize};

use crate::core::constants::DEFAULT_MAP_SERVER;
use crate::core::geo::TileCoord;

/// A `{z}/{x}/{y}.png` raster server rooted at `base`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XyzServer {
    base: String,
}

impl XyzServer {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL of the tile at `coord`
    pub fn url(&self, coord: TileCoord) -> String {
        self.key(coord).url()
    }

    /// Key for `coord` on this server
    pub fn key(&self, coord: TileCoord) -> TileKey {
        TileKey {
            server: self.base.clone(),
            coord,
        }
    }
}

impl Default for XyzServer {
    fn default() -> Self {
        Self::new(DEFAULT_MAP_SERVER)
    }
}

/// Uniquely identifies one raster tile; its URL is the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub server: String,
    pub coord: TileCoord,
}

impl TileKey {
    pub fn new(server: &XyzServer, coord: TileCoord) -> Self {
        server.key(coord)
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}/{}.png",
            self.server, self.coord.z, self.coord.x, self.coord.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_url() {
        let server = XyzServer::default();
        assert_eq!(
            server.url(TileCoord::new(647, 1401, 12)),
            "https://tile.openstreetmap.org/12/647/1401.png"
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let server = XyzServer::new("http://localhost:8080/tiles/");
        let key = server.key(TileCoord::new(1, 2, 3));
        assert_eq!(key.url(), "http://localhost:8080/tiles/3/1/2.png");
        assert_eq!(key.url(), server.url(key.coord));
    }
}
