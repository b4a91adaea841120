use std::sync::Arc;

use crate::{
    core::{
        camera::Camera,
        config::{ConfigOverrides, MapConfig, MapElement, MapLine, MapProps},
        geo::LatLng,
        map::MapView,
    },
    runtime::{default_spawner, AsyncSpawner},
    tiles::{HttpFetcher, PersistentStore, TileCache, TileFetcher},
    Result,
};

/// Builder for creating map views with a fluent API
pub struct MapBuilder<P = ()> {
    props: MapProps<P>,
    config: MapConfig,
    overrides: ConfigOverrides,
    fetcher: Option<Arc<dyn TileFetcher>>,
    spawner: Option<Arc<dyn AsyncSpawner>>,
    store: Option<Arc<dyn PersistentStore>>,
}

impl MapBuilder<()> {
    /// Create a new map builder with default props and configuration
    pub fn new() -> Self {
        Self {
            props: MapProps::default(),
            config: MapConfig::default(),
            overrides: ConfigOverrides::default(),
            fetcher: None,
            spawner: None,
            store: None,
        }
    }
}

impl Default for MapBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> MapBuilder<P> {
    /// Set the initial camera center
    pub fn with_center(mut self, center: LatLng) -> Self {
        self.props.latitude = center.lat;
        self.props.longitude = center.lng;
        self
    }

    /// Set the initial integer zoom
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.props.zoom = zoom;
        self
    }

    /// Replace the camera props and overlays wholesale
    pub fn with_props<Q>(self, props: MapProps<Q>) -> MapBuilder<Q> {
        MapBuilder {
            props,
            config: self.config,
            overrides: self.overrides,
            fetcher: self.fetcher,
            spawner: self.spawner,
            store: self.store,
        }
    }

    /// Set the markers; their payload type becomes the map's payload type
    pub fn with_elements<Q>(self, elements: Vec<MapElement<Q>>) -> MapBuilder<Q> {
        MapBuilder {
            props: MapProps {
                latitude: self.props.latitude,
                longitude: self.props.longitude,
                zoom: self.props.zoom,
                map_elements: elements,
                map_lines: self.props.map_lines,
            },
            config: self.config,
            overrides: self.overrides,
            fetcher: self.fetcher,
            spawner: self.spawner,
            store: self.store,
        }
    }

    pub fn with_lines(mut self, lines: Vec<MapLine>) -> Self {
        self.props.map_lines = lines;
        self
    }

    /// Set the base configuration
    pub fn with_config(mut self, config: MapConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides applied on top of the base configuration at build time
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_map_server(mut self, server: impl Into<String>) -> Self {
        self.overrides.map_server = Some(server.into());
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn TileFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_spawner(mut self, spawner: Arc<dyn AsyncSpawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Persistent tile store, used when `use_offline_cache` is on
    pub fn with_store(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the map view
    pub fn build(self) -> Result<MapView<P>> {
        let config = self.config.merged(&self.overrides);
        config.validate()?;

        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => default_spawner()?,
        };
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpFetcher) as Arc<dyn TileFetcher>);
        let store = if config.use_offline_cache {
            self.store
        } else {
            None
        };
        let cache = TileCache::new(fetcher, spawner).with_store(store);

        let camera = Camera::new(
            LatLng::new(self.props.latitude, self.props.longitude),
            self.props.zoom,
        )
        .with_pan_scale(config.interaction.pan_scale);

        log::debug!(
            "building map at {}, server {}",
            camera.coordinate_readout(),
            config.map_server
        );
        Ok(MapView::new(
            camera,
            config,
            cache,
            self.props.map_lines,
            self.props.map_elements,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::QueuedSpawner;
    use crate::tiles::{test_utils::FakeFetcher, MemoryStore};
    use crate::MapError;

    fn builder() -> MapBuilder {
        MapBuilder::new()
            .with_fetcher(Arc::new(FakeFetcher::new()))
            .with_spawner(Arc::new(QueuedSpawner::new()))
    }

    #[test]
    fn test_default_props() {
        let map = builder().build().unwrap();
        assert_eq!(map.camera().coordinate_readout(), "49.2827, -123.1207, 12");
        assert!(map.config().show_center);
        assert!(map.elements().is_empty());
    }

    #[test]
    fn test_props_are_clamped() {
        let map = builder()
            .with_center(LatLng::new(-95.0, 200.0))
            .with_zoom(25)
            .build()
            .unwrap();
        assert_eq!(map.camera().latitude(), -85.0);
        assert_eq!(map.camera().longitude(), 180.0);
        assert_eq!(map.camera().zoom(), 18);
    }

    #[test]
    fn test_elements_change_payload_type() {
        let map: MapView<&str> = builder()
            .with_elements(vec![MapElement::new(LatLng::new(49.0, -123.0), "pin")])
            .build()
            .unwrap();
        assert_eq!(map.elements()[0].payload, "pin");
    }

    #[test]
    fn test_props_and_config_wholesale() {
        let mut config = MapConfig::default();
        config.show_center = false;
        let props = MapProps {
            latitude: -33.8688,
            longitude: 151.2093,
            zoom: 9,
            map_elements: vec![MapElement::new(LatLng::new(-33.87, 151.21), 7_u32)],
            map_lines: Vec::new(),
        };

        let map = builder()
            .with_config(config)
            .with_props(props)
            .with_map_server("http://tiles.test/")
            .build()
            .unwrap();
        assert_eq!(map.camera().zoom(), 9);
        assert_eq!(map.elements()[0].payload, 7);
        assert!(!map.config().show_center);
        assert_eq!(map.config().map_server, "http://tiles.test/");
    }

    #[test]
    fn test_store_respects_offline_flag() {
        let store = Arc::new(MemoryStore::open("tiles"));
        let map = builder().with_store(store.clone()).build().unwrap();
        assert!(map.cache().has_store());

        let map = builder()
            .with_store(store)
            .with_overrides(ConfigOverrides {
                use_offline_cache: Some(false),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert!(!map.cache().has_store());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = builder().with_map_server("").build();
        assert!(matches!(result, Err(MapError::Config(_))));
    }

    #[cfg(feature = "tokio-runtime")]
    #[test]
    fn test_default_spawner_needs_runtime() {
        let result = MapBuilder::new()
            .with_fetcher(Arc::new(FakeFetcher::new()))
            .build();
        assert!(matches!(result, Err(MapError::Runtime(_))));
    }
}
