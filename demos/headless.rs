//! Renders a map offscreen: mounts a view, drags it, zooms in with the wheel,
//! waits for tiles and writes the result to a PNG.
//!
//! ```text
//! RUST_LOG=offline_map=debug cargo run --example headless -- out.png
//! ```

use anyhow::Context;
use offline_map::prelude::*;

const CANVAS: Size = Size {
    width: 1024,
    height: 768,
};

/// Paints finished loads until nothing is pending or `budget` runs out
fn settle(map: &mut MapView, surface: &mut RasterSurface, budget: Duration) -> TilePoll {
    let deadline = Instant::now() + budget;
    let mut total = TilePoll::default();
    while map.cache().has_pending() && Instant::now() < deadline {
        // Loads run on the other workers while this one waits on the channel
        let poll = tokio::task::block_in_place(|| {
            map.wait_tiles(surface, Duration::from_millis(50))
        });
        total.painted += poll.painted;
        total.suppressed += poll.suppressed;
        total.failed += poll.failed;
    }
    total
}

/// Feeds queued events through the map until the wheel debounce has fired
async fn run_gesture(map: &mut MapView, surface: &mut RasterSurface, events: Vec<InputEvent>) {
    for event in events {
        map.queue_event(event);
    }
    map.process_events(surface, Instant::now());
    while let Some(deadline) = map.next_deadline() {
        tokio::time::sleep(deadline.saturating_duration_since(Instant::now())).await;
        map.process_events(surface, Instant::now());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "offline-map.png".to_string());

    let store = Arc::new(MemoryStore::open("headless"));
    let mut map = MapBuilder::new()
        .with_center(LatLng::new(49.2827, -123.1207))
        .with_zoom(12)
        .with_lines(vec![MapLine::new(vec![
            LatLng::new(49.2827, -123.1207),
            LatLng::new(49.2609, -123.1139),
            LatLng::new(49.2488, -123.0016),
        ])
        .with_color(Color::from_hex("#1f6feb")?)])
        .with_fetcher(Arc::new(HttpFetcher))
        .with_store(store.clone())
        .build()
        .context("building map")?;

    let mut surface = RasterSurface::new(CANVAS);
    let frame = map.mount(&mut surface, CANVAS);
    println!(
        "mounted at {} ({} tiles requested)",
        map.camera().coordinate_readout(),
        frame.requested
    );
    let poll = settle(&mut map, &mut surface, Duration::from_secs(10));
    println!("painted {} tiles, {} failed", poll.painted, poll.failed);

    run_gesture(
        &mut map,
        &mut surface,
        vec![
            InputEvent::pointer_down(512.0, 384.0),
            InputEvent::pointer_move(452.0, 404.0),
            InputEvent::PointerUp,
        ],
    )
    .await;

    run_gesture(
        &mut map,
        &mut surface,
        vec![InputEvent::wheel(-120.0), InputEvent::wheel(-120.0)],
    )
    .await;
    let poll = settle(&mut map, &mut surface, Duration::from_secs(10));
    println!(
        "now at {}: painted {}, dropped {} stale",
        map.camera().coordinate_readout(),
        poll.painted,
        poll.suppressed
    );

    let stats = map.cache().stats();
    println!(
        "cache: {} loaded, {} failed, {} network fetches, {} in store",
        stats.loaded,
        stats.failed,
        stats.network_fetches,
        store.len()
    );

    surface
        .save(&output)
        .with_context(|| format!("writing {output}"))?;
    println!("wrote {output}");
    Ok(())
}
