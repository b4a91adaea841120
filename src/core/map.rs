use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::{
    core::{
        camera::Camera,
        config::{MapConfig, MapElement, MapLine},
        geo::Size,
    },
    input::{Action, InputController, InputEvent, ViewState},
    rendering::{FrameReport, MarkerPlacement, Renderer, Surface},
    tiles::{SettledTile, TileCache},
};

/// What happened to the completions drained by [`MapView::poll_tiles`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TilePoll {
    /// Late tiles painted onto the surface
    pub painted: usize,
    /// Loaded tiles dropped because the zoom changed since their request
    pub suppressed: usize,
    pub failed: usize,
}

/// One map widget instance.
///
/// Owns the camera, the input controller, the tile cache and the renderer.
/// Events are queued and applied on the owning thread; any change to the view
/// marks the map dirty and the next [`process_events`](MapView::process_events)
/// draws a frame.
pub struct MapView<P = ()> {
    camera: Camera,
    input: InputController,
    cache: TileCache,
    renderer: Renderer,
    config: MapConfig,
    lines: Vec<MapLine>,
    elements: Vec<MapElement<P>>,
    events: VecDeque<InputEvent>,
    needs_render: bool,
    last_frame: Option<FrameReport>,
}

impl<P> std::fmt::Debug for MapView<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapView")
            .field("camera", &self.camera)
            .field("canvas", &self.renderer.canvas())
            .field("cache", &self.cache)
            .field("queued_events", &self.events.len())
            .field("needs_render", &self.needs_render)
            .finish()
    }
}

impl<P> MapView<P> {
    pub fn new(
        camera: Camera,
        config: MapConfig,
        cache: TileCache,
        lines: Vec<MapLine>,
        elements: Vec<MapElement<P>>,
    ) -> Self {
        Self {
            input: InputController::new(&config.interaction),
            renderer: Renderer::new(&config),
            camera,
            cache,
            config,
            lines,
            elements,
            events: VecDeque::new(),
            needs_render: true,
            last_frame: None,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn lines(&self) -> &[MapLine] {
        &self.lines
    }

    pub fn elements(&self) -> &[MapElement<P>] {
        &self.elements
    }

    pub fn last_frame(&self) -> Option<&FrameReport> {
        self.last_frame.as_ref()
    }

    /// Whether the next [`process_events`](Self::process_events) will draw
    pub fn needs_render(&self) -> bool {
        self.needs_render
    }

    /// Snapshot of camera and interaction state
    pub fn view_state(&self) -> ViewState {
        ViewState::new(self.camera.clone(), self.input.clone())
    }

    /// Sizes the canvas to `container` and draws the first frame
    pub fn mount(&mut self, surface: &mut dyn Surface, container: Size) -> FrameReport {
        self.renderer.resize(container);
        self.render(surface)
    }

    /// Appends an event for the next [`process_events`](Self::process_events)
    pub fn queue_event(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Applies one event immediately
    pub fn handle_event(&mut self, event: InputEvent, now: Instant) -> Vec<Action> {
        let actions = self.input.handle_event(&mut self.camera, event, now);
        self.apply(&actions);
        actions
    }

    /// Fires the wheel debounce if it is due
    pub fn tick(&mut self, now: Instant) -> Vec<Action> {
        let actions = self.input.tick(&mut self.camera, now);
        self.apply(&actions);
        actions
    }

    fn apply(&mut self, actions: &[Action]) {
        for action in actions {
            match action {
                Action::Redraw => self.needs_render = true,
                Action::ZoomCommitted { zoom } => {
                    log::info!("zoom committed at {zoom}");
                    self.needs_render = true;
                }
                Action::Resize(size) => {
                    let canvas = self.renderer.resize(*size);
                    log::debug!("canvas resized to {}x{}", canvas.width, canvas.height);
                    self.needs_render = true;
                }
            }
        }
    }

    /// Drains queued events, fires a due debounce, draws a frame if anything
    /// changed, then paints whatever tiles have arrived
    pub fn process_events(&mut self, surface: &mut dyn Surface, now: Instant) -> Option<FrameReport> {
        while let Some(event) = self.events.pop_front() {
            self.handle_event(event, now);
        }
        self.tick(now);

        let frame = self.needs_render.then(|| self.render(surface));
        self.poll_tiles(surface);
        frame
    }

    /// Draws a full frame unconditionally
    pub fn render(&mut self, surface: &mut dyn Surface) -> FrameReport {
        let report = self.renderer.render(
            surface,
            &self.camera,
            &mut self.cache,
            &self.config,
            &self.lines,
            &self.elements,
        );
        self.needs_render = false;
        self.last_frame = Some(report.clone());
        report
    }

    /// Applies finished loads and paints those still matching the camera's
    /// zoom. Overlays are redrawn on top of any late paint.
    pub fn poll_tiles(&mut self, surface: &mut dyn Surface) -> TilePoll {
        let settled = self.cache.drain_completions();
        self.paint_settled(surface, settled)
    }

    /// Like [`poll_tiles`](Self::poll_tiles), but blocks up to `timeout` for
    /// the first completion when none has arrived yet
    pub fn wait_tiles(&mut self, surface: &mut dyn Surface, timeout: Duration) -> TilePoll {
        let settled = self.cache.wait_completions(timeout);
        self.paint_settled(surface, settled)
    }

    fn paint_settled(&self, surface: &mut dyn Surface, settled: Vec<SettledTile>) -> TilePoll {
        let mut poll = TilePoll::default();
        for tile in settled {
            let Some(image) = tile.image else {
                poll.failed += 1;
                continue;
            };
            if tile.captured_zoom != self.camera.zoom() {
                log::debug!(
                    "dropping paint of {} requested at zoom {} (now {})",
                    tile.key.url(),
                    tile.captured_zoom,
                    self.camera.zoom()
                );
                poll.suppressed += 1;
                continue;
            }
            self.renderer
                .paint_tile(surface, &self.camera, &self.config, tile.key.coord, &image);
            poll.painted += 1;
        }

        if poll.painted > 0 {
            let geometry = self.renderer.geometry(&self.camera);
            self.renderer
                .draw_overlays(surface, &geometry, &self.config, &self.lines);
        }
        poll
    }

    pub fn set_lines(&mut self, lines: Vec<MapLine>) {
        self.lines = lines;
        self.needs_render = true;
    }

    /// Replaces the markers; they are positioned on the next frame
    pub fn set_elements(&mut self, elements: Vec<MapElement<P>>) {
        self.elements = elements;
    }

    /// Current canvas position of every visible marker
    pub fn marker_positions(&self) -> Vec<MarkerPlacement> {
        let geometry = self.renderer.geometry(&self.camera);
        self.renderer.place_markers(&geometry, &self.elements)
    }

    /// Jumps to `zoom`, discarding any wheel gesture in flight. Out-of-range
    /// levels are ignored.
    pub fn set_zoom_immediate(&mut self, zoom: u8) -> bool {
        self.input.cancel_zoom();
        let applied = self.camera.set_zoom_immediate(zoom);
        if applied {
            self.needs_render = true;
        }
        applied
    }

    /// When the host should next call [`tick`](Self::tick)
    pub fn next_deadline(&self) -> Option<Instant> {
        self.input.next_deadline()
    }
}
