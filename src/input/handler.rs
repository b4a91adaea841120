use std::time::Instant;

use crate::{
    core::{
        camera::{Camera, WheelAccumulator},
        config::InteractionConfig,
        geo::{Point, Size},
    },
    input::{debounce::Debouncer, events::InputEvent},
};

/// What the owner of a camera must do after an input transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// The camera moved or rescaled; draw a new frame
    Redraw,
    /// A debounced wheel gesture settled on an integer zoom
    ZoomCommitted { zoom: u8 },
    /// The container changed size
    Resize(Size),
}

/// Last pointer position while the primary button is held
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub last: Point,
}

/// Turns pointer and wheel events into camera mutations.
///
/// Pointers move between idle and dragging. The wheel updates the camera's
/// fractional zoom immediately and schedules a debounced integer commit; only
/// the value pending when the quiet period ends is committed.
#[derive(Debug, Clone)]
pub struct InputController {
    pub enabled: bool,
    drag: Option<DragState>,
    wheel: WheelAccumulator,
    debouncer: Debouncer<u8>,
}

impl InputController {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            enabled: true,
            drag: None,
            wheel: WheelAccumulator::new(config.wheel_zoom_divisor),
            debouncer: Debouncer::new(config.zoom_debounce()),
        }
    }

    /// Handle one input event against `camera` at time `now`
    pub fn handle_event(&mut self, camera: &mut Camera, event: InputEvent, now: Instant) -> Vec<Action> {
        // An overdue commit belongs to the previous gesture
        let mut actions = self.tick(camera, now);
        if !self.enabled {
            return actions;
        }

        match event {
            InputEvent::PointerDown { position } | InputEvent::PointerMove { position }
                if !position.x.is_finite() || !position.y.is_finite() =>
            {
                log::debug!("ignoring pointer event at non-finite {position:?}");
            }
            InputEvent::PointerDown { position } => {
                self.drag = Some(DragState { last: position });
            }
            InputEvent::PointerMove { position } => {
                if let Some(drag) = self.drag.as_mut() {
                    let delta = position.subtract(&drag.last);
                    drag.last = position;
                    camera.pan(delta.x, delta.y);
                    actions.push(Action::Redraw);
                }
            }
            InputEvent::PointerUp => {
                self.drag = None;
            }
            InputEvent::Wheel { delta } => {
                if !self.debouncer.is_pending() {
                    self.wheel.begin(camera.fractional_zoom());
                }
                if let Some(zoom) = camera.zoom_by(&mut self.wheel, delta) {
                    self.debouncer.schedule(zoom, now);
                    actions.push(Action::Redraw);
                }
            }
            InputEvent::Resize { size } => {
                actions.push(Action::Resize(size));
            }
        }

        actions
    }

    /// Commits the pending wheel zoom once its quiet period has elapsed
    pub fn tick(&mut self, camera: &mut Camera, now: Instant) -> Vec<Action> {
        let Some(zoom) = self.debouncer.poll(now) else {
            return Vec::new();
        };

        if camera.commit_zoom(zoom) {
            log::debug!("committed zoom {zoom}");
        }
        vec![Action::ZoomCommitted { zoom: camera.zoom() }]
    }

    /// Drops any pending wheel commit, e.g. when the zoom is set directly
    pub fn cancel_zoom(&mut self) {
        if let Some(zoom) = self.debouncer.cancel() {
            log::debug!("cancelled pending zoom {zoom}");
        }
    }

    /// When [`tick`](Self::tick) next has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_state(&self) -> Option<DragState> {
        self.drag
    }

    pub fn wheel(&self) -> &WheelAccumulator {
        &self.wheel
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(&InteractionConfig::default())
    }
}

/// Camera plus interaction state as one value
#[derive(Debug, Clone)]
pub struct ViewState {
    pub camera: Camera,
    pub input: InputController,
}

impl ViewState {
    pub fn new(camera: Camera, input: InputController) -> Self {
        Self { camera, input }
    }
}

/// Pure transition: the state after `event` at `now`, plus what to do about it
pub fn reduce(mut state: ViewState, event: InputEvent, now: Instant) -> (ViewState, Vec<Action>) {
    let actions = state.input.handle_event(&mut state.camera, event, now);
    (state, actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use std::time::Duration;

    fn setup() -> (Camera, InputController, Instant) {
        (
            Camera::new(LatLng::new(49.2827, -123.1207), 12),
            InputController::default(),
            Instant::now(),
        )
    }

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn test_drag_pans_camera() {
        let (mut camera, mut input, now) = setup();

        input.handle_event(&mut camera, InputEvent::pointer_down(100.0, 100.0), now);
        assert!(input.is_dragging());
        let actions = input.handle_event(&mut camera, InputEvent::pointer_move(90.0, 130.0), now);
        assert_eq!(actions, vec![Action::Redraw]);

        assert!((camera.latitude() - (49.2827 + 30.0 / 4096.0)).abs() < 1e-12);
        assert!((camera.longitude() - (-123.1207 + 10.0 / 4096.0)).abs() < 1e-12);
        assert_eq!(input.drag_state().unwrap().last, Point::new(90.0, 130.0));
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let (mut camera, mut input, now) = setup();
        let before = camera.clone();

        assert!(input
            .handle_event(&mut camera, InputEvent::pointer_move(10.0, 10.0), now)
            .is_empty());
        input.handle_event(&mut camera, InputEvent::pointer_down(0.0, 0.0), now);
        input.handle_event(&mut camera, InputEvent::PointerUp, now);
        input.handle_event(&mut camera, InputEvent::pointer_move(50.0, 50.0), now);
        assert_eq!(camera, before);
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_wheel_commits_after_debounce() {
        let (mut camera, mut input, start) = setup();

        let actions = input.handle_event(&mut camera, InputEvent::wheel(-200.0), start);
        assert_eq!(actions, vec![Action::Redraw]);
        assert_eq!(camera.fractional_zoom(), 13.0);
        assert_eq!(camera.zoom(), 12);

        assert!(input.tick(&mut camera, ms(start, 99)).is_empty());
        assert_eq!(
            input.tick(&mut camera, ms(start, 100)),
            vec![Action::ZoomCommitted { zoom: 13 }]
        );
        assert_eq!(camera.zoom(), 13);
        assert!(input.next_deadline().is_none());
    }

    #[test]
    fn test_burst_commits_once_with_final_value() {
        let (mut camera, mut input, start) = setup();

        for i in 0..5 {
            input.handle_event(&mut camera, InputEvent::wheel(-100.0), ms(start, i * 50));
            assert_eq!(camera.zoom(), 12);
        }
        assert_eq!(camera.fractional_zoom(), 14.5);

        let mut commits = Vec::new();
        for t in (200..=600).step_by(10) {
            commits.extend(input.tick(&mut camera, ms(start, t)));
        }
        assert_eq!(commits, vec![Action::ZoomCommitted { zoom: 14 }]);
        assert_eq!(camera.zoom(), 14);
        assert_eq!(camera.fractional_zoom(), 14.5);
    }

    #[test]
    fn test_out_of_range_wheel_is_dropped() {
        let mut camera = Camera::new(LatLng::default(), 18);
        let mut input = InputController::default();
        let now = Instant::now();

        assert!(input
            .handle_event(&mut camera, InputEvent::wheel(-250.0), now)
            .is_empty());
        assert_eq!(camera.fractional_zoom(), 18.0);
        assert!(input.next_deadline().is_none());
        assert_eq!(input.wheel().accumulated, 0.0);
    }

    #[test]
    fn test_new_gesture_starts_from_current_zoom() {
        let (mut camera, mut input, start) = setup();

        input.handle_event(&mut camera, InputEvent::wheel(-200.0), start);
        input.tick(&mut camera, ms(start, 150));
        assert_eq!(camera.zoom(), 13);

        input.handle_event(&mut camera, InputEvent::wheel(200.0), ms(start, 1000));
        assert_eq!(camera.fractional_zoom(), 12.0);
        input.tick(&mut camera, ms(start, 1100));
        assert_eq!(camera.zoom(), 12);
    }

    #[test]
    fn test_overdue_commit_applies_before_next_event() {
        let (mut camera, mut input, start) = setup();
        input.handle_event(&mut camera, InputEvent::wheel(-200.0), start);

        let actions = input.handle_event(&mut camera, InputEvent::pointer_down(0.0, 0.0), ms(start, 300));
        assert_eq!(actions, vec![Action::ZoomCommitted { zoom: 13 }]);
    }

    #[test]
    fn test_non_finite_events_are_ignored() {
        let (mut camera, mut input, start) = setup();
        let before = camera.clone();

        assert!(input
            .handle_event(&mut camera, InputEvent::wheel(f64::NAN), start)
            .is_empty());
        assert!(input.next_deadline().is_none());

        input.handle_event(&mut camera, InputEvent::pointer_down(10.0, 10.0), start);
        assert!(input
            .handle_event(&mut camera, InputEvent::pointer_move(f64::NAN, 0.0), start)
            .is_empty());
        assert_eq!(input.drag_state().unwrap().last, Point::new(10.0, 10.0));

        input.tick(&mut camera, ms(start, 500));
        assert_eq!(camera, before);

        // The drag carries on from the last finite position
        input.handle_event(&mut camera, InputEvent::pointer_move(10.0, 14.0), start);
        assert!((camera.latitude() - (49.2827 + 4.0 / 4096.0)).abs() < 1e-12);
    }

    #[test]
    fn test_cancel_zoom() {
        let (mut camera, mut input, start) = setup();
        input.handle_event(&mut camera, InputEvent::wheel(-200.0), start);
        input.cancel_zoom();
        assert!(input.tick(&mut camera, ms(start, 500)).is_empty());
        assert_eq!(camera.zoom(), 12);
    }

    #[test]
    fn test_resize_passes_through() {
        let (mut camera, mut input, now) = setup();
        assert_eq!(
            input.handle_event(&mut camera, InputEvent::resize(1024, 768), now),
            vec![Action::Resize(Size::new(1024, 768))]
        );
    }

    #[test]
    fn test_reduce_is_pure() {
        let (camera, input, now) = setup();
        let state = ViewState::new(camera, input);

        let (next, actions) = reduce(state.clone(), InputEvent::wheel(-100.0), now);
        assert_eq!(actions, vec![Action::Redraw]);
        assert_eq!(next.camera.fractional_zoom(), 12.5);
        assert_eq!(state.camera.fractional_zoom(), 12.0);

        let (again, _) = reduce(state, InputEvent::wheel(-100.0), now);
        assert_eq!(again.camera, next.camera);
    }
}
