pub mod debounce;
pub mod events;
pub mod handler;

// Re-export the essential types
pub use debounce::Debouncer;
pub use events::InputEvent;
pub use handler::{reduce, Action, DragState, InputController, ViewState};
