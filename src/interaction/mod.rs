pub mod click;
pub mod controller;
pub mod drag;

pub use controller::{GestureOutcome, InteractionController};
pub use drag::DRAG_TICK;
