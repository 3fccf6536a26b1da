//! Terminal UI: lifecycle management and the single screen.

mod screen;
mod tui;

pub use screen::{draw, preview_dimensions, thumbnail_dimensions, ScreenState, SPINNER_FRAMES};
pub use tui::Tui;
