//! Ratatui front-end: one screen with the name input, the three actions, and
//! the list of stored names. All behaviour lives in the controller; this layer
//! maps keys onto it and renders whatever it reports.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::{App, Phase};
pub use terminal::run_app;
