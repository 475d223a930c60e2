//! Terminal user interface
//!
//! Single-screen chat view: scrolling transcript, input line, status bar,
//! toast notices on top.

pub mod app;
pub mod input;
pub mod render;
pub mod toast;

pub use app::App;
