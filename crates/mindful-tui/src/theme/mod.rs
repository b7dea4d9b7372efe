//! Theme components for the TUI.
//!
//! - [`Theme`]: color palette for the light and dark modes
//! - [`symbols`]: glyphs shared by the widgets

mod colors;
pub mod symbols;

pub use colors::Theme;
