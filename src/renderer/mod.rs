//! Canvas rendering module
//!
//! `build_frame` reads a session and produces an ordered draw list; the web
//! host replays that list on a 2D canvas context. Images that are not ready
//! are replaced by simple placeholder shapes.

pub mod draw;
pub mod frame;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

pub use draw::{Color, DrawCmd, DrawList};
pub use frame::build_frame;
