//! Platform layer
//!
//! Handles browser/native differences for:
//! - Input events (keyboard, touch, on-screen button) mapped to commands
//! - Listener and animation-frame lifetimes

pub mod input;
pub mod scope;

pub use input::{Command, InputEvent, InputMapper, Key, dispatch};
pub use scope::{FrameSlot, ListenerSet, Subscription};
