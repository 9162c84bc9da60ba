//! Bike Dash - A side-scrolling bicycle runner
//!
//! Core modules:
//! - `sim`: Fixed-timestep simulation (physics, spawning, collisions, session)
//! - `renderer`: Draw-list generation for a 2D canvas
//! - `platform`: Input bindings and listener lifetimes
//! - `persistence`: Key/value JSON storage (LocalStorage on web)
//! - `leaderboard`: Ranked score entries, request handling and client
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use assets::{ImageRegistry, PixelSource, SpriteImage};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Logical ticks per second (one tick per animation frame)
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Play field dimensions
    pub const GAME_WIDTH: f32 = 700.0;
    pub const GAME_HEIGHT: f32 = 500.0;
    pub const GROUND_HEIGHT: f32 = 30.0;

    /// Player sprite size and resting x-offset
    pub const PLAYER_WIDTH: f32 = 100.0;
    pub const PLAYER_HEIGHT: f32 = 80.0;
    pub const PLAYER_REST_X: f32 = 50.0;

    /// Obstacle sprite sizes
    pub const DOG_WIDTH: f32 = 40.0;
    pub const DOG_HEIGHT: f32 = 40.0;
    pub const BUS_WIDTH: f32 = 200.0;
    pub const BUS_HEIGHT: f32 = 60.0;

    /// Collectibles are square
    pub const COLLECTIBLE_SIZE: f32 = 30.0;

    /// Ticks each player animation frame stays on screen
    pub const ANIMATION_SPEED: u32 = 8;

    /// Top edge of the ground band
    pub const GROUND_Y: f32 = GAME_HEIGHT - GROUND_HEIGHT;
    /// Player y when standing on the ground
    pub const PLAYER_GROUND_Y: f32 = GROUND_Y - PLAYER_HEIGHT;
}
