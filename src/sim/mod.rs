//! Simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Fixed timestep only (one tick per animation frame)
//! - Seeded RNG only
//! - Spawn-ordered entity lists (oldest first)
//! - No rendering or platform dependencies

pub mod collision;
pub mod session;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{
    BoxKind, Circle, CollisionBox, CollisionService, Hitbox, Rect, ResampleError,
    circle_collision, hitbox_collision, pixel_collision, point_in_rect, rect_collision,
};
pub use session::{RunOutcome, Session, SessionPhase};
pub use spawn::{SpawnRates, may_spawn_collectible, may_spawn_obstacle};
pub use state::{Collectible, JumpState, Obstacle, ObstacleKind, Player, World};
pub use tick::{GameEvent, JumpIntent, TickContext, TickInput, TickOutcome, TickReport, advance, tick};
