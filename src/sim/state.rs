//! World state and core simulation types
//!
//! One `World` per run. Everything the tick mutates lives here, owned
//! exclusively by whoever drives the simulation.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{BoxKind, Rect};
use crate::assets;
use crate::consts::*;
use crate::tuning::Tuning;

/// Player jump state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JumpState {
    /// On the ground, free to start a jump
    Grounded,
    /// On the ground, holding the jump input since the given host time (ms)
    Charging { started_at_ms: f64 },
    /// In the air
    Jumping,
}

/// The cyclist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub jump: JumpState,
    /// Animation phase counter (advances every tick)
    pub animation_phase: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_REST_X, PLAYER_GROUND_Y),
            vel: Vec2::ZERO,
            jump: JumpState::Grounded,
            animation_phase: 0,
        }
    }
}

impl Player {
    pub fn is_airborne(&self) -> bool {
        self.jump == JumpState::Jumping
    }

    pub fn is_charging(&self) -> bool {
        matches!(self.jump, JumpState::Charging { .. })
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, PLAYER_WIDTH, PLAYER_HEIGHT)
    }

    /// Start charging a jump. Accepted only when grounded and not already charging.
    pub fn begin_charge(&mut self, now_ms: f64) -> bool {
        if self.jump != JumpState::Grounded {
            return false;
        }
        self.jump = JumpState::Charging {
            started_at_ms: now_ms,
        };
        true
    }

    /// Release a charged jump. Returns the impulse applied, if any.
    pub fn release_charge(&mut self, now_ms: f64, speed: f32, tuning: &Tuning) -> Option<f32> {
        let JumpState::Charging { started_at_ms } = self.jump else {
            return None;
        };
        let held_ms = (now_ms - started_at_ms).max(0.0);
        let impulse = tuning.charged_impulse(held_ms);
        self.launch(impulse, speed, tuning);
        Some(impulse)
    }

    /// Immediate mid-range jump, bypassing the charge gesture
    pub fn jump_now(&mut self, speed: f32, tuning: &Tuning) -> bool {
        if self.jump != JumpState::Grounded {
            return false;
        }
        self.launch(tuning.auto_jump_impulse(), speed, tuning);
        true
    }

    fn launch(&mut self, impulse: f32, speed: f32, tuning: &Tuning) {
        self.jump = JumpState::Jumping;
        self.vel = Vec2::new(speed * tuning.jump_forward_factor, -impulse);
    }

    /// Advance one tick of motion. Returns true on the tick the player lands.
    pub fn integrate(&mut self, tuning: &Tuning) -> bool {
        self.animation_phase = self.animation_phase.wrapping_add(1);

        if !self.is_airborne() {
            // Drift back to the resting offset after a forward jump
            if self.pos.x > PLAYER_REST_X {
                self.pos.x = (self.pos.x - tuning.return_speed).max(PLAYER_REST_X);
            }
            return false;
        }

        self.vel.y += tuning.gravity;
        self.pos += self.vel;
        self.pos.x = self.pos.x.min(tuning.max_player_x);

        if self.pos.y >= PLAYER_GROUND_Y {
            self.pos.y = PLAYER_GROUND_Y;
            self.vel = Vec2::ZERO;
            self.jump = JumpState::Grounded;
            return true;
        }
        false
    }
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Dog,
    Bus,
}

impl ObstacleKind {
    /// Fixed (width, height) per kind
    pub fn size(self) -> (f32, f32) {
        match self {
            ObstacleKind::Dog => (DOG_WIDTH, DOG_HEIGHT),
            ObstacleKind::Bus => (BUS_WIDTH, BUS_HEIGHT),
        }
    }

    pub fn image_name(self) -> &'static str {
        match self {
            ObstacleKind::Dog => assets::DOG,
            ObstacleKind::Bus => assets::BUS,
        }
    }

    pub fn box_kind(self) -> BoxKind {
        match self {
            ObstacleKind::Dog => BoxKind::Dog,
            ObstacleKind::Bus => BoxKind::Bus,
        }
    }
}

/// An obstacle standing on the ground
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub pos: Vec2,
}

impl Obstacle {
    /// Place an obstacle of `kind` on the ground at `x`
    pub fn new(kind: ObstacleKind, x: f32) -> Self {
        let (_, h) = kind.size();
        Self {
            kind,
            pos: Vec2::new(x, GROUND_Y - h),
        }
    }

    pub fn rect(&self) -> Rect {
        let (w, h) = self.kind.size();
        Rect::new(self.pos.x, self.pos.y, w, h)
    }

    /// Fully past the left boundary
    pub fn is_offscreen(&self) -> bool {
        self.pos.x <= -self.kind.size().0
    }
}

/// A boxing glove worth points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub pos: Vec2,
}

impl Collectible {
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, COLLECTIBLE_SIZE, COLLECTIBLE_SIZE)
    }

    pub fn is_offscreen(&self) -> bool {
        self.pos.x <= -COLLECTIBLE_SIZE
    }
}

/// Complete world state for one run
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Spawn RNG
    pub rng: Pcg32,
    pub player: Player,
    /// Spawn order, oldest (leftmost) first
    pub obstacles: Vec<Obstacle>,
    /// Spawn order, oldest (leftmost) first
    pub collectibles: Vec<Collectible>,
    /// World scroll speed (px/tick), never decreases
    pub speed: f32,
    /// Simulation tick counter
    pub ticks: u64,
    pub score: u32,
    /// Where the most recent obstacle spawned, scrolled with the world
    pub last_obstacle_x: f32,
    /// Where the most recent bus spawned, scrolled with the world
    pub last_bus_x: f32,
}

impl World {
    /// Fresh world at initial values
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: Player::default(),
            obstacles: Vec::new(),
            collectibles: Vec::new(),
            speed: tuning.initial_speed,
            ticks: 0,
            score: 0,
            last_obstacle_x: -tuning.min_obstacle_distance,
            last_bus_x: -tuning.min_bus_distance,
        }
    }

    /// Push a new obstacle at the spawn edge and update reference positions
    pub fn spawn_obstacle(&mut self, kind: ObstacleKind) {
        self.obstacles.push(Obstacle::new(kind, GAME_WIDTH));
        self.last_obstacle_x = GAME_WIDTH;
        if kind == ObstacleKind::Bus {
            self.last_bus_x = GAME_WIDTH;
        }
    }

    /// Push a new collectible at the spawn edge, `lift` px above the ground
    pub fn spawn_collectible(&mut self, lift: f32) {
        self.collectibles.push(Collectible {
            pos: Vec2::new(GAME_WIDTH, GROUND_Y - COLLECTIBLE_SIZE - lift),
        });
    }

    /// Move everything left by the current speed and drop what left the field
    pub fn scroll(&mut self) {
        let dx = self.speed;
        for obstacle in &mut self.obstacles {
            obstacle.pos.x -= dx;
        }
        for collectible in &mut self.collectibles {
            collectible.pos.x -= dx;
        }
        self.last_obstacle_x -= dx;
        self.last_bus_x -= dx;

        self.obstacles.retain(|o| !o.is_offscreen());
        self.collectibles.retain(|c| !c.is_offscreen());
    }
}
