//! Obstacle and collectible spawn policy
//!
//! Distances are measured from the spawn edge (the right boundary of the
//! field) back to the reference positions kept in the world state.

use super::state::{ObstacleKind, World};
use crate::consts::GAME_WIDTH;
use crate::tuning::Tuning;

/// Difficulty level for an elapsed tick count
pub fn difficulty_level(ticks: u64, tuning: &Tuning) -> u32 {
    (ticks / tuning.difficulty_interval.max(1)) as u32
}

/// Per-tick obstacle spawn probability
pub fn obstacle_rate(level: u32, tuning: &Tuning) -> f64 {
    (tuning.obstacle_rate_base + level as f64 * tuning.obstacle_rate_step)
        .min(tuning.obstacle_rate_max)
}

/// Per-tick collectible spawn probability
pub fn collectible_rate(level: u32, tuning: &Tuning) -> f64 {
    (tuning.collectible_rate_base + level as f64 * tuning.collectible_rate_step)
        .min(tuning.collectible_rate_max)
}

/// Probability that a successful obstacle roll picks a bus
pub fn bus_chance(level: u32, tuning: &Tuning) -> f64 {
    (tuning.bus_chance_base + level as f64 * tuning.bus_chance_step).min(tuning.bus_chance_max)
}

/// Spawn rates derived from the current difficulty, recomputed every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRates {
    pub level: u32,
    pub obstacle: f64,
    pub collectible: f64,
    pub bus: f64,
}

impl SpawnRates {
    pub fn for_ticks(ticks: u64, tuning: &Tuning) -> Self {
        let level = difficulty_level(ticks, tuning);
        Self {
            level,
            obstacle: obstacle_rate(level, tuning),
            collectible: collectible_rate(level, tuning),
            bus: bus_chance(level, tuning),
        }
    }
}

/// Whether an obstacle of `kind` may appear at the spawn edge this tick
pub fn may_spawn_obstacle(kind: ObstacleKind, world: &World, tuning: &Tuning) -> bool {
    let from_last = GAME_WIDTH - world.last_obstacle_x;
    // Kind of the newest obstacle still on the field
    let last_kind = world.obstacles.last().map(|o| o.kind);

    match kind {
        ObstacleKind::Bus => {
            if from_last < tuning.min_bus_distance {
                return false;
            }
            if last_kind == Some(ObstacleKind::Bus) && from_last < tuning.min_bus_distance * 1.5 {
                return false;
            }
            // A dog between two buses must not let them crowd each other
            let from_last_bus = GAME_WIDTH - world.last_bus_x;
            from_last_bus >= tuning.min_bus_distance
        }
        ObstacleKind::Dog => {
            if from_last < tuning.min_obstacle_distance {
                return false;
            }
            !(last_kind == Some(ObstacleKind::Bus) && from_last < tuning.safe_zone_after_bus)
        }
    }
}

/// Whether a collectible may appear without overlapping a fresh obstacle
pub fn may_spawn_collectible(world: &World, tuning: &Tuning) -> bool {
    world
        .obstacles
        .last()
        .is_none_or(|last| GAME_WIDTH - last.pos.x > tuning.collectible_clearance)
}
