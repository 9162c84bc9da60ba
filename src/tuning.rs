//! Data-driven game balance
//!
//! Every gameplay number the simulation reads lives here so a host can ship
//! alternative balance as JSON without rebuilding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to parse a tuning override
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value: {0}")]
    OutOfRange(&'static str),
}

/// Gameplay constants for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Downward acceleration per tick while airborne (constant, independent of speed)
    pub gravity: f32,
    /// Impulse for a tap jump (held below the charge threshold)
    pub jump_impulse_min: f32,
    /// Upper clamp for a fully charged jump
    pub jump_impulse_max: f32,
    /// Hold time (ms) below which a release yields the minimum impulse
    pub charge_threshold_ms: f64,
    /// Held milliseconds per extra unit of impulse
    pub charge_ms_per_unit: f64,
    /// Forward velocity on jump as a fraction of scroll speed
    pub jump_forward_factor: f32,
    /// Rightmost x the player may drift to while airborne
    pub max_player_x: f32,
    /// Pixels per tick the player slides back toward the rest offset after landing
    pub return_speed: f32,

    /// Scroll speed at the start of a run
    pub initial_speed: f32,
    /// Scroll speed added every tick
    pub speed_increment: f32,

    /// Ticks per difficulty level
    pub difficulty_interval: u64,
    pub obstacle_rate_base: f64,
    pub obstacle_rate_step: f64,
    pub obstacle_rate_max: f64,
    pub collectible_rate_base: f64,
    pub collectible_rate_step: f64,
    pub collectible_rate_max: f64,
    pub bus_chance_base: f64,
    pub bus_chance_step: f64,
    pub bus_chance_max: f64,

    /// Minimum gap behind any obstacle before the next one
    pub min_obstacle_distance: f32,
    /// Minimum gap required before a bus
    pub min_bus_distance: f32,
    /// Recovery room a dog needs after a bus
    pub safe_zone_after_bus: f32,
    /// Clearance from the spawn edge a collectible needs
    pub collectible_clearance: f32,
    /// Max random lift of a collectible above the ground
    pub collectible_max_lift: f32,

    /// Points per collectible
    pub collectible_score: u32,
    /// Score that ends the run in victory (open-ended when `None`)
    pub victory_score: Option<u32>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.3,
            jump_impulse_min: 9.0,
            jump_impulse_max: 22.0,
            charge_threshold_ms: 200.0,
            charge_ms_per_unit: 75.0,
            jump_forward_factor: 0.15,
            max_player_x: 250.0,
            return_speed: 2.0,

            initial_speed: 4.0,
            speed_increment: 0.0005,

            difficulty_interval: 300,
            obstacle_rate_base: 0.003,
            obstacle_rate_step: 0.001,
            obstacle_rate_max: 0.015,
            collectible_rate_base: 0.002,
            collectible_rate_step: 0.0005,
            collectible_rate_max: 0.008,
            bus_chance_base: 0.3,
            bus_chance_step: 0.05,
            bus_chance_max: 0.5,

            min_obstacle_distance: 200.0,
            min_bus_distance: 350.0,
            safe_zone_after_bus: 300.0,
            collectible_clearance: 150.0,
            collectible_max_lift: 100.0,

            collectible_score: 10,
            victory_score: None,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override on top of the defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.difficulty_interval == 0 {
            return Err(TuningError::OutOfRange("difficulty_interval must be positive"));
        }
        if self.charge_ms_per_unit <= 0.0 {
            return Err(TuningError::OutOfRange("charge_ms_per_unit must be positive"));
        }
        if self.jump_impulse_max < self.jump_impulse_min {
            return Err(TuningError::OutOfRange(
                "jump_impulse_max must not be below jump_impulse_min",
            ));
        }
        if self.gravity <= 0.0 {
            return Err(TuningError::OutOfRange("gravity must be positive"));
        }
        if self.speed_increment < 0.0 {
            return Err(TuningError::OutOfRange("speed_increment must not be negative"));
        }
        if self.initial_speed <= 0.0 || self.initial_speed.is_nan() {
            return Err(TuningError::OutOfRange("initial_speed must be positive"));
        }
        let rates = [
            ("obstacle_rate_base", self.obstacle_rate_base),
            ("obstacle_rate_step", self.obstacle_rate_step),
            ("obstacle_rate_max", self.obstacle_rate_max),
            ("collectible_rate_base", self.collectible_rate_base),
            ("collectible_rate_step", self.collectible_rate_step),
            ("collectible_rate_max", self.collectible_rate_max),
            ("bus_chance_base", self.bus_chance_base),
            ("bus_chance_step", self.bus_chance_step),
            ("bus_chance_max", self.bus_chance_max),
        ];
        if let Some((name, _)) = rates.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            log::warn!("Rejecting tuning: {} outside [0, 1]", name);
            return Err(TuningError::OutOfRange("spawn rates and chances must lie in [0, 1]"));
        }
        if self.victory_score == Some(0) {
            return Err(TuningError::OutOfRange("victory_score must be positive"));
        }
        Ok(())
    }

    /// Impulse for the single-action jump button
    pub fn auto_jump_impulse(&self) -> f32 {
        (self.jump_impulse_min + self.jump_impulse_max) / 2.0
    }

    /// Jump impulse for a charge held for `held_ms`
    pub fn charged_impulse(&self, held_ms: f64) -> f32 {
        if held_ms < self.charge_threshold_ms {
            return self.jump_impulse_min;
        }
        let extra = (held_ms / self.charge_ms_per_unit) as f32;
        (self.jump_impulse_min + extra).min(self.jump_impulse_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "gravity": 0.5, "victory_score": 100 }"#).unwrap();
        assert_eq!(tuning.gravity, 0.5);
        assert_eq!(tuning.victory_score, Some(100));
        assert_eq!(tuning.initial_speed, Tuning::default().initial_speed);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Tuning::from_json(r#"{ "difficulty_interval": 0 }"#),
            Err(TuningError::OutOfRange(_))
        ));
        assert!(matches!(
            Tuning::from_json("{ nope"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_speed_and_bad_rates() {
        for json in [
            r#"{ "initial_speed": 0 }"#,
            r#"{ "initial_speed": -4 }"#,
            r#"{ "obstacle_rate_max": 1.5 }"#,
            r#"{ "collectible_rate_base": -0.1 }"#,
            r#"{ "bus_chance_step": 2 }"#,
            r#"{ "victory_score": 0 }"#,
        ] {
            assert!(
                matches!(Tuning::from_json(json), Err(TuningError::OutOfRange(_))),
                "accepted {json}"
            );
        }
        // Bounds themselves are fine
        let t = Tuning::from_json(r#"{ "bus_chance_max": 1.0, "obstacle_rate_base": 0.0 }"#).unwrap();
        assert_eq!(t.bus_chance_max, 1.0);
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_charged_impulse_curve() {
        let t = Tuning::default();
        // Short taps get the minimum
        assert_eq!(t.charged_impulse(0.0), 9.0);
        assert_eq!(t.charged_impulse(199.0), 9.0);
        // The threshold itself already interpolates
        assert!((t.charged_impulse(200.0) - (9.0 + 200.0 / 75.0)).abs() < 1e-4);
        // 300ms held = 9 + 4
        assert!((t.charged_impulse(300.0) - 13.0).abs() < 1e-4);
        // Long holds clamp at the maximum
        assert_eq!(t.charged_impulse(10_000.0), 22.0);
        assert_eq!(t.auto_jump_impulse(), 15.5);
    }
}
