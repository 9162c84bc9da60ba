//! Run lifecycle: Idle -> Running -> Ended, and Ended -> Running on restart

use super::collision::CollisionService;
use super::state::{ObstacleKind, World};
use super::tick::{GameEvent, JumpIntent, TickContext, TickInput, TickOutcome, apply_intent, tick};
use crate::assets::ImageRegistry;
use crate::tuning::Tuning;

/// How a run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Crashed(ObstacleKind),
    Victory,
}

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the start command
    Idle,
    /// Tick loop active
    Running,
    /// Run over, holds the final score
    Ended { score: u32, outcome: RunOutcome },
}

/// One player's sequence of runs
#[derive(Debug, Clone)]
pub struct Session {
    phase: SessionPhase,
    world: World,
    tuning: Tuning,
    collider: CollisionService,
    /// Difficulty level of the last tick
    level: u32,
    /// Demo mode
    pub autopilot: bool,
}

impl Session {
    pub fn new(tuning: Tuning, collider: CollisionService, seed: u64) -> Self {
        Self {
            phase: SessionPhase::Idle,
            world: World::new(seed, &tuning),
            tuning,
            collider,
            level: 0,
            autopilot: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn collider(&self) -> &CollisionService {
        &self.collider
    }

    /// Toggle pixel-perfect detection for subsequent ticks
    pub fn set_pixel_perfect(&mut self, enabled: bool) {
        self.collider.pixel_perfect = enabled;
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Whether the run is over, whatever its score and outcome
    pub fn has_ended(&self) -> bool {
        matches!(self.phase, SessionPhase::Ended { .. })
    }

    pub fn score(&self) -> u32 {
        self.world.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Final score once the run has ended
    pub fn final_score(&self) -> Option<u32> {
        match self.phase {
            SessionPhase::Ended { score, .. } => Some(score),
            _ => None,
        }
    }

    /// Idle -> Running. Ignored in any other phase.
    pub fn start(&mut self, seed: u64) -> bool {
        if self.phase != SessionPhase::Idle {
            return false;
        }
        self.reset(seed);
        log::info!("Run started with seed {}", seed);
        true
    }

    /// Ended -> Running with a fully reinitialised world
    pub fn restart(&mut self, seed: u64) -> bool {
        if !matches!(self.phase, SessionPhase::Ended { .. }) {
            return false;
        }
        self.reset(seed);
        log::info!("Run restarted with seed {}", seed);
        true
    }

    fn reset(&mut self, seed: u64) {
        self.world = World::new(seed, &self.tuning);
        self.level = 0;
        self.phase = SessionPhase::Running;
    }

    /// Apply a jump intent between ticks. Only a running session accepts input.
    pub fn handle_intent(&mut self, intent: JumpIntent) -> Option<GameEvent> {
        if !self.is_running() {
            return None;
        }
        apply_intent(&mut self.world, intent, &self.tuning)
    }

    /// Run one tick if the session is running
    pub fn frame(&mut self, images: &ImageRegistry) -> Vec<GameEvent> {
        if !self.is_running() {
            return Vec::new();
        }

        let input = TickInput {
            intents: Vec::new(),
            autopilot: self.autopilot,
        };
        let ctx = TickContext {
            tuning: &self.tuning,
            collider: &self.collider,
            images,
        };
        let report = tick(&mut self.world, &input, &ctx);
        self.level = report.level;

        let outcome = match report.outcome {
            TickOutcome::Continue => None,
            TickOutcome::Crashed(kind) => Some(RunOutcome::Crashed(kind)),
            TickOutcome::Victory => Some(RunOutcome::Victory),
        };
        if let Some(outcome) = outcome {
            let score = self.world.score;
            self.phase = SessionPhase::Ended { score, outcome };
            log::info!(
                "Run ended ({:?}) after {} ticks with score {}",
                outcome,
                self.world.ticks,
                score
            );
        }

        report.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::Obstacle;

    fn session() -> Session {
        Session::new(Tuning::default(), CollisionService::default(), 5)
    }

    fn crash(session: &mut Session, images: &ImageRegistry) {
        session.world.obstacles.push(Obstacle::new(ObstacleKind::Dog, PLAYER_REST_X + 20.0));
        session.frame(images);
    }

    #[test]
    fn test_idle_ignores_ticks_and_input() {
        let images = ImageRegistry::new();
        let mut s = session();
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(s.frame(&images).is_empty());
        assert_eq!(s.world().ticks, 0);
        assert_eq!(s.handle_intent(JumpIntent::JumpNow), None);
        // Restart is only valid after a run has ended
        assert!(!s.restart(1));
    }

    #[test]
    fn test_crash_ends_once() {
        let images = ImageRegistry::new();
        let mut s = session();
        assert!(s.start(5));
        assert!(!s.start(6));
        s.world.score = 30;
        crash(&mut s, &images);
        assert_eq!(
            s.phase(),
            SessionPhase::Ended {
                score: 30,
                outcome: RunOutcome::Crashed(ObstacleKind::Dog)
            }
        );
        assert_eq!(s.final_score(), Some(30));

        // Frozen: further frames change nothing
        let ticks = s.world().ticks;
        let obstacles = s.world().obstacles.len();
        assert!(s.frame(&images).is_empty());
        assert_eq!(s.world().ticks, ticks);
        assert_eq!(s.world().obstacles.len(), obstacles);
    }

    #[test]
    fn test_restart_resets_world() {
        let images = ImageRegistry::new();
        let mut s = session();
        s.start(5);
        for _ in 0..50 {
            s.frame(&images);
        }
        s.world.score = 40;
        crash(&mut s, &images);
        assert!(s.restart(9));

        let world = s.world();
        assert!(s.is_running());
        assert!(world.obstacles.is_empty());
        assert!(world.collectibles.is_empty());
        assert_eq!(world.score, 0);
        assert_eq!(world.ticks, 0);
        assert_eq!(world.speed, s.tuning().initial_speed);
        assert_eq!(world.player.pos.y, PLAYER_GROUND_Y);
        assert_eq!(world.seed, 9);
    }

    #[test]
    fn test_identical_runs_both_end() {
        let images = ImageRegistry::new();
        let mut s = session();
        assert!(!s.has_ended());
        s.start(5);
        crash(&mut s, &images);
        assert!(s.has_ended());
        let first = s.phase();

        assert!(s.restart(5));
        assert!(!s.has_ended());
        crash(&mut s, &images);
        assert_eq!(s.phase(), first);
        assert!(s.has_ended());
    }

    #[test]
    fn test_intents_only_while_running() {
        let images = ImageRegistry::new();
        let mut s = session();
        s.start(1);
        assert_eq!(s.handle_intent(JumpIntent::ChargeBegin { at_ms: 0.0 }), None);
        let event = s.handle_intent(JumpIntent::ChargeEnd { at_ms: 100.0 });
        assert_eq!(event, Some(GameEvent::Jumped { impulse: 9.0 }));
        s.frame(&images);
        assert!(s.world().player.is_airborne());
    }

    #[test]
    fn test_release_at_threshold_interpolates() {
        let mut s = session();
        s.start(1);
        s.handle_intent(JumpIntent::ChargeBegin { at_ms: 1000.0 });
        let event = s.handle_intent(JumpIntent::ChargeEnd { at_ms: 1200.0 });
        let Some(GameEvent::Jumped { impulse }) = event else {
            panic!("expected a jump, got {event:?}");
        };
        assert!((impulse - (9.0 + 200.0 / 75.0)).abs() < 1e-4);
        assert!(impulse > s.tuning().jump_impulse_min);
    }

    #[test]
    fn test_pixel_toggle() {
        let mut s = session();
        assert!(s.collider().pixel_perfect);
        s.set_pixel_perfect(false);
        assert!(!s.collider().pixel_perfect);
    }
}
