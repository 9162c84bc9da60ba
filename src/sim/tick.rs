//! Fixed timestep simulation tick
//!
//! Core game loop that advances the world by one frame. `tick` mutates a
//! world in place; `advance` is the by-value form for hosts that prefer to
//! thread the state through explicitly.

use rand::Rng;

use super::collision::{BoxKind, CollisionBox, CollisionService};
use super::spawn::{SpawnRates, may_spawn_collectible, may_spawn_obstacle};
use super::state::{ObstacleKind, World};
use crate::assets::{self, ImageRegistry, PixelSource};
use crate::tuning::Tuning;

/// Abstract jump intents produced by the input layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpIntent {
    /// Key/touch pressed at host time `at_ms`
    ChargeBegin { at_ms: f64 },
    /// Key/touch released at host time `at_ms`
    ChargeEnd { at_ms: f64 },
    /// Single-action jump button
    JumpNow,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Intents received since the previous tick, in arrival order
    pub intents: Vec<JumpIntent>,
    /// Demo mode - jump automatically in front of obstacles
    pub autopilot: bool,
}

/// Something that happened during a tick, for HUD and logging
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Jumped { impulse: f32 },
    Landed,
    ObstacleSpawned(ObstacleKind),
    CollectibleSpawned,
    CollectiblePicked { score: u32 },
    Crashed(ObstacleKind),
    VictoryReached { score: u32 },
}

/// How the tick left the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Crashed(ObstacleKind),
    Victory,
}

/// Result of one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub events: Vec<GameEvent>,
    pub outcome: TickOutcome,
    /// Difficulty level used this tick
    pub level: u32,
}

/// Read-only collaborators a tick needs
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub tuning: &'a Tuning,
    pub collider: &'a CollisionService,
    pub images: &'a ImageRegistry,
}

/// Ticks of look-ahead the autopilot uses before jumping
const AUTOPILOT_REACTION_TICKS: f32 = 10.0;

/// Apply one jump intent. Safe to call between ticks.
pub fn apply_intent(world: &mut World, intent: JumpIntent, tuning: &Tuning) -> Option<GameEvent> {
    match intent {
        JumpIntent::ChargeBegin { at_ms } => {
            world.player.begin_charge(at_ms);
            None
        }
        JumpIntent::ChargeEnd { at_ms } => world
            .player
            .release_charge(at_ms, world.speed, tuning)
            .map(|impulse| GameEvent::Jumped { impulse }),
        JumpIntent::JumpNow => world
            .player
            .jump_now(world.speed, tuning)
            .then(|| GameEvent::Jumped {
                impulse: tuning.auto_jump_impulse(),
            }),
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, ctx: &TickContext<'_>) -> TickReport {
    let tuning = ctx.tuning;
    let mut events = Vec::new();

    for &intent in &input.intents {
        events.extend(apply_intent(world, intent, tuning));
    }
    if input.autopilot && should_autopilot_jump(world) {
        events.extend(apply_intent(world, JumpIntent::JumpNow, tuning));
    }

    world.ticks += 1;
    world.speed += tuning.speed_increment;

    if world.player.integrate(tuning) {
        events.push(GameEvent::Landed);
    }

    // Rates follow the difficulty level, recomputed every tick
    let rates = SpawnRates::for_ticks(world.ticks, tuning);

    if world.rng.random::<f64>() < rates.obstacle {
        let kind = if world.rng.random::<f64>() < rates.bus {
            ObstacleKind::Bus
        } else {
            ObstacleKind::Dog
        };
        if may_spawn_obstacle(kind, world, tuning) {
            world.spawn_obstacle(kind);
            log::debug!("Spawned {:?} at tick {}", kind, world.ticks);
            events.push(GameEvent::ObstacleSpawned(kind));
        }
    }

    if world.rng.random::<f64>() < rates.collectible && may_spawn_collectible(world, tuning) {
        let lift = world.rng.random::<f32>() * tuning.collectible_max_lift;
        world.spawn_collectible(lift);
        events.push(GameEvent::CollectibleSpawned);
    }

    world.scroll();

    let outcome = resolve_collisions(world, ctx, &mut events);
    TickReport {
        events,
        outcome,
        level: rates.level,
    }
}

/// By-value form of [`tick`]
pub fn advance(mut world: World, input: &TickInput, ctx: &TickContext<'_>) -> (World, TickReport) {
    let report = tick(&mut world, input, ctx);
    (world, report)
}

fn image<'a>(images: &'a ImageRegistry, name: &str) -> Option<&'a dyn PixelSource> {
    images.get(name).map(|img| img as &dyn PixelSource)
}

/// Obstacle hits end the run (first hit wins); every touched collectible scores
fn resolve_collisions(world: &mut World, ctx: &TickContext<'_>, events: &mut Vec<GameEvent>) -> TickOutcome {
    let frame = assets::player_frame_name(world.player.animation_phase);
    let player_box = CollisionBox::new(world.player.rect(), BoxKind::Player)
        .with_image_opt(image(ctx.images, frame));

    for obstacle in &world.obstacles {
        let obstacle_box = CollisionBox::new(obstacle.rect(), obstacle.kind.box_kind())
            .with_image_opt(image(ctx.images, obstacle.kind.image_name()));
        if ctx.collider.collide(&player_box, &obstacle_box) {
            events.push(GameEvent::Crashed(obstacle.kind));
            return TickOutcome::Crashed(obstacle.kind);
        }
    }

    let glove = image(ctx.images, assets::GLOVE);
    let bonus = ctx.tuning.collectible_score;
    let mut picked = 0u32;
    world.collectibles.retain(|collectible| {
        let collectible_box =
            CollisionBox::new(collectible.rect(), BoxKind::Collectible).with_image_opt(glove);
        let hit = ctx.collider.collide(&player_box, &collectible_box);
        if hit {
            picked += 1;
        }
        !hit
    });
    for _ in 0..picked {
        world.score = world.score.saturating_add(bonus);
        log::debug!("Collectible picked, score {}", world.score);
        events.push(GameEvent::CollectiblePicked { score: world.score });
    }

    match ctx.tuning.victory_score {
        Some(target) if world.score >= target => {
            events.push(GameEvent::VictoryReached { score: world.score });
            TickOutcome::Victory
        }
        _ => TickOutcome::Continue,
    }
}

/// Jump when the nearest obstacle ahead is about to reach the player
fn should_autopilot_jump(world: &World) -> bool {
    let player = &world.player;
    if player.jump != super::state::JumpState::Grounded {
        return false;
    }
    let front = player.pos.x + player.rect().w;
    world
        .obstacles
        .iter()
        .filter(|o| o.rect().right() > player.pos.x)
        .map(|o| o.pos.x - front)
        .any(|gap| gap >= 0.0 && gap < world.speed * AUTOPILOT_REACTION_TICKS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::{Collectible, Obstacle};
    use glam::Vec2;
    use proptest::prelude::*;

    /// Tuning with spawning disabled so tests place entities by hand
    fn quiet() -> Tuning {
        Tuning {
            obstacle_rate_base: 0.0,
            obstacle_rate_step: 0.0,
            collectible_rate_base: 0.0,
            collectible_rate_step: 0.0,
            ..Tuning::default()
        }
    }

    fn run(world: &mut World, tuning: &Tuning, input: &TickInput) -> TickReport {
        let collider = CollisionService::default();
        let images = ImageRegistry::new();
        let ctx = TickContext {
            tuning,
            collider: &collider,
            images: &images,
        };
        tick(world, input, &ctx)
    }

    #[test]
    fn test_tick_advances_counters() {
        let t = quiet();
        let mut world = World::new(1, &t);
        let report = run(&mut world, &t, &TickInput::default());
        assert_eq!(report.outcome, TickOutcome::Continue);
        assert_eq!(world.ticks, 1);
        assert!((world.speed - (t.initial_speed + t.speed_increment)).abs() < 1e-6);
        assert_eq!(world.player.animation_phase, 1);
    }

    #[test]
    fn test_obstacle_hit_ends_run() {
        let t = quiet();
        let mut world = World::new(1, &t);
        world
            .obstacles
            .push(Obstacle::new(ObstacleKind::Dog, PLAYER_REST_X + 50.0));
        world
            .obstacles
            .push(Obstacle::new(ObstacleKind::Bus, PLAYER_REST_X + 60.0));
        world.collectibles.push(Collectible {
            pos: Vec2::new(PLAYER_REST_X + 10.0, PLAYER_GROUND_Y + 10.0),
        });

        let report = run(&mut world, &t, &TickInput::default());
        // First hit short-circuits: the dog, not the bus
        assert_eq!(report.outcome, TickOutcome::Crashed(ObstacleKind::Dog));
        assert_eq!(
            report
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::Crashed(_)))
                .count(),
            1
        );
        // Collectibles are not evaluated on a crash tick
        assert_eq!(world.score, 0);
        assert_eq!(world.collectibles.len(), 1);
    }

    #[test]
    fn test_multiple_collectibles_same_tick() {
        let t = quiet();
        let mut world = World::new(1, &t);
        for dx in [10.0, 40.0] {
            world.collectibles.push(Collectible {
                pos: Vec2::new(PLAYER_REST_X + dx, PLAYER_GROUND_Y + 20.0),
            });
        }
        world.collectibles.push(Collectible {
            pos: Vec2::new(600.0, 100.0),
        });

        let report = run(&mut world, &t, &TickInput::default());
        assert_eq!(report.outcome, TickOutcome::Continue);
        assert_eq!(world.score, 2 * t.collectible_score);
        assert_eq!(world.collectibles.len(), 1);
    }

    #[test]
    fn test_victory_when_configured() {
        let t = Tuning {
            victory_score: Some(10),
            ..quiet()
        };
        let mut world = World::new(1, &t);
        world.collectibles.push(Collectible {
            pos: Vec2::new(PLAYER_REST_X + 10.0, PLAYER_GROUND_Y + 20.0),
        });
        let report = run(&mut world, &t, &TickInput::default());
        assert_eq!(report.outcome, TickOutcome::Victory);
    }

    #[test]
    fn test_jump_and_land() {
        let t = quiet();
        let mut world = World::new(1, &t);
        let input = TickInput {
            intents: vec![JumpIntent::JumpNow],
            ..Default::default()
        };
        let report = run(&mut world, &t, &input);
        assert!(matches!(report.events[0], GameEvent::Jumped { .. }));
        assert!(world.player.is_airborne());

        let mut landed = false;
        for _ in 0..500 {
            let report = run(&mut world, &t, &TickInput::default());
            if report.events.contains(&GameEvent::Landed) {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(world.player.pos.y, PLAYER_GROUND_Y);
        assert_eq!(world.player.vel.y, 0.0);
    }

    #[test]
    fn test_spawning_respects_policy() {
        let t = Tuning {
            obstacle_rate_base: 1.0,
            obstacle_rate_max: 1.0,
            collectible_rate_base: 1.0,
            collectible_rate_max: 1.0,
            ..Tuning::default()
        };
        let mut world = World::new(42, &t);
        // Keep the player out of the way
        world.player.pos.y = -1000.0;
        world.player.jump = crate::sim::state::JumpState::Jumping;
        world.player.vel = Vec2::ZERO;

        for _ in 0..400 {
            world.player.pos.y = -1000.0;
            world.player.vel = Vec2::ZERO;
            run(&mut world, &t, &TickInput::default());
            for pair in world.obstacles.windows(2) {
                let gap = pair[1].pos.x - pair[0].pos.x;
                assert!(gap >= t.min_obstacle_distance - 0.05);
                if pair[0].kind == ObstacleKind::Bus && pair[1].kind == ObstacleKind::Bus {
                    assert!(gap >= t.min_bus_distance * 1.5 - 0.05);
                }
                if pair[0].kind == ObstacleKind::Bus && pair[1].kind == ObstacleKind::Dog {
                    assert!(gap >= t.safe_zone_after_bus - 0.05);
                }
            }
        }
        assert!(!world.obstacles.is_empty());
    }

    #[test]
    fn test_advance_by_value() {
        let t = quiet();
        let collider = CollisionService::default();
        let images = ImageRegistry::new();
        let ctx = TickContext {
            tuning: &t,
            collider: &collider,
            images: &images,
        };
        let world = World::new(3, &t);
        let (world, report) = advance(world, &TickInput::default(), &ctx);
        assert_eq!(world.ticks, 1);
        assert_eq!(report.level, 0);
    }

    #[test]
    fn test_determinism() {
        let t = Tuning::default();
        let mut a = World::new(99999, &t);
        let mut b = World::new(99999, &t);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..2000 {
            let ra = run(&mut a, &t, &input);
            let rb = run(&mut b, &t, &input);
            assert_eq!(ra.outcome, rb.outcome);
            if ra.outcome != TickOutcome::Continue {
                break;
            }
        }
        assert_eq!(a.ticks, b.ticks);
        assert_eq!(a.obstacles.len(), b.obstacles.len());
        assert_eq!(a.score, b.score);
    }

    proptest! {
        #[test]
        fn prop_score_and_speed_never_decrease(seed in any::<u64>()) {
            let t = Tuning {
                collectible_rate_base: 0.05,
                collectible_rate_max: 0.05,
                ..Tuning::default()
            };
            let mut world = World::new(seed, &t);
            let input = TickInput { autopilot: true, ..Default::default() };
            for _ in 0..600 {
                let score = world.score;
                let speed = world.speed;
                let report = run(&mut world, &t, &input);
                prop_assert!(world.score >= score);
                prop_assert!(world.speed >= speed);
                if report.outcome != TickOutcome::Continue {
                    break;
                }
            }
        }
    }
}
