//! Per-frame draw list

use std::f32::consts::TAU;

use glam::Vec2;

use super::draw::{Color, DrawCmd, DrawList};
use crate::assets::{self, ImageRegistry};
use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{Collectible, Obstacle, ObstacleKind, Player, Rect, Session, SessionPhase};

/// Background scroll, pixels per tick
const BACKGROUND_SPEED: u64 = 2;
/// Placeholder wheel geometry, relative to the player box
const WHEEL_RADIUS: f32 = 10.0;
const WHEEL_Y: f32 = 45.0;
const REAR_WHEEL_X: f32 = 15.0;
const FRONT_WHEEL_X: f32 = 45.0;
const BUS_WINDOWS: usize = 6;

/// Build the draw list for the current session state
pub fn build_frame(session: &Session, images: &ImageRegistry, settings: &Settings) -> DrawList {
    let world = session.world();
    let mut list = DrawList::new();

    draw_background(&mut list, images, world.ticks, settings.background_scroll);
    list.fill_rect(0.0, GROUND_Y, GAME_WIDTH, GROUND_HEIGHT, Color::SLATE);

    draw_player(&mut list, images, &world.player);
    for obstacle in &world.obstacles {
        draw_obstacle(&mut list, images, obstacle);
    }
    for collectible in &world.collectibles {
        draw_collectible(&mut list, images, collectible);
    }

    list.text(format!("Score: {}", session.score()), 20.0, 30.0, 20);
    if settings.show_level {
        list.text(format!("Level: {}", session.level() + 1), 20.0, 60.0, 20);
    }

    match session.phase() {
        SessionPhase::Idle => {
            list.text("Press Enter to start", GAME_WIDTH / 2.0 - 120.0, GAME_HEIGHT / 2.0, 20);
        }
        SessionPhase::Ended { score, .. } => {
            list.text(format!("Game over! Score: {}", score), GAME_WIDTH / 2.0 - 120.0, GAME_HEIGHT / 2.0, 20);
        }
        SessionPhase::Running => {}
    }

    list
}

fn draw_background(list: &mut DrawList, images: &ImageRegistry, ticks: u64, scroll: bool) {
    let Some(bg) = images.get(assets::BACKGROUND) else {
        list.fill_rect(0.0, 0.0, GAME_WIDTH, GAME_HEIGHT, Color::BACKDROP);
        return;
    };
    let width = bg.width.max(1) as u64;
    let offset = if scroll {
        (ticks * BACKGROUND_SPEED % width) as f32
    } else {
        0.0
    };
    let w = width as f32;
    list.image(assets::BACKGROUND, Rect::new(-offset, 0.0, w, GAME_HEIGHT));
    list.image(assets::BACKGROUND, Rect::new(w - offset, 0.0, w, GAME_HEIGHT));
}

fn draw_player(list: &mut DrawList, images: &ImageRegistry, player: &Player) {
    let frame = assets::player_frame_name(player.animation_phase);
    if images.is_ready(frame) {
        list.image(frame, player.rect());
        return;
    }

    let phase = player.animation_phase as f32;
    let bob = (phase * 0.3).sin() * 5.0;
    let rotation = (phase * 0.2) % TAU;
    let (x, y) = (player.pos.x, player.pos.y + bob);
    list.fill_rect(x, y, PLAYER_WIDTH, PLAYER_HEIGHT, Color::SLATE);
    for wheel_x in [REAR_WHEEL_X, FRONT_WHEEL_X] {
        list.push(DrawCmd::Wheel {
            center: Vec2::new(x + wheel_x, y + WHEEL_Y),
            radius: WHEEL_RADIUS,
            rotation,
        });
    }
}

fn draw_obstacle(list: &mut DrawList, images: &ImageRegistry, obstacle: &Obstacle) {
    let name = obstacle.kind.image_name();
    let rect = obstacle.rect();
    if images.is_ready(name) {
        list.image(name, rect);
        return;
    }

    match obstacle.kind {
        ObstacleKind::Dog => {
            list.fill_rect(rect.x, rect.y, rect.w, rect.h, Color::WHITE);
            // Head
            list.fill_rect(rect.right() - 10.0, rect.y, 10.0, 15.0, Color::BLACK);
            // Legs
            list.fill_rect(rect.x, rect.bottom() - 10.0, rect.w, 5.0, Color::BLACK);
        }
        ObstacleKind::Bus => {
            list.fill_rect(rect.x, rect.y, rect.w, rect.h, Color::BUS_BLUE);
            for i in 0..BUS_WINDOWS {
                list.fill_rect(rect.x + 20.0 + i as f32 * 30.0, rect.y + 10.0, 20.0, 15.0, Color::WHITE);
            }
            list.text("39", rect.right() - 40.0, rect.y + 30.0, 16);
        }
    }
}

fn draw_collectible(list: &mut DrawList, images: &ImageRegistry, collectible: &Collectible) {
    let rect = collectible.rect();
    if images.is_ready(assets::GLOVE) {
        list.image(assets::GLOVE, rect);
        return;
    }

    let half = COLLECTIBLE_SIZE / 2.0;
    list.push(DrawCmd::FillCircle {
        center: Vec2::new(rect.x + half, rect.y + half),
        radius: half,
        color: Color::GLOVE_RED,
    });
    // Cuff
    list.fill_rect(rect.x + 5.0, rect.bottom() - 10.0, COLLECTIBLE_SIZE - 10.0, 5.0, Color::CUFF_RED);
}
