//! Frame tick
//!
//! Advances the whole simulation by one measured frame. Stage order is fixed:
//! input, paddles, hazards, balls/collisions, power-ups, spawning. Later
//! stages read what earlier ones wrote (power-up attribution depends on
//! post-collision velocities). Combo milestones fire at the paddle hit that
//! crosses them.

use glam::Vec2;

use super::collision::{CollisionResult, check_ball_collisions, substep_count};
use super::combo::{crossed_milestones, milestone_events};
use super::hazards::{self, HazardType};
use super::powerups::{self, PowerUpType};
use super::predict::{autopilot_target, follow};
use super::state::{Ball, GameEvent, GameState, ParticleStyle, Player};
use crate::consts::*;
use crate::frame_scale;

const WHITE: u32 = 0xffffff;
const RED: u32 = 0xef4444;
const GREEN: u32 = 0x22c55e;

/// Step direction for cycling playground selections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Next,
    Previous,
}

/// Held movement keys for one paddle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaddleIntent {
    pub up: bool,
    pub down: bool,
}

impl PaddleIntent {
    /// -1 (up), 0 or +1 (down)
    pub fn axis(&self) -> f32 {
        (self.down as i8 - self.up as i8) as f32
    }
}

/// Input for a single tick. Toggles are edge-triggered (already debounced).
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Indexed by `Player::index()`
    pub paddles: [PaddleIntent; 2],
    pub toggle_pause: bool,
    pub toggle_auto: bool,
    pub toggle_playground: bool,
    pub cycle_power_up: Option<Cycle>,
    pub cycle_hazard: Option<Cycle>,
}

/// Advance the game state by one frame of `dt_ms` milliseconds
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f64) {
    handle_toggles(state, input);

    if state.paused {
        return;
    }

    let dt_ms = if dt_ms.is_finite() {
        dt_ms.clamp(0.0, MAX_FRAME_MS)
    } else {
        FRAME_MS
    };
    state.now_ms += dt_ms;
    let scale = frame_scale(dt_ms);

    update_paddles(state, input, scale);
    hazards::update(state, scale);
    update_balls(state, scale);
    update_power_ups(state);
    powerups::spawn(state, scale);
    hazards::spawn(state, scale);

    state.normalize_order();
}

fn handle_toggles(state: &mut GameState, input: &TickInput) {
    if input.toggle_pause {
        state.paused = !state.paused;
        let message = if state.paused { "PAUSED" } else { "RESUMED" };
        state.notify(message, WHITE, 1000);
        log::info!("Game {}", message.to_lowercase());
    }

    if input.toggle_auto {
        state.auto_mode = !state.auto_mode;
        let message = if state.auto_mode {
            "AUTO MODE ON"
        } else {
            "AUTO MODE OFF"
        };
        state.notify(message, GREEN, 1500);
        log::info!("Auto mode {}", if state.auto_mode { "on" } else { "off" });
    }

    if input.toggle_playground {
        state.playground.enabled = !state.playground.enabled;
        // A fresh sandbox starts empty; captured balls are freed by the next hazard update
        state.power_ups.clear();
        state.hazards.clear();
        let message = if state.playground.enabled {
            "PLAYGROUND MODE"
        } else {
            "PLAYGROUND OFF"
        };
        state.notify(message, GREEN, 1500);
        log::info!("Playground {}", if state.playground.enabled { "on" } else { "off" });
    }

    if !state.playground.enabled {
        return;
    }

    if let Some(cycle) = input.cycle_power_up {
        let next = cycle_option(&PowerUpType::ALL, state.playground.power_up, cycle);
        state.playground.power_up = next;
        state.power_ups.clear();
        let message = match next {
            Some(kind) => format!("Power-up: {}", kind.label()),
            None => "Power-ups disabled".to_string(),
        };
        state.notify(message, next.map_or(WHITE, |k| k.color()), 1200);
    }

    if let Some(cycle) = input.cycle_hazard {
        let next = cycle_option(&HazardType::ALL, state.playground.hazard, cycle);
        state.playground.hazard = next;
        state.hazards.clear();
        let message = match next {
            Some(kind) => format!("Hazard: {}", kind.label()),
            None => "Hazards disabled".to_string(),
        };
        state.notify(message, WHITE, 1200);
    }
}

/// Step through `None` followed by every option, wrapping at both ends
pub fn cycle_option<T: Copy + PartialEq>(all: &[T], current: Option<T>, cycle: Cycle) -> Option<T> {
    // Slot 0 is "disabled", slot i + 1 is all[i]
    let slots = all.len() + 1;
    let index = current
        .and_then(|c| all.iter().position(|x| *x == c))
        .map_or(0, |i| i + 1);
    let next = match cycle {
        Cycle::Next => (index + 1) % slots,
        Cycle::Previous => (index + slots - 1) % slots,
    };
    if next == 0 { None } else { Some(all[next - 1]) }
}

fn update_paddles(state: &mut GameState, input: &TickInput, scale: f32) {
    for player in Player::ALL {
        if state.auto_mode {
            let target = autopilot_target(state, player);
            let arena = state.arena;
            let (dead_zone, gain) = (state.tuning.ai_dead_zone, state.tuning.ai_gain);
            follow(state.paddle_mut(player), target, &arena, dead_zone, gain, scale);
        } else {
            let arena = state.arena;
            let paddle = state.paddle_mut(player);
            let dy = input.paddles[player.index()].axis() * paddle.speed * scale;
            paddle.move_by(dy, &arena);
        }
    }
}

/// Move every ball, resolve collisions and hazards, and handle scoring
fn update_balls(state: &mut GameState, scale: f32) {
    if state.is_frozen() {
        return;
    }

    let now = state.now_ms;
    let mut occupied: Vec<u32> = state
        .balls
        .iter()
        .filter_map(|b| b.capture.map(|c| c.well))
        .collect();
    let mut goals: Vec<(u32, Player, f32)> = Vec::new();

    for i in 0..state.balls.len() {
        let mut ball = state.balls[i];

        hazards::guard_velocity(&mut ball, &mut state.rng, &state.tuning, &state.arena);

        // Captured balls orbit their well instead of integrating velocity
        if ball.is_captured() {
            if !hazards::drive_captured(&mut ball, &state.hazards, now) {
                hazards::release_orphan(&mut ball, &mut state.rng);
            }
            state.balls[i] = ball;
            continue;
        }

        powerups::apply_curve(&mut ball, now, scale);
        hazards::apply_fields(&mut ball, &state.hazards, &state.tuning, scale);
        if capture(state, &mut ball, &mut occupied, now) {
            state.balls[i] = ball;
            continue;
        }

        let substeps = substep_count(ball.vel.length() * scale, ball.radius);
        let sub_scale = scale / substeps as f32;
        for _ in 0..substeps {
            let prev = ball.pos;
            ball.pos += ball.vel * sub_scale;

            let result = check_ball_collisions(
                &mut ball,
                &state.paddles,
                &state.arena,
                state.rally.count(),
                &state.tuning,
            );
            collision_feedback(state, &result, ball.pos);
            if let Some(player) = result.scored {
                goals.push((ball.id, player, ball.pos.y));
                break;
            }

            // --- BARRIERS ---
            let max_speed = state.tuning.max_ball_speed;
            let mut impacts = Vec::new();
            for hazard in &mut state.hazards {
                if let Some(impact) = hazards::hit_barrier(hazard, &mut ball, prev, max_speed) {
                    impacts.push(impact);
                }
            }
            for impact in impacts {
                state.events.extend(hazards::barrier_impact_events(&impact));
                if impact.destroyed {
                    log::debug!("Barrier #{} destroyed", impact.barrier);
                }
            }
            state.hazards.retain(|h| !h.is_destroyed());

            // --- PORTALS ---
            if let Some(events) =
                hazards::resolve_portal(&mut ball, &state.hazards, prev, now, &mut state.rng)
            {
                state.events.extend(events);
            }

            if capture(state, &mut ball, &mut occupied, now) {
                break;
            }
        }

        state.balls[i] = ball;
    }

    if goals.is_empty() {
        return;
    }

    state
        .balls
        .retain(|b| !goals.iter().any(|(id, _, _)| *id == b.id));
    for (_, player, y) in goals {
        score_point(state, player, y);
    }
    if state.balls.is_empty() {
        state.reset_round();
    }
}

/// Capture check with feedback. Returns true if the ball was caught.
fn capture(state: &mut GameState, ball: &mut Ball, occupied: &mut Vec<u32>, now: f64) -> bool {
    let Some(well) = hazards::try_capture(ball, &state.hazards, occupied, now) else {
        return false;
    };
    occupied.push(well);
    state.emit(GameEvent::ScreenShake {
        intensity: SCREEN_SHAKE_INTENSITY * 0.5,
    });
    log::debug!("Ball #{} captured by black hole #{well}", ball.id);
    true
}

fn collision_feedback(state: &mut GameState, result: &CollisionResult, pos: Vec2) {
    if let Some(player) = result.paddle_hit {
        let (prev, new) = state.rally.register_hit(result.rally_increment);
        log::debug!("{:?} return, rally {prev} -> {new}", player);
        state.emit(GameEvent::PaddleHit { player });
        state.emit(GameEvent::ScreenShake {
            intensity: SCREEN_SHAKE_INTENSITY * 0.3,
        });
        state.emit(GameEvent::Particles {
            pos,
            count: 10,
            style: ParticleStyle::sparks(player.color()),
        });
        for milestone in crossed_milestones(prev, new) {
            log::info!("{milestone} hit combo");
            state.events.extend(milestone_events(milestone, pos));
        }
    }
    if result.wall_hit {
        state.emit(GameEvent::WallHit {
            hard: result.hard_wall_hit,
        });
        if result.hard_wall_hit {
            state.emit(GameEvent::ScreenShake {
                intensity: SCREEN_SHAKE_INTENSITY * 0.2,
            });
            state.emit(GameEvent::Particles {
                pos,
                count: 6,
                style: ParticleStyle::sparks(WHITE),
            });
        }
    }
}

fn score_point(state: &mut GameState, player: Player, y: f32) {
    state.scores[player.index()] += 1;
    state.rally.reset();
    state.emit(GameEvent::Scored { player, y });
    log::info!(
        "{:?} scores ({}-{})",
        player,
        state.scores[0],
        state.scores[1]
    );

    let danger = state.compute_danger_mode();
    if danger && !state.danger_mode {
        state.notify("DANGER MODE!", RED, 2000);
        log::info!("Danger mode on");
    }
    state.danger_mode = danger;
}

fn update_power_ups(state: &mut GameState) {
    powerups::expire_effects(state);

    let collected = powerups::check_collisions(&state.balls, &mut state.power_ups);
    for pickup in collected {
        state.events.extend(powerups::collection_events(&pickup));
        powerups::apply_effect(state, pickup.kind, pickup.player);
    }

    powerups::update(state);
}
