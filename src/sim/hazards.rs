//! Hazards: gravity wells, wind zones, breakable barriers and linked portals
//!
//! Hazards are plain `Copy` values so the predictive controller can replay
//! their physics on an independent snapshot. The per-ball helpers in this
//! module (`apply_fields`, `try_capture`, `hit_barrier`, `portal_destination`)
//! are shared by the real tick and the predictor.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Arena, Ball, Capture, GameEvent, GameState, ParticleStyle};
use crate::Tuning;
use crate::consts::*;
use crate::{cap_speed, direction, rotate_velocity};

const PURPLE: u32 = 0x9333ea;
const CYAN: u32 = 0x22d3ee;
const WHITE: u32 = 0xffffff;
const RED: u32 = 0xef4444;

/// Selectable hazard families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardType {
    BlackHole,
    WhiteHole,
    WindZone,
    Barrier,
    Portal,
}

impl HazardType {
    pub const ALL: [HazardType; 5] = [
        HazardType::BlackHole,
        HazardType::WhiteHole,
        HazardType::WindZone,
        HazardType::Barrier,
        HazardType::Portal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HazardType::BlackHole => "Black Hole",
            HazardType::WhiteHole => "White Hole",
            HazardType::WindZone => "Wind Zone",
            HazardType::Barrier => "Barrier",
            HazardType::Portal => "Portal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Attract,
    Repel,
}

/// Type-specific hazard data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardKind {
    GravityWell {
        polarity: Polarity,
    },
    WindZone {
        /// Velocity added per reference frame while inside
        direction: Vec2,
    },
    Barrier {
        hit_points: u8,
        max_hit_points: u8,
        /// Vertical drift, assigned on the first update
        patrol: Option<Vec2>,
    },
    Portal {
        partner: u32,
        is_entry: bool,
    },
}

/// A hazard entity. `pos` is the centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub pos: Vec2,
    pub created_at_ms: f64,
    pub duration_ms: f64,
    pub kind: HazardKind,
}

impl Hazard {
    pub fn hazard_type(&self) -> HazardType {
        match self.kind {
            HazardKind::GravityWell {
                polarity: Polarity::Attract,
            } => HazardType::BlackHole,
            HazardKind::GravityWell {
                polarity: Polarity::Repel,
            } => HazardType::WhiteHole,
            HazardKind::WindZone { .. } => HazardType::WindZone,
            HazardKind::Barrier { .. } => HazardType::Barrier,
            HazardKind::Portal { .. } => HazardType::Portal,
        }
    }

    pub fn is_black_hole(&self) -> bool {
        self.hazard_type() == HazardType::BlackHole
    }

    /// Axis-aligned bounds (min, max) for rectangular hazards
    pub fn rect(&self) -> Option<(Vec2, Vec2)> {
        let half = match self.kind {
            HazardKind::WindZone { .. } => Vec2::splat(WIND_ZONE_SIZE / 2.0),
            HazardKind::Barrier { .. } => Vec2::new(BARRIER_WIDTH / 2.0, BARRIER_HEIGHT / 2.0),
            _ => return None,
        };
        Some((self.pos - half, self.pos + half))
    }

    /// Duration-based expiry. Barriers only die from damage.
    pub fn is_expired(&self, now_ms: f64) -> bool {
        match self.kind {
            HazardKind::Barrier { .. } => false,
            _ => now_ms - self.created_at_ms >= self.duration_ms,
        }
    }

    pub fn hit_points(&self) -> Option<u8> {
        match self.kind {
            HazardKind::Barrier { hit_points, .. } => Some(hit_points),
            _ => None,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.hit_points() == Some(0)
    }
}

fn find(hazards: &[Hazard], id: u32) -> Option<&Hazard> {
    hazards.iter().find(|h| h.id == id)
}

/// Probabilistically spawn one hazard (or a portal pair) this frame
pub fn spawn(state: &mut GameState, scale: f32) {
    let (chance, max, kind) = if state.playground.enabled {
        let Some(kind) = state.playground.hazard else {
            return;
        };
        (
            state.tuning.playground_spawn_chance,
            state.tuning.playground_max_hazards,
            Some(kind),
        )
    } else {
        let boost = if state.danger_mode { 2.0 } else { 1.0 };
        (
            state.tuning.hazard_spawn_chance * boost,
            state.tuning.hazard_max,
            None,
        )
    };

    if state.hazards.len() >= max || state.rng.random::<f32>() >= chance * scale {
        return;
    }

    let kind = kind.unwrap_or_else(|| {
        HazardType::ALL[state.rng.random_range(0..HazardType::ALL.len())]
    });
    spawn_kind(state, kind, max);
}

/// Spawn a specific hazard type if the cap allows it
pub fn spawn_kind(state: &mut GameState, kind: HazardType, max: usize) {
    if state.hazards.len() >= max {
        return;
    }
    let now = state.now_ms;
    let duration = state.tuning.hazard_duration_ms;
    let pos = state.arena.random_spawn_point(&mut state.rng);

    let hazard_kind = match kind {
        HazardType::BlackHole => HazardKind::GravityWell {
            polarity: Polarity::Attract,
        },
        HazardType::WhiteHole => HazardKind::GravityWell {
            polarity: Polarity::Repel,
        },
        HazardType::WindZone => {
            let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
            HazardKind::WindZone {
                direction: direction(angle) * state.tuning.wind_strength,
            }
        }
        HazardType::Barrier => HazardKind::Barrier {
            hit_points: BARRIER_HIT_POINTS,
            max_hit_points: BARRIER_HIT_POINTS,
            patrol: None,
        },
        HazardType::Portal => {
            spawn_portal_pair(state, pos, max);
            return;
        }
    };

    let id = state.next_entity_id();
    state.hazards.push(Hazard {
        id,
        pos,
        created_at_ms: now,
        duration_ms: duration,
        kind: hazard_kind,
    });
    state.emit(GameEvent::Particles {
        pos,
        count: 10,
        style: ParticleStyle::burst(PURPLE),
    });
    log::debug!("Spawned {} #{id} at ({:.0}, {:.0})", kind.label(), pos.x, pos.y);
}

/// Portals come in linked pairs or not at all
fn spawn_portal_pair(state: &mut GameState, entry_pos: Vec2, max: usize) {
    if state.hazards.len() + 2 > max {
        return;
    }

    let min_gap = PORTAL_RADIUS * 4.0;
    let mut exit_pos = None;
    for _ in 0..PLACEMENT_ATTEMPTS {
        let candidate = state.arena.random_spawn_point(&mut state.rng);
        if candidate.distance(entry_pos) >= min_gap {
            exit_pos = Some(candidate);
            break;
        }
    }
    let Some(exit_pos) = exit_pos else {
        log::debug!("No room for a portal pair this frame");
        return;
    };

    let entry_id = state.next_entity_id();
    let exit_id = state.next_entity_id();
    let now = state.now_ms;
    let duration = state.tuning.hazard_duration_ms;
    for (id, partner, pos, is_entry) in [
        (entry_id, exit_id, entry_pos, true),
        (exit_id, entry_id, exit_pos, false),
    ] {
        state.hazards.push(Hazard {
            id,
            pos,
            created_at_ms: now,
            duration_ms: duration,
            kind: HazardKind::Portal { partner, is_entry },
        });
    }
    log::debug!("Spawned portal pair #{entry_id} <-> #{exit_id}");
}

/// Per-frame hazard bookkeeping: patrols, black-hole ejections, orphaned
/// captures, expiry and portal-pair integrity.
pub fn update(state: &mut GameState, scale: f32) {
    let now = state.now_ms;

    // Barrier patrol (velocity chosen lazily)
    for hazard in &mut state.hazards {
        if let HazardKind::Barrier { patrol, .. } = &mut hazard.kind
            && patrol.is_none()
        {
            let speed = 1.0 + state.rng.random::<f32>();
            let sign = if state.rng.random_bool(0.5) { 1.0 } else { -1.0 };
            *patrol = Some(Vec2::new(0.0, speed * sign));
        }
        patrol_step(hazard, &state.arena, scale);
    }

    // Captured balls: eject after the capture window, release if the well is gone
    let mut spent_wells = Vec::new();
    for i in 0..state.balls.len() {
        let Some(capture) = state.balls[i].capture else {
            continue;
        };
        match find(&state.hazards, capture.well).map(|w| w.pos) {
            Some(well_pos) if now - capture.since_ms >= CAPTURE_DURATION_MS => {
                let mut ball = state.balls[i];
                eject(&mut ball, well_pos, &state.tuning, &mut state.rng);
                state.balls[i] = ball;
                spent_wells.push(capture.well);
                state.emit(GameEvent::Particles {
                    pos: well_pos,
                    count: 25,
                    style: ParticleStyle::burst(PURPLE),
                });
                state.emit(GameEvent::ScreenShake {
                    intensity: SCREEN_SHAKE_INTENSITY,
                });
                log::debug!("Black hole #{} ejected ball #{}", capture.well, ball.id);
            }
            Some(_) => {}
            None => {
                let mut ball = state.balls[i];
                release_orphan(&mut ball, &mut state.rng);
                state.balls[i] = ball;
                state.emit(GameEvent::Particles {
                    pos: ball.pos,
                    count: 15,
                    style: ParticleStyle::burst(PURPLE),
                });
            }
        }
    }

    let holding: Vec<u32> = state
        .balls
        .iter()
        .filter_map(|b| b.capture.map(|c| c.well))
        .collect();
    state.hazards.retain(|h| {
        if spent_wells.contains(&h.id) {
            return false;
        }
        // A well keeps its ball until ejection even past its lifetime
        holding.contains(&h.id) || !h.is_expired(now)
    });

    remove_orphan_portals(&mut state.hazards);
}

/// Move a patrolling barrier, bouncing off the walls
pub fn patrol_step(hazard: &mut Hazard, arena: &Arena, scale: f32) {
    let HazardKind::Barrier {
        patrol: Some(vel), ..
    } = &mut hazard.kind
    else {
        return;
    };
    hazard.pos += *vel * scale;

    let half = BARRIER_HEIGHT / 2.0;
    if hazard.pos.y - half < 0.0 {
        hazard.pos.y = half;
        vel.y = vel.y.abs();
    } else if hazard.pos.y + half > arena.height {
        hazard.pos.y = arena.height - half;
        vel.y = -vel.y.abs();
    }
}

/// Drop any portal whose partner no longer exists
pub fn remove_orphan_portals(hazards: &mut Vec<Hazard>) {
    let ids: Vec<u32> = hazards.iter().map(|h| h.id).collect();
    hazards.retain(|h| match h.kind {
        HazardKind::Portal { partner, .. } => ids.contains(&partner),
        _ => true,
    });
}

/// Remove expired hazards from a snapshot (no capture bookkeeping)
pub fn expire_snapshot(hazards: &mut Vec<Hazard>, now_ms: f64) {
    hazards.retain(|h| !h.is_expired(now_ms));
    remove_orphan_portals(hazards);
}

/// Reset non-finite state to a sane serve-like velocity.
///
/// Returns true when a repair was needed.
pub fn guard_velocity(ball: &mut Ball, rng: &mut Pcg32, tuning: &Tuning, arena: &Arena) -> bool {
    let mut repaired = false;
    if !ball.pos.is_finite() {
        ball.pos = arena.center();
        repaired = true;
    }
    if !ball.vel.is_finite() {
        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let vy = tuning.ball_speed * (rng.random::<f32>() * 0.8 - 0.4);
        ball.vel = Vec2::new(sign * tuning.ball_speed, vy);
        repaired = true;
    }
    if repaired {
        log::warn!("Ball #{} had a non-finite state, reinitialised", ball.id);
    }
    repaired
}

/// Continuous forces: gravity wells and wind zones
pub fn apply_fields(ball: &mut Ball, hazards: &[Hazard], tuning: &Tuning, scale: f32) {
    let influence = VORTEX_RADIUS * INFLUENCE_FACTOR;
    let capture_radius = VORTEX_RADIUS * CAPTURE_FACTOR;

    for hazard in hazards {
        match hazard.kind {
            HazardKind::GravityWell { polarity } => {
                let offset = hazard.pos - ball.pos;
                let dist = offset.length();
                if dist >= influence || dist <= f32::EPSILON {
                    continue;
                }
                let falloff = 1.0 - dist / influence;
                let toward = offset / dist;
                match polarity {
                    Polarity::Attract => {
                        if dist <= capture_radius {
                            continue;
                        }
                        // Pull gets much stronger near the core
                        let proximity = (influence - dist) / influence;
                        let strength = falloff
                            * tuning.gravity_strength
                            * ATTRACT_MULTIPLIER
                            * (1.0 + 2.0 * proximity);
                        ball.vel += toward * strength * scale;
                    }
                    Polarity::Repel => {
                        let strength = falloff * tuning.gravity_strength * REPEL_MULTIPLIER;
                        ball.vel -= toward * strength * scale;
                    }
                }
            }
            HazardKind::WindZone { direction } => {
                if let Some((min, max)) = hazard.rect()
                    && ball.pos.cmpge(min).all()
                    && ball.pos.cmple(max).all()
                {
                    ball.vel += direction * scale;
                }
            }
            _ => {}
        }
    }
}

/// Capture a ball that reached a black hole's core.
///
/// `occupied` lists wells already holding a ball. Returns the capturing well.
pub fn try_capture(ball: &mut Ball, hazards: &[Hazard], occupied: &[u32], now_ms: f64) -> Option<u32> {
    if ball.is_captured() {
        return None;
    }
    let capture_radius = VORTEX_RADIUS * CAPTURE_FACTOR;
    let well = hazards.iter().find(|h| {
        h.is_black_hole() && !occupied.contains(&h.id) && h.pos.distance(ball.pos) < capture_radius
    })?;

    let stored_vel = if ball.vel.is_finite() && ball.vel.length_squared() > 0.0 {
        ball.vel
    } else {
        Vec2::new(DEFAULT_ESCAPE_SPEED, 3.0)
    };
    ball.capture = Some(Capture {
        well: well.id,
        stored_vel,
        since_ms: now_ms,
    });
    ball.vel = Vec2::ZERO;
    Some(well.id)
}

/// Position of a captured ball relative to its well after `elapsed_ms`.
///
/// The orbit tightens and spins faster the longer the ball is held.
pub fn orbit_offset(elapsed_ms: f64) -> Vec2 {
    let t = elapsed_ms.max(0.0);
    let shrink = ((CAPTURE_DURATION_MS - t) / CAPTURE_DURATION_MS).max(0.5) as f32;
    let radius = shrink * VORTEX_RADIUS * 0.3;
    let angle = (0.015 * t * (1.0 + t / CAPTURE_DURATION_MS)) as f32;
    direction(angle) * radius
}

/// Drive a captured ball around its well. Returns false if the well is gone.
pub fn drive_captured(ball: &mut Ball, hazards: &[Hazard], now_ms: f64) -> bool {
    let Some(capture) = ball.capture else {
        return true;
    };
    let Some(well) = find(hazards, capture.well) else {
        return false;
    };
    ball.pos = well.pos + orbit_offset(now_ms - capture.since_ms);
    ball.vel = Vec2::ZERO;
    true
}

/// Ejection speed derived from the pre-capture velocity
pub fn eject_speed(stored_vel: Vec2, tuning: &Tuning) -> f32 {
    let speed = stored_vel.length() * 0.8;
    let speed = if speed.is_finite() { speed } else { 0.0 };
    speed.clamp(tuning.eject_speed_min, tuning.eject_speed_max)
}

/// Fling a captured ball out of its well at a random angle
pub fn eject(ball: &mut Ball, well_pos: Vec2, tuning: &Tuning, rng: &mut Pcg32) {
    let stored = ball.capture.map_or(Vec2::ZERO, |c| c.stored_vel);
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let dir = direction(angle);
    ball.vel = dir * eject_speed(stored, tuning);
    ball.pos = well_pos + dir * VORTEX_RADIUS * 1.5;
    ball.capture = None;
}

/// Free a ball whose owning well vanished while it was held
pub fn release_orphan(ball: &mut Ball, rng: &mut Pcg32) {
    let stored = ball
        .capture
        .map(|c| c.stored_vel.length())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_ESCAPE_SPEED);
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    ball.vel = direction(angle) * stored;
    log::warn!(
        "Ball #{} released: gravity well #{} no longer exists",
        ball.id,
        ball.capture.map_or(0, |c| c.well)
    );
    ball.capture = None;
}

/// A barrier hit, as reported to the caller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierImpact {
    pub barrier: u32,
    pub point: Vec2,
    /// This hit used up the last hit point
    pub destroyed: bool,
}

/// Bounce a ball off a barrier and damage it.
///
/// The penetrated edge is found from the ball's previous position. Returns
/// `None` if the hazard is not a live barrier or there is no overlap.
pub fn hit_barrier(
    hazard: &mut Hazard,
    ball: &mut Ball,
    prev_pos: Vec2,
    max_speed: f32,
) -> Option<BarrierImpact> {
    let (min, max) = hazard.rect()?;
    let HazardKind::Barrier { hit_points, .. } = &mut hazard.kind else {
        return None;
    };
    if *hit_points == 0 {
        return None;
    }

    let closest = ball.pos.clamp(min, max);
    if closest.distance_squared(ball.pos) >= ball.radius * ball.radius {
        return None;
    }

    let r = ball.radius;
    if prev_pos.x + r <= min.x {
        ball.vel.x = -ball.vel.x.abs() * BARRIER_BOUNCE_BOOST;
        ball.pos.x = min.x - r - 1.0;
    } else if prev_pos.x - r >= max.x {
        ball.vel.x = ball.vel.x.abs() * BARRIER_BOUNCE_BOOST;
        ball.pos.x = max.x + r + 1.0;
    } else if prev_pos.y + r <= min.y {
        ball.vel.y = -ball.vel.y.abs() * BARRIER_BOUNCE_BOOST;
        ball.pos.y = min.y - r - 1.0;
    } else if prev_pos.y - r >= max.y {
        ball.vel.y = ball.vel.y.abs() * BARRIER_BOUNCE_BOOST;
        ball.pos.y = max.y + r + 1.0;
    } else {
        // Already overlapping (barrier drifted into the ball): leave along the shallowest axis
        let exits = [
            (ball.pos.x - min.x + r, Vec2::NEG_X),
            (max.x - ball.pos.x + r, Vec2::X),
            (ball.pos.y - min.y + r, Vec2::NEG_Y),
            (max.y - ball.pos.y + r, Vec2::Y),
        ];
        let (depth, normal) = exits
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((0.0, Vec2::X));
        ball.pos += normal * (depth + 1.0);
        if normal.x != 0.0 {
            ball.vel.x = normal.x * ball.vel.x.abs() * BARRIER_BOUNCE_BOOST;
        } else {
            ball.vel.y = normal.y * ball.vel.y.abs() * BARRIER_BOUNCE_BOOST;
        }
    }
    ball.vel = cap_speed(ball.vel, max_speed);

    *hit_points = hit_points.saturating_sub(1);
    Some(BarrierImpact {
        barrier: hazard.id,
        point: closest,
        destroyed: *hit_points == 0,
    })
}

/// Feedback for a barrier hit
pub fn barrier_impact_events(impact: &BarrierImpact) -> [GameEvent; 2] {
    let (count, color) = if impact.destroyed { (15, WHITE) } else { (8, RED) };
    [
        GameEvent::Particles {
            pos: impact.point,
            count,
            style: ParticleStyle::sparks(color),
        },
        GameEvent::ScreenShake {
            intensity: SCREEN_SHAKE_INTENSITY * 0.5,
        },
    ]
}

/// Exit position when a ball has just entered a portal.
///
/// Entry is the "was outside, now inside" transition, so a ball resting in a
/// portal never re-triggers it.
pub fn portal_destination(hazards: &[Hazard], prev_pos: Vec2, pos: Vec2) -> Option<(u32, Vec2)> {
    hazards.iter().find_map(|h| {
        let HazardKind::Portal { partner, .. } = h.kind else {
            return None;
        };
        let was_outside = prev_pos.distance(h.pos) > PORTAL_RADIUS;
        let now_inside = pos.distance(h.pos) <= PORTAL_RADIUS;
        if !(was_outside && now_inside) {
            return None;
        }
        find(hazards, partner).map(|exit| (h.id, exit.pos))
    })
}

/// Move a ball to a portal exit, rotating its heading by `scatter` radians
pub fn teleport(ball: &mut Ball, exit: Vec2, scatter: f32, now_ms: f64) {
    ball.pos = exit;
    ball.vel = rotate_velocity(ball.vel, scatter);
    ball.teleport_ready_at = Some(now_ms + TELEPORT_COOLDOWN_MS);
}

/// Teleport with a random scatter and return the feedback events
pub fn resolve_portal(
    ball: &mut Ball,
    hazards: &[Hazard],
    prev_pos: Vec2,
    now_ms: f64,
    rng: &mut Pcg32,
) -> Option<[GameEvent; 2]> {
    if !ball.can_teleport(now_ms) {
        return None;
    }
    let (_, exit) = portal_destination(hazards, prev_pos, ball.pos)?;
    let from = ball.pos;
    let scatter = rng.random_range(-PORTAL_SCATTER..=PORTAL_SCATTER);
    teleport(ball, exit, scatter, now_ms);
    Some([
        GameEvent::Teleport { from, to: exit },
        GameEvent::Particles {
            pos: exit,
            count: 12,
            style: ParticleStyle::burst(CYAN),
        },
    ])
}
