//! Power-ups: spawning, collection and timed paddle/ball effects
//!
//! Effects are applied through [`apply_effect`], which dispatches on
//! [`PowerUpType`] and reports what it changed. Every application registers
//! an [`ActiveEffect`] record; when it expires the affected paddle is put back
//! to the tuning defaults (not to its pre-effect value).

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Ball, GameEvent, GameState, ParticleStyle, Player};
use crate::consts::*;
use crate::cap_speed;

/// The eight collectible power-ups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpType {
    SpeedUp,
    SlowDown,
    GrowPaddle,
    ShrinkPaddle,
    FastBall,
    Multiball,
    Fury,
    CurveShot,
}

impl PowerUpType {
    pub const ALL: [PowerUpType; 8] = [
        PowerUpType::SpeedUp,
        PowerUpType::SlowDown,
        PowerUpType::GrowPaddle,
        PowerUpType::ShrinkPaddle,
        PowerUpType::FastBall,
        PowerUpType::Multiball,
        PowerUpType::Fury,
        PowerUpType::CurveShot,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PowerUpType::SpeedUp => "SPEED UP",
            PowerUpType::SlowDown => "SLOW DOWN",
            PowerUpType::GrowPaddle => "GROW PADDLE",
            PowerUpType::ShrinkPaddle => "SHRINK PADDLE",
            PowerUpType::FastBall => "FAST BALL",
            PowerUpType::Multiball => "MULTIBALL",
            PowerUpType::Fury => "FURY",
            PowerUpType::CurveShot => "CURVE SHOT",
        }
    }

    pub fn color(self) -> u32 {
        match self {
            PowerUpType::SpeedUp => 0x22c55e,
            PowerUpType::SlowDown => 0x60a5fa,
            PowerUpType::GrowPaddle => 0xa855f7,
            PowerUpType::ShrinkPaddle => 0xf97316,
            PowerUpType::FastBall => 0xef4444,
            PowerUpType::Multiball => 0xfacc15,
            PowerUpType::Fury => 0xdc2626,
            PowerUpType::CurveShot => 0x06b6d4,
        }
    }

    /// Pickup radius. The star-shaped multiball icon is a little tighter.
    pub fn collect_radius(self) -> f32 {
        match self {
            PowerUpType::Multiball => POWERUP_SIZE / 1.8,
            _ => POWERUP_SIZE / 2.0,
        }
    }

    /// Effects that hit the collector's opponent rather than the collector
    pub fn targets_opponent(self) -> bool {
        matches!(self, PowerUpType::SlowDown | PowerUpType::ShrinkPaddle)
    }
}

/// Idle bobbing animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hover {
    pub amplitude: f32,
    /// Radians per ms
    pub frequency: f32,
    pub phase: f32,
    pub base_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpType,
    pub pos: Vec2,
    pub spawned_at_ms: f64,
    pub hover: Option<Hover>,
}

/// Stable identity of one applied effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectHandle(pub u32);

/// One applied, not yet expired, power-up effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub handle: EffectHandle,
    /// Player who collected the power-up
    pub owner: Player,
    /// Player whose paddle is modified
    pub affected: Player,
    pub kind: PowerUpType,
    pub expires_at_ms: f64,
}

/// All running effects, one record per application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    records: Vec<ActiveEffect>,
    next_handle: u32,
}

impl ActiveEffects {
    pub fn register(
        &mut self,
        owner: Player,
        affected: Player,
        kind: PowerUpType,
        expires_at_ms: f64,
    ) -> EffectHandle {
        let handle = EffectHandle(self.next_handle);
        self.next_handle += 1;
        self.records.push(ActiveEffect {
            handle,
            owner,
            affected,
            kind,
            expires_at_ms,
        });
        handle
    }

    /// Remove one record. Removing an unknown or already removed handle is a no-op.
    pub fn remove(&mut self, handle: EffectHandle) -> Option<ActiveEffect> {
        let idx = self.records.iter().position(|r| r.handle == handle)?;
        Some(self.records.remove(idx))
    }

    /// Pull out every record due at `now_ms`, oldest handle first
    pub fn take_expired(&mut self, now_ms: f64) -> Vec<ActiveEffect> {
        let (expired, live): (Vec<_>, Vec<_>) = self
            .records
            .drain(..)
            .partition(|r| now_ms >= r.expires_at_ms);
        self.records = live;
        expired
    }

    pub fn is_active(&self, kind: PowerUpType) -> bool {
        self.records.iter().any(|r| r.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// A single state change made by an effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectChange {
    PaddleSpeed { player: Player, from: f32, to: f32 },
    PaddleHeight { player: Player, from: f32, to: f32 },
    BallSpeed { factor: f32 },
    BallAdded { id: u32 },
    CurveStarted,
}

/// Result of applying a power-up
#[derive(Debug, Clone, PartialEq)]
pub struct EffectOutcome {
    pub handle: EffectHandle,
    pub changes: Vec<EffectChange>,
}

/// A power-up picked up this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collected {
    pub kind: PowerUpType,
    pub player: Player,
    pub pos: Vec2,
}

/// Pick a random kind. Fury is rare unless the match is in danger mode.
pub fn choose_kind(rng: &mut Pcg32, danger_mode: bool) -> PowerUpType {
    if danger_mode && rng.random_bool(0.2) {
        return PowerUpType::Fury;
    }
    let kind = PowerUpType::ALL[rng.random_range(0..PowerUpType::ALL.len())];
    if kind == PowerUpType::Fury && !danger_mode && rng.random::<f32>() > 0.05 {
        let others: Vec<PowerUpType> = PowerUpType::ALL
            .into_iter()
            .filter(|k| *k != PowerUpType::Fury)
            .collect();
        return others[rng.random_range(0..others.len())];
    }
    kind
}

/// Probabilistically spawn one power-up this frame
pub fn spawn(state: &mut GameState, scale: f32) {
    let (chance, max, forced) = if state.playground.enabled {
        let Some(kind) = state.playground.power_up else {
            return;
        };
        (
            state.tuning.playground_spawn_chance,
            state.tuning.playground_max_powerups,
            Some(kind),
        )
    } else {
        let boost = if state.danger_mode { 1.5 } else { 1.0 };
        (
            state.tuning.powerup_spawn_chance * boost,
            state.tuning.powerup_max,
            None,
        )
    };

    if state.power_ups.len() >= max || state.rng.random::<f32>() >= chance * scale {
        return;
    }
    let danger = state.danger_mode;
    let kind = forced.unwrap_or_else(|| choose_kind(&mut state.rng, danger));
    spawn_kind(state, kind);
}

/// Place a power-up of the given kind away from existing ones.
///
/// Gives up silently when no free spot is found.
pub fn spawn_kind(state: &mut GameState, kind: PowerUpType) -> Option<u32> {
    let mut pos = None;
    for _ in 0..PLACEMENT_ATTEMPTS {
        let candidate = state.arena.random_spawn_point(&mut state.rng);
        let clear = state
            .power_ups
            .iter()
            .all(|p| p.pos.distance(candidate) >= POWERUP_MIN_SPACING);
        if clear {
            pos = Some(candidate);
            break;
        }
    }
    let Some(pos) = pos else {
        log::debug!("No free spot for {} this frame", kind.label());
        return None;
    };

    let hover = Hover {
        amplitude: state.rng.random_range(2.0..3.5),
        frequency: state.rng.random_range(0.001..0.002),
        phase: state.rng.random_range(0.0..std::f32::consts::TAU),
        base_y: pos.y,
    };
    let id = state.next_entity_id();
    state.power_ups.push(PowerUp {
        id,
        kind,
        pos,
        spawned_at_ms: state.now_ms,
        hover: Some(hover),
    });

    state.emit(GameEvent::Particles {
        pos,
        count: 8,
        style: ParticleStyle::burst(kind.color()),
    });
    state.emit(GameEvent::Shockwave {
        pos,
        inner: 5.0,
        outer: POWERUP_SIZE,
        color: kind.color(),
    });
    log::debug!("Spawned {} #{id}", kind.label());
    Some(id)
}

/// Despawn stale power-ups and animate the rest
pub fn update(state: &mut GameState) {
    let now = state.now_ms;
    state.power_ups.retain(|p| {
        let alive = now - p.spawned_at_ms < POWERUP_DESPAWN_MS;
        if !alive {
            log::debug!("{} #{} despawned", p.kind.label(), p.id);
        }
        alive
    });
    for power_up in &mut state.power_ups {
        if let Some(hover) = power_up.hover {
            let wave = (now as f32 * hover.frequency + hover.phase).sin();
            power_up.pos.y = hover.base_y + wave * hover.amplitude;
        }
    }
}

/// Player credited with a pickup.
///
/// A ball moving right was last returned by the left paddle, so the side the
/// ball came from benefits.
pub fn beneficiary(vel: Vec2) -> Player {
    if vel.x > 0.0 { Player::One } else { Player::Two }
}

/// Remove power-ups touched by a free ball and report who collected them
pub fn check_collisions(balls: &[Ball], power_ups: &mut Vec<PowerUp>) -> Vec<Collected> {
    let mut collected = Vec::new();
    power_ups.retain(|p| {
        let hit = balls.iter().find(|b| {
            !b.is_captured() && b.pos.distance(p.pos) < p.kind.collect_radius() + b.radius
        });
        match hit {
            Some(ball) => {
                collected.push(Collected {
                    kind: p.kind,
                    player: beneficiary(ball.vel),
                    pos: p.pos,
                });
                false
            }
            None => true,
        }
    });
    collected
}

/// Feedback for a pickup
pub fn collection_events(collected: &Collected) -> Vec<GameEvent> {
    let kind = collected.kind;
    let mut events = vec![
        GameEvent::Particles {
            pos: collected.pos,
            count: 20,
            style: ParticleStyle::burst(kind.color()),
        },
        GameEvent::Notification {
            message: format!("{}!", kind.label()),
            color: kind.color(),
            duration_ms: 1500,
        },
    ];
    if matches!(kind, PowerUpType::Fury | PowerUpType::Multiball) {
        events.push(GameEvent::Shockwave {
            pos: collected.pos,
            inner: POWERUP_SIZE / 2.0,
            outer: POWERUP_SIZE * 3.0,
            color: kind.color(),
        });
    }
    if kind == PowerUpType::Fury {
        events.push(GameEvent::ScreenShake {
            intensity: SCREEN_SHAKE_INTENSITY * 1.5,
        });
    }
    events
}

fn change_speed(state: &mut GameState, player: Player, to: f32) -> EffectChange {
    let paddle = state.paddle_mut(player);
    let from = paddle.speed;
    paddle.speed = to;
    EffectChange::PaddleSpeed { player, from, to }
}

fn change_height(state: &mut GameState, player: Player, to: f32) -> EffectChange {
    let arena = state.arena;
    let to = to.min(arena.height);
    let paddle = state.paddle_mut(player);
    let from = paddle.height;
    paddle.set_height(to, &arena);
    EffectChange::PaddleHeight { player, from, to }
}

fn scale_balls(state: &mut GameState, factor: f32) -> EffectChange {
    let max = state.tuning.max_ball_speed;
    for ball in &mut state.balls {
        ball.vel = cap_speed(ball.vel * factor, max);
    }
    EffectChange::BallSpeed { factor }
}

/// Apply a collected power-up for `player` and register its timed reversal
pub fn apply_effect(state: &mut GameState, kind: PowerUpType, player: Player) -> EffectOutcome {
    let affected = if kind.targets_opponent() {
        player.opponent()
    } else {
        player
    };
    let paddle = *state.paddle(affected);
    let mut changes = Vec::new();

    match kind {
        PowerUpType::SpeedUp => changes.push(change_speed(state, affected, paddle.speed + 3.0)),
        PowerUpType::SlowDown => changes.push(change_speed(
            state,
            affected,
            (paddle.speed - 3.0).max(MIN_PADDLE_SPEED),
        )),
        PowerUpType::GrowPaddle => {
            changes.push(change_height(state, affected, paddle.height + 40.0))
        }
        PowerUpType::ShrinkPaddle => changes.push(change_height(
            state,
            affected,
            (paddle.height - 30.0).max(MIN_PADDLE_HEIGHT),
        )),
        PowerUpType::FastBall => changes.push(scale_balls(state, 1.3)),
        PowerUpType::Multiball => {
            let template = state.balls.iter().find(|b| !b.is_captured()).map(|b| b.vel.x);
            let vx = template
                .map(|vx| -vx)
                .filter(|vx| vx.abs() > 0.1)
                .unwrap_or(state.tuning.ball_speed * player.serve_sign());
            let vy = state.rng.random_range(-3.0..=3.0);
            let center = state.arena.center();
            let id = state.spawn_ball(center, Vec2::new(vx, vy));
            changes.push(EffectChange::BallAdded { id });
        }
        PowerUpType::Fury => {
            changes.push(change_height(state, affected, paddle.height + 30.0));
            changes.push(change_speed(state, affected, paddle.speed + 4.0));
            changes.push(scale_balls(state, 1.4));
        }
        PowerUpType::CurveShot => {
            let now = state.now_ms;
            for ball in &mut state.balls {
                ball.curve_since = Some(now);
            }
            changes.push(EffectChange::CurveStarted);
        }
    }

    let expires_at = state.now_ms + state.tuning.powerup_duration_ms;
    let handle = state.effects.register(player, affected, kind, expires_at);
    log::info!("{:?} collected {} ({:?})", player, kind.label(), handle);
    EffectOutcome { handle, changes }
}

/// Undo an expired or removed effect by restoring defaults
pub fn restore(state: &mut GameState, effect: &ActiveEffect) {
    let arena = state.arena;
    let default_speed = state.tuning.paddle_speed;
    let default_height = state.tuning.paddle_height;
    match effect.kind {
        PowerUpType::SpeedUp | PowerUpType::SlowDown => {
            state.paddle_mut(effect.affected).speed = default_speed;
        }
        PowerUpType::GrowPaddle | PowerUpType::ShrinkPaddle => {
            state
                .paddle_mut(effect.affected)
                .set_height(default_height, &arena);
        }
        PowerUpType::Fury => {
            let paddle = state.paddle_mut(effect.affected);
            paddle.speed = default_speed;
            paddle.set_height(default_height, &arena);
        }
        PowerUpType::CurveShot => {
            if !state.effects.is_active(PowerUpType::CurveShot) {
                for ball in &mut state.balls {
                    ball.curve_since = None;
                }
            }
        }
        PowerUpType::FastBall | PowerUpType::Multiball => {}
    }
}

/// Expire due effects. Each record restores exactly once.
pub fn expire_effects(state: &mut GameState) -> usize {
    let expired = state.effects.take_expired(state.now_ms);
    for effect in &expired {
        restore(state, effect);
        log::debug!("{} expired for {:?}", effect.kind.label(), effect.affected);
    }
    expired.len()
}

/// Remove a single effect early. Unknown handles are ignored.
pub fn cancel_effect(state: &mut GameState, handle: EffectHandle) -> bool {
    match state.effects.remove(handle) {
        Some(effect) => {
            restore(state, &effect);
            true
        }
        None => false,
    }
}

/// Sinusoidal sideways push for curving balls
pub fn apply_curve(ball: &mut Ball, now_ms: f64, scale: f32) {
    let Some(since) = ball.curve_since else {
        return;
    };
    let phase = ((now_ms - since) % CURVE_PERIOD_MS / CURVE_PERIOD_MS) as f32;
    let force = (phase * std::f32::consts::TAU).sin() * CURVE_STRENGTH;
    let perp = Vec2::new(-ball.vel.y, ball.vel.x).normalize_or_zero();
    ball.vel += perp * force * scale;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Capture;
    use rand::SeedableRng;

    fn power_up(id: u32, kind: PowerUpType, pos: Vec2) -> PowerUp {
        PowerUp {
            id,
            kind,
            pos,
            spawned_at_ms: 0.0,
            hover: None,
        }
    }

    #[test]
    fn test_grow_restores_to_baseline_when_stacked() {
        let mut state = GameState::new(1);
        let baseline = state.tuning.paddle_height;

        apply_effect(&mut state, PowerUpType::GrowPaddle, Player::One);
        assert_eq!(state.paddle(Player::One).height, baseline + 40.0);

        state.now_ms += 1000.0;
        apply_effect(&mut state, PowerUpType::GrowPaddle, Player::One);
        assert_eq!(state.paddle(Player::One).height, baseline + 80.0);

        // First grow expires while the second is still running
        state.now_ms = state.tuning.powerup_duration_ms;
        assert_eq!(expire_effects(&mut state), 1);
        assert_eq!(state.paddle(Player::One).height, baseline);
        assert_eq!(state.effects.len(), 1);

        state.now_ms += 1000.0;
        assert_eq!(expire_effects(&mut state), 1);
        assert_eq!(state.paddle(Player::One).height, baseline);
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut state = GameState::new(2);
        let outcome = apply_effect(&mut state, PowerUpType::SpeedUp, Player::Two);
        assert_eq!(state.paddle(Player::Two).speed, state.tuning.paddle_speed + 3.0);

        assert!(cancel_effect(&mut state, outcome.handle));
        assert_eq!(state.paddle(Player::Two).speed, state.tuning.paddle_speed);

        // Second removal does nothing, even if the paddle changed meanwhile
        state.paddle_mut(Player::Two).speed = 42.0;
        assert!(!cancel_effect(&mut state, outcome.handle));
        assert_eq!(state.paddle(Player::Two).speed, 42.0);
    }

    #[test]
    fn test_opponent_effects_have_floors() {
        let mut state = GameState::new(3);
        for _ in 0..10 {
            apply_effect(&mut state, PowerUpType::ShrinkPaddle, Player::One);
            apply_effect(&mut state, PowerUpType::SlowDown, Player::One);
        }
        let victim = state.paddle(Player::Two);
        assert_eq!(victim.height, MIN_PADDLE_HEIGHT);
        assert_eq!(victim.speed, MIN_PADDLE_SPEED);
        assert_eq!(state.paddle(Player::One).height, state.tuning.paddle_height);
    }

    #[test]
    fn test_fast_ball_respects_cap() {
        let mut state = GameState::new(4);
        state.balls[0].vel = Vec2::new(20.0, 0.0);
        apply_effect(&mut state, PowerUpType::FastBall, Player::One);
        assert!((state.balls[0].vel.length() - state.tuning.max_ball_speed).abs() < 1e-4);
    }

    #[test]
    fn test_multiball_mirrors_template() {
        let mut state = GameState::new(5);
        state.balls[0].vel = Vec2::new(6.0, 2.0);
        let outcome = apply_effect(&mut state, PowerUpType::Multiball, Player::One);

        assert_eq!(state.balls.len(), 2);
        let added = state.balls[1];
        assert!(matches!(outcome.changes[0], EffectChange::BallAdded { id } if id == added.id));
        assert_eq!(added.vel.x, -6.0);
        assert!(added.vel.y.abs() <= 3.0);
        assert_eq!(added.pos, state.arena.center());
    }

    #[test]
    fn test_fury_buffs_collector() {
        let mut state = GameState::new(6);
        state.balls[0].vel = Vec2::new(5.0, 0.0);
        let outcome = apply_effect(&mut state, PowerUpType::Fury, Player::Two);
        let paddle = state.paddle(Player::Two);
        assert_eq!(paddle.height, state.tuning.paddle_height + 30.0);
        assert_eq!(paddle.speed, state.tuning.paddle_speed + 4.0);
        assert!((state.balls[0].vel.x - 7.0).abs() < 1e-4);
        assert_eq!(outcome.changes.len(), 3);

        state.now_ms = state.tuning.powerup_duration_ms;
        expire_effects(&mut state);
        let paddle = state.paddle(Player::Two);
        assert_eq!(paddle.height, state.tuning.paddle_height);
        assert_eq!(paddle.speed, state.tuning.paddle_speed);
    }

    #[test]
    fn test_curve_shot_ends_with_last_record() {
        let mut state = GameState::new(7);
        apply_effect(&mut state, PowerUpType::CurveShot, Player::One);
        assert!(state.balls[0].curve_since.is_some());

        state.now_ms = state.tuning.powerup_duration_ms;
        expire_effects(&mut state);
        assert!(state.balls[0].curve_since.is_none());
    }

    #[test]
    fn test_curve_pushes_sideways() {
        let mut ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::new(8.0, 0.0));
        ball.curve_since = Some(0.0);
        // Quarter period: sin = 1
        apply_curve(&mut ball, CURVE_PERIOD_MS / 4.0, 1.0);
        assert!((ball.vel.y - CURVE_STRENGTH).abs() < 1e-4);
        assert_eq!(ball.vel.x, 8.0);
    }

    #[test]
    fn test_collection_attribution_follows_ball_direction() {
        let mut power_ups = vec![
            power_up(1, PowerUpType::GrowPaddle, Vec2::new(300.0, 300.0)),
            power_up(2, PowerUpType::SpeedUp, Vec2::new(500.0, 300.0)),
            power_up(3, PowerUpType::FastBall, Vec2::new(400.0, 100.0)),
        ];
        let balls = [
            Ball::new(1, Vec2::new(305.0, 300.0), Vec2::new(8.0, 0.0)),
            Ball::new(2, Vec2::new(495.0, 300.0), Vec2::new(-8.0, 0.0)),
        ];

        let collected = check_collisions(&balls, &mut power_ups);

        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].kind, PowerUpType::GrowPaddle);
        assert_eq!(collected[0].player, Player::One);
        assert_eq!(collected[1].kind, PowerUpType::SpeedUp);
        assert_eq!(collected[1].player, Player::Two);
        assert_eq!(power_ups.len(), 1);
        assert_eq!(power_ups[0].id, 3);
    }

    #[test]
    fn test_captured_ball_cannot_collect() {
        let mut power_ups = vec![power_up(1, PowerUpType::GrowPaddle, Vec2::new(300.0, 300.0))];
        let mut ball = Ball::new(1, Vec2::new(300.0, 300.0), Vec2::ZERO);
        ball.capture = Some(Capture {
            well: 9,
            stored_vel: Vec2::X,
            since_ms: 0.0,
        });
        assert!(check_collisions(&[ball], &mut power_ups).is_empty());
        assert_eq!(power_ups.len(), 1);
    }

    #[test]
    fn test_fury_is_rare_outside_danger() {
        let mut rng = Pcg32::seed_from_u64(99);
        let fury = (0..4000)
            .filter(|_| choose_kind(&mut rng, false) == PowerUpType::Fury)
            .count();
        // Expected about 4000 / 8 * 0.05 = 25
        assert!(fury < 100, "fury picked {fury} times");

        let mut rng = Pcg32::seed_from_u64(99);
        let danger_fury = (0..4000)
            .filter(|_| choose_kind(&mut rng, true) == PowerUpType::Fury)
            .count();
        assert!(danger_fury > 600);
    }

    #[test]
    fn test_despawn_after_timeout() {
        let mut state = GameState::new(8);
        spawn_kind(&mut state, PowerUpType::SpeedUp);
        assert_eq!(state.power_ups.len(), 1);
        state.now_ms = POWERUP_DESPAWN_MS - 1.0;
        update(&mut state);
        assert_eq!(state.power_ups.len(), 1);
        state.now_ms = POWERUP_DESPAWN_MS;
        update(&mut state);
        assert!(state.power_ups.is_empty());
    }

    #[test]
    fn test_spawn_keeps_spacing() {
        let mut state = GameState::new(9);
        for _ in 0..20 {
            spawn_kind(&mut state, PowerUpType::SpeedUp);
        }
        for (i, a) in state.power_ups.iter().enumerate() {
            for b in &state.power_ups[i + 1..] {
                assert!(a.pos.distance(b.pos) >= POWERUP_MIN_SPACING);
            }
        }
    }
}
