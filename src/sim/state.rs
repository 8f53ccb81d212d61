//! Game state and core simulation types
//!
//! Everything the tick mutates lives in [`GameState`]. Presentation layers
//! only read it and drain [`GameEvent`]s.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combo::RallyTracker;
use super::hazards::{Hazard, HazardType};
use super::powerups::{ActiveEffects, PowerUp, PowerUpType};
use crate::Tuning;
use crate::consts::*;
use crate::direction;

/// One of the two sides. `One` defends the left goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Horizontal direction a ball travels after this player returns it
    pub fn serve_sign(self) -> f32 {
        match self {
            Player::One => 1.0,
            Player::Two => -1.0,
        }
    }

    /// Feedback colour used for this side's hits
    pub fn color(self) -> u32 {
        match self {
            Player::One => 0x3b82f6,
            Player::Two => 0xef4444,
        }
    }
}

/// Playfield dimensions (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

impl Arena {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Random point inside the spawn area (clear of paddles and walls)
    pub fn random_spawn_point(&self, rng: &mut Pcg32) -> Vec2 {
        let (x0, x1) = (SAFE_ZONE_X, (self.width - SAFE_ZONE_X).max(SAFE_ZONE_X + 1.0));
        let (y0, y1) = (SAFE_ZONE_Y, (self.height - SAFE_ZONE_Y).max(SAFE_ZONE_Y + 1.0));
        Vec2::new(rng.random_range(x0..x1), rng.random_range(y0..y1))
    }
}

/// A vertical paddle. `y` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub player: Player,
    pub y: f32,
    pub height: f32,
    /// Pixels per reference frame
    pub speed: f32,
}

impl Paddle {
    pub fn new(player: Player, arena: &Arena, tuning: &Tuning) -> Self {
        Self {
            player,
            y: (arena.height - tuning.paddle_height) / 2.0,
            height: tuning.paddle_height,
            speed: tuning.paddle_speed,
        }
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Horizontal extent (left, right)
    pub fn x_range(&self, arena: &Arena) -> (f32, f32) {
        match self.player {
            Player::One => (PADDLE_MARGIN, PADDLE_MARGIN + PADDLE_WIDTH),
            Player::Two => (
                arena.width - PADDLE_MARGIN - PADDLE_WIDTH,
                arena.width - PADDLE_MARGIN,
            ),
        }
    }

    /// The edge facing the middle of the arena
    pub fn face_x(&self, arena: &Arena) -> f32 {
        let (x0, x1) = self.x_range(arena);
        match self.player {
            Player::One => x1,
            Player::Two => x0,
        }
    }

    /// Keep the paddle fully inside the arena
    pub fn clamp(&mut self, arena: &Arena) {
        let max_y = (arena.height - self.height).max(0.0);
        self.y = self.y.clamp(0.0, max_y);
    }

    pub fn move_by(&mut self, dy: f32, arena: &Arena) {
        self.y += dy;
        self.clamp(arena);
    }

    /// Change height around the current centre
    pub fn set_height(&mut self, height: f32, arena: &Arena) {
        let center = self.center_y();
        self.height = height;
        self.y = center - height / 2.0;
        self.clamp(arena);
    }

    /// Restore tuning defaults (height and speed), keeping the paddle centred where it was
    pub fn reset(&mut self, tuning: &Tuning, arena: &Arena) {
        self.speed = tuning.paddle_speed;
        self.set_height(tuning.paddle_height, arena);
    }
}

/// Black-hole capture bookkeeping carried by a ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    /// Hazard id of the owning gravity well
    pub well: u32,
    /// Velocity the ball had when it was caught
    pub stored_vel: Vec2,
    /// Simulation time of capture (ms)
    pub since_ms: f64,
}

/// A ball entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    /// Pixels per reference frame
    pub vel: Vec2,
    pub radius: f32,
    /// Curve shot start time (ms) while the effect is active
    pub curve_since: Option<f64>,
    pub capture: Option<Capture>,
    /// Portals are ignored until this time (ms)
    pub teleport_ready_at: Option<f64>,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            pos,
            vel,
            radius: BALL_RADIUS,
            curve_since: None,
            capture: None,
            teleport_ready_at: None,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.capture.is_some()
    }

    pub fn can_teleport(&self, now_ms: f64) -> bool {
        self.teleport_ready_at.is_none_or(|t| now_ms >= t)
    }
}

/// Particle burst styling handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleStyle {
    pub speed: (f32, f32),
    pub size: (f32, f32),
    pub life_ms: (f32, f32),
    pub color: u32,
    /// Emission cone (radians), TAU for a full ring
    pub spread: f32,
}

impl ParticleStyle {
    /// Radial burst in every direction
    pub fn burst(color: u32) -> Self {
        Self {
            speed: (2.0, 6.0),
            size: (2.0, 5.0),
            life_ms: (400.0, 900.0),
            color,
            spread: std::f32::consts::TAU,
        }
    }

    /// Short, fast sparks in a narrow cone
    pub fn sparks(color: u32) -> Self {
        Self {
            speed: (3.0, 8.0),
            size: (1.0, 3.0),
            life_ms: (150.0, 400.0),
            color,
            spread: std::f32::consts::FRAC_PI_2,
        }
    }
}

/// Presentation requests emitted by the simulation (fire and forget)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScreenShake {
        intensity: f32,
    },
    Particles {
        pos: Vec2,
        count: u32,
        style: ParticleStyle,
    },
    Shockwave {
        pos: Vec2,
        inner: f32,
        outer: f32,
        color: u32,
    },
    Notification {
        message: String,
        color: u32,
        duration_ms: u32,
    },
    ComboSound {
        milestone: u32,
    },
    Teleport {
        from: Vec2,
        to: Vec2,
    },
    PaddleHit {
        player: Player,
    },
    WallHit {
        hard: bool,
    },
    Scored {
        player: Player,
        y: f32,
    },
}

/// Playground (sandbox) selections
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Playground {
    pub enabled: bool,
    /// Only this power-up spawns; `None` disables power-up spawning
    pub power_up: Option<PowerUpType>,
    /// Only this hazard spawns; `None` disables hazard spawning
    pub hazard: Option<HazardType>,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub arena: Arena,
    /// Simulation clock (ms). Only advances while unpaused.
    pub now_ms: f64,
    pub paddles: [Paddle; 2],
    /// Active balls (sorted by id for determinism)
    pub balls: Vec<Ball>,
    /// Active hazards (sorted by id for determinism)
    pub hazards: Vec<Hazard>,
    /// Uncollected power-ups (sorted by id for determinism)
    pub power_ups: Vec<PowerUp>,
    pub effects: ActiveEffects,
    pub rally: RallyTracker,
    pub scores: [u32; 2],
    pub danger_mode: bool,
    pub paused: bool,
    pub auto_mode: bool,
    pub playground: Playground,
    /// Balls stay still until this time after a round reset
    pub freeze_until_ms: f64,
    /// Pending presentation requests
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed and default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let arena = Arena::default();
        let paddles = [
            Paddle::new(Player::One, &arena, &tuning),
            Paddle::new(Player::Two, &arena, &tuning),
        ];
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            arena,
            now_ms: 0.0,
            paddles,
            balls: Vec::new(),
            hazards: Vec::new(),
            power_ups: Vec::new(),
            effects: ActiveEffects::default(),
            rally: RallyTracker::default(),
            scores: [0, 0],
            danger_mode: false,
            paused: false,
            auto_mode: false,
            playground: Playground::default(),
            freeze_until_ms: 0.0,
            events: Vec::new(),
            next_id: 1,
        };

        state.reset_round();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn paddle(&self, player: Player) -> &Paddle {
        &self.paddles[player.index()]
    }

    pub fn paddle_mut(&mut self, player: Player) -> &mut Paddle {
        &mut self.paddles[player.index()]
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn notify(&mut self, message: impl Into<String>, color: u32, duration_ms: u32) {
        self.emit(GameEvent::Notification {
            message: message.into(),
            color,
            duration_ms,
        });
    }

    /// Take all pending presentation requests
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Resize the arena (e.g. window resize) and keep paddles inside it
    pub fn set_arena(&mut self, width: f32, height: f32) {
        self.arena = Arena { width, height };
        for paddle in &mut self.paddles {
            paddle.clamp(&self.arena);
        }
    }

    /// Add a ball and return its id
    pub fn spawn_ball(&mut self, pos: Vec2, vel: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.balls.push(Ball::new(id, pos, vel));
        id
    }

    /// Serve a fresh ball from the centre toward a random side
    pub fn serve_ball(&mut self) -> u32 {
        let angle = self
            .rng
            .random_range(-SERVE_ANGLE_SPREAD..=SERVE_ANGLE_SPREAD);
        let side = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let dir = direction(angle);
        let vel = Vec2::new(dir.x * side, dir.y) * self.tuning.ball_speed;
        let center = self.arena.center();
        self.spawn_ball(center, vel)
    }

    /// Start a new round: one served ball, default paddles, no effects, rally cleared
    pub fn reset_round(&mut self) {
        self.balls.clear();
        self.effects.clear();
        self.rally.reset();
        for paddle in &mut self.paddles {
            paddle.reset(&self.tuning, &self.arena);
        }
        self.serve_ball();
        self.freeze_until_ms = self.now_ms + ROUND_FREEZE_MS;
        log::info!(
            "Round reset (score {}-{})",
            self.scores[0],
            self.scores[1]
        );
    }

    pub fn is_frozen(&self) -> bool {
        self.now_ms < self.freeze_until_ms
    }

    /// Close scores late in the game intensify spawning
    pub fn compute_danger_mode(&self) -> bool {
        let [a, b] = self.scores;
        a.abs_diff(b) <= 2 && a.max(b) >= 5
    }

    /// Ensure entity lists are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
        self.hazards.sort_by_key(|h| h.id);
        self.power_ups.sort_by_key(|p| p.id);
    }
}
