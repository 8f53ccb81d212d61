//! Power Pong - two-paddle arcade Pong with power-ups and hazards
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, hazards, power-ups, autopilot)
//! - `tuning`: Data-driven game balance
//!
//! Rendering, audio and UI are not part of this crate. The simulation emits
//! [`sim::GameEvent`]s describing presentation requests (shake, particles,
//! shockwaves, notifications, sounds) which a front end drains every frame.
//!
//! Units follow the classic 60 Hz canvas game: positions in pixels, velocities
//! in pixels per reference frame. Every tick receives a measured delta time in
//! milliseconds and scales motion by `dt / FRAME_MS`.

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference frame length (ms). Velocities are expressed per reference frame.
    pub const FRAME_MS: f64 = 16.67;
    /// Largest delta accepted by a single tick (ms), avoids huge jumps after a stall
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Default arena dimensions
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;

    /// Paddle geometry
    pub const PADDLE_WIDTH: f32 = 15.0;
    /// Gap between the arena edge and the paddle's outer face
    pub const PADDLE_MARGIN: f32 = 30.0;
    pub const MIN_PADDLE_HEIGHT: f32 = 30.0;
    pub const MIN_PADDLE_SPEED: f32 = 3.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    /// Reflection angle per unit of normalized hit offset (60°, so ±30° at the edges)
    pub const PADDLE_DEFLECTION: f32 = std::f32::consts::FRAC_PI_3;
    /// Sub-step length as a fraction of the ball radius
    pub const SUBSTEP_FACTOR: f32 = 0.4;
    /// Upper bound on sub-steps per frame
    pub const MAX_SUBSTEPS: u32 = 64;
    /// Vertical speed above which a wall hit counts as "hard" (shake + sparks)
    pub const WALL_HARD_HIT_SPEED: f32 = 4.0;
    /// Escape speed used when a ball has no usable stored velocity
    pub const DEFAULT_ESCAPE_SPEED: f32 = 6.0;
    /// Serve angle spread either side of horizontal (±30°)
    pub const SERVE_ANGLE_SPREAD: f32 = std::f32::consts::PI / 6.0;
    /// Ball freeze after a round reset (ms)
    pub const ROUND_FREEZE_MS: f64 = 1000.0;

    /// Power-up geometry and timing
    pub const POWERUP_SIZE: f32 = 30.0;
    pub const POWERUP_DESPAWN_MS: f64 = 10_000.0;
    pub const POWERUP_MIN_SPACING: f32 = 75.0;
    pub const PLACEMENT_ATTEMPTS: u32 = 15;
    /// Curve shot force amplitude and period
    pub const CURVE_STRENGTH: f32 = 0.4;
    pub const CURVE_PERIOD_MS: f64 = 2000.0;

    /// Spawn area: keep clear of the paddles horizontally and the walls vertically
    pub const SAFE_ZONE_X: f32 = 100.0;
    pub const SAFE_ZONE_Y: f32 = 50.0;

    /// Visual radius shared by gravity wells and portals
    pub const VORTEX_RADIUS: f32 = 35.0;
    /// Capture radius as a fraction of the vortex radius
    pub const CAPTURE_FACTOR: f32 = 0.4;
    /// Influence radius as a multiple of the vortex radius
    pub const INFLUENCE_FACTOR: f32 = 3.0;
    /// Time a captured ball orbits before ejection (ms)
    pub const CAPTURE_DURATION_MS: f64 = 2000.0;
    pub const ATTRACT_MULTIPLIER: f32 = 2.0;
    pub const REPEL_MULTIPLIER: f32 = 3.5;

    pub const WIND_ZONE_SIZE: f32 = 150.0;

    pub const BARRIER_WIDTH: f32 = 18.0;
    pub const BARRIER_HEIGHT: f32 = 75.0;
    pub const BARRIER_SEGMENTS: u8 = 3;
    pub const BARRIER_HIT_POINTS: u8 = 3;
    /// Speed multiplier applied to the reflected component on a barrier hit
    pub const BARRIER_BOUNCE_BOOST: f32 = 1.1;

    pub const PORTAL_RADIUS: f32 = VORTEX_RADIUS;
    /// Maximum outgoing angle perturbation (±22.5°)
    pub const PORTAL_SCATTER: f32 = std::f32::consts::PI / 8.0;
    pub const TELEPORT_COOLDOWN_MS: f64 = 1000.0;

    /// Screen shake
    pub const SCREEN_SHAKE_INTENSITY: f32 = 10.0;

    /// Rally lengths that trigger combo celebrations
    pub const COMBO_MILESTONES: [u32; 10] = [5, 10, 15, 20, 25, 30, 40, 50, 75, 100];
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector for an angle (radians, 0 = +x, y grows downward)
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Rotate a velocity by `delta` radians, preserving its speed
#[inline]
pub fn rotate_velocity(vel: Vec2, delta: f32) -> Vec2 {
    let speed = vel.length();
    let angle = vel.y.atan2(vel.x) + delta;
    direction(normalize_angle(angle)) * speed
}

/// Rescale a velocity so its length never exceeds `max`
#[inline]
pub fn cap_speed(vel: Vec2, max: f32) -> Vec2 {
    let speed = vel.length();
    if speed > max && speed > 0.0 {
        vel * (max / speed)
    } else {
        vel
    }
}

/// Frame scale for a delta in milliseconds (1.0 at 60 Hz)
#[inline]
pub fn frame_scale(dt_ms: f64) -> f32 {
    (dt_ms / consts::FRAME_MS) as f32
}
