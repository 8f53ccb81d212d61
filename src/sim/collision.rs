//! Collision detection and response
//!
//! Ball against the top/bottom walls and the two paddles, plus goal detection.
//! Everything here is pure: callers turn the returned [`CollisionResult`] into
//! rally updates and presentation events.

use glam::Vec2;

use super::state::{Arena, Ball, Paddle, Player};
use crate::Tuning;
use crate::consts::*;
use crate::direction;

/// What happened to a ball during one collision pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionResult {
    /// Paddle that returned the ball, if any
    pub paddle_hit: Option<Player>,
    pub wall_hit: bool,
    /// Wall hit fast enough to warrant shake and sparks
    pub hard_wall_hit: bool,
    /// Player awarded a point (ball fully left the arena)
    pub scored: Option<Player>,
    pub rally_increment: u32,
}

impl CollisionResult {
    pub fn is_paddle_hit(&self) -> bool {
        self.paddle_hit.is_some()
    }

    pub fn is_score(&self) -> bool {
        self.scored.is_some()
    }
}

/// Speed multiplier for a rally length: flat up to 5 hits, then logarithmic, capped at 2.5
pub fn combo_multiplier(rally: u32) -> f32 {
    if rally <= 5 {
        1.0
    } else {
        (1.0 + (rally as f32 / 5.0).log10() * 0.5).min(2.5)
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce off the top and bottom walls.
///
/// Returns the vertical speed at impact when the ball was moving into a wall.
/// The position is always clamped inside `[radius, height - radius]`.
pub fn reflect_off_walls(pos: &mut Vec2, vel: &mut Vec2, radius: f32, height: f32) -> Option<f32> {
    let min_y = radius;
    let max_y = (height - radius).max(min_y);
    let mut impact = None;

    if pos.y < min_y {
        if vel.y < 0.0 {
            impact = Some(vel.y.abs());
            *vel = reflect_velocity(*vel, Vec2::Y);
        }
        pos.y = min_y;
    } else if pos.y > max_y {
        if vel.y > 0.0 {
            impact = Some(vel.y.abs());
            *vel = reflect_velocity(*vel, Vec2::NEG_Y);
        }
        pos.y = max_y;
    }

    impact
}

/// Axis-aligned overlap between the ball's bounding box and a paddle
pub fn overlaps_paddle(ball: &Ball, paddle: &Paddle, arena: &Arena) -> bool {
    let (x0, x1) = paddle.x_range(arena);
    ball.pos.x + ball.radius >= x0
        && ball.pos.x - ball.radius <= x1
        && ball.pos.y + ball.radius >= paddle.y
        && ball.pos.y - ball.radius <= paddle.y + paddle.height
}

/// Normalized hit position in [-0.5, 0.5], 0 at the paddle centre
pub fn hit_offset(ball_y: f32, paddle: &Paddle) -> f32 {
    ((ball_y - paddle.center_y()) / paddle.height).clamp(-0.5, 0.5)
}

/// Resolve walls, paddles and goals for one ball, mutating it in place.
///
/// `rally` is the rally length before this hit and drives the combo multiplier.
pub fn check_ball_collisions(
    ball: &mut Ball,
    paddles: &[Paddle; 2],
    arena: &Arena,
    rally: u32,
    tuning: &Tuning,
) -> CollisionResult {
    let mut result = CollisionResult::default();

    // --- WALLS ---
    if let Some(impact) = reflect_off_walls(&mut ball.pos, &mut ball.vel, ball.radius, arena.height)
    {
        result.wall_hit = true;
        result.hard_wall_hit = impact > WALL_HARD_HIT_SPEED;
    }

    // --- PADDLES ---
    for paddle in paddles {
        // Only the paddle the ball is travelling toward can return it
        let approaching = match paddle.player {
            Player::One => ball.vel.x < 0.0,
            Player::Two => ball.vel.x > 0.0,
        };
        if !approaching || !overlaps_paddle(ball, paddle, arena) {
            continue;
        }

        // Ignore balls whose centre is already behind the paddle
        let (x0, x1) = paddle.x_range(arena);
        let behind = match paddle.player {
            Player::One => ball.pos.x < x0,
            Player::Two => ball.pos.x > x1,
        };
        if behind {
            continue;
        }

        let offset = hit_offset(ball.pos.y, paddle);
        let angle = offset * PADDLE_DEFLECTION;
        let base = (ball.vel.length() + tuning.ball_acceleration).max(tuning.ball_speed);
        let speed = (base * combo_multiplier(rally)).min(tuning.max_ball_speed);

        let dir = direction(angle);
        let sign = paddle.player.serve_sign();
        ball.vel = Vec2::new(dir.x * sign, dir.y) * speed;

        // Place the ball just off the face so it can't re-trigger next step
        ball.pos.x = paddle.face_x(arena) + sign * (ball.radius + 1.0);

        result.paddle_hit = Some(paddle.player);
        result.rally_increment = 1;
        break;
    }

    // --- GOALS ---
    if ball.pos.x + ball.radius < 0.0 {
        result.scored = Some(Player::Two);
    } else if ball.pos.x - ball.radius > arena.width {
        result.scored = Some(Player::One);
    }

    result
}

/// Sub-steps needed so a ball never moves more than `SUBSTEP_FACTOR` radii per step
pub fn substep_count(distance: f32, radius: f32) -> u32 {
    if !distance.is_finite() || distance <= 0.0 {
        return 1;
    }
    let step = (radius * SUBSTEP_FACTOR).max(0.5);
    ((distance / step).ceil() as u32).clamp(1, MAX_SUBSTEPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arena, [Paddle; 2], Tuning) {
        let arena = Arena::default();
        let tuning = Tuning::default();
        let mut left = Paddle::new(Player::One, &arena, &tuning);
        left.y = 200.0;
        let right = Paddle::new(Player::Two, &arena, &tuning);
        (arena, [left, right], tuning)
    }

    #[test]
    fn test_combo_multiplier() {
        assert_eq!(combo_multiplier(0), 1.0);
        assert_eq!(combo_multiplier(5), 1.0);
        assert!((combo_multiplier(50) - 1.5).abs() < 1e-5);
        assert_eq!(combo_multiplier(1_000_000), 2.5);
    }

    #[test]
    fn test_paddle_hit_offset_angle() {
        let (arena, paddles, tuning) = setup();
        // Left paddle spans y 200..300; ball touching its face at y = 260
        let face = paddles[0].face_x(&arena);
        let mut ball = Ball::new(1, Vec2::new(face + 6.0, 260.0), Vec2::new(-8.0, 0.0));

        let result = check_ball_collisions(&mut ball, &paddles, &arena, 0, &tuning);

        assert_eq!(result.paddle_hit, Some(Player::One));
        assert!(result.is_paddle_hit());
        assert_eq!(result.rally_increment, 1);
        assert!(ball.vel.x > 0.0);
        let angle = ball.vel.y.atan2(ball.vel.x).to_degrees();
        assert!((angle - 6.0).abs() < 1e-3, "angle was {angle}");
        assert_eq!(ball.pos.x, face + ball.radius + 1.0);
    }

    #[test]
    fn test_paddle_hit_respects_speed_cap() {
        let (arena, paddles, tuning) = setup();
        let face = paddles[0].face_x(&arena);
        let mut ball = Ball::new(1, Vec2::new(face + 4.0, 250.0), Vec2::new(-23.9, 0.0));

        check_ball_collisions(&mut ball, &paddles, &arena, 100, &tuning);

        assert!(ball.vel.length() <= tuning.max_ball_speed + 1e-4);
    }

    #[test]
    fn test_ball_moving_away_is_not_returned() {
        let (arena, paddles, tuning) = setup();
        let face = paddles[0].face_x(&arena);
        let mut ball = Ball::new(1, Vec2::new(face + 4.0, 250.0), Vec2::new(8.0, 0.0));

        let result = check_ball_collisions(&mut ball, &paddles, &arena, 0, &tuning);

        assert!(result.paddle_hit.is_none());
        assert_eq!(ball.vel, Vec2::new(8.0, 0.0));
    }

    #[test]
    fn test_top_wall_reflects_and_clamps() {
        let (arena, paddles, tuning) = setup();
        let mut ball = Ball::new(1, Vec2::new(400.0, 3.0), Vec2::new(5.0, -6.0));

        let result = check_ball_collisions(&mut ball, &paddles, &arena, 0, &tuning);

        assert!(result.wall_hit);
        assert!(result.hard_wall_hit);
        assert_eq!(ball.pos.y, ball.radius);
        assert_eq!(ball.vel, Vec2::new(5.0, 6.0));
    }

    #[test]
    fn test_soft_wall_hit() {
        let (arena, paddles, tuning) = setup();
        let mut ball = Ball::new(1, Vec2::new(400.0, 597.0), Vec2::new(5.0, 2.0));

        let result = check_ball_collisions(&mut ball, &paddles, &arena, 0, &tuning);

        assert!(result.wall_hit);
        assert!(!result.hard_wall_hit);
        assert_eq!(ball.pos.y, arena.height - ball.radius);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_scoring_sides() {
        let (arena, paddles, tuning) = setup();
        let mut left_exit = Ball::new(1, Vec2::new(-9.0, 100.0), Vec2::new(-8.0, 0.0));
        let mut right_exit = Ball::new(2, Vec2::new(arena.width + 9.0, 100.0), Vec2::new(8.0, 0.0));

        let a = check_ball_collisions(&mut left_exit, &paddles, &arena, 0, &tuning);
        let b = check_ball_collisions(&mut right_exit, &paddles, &arena, 0, &tuning);

        assert_eq!(a.scored, Some(Player::Two));
        assert_eq!(b.scored, Some(Player::One));
    }

    #[test]
    fn test_partially_out_is_not_a_score() {
        let (arena, paddles, tuning) = setup();
        let mut ball = Ball::new(1, Vec2::new(-2.0, 100.0), Vec2::new(-8.0, 0.0));
        let result = check_ball_collisions(&mut ball, &paddles, &arena, 0, &tuning);
        assert!(!result.is_score());
    }

    #[test]
    fn test_substep_count() {
        assert_eq!(substep_count(0.0, 8.0), 1);
        assert_eq!(substep_count(8.0, 8.0), 3);
        assert_eq!(substep_count(f32::NAN, 8.0), 1);
        assert_eq!(substep_count(1.0e6, 8.0), MAX_SUBSTEPS);
    }
}
