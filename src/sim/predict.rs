//! Predictive paddle controller
//!
//! Forward-simulates a copy of a ball against a copy of the hazards to guess
//! where it will reach a paddle, then steers the paddle toward that point.
//! Nothing here touches the real game state.

use super::collision::{reflect_off_walls, substep_count};
use super::hazards::{
    Hazard, apply_fields, eject_speed, expire_snapshot, hit_barrier, patrol_step,
    portal_destination, teleport, try_capture,
};
use super::state::{Arena, Ball, Capture, GameState, Paddle, Player};
use crate::Tuning;
use crate::consts::*;
use crate::direction;

/// Simulation step, in reference frames
pub const PREDICT_STEP: f32 = 0.5;
/// Step budget for a normal forecast (6 seconds)
pub const PREDICT_MAX_STEPS: u32 = 720;
/// Longest stretch spent waiting inside a black hole before sampling ejections
pub const TRAPPED_STEPS: u32 = 60;
/// Candidate ejection angles, evenly spread around the well
pub const EJECTION_SAMPLES: u32 = 8;
/// Step budget for each ejection candidate
pub const EJECTION_LOOKAHEAD_STEPS: u32 = 360;
/// Teleports followed per forecast before portals are ignored
pub const MAX_CHAINED_TELEPORTS: u32 = 3;

const STEP_MS: f64 = PREDICT_STEP as f64 * FRAME_MS;

/// Where and when a ball is expected to reach a paddle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub y: f32,
    /// Forecast steps until arrival
    pub steps: u32,
    /// Averaged over sampled black-hole ejections
    pub approximate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StepOutcome {
    Continue,
    Arrived(f32),
    Captured,
    /// Heading past the other paddle; not ours to return
    Lost,
}

struct Forecast<'a> {
    arena: &'a Arena,
    tuning: &'a Tuning,
    player: Player,
    /// Black holes already holding a real ball
    occupied: &'a [u32],
    /// Face line of the defending paddle
    face_x: f32,
    /// Face line of the opposing paddle
    other_face_x: f32,
}

impl<'a> Forecast<'a> {
    fn new(arena: &'a Arena, tuning: &'a Tuning, player: Player, occupied: &'a [u32]) -> Self {
        let face = |p: Player| Paddle::new(p, arena, tuning).face_x(arena);
        Self {
            arena,
            tuning,
            player,
            occupied,
            face_x: face(player),
            other_face_x: face(player.opponent()),
        }
    }

    fn arrival(&self, ball: &Ball) -> StepOutcome {
        let r = ball.radius;
        match self.player {
            Player::One => {
                if ball.vel.x < 0.0 && ball.pos.x - r <= self.face_x {
                    return StepOutcome::Arrived(ball.pos.y);
                }
                if ball.vel.x > 0.0 && ball.pos.x + r >= self.other_face_x {
                    return StepOutcome::Lost;
                }
            }
            Player::Two => {
                if ball.vel.x > 0.0 && ball.pos.x + r >= self.face_x {
                    return StepOutcome::Arrived(ball.pos.y);
                }
                if ball.vel.x < 0.0 && ball.pos.x - r <= self.other_face_x {
                    return StepOutcome::Lost;
                }
            }
        }
        StepOutcome::Continue
    }

    /// Advance the snapshot by one forecast step, replaying the real tick's
    /// hazard order: patrols, fields, capture, movement, walls, barriers, portals.
    fn step(
        &self,
        ball: &mut Ball,
        hazards: &mut Vec<Hazard>,
        now_ms: f64,
        teleports: &mut u32,
    ) -> StepOutcome {
        expire_snapshot(hazards, now_ms);
        for hazard in hazards.iter_mut() {
            patrol_step(hazard, self.arena, PREDICT_STEP);
        }

        apply_fields(ball, hazards, self.tuning, PREDICT_STEP);
        if try_capture(ball, hazards, self.occupied, now_ms).is_some() {
            return StepOutcome::Captured;
        }

        let substeps = substep_count(ball.vel.length() * PREDICT_STEP, ball.radius);
        let sub_scale = PREDICT_STEP / substeps as f32;
        for _ in 0..substeps {
            let prev = ball.pos;
            ball.pos += ball.vel * sub_scale;
            reflect_off_walls(&mut ball.pos, &mut ball.vel, ball.radius, self.arena.height);

            for hazard in hazards.iter_mut() {
                hit_barrier(hazard, ball, prev, self.tuning.max_ball_speed);
            }
            hazards.retain(|h| !h.is_destroyed());

            // Deterministic exit heading: no scatter in the forecast
            if *teleports < MAX_CHAINED_TELEPORTS
                && ball.can_teleport(now_ms)
                && let Some((_, exit)) = portal_destination(hazards, prev, ball.pos)
            {
                teleport(ball, exit, 0.0, now_ms);
                *teleports += 1;
            }

            match self.arrival(ball) {
                StepOutcome::Continue => {}
                outcome => return outcome,
            }
        }
        StepOutcome::Continue
    }

    /// Run forward until arrival, loss, capture or budget exhaustion
    fn run(
        &self,
        ball: &mut Ball,
        hazards: &mut Vec<Hazard>,
        start_ms: f64,
        budget: u32,
    ) -> (StepOutcome, u32) {
        let mut teleports = 0;
        for i in 0..budget {
            let t = start_ms + (i + 1) as f64 * STEP_MS;
            match self.step(ball, hazards, t, &mut teleports) {
                StepOutcome::Continue => {}
                outcome => return (outcome, i + 1),
            }
        }
        (StepOutcome::Continue, budget)
    }

    /// A captured ball: wait out (part of) the capture, then average the
    /// arrivals of evenly spaced ejection angles.
    fn trapped(
        &self,
        ball: &Ball,
        capture: Capture,
        hazards: &[Hazard],
        now_ms: f64,
        steps_so_far: u32,
    ) -> Prediction {
        let well_pos = hazards
            .iter()
            .find(|h| h.id == capture.well)
            .map_or(ball.pos, |h| h.pos);
        let remaining_ms = (CAPTURE_DURATION_MS - (now_ms - capture.since_ms)).max(0.0);
        let wait_steps = ((remaining_ms / STEP_MS).ceil() as u32).min(TRAPPED_STEPS);
        let eject_ms = now_ms + wait_steps as f64 * STEP_MS;

        // The well disappears once it spits the ball out
        let remaining: Vec<Hazard> = hazards
            .iter()
            .copied()
            .filter(|h| h.id != capture.well)
            .collect();
        let speed = eject_speed(capture.stored_vel, self.tuning);

        let mut total_y = 0.0;
        let mut arrivals = 0u32;
        let mut soonest = EJECTION_LOOKAHEAD_STEPS;
        for k in 0..EJECTION_SAMPLES {
            let dir = direction(k as f32 * std::f32::consts::TAU / EJECTION_SAMPLES as f32);
            let mut sample = *ball;
            sample.capture = None;
            sample.pos = well_pos + dir * VORTEX_RADIUS * 1.5;
            sample.vel = dir * speed;
            let mut snapshot = remaining.clone();

            if let (StepOutcome::Arrived(y), steps) =
                self.run(&mut sample, &mut snapshot, eject_ms, EJECTION_LOOKAHEAD_STEPS)
            {
                total_y += y;
                arrivals += 1;
                soonest = soonest.min(steps);
            }
        }

        let y = if arrivals > 0 {
            total_y / arrivals as f32
        } else {
            well_pos.y
        };
        Prediction {
            y,
            steps: steps_so_far + wait_steps + soonest,
            approximate: true,
        }
    }
}

/// Forecast where `ball` reaches `player`'s paddle.
///
/// `occupied` lists black holes holding other balls; they cannot capture this
/// one. Returns `None` if the ball leaves toward the other side or the step
/// budget runs out first.
pub fn predict_arrival(
    ball: &Ball,
    hazards: &[Hazard],
    occupied: &[u32],
    player: Player,
    arena: &Arena,
    tuning: &Tuning,
    now_ms: f64,
) -> Option<Prediction> {
    let forecast = Forecast::new(arena, tuning, player, occupied);
    let mut sim = *ball;
    let mut snapshot = hazards.to_vec();

    if let Some(capture) = sim.capture {
        return Some(forecast.trapped(&sim, capture, &snapshot, now_ms, 0));
    }

    match forecast.run(&mut sim, &mut snapshot, now_ms, PREDICT_MAX_STEPS) {
        (StepOutcome::Arrived(y), steps) => Some(Prediction {
            y,
            steps,
            approximate: false,
        }),
        (StepOutcome::Captured, steps) => {
            let capture = sim.capture?;
            let t = now_ms + steps as f64 * STEP_MS;
            Some(forecast.trapped(&sim, capture, &snapshot, t, steps))
        }
        _ => None,
    }
}

/// Target y for an autonomous paddle: the soonest predicted arrival, or the
/// arena centre when nothing is coming.
pub fn autopilot_target(state: &GameState, player: Player) -> f32 {
    let mut best: Option<Prediction> = None;
    for ball in &state.balls {
        let incoming = ball.is_captured()
            || match player {
                Player::One => ball.vel.x < 0.0,
                Player::Two => ball.vel.x > 0.0,
            };
        if !incoming {
            continue;
        }
        let occupied: Vec<u32> = state
            .balls
            .iter()
            .filter(|b| b.id != ball.id)
            .filter_map(|b| b.capture.map(|c| c.well))
            .collect();
        let Some(prediction) = predict_arrival(
            ball,
            &state.hazards,
            &occupied,
            player,
            &state.arena,
            &state.tuning,
            state.now_ms,
        ) else {
            continue;
        };
        if best.is_none_or(|b| prediction.steps < b.steps) {
            best = Some(prediction);
        }
    }
    best.map_or(state.arena.center().y, |p| p.y)
}

/// Proportional follow with a dead zone, capped at the paddle's speed.
///
/// Returns the distance moved.
pub fn follow(
    paddle: &mut Paddle,
    target_y: f32,
    arena: &Arena,
    dead_zone: f32,
    gain: f32,
    scale: f32,
) -> f32 {
    let diff = target_y - paddle.center_y();
    if diff.abs() <= dead_zone {
        return 0.0;
    }
    let max = paddle.speed * scale;
    let before = paddle.y;
    paddle.move_by((diff * gain).clamp(-max, max), arena);
    paddle.y - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::hazards::{HazardKind, Polarity};
    use glam::Vec2;

    fn predict_y(ball: &Ball, hazards: &[Hazard], player: Player, tuning: &Tuning) -> Option<f32> {
        predict_arrival(ball, hazards, &[], player, &Arena::default(), tuning, 0.0).map(|p| p.y)
    }

    fn wind(direction: Vec2) -> Hazard {
        Hazard {
            id: 1,
            pos: Vec2::new(300.0, 300.0),
            created_at_ms: 0.0,
            duration_ms: 60_000.0,
            kind: HazardKind::WindZone { direction },
        }
    }

    #[test]
    fn test_straight_shot() {
        let tuning = Tuning::default();
        let ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::new(-8.0, 0.0));
        let prediction =
            predict_arrival(&ball, &[], &[], Player::One, &Arena::default(), &tuning, 0.0).unwrap();
        assert!((prediction.y - 300.0).abs() < 1e-3);
        assert!(!prediction.approximate);
    }

    #[test]
    fn test_wall_bounce_stays_in_bounds() {
        let tuning = Tuning::default();
        let ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::new(-8.0, -6.0));
        let y = predict_y(&ball, &[], Player::One, &tuning).unwrap();
        assert!(y >= BALL_RADIUS && y <= ARENA_HEIGHT - BALL_RADIUS);
    }

    #[test]
    fn test_ball_heading_away_is_lost() {
        let tuning = Tuning::default();
        let ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::new(8.0, 0.0));
        assert_eq!(predict_y(&ball, &[], Player::One, &tuning), None);
        assert!(predict_y(&ball, &[], Player::Two, &tuning).is_some());
    }

    #[test]
    fn test_vertical_wind_deflection_scales_with_strength() {
        let tuning = Tuning::default();
        let ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::new(-8.0, 0.0));

        let calm = predict_y(&ball, &[], Player::One, &tuning).unwrap();
        let light = predict_y(&ball, &[wind(Vec2::new(0.0, 0.1))], Player::One, &tuning).unwrap();
        let strong = predict_y(&ball, &[wind(Vec2::new(0.0, 0.2))], Player::One, &tuning).unwrap();

        let d1 = light - calm;
        let d2 = strong - calm;
        assert!(d1 > 1.0);
        assert!((d2 / d1 - 2.0).abs() < 0.02, "ratio {}", d2 / d1);
    }

    #[test]
    fn test_horizontal_wind_changes_arrival() {
        let tuning = Tuning::default();
        // Headwind slows the approach, leaving more time to drift down
        let ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::new(-8.0, 1.0));
        let calm = predict_y(&ball, &[], Player::One, &tuning).unwrap();
        let windy = predict_y(&ball, &[wind(Vec2::new(0.1, 0.0))], Player::One, &tuning).unwrap();
        assert!(windy > calm + 1.0);
    }

    #[test]
    fn test_portal_is_followed() {
        let tuning = Tuning::default();
        let hazards = [
            Hazard {
                id: 1,
                pos: Vec2::new(300.0, 300.0),
                created_at_ms: 0.0,
                duration_ms: 60_000.0,
                kind: HazardKind::Portal {
                    partner: 2,
                    is_entry: true,
                },
            },
            Hazard {
                id: 2,
                pos: Vec2::new(500.0, 150.0),
                created_at_ms: 0.0,
                duration_ms: 60_000.0,
                kind: HazardKind::Portal {
                    partner: 1,
                    is_entry: false,
                },
            },
        ];
        let ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::new(-8.0, 0.0));
        let y = predict_y(&ball, &hazards, Player::One, &tuning).unwrap();
        assert!((y - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_barrier_bounce_does_not_touch_real_hazards() {
        let tuning = Tuning::default();
        let hazards = [Hazard {
            id: 1,
            pos: Vec2::new(300.0, 300.0),
            created_at_ms: 0.0,
            duration_ms: 60_000.0,
            kind: HazardKind::Barrier {
                hit_points: 3,
                max_hit_points: 3,
                patrol: None,
            },
        }];
        let ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::new(-8.0, 0.0));

        // Bounced back toward the other side
        assert_eq!(predict_y(&ball, &hazards, Player::One, &tuning), None);
        assert_eq!(hazards[0].hit_points(), Some(3));
    }

    #[test]
    fn test_trapped_ball_averages_ejections() {
        let tuning = Tuning::default();
        let hazards = [Hazard {
            id: 7,
            pos: Vec2::new(400.0, 300.0),
            created_at_ms: 0.0,
            duration_ms: 60_000.0,
            kind: HazardKind::GravityWell {
                polarity: Polarity::Attract,
            },
        }];
        let mut ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::ZERO);
        ball.capture = Some(Capture {
            well: 7,
            stored_vel: Vec2::new(-8.0, 0.0),
            since_ms: 0.0,
        });

        let prediction =
            predict_arrival(&ball, &hazards, &[], Player::One, &Arena::default(), &tuning, 500.0)
                .unwrap();

        assert!(prediction.approximate);
        // Mirror-symmetric samples average back to the well's height
        assert!((prediction.y - 300.0).abs() < 0.5, "y = {}", prediction.y);
    }

    fn portal(id: u32, partner: u32, pos: Vec2) -> Hazard {
        Hazard {
            id,
            pos,
            created_at_ms: 0.0,
            duration_ms: 600_000.0,
            kind: HazardKind::Portal {
                partner,
                is_entry: id < partner,
            },
        }
    }

    #[test]
    fn test_portal_loop_stops_at_chain_cap() {
        // Exiting at B sends the ball straight back into A once the cooldown
        // has run out, so only the chain cap lets it reach the paddle
        let tuning = Tuning::default();
        let arena = Arena::default();
        let mut hazards = vec![
            portal(1, 2, Vec2::new(600.0, 300.0)),
            portal(2, 1, Vec2::new(760.0, 300.0)),
        ];
        let mut ball = Ball::new(1, Vec2::new(660.0, 300.0), Vec2::new(-2.0, 0.0));
        let forecast = Forecast::new(&arena, &tuning, Player::One, &[]);

        let (outcome, steps) = forecast.run(&mut ball, &mut hazards, 0.0, 5000);

        let StepOutcome::Arrived(y) = outcome else {
            panic!("forecast never reached the paddle: {outcome:?}");
        };
        assert!((y - 300.0).abs() < 0.01);
        // Approach, three loops of 125 px, then the run to the paddle (1 px per step)
        let expected = 25 + 3 * 125 + (760 - 53);
        assert!((steps as i64 - expected).abs() <= 3, "steps = {steps}");
    }

    #[test]
    fn test_occupied_black_hole_cannot_capture() {
        let tuning = Tuning::default();
        let hazards = [Hazard {
            id: 7,
            pos: Vec2::new(300.0, 300.0),
            created_at_ms: 0.0,
            duration_ms: 60_000.0,
            kind: HazardKind::GravityWell {
                polarity: Polarity::Attract,
            },
        }];
        let ball = Ball::new(1, Vec2::new(400.0, 300.0), Vec2::new(-8.0, 0.0));
        let arena = Arena::default();

        let free = predict_arrival(&ball, &hazards, &[], Player::One, &arena, &tuning, 0.0).unwrap();
        assert!(free.approximate);

        let held = predict_arrival(&ball, &hazards, &[7], Player::One, &arena, &tuning, 0.0).unwrap();
        assert!(!held.approximate);
        assert!((held.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_autopilot_ignores_wells_holding_other_balls() {
        let mut state = GameState::new(1);
        let id = state.next_entity_id();
        state.hazards.push(Hazard {
            id,
            pos: Vec2::new(300.0, 200.0),
            created_at_ms: 0.0,
            duration_ms: 60_000.0,
            kind: HazardKind::GravityWell {
                polarity: Polarity::Attract,
            },
        });
        let held = state.spawn_ball(Vec2::new(300.0, 200.0), Vec2::ZERO);
        state.balls.iter_mut().find(|b| b.id == held).unwrap().capture = Some(Capture {
            well: id,
            stored_vel: Vec2::new(8.0, 0.0),
            since_ms: 0.0,
        });
        // The free ball is closer to the paddle than any ejected one could be
        state.balls[0].pos = Vec2::new(100.0, 200.0);
        state.balls[0].vel = Vec2::new(-8.0, 0.0);

        assert!((autopilot_target(&state, Player::One) - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_autopilot_idles_at_center() {
        let mut state = GameState::new(1);
        state.balls[0].vel = Vec2::new(8.0, 0.0);
        assert_eq!(autopilot_target(&state, Player::One), state.arena.center().y);
    }

    #[test]
    fn test_follow_dead_zone_and_cap() {
        let arena = Arena::default();
        let tuning = Tuning::default();
        let mut paddle = Paddle::new(Player::One, &arena, &tuning);

        assert_eq!(follow(&mut paddle, 305.0, &arena, 10.0, 0.35, 1.0), 0.0);

        let moved = follow(&mut paddle, 550.0, &arena, 10.0, 0.35, 1.0);
        assert!((moved - paddle.speed).abs() < 1e-4);

        let moved = follow(&mut paddle, 290.0, &arena, 10.0, 0.35, 1.0);
        assert!(moved < 0.0 && moved.abs() <= paddle.speed);
    }
}
