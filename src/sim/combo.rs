//! Rally counter and combo milestone celebrations

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, ParticleStyle};
use crate::consts::{BALL_RADIUS, COMBO_MILESTONES, SCREEN_SHAKE_INTENSITY};

/// Consecutive paddle returns since the last point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RallyTracker {
    count: u32,
}

impl RallyTracker {
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Record confirmed paddle hits. Returns (previous, new) count.
    pub fn register_hit(&mut self, increment: u32) -> (u32, u32) {
        let prev = self.count;
        self.count = self.count.saturating_add(increment);
        (prev, self.count)
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Milestones newly crossed going from `prev` to `new` (prev < m <= new)
pub fn crossed_milestones(prev: u32, new: u32) -> impl Iterator<Item = u32> {
    COMBO_MILESTONES
        .into_iter()
        .filter(move |&m| prev < m && m <= new)
}

/// Colour tier for a milestone
pub fn milestone_color(milestone: u32) -> u32 {
    if milestone >= 15 {
        0xef4444
    } else if milestone >= 10 {
        0xf97316
    } else {
        0xfacc15
    }
}

/// Celebration requests for reaching a milestone at `pos`
pub fn milestone_events(milestone: u32, pos: Vec2) -> Vec<GameEvent> {
    let color = milestone_color(milestone);
    let mut events = vec![
        GameEvent::ScreenShake {
            intensity: milestone as f32 / 5.0 * SCREEN_SHAKE_INTENSITY,
        },
        GameEvent::Particles {
            pos,
            count: milestone * 2,
            style: ParticleStyle::burst(color),
        },
    ];
    if milestone >= 10 {
        events.push(GameEvent::Shockwave {
            pos,
            inner: BALL_RADIUS * 2.0,
            outer: BALL_RADIUS * milestone as f32 / 2.0,
            color,
        });
    }
    events.push(GameEvent::ComboSound { milestone });
    events.push(GameEvent::Notification {
        message: format!("{milestone} HIT COMBO!"),
        color,
        duration_ms: 1500,
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_reset() {
        let mut rally = RallyTracker::default();
        assert_eq!(rally.register_hit(1), (0, 1));
        assert_eq!(rally.register_hit(1), (1, 2));
        rally.reset();
        assert_eq!(rally.count(), 0);
    }

    #[test]
    fn test_four_to_five_fires_once() {
        let crossed: Vec<u32> = crossed_milestones(4, 5).collect();
        assert_eq!(crossed, vec![5]);
        // Staying on a milestone does not re-fire it
        assert_eq!(crossed_milestones(5, 5).count(), 0);
    }

    #[test]
    fn test_multi_step_jump_fires_each_milestone() {
        let crossed: Vec<u32> = crossed_milestones(8, 21).collect();
        assert_eq!(crossed, vec![10, 15, 20]);
    }

    #[test]
    fn test_reset_crosses_nothing() {
        assert_eq!(crossed_milestones(12, 0).count(), 0);
    }

    #[test]
    fn test_milestone_events() {
        let small = milestone_events(5, Vec2::ZERO);
        assert!(!small.iter().any(|e| matches!(e, GameEvent::Shockwave { .. })));
        assert!(small.contains(&GameEvent::ComboSound { milestone: 5 }));

        let big = milestone_events(20, Vec2::ZERO);
        assert!(big.iter().any(|e| matches!(
            e,
            GameEvent::Shockwave { outer, color: 0xef4444, .. } if *outer == BALL_RADIUS * 10.0
        )));
        assert!(big.iter().any(|e| matches!(
            e,
            GameEvent::Particles { count: 40, .. }
        )));
    }
}
