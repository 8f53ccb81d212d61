//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Measured frame deltas scaled against a reference frame
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod combo;
pub mod hazards;
pub mod powerups;
pub mod predict;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, check_ball_collisions, combo_multiplier};
pub use combo::RallyTracker;
pub use hazards::{Hazard, HazardKind, HazardType, Polarity};
pub use powerups::{ActiveEffect, ActiveEffects, EffectHandle, PowerUp, PowerUpType};
pub use predict::{Prediction, autopilot_target, predict_arrival};
pub use state::{Arena, Ball, GameEvent, GameState, Paddle, Player, Playground};
pub use tick::{Cycle, PaddleIntent, TickInput, tick};
