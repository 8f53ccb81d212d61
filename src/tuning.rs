//! Data-driven game balance
//!
//! Every field has a default matching the classic game. A JSON file may
//! override any subset of fields; missing keys fall back to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tuning value `{name}` = {value} is out of range (expected {expected})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// Game balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Ball ===
    /// Serve speed and floor for paddle returns (px/frame)
    pub ball_speed: f32,
    /// Speed added on every paddle return, before the combo multiplier
    pub ball_acceleration: f32,
    /// Hard cap on ball speed
    pub max_ball_speed: f32,

    // === Paddles ===
    pub paddle_height: f32,
    /// Paddle speed (px/frame)
    pub paddle_speed: f32,

    // === Timers (ms) ===
    pub powerup_duration_ms: f64,
    pub hazard_duration_ms: f64,

    // === Hazard forces ===
    pub gravity_strength: f32,
    pub wind_strength: f32,
    /// Black-hole ejection speed clamp
    pub eject_speed_min: f32,
    pub eject_speed_max: f32,

    // === Spawning (per reference frame probabilities) ===
    pub powerup_spawn_chance: f32,
    pub powerup_max: usize,
    pub hazard_spawn_chance: f32,
    pub hazard_max: usize,
    pub playground_spawn_chance: f32,
    pub playground_max_powerups: usize,
    pub playground_max_hazards: usize,

    // === Autopilot ===
    /// Distance (px) inside which the paddle holds still
    pub ai_dead_zone: f32,
    /// Proportional gain applied to the distance to target
    pub ai_gain: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ball_speed: 8.0,
            ball_acceleration: 0.5,
            max_ball_speed: 24.0,
            paddle_height: 100.0,
            paddle_speed: 10.0,
            powerup_duration_ms: 7000.0,
            hazard_duration_ms: 10_000.0,
            gravity_strength: 0.8,
            wind_strength: 0.5,
            eject_speed_min: 6.0,
            eject_speed_max: 12.0,
            powerup_spawn_chance: 0.008,
            powerup_max: 4,
            hazard_spawn_chance: 0.003,
            hazard_max: 10,
            playground_spawn_chance: 0.015,
            playground_max_powerups: 5,
            playground_max_hazards: 50,
            ai_dead_zone: 10.0,
            ai_gain: 0.35,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON string
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&text)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Check that every value is usable by the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("ball_speed", self.ball_speed)?;
        non_negative("ball_acceleration", self.ball_acceleration)?;
        positive("paddle_height", self.paddle_height)?;
        positive("paddle_speed", self.paddle_speed)?;
        positive("powerup_duration_ms", self.powerup_duration_ms as f32)?;
        positive("hazard_duration_ms", self.hazard_duration_ms as f32)?;
        non_negative("gravity_strength", self.gravity_strength)?;
        non_negative("wind_strength", self.wind_strength)?;
        positive("eject_speed_min", self.eject_speed_min)?;
        non_negative("ai_dead_zone", self.ai_dead_zone)?;
        probability("powerup_spawn_chance", self.powerup_spawn_chance)?;
        probability("hazard_spawn_chance", self.hazard_spawn_chance)?;
        probability("playground_spawn_chance", self.playground_spawn_chance)?;
        probability("ai_gain", self.ai_gain)?;

        if self.max_ball_speed < self.ball_speed {
            return Err(TuningError::OutOfRange {
                name: "max_ball_speed",
                value: self.max_ball_speed as f64,
                expected: ">= ball_speed",
            });
        }
        if self.eject_speed_max < self.eject_speed_min {
            return Err(TuningError::OutOfRange {
                name: "eject_speed_max",
                value: self.eject_speed_max as f64,
                expected: ">= eject_speed_min",
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value: value as f64,
            expected: "> 0",
        })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value: value as f64,
            expected: ">= 0",
        })
    }
}

fn probability(name: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value: value as f64,
            expected: "0..=1",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let tuning = Tuning::from_json(r#"{ "paddle_speed": 14.0, "hazard_max": 3 }"#).unwrap();
        assert_eq!(tuning.paddle_speed, 14.0);
        assert_eq!(tuning.hazard_max, 3);
        assert_eq!(tuning.ball_speed, Tuning::default().ball_speed);
    }

    #[test]
    fn test_rejects_inverted_eject_clamp() {
        let err = Tuning::from_json(r#"{ "eject_speed_min": 10.0, "eject_speed_max": 5.0 }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            TuningError::OutOfRange {
                name: "eject_speed_max",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let err = Tuning::from_json(r#"{ "hazard_spawn_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::OutOfRange { .. }));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }
}
