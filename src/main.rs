//! Power Pong headless runner
//!
//! Plays an autopilot-vs-autopilot match for a fixed number of frames and
//! reports the result. Rendering and input live in front ends built on the
//! library; this binary exercises the simulation on its own.
//!
//! Usage: `power-pong [frames] [seed] [tuning.json]`

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use power_pong::Tuning;
use power_pong::consts::FRAME_MS;
use power_pong::sim::{GameEvent, GameState, TickInput, tick};

const DEFAULT_FRAMES: u64 = 60 * 60 * 3;

fn main() {
    env_logger::init();
    log::info!("Power Pong (headless) starting...");

    let mut args = std::env::args().skip(1);
    let frames = args
        .next()
        .and_then(|a| a.parse::<u64>().ok())
        .unwrap_or(DEFAULT_FRAMES);
    let seed = args
        .next()
        .and_then(|a| a.parse::<u64>().ok())
        .unwrap_or_else(clock_seed);
    let tuning = match args.next() {
        Some(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Ignoring tuning file {path}: {e}");
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    let mut state = GameState::with_tuning(seed, tuning);
    state.auto_mode = true;
    log::info!("Game initialized with seed: {seed}");

    let input = TickInput::default();
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
    for _ in 0..frames {
        tick(&mut state, &input, FRAME_MS);
        for event in state.drain_events() {
            *counts.entry(event_name(&event)).or_default() += 1;
        }
    }

    log::info!(
        "Simulated {frames} frames ({:.1}s of play)",
        state.now_ms / 1000.0
    );
    for (name, count) in &counts {
        log::info!("  {name}: {count}");
    }
    println!(
        "Final score {} - {} (seed {seed}, danger mode: {})",
        state.scores[0], state.scores[1], state.danger_mode
    );
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

fn event_name(event: &GameEvent) -> &'static str {
    match event {
        GameEvent::ScreenShake { .. } => "screen shakes",
        GameEvent::Particles { .. } => "particle bursts",
        GameEvent::Shockwave { .. } => "shockwaves",
        GameEvent::Notification { .. } => "notifications",
        GameEvent::ComboSound { .. } => "combo milestones",
        GameEvent::Teleport { .. } => "teleports",
        GameEvent::PaddleHit { .. } => "paddle hits",
        GameEvent::WallHit { .. } => "wall hits",
        GameEvent::Scored { .. } => "points",
    }
}
