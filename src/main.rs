//! Side Runner entry point
//!
//! Runs an unattended demo session at the fixed tick rate: autopilot input,
//! periodic HUD logging, and a final frame snapshot dumped as JSON so the
//! run can be inspected or piped into a renderer.

use std::time::{Duration, Instant};

use side_runner::consts::*;
use side_runner::sim::{Phase, Session, TickInput, tick};
use side_runner::FrameSnapshot;

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });
    log::info!("Side Runner starting, seed {seed}");

    let mut session = Session::new(seed);
    let tick_duration = Duration::from_secs_f64(1.0 / TICK_RATE as f64);
    let start = Instant::now();
    let mut next_tick = start;

    // Bounded demo run: stop on game over, victory, or the tick cap
    let max_ticks = 60 * 60 * 5;
    for t in 0..max_ticks {
        let now = start.elapsed().as_secs_f64();
        let input = TickInput::autopilot(&session, t);
        tick(&mut session, &input, now);

        if t % 600 == 0 && session.phase == Phase::Playing {
            log::info!(
                "{} score={} coins={} lives={} time={} x={:.0}",
                session.world_label(),
                session.score,
                session.coins,
                session.lives,
                session.time_remaining,
                session.player.pos.x
            );
        }

        if session.phase == Phase::GameOver || session.phase == Phase::Victory {
            break;
        }

        next_tick += tick_duration;
        if let Some(sleep) = next_tick.checked_duration_since(Instant::now()) {
            std::thread::sleep(sleep);
        }
    }

    log::info!(
        "demo finished in {:?}: {:?}, final score {}",
        start.elapsed(),
        session.phase,
        session.score
    );

    let frame = FrameSnapshot::capture(&session);
    match serde_json::to_string_pretty(&frame) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("snapshot serialization failed: {err}"),
    }
}
