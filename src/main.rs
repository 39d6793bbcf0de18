//! Hazmat Arena headless runner
//!
//! Plays an autopilot session natively and prints the session stats as JSON.
//!
//! Usage: `hazmat-arena [seed] [seconds] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use hazmat_arena::Tuning;
    use hazmat_arena::sim::{Game, GameEvent, GamePhase, TickInput};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().map(|s| s.parse::<u64>()).transpose()?.unwrap_or(12345);
    let seconds = args.next().map(|s| s.parse::<f32>()).transpose()?.unwrap_or(120.0);
    let tuning = match args.next() {
        Some(path) => Tuning::from_json(&std::fs::read_to_string(path)?)?,
        None => Tuning::default(),
    };

    log::info!("Hazmat Arena (native) seed {} for {:.0}s", seed, seconds);

    const FRAME: f32 = 1.0 / 60.0;
    let mut game = Game::new(seed, Arc::new(tuning))?;
    game.finish_loading()?;

    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut explosions = 0u32;
    let frames = (seconds / FRAME).ceil() as u64;
    for _ in 0..frames {
        game.tick(FRAME, &input)?;
        game.flush_to(&mut |event: &GameEvent| {
            if matches!(event, GameEvent::Explosion { .. }) {
                explosions += 1;
            }
        });
        if matches!(game.phase(), GamePhase::GameOver | GamePhase::Stats) {
            break;
        }
    }

    log::info!(
        "Finished in {:?} on wave {} ({} explosions)",
        game.phase(),
        game.hud().wave,
        explosions
    );
    println!("{}", serde_json::to_string_pretty(game.stats())?);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is `wasm::wasm_start`, this is just to satisfy the compiler
}
