//! NetGuardian entry point
//!
//! The native build runs a headless autopilot session and prints the
//! resulting history record. The browser build starts from `platform::web`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use clap::Parser;
    use netguardian::levels::LevelCatalog;
    use netguardian::platform::storage::FileStore;
    use netguardian::{Game, LevelError, Mode, Settings};
    use netguardian::audio::AudioManager;

    /// Frames spent on one sector before skipping it
    const LEVEL_FRAME_BUDGET: u64 = 8000;
    const PROGRESS_EVERY: u64 = 600;

    #[derive(Parser, Debug)]
    #[command(name = "netguardian")]
    #[command(about = "Run a headless NetGuardian autopilot session and print its history record")]
    pub struct Options {
        /// Frames to simulate before stopping
        #[arg(long, default_value_t = 30_000)]
        pub frames: u64,
        /// Fixed RNG seed (random when omitted)
        #[arg(long)]
        pub seed: Option<u64>,
        /// Directory with level map overrides (`<level_id>.json`)
        #[arg(long, env = "NETGUARDIAN_ASSET_DIR")]
        pub asset_dir: Option<PathBuf>,
    }

    pub fn run(options: Options) -> Result<(), LevelError> {
        let mut catalog = LevelCatalog::builtin();
        if let Some(dir) = options.asset_dir {
            catalog = catalog.with_asset_dir(dir);
        }
        let settings = Settings {
            seed: options.seed,
            ..Settings::default()
        };
        let mut game = Game::new(catalog, settings, Box::new(FileStore::from_env()), AudioManager::silent());
        game.start_session("AUTOPILOT")?;
        game.set_autopilot(true);

        let mut level = None;
        let mut level_frames = 0;
        for frame in 0..options.frames {
            let Some(state) = game.session() else {
                break;
            };
            let current = state.level.id();
            if level != Some(current) {
                log::info!("Frame {frame}: entering {current}");
                level = Some(current);
                level_frames = 0;
            }
            level_frames += 1;

            answer_terminal(&mut game)?;
            if level_frames == LEVEL_FRAME_BUDGET && *game.mode() == Mode::Playing {
                log::info!("Frame {frame}: skipping {current}");
                game.skip_level();
            }
            game.advance(1.0)?;

            if frame % PROGRESS_EVERY == 0
                && let Some(view) = game.view()
            {
                log::info!(
                    "Frame {frame}: {} t={} pos=({:.0}, {:.0}) projectiles={} threats={} breaches={}",
                    view.level,
                    view.level_time,
                    view.player.pos.x,
                    view.player.pos.y,
                    view.projectiles.len(),
                    view.stats.threats_neutralized,
                    view.stats.breaches,
                );
            }
        }

        if game.session().is_some() {
            game.end_session();
        }
        if let Some(record) = game.history().records.last() {
            match serde_json::to_string_pretty(record) {
                Ok(json) => println!("{json}"),
                Err(e) => log::warn!("Could not print session record: {e}"),
            }
        }
        Ok(())
    }

    /// Type the terminal answer when the player stands at an unsolved terminal
    fn answer_terminal(game: &mut Game) -> Result<(), LevelError> {
        use netguardian::Key;

        let Some(view) = game.view() else {
            return Ok(());
        };
        let Some(terminal) = view.terminal else {
            return Ok(());
        };
        if terminal.input.is_some() {
            let answer = game
                .session()
                .and_then(|s| s.level.blueprint.puzzle.as_ref())
                .map(|p| p.answer.clone())
                .unwrap_or_default();
            for c in answer.chars() {
                let key = if c == ' ' { Key::Space } else { Key::Char(c) };
                game.key_down(key)?;
            }
            game.key_down(Key::Enter)?;
        } else if terminal.prompt {
            game.key_down(Key::Char('E'))?;
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    netguardian::platform::init_logging();
    log::info!("NetGuardian (native, headless) starting...");

    match headless::run(headless::Options::parse()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use super::headless::Options;

    #[test]
    fn test_options_defaults() {
        let options = Options::try_parse_from(["netguardian"]).unwrap();
        assert_eq!(options.frames, 30_000);
        assert_eq!(options.seed, None);
    }

    #[test]
    fn test_options_reject_bad_numbers() {
        let options = Options::try_parse_from(["netguardian", "--frames", "500", "--seed", "5"]).unwrap();
        assert_eq!(options.frames, 500);
        assert_eq!(options.seed, Some(5));

        assert!(Options::try_parse_from(["netguardian", "--frames", "abc"]).is_err());
        assert!(Options::try_parse_from(["netguardian", "abc", "5"]).is_err());
    }
}
