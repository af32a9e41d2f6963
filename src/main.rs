/// Entry point and play loop.
///
/// `hellgrid [SCENARIO]` plays a single `.json` scenario or `.txt` grid;
/// without an argument it plays every file in `scenario_dir`, or the
/// built-in levels when that directory is empty.

mod config;
mod loader;
mod session;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use session::Session;
use ui::input::{next_command, KeyMap};
use ui::renderer::Renderer;

/// Input poll timeout; also bounds how quickly a resize is redrawn.
const POLL_TIMEOUT: Duration = Duration::from_millis(250);

fn main() -> ExitCode {
    let config = GameConfig::load();
    // Flushes buffered log lines once main returns.
    let _log_guard = init_tracing(&config);

    let scenario = std::env::args_os().nth(1).map(PathBuf::from);
    let levels = match loader::load_levels(scenario.as_deref(), &config) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let Some(mut session) = Session::new(levels, &config.scenario_dir) else {
        eprintln!("No levels to play.");
        return ExitCode::FAILURE;
    };
    info!(levels = session.level_count(), "starting");

    let keymap = KeyMap::from_config(&config.keys);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return ExitCode::FAILURE;
    }

    let result = game_loop(&mut session, &mut renderer, &keymap);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
        return ExitCode::FAILURE;
    }

    println!();
    println!("The grid lets you go. For now.");
    println!("Last level: {} ({} willpower left)", session.level_name(), session.game.remaining_willpower());
    ExitCode::SUCCESS
}

/// The renderer owns the terminal, so logs go to `log_file` through a
/// non-blocking appender. stderr is used only when that file cannot be
/// opened. `RUST_LOG` wins over the configured filter.
///
/// The returned guard must outlive every log call.
fn init_tracing(config: &GameConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let (dir, name) = config.log_location();
    let appender = std::fs::create_dir_all(&dir)
        .map_err(|e| e.to_string())
        .and_then(|()| {
            RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name)
                .build(&dir)
                .map_err(|e| e.to_string())
        });

    match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            builder.with_writer(writer).with_ansi(false).init();
            Some(guard)
        }
        Err(e) => {
            eprintln!("Warning: could not open {}: {e}", config.log_file.display());
            builder.with_writer(std::io::stderr).init();
            None
        }
    }
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    keymap: &KeyMap,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        renderer.render(session, keymap)?;
        if let Some(command) = next_command(keymap, POLL_TIMEOUT)? {
            if !session.apply(command)? {
                break;
            }
        }
    }
    Ok(())
}
