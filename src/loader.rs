/// Level sources for the terminal front end.
///
/// ## Sources (priority order):
///   1. A scenario path given on the command line
///   2. `scenario_dir` from config (every `.json` and `.txt` file, by name)
///   3. Built-in embedded levels
///
/// ## File kinds:
///   `.json`: a full scenario record (see `hellgrid::sim::save`)
///   `.txt`:  bare grid text; willpower and rules come from `[play]`
///
/// Unreadable or invalid files found while scanning a directory are
/// skipped with a warning. A file named explicitly must load.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use hellgrid::domain::rules::{self, RuleSet};
use hellgrid::sim::level::embedded_levels;
use hellgrid::sim::save;
use hellgrid::{BoardError, GameState, Scenario, ScenarioError};

use crate::config::{GameConfig, PlayConfig};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("{path}: {source}")]
    Scenario { path: PathBuf, source: ScenarioError },
    #[error("{path}: {source}")]
    Board { path: PathBuf, source: BoardError },
    #[error("{0}: expected a .json scenario or .txt grid")]
    UnknownKind(PathBuf),
}

/// A playable level: its name and the game positioned at its start.
#[derive(Clone, Debug)]
pub struct LevelEntry {
    pub name: String,
    pub game: GameState,
}

/// Resolve the level list for this run.
pub fn load_levels(arg: Option<&Path>, config: &GameConfig) -> Result<Vec<LevelEntry>, LoadError> {
    if let Some(path) = arg {
        return Ok(vec![load_file(path, &config.play)?]);
    }

    let from_dir = load_from_directory(&config.scenario_dir, &config.play);
    if !from_dir.is_empty() {
        info!(dir = %config.scenario_dir.display(), count = from_dir.len(), "loaded scenarios");
        return Ok(from_dir);
    }

    Ok(builtin_levels())
}

pub fn load_file(path: &Path, play: &PlayConfig) -> Result<LevelEntry, LoadError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let game = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Scenario::from_json(&text)
            .and_then(|scenario| save::restore(&scenario))
            .map_err(|source| LoadError::Scenario { path: path.to_path_buf(), source })?,
        Some("txt") => GameState::from_grid(text.trim_end(), play.default_willpower, configured_rules(play))
            .map_err(|source| LoadError::Board { path: path.to_path_buf(), source })?,
        _ => return Err(LoadError::UnknownKind(path.to_path_buf())),
    };
    Ok(LevelEntry { name, game })
}

fn load_from_directory(dir: &Path, play: &PlayConfig) -> Vec<LevelEntry> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|e| e == "json" || e == "txt"))
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| match load_file(path, play) {
            Ok(level) => Some(level),
            Err(e) => {
                warn!(error = %e, "skipping scenario");
                None
            }
        })
        .collect()
}

pub fn builtin_levels() -> Vec<LevelEntry> {
    embedded_levels()
        .into_iter()
        .filter_map(|def| match def.start() {
            Ok(game) => Some(LevelEntry { name: def.name, game }),
            Err(e) => {
                warn!(level = %def.name, error = %e, "built-in level is invalid");
                None
            }
        })
        .collect()
}

/// `[play] default_rules`, dropping unknown names.
fn configured_rules(play: &PlayConfig) -> Vec<RuleSet> {
    let resolved: Vec<RuleSet> = play
        .default_rules
        .iter()
        .filter_map(|name| {
            let found = rules::by_name(name);
            if found.is_none() {
                warn!(rule = %name, "unknown rule set in config, ignored");
            }
            found
        })
        .collect();
    if resolved.is_empty() { rules::default_rules() } else { resolved }
}
