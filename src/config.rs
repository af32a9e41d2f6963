/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, unreadable, malformed or
/// incomplete. A broken config never stops the game from starting.
///
/// ```toml
/// [general]
/// scenario_dir = "scenarios"
/// log_filter   = "info"
/// log_file     = "hellgrid.log"
///
/// [play]
/// default_willpower = 23
/// default_rules     = ["Standard", "ReachTarget"]
///
/// [keys]
/// up = ["Up", "w", "k"]
/// ```

use serde::Deserialize;
use std::path::PathBuf;

use tracing::warn;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub scenario_dir: PathBuf,
    pub log_filter: String,
    /// Log destination while the terminal UI owns the screen.
    pub log_file: PathBuf,
    pub play: PlayConfig,
    pub keys: KeyConfig,
}

/// Defaults for bare grid files, which carry no willpower or rules.
#[derive(Clone, Debug)]
pub struct PlayConfig {
    pub default_willpower: i32,
    pub default_rules: Vec<String>,
}

/// Key names per command. Names are crossterm-style (`Up`, `Esc`,
/// `Backspace`, `F1`) or a single character.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct KeyConfig {
    #[serde(default = "default_up")]
    pub up: Vec<String>,
    #[serde(default = "default_right")]
    pub right: Vec<String>,
    #[serde(default = "default_down")]
    pub down: Vec<String>,
    #[serde(default = "default_left")]
    pub left: Vec<String>,
    #[serde(default = "default_restart")]
    pub restart: Vec<String>,
    #[serde(default = "default_undo")]
    pub undo: Vec<String>,
    #[serde(default = "default_next")]
    pub next_level: Vec<String>,
    #[serde(default = "default_prev")]
    pub prev_level: Vec<String>,
    #[serde(default = "default_save")]
    pub save: Vec<String>,
    #[serde(default = "default_quit")]
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    play: TomlPlay,
    #[serde(default)]
    keys: KeyConfig,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_scenario_dir")]
    scenario_dir: String,
    #[serde(default = "default_log_filter")]
    log_filter: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

#[derive(Deserialize, Debug)]
struct TomlPlay {
    #[serde(default = "default_willpower")]
    default_willpower: i32,
    #[serde(default = "default_rules")]
    default_rules: Vec<String>,
}

// ── Defaults ──

fn default_scenario_dir() -> String { "scenarios".into() }
fn default_log_filter() -> String { "info".into() }
fn default_log_file() -> String { "hellgrid.log".into() }

fn default_willpower() -> i32 { 23 }
fn default_rules() -> Vec<String> { vec!["Standard".into(), "ReachTarget".into()] }

fn default_up() -> Vec<String> { vec!["Up".into(), "w".into(), "k".into()] }
fn default_right() -> Vec<String> { vec!["Right".into(), "d".into(), "l".into()] }
fn default_down() -> Vec<String> { vec!["Down".into(), "s".into(), "j".into()] }
fn default_left() -> Vec<String> { vec!["Left".into(), "a".into(), "h".into()] }
fn default_restart() -> Vec<String> { vec!["r".into()] }
fn default_undo() -> Vec<String> { vec!["u".into(), "Backspace".into()] }
fn default_next() -> Vec<String> { vec!["n".into(), "PageDown".into()] }
fn default_prev() -> Vec<String> { vec!["p".into(), "PageUp".into()] }
fn default_save() -> Vec<String> { vec!["F5".into()] }
fn default_quit() -> Vec<String> { vec!["q".into(), "Esc".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            scenario_dir: default_scenario_dir(),
            log_filter: default_log_filter(),
            log_file: default_log_file(),
        }
    }
}

impl Default for TomlPlay {
    fn default() -> Self {
        TomlPlay {
            default_willpower: default_willpower(),
            default_rules: default_rules(),
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        KeyConfig {
            up: default_up(),
            right: default_right(),
            down: default_down(),
            left: default_left(),
            restart: default_restart(),
            undo: default_undo(),
            next_level: default_next(),
            prev_level: default_prev(),
            save: default_save(),
            quit: default_quit(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::resolve(toml_cfg, &search_dirs)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Relative scenario dirs are looked up next to the config candidates.
        let dir = &toml_cfg.general.scenario_dir;
        let scenario_dir = if PathBuf::from(dir).is_absolute() {
            PathBuf::from(dir)
        } else {
            search_dirs.iter()
                .map(|d| d.join(dir))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(dir))
        };

        GameConfig {
            scenario_dir,
            log_filter: toml_cfg.general.log_filter,
            log_file: PathBuf::from(toml_cfg.general.log_file),
            play: PlayConfig {
                default_willpower: toml_cfg.play.default_willpower,
                default_rules: toml_cfg.play.default_rules,
            },
            keys: toml_cfg.keys,
        }
    }
}

impl GameConfig {
    /// `log_file` split into the directory to log in and the file name.
    /// A bare name logs to the working directory; a path without a file
    /// name falls back to the default name.
    pub fn log_location(&self) -> (PathBuf, String) {
        let dir = match self.log_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = self
            .log_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(default_log_file);
        (dir, name)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::resolve(TomlConfig::default(), &[])
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
///
/// Runs before the tracing subscriber exists, so problems go to stderr
/// directly as well as through `warn!`.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match parse(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: {} parse error: {e}", path.display());
                        eprintln!("Using default settings.");
                        warn!(path = %path.display(), error = %e, "config parse error, using defaults");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                    warn!(path = %path.display(), error = %e, "config unreadable");
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse(text: &str) -> Result<TomlConfig, toml::de::Error> {
    toml::from_str::<TomlConfig>(text)
}
