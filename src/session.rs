/// Play session: the level list, the live game, the undo stack and the
/// phase the front end is in. Pure state, no terminal I/O, so the key
/// handling is testable without a terminal.
///
/// ## Phase transitions
/// ┌──────────┬──────────────────────────────┬──────────────┐
/// │ From     │ Event                        │ To           │
/// ├──────────┼──────────────────────────────┼──────────────┤
/// │ Playing  │ turn ends in Victory         │ Won          │
/// │ Playing  │ turn ends in GameOver        │ Lost         │
/// │ any      │ restart / undo / level change│ Playing      │
/// │ Won/Lost │ move                         │ unchanged    │
/// │ any      │ save                         │ unchanged    │
/// └──────────┴──────────────────────────────┴──────────────┘
///
/// Saving writes the live game as a scenario record into the save
/// directory, where the loader picks it up on the next run.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use hellgrid::sim::save;
use hellgrid::{EngineError, GameEvent, GameState, Reason, ScenarioError, TurnOutcome};

use crate::loader::LevelEntry;
use crate::ui::input::Command;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Won(Reason),
    Lost(Reason),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error("could not write {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

pub struct Session {
    levels: Vec<LevelEntry>,
    save_dir: PathBuf,
    index: usize,
    pub game: GameState,
    history: Vec<GameState>,
    pub phase: Phase,
    pub message: String,
}

impl Session {
    /// `None` when there is nothing to play.
    pub fn new(levels: Vec<LevelEntry>, save_dir: impl Into<PathBuf>) -> Option<Self> {
        let game = levels.first()?.game.clone();
        Some(Session {
            levels,
            save_dir: save_dir.into(),
            index: 0,
            game,
            history: Vec::new(),
            phase: Phase::Playing,
            message: String::new(),
        })
    }

    pub fn level_name(&self) -> &str {
        &self.levels[self.index].name
    }

    pub fn level_index(&self) -> usize {
        self.index
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Apply one command. Returns `false` when the player quits.
    pub fn apply(&mut self, command: Command) -> Result<bool, EngineError> {
        match command {
            Command::Quit => return Ok(false),
            Command::Move(direction) => {
                if self.phase != Phase::Playing {
                    self.message = "Press r to retry or u to undo".to_string();
                    return Ok(true);
                }
                let snapshot = self.game.clone();
                let report = self.game.advance(direction)?;
                if report.taken.is_some() {
                    self.history.push(snapshot);
                }
                self.message = describe(&report.events);
                self.phase = match report.outcome {
                    TurnOutcome::Continues => Phase::Playing,
                    TurnOutcome::Victory(reason) => Phase::Won(reason),
                    TurnOutcome::GameOver(reason) => Phase::Lost(reason),
                };
                if report.is_terminal() {
                    self.message = report.outcome.to_string();
                }
            }
            Command::Undo => match self.history.pop() {
                Some(previous) => {
                    self.game = previous;
                    self.phase = Phase::Playing;
                    self.message = "Undone".to_string();
                }
                None => self.message = "Nothing to undo".to_string(),
            },
            Command::Restart => {
                self.game.restart();
                self.history.clear();
                self.phase = Phase::Playing;
                self.message = "Restarted".to_string();
            }
            Command::NextLevel => self.switch_level(self.index + 1),
            Command::PrevLevel => self.switch_level(self.index.saturating_sub(1)),
            Command::Save => {
                self.message = match self.save() {
                    Ok(path) => format!("Saved to {}", path.display()),
                    Err(e) => {
                        warn!(error = %e, "save failed");
                        format!("Save failed: {e}")
                    }
                };
            }
        }
        Ok(true)
    }

    /// Write the live game to `<save_dir>/<level>-save.json`.
    pub fn save(&self) -> Result<PathBuf, SaveError> {
        let json = save::capture(&self.game).to_json()?;
        let path = save_path(&self.save_dir, self.level_name());
        std::fs::create_dir_all(&self.save_dir)
            .and_then(|_| std::fs::write(&path, json))
            .map_err(|source| SaveError::Io { path: path.clone(), source })?;
        info!(path = %path.display(), "game saved");
        Ok(path)
    }

    fn switch_level(&mut self, index: usize) {
        if index >= self.levels.len() || index == self.index {
            return;
        }
        self.index = index;
        self.game = self.levels[index].game.clone();
        self.history.clear();
        self.phase = Phase::Playing;
        self.message = String::new();
        info!(level = %self.levels[index].name, "level selected");
    }
}

fn save_path(dir: &Path, level: &str) -> PathBuf {
    let stem: String = level
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '-' })
        .collect();
    dir.join(format!("{stem}-save.json"))
}

/// One-line summary of the most notable thing that happened this turn.
fn describe(events: &[GameEvent]) -> String {
    let notable = events.iter().rev().find_map(|event| match event {
        GameEvent::ActorDamaged { .. } => Some("Spikes! That cost extra willpower".to_string()),
        GameEvent::EnemySpiked { .. } => Some("An enemy was impaled".to_string()),
        GameEvent::Destroyed { tag, .. } => Some(format!("Destroyed the {}", tag.name())),
        GameEvent::KeyPicked { .. } => Some("Picked up the key".to_string()),
        GameEvent::GateUnlocked { .. } => Some("Unlocked the gate".to_string()),
        GameEvent::Kicked { tag, .. } => Some(format!("Kicked the {}", tag.name())),
        GameEvent::KickBlocked { tag, .. } => Some(format!("The {} will not budge", tag.name())),
        _ => None,
    });
    notable.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hellgrid::domain::rules::default_rules;
    use hellgrid::Direction;

    fn level(name: &str, grid: &str, willpower: i32) -> LevelEntry {
        LevelEntry {
            name: name.to_string(),
            game: GameState::from_grid(grid, willpower, default_rules()).unwrap(),
        }
    }

    fn session() -> Session {
        let levels = vec![level("one", "C,,T", 5), level("two", "C,B,,T", 1)];
        Session::new(levels, std::env::temp_dir()).unwrap()
    }

    #[test]
    fn empty_level_list_has_no_session() {
        assert!(Session::new(vec![], "saves").is_none());
    }

    #[test]
    fn victory_freezes_moves() {
        let mut s = session();
        s.apply(Command::Move(Direction::Right)).unwrap();
        s.apply(Command::Move(Direction::Right)).unwrap();
        assert_eq!(s.phase, Phase::Won(Reason::ReachedTarget));

        let before = s.game.clone();
        s.apply(Command::Move(Direction::Left)).unwrap();
        assert_eq!(s.game, before);
    }

    #[test]
    fn undo_restores_previous_turn() {
        let mut s = session();
        s.apply(Command::Move(Direction::Right)).unwrap();
        s.apply(Command::Move(Direction::Right)).unwrap();
        s.apply(Command::Undo).unwrap();
        assert_eq!(s.phase, Phase::Playing);
        assert_eq!(s.game.log.len(), 1);
        s.apply(Command::Undo).unwrap();
        assert!(s.game.log.is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn no_op_moves_are_not_undo_points() {
        let mut s = session();
        s.apply(Command::Move(Direction::Up)).unwrap();
        assert!(!s.can_undo());
    }

    #[test]
    fn running_out_of_willpower_loses() {
        let mut s = session();
        s.apply(Command::NextLevel).unwrap();
        assert_eq!(s.level_name(), "two");
        s.apply(Command::Move(Direction::Right)).unwrap();
        assert_eq!(s.message, "Kicked the block");
        s.apply(Command::Move(Direction::Right)).unwrap();
        assert_eq!(s.phase, Phase::Lost(Reason::OutOfWillpower));

        s.apply(Command::Restart).unwrap();
        assert_eq!(s.phase, Phase::Playing);
        assert_eq!(s.game.remaining_willpower(), 1);
    }

    #[test]
    fn level_switching_clamps() {
        let mut s = session();
        s.apply(Command::PrevLevel).unwrap();
        assert_eq!(s.level_index(), 0);
        s.apply(Command::NextLevel).unwrap();
        s.apply(Command::NextLevel).unwrap();
        assert_eq!(s.level_index(), 1);
        assert_eq!(s.level_count(), 2);
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut s = session();
        assert_eq!(s.apply(Command::Quit), Ok(false));
    }

    #[test]
    fn save_names_are_file_safe() {
        let path = save_path(Path::new("saves"), "Chapter IV: Gate");
        assert_eq!(path, Path::new("saves").join("chapter-iv--gate-save.json"));
    }

    #[test]
    fn saved_game_restores_mid_level() {
        let dir = std::env::temp_dir().join(format!("hellgrid-session-{}", std::process::id()));
        let levels = vec![level("one", "C,,T", 5)];
        let mut s = Session::new(levels, &dir).unwrap();
        s.apply(Command::Move(Direction::Right)).unwrap();
        s.apply(Command::Save).unwrap();
        assert!(s.message.starts_with("Saved to"));

        let text = std::fs::read_to_string(dir.join("one-save.json")).unwrap();
        let restored = save::restore(&hellgrid::Scenario::from_json(&text).unwrap()).unwrap();
        assert_eq!(restored.board, s.game.board);
        assert_eq!(restored.remaining_willpower(), 4);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
