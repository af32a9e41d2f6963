/// Persisted scenarios: the JSON record a puzzle is stored as, plus
/// capture from and restore into a running game.
///
/// ## Format
///   ```json
///   {
///     "grid": "C,S,p\nG,K,\nT,W,B",      // or [["C","S","p"], ...]
///     "willpower": 9,
///     "rules": ["Standard", "ReachTarget"], // optional
///     "actions": ["right", "RIGHT"],        // optional, resumed as-is
///     "haskey": false                       // optional
///   }
///   ```
///
/// A missing or empty `rules` list means `[Standard, ReachTarget]`. Rule
/// names resolve through the registry in `domain::rules`; an unknown name
/// is an error, never silently dropped.
///
/// Restored actions are resumed, not replayed: the grid is taken to
/// already reflect them and they only count against willpower.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::board::{Board, BoardError};
use crate::domain::entity::Actor;
use crate::domain::rules::{self, RuleSet};
use crate::sim::world::{ActionLog, GameState};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown rule set {0:?}")]
    UnknownRuleSet(String),
    #[error("invalid grid: {0}")]
    Board(#[from] BoardError),
}

/// The grid, either as text or already split into rows of cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridSpec {
    Text(String),
    Rows(Vec<Vec<String>>),
}

impl GridSpec {
    pub fn to_board(&self) -> Result<Board, BoardError> {
        match self {
            GridSpec::Text(text) => Board::parse(text),
            GridSpec::Rows(rows) => Board::from_rows(rows),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub grid: GridSpec,
    pub willpower: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "ActionLog::is_empty")]
    pub actions: ActionLog,
    #[serde(default)]
    pub haskey: bool,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Scenario, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ScenarioError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve rule names, defaulting when none are given.
    pub fn rule_sets(&self) -> Result<Vec<RuleSet>, ScenarioError> {
        match self.rules.as_deref() {
            None | Some([]) => Ok(rules::default_rules()),
            Some(names) => names
                .iter()
                .map(|name| rules::by_name(name).ok_or_else(|| ScenarioError::UnknownRuleSet(name.clone())))
                .collect(),
        }
    }
}

/// Record the current position of `game`.
pub fn capture(game: &GameState) -> Scenario {
    Scenario {
        grid: GridSpec::Text(game.board.to_grid_string()),
        willpower: game.actor.willpower,
        rules: Some(game.rules.iter().map(|r| r.name.to_string()).collect()),
        actions: game.log.clone(),
        haskey: game.actor.has_key,
    }
}

/// Build a game positioned exactly where `scenario` left off.
pub fn restore(scenario: &Scenario) -> Result<GameState, ScenarioError> {
    let rules = scenario.rule_sets()?;
    let board = scenario.grid.to_board()?;
    let mut actor = Actor::new(board.find_actor()?, scenario.willpower);
    actor.has_key = scenario.haskey;
    debug!(
        width = board.width(),
        height = board.height(),
        willpower = scenario.willpower,
        resumed = scenario.actions.len(),
        "scenario restored"
    );
    Ok(GameState::resume(board, actor, scenario.actions.clone(), rules))
}
