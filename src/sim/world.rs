/// GameState: the complete snapshot of a running puzzle.
///
/// ## Layers
///   - `start`: board, actor and log as loaded. **Never mutated**; `restart`
///     copies it back.
///   - `board` / `actor` / `log`: the live position.
///
/// Cloning a `GameState` is a full, independent snapshot: rule sets hold
/// only `fn` pointers, everything else is owned data. Solvers and the undo
/// stack rely on this.
///
/// ## Willpower accounting
/// Remaining willpower is derived, never stored:
///   remaining = initial − (actions logged + damaging actions logged)
/// so a damaging action costs 2.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::board::{Board, BoardError};
use crate::domain::entity::{Actor, Direction, DirectionError};
use crate::domain::rules::{self, GameView, RuleSet};
use crate::sim::step::{self, EngineError, TurnReport};

// ══════════════════════════════════════════════════════════════
// Action log
// ══════════════════════════════════════════════════════════════

/// One logged turn. Serialized as its direction token, uppercased when the
/// turn ended on active spikes (`"up"` / `"UP"`).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoggedAction {
    pub direction: Direction,
    pub damaging: bool,
}

impl LoggedAction {
    pub fn new(direction: Direction) -> Self {
        LoggedAction { direction, damaging: false }
    }

    pub fn damaging(direction: Direction) -> Self {
        LoggedAction { direction, damaging: true }
    }

    /// Willpower consumed by this action.
    pub fn cost(self) -> i32 {
        if self.damaging { 2 } else { 1 }
    }
}

impl fmt::Display for LoggedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.damaging {
            f.write_str(&self.direction.as_str().to_ascii_uppercase())
        } else {
            f.write_str(self.direction.as_str())
        }
    }
}

impl std::str::FromStr for LoggedAction {
    type Err = DirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let direction = token.parse()?;
        let damaging = token.chars().all(|c| c.is_ascii_uppercase());
        Ok(LoggedAction { direction, damaging })
    }
}

impl TryFrom<String> for LoggedAction {
    type Error = DirectionError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        token.parse()
    }
}

impl From<LoggedAction> for String {
    fn from(action: LoggedAction) -> Self {
        action.to_string()
    }
}

/// Ordered record of every turn in which something happened.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionLog(Vec<LoggedAction>);

impl ActionLog {
    pub fn new() -> Self {
        ActionLog(Vec::new())
    }

    pub fn push(&mut self, action: LoggedAction) {
        self.0.push(action);
    }

    /// Rewrite the most recent entry to its damaging form.
    pub fn mark_last_damaging(&mut self) {
        if let Some(last) = self.0.last_mut() {
            last.damaging = true;
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn damaging_count(&self) -> usize {
        self.0.iter().filter(|a| a.damaging).count()
    }

    /// Willpower spent so far.
    pub fn cost(&self) -> i32 {
        self.0.iter().map(|a| a.cost()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoggedAction> {
        self.0.iter()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.0.iter().map(LoggedAction::to_string).collect()
    }
}

impl FromIterator<LoggedAction> for ActionLog {
    fn from_iter<I: IntoIterator<Item = LoggedAction>>(iter: I) -> Self {
        ActionLog(iter.into_iter().collect())
    }
}

impl fmt::Display for ActionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(" "))
    }
}

// ══════════════════════════════════════════════════════════════
// Game state
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
struct Start {
    board: Board,
    actor: Actor,
    log: ActionLog,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub actor: Actor,
    pub log: ActionLog,
    pub rules: Vec<RuleSet>,
    start: Start,
}

impl GameState {
    /// New game on `board`. The actor starts wherever the board puts it.
    pub fn new(board: Board, willpower: i32, rules: Vec<RuleSet>) -> Result<Self, BoardError> {
        let actor = Actor::new(board.find_actor()?, willpower);
        Ok(GameState::resume(board, actor, ActionLog::new(), rules))
    }

    /// Parse a grid and start a game on it.
    pub fn from_grid(grid: &str, willpower: i32, rules: Vec<RuleSet>) -> Result<Self, BoardError> {
        GameState::new(Board::parse(grid)?, willpower, rules)
    }

    /// Resume a position mid-game: `board` is assumed to already reflect
    /// `log`. Restarting returns to exactly this position.
    pub fn resume(board: Board, actor: Actor, log: ActionLog, rules: Vec<RuleSet>) -> Self {
        let start = Start { board: board.clone(), actor: actor.clone(), log: log.clone() };
        GameState { board, actor, log, rules, start }
    }

    pub fn remaining_willpower(&self) -> i32 {
        self.actor.willpower - self.log.cost()
    }

    /// Willpower spent: actions logged plus damaging actions logged.
    pub fn actions_taken(&self) -> i32 {
        self.log.cost()
    }

    /// What the rule predicates see of this position.
    pub fn view(&self) -> GameView<'_> {
        GameView { board: &self.board, actor: self.actor.position, willpower: self.remaining_willpower() }
    }

    /// Advisory: true if any composed rule set considers the game lost.
    pub fn unwinnable(&self) -> Result<bool, BoardError> {
        rules::any_unwinnable(&self.rules, &self.view())
    }

    pub fn restart(&mut self) {
        self.board = self.start.board.clone();
        self.actor = self.start.actor.clone();
        self.log = self.start.log.clone();
    }

    /// Play one turn. See [`step::step`].
    pub fn advance(&mut self, direction: Direction) -> Result<TurnReport, EngineError> {
        step::step(self, direction)
    }

    /// Play one turn from a textual command such as `"up"` or `" LEFT "`.
    pub fn command(&mut self, token: &str) -> Result<TurnReport, EngineError> {
        let direction: Direction = token.parse()?;
        self.advance(direction)
    }

    pub fn up(&mut self) -> Result<TurnReport, EngineError> {
        self.advance(Direction::Up)
    }

    pub fn right(&mut self) -> Result<TurnReport, EngineError> {
        self.advance(Direction::Right)
    }

    pub fn down(&mut self) -> Result<TurnReport, EngineError> {
        self.advance(Direction::Down)
    }

    pub fn left(&mut self) -> Result<TurnReport, EngineError> {
        self.advance(Direction::Left)
    }
}
