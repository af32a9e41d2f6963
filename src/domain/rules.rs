/// Rule sets: win/loss predicates evaluated around every turn.
///
/// A rule set is plain data: a name, two ordered predicate lists and an
/// unwinnable heuristic. Composition is list concatenation; evaluation
/// order is the order of the sets, then declaration order within a set.
/// The first predicate that reports a terminal outcome wins.
///
/// ## Built-in rule sets
/// ┌──────────────────┬──────────────────────┬───────────────────────────┬─────────────────────────────┐
/// │ Name             │ Before the move      │ After housekeeping        │ Unwinnable when             │
/// ├──────────────────┼──────────────────────┼───────────────────────────┼─────────────────────────────┤
/// │ Standard         │ willpower <= 0: LOSE │ actor in a laser ray: LOSE│ never                       │
/// │ ReachTarget      │                      │ actor on a target: WIN    │ nearest target > willpower  │
/// │ DestroyTerminals │                      │ no active terminals: WIN  │ nearest terminal > willpower│
/// └──────────────────┴──────────────────────┴───────────────────────────┴─────────────────────────────┘
///
/// Distances are Manhattan. The unwinnable heuristics are pessimistic and
/// advisory only: nothing in the turn loop enforces them.

use std::fmt;

use super::board::{Board, BoardError, Coordinate};
use super::tile::{Cell, EntityTag};

/// Immutable view of a position for rule queries.
#[derive(Clone, Copy, Debug)]
pub struct GameView<'a> {
    pub board: &'a Board,
    pub actor: Coordinate,
    /// Remaining willpower, after the cost of every logged action.
    pub willpower: i32,
}

/// Result of evaluating the rules for one turn.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnOutcome {
    Continues,
    GameOver(Reason),
    Victory(Reason),
}

impl TurnOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TurnOutcome::Continues)
    }
}

impl fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnOutcome::Continues => f.write_str("play continues"),
            TurnOutcome::GameOver(reason) => write!(f, "game over: {reason}"),
            TurnOutcome::Victory(reason) => write!(f, "victory: {reason}"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reason {
    OutOfWillpower,
    Lasered,
    ReachedTarget,
    TerminalsDestroyed,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reason::OutOfWillpower => "willpower exhausted",
            Reason::Lasered => "caught in a laser beam",
            Reason::ReachedTarget => "target reached",
            Reason::TerminalsDestroyed => "every terminal destroyed",
        })
    }
}

/// A predicate run before or after a move.
pub type Check = fn(&GameView<'_>) -> Result<TurnOutcome, BoardError>;

/// Pessimistic "cannot be won from here" heuristic.
pub type Unwinnable = fn(&GameView<'_>) -> Result<bool, BoardError>;

#[derive(Clone, Copy)]
pub struct RuleSet {
    pub name: &'static str,
    /// Older spelling accepted when loading scenarios.
    pub alias: &'static str,
    pub premove: &'static [Check],
    pub postmove: &'static [Check],
    pub unwinnable: Unwinnable,
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RuleSet").field(&self.name).finish()
    }
}

impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RuleSet {}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ── Built-ins ──

pub const STANDARD: RuleSet = RuleSet {
    name: "Standard",
    alias: "StandardRules",
    premove: &[out_of_willpower as Check],
    postmove: &[lasered as Check],
    unwinnable: never,
};

pub const REACH_TARGET: RuleSet = RuleSet {
    name: "ReachTarget",
    alias: "TargetSquareRules",
    premove: &[],
    postmove: &[on_target as Check],
    unwinnable: target_out_of_reach,
};

pub const DESTROY_TERMINALS: RuleSet = RuleSet {
    name: "DestroyTerminals",
    alias: "DestroyTerminalsRules",
    premove: &[],
    postmove: &[terminals_destroyed as Check],
    unwinnable: terminal_out_of_reach,
};

/// Every rule set a scenario may name.
pub const REGISTRY: [RuleSet; 3] = [STANDARD, REACH_TARGET, DESTROY_TERMINALS];

/// Look a rule set up by name or alias.
pub fn by_name(name: &str) -> Option<RuleSet> {
    let name = name.trim();
    REGISTRY.into_iter().find(|r| r.name == name || r.alias == name)
}

/// `[Standard, ReachTarget]`
pub fn default_rules() -> Vec<RuleSet> {
    vec![STANDARD, REACH_TARGET]
}

/// `[Standard, DestroyTerminals]`
pub fn terminal_rules() -> Vec<RuleSet> {
    vec![STANDARD, DESTROY_TERMINALS]
}

// ── Evaluation ──

pub fn check_premove(rules: &[RuleSet], view: &GameView<'_>) -> Result<TurnOutcome, BoardError> {
    first_terminal(view, rules.iter().flat_map(|r| r.premove))
}

pub fn check_postmove(rules: &[RuleSet], view: &GameView<'_>) -> Result<TurnOutcome, BoardError> {
    first_terminal(view, rules.iter().flat_map(|r| r.postmove))
}

/// True if any composed rule set considers the position lost.
pub fn any_unwinnable(rules: &[RuleSet], view: &GameView<'_>) -> Result<bool, BoardError> {
    for set in rules {
        if (set.unwinnable)(view)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn first_terminal<'a>(
    view: &GameView<'_>,
    checks: impl Iterator<Item = &'a Check>,
) -> Result<TurnOutcome, BoardError> {
    for check in checks {
        let outcome = check(view)?;
        if outcome.is_terminal() {
            return Ok(outcome);
        }
    }
    Ok(TurnOutcome::Continues)
}

// ── Predicates ──

fn out_of_willpower(view: &GameView<'_>) -> Result<TurnOutcome, BoardError> {
    Ok(if view.willpower <= 0 {
        TurnOutcome::GameOver(Reason::OutOfWillpower)
    } else {
        TurnOutcome::Continues
    })
}

fn lasered(view: &GameView<'_>) -> Result<TurnOutcome, BoardError> {
    for emitter in emitters(view.board) {
        if view.board.cast_ray(emitter)?.contains(&view.actor) {
            return Ok(TurnOutcome::GameOver(Reason::Lasered));
        }
    }
    Ok(TurnOutcome::Continues)
}

fn on_target(view: &GameView<'_>) -> Result<TurnOutcome, BoardError> {
    Ok(if view.board.contains(view.actor, EntityTag::Target)? {
        TurnOutcome::Victory(Reason::ReachedTarget)
    } else {
        TurnOutcome::Continues
    })
}

fn terminals_destroyed(view: &GameView<'_>) -> Result<TurnOutcome, BoardError> {
    Ok(if view.board.find_all(EntityTag::TerminalActive).is_empty() {
        TurnOutcome::Victory(Reason::TerminalsDestroyed)
    } else {
        TurnOutcome::Continues
    })
}

fn never(_: &GameView<'_>) -> Result<bool, BoardError> {
    Ok(false)
}

fn target_out_of_reach(view: &GameView<'_>) -> Result<bool, BoardError> {
    out_of_reach(view, EntityTag::Target)
}

fn terminal_out_of_reach(view: &GameView<'_>) -> Result<bool, BoardError> {
    out_of_reach(view, EntityTag::TerminalActive)
}

fn out_of_reach(view: &GameView<'_>, tag: EntityTag) -> Result<bool, BoardError> {
    let nearest = view.board.nearest_entity(view.actor, tag)?;
    Ok(Board::distance(view.actor, nearest) > i64::from(view.willpower))
}

fn emitters(board: &Board) -> Vec<Coordinate> {
    board
        .coordinates()
        .filter(|&c| board.cell(c).is_some_and(|cell| cell.intersects(Cell::LASERS)))
        .collect()
}
