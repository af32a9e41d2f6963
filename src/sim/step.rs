/// The turn function: advances the game by one directional command.
///
/// Processing order:
///   1. Pre-move checks (every rule set, composition order)
///   2. Actor attempt (walk / kick / unlock-and-retry)
///   3. Housekeeping, only if an action was taken:
///        log the direction → cycle spikes → spike enemies → damage actor
///   4. Post-move checks (every rule set, composition order)
///
/// A terminal outcome at step 1 returns before the board is touched. A
/// terminal outcome at step 4 leaves the turn's mutations committed.

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::board::BoardError;
use crate::domain::entity::{Action, Direction, DirectionError, Kick, KickEffect, MoveOutcome};
use crate::domain::rules::{self, TurnOutcome};
use crate::domain::tile::EntityTag;
use super::event::GameEvent;
use super::world::{GameState, LoggedAction};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Direction(#[from] DirectionError),
}

/// What one call to [`step`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    /// The direction logged this turn; `None` when nothing happened.
    pub taken: Option<Direction>,
    pub outcome: TurnOutcome,
    pub events: Vec<GameEvent>,
}

impl TurnReport {
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(game: &mut GameState, direction: Direction) -> Result<TurnReport, EngineError> {
    let mut events: Vec<GameEvent> = Vec::new();

    let outcome = rules::check_premove(&game.rules, &game.view())?;
    if outcome.is_terminal() {
        info!(%direction, %outcome, "turn refused");
        return Ok(TurnReport { taken: None, outcome, events });
    }

    let moved = game.actor.attempt_move(direction, &mut game.board)?;
    resolve_move(&moved, &mut events);
    let taken = moved.is_action().then_some(direction);

    if taken.is_some() {
        game.log.push(LoggedAction::new(direction));
        resolve_housekeeping(game, &mut events)?;
    } else {
        debug!(%direction, "no action");
    }

    let outcome = rules::check_postmove(&game.rules, &game.view())?;
    if outcome.is_terminal() {
        info!(%direction, %outcome, moves = game.log.len(), "game finished");
    }
    Ok(TurnReport { taken, outcome, events })
}

/// Play `directions` in order, stopping after the first terminal outcome.
pub fn replay<I>(game: &mut GameState, directions: I) -> Result<Vec<TurnReport>, EngineError>
where
    I: IntoIterator<Item = Direction>,
{
    let mut reports = Vec::new();
    for direction in directions {
        let report = step(game, direction)?;
        let done = report.is_terminal();
        reports.push(report);
        if done {
            break;
        }
    }
    Ok(reports)
}

// ══════════════════════════════════════════════════════════════
// Actor resolution
// ══════════════════════════════════════════════════════════════

/// Report what the actor's attempt changed, in the order it happened.
fn resolve_move(moved: &MoveOutcome, events: &mut Vec<GameEvent>) {
    if let Some(at) = moved.unlocked {
        debug!(%at, "gate unlocked");
        events.push(GameEvent::GateUnlocked { at });
    }

    match moved.action {
        Some(Action::Walked { from, to }) => events.push(GameEvent::ActorMoved { from, to }),
        Some(Action::Kicked(kick)) => resolve_kick(kick, events),
        None => {}
    }

    if let Some(at) = moved.key_picked {
        debug!(%at, "key picked up");
        events.push(GameEvent::KeyPicked { at });
    }
}

fn resolve_kick(Kick { tag, at, effect }: Kick, events: &mut Vec<GameEvent>) {
    match effect {
        KickEffect::Blocked => {
            debug!(%tag, %at, "kick had no effect");
            events.push(GameEvent::KickBlocked { tag, at });
        }
        KickEffect::Pushed(to) => {
            debug!(%tag, from = %at, %to, "kicked");
            events.push(GameEvent::Kicked { tag, from: at, to });
        }
        KickEffect::Destroyed { remains } => {
            debug!(%tag, %at, ?remains, "destroyed");
            events.push(GameEvent::Destroyed { tag, at, remains });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Housekeeping
// ══════════════════════════════════════════════════════════════

fn resolve_housekeeping(game: &mut GameState, events: &mut Vec<GameEvent>) -> Result<(), BoardError> {
    game.board.cycle_spikes();
    events.push(GameEvent::SpikesCycled);

    for at in game.board.spike_enemies() {
        debug!(%at, "enemy spiked");
        events.push(GameEvent::EnemySpiked { at });
    }

    let at = game.actor.position;
    if game.board.contains(at, EntityTag::SpikesActive)? {
        game.log.mark_last_damaging();
        debug!(%at, remaining = game.remaining_willpower(), "actor damaged");
        events.push(GameEvent::ActorDamaged { at });
    }
    Ok(())
}
