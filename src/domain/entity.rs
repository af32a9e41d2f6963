/// Directions and the controllable actor.
///
/// The actor holds its position, its starting willpower, and whether it
/// carries a key. It never moves itself: every relocation goes through a
/// `Board` primitive and the actor only adopts the coordinate the board
/// reports back.

use std::fmt;
use std::str::FromStr;

use super::board::{Board, BoardError, Coordinate};
use super::tile::EntityTag;

/// One of the four cardinal move commands.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid direction {0:?}: expected one of up, right, down, left")]
pub struct DirectionError(pub String);

impl Direction {
    /// Fixed order used by adjacency queries: up, right, down, left.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DirectionError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == token)
            .ok_or_else(|| DirectionError(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub position: Coordinate,
    /// Starting willpower. Remaining willpower is derived from the action log.
    pub willpower: i32,
    pub has_key: bool,
}

impl Actor {
    pub fn new(position: Coordinate, willpower: i32) -> Self {
        Actor { position, willpower, has_key: false }
    }

    /// Directions whose neighbouring cell lies on the board.
    pub fn available_actions(&self, board: &Board) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .zip(board.adjacent(self.position))
            .filter_map(|(dir, cell)| cell.map(|_| dir))
            .collect()
    }

    /// Try to act in `direction`.
    ///
    /// Resolution order:
    ///   1. Walk into the target cell if it is open.
    ///   2. Otherwise kick the first kickable entity there (actor stays put).
    ///   3. Otherwise, holding a key against a gate: unlock it and retry.
    ///   4. Otherwise nothing happens.
    ///
    /// A key under the actor is picked up afterwards either way. The
    /// returned [`MoveOutcome`] records every board change; it counts as an
    /// action only if the actor walked or kicked.
    pub fn attempt_move(&mut self, direction: Direction, board: &mut Board) -> Result<MoveOutcome, BoardError> {
        let from = self.position;
        let target = from.step(direction);
        let mut outcome = MoveOutcome::default();

        loop {
            if let Some(to) = board.move_entity(EntityTag::Actor, from, target)? {
                self.position = to;
                outcome.action = Some(Action::Walked { from, to });
            } else if let Some(&tag) = board.kickable_at(target).first() {
                let beyond = Board::opposing_coordinate(from, target)?;
                let effect = match board.kick(tag, target, beyond)? {
                    Some(landed) if landed == target => KickEffect::Blocked,
                    Some(landed) => KickEffect::Pushed(landed),
                    None => KickEffect::Destroyed { remains: tag.destroyed_state() },
                };
                outcome.action = Some(Action::Kicked(Kick { tag, at: target, effect }));
            } else if self.has_key
                && outcome.unlocked.is_none()
                && board.cell(target).is_some_and(|c| c.has(EntityTag::Gate))
            {
                board.remove_entity(EntityTag::Gate, target)?;
                outcome.unlocked = Some(target);
                continue;
            }
            break;
        }

        if board.contains(self.position, EntityTag::Key)? {
            board.remove_entity(EntityTag::Key, self.position)?;
            self.has_key = true;
            outcome.key_picked = Some(self.position);
        }
        Ok(outcome)
    }

    /// Kick `tag` at `target` directly away from the actor.
    ///
    /// Normal play kicks through `attempt_move`; this is the bare primitive.
    pub fn kick(
        &self,
        tag: EntityTag,
        target: Coordinate,
        board: &mut Board,
    ) -> Result<Option<Coordinate>, BoardError> {
        if !board.kickable_at(target).contains(&tag) {
            return Err(BoardError::NotKickable { tag, at: target });
        }
        board.kick(tag, target, Board::opposing_coordinate(self.position, target)?)
    }
}

// ── Move outcomes ──

/// What became of a kicked entity.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KickEffect {
    /// The cell behind was blocked or off the board.
    Blocked,
    Pushed(Coordinate),
    /// Removed from the board, leaving `remains` in its place.
    Destroyed { remains: Option<EntityTag> },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Kick {
    pub tag: EntityTag,
    pub at: Coordinate,
    pub effect: KickEffect,
}

/// The part of a command that spends willpower.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Walked { from: Coordinate, to: Coordinate },
    Kicked(Kick),
}

/// Everything one [`Actor::attempt_move`] changed on the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveOutcome {
    /// `None` when the command had no effect.
    pub action: Option<Action>,
    pub unlocked: Option<Coordinate>,
    pub key_picked: Option<Coordinate>,
}

impl MoveOutcome {
    pub fn is_action(&self) -> bool {
        self.action.is_some()
    }
}
