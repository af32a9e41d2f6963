/// Events emitted during a turn.
/// The terminal front end consumes these for its status line; tests use
/// them to assert what happened without diffing whole boards.

use crate::domain::board::Coordinate;
use crate::domain::tile::EntityTag;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    ActorMoved { from: Coordinate, to: Coordinate },
    Kicked { tag: EntityTag, from: Coordinate, to: Coordinate },
    /// Kicked into something it could not enter and survived.
    KickBlocked { tag: EntityTag, at: Coordinate },
    Destroyed { tag: EntityTag, at: Coordinate, remains: Option<EntityTag> },
    KeyPicked { at: Coordinate },
    GateUnlocked { at: Coordinate },
    SpikesCycled,
    EnemySpiked { at: Coordinate },
    /// The actor ended the turn on active spikes.
    ActorDamaged { at: Coordinate },
}
