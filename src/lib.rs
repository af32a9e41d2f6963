//! Hellgrid engine: a deterministic, turn-based grid puzzle simulation.
//!
//! A single actor moves on a bounded board of multi-entity cells, kicking
//! blocks and enemies, unlocking gates, and dodging spikes and lasers under a
//! finite willpower budget. After every turn a composable list of rule sets
//! decides whether play continues, is lost, or is won.
//!
//! The engine performs no I/O. Loading scenario files and drawing the board
//! belong to the binary (`src/main.rs`).

pub mod domain;
pub mod sim;

pub use domain::board::{Board, BoardError, Coordinate, Target};
pub use domain::entity::{Action, Actor, Direction, DirectionError, Kick, KickEffect, MoveOutcome};
pub use domain::rules::{GameView, Reason, RuleSet, TurnOutcome};
pub use domain::tile::{Cell, EntityTag};
pub use sim::event::GameEvent;
pub use sim::save::{GridSpec, Scenario, ScenarioError};
pub use sim::step::{step, EngineError, TurnReport};
pub use sim::world::{ActionLog, GameState, LoggedAction};
