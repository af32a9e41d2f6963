/// The built-in levels.
///
/// ## Grid text format
///   Rows are separated by `\n`, `\r\n` or a bare `\r`.
///   Cells within a row are separated by `,`.
///   A cell is zero or more entity tokens in any order; blanks are empty.
///
///   ```text
///   C,S,p
///   G,K,
///   T,W,B
///   ```
///
/// ## Token legend
///   'C' = Actor        'B' = Block          'S' = Enemy
///   'P' = Spikes (on)  'p' = Spikes (off)   'K' = Key
///   'G' = Gate         'T' = Target         'W' = Wall
///   'E' = Terminal     'e' = Broken term.   '0'..'3' = Laser up/right/down/left
///
/// Reading scenario files from disk is the binary's job; this module only
/// holds levels compiled into the crate.

use crate::domain::board::{Board, BoardError};
use crate::domain::rules::{self, RuleSet};
use crate::sim::world::GameState;

/// A level compiled into the binary.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub grid: String,
    pub willpower: i32,
    pub rules: Vec<RuleSet>,
}

impl LevelDef {
    pub fn board(&self) -> Result<Board, BoardError> {
        Board::parse(&self.grid)
    }

    /// Fresh game on this level.
    pub fn start(&self) -> Result<GameState, BoardError> {
        GameState::new(self.board()?, self.willpower, self.rules.clone())
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Spike Corridor", 9, rules::default_rules(), &[
            "C,S,p",
            "G,K,",
            "T,W,B",
            ",W,B",
        ]),
        make_embedded("Laser Gallery", 8, rules::default_rules(), &[
            ",,2,,",
            ",B,,,",
            "C,,,,T",
        ]),
        make_embedded("Terminal Sweep", 7, rules::terminal_rules(), &[
            "E,,C,S,E",
            ",,,,",
        ]),
        make_embedded("Chapter IV", 23, rules::default_rules(), &[
            "C,W,K,,B,W,W,W",
            ",B,P,PB,,G,,W",
            "B,,B,,B,B,T,",
            ",B,,B,,B,B,T",
            "W,,B,,B,,W,W",
        ]),
    ]
}

fn make_embedded(name: &str, willpower: i32, rules: Vec<RuleSet>, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        grid: map.join("\n"),
        willpower,
        rules,
    }
}
