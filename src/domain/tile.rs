/// Entity tags and the cell tag set.
/// Properties are queried via methods, not stored per cell,
/// so tag semantics are centralized here.
///
/// ## Token alphabet
///   'C' = Actor              'B' = Block
///   'S' = Enemy (skeleton)   'P' = Spikes (active)
///   'p' = Spikes (inactive)  'K' = Key
///   'G' = Gate               'T' = Target
///   'W' = Wall               'E' = Terminal (active)
///   'e' = Terminal (broken)  '0'..'3' = Laser emitter up/right/down/left
///   ' ' / "" = Empty
///
/// ## Tag classes
/// ┌──────────────┬──────────────────────────────────────────────┐
/// │ Class        │ Members                                      │
/// ├──────────────┼──────────────────────────────────────────────┤
/// │ Blocking     │ C B S W E e G 0 1 2 3                        │
/// │ Solid        │ B W G          (stops laser rays)            │
/// │ Kickable     │ B S E e 0 1 2 3                              │
/// │ Destroyable  │ S → removed,  E → e                          │
/// └──────────────┴──────────────────────────────────────────────┘

use std::fmt;

use bitflags::bitflags;

use super::entity::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EntityTag {
    LaserUp,
    LaserRight,
    LaserDown,
    LaserLeft,
    Block,
    Actor,
    TerminalActive,
    Gate,
    Key,
    SpikesActive,
    Enemy,
    Target,
    Wall,
    TerminalBroken,
    SpikesInactive,
}

impl EntityTag {
    /// Every tag, in canonical (token-sorted) order.
    pub const ALL: [EntityTag; 15] = [
        EntityTag::LaserUp,
        EntityTag::LaserRight,
        EntityTag::LaserDown,
        EntityTag::LaserLeft,
        EntityTag::Block,
        EntityTag::Actor,
        EntityTag::TerminalActive,
        EntityTag::Gate,
        EntityTag::Key,
        EntityTag::SpikesActive,
        EntityTag::Enemy,
        EntityTag::Target,
        EntityTag::Wall,
        EntityTag::TerminalBroken,
        EntityTag::SpikesInactive,
    ];

    pub const LASERS: [EntityTag; 4] = [
        EntityTag::LaserUp,
        EntityTag::LaserRight,
        EntityTag::LaserDown,
        EntityTag::LaserLeft,
    ];

    pub fn token(self) -> char {
        match self {
            EntityTag::LaserUp => '0',
            EntityTag::LaserRight => '1',
            EntityTag::LaserDown => '2',
            EntityTag::LaserLeft => '3',
            EntityTag::Block => 'B',
            EntityTag::Actor => 'C',
            EntityTag::TerminalActive => 'E',
            EntityTag::Gate => 'G',
            EntityTag::Key => 'K',
            EntityTag::SpikesActive => 'P',
            EntityTag::Enemy => 'S',
            EntityTag::Target => 'T',
            EntityTag::Wall => 'W',
            EntityTag::TerminalBroken => 'e',
            EntityTag::SpikesInactive => 'p',
        }
    }

    pub fn from_token(token: char) -> Option<Self> {
        EntityTag::ALL.into_iter().find(|tag| tag.token() == token)
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityTag::LaserUp => "laser (up)",
            EntityTag::LaserRight => "laser (right)",
            EntityTag::LaserDown => "laser (down)",
            EntityTag::LaserLeft => "laser (left)",
            EntityTag::Block => "block",
            EntityTag::Actor => "actor",
            EntityTag::TerminalActive => "terminal",
            EntityTag::Gate => "gate",
            EntityTag::Key => "key",
            EntityTag::SpikesActive => "active spikes",
            EntityTag::Enemy => "enemy",
            EntityTag::Target => "target",
            EntityTag::Wall => "wall",
            EntityTag::TerminalBroken => "broken terminal",
            EntityTag::SpikesInactive => "inactive spikes",
        }
    }

    /// The single-tag cell for this tag.
    pub fn flag(self) -> Cell {
        match self {
            EntityTag::LaserUp => Cell::LASER_UP,
            EntityTag::LaserRight => Cell::LASER_RIGHT,
            EntityTag::LaserDown => Cell::LASER_DOWN,
            EntityTag::LaserLeft => Cell::LASER_LEFT,
            EntityTag::Block => Cell::BLOCK,
            EntityTag::Actor => Cell::ACTOR,
            EntityTag::TerminalActive => Cell::TERMINAL,
            EntityTag::Gate => Cell::GATE,
            EntityTag::Key => Cell::KEY,
            EntityTag::SpikesActive => Cell::SPIKES_ACTIVE,
            EntityTag::Enemy => Cell::ENEMY,
            EntityTag::Target => Cell::TARGET,
            EntityTag::Wall => Cell::WALL,
            EntityTag::TerminalBroken => Cell::TERMINAL_BROKEN,
            EntityTag::SpikesInactive => Cell::SPIKES_INACTIVE,
        }
    }

    /// Does this tag stop a moving entity from entering its cell?
    pub fn is_blocking(self) -> bool {
        Cell::BLOCKING.contains(self.flag())
    }

    /// Does this tag stop a laser ray?
    pub fn is_solid(self) -> bool {
        Cell::SOLID.contains(self.flag())
    }

    /// Is this tag kicked when the actor walks into it?
    pub fn is_kickable(self) -> bool {
        Cell::KICKABLE.contains(self.flag())
    }

    /// Is this tag destroyed when kicked into something it cannot enter?
    pub fn is_destroyable(self) -> bool {
        Cell::DESTROYABLE.contains(self.flag())
    }

    /// What a destroyed entity leaves behind. `None` = removed entirely.
    pub fn destroyed_state(self) -> Option<EntityTag> {
        match self {
            EntityTag::TerminalActive => Some(EntityTag::TerminalBroken),
            _ => None,
        }
    }

    /// Firing direction of a laser emitter tag.
    pub fn laser_direction(self) -> Option<Direction> {
        match self {
            EntityTag::LaserUp => Some(Direction::Up),
            EntityTag::LaserRight => Some(Direction::Right),
            EntityTag::LaserDown => Some(Direction::Down),
            EntityTag::LaserLeft => Some(Direction::Left),
            _ => None,
        }
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.name(), self.token())
    }
}

bitflags! {
    /// The set of entity tags occupying one board cell.
    ///
    /// Bits are declared in token-sorted order so iteration and rendering
    /// are canonical: two cells holding the same tags compare equal no
    /// matter what order the tags arrived in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Cell: u16 {
        const LASER_UP        = 1 << 0;
        const LASER_RIGHT     = 1 << 1;
        const LASER_DOWN      = 1 << 2;
        const LASER_LEFT      = 1 << 3;
        const BLOCK           = 1 << 4;
        const ACTOR           = 1 << 5;
        const TERMINAL        = 1 << 6;
        const GATE            = 1 << 7;
        const KEY             = 1 << 8;
        const SPIKES_ACTIVE   = 1 << 9;
        const ENEMY           = 1 << 10;
        const TARGET          = 1 << 11;
        const WALL            = 1 << 12;
        const TERMINAL_BROKEN = 1 << 13;
        const SPIKES_INACTIVE = 1 << 14;
    }
}

impl Cell {
    pub const LASERS: Cell = Cell::LASER_UP
        .union(Cell::LASER_RIGHT)
        .union(Cell::LASER_DOWN)
        .union(Cell::LASER_LEFT);

    pub const BLOCKING: Cell = Cell::ACTOR
        .union(Cell::BLOCK)
        .union(Cell::ENEMY)
        .union(Cell::WALL)
        .union(Cell::TERMINAL)
        .union(Cell::TERMINAL_BROKEN)
        .union(Cell::GATE)
        .union(Cell::LASERS);

    pub const SOLID: Cell = Cell::BLOCK.union(Cell::WALL).union(Cell::GATE);

    pub const KICKABLE: Cell = Cell::BLOCK
        .union(Cell::ENEMY)
        .union(Cell::TERMINAL)
        .union(Cell::TERMINAL_BROKEN)
        .union(Cell::LASERS);

    pub const DESTROYABLE: Cell = Cell::ENEMY.union(Cell::TERMINAL);

    /// Parse a cell from its token string. Whitespace is ignored; an empty
    /// string is an empty cell. Returns the first unknown token on failure.
    pub fn parse(text: &str) -> Result<Cell, char> {
        let mut cell = Cell::empty();
        for ch in text.chars().filter(|c| !c.is_whitespace()) {
            let tag = EntityTag::from_token(ch).ok_or(ch)?;
            cell.insert(tag.flag());
        }
        Ok(cell)
    }

    #[inline]
    pub fn has(self, tag: EntityTag) -> bool {
        self.contains(tag.flag())
    }

    pub fn add(&mut self, tag: EntityTag) {
        self.insert(tag.flag());
    }

    pub fn take(&mut self, tag: EntityTag) {
        self.remove(tag.flag());
    }

    /// Tags present in this cell, in canonical order.
    pub fn tags(self) -> impl Iterator<Item = EntityTag> {
        EntityTag::ALL.into_iter().filter(move |tag| self.has(*tag))
    }

    pub fn is_blocking(self) -> bool {
        self.intersects(Cell::BLOCKING)
    }

    pub fn is_solid_to_laser(self) -> bool {
        self.intersects(Cell::SOLID)
    }

    /// Kickable tags in this cell, canonical order.
    pub fn kickable(self) -> Vec<EntityTag> {
        self.tags().filter(|tag| tag.is_kickable()).collect()
    }

    /// Swap active and inactive spikes.
    pub fn cycle_spikes(&mut self) {
        let active = self.contains(Cell::SPIKES_ACTIVE);
        let inactive = self.contains(Cell::SPIKES_INACTIVE);
        self.set(Cell::SPIKES_ACTIVE, inactive);
        self.set(Cell::SPIKES_INACTIVE, active);
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tag in self.tags() {
            write!(f, "{}", tag.token())?;
        }
        Ok(())
    }
}
