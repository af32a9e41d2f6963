/// Board: the grid of multi-entity cells and every low-level query and
/// mutation on it. No game rules live here.
///
/// ## Coordinates
/// `(column, row)`, origin top-left, bounds `[0, width) × [0, height)`.
/// Coordinates are plain signed integers and may point off the board;
/// `cap_coordinate` is the single gate that decides validity. It never
/// clamps.
///
/// ## Error contract
/// ┌─────────────────────────┬──────────────────────────────────────┐
/// │ Operation               │ Off-board coordinate                 │
/// ├─────────────────────────┼──────────────────────────────────────┤
/// │ entities_at / contains  │ Err(InvalidCoordinate)               │
/// │ move_entity (from)      │ Err(InvalidStart)                    │
/// │ move_entity (to)        │ Ok(None), board unchanged            │
/// │ kickable_at / cell      │ empty / None                         │
/// │ remove / create_entity  │ Err(InvalidCoordinate)               │
/// └─────────────────────────┴──────────────────────────────────────┘

use std::fmt;

use super::entity::Direction;
use super::tile::{Cell, EntityTag};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Coordinate {
    pub column: i32,
    pub row: i32,
}

impl Coordinate {
    pub const fn new(column: i32, row: i32) -> Self {
        Coordinate { column, row }
    }

    /// The neighbouring coordinate in `direction` (may be off the board).
    /// Saturates at the edges of the `i32` range.
    pub fn step(self, direction: Direction) -> Coordinate {
        let (dx, dy) = direction.delta();
        Coordinate::new(self.column.saturating_add(dx), self.row.saturating_add(dy))
    }

    /// Like [`Coordinate::step`], but `None` past the `i32` range.
    pub fn checked_step(self, direction: Direction) -> Option<Coordinate> {
        let (dx, dy) = direction.delta();
        Some(Coordinate::new(self.column.checked_add(dx)?, self.row.checked_add(dy)?))
    }

    /// Manhattan distance, widened so any two coordinates fit.
    pub fn distance(self, other: Coordinate) -> i64 {
        let dx = i64::from(self.column) - i64::from(other.column);
        let dy = i64::from(self.row) - i64::from(other.row);
        dx.abs() + dy.abs()
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((column, row): (i32, i32)) -> Self {
        Coordinate::new(column, row)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Destination of a move: an absolute coordinate or a direction relative
/// to the start cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Target {
    At(Coordinate),
    Toward(Direction),
}

impl From<Coordinate> for Target {
    fn from(c: Coordinate) -> Self {
        Target::At(c)
    }
}

impl From<Direction> for Target {
    fn from(d: Direction) -> Self {
        Target::Toward(d)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("grid must have rows")]
    EmptyGrid,
    #[error("grid rows must have columns")]
    EmptyRow,
    #[error("grid has rows with differing lengths: row {row} has {found} cells, expected {expected}")]
    RaggedRows { row: usize, expected: usize, found: usize },
    #[error("grid must have exactly 1 actor, found {0}")]
    ActorCount(usize),
    #[error("unknown entity token {token:?} at row {row}, column {column}")]
    UnknownToken { token: char, row: usize, column: usize },
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(Coordinate),
    #[error("invalid start coordinate: {0}")]
    InvalidStart(Coordinate),
    #[error("{tag} is not present at {at}")]
    EntityNotPresent { tag: EntityTag, at: Coordinate },
    #[error("coordinates {a} and {b} are not adjacent")]
    NotAdjacent { a: Coordinate, b: Coordinate },
    #[error("the cell past {b} (from {a}) is outside the coordinate range")]
    OutOfRange { a: Coordinate, b: Coordinate },
    #[error("grid has no {0} entities")]
    NoSuchEntity(EntityTag),
    #[error("no laser emitter at {0}")]
    NoEmitter(Coordinate),
    #[error("{tag} at {at} cannot be kicked")]
    NotKickable { tag: EntityTag, at: Coordinate },
}

/// The grid. Equality is cell-by-cell on canonical tag sets, so the order
/// in which tags entered a cell never matters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Vec<Cell>>,
    width: usize,
    height: usize,
}

// ── Construction ──

impl Board {
    /// Build from the textual encoding: newline-separated rows of
    /// comma-separated cells.
    pub fn parse(text: &str) -> Result<Board, BoardError> {
        Board::from_rows(&split_grid_text(text))
    }

    /// Build from already-split rows of cell strings. Validates shape and
    /// actor count, canonicalizes every cell.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Board, BoardError> {
        let first = rows.first().ok_or(BoardError::EmptyGrid)?;
        let width = first.len();
        if width == 0 {
            return Err(BoardError::EmptyRow);
        }
        if let Some((row, found)) = rows.iter().map(Vec::len).enumerate().find(|&(_, len)| len != width) {
            return Err(BoardError::RaggedRows { row, expected: width, found });
        }

        let mut cells = Vec::with_capacity(rows.len());
        for (r, row) in rows.iter().enumerate() {
            let mut parsed = Vec::with_capacity(width);
            for (c, text) in row.iter().enumerate() {
                let cell = Cell::parse(text.as_ref())
                    .map_err(|token| BoardError::UnknownToken { token, row: r, column: c })?;
                parsed.push(cell);
            }
            cells.push(parsed);
        }

        let actors = cells.iter().flatten().filter(|c| c.has(EntityTag::Actor)).count();
        if actors != 1 {
            return Err(BoardError::ActorCount(actors));
        }

        Ok(Board { cells, width, height: rows.len() })
    }
}

/// Split grid text into rows of cell strings. No validation.
///
/// Rows end at `\n`, `\r\n` or a bare `\r`. A single trailing line break
/// does not start another row.
pub fn split_grid_text(text: &str) -> Vec<Vec<String>> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

// ── Geometry (board-independent) ──

impl Board {
    /// Given cardinal-adjacent `a` and `b`, the cell one further step past
    /// `b` in the same direction. May be off the board, but never outside
    /// the `i32` range.
    pub fn opposing_coordinate(a: Coordinate, b: Coordinate) -> Result<Coordinate, BoardError> {
        let direction = Board::coordinate_to_direction(b, a).ok_or(BoardError::NotAdjacent { a, b })?;
        b.checked_step(direction).ok_or(BoardError::OutOfRange { a, b })
    }

    /// Manhattan distance. Neither coordinate needs to be on a board.
    pub fn distance(a: Coordinate, b: Coordinate) -> i64 {
        a.distance(b)
    }

    pub fn direction_to_coordinate(direction: Direction, relative_to: Coordinate) -> Coordinate {
        relative_to.step(direction)
    }

    /// Direction in which `coord` lies from `relative_to`, if adjacent.
    pub fn coordinate_to_direction(coord: Coordinate, relative_to: Coordinate) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| relative_to.checked_step(*d) == Some(coord))
    }
}

// ── Queries ──

impl Board {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `Some(c)` unchanged if on the board, else `None`.
    #[inline]
    pub fn cap_coordinate(&self, c: Coordinate) -> Option<Coordinate> {
        let on_board = c.column >= 0
            && c.row >= 0
            && (c.column as usize) < self.width
            && (c.row as usize) < self.height;
        on_board.then_some(c)
    }

    /// Cell contents, or `None` off the board.
    #[inline]
    pub fn cell(&self, c: Coordinate) -> Option<Cell> {
        self.cap_coordinate(c).map(|c| self.cells[c.row as usize][c.column as usize])
    }

    pub fn entities_at(&self, c: Coordinate) -> Result<Cell, BoardError> {
        self.cell(c).ok_or(BoardError::InvalidCoordinate(c))
    }

    pub fn contains(&self, c: Coordinate, tag: EntityTag) -> Result<bool, BoardError> {
        Ok(self.entities_at(c)?.has(tag))
    }

    /// All coordinates, row-major (left-to-right, top-to-bottom).
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.height).flat_map(move |row| {
            (0..self.width).map(move |column| Coordinate::new(column as i32, row as i32))
        })
    }

    /// First actor cell in row-major order.
    pub fn find_actor(&self) -> Result<Coordinate, BoardError> {
        self.find_all(EntityTag::Actor)
            .into_iter()
            .next()
            .ok_or(BoardError::NoSuchEntity(EntityTag::Actor))
    }

    /// Every coordinate holding `tag`, row-major.
    pub fn find_all(&self, tag: EntityTag) -> Vec<Coordinate> {
        self.coordinates()
            .filter(|&c| self.cell(c).is_some_and(|cell| cell.has(tag)))
            .collect()
    }

    /// Closest `tag` by Manhattan distance; ties go to the earliest in
    /// row-major order.
    pub fn nearest_entity(&self, from: Coordinate, tag: EntityTag) -> Result<Coordinate, BoardError> {
        self.find_all(tag)
            .into_iter()
            .min_by_key(|c| from.distance(*c))
            .ok_or(BoardError::NoSuchEntity(tag))
    }

    /// Kickable tags at `c`; empty when off the board.
    pub fn kickable_at(&self, c: Coordinate) -> Vec<EntityTag> {
        self.cell(c).map(Cell::kickable).unwrap_or_default()
    }

    /// Neighbours in [up, right, down, left] order; off-board slots are `None`.
    pub fn adjacent(&self, c: Coordinate) -> [Option<Coordinate>; 4] {
        Direction::ALL.map(|d| self.cap_coordinate(c.step(d)))
    }

    /// Cells lit by the emitter at `emitter`, walking outward until the
    /// board edge or a solid cell (excluded). The emitter itself is not
    /// part of the ray; other emitters are not solid.
    pub fn cast_ray(&self, emitter: Coordinate) -> Result<Vec<Coordinate>, BoardError> {
        let cell = self.entities_at(emitter)?;
        let direction = cell
            .tags()
            .find_map(EntityTag::laser_direction)
            .ok_or(BoardError::NoEmitter(emitter))?;

        let mut ray = Vec::new();
        let mut next = self.cap_coordinate(emitter.step(direction));
        while let Some(c) = next {
            if self.cells[c.row as usize][c.column as usize].is_solid_to_laser() {
                break;
            }
            ray.push(c);
            next = self.cap_coordinate(c.step(direction));
        }
        Ok(ray)
    }
}

// ── Mutation primitives ──

impl Board {
    #[inline]
    fn cell_mut(&mut self, c: Coordinate) -> &mut Cell {
        &mut self.cells[c.row as usize][c.column as usize]
    }

    /// Move `tag` from `from` to `to`.
    ///
    /// Returns the destination, or `None` (board untouched) when the
    /// destination is off the board or blocking.
    pub fn move_entity(
        &mut self,
        tag: EntityTag,
        from: Coordinate,
        to: impl Into<Target>,
    ) -> Result<Option<Coordinate>, BoardError> {
        let start = self.cap_coordinate(from).ok_or(BoardError::InvalidStart(from))?;
        if !self.cell_mut(start).has(tag) {
            return Err(BoardError::EntityNotPresent { tag, at: start });
        }

        let target = match to.into() {
            Target::At(c) => c,
            Target::Toward(d) => start.step(d),
        };
        let Some(dest) = self.cap_coordinate(target) else {
            return Ok(None);
        };
        if self.cell_mut(dest).is_blocking() {
            return Ok(None);
        }

        self.cell_mut(dest).add(tag);
        self.cell_mut(start).take(tag);
        Ok(Some(dest))
    }

    /// Kick `tag` from `from` toward `to`.
    ///
    /// ┌────────────────────────────┬───────────────────────────────┐
    /// │ Outcome                    │ Returns                       │
    /// ├────────────────────────────┼───────────────────────────────┤
    /// │ moved                      │ Some(destination)             │
    /// │ stuck, not destroyable     │ Some(from)                    │
    /// │ stuck, destroyable         │ None; replaced by wreck if any│
    /// └────────────────────────────┴───────────────────────────────┘
    pub fn kick(
        &mut self,
        tag: EntityTag,
        from: Coordinate,
        to: impl Into<Target>,
    ) -> Result<Option<Coordinate>, BoardError> {
        if let Some(landed) = self.move_entity(tag, from, to)? {
            return Ok(Some(landed));
        }
        if tag.is_destroyable() {
            self.remove_entity(tag, from)?;
            if let Some(wreck) = tag.destroyed_state() {
                self.create_entity(wreck, from)?;
            }
            return Ok(None);
        }
        Ok(Some(from))
    }

    pub fn remove_entity(&mut self, tag: EntityTag, c: Coordinate) -> Result<(), BoardError> {
        let at = self.cap_coordinate(c).ok_or(BoardError::InvalidCoordinate(c))?;
        let cell = self.cell_mut(at);
        if !cell.has(tag) {
            return Err(BoardError::EntityNotPresent { tag, at });
        }
        cell.take(tag);
        Ok(())
    }

    /// Place `tag` at `c`. Not used by ordinary moves; handy for setting up
    /// positions and for destroyed-state replacement.
    pub fn create_entity(&mut self, tag: EntityTag, c: Coordinate) -> Result<(), BoardError> {
        let at = self.cap_coordinate(c).ok_or(BoardError::InvalidCoordinate(c))?;
        self.cell_mut(at).add(tag);
        Ok(())
    }

    /// Toggle every spike on the board between active and inactive.
    pub fn cycle_spikes(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            cell.cycle_spikes();
        }
    }

    /// Remove every enemy standing on active spikes. Returns where.
    pub fn spike_enemies(&mut self) -> Vec<Coordinate> {
        let doomed: Vec<Coordinate> = self
            .coordinates()
            .filter(|&c| {
                self.cell(c)
                    .is_some_and(|cell| cell.has(EntityTag::Enemy) && cell.has(EntityTag::SpikesActive))
            })
            .collect();
        for &c in &doomed {
            self.cell_mut(c).take(EntityTag::Enemy);
        }
        doomed
    }
}

// ── Rendering ──

impl Board {
    /// The textual encoding, canonical tag order. `Board::parse` of this
    /// string yields an equal board.
    pub fn to_grid_string(&self) -> String {
        self.cells
            .iter()
            .map(|row| row.iter().map(Cell::to_string).collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rows of canonical cell strings.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(Cell::to_string).collect())
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.iter().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = row
                .iter()
                .map(|c| if c.is_empty() { ".".to_string() } else { c.to_string() })
                .collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Grid used across board tests:
    ///   " " T K
    ///    B " " S
    ///    p  C  P
    const GRID: &str = " ,T,K\nB, ,S\np,C,P";

    fn board(text: &str) -> Board {
        Board::parse(text).expect("valid board")
    }

    fn at(column: i32, row: i32) -> Coordinate {
        Coordinate::new(column, row)
    }

    // ── Construction ──

    #[test]
    fn rejects_empty_grids() {
        let empty: Vec<Vec<&str>> = vec![];
        assert_eq!(Board::from_rows(&empty), Err(BoardError::EmptyGrid));
        assert_eq!(Board::from_rows(&[Vec::<&str>::new()]), Err(BoardError::EmptyRow));
    }

    #[test]
    fn rejects_ragged_rows() {
        assert_eq!(
            Board::from_rows(&[vec![" "], vec![" ", "C"]]),
            Err(BoardError::RaggedRows { row: 1, expected: 1, found: 2 })
        );
    }

    #[test]
    fn requires_exactly_one_actor() {
        assert_eq!(Board::parse(" , "), Err(BoardError::ActorCount(0)));
        assert_eq!(Board::parse(""), Err(BoardError::EmptyGrid));
        assert_eq!(Board::parse("C,C"), Err(BoardError::ActorCount(2)));
        assert_eq!(Board::parse("C\nC"), Err(BoardError::ActorCount(2)));
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert_eq!(
            Board::parse("C,X"),
            Err(BoardError::UnknownToken { token: 'X', row: 0, column: 1 })
        );
    }

    fn rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    #[test]
    fn split_grid_text_shapes() {
        assert_eq!(split_grid_text("C"), rows(&[&["C"]]));
        assert_eq!(split_grid_text("T, , ,C"), rows(&[&["T", " ", " ", "C"]]));
        assert_eq!(
            split_grid_text(" ,T, \nB,B,B\nC, , "),
            rows(&[&[" ", "T", " "], &["B", "B", "B"], &["C", " ", " "]])
        );
        assert_eq!(
            split_grid_text("T,S,,\n,P,,S\n ,C,B,"),
            rows(&[&["T", "S", "", ""], &["", "P", "", "S"], &[" ", "C", "B", ""]])
        );
        assert_eq!(split_grid_text("T\r\nC"), rows(&[&["T"], &["C"]]));
        assert_eq!(split_grid_text("\n\n\n"), rows(&[&[""], &[""], &[""]]));
        assert_eq!(split_grid_text("C,\n"), rows(&[&["C", ""]]));
    }

    #[test]
    fn bare_carriage_return_ends_a_row() {
        assert_eq!(split_grid_text("T\rC"), rows(&[&["T"], &["C"]]));
        assert_eq!(split_grid_text("T\r\rC\r"), rows(&[&["T"], &[""], &["C"]]));

        let b = board("T\rC");
        assert_eq!((b.width(), b.height()), (1, 2));
        assert_eq!(b.find_actor(), Ok(at(0, 1)));
        assert_eq!(board("T,\rC,"), board("T,\nC,"));
    }

    #[test]
    fn size() {
        let b = board(GRID);
        assert_eq!(b.width(), 3);
        assert_eq!(b.height(), 3);
    }

    // ── Coordinates ──

    #[test]
    fn cap_coordinate_keeps_valid() {
        let b = board(GRID);
        for c in [at(0, 0), at(1, 1), at(2, 2), at(0, 2), at(2, 0)] {
            assert_eq!(b.cap_coordinate(c), Some(c));
        }
    }

    #[test]
    fn cap_coordinate_rejects_invalid() {
        let b = board(GRID);
        for c in [at(-1, 0), at(0, -1), at(3, 0), at(0, 3), at(3, 3), at(-1, -1)] {
            assert_eq!(b.cap_coordinate(c), None);
        }
    }

    #[test]
    fn adjacent_preserves_slots() {
        let b = board(GRID);
        assert_eq!(b.adjacent(at(1, 2)), [Some(at(1, 1)), Some(at(2, 2)), None, Some(at(0, 2))]);
        assert_eq!(b.adjacent(at(1, 1)), [Some(at(1, 0)), Some(at(2, 1)), Some(at(1, 2)), Some(at(0, 1))]);
        assert_eq!(b.adjacent(at(0, 0)), [None, Some(at(1, 0)), Some(at(0, 1)), None]);
    }

    #[test]
    fn opposing_coordinate() {
        for (a, b, c) in [
            (at(2, 0), at(1, 0), at(0, 0)),
            (at(0, 0), at(0, 1), at(0, 2)),
            (at(1, 1), at(2, 1), at(3, 1)),
            (at(1, 0), at(0, 0), at(-1, 0)),
        ] {
            assert_eq!(Board::opposing_coordinate(a, b), Ok(c));
        }
    }

    #[test]
    fn opposing_coordinate_requires_adjacency() {
        for (a, b) in [(at(0, 0), at(1, 1)), (at(0, 1), at(0, 4)), (at(2, 2), at(2, 2))] {
            assert_eq!(Board::opposing_coordinate(a, b), Err(BoardError::NotAdjacent { a, b }));
        }
    }

    #[test]
    fn opposing_coordinate_at_the_edge_of_the_range() {
        let (a, b) = (at(i32::MAX - 1, 0), at(i32::MAX, 0));
        assert_eq!(Board::opposing_coordinate(a, b), Err(BoardError::OutOfRange { a, b }));
        let (a, b) = (at(0, i32::MIN + 1), at(0, i32::MIN));
        assert_eq!(Board::opposing_coordinate(a, b), Err(BoardError::OutOfRange { a, b }));

        let (a, b) = (at(i32::MIN, 0), at(i32::MAX, 0));
        assert_eq!(Board::opposing_coordinate(a, b), Err(BoardError::NotAdjacent { a, b }));
        assert_eq!(Board::opposing_coordinate(at(i32::MAX, 0), at(i32::MAX - 1, 0)), Ok(at(i32::MAX - 2, 0)));
    }

    #[test]
    fn direction_conversions() {
        assert_eq!(Board::direction_to_coordinate(Direction::Right, at(0, 0)), at(1, 0));
        assert_eq!(Board::direction_to_coordinate(Direction::Down, at(1, 1)), at(1, 2));
        assert_eq!(Board::direction_to_coordinate(Direction::Left, at(0, 0)), at(-1, 0));
        assert_eq!(Board::direction_to_coordinate(Direction::Up, at(0, 0)), at(0, -1));

        assert_eq!(Board::coordinate_to_direction(at(0, 1), at(0, 0)), Some(Direction::Down));
        assert_eq!(Board::coordinate_to_direction(at(5, 5), at(5, 4)), Some(Direction::Down));
        assert_eq!(Board::coordinate_to_direction(at(1, 1), at(0, 0)), None);
        assert_eq!(Board::coordinate_to_direction(at(0, -1), at(0, 0)), Some(Direction::Up));
        assert_eq!(Board::coordinate_to_direction(at(0, 2), at(0, 0)), None);
    }

    #[test]
    fn distance_is_manhattan_and_unbounded() {
        for (a, b, d) in [
            (at(0, 0), at(0, 0), 0),
            (at(0, 0), at(0, 1), 1),
            (at(0, 0), at(1, 0), 1),
            (at(1, 1), at(0, 0), 2),
            (at(5, 2), at(1, 6), 8),
            (at(-2, -1), at(0, 0), 3),
        ] {
            assert_eq!(Board::distance(a, b), d);
        }
    }

    #[test]
    fn distance_spans_the_whole_coordinate_range() {
        assert_eq!(Board::distance(at(i32::MIN, 0), at(1, 0)), 1 - i64::from(i32::MIN));
        assert_eq!(
            Board::distance(at(i32::MIN, i32::MIN), at(i32::MAX, i32::MAX)),
            2 * (i64::from(i32::MAX) - i64::from(i32::MIN))
        );
        assert_eq!(at(i32::MAX, 0).step(Direction::Right), at(i32::MAX, 0));
        assert_eq!(at(i32::MAX, 0).checked_step(Direction::Right), None);
        assert_eq!(Board::coordinate_to_direction(at(i32::MAX, 0), at(i32::MAX, 0)), None);
    }

    #[test]
    fn nearest_entity() {
        let b = board("\
 , ,T, ,T
T, , , ,
 , , , ,
 , , , ,
 , ,C, , ");
        assert_eq!(b.nearest_entity(at(2, 4), EntityTag::Target), Ok(at(2, 0)));
        assert_eq!(b.nearest_entity(at(0, 4), EntityTag::Target), Ok(at(0, 1)));
        assert_eq!(b.nearest_entity(at(4, 1), EntityTag::Target), Ok(at(4, 0)));
        assert_eq!(
            b.nearest_entity(at(0, 0), EntityTag::Key),
            Err(BoardError::NoSuchEntity(EntityTag::Key))
        );
    }

    // ── Queries ──

    #[test]
    fn equality_ignores_tag_order() {
        let mut misordered = board("P\nC");
        misordered.move_entity(EntityTag::Actor, at(0, 1), at(0, 0)).unwrap();
        assert_eq!(board("CP\n "), misordered);
        assert_eq!(board("PC\n"), board("CP\n"));
        assert_eq!(board(GRID), board(GRID));
        assert_ne!(board(GRID), board("C\n "));
    }

    #[test]
    fn iterates_row_major() {
        let b = board(GRID);
        let expected = [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1), (0, 2), (1, 2), (2, 2)];
        let coords: Vec<Coordinate> = b.coordinates().collect();
        assert_eq!(coords, expected.map(Coordinate::from).to_vec());
        // Restartable.
        assert_eq!(b.coordinates().count(), 9);
    }

    #[test]
    fn find_actor_and_find_all() {
        let b = board(GRID);
        assert_eq!(b.find_actor(), Ok(at(1, 2)));
        assert_eq!(b.find_all(EntityTag::Block), vec![at(0, 1)]);
        assert!(b.find_all(EntityTag::Wall).is_empty());
    }

    #[test]
    fn entities_at_rejects_off_board() {
        let b = board(GRID);
        assert_eq!(b.entities_at(at(3, 0)), Err(BoardError::InvalidCoordinate(at(3, 0))));
        assert_eq!(b.contains(at(0, -1), EntityTag::Key), Err(BoardError::InvalidCoordinate(at(0, -1))));
    }

    #[test]
    fn kickable_off_board_is_empty() {
        let b = board(GRID);
        assert!(b.kickable_at(at(-1, -1)).is_empty());
        assert_eq!(b.kickable_at(at(2, 1)), vec![EntityTag::Enemy]);
    }

    // ── Movement ──

    #[test]
    fn move_into_open_squares() {
        let mut b = board(GRID);
        let mut start = at(1, 2);
        for target in [at(0, 0), at(1, 1)] {
            assert_eq!(b.move_entity(EntityTag::Actor, start, target), Ok(Some(target)));
            assert!(b.contains(target, EntityTag::Actor).unwrap());
            assert!(!b.contains(start, EntityTag::Actor).unwrap());
            start = target;
        }
    }

    #[test]
    fn move_onto_non_blocking_entities() {
        let mut b = board(GRID);
        let mut start = at(1, 2);
        for target in [at(1, 0), at(2, 0), at(0, 2), at(2, 2)] {
            assert_eq!(b.move_entity(EntityTag::Actor, start, target), Ok(Some(target)));
            assert!(b.contains(target, EntityTag::Actor).unwrap());
            assert!(!b.contains(start, EntityTag::Actor).unwrap());
            start = target;
        }
    }

    #[test]
    fn move_by_direction() {
        let mut b = board(GRID);
        assert_eq!(b.move_entity(EntityTag::Actor, at(1, 2), Direction::Up), Ok(Some(at(1, 1))));
    }

    #[test]
    fn move_into_occupied_is_refused() {
        let mut b = board(GRID);
        let before = b.clone();
        for target in [at(0, 1), at(2, 1), at(1, 2)] {
            assert_eq!(b.move_entity(EntityTag::Actor, at(1, 2), target), Ok(None));
        }
        assert_eq!(b, before);
    }

    #[test]
    fn move_off_board_is_refused() {
        let mut b = board(GRID);
        for target in [at(-1, 0), at(0, -1), at(3, 0), at(0, 3), at(1, -1), at(3, 1)] {
            assert_eq!(b.move_entity(EntityTag::Actor, at(1, 2), target), Ok(None));
        }
    }

    #[test]
    fn move_validates_start() {
        let mut b = board(GRID);
        assert_eq!(
            b.move_entity(EntityTag::Actor, at(-1, 2), at(0, 2)),
            Err(BoardError::InvalidStart(at(-1, 2)))
        );
        assert_eq!(
            b.move_entity(EntityTag::Block, at(1, 1), at(1, 0)),
            Err(BoardError::EntityNotPresent { tag: EntityTag::Block, at: at(1, 1) })
        );
    }

    #[test]
    fn remove_entity() {
        for (c, tag) in [(at(0, 1), EntityTag::Block), (at(2, 1), EntityTag::Enemy), (at(1, 2), EntityTag::Actor)] {
            let mut b = board(GRID);
            b.remove_entity(tag, c).unwrap();
            assert!(!b.contains(c, tag).unwrap());
        }
    }

    #[test]
    fn remove_entity_rejects_off_board() {
        let mut b = board(GRID);
        for c in [at(-1, 0), at(-1, -1), at(3, 0), at(0, 3)] {
            assert_eq!(b.remove_entity(EntityTag::Enemy, c), Err(BoardError::InvalidCoordinate(c)));
        }
    }

    #[test]
    fn remove_entity_rejects_mismatch() {
        let mut b = board(GRID);
        for (c, tag) in [(at(0, 0), EntityTag::Actor), (at(1, 1), EntityTag::Target), (at(2, 2), EntityTag::SpikesInactive)] {
            assert_eq!(b.remove_entity(tag, c), Err(BoardError::EntityNotPresent { tag, at: c }));
        }
    }

    // ── Kicks ──

    #[test]
    fn kick_into_empty_and_non_blocking() {
        for (tag, start, target) in [
            (EntityTag::Block, at(0, 1), at(0, 0)),
            (EntityTag::Enemy, at(2, 1), at(1, 1)),
            (EntityTag::Block, at(0, 1), at(0, 2)),
            (EntityTag::Enemy, at(2, 1), at(2, 0)),
        ] {
            let mut b = board(GRID);
            assert_eq!(b.kick(tag, start, target), Ok(Some(target)));
            assert!(b.contains(target, tag).unwrap());
            assert!(!b.contains(start, tag).unwrap());
        }
    }

    #[test]
    fn kick_stuck_block_stays() {
        let mut b = board(GRID);
        b.move_entity(EntityTag::Enemy, at(2, 1), at(1, 1)).unwrap();
        for target in [at(-1, 1), at(1, 1)] {
            assert_eq!(b.kick(EntityTag::Block, at(0, 1), target), Ok(Some(at(0, 1))));
            assert!(b.contains(at(0, 1), EntityTag::Block).unwrap());
        }
        assert!(!b.contains(at(1, 1), EntityTag::Block).unwrap());
    }

    #[test]
    fn kick_destroys_destroyables() {
        let mut b = board(GRID);
        assert_eq!(b.kick(EntityTag::Enemy, at(2, 1), at(3, 1)), Ok(None));
        assert!(!b.contains(at(2, 1), EntityTag::Enemy).unwrap());

        b.create_entity(EntityTag::Enemy, at(1, 1)).unwrap();
        assert_eq!(b.kick(EntityTag::Enemy, at(1, 1), at(0, 1)), Ok(None));
        assert!(!b.contains(at(1, 1), EntityTag::Enemy).unwrap());
    }

    #[test]
    fn kick_validates_entity() {
        for (tag, start, target) in [
            (EntityTag::Enemy, at(1, 1), at(2, 1)),
            (EntityTag::Block, at(1, 1), at(2, 1)),
            (EntityTag::Block, at(2, 1), at(1, 1)),
        ] {
            let mut b = board(GRID);
            assert_eq!(b.kick(tag, start, target), Err(BoardError::EntityNotPresent { tag, at: start }));
        }
    }

    // ── Housekeeping ──

    #[test]
    fn cycle_spikes() {
        let mut b = board(GRID);
        b.cycle_spikes();
        assert!(b.contains(at(0, 2), EntityTag::SpikesActive).unwrap());
        assert!(b.contains(at(2, 2), EntityTag::SpikesInactive).unwrap());
    }

    #[test]
    fn spike_enemies() {
        let mut b = board("SP\nSp\nSP\nC");
        assert_eq!(b.spike_enemies(), vec![at(0, 0), at(0, 2)]);
        assert!(!b.contains(at(0, 0), EntityTag::Enemy).unwrap());
        assert!(!b.contains(at(0, 2), EntityTag::Enemy).unwrap());
        assert!(b.contains(at(0, 1), EntityTag::Enemy).unwrap());
        b.cycle_spikes();
        assert_eq!(b.spike_enemies(), vec![at(0, 1)]);
    }

    // ── Lasers ──

    #[test]
    fn cast_ray() {
        for (grid, emitter, expected) in [
            // through non-solid cells to the edge
            ("2\nT\nS\nC", at(0, 0), vec![at(0, 1), at(0, 2), at(0, 3)]),
            // stops at a block
            ("1,,B,TC", at(0, 0), vec![at(1, 0)]),
            // firing straight off the board
            (",0,\n,,\n,C,", at(1, 0), vec![]),
            // passes through other emitters
            ("1,1,C,", at(0, 0), vec![at(1, 0), at(2, 0), at(3, 0)]),
        ] {
            assert_eq!(board(grid).cast_ray(emitter), Ok(expected), "grid {grid:?}");
        }
    }

    #[test]
    fn cast_ray_requires_emitter() {
        let b = board("C,");
        assert_eq!(b.cast_ray(at(1, 0)), Err(BoardError::NoEmitter(at(1, 0))));
        assert_eq!(b.cast_ray(at(5, 0)), Err(BoardError::InvalidCoordinate(at(5, 0))));
    }

    // ── Rendering ──

    #[test]
    fn grid_string_round_trips() {
        let b = board(" ,T,K\nB, ,S\npB,C,P");
        assert_eq!(b.to_grid_string(), ",T,K\nB,,S\nBp,C,P");
        assert_eq!(Board::parse(&b.to_grid_string()), Ok(b));
    }

    #[test]
    fn display_shows_empty_cells() {
        assert_eq!(board("C,\nKP,").to_string(), "C .\nKP .");
    }

    // ── Properties ──

    fn arb_board() -> impl Strategy<Value = Board> {
        (1usize..6, 1usize..6)
            .prop_flat_map(|(w, h)| {
                let tokens = prop::sample::select(vec!["", "B", "S", "P", "p", "K", "W", "SP", "Bp", "T"]);
                (prop::collection::vec(tokens, w * h), Just(w), 0..w * h)
            })
            .prop_map(|(cells, w, actor)| {
                let rows: Vec<Vec<String>> = cells
                    .chunks(w)
                    .enumerate()
                    .map(|(r, row)| {
                        row.iter()
                            .enumerate()
                            .map(|(c, t)| {
                                if r * w + c == actor { format!("C{t}") } else { t.to_string() }
                            })
                            .collect()
                    })
                    .collect();
                Board::from_rows(&rows).expect("generated board is valid")
            })
    }

    proptest! {
        #[test]
        fn cap_is_idempotent(b in arb_board(), column in -3i32..9, row in -3i32..9) {
            let c = Coordinate::new(column, row);
            let capped = b.cap_coordinate(c);
            prop_assert_eq!(capped.and_then(|c| b.cap_coordinate(c)), capped);
            if let Some(valid) = capped {
                prop_assert_eq!(valid, c);
            }
        }

        #[test]
        fn cycling_spikes_twice_is_identity(b in arb_board()) {
            let mut cycled = b.clone();
            cycled.cycle_spikes();
            cycled.cycle_spikes();
            prop_assert_eq!(cycled, b);
        }

        #[test]
        fn reordered_cells_are_equal(b in arb_board()) {
            let reversed: Vec<Vec<String>> = b
                .to_rows()
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.chars().rev().collect()).collect())
                .collect();
            prop_assert_eq!(Board::from_rows(&reversed).expect("valid"), b);
        }
    }
}
