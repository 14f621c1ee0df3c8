use std::collections::HashSet;
use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_WIDTH: i16 = 20;
pub const DEFAULT_HEIGHT: i16 = 20;

/// Smallest width/height that still fits every spawn layout inside the walls.
pub const MIN_SURFACE_SIZE: i16 = 8;

/// Largest width/height accepted; the render grid is rebuilt every tick.
pub const MAX_SURFACE_SIZE: i16 = 256;

// Cell index the rotation formula pivots on.
const PIVOT_INDEX: usize = 1;

// Bottom border row plus one row of clearance.
const FLOOR_MARGIN: i16 = 3;
const FRAME_MARGIN: i16 = 2;

// Columns 0 and 1 are the wall and its collision column.
const LEFT_WALL_LIMIT: i16 = 1;
const RIGHT_WALL_MARGIN: i16 = 2;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// The fixed-size playable surface. Every bound is derived on demand.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Surface {
    pub width: i16,
    pub height: i16,
}

impl Surface {
    pub const fn new(width: i16, height: i16) -> Self {
        Self { width, height }
    }

    pub fn center_x(&self) -> i16 {
        self.width / 2
    }

    /// Row at or beyond which a piece can no longer descend.
    pub fn floor_y(&self) -> i16 {
        self.height - FLOOR_MARGIN
    }

    /// Row holding the bottom frame.
    pub fn frame_y(&self) -> i16 {
        self.height - FRAME_MARGIN
    }

    pub fn right_wall_x(&self) -> i16 {
        self.width - 1
    }

    /// Columns that must all be filled for a row to count as complete.
    pub fn interior_columns(&self) -> Range<i16> {
        2..self.width - 2
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShapeKind {
    Line,
    Square,
    LShape,
    SShape,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Line,
        ShapeKind::Square,
        ShapeKind::LShape,
        ShapeKind::SShape,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Spawn offsets relative to `(center_x, 0)`. Order matters: index 1 is the pivot.
    pub fn layout(&self) -> [(i16, i16); 4] {
        match self {
            ShapeKind::Line => [(0, 0), (0, 1), (0, 2), (0, 3)],
            ShapeKind::Square => [(0, 0), (0, 1), (1, 0), (1, 1)],
            ShapeKind::LShape => [(0, 0), (0, 1), (0, 2), (1, 2)],
            ShapeKind::SShape => [(0, 0), (1, 0), (1, 1), (2, 1)],
        }
    }

    pub fn rotatable(&self) -> bool {
        !matches!(self, ShapeKind::Square)
    }
}

// ============================================================================
// Piece
// ============================================================================

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Piece {
    kind: ShapeKind,
    cells: [Position; 4],
}

impl Piece {
    pub fn spawn(kind: ShapeKind, surface: &Surface) -> Self {
        let anchor = surface.center_x();
        let cells = kind.layout().map(|(dx, dy)| Position::new(anchor + dx, dy));
        Self { kind, cells }
    }

    pub fn from_cells(kind: ShapeKind, cells: [Position; 4]) -> Self {
        Self { kind, cells }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn cells(&self) -> &[Position; 4] {
        &self.cells
    }

    /// Quarter turn clockwise about the pivot cell.
    ///
    /// No wall or fixed-cell check happens here: a rotation may carry cells
    /// into a wall or onto settled blocks.
    pub fn rotate(&mut self) {
        if !self.kind.rotatable() {
            return;
        }
        let pivot = self.cells[PIVOT_INDEX];
        for cell in self.cells.iter_mut() {
            let dx = cell.x - pivot.x;
            let dy = cell.y - pivot.y;
            cell.x = pivot.x - dy;
            cell.y = pivot.y + dx;
        }
    }

    pub fn move_right(&mut self, surface: &Surface) -> bool {
        if self.collides_with_right_wall(surface) {
            return false;
        }
        self.translate(1, 0);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.collides_with_left_wall() {
            return false;
        }
        self.translate(-1, 0);
        true
    }

    /// Unconditional; callers check the look-ahead collisions first.
    pub fn move_down(&mut self) {
        self.translate(0, 1);
    }

    pub fn collides_with_floor(&self, surface: &Surface) -> bool {
        let floor = surface.floor_y();
        self.cells.iter().any(|cell| cell.y >= floor)
    }

    /// True when descending one row would land on a fixed cell.
    pub fn collides_with_fixed(&self, board: &Board) -> bool {
        self.cells
            .iter()
            .any(|cell| board.contains(Position::new(cell.x, cell.y + 1)))
    }

    pub fn collides_with_left_wall(&self) -> bool {
        self.cells.iter().any(|cell| cell.x <= LEFT_WALL_LIMIT)
    }

    pub fn collides_with_right_wall(&self, surface: &Surface) -> bool {
        let limit = surface.width - RIGHT_WALL_MARGIN;
        self.cells.iter().any(|cell| cell.x >= limit)
    }

    pub fn fix(&self, board: &mut Board) {
        for cell in self.cells {
            board.insert(cell);
        }
    }

    fn translate(&mut self, dx: i16, dy: i16) {
        for cell in self.cells.iter_mut() {
            cell.x += dx;
            cell.y += dy;
        }
    }
}

// ============================================================================
// Board
// ============================================================================

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Board {
    cells: HashSet<Position>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells<I: IntoIterator<Item = Position>>(cells: I) -> Self {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    /// Returns false if the coordinate was already occupied.
    pub fn insert(&mut self, pos: Position) -> bool {
        self.cells.insert(pos)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Position> {
        self.cells.iter()
    }

    pub fn filled_in_row(&self, y: i16) -> usize {
        self.cells.iter().filter(|cell| cell.y == y).count()
    }

    pub fn is_row_complete(&self, y: i16, surface: &Surface) -> bool {
        surface
            .interior_columns()
            .all(|x| self.contains(Position::new(x, y)))
    }

    /// Removes every complete row and drops the cells above each one.
    /// Returns the number of rows removed.
    pub fn clear_completed_rows(&mut self, surface: &Surface) -> u32 {
        let complete: Vec<i16> = (1..=surface.floor_y())
            .rev()
            .filter(|&y| self.is_row_complete(y, surface))
            .collect();

        for (already_cleared, &row) in complete.iter().enumerate() {
            // Earlier clears in this sweep have already pulled this row down.
            let row = row + already_cleared as i16;
            self.cells = std::mem::take(&mut self.cells)
                .into_iter()
                .filter(|cell| cell.y != row)
                .map(|cell| {
                    if cell.y < row {
                        Position::new(cell.x, cell.y + 1)
                    } else {
                        cell
                    }
                })
                .collect();
        }

        complete.len() as u32
    }
}

// ============================================================================
// Random Source
// ============================================================================

/// Source of piece selections. `next(n)` yields a value in `0..n`.
pub trait RandomSource {
    fn next(&mut self, n: usize) -> usize;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..n)
    }
}

pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }
}

/// Replays a fixed list of values, cycling when exhausted.
pub struct SequenceSource {
    values: Vec<usize>,
    index: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<usize>) -> Self {
        Self { values, index: 0 }
    }

    pub fn of_kinds(kinds: &[ShapeKind]) -> Self {
        let values = kinds
            .iter()
            .map(|kind| {
                ShapeKind::ALL
                    .iter()
                    .position(|candidate| candidate == kind)
                    .unwrap_or(0)
            })
            .collect();
        Self::new(values)
    }
}

impl RandomSource for SequenceSource {
    fn next(&mut self, n: usize) -> usize {
        if n == 0 || self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.index % self.values.len()];
        self.index += 1;
        value % n
    }
}

// ============================================================================
// Game
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveRight,
    MoveLeft,
    Rotate,
    SoftDrop,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellState {
    Empty,
    Wall,
    Frame,
    Fixed,
    Active(ShapeKind),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceFixed,
    RowsCleared(u32),
    PieceSpawned(ShapeKind),
}

pub struct Game {
    pub surface: Surface,
    pub board: Board,
    pub current_piece: Piece,
    source: Box<dyn RandomSource>,
    events: Vec<GameEvent>,
    pieces_fixed: u32,
    rows_cleared: u32,
}

impl Game {
    pub fn new(surface: Surface) -> Self {
        Self::with_source(surface, Box::new(ThreadRandom))
    }

    pub fn with_source(surface: Surface, mut source: Box<dyn RandomSource>) -> Self {
        let kind = ShapeKind::from_index(source.next(ShapeKind::ALL.len()));
        let current_piece = Piece::spawn(kind, &surface);

        Self {
            surface,
            board: Board::new(),
            current_piece,
            source,
            events: vec![GameEvent::PieceSpawned(kind)],
            pieces_fixed: 0,
            rows_cleared: 0,
        }
    }

    /// Starts from an arbitrary board and active piece. Later spawns draw from `source`.
    pub fn with_state(
        surface: Surface,
        board: Board,
        current_piece: Piece,
        source: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            surface,
            board,
            current_piece,
            source,
            events: Vec::new(),
            pieces_fixed: 0,
            rows_cleared: 0,
        }
    }

    /// One gravity step: descend, or fix, clear and respawn.
    pub fn tick(&mut self) {
        let blocked = self.current_piece.collides_with_floor(&self.surface)
            || self.current_piece.collides_with_fixed(&self.board);

        if blocked {
            self.fix_and_spawn();
        } else {
            self.current_piece.move_down();
        }
    }

    /// Applies one player command. Returns whether the piece changed.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::MoveRight => {
                let moved = self.current_piece.move_right(&self.surface);
                if moved {
                    self.events.push(GameEvent::PieceMoved);
                }
                moved
            }
            Command::MoveLeft => {
                let moved = self.current_piece.move_left();
                if moved {
                    self.events.push(GameEvent::PieceMoved);
                }
                moved
            }
            Command::Rotate => {
                let rotatable = self.current_piece.kind().rotatable();
                self.current_piece.rotate();
                if rotatable {
                    self.events.push(GameEvent::PieceRotated);
                }
                rotatable
            }
            Command::SoftDrop => {
                self.current_piece.move_down();
                self.events.push(GameEvent::PieceMoved);
                true
            }
        }
    }

    fn fix_and_spawn(&mut self) {
        self.current_piece.fix(&mut self.board);
        self.pieces_fixed += 1;
        self.events.push(GameEvent::PieceFixed);

        let cleared = self.board.clear_completed_rows(&self.surface);
        if cleared > 0 {
            self.rows_cleared += cleared;
            self.events.push(GameEvent::RowsCleared(cleared));
        }

        self.spawn_next_piece();
    }

    pub fn spawn_next_piece(&mut self) {
        let kind = ShapeKind::from_index(self.source.next(ShapeKind::ALL.len()));
        self.current_piece = Piece::spawn(kind, &self.surface);
        self.events.push(GameEvent::PieceSpawned(kind));
    }

    pub fn pieces_fixed(&self) -> u32 {
        self.pieces_fixed
    }

    pub fn rows_cleared(&self) -> u32 {
        self.rows_cleared
    }

    /// Returns the full surface with walls, frame, fixed cells and the active
    /// piece overlaid. Coordinates outside the surface are skipped.
    pub fn render_grid(&self) -> Vec<Vec<CellState>> {
        let width = self.surface.width.max(0) as usize;
        let height = self.surface.height.max(0) as usize;
        let mut grid = vec![vec![CellState::Empty; width]; height];

        let mut put = |pos: Position, state: CellState| {
            if self.surface.contains(pos) {
                grid[pos.y as usize][pos.x as usize] = state;
            }
        };

        for y in 0..self.surface.frame_y() {
            put(Position::new(0, y), CellState::Wall);
            put(Position::new(self.surface.right_wall_x(), y), CellState::Wall);
        }
        for x in 0..self.surface.width {
            put(Position::new(x, self.surface.frame_y()), CellState::Frame);
        }
        for &cell in self.board.cells() {
            put(cell, CellState::Fixed);
        }
        let kind = self.current_piece.kind();
        for &cell in self.current_piece.cells() {
            put(cell, CellState::Active(kind));
        }

        grid
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(Surface::default())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    pub fn surface_20() -> Surface {
        Surface::new(20, 20)
    }

    pub fn fill_row(board: &mut Board, y: i16, surface: &Surface) {
        for x in surface.interior_columns() {
            board.insert(Position::new(x, y));
        }
    }

    pub fn fill_row_with_gap(board: &mut Board, y: i16, gap_x: i16, surface: &Surface) {
        for x in surface.interior_columns() {
            if x != gap_x {
                board.insert(Position::new(x, y));
            }
        }
    }

    pub fn sequence(kinds: &[ShapeKind]) -> Box<dyn RandomSource> {
        Box::new(SequenceSource::of_kinds(kinds))
    }
}
