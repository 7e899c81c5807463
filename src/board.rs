use std::fmt::{Debug, Display};
use thiserror::Error;

/// The rules-engine contract the search is written against.
///
/// An implementation owns the full position (piece placement and king status) and
/// knows how to enumerate, apply and judge moves. `Clone` must produce an independent
/// deep copy: the search branches positions by cloning and then mutating the copy.
pub trait Board: Clone {
    /// A single ply, possibly a multi-capture chain.
    type Move: Clone + PartialEq + Debug + Display;

    /// Returns the size of the playing field.
    fn dimensions(&self) -> Dimensions;

    /// Returns the piece standing on `square`, if any.
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Returns every legal move for `color`, grouped by the piece that makes it.
    ///
    /// An empty outer vector means `color` cannot move.
    fn legal_moves(&self, color: Color) -> Vec<Vec<Self::Move>>;

    /// Plays `b_move` for `color`, modifying the position in place.
    fn apply_move(&mut self, b_move: &Self::Move, color: Color) -> Result<(), InvalidMove>;

    /// Returns true if `color` has achieved a winning condition on this position.
    fn has_won(&self, color: Color) -> bool;
}

/// The two sides. `Black` moves first and starts on the low rows.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Row direction in which this side's men advance.
    pub fn forward(self) -> isize {
        match self {
            Color::Black => 1,
            Color::White => -1,
        }
    }

    /// The row this side starts from, which is where the opponent gets crowned.
    pub fn home_row(self, dims: Dimensions) -> usize {
        match self {
            Color::Black => 0,
            Color::White => dims.rows.saturating_sub(1),
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

/// A man or a king of one side.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Piece {
    pub color: Color,
    pub is_king: bool,
}

impl Piece {
    pub const fn man(color: Color) -> Self {
        Self {
            color,
            is_king: false,
        }
    }

    pub const fn king(color: Color) -> Self {
        Self {
            color,
            is_king: true,
        }
    }
}

/// A board coordinate, row first.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Number of rows and columns of a board.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Dimensions {
    pub rows: usize,
    pub cols: usize,
}

impl Dimensions {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn contains(&self, square: Square) -> bool {
        square.row < self.rows && square.col < self.cols
    }

    /// Returns the square reached by moving `(dr, dc)` from `square`, if it is on the board.
    pub fn offset(&self, square: Square, dr: isize, dc: isize) -> Option<Square> {
        let row = square.row.checked_add_signed(dr)?;
        let col = square.col.checked_add_signed(dc)?;
        (row < self.rows && col < self.cols).then_some(Square::new(row, col))
    }

    /// Iterates over all squares in row-major order.
    pub fn squares(&self) -> impl Iterator<Item = Square> + use<> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Square::new(row, col)))
    }
}

/// The four diagonal directions as `(row, col)` deltas.
pub const DIAGONALS: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// A move the rules engine refused for the given position and side.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid move {description} for {color}: {reason}")]
pub struct InvalidMove {
    pub description: String,
    pub color: Color,
    pub reason: String,
}

impl InvalidMove {
    pub fn new(b_move: &impl Display, color: Color, reason: impl Into<String>) -> Self {
        Self {
            description: b_move.to_string(),
            color,
            reason: reason.into(),
        }
    }
}
