use crate::board::{Board, Color, DIAGONALS, Dimensions, InvalidMove, Piece, Square};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building a board or reading move text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("a {cols}x{rows} board cannot hold {pieces_rows} rows of pieces per side")]
    InvalidDimensions {
        cols: usize,
        rows: usize,
        pieces_rows: usize,
    },
    #[error("cannot parse move {0:?}")]
    MoveSyntax(String),
    #[error("square {0} is not on the board")]
    OffBoard(Square),
}

/// An implementation of the `Board` trait for checkers on a configurable board.
///
/// Pieces stand on dark squares, those where `row + col` is odd. Black starts on the
/// first `p` rows and moves toward higher rows, White starts on the last `p` rows.
/// Captures are mandatory and a capturing piece keeps jumping while it can. A man
/// reaching the far row is crowned, which ends its move.
///
/// The board remembers whose turn it is: Black at setup, then the opponent of whoever
/// moved last. A side that cannot move only loses when it is the side to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckersBoard {
    dims: Dimensions,
    squares: Vec<Option<Piece>>,
    to_move: Color,
}

impl CheckersBoard {
    /// Creates a board with `cols` columns, `rows` rows and `p` rows of men per side.
    pub fn new(cols: usize, rows: usize, p: usize) -> Result<Self, BoardError> {
        if p == 0 || cols < 2 || rows <= 2 * p {
            return Err(BoardError::InvalidDimensions {
                cols,
                rows,
                pieces_rows: p,
            });
        }
        let mut board = Self::blank(Dimensions::new(rows, cols));
        for square in board.dims.squares() {
            if (square.row + square.col) % 2 == 0 {
                continue;
            }
            if square.row < p {
                board.place(square, Piece::man(Color::Black))?;
            } else if square.row >= rows - p {
                board.place(square, Piece::man(Color::White))?;
            }
        }
        Ok(board)
    }

    /// Creates a board with no pieces, for setting up positions by hand.
    pub fn empty(cols: usize, rows: usize) -> Result<Self, BoardError> {
        if cols < 2 || rows < 2 {
            return Err(BoardError::InvalidDimensions {
                cols,
                rows,
                pieces_rows: 0,
            });
        }
        Ok(Self::blank(Dimensions::new(rows, cols)))
    }

    fn blank(dims: Dimensions) -> Self {
        Self {
            dims,
            squares: vec![None; dims.rows * dims.cols],
            to_move: Color::Black,
        }
    }

    /// Sets the side to move, for positions set up by hand.
    pub fn with_side_to_move(mut self, color: Color) -> Self {
        self.to_move = color;
        self
    }

    pub fn side_to_move(&self) -> Color {
        self.to_move
    }

    /// Puts `piece` on `square`, replacing whatever stood there.
    pub fn place(&mut self, square: Square, piece: Piece) -> Result<(), BoardError> {
        if !self.dims.contains(square) {
            return Err(BoardError::OffBoard(square));
        }
        self.set(square, Some(piece));
        Ok(())
    }

    /// Takes the piece off `square`. Squares off the board are always empty.
    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        self.set(square, None)
    }

    /// Counts the pieces, kings included, that `color` has on the board.
    pub fn count(&self, color: Color) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|p| p.color == color)
            .count()
    }

    fn index(&self, square: Square) -> usize {
        square.row * self.dims.cols + square.col
    }

    fn set(&mut self, square: Square, piece: Option<Piece>) -> Option<Piece> {
        if !self.dims.contains(square) {
            return None;
        }
        let index = self.index(square);
        std::mem::replace(&mut self.squares[index], piece)
    }

    fn is_crowning_row(&self, color: Color, row: usize) -> bool {
        row == color.opponent().home_row(self.dims)
    }

    fn is_vacant(&self, square: Square, origin: Square) -> bool {
        square == origin || self.piece_at(square).is_none()
    }

    fn directions(piece: Piece) -> impl Iterator<Item = (isize, isize)> {
        let forward = piece.color.forward();
        DIAGONALS
            .into_iter()
            .filter(move |&(dr, _)| piece.is_king || dr == forward)
    }

    fn steps_from(&self, origin: Square, piece: Piece) -> Vec<CheckersMove> {
        Self::directions(piece)
            .filter_map(|(dr, dc)| self.dims.offset(origin, dr, dc))
            .filter(|&to| self.piece_at(to).is_none())
            .map(|to| CheckersMove::new(vec![origin, to]))
            .collect()
    }

    fn jumps_from(&self, origin: Square, piece: Piece) -> Vec<CheckersMove> {
        let mut jumps = Vec::new();
        self.collect_jumps(piece, &mut vec![origin], &mut Vec::new(), &mut jumps);
        jumps
    }

    fn collect_jumps(
        &self,
        piece: Piece,
        path: &mut Vec<Square>,
        captured: &mut Vec<Square>,
        out: &mut Vec<CheckersMove>,
    ) {
        let origin = path[0];
        let from = path[path.len() - 1];
        let mut extended = false;

        for (dr, dc) in Self::directions(piece) {
            let (Some(over), Some(landing)) = (
                self.dims.offset(from, dr, dc),
                self.dims.offset(from, 2 * dr, 2 * dc),
            ) else {
                continue;
            };
            let capturable = self
                .piece_at(over)
                .is_some_and(|victim| victim.color != piece.color && !captured.contains(&over));
            if !capturable || !self.is_vacant(landing, origin) {
                continue;
            }

            extended = true;
            path.push(landing);
            captured.push(over);
            if !piece.is_king && self.is_crowning_row(piece.color, landing.row) {
                out.push(CheckersMove::new(path.clone()));
            } else {
                self.collect_jumps(piece, path, captured, out);
            }
            path.pop();
            captured.pop();
        }

        if !extended && path.len() > 1 {
            out.push(CheckersMove::new(path.clone()));
        }
    }
}

impl Default for CheckersBoard {
    /// The standard 8x8 board with three rows of men per side.
    fn default() -> Self {
        let dims = Dimensions::new(8, 8);
        let mut board = Self::blank(dims);
        for square in dims.squares() {
            if (square.row + square.col) % 2 == 1 {
                match square.row {
                    0..3 => board.set(square, Some(Piece::man(Color::Black))),
                    5..8 => board.set(square, Some(Piece::man(Color::White))),
                    _ => None,
                };
            }
        }
        board
    }
}

impl Board for CheckersBoard {
    type Move = CheckersMove;

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        if !self.dims.contains(square) {
            return None;
        }
        self.squares[self.index(square)]
    }

    fn legal_moves(&self, color: Color) -> Vec<Vec<Self::Move>> {
        let mut captures = Vec::new();
        let mut steps = Vec::new();

        for square in self.dims.squares() {
            let Some(piece) = self.piece_at(square).filter(|p| p.color == color) else {
                continue;
            };
            let jumps = self.jumps_from(square, piece);
            if !jumps.is_empty() {
                captures.push(jumps);
            } else if captures.is_empty() {
                let moves = self.steps_from(square, piece);
                if !moves.is_empty() {
                    steps.push(moves);
                }
            }
        }

        if captures.is_empty() { steps } else { captures }
    }

    fn apply_move(&mut self, b_move: &Self::Move, color: Color) -> Result<(), InvalidMove> {
        let path = b_move.path();
        let reject = |reason: &str| InvalidMove::new(b_move, color, reason);

        let (Some(&origin), Some(&destination)) = (path.first(), path.last()) else {
            return Err(reject("empty path"));
        };
        if path.len() < 2 {
            return Err(reject("a move needs at least two squares"));
        }
        let piece = self
            .piece_at(origin)
            .filter(|p| p.color == color)
            .ok_or_else(|| reject("no piece of the moving side on the origin square"))?;

        let mut captured = Vec::new();
        let mut crowned = false;
        for hop in path.windows(2) {
            let (from, to) = (hop[0], hop[1]);
            if crowned {
                return Err(reject("the move continues after crowning"));
            }
            let dr = to.row as isize - from.row as isize;
            let dc = to.col as isize - from.col as isize;
            if dr.abs() != dc.abs()
                || !Self::directions(piece).any(|d| d == (dr.signum(), dc.signum()))
            {
                return Err(reject("not a diagonal in a permitted direction"));
            }
            if !self.dims.contains(to) {
                return Err(reject("off the board"));
            }
            if !self.is_vacant(to, origin) {
                return Err(reject("destination square is occupied"));
            }
            match dr.abs() {
                1 if path.len() == 2 => {}
                2 => {
                    let over = self
                        .dims
                        .offset(from, dr / 2, dc / 2)
                        .ok_or_else(|| reject("off the board"))?;
                    match self.piece_at(over) {
                        Some(victim) if victim.color != color && !captured.contains(&over) => {
                            captured.push(over)
                        }
                        _ => return Err(reject("no opponent piece to capture")),
                    }
                }
                _ => return Err(reject("illegal hop length")),
            }
            if !piece.is_king && self.is_crowning_row(color, to.row) {
                crowned = true;
            }
        }

        self.remove(origin);
        for square in captured {
            self.remove(square);
        }
        self.set(
            destination,
            Some(Piece {
                color,
                is_king: piece.is_king || crowned,
            }),
        );
        self.to_move = color.opponent();
        Ok(())
    }

    /// `color` has won when the opponent has no pieces left, or is the side to move
    /// and has no legal move. At most one side has won on any position.
    fn has_won(&self, color: Color) -> bool {
        let opponent = color.opponent();
        if self.count(color) == 0 {
            return false;
        }
        self.count(opponent) == 0
            || (self.to_move == opponent && self.legal_moves(opponent).is_empty())
    }
}

impl Display for CheckersBoard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.dims.rows {
            for col in 0..self.dims.cols {
                let symbol = match self.piece_at(Square::new(row, col)) {
                    None => '.',
                    Some(Piece { color: Color::Black, is_king: false }) => 'b',
                    Some(Piece { color: Color::Black, is_king: true }) => 'B',
                    Some(Piece { color: Color::White, is_king: false }) => 'w',
                    Some(Piece { color: Color::White, is_king: true }) => 'W',
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A checkers move as the sequence of squares the piece visits.
///
/// Written as `(r,c)-(r,c)`, with one extra `-(r,c)` per additional jump.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckersMove {
    path: Vec<Square>,
}

impl CheckersMove {
    pub fn new(path: Vec<Square>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &[Square] {
        &self.path
    }
}

impl Display for CheckersMove {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, square) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, "-")?;
            }
            write!(f, "{square}")?;
        }
        Ok(())
    }
}

impl FromStr for CheckersMove {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || BoardError::MoveSyntax(s.to_string());
        let path = s
            .split('-')
            .map(|part| {
                let inner = part
                    .trim()
                    .strip_prefix('(')
                    .and_then(|p| p.strip_suffix(')'))
                    .ok_or_else(syntax)?;
                let (row, col) = inner.split_once(',').ok_or_else(syntax)?;
                let row = row.trim().parse().map_err(|_| syntax())?;
                let col = col.trim().parse().map_err(|_| syntax())?;
                Ok(Square::new(row, col))
            })
            .collect::<Result<Vec<_>, BoardError>>()?;
        if path.len() < 2 {
            return Err(syntax());
        }
        Ok(Self::new(path))
    }
}
