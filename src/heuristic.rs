//! Static evaluation used to steer playouts.
//!
//! Every feature is measured from one side's point of view; positive values favor it.

use crate::board::{Board, Color, DIAGONALS, Dimensions, Square};

/// Multipliers applied to each raw feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub material: f64,
    pub kings: f64,
    pub center: f64,
    pub back_row: f64,
    pub advancement: f64,
    pub protection: f64,
    pub mobility: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            material: 10.0,
            kings: 15.0,
            center: 4.0,
            back_row: 6.0,
            advancement: 3.0,
            protection: 5.0,
            mobility: 4.0,
        }
    }
}

/// Raw, unweighted feature values of a position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Features {
    /// All own pieces minus all opponent pieces, kings included.
    pub material: f64,
    pub kings: f64,
    pub center: f64,
    pub back_row: f64,
    pub advancement: f64,
    pub protection: f64,
    /// Own movable pieces minus opponent movable pieces.
    pub mobility: f64,
}

impl Features {
    /// Weighted sum of the features.
    pub fn score(&self, weights: &Weights) -> f64 {
        self.material * weights.material
            + self.kings * weights.kings
            + self.center * weights.center
            + self.back_row * weights.back_row
            + self.advancement * weights.advancement
            + self.protection * weights.protection
            + self.mobility * weights.mobility
    }
}

/// Scores `board` for `perspective` with the default weights.
pub fn evaluate<B: Board>(board: &B, perspective: Color) -> f64 {
    evaluate_with(board, perspective, &Weights::default())
}

/// Scores `board` for `perspective` with custom `weights`.
pub fn evaluate_with<B: Board>(board: &B, perspective: Color, weights: &Weights) -> f64 {
    features(board, perspective).score(weights)
}

/// Measures every feature of `board` for `perspective`.
pub fn features<B: Board>(board: &B, perspective: Color) -> Features {
    let opponent = perspective.opponent();
    let mut own_pieces = 0i32;
    let mut own_kings = 0i32;
    let mut opponent_pieces = 0i32;
    let mut opponent_kings = 0i32;

    for square in board.dimensions().squares() {
        match board.piece_at(square) {
            Some(piece) if piece.color == perspective => {
                own_pieces += 1;
                own_kings += i32::from(piece.is_king);
            }
            Some(piece) => {
                opponent_pieces += 1;
                opponent_kings += i32::from(piece.is_king);
            }
            None => {}
        }
    }

    let mobility =
        board.legal_moves(perspective).len() as f64 - board.legal_moves(opponent).len() as f64;

    Features {
        material: f64::from(own_pieces - opponent_pieces),
        kings: f64::from(own_kings - opponent_kings),
        center: center_control(board, perspective),
        back_row: back_row(board, perspective),
        advancement: advancement(board, perspective),
        protection: protection(board, perspective),
        mobility,
    }
}

/// The central 2x2 block; shifts toward the top-left on odd dimensions.
pub fn center_squares(dims: Dimensions) -> [Square; 4] {
    let (r, c) = (dims.rows / 2, dims.cols / 2);
    let (r0, c0) = (r.saturating_sub(1), c.saturating_sub(1));
    [
        Square::new(r0, c0),
        Square::new(r0, c),
        Square::new(r, c0),
        Square::new(r, c),
    ]
}

/// Own pieces minus opponent pieces on the central squares.
pub fn center_control<B: Board>(board: &B, perspective: Color) -> f64 {
    center_squares(board.dimensions())
        .into_iter()
        .filter_map(|square| board.piece_at(square))
        .map(|piece| if piece.color == perspective { 1.0 } else { -1.0 })
        .sum()
}

/// Own pieces on the own home row, minus twice the intruders there.
pub fn back_row<B: Board>(board: &B, perspective: Color) -> f64 {
    let dims = board.dimensions();
    let row = perspective.home_row(dims);
    (0..dims.cols)
        .filter_map(|col| board.piece_at(Square::new(row, col)))
        .map(|piece| if piece.color == perspective { 1.0 } else { -2.0 })
        .sum()
}

/// How far own men have travelled from the home row, a tenth per row.
pub fn advancement<B: Board>(board: &B, perspective: Color) -> f64 {
    let dims = board.dimensions();
    let home = perspective.home_row(dims);
    dims.squares()
        .filter(|&square| {
            board
                .piece_at(square)
                .is_some_and(|p| p.color == perspective && !p.is_king)
        })
        .map(|square| 0.1 * square.row.abs_diff(home) as f64)
        .sum()
}

/// Per own piece: +1 when backed by a friend, -1 when it can be jumped.
pub fn protection<B: Board>(board: &B, perspective: Color) -> f64 {
    board
        .dimensions()
        .squares()
        .filter(|&square| board.piece_at(square).is_some_and(|p| p.color == perspective))
        .map(|square| {
            let mut score = 0.0;
            if is_protected(board, square, perspective) {
                score += 1.0;
            }
            if is_vulnerable(board, square, perspective) {
                score -= 1.0;
            }
            score
        })
        .sum()
}

/// True if a friendly piece sits on any diagonal neighbour of `square`.
pub fn is_protected<B: Board>(board: &B, square: Square, color: Color) -> bool {
    let dims = board.dimensions();
    DIAGONALS.iter().any(|&(dr, dc)| {
        dims.offset(square, dr, dc)
            .and_then(|n| board.piece_at(n))
            .is_some_and(|p| p.color == color)
    })
}

/// True if an enemy piece is diagonally adjacent with an empty square two steps out.
pub fn is_vulnerable<B: Board>(board: &B, square: Square, color: Color) -> bool {
    let dims = board.dimensions();
    DIAGONALS.iter().any(|&(dr, dc)| {
        let (Some(neighbour), Some(landing)) = (
            dims.offset(square, dr, dc),
            dims.offset(square, 2 * dr, 2 * dc),
        ) else {
            return false;
        };
        board.piece_at(landing).is_none()
            && board
                .piece_at(neighbour)
                .is_some_and(|p| p.color != color)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;
    use crate::boards::checkers::CheckersBoard;

    fn place(board: &mut CheckersBoard, row: usize, col: usize, piece: Piece) {
        board.place(Square::new(row, col), piece).unwrap();
    }

    #[test]
    fn material_weight_alone() {
        let features = Features {
            material: 4.0,
            ..Features::default()
        };
        assert_eq!(features.score(&Weights::default()), 40.0);
    }

    #[test]
    fn four_isolated_men_on_full_board() {
        // Black men on Black's home row, spaced so none touch.
        let mut board = CheckersBoard::empty(8, 8).unwrap();
        for col in [1, 3, 5, 7] {
            place(&mut board, 0, col, Piece::man(Color::Black));
        }
        let f = features(&board, Color::Black);
        assert_eq!(f.material, 4.0);
        assert_eq!(f.kings, 0.0);
        assert_eq!(f.center, 0.0);
        assert_eq!(f.back_row, 4.0);
        assert_eq!(f.advancement, 0.0);
        assert_eq!(f.protection, 0.0);
        assert_eq!(f.mobility, 4.0);
        assert_eq!(evaluate(&board, Color::Black), 40.0 + 4.0 * 6.0 + 4.0 * 4.0);
    }

    #[test]
    fn kings_count_twice() {
        let mut board = CheckersBoard::empty(8, 8).unwrap();
        place(&mut board, 0, 1, Piece::king(Color::White));
        let f = features(&board, Color::White);
        assert_eq!(f.material, 1.0);
        assert_eq!(f.kings, 1.0);
        // Kings do not advance.
        assert_eq!(f.advancement, 0.0);
    }

    #[test]
    fn center_control_counts_both_sides() {
        let mut board = CheckersBoard::empty(8, 8).unwrap();
        place(&mut board, 3, 4, Piece::man(Color::Black));
        place(&mut board, 4, 3, Piece::man(Color::Black));
        place(&mut board, 3, 2, Piece::man(Color::White));
        assert_eq!(center_control(&board, Color::Black), 2.0);
        place(&mut board, 4, 4, Piece::man(Color::White));
        assert_eq!(center_control(&board, Color::White), -1.0);
        assert_eq!(
            center_squares(Dimensions::new(7, 7)),
            [
                Square::new(2, 2),
                Square::new(2, 3),
                Square::new(3, 2),
                Square::new(3, 3)
            ]
        );
    }

    #[test]
    fn intruders_on_home_row_cost_double() {
        let mut board = CheckersBoard::empty(6, 6).unwrap();
        place(&mut board, 5, 0, Piece::man(Color::White));
        place(&mut board, 5, 2, Piece::king(Color::Black));
        place(&mut board, 5, 4, Piece::man(Color::Black));
        assert_eq!(back_row(&board, Color::White), 1.0 - 4.0);
        assert_eq!(back_row(&board, Color::Black), 0.0);
    }

    #[test]
    fn advancement_is_measured_from_home() {
        let mut board = CheckersBoard::empty(8, 8).unwrap();
        place(&mut board, 3, 0, Piece::man(Color::Black));
        place(&mut board, 2, 1, Piece::man(Color::White));
        assert!((advancement(&board, Color::Black) - 0.3).abs() < 1e-9);
        assert!((advancement(&board, Color::White) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn protection_and_vulnerability() {
        let mut board = CheckersBoard::empty(8, 8).unwrap();
        // A pair of Black men guarding each other.
        place(&mut board, 2, 1, Piece::man(Color::Black));
        place(&mut board, 3, 2, Piece::man(Color::Black));
        assert_eq!(protection(&board, Color::Black), 2.0);

        // A White man diagonal to (3,2) with (5,4) empty behind it.
        place(&mut board, 4, 3, Piece::man(Color::White));
        assert!(is_vulnerable(&board, Square::new(3, 2), Color::Black));
        assert!(!is_vulnerable(&board, Square::new(2, 1), Color::Black));
        assert_eq!(protection(&board, Color::Black), 1.0 + 0.0);
    }

    #[test]
    fn evaluation_is_pure_and_antisymmetric_in_material() {
        let board = CheckersBoard::new(8, 8, 3).unwrap();
        let before = board.clone();
        let first = evaluate(&board, Color::Black);
        let second = evaluate(&board, Color::Black);
        assert_eq!(first, second);
        assert_eq!(board, before);
        assert_eq!(features(&board, Color::Black).material, 0.0);
    }

    #[test]
    fn custom_weights_are_applied() {
        let board = CheckersBoard::new(6, 6, 2).unwrap();
        let zero = Weights {
            material: 0.0,
            kings: 0.0,
            center: 0.0,
            back_row: 0.0,
            advancement: 0.0,
            protection: 0.0,
            mobility: 0.0,
        };
        assert_eq!(evaluate_with(&board, Color::White, &zero), 0.0);
    }
}
