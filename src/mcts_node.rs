use crate::board::{Board, Color};

/// A move together with its position in the grouped enumeration it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRef<M> {
    /// Index of the origin-piece group.
    pub group: usize,
    /// Index of the move within its group.
    pub index: usize,
    pub mv: M,
}

/// Represents a single node in the Monte Carlo search tree.
///
/// Each node owns a full copy of the position it stands for, the statistics gathered
/// by simulations passing through it, and the moves it has not expanded yet.
#[derive(Debug, Clone)]
pub struct MctsNode<T: Board> {
    /// The position this node represents.
    pub board: T,
    /// The move that led here from the parent. `None` for the root.
    pub incoming_move: Option<MoveRef<T::Move>>,
    /// The side whose moves this node's children represent.
    pub color: Option<Color>,
    /// Legal moves of `color` not yet turned into children.
    pub untried_moves: Vec<MoveRef<T::Move>>,
    /// Number of completed simulations that passed through this node.
    pub visits: u32,
    /// Sum of the rewards backpropagated through this node.
    pub wins: f64,
}

impl<T: Board> MctsNode<T> {
    /// Creates a node and enumerates the untried moves of `color` on `board`.
    pub fn new(board: T, incoming_move: Option<MoveRef<T::Move>>, color: Option<Color>) -> Self {
        let untried_moves = match color {
            Some(color) => flatten_moves(board.legal_moves(color)),
            None => Vec::new(),
        };
        MctsNode {
            board,
            incoming_move,
            color,
            untried_moves,
            visits: 0,
            wins: 0.0,
        }
    }

    /// Upper confidence bound of this node as seen from a parent visited `parent_visits` times.
    ///
    /// Unvisited nodes score `+inf` so they are always tried before any revisit.
    pub fn ucb1(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = f64::from(self.visits);
        self.wins / visits + exploration * (f64::from(parent_visits).ln() / visits).sqrt()
    }

    /// Calculates the win rate of this node.
    pub fn wins_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / f64::from(self.visits)
        }
    }

    /// True once every untried move has become a child.
    pub fn is_fully_expanded(&self) -> bool {
        self.untried_moves.is_empty()
    }
}

/// Flattens a grouped move list into `(group, index, move)` entries, in enumeration order.
pub fn flatten_moves<M>(grouped: Vec<Vec<M>>) -> Vec<MoveRef<M>> {
    grouped
        .into_iter()
        .enumerate()
        .flat_map(|(group, moves)| {
            moves
                .into_iter()
                .enumerate()
                .map(move |(index, mv)| MoveRef { group, index, mv })
        })
        .collect()
}
