use crate::board::{Board, Color};
use crate::config::SearchConfig;
use crate::mcts::{MonteCarloTreeSearch, SearchError};
use crate::random::{RandomGenerator, StandardRandomGenerator};
use log::info;

/// A player that keeps the live game and answers each opponent move with a searched reply.
///
/// Only the live board and the player's color persist between turns; every call to
/// [`MctsPlayer::get_move`] searches a brand new tree.
pub struct MctsPlayer<T: Board, K: RandomGenerator = StandardRandomGenerator> {
    board: T,
    color: Color,
    config: SearchConfig,
    random: K,
}

impl<T: Board> MctsPlayer<T, StandardRandomGenerator> {
    /// Creates a player for the game starting at `board`.
    ///
    /// The player assumes it moves second until told otherwise by a first call
    /// to `get_move(None)`.
    pub fn new(board: T, config: SearchConfig) -> Self {
        Self {
            board,
            color: Color::White,
            config,
            random: StandardRandomGenerator::default(),
        }
    }
}

impl<T: Board, K: RandomGenerator> MctsPlayer<T, K> {
    pub fn with_random_generator<R: RandomGenerator>(self, rg: R) -> MctsPlayer<T, R> {
        MctsPlayer {
            board: self.board,
            color: self.color,
            config: self.config,
            random: rg,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// The live game position as this player sees it.
    pub fn board(&self) -> &T {
        &self.board
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Records the opponent's last move, or takes the first move when there is none,
    /// then searches, plays and returns this player's reply.
    pub fn get_move(&mut self, opponent_move: Option<&T::Move>) -> Result<T::Move, SearchError> {
        match opponent_move {
            Some(b_move) => self.board.apply_move(b_move, self.color.opponent())?,
            None => self.color = Color::Black,
        }

        let best = MonteCarloTreeSearch::builder(self.board.clone(), self.color)
            .with_config(self.config.clone())
            .with_random_generator(&mut self.random)
            .build()?
            .search()?;

        self.board.apply_move(&best, self.color)?;
        info!("{} plays {}", self.color, best);
        Ok(best)
    }
}
