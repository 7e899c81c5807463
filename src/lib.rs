//! A checkers player built on Monte Carlo tree search.
//!
//! Each turn a fresh search tree is grown from the current position: nodes are selected by
//! UCB1, expanded one untried move at a time, scored by a playout in which most plies are
//! picked greedily by a hand-tuned evaluation, and the binary result is propagated back to
//! the root. The most visited reply wins.
//!
//! The rules of the game are consumed through the [`board::Board`] trait; a configurable
//! checkers implementation ships in [`boards::checkers`].
//!
//! # Example
//!
//! ```rust
//! use checkers_mcts::agent::MctsPlayer;
//! use checkers_mcts::boards::checkers::CheckersBoard;
//! use checkers_mcts::config::SearchConfig;
//! use checkers_mcts::random::SeededRandomGenerator;
//!
//! // A 6x6 board with two rows of men per side
//! let board = CheckersBoard::new(6, 6, 2).unwrap();
//!
//! // A player with a small budget and a reproducible random source
//! let mut player = MctsPlayer::new(board, SearchConfig::for_testing())
//!     .with_random_generator(SeededRandomGenerator::new(7));
//!
//! // No previous move: the player takes the first move
//! let reply = player.get_move(None).unwrap();
//!
//! println!("The player opens with {}", reply);
//! ```

/// The `MctsPlayer` session that carries the live game between turns.
pub mod agent;
/// Contains the `Board` trait and the types shared by rules engines and the search.
pub mod board;
/// Contains pre-made implementations of the `Board` trait.
pub mod boards;
/// Search parameters.
pub mod config;
/// The static evaluation that steers playouts.
pub mod heuristic;
/// The core module of the library, containing the `MonteCarloTreeSearch` implementation.
pub mod mcts;
/// Contains the `MctsNode` struct, which represents a node in the search tree.
pub mod mcts_node;
/// Contains traits and implementations for random number generation.
pub mod random;

pub use agent::MctsPlayer;
pub use board::{Board, Color};
pub use config::SearchConfig;
pub use mcts::{MonteCarloTreeSearch, SearchError, search};
