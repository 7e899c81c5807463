//! Search configuration parameters.

use crate::heuristic::Weights;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("heuristic probability must be within [0, 1], got {0}")]
    HeuristicProbability(f64),

    #[error("exploration constant must be finite and non-negative, got {0}")]
    Exploration(f64),
}

/// Configuration for one Monte Carlo tree search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Number of select/expand/simulate/backpropagate cycles per search.
    pub iterations: u32,

    /// Maximum plies played out during a simulation.
    pub playout_depth: u32,

    /// Exploration constant `C` of the UCB1 formula.
    pub exploration: f64,

    /// Chance that a playout ply is chosen greedily by the evaluation
    /// rather than uniformly at random.
    pub heuristic_probability: f64,

    /// Feature weights of the evaluation used during playouts.
    pub weights: Weights,

    /// When set, a selected node that can neither be expanded nor descended (a decided
    /// position) is played out and backpropagated itself instead of skipping the iteration.
    ///
    /// Off by default. Without it the first visit to a child that wins outright is also its
    /// last, so turn it on when an immediate win should reliably end up as the best move.
    pub score_terminal_leaves: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            playout_depth: 50,
            exploration: 1.414,
            heuristic_probability: 0.8,
            weights: Weights::default(),
            score_terminal_leaves: false,
        }
    }
}

impl SearchConfig {
    /// A fast config for tests: fewer iterations and shorter playouts.
    pub fn for_testing() -> Self {
        Self {
            iterations: 200,
            playout_depth: 20,
            ..Self::default()
        }
    }

    pub fn with_iterations(mut self, n: u32) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_playout_depth(mut self, depth: u32) -> Self {
        self.playout_depth = depth;
        self
    }

    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_heuristic_probability(mut self, p: f64) -> Self {
        self.heuristic_probability = p;
        self
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_score_terminal_leaves(mut self, enabled: bool) -> Self {
        self.score_terminal_leaves = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.heuristic_probability) {
            return Err(ConfigError::HeuristicProbability(
                self.heuristic_probability,
            ));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(ConfigError::Exploration(self.exploration));
        }
        Ok(())
    }
}
