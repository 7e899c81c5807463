use crate::board::{Board, Color, InvalidMove};
use crate::config::{ConfigError, SearchConfig};
use crate::heuristic;
use crate::mcts_node::MctsNode;
use crate::random::{RandomGenerator, StandardRandomGenerator};
use ego_tree::{NodeId, NodeRef, Tree};
use log::{debug, trace};
use thiserror::Error;

/// Errors that can occur during a search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("no legal moves available")]
    NoLegalMoves,

    #[error(transparent)]
    InvalidMove(#[from] InvalidMove),

    #[error("invalid search configuration: {0}")]
    Config(#[from] ConfigError),
}

/// The main struct for running the Monte Carlo Tree Search algorithm.
///
/// It holds the search tree, the random number generator, and the configuration for the search.
/// The tree is an arena: nodes own their position, children are reached through the arena and
/// the parent link is only used to walk back up during backpropagation.
pub struct MonteCarloTreeSearch<T: Board, K: RandomGenerator> {
    tree: Tree<MctsNode<T>>,
    root_id: NodeId,
    root_color: Color,
    random: K,
    config: SearchConfig,
    next_action: MctsAction,
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
pub struct MonteCarloTreeSearchBuilder<T: Board, K: RandomGenerator> {
    board: T,
    color: Color,
    random_generator: K,
    config: SearchConfig,
}

impl<T: Board> MonteCarloTreeSearchBuilder<T, StandardRandomGenerator> {
    /// Creates a new builder searching for `color`'s move on `board`.
    pub fn new(board: T, color: Color) -> Self {
        Self {
            board,
            color,
            random_generator: StandardRandomGenerator::default(),
            config: SearchConfig::default(),
        }
    }
}

impl<T: Board, K: RandomGenerator> MonteCarloTreeSearchBuilder<T, K> {
    /// Sets the random number generator for the search.
    pub fn with_random_generator<R: RandomGenerator>(
        self,
        rg: R,
    ) -> MonteCarloTreeSearchBuilder<T, R> {
        MonteCarloTreeSearchBuilder {
            board: self.board,
            color: self.color,
            random_generator: rg,
            config: self.config,
        }
    }

    /// Replaces the whole search configuration.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides only the iteration budget.
    pub fn with_iterations(mut self, n: u32) -> Self {
        self.config.iterations = n;
        self
    }

    /// Validates the configuration and builds the search with a fresh root.
    pub fn build(self) -> Result<MonteCarloTreeSearch<T, K>, SearchError> {
        self.config.validate()?;
        Ok(MonteCarloTreeSearch::new(
            self.board,
            self.color,
            self.random_generator,
            self.config,
        ))
    }
}

impl<T: Board> MonteCarloTreeSearch<T, StandardRandomGenerator> {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder(board: T, color: Color) -> MonteCarloTreeSearchBuilder<T, StandardRandomGenerator> {
        MonteCarloTreeSearchBuilder::new(board, color)
    }
}

impl<T: Board, K: RandomGenerator> MonteCarloTreeSearch<T, K> {
    fn new(board: T, color: Color, random: K, config: SearchConfig) -> Self {
        let tree = Tree::new(MctsNode::new(board, None, Some(color)));
        let root_id = tree.root().id();

        Self {
            tree,
            root_id,
            root_color: color,
            random,
            config,
            next_action: MctsAction::Selection {
                root: root_id,
                last_path: vec![],
            },
        }
    }

    /// Returns an immutable reference to the underlying search tree.
    pub fn get_tree(&self) -> &Tree<MctsNode<T>> {
        &self.tree
    }

    /// Returns the next MCTS action to be performed. Useful for debugging and visualization.
    pub fn get_next_mcts_action(&self) -> &MctsAction {
        &self.next_action
    }

    /// Returns a reference to the root node of the search tree.
    pub fn get_root(&self) -> NodeRef<'_, MctsNode<T>> {
        self.tree.root()
    }

    /// The side the search is choosing a move for.
    pub fn root_color(&self) -> Color {
        self.root_color
    }

    /// The configuration this search was built with.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Executes a single phase of the algorithm (Selection, Expansion, Simulation, or Backpropagation).
    pub fn execute_action(&mut self) -> Result<(), SearchError> {
        self.next_action = match self.next_action {
            MctsAction::Selection { root, .. } => MctsAction::Expansion {
                leaf: self.select(root),
            },
            MctsAction::Expansion { leaf } => match self.expand(leaf)? {
                Some(child) => MctsAction::Simulation { child },
                None if self.config.score_terminal_leaves => {
                    MctsAction::Simulation { child: leaf }
                }
                None => {
                    trace!("nothing to expand, iteration skipped");
                    MctsAction::Selection {
                        root: self.root_id,
                        last_path: vec![],
                    }
                }
            },
            MctsAction::Simulation { child } => MctsAction::Backpropagation {
                child,
                reward: self.simulate(child)?,
            },
            MctsAction::Backpropagation { child, reward } => {
                let path = self.backpropagate(child, reward);
                trace!("backpropagated reward {reward} through {} nodes", path.len());
                MctsAction::Selection {
                    root: self.root_id,
                    last_path: path,
                }
            }
        };
        Ok(())
    }

    /// Performs one full iteration of the algorithm (Selection, Expansion, Simulation, Backpropagation).
    ///
    /// Returns the path of nodes that were updated during backpropagation, child first and root
    /// last. The path is empty when the selected node had nothing to expand.
    pub fn do_iteration(&mut self) -> Result<Vec<NodeId>, SearchError> {
        let outcome = self.run_until_selection();
        if outcome.is_err() {
            self.next_action = MctsAction::Selection {
                root: self.root_id,
                last_path: vec![],
            };
        }
        outcome?;

        match &self.next_action {
            MctsAction::Selection { last_path, .. } => Ok(last_path.clone()),
            _ => Ok(vec![]),
        }
    }

    fn run_until_selection(&mut self) -> Result<(), SearchError> {
        self.execute_action()?;
        while !matches!(self.next_action, MctsAction::Selection { .. }) {
            self.execute_action()?;
        }
        Ok(())
    }

    /// Runs the search for a specified number of iterations.
    pub fn iterate_n_times(&mut self, n: u32) -> Result<(), SearchError> {
        for _ in 0..n {
            self.do_iteration()?;
        }
        Ok(())
    }

    /// Runs the configured number of iterations and returns the most visited move.
    pub fn search(&mut self) -> Result<T::Move, SearchError> {
        let root = self.get_root();
        if root.value().untried_moves.is_empty() && !root.has_children() {
            debug!("{} has no legal moves, not searching", self.root_color);
            return Err(SearchError::NoLegalMoves);
        }

        self.iterate_n_times(self.config.iterations)?;

        let best = self.best_move()?;
        let best_rate = self
            .get_most_visited_child()
            .map_or(0.0, |child| child.value().wins_rate());
        debug!(
            "searched {} iterations for {}: {} nodes, root visits {}, best move {} (win rate {:.3})",
            self.config.iterations,
            self.root_color,
            self.tree.nodes().count(),
            self.get_root().value().visits,
            best,
            best_rate
        );
        Ok(best)
    }

    /// Returns the child of the root with the most visits; ties go to the earliest expanded.
    pub fn get_most_visited_child(&self) -> Option<NodeRef<'_, MctsNode<T>>> {
        let mut best: Option<NodeRef<'_, MctsNode<T>>> = None;
        for child in self.get_root().children() {
            let better = match &best {
                None => true,
                Some(current) => child.value().visits > current.value().visits,
            };
            if better {
                best = Some(child);
            }
        }
        best
    }

    /// Returns the move leading to the most visited child of the root.
    pub fn best_move(&self) -> Result<T::Move, SearchError> {
        self.get_most_visited_child()
            .and_then(|child| child.value().incoming_move.as_ref())
            .map(|incoming| incoming.mv.clone())
            .ok_or(SearchError::NoLegalMoves)
    }

    /// Visits and accumulated reward of every root child, in expansion order.
    pub fn root_statistics(&self) -> Vec<(T::Move, u32, f64)> {
        self.get_root()
            .children()
            .filter_map(|child| {
                let node = child.value();
                let incoming = node.incoming_move.as_ref()?;
                Some((incoming.mv.clone(), node.visits, node.wins))
            })
            .collect()
    }

    /// Descends from `from` by UCB1 while the current node is fully expanded and has children.
    fn select(&self, from: NodeId) -> NodeId {
        let Some(mut node) = self.tree.get(from) else {
            return from;
        };

        while node.value().is_fully_expanded() && node.has_children() {
            let parent_visits = node.value().visits;
            let mut best: Option<(NodeRef<'_, MctsNode<T>>, f64)> = None;
            for child in node.children() {
                let score = child.value().ucb1(parent_visits, self.config.exploration);
                let better = match &best {
                    None => true,
                    Some((_, best_score)) => score > *best_score,
                };
                if better {
                    best = Some((child, score));
                }
            }
            match best {
                Some((child, _)) => node = child,
                None => break,
            }
        }

        node.id()
    }

    /// Turns one random untried move of `leaf_id` into a new child.
    fn expand(&mut self, leaf_id: NodeId) -> Result<Option<NodeId>, SearchError> {
        let Some(mut leaf) = self.tree.get_mut(leaf_id) else {
            return Ok(None);
        };
        let node = leaf.value();
        let Some(color) = node.color else {
            return Ok(None);
        };
        if node.untried_moves.is_empty() {
            return Ok(None);
        }

        let pick = self.random.next_index(node.untried_moves.len());
        let tried = node.untried_moves.swap_remove(pick);
        let mut board = node.board.clone();
        board.apply_move(&tried.mv, color)?;

        let child = MctsNode::new(board, Some(tried), Some(color.opponent()));
        Ok(Some(leaf.append(child).id()))
    }

    /// Plays out from `child_id` and returns 1 if the root's side has won at the end, else 0.
    fn simulate(&mut self, child_id: NodeId) -> Result<f64, SearchError> {
        let Some(child) = self.tree.get(child_id) else {
            return Ok(0.0);
        };
        let mut board = child.value().board.clone();
        let mut current = child.value().color.unwrap_or(self.root_color.opponent());

        let mut depth = 0;
        while depth < self.config.playout_depth {
            if board.has_won(current) {
                break;
            }
            let moves = board.legal_moves(current);
            if moves.is_empty() {
                break;
            }

            let chosen = if self.random.next_f64() < self.config.heuristic_probability {
                self.best_by_heuristic(&board, &moves, current)?
            } else {
                self.random_move(&moves)
            };
            if let Some(b_move) = chosen {
                board.apply_move(b_move, current)?;
            }

            current = current.opponent();
            depth += 1;
        }

        Ok(if board.has_won(self.root_color) { 1.0 } else { 0.0 })
    }

    /// Picks the move whose resulting position the root's side likes best; first one wins ties.
    fn best_by_heuristic<'a>(
        &self,
        board: &T,
        moves: &'a [Vec<T::Move>],
        mover: Color,
    ) -> Result<Option<&'a T::Move>, InvalidMove> {
        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for b_move in moves.iter().flatten() {
            let mut scratch = board.clone();
            scratch.apply_move(b_move, mover)?;
            let score = heuristic::evaluate_with(&scratch, self.root_color, &self.config.weights);
            if score > best_score {
                best_score = score;
                best = Some(b_move);
            }
        }
        Ok(best)
    }

    /// Uniform over groups, then uniform within the chosen group.
    fn random_move<'a>(&mut self, moves: &'a [Vec<T::Move>]) -> Option<&'a T::Move> {
        let group = self.random.get_random_from_slice(moves)?;
        self.random.get_random_from_slice(group)
    }

    /// Adds one visit and `reward` to every node from `child_id` up to the root.
    fn backpropagate(&mut self, child_id: NodeId, reward: f64) -> Vec<NodeId> {
        let branch: Vec<NodeId> = match self.tree.get(child_id) {
            Some(node) => std::iter::once(child_id)
                .chain(node.ancestors().map(|ancestor| ancestor.id()))
                .collect(),
            None => vec![],
        };

        for &node_id in &branch {
            if let Some(mut node) = self.tree.get_mut(node_id) {
                let stats = node.value();
                stats.visits += 1;
                stats.wins += reward;
            }
        }

        branch
    }
}

/// Builds a fresh tree for `color` on `board`, runs `config.iterations` iterations and
/// returns the most visited move.
pub fn search<T: Board, K: RandomGenerator>(
    board: T,
    color: Color,
    config: SearchConfig,
    random: K,
) -> Result<T::Move, SearchError> {
    MonteCarloTreeSearch::builder(board, color)
        .with_config(config)
        .with_random_generator(random)
        .build()?
        .search()
}

/// Represents the four main stages of the MCTS algorithm.
///
/// This enum is used to manage the state of the search process.
#[derive(Debug, PartialEq, Clone)]
pub enum MctsAction {
    /// **Selection**: Start from `root` and descend by UCB1 until a node that can be expanded,
    /// or that has no children, is reached.
    Selection {
        root: NodeId,
        /// The path of nodes updated during the last backpropagation phase.
        last_path: Vec<NodeId>,
    },
    /// **Expansion**: Add one child to the selected `leaf`.
    Expansion { leaf: NodeId },
    /// **Simulation**: Run a guided playout from the newly created `child`.
    Simulation { child: NodeId },
    /// **Backpropagation**: Add a visit and `reward` to every node from `child` to the root.
    Backpropagation { child: NodeId, reward: f64 },
}

impl MctsAction {
    /// Returns the name of the current MCTS action as a string.
    pub fn get_name(&self) -> &'static str {
        match self {
            MctsAction::Selection { .. } => "Selection",
            MctsAction::Expansion { .. } => "Expansion",
            MctsAction::Simulation { .. } => "Simulation",
            MctsAction::Backpropagation { .. } => "Backpropagation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, Square};
    use crate::boards::checkers::{CheckersBoard, CheckersMove};
    use crate::random::SeededRandomGenerator;
    use std::collections::HashMap;

    fn seeded_search(
        board: CheckersBoard,
        color: Color,
        config: SearchConfig,
        seed: u64,
    ) -> MonteCarloTreeSearch<CheckersBoard, SeededRandomGenerator> {
        MonteCarloTreeSearch::builder(board, color)
            .with_config(config)
            .with_random_generator(SeededRandomGenerator::new(seed))
            .build()
            .unwrap()
    }

    /// Black's man on (2,2) takes both White men in one double jump. The other capture takes
    /// one and lets White's remaining man take two Black men back.
    fn double_jump_position() -> (CheckersBoard, CheckersMove) {
        let mut board = CheckersBoard::empty(8, 8).unwrap();
        board.place(Square::new(2, 2), Piece::man(Color::Black)).unwrap();
        board.place(Square::new(2, 4), Piece::man(Color::Black)).unwrap();
        board.place(Square::new(6, 4), Piece::man(Color::Black)).unwrap();
        board.place(Square::new(3, 3), Piece::man(Color::White)).unwrap();
        board.place(Square::new(5, 3), Piece::man(Color::White)).unwrap();
        (board, "(2,2)-(4,4)-(6,2)".parse().unwrap())
    }

    #[test]
    fn search_returns_a_legal_move() {
        // arrange
        let board = CheckersBoard::new(6, 6, 2).unwrap();
        let legal: Vec<CheckersMove> = board
            .legal_moves(Color::Black)
            .into_iter()
            .flatten()
            .collect();
        let config = SearchConfig::for_testing().with_iterations(100);

        // act
        let best = search(board, Color::Black, config, SeededRandomGenerator::new(1)).unwrap();

        // assert
        assert!(legal.contains(&best));
    }

    #[test]
    fn root_visits_match_iterations() {
        // arrange
        let board = CheckersBoard::new(6, 6, 2).unwrap();
        let mut mcts = seeded_search(board, Color::White, SearchConfig::for_testing(), 3);

        // act
        mcts.iterate_n_times(50).unwrap();

        // assert
        let root = mcts.get_root();
        assert_eq!(root.value().visits, 50);
        let children_visits: u32 = root.children().map(|c| c.value().visits).sum();
        assert!(children_visits <= root.value().visits);
        assert!(
            mcts.root_statistics()
                .iter()
                .all(|(_, visits, wins)| *wins <= f64::from(*visits))
        );
    }

    #[test]
    fn backpropagation_updates_exactly_the_path() {
        // arrange
        let board = CheckersBoard::new(6, 6, 2).unwrap();
        let mut mcts = seeded_search(board, Color::Black, SearchConfig::for_testing(), 11);
        mcts.iterate_n_times(25).unwrap();
        let before: HashMap<NodeId, (u32, f64)> = mcts
            .get_tree()
            .nodes()
            .map(|n| (n.id(), (n.value().visits, n.value().wins)))
            .collect();

        // act
        let path = mcts.do_iteration().unwrap();

        // assert
        assert!(!path.is_empty());
        assert_eq!(path.last(), Some(&mcts.get_root().id()));
        let child = mcts.get_tree().get(path[0]).unwrap();
        assert!(!before.contains_key(&child.id()));
        assert_eq!(child.value().visits, 1);
        let reward = child.value().wins;
        assert!(reward == 0.0 || reward == 1.0);

        for node in mcts.get_tree().nodes() {
            let (visits, wins) = (node.value().visits, node.value().wins);
            match before.get(&node.id()) {
                Some(&(old_visits, old_wins)) if path.contains(&node.id()) => {
                    assert_eq!(visits, old_visits + 1);
                    assert_eq!(wins, old_wins + reward);
                }
                Some(&(old_visits, old_wins)) => {
                    assert_eq!(visits, old_visits);
                    assert_eq!(wins, old_wins);
                }
                None => assert_eq!(node.id(), child.id()),
            }
        }
    }

    #[test]
    fn phases_run_in_order() {
        let board = CheckersBoard::new(6, 6, 2).unwrap();
        let mut mcts = seeded_search(board, Color::Black, SearchConfig::for_testing(), 5);

        let mut names = vec![mcts.get_next_mcts_action().get_name()];
        for _ in 0..4 {
            mcts.execute_action().unwrap();
            names.push(mcts.get_next_mcts_action().get_name());
        }

        assert_eq!(
            names,
            vec![
                "Selection",
                "Expansion",
                "Simulation",
                "Backpropagation",
                "Selection"
            ]
        );
    }

    #[test]
    fn no_legal_moves_is_an_error() {
        let mut board = CheckersBoard::empty(4, 4).unwrap();
        // A Black man on White's home row has nowhere to go.
        board.place(Square::new(3, 0), Piece::man(Color::Black)).unwrap();
        board.place(Square::new(0, 3), Piece::king(Color::White)).unwrap();

        let mut mcts = seeded_search(board.clone(), Color::Black, SearchConfig::for_testing(), 0);
        assert_eq!(mcts.search(), Err(SearchError::NoLegalMoves));
        assert_eq!(mcts.best_move(), Err(SearchError::NoLegalMoves));

        // Iterating anyway never expands anything.
        mcts.iterate_n_times(10).unwrap();
        assert_eq!(mcts.get_root().value().visits, 0);
        assert!(mcts.do_iteration().unwrap().is_empty());
    }

    #[test]
    fn blocking_the_opponent_only_wins_if_the_block_holds() {
        // arrange: White's man on (3,0) is hemmed in by Black's men, Black to move
        let mut board = CheckersBoard::empty(6, 6).unwrap();
        board.place(Square::new(3, 0), Piece::man(Color::White)).unwrap();
        board.place(Square::new(2, 1), Piece::man(Color::Black)).unwrap();
        board.place(Square::new(1, 2), Piece::man(Color::Black)).unwrap();
        board.place(Square::new(0, 5), Piece::man(Color::Black)).unwrap();
        let config = SearchConfig::for_testing().with_playout_depth(0);
        let mut mcts = seeded_search(board, Color::Black, config, 8);

        // act: one iteration per root move, scored on the position right after it
        mcts.iterate_n_times(3).unwrap();

        // assert
        let stats = mcts.root_statistics();
        let reward = |text: &str| {
            let wanted: CheckersMove = text.parse().unwrap();
            stats.iter().find(|(mv, _, _)| *mv == wanted).map(|s| s.2)
        };
        assert_eq!(stats.len(), 3);
        assert_eq!(reward("(0,5)-(1,4)"), Some(1.0));
        assert_eq!(reward("(2,1)-(3,2)"), Some(0.0));
        assert_eq!(reward("(1,2)-(2,3)"), Some(0.0));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let board = CheckersBoard::new(6, 6, 2).unwrap();
        let result = MonteCarloTreeSearch::builder(board, Color::Black)
            .with_config(SearchConfig::default().with_heuristic_probability(-0.1))
            .build();
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[test]
    fn same_seed_same_search() {
        let board = CheckersBoard::new(6, 6, 2).unwrap();
        let config = SearchConfig::for_testing().with_iterations(60);

        let mut first = seeded_search(board.clone(), Color::Black, config.clone(), 9);
        let mut second = seeded_search(board, Color::Black, config, 9);

        assert_eq!(first.search(), second.search());
        assert_eq!(first.root_statistics(), second.root_statistics());
    }

    #[test]
    fn position_offers_two_captures() {
        let (board, winning_move) = double_jump_position();
        let moves = board.legal_moves(Color::Black);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0], vec![winning_move]);
        assert_eq!(moves[1], vec!["(2,4)-(4,2)".parse().unwrap()]);
    }

    #[test]
    fn immediate_win_is_found() {
        let (board, winning_move) = double_jump_position();
        let mut found = 0;

        for seed in 0..5 {
            let config = SearchConfig::default()
                .with_iterations(300)
                .with_score_terminal_leaves(true);
            let mut mcts = seeded_search(board.clone(), Color::Black, config, seed);
            if mcts.search().unwrap() == winning_move {
                found += 1;
            }
        }

        assert!(found >= 4, "winning move chosen in only {found} of 5 searches");
    }

    #[test]
    fn winning_child_always_scores() {
        let (board, winning_move) = double_jump_position();
        let config = SearchConfig::default().with_score_terminal_leaves(true);
        let mut mcts = seeded_search(board, Color::Black, config, 21);
        mcts.iterate_n_times(40).unwrap();

        let (_, visits, wins) = mcts
            .root_statistics()
            .into_iter()
            .find(|(mv, _, _)| *mv == winning_move)
            .unwrap();
        assert!(visits > 1);
        assert_eq!(wins, f64::from(visits));
        assert_eq!(mcts.get_root().value().visits, 40);
    }

    #[test]
    fn decided_child_is_never_revisited_by_default() {
        let (board, winning_move) = double_jump_position();
        let mut mcts = seeded_search(board, Color::Black, SearchConfig::default(), 4);
        mcts.iterate_n_times(50).unwrap();

        let (_, visits, wins) = mcts
            .root_statistics()
            .into_iter()
            .find(|(mv, _, _)| *mv == winning_move)
            .unwrap();
        assert_eq!((visits, wins), (1, 1.0));
        assert!(mcts.get_root().value().visits <= 50);
    }
}
