extern crate checkers_mcts;

use checkers_mcts::agent::MctsPlayer;
use checkers_mcts::board::{Board, Color};
use checkers_mcts::boards::checkers::CheckersBoard;
use checkers_mcts::config::SearchConfig;
use checkers_mcts::mcts::SearchError;

const MAX_PLIES: usize = 150;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Create a 7x7 board with two rows of men per side
    let board = match CheckersBoard::new(7, 7, 2) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("cannot set up board: {e}");
            return;
        }
    };

    // Two independent players, each tracking its own copy of the game
    let config = SearchConfig::default().with_iterations(400);
    let mut black = MctsPlayer::new(board.clone(), config.clone());
    let mut white = MctsPlayer::new(board, config);

    let mut last = None;
    for ply in 0..MAX_PLIES {
        let (mover, player) = if ply % 2 == 0 {
            (Color::Black, &mut black)
        } else {
            (Color::White, &mut white)
        };

        match player.get_move(last.as_ref()) {
            Ok(reply) => last = Some(reply),
            Err(SearchError::NoLegalMoves) => {
                println!("{mover} cannot move, {} wins", mover.opponent());
                return;
            }
            Err(e) => {
                eprintln!("game aborted: {e}");
                return;
            }
        }

        println!("{}", player.board());
        if player.board().has_won(mover) {
            println!("{mover} wins after {} plies", ply + 1);
            return;
        }
    }

    println!("no result after {MAX_PLIES} plies");
}
