//! Contains pre-made implementations of the `Board` trait.

/// Checkers with configurable board size and number of starting rows.
pub mod checkers;
