//! # Flow Solver Library
//!
//! This library provides the board model and search heuristics for a grid
//! path-covering puzzle: every color must connect its two endpoints with a
//! simple path, paths may not cross, and every free cell must end up covered.
//!
//! It is used by two binaries:
//! - `flow_solver`: Loads a puzzle file, picks a branching order and runs the
//!   depth-first solver, printing the solved board.
//! - `order_evaluator`: Compares the heuristic branching order against seeded
//!   random orders by the number of search nodes each needs.
//!
//! ## Modules
//! - `engine`: Positions, cells, the growable `ColorSet`, the static `GameInfo`
//!   and the mutable `GameState` with move application.
//! - `heuristics`: The branching-order builder (`order_colors`) and the local
//!   dead-end detector (`check_deadends`).
//! - `solver`: Provides the `solve_dfs` backtracking search that consumes both heuristics.
//! - `options`: The `Options` configuration struct.
//! - `utils`: Puzzle text parsing and order hints.

pub mod engine;
pub mod heuristics;
pub mod options;
pub mod solver;
pub mod utils;

pub use heuristics::{check_deadends, order_colors, order_colors_seeded};
pub use options::Options;
pub use solver::{solve_dfs, SolveOutcome};
pub use utils::PuzzleError;
