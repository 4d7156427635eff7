//! Deduction and exact-probability core of a Minesweeper solver.
//!
//! Revealed clues become [`constraint::ConstraintSet`]s; the
//! [`frontier::Frontier`] cross-checks them to a fixed point, revealing and
//! flagging everything certain. When deduction stalls, [`board::Board`]
//! enumerates every mine placement consistent with the frontier and picks the
//! cell with the lowest exact mine probability, weighting placements by
//! arbitrary-precision binomial counts over the unconstrained bulk.

pub mod binom;
pub mod board;
pub mod cell;
pub mod constraint;
pub mod frontier;
pub mod generator;
pub mod hypothesis;
pub mod mine_map;
pub mod text;
pub mod topology;

pub use board::{Board, Guess, SolveStats, SolverError};
pub use cell::MineHit;
pub use mine_map::MineMap;
pub use topology::{Grid, GridSize, Layout, Wrap};
