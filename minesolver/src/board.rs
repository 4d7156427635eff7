use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use thiserror::Error;

use crate::binom::binomial;
use crate::cell::{Cell, CellArena};
use crate::frontier::{Frontier, UnsoundDeduction};
use crate::generator::random_mines;
use crate::hypothesis::MineState;
use crate::mine_map::MineMap;
use crate::topology::Grid;

/// The ways a solve can fail.
#[derive(Clone, Copy, Debug, Error, Hash, PartialEq, Eq)]
pub enum SolverError {
    /// A probabilistic guess revealed a mine. The expected way to lose; only
    /// the frontend decides what to do with it.
    #[error("guess revealed a mine at cell {cell}")]
    MineHit { cell: usize },
    /// A deductive reveal hit a mine, meaning the engine drew an unsound
    /// conclusion. Unrecoverable.
    #[error(transparent)]
    UnsoundDeduction(#[from] UnsoundDeduction),
}

/// One probabilistic move: the revealed cell and the exact chance it was safe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Guess {
    pub cell: usize,
    pub success_probability: f64,
}

/// Tally of a full solve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Propagation passes that revealed or flagged at least one cell.
    pub deductions: usize,
    /// Probabilistic reveals taken because deduction stalled.
    pub guesses: usize,
}

/// A full game: the cells of some grid, the working frontier and the driver
/// that alternates deduction with probabilistic guessing.
#[derive(Clone, Debug)]
pub struct Board {
    grid: Grid,
    arena: CellArena,
    mine_count: usize,
    frontier: Frontier,
    rng: StdRng,
}

impl Board {
    /// A board over `grid` with the given mine placement and a fresh RNG for
    /// tie-breaking.
    pub fn from_mines(grid: Grid, mines: &MineMap) -> Self {
        Self::from_mines_with_rng(grid, mines, StdRng::from_entropy())
    }

    /// Like [`Self::from_mines`] with a fixed tie-break seed, for
    /// reproducible runs.
    pub fn from_mines_seeded(grid: Grid, mines: &MineMap, seed: u64) -> Self {
        Self::from_mines_with_rng(grid, mines, StdRng::seed_from_u64(seed))
    }

    fn from_mines_with_rng(grid: Grid, mines: &MineMap, rng: StdRng) -> Self {
        assert_eq!(grid.cell_count(), mines.cell_count());
        let neighbours = grid.all_neighbours();
        let mined: Vec<bool> = (0..grid.cell_count()).map(|i| mines.is_mine(i)).collect();
        let adjacent: Vec<usize> = neighbours
            .iter()
            .map(|cells| cells.iter().filter(|&&n| mined[n]).count())
            .collect();
        Self {
            grid,
            arena: CellArena::new(&mined, &adjacent, neighbours),
            mine_count: mines.mine_count(),
            frontier: Frontier::new(),
            rng,
        }
    }

    /// A board with `mine_count` mines placed uniformly at random, none of
    /// them under `safe_cell`.
    pub fn random(grid: Grid, mine_count: usize, safe_cell: usize) -> Self {
        Self::random_with_rng(grid, mine_count, safe_cell, StdRng::from_entropy())
    }

    /// Like [`Self::random`] with a fixed seed covering both placement and
    /// tie-breaking.
    pub fn random_seeded(grid: Grid, mine_count: usize, safe_cell: usize, seed: u64) -> Self {
        Self::random_with_rng(grid, mine_count, safe_cell, StdRng::seed_from_u64(seed))
    }

    fn random_with_rng(grid: Grid, mine_count: usize, safe_cell: usize, mut rng: StdRng) -> Self {
        let mines = random_mines(grid.cell_count(), mine_count, &[safe_cell], &mut rng);
        Self::from_mines_with_rng(grid, &mines, rng)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn cell(&self, cell_index: usize) -> &Cell {
        self.arena.get(cell_index)
    }

    pub fn cell_count(&self) -> usize {
        self.arena.len()
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    /// Mines not yet pinned down by a flag.
    pub fn remaining_mines(&self) -> usize {
        self.mine_count.saturating_sub(self.arena.flag_count())
    }

    /// Every cell is either revealed or flagged.
    pub fn is_solved(&self) -> bool {
        self.arena.unresolved_cells().next().is_none()
    }

    /// Reveals a cell by outside choice (an opening move, or a loaded board's
    /// starting position) and folds its constraint into the frontier.
    pub fn reveal(&mut self, cell_index: usize) -> Result<usize, SolverError> {
        let adjacent = self
            .arena
            .reveal(cell_index)
            .map_err(|_| SolverError::MineHit { cell: cell_index })?;
        self.frontier.resolve_cell(&self.arena, cell_index);
        self.frontier
            .absorb(&self.arena, Frontier::seed(&self.arena, cell_index));
        Ok(adjacent)
    }

    /// Whether propagation still has constraints to cross-check.
    pub fn has_deduction_work(&self) -> bool {
        self.frontier.has_work()
    }

    /// Runs one propagation pass; `true` if it revealed or flagged anything.
    pub fn propagate_step(&mut self) -> Result<bool, SolverError> {
        Ok(self.frontier.compare_one(&mut self.arena)?)
    }

    /// Propagates to the fixed point; `true` if board state changed at all.
    pub fn propagate_all(&mut self) -> Result<bool, SolverError> {
        Ok(self.frontier.compare_all(&mut self.arena)?)
    }

    /// Makes the single best probabilistic move, revealing the unresolved
    /// cell with the lowest exact mine probability.
    ///
    /// `Ok(None)` when nothing is left to resolve. [`SolverError::MineHit`]
    /// is the legitimate way to lose; there is no other failure here.
    ///
    /// Every hypothesis over the frontier gets the weight
    /// `C(bulk_size, budget - mines_in_edge)`: the number of ways the
    /// remaining mines can fall into the unconstrained bulk. A frontier
    /// cell's mine probability is the weight of hypotheses mining it over the
    /// total; the bulk's is the expected bulk mine count over the bulk size.
    /// All comparisons are exact integer comparisons on a common denominator;
    /// floats only appear in the reported probability.
    pub fn guess_best_move(&mut self) -> Result<Option<Guess>, SolverError> {
        let unresolved: Vec<usize> = self.arena.unresolved_cells().collect();
        if unresolved.is_empty() {
            return Ok(None);
        }
        let budget = self.remaining_mines();
        let bulk: Vec<usize> = unresolved
            .iter()
            .copied()
            .filter(|&cell| !self.frontier.contains_cell(cell))
            .collect();
        let bulk_size = bulk.len();

        let enumeration = self.frontier.enumerate();
        let mut total = BigUint::zero();
        let mut mined_weight = vec![BigUint::zero(); enumeration.cells.len()];
        // Numerator of the bulk's average mine count: sum of weight times
        // mines falling into the bulk.
        let mut bulk_mines = BigUint::zero();
        for hypothesis in &enumeration.hypotheses {
            let edge_mines = hypothesis.mine_count();
            if edge_mines > budget {
                continue;
            }
            let in_bulk = budget - edge_mines;
            let weight = binomial(bulk_size, in_bulk);
            for (position, slot) in mined_weight.iter_mut().enumerate() {
                if hypothesis.state(position) == MineState::Mine {
                    *slot += &weight;
                }
            }
            bulk_mines += &weight * in_bulk;
            total += weight;
        }

        if total.is_zero() {
            // No feasible hypothesis constrains anything; fall back to a
            // uniform pick with only the global budget to go on.
            let candidates = if bulk.is_empty() { &unresolved } else { &bulk };
            let cell = self.pick_equal_odds(candidates);
            let success_probability = if bulk_size == 0 {
                0.0
            } else {
                1.0 - budget as f64 / bulk_size as f64
            };
            return self
                .apply_guess(cell, success_probability)
                .map(Some);
        }

        // Common denominator total * bulk_size: a frontier cell's probability
        // is mined_weight * bulk_size over it, the bulk's is bulk_mines.
        let scale = BigUint::from(bulk_size.max(1));
        let mut best_score: Option<BigUint> = None;
        let mut candidates: Vec<usize> = Vec::new();
        for (position, &cell) in enumeration.cells.iter().enumerate() {
            let score = &mined_weight[position] * &scale;
            match &best_score {
                Some(best) if *best < score => {}
                Some(best) if *best == score => candidates.push(cell),
                _ => {
                    best_score = Some(score);
                    candidates = vec![cell];
                }
            }
        }
        if bulk_size > 0 {
            match &best_score {
                Some(best) if *best < bulk_mines => {}
                Some(best) if *best == bulk_mines => candidates.extend(&bulk),
                _ => candidates = bulk.clone(),
            }
        }

        let cell = self.pick_equal_odds(&candidates);
        let mine_probability = match enumeration.cells.iter().position(|&c| c == cell) {
            Some(position) => ratio_to_f64(&mined_weight[position], &total),
            None => ratio_to_f64(&bulk_mines, &(&total * &scale)),
        };
        self.apply_guess(cell, 1.0 - mine_probability).map(Some)
    }

    fn apply_guess(&mut self, cell: usize, success_probability: f64) -> Result<Guess, SolverError> {
        self.arena
            .reveal(cell)
            .map_err(|_| SolverError::MineHit { cell })?;
        self.frontier.resolve_cell(&self.arena, cell);
        self.frontier
            .absorb(&self.arena, Frontier::seed(&self.arena, cell));
        Ok(Guess {
            cell,
            success_probability,
        })
    }

    /// Breaks a probability tie: prefer the candidate with the most
    /// frontier-registered unresolved neighbours, then the fewest bulk
    /// neighbours, so a lucky reveal feeds the most new deductions. Remaining
    /// ties go to the RNG.
    fn pick_equal_odds(&mut self, candidates: &[usize]) -> usize {
        let mut best_key: Option<(usize, usize)> = None;
        let mut best: Vec<usize> = Vec::new();
        for &cell in candidates {
            let edge_neighbours = self
                .arena
                .unresolved_neighbours(cell)
                .filter(|&n| self.frontier.contains_cell(n))
                .count();
            let bulk_neighbours = self.arena.unresolved_neighbours(cell).count() - edge_neighbours;
            // Max edge count wins; among those, min bulk count.
            let better = match best_key {
                None => true,
                Some((best_edge, best_bulk)) => {
                    edge_neighbours > best_edge
                        || (edge_neighbours == best_edge && bulk_neighbours < best_bulk)
                }
            };
            if better {
                best_key = Some((edge_neighbours, bulk_neighbours));
                best = vec![cell];
            } else if best_key == Some((edge_neighbours, bulk_neighbours)) {
                best.push(cell);
            }
        }
        *best
            .choose(&mut self.rng)
            .expect("tie-break candidates are never empty")
    }

    /// Reveals every cell still hidden, mined or not. For showing the final
    /// position after a loss.
    pub fn reveal_all(&mut self) {
        for cell in 0..self.arena.len() {
            if !self.arena.get(cell).is_revealed() && !self.arena.get(cell).is_flagged() {
                let _ = self.arena.reveal(cell);
            }
        }
    }

    /// Whether the cell is currently part of the frontier.
    pub fn is_frontier_cell(&self, cell_index: usize) -> bool {
        self.frontier.contains_cell(cell_index)
    }

    /// Runs deduction and guessing to completion.
    pub fn solve(&mut self) -> Result<SolveStats, SolverError> {
        let mut stats = SolveStats::default();
        while !self.is_solved() {
            if self.has_deduction_work() {
                if self.propagate_step()? {
                    stats.deductions += 1;
                }
            } else {
                match self.guess_best_move()? {
                    Some(_) => stats.guesses += 1,
                    None => break,
                }
            }
        }
        Ok(stats)
    }
}

/// `num / den` rounded down at nine decimal places.
///
/// The operands can exceed `f64` range, so the division happens in the
/// integers first.
fn ratio_to_f64(num: &BigUint, den: &BigUint) -> f64 {
    const PRECISION: u64 = 1_000_000_000;
    if den.is_zero() {
        return 0.0;
    }
    let scaled = num * PRECISION / den;
    // num <= den for every ratio formed here, so this fits easily.
    scaled.to_f64().unwrap_or(f64::MAX) / PRECISION as f64
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use crate::topology::{Layout, Wrap};

    use super::*;

    fn square_grid(width: usize, height: usize) -> Grid {
        Grid {
            size: crate::topology::GridSize {
                width: NonZeroUsize::new(width).unwrap(),
                height: NonZeroUsize::new(height).unwrap(),
            },
            layout: Layout::Square {
                wrap: Wrap::default(),
            },
        }
    }

    fn board(width: usize, height: usize, mines: &[usize], seed: u64) -> Board {
        let mut map = MineMap::new(width * height);
        for &cell in mines {
            map.place_mine(cell);
        }
        Board::from_mines_seeded(square_grid(width, height), &map, seed)
    }

    #[test]
    fn single_mined_cell_any_reveal_hits() {
        let mut b = board(1, 1, &[0], 0);
        assert_eq!(
            b.guess_best_move(),
            Err(SolverError::MineHit { cell: 0 })
        );
    }

    #[test]
    fn one_of_three_reports_two_thirds() {
        // A revealed "1" with three unresolved neighbours, no bulk, one mine
        // left: every choice survives with probability 2/3.
        let mut saw_success = false;
        for seed in 0..16 {
            let mut b = board(2, 2, &[3], seed);
            b.reveal(0).unwrap();
            assert!(!b.propagate_all().unwrap());
            match b.guess_best_move() {
                Ok(Some(guess)) => {
                    saw_success = true;
                    assert!((guess.success_probability - 2.0 / 3.0).abs() < 1e-6);
                    assert_ne!(guess.cell, 3);
                }
                Ok(None) => panic!("cells remain unresolved"),
                Err(SolverError::MineHit { cell }) => assert_eq!(cell, 3),
                Err(other) => panic!("{other}"),
            }
        }
        assert!(saw_success);
    }

    #[test]
    fn one_two_one_is_pure_deduction() {
        // Bottom row revealed as 1-2-1; the mines sit above the ones and the
        // middle top cell is safe. No guessing allowed.
        let mut b = board(3, 2, &[0, 2], 0);
        for cell in [3, 4, 5] {
            b.reveal(cell).unwrap();
        }
        b.propagate_all().unwrap();
        assert!(b.is_solved());
        assert!(b.cell(0).is_flagged());
        assert!(b.cell(2).is_flagged());
        assert!(b.cell(1).is_revealed());
    }

    #[test]
    fn sparse_bulk_beats_the_frontier() {
        // Corner "1" over three frontier cells (each 1/3 mined) against a
        // 21-cell bulk holding the other three mines (3/21 each): the guess
        // must go to the bulk with success 6/7.
        let mut b = board(5, 5, &[6, 12, 20, 24], 11);
        b.reveal(0).unwrap();
        b.propagate_all().unwrap();
        let guess = b.guess_best_move().unwrap().expect("unresolved cells remain");
        assert!(![1, 5, 6].contains(&guess.cell));
        assert!((guess.success_probability - 6.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn empty_frontier_uses_budget_over_bulk() {
        // Nothing revealed yet: the opening guess can only use the global
        // density, here 2 mines over 9 cells.
        let mut b = board(3, 3, &[4, 8], 3);
        match b.guess_best_move() {
            Ok(Some(guess)) => {
                assert!((guess.success_probability - 7.0 / 9.0).abs() < 1e-6);
            }
            Err(SolverError::MineHit { cell }) => assert!([4, 8].contains(&cell)),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn mine_free_board_solves_in_one_guess() {
        let mut b = board(4, 4, &[], 5);
        let stats = b.solve().unwrap();
        assert!(b.is_solved());
        assert_eq!(stats.guesses, 1);
        assert_eq!(b.remaining_mines(), 0);
    }

    #[test]
    fn solved_board_has_no_move() {
        let mut b = board(2, 1, &[], 0);
        b.reveal(0).unwrap();
        b.propagate_all().unwrap();
        assert!(b.is_solved());
        assert_eq!(b.guess_best_move(), Ok(None));
    }

    #[test]
    fn flags_count_against_the_budget() {
        let mut b = board(3, 1, &[0, 2], 0);
        b.reveal(1).unwrap();
        b.propagate_all().unwrap();
        assert!(b.is_solved());
        assert_eq!(b.remaining_mines(), 0);
    }

    #[test]
    fn random_board_keeps_safe_cell_clear() {
        for seed in 0..10 {
            let b = Board::random_seeded(square_grid(4, 4), 8, 5, seed);
            assert_eq!(b.mine_count(), 8);
            let mut probe = b.clone();
            assert!(probe.reveal(5).is_ok());
        }
    }
}
