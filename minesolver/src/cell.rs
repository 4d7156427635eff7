use thiserror::Error;

/// Revealing a mined cell.
///
/// For a reveal chosen by deduction this is an engine bug; for a reveal chosen
/// by probability it is the expected way to lose. The distinction is made by
/// the caller, not here.
#[derive(Clone, Copy, Debug, Error, Hash, PartialEq, Eq)]
#[error("revealed a mined cell")]
pub struct MineHit;

/// A single cell of a board.
///
/// Carries no positional information; the topology layer assigns each cell a
/// fixed neighbour list once, and everything downstream works purely on cell
/// indices. This keeps the engine agnostic of square/hex/wrapping layouts.
#[derive(Clone, Debug)]
pub struct Cell {
    mined: bool,
    revealed: bool,
    flagged: bool,
    adjacent_mines: usize,
    neighbours: Vec<usize>,
}

impl Cell {
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    /// The number of mined neighbours, only available once revealed.
    pub fn adjacent_mines(&self) -> Option<usize> {
        self.revealed.then_some(self.adjacent_mines)
    }

    /// The fixed adjacency list; never changes after arena construction.
    pub fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    /// Whether this is a revealed mine, the end-of-game display case. Hidden
    /// cells never report their mine state.
    pub fn is_revealed_mine(&self) -> bool {
        self.revealed && self.mined
    }

    /// Neither revealed nor flagged; the engine still has work to do here.
    pub fn is_unresolved(&self) -> bool {
        !self.revealed && !self.flagged
    }
}

/// The arena owning every [`Cell`] of a board, keyed by dense `usize` indices.
///
/// Caches the reveal and flag counts so that the remaining-mine budget stays a
/// subtraction instead of a scan.
#[derive(Clone, Debug)]
pub struct CellArena {
    cells: Vec<Cell>,
    reveal_count: usize,
    flag_count: usize,
}

impl CellArena {
    /// Builds an arena from parallel per-cell data.
    ///
    /// `adjacent` carries the mined-neighbour count of every cell; for mined
    /// cells the value is never shown and may be anything.
    ///
    /// # Panics
    ///
    /// Panics if the slices disagree in length or a neighbour index is out of
    /// bounds.
    pub fn new(mined: &[bool], adjacent: &[usize], neighbours: Vec<Vec<usize>>) -> Self {
        assert_eq!(mined.len(), adjacent.len());
        assert_eq!(mined.len(), neighbours.len());
        let len = mined.len();
        let cells = mined
            .iter()
            .zip(adjacent)
            .zip(neighbours)
            .map(|((&mined, &adjacent_mines), neighbours)| {
                assert!(neighbours.iter().all(|&n| n < len));
                Cell {
                    mined,
                    revealed: false,
                    flagged: false,
                    adjacent_mines,
                    neighbours,
                }
            })
            .collect();
        Self {
            cells,
            reveal_count: 0,
            flag_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, cell_index: usize) -> &Cell {
        &self.cells[cell_index]
    }

    /// Reveals a cell, returning its adjacent-mine count.
    ///
    /// Idempotent for already-revealed cells.
    pub fn reveal(&mut self, cell_index: usize) -> Result<usize, MineHit> {
        let cell = &mut self.cells[cell_index];
        if cell.revealed {
            return if cell.mined { Err(MineHit) } else { Ok(cell.adjacent_mines) };
        }
        cell.revealed = true;
        self.reveal_count += 1;
        if cell.mined {
            Err(MineHit)
        } else {
            Ok(cell.adjacent_mines)
        }
    }

    /// Flags a cell as a known mine. Idempotent; returns whether state changed.
    pub fn flag(&mut self, cell_index: usize) -> bool {
        let cell = &mut self.cells[cell_index];
        if cell.flagged {
            false
        } else {
            cell.flagged = true;
            self.flag_count += 1;
            true
        }
    }

    pub fn reveal_count(&self) -> usize {
        self.reveal_count
    }

    pub fn flag_count(&self) -> usize {
        self.flag_count
    }

    /// Neighbours that are neither revealed nor flagged.
    pub fn unresolved_neighbours(&self, cell_index: usize) -> impl Iterator<Item = usize> + '_ {
        self.cells[cell_index]
            .neighbours
            .iter()
            .copied()
            .filter(|&n| self.cells[n].is_unresolved())
    }

    /// Flagged neighbours; these already account for part of a revealed
    /// cell's count.
    pub fn flagged_neighbour_count(&self, cell_index: usize) -> usize {
        self.cells[cell_index]
            .neighbours
            .iter()
            .filter(|&&n| self.cells[n].flagged)
            .count()
    }

    pub fn is_unresolved(&self, cell_index: usize) -> bool {
        self.cells[cell_index].is_unresolved()
    }

    /// All unresolved cell indices, in index order.
    pub fn unresolved_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_unresolved())
            .map(|(i, _)| i)
    }
}
