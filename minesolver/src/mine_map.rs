use bitvec::{bitbox, boxed::BitBox};

/// Stores which cells of a board contain a mine.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct MineMap {
    mines: BitBox,
}

impl MineMap {
    /// Creates a new [`MineMap`] without any mines.
    pub fn new(cell_count: usize) -> Self {
        Self {
            mines: bitbox![0; cell_count],
        }
    }

    /// The total number of cells.
    pub fn cell_count(&self) -> usize {
        self.mines.len()
    }

    /// Returns whether the given cell contains a mine.
    pub fn is_mine(&self, cell_index: usize) -> bool {
        self.mines[cell_index]
    }

    /// Returns the total number of mines.
    pub fn mine_count(&self) -> usize {
        self.mines.count_ones()
    }

    /// Places or removes a mine at the given cell.
    ///
    /// Does nothing if the state of the cell already matches.
    pub fn set_mine(&mut self, cell_index: usize, is_mine: bool) {
        self.mines.set(cell_index, is_mine);
    }

    /// Shorthand for [`Self::set_mine()`] with `true`.
    pub fn place_mine(&mut self, cell_index: usize) {
        self.set_mine(cell_index, true);
    }

    /// All mined cell indices in ascending order.
    pub fn mined_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.mines.iter_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let map = MineMap::new(16);
        assert_eq!(map.cell_count(), 16);
        assert_eq!(map.mine_count(), 0);
        assert!(!map.is_mine(3));
    }

    #[test]
    fn place_and_remove() {
        let mut map = MineMap::new(8);
        map.place_mine(2);
        map.place_mine(5);
        assert_eq!(map.mine_count(), 2);
        assert!(map.is_mine(5));
        map.set_mine(5, false);
        assert_eq!(map.mined_cells().collect::<Vec<_>>(), [2]);
    }
}
