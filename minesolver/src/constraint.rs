use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

use crate::cell::CellArena;

/// A group of unresolved cells together with every mine count still consistent
/// with current knowledge about the group.
///
/// Value semantics throughout: deduction never mutates a set another container
/// might still reference, it builds replacements. `counts` only ever shrinks
/// over a set's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintSet {
    cells: BTreeSet<usize>,
    counts: BTreeSet<usize>,
}

/// The three parts of [`ConstraintSet::split`]: the intersection and the two
/// exclusive remainders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitParts {
    pub inter: ConstraintSet,
    pub only_self: ConstraintSet,
    pub only_other: ConstraintSet,
}

impl ConstraintSet {
    /// Builds a set, discarding counts outside `0..=|cells|` up front.
    pub fn new(
        cells: impl IntoIterator<Item = usize>,
        counts: impl IntoIterator<Item = usize>,
    ) -> Self {
        let cells: BTreeSet<usize> = cells.into_iter().collect();
        let counts = counts.into_iter().filter(|&n| n <= cells.len()).collect();
        Self { cells, counts }
    }

    /// The constraint a freshly revealed cell contributes: its unresolved
    /// neighbours must hold its adjacent-mine count minus the mines already
    /// flagged around it.
    ///
    /// [`None`] when every neighbour is already resolved.
    ///
    /// # Panics
    ///
    /// Panics if the cell is not revealed.
    pub fn from_revealed(arena: &CellArena, cell_index: usize) -> Option<Self> {
        let adjacent = arena
            .get(cell_index)
            .adjacent_mines()
            .expect("constraints only come from revealed cells");
        let cells: BTreeSet<usize> = arena.unresolved_neighbours(cell_index).collect();
        if cells.is_empty() {
            return None;
        }
        let remaining = adjacent.saturating_sub(arena.flagged_neighbour_count(cell_index));
        Some(Self::new(cells, [remaining]))
    }

    pub fn cells(&self) -> &BTreeSet<usize> {
        &self.cells
    }

    pub fn counts(&self) -> &BTreeSet<usize> {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn same_cells(&self, other: &Self) -> bool {
        self.cells == other.cells
    }

    /// Every cell in the set is certainly free of mines.
    pub fn is_certain_clear(&self) -> bool {
        !self.cells.is_empty() && self.counts.len() == 1 && self.counts.contains(&0)
    }

    /// Every cell in the set is certainly mined.
    pub fn is_certain_mined(&self) -> bool {
        !self.cells.is_empty() && self.counts.len() == 1 && self.counts.contains(&self.cells.len())
    }

    /// Intersects the possible counts with `other`'s, returning whether the
    /// set actually narrowed.
    ///
    /// Narrowing is the only legal direction; two constraints over the same
    /// cells are both true, so only counts possible under both survive.
    pub fn restrict_counts(&mut self, other: &Self) -> bool {
        debug_assert!(self.same_cells(other));
        let before = self.counts.len();
        self.counts.retain(|n| other.counts.contains(n));
        self.counts.len() != before
    }

    /// Drops cells that have become resolved, shifting counts down by the
    /// number of flagged cells removed. Returns whether anything changed.
    ///
    /// Counts that fall outside `0..=|cells|` after the shift are impossible
    /// and dropped.
    pub fn normalize(&mut self, arena: &CellArena) -> bool {
        let before_cells = self.cells.len();
        let mut removed_mines = 0;
        self.cells.retain(|&cell| {
            if arena.is_unresolved(cell) {
                true
            } else {
                if arena.get(cell).is_flagged() {
                    removed_mines += 1;
                }
                false
            }
        });
        if self.cells.len() == before_cells {
            return false;
        }
        let len = self.cells.len();
        self.counts = self
            .counts
            .iter()
            .filter_map(|n| n.checked_sub(removed_mines))
            .filter(|&n| n <= len)
            .collect();
        true
    }

    /// Splits two overlapping constraints into intersection and remainders.
    ///
    /// For every `(n_a, n_b)` count pair, the mines falling into the
    /// intersection, `n_i`, are bounded below by what the exclusive parts
    /// cannot hold and above by what the intersection and either count allow:
    ///
    /// `max(n_a - |only_a|, n_b - |only_b|, 0) <= n_i <= min(|inter|, n_a, n_b)`
    ///
    /// Each valid `n_i` contributes `n_i` to the intersection's counts,
    /// `n_a - n_i` to this set's remainder and `n_b - n_i` to the other's.
    pub fn split(&self, other: &Self) -> SplitParts {
        let inter_cells: BTreeSet<usize> = self.cells.intersection(&other.cells).copied().collect();
        let only_a_cells: BTreeSet<usize> = self.cells.difference(&other.cells).copied().collect();
        let only_b_cells: BTreeSet<usize> = other.cells.difference(&self.cells).copied().collect();

        let mut inter_counts = BTreeSet::new();
        let mut only_a_counts = BTreeSet::new();
        let mut only_b_counts = BTreeSet::new();

        for (&n_a, &n_b) in self.counts.iter().cartesian_product(&other.counts) {
            let low = n_a
                .saturating_sub(only_a_cells.len())
                .max(n_b.saturating_sub(only_b_cells.len()));
            let high = inter_cells.len().min(n_a).min(n_b);
            for n_i in low..=high {
                inter_counts.insert(n_i);
                only_a_counts.insert(n_a - n_i);
                only_b_counts.insert(n_b - n_i);
            }
        }

        SplitParts {
            inter: ConstraintSet {
                cells: inter_cells,
                counts: inter_counts,
            },
            only_self: ConstraintSet {
                cells: only_a_cells,
                counts: only_a_counts,
            },
            only_other: ConstraintSet {
                cells: only_b_cells,
                counts: only_b_counts,
            },
        }
    }

    /// Every subset of the set's cells whose size is a possible count.
    ///
    /// Used by hypothesis enumeration; exponential by nature, only ever called
    /// on frontier-sized sets.
    pub fn placements(&self) -> impl Iterator<Item = (usize, Vec<usize>)> + '_ {
        self.counts.iter().flat_map(move |&count| {
            self.cells
                .iter()
                .copied()
                .combinations(count)
                .map(move |mined| (count, mined))
        })
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}:{{{}}}",
            self.cells.iter().join(","),
            self.counts.iter().join(",")
        )
    }
}

/// Outcome of offering a set to a [`ConstraintIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// No existing set had the same cells; the set was appended.
    Added,
    /// An existing set over the same cells had its counts narrowed.
    Narrowed,
    /// An existing set over the same cells already carried the information.
    Unchanged,
}

/// An order-preserving list of constraints, deduplicated by cell membership.
///
/// Two constraints over the same cells are merged by count intersection
/// instead of being stored twice.
#[derive(Clone, Debug, Default)]
pub struct ConstraintIndex {
    sets: Vec<ConstraintSet>,
}

impl ConstraintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_or_update(&mut self, set: ConstraintSet) -> AddOutcome {
        match self.sets.iter_mut().find(|existing| existing.same_cells(&set)) {
            Some(existing) => {
                if existing.restrict_counts(&set) {
                    AddOutcome::Narrowed
                } else {
                    AddOutcome::Unchanged
                }
            }
            None => {
                self.sets.push(set);
                AddOutcome::Added
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintSet> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl IntoIterator for ConstraintIndex {
    type Item = ConstraintSet;
    type IntoIter = std::vec::IntoIter<ConstraintSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(cells: impl IntoIterator<Item = usize>, counts: impl IntoIterator<Item = usize>) -> ConstraintSet {
        ConstraintSet::new(cells, counts)
    }

    #[test]
    fn new_discards_impossible_counts() {
        let s = set([1, 2], [0, 1, 2, 3]);
        assert_eq!(s.counts().iter().copied().collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn certainty_classification() {
        assert!(set([1, 2], [0]).is_certain_clear());
        assert!(set([1, 2], [2]).is_certain_mined());
        assert!(!set([1, 2], [1]).is_certain_clear());
        assert!(!set([1, 2], [0, 2]).is_certain_mined());
        assert!(!set([], [0]).is_certain_clear());
    }

    #[test]
    fn split_disjoint_sets() {
        let parts = set([0, 1], [1]).split(&set([2, 3], [1]));
        assert!(parts.inter.is_empty());
        assert_eq!(parts.only_self, set([0, 1], [1]));
        assert_eq!(parts.only_other, set([2, 3], [1]));
    }

    #[test]
    fn split_subset_forces_remainder() {
        // {0,1,2} holds 2 mines, {0,1} holds at most 1: cell 2 must be mined.
        let parts = set([0, 1, 2], [2]).split(&set([0, 1], [1]));
        assert_eq!(parts.inter, set([0, 1], [1]));
        assert!(parts.only_self.is_certain_mined());
        assert_eq!(parts.only_self.cells().iter().copied().collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn split_one_two_overlap() {
        // The left half of a 1-2-1 pattern: "1" over {0,1,2} against "2" over
        // {0,1,2,3,4}. The "1" pins the intersection to one mine, so the
        // remainder {3,4} holds exactly one.
        let parts = set([0, 1, 2], [1]).split(&set([0, 1, 2, 3, 4], [2]));
        assert_eq!(parts.inter, set([0, 1, 2], [1]));
        assert!(parts.only_self.is_empty());
        assert_eq!(parts.only_other, set([3, 4], [1]));
    }

    #[test]
    fn split_conservation() {
        // For every admitted n_i, the three parts reassemble both inputs.
        let a = set([0, 1, 2, 3], [1, 2, 3]);
        let b = set([2, 3, 4, 5, 6], [0, 2]);
        let parts = a.split(&b);
        let inter_len = parts.inter.len();
        for &n_a in a.counts() {
            for &n_b in b.counts() {
                for n_i in 0..=inter_len.min(n_a).min(n_b) {
                    if n_a - n_i <= parts.only_self.len() && n_b - n_i <= parts.only_other.len() {
                        assert!(parts.inter.counts().contains(&n_i));
                        assert!(parts.only_self.counts().contains(&(n_a - n_i)));
                        assert!(parts.only_other.counts().contains(&(n_b - n_i)));
                    }
                }
            }
        }
        // And nothing out of range sneaks in.
        assert!(parts.inter.counts().iter().all(|&n| n <= inter_len));
        assert!(parts.only_self.counts().iter().all(|&n| n <= parts.only_self.len()));
        assert!(parts.only_other.counts().iter().all(|&n| n <= parts.only_other.len()));
    }

    #[test]
    fn restrict_counts_narrows() {
        let mut a = set([0, 1], [0, 1, 2]);
        assert!(a.restrict_counts(&set([0, 1], [1, 2])));
        assert_eq!(a, set([0, 1], [1, 2]));
        assert!(!a.restrict_counts(&set([0, 1], [1, 2])));
    }

    #[test]
    fn placements_cover_all_counts() {
        let s = set([0, 1, 2], [1, 2]);
        let placements: Vec<_> = s.placements().collect();
        assert_eq!(placements.len(), 3 + 3);
        assert!(placements.contains(&(1, vec![2])));
        assert!(placements.contains(&(2, vec![0, 2])));
    }

    #[test]
    fn index_merges_on_same_membership() {
        let mut index = ConstraintIndex::new();
        assert_eq!(index.add_or_update(set([0, 1], [0, 1, 2])), AddOutcome::Added);
        assert_eq!(index.add_or_update(set([0, 1], [1])), AddOutcome::Narrowed);
        assert_eq!(index.add_or_update(set([0, 1], [0, 1])), AddOutcome::Unchanged);
        assert_eq!(index.add_or_update(set([0, 2], [1])), AddOutcome::Added);
        assert_eq!(index.len(), 2);
        assert_eq!(index.iter().next().map(|s| s.counts().len()), Some(1));
    }
}
