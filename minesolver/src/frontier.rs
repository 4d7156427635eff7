use std::collections::{BTreeSet, HashMap, VecDeque};

use thiserror::Error;

use crate::cell::CellArena;
use crate::constraint::{ConstraintIndex, ConstraintSet};
use crate::hypothesis::{Hypothesis, MineState};

/// A deductive reveal hit a mine.
///
/// Deduction never guesses, so this is an engine correctness bug rather than
/// a game loss; callers propagate it, never swallow it.
#[derive(Clone, Copy, Debug, Error, Hash, PartialEq, Eq)]
#[error("deduction revealed a mine at cell {cell}")]
pub struct UnsoundDeduction {
    pub cell: usize,
}

/// Slab index of a live [`ConstraintSet`] inside a [`Frontier`].
type SetId = usize;

/// The propagation engine: every live constraint, indexed by each cell it
/// touches, plus the queue of constraints not yet cross-checked against their
/// neighbours.
///
/// Constraints are value types stored in a slab; "updating" one means
/// replacing its slot, so no container ever holds a stale alias. A constraint
/// is registered in `by_cell` under all of its member cells, and a cell is
/// evicted from `by_cell` the moment it resolves.
#[derive(Clone, Debug, Default)]
pub struct Frontier {
    sets: Vec<Option<ConstraintSet>>,
    by_cell: HashMap<usize, Vec<SetId>>,
    pending: VecDeque<SetId>,
}

/// The outcome of enumerating a frontier: the shared cell order and every
/// complete mine/clear assignment consistent with all constraints.
#[derive(Clone, Debug)]
pub struct EdgeEnumeration {
    pub cells: Vec<usize>,
    pub hypotheses: Vec<Hypothesis>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frontier seeded from a single revealed cell's constraint.
    pub fn seed(arena: &CellArena, revealed_cell: usize) -> Self {
        let mut frontier = Self::new();
        if let Some(set) = ConstraintSet::from_revealed(arena, revealed_cell) {
            frontier.insert(arena, set);
        }
        frontier
    }

    /// Whether the cell is currently constrained by this frontier.
    pub fn contains_cell(&self, cell_index: usize) -> bool {
        self.by_cell.contains_key(&cell_index)
    }

    /// Whether any constraint still awaits cross-checking.
    pub fn has_work(&self) -> bool {
        !self.pending.is_empty()
    }

    fn live_sets(&self) -> impl Iterator<Item = (SetId, &ConstraintSet)> {
        self.sets
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|set| (id, set)))
    }

    /// Normalizes and registers a constraint, deduplicating against live
    /// constraints over the same cells by count intersection.
    ///
    /// Anything that narrows or adds information ends up on the work queue.
    /// Returns the id the constraint landed on, or [`None`] if normalization
    /// emptied it.
    pub fn insert(&mut self, arena: &CellArena, mut set: ConstraintSet) -> Option<SetId> {
        set.normalize(arena);
        if set.is_empty() || set.counts().is_empty() {
            return None;
        }

        let first_cell = *set.cells().iter().next().expect("set is nonempty");
        let matches: Vec<SetId> = self
            .by_cell
            .get(&first_cell)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&id| {
                self.sets[id]
                    .as_ref()
                    .is_some_and(|existing| existing.same_cells(&set))
            })
            .collect();

        match matches.as_slice() {
            [] => {
                let id = self.alloc(set);
                self.pending.push_back(id);
                Some(id)
            }
            &[id] => {
                let existing = self.sets[id].as_mut().expect("matched id is live");
                if existing.restrict_counts(&set) {
                    self.pending.push_back(id);
                }
                Some(id)
            }
            &[keep, ref rest @ ..] => {
                // Two live index entries sharing one membership means the
                // merge/dedup bookkeeping slipped; duplicates are conservative
                // rather than unsafe, so warn and fold them together.
                eprintln!("warning: duplicate constraint entries for {set}, merging");
                for &id in rest {
                    let dropped = self.remove(id).expect("matched id is live");
                    let kept = self.sets[keep].as_mut().expect("matched id is live");
                    kept.restrict_counts(&dropped);
                }
                let kept = self.sets[keep].as_mut().expect("matched id is live");
                if kept.restrict_counts(&set) {
                    self.pending.push_back(keep);
                }
                Some(keep)
            }
        }
    }

    fn alloc(&mut self, set: ConstraintSet) -> SetId {
        let id = match self.sets.iter().position(Option::is_none) {
            Some(free) => free,
            None => {
                self.sets.push(None);
                self.sets.len() - 1
            }
        };
        for &cell in set.cells() {
            self.by_cell.entry(cell).or_default().push(id);
        }
        self.sets[id] = Some(set);
        id
    }

    fn remove(&mut self, id: SetId) -> Option<ConstraintSet> {
        let set = self.sets[id].take()?;
        for &cell in set.cells() {
            if let Some(ids) = self.by_cell.get_mut(&cell) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    self.by_cell.remove(&cell);
                }
            }
        }
        Some(set)
    }

    /// Pops one pending constraint and cross-checks it against every
    /// constraint sharing a cell with it, applying all certain conclusions.
    ///
    /// Returns whether any cell was revealed or flagged.
    pub fn compare_one(&mut self, arena: &mut CellArena) -> Result<bool, UnsoundDeduction> {
        let (id, set) = loop {
            let Some(id) = self.pending.pop_front() else {
                return Ok(false);
            };
            if let Some(set) = self.sets[id].clone() {
                break (id, set);
            }
        };

        let mut to_clear = BTreeSet::new();
        let mut to_flag = BTreeSet::new();
        let mut classify = |part: &ConstraintSet| {
            if part.is_certain_clear() {
                to_clear.extend(part.cells().iter().copied());
                true
            } else if part.is_certain_mined() {
                to_flag.extend(part.cells().iter().copied());
                true
            } else {
                false
            }
        };

        if !classify(&set) {
            let mut novel = Vec::new();
            for (_, neighbour) in self.neighbour_sets(id, &set) {
                let parts = set.split(&neighbour);
                for part in [parts.inter, parts.only_self, parts.only_other] {
                    if part.is_empty() || classify(&part) {
                        continue;
                    }
                    // Parts identical to either parent carry nothing new.
                    if part == set || part == neighbour {
                        continue;
                    }
                    novel.push(part);
                }
            }
            for part in novel {
                self.insert(arena, part);
            }
        }

        let changed = !to_clear.is_empty() || !to_flag.is_empty();
        self.apply_conclusions(arena, &to_clear, &to_flag)?;
        Ok(changed)
    }

    /// Every live constraint sharing at least one cell with `set`, other than
    /// `id` itself, each yielded once.
    fn neighbour_sets(&self, id: SetId, set: &ConstraintSet) -> Vec<(SetId, ConstraintSet)> {
        let mut seen = BTreeSet::new();
        let mut neighbours = Vec::new();
        for &cell in set.cells() {
            for &other in self.by_cell.get(&cell).into_iter().flatten() {
                if other != id && seen.insert(other) {
                    if let Some(other_set) = &self.sets[other] {
                        neighbours.push((other, other_set.clone()));
                    }
                }
            }
        }
        neighbours
    }

    /// Flags and reveals the given cells, spawning the constraint of each
    /// newly revealed cell and renormalizing everything that referenced a
    /// resolved cell.
    fn apply_conclusions(
        &mut self,
        arena: &mut CellArena,
        to_clear: &BTreeSet<usize>,
        to_flag: &BTreeSet<usize>,
    ) -> Result<(), UnsoundDeduction> {
        let mut spawned = Vec::new();
        for &cell in to_flag {
            if arena.is_unresolved(cell) {
                arena.flag(cell);
            }
        }
        for &cell in to_clear {
            if arena.is_unresolved(cell) {
                arena
                    .reveal(cell)
                    .map_err(|_| UnsoundDeduction { cell })?;
                spawned.push(cell);
            }
        }

        for &cell in to_flag.iter().chain(to_clear) {
            self.evict_cell(arena, cell);
        }
        for cell in spawned {
            if let Some(set) = ConstraintSet::from_revealed(arena, cell) {
                self.insert(arena, set);
            }
        }
        Ok(())
    }

    /// Removes a resolved cell from the index and renormalizes (and
    /// re-enqueues) every constraint that referenced it.
    ///
    /// The survivors go back through [`Self::insert`]: renormalization can
    /// shrink a set onto another live set's membership, and insertion is
    /// where that collapses into one entry.
    fn evict_cell(&mut self, arena: &CellArena, cell_index: usize) {
        let Some(ids) = self.by_cell.remove(&cell_index) else {
            return;
        };
        for id in ids {
            if let Some(set) = self.remove(id) {
                if let Some(survivor) = self.insert(arena, set) {
                    // The world changed around the survivor even when the
                    // merge itself did not narrow it, so it gets compared
                    // again either way.
                    self.pending.push_back(survivor);
                }
            }
        }
    }

    /// Eviction hook for reveals and flags decided outside propagation, such
    /// as a probabilistic guess.
    pub fn resolve_cell(&mut self, arena: &CellArena, cell_index: usize) {
        self.evict_cell(arena, cell_index);
    }

    /// Drains the work queue to its fixed point. Returns whether board state
    /// changed at any step.
    ///
    /// Terminates because the lattice of (cell set, count set) pairs is finite
    /// and constraints only ever shrink; a comparison that produces nothing
    /// new enqueues nothing.
    pub fn compare_all(&mut self, arena: &mut CellArena) -> Result<bool, UnsoundDeduction> {
        let mut changed = false;
        while self.has_work() {
            changed |= self.compare_one(arena)?;
        }
        Ok(changed)
    }

    /// Consumes another frontier that has become connected to this one,
    /// re-inserting all of its constraints. Narrowing re-enqueues as usual.
    pub fn absorb(&mut self, arena: &CellArena, other: Frontier) {
        for set in other.sets.into_iter().flatten() {
            self.insert(arena, set);
        }
    }

    /// Enumerates every complete mine/clear assignment over the frontier
    /// consistent with all live constraints.
    ///
    /// Constraints are processed in connectivity order, always preferring one
    /// that shares a cell with the region already visited, so that
    /// incompatible partial assignments die as early as possible and the live
    /// hypothesis list stays small.
    pub fn enumerate(&self) -> EdgeEnumeration {
        // Funnel the live sets through the membership index so two entries
        // over the same cells collapse into one before the cross product.
        let mut index = ConstraintIndex::new();
        for (_, set) in self.live_sets() {
            index.add_or_update(set.clone());
        }
        let live: Vec<ConstraintSet> = index.into_iter().collect();

        let mut cells = Vec::new();
        let mut position = HashMap::new();
        for set in &live {
            for &cell in set.cells() {
                if !position.contains_key(&cell) {
                    position.insert(cell, cells.len());
                    cells.push(cell);
                }
            }
        }

        let order = connectivity_order(&live);
        let mut hypotheses = vec![Hypothesis::undetermined(cells.len())];
        for next in order {
            let set = &live[next];
            let mut merged = Vec::new();
            for (_, mined) in set.placements() {
                let mut fragment = Hypothesis::undetermined(cells.len());
                for &cell in set.cells() {
                    fragment.set(position[&cell], MineState::Clear);
                }
                for cell in mined {
                    fragment.set(position[&cell], MineState::Mine);
                }
                merged.extend(
                    hypotheses
                        .iter()
                        .filter_map(|hypothesis| hypothesis.merge(&fragment)),
                );
            }
            hypotheses = merged;
            if hypotheses.is_empty() {
                break;
            }
        }

        EdgeEnumeration { cells, hypotheses }
    }
}

/// Orders constraint indices so each one (after the first) shares a cell with
/// an already-visited constraint whenever possible, falling back to the lowest
/// unvisited index when the connected region is exhausted.
fn connectivity_order(sets: &[ConstraintSet]) -> Vec<usize> {
    let mut order = Vec::with_capacity(sets.len());
    let mut visited_cells: BTreeSet<usize> = BTreeSet::new();
    let mut remaining: Vec<usize> = (0..sets.len()).collect();

    while !remaining.is_empty() {
        let next = remaining
            .iter()
            .position(|&i| sets[i].cells().iter().any(|c| visited_cells.contains(c)))
            .unwrap_or(0);
        let index = remaining.remove(next);
        visited_cells.extend(sets[index].cells().iter().copied());
        order.push(index);
    }
    order
}
