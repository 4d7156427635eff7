use std::fmt;

/// What a [`Hypothesis`] claims about one frontier cell.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum MineState {
    Mine,
    Clear,
    /// No constraint processed so far says anything about the cell.
    #[default]
    Undetermined,
}

impl MineState {
    /// Combines two claims about the same cell, [`None`] on contradiction.
    fn merge(self, other: Self) -> Option<Self> {
        match (self, other) {
            (MineState::Undetermined, other) => Some(other),
            (state, MineState::Undetermined) => Some(state),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }
}

/// One mine/clear assignment over the frontier's shared cell order.
///
/// The cell order itself lives with the enumeration, not here; a hypothesis is
/// just the per-position states, so merging is a cheap zip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hypothesis {
    states: Vec<MineState>,
}

impl Hypothesis {
    /// A hypothesis claiming nothing about any of `len` cells.
    pub fn undetermined(len: usize) -> Self {
        Self {
            states: vec![MineState::Undetermined; len],
        }
    }

    pub fn state(&self, position: usize) -> MineState {
        self.states[position]
    }

    pub fn set(&mut self, position: usize, state: MineState) {
        self.states[position] = state;
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Two hypotheses are compatible iff no position carries contradicting
    /// determined states; the merge keeps the more determined claim per
    /// position.
    pub fn merge(&self, other: &Self) -> Option<Self> {
        debug_assert_eq!(self.states.len(), other.states.len());
        let states = self
            .states
            .iter()
            .zip(&other.states)
            .map(|(&a, &b)| a.merge(b))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { states })
    }

    /// The number of determined mines.
    pub fn mine_count(&self) -> usize {
        self.states
            .iter()
            .filter(|&&s| s == MineState::Mine)
            .count()
    }

    pub fn is_fully_determined(&self) -> bool {
        self.states
            .iter()
            .all(|&s| s != MineState::Undetermined)
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &state in &self.states {
            f.write_str(match state {
                MineState::Mine => "X",
                MineState::Clear => "O",
                MineState::Undetermined => "?",
            })?;
        }
        Ok(())
    }
}
