use std::num::NonZeroUsize;

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

impl GridPos {
    pub fn from_cell_index(cell_index: usize, size: GridSize) -> Option<Self> {
        let y = cell_index / size.width;
        (y < size.height.get()).then(|| Self {
            x: cell_index % size.width,
            y,
        })
    }

    pub fn to_cell_index(self, size: GridSize) -> Option<usize> {
        (self.x < size.width.get() && self.y < size.height.get())
            .then(|| self.x + self.y * size.width.get())
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GridSize {
    pub width: NonZeroUsize,
    pub height: NonZeroUsize,
}

impl GridSize {
    /// Returns the x position to the left of the given position, if any.
    ///
    /// Wraps around if `wrap` is `true`; otherwise returns [`None`] in that case.
    fn left(self, x: usize, wrap: bool) -> Option<usize> {
        assert!(x < self.width.get());
        x.checked_sub(1)
            .or_else(|| wrap.then(|| self.width.get() - 1))
    }

    /// Returns the x position to the right of the given position, if any.
    ///
    /// Wraps around if `wrap` is `true`; otherwise returns [`None`] in that case.
    fn right(self, x: usize, wrap: bool) -> Option<usize> {
        assert!(x < self.width.get());
        (x < self.width.get() - 1)
            .then(|| x + 1)
            .or_else(|| wrap.then_some(0))
    }

    /// Returns the y position above the given position, if any.
    ///
    /// Wraps around if `wrap` is `true`; otherwise returns [`None`] in that case.
    fn above(self, y: usize, wrap: bool) -> Option<usize> {
        assert!(y < self.height.get());
        y.checked_sub(1)
            .or_else(|| wrap.then(|| self.height.get() - 1))
    }

    /// Returns the y position below the given position, if any.
    ///
    /// Wraps around if `wrap` is `true`; otherwise returns [`None`] in that case.
    fn below(self, y: usize, wrap: bool) -> Option<usize> {
        assert!(y < self.height.get());
        (y < self.height.get() - 1)
            .then(|| y + 1)
            .or_else(|| wrap.then_some(0))
    }
}

/// Whether the grid wraps to the opposite side at edges instead of cutting off.
///
/// Defaults to `false` for both horizontal and vertical wrapping.
#[derive(Clone, Copy, Default, Debug, Hash, PartialEq, Eq)]
pub struct Wrap {
    /// Whether cells wrap around horizontally.
    pub x: bool,
    /// Whether cells wrap around vertically.
    pub y: bool,
}

/// How cells of the rectangular index space connect to each other.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Layout {
    /// The classical 8-neighbour square grid, optionally wrapping at edges.
    Square { wrap: Wrap },
    /// A hexagonal lattice stored in offset coordinates: every cell has up to
    /// six neighbours, with odd rows shifted half a cell to the right.
    Hex,
}

/// A board shape: a `width` by `height` index space plus a [`Layout`] deciding
/// adjacency. Deliberately dumb; it produces neighbour lists once and the
/// engine never asks again.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Grid {
    pub size: GridSize,
    pub layout: Layout,
}

impl Grid {
    pub fn square(width: NonZeroUsize, height: NonZeroUsize) -> Self {
        Self {
            size: GridSize { width, height },
            layout: Layout::Square {
                wrap: Wrap::default(),
            },
        }
    }

    pub fn cell_count(&self) -> usize {
        self.size.width.get() * self.size.height.get()
    }

    /// The neighbours of a cell, sorted and without duplicates.
    ///
    /// Deduplication matters for wrapped grids: on a 2-wide wrapping board the
    /// left and right neighbour are the same cell and must count once.
    pub fn neighbours(&self, cell_index: usize) -> Vec<usize> {
        let pos = GridPos::from_cell_index(cell_index, self.size)
            .expect("cell_index should be within the grid");
        let mut neighbours: Vec<usize> = match self.layout {
            Layout::Square { wrap } => self.square_neighbours(pos, wrap).collect(),
            Layout::Hex => self.hex_neighbours(pos).collect(),
        };
        neighbours.sort_unstable();
        neighbours.dedup();
        neighbours.retain(|&n| n != cell_index);
        neighbours
    }

    /// Neighbour lists for every cell of the grid at once.
    pub fn all_neighbours(&self) -> Vec<Vec<usize>> {
        (0..self.cell_count()).map(|i| self.neighbours(i)).collect()
    }

    fn square_neighbours(&self, pos: GridPos, wrap: Wrap) -> impl Iterator<Item = usize> {
        let GridPos { x, y } = pos;
        let size = self.size;

        let left = size.left(x, wrap.x);
        let right = size.right(x, wrap.x);
        let above = size.above(y, wrap.y);
        let below = size.below(y, wrap.y);

        [
            left.zip(above),
            above.map(|y| (x, y)),
            right.zip(above),
            left.map(|x| (x, y)),
            right.map(|x| (x, y)),
            left.zip(below),
            below.map(|y| (x, y)),
            right.zip(below),
        ]
        .into_iter()
        .flatten()
        .map(move |(x, y)| {
            GridPos { x, y }
                .to_cell_index(size)
                .expect("adjacent grid pos should be within bounds")
        })
    }

    fn hex_neighbours(&self, pos: GridPos) -> impl Iterator<Item = usize> {
        let GridPos { x, y } = pos;
        let size = self.size;
        // Offset coordinates: a cell in an odd row touches the two cells at
        // x and x + 1 in the rows above and below; in an even row it touches
        // x - 1 and x. Same-row neighbours are always x - 1 and x + 1.
        let shift = y % 2;

        let above = size.above(y, false);
        let below = size.below(y, false);
        let near = |x: usize, dx: usize| (x + shift + dx).checked_sub(1).filter(|&x| x < size.width.get());

        [
            above.and_then(|y| near(x, 0).map(|x| (x, y))),
            above.and_then(|y| near(x, 1).map(|x| (x, y))),
            size.left(x, false).map(|x| (x, y)),
            size.right(x, false).map(|x| (x, y)),
            below.and_then(|y| near(x, 0).map(|x| (x, y))),
            below.and_then(|y| near(x, 1).map(|x| (x, y))),
        ]
        .into_iter()
        .flatten()
        .map(move |(x, y)| {
            GridPos { x, y }
                .to_cell_index(size)
                .expect("adjacent grid pos should be within bounds")
        })
    }
}
