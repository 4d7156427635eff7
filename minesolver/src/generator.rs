use rand::{seq::IteratorRandom, Rng};

use crate::mine_map::MineMap;

/// Places `mine_count` mines uniformly at random over the cells not listed in
/// `exclude`.
///
/// `exclude` is typically the set of initially revealed cells; a mine may
/// never sit under a cell that is already showing a count.
///
/// # Panics
///
/// Panics if more mines are requested than there are eligible cells.
pub fn random_mines(
    cell_count: usize,
    mine_count: usize,
    exclude: &[usize],
    rng: &mut impl Rng,
) -> MineMap {
    let picked = (0..cell_count)
        .filter(|cell| !exclude.contains(cell))
        .choose_multiple(rng, mine_count);
    assert_eq!(
        picked.len(),
        mine_count,
        "not enough eligible cells for {mine_count} mines"
    );

    let mut map = MineMap::new(cell_count);
    for cell_index in picked {
        map.place_mine(cell_index);
    }
    map
}
