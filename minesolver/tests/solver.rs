use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use num_bigint::BigUint;
use num_traits::Zero;
use rand::{rngs::StdRng, SeedableRng};

use minesolver::binom::binomial;
use minesolver::cell::CellArena;
use minesolver::frontier::Frontier;
use minesolver::generator::random_mines;
use minesolver::hypothesis::MineState;
use minesolver::text::parse_board;
use minesolver::{Board, Grid, GridSize, Layout, SolverError, Wrap};

fn grid(width: usize, height: usize, layout: Layout) -> Grid {
    Grid {
        size: GridSize {
            width: NonZeroUsize::new(width).unwrap(),
            height: NonZeroUsize::new(height).unwrap(),
        },
        layout,
    }
}

fn square(width: usize, height: usize) -> Grid {
    grid(
        width,
        height,
        Layout::Square {
            wrap: Wrap::default(),
        },
    )
}

fn arena_with_mines(grid: &Grid, mines: &[usize]) -> CellArena {
    let neighbours = grid.all_neighbours();
    let mined: Vec<bool> = (0..grid.cell_count()).map(|i| mines.contains(&i)).collect();
    let adjacent: Vec<usize> = neighbours
        .iter()
        .map(|cells| cells.iter().filter(|&&n| mined[n]).count())
        .collect();
    CellArena::new(&mined, &adjacent, neighbours)
}

/// Every assignment over `cells` that satisfies every revealed clue exactly.
fn brute_force(arena: &CellArena, revealed: &[usize], cells: &[usize]) -> BTreeSet<Vec<bool>> {
    assert!(cells.len() <= 15, "brute force only covers small frontiers");
    let mut valid = BTreeSet::new();
    for mask in 0u32..(1 << cells.len()) {
        let assignment: Vec<bool> = (0..cells.len()).map(|i| mask & (1 << i) != 0).collect();
        let mine_at = |cell: usize| {
            cells
                .iter()
                .position(|&c| c == cell)
                .map(|i| assignment[i])
        };
        let ok = revealed.iter().all(|&clue| {
            let needed = arena.get(clue).adjacent_mines().unwrap()
                - arena.flagged_neighbour_count(clue);
            let placed = arena
                .unresolved_neighbours(clue)
                .filter(|&n| mine_at(n) == Some(true))
                .count();
            placed == needed
        });
        if ok {
            valid.insert(assignment);
        }
    }
    valid
}

#[test]
fn deduction_is_sound_across_random_boards() {
    let configs = [
        (
            square(8, 8),
            10,
        ),
        (grid(7, 7, Layout::Hex), 8),
        (
            grid(
                6,
                6,
                Layout::Square {
                    wrap: Wrap { x: true, y: true },
                },
            ),
            7,
        ),
    ];
    for (grid, mine_count) in configs {
        for seed in 0..50 {
            let start = grid.cell_count() / 2;
            let mut board = Board::random_seeded(grid, mine_count, start, seed);
            board.reveal(start).unwrap();
            match board.solve() {
                Ok(_) => assert!(board.is_solved()),
                // Losing a guess is a legitimate outcome of fuzzing; an
                // unsound deduction never is.
                Err(SolverError::MineHit { .. }) => {}
                Err(err) => panic!("seed {seed}: {err}"),
            }
        }
    }
}

#[test]
fn enumeration_matches_brute_force() {
    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mines = random_mines(16, 3, &[], &mut rng);
        let mine_cells: Vec<usize> = mines.mined_cells().collect();
        let mut arena = arena_with_mines(&square(4, 4), &mine_cells);

        let mut revealed = Vec::new();
        for cell in (0..16).step_by(2) {
            if !mines.is_mine(cell) {
                arena.reveal(cell).unwrap();
                revealed.push(cell);
            }
        }
        let mut frontier = Frontier::new();
        for &cell in &revealed {
            frontier.absorb(&arena, Frontier::seed(&arena, cell));
        }

        let enumeration = frontier.enumerate();
        for &clue in &revealed {
            for neighbour in arena.unresolved_neighbours(clue) {
                assert!(enumeration.cells.contains(&neighbour));
            }
        }

        let from_engine: BTreeSet<Vec<bool>> = enumeration
            .hypotheses
            .iter()
            .map(|hypothesis| {
                (0..enumeration.cells.len())
                    .map(|i| hypothesis.state(i) == MineState::Mine)
                    .collect()
            })
            .collect();
        assert_eq!(
            from_engine.len(),
            enumeration.hypotheses.len(),
            "seed {seed}: duplicate hypotheses"
        );
        let expected = brute_force(&arena, &revealed, &enumeration.cells);
        assert_eq!(from_engine, expected, "seed {seed}");
        // The real mine placement is always among the hypotheses.
        let truth: Vec<bool> = enumeration
            .cells
            .iter()
            .map(|&cell| mines.is_mine(cell))
            .collect();
        assert!(from_engine.contains(&truth), "seed {seed}");
    }
}

#[test]
fn hypothesis_weights_conserve_the_budget() {
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mines = random_mines(25, 4, &[12], &mut rng);
        let mine_cells: Vec<usize> = mines.mined_cells().collect();
        let mut arena = arena_with_mines(&square(5, 5), &mine_cells);
        arena.reveal(12).unwrap();
        let frontier = Frontier::seed(&arena, 12);
        let enumeration = frontier.enumerate();

        let budget = 4usize;
        let bulk_size = arena
            .unresolved_cells()
            .filter(|&cell| !enumeration.cells.contains(&cell))
            .count();

        let mut total = BigUint::zero();
        let mut edge_mines_weighted = BigUint::zero();
        let mut bulk_mines_weighted = BigUint::zero();
        let mut skipped = false;
        for hypothesis in &enumeration.hypotheses {
            let edge_mines = hypothesis.mine_count();
            if edge_mines > budget {
                skipped = true;
                continue;
            }
            let in_bulk = budget - edge_mines;
            if in_bulk > bulk_size {
                skipped = true;
            }
            let weight = binomial(bulk_size, in_bulk);
            edge_mines_weighted += &weight * edge_mines;
            bulk_mines_weighted += &weight * in_bulk;
            total += weight;
        }

        assert!(!total.is_zero(), "seed {seed}: the true placement is feasible");
        let lhs = &edge_mines_weighted + &bulk_mines_weighted;
        let rhs = &total * budget;
        assert!(lhs <= rhs, "seed {seed}");
        if !skipped {
            assert_eq!(lhs, rhs, "seed {seed}");
        }
    }
}

#[test]
fn loaded_board_is_solved_without_guessing() {
    // Opening in the corner cascades across the zero region; the lone mine
    // in the far corner is then pinned by its three "1" neighbours.
    let text = "@...\n....\n....\n...*";
    let mut board = parse_board(text).unwrap().into_board(Some(7));
    let stats = board.solve().unwrap();
    assert!(board.is_solved());
    assert_eq!(stats.guesses, 0);
    assert!(board.cell(15).is_flagged());
}

#[test]
fn wrapped_layout_changes_the_deduction() {
    // On a wrapping 3x3 every cell neighbours every other, so a single clue
    // constrains the whole board at once.
    let g = grid(
        3,
        3,
        Layout::Square {
            wrap: Wrap { x: true, y: true },
        },
    );
    let mut map = minesolver::MineMap::new(9);
    map.place_mine(8);
    let mut board = Board::from_mines_seeded(g, &map, 0);
    board.reveal(0).unwrap();
    assert_eq!(board.cell(0).adjacent_mines(), Some(1));
    board.propagate_all().unwrap();
    // One mine among eight: no certainty, the frontier covers everything.
    assert!(!board.is_solved());
    for cell in 1..9 {
        assert!(board.is_frontier_cell(cell));
    }
}

#[test]
fn hex_corner_board_solves_by_deduction() {
    // Hex 3x3, mine at the far corner 8. Cell 4's lattice neighbours on an
    // odd row include 8, its "1" plus the surrounding zeros pin the flag.
    let g = grid(3, 3, Layout::Hex);
    let mut map = minesolver::MineMap::new(9);
    map.place_mine(8);
    let mut board = Board::from_mines_seeded(g, &map, 0);
    board.reveal(0).unwrap();
    board.propagate_all().unwrap();
    assert!(board.is_solved());
    assert!(board.cell(8).is_flagged());
}
