use std::env;
use std::fs;
use std::num::NonZeroUsize;

use anyhow::{bail, Context, Result};
use minesolver::text::parse_board;
use minesolver::{Board, Grid, GridSize, Layout, SolverError, Wrap};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut board = build_board(&args)?;
    println!("{board}");
    run(&mut board)
}

fn build_board(args: &[String]) -> Result<Board> {
    match args {
        [cmd, path] if cmd == "load" => {
            let text =
                fs::read_to_string(path).with_context(|| format!("reading board from {path}"))?;
            Ok(parse_board(&text)?.into_board(None))
        }
        [width, height, mines, rest @ ..] => {
            let width: NonZeroUsize = width.parse().context("parsing width")?;
            let height: NonZeroUsize = height.parse().context("parsing height")?;
            let mines: usize = mines.parse().context("parsing mine count")?;
            let layout = match rest {
                [] => Layout::Square {
                    wrap: Wrap::default(),
                },
                [flag] if flag == "hex" => Layout::Hex,
                [flag] if flag == "wrap" => Layout::Square {
                    wrap: Wrap { x: true, y: true },
                },
                _ => bail!("unknown layout option {rest:?}"),
            };
            let grid = Grid {
                size: GridSize { width, height },
                layout,
            };
            if mines >= grid.cell_count() {
                bail!(
                    "{mines} mines do not leave a safe opening on {} cells",
                    grid.cell_count()
                );
            }
            // Open in the middle; generation keeps it mine-free.
            let start = grid.cell_count() / 2;
            let mut board = Board::random(grid, mines, start);
            board
                .reveal(start)
                .expect("the starting cell is generated mine-free");
            Ok(board)
        }
        _ => bail!("usage: sweep WIDTH HEIGHT MINES [hex|wrap]  or  sweep load FILE"),
    }
}

fn run(board: &mut Board) -> Result<()> {
    let mut guesses = 0usize;
    while !board.is_solved() {
        let outcome = if board.has_deduction_work() {
            board.propagate_step()
        } else {
            match board.guess_best_move() {
                Ok(None) => break,
                Ok(Some(guess)) => {
                    guesses += 1;
                    println!(
                        "guessing cell {} ({:.1}% safe)",
                        guess.cell,
                        guess.success_probability * 100.0
                    );
                    Ok(true)
                }
                Err(err) => Err(err),
            }
        };
        match outcome {
            Ok(changed) => {
                if changed {
                    println!("{board}");
                }
            }
            Err(SolverError::MineHit { cell }) => {
                println!("boom: cell {cell} was mined");
                board.reveal_all();
                println!("{board}");
                return Ok(());
            }
            // An unsound deduction is an engine bug; surface it loudly.
            Err(err) => return Err(err.into()),
        }
    }
    println!(
        "solved, {} mines flagged, {guesses} guess{}",
        board.mine_count(),
        if guesses == 1 { "" } else { "es" }
    );
    Ok(())
}
