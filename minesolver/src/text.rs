//! Textual board exchange.
//!
//! Input glyphs: `*` or `X` for a mine, `@` for an initially revealed free
//! cell, `1`..`8` or ` `/`0`/`.` for any other free cell (the adjacency
//! counts shown to the solver are always recomputed from the mine placement,
//! so the digit itself only marks the cell as free). `#`, the historical
//! hole marker, is rejected: every grid here is rectangular.
//!
//! Output glyphs: the adjacent-mine count for a revealed cell (blank for
//! zero), `*` for a flag, `.` for a hidden cell and `X` for a revealed mine.

use std::fmt;
use std::num::NonZeroUsize;

use thiserror::Error;

use crate::board::Board;
use crate::mine_map::MineMap;
use crate::topology::{Grid, GridSize, Layout, Wrap};

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ParseBoardError {
    #[error("board is empty")]
    Empty,
    #[error("line {line} holds {found} cells, expected {expected}")]
    RaggedLine {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("unsupported cell {glyph:?} on line {line}")]
    BadGlyph { glyph: char, line: usize },
}

/// A board description read from text: shape, mines and the cells the game
/// starts with already revealed.
#[derive(Clone, Debug)]
pub struct ParsedBoard {
    pub grid: Grid,
    pub mines: MineMap,
    pub revealed: Vec<usize>,
}

impl ParsedBoard {
    /// Builds the playable board, revealing the starting cells.
    ///
    /// Starting cells sit on free squares by construction, so revealing them
    /// cannot fail.
    pub fn into_board(self, seed: Option<u64>) -> Board {
        let mut board = match seed {
            Some(seed) => Board::from_mines_seeded(self.grid, &self.mines, seed),
            None => Board::from_mines(self.grid, &self.mines),
        };
        for cell in self.revealed {
            board
                .reveal(cell)
                .expect("parser never marks a mined cell as revealed");
        }
        board
    }
}

/// Parses the textual format into a rectangular square-layout board.
///
/// The caller may swap `grid.layout` before building when the file describes
/// a hex or wrapping board; the glyphs carry no layout information.
pub fn parse_board(input: &str) -> Result<ParsedBoard, ParseBoardError> {
    let lines: Vec<&str> = input.lines().collect();
    let height = lines.len();
    let width = lines.first().map_or(0, |line| line.chars().count());
    if width == 0 || height == 0 {
        return Err(ParseBoardError::Empty);
    }

    let mut mines = MineMap::new(width * height);
    let mut revealed = Vec::new();
    for (y, line) in lines.iter().enumerate() {
        let found = line.chars().count();
        if found != width {
            return Err(ParseBoardError::RaggedLine {
                line: y + 1,
                expected: width,
                found,
            });
        }
        for (x, glyph) in line.chars().enumerate() {
            let cell = y * width + x;
            match glyph {
                '*' | 'X' => mines.place_mine(cell),
                '@' => revealed.push(cell),
                ' ' | '.' | '0'..='8' => {}
                _ => {
                    return Err(ParseBoardError::BadGlyph {
                        glyph,
                        line: y + 1,
                    });
                }
            }
        }
    }

    let size = GridSize {
        width: NonZeroUsize::new(width).expect("width checked above"),
        height: NonZeroUsize::new(height).expect("height checked above"),
    };
    Ok(ParsedBoard {
        grid: Grid {
            size,
            layout: Layout::Square {
                wrap: Wrap::default(),
            },
        },
        mines,
        revealed,
    })
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let GridSize { width, height } = self.grid().size;
        for y in 0..height.get() {
            for x in 0..width.get() {
                let cell = self.cell(y * width.get() + x);
                let glyph = if cell.is_revealed_mine() {
                    'X'
                } else if cell.is_flagged() {
                    '*'
                } else if let Some(count) = cell.adjacent_mines() {
                    match count {
                        0 => ' ',
                        _ => char::from_digit(count as u32, 10).unwrap_or('?'),
                    }
                } else {
                    '.'
                };
                write!(f, "{glyph}")?;
            }
            if y + 1 < height.get() {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}
