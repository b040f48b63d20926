//! Text maze layouts.
//!
//! Glyphs: `%` wall, `P` pacman start, `G` ghost start, `.`, `o` and space are open
//! floor. The first text row is the top of the maze (highest `y`).

use crate::error::LayoutError;
use crate::model::grid::Grid;
use crate::model::position::Position;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    grid: Grid,
    pacman: Position,
    ghosts: Vec<Position>,
}

impl Layout {
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(LayoutError::Empty);
        };

        let width = first.chars().count();
        let height = rows.len();
        let mut grid = Grid::new(width, height);
        let mut pacman = None;
        let mut ghosts = Vec::new();

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(LayoutError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }

            let y = height - 1 - row;
            for (x, glyph) in line.chars().enumerate() {
                let position = Position::new(x, y);
                match glyph {
                    '%' => grid.set_wall(x, y, true),
                    'P' => {
                        if pacman.is_some() {
                            return Err(LayoutError::DuplicatePacman(position));
                        }
                        pacman = Some(position);
                    }
                    'G' => ghosts.push(position),
                    '.' | 'o' | ' ' => {}
                    other => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph: other,
                            position,
                        });
                    }
                }
            }
        }

        let pacman = pacman.ok_or(LayoutError::MissingPacman)?;
        // Ghost indices follow (x, y) order so agent ids are stable across renderings.
        ghosts.sort();

        Ok(Self {
            grid,
            pacman,
            ghosts,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LayoutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Keeps only the first `count` ghosts.
    pub fn with_ghost_limit(mut self, count: usize) -> Self {
        self.ghosts.truncate(count);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pacman(&self) -> Position {
        self.pacman
    }

    pub fn ghosts(&self) -> &[Position] {
        &self.ghosts
    }
}
