use crate::model::position::Position;
use serde::{Deserialize, Serialize};

/// Read-only maze geometry consumed by the belief filter and the planner.
pub trait MazeGrid {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Out-of-bounds coordinates are reported as walls.
    fn is_wall(&self, x: usize, y: usize) -> bool;

    fn contains(&self, position: Position) -> bool {
        position.x < self.width() && position.y < self.height()
    }

    fn is_open(&self, position: Position) -> bool {
        self.contains(position) && !self.is_wall(position.x, position.y)
    }
}

/// Dense wall grid, stored column by column (`x` outer, `y` inner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    walls: Vec<bool>,
}

impl Grid {
    /// Creates an open grid without any walls.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            walls: vec![false; width * height],
        }
    }

    /// Creates a grid whose outer ring is walled off.
    pub fn bordered(width: usize, height: usize) -> Self {
        let mut grid = Self::new(width, height);
        for x in 0..width {
            for y in 0..height {
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    grid.set_wall(x, y, true);
                }
            }
        }
        grid
    }

    pub fn set_wall(&mut self, x: usize, y: usize, wall: bool) {
        if let Some(index) = self.index(x, y) {
            self.walls[index] = wall;
        }
    }

    pub fn with_walls<I>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        for cell in cells {
            self.set_wall(cell.x, cell.y, true);
        }
        self
    }

    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.width).flat_map(move |x| {
            (0..self.height)
                .map(move |y| Position::new(x, y))
                .filter(move |pos| !self.is_wall(pos.x, pos.y))
        })
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(x * self.height + y)
    }
}

impl MazeGrid for Grid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn is_wall(&self, x: usize, y: usize) -> bool {
        self.index(x, y).map(|idx| self.walls[idx]).unwrap_or(true)
    }
}
