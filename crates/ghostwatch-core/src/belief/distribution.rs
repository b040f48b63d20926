use crate::error::FilterError;
use crate::model::grid::MazeGrid;
use crate::model::position::Position;

/// Probability mass over maze cells for a single tracked ghost.
///
/// Cells are stored column by column, so iteration order is the raster order used for
/// tie-breaking: `x` outer, `y` inner.
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefGrid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl BeliefGrid {
    /// All-zero grid; the belief carried by a removed ghost.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width * height],
        }
    }

    /// Uniform prior over the open cells of `grid`.
    pub fn uniform<G: MazeGrid + ?Sized>(grid: &G) -> Self {
        let mut belief = Self::zeros(grid.width(), grid.height());
        for x in 0..grid.width() {
            for y in 0..grid.height() {
                if !grid.is_wall(x, y) {
                    belief.cells[x * grid.height() + y] = 1.0;
                }
            }
        }
        belief.normalize();
        belief
    }

    /// Point mass on `position`.
    pub fn point(width: usize, height: usize, position: Position) -> Result<Self, FilterError> {
        let mut belief = Self::zeros(width, height);
        let index = belief
            .index(position)
            .ok_or(FilterError::OutOfBounds {
                position,
                width,
                height,
            })?;
        belief.cells[index] = 1.0;
        Ok(belief)
    }

    /// Builds a grid from column-major values (`values[x * height + y]`).
    pub fn from_columns(width: usize, height: usize, values: Vec<f64>) -> Result<Self, FilterError> {
        if values.len() != width * height {
            return Err(FilterError::LengthMismatch {
                what: "belief cells",
                expected: width * height,
                actual: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells: values,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Probability at `position`; zero outside the grid.
    pub fn probability(&self, position: Position) -> f64 {
        self.index(position)
            .map(|idx| self.cells[idx])
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.cells.iter().all(|value| *value == 0.0)
    }

    /// Iterates `(position, probability)` in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, f64)> + '_ {
        let height = self.height;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, value)| (Position::new(idx / height, idx % height), *value))
    }

    /// Most probable cell; ties resolve to the first cell in raster order.
    ///
    /// Returns `None` when the grid carries no mass.
    pub fn argmax(&self) -> Option<(Position, f64)> {
        let mut best: Option<(Position, f64)> = None;
        for (position, value) in self.iter() {
            let current = best.map(|(_, mass)| mass).unwrap_or(0.0);
            if value > current {
                best = Some((position, value));
            }
        }
        best
    }

    /// Shannon entropy in nats.
    pub fn entropy(&self) -> f64 {
        self.cells
            .iter()
            .filter(|value| **value > 0.0)
            .map(|value| -value * value.ln())
            .sum()
    }

    /// Divides by the total mass. A zero-mass grid is left untouched and `false` is
    /// returned.
    pub fn normalize(&mut self) -> bool {
        let total = self.total();
        if total == 0.0 {
            return false;
        }
        for value in &mut self.cells {
            *value /= total;
        }
        true
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [f64] {
        &mut self.cells
    }

    pub(crate) fn index(&self, position: Position) -> Option<usize> {
        if position.x >= self.width || position.y >= self.height {
            return None;
        }
        Some(position.x * self.height + position.y)
    }

    pub(crate) fn ensure_shape<G: MazeGrid + ?Sized>(&self, grid: &G) -> Result<(), FilterError> {
        if self.width != grid.width() || self.height != grid.height() {
            return Err(FilterError::DimensionMismatch {
                width: grid.width(),
                height: grid.height(),
                actual_width: self.width,
                actual_height: self.height,
            });
        }
        Ok(())
    }
}
