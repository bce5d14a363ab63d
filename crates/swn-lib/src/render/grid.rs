//! Value grids and the model-grid geometry they are drawn on.

use serde::Serialize;

use crate::error::{Error, Result};

/// Planar bounds `[xmin, xmax] x [ymin, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Row-major 2-D array of values. `NaN` marks a masked cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::GridShape {
                expected_rows: rows,
                expected_cols: cols,
                rows: data.len() / cols.max(1),
                cols,
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Grid with every cell masked.
    pub fn masked(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, f64::NAN)
    }

    /// Masked grid with the given cells set, e.g. reach values on their cells.
    pub fn from_cells<I>(rows: usize, cols: usize, cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = ((usize, usize), f64)>,
    {
        let mut grid = Self::masked(rows, cols);
        for ((row, col), value) in cells {
            grid.set(row, col, value)?;
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::CellOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    /// Unmasked, finite values.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied().filter(|value| value.is_finite())
    }
}

/// Geometry of the model grid layers are drawn on.
pub trait ModelGrid {
    /// `(rows, cols)` of cells.
    fn shape(&self) -> (usize, usize);

    /// Cell-corner x coordinates, `(rows + 1) x (cols + 1)`.
    fn x_vertices(&self) -> Grid;

    /// Cell-corner y coordinates, `(rows + 1) x (cols + 1)`.
    fn y_vertices(&self) -> Grid;

    fn extent(&self) -> Extent;
}

/// Structured grid with uniform cells, origin at the upper-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularGrid {
    pub rows: usize,
    pub cols: usize,
    pub x_origin: f64,
    pub y_origin: f64,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl RegularGrid {
    fn corners(&self, coordinate: impl Fn(usize, usize) -> f64) -> Grid {
        let (rows, cols) = (self.rows + 1, self.cols + 1);
        let data = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .map(|(row, col)| coordinate(row, col))
            .collect();
        Grid { rows, cols, data }
    }
}

impl ModelGrid for RegularGrid {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn x_vertices(&self) -> Grid {
        self.corners(|_, col| self.x_origin + col as f64 * self.cell_width)
    }

    fn y_vertices(&self) -> Grid {
        self.corners(|row, _| self.y_origin - row as f64 * self.cell_height)
    }

    fn extent(&self) -> Extent {
        Extent {
            xmin: self.x_origin,
            xmax: self.x_origin + self.cols as f64 * self.cell_width,
            ymin: self.y_origin - self.rows as f64 * self.cell_height,
            ymax: self.y_origin,
        }
    }
}
