pub mod errors;

pub use errors::{CompareError, CompareErrorCategory, CompareResult};

use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub const fn cell_count(self) -> usize {
        self.rows * self.cols
    }

    pub const fn contains(self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }
}

impl Display for GridShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// One raster band as a row-major block of `f64` samples.
///
/// NaN marks missing data. A `Grid` is never mutated once built; every
/// quantized or normalized view is a fresh grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    shape: GridShape,
    data: Vec<f64>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> CompareResult<Self> {
        let shape = GridShape::new(rows, cols);
        if shape.cell_count() == 0 {
            return Err(CompareError::input_validation(
                "INPUT.EMPTY_GRID",
                format!("grid must contain at least one cell, got shape {}", shape),
            ));
        }
        if data.len() != shape.cell_count() {
            return Err(CompareError::input_validation(
                "INPUT.GRID_LENGTH",
                format!(
                    "grid shape {} needs {} samples, got {}",
                    shape,
                    shape.cell_count(),
                    data.len()
                ),
            ));
        }

        Ok(Self { shape, data })
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> CompareResult<Self> {
        let row_count = rows.len();
        let col_count = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(row_count * col_count);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != col_count {
                return Err(CompareError::input_validation(
                    "INPUT.RAGGED_GRID",
                    format!(
                        "row {} has {} samples, expected {}",
                        index + 1,
                        row.len(),
                        col_count
                    ),
                ));
            }
            data.extend(row);
        }
        Self::new(row_count, col_count, data)
    }

    /// Builds a grid of the same shape from a per-sample transform.
    pub fn map(&self, transform: impl Fn(f64) -> f64) -> Self {
        Self {
            shape: self.shape,
            data: self.data.iter().map(|&value| transform(value)).collect(),
        }
    }

    pub const fn shape(&self) -> GridShape {
        self.shape
    }

    pub const fn rows(&self) -> usize {
        self.shape.rows
    }

    pub const fn cols(&self) -> usize {
        self.shape.cols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.shape
            .contains(row, col)
            .then(|| self.data[row * self.shape.cols + col])
    }
}

pub fn ensure_same_shape(grid_a: &Grid, grid_b: &Grid) -> CompareResult<GridShape> {
    if grid_a.shape() != grid_b.shape() {
        return Err(CompareError::input_validation(
            "INPUT.SHAPE_MISMATCH",
            format!(
                "grids must have the same shape: {} vs {}",
                grid_a.shape(),
                grid_b.shape()
            ),
        ));
    }
    Ok(grid_a.shape())
}

/// Turns a pair of possibly-missing grids into a comparable pair.
///
/// Loaders that fail upstream hand over `None`; this is where that absence
/// becomes a "cannot compare" error instead of numeric work on nothing.
pub fn require_grids<'a>(
    grid_a: Option<&'a Grid>,
    grid_b: Option<&'a Grid>,
) -> CompareResult<(&'a Grid, &'a Grid)> {
    match (grid_a, grid_b) {
        (Some(grid_a), Some(grid_b)) => Ok((grid_a, grid_b)),
        (grid_a, grid_b) => {
            let missing = [("first", grid_a.is_none()), ("second", grid_b.is_none())]
                .into_iter()
                .filter_map(|(label, absent)| absent.then_some(label))
                .collect::<Vec<_>>()
                .join(" and ");
            Err(CompareError::input_validation(
                "INPUT.MISSING_GRID",
                format!("cannot compare: {} grid is not available", missing),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Grid, GridShape, ensure_same_shape, require_grids};

    #[test]
    fn from_rows_keeps_row_major_order() {
        let grid = Grid::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
            .expect("grid should build");
        assert_eq!(grid.shape(), GridShape::new(2, 3));
        assert_eq!(grid.get(1, 0), Some(4.0));
        assert_eq!(grid.get(0, 2), Some(3.0));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn ragged_and_empty_grids_are_rejected() {
        let ragged = Grid::from_rows(vec![vec![1.0, 2.0], vec![3.0]])
            .expect_err("ragged rows should fail");
        assert_eq!(ragged.placeholder(), "INPUT.RAGGED_GRID");

        let empty = Grid::from_rows(Vec::new()).expect_err("empty grid should fail");
        assert_eq!(empty.placeholder(), "INPUT.EMPTY_GRID");

        let short = Grid::new(2, 2, vec![1.0; 3]).expect_err("short data should fail");
        assert_eq!(short.placeholder(), "INPUT.GRID_LENGTH");
    }

    #[test]
    fn shape_mismatch_is_reported_with_both_shapes() {
        let grid_a = Grid::new(2, 2, vec![0.0; 4]).expect("grid should build");
        let grid_b = Grid::new(4, 1, vec![0.0; 4]).expect("grid should build");
        let error = ensure_same_shape(&grid_a, &grid_b).expect_err("shapes differ");
        assert_eq!(error.placeholder(), "INPUT.SHAPE_MISMATCH");
        assert!(error.message().contains("2x2 vs 4x1"));
    }

    #[test]
    fn missing_grids_cannot_be_compared() {
        let grid = Grid::new(1, 1, vec![1.0]).expect("grid should build");
        let error = require_grids(Some(&grid), None).expect_err("second grid missing");
        assert_eq!(error.placeholder(), "INPUT.MISSING_GRID");
        assert!(error.message().contains("second grid"));

        let error = require_grids(None, None).expect_err("both grids missing");
        assert!(error.message().contains("first and second grid"));

        assert!(require_grids(Some(&grid), Some(&grid)).is_ok());
    }
}
