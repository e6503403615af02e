//! Flat board storage and the win-line scanner.

use gridline_protocol::{Figure, Orientation, WinLine};

use crate::RoomError;

/// Scan order at each anchor.
const ORIENTATIONS: [Orientation; 4] = [
    Orientation::Horizontal,
    Orientation::Vertical,
    Orientation::Diagonal,
    Orientation::AntiDiagonal,
];

/// A square board of `cell_count × cell_count` figures.
///
/// Coordinates are `(i, j)` = (column, row); cell `(i, j)` is stored at
/// `j * cell_count + i`. A written cell is never overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cell_count: usize,
    win_count: usize,
    cells: Vec<Figure>,
}

impl Grid {
    /// Creates an empty board. Callers pass validated template values.
    pub fn new(cell_count: usize, win_count: usize) -> Self {
        Self {
            cell_count,
            win_count,
            cells: vec![0; cell_count * cell_count],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Row-major cell markers.
    pub fn cells(&self) -> &[Figure] {
        &self.cells
    }

    fn index(&self, i: usize, j: usize) -> Option<usize> {
        (i < self.cell_count && j < self.cell_count).then(|| j * self.cell_count + i)
    }

    /// Returns the figure at `(i, j)`, or `None` outside the board.
    pub fn get(&self, i: usize, j: usize) -> Option<Figure> {
        self.index(i, j).map(|idx| self.cells[idx])
    }

    /// Writes `figure` into an empty cell.
    pub fn set(&mut self, i: usize, j: usize, figure: Figure) -> Result<(), RoomError> {
        let idx = self.index(i, j).ok_or(RoomError::OutOfBounds {
            i: i as i64,
            j: j as i64,
        })?;
        if self.cells[idx] != 0 {
            return Err(RoomError::CellOccupied { i, j });
        }
        self.cells[idx] = figure;
        Ok(())
    }

    /// Returns `true` once no empty cell is left.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != 0)
    }

    /// Finds the first run of `win_count` cells holding `figure`.
    ///
    /// Anchors (the top-left corner of the run's square window) are
    /// visited row by row, column by column; at each anchor the
    /// orientations are tried in the order horizontal, vertical, diagonal,
    /// anti-diagonal. The result is therefore deterministic when several
    /// lines complete at once.
    pub fn scan_for_win(&self, figure: Figure) -> Option<WinLine> {
        if figure == 0 || self.win_count == 0 || self.win_count > self.cell_count {
            return None;
        }

        for row in 0..self.cell_count {
            for col in 0..self.cell_count {
                for orientation in ORIENTATIONS {
                    if self.run_matches(orientation, row, col, figure) {
                        return Some(WinLine {
                            orientation,
                            row,
                            col,
                        });
                    }
                }
            }
        }
        None
    }

    fn run_matches(&self, orientation: Orientation, row: usize, col: usize, figure: Figure) -> bool {
        let w = self.win_count;
        let fits_right = col + w <= self.cell_count;
        let fits_down = row + w <= self.cell_count;
        let in_bounds = match orientation {
            Orientation::Horizontal => fits_right,
            Orientation::Vertical => fits_down,
            Orientation::Diagonal | Orientation::AntiDiagonal => fits_right && fits_down,
        };
        if !in_bounds {
            return false;
        }

        (0..w).all(|k| {
            let (i, j) = match orientation {
                Orientation::Horizontal => (col + k, row),
                Orientation::Vertical => (col, row + k),
                Orientation::Diagonal => (col + k, row + k),
                Orientation::AntiDiagonal => (col + w - 1 - k, row + k),
            };
            self.get(i, j) == Some(figure)
        })
    }
}
