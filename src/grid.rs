use std::fmt::{Display, Formatter};

use ndarray::Array2;

use crate::board::Board;
use crate::cell::size_glyph;
use crate::location::{Dimension, Location};
use crate::shape::SquareStep;
use crate::solution::Solution;
use crate::solver::Solver;

// drawn where a hole was dropped from the grid
const HOLE: char = ' ';

fn render(dims: (Dimension, Dimension), glyph: impl Fn(Location) -> Option<char>) -> String {
    let cells = Array2::from_shape_fn((dims.1.get(), dims.0.get()), |ind| glyph(Location::from(ind)).unwrap_or(HOLE));
    SquareStep::print(&cells)
}

/// A [`Board`] laid out on a rectangular grid, as made by a [`SquareBoardBuilder`](crate::builder::SquareBoardBuilder).
///
/// Displays as one line per row: `.` empty, `#` water, `+` land, and anchors by their size.
#[derive(Clone, Debug)]
pub struct GridBoard {
    board: Board<Location>,
    dims: (Dimension, Dimension),
}

impl GridBoard {
    pub(crate) fn new(board: Board<Location>, dims: (Dimension, Dimension)) -> Self {
        Self { board, dims }
    }

    /// The dimensions of the grid, in `(x, y)` order.
    pub fn dims(&self) -> (Dimension, Dimension) {
        self.dims
    }

    /// The underlying board.
    pub fn board(&self) -> &Board<Location> {
        &self.board
    }

    /// The underlying board, for labeling cells by hand.
    pub fn board_mut(&mut self) -> &mut Board<Location> {
        &mut self.board
    }

    /// Find every solution; see [`Board::solve`].
    pub fn solve(&mut self) -> Vec<GridSolution> {
        let dims = self.dims;
        self.board.solve()
            .into_iter()
            .map(|solution| GridSolution { solution, dims })
            .collect()
    }

    /// A lazy search over the solutions of the underlying board; see [`Solver`].
    pub fn solver(&mut self) -> Solver<'_, Location> {
        self.board.solver()
    }

    /// Lay `solution`, found on this board, out on its grid.
    pub fn frame(&self, solution: Solution<Location>) -> GridSolution {
        GridSolution { solution, dims: self.dims }
    }
}

impl Display for GridBoard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", render(self.dims, |location| self.board.get(location).map(|cell| cell.glyph())))
    }
}

/// A [`Solution`] of a [`GridBoard`], displayed the same way as the board.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct GridSolution {
    solution: Solution<Location>,
    dims: (Dimension, Dimension),
}

impl GridSolution {
    /// The labeling itself.
    pub fn solution(&self) -> &Solution<Location> {
        &self.solution
    }

    /// Unwrap the labeling.
    pub fn into_solution(self) -> Solution<Location> {
        self.solution
    }
}

impl Display for GridSolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", render(self.dims, |location| match self.solution.anchor(location) {
            Some(size) => Some(size_glyph(size)),
            None => self.solution.label(location).map(|label| label.glyph()),
        }))
    }
}
