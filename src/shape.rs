//! Step directions for grid boards.

use ndarray::Array2;
use strum::VariantArray;

use crate::location::Location;

/// A direction of travel between adjacent cells of a square grid.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum SquareStep {
    /// Toward row 0.
    Up,
    /// Away from row 0.
    Down,
    /// Toward column 0.
    Left,
    /// Away from column 0.
    Right,
}

impl SquareStep {
    /// Directions which, taken from a location, land on a location later in row-major order.
    ///
    /// Walking only these from every cell visits every grid edge exactly once.
    pub const FORWARD_VARIANTS: &'static [Self] = &[Self::Right, Self::Down];

    /// The location one step from `location` in this direction.
    ///
    /// Steps off the top or left edge wrap around to huge coordinates, which any bounds check rejects.
    pub fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Up => location.offset_by((0, -1)),
            Self::Down => location.offset_by((0, 1)),
            Self::Left => location.offset_by((-1, 0)),
            Self::Right => location.offset_by((1, 0)),
        }
    }

    /// Determine the direction from `a` to `b`, if they are adjacent on the grid.
    pub fn direction_to(a: Location, b: Location) -> Option<Self> {
        Self::VARIANTS.iter().find(|dir| dir.attempt_from(a) == b).copied()
    }

    /// Lay out the characters of `board` row by row, one line per row.
    pub(crate) fn print(board: &Array2<char>) -> String {
        let mut out = String::with_capacity(board.nrows() * (board.ncols() + 1));

        for row in board.rows() {
            for col in row {
                out.push(*col);
            }
            out.push('\n');
        }

        out
    }
}
