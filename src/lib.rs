#![warn(missing_docs)]

//! # `nurikabe`
//!
//! A solver for [Nurikabe](https://en.wikipedia.org/wiki/Nurikabe_(puzzle)) and its generalizations to arbitrary graphs.
//! Begin by building a board, either on any [`petgraph`] graph with [`Board::build`] or on a rectangular grid with a
//! [`SquareBoardBuilder`](builder::SquareBoardBuilder), place its anchors, then call [`solve()`](crate::Board::solve)
//! to enumerate every solution.
//!
//! # Rules
//! Every node of the graph is labeled water or land. A handful of land nodes are *anchors*, each carrying a size.
//! A labeling is a solution when:
//! 1. every island, i.e. maximal connected piece of land, contains exactly one anchor and has that anchor's size;
//! 2. no *pool* exists: no cycle of minimal length (the *girth* of the graph) is entirely water. On a square grid the
//!    girth is 4 and pools are the familiar 2×2 blocks of water;
//! 3. all water is connected.
//!
//! # Internals
//! The solver is an exhaustive depth-first search. Each step labels one empty node, first water then land, and keeps
//! the label only if the partial labeling can still be completed as far as cheap checks can tell: islands must not
//! join anchors or outgrow them and must keep room to grow, no pool may be closed, and the water, together with
//! every empty node, must still be connected. Givens are checked once before the search starts. Because all checks
//! run on every step, a board with no empty nodes left is a solution.
//!
//! Which node to branch on is chosen by propagation: nodes around islands that are full, islands with a single way to
//! grow, and nodes two islands compete for are decided first, since one of their labels usually fails immediately.
//! Otherwise nodes are taken in a fixed breadth-first order.
//!
//! Everything the search needs to know about the graph itself, namely its shortest cycles and that order, is
//! computed once when the board is built.

pub use board::{Board, BoardOptions, Island};
pub use builder::SquareBoardBuilder;
pub use cell::{Cell, IslandSize, Label};
pub use error::{ConstructionError, Defect, InvariantViolation};
pub use grid::{GridBoard, GridSolution};
pub use location::{Dimension, Location};
pub use metrics::AcyclicPolicy;
pub use solution::Solution;
pub use solver::{SearchStats, Solver};

pub(crate) mod board;
mod tests;
pub(crate) mod cell;
pub(crate) mod error;
pub(crate) mod grid;
pub(crate) mod location;
pub(crate) mod metrics;
pub mod shape;
pub mod builder;
pub mod cryptic;
pub(crate) mod solution;
pub(crate) mod solver;
