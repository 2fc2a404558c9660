//! Puzzles whose island sizes are partly unknown.
//!
//! In a cryptic layout, each lowercase letter stands for an anchor of unknown size, and equal letters stand for equal
//! sizes. Solving one means solving the plain puzzle for every assignment of sizes to letters.

use std::iter;
use std::num::NonZero;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use itertools::{Either, Itertools};
use log::debug;

use crate::builder::{parse_layout, BuildError, ParseError, SquareBoardBuilder};
use crate::cell::IslandSize;
use crate::grid::GridSolution;
use crate::location::Location;

const DEFAULT_MAX_SIZE: usize = 9;

/// The solutions found for one assignment of sizes to letters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CrypticSolution {
    /// Each letter with the size it was given, in order of first appearance in the layout.
    pub assignment: Vec<(char, IslandSize)>,
    /// Every solution of the puzzle under this assignment.
    pub solutions: Vec<GridSolution>,
}

/// A parsed cryptic layout, ready to be solved.
#[derive(Clone, Debug)]
pub struct Cryptic {
    builder: SquareBoardBuilder,
    letters: Vec<(Location, char)>,
    max_size: IslandSize,
    cancel: Option<Arc<AtomicBool>>,
}

impl Cryptic {
    /// Parse `layout` like any [`SquareBoardBuilder`] layout, except that lowercase letters are unknowns rather than
    /// anchors of size 10 and up.
    pub fn parse(layout: &str) -> Result<Self, ParseError> {
        let (builder, letters) = parse_layout(layout, true)?;
        Ok(Self {
            builder,
            letters,
            max_size: NonZero::<usize>::MIN.saturating_add(DEFAULT_MAX_SIZE - 1),
            cancel: None,
        })
    }

    /// Try sizes from 1 up to `max_size` for each letter instead of the default of 9.
    pub fn with_max_size(mut self, max_size: IslandSize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Share `flag` with every search; once it is raised, no further assignments are tried and the results so far
    /// are returned.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The distinct letters of the layout, in order of first appearance.
    pub fn unknowns(&self) -> Vec<char> {
        self.letters.iter().map(|(_, letter)| *letter).unique().collect_vec()
    }

    /// Solve the puzzle under every assignment of sizes, keeping only the assignments which have solutions.
    ///
    /// Assignments are tried in lexicographic order: the first letter varies slowest.
    pub fn solve(&self) -> Result<Vec<CrypticSolution>, BuildError> {
        let unknowns = self.unknowns();
        let sizes = (1..=self.max_size.get()).filter_map(NonZero::new).collect_vec();

        // generated lazily; there are max_size^k of them for k letters
        let assignments = if unknowns.is_empty() {
            Either::Left(iter::once(Vec::<IslandSize>::new()))
        } else {
            Either::Right(unknowns.iter().map(|_| sizes.iter().copied()).multi_cartesian_product())
        };

        let mut found = Vec::new();
        for values in assignments {
            if self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                debug!("cryptic search cancelled");
                break;
            }
            let assignment = unknowns.iter().copied().zip(values).collect_vec();

            let mut builder = self.builder.clone();
            for (location, letter) in &self.letters {
                if let Some((_, size)) = assignment.iter().find(|(unknown, _)| unknown == letter) {
                    builder.add_anchor(*location, *size);
                }
            }

            let mut board = builder.build()?;
            let mut solver = board.solver();
            if let Some(flag) = &self.cancel {
                solver = solver.with_cancel_flag(Arc::clone(flag));
            }
            let labelings = solver.collect_vec();
            let solutions = labelings.into_iter().map(|solution| board.frame(solution)).collect_vec();
            debug!("{} solutions with {:?}", solutions.len(), assignment);
            if !solutions.is_empty() {
                found.push(CrypticSolution { assignment, solutions });
            }
        }

        Ok(found)
    }
}
