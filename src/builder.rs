//! Builders for grid boards.

use std::collections::HashSet;
use std::num::NonZero;
use std::ops::IndexMut;
use std::str::FromStr;

use itertools::Itertools;
use ndarray::{Array2, AssignElem};
use petgraph::graphmap::UnGraphMap;
use thiserror::Error;
use unordered_pair::UnorderedPair;

use crate::board::{Board, BoardOptions};
use crate::cell::{glyph_size, Cell, IslandSize, Label};
use crate::error::ConstructionError;
use crate::grid::GridBoard;
use crate::location::{Dimension, Location};
use crate::metrics::AcyclicPolicy;
use crate::shape::SquareStep;

/// Why a [`SquareBoardBuilder`] stopped accepting features.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// A feature referred to a location outside the grid.
    FeatureOutOfBounds,
    /// An anchor or given landed on a location which already holds one.
    FeatureOverlap,
}

/// Reasons [`SquareBoardBuilder::build`] may fail.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BuildError {
    /// The builder was invalidated while building.
    #[error("builder is invalid: {0:?}")]
    Invalid(Vec<BuilderInvalidReason>),
    /// The grid could not be made into a board.
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

/// Reasons a text layout may not parse into a [`SquareBoardBuilder`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    /// The layout has no rows.
    #[error("layout is empty")]
    Empty,
    /// Some row is not as wide as the first.
    #[error("row {row} has width {found}, but the first row has width {expected}")]
    RaggedRows {
        /// Index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A character stands for no kind of cell.
    #[error("bad character {0:?}")]
    BadCharacter(char),
}

/// Assembles a [`GridBoard`] on a rectangular grid, the shape Nurikabe is usually played on.
///
/// Besides anchors, a grid may carry givens (cells fixed as water or land), holes (locations left out of the graph)
/// and walls (adjacent locations left unconnected). The first mistake, such as a feature off the grid, is recorded
/// and turns every later call into a no-op; [`build`](Self::build) then reports it.
///
/// Clone a builder to branch off variants of a puzzle.
#[derive(Clone, Debug)]
pub struct SquareBoardBuilder {
    // width, height
    dims: (Dimension, Dimension),
    cells: Array2<Cell>,
    anchor_order: Vec<Location>,
    invalid_reasons: Vec<BuilderInvalidReason>,
    // walls
    edge_blacklist: HashSet<UnorderedPair<Location>>,
    // holes
    location_blacklist: HashSet<Location>,
    acyclic: AcyclicPolicy,
}

impl Default for SquareBoardBuilder {
    /// An empty 5×5 grid.
    fn default() -> Self {
        let five = NonZero::<usize>::MIN.saturating_add(4);
        Self::with_dims((five, five))
    }
}

impl SquareBoardBuilder {
    /// An empty grid `dims.0` cells wide and `dims.1` cells tall.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            cells: Array2::from_shape_simple_fn((dims.1.get(), dims.0.get()), Cell::default),
            anchor_order: Vec::new(),
            invalid_reasons: Vec::new(),
            edge_blacklist: HashSet::new(),
            location_blacklist: HashSet::new(),
            acyclic: AcyclicPolicy::NoPools,
        }
    }

    /// The dimensions of the grid, in `(x, y)` order.
    pub fn dims(&self) -> (Dimension, Dimension) {
        self.dims
    }

    // whether a feature at every one of `locations` may be recorded; records the reason if not
    fn accepts(&mut self, locations: &[Location]) -> bool {
        if !self.invalid_reasons.is_empty() {
            return false;
        }
        if locations.iter().any(|location| !location.within(self.dims)) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return false;
        }
        true
    }

    fn place(&mut self, location: Location, cell: Cell) -> bool {
        if !self.accepts(&[location]) {
            return false;
        }

        let slot = self.cells.index_mut(location.as_index());
        if *slot != Cell::Empty {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOverlap);
            return false;
        }

        slot.assign_elem(cell);
        true
    }

    /// Put an anchor demanding an island of `size` cells at `location`.
    ///
    /// Invalidates the builder with [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) off the grid,
    /// or with [`FeatureOverlap`](BuilderInvalidReason::FeatureOverlap) on an anchor or given.
    pub fn add_anchor(&mut self, location: Location, size: IslandSize) -> &mut Self {
        if self.place(location, Cell::Land { anchor: Some(size) }) {
            self.anchor_order.push(location);
        }
        self
    }

    /// Take back the anchor added last, if any.
    pub fn pop_anchor(&mut self) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if let Some(location) = self.anchor_order.pop() {
            self.cells.index_mut(location.as_index()).assign_elem(Cell::Empty);
        }
        self
    }

    /// Give `location` as water. Fails like [`Self::add_anchor`].
    pub fn add_water(&mut self, location: Location) -> &mut Self {
        self.place(location, Cell::from(Label::Water));
        self
    }

    /// Give `location` as land without an anchor. Fails like [`Self::add_anchor`].
    pub fn add_land(&mut self, location: Location) -> &mut Self {
        self.place(location, Cell::from(Label::Land));
        self
    }

    /// Leave `location` out of the board, together with anything placed on it.
    ///
    /// A hole changes which cycles are shortest around it, and with them what counts as a pool.
    /// Invalidates the builder with [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) off the grid.
    pub fn drop_location(&mut self, location: Location) -> &mut Self {
        if self.accepts(&[location]) {
            self.location_blacklist.insert(location);
        }
        self
    }

    /// Put a wall between two adjacent locations: no island and no sea connects across it.
    ///
    /// A pair which is not adjacent is ignored. Invalidates the builder with
    /// [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) if either location is off the grid.
    pub fn disconnect(&mut self, locations: UnorderedPair<Location>) -> &mut Self {
        if self.accepts(&[locations.0, locations.1]) && SquareStep::direction_to(locations.0, locations.1).is_some() {
            self.edge_blacklist.insert(locations);
        }
        self
    }

    /// Wall `location` off from its neighbors in each of `directions`; directions leading off the grid are skipped.
    pub fn disconnect_around(&mut self, location: Location, directions: Vec<SquareStep>) -> &mut Self {
        for other in directions.iter().map(|direction| direction.attempt_from(location)) {
            if other.within(self.dims) {
                self.disconnect(UnorderedPair::from((location, other)));
            }
        }
        self
    }

    /// Whether a grid without cycles, such as a single row, may be built. It has no pools. Allowed by default.
    pub fn allow_acyclic(&mut self, allow: bool) -> &mut Self {
        self.acyclic = if allow { AcyclicPolicy::NoPools } else { AcyclicPolicy::Reject };
        self
    }

    /// Why the builder stopped accepting features, or [`None`] while it is still valid.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        (!self.invalid_reasons.is_empty()).then_some(&self.invalid_reasons)
    }

    /// Build the board: every present location becomes a node joined to its grid neighbors except across walls, then
    /// anchors are placed in the order they were added, then givens are labeled.
    pub fn build(&self) -> Result<GridBoard, BuildError> {
        if !self.invalid_reasons.is_empty() {
            return Err(BuildError::Invalid(self.invalid_reasons.clone()));
        }

        let (width, height) = (self.dims.0.get(), self.dims.1.get());
        // a full grid has this many edges; holes and walls only remove some
        let mut graph: UnGraphMap<Location, ()> =
            UnGraphMap::with_capacity(self.cells.len(), (width - 1) * height + (height - 1) * width);

        let present = |location: &Location| location.within(self.dims) && !self.location_blacklist.contains(location);
        let locations = (0..height)
            .cartesian_product(0..width)
            .map(|(y, x)| Location(x, y))
            .filter(present)
            .collect_vec();

        for &location in &locations {
            graph.add_node(location);
        }
        for &location in &locations {
            for direction in SquareStep::FORWARD_VARIANTS {
                let other = direction.attempt_from(location);
                if present(&other) && !self.edge_blacklist.contains(&UnorderedPair::from((location, other))) {
                    graph.add_edge(location, other, ());
                }
            }
        }

        let mut board = Board::build_with(&graph, BoardOptions::default().acyclic(self.acyclic))?;

        for &location in &self.anchor_order {
            if let Some(size) = self.cell(location).anchor() {
                if present(&location) {
                    board.place_anchor(location, size)?;
                }
            }
        }
        for &location in &locations {
            let cell = self.cell(location);
            if let (None, Some(label)) = (cell.anchor(), cell.label()) {
                board.set(location, label).map_err(|_| ConstructionError::Occupied)?;
            }
        }

        Ok(GridBoard::new(board, self.dims))
    }

    fn cell(&self, location: Location) -> Cell {
        self.cells.get(location.as_index()).copied().unwrap_or_default()
    }
}

impl FromStr for SquareBoardBuilder {
    type Err = ParseError;

    /// Parse a layout of whitespace-separated rows, one character per cell:
    /// `.` is empty, `#` water, `+` land, `1` to `9` anchors of that size, and letters anchors of size 10 (`A` or `a`)
    /// through 35 (`Z` or `z`).
    fn from_str(layout: &str) -> Result<Self, Self::Err> {
        parse_layout(layout, false).map(|(builder, _)| builder)
    }
}

/// Parse `layout` as [`SquareBoardBuilder::from_str`] does.
///
/// If `variables` is set, lowercase letters do not become anchors; they are returned with their locations instead.
pub(crate) fn parse_layout(layout: &str, variables: bool) -> Result<(SquareBoardBuilder, Vec<(Location, char)>), ParseError> {
    let rows = layout.split_whitespace().map(|row| row.chars().collect_vec()).collect_vec();
    let width = rows.first().map_or(0, |row| row.len());
    if let Some((row, found)) = rows.iter().map(|row| row.len()).find_position(|len| *len != width) {
        return Err(ParseError::RaggedRows { row, expected: width, found });
    }
    let (Some(width), Some(height)) = (NonZero::new(width), NonZero::new(rows.len())) else {
        return Err(ParseError::Empty);
    };

    let mut builder = SquareBoardBuilder::with_dims((width, height));
    let mut letters = Vec::new();
    for (y, row) in rows.iter().enumerate() {
        for (x, glyph) in row.iter().copied().enumerate() {
            let location = Location(x, y);
            match glyph {
                '.' => {}
                '#' => {
                    builder.add_water(location);
                }
                '+' => {
                    builder.add_land(location);
                }
                'a'..='z' if variables => letters.push((location, glyph)),
                _ => {
                    let size = glyph_size(glyph).ok_or(ParseError::BadCharacter(glyph))?;
                    builder.add_anchor(location, size);
                }
            }
        }
    }

    Ok((builder, letters))
}
