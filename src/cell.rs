use std::num::NonZero;

use strum::VariantArray;

/// The size an anchor demands of its island. Always at least 1.
pub type IslandSize = NonZero<usize>;

/// The state of one node of a [`Board`](crate::Board).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Cell {
    /// Not yet decided.
    #[default]
    Empty,
    /// Part of the sea.
    Water,
    /// Part of an island.
    Land {
        /// Set only on the numbered node an island grows from.
        anchor: Option<IslandSize>,
    },
}

impl Cell {
    /// The label this cell carries, or [`None`] while it is still empty.
    pub fn label(&self) -> Option<Label> {
        match self {
            Cell::Empty => None,
            Cell::Water => Some(Label::Water),
            Cell::Land { .. } => Some(Label::Land),
        }
    }

    /// The required island size if this cell is an anchor.
    pub fn anchor(&self) -> Option<IslandSize> {
        match self {
            Cell::Land { anchor } => *anchor,
            _ => None,
        }
    }

    pub(crate) fn glyph(&self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Water => Label::Water.glyph(),
            Cell::Land { anchor: Some(size) } => size_glyph(*size),
            Cell::Land { anchor: None } => Label::Land.glyph(),
        }
    }
}

/// A decided value for a node.
///
/// The declaration order is the order the search tries candidates in.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, VariantArray)]
pub enum Label {
    /// Part of the sea.
    Water,
    /// Part of an island.
    Land,
}

impl Label {
    pub(crate) fn glyph(&self) -> char {
        match self {
            Label::Water => '#',
            Label::Land => '+',
        }
    }
}

impl From<Label> for Cell {
    fn from(value: Label) -> Self {
        match value {
            Label::Water => Cell::Water,
            Label::Land => Cell::Land { anchor: None },
        }
    }
}

/// Display an island size as one character: digits up to 9, then `A` for 10 through `Z` for 35.
pub(crate) fn size_glyph(size: IslandSize) -> char {
    match size.get() {
        n @ 1..=9 => char::from(b'0' + n as u8),
        n @ 10..=35 => char::from(b'A' + (n - 10) as u8),
        _ => '?',
    }
}

/// Inverse of [`size_glyph`], accepting either letter case.
pub(crate) fn glyph_size(glyph: char) -> Option<IslandSize> {
    let value = match glyph {
        '1'..='9' => glyph as usize - '0' as usize,
        'a'..='z' => glyph as usize - 'a' as usize + 10,
        'A'..='Z' => glyph as usize - 'A' as usize + 10,
        _ => return None,
    };

    NonZero::new(value)
}
