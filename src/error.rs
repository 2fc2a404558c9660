use thiserror::Error;

/// Reasons a [`Board`](crate::Board) cannot be built or furnished with an anchor.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ConstructionError {
    /// The graph has no cycles, so its pools are undefined.
    #[error("graph has no cycles")]
    GraphAcyclic,
    /// An anchor was placed on a node which is already labeled, possibly by another anchor.
    #[error("node is not empty")]
    Occupied,
    /// The node is not part of the board's graph.
    #[error("node is not on the board")]
    UnknownNode,
}

/// An attempted state transition the board does not allow.
///
/// These indicate a bug in the caller and are never recovered from internally.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum InvariantViolation {
    /// Only empty nodes may be labeled; clear the node first.
    #[error("node is already labeled")]
    NotEmpty,
    /// The node has no label to clear.
    #[error("node is already empty")]
    AlreadyEmpty,
    /// Anchors are land for the lifetime of the board.
    #[error("anchors cannot be cleared")]
    PermanentAnchor,
    /// The node is not part of the board's graph.
    #[error("node is not on the board")]
    UnknownNode,
}

/// Why a labeling handed to [`Board::audit`](crate::Board::audit) is not a solution.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Defect {
    /// Some node has no label.
    #[error("{0} nodes are unlabeled")]
    Unlabeled(usize),
    /// The labeling disagrees with a cell fixed on the board, or names a node not on it.
    #[error("labeling contradicts the board")]
    Conflict,
    /// Some shortest cycle is entirely water.
    #[error("water forms a pool")]
    Pool,
    /// The water is split into more than one component.
    #[error("water is not connected")]
    SplitSea,
    /// An island contains no anchor.
    #[error("island of size {0} has no anchor")]
    Unanchored(usize),
    /// An island contains more than one anchor.
    #[error("island joins {0} anchors")]
    Joined(usize),
    /// An island's size differs from its anchor's.
    #[error("island has size {found} but its anchor wants {wanted}")]
    WrongSize {
        /// Size of the anchor.
        wanted: usize,
        /// Size of the island.
        found: usize,
    },
}
