//! Exhaustive backtracking search.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use itertools::Itertools;
use log::{debug, trace};
use petgraph::graph::NodeIndex;
use petgraph::graphmap::NodeTrait;
use strum::VariantArray;

use crate::board::Board;
use crate::cell::{Cell, Label};
use crate::solution::Solution;

/// Counters kept over one search.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SearchStats {
    /// Search nodes entered, i.e. partial labelings that passed every check.
    pub visited: usize,
    /// Candidate labels rejected by a check.
    pub rejected: usize,
    /// Solutions yielded.
    pub solutions: usize,
}

// one level of the search: the node branched on, and how many of `Label::VARIANTS` have been tried on it
struct Frame {
    node: NodeIndex,
    tried: usize,
}

/// A depth-first search yielding every solution of a [`Board`], one at a time.
///
/// Each step picks an empty node and tries [`Water`](Label::Water), then [`Land`](Label::Land), on it. A candidate
/// stays only if the board still satisfies every rule a partial labeling can be held to:
/// - new land must leave its island [legal](Board::legal_island);
/// - new water must not complete a [pool](Board::is_pool) and must not leave a neighboring island illegal;
/// - either way, the water must stay [connectable](Board::connected_water).
///
/// When no empty node is left the labeling is yielded as a [`Solution`] and the search carries on.
/// Cells labeled before the search started are checked once, up front; a board already breaking the rules yields
/// nothing.
/// Nodes bordering islands about to be decided are picked first, so dead ends surface early; this only changes the
/// order of the search, never which labelings it visits.
///
/// The search keeps its own stack instead of recursing, so its depth is bounded only by memory.
/// The borrowed board is restored to its prior labeling once the search is exhausted, cancelled or dropped.
pub struct Solver<'b, N>
where
    N: NodeTrait + Debug,
{
    board: &'b mut Board<N>,
    stack: Vec<Frame>,
    // nodes the propagation scan found interesting, most interesting last
    worklist: Vec<NodeIndex>,
    descending: bool,
    finished: bool,
    cancel: Option<Arc<AtomicBool>>,
    stats: SearchStats,
}

impl<'b, N> Solver<'b, N>
where
    N: NodeTrait + Debug,
{
    /// Start a search over `board`, which stays exclusively borrowed until the solver is dropped.
    pub fn new(board: &'b mut Board<N>) -> Self {
        let finished = !board.consistent();
        if finished {
            debug!("board breaks the rules before any search");
        }

        Self {
            board,
            stack: Vec::new(),
            worklist: Vec::new(),
            descending: true,
            finished,
            cancel: None,
            stats: SearchStats::default(),
        }
    }

    /// Poll `flag` once per search node; once it is raised, the search unwinds and yields nothing more.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Counters of the search so far.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Look for nodes around anchored islands whose label would settle quickly:
    /// - every escape of an island which is already full (each must become water);
    /// - the only escape of an island;
    /// - an escape shared with an island scanned earlier.
    fn scan_islands(&mut self) -> Vec<NodeIndex> {
        let mut found = Vec::new();
        let mut fans = HashSet::new();

        for i in 0..self.board.anchor_indices().len() {
            let anchor = self.board.anchor_indices()[i];
            let wanted = self.board.cell_at(anchor).anchor().map_or(0, |size| size.get());
            let island = self.board.fill_island_at(anchor);

            if island.size == wanted || island.escapes.len() == 1 {
                found.extend_from_slice(&island.escapes);
            } else {
                found.extend(island.escapes.iter().filter(|escape| fans.contains(*escape)));
            }
            fans.extend(island.escapes);
        }

        if !found.is_empty() {
            debug!("propagation found {} nodes to work on", found.len());
        }
        found
    }

    fn pop_worklist(&mut self) -> Option<NodeIndex> {
        while let Some(node) = self.worklist.pop() {
            if self.board.cell_at(node) == Cell::Empty {
                return Some(node);
            }
        }
        None
    }

    /// Choose the next node to branch on, or [`None`] if the board is full.
    fn pick_node(&mut self) -> Option<NodeIndex> {
        if let Some(node) = self.pop_worklist() {
            return Some(node);
        }

        self.worklist = self.scan_islands();
        if let Some(node) = self.pop_worklist() {
            return Some(node);
        }

        let mut node = self.board.metrics().root();
        while let Some(ix) = node {
            if self.board.cell_at(ix) == Cell::Empty {
                break;
            }
            node = self.board.metrics().next(ix);
        }
        node
    }

    /// Check the freshly labeled `node` against every rule a partial labeling must satisfy.
    fn admits(&mut self, node: NodeIndex, label: Label) -> bool {
        match label {
            Label::Land => {
                if !self.board.legal_island_at(node) {
                    trace!("land at {:?} makes bad island", self.board.node_at(node));
                    return false;
                }
            }
            Label::Water => {
                if self.board.is_pool_at(node) {
                    trace!("water at {:?} makes pool", self.board.node_at(node));
                    return false;
                }

                for neighbor in self.board.neighbors(node).collect_vec() {
                    if matches!(self.board.cell_at(neighbor), Cell::Land { .. }) && !self.board.legal_island_at(neighbor) {
                        trace!("water at {:?} constricts island at {:?}", self.board.node_at(node), self.board.node_at(neighbor));
                        return false;
                    }
                }
            }
        }

        if !self.board.connected_water() {
            trace!("{:?} at {:?} disconnects water", label, self.board.node_at(node));
            return false;
        }

        true
    }

    /// Move to the next untried candidate, backtracking as needed. Returns `false` once the search is exhausted.
    fn advance(&mut self) -> bool {
        while let Some(frame) = self.stack.last_mut() {
            let node = frame.node;
            if self.board.cell_at(node) != Cell::Empty {
                self.board.erase(node);
            }

            let Some(&label) = Label::VARIANTS.get(frame.tried) else {
                self.stack.pop();
                continue;
            };
            frame.tried += 1;

            self.board.put(node, label);
            if self.admits(node, label) {
                return true;
            }
            self.board.erase(node);
            self.stats.rejected += 1;
        }

        false
    }

    /// Undo every label the search placed, leaving the board as it was handed over.
    fn unwind(&mut self) {
        while let Some(frame) = self.stack.pop() {
            if self.board.cell_at(frame.node) != Cell::Empty {
                self.board.erase(frame.node);
            }
        }

        if !self.finished {
            self.finished = true;
            debug!("search finished: {:?}", self.stats);
        }
    }
}

impl<N> Iterator for Solver<'_, N>
where
    N: NodeTrait + Debug,
{
    type Item = Solution<N>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if self.descending {
                if self.cancelled() {
                    debug!("search cancelled");
                    self.unwind();
                    return None;
                }
                self.stats.visited += 1;
                self.descending = false;

                match self.pick_node() {
                    Some(node) => self.stack.push(Frame { node, tried: 0 }),
                    None => {
                        // the givens and every label placed since passed their checks, so a full board is solved
                        if let Some(solution) = self.board.solution() {
                            self.stats.solutions += 1;
                            return Some(solution);
                        }
                    }
                }
            }

            if !self.advance() {
                self.unwind();
                return None;
            }
            self.descending = true;
        }
    }
}

impl<N> Drop for Solver<'_, N>
where
    N: NodeTrait + Debug,
{
    fn drop(&mut self) {
        self.unwind();
    }
}
