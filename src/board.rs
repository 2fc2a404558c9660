use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::graphmap::{NodeTrait, UnGraphMap};

use crate::cell::{Cell, IslandSize, Label};
use crate::error::{ConstructionError, Defect, InvariantViolation};
use crate::metrics::{AcyclicPolicy, GraphMetrics};
use crate::solution::Solution;
use crate::solver::Solver;

/// Settings fixed when a [`Board`] is built.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BoardOptions {
    pub(crate) acyclic: AcyclicPolicy,
}

impl BoardOptions {
    /// Choose how a graph without cycles is treated. The default is [`AcyclicPolicy::Reject`].
    pub fn acyclic(mut self, policy: AcyclicPolicy) -> Self {
        self.acyclic = policy;
        self
    }
}

/// What is known about the connectivity of the sea since the board last changed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Connectivity {
    Connected,
    Disconnected,
    Unknown,
}

// generation counter for flood fills; a node is visited in the current fill iff its stamp equals the board's
type Stamp = u32;

/// One connected piece of land, as found by [`Board::flood_fill_island`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Island<T> {
    /// Number of land nodes in the island.
    pub size: usize,
    /// Empty nodes bordering the island, each listed once. The island can only grow through these.
    pub escapes: Vec<T>,
    /// Anchors inside the island. A legal island has at most one.
    pub anchors: Vec<T>,
}

impl<T> Island<T> {
    fn empty() -> Self {
        Self { size: 0, escapes: Vec::new(), anchors: Vec::new() }
    }

    /// Convert the node handles of this island with `f`.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Island<U> {
        Island {
            size: self.size,
            escapes: self.escapes.into_iter().map(&mut f).collect(),
            anchors: self.anchors.into_iter().map(&mut f).collect(),
        }
    }
}

/// A Nurikabe board over an arbitrary undirected graph whose nodes are of type `N`.
///
/// A board holds one [`Cell`] per node. Anchors are placed once with [`place_anchor`](Self::place_anchor);
/// everything else starts [`Empty`](Cell::Empty) and is labeled by [`set`](Self::set) and unlabeled by
/// [`clear`](Self::clear), or left to [`solve`](Self::solve).
///
/// Grid boards are most easily made with a [`SquareBoardBuilder`](crate::builder::SquareBoardBuilder).
#[derive(Clone, Debug)]
pub struct Board<N>
where
    N: NodeTrait,
{
    graph: UnGraph<N, ()>,
    lookup: HashMap<N, NodeIndex>,
    cells: Vec<Cell>,
    stamps: Vec<Stamp>,
    stamp: Stamp,
    anchors: Vec<NodeIndex>,
    anchor_maxsize: usize,
    metrics: GraphMetrics,
    water: Connectivity,
}

impl<N> Board<N>
where
    N: NodeTrait + Debug,
{
    /// Build an empty board on `graph`, rejecting graphs without cycles.
    ///
    /// Edge weights of `graph` are ignored.
    pub fn build<E>(graph: &UnGraphMap<N, E>) -> Result<Self, ConstructionError> {
        Self::build_with(graph, BoardOptions::default())
    }

    /// Build an empty board on `graph` with the given `options`.
    pub fn build_with<E>(graph: &UnGraphMap<N, E>, options: BoardOptions) -> Result<Self, ConstructionError> {
        let mut dense = UnGraph::with_capacity(graph.node_count(), graph.edge_count());
        let mut lookup = HashMap::with_capacity(graph.node_count());
        for node in graph.nodes() {
            lookup.insert(node, dense.add_node(node));
        }
        for (a, b, _) in graph.all_edges() {
            if let (Some(&a), Some(&b)) = (lookup.get(&a), lookup.get(&b)) {
                dense.add_edge(a, b, ());
            }
        }

        let metrics = GraphMetrics::compute(&dense, options.acyclic)?;
        debug!("built board with {} nodes and {} edges, girth {:?}", dense.node_count(), dense.edge_count(), metrics.girth());

        Ok(Self {
            cells: vec![Cell::Empty; dense.node_count()],
            stamps: vec![0; dense.node_count()],
            stamp: 0,
            anchors: Vec::new(),
            anchor_maxsize: 0,
            water: Connectivity::Unknown,
            graph: dense,
            lookup,
            metrics,
        })
    }

    /// Make `node` an anchor demanding an island of `size` nodes.
    ///
    /// The node must exist and be empty; in particular, a node cannot hold two anchors.
    pub fn place_anchor(&mut self, node: N, size: IslandSize) -> Result<(), ConstructionError> {
        let ix = self.index_of(node).ok_or(ConstructionError::UnknownNode)?;
        if self.cells[ix.index()] != Cell::Empty {
            return Err(ConstructionError::Occupied);
        }

        self.cells[ix.index()] = Cell::Land { anchor: Some(size) };
        self.anchors.push(ix);
        self.anchor_maxsize = self.anchor_maxsize.max(size.get());
        self.water = Connectivity::Unknown;
        Ok(())
    }

    /// Label the empty `node`.
    pub fn set(&mut self, node: N, label: Label) -> Result<(), InvariantViolation> {
        let ix = self.index_of(node).ok_or(InvariantViolation::UnknownNode)?;
        if self.cells[ix.index()] != Cell::Empty {
            return Err(InvariantViolation::NotEmpty);
        }

        self.put(ix, label);
        Ok(())
    }

    /// Return the labeled `node` to empty. Anchors cannot be cleared.
    pub fn clear(&mut self, node: N) -> Result<(), InvariantViolation> {
        let ix = self.index_of(node).ok_or(InvariantViolation::UnknownNode)?;
        match self.cells[ix.index()] {
            Cell::Empty => Err(InvariantViolation::AlreadyEmpty),
            Cell::Land { anchor: Some(_) } => Err(InvariantViolation::PermanentAnchor),
            _ => {
                self.erase(ix);
                Ok(())
            }
        }
    }

    /// The cell at `node`, or [`None`] if `node` is not on the board.
    pub fn get(&self, node: N) -> Option<Cell> {
        self.index_of(node).map(|ix| self.cells[ix.index()])
    }

    /// Whether `node` is on the board and empty.
    pub fn is_empty(&self, node: N) -> bool {
        self.get(node) == Some(Cell::Empty)
    }

    /// Whether `node` is on the board and water.
    pub fn is_water(&self, node: N) -> bool {
        self.get(node) == Some(Cell::Water)
    }

    /// Whether `node` is on the board and land, anchors included.
    pub fn is_land(&self, node: N) -> bool {
        matches!(self.get(node), Some(Cell::Land { .. }))
    }

    /// The size demanded by the anchor at `node`, if there is one.
    pub fn anchor_size(&self, node: N) -> Option<IslandSize> {
        self.get(node).and_then(|cell| cell.anchor())
    }

    /// Every anchor with its size, in order of placement.
    pub fn anchors(&self) -> impl Iterator<Item = (N, IslandSize)> + '_ {
        self.anchors.iter().filter_map(|&ix| Some((self.graph[ix], self.cells[ix.index()].anchor()?)))
    }

    /// The largest size demanded by any anchor, or 0 without anchors.
    pub fn anchor_maxsize(&self) -> usize {
        self.anchor_maxsize
    }

    /// The length of the shortest cycle of the graph, or [`None`] if it has none.
    pub fn girth(&self) -> Option<usize> {
        self.metrics.girth()
    }

    /// Every shortest cycle through `node`, i.e. every place a pool containing `node` could form.
    pub fn pools_through(&self, node: N) -> Vec<Vec<N>> {
        match self.index_of(node) {
            Some(ix) => self.metrics.pools_through(ix)
                .map(|cycle| cycle.iter().map(|&n| self.graph[n]).collect())
                .collect(),
            None => Vec::new(),
        }
    }

    /// All nodes of the board.
    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.graph.node_weights().copied()
    }

    /// The number of nodes of the board.
    pub fn node_count(&self) -> usize {
        self.cells.len()
    }

    /// The number of nodes still empty.
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell == Cell::Empty).count()
    }

    /// Explore the land connected to `node`, without crossing water or entering empty nodes.
    ///
    /// Returns [`None`] if `node` is not on the board. Starting from a water node gives an island of size 0 with no
    /// escapes; starting from an empty node gives an island of size 0 whose only escape is `node` itself.
    pub fn flood_fill_island(&mut self, node: N) -> Option<Island<N>> {
        let ix = self.index_of(node)?;
        let island = self.fill_island_at(ix);
        Some(self.expose(island))
    }

    /// Whether some shortest cycle through `node` is entirely water.
    pub fn is_pool(&self, node: N) -> bool {
        self.index_of(node).is_some_and(|ix| self.is_pool_at(ix))
    }

    /// Whether the island containing `node` could still be, or already is, part of a solution.
    ///
    /// An island joining two anchors is illegal. An island with one anchor must have that anchor's size, or be
    /// smaller and have an escape. An island without an anchor must have an escape and be smaller than the largest
    /// anchor on the board.
    ///
    /// The last rule only prunes partial labelings: in a solution every island has an anchor. It measures against
    /// the largest anchor on the whole board, which is loose when anchor sizes vary widely.
    pub fn legal_island(&mut self, node: N) -> bool {
        self.index_of(node).is_some_and(|ix| self.legal_island_at(ix))
    }

    /// Whether all water could still end up as one sea.
    ///
    /// Empty nodes count as potential water: this is false only if water and empty nodes together fall into at least
    /// two components that both contain water.
    pub fn connected_water(&mut self) -> bool {
        match self.water {
            Connectivity::Connected => true,
            Connectivity::Disconnected => false,
            Connectivity::Unknown => {
                let verdict = self.recount_water();
                self.water = if verdict { Connectivity::Connected } else { Connectivity::Disconnected };
                verdict
            }
        }
    }

    /// Partition all land into islands.
    pub fn islands(&mut self) -> Vec<Island<N>> {
        self.islands_at().into_iter().map(|island| self.expose(island)).collect()
    }

    /// A copy of the current labeling, or [`None`] while any node is empty.
    pub fn solution(&self) -> Option<Solution<N>> {
        let mut labels = BTreeMap::new();
        let mut anchors = BTreeMap::new();
        for (ix, cell) in self.cells.iter().enumerate() {
            let node = self.graph[NodeIndex::new(ix)];
            labels.insert(node, cell.label()?);
            if let Some(size) = cell.anchor() {
                anchors.insert(node, size);
            }
        }

        Some(Solution::new(labels, anchors))
    }

    /// Check `solution` against every rule of the puzzle, independently of how it was found.
    ///
    /// The labeling must cover every node of this board and agree with every cell already labeled on it.
    pub fn audit(&self, solution: &Solution<N>) -> Result<(), Defect> {
        let mut board = self.clone();
        let mut unlabeled = 0;

        for ix in self.graph.node_indices() {
            match (board.cells[ix.index()], solution.label(self.graph[ix])) {
                (_, None) => unlabeled += 1,
                (Cell::Empty, Some(label)) => board.put(ix, label),
                (cell, label) if cell.label() == label => {}
                _ => return Err(Defect::Conflict),
            }
        }
        if unlabeled > 0 {
            return Err(Defect::Unlabeled(unlabeled));
        }
        if solution.len() != self.node_count() {
            return Err(Defect::Conflict);
        }

        if board.graph.node_indices().any(|ix| board.is_pool_at(ix)) {
            return Err(Defect::Pool);
        }
        if !board.recount_water() {
            return Err(Defect::SplitSea);
        }

        for island in board.islands_at() {
            match island.anchors.as_slice() {
                [] => return Err(Defect::Unanchored(island.size)),
                [anchor] => {
                    let wanted = board.cells[anchor.index()].anchor().map_or(0, |size| size.get());
                    if wanted != island.size {
                        return Err(Defect::WrongSize { wanted, found: island.size });
                    }
                }
                many => return Err(Defect::Joined(many.len())),
            }
        }

        Ok(())
    }

    /// Find every solution of the board as it stands.
    ///
    /// The board is left exactly as it was. An unsolvable board gives an empty [`Vec`].
    pub fn solve(&mut self) -> Vec<Solution<N>> {
        self.solver().collect()
    }

    /// A lazy search over the solutions of this board; see [`Solver`].
    pub fn solver(&mut self) -> Solver<'_, N> {
        Solver::new(self)
    }

    pub(crate) fn index_of(&self, node: N) -> Option<NodeIndex> {
        self.lookup.get(&node).copied()
    }

    pub(crate) fn node_at(&self, ix: NodeIndex) -> N {
        self.graph[ix]
    }

    pub(crate) fn cell_at(&self, ix: NodeIndex) -> Cell {
        self.cells[ix.index()]
    }

    pub(crate) fn neighbors(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(ix)
    }

    pub(crate) fn anchor_indices(&self) -> &[NodeIndex] {
        &self.anchors
    }

    pub(crate) fn metrics(&self) -> &GraphMetrics {
        &self.metrics
    }

    /// Label the empty `ix`, keeping the sea verdict valid where the change cannot affect it.
    pub(crate) fn put(&mut self, ix: NodeIndex, label: Label) {
        debug_assert_eq!(self.cells[ix.index()], Cell::Empty);

        self.water = match label {
            // removing a node of degree 0 or 1 from the sea cannot split it
            Label::Land if self.wet_neighbors(ix) > 1 => Connectivity::Unknown,
            // a component already holding water gains nothing new
            Label::Water if !self.has_water_neighbor(ix) => Connectivity::Unknown,
            _ => self.water,
        };
        self.cells[ix.index()] = Cell::from(label);
    }

    /// Return the labeled, non-anchor `ix` to empty.
    pub(crate) fn erase(&mut self, ix: NodeIndex) {
        let cell = self.cells[ix.index()];
        debug_assert!(cell != Cell::Empty && cell.anchor().is_none());

        self.water = match (self.water, cell) {
            // merging components or losing water never adds a second sea
            (Connectivity::Connected, _) => Connectivity::Connected,
            (_, Cell::Land { .. }) if self.wet_neighbors(ix) > 1 => Connectivity::Unknown,
            (_, Cell::Water) if !self.has_water_neighbor(ix) => Connectivity::Unknown,
            (verdict, _) => verdict,
        };
        self.cells[ix.index()] = Cell::Empty;
    }

    pub(crate) fn fill_island_at(&mut self, ix: NodeIndex) -> Island<NodeIndex> {
        self.next_stamp();
        self.explore(ix, |_| {})
    }

    pub(crate) fn is_pool_at(&self, ix: NodeIndex) -> bool {
        self.metrics.pools_through(ix)
            .any(|cycle| cycle.iter().all(|n| self.cells[n.index()] == Cell::Water))
    }

    pub(crate) fn legal_island_at(&mut self, ix: NodeIndex) -> bool {
        let island = self.fill_island_at(ix);
        self.admissible(&island)
    }

    /// Whether the labeling so far can still be completed as far as the incremental checks go, judged from scratch.
    ///
    /// The search checks only the nodes it labels itself, so it runs this once on the cells it was handed.
    pub(crate) fn consistent(&mut self) -> bool {
        if self.graph.node_indices().any(|ix| self.cells[ix.index()] == Cell::Water && self.is_pool_at(ix)) {
            return false;
        }
        if !self.islands_at().iter().all(|island| self.admissible(island)) {
            return false;
        }
        self.connected_water()
    }

    fn admissible(&self, island: &Island<NodeIndex>) -> bool {
        let can_grow = !island.escapes.is_empty();

        match island.anchors.as_slice() {
            [] => can_grow && island.size < self.anchor_maxsize,
            [anchor] => {
                let wanted = self.cells[anchor.index()].anchor().map_or(0, |size| size.get());
                island.size == wanted || (island.size < wanted && can_grow)
            }
            _ => false,
        }
    }

    /// The cached sea verdict, if one is held.
    #[cfg(test)]
    pub(crate) fn cached_water(&self) -> Option<bool> {
        match self.water {
            Connectivity::Connected => Some(true),
            Connectivity::Disconnected => Some(false),
            Connectivity::Unknown => None,
        }
    }

    /// Decide whether the sea is connected from scratch, ignoring and not touching the cache.
    pub(crate) fn recount_water(&mut self) -> bool {
        let stamp = self.next_stamp();
        let (graph, cells, stamps) = (&self.graph, &self.cells, &mut self.stamps);
        let is_land = |ix: NodeIndex| matches!(cells[ix.index()], Cell::Land { .. });

        let mut seas = 0;
        let mut stack = Vec::new();
        for start in graph.node_indices() {
            if stamps[start.index()] == stamp || is_land(start) {
                continue;
            }
            stamps[start.index()] = stamp;
            stack.push(start);

            let mut wet = false;
            while let Some(node) = stack.pop() {
                wet |= cells[node.index()] == Cell::Water;
                for neighbor in graph.neighbors(node) {
                    if stamps[neighbor.index()] != stamp && !is_land(neighbor) {
                        stamps[neighbor.index()] = stamp;
                        stack.push(neighbor);
                    }
                }
            }

            if wet {
                seas += 1;
                if seas > 1 {
                    return false;
                }
            }
        }

        true
    }

    #[cfg(test)]
    pub(crate) fn force_stamp(&mut self, stamp: Stamp) {
        self.stamp = stamp;
    }

    fn next_stamp(&mut self) -> Stamp {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            // every old mark could collide with a reused value
            self.stamps.fill(0);
            self.stamp = 1;
        }
        self.stamp
    }

    /// Walk the land connected to `start` under the current stamp, calling `on_land` for every land node reached.
    fn explore(&mut self, start: NodeIndex, mut on_land: impl FnMut(NodeIndex)) -> Island<NodeIndex> {
        let stamp = self.stamp;
        let (graph, cells, stamps) = (&self.graph, &self.cells, &mut self.stamps);

        let mut island = Island::empty();
        let mut stack = Vec::new();
        let mut reach = |node: NodeIndex, island: &mut Island<NodeIndex>, stack: &mut Vec<NodeIndex>| {
            if stamps[node.index()] == stamp {
                return;
            }
            stamps[node.index()] = stamp;

            match cells[node.index()] {
                Cell::Empty => island.escapes.push(node),
                Cell::Land { .. } => stack.push(node),
                Cell::Water => {}
            }
        };

        reach(start, &mut island, &mut stack);
        while let Some(node) = stack.pop() {
            island.size += 1;
            if cells[node.index()].anchor().is_some() {
                island.anchors.push(node);
            }
            on_land(node);

            for neighbor in graph.neighbors(node) {
                reach(neighbor, &mut island, &mut stack);
            }
        }

        island
    }

    fn islands_at(&mut self) -> Vec<Island<NodeIndex>> {
        let mut assigned = vec![false; self.cells.len()];
        let mut islands = Vec::new();

        for ix in self.graph.node_indices() {
            if assigned[ix.index()] || !matches!(self.cells[ix.index()], Cell::Land { .. }) {
                continue;
            }
            self.next_stamp();
            islands.push(self.explore(ix, |member| assigned[member.index()] = true));
        }

        islands
    }

    fn expose(&self, island: Island<NodeIndex>) -> Island<N> {
        island.map(|ix| self.graph[ix])
    }

    fn wet_neighbors(&self, ix: NodeIndex) -> usize {
        self.graph.neighbors(ix)
            .filter(|n| !matches!(self.cells[n.index()], Cell::Land { .. }))
            .count()
    }

    fn has_water_neighbor(&self, ix: NodeIndex) -> bool {
        self.graph.neighbors(ix).any(|n| self.cells[n.index()] == Cell::Water)
    }
}
