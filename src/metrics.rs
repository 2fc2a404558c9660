//! Facts about the fixed graph which every search on it shares.

use itertools::Itertools;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::{Bfs, VisitMap};

use crate::error::ConstructionError;

/// What to do with a graph that has no cycles, and therefore no pools.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AcyclicPolicy {
    /// Refuse to build a board on it.
    #[default]
    Reject,
    /// Accept it; no labeling of it can ever contain a pool.
    NoPools,
}

/// Shortest cycles and the fixed visiting order of a graph, computed once when a board is built.
#[derive(Clone, Debug)]
pub(crate) struct GraphMetrics {
    girth: Option<usize>,
    // every distinct shortest cycle as a sorted node list
    cycles: Vec<Vec<NodeIndex>>,
    // indices into `cycles`, per node
    pools: Vec<Vec<usize>>,
    root: Option<NodeIndex>,
    next: Vec<Option<NodeIndex>>,
}

impl GraphMetrics {
    pub(crate) fn compute<N>(graph: &UnGraph<N, ()>, policy: AcyclicPolicy) -> Result<Self, ConstructionError> {
        let (girth, cycles, pools) = match girth_and_pools(graph) {
            Ok((girth, cycles, pools)) => (Some(girth), cycles, pools),
            Err(ConstructionError::GraphAcyclic) if policy == AcyclicPolicy::NoPools => {
                (None, Vec::new(), vec![Vec::new(); graph.node_count()])
            }
            Err(e) => return Err(e),
        };

        let root = graph.node_indices().next();
        let next = match root {
            Some(root) => linearize(graph, root),
            None => Vec::new(),
        };

        Ok(Self { girth, cycles, pools, root, next })
    }

    pub(crate) fn girth(&self) -> Option<usize> {
        self.girth
    }

    /// The shortest cycles passing through `node`.
    pub(crate) fn pools_through(&self, node: NodeIndex) -> impl Iterator<Item = &[NodeIndex]> + '_ {
        self.pools[node.index()].iter().map(|&cycle| self.cycles[cycle].as_slice())
    }

    pub(crate) fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub(crate) fn next(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.next[node.index()]
    }
}

/// Find the girth of `graph` and all cycles of that length, indexed by the nodes on them.
///
/// Every node starts a path of one node. Each round, every live path is extended by each neighbor of its head other
/// than the node it just came from. A path whose head neighbors its own start has closed a cycle; the first round in
/// which that happens fixes the girth, and the closed paths of that round are exactly the shortest cycles (each one
/// found once per starting node and direction). If every path dies before any closes, the graph is a forest.
pub(crate) fn girth_and_pools<N>(graph: &UnGraph<N, ()>) -> Result<(usize, Vec<Vec<NodeIndex>>, Vec<Vec<usize>>), ConstructionError> {
    let mut paths = graph.node_indices().map(|n| vec![n]).collect_vec();
    let mut length = 0;

    let closed = loop {
        length += 1;
        let mut grown = Vec::with_capacity(paths.len() * 2);
        let mut closed = Vec::new();

        for path in &paths {
            let (Some(&start), Some(&head)) = (path.first(), path.last()) else {
                continue;
            };
            // don't backtrack
            let previous = path.len().checked_sub(2).map(|i| path[i]);

            for neighbor in graph.neighbors(head) {
                if Some(neighbor) == previous {
                    continue;
                }

                if neighbor == start {
                    closed.push(path.clone());
                } else {
                    let mut longer = Vec::with_capacity(path.len() + 1);
                    longer.extend_from_slice(path);
                    longer.push(neighbor);
                    grown.push(longer);
                }
            }
        }

        if !closed.is_empty() {
            break closed;
        }
        if grown.is_empty() {
            return Err(ConstructionError::GraphAcyclic);
        }
        paths = grown;
    };

    let cycles = closed.into_iter()
        .map(|mut cycle| {
            cycle.sort_unstable();
            cycle
        })
        .unique()
        .collect_vec();

    let mut pools = vec![Vec::new(); graph.node_count()];
    for (ix, cycle) in cycles.iter().enumerate() {
        for node in cycle {
            pools[node.index()].push(ix);
        }
    }

    Ok((length, cycles, pools))
}

/// Chain every node of `graph` into one breadth-first order starting at `root`.
///
/// `next[n]` is the node after `n`, and the last node maps to [`None`].
/// Components not reachable from `root` follow in order of their lowest node index.
pub(crate) fn linearize<N>(graph: &UnGraph<N, ()>, root: NodeIndex) -> Vec<Option<NodeIndex>> {
    let mut order = Vec::with_capacity(graph.node_count());
    let mut bfs = Bfs::new(graph, root);

    loop {
        while let Some(node) = bfs.next(graph) {
            order.push(node);
        }

        match graph.node_indices().find(|n| !bfs.discovered.is_visited(n)) {
            Some(unreached) => {
                bfs.discovered.visit(unreached);
                bfs.stack.push_back(unreached);
            }
            None => break,
        }
    }

    let mut next = vec![None; graph.node_count()];
    for (node, successor) in order.iter().tuple_windows() {
        next[node.index()] = Some(*successor);
    }

    next
}
