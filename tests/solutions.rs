use std::collections::BTreeSet;
use std::num::NonZero;
use std::str::FromStr;

use petgraph::graphmap::UnGraphMap;
use pretty_assertions::assert_eq;

use nurikabe::cryptic::Cryptic;
use nurikabe::{AcyclicPolicy, Board, BoardOptions, Label, Location, SquareBoardBuilder};

fn solve(layout: &str) -> BTreeSet<String> {
    let mut board = SquareBoardBuilder::from_str(layout).unwrap().build().unwrap();
    let solutions = board.solve();
    for solution in &solutions {
        assert_eq!(board.board().audit(solution.solution()), Ok(()));
    }
    solutions.iter().map(|solution| solution.to_string()).collect()
}

#[test]
fn classic_puzzles() {
    assert_eq!(solve("...2.\n.....\n....3\n.....\n.4..."), BTreeSet::from(["###2+\n#+###\n#+#+3\n#+#+#\n#4###\n".to_string()]));
    assert_eq!(solve("2.\n..").len(), 2);
    assert!(solve("....\n3.1.\n...4\n....").is_empty());
}

#[test]
fn givens_narrow_the_search() {
    let free = solve("3...\n....\n...3");
    let given = solve("3+..\n....\n...3");

    assert_eq!(free.len(), 6);
    assert_eq!(given.len(), 3);
    assert!(given.is_subset(&free));
    assert!(solve("3#..\n#...\n...3").is_empty());
}

#[test]
fn broken_givens_have_no_solutions() {
    // a pool, a stranded island without an anchor, and an island already too big
    assert!(solve("1.##\n..##\n....").is_empty());
    assert!(solve("1...\n.#..\n#+#.").is_empty());
    assert!(solve("2+#.\n++..\n#...").is_empty());
}

#[test]
fn solving_on_a_custom_graph() {
    // a wheel: a hub joined to every node of a ring of six
    let mut graph: UnGraphMap<char, ()> = UnGraphMap::new();
    let ring = ['a', 'b', 'c', 'd', 'e', 'f'];
    for (i, &node) in ring.iter().enumerate() {
        graph.add_edge(node, ring[(i + 1) % ring.len()], ());
        graph.add_edge('h', node, ());
    }

    let mut board = Board::build(&graph).unwrap();
    assert_eq!(board.girth(), Some(3));
    assert_eq!(board.pools_through('h').len(), 6);

    board.place_anchor('a', NonZero::new(2).unwrap()).unwrap();
    board.place_anchor('d', NonZero::new(2).unwrap()).unwrap();

    // each island takes one ring neighbor of its anchor; two neighboring ring nodes of water close a pool with the hub
    let solutions = board.solve();
    assert_eq!(solutions.len(), 2);
    for solution in &solutions {
        assert_eq!(board.audit(solution), Ok(()));
        assert_eq!(solution.count(Label::Land), 4);
        // land on the hub would join both islands
        assert_eq!(solution.label('h'), Some(Label::Water));
    }
    assert_eq!(board.empty_count(), 5);
}

#[test]
fn forests_need_permission() {
    let mut path: UnGraphMap<u32, ()> = UnGraphMap::new();
    for n in 0..4 {
        path.add_edge(n, n + 1, ());
    }

    assert!(Board::build(&path).is_err());
    let mut board = Board::build_with(&path, BoardOptions::default().acyclic(AcyclicPolicy::NoPools)).unwrap();
    board.place_anchor(0, NonZero::new(1).unwrap()).unwrap();

    let solutions = board.solve();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].count(Label::Water), 4);
}

#[test]
fn cryptic_puzzles() {
    let cryptic = Cryptic::parse("a..\n...\n..2").unwrap();
    let found = cryptic.solve().unwrap();

    let sizes = found.iter().map(|group| group.assignment[0].1.get()).collect::<Vec<_>>();
    assert_eq!(sizes, vec![2, 3]);
    assert_eq!(found.iter().map(|group| group.solutions.len()).sum::<usize>(), 4);
}

#[test]
fn grid_locations() {
    let board = SquareBoardBuilder::from_str("..\n.3\n..").unwrap().build().unwrap();
    assert_eq!(board.board().anchor_size(Location(1, 1)).map(NonZero::get), Some(3));
    assert_eq!(board.board().node_count(), 6);
    assert_eq!(board.to_string(), "..\n.3\n..\n");
}
