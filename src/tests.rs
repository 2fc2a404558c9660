#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};
    use std::num::NonZero;
    use std::str::FromStr;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use petgraph::graphmap::UnGraphMap;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use unordered_pair::UnorderedPair;

    use crate::builder::{BuildError, BuilderInvalidReason, ParseError, SquareBoardBuilder};
    use crate::cell::{Cell, IslandSize, Label};
    use crate::cryptic::Cryptic;
    use crate::error::{ConstructionError, Defect, InvariantViolation};
    use crate::grid::GridBoard;
    use crate::location::Location;
    use crate::metrics::AcyclicPolicy;
    use crate::shape::SquareStep;
    use crate::solution::Solution;
    use crate::{Board, BoardOptions};

    fn size(n: usize) -> IslandSize {
        NonZero::new(n).unwrap()
    }

    fn grid(layout: &str) -> GridBoard {
        SquareBoardBuilder::from_str(layout).unwrap().build().unwrap()
    }

    fn rendered(board: &mut GridBoard) -> HashSet<String> {
        board.solve().iter().map(|solution| format!("{}", solution)).collect()
    }

    // two anchors of 3 with a few cells decided by hand
    fn demo_board() -> GridBoard {
        grid("3.##.
              +###+
              +#+3.")
    }

    #[test]
    fn parse_and_display() {
        let board = grid("3.##.\n+###+\n+#+3.\n");
        assert_eq!(format!("{}", board), "3.##.
+###+
+#+3.
");

        let board = grid("..A.\n.b..");
        assert_eq!(board.board().anchor_size(Location(2, 0)), Some(size(10)));
        assert_eq!(board.board().anchor_size(Location(1, 1)), Some(size(11)));
        assert_eq!(format!("{}", board), "..A.\n.B..\n");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(SquareBoardBuilder::from_str("  \n ").unwrap_err(), ParseError::Empty);
        assert_eq!(SquareBoardBuilder::from_str("...\n..\n...").unwrap_err(), ParseError::RaggedRows { row: 1, expected: 3, found: 2 });
        assert_eq!(SquareBoardBuilder::from_str("..?\n...").unwrap_err(), ParseError::BadCharacter('?'));
        assert_eq!(SquareBoardBuilder::from_str("..0\n...").unwrap_err(), ParseError::BadCharacter('0'));
    }

    #[test]
    fn solve_unique() {
        let mut board = grid("...2.
                              .....
                              ....3
                              .....
                              .4...");

        let solutions = board.solve();
        assert_eq!(solutions.len(), 1);
        assert_eq!(format!("{}", solutions[0]), "###2+
#+###
#+#+3
#+#+#
#4###
");
    }

    #[test]
    fn solve_single_row() {
        // a single row has no cycles and so no pools
        let mut board = grid("...2.");
        assert_eq!(board.board().girth(), None);

        let solutions = board.solve();
        assert_eq!(solutions.len(), 1);
        assert_eq!(format!("{}", solutions[0]), "###2+\n");
    }

    #[test]
    fn solve_none() {
        let mut board = grid("....
                              3.1.
                              ...4
                              ....");
        assert!(board.solve().is_empty());
    }

    #[test]
    fn solve_six() {
        let mut board = grid("3...\n....\n...3");
        let expected: HashSet<String> = [
            "3###\n+#+#\n+#+3\n",
            "3###\n+#++\n+##3\n",
            "3##+\n++#+\n###3\n",
            "3+##\n+##+\n##+3\n",
            "3+#+\n#+#+\n###3\n",
            "3++#\n####\n#++3\n",
        ].into_iter().map(String::from).collect();

        assert_eq!(board.solve().len(), 6);
        assert_eq!(rendered(&mut board), expected);
    }

    #[test]
    fn solve_two_islands_of_three() {
        let mut board = SquareBoardBuilder::with_dims((size(5), size(3)))
            .add_anchor(Location(0, 0), size(3))
            .add_anchor(Location(3, 2), size(3))
            .build()
            .unwrap();

        let expected: HashSet<String> = [
            "3####\n+#++#\n+##3#\n",
            "3####\n++#+#\n###3+\n",
            "3+###\n#+#+#\n###3+\n",
            "3+###\n+##+#\n##+3#\n",
        ].into_iter().map(String::from).collect();
        assert_eq!(rendered(&mut board), expected);
    }

    #[test]
    fn pools_are_pruned() {
        // the only way to complete the sea fills a 2x2 block
        let mut board = grid("1..\n...\n...");
        assert!(board.solve().is_empty());

        let mut board = grid("2.\n..");
        let solutions = board.solve();
        assert_eq!(solutions.len(), 2);
        for solution in &solutions {
            assert_eq!(solution.solution().count(Label::Water), 2);
        }
    }

    #[test]
    fn every_solution_passes_audit() {
        for layout in ["3...\n....\n...3", "...2.\n.....\n....3\n.....\n.4...", "2.\n..", ".2..\n....\n..1."] {
            let mut board = grid(layout);
            for solution in board.solve() {
                assert_eq!(board.board().audit(solution.solution()), Ok(()), "{}", solution);
            }
        }
    }

    #[test]
    fn audit_finds_defects() {
        let mut board = grid("2.\n..");
        let solution = board.solve().remove(0).into_solution();

        let mut partial = board.clone();
        partial.board_mut().set(Location(1, 0), Label::Water).unwrap();
        // the solution must agree with what the board already holds
        let conflicting = if solution.label(Location(1, 0)) == Some(Label::Land) { Err(Defect::Conflict) } else { Ok(()) };
        assert_eq!(partial.board().audit(&solution), conflicting);

        let mut flooded = grid("1..\n...\n...");
        for location in flooded.board().nodes().collect::<Vec<_>>() {
            if flooded.board().is_empty(location) {
                flooded.board_mut().set(location, Label::Water).unwrap();
            }
        }
        let all_water = flooded.board().solution().unwrap();
        flooded.board_mut().clear(Location(1, 1)).unwrap();
        assert_eq!(flooded.board().audit(&all_water), Err(Defect::Pool));

        let mut oversized = grid("1.\n..");
        oversized.board_mut().set(Location(1, 0), Label::Land).unwrap();
        oversized.board_mut().set(Location(0, 1), Label::Water).unwrap();
        oversized.board_mut().set(Location(1, 1), Label::Water).unwrap();
        let labeling = oversized.board().solution().unwrap();
        let fresh = grid("1.\n..");
        assert_eq!(fresh.board().audit(&labeling), Err(Defect::WrongSize { wanted: 1, found: 2 }));

        let unfinished = grid("1.\n..");
        assert_eq!(unfinished.board().solution(), None);
    }

    #[test]
    fn solve_is_idempotent() {
        let mut board = grid("3...\n....\n...3");
        let before = format!("{}", board);

        let first = rendered(&mut board);
        assert_eq!(format!("{}", board), before);
        let second = rendered(&mut board);
        assert_eq!(first, second);
        assert_eq!(board.board().empty_count(), 10);
    }

    #[test]
    fn solutions_do_not_alias_the_board() {
        let mut board = grid("2.\n..");
        let solutions = board.solve();
        board.board_mut().set(Location(1, 1), Label::Land).unwrap();
        for solution in &solutions {
            assert_ne!(solution.solution().label(Location(1, 1)), None);
            assert_eq!(solution.solution().count(Label::Land), 2);
        }
    }

    #[test]
    fn grid_pools() {
        let board = SquareBoardBuilder::with_dims((size(4), size(4))).build().unwrap();
        assert_eq!(board.board().girth(), Some(4));

        let counts = (0..4)
            .map(|y| (0..4).map(|x| board.board().pools_through(Location(x, y)).len().to_string()).collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(counts, vec!["1221", "2442", "2442", "1221"]);

        for pool in board.board().pools_through(Location(1, 1)) {
            assert_eq!(pool.len(), 4);
            assert!(pool.contains(&Location(1, 1)));
        }
    }

    #[test]
    fn complete_graph_pools() {
        let mut graph: UnGraphMap<u8, ()> = UnGraphMap::new();
        for a in 0..5 {
            for b in (a + 1)..5 {
                graph.add_edge(a, b, ());
            }
        }

        let board = Board::build(&graph).unwrap();
        assert_eq!(board.girth(), Some(3));
        for node in 0..5 {
            // every pair of the other four nodes closes a triangle
            let pools = board.pools_through(node);
            assert_eq!(pools.len(), 6);
            assert!(pools.iter().all(|pool| pool.len() == 3 && pool.contains(&node)));
        }
    }

    #[test]
    fn acyclic_graphs() {
        let mut tree: UnGraphMap<u8, ()> = UnGraphMap::new();
        for (a, b) in [(0, 1), (0, 2), (1, 3), (1, 4), (2, 5)] {
            tree.add_edge(a, b, ());
        }

        assert_eq!(Board::build(&tree).unwrap_err(), ConstructionError::GraphAcyclic);
        let board = Board::build_with(&tree, BoardOptions::default().acyclic(AcyclicPolicy::NoPools)).unwrap();
        assert_eq!(board.girth(), None);
        assert!(board.pools_through(3).is_empty());

        let strict = SquareBoardBuilder::from_str("...2.").unwrap().allow_acyclic(false).build();
        assert_eq!(strict.unwrap_err(), BuildError::Construction(ConstructionError::GraphAcyclic));
    }

    #[test]
    fn arbitrary_graph() {
        // a hexagon, so the only pool is all six nodes
        let mut graph: UnGraphMap<u8, ()> = UnGraphMap::new();
        for n in 0..6 {
            graph.add_edge(n, (n + 1) % 6, ());
        }

        let mut board = Board::build(&graph).unwrap();
        assert_eq!(board.girth(), Some(6));
        board.place_anchor(0, size(2)).unwrap();

        // the island is {0, 1} or {5, 0}; the rest of the ring is one stretch of sea
        let solutions = board.solve();
        assert_eq!(solutions.len(), 2);
        for solution in &solutions {
            assert_eq!(board.audit(solution), Ok(()));
            assert_eq!(solution.count(Label::Land), 2);
        }

        let mut lonely = Board::build(&graph).unwrap();
        lonely.place_anchor(0, size(1)).unwrap();
        // the other five nodes make one stretch of sea, a node short of a pool
        assert_eq!(lonely.solve().len(), 1);
    }

    #[test]
    fn anchors_are_permanent() {
        let mut board = grid("2.\n..");
        let anchor = Location(0, 0);

        assert_eq!(board.board_mut().place_anchor(anchor, size(3)), Err(ConstructionError::Occupied));
        assert_eq!(board.board_mut().place_anchor(Location(5, 5), size(3)), Err(ConstructionError::UnknownNode));
        assert_eq!(board.board_mut().clear(anchor), Err(InvariantViolation::PermanentAnchor));
        assert_eq!(board.board_mut().set(anchor, Label::Water), Err(InvariantViolation::NotEmpty));
        assert_eq!(board.board_mut().clear(Location(1, 0)), Err(InvariantViolation::AlreadyEmpty));
        assert_eq!(board.board_mut().set(Location(9, 0), Label::Land), Err(InvariantViolation::UnknownNode));

        board.board_mut().set(Location(1, 0), Label::Water).unwrap();
        assert_eq!(board.board_mut().set(Location(1, 0), Label::Land), Err(InvariantViolation::NotEmpty));
        board.board_mut().clear(Location(1, 0)).unwrap();
        assert_eq!(board.board().get(anchor), Some(Cell::Land { anchor: Some(size(2)) }));
        assert_eq!(board.board().anchor_maxsize(), 2);
    }

    #[test]
    fn explore_demo_islands() {
        let mut demo = demo_board();
        let board = demo.board_mut();

        let island = board.flood_fill_island(Location(0, 1)).unwrap();
        assert_eq!((island.size, island.escapes, island.anchors), (3, vec![Location(1, 0)], vec![Location(0, 0)]));
        assert!(board.legal_island(Location(0, 2)));

        let island = board.flood_fill_island(Location(2, 2)).unwrap();
        assert_eq!((island.size, island.escapes, island.anchors), (2, vec![Location(4, 2)], vec![Location(3, 2)]));
        assert!(board.legal_island(Location(3, 2)));

        let island = board.flood_fill_island(Location(4, 1)).unwrap();
        assert_eq!(island.size, 1);
        assert_eq!(island.escapes.len(), 2);
        assert!(island.anchors.is_empty());
        assert!(board.legal_island(Location(4, 1)));

        let island = board.flood_fill_island(Location(1, 0)).unwrap();
        assert_eq!((island.size, island.escapes), (0, vec![Location(1, 0)]));
        let island = board.flood_fill_island(Location(1, 1)).unwrap();
        assert_eq!((island.size, island.escapes.len()), (0, 0));

        assert!(board.connected_water());

        let pools = (0..3)
            .map(|y| (0..5).map(|x| if board.is_pool(Location(x, y)) { 'P' } else { '-' }).collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(pools, vec!["--PP-", "--PP-", "-----"]);

        // join both islands and wall in a lake
        board.clear(Location(1, 2)).unwrap();
        board.set(Location(1, 2), Label::Land).unwrap();
        board.clear(Location(2, 1)).unwrap();
        board.set(Location(2, 1), Label::Land).unwrap();
        board.set(Location(1, 0), Label::Land).unwrap();
        board.clear(Location(2, 0)).unwrap();
        board.clear(Location(3, 1)).unwrap();
        assert_eq!(format!("{}", demo), "3+.#.
+#+.+
+++3.
");

        let board = demo.board_mut();
        let island = board.flood_fill_island(Location(0, 0)).unwrap();
        assert_eq!(island.size, 8);
        assert_eq!(island.anchors.len(), 2);
        assert!(!board.legal_island(Location(2, 1)));
        assert!(!board.connected_water());
        assert_eq!(board.cached_water(), Some(board.recount_water()));
    }

    #[test]
    fn stamps_do_not_leak_between_fills() {
        let mut board = grid("2.2\n...");
        let board = board.board_mut();

        // both islands border the middle of the top row; the second fill must still see it
        let left = board.flood_fill_island(Location(0, 0)).unwrap();
        let right = board.flood_fill_island(Location(2, 0)).unwrap();
        assert!(left.escapes.contains(&Location(1, 0)));
        assert!(right.escapes.contains(&Location(1, 0)));
        assert_eq!(left.escapes.len(), 2);
        assert_eq!(right.escapes.len(), 2);

        // run the generation counter over its end
        board.force_stamp(u32::MAX - 1);
        for _ in 0..4 {
            let island = board.flood_fill_island(Location(0, 0)).unwrap();
            assert_eq!((island.size, island.escapes.len()), (1, 2));
            assert!(board.connected_water());
            assert!(board.recount_water());
        }
    }

    #[test]
    fn islands_cover_all_land() {
        let mut board = grid("3...\n....\n...3");
        for solution in board.solve() {
            let mut solved = board.clone();
            for (location, label) in solution.solution().iter() {
                if solved.board().is_empty(location) {
                    solved.board_mut().set(location, label).unwrap();
                }
            }

            let islands = solved.board_mut().islands();
            let total: usize = islands.iter().map(|island| island.size).sum();
            assert_eq!(total, solution.solution().count(Label::Land));
            assert_eq!(islands.len(), 2);
            assert!(islands.iter().all(|island| island.anchors.len() == 1 && island.escapes.is_empty()));
        }

        // in order of each island's first node
        let mut demo = demo_board();
        let islands = demo.board_mut().islands();
        let sizes = islands.iter().map(|island| island.size).collect::<Vec<_>>();
        assert_eq!(sizes, vec![3, 1, 2]);
    }

    #[test]
    fn linearization_covers_every_node() {
        let mut graph: UnGraphMap<u8, ()> = UnGraphMap::new();
        // two triangles with no edge between them
        for (a, b) in [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)] {
            graph.add_edge(a, b, ());
        }
        let board = Board::build(&graph).unwrap();

        let mut seen = Vec::new();
        let mut node = board.metrics().root();
        while let Some(ix) = node {
            seen.push(board.node_at(ix));
            node = board.metrics().next(ix);
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn builder_features() {
        // without its center, a 3x3 grid is a single ring of eight
        let ring = SquareBoardBuilder::with_dims((size(3), size(3)))
            .drop_location(Location(1, 1))
            .add_anchor(Location(0, 0), size(2))
            .build()
            .unwrap();
        assert_eq!(ring.board().girth(), Some(8));
        assert_eq!(ring.board().node_count(), 8);
        assert_eq!(format!("{}", ring), "2..\n. .\n...\n");

        let walled = SquareBoardBuilder::with_dims((size(3), size(3)))
            .disconnect_around(Location(1, 1), vec![SquareStep::Up, SquareStep::Left])
            .disconnect(UnorderedPair::from((Location(0, 0), Location(2, 2))))
            .build()
            .unwrap();
        // both walls touch the center, so only the bottom right square keeps all four sides
        let pools: usize = walled.board().nodes().map(|n| walled.board().pools_through(n).len()).sum();
        assert_eq!(pools, 4);
        assert_eq!(walled.board().pools_through(Location(2, 2)), vec![vec![Location(1, 1), Location(2, 1), Location(1, 2), Location(2, 2)]]);

        let popped = SquareBoardBuilder::with_dims((size(2), size(2)))
            .add_anchor(Location(0, 0), size(1))
            .add_anchor(Location(1, 1), size(1))
            .pop_anchor()
            .build()
            .unwrap();
        assert_eq!(format!("{}", popped), "1.\n..\n");
    }

    #[test]
    fn builder_invalid() {
        let mut builder = SquareBoardBuilder::with_dims((size(2), size(2)));
        builder.add_anchor(Location(2, 0), size(1));
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::FeatureOutOfBounds]));
        // further features are ignored
        builder.add_anchor(Location(0, 0), size(1));
        assert_eq!(builder.build().unwrap_err(), BuildError::Invalid(vec![BuilderInvalidReason::FeatureOutOfBounds]));

        let overlapping = SquareBoardBuilder::with_dims((size(2), size(2)))
            .add_anchor(Location(0, 0), size(1))
            .add_water(Location(0, 0))
            .build();
        assert_eq!(overlapping.unwrap_err(), BuildError::Invalid(vec![BuilderInvalidReason::FeatureOverlap]));
    }

    #[test]
    fn cancelled_search_restores_board() {
        let mut board = grid("3...\n....\n...3");
        let before = format!("{}", board);

        let flag = Arc::new(AtomicBool::new(true));
        let mut solver = board.solver().with_cancel_flag(flag);
        assert!(solver.next().is_none());
        assert!(solver.next().is_none());
        drop(solver);
        assert_eq!(format!("{}", board), before);

        // stopping after the first solution also leaves the board as it was
        let first = board.solver().next();
        assert!(first.is_some());
        assert_eq!(format!("{}", board), before);

        let mut solver = board.solver();
        let count = solver.by_ref().count();
        assert_eq!(count, 6);
        assert_eq!(solver.stats().solutions, 6);
        assert!(solver.stats().visited > 6);
    }

    #[test]
    fn cryptic_sizes() {
        let cryptic = Cryptic::parse("a..\n...\n..2").unwrap();
        assert_eq!(cryptic.unknowns(), vec!['a']);

        let found = cryptic.solve().unwrap();
        let assignments = found.iter().map(|group| group.assignment.clone()).collect::<Vec<_>>();
        assert_eq!(assignments, vec![vec![('a', size(2))], vec![('a', size(3))]]);
        assert!(found.iter().all(|group| group.solutions.len() == 2));

        let rendered = found[1].solutions.iter().map(|s| format!("{}", s)).collect::<HashSet<_>>();
        assert!(rendered.contains("3##\n+#+\n+#2\n"));

        let capped = Cryptic::parse("a..\n...\n..2").unwrap().with_max_size(size(2)).solve().unwrap();
        assert_eq!(capped.len(), 1);

        let plain = Cryptic::parse("2.\n..").unwrap().solve().unwrap();
        assert_eq!(plain.len(), 1);
        assert!(plain[0].assignment.is_empty());
    }

    #[test]
    fn cancelled_cryptic_search_skips_assignments() {
        // eight letters make 9^8 assignments; none may be generated once the flag is up
        let started = Instant::now();
        let found = Cryptic::parse("a.b.c.d\n.......\ne.f.g.h")
            .unwrap()
            .with_cancel_flag(Arc::new(AtomicBool::new(true)))
            .solve()
            .unwrap();

        assert!(found.is_empty());
        assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());
    }

    // every labeling of the empty cells which passes an audit, found without any search
    fn enumerate_solutions(board: &GridBoard) -> BTreeSet<Solution<Location>> {
        let empty = board.board().nodes().filter(|&node| board.board().is_empty(node)).collect::<Vec<_>>();
        let mut found = BTreeSet::new();

        for mask in 0u32..(1 << empty.len()) {
            let mut labeled = board.clone();
            for (bit, &node) in empty.iter().enumerate() {
                let label = if (mask >> bit) & 1 == 1 { Label::Land } else { Label::Water };
                labeled.board_mut().set(node, label).unwrap();
            }
            if let Some(solution) = labeled.board().solution() {
                if board.board().audit(&solution).is_ok() {
                    found.insert(solution);
                }
            }
        }

        found
    }

    #[test]
    fn search_matches_enumeration_on_fixed_boards() {
        for layout in ["3...\n....\n...3", "2.\n..", "...2.", "1..\n...\n..."] {
            let mut board = grid(layout);
            let expected = enumerate_solutions(&board);
            let searched = board.board_mut().solve().into_iter().collect::<BTreeSet<_>>();
            assert_eq!(searched, expected, "{}", layout);
        }
    }

    fn apply(board: &mut Board<Location>, location: Location, op: u8) {
        match board.get(location) {
            Some(Cell::Empty) => {
                let label = if op % 2 == 0 { Label::Water } else { Label::Land };
                board.set(location, label).unwrap();
            }
            Some(Cell::Land { anchor: Some(_) }) | None => {}
            Some(_) => board.clear(location).unwrap(),
        }
    }

    proptest! {
        #[test]
        fn sea_cache_matches_recount(ops in prop::collection::vec((0usize..4, 0usize..4, 0u8..4), 1..60)) {
            let mut board = grid("1...\n....\n..2.\n....");
            let board = board.board_mut();

            for (x, y, op) in ops {
                apply(board, Location(x, y), op);
                if let Some(cached) = board.cached_water() {
                    prop_assert_eq!(cached, board.recount_water());
                }
                if op >= 2 {
                    let verdict = board.connected_water();
                    prop_assert_eq!(verdict, board.recount_water());
                }
            }
        }

        #[test]
        fn search_leaves_board_untouched(cells in prop::collection::vec(0u8..6, 9)) {
            // a random 3x3 board with a few anchors and givens
            let layout = cells.chunks(3)
                .map(|row| row.iter().map(|&c| match c { 0 => '1', 1 => '2', 2 => '#', _ => '.' }).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n");
            let mut board = grid(&layout);
            let before = format!("{}", board);

            for solution in board.solve() {
                prop_assert_eq!(board.board().audit(solution.solution()), Ok(()));
            }
            prop_assert_eq!(format!("{}", board), before);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn search_finds_every_solution(
            (width, cells) in (2usize..=4, 2usize..=3)
                .prop_flat_map(|(width, height)| (Just(width), prop::collection::vec(0u8..8, width * height)))
        ) {
            let layout = cells.chunks(width)
                .map(|row| row.iter().map(|&c| match c { 0 => '1', 1 => '2', 2 => '3', 3 => '#', 4 => '+', _ => '.' }).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n");
            let mut board = grid(&layout);

            let expected = enumerate_solutions(&board);
            let searched = board.board_mut().solve().into_iter().collect::<BTreeSet<_>>();
            prop_assert_eq!(searched, expected);
        }
    }
}
