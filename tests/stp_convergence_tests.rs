#[cfg(test)]
mod stp_convergence_tests {
    use std::collections::BTreeSet;

    use bridgesim::orchestrator::{run_simulation, RunSettings};
    use bridgesim::report::render_roles;
    use bridgesim::stp::{converge, BridgeId, PortRole, Topology};
    use bridgesim::topology_parser::parse_topology;
    use bridgesim::trace::{NullObserver, TraceRecorder};

    const TRIANGLE: &str = "0\n3\nB1: X Y\nB2: X Z\nB3: Y Z\n";

    // Redundant links: A-G-F-E and B-C-D hang off two loops through B4
    const MESHED: &str = "\
0
5
B1: A G B
B2: G F
B3: B C
B4: C F E
B5: C D
";

    fn topology(text: &str) -> Topology {
        let input = parse_topology(text).unwrap();
        Topology::from_description(&input.description).unwrap()
    }

    fn converged(text: &str) -> Topology {
        let mut topology = topology(text);
        let report = converge(&mut topology, &mut NullObserver);
        assert!(report.converged, "topology did not converge: {:?}", report);
        topology
    }

    /// Every bridge agrees on a single root, the smallest id
    fn assert_single_root(topology: &Topology) {
        let expected = topology.bridges().map(|b| b.id().clone()).min().unwrap();
        assert_eq!(topology.roots(), vec![expected.clone()]);
        for bridge in topology.bridges() {
            assert_eq!(bridge.believed_root(), &expected, "bridge {}", bridge.id());
        }
    }

    /// Non-root bridges have exactly one root port, the root has none
    fn assert_root_ports(topology: &Topology) {
        for bridge in topology.bridges() {
            let root_ports: Vec<_> = bridge
                .roles()
                .into_iter()
                .filter(|a| a.role == PortRole::Root)
                .collect();
            if bridge.is_root() {
                assert!(root_ports.is_empty(), "root {} has a root port", bridge.id());
                assert_eq!(bridge.distance_from_root(), 0);
            } else {
                assert_eq!(root_ports.len(), 1, "bridge {}", bridge.id());
                assert_eq!(Some(root_ports[0].port.as_str()), bridge.root_port());
            }
        }
    }

    /// Each segment with attached bridges has exactly one designated bridge
    fn assert_one_designated_per_segment(topology: &Topology) {
        for segment in topology.segments() {
            if segment.attached_bridges().next().is_none() {
                continue;
            }
            assert_eq!(segment.designated_bridges().len(), 1, "segment {}", segment.name());
        }
    }

    #[test]
    fn test_triangle_blocks_one_port() {
        let input = parse_topology(TRIANGLE).unwrap();
        let report = run_simulation(&input, RunSettings::default(), &mut NullObserver).unwrap();

        assert!(report.convergence.converged);
        assert_eq!(report.convergence.roots, vec![BridgeId::from("B1")]);
        assert_eq!(
            render_roles(&report),
            vec!["B1: X-DP Y-DP", "B2: X-RP Z-DP", "B3: Y-RP Z-NP"]
        );
    }

    #[test]
    fn test_triangle_invariants() {
        let topology = converged(TRIANGLE);
        assert_single_root(&topology);
        assert_root_ports(&topology);
        assert_one_designated_per_segment(&topology);
        assert_eq!(topology.bridge("B3").unwrap().distance_from_root(), 1);
    }

    #[test]
    fn test_meshed_invariants() {
        let topology = converged(MESHED);
        assert_single_root(&topology);
        assert_root_ports(&topology);
        assert_one_designated_per_segment(&topology);

        let distances: Vec<u32> = ["B1", "B2", "B3", "B4", "B5"]
            .iter()
            .map(|id| topology.bridge(id).unwrap().distance_from_root())
            .collect();
        assert_eq!(distances, vec![0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_meshed_tree_has_no_loop() {
        let topology = converged(MESHED);

        // A spanning tree over bridges and segments has one edge fewer than nodes
        let nodes = topology.bridge_count()
            + topology.segments().filter(|s| s.attached_bridges().next().is_some()).count();
        let active_edges: usize = topology
            .bridges()
            .map(|b| b.roles().iter().filter(|a| a.role.is_forwarding()).count())
            .sum();
        assert_eq!(active_edges, nodes - 1);
    }

    #[test]
    fn test_root_uses_natural_id_order() {
        let topology = converged("0\n3\nB10: A B\nB2: B C\nB7: C A\n");
        assert_eq!(topology.roots(), vec![BridgeId::from("B2")]);
        assert_root_ports(&topology);
    }

    #[test]
    fn test_disconnected_components_elect_own_roots() {
        let topology = converged("0\n4\nB1: A\nB2: A\nB3: C\nB4: C\n");
        assert_eq!(topology.roots(), vec![BridgeId::from("B1"), BridgeId::from("B3")]);
        assert_eq!(topology.bridge("B4").unwrap().believed_root(), &BridgeId::from("B3"));
    }

    #[test]
    fn test_converged_topology_stays_quiet() {
        let mut topology = topology(MESHED);
        let report = converge(&mut topology, &mut NullObserver);
        assert!(report.converged);
        let roles = topology.roles();

        let mut recorder = TraceRecorder::new();
        for round in report.rounds..report.rounds + 3 {
            assert!(topology.step(round, &mut recorder));
        }
        assert!(recorder.events.is_empty());
        assert_eq!(topology.roles(), roles);
    }

    #[test]
    fn test_rounds_stay_within_cap() {
        let mut topology = topology(MESHED);
        let report = converge(&mut topology, &mut NullObserver);
        assert!(report.rounds <= 2 * topology.bridge_count());
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let input = parse_topology(MESHED).unwrap();
        let parallel = run_simulation(&input, RunSettings::default(), &mut NullObserver).unwrap();
        let sequential = run_simulation(
            &input,
            RunSettings { parallel: false, ..RunSettings::default() },
            &mut NullObserver,
        )
        .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_trace_starts_with_root_announcements() {
        let mut topology = topology(TRIANGLE);
        let mut recorder = TraceRecorder::new();
        converge(&mut topology, &mut recorder);

        let lines = recorder.lines();
        assert!(lines.contains(&"0 s B1 (B1 0 B1)".to_string()));
        assert!(lines.contains(&"1 r B2 (B1 0 B1)".to_string()));

        let senders: BTreeSet<&str> = recorder
            .events
            .iter()
            .filter(|e| e.round == 0)
            .map(|e| e.bridge.as_str())
            .collect();
        assert_eq!(senders.len(), 3);
    }
}
