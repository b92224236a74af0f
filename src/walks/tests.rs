#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use arrow::array::{Array, Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    use crate::error::GraphError;
    use crate::graph::{GraphBuilder, GraphConfig, HeteroGraph};
    use crate::walks::{
        AlgorithmParams, BiasedRandomWalk, BiasedWalkParams, DirectedBreadthFirstNeighbours, GraphWalk,
        SampledBreadthFirstWalk, SampledHeterogeneousBreadthFirstWalk, TemporalBias, TemporalRandomWalk,
        TemporalWalkParams, UniformRandomMetaPathWalk, UniformRandomWalk,
    };

    fn create_edges(pairs: &[(&str, &str)], weights: Option<&[f64]>) -> RecordBatch {
        let sources = StringArray::from(pairs.iter().map(|(s, _)| *s).collect::<Vec<_>>());
        let targets = StringArray::from(pairs.iter().map(|(_, t)| *t).collect::<Vec<_>>());

        let mut fields = vec![
            Field::new("source", DataType::Utf8, false),
            Field::new("target", DataType::Utf8, false),
        ];
        let mut columns = vec![
            Arc::new(sources) as Arc<dyn Array>,
            Arc::new(targets) as Arc<dyn Array>,
        ];
        if let Some(weights) = weights {
            fields.push(Field::new("weight", DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(weights.to_vec())) as Arc<dyn Array>);
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
    }

    fn create_ids(ids: &[&str]) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Utf8, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(ids.to_vec())) as Arc<dyn Array>]).unwrap()
    }

    fn create_cycle_graph() -> HeteroGraph {
        HeteroGraph::from_edges(create_edges(&[("1", "2"), ("2", "3"), ("3", "4"), ("4", "1")], None)).unwrap()
    }

    // a-b-c-d path plus an isolated node z
    fn create_path_graph() -> HeteroGraph {
        HeteroGraph::new(
            create_ids(&["a", "b", "c", "d", "z"]),
            create_edges(&[("a", "b"), ("b", "c"), ("c", "d")], None),
        )
        .unwrap()
    }

    fn create_author_paper_graph() -> HeteroGraph {
        GraphBuilder::new(GraphConfig::default())
            .add_nodes("author", create_ids(&["a1", "a2", "a3"]))
            .add_nodes("paper", create_ids(&["p1", "p2", "p3"]))
            .add_edges("writes", create_edges(&[("a1", "p1"), ("a1", "p2"), ("a2", "p3")], None))
            .add_edges("cites", create_edges(&[("p1", "p2")], None))
            .build()
            .unwrap()
    }

    fn create_directed_graph() -> HeteroGraph {
        HeteroGraph::directed_from_edges(create_edges(
            &[("a", "b"), ("b", "c"), ("c", "a"), ("d", "b"), ("b", "e")],
            None,
        ))
        .unwrap()
    }

    fn is_edge(graph: &HeteroGraph, u: &str, v: &str) -> bool {
        graph.neighbors(u, None).unwrap().contains(&v)
    }

    // ------------------------------------------------------------------
    // uniform

    #[test]
    fn test_uniform_walks_follow_edges() {
        let graph = create_path_graph();
        let walker = UniformRandomWalk::new(&graph, None, Some(1)).unwrap();

        let walks = walker.run(&["a", "c"], 5, 6, Some(42)).unwrap();
        assert_eq!(walks.len(), 10);
        for (i, walk) in walks.iter().enumerate() {
            assert_eq!(walk.len(), 6);
            // grouped by root
            assert_eq!(walk[0], if i < 5 { "a" } else { "c" });
            for pair in walk.windows(2) {
                assert!(is_edge(&graph, &pair[0], &pair[1]));
            }
        }
    }

    #[test]
    fn test_uniform_walk_stops_at_isolated_node() {
        let graph = create_path_graph();
        let walker = UniformRandomWalk::new(&graph, None, Some(1)).unwrap();

        let walks = walker.run(&["z"], 3, 10, Some(42)).unwrap();
        assert_eq!(walks, vec![vec!["z".to_string()]; 3]);
    }

    #[test]
    fn test_uniform_walk_seed_is_deterministic() {
        let graph = create_cycle_graph();
        let walker = UniformRandomWalk::new(&graph, None, Some(1)).unwrap();

        let first = walker.run(&["1", "3"], 4, 8, Some(7)).unwrap();
        let second = walker.run(&["1", "3"], 4, 8, Some(7)).unwrap();
        assert_eq!(first, second);

        // persistent generators seeded alike stay in step
        let a = UniformRandomWalk::new(&graph, None, Some(99)).unwrap();
        let b = UniformRandomWalk::new(&graph, None, Some(99)).unwrap();
        assert_eq!(a.run(&["1"], 4, 8, None).unwrap(), b.run(&["1"], 4, 8, None).unwrap());
        assert_eq!(a.run(&["2"], 4, 8, None).unwrap(), b.run(&["2"], 4, 8, None).unwrap());
    }

    #[test]
    fn test_empty_roots_give_empty_result() {
        let graph = create_cycle_graph();
        let walker = UniformRandomWalk::new(&graph, None, Some(1)).unwrap();
        let roots: Vec<&str> = Vec::new();

        assert!(walker.run(&roots, 1, 5, Some(1)).unwrap().is_empty());
    }

    #[test]
    fn test_walk_parameter_validation() {
        let graph = create_cycle_graph();
        let walker = UniformRandomWalk::new(&graph, None, Some(1)).unwrap();

        assert!(matches!(
            walker.run(&["1"], 0, 5, Some(1)),
            Err(GraphError::InvalidParameter(_))
        ));
        assert!(matches!(
            walker.run(&["1"], 1, 0, Some(1)),
            Err(GraphError::InvalidParameter(_))
        ));

        let err = walker.run(&["1", "x", "2", "y"], 1, 5, Some(1)).unwrap_err();
        assert_eq!(err.missing_ids(), Some(&["x".to_string(), "y".to_string()][..]));
    }

    #[test]
    fn test_uniform_execute_returns_table() {
        let graph = create_path_graph();
        let walker = UniformRandomWalk::new(&graph, None, Some(1)).unwrap();
        let params = AlgorithmParams::new()
            .with_param("nodes", vec!["a", "z"])
            .and_then(|p| p.with_param("n", 2))
            .and_then(|p| p.with_param("length", 3))
            .and_then(|p| p.with_param("seed", 5))
            .unwrap();

        let batch = walker.execute(&params).unwrap();
        // two walks of 3 from "a", two singleton walks from "z"
        assert_eq!(batch.num_rows(), 8);
        assert_eq!(batch.schema().field(3).name(), "node_id");
        assert_eq!(walker.name(), "uniform_random_walk");
    }

    fn malformed_key(result: crate::error::Result<RecordBatch>) -> String {
        match result {
            Err(GraphError::InvalidParameter(msg)) => msg,
            other => panic!("expected a parameter error, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_rejects_malformed_parameters() {
        let graph = create_cycle_graph();
        let walker = UniformRandomWalk::new(&graph, None, Some(1)).unwrap();

        for (json, key) in [
            (r#"{"nodes": ["1"], "seed": -5}"#, "'seed'"),
            (r#"{"nodes": ["1"], "length": -4}"#, "'length'"),
            (r#"{"nodes": ["1"], "n": 2.5}"#, "'n'"),
            (r#"{"nodes": "1"}"#, "'nodes'"),
        ] {
            let params = AlgorithmParams::from_json(json).unwrap();
            let msg = malformed_key(walker.execute(&params));
            assert!(msg.contains(key), "{} not named in: {}", key, msg);
        }

        // null reads as absent
        let params = AlgorithmParams::from_json(r#"{"nodes": ["1"], "length": 3, "seed": null}"#).unwrap();
        assert_eq!(walker.execute(&params).unwrap().num_rows(), 3);

        let temporal = TemporalRandomWalk::new(&graph, None, Some(1)).unwrap();
        let params =
            AlgorithmParams::from_json(r#"{"num_cw": 2, "cw_size": 2, "walk_bias": "softmax", "seed": 1}"#).unwrap();
        assert!(malformed_key(temporal.execute(&params)).contains("'walk_bias'"));

        let sampler = SampledBreadthFirstWalk::new(&graph, None, Some(1)).unwrap();
        let params = AlgorithmParams::from_json(r#"{"nodes": ["1"]}"#).unwrap();
        assert!(malformed_key(sampler.execute(&params)).contains("missing parameter 'n_size'"));
    }

    // ------------------------------------------------------------------
    // biased

    #[test]
    fn test_biased_walk_on_cycle_never_returns() {
        let graph = create_cycle_graph();
        let walker = BiasedRandomWalk::new(&graph, None, Some(1)).unwrap();
        let params = BiasedWalkParams {
            n: 1000,
            length: 4,
            p: 1e100,
            q: 1e-100,
            seed: Some(42),
            ..Default::default()
        };

        let walks = walker.run(&["1"], params).unwrap();
        assert_eq!(walks.len(), 1000);

        let clockwise: Vec<String> = ["1", "2", "3", "4"].iter().map(|s| s.to_string()).collect();
        let anticlockwise: Vec<String> = ["1", "4", "3", "2"].iter().map(|s| s.to_string()).collect();
        let distinct: HashSet<&Vec<String>> = walks.iter().collect();
        for walk in &walks {
            assert!(walk == &clockwise || walk == &anticlockwise, "unexpected walk {:?}", walk);
        }
        assert_eq!(distinct.len(), 2);
    }

    #[test]
    fn test_biased_weighted_with_unit_weights_matches_unweighted() {
        let pairs = [("1", "2"), ("2", "3"), ("3", "4"), ("4", "1"), ("1", "3")];
        let plain = HeteroGraph::from_edges(create_edges(&pairs, None)).unwrap();
        let unit = HeteroGraph::from_edges(create_edges(&pairs, Some(&[1.0; 5]))).unwrap();

        let params = BiasedWalkParams {
            n: 20,
            length: 10,
            p: 0.5,
            q: 2.0,
            seed: Some(3),
            ..Default::default()
        };

        let unweighted = BiasedRandomWalk::new(&plain, None, Some(1))
            .unwrap()
            .run(&["1", "2"], params)
            .unwrap();
        let weighted = BiasedRandomWalk::new(&unit, None, Some(1))
            .unwrap()
            .run(&["1", "2"], BiasedWalkParams { weighted: true, ..params })
            .unwrap();
        assert_eq!(unweighted, weighted);
    }

    #[test]
    fn test_biased_walk_zero_weight_edges_are_never_taken() {
        let graph = HeteroGraph::from_edges(create_edges(
            &[("a", "b"), ("b", "c"), ("b", "d")],
            Some(&[1.0, 1.0, 0.0]),
        ))
        .unwrap();
        let walker = BiasedRandomWalk::new(&graph, None, Some(1)).unwrap();
        let params = BiasedWalkParams {
            n: 50,
            length: 3,
            weighted: true,
            seed: Some(11),
            ..Default::default()
        };

        for walk in walker.run(&["a"], params).unwrap() {
            assert_ne!(walk.get(2).map(String::as_str), Some("d"));
        }
    }

    #[test]
    fn test_biased_walk_first_step_follows_edge_weights() {
        let graph = HeteroGraph::from_edges(create_edges(
            &[("a", "b"), ("b", "c"), ("b", "d")],
            Some(&[1.0, 1.0, 0.0]),
        ))
        .unwrap();
        let walker = BiasedRandomWalk::new(&graph, None, Some(1)).unwrap();
        let params = BiasedWalkParams {
            n: 200,
            length: 2,
            weighted: true,
            seed: Some(5),
            ..Default::default()
        };

        let walks = walker.run(&["b"], params).unwrap();
        assert!(walks.iter().all(|walk| walk[1] != "d"));
        // both positive-weight neighbours are still reachable
        let firsts: HashSet<&str> = walks.iter().map(|walk| walk[1].as_str()).collect();
        assert_eq!(firsts, HashSet::from(["a", "c"]));
    }

    #[test]
    fn test_biased_walk_rejects_bad_parameters() {
        let graph = create_cycle_graph();
        let walker = BiasedRandomWalk::new(&graph, None, Some(1)).unwrap();

        for (p, q) in [(0.0, 1.0), (1.0, -1.0), (f64::NAN, 1.0)] {
            let params = BiasedWalkParams {
                p,
                q,
                seed: Some(1),
                ..Default::default()
            };
            assert!(matches!(walker.run(&["1"], params), Err(GraphError::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_biased_walk_rejects_invalid_edge_weights() {
        let graph = HeteroGraph::from_edges(create_edges(
            &[("a", "b"), ("b", "c"), ("c", "a")],
            Some(&[1.0, -2.0, f64::INFINITY]),
        ))
        .unwrap();
        let walker = BiasedRandomWalk::new(&graph, None, Some(1)).unwrap();
        let params = BiasedWalkParams {
            weighted: true,
            seed: Some(1),
            ..Default::default()
        };

        match walker.run(&["a"], params) {
            Err(GraphError::DataIntegrity(msg)) => {
                assert!(msg.contains("\"b\"--\"c\""));
                assert!(msg.contains("\"c\"--\"a\""));
            }
            other => panic!("expected a data integrity error, got {:?}", other),
        }

        // unweighted walks ignore the weights entirely
        let unweighted = BiasedWalkParams {
            seed: Some(1),
            ..Default::default()
        };
        assert!(walker.run(&["a"], unweighted).is_ok());
    }

    #[test]
    fn test_biased_walk_rejects_ambiguous_parallel_edges() {
        let graph = HeteroGraph::from_edges(create_edges(&[("a", "b"), ("b", "a")], Some(&[1.0, 2.0]))).unwrap();
        let walker = BiasedRandomWalk::new(&graph, None, Some(1)).unwrap();
        let params = BiasedWalkParams {
            weighted: true,
            seed: Some(1),
            ..Default::default()
        };

        assert!(matches!(walker.run(&["a"], params), Err(GraphError::DataIntegrity(_))));

        // the same pair in a directed graph is two different edges
        let directed =
            HeteroGraph::directed_from_edges(create_edges(&[("a", "b"), ("b", "a")], Some(&[1.0, 2.0]))).unwrap();
        let walker = BiasedRandomWalk::new(&directed, None, Some(1)).unwrap();
        assert!(walker.run(&["a"], params).is_ok());
    }

    // ------------------------------------------------------------------
    // metapath

    #[test]
    fn test_metapath_walks_follow_node_types() {
        let graph = create_author_paper_graph();
        let walker = UniformRandomMetaPathWalk::new(&graph, None, Some(1)).unwrap();
        let metapaths = vec![
            vec!["author".to_string(), "paper".to_string(), "author".to_string()],
            vec!["paper".to_string(), "paper".to_string()],
        ];

        let walks = walker.run(&["a1", "p1"], 3, 5, &metapaths, Some(8)).unwrap();
        // one metapath starts with each root's type
        assert_eq!(walks.len(), 6);

        for walk in &walks[..3] {
            assert_eq!(walk[0], "a1");
            for (step, node) in walk.iter().enumerate() {
                let expected = if step % 2 == 0 { "author" } else { "paper" };
                assert_eq!(graph.node_type(node).unwrap(), expected);
            }
            for pair in walk.windows(2) {
                assert!(is_edge(&graph, &pair[0], &pair[1]));
            }
        }
        for walk in &walks[3..] {
            assert_eq!(walk[0], "p1");
            for node in walk {
                assert_eq!(graph.node_type(node).unwrap(), "paper");
            }
        }
    }

    #[test]
    fn test_metapath_walk_stops_without_matching_neighbour() {
        let graph = create_author_paper_graph();
        let walker = UniformRandomMetaPathWalk::new(&graph, None, Some(1)).unwrap();
        let metapaths = vec![vec!["paper".to_string(), "paper".to_string()]];

        // p3 only has an author neighbour
        let walks = walker.run(&["p3"], 2, 4, &metapaths, Some(1)).unwrap();
        assert_eq!(walks, vec![vec!["p3".to_string()]; 2]);

        // a3 has no neighbours at all, and no metapath starts with p1's type
        let author_paths = vec![vec!["author".to_string(), "paper".to_string(), "author".to_string()]];
        let walks = walker.run(&["a3", "p1"], 1, 4, &author_paths, Some(1)).unwrap();
        assert_eq!(walks, vec![vec!["a3".to_string()]]);
    }

    #[test]
    fn test_metapath_validation() {
        let graph = create_author_paper_graph();
        let walker = UniformRandomMetaPathWalk::new(&graph, None, Some(1)).unwrap();

        let too_short = vec![vec!["author".to_string()]];
        assert!(matches!(
            walker.run(&["a1"], 1, 5, &too_short, Some(1)),
            Err(GraphError::InvalidParameter(_))
        ));

        let open = vec![vec!["author".to_string(), "paper".to_string()]];
        assert!(matches!(
            walker.run(&["a1"], 1, 5, &open, Some(1)),
            Err(GraphError::InvalidParameter(_))
        ));
    }

    // ------------------------------------------------------------------
    // breadth-first

    #[test]
    fn test_breadth_first_sample_has_fixed_shape() {
        let graph = create_path_graph();
        let sampler = SampledBreadthFirstWalk::new(&graph, None, Some(1)).unwrap();

        let samples = sampler.run(&["a", "b", "z"], &[2, 3], 2, Some(4)).unwrap();
        assert_eq!(samples.len(), 6);
        for sample in &samples {
            assert_eq!(sample.len(), 1 + 2 + 2 * 3);
        }

        // first level holds neighbours of the root
        for sample in &samples[..2] {
            assert_eq!(sample[0].as_deref(), Some("a"));
            assert!(sample[1..3].iter().all(|n| n.as_deref() == Some("b")));
        }

        // an isolated root pads every slot below it
        for sample in &samples[4..] {
            assert_eq!(sample[0].as_deref(), Some("z"));
            assert!(sample[1..].iter().all(Option::is_none));
        }
    }

    #[test]
    fn test_breadth_first_validation_and_output() {
        let graph = create_path_graph();
        let sampler = SampledBreadthFirstWalk::new(&graph, None, Some(1)).unwrap();

        assert!(matches!(sampler.run(&["a"], &[], 1, Some(1)), Err(GraphError::InvalidParameter(_))));

        let params = AlgorithmParams::new()
            .with_param("nodes", vec!["z"])
            .and_then(|p| p.with_param("n_size", vec![2]))
            .and_then(|p| p.with_param("seed", 1))
            .unwrap();
        let batch = sampler.execute(&params).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.column(3).null_count(), 2);
    }

    #[test]
    fn test_heterogeneous_breadth_first_sample_structure() {
        let graph = create_author_paper_graph();
        let sampler = SampledHeterogeneousBreadthFirstWalk::new(&graph, None, Some(1)).unwrap();

        let samples = sampler.run(&["a1"], &[2, 1], 3, Some(5)).unwrap();
        assert_eq!(samples.len(), 3);

        for sample in &samples {
            // [root], [papers], then per paper: [cited papers], [authors]
            assert_eq!(sample.len(), 1 + 1 + 2 * 2);
            assert_eq!(sample[0], vec![Some("a1".to_string())]);
            assert_eq!(sample[1].len(), 2);
            for paper in &sample[1] {
                let paper = paper.as_deref().unwrap();
                assert!(paper == "p1" || paper == "p2");
            }
            for (i, paper) in sample[1].iter().enumerate() {
                let paper = paper.as_deref().unwrap();
                let cited = sample[2 + 2 * i][0].as_deref().unwrap();
                let author = sample[3 + 2 * i][0].as_deref().unwrap();
                assert_eq!(cited, if paper == "p1" { "p2" } else { "p1" });
                assert_eq!(author, "a1");
            }
        }
    }

    #[test]
    fn test_heterogeneous_breadth_first_pads_missing_neighbours() {
        let graph = create_author_paper_graph();
        let sampler = SampledHeterogeneousBreadthFirstWalk::new(&graph, None, Some(1)).unwrap();

        let samples = sampler.run(&["a3"], &[2, 2], 1, Some(5)).unwrap();
        let sample = &samples[0];
        assert_eq!(sample[0], vec![Some("a3".to_string())]);
        assert_eq!(sample[1], vec![None, None]);
        // each padding paper still fans out through both paper edge types
        assert_eq!(sample.len(), 1 + 1 + 2 * 2);
        assert!(sample[2..].iter().all(|level| level == &vec![None, None]));
    }

    #[test]
    fn test_heterogeneous_breadth_first_ignores_edge_order() {
        let build = |writes: &[(&str, &str)]| {
            GraphBuilder::new(GraphConfig::default())
                .add_nodes("author", create_ids(&["a1", "a2", "a3"]))
                .add_nodes("paper", create_ids(&["p1", "p2", "p3"]))
                .add_edges("writes", create_edges(writes, None))
                .add_edges("cites", create_edges(&[("p1", "p2")], None))
                .build()
                .unwrap()
        };
        let forward = build(&[("a1", "p1"), ("a1", "p2"), ("a2", "p3"), ("a2", "p1")]);
        let reversed = build(&[("a2", "p1"), ("a2", "p3"), ("a1", "p2"), ("a1", "p1")]);

        let sample = |graph: &HeteroGraph| {
            SampledHeterogeneousBreadthFirstWalk::new(graph, None, Some(1))
                .unwrap()
                .run(&["a1", "a2", "p1"], &[3, 2], 10, Some(23))
                .unwrap()
        };
        assert_eq!(sample(&forward), sample(&reversed));
    }

    #[test]
    fn test_samplers_are_reproducible_with_seed() {
        let graph = create_author_paper_graph();

        let bfs = SampledBreadthFirstWalk::new(&graph, None, Some(1)).unwrap();
        assert_eq!(
            bfs.run(&["a1", "p1"], &[3, 2], 5, Some(31)).unwrap(),
            bfs.run(&["a1", "p1"], &[3, 2], 5, Some(31)).unwrap()
        );

        let hetero = SampledHeterogeneousBreadthFirstWalk::new(&graph, None, Some(1)).unwrap();
        assert_eq!(
            hetero.run(&["a1", "p2"], &[2, 2], 5, Some(31)).unwrap(),
            hetero.run(&["a1", "p2"], &[2, 2], 5, Some(31)).unwrap()
        );

        let metapaths = vec![vec!["author".to_string(), "paper".to_string(), "author".to_string()]];
        let metapath = UniformRandomMetaPathWalk::new(&graph, None, Some(1)).unwrap();
        assert_eq!(
            metapath.run(&["a1", "a2"], 5, 7, &metapaths, Some(31)).unwrap(),
            metapath.run(&["a1", "a2"], 5, 7, &metapaths, Some(31)).unwrap()
        );

        let directed = create_directed_graph();
        let neighbours = DirectedBreadthFirstNeighbours::new(&directed, None, Some(1)).unwrap();
        assert_eq!(
            neighbours.run(&["a", "b"], &[2, 2], &[2, 1], 5, Some(31)).unwrap(),
            neighbours.run(&["a", "b"], &[2, 2], &[2, 1], 5, Some(31)).unwrap()
        );
    }

    #[test]
    fn test_samplers_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UniformRandomWalk<'static>>();
        assert_send_sync::<BiasedRandomWalk<'static>>();
        assert_send_sync::<SampledHeterogeneousBreadthFirstWalk<'static>>();
        assert_send_sync::<DirectedBreadthFirstNeighbours<'static>>();
        assert_send_sync::<TemporalRandomWalk<'static>>();
    }

    // ------------------------------------------------------------------
    // directed breadth-first

    #[test]
    fn test_directed_breadth_first_requires_directed_graph() {
        let graph = create_cycle_graph();
        assert!(matches!(
            DirectedBreadthFirstNeighbours::new(&graph, None, Some(1)),
            Err(GraphError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_directed_breadth_first_slots() {
        let graph = create_directed_graph();
        let sampler = DirectedBreadthFirstNeighbours::new(&graph, None, Some(1)).unwrap();

        let samples = sampler.run(&["b", "a"], &[2, 1], &[1, 2], 4, Some(17)).unwrap();
        assert_eq!(samples.len(), 8);

        for sample in &samples {
            assert_eq!(sample.len(), 7);
            let sizes: Vec<usize> = sample.iter().map(Vec::len).collect();
            assert_eq!(sizes, vec![1, 2, 1, 2, 4, 1, 2]);

            // slot 2s+1 holds in-neighbours of slot s, slot 2s+2 out-neighbours
            for slot in 1..sample.len() {
                let parent = (slot - 1) / 2;
                let incoming = slot % 2 == 1;
                for node in sample[slot].iter().flatten() {
                    let reachable = sample[parent].iter().flatten().any(|p| {
                        let neighbours = if incoming {
                            graph.in_nodes(p, None).unwrap()
                        } else {
                            graph.out_nodes(p, None).unwrap()
                        };
                        neighbours.contains(&node.as_str())
                    });
                    assert!(reachable, "{} is not reachable from slot {}", node, parent);
                }
            }
        }
    }

    #[test]
    fn test_directed_breadth_first_pads_missing_directions() {
        let graph = create_directed_graph();
        let sampler = DirectedBreadthFirstNeighbours::new(&graph, None, Some(1)).unwrap();

        // d has no in-neighbours
        let samples = sampler.run(&["d"], &[1], &[1], 1, Some(2)).unwrap();
        assert_eq!(
            samples[0],
            vec![vec![Some("d".to_string())], vec![None], vec![Some("b".to_string())]]
        );

        assert!(matches!(
            sampler.run(&["d"], &[1, 1], &[1], 1, Some(2)),
            Err(GraphError::InvalidParameter(_))
        ));

        // the slot count no longer fits in a usize
        let hops = vec![1; 63];
        assert!(matches!(
            sampler.run(&["d"], &hops, &hops, 1, Some(2)),
            Err(GraphError::InvalidParameter(_))
        ));
    }

    // ------------------------------------------------------------------
    // temporal

    fn edge_time(graph: &HeteroGraph, u: &str, v: &str) -> f64 {
        let weights = graph.edge_weights(u, v).unwrap();
        assert_eq!(weights.len(), 1);
        weights[0]
    }

    fn create_temporal_graph() -> HeteroGraph {
        HeteroGraph::from_edges(create_edges(
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e"), ("b", "d"), ("c", "e")],
            Some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        ))
        .unwrap()
    }

    #[test]
    fn test_temporal_walks_respect_time() {
        let graph = create_temporal_graph();
        let walker = TemporalRandomWalk::new(&graph, None, Some(1)).unwrap();
        let mut params = TemporalWalkParams::new(40, 3);
        params.max_walk_length = Some(5);
        params.seed = Some(9);

        let walks = walker.run(params).unwrap();
        let windows: usize = walks.iter().map(|w| w.len() - 3 + 1).sum();
        assert!(windows >= 40);

        for walk in &walks {
            assert!(walk.len() >= 3 && walk.len() <= 5);
            let times: Vec<f64> = walk.windows(2).map(|p| edge_time(&graph, &p[0], &p[1])).collect();
            for pair in times.windows(2) {
                assert!(pair[0] < pair[1], "times {:?} in walk {:?}", times, walk);
            }
        }
    }

    #[test]
    fn test_temporal_walks_with_biases() {
        let graph = create_temporal_graph();
        let walker = TemporalRandomWalk::new(&graph, None, Some(1))
            .unwrap()
            .with_initial_edge_bias(Some(TemporalBias::Exponential))
            .with_walk_bias(Some(TemporalBias::Exponential));
        let mut params = TemporalWalkParams::new(20, 2);
        params.seed = Some(4);

        let first = walker.run(params).unwrap();
        let second = walker.run(params).unwrap();
        assert_eq!(first, second);
        for walk in &first {
            let times: Vec<f64> = walk.windows(2).map(|p| edge_time(&graph, &p[0], &p[1])).collect();
            assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn test_temporal_walk_aborts_when_walks_keep_failing() {
        // every edge has the same time, so no walk gets past its first edge
        let graph = HeteroGraph::from_edges(create_edges(
            &[("a", "b"), ("b", "c"), ("c", "a")],
            Some(&[1.0, 1.0, 1.0]),
        ))
        .unwrap();
        let walker = TemporalRandomWalk::new(&graph, None, Some(1)).unwrap();
        let mut params = TemporalWalkParams::new(10, 3);
        params.seed = Some(1);

        match walker.run(params) {
            Err(GraphError::NonConvergence { successes, failures, .. }) => {
                assert_eq!(successes, 0);
                // first failure count where the 95% quantile of Beta(1, 1 + f) drops below 0.01
                assert!((297..=299).contains(&failures), "failures = {}", failures);
            }
            other => panic!("expected non-convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_temporal_walk_validation() {
        let graph = create_temporal_graph();
        let walker = TemporalRandomWalk::new(&graph, None, Some(1)).unwrap();

        let invalid = [
            TemporalWalkParams::new(0, 3),
            TemporalWalkParams::new(5, 1),
            TemporalWalkParams {
                max_walk_length: Some(2),
                ..TemporalWalkParams::new(5, 3)
            },
            TemporalWalkParams {
                p_walk_success_threshold: Some(1.0),
                ..TemporalWalkParams::new(5, 3)
            },
        ];
        for params in invalid {
            assert!(
                matches!(walker.run(params), Err(GraphError::InvalidParameter(_))),
                "{:?} should be rejected",
                params
            );
        }

        let edgeless = HeteroGraph::new(create_ids(&["a", "b"]), create_edges(&[], None)).unwrap();
        let walker = TemporalRandomWalk::new(&edgeless, None, Some(1)).unwrap();
        assert!(matches!(
            walker.run(TemporalWalkParams::new(5, 2)),
            Err(GraphError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_temporal_execute_parses_bias() {
        let graph = create_temporal_graph();
        let walker = TemporalRandomWalk::new(&graph, None, Some(1)).unwrap();
        let params = AlgorithmParams::from_json(
            r#"{"num_cw": 5, "cw_size": 2, "walk_bias": "exponential", "seed": 3}"#,
        )
        .unwrap();

        let batch = walker.execute(&params).unwrap();
        assert!(batch.num_rows() >= 2);
        assert_eq!(walker.name(), "temporal_random_walk");
    }
}
