use std::collections::HashSet;

use portal_trace::trace::{
    LinkWeights, NodeCategory, NodeResponse, TraceRecord, build_graph, build_graph_with,
    reconstruct_route,
};
use proptest::prelude::*;

const POOL: usize = 8;

fn node(index: usize) -> String {
    format!("n{index}")
}

fn arb_response() -> impl Strategy<Value = (usize, Option<u64>, Vec<usize>)> {
    (
        0..POOL,
        proptest::option::weighted(0.9, 0u64..50),
        prop::collection::vec(0..POOL, 0..4),
    )
}

fn arb_trace() -> impl Strategy<Value = TraceRecord> {
    (
        0..POOL,
        0..POOL,
        prop::collection::vec(arb_response(), 1..10),
    )
        .prop_map(|(origin, found_at, responses)| {
            let mut trace = TraceRecord::new(node(origin), Some(node(found_at).as_str()));
            for (id, timestamp_ms, forwarded_to) in responses {
                trace.insert_response(
                    node(id),
                    NodeResponse {
                        timestamp_ms,
                        forwarded_to: forwarded_to.into_iter().map(node).collect(),
                    },
                );
            }
            trace
        })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

    #[test]
    fn route_runs_from_origin_to_found_at_without_repeats(trace in arb_trace()) {
        let route = reconstruct_route(&trace);
        if route.is_empty() {
            return Ok(());
        }

        prop_assert_eq!(route.first(), trace.origin.as_ref());
        prop_assert_eq!(route.last(), trace.found_at.as_ref());

        let unique = route.iter().collect::<HashSet<_>>();
        prop_assert_eq!(unique.len(), route.len());
    }

    #[test]
    fn route_hops_follow_forward_links(trace in arb_trace()) {
        let route = reconstruct_route(&trace);
        for pair in route.windows(2) {
            let response = trace.response(&pair[0]);
            prop_assert!(response.is_some());
            let response = response.unwrap();
            prop_assert!(response.timestamp_ms.is_some());
            prop_assert!(response.forwards_to(&pair[1]));
        }
    }

    #[test]
    fn forward_only_nodes_are_unseen_or_terminus(trace in arb_trace()) {
        let graph = build_graph(&trace);
        for descriptor in &graph.nodes {
            if trace.response(&descriptor.id).is_none() {
                prop_assert!(matches!(
                    descriptor.category,
                    NodeCategory::Unseen | NodeCategory::Terminus
                ));
                prop_assert_eq!(descriptor.timestamp_ms, None);
            }
        }
    }

    #[test]
    fn every_forward_becomes_one_link_between_known_nodes(trace in arb_trace()) {
        let graph = build_graph(&trace);
        let ids = graph.nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
        prop_assert_eq!(ids.len(), graph.nodes.len());

        let forwards = trace
            .responses
            .iter()
            .map(|(_, response)| response.forwarded_to.len())
            .sum::<usize>();
        prop_assert_eq!(graph.links.len(), forwards);

        for link in &graph.links {
            prop_assert!(ids.contains(link.source.as_str()));
            prop_assert!(ids.contains(link.target.as_str()));
        }
    }

    #[test]
    fn route_hops_carry_route_weight(trace in arb_trace(), route_weight in 2u32..100) {
        let weights = LinkWeights { route: route_weight, ..LinkWeights::default() };
        let graph = build_graph_with(&trace, weights);
        for pair in graph.route.windows(2) {
            let hop = graph
                .links
                .iter()
                .find(|link| link.source == pair[0] && link.target == pair[1]);
            prop_assert_eq!(hop.map(|link| link.weight), Some(route_weight));
        }
        for link in &graph.links {
            prop_assert!(link.weight == route_weight || link.weight == weights.baseline);
        }
    }

    #[test]
    fn equal_timestamp_predecessors_resolve_by_record_order(
        shared_ms in 1u64..1_000,
        b_first in any::<bool>(),
        noise_before in prop::collection::vec(1u64..50, 0..3),
        noise_after in prop::collection::vec(1u64..50, 0..3),
    ) {
        let noise = |prefix: &str, offsets: &[u64]| {
            offsets
                .iter()
                .enumerate()
                .map(|(index, offset)| (format!("{prefix}{index}"), shared_ms + offset))
                .collect::<Vec<_>>()
        };
        let before = noise("early", &noise_before[..]);
        let after = noise("late", &noise_after[..]);

        let mut forwarded = vec!["B".to_owned(), "C".to_owned()];
        forwarded.extend(before.iter().chain(&after).map(|(id, _)| id.clone()));
        let mut trace = TraceRecord::new("A", Some("D"))
            .with_response("A", NodeResponse::new(0, forwarded));

        // Slower forwarders of D, listed around the tied pair.
        for (id, timestamp_ms) in &before {
            trace.insert_response(id.clone(), NodeResponse::new(*timestamp_ms, ["D"]));
        }
        let (first, second) = if b_first { ("B", "C") } else { ("C", "B") };
        trace.insert_response(first.to_owned(), NodeResponse::new(shared_ms, ["D"]));
        trace.insert_response(second.to_owned(), NodeResponse::new(shared_ms, ["D"]));
        for (id, timestamp_ms) in &after {
            trace.insert_response(id.clone(), NodeResponse::new(*timestamp_ms, ["D"]));
        }

        prop_assert_eq!(reconstruct_route(&trace), vec!["A", first, "D"]);
    }

    #[test]
    fn lookup_answered_by_origin_is_a_single_hop(origin in 0..POOL, responses in prop::collection::vec(arb_response(), 0..6)) {
        let mut trace = TraceRecord::new(node(origin), Some(node(origin).as_str()));
        for (id, timestamp_ms, forwarded_to) in responses {
            trace.insert_response(
                node(id),
                NodeResponse {
                    timestamp_ms,
                    forwarded_to: forwarded_to.into_iter().map(node).collect(),
                },
            );
        }
        prop_assert_eq!(reconstruct_route(&trace), vec![node(origin)]);
    }
}

#[test]
fn empty_trace_projects_to_the_local_node() {
    let trace = TraceRecord::new("A", Some("B"));
    let graph = build_graph(&trace);
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].category, NodeCategory::Origin);
    assert!(graph.links.is_empty());
    assert!(graph.route.is_empty());
}
