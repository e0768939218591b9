use thiserror::Error;
use tracing::debug;

use super::model::{NodeId, TraceRecord};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RouteFailure {
    #[error("trace has no origin")]
    MissingOrigin,
    #[error("trace has no found_at node")]
    MissingFoundAt,
    #[error("no node forwarded the query to {target}")]
    NoPredecessor { target: NodeId },
    #[error("search stalled at {target}")]
    NoProgress { target: NodeId },
    #[error("route loops back to {node}")]
    Cycle { node: NodeId },
}

pub fn reconstruct_route(trace: &TraceRecord) -> Vec<NodeId> {
    match try_reconstruct_route(trace) {
        Ok(route) => route,
        Err(failure) => {
            debug!(%failure, "no route reconstructed");
            Vec::new()
        }
    }
}

// Ties between equal timestamps go to the record seen first.
pub fn try_reconstruct_route(trace: &TraceRecord) -> Result<Vec<NodeId>, RouteFailure> {
    let origin = trace.origin.as_deref().ok_or(RouteFailure::MissingOrigin)?;
    let found_at = trace
        .found_at
        .as_deref()
        .ok_or(RouteFailure::MissingFoundAt)?;

    let mut target = found_at;
    let mut route = vec![target.to_owned()];

    while target != origin {
        let predecessor = earliest_predecessor(trace, target).ok_or_else(|| {
            RouteFailure::NoPredecessor {
                target: target.to_owned(),
            }
        })?;

        if predecessor == target {
            return Err(RouteFailure::NoProgress {
                target: target.to_owned(),
            });
        }
        if route.iter().any(|id| id == predecessor) {
            return Err(RouteFailure::Cycle {
                node: predecessor.to_owned(),
            });
        }

        route.push(predecessor.to_owned());
        target = predecessor;
    }

    route.reverse();
    Ok(route)
}

fn earliest_predecessor<'a>(trace: &'a TraceRecord, target: &str) -> Option<&'a str> {
    let mut fastest: Option<(u64, &str)> = None;

    for (node_id, response) in &trace.responses {
        let Some(timestamp) = response.timestamp_ms else {
            continue;
        };
        if !response.forwards_to(target) {
            continue;
        }

        if fastest.is_none_or(|(best, _)| timestamp < best) {
            fastest = Some((timestamp, node_id.as_str()));
        }
    }

    fastest.map(|(_, node_id)| node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NodeResponse;

    fn multi_route_trace() -> TraceRecord {
        TraceRecord::new("A", Some("C"))
            .with_response("A", NodeResponse::new(0, ["B", "C", "D"]))
            .with_response("B", NodeResponse::new(12, ["E", "C", "S"]))
            .with_response("C", NodeResponse::new(14, ["L", "O"]))
    }

    #[test]
    fn earliest_predecessor_wins() {
        assert_eq!(reconstruct_route(&multi_route_trace()), vec!["A", "C"]);
        assert_eq!(
            try_reconstruct_route(&multi_route_trace()),
            Ok(vec!["A".to_owned(), "C".to_owned()])
        );
    }

    #[test]
    fn follows_multiple_hops() {
        let trace = TraceRecord::new("A", Some("D"))
            .with_response("A", NodeResponse::new(0, ["B", "X"]))
            .with_response("B", NodeResponse::new(10, ["C"]))
            .with_response("X", NodeResponse::new(11, ["C"]))
            .with_response("C", NodeResponse::new(25, ["D"]));

        assert_eq!(reconstruct_route(&trace), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn origin_holding_content_is_a_single_hop_route() {
        let trace = TraceRecord::new("A", Some("A"));
        assert_eq!(reconstruct_route(&trace), vec!["A"]);
    }

    #[test]
    fn missing_endpoints_yield_no_route() {
        let mut trace = multi_route_trace();
        trace.found_at = None;
        assert_eq!(try_reconstruct_route(&trace), Err(RouteFailure::MissingFoundAt));
        assert!(reconstruct_route(&trace).is_empty());

        let mut trace = multi_route_trace();
        trace.origin = None;
        assert_eq!(try_reconstruct_route(&trace), Err(RouteFailure::MissingOrigin));
        assert!(reconstruct_route(&trace).is_empty());
    }

    #[test]
    fn unreferenced_found_at_yields_no_route() {
        let trace = TraceRecord::new("A", Some("Z"))
            .with_response("A", NodeResponse::new(0, ["B", "C"]))
            .with_response("B", NodeResponse::new(5, Vec::<String>::new()))
            .with_response("C", NodeResponse::new(7, Vec::<String>::new()));

        assert_eq!(
            try_reconstruct_route(&trace),
            Err(RouteFailure::NoPredecessor {
                target: "Z".to_owned()
            })
        );
        assert!(reconstruct_route(&trace).is_empty());
    }

    #[test]
    fn cycle_yields_no_route() {
        let trace = TraceRecord::new("A", Some("C"))
            .with_response("A", NodeResponse::new(50, ["B"]))
            .with_response("B", NodeResponse::new(1, ["C"]))
            .with_response("C", NodeResponse::new(2, ["B"]));

        assert_eq!(
            try_reconstruct_route(&trace),
            Err(RouteFailure::Cycle {
                node: "C".to_owned()
            })
        );
    }

    #[test]
    fn self_forwarding_target_stalls() {
        let trace = TraceRecord::new("A", Some("C"))
            .with_response("A", NodeResponse::new(9, ["C"]))
            .with_response("C", NodeResponse::new(3, ["C"]));

        assert_eq!(
            try_reconstruct_route(&trace),
            Err(RouteFailure::NoProgress {
                target: "C".to_owned()
            })
        );
    }

    #[test]
    fn equal_timestamps_pick_first_record() {
        let trace = TraceRecord::new("A", Some("D"))
            .with_response("A", NodeResponse::new(0, ["B", "C"]))
            .with_response("B", NodeResponse::new(10, ["D"]))
            .with_response("C", NodeResponse::new(10, ["D"]));
        assert_eq!(reconstruct_route(&trace), vec!["A", "B", "D"]);

        let swapped = TraceRecord::new("A", Some("D"))
            .with_response("A", NodeResponse::new(0, ["B", "C"]))
            .with_response("C", NodeResponse::new(10, ["D"]))
            .with_response("B", NodeResponse::new(10, ["D"]));
        assert_eq!(reconstruct_route(&swapped), vec!["A", "C", "D"]);
    }

    #[test]
    fn records_without_timestamp_are_not_predecessors() {
        let trace = TraceRecord::new("A", Some("C"))
            .with_response("A", NodeResponse::new(40, ["B", "C"]))
            .with_response(
                "B",
                NodeResponse {
                    timestamp_ms: None,
                    forwarded_to: vec!["C".to_owned()],
                },
            );

        assert_eq!(reconstruct_route(&trace), vec!["A", "C"]);
    }
}
