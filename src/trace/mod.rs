mod graph;
mod model;
mod parse;
mod route;

pub use graph::{
    LOCAL_NODE_ID, LinkDescriptor, LinkWeights, NodeCategory, NodeDescriptor, RenderLink,
    RenderNode, RenderPayload, TraceGraph, build_graph, build_graph_with,
};
pub use model::{NodeId, NodeResponse, TraceRecord};
pub use parse::{ParsedTrace, SkippedRecord, load_trace_file, parse_trace_payload, parse_trace_value};
pub use route::{RouteFailure, reconstruct_route, try_reconstruct_route};
