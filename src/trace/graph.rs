use std::collections::HashSet;

use serde::Serialize;

use super::model::{NodeId, TraceRecord};
use super::route::reconstruct_route;

pub const LOCAL_NODE_ID: &str = "local";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    Origin,
    Terminus,
    Intermediate,
    Leaf,
    Unseen,
}

impl NodeCategory {
    pub fn group(self) -> u8 {
        match self {
            Self::Unseen => 0,
            Self::Origin => 1,
            Self::Intermediate => 2,
            Self::Leaf => 3,
            Self::Terminus => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Terminus => "found at",
            Self::Intermediate => "intermediate",
            Self::Leaf => "leaf",
            Self::Unseen => "unseen",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub category: NodeCategory,
    pub timestamp_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkDescriptor {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkWeights {
    pub route: u32,
    pub baseline: u32,
}

impl Default for LinkWeights {
    fn default() -> Self {
        Self {
            route: 20,
            baseline: 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceGraph {
    pub nodes: Vec<NodeDescriptor>,
    pub links: Vec<LinkDescriptor>,
    pub route: Vec<NodeId>,
}

pub fn build_graph(trace: &TraceRecord) -> TraceGraph {
    build_graph_with(trace, LinkWeights::default())
}

pub fn build_graph_with(trace: &TraceRecord, weights: LinkWeights) -> TraceGraph {
    if trace.responses.is_empty() {
        return TraceGraph {
            nodes: vec![NodeDescriptor {
                id: LOCAL_NODE_ID.to_owned(),
                category: NodeCategory::Origin,
                timestamp_ms: None,
            }],
            links: Vec::new(),
            route: Vec::new(),
        };
    }

    let route = reconstruct_route(trace);
    let on_route = route.iter().map(String::as_str).collect::<HashSet<_>>();

    let mut seen = HashSet::with_capacity(trace.responses.len());
    let mut nodes = Vec::with_capacity(trace.responses.len());

    for (node_id, response) in &trace.responses {
        if !seen.insert(node_id.as_str()) {
            continue;
        }

        let category = if trace.is_origin(node_id) {
            NodeCategory::Origin
        } else if trace.is_found_at(node_id) {
            NodeCategory::Terminus
        } else if response.forwarded_to.is_empty() {
            NodeCategory::Leaf
        } else {
            NodeCategory::Intermediate
        };

        nodes.push(NodeDescriptor {
            id: node_id.clone(),
            category,
            timestamp_ms: response.timestamp_ms,
        });
    }

    let mut links = Vec::new();
    for (source_id, response) in &trace.responses {
        for target_id in &response.forwarded_to {
            if seen.insert(target_id.as_str()) {
                let category = if trace.is_found_at(target_id) {
                    NodeCategory::Terminus
                } else {
                    NodeCategory::Unseen
                };
                nodes.push(NodeDescriptor {
                    id: target_id.clone(),
                    category,
                    timestamp_ms: None,
                });
            }

            let weight = if on_route.contains(source_id.as_str())
                && on_route.contains(target_id.as_str())
            {
                weights.route
            } else {
                weights.baseline
            };

            links.push(LinkDescriptor {
                source: source_id.clone(),
                target: target_id.clone(),
                weight,
            });
        }
    }

    TraceGraph {
        nodes,
        links,
        route,
    }
}

impl TraceGraph {
    pub fn node(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn has_route(&self) -> bool {
        !self.route.is_empty()
    }

    pub fn route_position(&self, id: &str) -> Option<usize> {
        self.route.iter().position(|hop| hop == id)
    }

    pub fn is_on_route(&self, id: &str) -> bool {
        self.route_position(id).is_some()
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a LinkDescriptor> + 'a {
        self.links.iter().filter(move |link| link.source == id)
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a LinkDescriptor> + 'a {
        self.links.iter().filter(move |link| link.target == id)
    }

    pub fn to_render_payload(&self) -> RenderPayload {
        RenderPayload {
            nodes: self
                .nodes
                .iter()
                .map(|node| RenderNode {
                    id: node.id.clone(),
                    group: node.category.group(),
                    timestamp: node.timestamp_ms,
                })
                .collect(),
            links: self
                .links
                .iter()
                .map(|link| RenderLink {
                    source: link.source.clone(),
                    target: link.target.clone(),
                    value: link.weight,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RenderPayload {
    pub nodes: Vec<RenderNode>,
    pub links: Vec<RenderLink>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RenderNode {
    pub id: NodeId,
    pub group: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RenderLink {
    pub source: NodeId,
    pub target: NodeId,
    pub value: u32,
}
