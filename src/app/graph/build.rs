use std::collections::{HashMap, HashSet};

use eframe::egui::{Vec2, vec2};
use portal_trace::trace::{NodeCategory, NodeDescriptor};

use crate::util::stable_pair;

use super::super::render_utils::category_radius;
use super::super::{PhysicsScratch, RenderEdge, RenderGraph, RenderNode, ViewModel, ViewScratch};

impl ViewModel {
    fn visible_descriptors(&self) -> Vec<&NodeDescriptor> {
        let graph = &self.loaded.graph;
        graph
            .nodes
            .iter()
            .filter(|node| {
                self.show_unseen
                    || node.category != NodeCategory::Unseen
                    || graph.is_on_route(&node.id)
                    || self.selected.as_deref() == Some(node.id.as_str())
            })
            .collect()
    }

    fn make_render_node(descriptor: &NodeDescriptor, index: usize, on_route: bool) -> RenderNode {
        let (jx, jy) = stable_pair(&descriptor.id);
        let mut direction = vec2(jx, jy);
        if direction.length_sq() <= 0.0001 {
            let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
            direction = vec2(angle.cos(), angle.sin());
        } else {
            direction = direction.normalized();
        }

        let base_radius = category_radius(descriptor.category);
        let is_origin = descriptor.category == NodeCategory::Origin;

        RenderNode {
            id: descriptor.id.clone(),
            category: descriptor.category,
            on_route,
            world_pos: if is_origin {
                Vec2::ZERO
            } else {
                direction * (40.0 + index as f32 * 3.0)
            },
            velocity: if is_origin {
                Vec2::ZERO
            } else {
                direction * (1.15 + base_radius * 0.022)
            },
            base_radius,
        }
    }

    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        let mut prior_nodes = self
            .graph_cache
            .take()
            .map(|cache| {
                cache
                    .nodes
                    .into_iter()
                    .map(|node| (node.id.clone(), node))
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();

        let descriptors = self.visible_descriptors();
        let graph = &self.loaded.graph;
        let route_ids = graph.route.iter().map(String::as_str).collect::<HashSet<_>>();

        let mut nodes = Vec::with_capacity(descriptors.len());
        let mut index_by_id = HashMap::with_capacity(descriptors.len());
        for (index, descriptor) in descriptors.iter().enumerate() {
            let on_route = route_ids.contains(descriptor.id.as_str());
            let node = match prior_nodes.remove(&descriptor.id) {
                Some(mut node) => {
                    node.category = descriptor.category;
                    node.on_route = on_route;
                    node.base_radius = category_radius(descriptor.category);
                    node
                }
                None => Self::make_render_node(descriptor, index, on_route),
            };
            index_by_id.insert(descriptor.id.clone(), index);
            nodes.push(node);
        }

        let mut edges = Vec::with_capacity(graph.links.len());
        for link in &graph.links {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            else {
                continue;
            };
            if source == target {
                continue;
            }

            edges.push(RenderEdge {
                source,
                target,
                weight: link.weight,
                on_route: route_ids.contains(link.source.as_str())
                    && route_ids.contains(link.target.as_str()),
            });
        }

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        for edge in &edges {
            if !outgoing[edge.source].contains(&edge.target) {
                outgoing[edge.source].push(edge.target);
                incoming[edge.target].push(edge.source);
            }
        }

        let origin_index = graph
            .nodes
            .iter()
            .find(|node| node.category == NodeCategory::Origin)
            .and_then(|node| index_by_id.get(&node.id).copied());
        let route_indices = graph
            .route
            .iter()
            .filter_map(|id| index_by_id.get(id).copied())
            .collect();

        self.visible_node_count = nodes.len();
        self.visible_edge_count = edges.len();
        self.graph_cache = Some(RenderGraph {
            nodes,
            edges,
            index_by_id,
            outgoing,
            incoming,
            origin_index,
            route_indices,
            physics_scratch: PhysicsScratch { forces: Vec::new() },
            view_scratch: ViewScratch {
                screen_positions: Vec::new(),
                screen_radii: Vec::new(),
                visible_indices: Vec::new(),
            },
        });
        self.graph_dirty = false;
    }
}
