use std::collections::HashSet;

use super::{HighlightState, RenderGraph};

pub(super) fn build_highlight_state(cache: &RenderGraph, selected_index: usize) -> HighlightState {
    let mut related_nodes = HashSet::from([selected_index]);
    let mut related_edges = HashSet::new();

    if let Some(targets) = cache.outgoing.get(selected_index) {
        for &target in targets {
            related_nodes.insert(target);
            related_edges.insert((selected_index, target));
        }
    }
    if let Some(sources) = cache.incoming.get(selected_index) {
        for &source in sources {
            related_nodes.insert(source);
            related_edges.insert((source, selected_index));
        }
    }

    let mut route_prefix_nodes = HashSet::new();
    let mut route_prefix_edges = HashSet::new();
    if let Some(position) = cache
        .route_indices
        .iter()
        .position(|&index| index == selected_index)
    {
        let prefix = &cache.route_indices[..=position];
        route_prefix_nodes.extend(prefix.iter().copied());
        for pair in prefix.windows(2) {
            if let [source, target] = pair {
                route_prefix_edges.insert((*source, *target));
            }
        }
    }

    HighlightState {
        related_nodes,
        related_edges,
        route_prefix_nodes,
        route_prefix_edges,
    }
}
