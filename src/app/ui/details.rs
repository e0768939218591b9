use eframe::egui::{RichText, Ui};
use portal_trace::peer::PeerResolver;

use crate::util::{format_elapsed_ms, short_name};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a node from the graph, search results or route.");
            return;
        };

        let graph = &self.loaded.graph;
        let Some(node) = graph.node(&selected_id) else {
            ui.label("Selected node is not part of this trace.");
            return;
        };

        ui.label(RichText::new(short_name(&node.id)).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        ui.label(format!(
            "Category: {} (group {})",
            node.category.label(),
            node.category.group()
        ));
        ui.label(format!("Responded after: {}", format_elapsed_ms(node.timestamp_ms)));
        match graph.route_position(&node.id) {
            Some(position) => ui.label(format!(
                "Route hop {position} of {}",
                graph.route.len().saturating_sub(1)
            )),
            None => ui.label("Not on the reconstructed route"),
        };

        ui.separator();
        ui.label(RichText::new("Peer").strong());
        match self.resolver.resolve(&node.id) {
            Some(metadata) => {
                ui.label(format!("Client: {}", metadata.client));
                ui.label(format!(
                    "Endpoint: {}",
                    metadata.endpoint().unwrap_or_else(|| "not advertised".to_owned())
                ));
            }
            None => {
                ui.label("No metadata for this node id.");
            }
        }

        let forwarded_to = self
            .loaded
            .trace
            .response(&node.id)
            .map(|response| response.forwarded_to.clone());
        let sources = graph
            .incoming(&node.id)
            .map(|link| (link.source.clone(), link.weight))
            .collect::<Vec<_>>();

        let mut clicked = None;

        ui.separator();
        ui.label(RichText::new("Forwarded to").strong());
        match forwarded_to {
            None => {
                ui.label("Node never responded.");
            }
            Some(targets) if targets.is_empty() => {
                ui.label("Responded without forwarding.");
            }
            Some(targets) => {
                for target in targets {
                    if ui.link(short_name(&target)).on_hover_text(target.as_str()).clicked() {
                        clicked = Some(target);
                    }
                }
            }
        }

        ui.separator();
        ui.label(RichText::new("Reached from").strong());
        if sources.is_empty() {
            ui.label("No incoming links.");
        }
        for (source, weight) in sources {
            let label = format!("{}  (weight {weight})", short_name(&source));
            if ui.link(label).on_hover_text(source.as_str()).clicked() {
                clicked = Some(source);
            }
        }

        if let Some(id) = clicked {
            self.set_selected(Some(id));
        }
    }
}
