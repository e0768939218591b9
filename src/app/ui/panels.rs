use std::path::Path;

use eframe::egui::{self, Align, Context, Layout, Vec2};
use portal_trace::peer::EnrResolver;

use crate::util::short_name;

use super::super::{LoadedTrace, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(loaded: LoadedTrace) -> Self {
        Self {
            loaded,
            resolver: EnrResolver::default(),
            search: String::new(),
            selected: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics: true,
            show_unseen: true,
            physics_intensity: 1.0,
            physics_repulsion: 1.2,
            physics_spring: 1.0,
            physics_velocity_damping: 0.9,
            graph_dirty: true,
            graph_cache: None,
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    fn route_summary(&self) -> String {
        match &self.loaded.route_failure {
            Some(failure) => format!("route: none ({failure})"),
            None => format!("route: {} hops", self.loaded.graph.route.len().saturating_sub(1)),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        trace_file: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("portal-trace");
                    ui.separator();
                    let trace = &self.loaded.trace;
                    ui.label(format!(
                        "origin: {}",
                        trace.origin.as_deref().map_or_else(|| "?".to_owned(), short_name)
                    ));
                    ui.label(format!(
                        "found at: {}",
                        trace.found_at.as_deref().map_or_else(|| "?".to_owned(), short_name)
                    ));
                    ui.label(format!("file: {}", trace_file.display()));
                    ui.label(format!("nodes: {}", self.loaded.graph.nodes.len()));
                    ui.label(format!("links: {}", self.loaded.graph.links.len()));
                    ui.label(self.route_summary());
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload trace"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} nodes / {} links",
                            self.visible_node_count, self.visible_edge_count
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading lookup trace...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }

        // Hidden unseen nodes become visible while selected.
        let needs_rebuild = selected.as_ref().is_some_and(|id| {
            self.graph_cache
                .as_ref()
                .is_none_or(|cache| !cache.index_by_id.contains_key(id))
        });
        self.selected = selected;
        if needs_rebuild || !self.show_unseen {
            self.graph_dirty = true;
        }
    }
}
