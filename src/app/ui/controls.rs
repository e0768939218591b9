use eframe::egui::{self, Color32, RichText, Ui};
use fuzzy_matcher::skim::SkimMatcherV2;
use portal_trace::trace::NodeCategory;

use crate::util::short_name;

use super::super::graph::fuzzy_match_score;
use super::super::render_utils::{ROUTE_COLOR, category_color};
use super::super::ViewModel;

const SEARCH_RESULT_ROWS: usize = 12;

const LEGEND: [NodeCategory; 5] = [
    NodeCategory::Origin,
    NodeCategory::Intermediate,
    NodeCategory::Leaf,
    NodeCategory::Terminus,
    NodeCategory::Unseen,
];

impl ViewModel {
    fn ranked_search_results(&self) -> Vec<String> {
        let query = self.search.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .loaded
            .graph
            .nodes
            .iter()
            .filter_map(|node| {
                fuzzy_match_score(&matcher, &node.id, query).map(|score| (score, node.id.as_str()))
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(SEARCH_RESULT_ROWS)
            .map(|(_, id)| id.to_owned())
            .collect()
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Trace Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (node id)")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the rendered graph.");
        ui.text_edit_singleline(&mut self.search);

        let results = self.ranked_search_results();
        let mut clicked = None;
        if !self.search.trim().is_empty() {
            if results.is_empty() {
                ui.weak("No matching nodes.");
            }
            for id in &results {
                if ui.link(short_name(id)).on_hover_text(id.as_str()).clicked() {
                    clicked = Some(id.clone());
                }
            }
        }

        ui.separator();
        ui.label(RichText::new("Reconstructed route").strong());
        match &self.loaded.route_failure {
            Some(failure) => {
                ui.label(format!("No route: {failure}"));
            }
            None => {
                for (hop, id) in self.loaded.graph.route.iter().enumerate() {
                    let text = RichText::new(format!("{hop}. {}", short_name(id))).color(ROUTE_COLOR);
                    if ui.link(text).on_hover_text(id.as_str()).clicked() {
                        clicked = Some(id.clone());
                    }
                }
            }
        }

        if let Some(id) = clicked {
            self.set_selected(Some(id));
        }

        ui.separator();

        if ui
            .checkbox(&mut self.show_unseen, "Show unseen nodes")
            .on_hover_text("Include nodes that were forwarded to but never responded.")
            .changed()
        {
            self.graph_dirty = true;
        }

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Continuously simulate layout forces while viewing the graph.");

        ui.collapsing("Physics tuning", |ui| {
            ui.add(
                egui::Slider::new(&mut self.physics_intensity, 0.2..=2.5)
                    .text("Intensity")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Overall strength applied to all physics forces.");
            ui.add(
                egui::Slider::new(&mut self.physics_repulsion, 0.25..=2.6)
                    .text("Repulsion")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly nodes push away from each other.");
            ui.add(
                egui::Slider::new(&mut self.physics_spring, 0.2..=2.2)
                    .text("Link spring")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly linked nodes pull toward their target distance.");
            ui.add(
                egui::Slider::new(&mut self.physics_velocity_damping, 0.78..=0.97)
                    .text("Velocity damping")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How quickly node movement slows each frame.");
        });

        ui.separator();
        ui.label(RichText::new("Legend").strong());
        for category in LEGEND {
            ui.horizontal(|ui| {
                ui.label(RichText::new("●").color(category_color(category)));
                ui.label(format!("{} (group {})", category.label(), category.group()));
            });
        }
        ui.horizontal(|ui| {
            ui.label(RichText::new("━").color(ROUTE_COLOR));
            ui.label("route link");
        });

        if !self.loaded.skipped.is_empty() {
            ui.separator();
            ui.label(
                RichText::new(format!(
                    "{} malformed records skipped",
                    self.loaded.skipped.len()
                ))
                .color(Color32::from_rgb(230, 170, 90)),
            );
            for record in &self.loaded.skipped {
                ui.small(format!("{}: {}", short_name(&record.node_id), record.reason));
            }
        }
    }
}
