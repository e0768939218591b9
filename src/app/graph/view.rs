use std::collections::HashSet;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use portal_trace::peer::PeerResolver;

use crate::util::{format_elapsed_ms, short_name};

use super::super::highlight::build_highlight_state;
use super::super::physics::step_physics;
use super::super::render_utils::{
    ROUTE_COLOR, blend_color, category_color, dim_color, draw_background, edge_visible, link_width,
    world_to_screen,
};
use super::super::{PhysicsConfig, RenderGraph, ViewModel};

pub(in crate::app) fn fuzzy_match_score(
    matcher: &SkimMatcherV2,
    text: &str,
    query: &str,
) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn update_screen_space(rect: egui::Rect, pan: egui::Vec2, zoom: f32, cache: &mut RenderGraph) {
        let scratch = &mut cache.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for render_node in &cache.nodes {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, render_node.world_pos));
            scratch
                .screen_radii
                .push((render_node.base_radius * zoom.powf(0.40)).clamp(2.5, 46.0));
        }
    }

    fn search_matches(&self, cache: &RenderGraph) -> Option<HashSet<usize>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let matcher = SkimMatcherV2::default();
        Some(
            cache
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, node)| fuzzy_match_score(&matcher, &node.id, query).is_some())
                .map(|(index, _)| index)
                .collect(),
        )
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let Some(mut cache) = self.graph_cache.take() else {
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            ui.label("Trace has no nodes to draw.");
            return;
        };

        let pan = self.pan;
        let zoom = self.zoom;
        let frame_delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let physics = PhysicsConfig {
            intensity: self.physics_intensity,
            repulsion_scale: self.physics_repulsion,
            spring_scale: self.physics_spring,
            velocity_damping: self.physics_velocity_damping,
            delta_seconds: frame_delta_seconds,
        };

        let physics_moving = self.live_physics && step_physics(&mut cache, physics);
        if physics_moving || response.dragged() {
            ui.ctx().request_repaint();
        }

        Self::update_screen_space(rect, pan, zoom, &mut cache);
        Self::visible_indices_into(
            rect,
            &cache.view_scratch.screen_positions,
            &cache.view_scratch.screen_radii,
            &mut cache.view_scratch.visible_indices,
        );
        self.visible_node_count = cache.view_scratch.visible_indices.len();

        let hovered = Self::hovered_index(
            ui,
            &cache.view_scratch.visible_indices,
            &cache.view_scratch.screen_positions,
            &cache.view_scratch.screen_radii,
        );
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let pending_selection = response
            .clicked_by(egui::PointerButton::Primary)
            .then(|| hovered.map(|index| cache.nodes[index].id.clone()));

        let highlight = self
            .selected
            .as_ref()
            .and_then(|id| cache.index_by_id.get(id))
            .map(|&index| build_highlight_state(&cache, index));
        let search_matches = self.search_matches(&cache);
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        let screen_positions = &cache.view_scratch.screen_positions;
        let zoom_sqrt = zoom.sqrt();
        let mut visible_edge_count = 0usize;

        let mut ordered_edges = cache.edges.clone();
        ordered_edges.sort_by_key(|edge| edge.on_route);
        for edge in &ordered_edges {
            let start = screen_positions[edge.source];
            let end = screen_positions[edge.target];
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let pair = (edge.source, edge.target);
            let (is_prefix_edge, is_related_edge) = highlight.as_ref().map_or((false, false), |state| {
                (
                    state.route_prefix_edges.contains(&pair),
                    state.related_edges.contains(&pair),
                )
            });

            let width = link_width(edge.weight, zoom);
            let color = if is_prefix_edge {
                Color32::from_rgb(255, 226, 140)
            } else if edge.on_route {
                ROUTE_COLOR
            } else if is_related_edge {
                Color32::from_rgb(241, 146, 94)
            } else if highlight.is_some() {
                Color32::from_rgba_unmultiplied(80, 90, 104, 120)
            } else {
                Color32::from_rgba_unmultiplied(96, 104, 116, 190)
            };

            painter.line_segment([start, end], Stroke::new(width, color));
            draw_arrow_head(&painter, start, end, cache.view_scratch.screen_radii[edge.target], width, color);
            visible_edge_count += 1;
        }
        self.visible_edge_count = visible_edge_count;

        let selected_color = Color32::from_rgb(245, 206, 93);
        let mut selection_animating = false;

        for &index in &cache.view_scratch.visible_indices {
            let render_node = &cache.nodes[index];
            let position = screen_positions[index];
            let radius = cache.view_scratch.screen_radii[index];

            let is_selected = self.selected.as_deref() == Some(render_node.id.as_str());
            let is_hovered = hovered == Some(index);
            let is_prefix = highlight
                .as_ref()
                .is_some_and(|state| state.route_prefix_nodes.contains(&index));
            let is_related = highlight
                .as_ref()
                .is_some_and(|state| state.related_nodes.contains(&index));
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base_color = category_color(render_node.category);
            let unselected_color = if is_hovered {
                Color32::from_rgb(255, 164, 101)
            } else if is_prefix {
                blend_color(base_color, ROUTE_COLOR, 0.72)
            } else if is_related {
                blend_color(base_color, Color32::from_rgb(246, 137, 92), 0.55)
            } else if is_match {
                blend_color(base_color, Color32::from_rgb(103, 196, 255), 0.68)
            } else if highlight.is_some() {
                dim_color(base_color, 0.52)
            } else if search_active {
                dim_color(base_color, 0.38)
            } else {
                base_color
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", render_node.id.as_str())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }

            painter.circle_filled(
                position,
                radius,
                blend_color(unselected_color, selected_color, selection_mix),
            );
            if render_node.on_route {
                painter.circle_stroke(position, radius + 3.0, Stroke::new(2.0, ROUTE_COLOR));
            }
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    1.0 + (selection_mix * 1.2),
                    Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                ),
            );

            let should_draw_label = is_selected
                || is_hovered
                || render_node.on_route
                || is_related
                || (is_match && zoom > 0.35)
                || zoom > 1.35;
            if should_draw_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_name(&render_node.id),
                    FontId::proportional(12.0 * zoom_sqrt.clamp(0.8, 1.3)),
                    Color32::from_gray(238),
                );
            }
        }

        if selection_animating {
            ui.ctx().request_repaint();
        }

        if let Some(index) = hovered
            && let Some(node) = self.loaded.graph.node(&cache.nodes[index].id)
        {
            let peer = self
                .resolver
                .resolve(&node.id)
                .map(|metadata| {
                    let endpoint = metadata.endpoint().unwrap_or_else(|| "no endpoint".to_owned());
                    format!("  |  {}  {endpoint}", metadata.client)
                })
                .unwrap_or_default();
            let panel_text = format!(
                "{}  |  {}  |  {}{peer}",
                short_name(&node.id),
                node.category.label(),
                format_elapsed_ms(node.timestamp_ms),
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        self.graph_cache = Some(cache);

        if let Some(selected) = pending_selection {
            self.set_selected(selected);
        }
    }
}

fn draw_arrow_head(
    painter: &egui::Painter,
    start: egui::Pos2,
    end: egui::Pos2,
    target_radius: f32,
    width: f32,
    color: Color32,
) {
    let delta = end - start;
    let length = delta.length();
    if length <= target_radius + 4.0 {
        return;
    }

    let direction = delta / length;
    let tip = end - direction * (target_radius + 1.5);
    let size = (4.0 + width * 1.6).min(12.0);
    let normal = vec2(-direction.y, direction.x);
    let back = tip - direction * size;
    painter.add(egui::Shape::convex_polygon(
        vec![tip, back + normal * (size * 0.5), back - normal * (size * 0.5)],
        color,
        Stroke::NONE,
    ));
}
