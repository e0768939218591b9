use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};
use portal_trace::peer::EnrResolver;
use portal_trace::trace::{
    LinkWeights, NodeCategory, RouteFailure, SkippedRecord, TraceGraph, TraceRecord,
    build_graph_with, load_trace_file, try_reconstruct_route,
};
use tracing::{info, warn};

mod graph;
mod highlight;
mod physics;
mod render_utils;
mod ui;

pub struct TraceViewerApp {
    trace_file: PathBuf,
    weights: LinkWeights,
    state: AppState,
    reload_rx: Option<Receiver<Result<LoadedTrace, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedTrace, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct LoadedTrace {
    trace: TraceRecord,
    graph: TraceGraph,
    skipped: Vec<SkippedRecord>,
    route_failure: Option<RouteFailure>,
}

impl LoadedTrace {
    fn load(trace_file: &Path, weights: LinkWeights) -> anyhow::Result<Self> {
        let parsed = load_trace_file(trace_file)?;
        for record in &parsed.skipped {
            warn!(node_id = %record.node_id, reason = record.reason, "record left out of graph");
        }

        let route_failure = try_reconstruct_route(&parsed.trace).err();
        let graph = build_graph_with(&parsed.trace, weights);
        info!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            route_hops = graph.route.len(),
            "trace loaded"
        );

        Ok(Self {
            trace: parsed.trace,
            graph,
            skipped: parsed.skipped,
            route_failure,
        })
    }
}

struct ViewModel {
    loaded: LoadedTrace,
    resolver: EnrResolver,
    search: String,
    selected: Option<String>,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    show_unseen: bool,
    physics_intensity: f32,
    physics_repulsion: f32,
    physics_spring: f32,
    physics_velocity_damping: f32,
    graph_dirty: bool,
    graph_cache: Option<RenderGraph>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_id: HashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    origin_index: Option<usize>,
    route_indices: Vec<usize>,
    physics_scratch: PhysicsScratch,
    view_scratch: ViewScratch,
}

struct PhysicsScratch {
    forces: Vec<Vec2>,
}

struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
}

struct RenderNode {
    id: String,
    category: NodeCategory,
    on_route: bool,
    world_pos: Vec2,
    velocity: Vec2,
    base_radius: f32,
}

#[derive(Clone, Copy)]
struct RenderEdge {
    source: usize,
    target: usize,
    weight: u32,
    on_route: bool,
}

struct HighlightState {
    related_nodes: HashSet<usize>,
    related_edges: HashSet<(usize, usize)>,
    route_prefix_nodes: HashSet<usize>,
    route_prefix_edges: HashSet<(usize, usize)>,
}

#[derive(Clone, Copy)]
struct PhysicsConfig {
    intensity: f32,
    repulsion_scale: f32,
    spring_scale: f32,
    velocity_damping: f32,
    delta_seconds: f32,
}

impl TraceViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, trace_file: PathBuf, weights: LinkWeights) -> Self {
        let state = Self::start_load(trace_file.clone(), weights);
        Self {
            trace_file,
            weights,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(trace_file: PathBuf, weights: LinkWeights) -> Receiver<Result<LoadedTrace, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result =
                LoadedTrace::load(&trace_file, weights).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(trace_file: PathBuf, weights: LinkWeights) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(trace_file, weights),
        }
    }
}

impl eframe::App for TraceViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(loaded) => AppState::Ready(Box::new(ViewModel::new(loaded))),
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading lookup trace...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load lookup trace");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.trace_file.clone(), self.weights));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.trace_file, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.trace_file.clone(), self.weights));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(loaded) => AppState::Ready(Box::new(ViewModel::new(loaded))),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
