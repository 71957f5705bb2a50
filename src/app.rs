//! Application shell: graph canvas, side panels and the per-frame loop.

use crate::graph::style::{self, FilterState, HighlightKind};
use crate::graph::types::{GraphDocument, GraphState};
use crate::graph::{layout, LayoutSettings};
use crate::interact::DragController;
use crate::settings::Settings;
use crate::sim::{Phase, Simulation};
use crate::theme;
use eframe::egui::{self, Pos2, Stroke, Vec2};
use std::collections::BTreeSet;

/// Pointer distance in screen pixels within which an edge counts as hovered.
const EDGE_HOVER_PX: f32 = 4.0;

pub struct MixGraphApp {
    graph: GraphState,
    settings: Settings,
    filters: FilterState,
    sim: Simulation,
    drag: DragController,

    /// Picker contents, collected once at load.
    playlists: Vec<String>,
    tags: Vec<String>,
    session_names: Vec<String>,

    pan_offset: Vec2,
    zoom: f32,
    sim_started: bool,
}

impl MixGraphApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        doc: GraphDocument,
        session_names: Vec<String>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let settings = Settings::load();
        let mut graph = GraphState::new();
        graph.load(doc);
        let (playlists, tags) = collect_highlight_options(&graph);

        let filters = FilterState {
            hide_orphans: settings.hide_orphans,
            ..Default::default()
        };

        Self {
            graph,
            settings,
            filters,
            sim: Simulation::new(),
            drag: DragController::new(),
            playlists,
            tags,
            session_names,
            pan_offset: Vec2::ZERO,
            zoom: 2.0,
            sim_started: false,
        }
    }

    fn side_panel(&mut self, ui: &mut egui::Ui, now_ms: f64) {
        ui.heading("Mixgraph");
        ui.separator();

        self.song_panel(ui);
        ui.separator();

        self.highlight_picker(ui);
        ui.add_space(8.0);
        self.date_picker(ui);
        ui.add_space(8.0);

        if ui
            .checkbox(&mut self.settings.hide_orphans, "Hide orphans")
            .changed()
        {
            self.filters.hide_orphans = self.settings.hide_orphans;
        }

        ui.separator();
        self.physics_panel(ui, now_ms);
        ui.separator();
        genre_legend(ui);
    }

    fn song_panel(&self, ui: &mut egui::Ui) {
        ui.strong("Song");
        let selected = self
            .graph
            .selected_node
            .as_ref()
            .and_then(|id| self.graph.get_node(id));

        let Some(node) = selected else {
            ui.weak("None selected");
            return;
        };

        ui.label(&node.label);
        egui::Grid::new("song-info").num_columns(2).show(ui, |ui| {
            let meta = &node.meta;
            for (name, value) in [
                ("Artist", dash_opt(&meta.artist)),
                ("BPM", dash_opt(&meta.bpm)),
                ("Key", dash_opt(&meta.key)),
                ("Playlists", dash_list(&meta.playlists)),
                ("Play count", dash_opt(&meta.play_count)),
                ("Genre", dash_list(&meta.genre)),
                ("Vibe", dash_list(&meta.vibe)),
                ("Intensity", dash_list(&meta.intensity)),
                ("Added", dash_opt(&meta.date_added)),
            ] {
                ui.weak(name);
                ui.label(value);
                ui.end_row();
            }
        });
    }

    fn highlight_picker(&mut self, ui: &mut egui::Ui) {
        ui.strong("Highlight");
        let selected_text = match &self.filters.highlight {
            Some((HighlightKind::Playlist, value)) => format!("Playlist: {value}"),
            Some((HighlightKind::Tag, value)) => format!("Tag: {value}"),
            None => "— None —".to_string(),
        };

        egui::ComboBox::from_id_salt("highlight-picker")
            .selected_text(selected_text)
            .width(180.0)
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(self.filters.highlight.is_none(), "— None —")
                    .clicked()
                {
                    self.filters.highlight = None;
                }
                if !self.playlists.is_empty() {
                    ui.weak("Playlists");
                    for name in &self.playlists {
                        let active = self.filters.highlight
                            == Some((HighlightKind::Playlist, name.clone()));
                        if ui.selectable_label(active, name).clicked() {
                            self.filters.highlight =
                                Some((HighlightKind::Playlist, name.clone()));
                        }
                    }
                }
                if !self.tags.is_empty() {
                    ui.weak("Tags");
                    for name in &self.tags {
                        let active =
                            self.filters.highlight == Some((HighlightKind::Tag, name.clone()));
                        if ui.selectable_label(active, name).clicked() {
                            self.filters.highlight = Some((HighlightKind::Tag, name.clone()));
                        }
                    }
                }
            });

        if ui.small_button("Clear").clicked() {
            self.filters.clear_highlight();
        }
    }

    fn date_picker(&mut self, ui: &mut egui::Ui) {
        ui.strong("Highlight by date");
        let selected_text = self
            .filters
            .active_date
            .clone()
            .unwrap_or_else(|| "— None —".to_string());

        egui::ComboBox::from_id_salt("date-picker")
            .selected_text(selected_text)
            .width(180.0)
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(self.filters.active_date.is_none(), "— None —")
                    .clicked()
                {
                    self.filters.active_date = None;
                }
                for name in &self.session_names {
                    let active = self.filters.active_date.as_deref() == Some(name.as_str());
                    if ui.selectable_label(active, name).clicked() {
                        self.filters.active_date = Some(name.clone());
                    }
                }
            });

        if ui.small_button("Clear").clicked() {
            self.filters.active_date = None;
        }
    }

    fn physics_panel(&mut self, ui: &mut egui::Ui, now_ms: f64) {
        ui.collapsing("Physics", |ui| {
            ui.add(
                egui::Slider::new(&mut self.settings.gravity, 0.0..=0.5)
                    .text("Gravity")
                    .logarithmic(false),
            );
            ui.add(
                egui::Slider::new(&mut self.settings.scaling_ratio, 0.0..=100.0)
                    .text("Repulsion"),
            );
            ui.add(
                egui::Slider::new(&mut self.settings.iterations_per_frame, 1..=50)
                    .text("Iterations/frame"),
            );
            ui.checkbox(&mut self.settings.lin_log_mode, "LinLog attraction");
            ui.checkbox(&mut self.settings.barnes_hut, "Barnes-Hut repulsion");

            let phase = match self.sim.phase() {
                Phase::Stopped => "stopped",
                Phase::Warmup => "warming up",
                Phase::Active => "cooling",
                Phase::Frozen => "frozen",
            };
            ui.horizontal(|ui| {
                ui.weak(format!(
                    "{} (slowdown {:.0})",
                    phase,
                    self.sim.slowdown()
                ));
                if ui.small_button("Reheat").clicked() {
                    self.sim.reheat(now_ms);
                }
            });
        });
    }

    fn render_canvas(&mut self, ui: &mut egui::Ui, now_ms: f64) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        let center = rect.center();
        painter.rect_filled(rect, 0.0, theme::BACKGROUND);

        let hover_pos = response.hover_pos();

        // Camera: scroll pans, pinch/ctrl-scroll zooms toward the cursor.
        // All of it is suspended while a node drag is active.
        if !self.drag.camera_locked() {
            let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
            if scroll_delta != Vec2::ZERO && response.hovered() {
                self.pan_offset += scroll_delta;
            }
            let zoom_delta = ui.input(|i| i.zoom_delta());
            if let Some(cursor) = hover_pos {
                if zoom_delta != 1.0 {
                    let new_zoom = (self.zoom * zoom_delta).clamp(0.05, 50.0);
                    let cursor_offset = cursor - center - self.pan_offset;
                    self.pan_offset += cursor_offset * (1.0 - new_zoom / self.zoom);
                    self.zoom = new_zoom;
                }
            }
        }

        // Scheduler decides whether the layout runs this frame. The step
        // happens before input handling so a drag override always lands
        // after it and wins the frame.
        if self.sim.tick(now_ms) {
            let layout_settings = LayoutSettings {
                gravity: self.settings.gravity,
                scaling_ratio: self.settings.scaling_ratio,
                slow_down: self.sim.slowdown() as f32,
                lin_log_mode: self.settings.lin_log_mode,
                barnes_hut: self.settings.barnes_hut,
                ..Default::default()
            };
            layout::step(
                &mut self.graph,
                &layout_settings,
                self.settings.iterations_per_frame,
            );
        }

        let pan = self.pan_offset;
        let zoom = self.zoom;
        let to_screen = move |pos: Pos2| center + pos.to_vec2() * zoom + pan;
        let to_graph = move |screen: Pos2| ((screen - center - pan) / zoom).to_pos2();

        // Hover: nearest node whose marker contains the pointer, else the
        // nearest edge within a few pixels.
        self.graph.hovered_node = hover_pos.and_then(|pointer| {
            let mut best: Option<(String, f32)> = None;
            for node in &self.graph.nodes {
                let Some(pos) = self.graph.get_pos(&node.id) else {
                    continue;
                };
                let radius = (node.size * zoom).max(3.0) + 2.0;
                let distance = to_screen(pos).distance(pointer);
                if distance <= radius && best.as_ref().is_none_or(|(_, d)| distance < *d) {
                    best = Some((node.id.clone(), distance));
                }
            }
            best.map(|(id, _)| id)
        });

        self.graph.hovered_edge = match (&self.graph.hovered_node, hover_pos) {
            (None, Some(pointer)) => {
                let mut best: Option<((String, String), f32)> = None;
                for edge in &self.graph.edges {
                    if edge.source == edge.target {
                        continue;
                    }
                    let (Some(a), Some(b)) = (
                        self.graph.get_pos(&edge.source),
                        self.graph.get_pos(&edge.target),
                    ) else {
                        continue;
                    };
                    let distance =
                        distance_to_segment(pointer, to_screen(a), to_screen(b));
                    if distance <= EDGE_HOVER_PX
                        && best.as_ref().is_none_or(|(_, d)| distance < *d)
                    {
                        best = Some(((edge.source.clone(), edge.target.clone()), distance));
                    }
                }
                best.map(|(key, _)| key)
            }
            _ => None,
        };

        // Drag: press on a node captures it, moves write graph-space
        // positions directly, release lets the simulation re-settle.
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(id) = self.graph.hovered_node.clone() {
                self.drag
                    .on_node_press(&id, &self.graph, &mut self.sim, now_ms);
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if self.drag.camera_locked() {
                if let Some(pointer) = response.interact_pointer_pos() {
                    self.drag.on_pointer_move(
                        to_graph(pointer),
                        &mut self.graph,
                        &mut self.sim,
                        now_ms,
                    );
                }
            } else {
                self.pan_offset += response.drag_delta();
            }
        }
        if response.drag_stopped() {
            self.drag.on_pointer_release(&mut self.sim, now_ms);
        }

        // Click: node click is a sticky selection, background click clears.
        if response.clicked() {
            match self.graph.hovered_node.clone() {
                Some(id) => {
                    self.graph.selected_node = Some(id);
                    self.graph.hovered_edge = None;
                }
                None => self.graph.selected_node = None,
            }
        }

        // Edges behind nodes
        for edge in &self.graph.edges {
            let visual = style::edge_style(edge, &self.graph, &self.filters);
            if visual.hidden {
                continue;
            }
            let (Some(a), Some(b)) = (
                self.graph.get_pos(&edge.source),
                self.graph.get_pos(&edge.target),
            ) else {
                continue;
            };
            let stroke = Stroke::new((visual.width * zoom).max(0.2), visual.color);
            if edge.source == edge.target {
                // self-loop: a small circle hanging off the marker
                let size = self
                    .graph
                    .get_node(&edge.source)
                    .map(|n| n.size)
                    .unwrap_or(1.0);
                let radius = (size * zoom * 0.6).max(2.0);
                painter.circle_stroke(
                    to_screen(a) + Vec2::new(radius, -radius),
                    radius,
                    stroke,
                );
            } else {
                painter.line_segment([to_screen(a), to_screen(b)], stroke);
            }
        }

        // Nodes
        for node in &self.graph.nodes {
            let visual = style::node_style(node, &self.graph, &self.filters);
            if visual.hidden {
                continue;
            }
            let Some(pos) = self.graph.get_pos(&node.id) else {
                continue;
            };
            let screen = to_screen(pos);
            let radius = (visual.size * zoom).max(1.5);
            painter.circle_filled(screen, radius, visual.color);

            if visual.force_label || zoom >= self.settings.label_zoom_threshold {
                painter.text(
                    screen + Vec2::new(0.0, -radius - 3.0),
                    egui::Align2::CENTER_BOTTOM,
                    &node.label,
                    egui::FontId::proportional(11.0),
                    theme::LABEL,
                );
            }
        }
    }
}

impl eframe::App for MixGraphApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now_ms = ctx.input(|i| i.time) * 1000.0;
        if !self.sim_started {
            self.sim.start(now_ms);
            self.sim_started = true;
        }

        egui::SidePanel::left("menu")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| self.side_panel(ui, now_ms));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme::BACKGROUND))
            .show(ctx, |ui| self.render_canvas(ui, now_ms));

        // keep frames coming while the simulation is alive; frozen state
        // repaints only on input
        if self.sim.is_running() {
            ctx.request_repaint();
        }
    }

    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        self.settings.save();
    }
}

/// Collect sorted, deduplicated picker entries from node metadata.
/// Playlists come from the playlist lists; tags pool tags, genre, vibe and
/// intensity.
fn collect_highlight_options(graph: &GraphState) -> (Vec<String>, Vec<String>) {
    let mut playlists = BTreeSet::new();
    let mut tags = BTreeSet::new();
    for node in &graph.nodes {
        let meta = &node.meta;
        playlists.extend(meta.playlists.iter().map(|s| s.trim().to_string()));
        for list in [&meta.tags, &meta.genre, &meta.vibe, &meta.intensity] {
            tags.extend(list.iter().map(|s| s.trim().to_string()));
        }
    }
    playlists.remove("");
    tags.remove("");
    (
        playlists.into_iter().collect(),
        tags.into_iter().collect(),
    )
}

fn genre_legend(ui: &mut egui::Ui) {
    ui.collapsing("Genre key", |ui| {
        let mut entries: Vec<_> = theme::GENRE_COLORS.to_vec();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (name, color) in entries {
            ui.horizontal(|ui| {
                ui.colored_label(color, "●");
                ui.label(name);
            });
        }
    });
}

fn dash_opt(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => "—".to_string(),
    }
}

fn dash_list(list: &[String]) -> String {
    if list.is_empty() {
        "—".to_string()
    } else {
        list.join(", ")
    }
}

fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let length_sq = ab.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{DocNode, DocNodeAttrs, GraphDocument, SongMeta};

    #[test]
    fn missing_metadata_renders_as_placeholder() {
        assert_eq!(dash_opt(&None), "—");
        assert_eq!(dash_opt(&Some("  ".to_string())), "—");
        assert_eq!(dash_opt(&Some("128.00".to_string())), "128.00");
        assert_eq!(dash_list(&[]), "—");
        assert_eq!(
            dash_list(&["House".to_string(), "Party".to_string()]),
            "House, Party"
        );
    }

    #[test]
    fn highlight_options_are_sorted_and_deduplicated() {
        let mut graph = GraphState::new();
        graph.load(GraphDocument {
            nodes: vec![
                DocNode {
                    key: "A".into(),
                    attributes: DocNodeAttrs {
                        data: SongMeta {
                            genre: vec!["Techno".into()],
                            vibe: vec!["Party".into()],
                            playlists: vec!["Warmup".into(), "Peak".into()],
                            ..Default::default()
                        },
                        ..Default::default()
                    },
                },
                DocNode {
                    key: "B".into(),
                    attributes: DocNodeAttrs {
                        data: SongMeta {
                            genre: vec!["Techno".into()],
                            intensity: vec!["Banger".into()],
                            playlists: vec!["Warmup".into()],
                            ..Default::default()
                        },
                        ..Default::default()
                    },
                },
            ],
            edges: Vec::new(),
        });

        let (playlists, tags) = collect_highlight_options(&graph);
        assert_eq!(playlists, vec!["Peak", "Warmup"]);
        assert_eq!(tags, vec!["Banger", "Party", "Techno"]);
    }

    #[test]
    fn segment_distance_handles_endpoints_and_interior() {
        let a = Pos2::new(0.0, 0.0);
        let b = Pos2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Pos2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Pos2::new(-4.0, 0.0), a, b), 4.0);
        assert_eq!(distance_to_segment(Pos2::new(13.0, 4.0), a, b), 5.0);
        // degenerate segment
        assert_eq!(distance_to_segment(Pos2::new(3.0, 4.0), a, a), 5.0);
    }
}
