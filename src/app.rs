//! Main application state and UI.

use crate::data::{spawn_load, DataSource, Dataset};
use crate::details::ChannelDetails;
use crate::error::{LoadError, SelectionError};
use crate::session::{build_session, SessionSlot};
use crate::settings::Settings;
use crate::theme;
use eframe::egui::{self, Pos2, Rect, Stroke, Vec2};
use egui_extras::{Column, TableBuilder};
use std::collections::HashSet;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

/// Per-run options from the command line
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Dataset path or URL, overriding the saved setting
    pub data: Option<String>,
    /// Categories to preselect once the dataset is loaded
    pub categories: Vec<String>,
}

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Loading,
    LoadFailed,
    CategorySelection,
    Graph,
}

/// Extra pixels around a node that still count as a hit
const HIT_SLOP: f32 = 4.0;

/// Main application
pub struct RepostGraphApp {
    source: DataSource,
    load_receiver: Option<Receiver<Result<Dataset, LoadError>>>,
    load_error: Option<String>,
    dataset: Option<Dataset>,

    // Category selection
    selected: HashSet<String>,
    preselect: Vec<String>,

    // Graph screen
    slot: SessionSlot,
    details: Option<ChannelDetails>,

    /// Blocking notification; everything else is disabled while it shows
    notice: Option<SelectionError>,

    // Viewport state
    pan_offset: Vec2,
    zoom: f32,

    // Settings persistence
    settings: Settings,
    settings_dirty: bool,
    last_settings_save: Instant,
}

impl RepostGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: AppOptions) -> Self {
        let mut app = Self::with_options(Settings::load(), options);
        app.start_load();
        app
    }

    /// Build the app without starting a load.
    fn with_options(settings: Settings, options: AppOptions) -> Self {
        let source = DataSource::parse(options.data.as_deref().unwrap_or(&settings.data_source));
        Self {
            source,
            load_receiver: None,
            load_error: None,
            dataset: None,
            selected: HashSet::new(),
            preselect: options.categories,
            slot: SessionSlot::default(),
            details: None,
            notice: None,
            pan_offset: Vec2::ZERO,
            zoom: 1.0,
            settings,
            settings_dirty: false,
            last_settings_save: Instant::now(),
        }
    }

    fn screen(&self) -> Screen {
        if self.slot.is_active() {
            Screen::Graph
        } else if self.dataset.is_some() {
            Screen::CategorySelection
        } else if self.load_error.is_some() {
            Screen::LoadFailed
        } else {
            Screen::Loading
        }
    }

    fn start_load(&mut self) {
        self.load_error = None;
        self.dataset = None;
        self.load_receiver = Some(spawn_load(self.source.clone()));
    }

    /// Check for a finished load. Returns whether one is still pending.
    fn poll_load(&mut self) -> bool {
        let Some(rx) = &self.load_receiver else {
            return false;
        };
        match rx.try_recv() {
            Ok(Ok(dataset)) => {
                self.load_receiver = None;
                self.apply_dataset(dataset);
                false
            }
            Ok(Err(e)) => {
                tracing::warn!("Dataset load failed: {}", e);
                self.load_error = Some(e.to_string());
                self.load_receiver = None;
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                self.load_error = Some("Loader stopped before producing a result".to_string());
                self.load_receiver = None;
                false
            }
        }
    }

    fn apply_dataset(&mut self, dataset: Dataset) {
        self.selected.clear();
        for name in &self.preselect {
            if dataset.categories.iter().any(|c| c == name) {
                self.selected.insert(name.clone());
            } else {
                tracing::warn!("Category {:?} is not in the dataset", name);
            }
        }
        self.dataset = Some(dataset);
    }

    fn toggle_category(&mut self, name: &str) {
        if !self.selected.remove(name) {
            self.selected.insert(name.to_string());
        }
    }

    /// Build a graph for the current selection and switch to it.
    fn confirm_selection(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        match build_session(&dataset.records, &self.selected) {
            Ok(session) => {
                self.details = None;
                self.pan_offset = Vec2::ZERO;
                self.zoom = 1.0;
                self.slot.replace(session);
            }
            Err(e) => {
                tracing::info!("Selection rejected: {}", e);
                self.notice = Some(e);
            }
        }
    }

    /// Drop the graph and go back to an empty category selection.
    fn reset(&mut self) {
        self.slot.clear();
        self.details = None;
        self.selected.clear();
    }

    fn select_node(&mut self, node: Option<usize>) {
        let Some(session) = self.slot.current_mut() else {
            return;
        };
        session.select(node);
        self.details = node.and_then(|i| ChannelDetails::resolve(&session.graph, i));
    }

    /// Mark settings as needing to be saved
    fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Save settings if dirty and enough time has passed (debounce)
    fn maybe_save_settings(&mut self) {
        if self.settings_dirty && self.last_settings_save.elapsed().as_secs() >= 2 {
            self.settings.save();
            self.settings_dirty = false;
            self.last_settings_save = Instant::now();
        }
    }

    fn render_loading(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.4);
            ui.spinner();
            ui.colored_label(theme::text::SECONDARY, format!("Loading {}", self.source));
        });
    }

    fn render_load_failed(&mut self, ui: &mut egui::Ui) {
        let message = self.load_error.clone().unwrap_or_default();
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.4);
            ui.colored_label(theme::state::ERROR, format!("Could not load {}", self.source));
            ui.colored_label(theme::text::SECONDARY, message);
            ui.add_space(8.0);
            if ui.button("Retry").clicked() {
                self.start_load();
            }
        });
    }

    fn render_category_selection(&mut self, ui: &mut egui::Ui) {
        let categories = self
            .dataset
            .as_ref()
            .map(|d| d.categories.clone())
            .unwrap_or_default();

        ui.heading("Select categories");
        ui.colored_label(
            theme::text::MUTED,
            format!("{} of {} selected", self.selected.len(), categories.len()),
        );
        ui.add_space(8.0);

        egui::ScrollArea::vertical()
            .id_salt("categories")
            .max_height((ui.available_height() - 48.0).max(60.0))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for name in &categories {
                        let on = self.selected.contains(name);
                        let text = egui::RichText::new(name).color(if on {
                            theme::text::PRIMARY
                        } else {
                            theme::text::SECONDARY
                        });
                        if ui.selectable_label(on, text).clicked() {
                            self.toggle_category(name);
                        }
                    }
                });
            });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Confirm").clicked() {
                self.confirm_selection();
            }
            if ui.button("Clear").clicked() {
                self.selected.clear();
            }
        });
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                self.reset();
                return;
            }
            ui.separator();

            if let Some(session) = self.slot.current() {
                let reposts: usize = session.graph.data.edges.iter().map(|e| e.posts.len()).sum();
                ui.colored_label(
                    theme::text::SECONDARY,
                    format!(
                        "{} channels, {} links, {} reposts",
                        session.graph.node_count(),
                        session.graph.edge_count(),
                        reposts
                    ),
                );
                ui.colored_label(theme::text::MUTED, session.categories.join(", "));
                ui.separator();
                if session.layout.is_running() {
                    let left = session.layout.remaining(Instant::now()).as_secs_f32();
                    ui.colored_label(theme::accent::CYAN, format!("Layout {:.1}s", left));
                } else {
                    ui.colored_label(
                        theme::text::MUTED,
                        format!("Layout done ({} iterations)", session.layout.iterations()),
                    );
                }
            }
            ui.separator();

            if ui.checkbox(&mut self.settings.show_arrows, "Arrows").changed() {
                self.mark_settings_dirty();
            }
            if ui.checkbox(&mut self.settings.render_labels, "Labels").changed() {
                self.mark_settings_dirty();
            }
            ui.label("Edges");
            if ui
                .add(egui::Slider::new(&mut self.settings.edge_opacity, 0.05..=1.0).show_value(false))
                .changed()
            {
                self.mark_settings_dirty();
            }
            ui.label("Nodes");
            if ui
                .add(egui::Slider::new(&mut self.settings.node_scale, 0.25..=4.0).show_value(false))
                .changed()
            {
                self.mark_settings_dirty();
            }
        });
    }

    fn render_graph(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        let center = rect.center();

        // Gather all input deltas first (allows simultaneous pan+zoom on trackpad)
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
        let zoom_delta = ui.input(|i| i.zoom_delta());

        if response.dragged_by(egui::PointerButton::Primary) {
            self.pan_offset += response.drag_delta();
        }
        if scroll_delta != Vec2::ZERO && response.hovered() {
            self.pan_offset += scroll_delta;
        }
        if let Some(cursor_pos) = response.hover_pos() {
            if zoom_delta != 1.0 {
                let new_zoom = (self.zoom * zoom_delta).clamp(0.05, 50.0);
                // Keep the point under the cursor fixed
                let cursor_offset = cursor_pos - center - self.pan_offset;
                self.pan_offset += cursor_offset * (1.0 - new_zoom / self.zoom);
                self.zoom = new_zoom;
            }
        }

        let Some(session) = self.slot.current_mut() else {
            return;
        };
        let graph = &mut session.graph;
        let Some(bounds) = graph.bounds() else {
            return;
        };

        let transform = fit_transform(bounds, rect.shrink(24.0), self.pan_offset, self.zoom);
        let screen: Vec<Pos2> = graph.positions.iter().map(|&p| transform(p)).collect();
        let radius: Vec<f32> = graph
            .data
            .nodes
            .iter()
            .map(|n| (n.size * self.settings.node_scale * self.zoom).max(1.5))
            .collect();

        // Hover: closest node whose disc (plus slop) contains the cursor
        graph.hovered_node = response.hover_pos().and_then(|cursor| {
            screen
                .iter()
                .enumerate()
                .map(|(i, p)| (i, p.distance(cursor)))
                .filter(|&(i, d)| d <= radius[i] + HIT_SLOP)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i)
        });

        // Edges behind nodes
        let edge_color = theme::edge::DEFAULT.gamma_multiply(self.settings.edge_opacity);
        for (s, t) in graph.edge_endpoints() {
            let touches_selected = graph.selected_node.is_some_and(|n| n == s || n == t);
            let color = if touches_selected {
                theme::edge::HIGHLIGHT
            } else {
                edge_color
            };
            let (from, to) = (screen[s], screen[t]);
            painter.line_segment([from, to], Stroke::new(1.0, color));

            if self.settings.show_arrows {
                let dir = (to - from).normalized();
                let arrow_size = (4.0 * self.zoom).clamp(3.0, 12.0);
                let tip = to - dir * (radius[t] + 1.0);
                let perp = Vec2::new(-dir.y, dir.x);
                painter.add(egui::Shape::convex_polygon(
                    vec![
                        tip,
                        tip - dir * arrow_size + perp * arrow_size * 0.5,
                        tip - dir * arrow_size - perp * arrow_size * 0.5,
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
        }

        for (i, node) in graph.data.nodes.iter().enumerate() {
            let is_hovered = graph.hovered_node == Some(i);
            let is_selected = graph.selected_node == Some(i);
            painter.circle_filled(screen[i], radius[i], node.color);

            let border = if is_selected {
                theme::stroke(theme::state::SELECTED, theme::stroke_width::SELECTED)
            } else if is_hovered {
                theme::stroke(theme::state::HOVER, theme::stroke_width::HOVER)
            } else {
                theme::stroke(node.color.gamma_multiply(0.7), theme::stroke_width::NORMAL)
            };
            painter.circle_stroke(screen[i], radius[i], border);

            if self.settings.render_labels {
                painter.text(
                    screen[i] + Vec2::new(radius[i] + 3.0, 0.0),
                    egui::Align2::LEFT_CENTER,
                    &node.label,
                    egui::FontId::proportional(11.0),
                    theme::text::SECONDARY,
                );
            }
        }

        // Tooltip for hovered node
        if let Some(i) = graph.hovered_node {
            let galley = painter.layout_no_wrap(
                graph.data.nodes[i].label.clone(),
                egui::FontId::default(),
                theme::text::PRIMARY,
            );
            let tooltip_pos = screen[i] + Vec2::new(radius[i] + 10.0, 0.0);
            let tooltip_rect = Rect::from_min_size(tooltip_pos, galley.size() + Vec2::splat(12.0));
            painter.rect_filled(tooltip_rect, 4.0, theme::bg::SURFACE);
            painter.galley(tooltip_pos + Vec2::splat(6.0), galley, theme::text::PRIMARY);
        }

        let hovered = graph.hovered_node;
        if response.clicked() {
            // A click on empty canvas dismisses the details panel
            self.select_node(hovered);
        }
    }

    fn render_details_window(&mut self, ctx: &egui::Context) {
        let Some(details) = &self.details else {
            return;
        };
        let mut open = true;
        egui::Window::new(details.title.clone())
            .id(egui::Id::new("channel_details"))
            .open(&mut open)
            .default_width(420.0)
            .default_pos(ctx.screen_rect().right_top() + Vec2::new(-440.0, 60.0))
            .frame(egui::Frame::window(&ctx.style()).fill(theme::bg::PANEL))
            .show(ctx, |ui| render_details(ui, details));
        if !open {
            self.select_node(None);
        }
    }

    fn render_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.notice else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(notice.to_string());
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        self.notice = None;
                    }
                });
            });
    }
}

/// Map layout space onto `rect`: fit `bounds`, then apply zoom and the
/// screen-space pan.
fn fit_transform(bounds: Rect, rect: Rect, pan: Vec2, zoom: f32) -> impl Fn(Pos2) -> Pos2 {
    let extent = bounds.width().max(bounds.height()).max(1e-3);
    let scale = rect.width().min(rect.height()).max(1.0) / extent * zoom;
    let from = bounds.center();
    let to = rect.center() + pan;
    move |p: Pos2| to + (p - from) * scale
}

fn render_details(ui: &mut egui::Ui, details: &ChannelDetails) {
    egui::Grid::new("channel_fields")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.colored_label(theme::text::MUTED, "Link");
            match &details.link_url {
                Some(url) => {
                    ui.hyperlink_to(details.link_text.as_str(), url);
                }
                None => {
                    ui.label(details.link_text.as_str());
                }
            }
            ui.end_row();

            for (name, value) in [
                ("Participants", &details.participants),
                ("Type", &details.peer_type),
                ("Category", &details.category),
                ("Country", &details.country),
                ("Language", &details.language),
                ("Verification", &details.verification),
                ("Red label", &details.red_label),
                ("Black label", &details.black_label),
                ("Reposts made", &details.outgoing),
            ] {
                ui.colored_label(theme::text::MUTED, name);
                ui.label(value.as_str());
                ui.end_row();
            }
        });

    ui.add_space(6.0);
    ui.colored_label(theme::text::MUTED, "About");
    egui::ScrollArea::vertical()
        .id_salt("channel_about")
        .max_height(120.0)
        .show(ui, |ui| {
            ui.label(details.about.as_str());
        });

    ui.add_space(6.0);
    ui.colored_label(
        theme::text::MUTED,
        format!("Incoming reposts ({})", details.reposts.len()),
    );
    if details.reposts.is_empty() {
        return;
    }

    ui.push_id("incoming_reposts", |ui| repost_table(ui, details));
}

fn repost_table(ui: &mut egui::Ui, details: &ChannelDetails) {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(260.0)
        .column(Column::auto().at_least(100.0))
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["From", "Date", "Views", "Post"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in &details.reposts {
                body.row(18.0, |mut r| {
                    r.col(|ui| {
                        ui.label(row.origin.as_str());
                    });
                    r.col(|ui| {
                        ui.label(row.date.as_str());
                    });
                    r.col(|ui| {
                        ui.label(row.views.as_str());
                    });
                    r.col(|ui| match &row.link {
                        Some(link) => {
                            ui.hyperlink_to("Open", link);
                        }
                        None => {
                            ui.label("-");
                        }
                    });
                });
            }
        });
}

impl eframe::App for RepostGraphApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.maybe_save_settings();

        if self.poll_load() {
            // Still loading, request repaint to check again
            ctx.request_repaint();
        }

        if let Some(session) = self.slot.current_mut() {
            if session.tick() {
                ctx.request_repaint();
            }
        }

        ctx.set_visuals(egui::Visuals::dark());
        let enabled = self.notice.is_none();
        let screen = self.screen();

        if screen == Screen::Graph {
            egui::TopBottomPanel::top("toolbar")
                .frame(egui::Frame::none()
                    .fill(theme::bg::PANEL)
                    .inner_margin(egui::Margin::symmetric(12.0, 8.0)))
                .show(ctx, |ui| {
                    ui.add_enabled_ui(enabled, |ui| self.render_toolbar(ui));
                });
        }

        let fill = if screen == Screen::Graph {
            theme::bg::GRAPH
        } else {
            theme::bg::PANEL
        };
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(fill).inner_margin(egui::Margin::same(16.0)))
            .show(ctx, |ui| {
                ui.add_enabled_ui(enabled, |ui| match screen {
                    Screen::Loading => self.render_loading(ui),
                    Screen::LoadFailed => self.render_load_failed(ui),
                    Screen::CategorySelection => self.render_category_selection(ui),
                    Screen::Graph => self.render_graph(ui),
                });
            });

        if enabled {
            self.render_details_window(ctx);
        }
        self.render_notice(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Force save settings on exit
        if self.settings_dirty {
            self.settings.save();
        }
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
