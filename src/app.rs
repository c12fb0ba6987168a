use crate::config::AppConfig;
use crate::detail::DetailView;
use crate::fetcher::LogFetcher;
use crate::query::ParamKey;
use crate::state::{Command, Intent, ListContent, ViewerState, EMPTY_TEXT, LOADING_TEXT};
use crate::virtual_list::RowView;
use eframe::egui;
use std::collections::BTreeMap;

const LEVEL_OPTIONS: [&str; 8] = [
    "", "FINEST", "FINER", "FINE", "CONFIG", "INFO", "WARNING", "SEVERE",
];
const STORE_OPTIONS: [&str; 2] = ["file", "clickhouse"];
const TEXT_PARAMS: [ParamKey; 9] = [
    ParamKey::Search,
    ParamKey::SessionId,
    ParamKey::ClientId,
    ParamKey::Limit,
    ParamKey::Context,
    ParamKey::BeforeContext,
    ParamKey::AfterContext,
    ParamKey::StartTime,
    ParamKey::EndTime,
];

pub struct LogViewerApp {
    config: AppConfig,
    state: ViewerState,
    fetcher: LogFetcher,

    inputs: BTreeMap<ParamKey, String>,
    endpoint_input: String,
    show_filters: bool,
}

impl LogViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = AppConfig::default();
        let state = ViewerState::new(&config);
        let inputs = TEXT_PARAMS
            .iter()
            .map(|key| (*key, state.params().get(*key).to_string()))
            .collect();
        let endpoint_input = state.endpoint().to_string();

        let mut app = Self {
            config,
            state,
            fetcher: LogFetcher::new(),
            inputs,
            endpoint_input,
            show_filters: true,
        };
        // Load the default query right away.
        app.dispatch(&cc.egui_ctx, Intent::Refresh);
        app
    }

    fn dispatch(&mut self, ctx: &egui::Context, intent: Intent) {
        let now = ctx.input(|input| input.time);
        for command in self.state.update(intent, now) {
            match command {
                Command::Fetch(request) => self.fetcher.fetch(request, ctx),
                Command::CopyToClipboard(text) => ctx.output_mut(|output| output.copied_text = text),
                Command::RequestRepaint => ctx.request_repaint(),
                Command::RequestRepaintAfter(delay) => ctx.request_repaint_after(delay),
            }
        }
    }

    fn controls_ui(&mut self, ui: &mut egui::Ui, intents: &mut Vec<Intent>) {
        ui.horizontal(|ui| {
            ui.label("Endpoint:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.endpoint_input).desired_width(320.0),
            );
            if response.changed() {
                intents.push(Intent::SetEndpoint(self.endpoint_input.trim().to_string()));
            }
            if response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter)) {
                intents.push(Intent::Refresh);
            }

            ui.separator();

            let current_level = self.state.params().get(ParamKey::Level).to_string();
            let mut level = current_level.clone();
            ui.label("Level:");
            egui::ComboBox::from_id_source("level_filter")
                .selected_text(level_label(&current_level).to_string())
                .show_ui(ui, |ui| {
                    for option in LEVEL_OPTIONS {
                        ui.selectable_value(&mut level, option.to_string(), level_label(option));
                    }
                });
            if level != current_level {
                intents.push(Intent::SetParam(ParamKey::Level, level));
            }

            let current_store = self.state.params().get(ParamKey::SubscriberType).to_string();
            let mut store = current_store.clone();
            ui.label("Store:");
            egui::ComboBox::from_id_source("store_filter")
                .selected_text(current_store.clone())
                .show_ui(ui, |ui| {
                    for option in STORE_OPTIONS {
                        ui.selectable_value(&mut store, option.to_string(), option);
                    }
                });
            if store != current_store {
                intents.push(Intent::SetParam(ParamKey::SubscriberType, store));
            }

            ui.separator();

            if ui.button("🔄 Refresh").clicked() {
                intents.push(Intent::Refresh);
            }
        });

        if !self.show_filters {
            return;
        }

        ui.horizontal_wrapped(|ui| {
            for key in TEXT_PARAMS {
                let buffer = self.inputs.entry(key).or_default();
                ui.label(format!("{}:", key.label()));
                let width = match key {
                    ParamKey::Search => 200.0,
                    ParamKey::SessionId | ParamKey::ClientId => 140.0,
                    ParamKey::StartTime | ParamKey::EndTime => 170.0,
                    _ => 50.0,
                };
                let response = ui.add(egui::TextEdit::singleline(buffer).desired_width(width));
                if response.changed() {
                    intents.push(Intent::SetParam(key, self.inputs[&key].clone()));
                }
                if response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter)) {
                    intents.push(Intent::Refresh);
                }
            }
        });
    }

    fn list_ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, intents: &mut Vec<Intent>) {
        egui::ScrollArea::vertical()
            .id_source("log_list")
            .auto_shrink([false; 2])
            .show_viewport(ui, |ui, viewport| {
                self.dispatch(ctx, Intent::Resize(viewport.height()));
                self.dispatch(ctx, Intent::Scroll(viewport.min.y));

                ui.set_height(self.state.total_height());
                let origin = ui.min_rect().min;
                let width = ui.available_width();

                self.state.run_pending_render();
                match self.state.list_content() {
                    ListContent::Rows(window) => {
                        for row in &window.rows {
                            let rect = egui::Rect::from_min_size(
                                egui::pos2(origin.x, origin.y + row.top),
                                egui::vec2(width, self.state.geometry().item_height()),
                            );
                            if self.row_ui(ui, rect, row) {
                                intents.push(Intent::ShowDetail(row.index));
                            }
                        }
                    }
                    content => {
                        let rect = egui::Rect::from_min_size(
                            egui::pos2(origin.x, origin.y + viewport.min.y),
                            egui::vec2(width, 60.0),
                        );
                        ui.allocate_ui_at_rect(rect, |ui| {
                            ui.centered_and_justified(|ui| status_placeholder(ui, &content));
                        });
                    }
                }
            });
    }

    /// Paints one row at its absolute position. Returns whether it was clicked.
    fn row_ui(&self, ui: &mut egui::Ui, rect: egui::Rect, row: &RowView) -> bool {
        let visuals = ui.visuals();
        if ui.rect_contains_pointer(rect) {
            ui.painter().rect_filled(rect, 0.0, visuals.faint_bg_color);
        }
        ui.painter().hline(
            rect.x_range(),
            rect.bottom(),
            visuals.widgets.noninteractive.bg_stroke,
        );

        let badge_color = self.config.color_palette.for_severity(row.severity);
        let text_color = visuals.text_color();
        let highlight = visuals.selection.bg_fill;

        ui.allocate_ui_at_rect(rect.shrink2(egui::vec2(10.0, 6.0)), |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&row.time).monospace().weak());
                ui.label(
                    egui::RichText::new(format!(" {} ", row.level))
                        .monospace()
                        .small()
                        .color(egui::Color32::BLACK)
                        .background_color(badge_color),
                );
            });

            let mut job = egui::text::LayoutJob::default();
            for (segment, is_match) in self.state.highlighter().segments(&row.message) {
                job.append(
                    segment,
                    0.0,
                    egui::TextFormat {
                        color: text_color,
                        background: if is_match {
                            highlight
                        } else {
                            egui::Color32::TRANSPARENT
                        },
                        ..Default::default()
                    },
                );
            }
            job.wrap.max_rows = 2;
            ui.label(job);
        });

        ui.interact(rect, ui.id().with(("log_row", row.index)), egui::Sense::click())
            .on_hover_cursor(egui::CursorIcon::PointingHand)
            .clicked()
    }

    fn detail_ui(&self, ctx: &egui::Context, view: &DetailView, intents: &mut Vec<Intent>) {
        let mut open = true;
        let badge_color = self.config.color_palette.for_severity(view.severity);
        let copy_label = self.state.dialog().copy_feedback().label();

        egui::Window::new("Log Details")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(640.0)
            .show(ctx, |ui| {
                if ui.button(copy_label).clicked() {
                    intents.push(Intent::Copy);
                }
                ui.separator();

                egui::ScrollArea::vertical().max_height(560.0).show(ui, |ui| {
                    egui::Grid::new("detail_meta")
                        .num_columns(2)
                        .spacing([16.0, 6.0])
                        .show(ui, |ui| {
                            ui.label("Time");
                            ui.vertical(|ui| {
                                ui.label(&view.time_local);
                                ui.label(egui::RichText::new(&view.time_raw).small().weak());
                            });
                            ui.end_row();

                            ui.label("Level");
                            ui.label(
                                egui::RichText::new(format!(" {} ", view.level))
                                    .monospace()
                                    .color(egui::Color32::BLACK)
                                    .background_color(badge_color),
                            );
                            ui.end_row();

                            for (label, value) in [
                                ("Session ID", &view.session_id),
                                ("Client ID", &view.client_id),
                                ("Source", &view.source),
                            ] {
                                ui.label(label);
                                let mut value = value.as_str();
                                ui.add(egui::TextEdit::singleline(&mut value).desired_width(320.0));
                                ui.end_row();
                            }
                        });

                    code_section(ui, "Message", &view.message, None);
                    if let Some(error) = &view.error {
                        let error_color = ui.visuals().error_fg_color;
                        code_section(ui, "Error", error, Some(error_color));
                    }
                    if let Some(stacktrace) = &view.stacktrace {
                        code_section(ui, "Stacktrace", stacktrace, None);
                    }
                    code_section(ui, "Raw JSON", &view.raw_json, None);
                });
            });

        if !open {
            intents.push(Intent::CloseDetail);
        }
    }
}

fn level_label(level: &str) -> &str {
    if level.is_empty() {
        "All"
    } else {
        level
    }
}

fn status_placeholder(ui: &mut egui::Ui, content: &ListContent<'_>) {
    match content {
        ListContent::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(LOADING_TEXT);
            });
        }
        ListContent::Empty => {
            ui.label(EMPTY_TEXT);
        }
        ListContent::Failed(message) => {
            ui.label(
                egui::RichText::new(format!("Error: {}", message))
                    .color(ui.visuals().error_fg_color),
            );
        }
        ListContent::Idle | ListContent::Rows(_) => {}
    }
}

fn code_section(ui: &mut egui::Ui, label: &str, body: &str, color: Option<egui::Color32>) {
    ui.add_space(8.0);
    let mut heading = egui::RichText::new(label).strong();
    if let Some(color) = color {
        heading = heading.color(color);
    }
    ui.label(heading);
    let mut body = body;
    ui.add(
        egui::TextEdit::multiline(&mut body)
            .code_editor()
            .desired_rows(1)
            .desired_width(f32::INFINITY),
    );
}

impl eframe::App for LogViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for outcome in self.fetcher.poll() {
            self.dispatch(ctx, Intent::FetchSettled(outcome));
        }
        self.dispatch(ctx, Intent::Tick);

        let mut intents = Vec::new();

        ctx.input(|input| {
            if input.key_pressed(egui::Key::F5) {
                intents.push(Intent::Refresh);
            }
            if input.key_pressed(egui::Key::Escape) && self.state.dialog().is_open() {
                intents.push(Intent::CloseDetail);
            }
        });

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("🔄 Refresh").clicked() {
                        intents.push(Intent::Refresh);
                        ui.close_menu();
                    }

                    ui.separator();

                    let export = ui.add_enabled(
                        !self.state.records().is_empty(),
                        egui::Button::new("Export HTML..."),
                    );
                    if export.clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("HTML", &["html"])
                            .set_file_name("logs.html")
                            .save_file()
                        {
                            intents.push(Intent::Export(path));
                        }
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_filters, "Show Filters");
                });
            });
        });

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.controls_ui(ui, &mut intents);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.state.is_loading() {
                    ui.spinner();
                }
                ui.label(self.state.status_text());
                ui.separator();
                ui.label(format!("Records: {}", self.state.records().len()));
                if self.fetcher.in_flight() > 1 {
                    ui.separator();
                    ui.label(format!("Requests in flight: {}", self.fetcher.in_flight()));
                }
                if let Some(notice) = self.state.notice() {
                    ui.separator();
                    ui.label(notice);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.list_ui(ui, ctx, &mut intents);
        });

        if let Some(view) = self.state.dialog().view() {
            self.detail_ui(ctx, view, &mut intents);
        }

        for intent in intents {
            self.dispatch(ctx, intent);
        }
    }
}
