mod app;
mod config;
mod detail;
mod error;
mod fetcher;
mod markup;
mod query;
mod record;
mod search;
mod state;
mod virtual_list;

use app::LogViewerApp;
use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(1200.0, 800.0)),
        ..Default::default()
    };

    eframe::run_native(
        "Log Viewer",
        options,
        Box::new(|cc| Box::new(LogViewerApp::new(cc))),
    )
}
