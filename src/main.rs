//! Repost Graph
//!
//! Desktop viewer for channel repost networks: pick categories, then explore
//! the force-directed graph of who reposts whom.

mod app;
mod data;
mod details;
mod error;
mod graph;
mod session;
mod settings;
mod theme;

use clap::Parser;
use eframe::egui;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "repost-graph", version, about = "Explore channel repost networks")]
struct Cli {
    /// Dataset file or http(s) URL (defaults to the saved setting)
    data: Option<String>,

    /// Preselect a category on the picker (repeatable)
    #[arg(long = "category", value_name = "NAME")]
    categories: Vec<String>,
}

fn main() -> eframe::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Repost Graph"),
        persist_window: true,
        ..Default::default()
    };

    let app_options = app::AppOptions {
        data: cli.data,
        categories: cli.categories,
    };

    eframe::run_native(
        "Repost Graph",
        options,
        Box::new(|cc| Ok(Box::new(app::RepostGraphApp::new(cc, app_options)))),
    )
}
