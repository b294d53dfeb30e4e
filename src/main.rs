mod app;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with the people to explore.
    #[arg(long, default_value = "data/royals.json")]
    data: PathBuf,

    /// Name or identifier to start the tree from.
    #[arg(long)]
    start: Option<String>,

    /// Artificial delay added to every family lookup.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// JSON file overriding layout and physics tuning.
    #[arg(long)]
    layout: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arvore=info")),
        )
        .init();

    let args = Args::parse();
    let launch = app::Launch {
        data: args.data,
        layout: args.layout,
        start: args.start,
        latency: Duration::from_millis(args.latency_ms),
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "árvore",
        options,
        Box::new(move |cc| Ok(Box::new(app::ArvoreApp::new(cc, launch)))),
    )
}
