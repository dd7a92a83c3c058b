mod app;
mod config;
mod plasma;
mod trig;
mod worker;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    env_logger::init();

    let custom = match std::env::args().nth(1) {
        Some(path) => Some(
            config::load_preset(&path)
                .with_context(|| format!("loading plasma preset from {path}"))?,
        ),
        None => None,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 680.0])
            .with_min_inner_size([800.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Plasma Waves",
        options,
        Box::new(move |cc| Ok(Box::new(app::PlasmaApp::new(cc, custom)))),
    )
    .map_err(|err| anyhow::anyhow!("failed to run UI: {err}"))
}
