mod app;
mod color;
mod state;
mod ui;

use app::DarkPulseApp;
use darkpulse::config::Settings;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::from_env();
    log::info!("Data source: {}", settings.source);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DarkPulse – Incident Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DarkPulseApp::new(settings)))),
    )
}
