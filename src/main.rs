#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod editor;
mod engine;
mod network;
mod simulation;
mod theme;

use app::TrafficDashboardApp;
use config::AppConfig;
use eframe::egui;

/// 설정을 읽고 egui 애플리케이션을 실행하는 진입점입니다.
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_app_id("Rust Traffic Dashboard")
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([960.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rust Traffic Dashboard",
        native_options,
        Box::new(|cc| Box::new(TrafficDashboardApp::new(cc, config))),
    )
}
