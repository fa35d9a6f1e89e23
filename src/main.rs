//! Iris Frame Viewer
//!
//! Simulated source -> normalizer -> SDL2 display, with a rolling stats
//! readout refreshed once a second.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use flume::bounded;
use iris::display::sdl2::run_display_loop;
use iris::display::Sdl2Display;
use iris::source::{run_source, Frame};
use iris::stats::{ConnectionStatus, StatsAggregator};
use iris::viewer::{RefreshTask, Viewer};
use iris::ViewerConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("iris=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("Iris launching...");

    // Load configuration
    let config = ViewerConfig::default();
    iris::CONFIG.store(Arc::new(config.clone()));

    let stats = Arc::new(Mutex::new(StatsAggregator::new(config.stats.window_size)));
    if let Ok(mut stats) = stats.lock() {
        stats.set_connection_status(ConnectionStatus::Connecting, None);
    }

    // Set up tx/rx
    let (tx, rx) = bounded::<Frame>(config.channel_capacity);

    // Spawn the simulated source task
    let source_config = config.source.clone();
    let _source_handle = tokio::spawn(async move {
        if let Err(e) = run_source(source_config, tx).await {
            error!("Source error: {}", e);
        }
    });

    if let Ok(mut stats) = stats.lock() {
        stats.set_connection_status(
            ConnectionStatus::Connected,
            Some("Simulated source".to_string()),
        );
    }

    // Initialize SDL2
    let sdl_context = sdl2::init().map_err(|e| eyre!(e))?;
    let display = Sdl2Display::new(&sdl_context, config.display.width, config.display.height)?;

    let mut viewer = Viewer::new(display, Arc::clone(&stats));
    let refresh = RefreshTask::spawn(
        viewer.stats(),
        Duration::from_millis(config.stats.refresh_interval_ms),
    );

    run_display_loop(&sdl_context, &mut viewer, rx)?;

    refresh.stop();
    if let Ok(mut stats) = stats.lock() {
        stats.set_connection_status(ConnectionStatus::Disconnected, None);
    }

    info!("Iris shutting down");
    Ok(())
}
