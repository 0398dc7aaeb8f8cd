//! Pomo Lock - a single-session Pomodoro timer daemon
//!
//! This is the main entry point for the pomo-lock application.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use pomo_lock::{
    api::create_router,
    config::Config,
    prefs::{resolve_prefs_path, Preferences},
    services::{DesktopNotifier, LoginItem, SessionLocker},
    state::AppState,
    tasks::tick_driver_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomo_lock={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pomo-lock v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}", config.host, config.port);

    let prefs_path = resolve_prefs_path(config.prefs.clone());
    let preferences = match &prefs_path {
        Some(path) => Preferences::load(path),
        None => {
            warn!("Could not determine a preferences location; using defaults");
            Preferences::default()
        }
    };

    let locker = SessionLocker::new(config.fallback_lock_command()?);
    let login_item = match LoginItem::for_current_user() {
        Ok(item) => Some(item),
        Err(e) => {
            warn!("Launch at login unavailable: {}", e);
            None
        }
    };

    // Create application state
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        preferences,
        prefs_path,
        login_item,
        Arc::new(DesktopNotifier::new()),
        Arc::new(locker),
    ));

    if let Some(input) = config.launch_input() {
        state
            .start(&input)
            .context("could not start the requested session")?;
    }

    // Start the tick driver background task
    let tick_state = Arc::clone(&state);
    tokio::spawn(async move {
        tick_driver_task(tick_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("could not bind {}", addr))?;

    info!("Control API running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start       - Start a session ({{\"mode\":\"duration\",\"value\":\"25\"}})");
    info!("  POST /timer/stop        - Stop the session");
    info!("  GET  /status            - Timer, sound and login settings");
    info!("  GET  /sounds            - List notification sounds");
    info!("  PUT  /sounds            - Select a notification sound");
    info!("  GET  /login-item        - Launch at login state");
    info!("  POST /login-item/toggle - Toggle launch at login");
    info!("  POST /lock/test         - Lock the screen in 2 seconds");
    info!("  GET  /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Shutdown complete");
    Ok(())
}
