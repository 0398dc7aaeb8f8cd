//! Pomo Lock - a single-session Pomodoro timer daemon
//!
//! Runs one countdown at a time, sends desktop notifications at five minutes
//! and one minute left, and locks the screen when the session completes. A
//! small local HTTP API starts and stops sessions and changes settings.

pub mod api;
pub mod config;
pub mod error;
pub mod prefs;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{AppError, TimerError};
pub use state::{AppState, TimerEngine, TimerEvent};
pub use utils::signals::shutdown_signal;
