//! State management module
//!
//! This module contains the countdown engine, the input it accepts, the
//! snapshot it is displayed through, and the shared application state.

pub mod app_state;
pub mod input;
pub mod timer_engine;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use input::{StartInput, WallClockTime};
pub use timer_engine::{TimerEngine, TimerEvent, TimerSession, TimerStatus};
pub use timer_state::TimerSnapshot;
