//! Error types
//!
//! `TimerError` covers rejected user input; its `Display` text is the message
//! shown to the user. `AppError` covers everything else the daemon can hit.

/// Reasons a session could not be started
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("Please enter a valid duration in minutes.")]
    InvalidDuration,
    #[error("Please enter a valid time in 24-hour format (HH:MM)")]
    InvalidTime,
    #[error("End time must be in the future.")]
    TimeInPast,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error("state error: {0}")]
    State(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("dbus error: {0}")]
    Dbus(String),
    #[error("notification error: {0}")]
    Notification(String),
    #[error("unknown notification sound: {0}")]
    UnknownSound(String),
    #[error("Could not change launch at login setting.")]
    LoginItem(String),
}

impl AppError {
    /// Whether the error came from user input and should be reported as such
    pub fn is_user_error(&self) -> bool {
        matches!(self, AppError::Timer(_) | AppError::UnknownSound(_))
    }
}

impl From<zbus::Error> for AppError {
    fn from(e: zbus::Error) -> Self {
        AppError::Dbus(e.to_string())
    }
}
