//! Screen locking
//!
//! Tries the desktop's screensaver over D-Bus first and falls back to running
//! a command (`loginctl lock-session` unless configured otherwise).

use std::process::Stdio;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, warn};
use zbus::proxy::Proxy;

use crate::error::AppError;

pub const DEFAULT_FALLBACK_LOCK_CMD: [&str; 2] = ["loginctl", "lock-session"];

/// Session-bus screensaver interfaces, tried in order
const SCREENSAVER_SERVICES: [(&str, &str, &str); 2] = [
    (
        "org.freedesktop.ScreenSaver",
        "/org/freedesktop/ScreenSaver",
        "org.freedesktop.ScreenSaver",
    ),
    (
        "org.gnome.ScreenSaver",
        "/org/gnome/ScreenSaver",
        "org.gnome.ScreenSaver",
    ),
];

/// Which mechanism ended up locking the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMethod {
    Native,
    Fallback,
}

#[async_trait]
pub trait ScreenLocker: Send + Sync {
    async fn lock(&self) -> Result<LockMethod, AppError>;
}

#[derive(Debug, Clone)]
pub struct SessionLocker {
    fallback_cmd: Vec<String>,
}

impl Default for SessionLocker {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_LOCK_CMD.iter().map(|s| s.to_string()).collect())
    }
}

impl SessionLocker {
    pub fn new(fallback_cmd: Vec<String>) -> Self {
        Self { fallback_cmd }
    }

    pub fn fallback_cmd(&self) -> &[String] {
        &self.fallback_cmd
    }
}

#[async_trait]
impl ScreenLocker for SessionLocker {
    async fn lock(&self) -> Result<LockMethod, AppError> {
        match lock_via_screensaver().await {
            Ok(()) => {
                info!("Screen locked via D-Bus screensaver");
                Ok(LockMethod::Native)
            }
            Err(e) => {
                warn!("Native screen lock unavailable ({}), using fallback command", e);
                lock_via_command(&self.fallback_cmd).await?;
                info!("Screen locked via fallback command");
                Ok(LockMethod::Fallback)
            }
        }
    }
}

async fn lock_via_screensaver() -> Result<(), AppError> {
    let conn = zbus::Connection::session().await?;

    let mut last_error = AppError::Dbus("no screensaver service on the session bus".into());
    for (destination, path, interface) in SCREENSAVER_SERVICES {
        debug!("Trying {} Lock", destination);
        let result = async {
            let proxy = Proxy::new(&conn, destination, path, interface).await?;
            proxy.call_method("Lock", &()).await?;
            Ok::<(), zbus::Error>(())
        }
        .await;

        match result {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!("{} Lock failed: {}", destination, e);
                last_error = e.into();
            }
        }
    }
    Err(last_error)
}

async fn lock_via_command(cmd: &[String]) -> Result<(), AppError> {
    let (program, args) = cmd
        .split_first()
        .ok_or_else(|| AppError::Config("fallback lock command is empty".into()))?;
    debug!("Running lock command: {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Io(std::io::Error::other(format!(
            "{} failed with {}: {}",
            program,
            output.status,
            stderr.trim()
        ))));
    }
    Ok(())
}
