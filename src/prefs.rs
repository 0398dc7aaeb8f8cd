//! Persisted user preferences
//!
//! The only persisted value is the notification sound. It is stored as its
//! name in a small JSON file and validated against the known set on load.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AppError;

pub const ENV_PREFS: &str = "POMO_LOCK_PREFS";
const PREFS_FILE: &str = "prefs.json";

/// Sounds a notification can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotificationSound {
    /// The platform's default notification sound
    Default,
    #[default]
    Glass,
    Basso,
    Blow,
    Bottle,
    Frog,
    Funk,
    Hero,
    Morse,
    Ping,
    Pop,
    Purr,
    Sosumi,
    Submarine,
    Tink,
}

impl NotificationSound {
    pub const ALL: [NotificationSound; 15] = [
        Self::Default,
        Self::Glass,
        Self::Basso,
        Self::Blow,
        Self::Bottle,
        Self::Frog,
        Self::Funk,
        Self::Hero,
        Self::Morse,
        Self::Ping,
        Self::Pop,
        Self::Purr,
        Self::Sosumi,
        Self::Submarine,
        Self::Tink,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Glass => "Glass",
            Self::Basso => "Basso",
            Self::Blow => "Blow",
            Self::Bottle => "Bottle",
            Self::Frog => "Frog",
            Self::Funk => "Funk",
            Self::Hero => "Hero",
            Self::Morse => "Morse",
            Self::Ping => "Ping",
            Self::Pop => "Pop",
            Self::Purr => "Purr",
            Self::Sosumi => "Sosumi",
            Self::Submarine => "Submarine",
            Self::Tink => "Tink",
        }
    }

    /// Sound name to request from the notification server, if any.
    /// `Default` leaves the choice to the server.
    pub fn sound_name(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            other => Some(other.name()),
        }
    }

    pub fn available_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.name()).collect()
    }
}

impl FromStr for NotificationSound {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|sound| sound.name() == s)
            .ok_or_else(|| AppError::UnknownSound(s.to_string()))
    }
}

impl fmt::Display for NotificationSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// On-disk form; the sound is kept as a plain string so an unknown name
/// doesn't make the whole file unreadable.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreferences {
    #[serde(default)]
    notification_sound: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub notification_sound: NotificationSound,
}

impl Preferences {
    /// Load preferences, falling back to defaults on any problem
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                debug!("No preferences read from {}: {}", path.display(), e);
                return Self::default();
            }
        };

        let stored: StoredPreferences = match serde_json::from_str(&data) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
                return Self::default();
            }
        };

        let notification_sound = stored
            .notification_sound
            .and_then(|name| name.parse().ok())
            .unwrap_or_default();

        info!("Loaded preferences: sound={}", notification_sound);
        Self { notification_sound }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredPreferences {
            notification_sound: Some(self.notification_sound.name().to_string()),
        };
        let data = serde_json::to_string_pretty(&stored)
            .map_err(|e| AppError::Config(format!("serialize preferences failed: {e}")))?;
        std::fs::write(path, data)?;
        debug!("Saved preferences to {}", path.display());
        Ok(())
    }
}

/// Preferences path: CLI value, then `POMO_LOCK_PREFS`, then the user's
/// config directory. `None` when no config directory can be determined.
pub fn resolve_prefs_path(cli_value: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(p) = cli_value {
        return Some(p);
    }
    if let Ok(p) = std::env::var(ENV_PREFS) {
        return Some(PathBuf::from(p));
    }
    default_prefs_path()
}

pub fn default_prefs_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("dev", "pomo-lock", "pomo-lock")?;
    Some(dirs.config_dir().join(PREFS_FILE))
}
