//! Launch at login via an XDG autostart entry

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::info;

use crate::error::AppError;

const DESKTOP_FILE: &str = "pomo-lock.desktop";

#[derive(Debug, Clone)]
pub struct LoginItem {
    entry_path: PathBuf,
    exec: PathBuf,
}

impl LoginItem {
    pub fn new(autostart_dir: &Path, exec: PathBuf) -> Self {
        Self {
            entry_path: autostart_dir.join(DESKTOP_FILE),
            exec,
        }
    }

    /// Autostart entry for the running binary in the user's config directory
    pub fn for_current_user() -> Result<Self, AppError> {
        let dirs = BaseDirs::new()
            .ok_or_else(|| AppError::Config("could not determine home directory".into()))?;
        let exec = std::env::current_exe()?;
        Ok(Self::new(&dirs.config_dir().join("autostart"), exec))
    }

    pub fn entry_path(&self) -> &Path {
        &self.entry_path
    }

    pub fn is_enabled(&self) -> bool {
        self.entry_path.is_file()
    }

    /// Flip the setting and return the new state
    pub fn toggle(&self) -> Result<bool, AppError> {
        if self.is_enabled() {
            std::fs::remove_file(&self.entry_path)
                .map_err(|e| AppError::LoginItem(format!("remove {}: {e}", self.entry_path.display())))?;
            info!("Launch at login disabled");
            Ok(false)
        } else {
            if let Some(parent) = self.entry_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::LoginItem(format!("create {}: {e}", parent.display())))?;
            }
            std::fs::write(&self.entry_path, self.desktop_entry())
                .map_err(|e| AppError::LoginItem(format!("write {}: {e}", self.entry_path.display())))?;
            info!("Launch at login enabled");
            Ok(true)
        }
    }

    fn desktop_entry(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name=Pomodoro Timer\n\
             Comment=Pomodoro timer that locks the screen when time is up\n\
             Exec=\"{}\"\n\
             Terminal=false\n\
             X-GNOME-Autostart-enabled=true\n",
            self.exec.display()
        )
    }
}
