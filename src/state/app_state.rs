//! Main application state management

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};

use super::{
    input::{parse_minutes, StartInput, WallClockTime},
    TimerEngine, TimerEvent, TimerSnapshot,
};
use crate::{
    error::AppError,
    prefs::{NotificationSound, Preferences},
    services::{LoginItem, Notifier, ScreenLocker},
};

/// Everything the daemon shares between the HTTP handlers and the tick driver.
///
/// The engine is only ever touched with this state's lock held, and the lock
/// is never held across an await.
pub struct AppState {
    engine: Mutex<TimerEngine>,
    preferences: Mutex<Preferences>,
    prefs_path: Option<PathBuf>,
    login_item: Option<LoginItem>,
    notifier: Arc<dyn Notifier>,
    locker: Arc<dyn ScreenLocker>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(
        port: u16,
        host: String,
        preferences: Preferences,
        prefs_path: Option<PathBuf>,
        login_item: Option<LoginItem>,
        notifier: Arc<dyn Notifier>,
        locker: Arc<dyn ScreenLocker>,
    ) -> Self {
        Self {
            engine: Mutex::new(TimerEngine::new()),
            preferences: Mutex::new(preferences),
            prefs_path,
            login_item,
            notifier,
            locker,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    fn engine(&self) -> Result<MutexGuard<'_, TimerEngine>, AppError> {
        self.engine
            .lock()
            .map_err(|e| AppError::State(format!("Failed to lock timer engine: {}", e)))
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
    }

    /// Validate the input and start a session. On error the engine is left
    /// exactly as it was.
    pub fn start(&self, input: &StartInput) -> Result<TimerSnapshot, AppError> {
        let snapshot = {
            let mut engine = self.engine()?;
            match input {
                StartInput::Duration(text) => {
                    let seconds = parse_minutes(text)?;
                    engine.start(seconds, Utc::now())?;
                }
                StartInput::EndTime(text) => {
                    let target: WallClockTime = text.parse()?;
                    engine.start_at(target, Local::now())?;
                }
            }
            TimerSnapshot::capture(&engine, Utc::now())
        };

        self.record_action("start");
        info!("Session started: {}", snapshot.status_line);
        Ok(snapshot)
    }

    pub fn stop(&self) -> Result<TimerSnapshot, AppError> {
        let cancelled = self.engine()?.stop();
        self.record_action("stop");
        if !cancelled {
            info!("Stop requested with no running session");
        }
        Ok(TimerSnapshot::idle())
    }

    /// Advance the engine to `now`
    pub fn tick(&self, now: DateTime<Utc>) -> Result<Vec<TimerEvent>, AppError> {
        Ok(self.engine()?.tick(now))
    }

    pub fn snapshot(&self) -> Result<TimerSnapshot, AppError> {
        Ok(TimerSnapshot::capture(&*self.engine()?, Utc::now()))
    }

    pub fn sound(&self) -> NotificationSound {
        self.preferences
            .lock()
            .map(|p| p.notification_sound)
            .unwrap_or_default()
    }

    /// Change the notification sound and persist it
    pub fn set_sound(&self, sound: NotificationSound) -> Result<(), AppError> {
        let prefs = {
            let mut prefs = self
                .preferences
                .lock()
                .map_err(|e| AppError::State(format!("Failed to lock preferences: {}", e)))?;
            prefs.notification_sound = sound;
            *prefs
        };
        info!("Notification sound set to {}", sound);
        self.record_action("select-sound");

        match &self.prefs_path {
            Some(path) => prefs.save(path),
            None => {
                warn!("No preferences path; sound choice will not survive a restart");
                Ok(())
            }
        }
    }

    pub fn login_item_enabled(&self) -> bool {
        self.login_item
            .as_ref()
            .is_some_and(|item| item.is_enabled())
    }

    /// Flip launch-at-login and return the new setting
    pub fn toggle_login_item(&self) -> Result<bool, AppError> {
        let item = self
            .login_item
            .as_ref()
            .ok_or_else(|| AppError::LoginItem("no autostart location available".into()))?;
        let enabled = item.toggle()?;
        self.record_action("toggle-login-item");
        Ok(enabled)
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    pub fn locker(&self) -> Arc<dyn ScreenLocker> {
        Arc::clone(&self.locker)
    }

    /// Calculate daemon uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::services::{LockMethod, Notice};

    /// Notifier that records what it was asked to show
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub shown: Mutex<Vec<(Notice, NotificationSound)>>,
    }

    impl RecordingNotifier {
        pub fn titles(&self) -> Vec<&'static str> {
            self.shown.lock().unwrap().iter().map(|(n, _)| n.title).collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notice: Notice, sound: NotificationSound) -> Result<(), AppError> {
            self.shown.lock().unwrap().push((notice, sound));
            Ok(())
        }
    }

    /// Locker that counts lock requests
    #[derive(Default)]
    pub struct CountingLocker {
        pub locks: Mutex<u32>,
    }

    impl CountingLocker {
        pub fn count(&self) -> u32 {
            *self.locks.lock().unwrap()
        }
    }

    #[async_trait]
    impl ScreenLocker for CountingLocker {
        async fn lock(&self) -> Result<LockMethod, AppError> {
            *self.locks.lock().unwrap() += 1;
            Ok(LockMethod::Native)
        }
    }

    pub struct Fixture {
        pub state: Arc<AppState>,
        pub notifier: Arc<RecordingNotifier>,
        pub locker: Arc<CountingLocker>,
        pub dir: tempfile::TempDir,
    }

    pub fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let locker = Arc::new(CountingLocker::default());
        let login_item = LoginItem::new(
            &dir.path().join("autostart"),
            PathBuf::from("/usr/bin/pomo-lock"),
        );
        let state = Arc::new(AppState::new(
            20525,
            "127.0.0.1".to_string(),
            Preferences::default(),
            Some(dir.path().join("prefs.json")),
            Some(login_item),
            notifier.clone(),
            locker.clone(),
        ));
        Fixture {
            state,
            notifier,
            locker,
            dir,
        }
    }
}
