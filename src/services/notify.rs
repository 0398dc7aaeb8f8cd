//! Desktop notifications for timer events

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{error::AppError, prefs::NotificationSound, state::TimerEvent};

const APP_NAME: &str = "Pomodoro Timer";

/// Title and body of one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub body: &'static str,
}

impl Notice {
    pub fn for_event(event: TimerEvent) -> Self {
        match event {
            TimerEvent::FiveMinuteWarning => Self {
                title: "5 Minutes Left",
                body: "Your Pomodoro session is almost done!",
            },
            TimerEvent::OneMinuteWarning => Self {
                title: "1 Minute Left",
                body: "Wrapping up your Pomodoro session!",
            },
            TimerEvent::Completed => Self {
                title: "Pomodoro Complete!",
                body: "Great work! Time for a break.",
            },
        }
    }

    /// Sent when the user picks a sound, so they can hear it
    pub fn sound_preview() -> Self {
        Self {
            title: "Sound Preview",
            body: "This is how your notifications will sound",
        }
    }
}

/// Where notifications go
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: Notice, sound: NotificationSound) -> Result<(), AppError>;
}

/// Freedesktop notifications via notify-rust
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notice: Notice, sound: NotificationSound) -> Result<(), AppError> {
        debug!("Showing notification '{}' with sound {}", notice.title, sound);

        let mut n = notify_rust::Notification::new();
        n.appname(&self.app_name)
            .summary(notice.title)
            .body(notice.body)
            .urgency(notify_rust::Urgency::Critical);
        if let Some(name) = sound.sound_name() {
            n.sound_name(name);
        }

        n.show_async()
            .await
            .map_err(|e| AppError::Notification(e.to_string()))?;

        info!("Notification shown: {}", notice.title);
        Ok(())
    }
}
