//! Tick driver background task

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    task::JoinHandle,
    time::{interval, sleep, timeout, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{
    services::{Notice, ScreenLocker},
    state::{AppState, TimerEvent},
};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
/// Pause between the completion notification and the lock
pub const LOCK_DELAY: Duration = Duration::from_secs(1);
/// Pause before a user-requested test lock
pub const TEST_LOCK_DELAY: Duration = Duration::from_secs(2);
/// Longest a single notification may take before it is abandoned
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Gap between ticks, in milliseconds, beyond which the host was probably asleep
const TICK_GAP_WARNING_MS: i64 = 2_000;

/// Background task that ticks the engine once a second and acts on its events
pub async fn tick_driver_task(state: Arc<AppState>) {
    run_tick_loop(state, Utc::now).await;
}

/// Tick loop reading the wall clock from `clock`
pub async fn run_tick_loop<F>(state: Arc<AppState>, mut clock: F)
where
    F: FnMut() -> DateTime<Utc>,
{
    info!("Starting tick driver");

    let mut interval = interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick: Option<DateTime<Utc>> = None;

    loop {
        interval.tick().await;
        let now = clock();

        if let Some(gap_ms) = last_tick.and_then(|previous| tick_gap_ms(previous, now)) {
            debug!(
                "Ticks {}ms apart (suspend?); a warning window may have been missed",
                gap_ms
            );
        }
        last_tick = Some(now);

        match state.tick(now) {
            Ok(events) => {
                dispatch_events(&state, &events);
            }
            Err(e) => error!("Failed to tick timer: {}", e),
        }
    }
}

/// Milliseconds between two ticks, when long enough that warnings may be lost
fn tick_gap_ms(previous: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    let gap_ms = (now - previous).num_milliseconds();
    (gap_ms > TICK_GAP_WARNING_MS).then_some(gap_ms)
}

/// Turn engine events into notifications, and lock the screen on completion.
///
/// Notifications go out in order on their own task, so a slow notification
/// server never holds up the tick loop or the lock. Returns that task, or
/// `None` when there was nothing to send.
pub fn dispatch_events(state: &AppState, events: &[TimerEvent]) -> Option<JoinHandle<()>> {
    if events.is_empty() {
        return None;
    }

    if events.contains(&TimerEvent::Completed) {
        schedule_lock(state.locker(), LOCK_DELAY);
    }

    let notifier = state.notifier();
    let sound = state.sound();
    let events = events.to_vec();

    Some(tokio::spawn(async move {
        for event in events {
            let notice = Notice::for_event(event);
            match timeout(NOTIFY_TIMEOUT, notifier.notify(notice, sound)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Failed to show '{}' notification: {}", notice.title, e),
                Err(_) => warn!(
                    "Gave up on '{}' notification after {:?}",
                    notice.title, NOTIFY_TIMEOUT
                ),
            }
        }
    }))
}

/// Lock the screen after `delay` on a separate task. Failures are logged only.
pub fn schedule_lock(locker: Arc<dyn ScreenLocker>, delay: Duration) -> JoinHandle<()> {
    debug!("Screen lock scheduled in {:?}", delay);
    tokio::spawn(async move {
        sleep(delay).await;
        match locker.lock().await {
            Ok(method) => info!("Screen locked ({:?})", method),
            Err(e) => error!("Failed to lock screen: {}", e),
        }
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeDelta;

    use super::*;
    use crate::{
        error::AppError,
        prefs::{NotificationSound, Preferences},
        services::Notifier,
        state::{
            app_state::test_support::{fixture, CountingLocker},
            StartInput,
        },
    };

    /// Notifier whose server never answers
    struct StalledNotifier;

    #[async_trait]
    impl Notifier for StalledNotifier {
        async fn notify(&self, _: Notice, _: NotificationSound) -> Result<(), AppError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completion_notifies_then_locks_after_delay() {
        let f = fixture();
        dispatch_events(&f.state, &[TimerEvent::Completed])
            .unwrap()
            .await
            .unwrap();

        assert_eq!(f.notifier.titles(), vec!["Pomodoro Complete!"]);
        assert_eq!(f.locker.count(), 0);

        sleep(LOCK_DELAY + Duration::from_millis(100)).await;
        assert_eq!(f.locker.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn warnings_notify_without_locking() {
        let f = fixture();
        dispatch_events(
            &f.state,
            &[TimerEvent::FiveMinuteWarning, TimerEvent::OneMinuteWarning],
        )
        .unwrap()
        .await
        .unwrap();

        assert_eq!(f.notifier.titles(), vec!["5 Minutes Left", "1 Minute Left"]);
        sleep(Duration::from_secs(5)).await;
        assert_eq!(f.locker.count(), 0);
    }

    #[tokio::test]
    async fn no_events_spawns_nothing() {
        let f = fixture();
        assert!(dispatch_events(&f.state, &[]).is_none());
    }

    #[tokio::test]
    async fn notifications_use_the_selected_sound() {
        let f = fixture();
        f.state.set_sound(NotificationSound::Ping).unwrap();
        dispatch_events(&f.state, &[TimerEvent::OneMinuteWarning])
            .unwrap()
            .await
            .unwrap();

        let shown = f.notifier.shown.lock().unwrap();
        assert_eq!(shown[0].1, NotificationSound::Ping);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_notifier_does_not_hold_up_the_lock() {
        let locker = Arc::new(CountingLocker::default());
        let state = AppState::new(
            0,
            "127.0.0.1".to_string(),
            Preferences::default(),
            None,
            None,
            Arc::new(StalledNotifier),
            locker.clone(),
        );

        let delivery = dispatch_events(&state, &[TimerEvent::Completed]).unwrap();
        sleep(LOCK_DELAY + Duration::from_millis(100)).await;
        assert_eq!(locker.count(), 1);
        assert!(!delivery.is_finished());

        sleep(NOTIFY_TIMEOUT).await;
        assert!(delivery.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn started_session_completes_and_locks() {
        let f = fixture();
        f.state
            .start(&StartInput::Duration("1".to_string()))
            .unwrap();

        let events = f.state.tick(Utc::now() + TimeDelta::seconds(60)).unwrap();
        dispatch_events(&f.state, &events).unwrap().await.unwrap();
        sleep(LOCK_DELAY * 2).await;

        assert_eq!(f.notifier.titles(), vec!["Pomodoro Complete!"]);
        assert_eq!(f.locker.count(), 1);
        assert!(!f.state.snapshot().unwrap().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn tick_loop_runs_a_session_to_the_lock() {
        let f = fixture();
        f.state
            .start(&StartInput::Duration("1".to_string()))
            .unwrap();

        let base = Utc::now();
        let started = tokio::time::Instant::now();
        let clock = move || base + TimeDelta::from_std(started.elapsed()).unwrap();
        let driver = tokio::spawn(run_tick_loop(Arc::clone(&f.state), clock));

        sleep(Duration::from_secs(30)).await;
        assert!(f.state.snapshot().unwrap().is_running());
        assert_eq!(f.locker.count(), 0);

        sleep(Duration::from_secs(32)).await;
        driver.abort();

        assert!(!f.state.snapshot().unwrap().is_running());
        assert_eq!(f.notifier.titles().last(), Some(&"Pomodoro Complete!"));
        assert_eq!(f.locker.count(), 1);
    }

    #[test]
    fn long_gaps_between_ticks_are_reported() {
        let t0 = Utc::now();
        assert_eq!(tick_gap_ms(t0, t0 + TimeDelta::seconds(1)), None);
        assert_eq!(tick_gap_ms(t0, t0 + TimeDelta::seconds(2)), None);
        assert_eq!(
            tick_gap_ms(t0, t0 + TimeDelta::milliseconds(2_001)),
            Some(2_001)
        );
        assert_eq!(tick_gap_ms(t0, t0 + TimeDelta::minutes(45)), Some(2_700_000));
    }
}
