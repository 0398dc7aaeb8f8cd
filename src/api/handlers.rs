//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Local;
use tracing::{error, info, warn};

use super::responses::{
    ApiResponse, HealthResponse, LoginItemResponse, MessageResponse, SoundRequest, SoundsResponse,
    StatusResponse,
};
use crate::{
    error::AppError,
    prefs::NotificationSound,
    services::Notice,
    state::{AppState, StartInput, WallClockTime},
    tasks::{schedule_lock, tick_driver::TEST_LOCK_DELAY},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<T>)>;

/// Build the error half of an `ApiResult` with the timer as it stands
fn timer_error(state: &AppState, e: AppError) -> (StatusCode, Json<ApiResponse>) {
    let code = if e.is_user_error() {
        warn!("Rejected timer request: {}", e);
        StatusCode::BAD_REQUEST
    } else {
        error!("Timer request failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let timer = state.snapshot().unwrap_or_default();
    (code, Json(ApiResponse::error(e.to_string(), timer)))
}

/// Handle POST /timer/start - Start a session from a duration or an end time
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<StartInput>,
) -> ApiResult<ApiResponse> {
    match state.start(&input) {
        Ok(timer) => {
            info!("Start endpoint called - {:?}", input);
            Ok(Json(ApiResponse::running(
                "Timer started".to_string(),
                timer,
            )))
        }
        Err(e) => Err(timer_error(&state, e)),
    }
}

/// Handle POST /timer/stop - Cancel the running session
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    match state.stop() {
        Ok(timer) => {
            info!("Stop endpoint called - timer stopped");
            Ok(Json(ApiResponse::idle("Timer stopped".to_string(), timer)))
        }
        Err(e) => Err(timer_error(&state, e)),
    }
}

/// Handle GET /status - Return the timer and settings
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.snapshot() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        sound: state.sound().to_string(),
        launch_at_login: state.login_item_enabled(),
        suggested_end_time: WallClockTime::suggested_end(&Local::now()).to_string(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /sounds - List notification sounds
pub async fn sounds_handler(State(state): State<Arc<AppState>>) -> Json<SoundsResponse> {
    Json(SoundsResponse {
        selected: state.sound().to_string(),
        available: NotificationSound::available_names()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

/// Handle PUT /sounds - Select a sound, persist it and play a preview
pub async fn select_sound_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SoundRequest>,
) -> ApiResult<MessageResponse> {
    let sound: NotificationSound = match request.sound.parse() {
        Ok(sound) => sound,
        Err(e) => {
            warn!("Rejected sound selection: {}", e);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(MessageResponse::error(e.to_string())),
            ));
        }
    };

    if let Err(e) = state.set_sound(sound) {
        // The choice still applies for this run.
        warn!("Failed to persist sound preference: {}", e);
    }

    if let Err(e) = state.notifier().notify(Notice::sound_preview(), sound).await {
        warn!("Failed to play sound preview: {}", e);
    }

    Ok(Json(MessageResponse::ok(format!(
        "Notification sound set to {}",
        sound
    ))))
}

/// Handle GET /login-item - Whether the daemon launches at login
pub async fn login_item_handler(State(state): State<Arc<AppState>>) -> Json<LoginItemResponse> {
    Json(LoginItemResponse {
        enabled: state.login_item_enabled(),
    })
}

/// Handle POST /login-item/toggle - Flip launch at login
pub async fn toggle_login_item_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LoginItemResponse>, (StatusCode, Json<MessageResponse>)> {
    match state.toggle_login_item() {
        Ok(enabled) => Ok(Json(LoginItemResponse { enabled })),
        Err(e) => {
            error!("Failed to toggle launch at login: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::error(e.to_string())),
            ))
        }
    }
}

/// Handle POST /lock/test - Lock the screen in a couple of seconds
pub async fn test_lock_handler(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    info!("Test lock requested");
    schedule_lock(state.locker(), TEST_LOCK_DELAY);
    Json(MessageResponse::ok(format!(
        "Screen will lock in {} seconds",
        TEST_LOCK_DELAY.as_secs()
    )))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        api::create_router,
        state::app_state::test_support::{fixture, Fixture},
    };

    fn app(f: &Fixture) -> Router {
        create_router(f.state.clone())
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn start_then_stop() {
        let f = fixture();
        let (code, body) = call(
            app(&f),
            Method::POST,
            "/timer/start",
            Some(json!({"mode": "duration", "value": "25"})),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["timer"]["total_duration_seconds"], 1500);
        assert_eq!(body["timer"]["can_stop"], true);

        let (code, body) = call(app(&f), Method::POST, "/timer/stop", None).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["status"], "idle");
        assert_eq!(body["timer"]["label"], "🍅");
        assert_eq!(body["timer"]["status_line"], "Ready to start");
    }

    #[tokio::test]
    async fn invalid_duration_is_a_bad_request() {
        let f = fixture();
        let (code, body) = call(
            app(&f),
            Method::POST,
            "/timer/start",
            Some(json!({"mode": "duration", "value": "-5"})),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please enter a valid duration in minutes.");
        assert_eq!(body["timer"]["status"], "idle");
    }

    #[tokio::test]
    async fn invalid_end_time_is_a_bad_request() {
        let f = fixture();
        let (code, body) = call(
            app(&f),
            Method::POST,
            "/timer/start",
            Some(json!({"mode": "end_time", "value": "7pm"})),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Please enter a valid time in 24-hour format (HH:MM)"
        );
    }

    #[tokio::test]
    async fn rejected_start_reports_the_running_session() {
        let f = fixture();
        f.state
            .start(&StartInput::Duration("10".to_string()))
            .unwrap();
        let (code, body) = call(
            app(&f),
            Method::POST,
            "/timer/start",
            Some(json!({"mode": "duration", "value": "0"})),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body["timer"]["status"], "running");
        assert_eq!(body["timer"]["total_duration_seconds"], 600);
    }

    #[tokio::test]
    async fn status_reports_settings() {
        let f = fixture();
        let (code, body) = call(app(&f), Method::GET, "/status", None).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["sound"], "Glass");
        assert_eq!(body["launch_at_login"], false);
        assert_eq!(body["timer"]["status"], "idle");
        assert_eq!(body["suggested_end_time"].as_str().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn selecting_a_sound_previews_it() {
        let f = fixture();
        let (code, _) = call(
            app(&f),
            Method::PUT,
            "/sounds",
            Some(json!({"sound": "Submarine"})),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(f.notifier.titles(), vec!["Sound Preview"]);

        let (_, body) = call(app(&f), Method::GET, "/sounds", None).await;
        assert_eq!(body["selected"], "Submarine");
        assert_eq!(body["available"].as_array().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn unknown_sound_is_rejected() {
        let f = fixture();
        let (code, _) = call(
            app(&f),
            Method::PUT,
            "/sounds",
            Some(json!({"sound": "Klaxon"})),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert!(f.notifier.titles().is_empty());
        assert_eq!(f.state.sound(), NotificationSound::Glass);
    }

    #[tokio::test]
    async fn login_item_toggle_round_trip() {
        let f = fixture();
        let (_, body) = call(app(&f), Method::POST, "/login-item/toggle", None).await;
        assert_eq!(body["enabled"], true);
        let (_, body) = call(app(&f), Method::GET, "/login-item", None).await;
        assert_eq!(body["enabled"], true);
        let (_, body) = call(app(&f), Method::POST, "/login-item/toggle", None).await;
        assert_eq!(body["enabled"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_locks_after_delay() {
        let f = fixture();
        let (code, _) = call(app(&f), Method::POST, "/lock/test", None).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(f.locker.count(), 0);
        tokio::time::sleep(TEST_LOCK_DELAY + std::time::Duration::from_millis(100)).await;
        assert_eq!(f.locker.count(), 1);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let f = fixture();
        let (code, body) = call(app(&f), Method::GET, "/health", None).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
