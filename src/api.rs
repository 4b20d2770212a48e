//! HTTP/JSON control surface over the session controller.
//!
//! Every response carries a `status` string; arbitration conflicts such as
//! `already_running` or `resource_busy` are ordinary `200 OK` answers. Only
//! malformed requests and internal failures produce error status codes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::error;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::CorsLayer;

use crate::{
    calibration::{CalibrationProgress, CalibrationState},
    geometry::ScreenRoi,
    session::{SessionController, SessionState},
};

/// Errors returned by the control API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request was understood but invalid
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Failure inside the service
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Result alias for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Gaze coordinates in whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazePayload {
    /// Horizontal pixel
    pub x: i64,
    /// Vertical pixel
    pub y: i64,
}

/// `GET /api/status` body
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// `ready`, `tracking` or `calibrating`
    pub status: &'static str,
    /// Tracking loop owns the camera
    pub tracking: bool,
    /// Calibration loop owns the camera
    pub calibration: bool,
    /// Last smoothed gaze point
    pub gaze: GazePayload,
    /// Zone name, kept under the field name older clients read
    pub color: &'static str,
    /// Zone name
    pub zone: &'static str,
    /// Progress of the running or last calibration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration_progress: Option<CalibrationProgress>,
    /// Final state of the last calibration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration_result: Option<CalibrationState>,
    /// Why the last loop aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<&'static str>,
}

/// Body of every command endpoint
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// Outcome name
    pub status: &'static str,
}

/// `GET /api/roi` query
#[derive(Debug, Default, Deserialize)]
pub struct RoiQuery {
    /// `density` or `heatmap`; the configured default when absent
    pub strategy: Option<String>,
}

/// `GET /api/roi` body
#[derive(Debug, Serialize)]
pub struct RoiResponse {
    /// Strategy that produced the region
    pub strategy: String,
    /// Estimated region, `null` when none was found
    pub roi: Option<ScreenRoi>,
}

/// Build the control API router
pub fn router(controller: SessionController) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/start", post(start))
        .route("/api/stop", post(stop))
        .route("/api/calibrate", post(calibrate))
        .route("/api/calibrate/cancel", post(cancel_calibration))
        .route("/api/roi", get(roi))
        .layer(CorsLayer::permissive())
        .with_state(controller)
}

async fn status(State(controller): State<SessionController>) -> Json<StatusResponse> {
    let snapshot = controller.status();
    let (x, y) = snapshot.gaze.to_pixel();
    Json(StatusResponse {
        status: snapshot.state.as_status(),
        tracking: snapshot.state == SessionState::Tracking,
        calibration: snapshot.state == SessionState::Calibrating,
        gaze: GazePayload { x, y },
        color: snapshot.zone.as_str(),
        zone: snapshot.zone.as_str(),
        calibration_progress: snapshot.calibration_progress,
        calibration_result: snapshot.calibration_result,
        last_error: snapshot.last_error.map(|e| e.as_str()),
    })
}

/// Run a controller call that may block on the camera off the async runtime
async fn blocking<T, F>(controller: SessionController, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&SessionController) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&controller))
        .await
        .map_err(|e| {
            error!("Controller task failed: {}", e);
            ApiError::Internal(e.to_string())
        })
}

async fn start(State(controller): State<SessionController>) -> ApiResult<Json<CommandResponse>> {
    let outcome = blocking(controller, SessionController::start_tracking).await?;
    Ok(Json(CommandResponse {
        status: outcome.as_str(),
    }))
}

async fn stop(State(controller): State<SessionController>) -> Json<CommandResponse> {
    Json(CommandResponse {
        status: controller.stop_tracking().as_str(),
    })
}

async fn calibrate(State(controller): State<SessionController>) -> ApiResult<Json<CommandResponse>> {
    let outcome = blocking(controller, SessionController::start_calibration).await?;
    Ok(Json(CommandResponse {
        status: outcome.as_str(),
    }))
}

async fn cancel_calibration(State(controller): State<SessionController>) -> Json<CommandResponse> {
    Json(CommandResponse {
        status: controller.cancel_calibration().as_str(),
    })
}

async fn roi(
    State(controller): State<SessionController>,
    Query(query): Query<RoiQuery>,
) -> ApiResult<Json<RoiResponse>> {
    let strategy = query
        .strategy
        .unwrap_or_else(|| controller.config().clustering.default_strategy.clone());
    let roi = controller
        .region(Some(&strategy))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(RoiResponse { strategy, roi }))
}
