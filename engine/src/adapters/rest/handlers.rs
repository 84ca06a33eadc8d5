//! REST API handlers using axum

use crate::application::ServiceManager;
use crate::constants::logs::{DEFAULT_PAGE_BYTES, ERROR_TAIL_BYTES};
use crate::domain::{
    Catalog, DomainError, GetServiceStatusQuery, ListServicesResponse, LogChunk,
    RestartServiceCommand, RestartServiceResponse, ServiceSpec, ServiceStatusResponse,
    StartServiceCommand, StartServiceResponse, StopServiceCommand, StopServiceResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shared application state
pub type AppState = Arc<ServiceManager>;

/// Error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    /// Tail of `log_file` at the time of the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    /// Build the response for a domain error, attaching the tail of its log file
    pub async fn from_domain(manager: &ServiceManager, err: DomainError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            error!(kind = err.kind(), error = %err, "Request failed");
        } else {
            debug!(kind = err.kind(), error = %err, "Request rejected");
        }

        let log = manager.failure_log(&err, ERROR_TAIL_BYTES).await;
        Self {
            status,
            body: ErrorResponse {
                error: err.to_string(),
                kind: err.kind(),
                log_file: err.log_file().map(|p| p.display().to_string()),
                log,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for a domain error
pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::UnknownService(_) => StatusCode::NOT_FOUND,
        DomainError::ConfigError { .. }
        | DomainError::InvalidCatalog(_)
        | DomainError::InvalidLogFile(_) => StatusCode::BAD_REQUEST,
        DomainError::ReadinessTimeout { .. } | DomainError::PortTimeout { .. } => {
            StatusCode::GATEWAY_TIMEOUT
        }
        DomainError::Cancelled(_) => StatusCode::REQUEST_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn respond<T>(manager: &ServiceManager, result: Result<T, DomainError>) -> ApiResult<T> {
    match result {
        Ok(value) => Ok(Json(value)),
        Err(e) => Err(ApiError::from_domain(manager, e).await),
    }
}

/// `?build=true` on start and restart
#[derive(Debug, Default, Deserialize)]
pub struct BuildParams {
    #[serde(default)]
    pub build: bool,
}

/// `?offset=&limit=` on log reads
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl RangeParams {
    fn is_paged(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonHealthResponse {
    pub status: &'static str,
    pub active_log_streams: usize,
}

#[derive(Debug, Serialize)]
pub struct LogFilesResponse {
    pub service: String,
    pub files: Vec<String>,
}

/// Whole file content, or one page of it
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LogContentResponse {
    Full { content: String },
    Page(LogChunk),
}

// ===== Handlers =====

/// GET /health - Daemon liveness
pub async fn health(State(manager): State<AppState>) -> Json<DaemonHealthResponse> {
    Json(DaemonHealthResponse {
        status: "ok",
        active_log_streams: manager.active_log_subscriptions(),
    })
}

/// GET /services - List configured services
pub async fn list_services(State(manager): State<AppState>) -> ApiResult<ListServicesResponse> {
    debug!("REST List request");
    let result = manager.list_services().await;
    respond(&manager, result).await
}

/// GET /services/:name - Catalog entry of one service
pub async fn describe_service(
    State(manager): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<ServiceSpec> {
    let result = manager.describe(&name).await;
    respond(&manager, result).await
}

/// GET /config/services - Whole catalog
pub async fn get_catalog(State(manager): State<AppState>) -> ApiResult<Catalog> {
    let result = manager.catalog().await;
    respond(&manager, result).await
}

/// PUT /config/services - Overwrite the catalog
pub async fn replace_catalog(
    State(manager): State<AppState>,
    Json(catalog): Json<Catalog>,
) -> Result<StatusCode, ApiError> {
    info!(services = catalog.services.len(), "REST Replace catalog request");
    match manager.replace_catalog(catalog).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(ApiError::from_domain(&manager, e).await),
    }
}

/// POST /service/:name/start - Start a service
///
/// Dropping the request (client disconnect) cancels the readiness wait.
pub async fn start_service(
    State(manager): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<BuildParams>,
) -> ApiResult<StartServiceResponse> {
    info!(service = %name, build = params.build, "REST Start request");

    let cancel = CancellationToken::new();
    let _request_guard = cancel.clone().drop_guard();
    let command = StartServiceCommand::new(name)
        .with_build(params.build)
        .with_cancellation(cancel);

    let result = manager.start(command).await;
    respond(&manager, result).await
}

/// POST /service/:name/stop - Stop a service
pub async fn stop_service(
    State(manager): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StopServiceResponse> {
    info!(service = %name, "REST Stop request");
    let result = manager.stop(StopServiceCommand::new(name)).await;
    respond(&manager, result).await
}

/// POST /service/:name/restart - Stop then start a service
pub async fn restart_service(
    State(manager): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<BuildParams>,
) -> ApiResult<RestartServiceResponse> {
    info!(service = %name, build = params.build, "REST Restart request");

    let cancel = CancellationToken::new();
    let _request_guard = cancel.clone().drop_guard();
    let command = RestartServiceCommand::new(name)
        .with_build(params.build)
        .with_cancellation(cancel);

    let result = manager.restart(command).await;
    respond(&manager, result).await
}

/// GET /service/:name/status - Liveness and lifecycle state
pub async fn service_status(
    State(manager): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<ServiceStatusResponse> {
    let result = manager.status(GetServiceStatusQuery::new(name)).await;
    respond(&manager, result).await
}

/// GET /logs/:name - Log files of a service, newest first
pub async fn list_logs(
    State(manager): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<LogFilesResponse> {
    let result = manager
        .list_logs(&name)
        .await
        .map(|files| LogFilesResponse {
            service: name,
            files,
        });
    respond(&manager, result).await
}

/// GET /logs/:name/:file - Log content
pub async fn read_log(
    State(manager): State<AppState>,
    Path((name, file)): Path<(String, String)>,
    Query(range): Query<RangeParams>,
) -> ApiResult<LogContentResponse> {
    let result = if range.is_paged() {
        manager
            .read_log_range(
                &name,
                &file,
                range.offset.unwrap_or(0),
                range.limit.unwrap_or(DEFAULT_PAGE_BYTES),
            )
            .await
            .map(LogContentResponse::Page)
    } else {
        manager
            .read_log(&name, &file)
            .await
            .map(|content| LogContentResponse::Full { content })
    };
    respond(&manager, result).await
}

/// DELETE /logs/:name/:file - Truncate a log file
pub async fn clear_log(
    State(manager): State<AppState>,
    Path((name, file)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    info!(service = %name, file = %file, "REST Clear log request");
    match manager.clear_log(&name, &file).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(ApiError::from_domain(&manager, e).await),
    }
}

/// GET /logs/:name/:file/stream - Live log stream (SSE)
///
/// Each event carries one JSON object: `{"type": "initial" | "append" | "replace" | "heartbeat", "content"?}`.
/// The subscription is cancelled when the client goes away and the stream is dropped.
pub async fn stream_log(
    State(manager): State<AppState>,
    Path((name, file)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let subscription = match manager.subscribe_log(&name, &file) {
        Ok(subscription) => subscription,
        Err(e) => return Err(ApiError::from_domain(&manager, e).await),
    };
    info!(service = %name, file = %file, "REST Log stream opened");

    let stream = subscription.map(|event| {
        Event::default().json_data(&event).map_err(|e| {
            warn!(error = %e, "Failed to encode log event");
            axum::Error::new(e)
        })
    });
    Ok(Sse::new(stream))
}
