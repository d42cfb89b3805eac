//! HTTP surface: `POST /render` behind the access gate, `GET /health`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::NaiveDate;
use mxchart_core::{wire, ChartRequest, RenderError, Renderer, RequestError};
use mxchart_render::{ChartDocument, Deadline, HtmlTimelineRenderer, RasterError, Rasterizer};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn, Instrument};

use crate::config::{ServerConfig, DEFAULT_RENDER_TIMEOUT};
use crate::gate::{AccessDecision, AccessGate, Principal};

const CONTENT_TRANSFER_ENCODING: HeaderName = HeaderName::from_static("content-transfer-encoding");

/// Source of the chart's "today"
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Immutable per-process state shared by all requests
#[derive(Clone)]
pub struct AppState {
    gate: Arc<AccessGate>,
    renderer: Arc<HtmlTimelineRenderer>,
    rasterizer: Arc<dyn Rasterizer>,
    clock: Clock,
    render_timeout: Duration,
    base64_body: bool,
}

impl AppState {
    pub fn new(gate: AccessGate, rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            gate: Arc::new(gate),
            renderer: Arc::new(HtmlTimelineRenderer::new()),
            rasterizer,
            clock: Arc::new(|| chrono::Local::now().date_naive()),
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            base64_body: false,
        }
    }

    /// State for a configured server with a headless Chrome rasterizer
    pub fn from_config(config: &ServerConfig) -> Self {
        let gate = AccessGate::new(config.secret_header.clone(), config.secret.clone());
        Self::new(gate, Arc::new(config.rasterizer()))
            .with_render_timeout(config.render_timeout)
            .with_base64_body(config.base64_body)
    }

    pub fn with_renderer(mut self, renderer: HtmlTimelineRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Fix the date used for the today marker
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn with_base64_body(mut self, enabled: bool) -> Self {
        self.base64_body = enabled;
        self
    }

    /// Run the rasterizer on the blocking pool, bounded by the render timeout.
    ///
    /// The rasterizer gets the same deadline, so a job abandoned here winds
    /// its browser down instead of running to completion.
    async fn rasterize(&self, document: ChartDocument) -> Result<Vec<u8>, ApiError> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let deadline = Deadline::after(self.render_timeout);
        let job = tokio::task::spawn_blocking(move || rasterizer.rasterize(&document, deadline));
        match tokio::time::timeout(self.render_timeout, job).await {
            Err(_) => Err(ApiError::TimedOut),
            Ok(Err(join)) => Err(ApiError::Internal(join.to_string())),
            Ok(Ok(result)) => result.map_err(ApiError::from),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Debug)]
pub enum ApiError {
    Invalid(String),
    Unauthorized,
    RenderFailed(String),
    TimedOut,
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RenderFailed(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(value: RequestError) -> Self {
        Self::Invalid(value.to_string())
    }
}

impl From<RenderError> for ApiError {
    fn from(value: RenderError) -> Self {
        // Grid and layout failures both come from the submitted dates.
        Self::Invalid(value.to_string())
    }
}

impl From<RasterError> for ApiError {
    fn from(value: RasterError) -> Self {
        match value {
            RasterError::DeadlineExceeded => Self::TimedOut,
            other => Self::RenderFailed(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Process failures are logged in full; the client gets a fixed message.
        let message = match &self {
            Self::Invalid(message) => message.as_str(),
            Self::Unauthorized => "Unauthorized",
            Self::RenderFailed(detail) => {
                warn!(error = %detail, "render failed");
                "Render failed"
            }
            Self::TimedOut => {
                warn!("render timed out");
                "Render timed out"
            }
            Self::Internal(detail) => {
                warn!(error = %detail, "internal error");
                "Internal error"
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/render", post(render_chart))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_shared_secret));

    Router::new()
        .route("/health", get(health))
        .merge(gated)
        .layer(middleware::from_fn(request_tracing))
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let addr: SocketAddr = config.addr;
    let app = router(AppState::from_config(&config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, header = %config.secret_header, "mxchart server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn request_tracing(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        route = %request.uri().path(),
    );
    next.run(request).instrument(span).await
}

/// Rejects requests without the shared secret before the body is touched
async fn require_shared_secret(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.gate.decide(request.headers()) {
        AccessDecision::Allow(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        AccessDecision::Deny(reason) => {
            warn!(reason = reason.as_str(), header = %state.gate.header(), "request denied");
            ApiError::Unauthorized.into_response()
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn render_chart(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let tasks = wire::parse_request(&body)?;
    let request = ChartRequest::new(tasks, (state.clock)());

    let document = state.renderer.render(&request)?;
    let (columns, rows) = (document.columns, document.rows);
    let png = state.rasterize(document).await?;

    info!(
        principal = principal.as_str(),
        tasks = request.tasks.len(),
        columns,
        rows,
        bytes = png.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rendered chart"
    );
    Ok(image_response(png, state.base64_body))
}

fn image_response(png: Vec<u8>, base64_body: bool) -> Response {
    if base64_body {
        (
            [
                (header::CONTENT_TYPE, "image/png"),
                (CONTENT_TRANSFER_ENCODING, "base64"),
            ],
            BASE64.encode(png),
        )
            .into_response()
    } else {
        ([(header::CONTENT_TYPE, "image/png")], png).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mxchart_core::{GridError, LayoutError};

    #[test]
    fn error_status_codes() {
        assert_eq!(ApiError::Invalid(String::new()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::RenderFailed(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::TimedOut.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn data_errors_map_to_bad_request() {
        let grid: ApiError = RenderError::from(GridError::NoTasks).into();
        assert!(matches!(grid, ApiError::Invalid(ref m) if m == "Task list is empty"));

        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let layout: ApiError = RenderError::from(LayoutError::OutsideGrid {
            component: "Wheel".into(),
            start: date,
            end: date,
        })
        .into();
        assert_eq!(layout.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn raster_deadline_maps_to_gateway_timeout() {
        let error: ApiError = RasterError::DeadlineExceeded.into();
        assert!(matches!(error, ApiError::TimedOut));
    }

    #[test]
    fn raster_errors_hide_detail() {
        let error: ApiError = RasterError::Launch("no chrome at /opt".into()).into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn base64_body_sets_transfer_encoding() {
        let response = image_response(vec![1, 2, 3], true);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[&CONTENT_TRANSFER_ENCODING], "base64");

        let raw = image_response(vec![1, 2, 3], false);
        assert!(raw.headers().get(&CONTENT_TRANSFER_ENCODING).is_none());
    }
}
