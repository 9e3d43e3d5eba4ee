use axum::{
    Json, Router,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use query::{PipelineError, QueryPipeline, QueryResponse};

use crate::metrics::{Metrics, MetricsSnapshot};

pub struct AppState {
    pub pipeline: QueryPipeline,
    pub metrics: Arc<Metrics>,
    pub service_name: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
    time: DateTime<Utc>,
}

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Pipeline(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.code()),
        };

        let body = ErrorResponse {
            error,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

const ALLOWED_HEADERS: &str = "Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, \
Authorization, accept, origin, Cache-Control, X-Requested-With";
const ALLOWED_METHODS: &str = "POST, OPTIONS, GET, PUT, DELETE";

pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/health", get(health_check))
        .route("/query", post(query_graph_rag));

    Router::new()
        .merge(routes.clone())
        .nest("/api/v1", routes.route("/stats", get(get_stats)))
        .layer(middleware::from_fn(cors))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allow every origin; preflight requests stop here with 204.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: state.service_name.clone(),
        time: Utc::now(),
    })
}

async fn query_graph_rag(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| {
        state.metrics.record_rejected();
        ApiError::InvalidRequest(e.body_text())
    })?;

    if req.question.trim().is_empty() {
        state.metrics.record_rejected();
        return Err(ApiError::InvalidRequest("question must not be empty".to_string()));
    }

    let start = Instant::now();
    let result = state.pipeline.handle(&req.question).await;
    state.metrics.record_query(result.is_ok(), start.elapsed());

    Ok(Json(result?))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
