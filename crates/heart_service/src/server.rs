use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use heartwise_core::{ApiSettings, PatientRecord, PredictionResult};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::inference::InferenceService;

pub const HEALTH_MESSAGE: &str = "Heart Disease Prediction API is running";

#[derive(Clone, Debug)]
pub struct AppState {
    pub inference: InferenceService,
    pub req_count: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(inference: InferenceService) -> Self {
        Self {
            inference,
            req_count: Arc::new(AtomicU64::new(0)),
        }
    }

    fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.req_count.load(Ordering::Relaxed)
    }
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

/// Bind `settings.bind_address()` and serve until Ctrl-C
pub async fn start_server(state: AppState, settings: &ApiSettings) -> Result<()> {
    let app = build_router(state, settings);
    let addr = settings.bind_address();
    let listener = bind_listener(&addr).await?;
    info!(
        title = %settings.title,
        version = %settings.version,
        address = %addr,
        "prediction API listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("prediction server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(err) => warn!(%err, "unable to listen for shutdown signal"),
    }
}

pub fn build_router(state: AppState, settings: &ApiSettings) -> Router {
    Router::new()
        .route("/", get(handle_health))
        .route("/predict", post(handle_predict))
        .route("/metrics", get(handle_metrics))
        .layer(cors_layer(settings))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// CORS policy from the configured origins
///
/// A wildcard origin combined with credentials mirrors the request origin,
/// since browsers reject `*` on credentialed requests.
pub fn cors_layer(settings: &ApiSettings) -> CorsLayer {
    let wildcard = settings.cors_allow_origins.iter().any(|o| o == "*");
    if wildcard && settings.cors_allow_credentials {
        return CorsLayer::very_permissive();
    }
    if wildcard {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let layer = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);
    if settings.cors_allow_credentials {
        layer
            .allow_credentials(true)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
    } else {
        layer.allow_headers(Any)
    }
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: HEALTH_MESSAGE,
    })
}

async fn handle_predict(
    State(state): State<SharedState>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<PredictionResult>, ApiError> {
    let req_total = state.record_request();
    debug!(req_total, ?record, "received prediction request");

    let result = state
        .inference
        .predict_single(&record)
        .map_err(|err| ApiError::internal(format!("prediction failed: {err}")))?;
    info!(
        prediction = result.prediction,
        confidence = result.confidence,
        "prediction served"
    );
    Ok(Json(result))
}

async fn handle_metrics(State(state): State<SharedState>) -> Response {
    let mut metrics = String::new();
    metrics.push_str("# HELP api_requests_total Total API Requests Count\n");
    metrics.push_str("# TYPE api_requests_total counter\n");
    metrics.push_str(&format!("api_requests_total {}\n", state.request_count()));

    let mut response = Response::new(Body::from(metrics));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}
