use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sro_track::{
    Credentials, OperationOutcome, ResultKind, SoapClient, SroConfig, TrackedObjectResult,
    TrackingError, TrackingKind, TrackingQuery, TrackingService, with_check_digit,
};

/// Server configuration
struct ServerConfig {
    port: u16,
    /// Account used when a request carries no credentials of its own
    default_credentials: Option<Credentials>,
}

impl ServerConfig {
    fn from_env() -> Self {
        let default_credentials = match (env::var("SRO_USER"), env::var("SRO_PASSWORD")) {
            (Ok(user), Ok(password)) => Some(Credentials::new(user, password)),
            _ => None,
        };
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            default_credentials,
        }
    }
}

/// Application state shared across all requests
#[derive(Clone)]
struct AppState {
    service: Arc<TrackingService<SoapClient>>,
    default_credentials: Option<Credentials>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,sro_track=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Read configuration from environment
    let config = ServerConfig::from_env();
    if config.default_credentials.is_none() {
        tracing::warn!("SRO_USER/SRO_PASSWORD not set; requests must carry credentials");
    }

    // Build the shared tracking service
    let sro_config = SroConfig::from_env();
    tracing::info!("Using tracking endpoint {}", sro_config.endpoint);
    let client = SoapClient::with_config(sro_config).context("Failed to build SOAP client")?;

    let state = AppState {
        service: Arc::new(TrackingService::new(client)),
        default_credentials: config.default_credentials,
    };
    let app = build_app(state);

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Build the Axum application with routes and middleware
fn build_app(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API routes
        .route("/api/track", post(track_objects))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Deserialize)]
struct TrackRequest {
    objects: Vec<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Serialize)]
struct TrackResponse {
    success: bool,
    data: Vec<TrackedObjectResult>,
}

/// Track one or more objects
async fn track_objects(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest>,
) -> Result<Json<TrackResponse>, ApiError> {
    let query = build_query(request, state.default_credentials.as_ref())?;

    tracing::info!("Tracking {} object(s)", query.object_codes.len());

    match state.service.track(&query).await {
        OperationOutcome::Success(data) => Ok(Json(TrackResponse {
            success: true,
            data,
        })),
        OperationOutcome::ValidationError(msg) => Err(ApiError::BadRequest(msg)),
        OperationOutcome::RemoteFault { code, message } => {
            tracing::error!("Remote fault {}: {}", code, message);
            Err(ApiError::Upstream(format!("remote fault {}: {}", code, message)))
        }
        OperationOutcome::ParseError(msg) => {
            tracing::error!("Unparseable tracking response: {}", msg);
            Err(ApiError::Upstream(msg))
        }
    }
}

fn build_query(
    request: TrackRequest,
    default_credentials: Option<&Credentials>,
) -> Result<TrackingQuery, ApiError> {
    let tracking_kind: TrackingKind = request.kind.as_deref().unwrap_or("list").parse()?;
    let result_kind: ResultKind = request.result.as_deref().unwrap_or("all").parse()?;

    let credentials = match (request.user, request.password) {
        (Some(user), Some(password)) => Credentials::new(user, password),
        _ => default_credentials
            .cloned()
            .ok_or_else(|| ApiError::BadRequest("credentials are required".to_string()))?,
    };

    let object_codes = request
        .objects
        .iter()
        .map(|code| with_check_digit(code))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TrackingQuery::list(credentials, object_codes)
        .with_tracking_kind(tracking_kind)
        .with_result_kind(result_kind))
}

/// API error types
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Upstream(String),
}

impl From<TrackingError> for ApiError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
