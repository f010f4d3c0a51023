//! Application startup and lifecycle management.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::AppState;
use crate::config::{CorsSettings, Settings};
use crate::handlers::{
    auth::{login_handler, logout_handler, session_handler},
    health::health_check,
    metrics::metrics,
    transcribe::{transcribe_base64_handler, transcribe_handler},
};
use crate::services::metrics::{init_metrics, metrics_middleware};
use crate::services::providers::VisionProvider;
use crate::services::providers::openai::{OpenAiConfig, OpenAiVisionProvider};
use service_core::error::AppError;
use service_core::middleware::rate_limit::{FixedWindowLimiter, rate_limit_middleware};
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::request_id_middleware;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    sweepers: SweeperGuard,
}

/// Owns the limiter sweeper tasks and aborts them on drop, so a
/// stopped server does not leave interval tasks behind.
pub struct SweeperGuard(Vec<tokio::task::JoinHandle<()>>);

impl Drop for SweeperGuard {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

impl Application {
    /// Build the application with the real OpenAI-backed provider.
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        let provider: Arc<dyn VisionProvider> = Arc::new(OpenAiVisionProvider::new(OpenAiConfig {
            base_url: settings.openai.base_url.clone(),
            api_key: settings.openai.api_key.clone(),
            model: settings.openai.model.clone(),
            timeout: settings.openai.timeout(),
        }));

        tracing::info!(
            model = %settings.openai.model,
            "Initialized OpenAI vision provider"
        );

        Self::with_provider(settings, provider).await
    }

    /// Build the application around an injected provider. Tests pass a
    /// mock here.
    pub async fn with_provider(
        settings: Settings,
        provider: Arc<dyn VisionProvider>,
    ) -> Result<Self, AppError> {
        let addr = format!("{}:{}", settings.server.host, settings.server.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        // Port 0 means "pick one"; report what was actually bound.
        let port = listener.local_addr()?.port();

        let state = AppState::new(settings, provider);
        let (router, sweepers) = build_router(state);

        Ok(Self {
            port,
            listener,
            router,
            sweepers,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until the task is dropped or the listener
    /// fails. The sweeper tasks stop with it.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let _sweepers = self.sweepers;
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the application until `shutdown` resolves, then drain
    /// in-flight requests.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let _sweepers = self.sweepers;
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}

pub fn build_router(state: AppState) -> (Router, SweeperGuard) {
    init_metrics();

    // Session setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(24)));

    // Two budgets: a broad one over everything, a tight one on the
    // transcription routes. Each sweeps its map once per window.
    let limits = &state.settings.rate_limit;
    let global_limiter = FixedWindowLimiter::new(limits.global_max, limits.global_window());
    let transcribe_limiter =
        FixedWindowLimiter::new(limits.transcribe_max, limits.transcribe_window());
    let sweepers = SweeperGuard(vec![
        global_limiter.spawn_sweeper(limits.global_window()),
        transcribe_limiter.spawn_sweeper(limits.transcribe_window()),
    ]);

    let cors = cors_layer(&state.settings.cors);
    let body_limit = DefaultBodyLimit::max(state.settings.upload.body_limit_bytes());

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/login", post(login_handler))
        .route("/api/session", get(session_handler))
        .route("/api/logout", post(logout_handler))
        .route(
            "/api/transcribe",
            post(transcribe_handler).layer(from_fn_with_state(
                transcribe_limiter.clone(),
                rate_limit_middleware,
            )),
        )
        .route(
            "/api/transcribe-base64",
            post(transcribe_base64_handler).layer(from_fn_with_state(
                transcribe_limiter,
                rate_limit_middleware,
            )),
        )
        .fallback(not_found)
        .layer(body_limit)
        .layer(session_layer)
        .layer(from_fn_with_state(global_limiter, rate_limit_middleware))
        .layer(cors)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .with_state(state);

    (router, sweepers)
}

async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Rota não encontrada"))
}

fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    if settings.allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
