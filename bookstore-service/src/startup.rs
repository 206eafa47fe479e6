use crate::config::{BookstoreConfig, CorsConfig, StoreBackend};
use crate::handlers;
use crate::services::{BookStore, InMemoryBookStore, MongoDb};
use axum::{
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::from_fn,
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub config: BookstoreConfig,
    pub store: Arc<dyn BookStore>,
}

impl AppState {
    pub fn new(config: BookstoreConfig, store: Arc<dyn BookStore>) -> Self {
        Self { config, store }
    }
}

/// The store selected by `STORE_BACKEND`. The MongoDB client itself is
/// created lazily on the first request that needs it.
pub fn build_store(config: &BookstoreConfig) -> Arc<dyn BookStore> {
    match config.store {
        StoreBackend::MongoDb => Arc::new(MongoDb::new(&config.mongodb)),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory book store; data will not survive a restart");
            Arc::new(InMemoryBookStore::new())
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/books",
            get(handlers::list_books).post(handlers::create_book),
        )
        .route(
            "/books/:id",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .route_layer(from_fn(metrics_middleware))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
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
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ]);

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    layer.allow_origin(origins)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: BookstoreConfig) -> Result<Self, AppError> {
        let store = build_store(&config);
        Self::build_with_store(config, store).await
    }

    pub async fn build_with_store(
        config: BookstoreConfig,
        store: Arc<dyn BookStore>,
    ) -> Result<Self, AppError> {
        let addr = config.common.socket_addr();
        let app = build_router(AppState::new(config, store));

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
