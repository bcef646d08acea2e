use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod config;
pub mod data_uri;
pub mod database;
pub mod editor;
pub mod errors;
pub mod handlers;
pub mod imaging;
pub mod models;
pub mod render;
pub mod store;
pub mod validation;

use config::Config;
use handlers::{cards, reference, upload};
use store::CardStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CardStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn CardStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = if config.debug_mode {
        info!("🔓 Development mode: Using permissive CORS");
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("⚠️ Ignoring invalid origin '{}': {}", origin, e);
                    None
                }
            })
            .collect();
        info!("🔒 CORS configured for origins: {}", config.allowed_origins.join(","));
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
}

/// The full HTTP application: JSON API under `/api`, plus the client bundle
/// when `STATIC_DIR` is set.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/cards", cards::router())
        .merge(cards::validation_router())
        .merge(upload::router())
        .merge(reference::router());

    let mut router = Router::new()
        .nest("/api", api)
        .with_state(state.clone());

    if let Some(dir) = &state.config.static_dir {
        info!("📁 Serving client bundle from {}", dir);
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&state.config)),
    )
}
