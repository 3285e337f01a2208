use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, Secrets};
use crate::db::Store;
use crate::services::{AuthService, BlogService, ContactService, SessionResolver};
use crate::state::SharedState;

mod assets;
pub mod auth;
mod blog;
mod contact;
pub mod cookies;
mod error;
pub mod gate;
mod observability;
mod site;
mod types;
mod validation;

pub use error::ApiError;
pub use gate::{GatePolicy, RouteClass};
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub gate: GatePolicy,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionResolver {
        &self.shared.sessions
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn blog_service(&self) -> &Arc<dyn BlogService> {
        &self.shared.blog_service
    }

    #[must_use]
    pub fn contact_service(&self) -> &Arc<dyn ContactService> {
        &self.shared.contact_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let gate = GatePolicy::from_config(&shared.config.auth);

    Arc::new(AppState {
        shared,
        gate,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    secrets: &Secrets,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config, secrets).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(create_admin_router(state.clone()))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/status", get(auth::status))
        .route("/blog", get(blog::list_published))
        .route("/blog/{slug}", get(blog::get_published))
        .route("/contact-requests", post(contact::submit));

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        // Credentialed requests cannot use a wildcard origin.
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/sitemap.xml", get(site::sitemap_xml))
        .route("/health", get(site::health))
        .fallback(assets::serve_asset)
        .layer(middleware::from_fn_with_state(state.clone(), gate::route_gate))
        .layer(
            cors_layer
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::request_span_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/admin/blog", get(blog::list_all).post(blog::create))
        .route("/admin/blog/{id}", put(blog::update).delete(blog::delete))
        .route("/admin/contact-requests", get(contact::list))
        .route(
            "/admin/contact-requests/{id}",
            put(contact::update).delete(contact::delete),
        )
        .route("/admin/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}
