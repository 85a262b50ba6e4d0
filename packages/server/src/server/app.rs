//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::domains::events::EventService;
use crate::kernel::ImageStore;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    create_event_handler, delete_event_handler, health_handler, leave_event_handler,
    list_events_handler, rsvp_event_handler, update_event_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub events: EventService,
    pub jwt_service: Arc<JwtService>,
}

/// Build the Axum application router.
///
/// The image store is injected so tests can substitute a mock; production
/// wiring passes the Cloudinary client.
pub fn build_app(
    pool: PgPool,
    image_store: Arc<dyn ImageStore>,
    jwt_service: Arc<JwtService>,
    allowed_origins: Vec<String>,
) -> Router {
    let state = AppState {
        db_pool: pool.clone(),
        events: EventService::new(pool, image_store),
        jwt_service,
    };

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
    };

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/events",
            get(list_events_handler).post(create_event_handler),
        )
        .route(
            "/events/:id",
            put(update_event_handler).delete(delete_event_handler),
        )
        .route("/events/:id/rsvp", post(rsvp_event_handler))
        .route("/events/:id/leave", post(leave_event_handler))
        .layer(middleware::from_fn({
            let state = state.clone();
            move |request, next| jwt_auth_middleware(state.clone(), request, next)
        }))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
