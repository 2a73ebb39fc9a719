use std::sync::Arc;

use axum::http::header::{
    HeaderName, HeaderValue, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
    X_DNS_PREFETCH_CONTROL, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api::{buildings, health, locations, requests, users};
use crate::auth::middleware::{require_auth, TokenVerifier};
use crate::db::Repositories;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    /// `None` disables bearer-token checks on `/api`.
    pub token_verifier: Option<Arc<TokenVerifier>>,
}

impl AppState {
    pub fn new(repos: Repositories, token_verifier: Option<TokenVerifier>) -> Self {
        Self {
            repos,
            token_verifier: token_verifier.map(Arc::new),
        }
    }
}

/// Build the full HTTP surface: the authenticated `/api` routes, the
/// health check and a plain-text 404 fallback.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/building", post(buildings::create_building_handler))
        .route(
            "/building/{id}",
            get(buildings::get_building_handler)
                .put(buildings::update_building_handler)
                .delete(buildings::delete_building_handler),
        )
        .route("/buildings", get(buildings::list_buildings_handler))
        .route("/location", post(locations::create_location_handler))
        .route(
            "/location/{id}",
            get(locations::get_location_handler)
                .put(locations::update_location_handler)
                .delete(locations::delete_location_handler),
        )
        .route("/locations", get(locations::list_locations_handler))
        .route("/request", post(requests::create_request_handler))
        .route(
            "/request/{id}",
            get(requests::get_request_handler)
                .put(requests::update_request_handler)
                .delete(requests::delete_request_handler),
        )
        .route("/requests", get(requests::list_requests_handler))
        .route(
            "/requests/{user_id}",
            get(requests::list_user_requests_handler),
        )
        .route(
            "/user",
            get(users::get_user_handler).post(users::create_user_handler),
        )
        .route(
            "/user/{id}",
            put(users::update_user_handler).delete(users::delete_user_handler),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let mut app = Router::new()
        .nest("/api", api)
        .route("/healthcheck", get(health::healthcheck_handler))
        .fallback(not_found)
        .with_state(state);
    for (name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            name,
            HeaderValue::from_static(value),
        ));
    }
    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Hardening headers set on every response unless a handler already did.
const SECURITY_HEADERS: [(HeaderName, &str); 6] = [
    (X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (X_FRAME_OPTIONS, "SAMEORIGIN"),
    (REFERRER_POLICY, "no-referrer"),
    (X_DNS_PREFETCH_CONTROL, "off"),
    (X_XSS_PROTECTION, "0"),
    (STRICT_TRANSPORT_SECURITY, "max-age=15552000; includeSubDomains"),
];

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404: Page not found")
}
