use axum::http::StatusCode;

/// Liveness probe for `GET /healthcheck`.
pub async fn healthcheck_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
