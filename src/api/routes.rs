use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the application router
///
/// The request-id layer sits outside the trace layer so the span created
/// for each request already carries the id.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::recommend))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
