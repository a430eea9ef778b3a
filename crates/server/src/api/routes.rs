use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware, require_technician};
use super::{audit, handlers, technician, tickets, users};
use crate::state::AppState;

/// Headroom over the attachment budget for text fields and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let blob = &state.config().blob;
    let form_limit = blob
        .max_attachment_bytes
        .saturating_mul(blob.max_attachments)
        .saturating_add(FORM_OVERHEAD_BYTES);

    // Technician only
    let technician_routes = Router::new()
        .route("/technician/tickets", get(technician::list_tickets))
        .route("/technician/tickets/{id}", get(technician::get_ticket))
        .route("/technician/tickets/{id}/start", post(technician::start_ticket))
        .route("/technician/tickets/{id}/close", post(technician::close_ticket))
        .route("/processor/process", post(technician::process_pending))
        .route("/cache/status", get(technician::cache_status))
        .route("/admin/technicians", get(users::list_technicians))
        .route("/admin/users/{email}/role", put(users::set_role))
        .route("/audit", get(audit::query_audit))
        .route_layer(middleware::from_fn(require_technician));

    // Any authenticated caller
    let authenticated_routes = Router::new()
        .route(
            "/tickets",
            post(tickets::create_ticket).layer(DefaultBodyLimit::max(form_limit)),
        )
        .route("/users/me", get(users::me))
        .route("/config", get(handlers::get_config))
        .merge(technician_routes)
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(authenticated_routes)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
