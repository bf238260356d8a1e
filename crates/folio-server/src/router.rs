use axum::routing::{get, post};
use axum::Router;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Folio endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/artworks",
            get(handler::list_handler).post(handler::create_handler),
        )
        .route("/v1/artworks/featured", get(handler::featured_handler))
        .route(
            "/v1/artworks/:id",
            get(handler::get_handler)
                .patch(handler::update_handler)
                .delete(handler::delete_handler),
        )
        .route("/v1/refresh", post(handler::refresh_handler))
        .route(
            "/v1/session",
            get(handler::session_handler)
                .post(handler::login_handler)
                .delete(handler::logout_handler),
        )
        .route("/v1/contact", post(handler::contact_handler))
        .with_state(state)
}
