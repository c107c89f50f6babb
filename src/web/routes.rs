use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::{handlers, AppState};

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/widgetrepository/:kind", get(handlers::widget_repository))
        .route("/widgets/:kind/:id", post(handlers::widget_instance))
        .route("/api/users", post(handlers::register_user))
        .route("/api/blog/posts", post(handlers::create_post))
        .route(
            "/api/blog/posts/:id",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/api/blog/posts/:id/publish", post(handlers::publish_post))
        .route("/api/blog/posts/:id/unpublish", post(handlers::unpublish_post))
        .route("/api/blog/summaries/:id", get(handlers::get_summary))
        .route("/api/blog/rights/:id", get(handlers::get_rights))
}
