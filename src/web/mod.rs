pub mod handlers;
pub mod routes;

#[cfg(test)]
mod tests;

use axum::Router;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::blog::BlogService;

#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
}

impl AppState {
    pub fn new(blog: BlogService) -> Arc<Self> {
        Arc::new(Self { blog })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostPayload {
    pub author_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WidgetPayload {
    #[serde(default)]
    pub customization_args: Map<String, Value>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(addr: String, state: Arc<AppState>) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server listening on {}", addr);

    axum::serve(listener, app(state))
        .await
        .map_err(|e| crate::Error::Internal(e.to_string()))?;

    Ok(())
}
