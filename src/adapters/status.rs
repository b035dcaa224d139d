//! Read-only status endpoint: `GET /` returns the whole mount state as JSON.

use crate::core::store::MountStore;
use crate::utils::error::Result;
use axum::{routing::get, Extension, Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

pub fn build_router(store: MountStore) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .layer(Extension(store))
}

async fn status_handler(Extension(store): Extension<MountStore>) -> Json<Value> {
    Json(store.snapshot())
}

/// Serves until the listener fails.
pub async fn serve(listener: TcpListener, store: MountStore) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Serving state on http://{}", addr);
    }
    axum::serve(listener, build_router(store)).await?;
    Ok(())
}
