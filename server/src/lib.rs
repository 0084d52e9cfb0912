pub mod auth;
pub mod error;
pub mod handlers;
pub mod lock;
pub mod revision;
pub mod state;
pub mod users;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use tower_http::trace::TraceLayer;

pub const DEFAULT_PORT: u16 = 5002;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/wikifs/getattr", get(handlers::getattr))
        .route("/wikifs/readdir", get(handlers::readdir))
        .route("/wikifs/download", get(handlers::download))
        .route("/wikifs/upload", post(handlers::upload))
        .route("/wikifs/create", get(handlers::create))
        .route("/wikifs/chmod", post(handlers::chmod))
        .route("/wikifs/remove", get(handlers::remove))
        .route("/wikifs/rename", post(handlers::rename))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
