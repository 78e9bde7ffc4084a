//! HTTP surface: request validation, dispatch to the repository engine,
//! response serialisation.

pub mod error;
pub mod handlers;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use handlers::SharedRepository;

/// Build the full router for the repository engine's HTTP surface.
#[must_use]
pub fn router(repo: SharedRepository) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/rescan", post(handlers::rescan))
        .route("/forest", get(handlers::get_forest))
        .route("/mesh/:mesh", get(handlers::get_mesh))
        .route("/mesh/:mesh/branches", get(handlers::get_mesh_branches))
        .route(
            "/mesh/:mesh/branch/:branch/commits",
            get(handlers::get_branch_commits),
        )
        .route("/mesh/:mesh/correct", post(handlers::set_correct))
        .route(
            "/mesh/:mesh/branch",
            post(handlers::create_branch),
        )
        .route(
            "/mesh/:mesh/branch/:branch",
            delete(handlers::delete_branch),
        )
        .route("/mesh/:mesh/commit", post(handlers::create_commit))
        .route(
            "/mesh/:mesh/branch/:branch/commit/:commit_id",
            delete(handlers::delete_commit),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(repo)
}
