//! The Link4Coders HTTP server: the JSON API under `/api` and rendered
//! portfolio pages under `/u/{username}`, wired to SQLite, GitHub and VAPI.

pub mod config;
pub mod error;
pub mod page;

use axum::{Router, routing::get};
use l4c_api::{AppState, Backend, api_router};
use l4c_remote::{GithubClient, VapiClient};
use l4c_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;

/// The production collaborators.
pub struct Live;

impl Backend for Live {
  type Repos = GithubClient;
  type Store = SqliteStore;
  type Voice = VapiClient;
}

/// Build the full application router.
pub fn app<B: Backend>(state: AppState<B>) -> Router {
  Router::new()
    .route("/u/{username}", get(page::portfolio::<B>))
    .with_state(state.clone())
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}
