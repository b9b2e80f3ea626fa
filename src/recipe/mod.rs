pub mod dto;
pub mod handlers;
pub mod images;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

/// REST endpoints, mounted at `/api/recipe`.
pub fn router() -> Router<AppState> {
    handlers::api_routes()
}
