use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo_types;
pub mod services;

/// Token login and registration endpoints, mounted at `/api/rest-auth`.
pub fn router() -> Router<AppState> {
    handlers::rest_auth_routes()
}
