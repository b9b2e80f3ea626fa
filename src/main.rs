mod app;
mod auth;
mod config;
mod error;
mod policy;
mod recipe;
mod state;
mod storage;
mod store;
mod web;

#[cfg(test)]
mod test_support;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipes=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;

    if let Some(admin) = state.config.admin.as_ref() {
        auth::services::seed_admin(state.store.as_ref(), admin).await?;
        tracing::info!(email = %admin.email, "bootstrap superuser ensured");
    }

    app::serve(app::build_app(state)).await
}
