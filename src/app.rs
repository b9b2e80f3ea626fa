use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, recipe, web};

pub fn build_app(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media.root);
    let media_url = state.config.media.url.clone();

    Router::new()
        .merge(web::router())
        .nest("/api/recipe", recipe::router())
        .nest("/api/rest-auth", auth::router())
        .route("/health", get(|| async { "ok" }))
        .nest_service(&media_url, media)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8000".into())
    )
    .parse()?;

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::{body_string, send, TestApp};

    #[tokio::test]
    async fn health_is_public() {
        let app = TestApp::new();
        let res = send(&app.router, app.get("/health", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = TestApp::new();
        let res = send(&app.router, app.get("/nowhere/", None)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
