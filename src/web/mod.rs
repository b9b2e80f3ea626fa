//! Server-rendered pages.

use askama::Template;
use axum::{
    extract::rejection::PathRejection,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Router,
};

use crate::{
    error::{AppError, ModelError},
    state::AppState,
};

pub mod forms;
mod ingredients;
mod pages;
mod recipes;
pub mod session;
mod tags;
pub mod templates;

pub fn router() -> Router<AppState> {
    Router::new().merge(pages::routes()).nest(
        "/recipe",
        Router::new()
            .merge(tags::routes())
            .merge(ingredients::routes())
            .merge(recipes::routes()),
    )
}

/// 302 redirect, the status browsers and form posts expect.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn render<T: Template>(page: &T) -> Result<Response, PageError> {
    let html = page
        .render()
        .map_err(|e| anyhow::anyhow!("render {}: {e}", std::any::type_name::<T>()))?;
    Ok(Html(html).into_response())
}

/// [`AppError`] rendered as an HTML page instead of JSON.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl From<anyhow::Error> for PageError {
    fn from(e: anyhow::Error) -> Self {
        Self(AppError::Internal(e))
    }
}

impl From<ModelError> for PageError {
    fn from(e: ModelError) -> Self {
        Self(e.into())
    }
}

/// An id segment that does not parse names no page.
impl From<PathRejection> for PageError {
    fn from(_: PathRejection) -> Self {
        Self(AppError::NotFound)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.log_if_internal();
        let status = err.status();
        let page = templates::ErrorPage {
            viewer: String::new(),
            status: status.as_u16(),
            message: err.to_string(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, err.to_string()).into_response(),
        }
    }
}
