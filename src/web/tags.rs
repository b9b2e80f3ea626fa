use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Form, Router,
};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument};

use super::{
    forms::NameForm,
    found, render,
    session::SessionUser,
    templates::{TagCreatePage, TagDeletePage, TagDetailPage, TagListPage, TagUpdatePage},
    PageError,
};
use crate::{
    error::AppError,
    policy::{can_modify, ensure_can_modify},
    recipe::{repo_types::Tag, services::clean_name},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tags/", get(list))
        .route("/tags/create/", get(create_form).post(create))
        .route("/tags/:id/", get(detail))
        .route("/tags/:id/update/", get(update_form).post(update))
        .route("/tags/:id/delete/", get(delete_form).post(delete))
}

fn detail_url(id: i64) -> String {
    format!("/recipe/tags/{id}/")
}

async fn load(state: &AppState, id: i64) -> Result<Tag, PageError> {
    Ok(state.store.find_tag(id).await?.ok_or(AppError::NotFound)?)
}

async fn list(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
) -> Result<Response, PageError> {
    let tags = state.store.list_tags(None).await?;
    render(&TagListPage {
        viewer: user.email,
        tags,
    })
}

async fn detail(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let tag = load(&state, id).await?;
    render(&TagDetailPage {
        can_modify: can_modify(&user, &tag),
        viewer: user.email,
        tag,
    })
}

async fn create_form(SessionUser(user): SessionUser) -> Result<Response, PageError> {
    render(&TagCreatePage {
        viewer: user.email,
        name: String::new(),
        error: String::new(),
    })
}

#[instrument(skip(user, state, form))]
async fn create(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    Form(form): Form<NameForm>,
) -> Result<Response, PageError> {
    let name = match clean_name("name", &form.name) {
        Ok(name) => name,
        Err(e) => {
            return render(&TagCreatePage {
                viewer: user.email,
                name: form.name,
                error: e.to_string(),
            })
        }
    };
    let tag = state.store.insert_tag(user.id, &name).await?;
    info!(tag_id = tag.id, user_id = %user.id, "tag created");
    Ok(found(&detail_url(tag.id)))
}

async fn update_form(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let tag = load(&state, id).await?;
    ensure_can_modify(&user, &tag)?;
    render(&TagUpdatePage {
        viewer: user.email,
        name: tag.name.clone(),
        tag,
        error: String::new(),
    })
}

#[instrument(skip(user, state, form))]
async fn update(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
    Form(form): Form<NameForm>,
) -> Result<Response, PageError> {
    let tag = load(&state, id).await?;
    ensure_can_modify(&user, &tag)?;
    let name = match clean_name("name", &form.name) {
        Ok(name) => name,
        Err(e) => {
            return render(&TagUpdatePage {
                viewer: user.email,
                tag,
                name: form.name,
                error: e.to_string(),
            })
        }
    };
    state
        .store
        .rename_tag(id, &name)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(tag_id = id, user_id = %user.id, "tag renamed");
    Ok(found(&detail_url(id)))
}

async fn delete_form(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let tag = load(&state, id).await?;
    ensure_can_modify(&user, &tag)?;
    render(&TagDeletePage {
        viewer: user.email,
        tag,
    })
}

#[instrument(skip(user, state))]
async fn delete(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let tag = load(&state, id).await?;
    ensure_can_modify(&user, &tag)?;
    state.store.delete_tag(id).await?;
    info!(tag_id = id, user_id = %user.id, "tag deleted");
    Ok(found("/recipe/tags/"))
}
