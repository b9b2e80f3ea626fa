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
    templates::{
        IngredientCreatePage, IngredientDeletePage, IngredientDetailPage, IngredientListPage,
        IngredientUpdatePage,
    },
    PageError,
};
use crate::{
    error::AppError,
    policy::{can_modify, ensure_can_modify},
    recipe::{repo_types::Ingredient, services::clean_name},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients/", get(list))
        .route("/ingredients/create/", get(create_form).post(create))
        .route("/ingredients/:id/", get(detail))
        .route("/ingredients/:id/update/", get(update_form).post(update))
        .route("/ingredients/:id/delete/", get(delete_form).post(delete))
}

async fn load(state: &AppState, id: i64) -> Result<Ingredient, PageError> {
    Ok(state
        .store
        .find_ingredient(id)
        .await?
        .ok_or(AppError::NotFound)?)
}

async fn list(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
) -> Result<Response, PageError> {
    let ingredients = state.store.list_ingredients(None).await?;
    render(&IngredientListPage {
        viewer: user.email,
        ingredients,
    })
}

async fn detail(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let ingredient = load(&state, id).await?;
    render(&IngredientDetailPage {
        can_modify: can_modify(&user, &ingredient),
        viewer: user.email,
        ingredient,
    })
}

async fn create_form(SessionUser(user): SessionUser) -> Result<Response, PageError> {
    render(&IngredientCreatePage {
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
            return render(&IngredientCreatePage {
                viewer: user.email,
                name: form.name,
                error: e.to_string(),
            })
        }
    };
    let ingredient = state.store.insert_ingredient(user.id, &name).await?;
    info!(ingredient_id = ingredient.id, user_id = %user.id, "ingredient created");
    Ok(found(&format!("/recipe/ingredients/{}/", ingredient.id)))
}

async fn update_form(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let ingredient = load(&state, id).await?;
    ensure_can_modify(&user, &ingredient)?;
    render(&IngredientUpdatePage {
        viewer: user.email,
        name: ingredient.name.clone(),
        ingredient,
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
    let ingredient = load(&state, id).await?;
    ensure_can_modify(&user, &ingredient)?;
    let name = match clean_name("name", &form.name) {
        Ok(name) => name,
        Err(e) => {
            return render(&IngredientUpdatePage {
                viewer: user.email,
                ingredient,
                name: form.name,
                error: e.to_string(),
            })
        }
    };
    state
        .store
        .rename_ingredient(id, &name)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(ingredient_id = id, user_id = %user.id, "ingredient renamed");
    Ok(found(&format!("/recipe/ingredients/{id}/")))
}

async fn delete_form(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let ingredient = load(&state, id).await?;
    ensure_can_modify(&user, &ingredient)?;
    render(&IngredientDeletePage {
        viewer: user.email,
        ingredient,
    })
}

#[instrument(skip(user, state))]
async fn delete(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let ingredient = load(&state, id).await?;
    ensure_can_modify(&user, &ingredient)?;
    state.store.delete_ingredient(id).await?;
    info!(ingredient_id = id, user_id = %user.id, "ingredient deleted");
    Ok(found("/recipe/ingredients/"))
}
