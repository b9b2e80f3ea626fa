use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument};

use super::{
    dto::{
        ListQuery, NamePatch, NamePayload, RecipeListQuery, RecipePatch, RecipePayload,
        RecipeResponse,
    },
    repo_types::{Ingredient, RecipeFilter, Tag},
    services::{clean_name, clean_recipe, parse_ids, replace_recipe_image},
};
use crate::{
    auth::extractors::CurrentUser, error::AppError, policy::ensure_can_modify, state::AppState,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/tags/", get(list_tags).post(create_tag))
        .route(
            "/tags/:id/",
            get(get_tag).put(put_tag).patch(patch_tag).delete(delete_tag),
        )
        .route("/ingredients/", get(list_ingredients).post(create_ingredient))
        .route(
            "/ingredients/:id/",
            get(get_ingredient)
                .put(put_ingredient)
                .patch(patch_ingredient)
                .delete(delete_ingredient),
        )
        .route("/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id/",
            get(get_recipe)
                .put(put_recipe)
                .patch(patch_recipe)
                .delete(delete_recipe),
        )
        .route(
            "/recipes/:id/upload-image/",
            post(upload_image).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
}

// --- tags ---

#[instrument(skip(state, user))]
pub async fn list_tags(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Query(q), _): WithRejection<Query<ListQuery>, AppError>,
) -> Result<Json<Vec<Tag>>, AppError> {
    let owner = q.mine.then_some(user.id);
    Ok(Json(state.store.list_tags(owner).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn create_tag(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(payload), _): WithRejection<Json<NamePayload>, AppError>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let name = clean_name("name", &payload.name)?;
    let tag = state.store.insert_tag(user.id, &name).await?;
    info!(tag_id = tag.id, user_id = %user.id, "tag created");
    Ok((StatusCode::CREATED, Json(tag)))
}

#[instrument(skip(state, _user))]
pub async fn get_tag(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<Tag>, AppError> {
    let tag = state.store.find_tag(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(tag))
}

async fn rename_tag(
    state: &AppState,
    user: &crate::auth::repo_types::User,
    id: i64,
    name: Option<&str>,
) -> Result<Tag, AppError> {
    let tag = state.store.find_tag(id).await?.ok_or(AppError::NotFound)?;
    ensure_can_modify(user, &tag)?;
    let Some(name) = name else {
        return Ok(tag);
    };
    let name = clean_name("name", name)?;
    state
        .store
        .rename_tag(id, &name)
        .await?
        .ok_or(AppError::NotFound)
}

#[instrument(skip(state, user, payload))]
pub async fn put_tag(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<NamePayload>, AppError>,
) -> Result<Json<Tag>, AppError> {
    Ok(Json(rename_tag(&state, &user, id, Some(&payload.name)).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn patch_tag(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<NamePatch>, AppError>,
) -> Result<Json<Tag>, AppError> {
    Ok(Json(rename_tag(&state, &user, id, payload.name.as_deref()).await?))
}

#[instrument(skip(state, user))]
pub async fn delete_tag(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<StatusCode, AppError> {
    let tag = state.store.find_tag(id).await?.ok_or(AppError::NotFound)?;
    ensure_can_modify(&user, &tag)?;
    state.store.delete_tag(id).await?;
    info!(tag_id = id, user_id = %user.id, "tag deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- ingredients ---

#[instrument(skip(state, user))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Query(q), _): WithRejection<Query<ListQuery>, AppError>,
) -> Result<Json<Vec<Ingredient>>, AppError> {
    let owner = q.mine.then_some(user.id);
    Ok(Json(state.store.list_ingredients(owner).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(payload), _): WithRejection<Json<NamePayload>, AppError>,
) -> Result<(StatusCode, Json<Ingredient>), AppError> {
    let name = clean_name("name", &payload.name)?;
    let ingredient = state.store.insert_ingredient(user.id, &name).await?;
    info!(ingredient_id = ingredient.id, user_id = %user.id, "ingredient created");
    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[instrument(skip(state, _user))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<Ingredient>, AppError> {
    let ingredient = state
        .store
        .find_ingredient(id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(ingredient))
}

async fn rename_ingredient(
    state: &AppState,
    user: &crate::auth::repo_types::User,
    id: i64,
    name: Option<&str>,
) -> Result<Ingredient, AppError> {
    let ingredient = state
        .store
        .find_ingredient(id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_can_modify(user, &ingredient)?;
    let Some(name) = name else {
        return Ok(ingredient);
    };
    let name = clean_name("name", name)?;
    state
        .store
        .rename_ingredient(id, &name)
        .await?
        .ok_or(AppError::NotFound)
}

#[instrument(skip(state, user, payload))]
pub async fn put_ingredient(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<NamePayload>, AppError>,
) -> Result<Json<Ingredient>, AppError> {
    Ok(Json(
        rename_ingredient(&state, &user, id, Some(&payload.name)).await?,
    ))
}

#[instrument(skip(state, user, payload))]
pub async fn patch_ingredient(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<NamePatch>, AppError>,
) -> Result<Json<Ingredient>, AppError> {
    Ok(Json(
        rename_ingredient(&state, &user, id, payload.name.as_deref()).await?,
    ))
}

#[instrument(skip(state, user))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<StatusCode, AppError> {
    let ingredient = state
        .store
        .find_ingredient(id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_can_modify(&user, &ingredient)?;
    state.store.delete_ingredient(id).await?;
    info!(ingredient_id = id, user_id = %user.id, "ingredient deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- recipes ---

#[instrument(skip(state, user))]
pub async fn list_recipes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Query(q), _): WithRejection<Query<RecipeListQuery>, AppError>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let filter = RecipeFilter {
        owner: q.mine.then_some(user.id),
        tags: parse_ids("tags", q.tags.as_deref())?,
        ingredients: parse_ids("ingredients", q.ingredients.as_deref())?,
    };
    let recipes = state.store.list_recipes(&filter).await?;
    Ok(Json(
        recipes
            .into_iter()
            .map(|r| RecipeResponse::new(r, &state.config.media))
            .collect(),
    ))
}

#[instrument(skip(state, user, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(payload), _): WithRejection<Json<RecipePayload>, AppError>,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    let fields = clean_recipe(state.store.as_ref(), payload.into()).await?;
    let recipe = state.store.insert_recipe(user.id, &fields).await?;
    info!(recipe_id = recipe.id, user_id = %user.id, "recipe created");
    Ok((
        StatusCode::CREATED,
        Json(RecipeResponse::new(recipe, &state.config.media)),
    ))
}

#[instrument(skip(state, _user))]
pub async fn get_recipe(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = state.store.find_recipe(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(RecipeResponse::new(recipe, &state.config.media)))
}

#[instrument(skip(state, user, payload))]
pub async fn put_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<RecipePayload>, AppError>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = state.store.find_recipe(id).await?.ok_or(AppError::NotFound)?;
    ensure_can_modify(&user, &recipe)?;
    let fields = clean_recipe(state.store.as_ref(), payload.into()).await?;
    let recipe = state
        .store
        .update_recipe(id, &fields)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(RecipeResponse::new(recipe, &state.config.media)))
}

#[instrument(skip(state, user, payload))]
pub async fn patch_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<RecipePatch>, AppError>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = state.store.find_recipe(id).await?.ok_or(AppError::NotFound)?;
    ensure_can_modify(&user, &recipe)?;
    let fields = clean_recipe(state.store.as_ref(), payload.apply(&recipe)).await?;
    let recipe = state
        .store
        .update_recipe(id, &fields)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(RecipeResponse::new(recipe, &state.config.media)))
}

#[instrument(skip(state, user))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<StatusCode, AppError> {
    let recipe = state.store.find_recipe(id).await?.ok_or(AppError::NotFound)?;
    ensure_can_modify(&user, &recipe)?;
    state.store.delete_recipe(id).await?;
    if let Some(image) = recipe.image.as_deref() {
        if let Err(e) = state.media.delete_object(image).await {
            tracing::warn!(error = %e, recipe_id = id, "failed to remove recipe image");
        }
    }
    info!(recipe_id = id, user_id = %user.id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/:id/upload-image/ (multipart, field `image`)
#[instrument(skip(state, user, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(mut mp, _): WithRejection<Multipart, AppError>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = state.store.find_recipe(id).await?.ok_or(AppError::NotFound)?;
    ensure_can_modify(&user, &recipe)?;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("image: no file name submitted".into()))?;
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if body.is_empty() {
            return Err(AppError::BadRequest("image: the submitted file is empty".into()));
        }
        let updated = replace_recipe_image(&state, &recipe, &filename, body).await?;
        return Ok(Json(RecipeResponse::new(updated, &state.config.media)));
    }
    Err(AppError::BadRequest("image: no file was submitted".into()))
}
