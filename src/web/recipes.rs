use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::{Form, WithRejection};
use tracing::{info, instrument};

use super::{
    forms::{Choice, RecipeForm},
    found, render,
    session::SessionUser,
    templates::{
        RecipeCreatePage, RecipeDeletePage, RecipeDetailPage, RecipeListPage, RecipeUpdatePage,
    },
    PageError,
};
use crate::{
    error::AppError,
    policy::{can_modify, ensure_can_modify},
    recipe::{
        repo_types::{Recipe, RecipeFields, RecipeFilter},
        services::clean_recipe,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/", get(list))
        .route("/recipes/create/", get(create_form).post(create))
        .route("/recipes/:id/", get(detail))
        .route("/recipes/:id/update/", get(update_form).post(update))
        .route("/recipes/:id/delete/", get(delete_form).post(delete))
}

async fn load(state: &AppState, id: i64) -> Result<Recipe, PageError> {
    Ok(state.store.find_recipe(id).await?.ok_or(AppError::NotFound)?)
}

/// Checkbox lists for every tag and ingredient, with the form's picks checked.
async fn choices(state: &AppState, form: &RecipeForm) -> Result<(Vec<Choice>, Vec<Choice>), PageError> {
    let tags = state.store.list_tags(None).await?;
    let ingredients = state.store.list_ingredients(None).await?;
    Ok((
        Choice::list(&tags, |t| t.id, &form.tags),
        Choice::list(&ingredients, |i| i.id, &form.ingredients),
    ))
}

/// Parses and cleans a posted form. Validation failures come back as a
/// message to show next to the form; anything else is a real error.
async fn clean_form(state: &AppState, form: &RecipeForm) -> Result<Result<RecipeFields, String>, PageError> {
    let fields = match form.to_fields() {
        Ok(fields) => fields,
        Err(e) => return Ok(Err(e.to_string())),
    };
    match clean_recipe(state.store.as_ref(), fields).await {
        Ok(fields) => Ok(Ok(fields)),
        Err(e @ AppError::BadRequest(_)) => Ok(Err(e.to_string())),
        Err(e) => Err(e.into()),
    }
}

async fn list(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
) -> Result<Response, PageError> {
    let recipes = state.store.list_recipes(&RecipeFilter::default()).await?;
    render(&RecipeListPage {
        viewer: user.email,
        recipes,
    })
}

async fn detail(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let recipe = load(&state, id).await?;
    let mut tags = Vec::with_capacity(recipe.tags.len());
    for &tag_id in &recipe.tags {
        if let Some(tag) = state.store.find_tag(tag_id).await? {
            tags.push(tag);
        }
    }
    let mut ingredients = Vec::with_capacity(recipe.ingredients.len());
    for &ingredient_id in &recipe.ingredients {
        if let Some(ingredient) = state.store.find_ingredient(ingredient_id).await? {
            ingredients.push(ingredient);
        }
    }
    let image_url = recipe
        .image
        .as_deref()
        .map(|path| state.config.media.url_for(path));
    render(&RecipeDetailPage {
        can_modify: can_modify(&user, &recipe),
        viewer: user.email,
        recipe,
        tags,
        ingredients,
        image_url,
    })
}

async fn create_form(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
) -> Result<Response, PageError> {
    let form = RecipeForm::default();
    let (tag_choices, ingredient_choices) = choices(&state, &form).await?;
    render(&RecipeCreatePage {
        viewer: user.email,
        form,
        tag_choices,
        ingredient_choices,
        error: String::new(),
    })
}

#[instrument(skip(user, state, form))]
async fn create(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    Form(form): Form<RecipeForm>,
) -> Result<Response, PageError> {
    let fields = match clean_form(&state, &form).await? {
        Ok(fields) => fields,
        Err(error) => {
            let (tag_choices, ingredient_choices) = choices(&state, &form).await?;
            return render(&RecipeCreatePage {
                viewer: user.email,
                form,
                tag_choices,
                ingredient_choices,
                error,
            });
        }
    };
    let recipe = state.store.insert_recipe(user.id, &fields).await?;
    info!(recipe_id = recipe.id, user_id = %user.id, "recipe created");
    Ok(found(&format!("/recipe/recipes/{}/", recipe.id)))
}

async fn update_form(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let recipe = load(&state, id).await?;
    ensure_can_modify(&user, &recipe)?;
    let form = RecipeForm::from_recipe(&recipe);
    let (tag_choices, ingredient_choices) = choices(&state, &form).await?;
    render(&RecipeUpdatePage {
        viewer: user.email,
        recipe,
        form,
        tag_choices,
        ingredient_choices,
        error: String::new(),
    })
}

#[instrument(skip(user, state, form))]
async fn update(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
    Form(form): Form<RecipeForm>,
) -> Result<Response, PageError> {
    let recipe = load(&state, id).await?;
    ensure_can_modify(&user, &recipe)?;
    let fields = match clean_form(&state, &form).await? {
        Ok(fields) => fields,
        Err(error) => {
            let (tag_choices, ingredient_choices) = choices(&state, &form).await?;
            return render(&RecipeUpdatePage {
                viewer: user.email,
                recipe,
                form,
                tag_choices,
                ingredient_choices,
                error,
            });
        }
    };
    state
        .store
        .update_recipe(id, &fields)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(recipe_id = id, user_id = %user.id, "recipe updated");
    Ok(found(&format!("/recipe/recipes/{id}/")))
}

async fn delete_form(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let recipe = load(&state, id).await?;
    ensure_can_modify(&user, &recipe)?;
    render(&RecipeDeletePage {
        viewer: user.email,
        recipe,
    })
}

#[instrument(skip(user, state))]
async fn delete(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, PageError>,
) -> Result<Response, PageError> {
    let recipe = load(&state, id).await?;
    ensure_can_modify(&user, &recipe)?;
    state.store.delete_recipe(id).await?;
    if let Some(image) = recipe.image.as_deref() {
        if let Err(e) = state.media.delete_object(image).await {
            tracing::warn!(error = %e, recipe_id = id, "failed to remove recipe image");
        }
    }
    info!(recipe_id = id, user_id = %user.id, "recipe deleted");
    Ok(found("/recipe/recipes/"))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use rust_decimal::Decimal;

    use crate::test_support::{assert_template, body_string, send, TestApp};

    #[tokio::test]
    async fn visitors_are_sent_to_login() {
        let app = TestApp::new();
        for uri in [
            "/recipe/recipes/",
            "/recipe/recipes/create/",
            "/recipe/recipes/1/",
            "/recipe/recipes/1/update/",
            "/recipe/recipes/1/delete/",
        ] {
            let res = send(&app.router, app.page(uri, None)).await;
            assert_eq!(res.status(), StatusCode::FOUND, "{uri}");
            assert_eq!(
                res.headers()[header::LOCATION],
                format!("/login/?next={}", urlencoding::encode(uri)).as_str()
            );
        }
    }

    #[tokio::test]
    async fn create_with_tags_from_form() {
        let app = TestApp::new();
        let user = app.user("test@domain.com").await;
        let vegan = app.state.store.insert_tag(user.id, "Vegan").await.unwrap();
        let dessert = app.state.store.insert_tag(user.id, "Dessert").await.unwrap();
        let salt = app.state.store.insert_ingredient(user.id, "Salt").await.unwrap();

        let res = send(&app.router, app.page("/recipe/recipes/create/", Some(&user))).await;
        let body = body_string(res).await;
        assert_template(&body, "recipe/recipe_create.html");
        assert!(body.contains("Vegan") && body.contains("Salt"));

        let form = format!(
            "title=Fruit+salad&time_minutes=10&price=4.50&link=&tags={}&tags={}&ingredients={}",
            vegan.id, dessert.id, salt.id
        );
        let res = send(&app.router, app.form("/recipe/recipes/create/", &user, &form)).await;
        assert_eq!(res.status(), StatusCode::FOUND);

        let recipes = app.state.store.list_recipes(&Default::default()).await.unwrap();
        assert_eq!(recipes.len(), 1);
        let recipe = &recipes[0];
        assert_eq!(recipe.title, "Fruit salad");
        assert_eq!(recipe.price, Decimal::new(450, 2));
        assert_eq!(recipe.tags, vec![vegan.id, dessert.id]);
        assert_eq!(recipe.ingredients, vec![salt.id]);
        assert_eq!(recipe.link, None);
        assert_eq!(
            res.headers()[header::LOCATION],
            format!("/recipe/recipes/{}/", recipe.id).as_str()
        );
    }

    #[tokio::test]
    async fn invalid_price_rerenders_form() {
        let app = TestApp::new();
        let user = app.user("test@domain.com").await;
        let res = send(
            &app.router,
            app.form(
                "/recipe/recipes/create/",
                &user,
                "title=Soup&time_minutes=5&price=5.001",
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_string(res).await;
        assert_template(&body, "recipe/recipe_create.html");
        assert!(body.contains("decimal places"));
        assert!(app.state.store.list_recipes(&Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn script_link_is_rejected() {
        let app = TestApp::new();
        let user = app.user("test@domain.com").await;
        let res = send(
            &app.router,
            app.form(
                "/recipe/recipes/create/",
                &user,
                "title=Soup&time_minutes=5&price=5&link=javascript%3Aalert%28document.cookie%29",
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_string(res).await;
        assert_template(&body, "recipe/recipe_create.html");
        assert!(body.contains("valid http or https URL"));
        assert!(app.state.store.list_recipes(&Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_numeric_id_is_not_found() {
        let app = TestApp::new();
        let user = app.user("test@domain.com").await;
        for uri in ["/recipe/recipes/abc/", "/recipe/recipes/abc/update/"] {
            let res = send(&app.router, app.page(uri, Some(&user))).await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_template(&body_string(res).await, "error.html");
        }
    }

    #[tokio::test]
    async fn detail_lists_tags_and_ingredients() {
        let app = TestApp::new();
        let user = app.user("test@domain.com").await;
        let recipe = app.recipe(&user, "Steak and mushroom sauce").await;
        let vegan = app.state.store.insert_tag(user.id, "Vegan").await.unwrap();
        let mut fields = crate::recipe::repo_types::RecipeFields::from(&recipe);
        fields.tags = vec![vegan.id];
        app.state.store.update_recipe(recipe.id, &fields).await.unwrap();

        let res = send(
            &app.router,
            app.page(&format!("/recipe/recipes/{}/", recipe.id), Some(&user)),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_string(res).await;
        assert_template(&body, "recipe/recipe_detail.html");
        assert!(body.contains("Steak and mushroom sauce"));
        assert!(body.contains("Vegan"));
    }

    #[tokio::test]
    async fn only_owner_or_superuser_may_update() {
        let app = TestApp::new();
        let owner = app.user("test@domain.com").await;
        let other = app.user("another_user@domain.com").await;
        let admin = app.superuser("superuser@domain.com").await;
        let recipe = app.recipe(&owner, "Soup").await;
        let uri = format!("/recipe/recipes/{}/update/", recipe.id);

        let res = send(&app.router, app.page(&uri, Some(&other))).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = send(&app.router, app.page(&uri, Some(&owner))).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_template(&body_string(res).await, "recipe/recipe_update.html");

        let res = send(
            &app.router,
            app.form(&uri, &admin, "title=Stew&time_minutes=20&price=7"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        let stored = app.state.store.find_recipe(recipe.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Stew");
        assert_eq!(stored.user_id, owner.id);
    }

    #[tokio::test]
    async fn owner_can_delete() {
        let app = TestApp::new();
        let owner = app.user("test@domain.com").await;
        let recipe = app.recipe(&owner, "Soup").await;
        let uri = format!("/recipe/recipes/{}/delete/", recipe.id);

        let res = send(&app.router, app.page(&uri, Some(&owner))).await;
        assert_template(&body_string(res).await, "recipe/recipe_delete.html");

        let res = send(&app.router, app.form(&uri, &owner, "")).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/recipe/recipes/");
        assert!(app.state.store.find_recipe(recipe.id).await.unwrap().is_none());
    }
}
