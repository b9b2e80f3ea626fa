use bytes::Bytes;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{
    images::recipe_image_file_path,
    repo_types::{Recipe, RecipeFields},
};
use crate::{error::AppError, state::AppState, store::Store};

pub const MAX_NAME_LEN: usize = 255;
const MAX_PRICE: Decimal = Decimal::ONE_THOUSAND;

/// Trims a required short text field and enforces its length.
pub fn clean_name(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field}: this field may not be blank")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "{field}: ensure this field has no more than {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value.to_string())
}

/// Links are rendered as anchors, so only web URLs are accepted.
pub fn clean_link(link: Option<String>) -> Result<Option<String>, AppError> {
    match link.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(l) if l.chars().count() > MAX_NAME_LEN => Err(AppError::BadRequest(format!(
            "link: ensure this field has no more than {MAX_NAME_LEN} characters"
        ))),
        Some(l) if !is_web_url(l) => Err(AppError::BadRequest(
            "link: enter a valid http or https URL".into(),
        )),
        Some(l) => Ok(Some(l.to_string())),
    }
}

fn is_web_url(link: &str) -> bool {
    let Some((scheme, rest)) = link.split_once("://") else {
        return false;
    };
    (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
        && !rest.is_empty()
        && !rest.chars().any(char::is_whitespace)
}

/// Prices are stored as NUMERIC(5, 2).
pub fn clean_price(price: Decimal) -> Result<Decimal, AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::BadRequest("price: must not be negative".into()));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::BadRequest(
            "price: ensure there are no more than 2 decimal places".into(),
        ));
    }
    if price >= MAX_PRICE {
        return Err(AppError::BadRequest(
            "price: ensure there are no more than 5 digits in total".into(),
        ));
    }
    Ok(price.round_dp(2))
}

/// Normalizes every field and checks that referenced tags and ingredients exist.
pub async fn clean_recipe(store: &dyn Store, fields: RecipeFields) -> Result<RecipeFields, AppError> {
    if fields.time_minutes < 0 {
        return Err(AppError::BadRequest("time_minutes: must not be negative".into()));
    }
    let mut tags = fields.tags;
    tags.sort_unstable();
    tags.dedup();
    for &id in &tags {
        if store.find_tag(id).await?.is_none() {
            return Err(AppError::BadRequest(format!("tags: invalid pk \"{id}\"")));
        }
    }
    let mut ingredients = fields.ingredients;
    ingredients.sort_unstable();
    ingredients.dedup();
    for &id in &ingredients {
        if store.find_ingredient(id).await?.is_none() {
            return Err(AppError::BadRequest(format!("ingredients: invalid pk \"{id}\"")));
        }
    }
    Ok(RecipeFields {
        title: clean_name("title", &fields.title)?,
        time_minutes: fields.time_minutes,
        price: clean_price(fields.price)?,
        link: clean_link(fields.link)?,
        tags,
        ingredients,
    })
}

/// Parses a comma separated id list such as `1,2,3`.
pub fn parse_ids(field: &str, raw: Option<&str>) -> Result<Vec<i64>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("{field}: {s:?} is not a valid id")))
        })
        .collect()
}

/// Stores an uploaded image under a fresh name and points the recipe at it.
/// The previous file, if any, is removed afterwards.
pub async fn replace_recipe_image(
    state: &AppState,
    recipe: &Recipe,
    filename: &str,
    body: Bytes,
) -> Result<Recipe, AppError> {
    let path = recipe_image_file_path(filename)?;
    state.media.put_object(&path, body).await?;

    let updated = state
        .store
        .set_recipe_image(recipe.id, Some(&path))
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(old) = recipe.image.as_deref() {
        if let Err(e) = state.media.delete_object(old).await {
            warn!(error = %e, recipe_id = recipe.id, path = old, "failed to remove old image");
        }
    }
    info!(recipe_id = recipe.id, path = %path, "recipe image stored");
    Ok(updated)
}
