use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::repo_types::{Recipe, RecipeFields};
use crate::config::MediaConfig;

/// Body for creating or replacing a tag or an ingredient.
#[derive(Debug, Deserialize)]
pub struct NamePayload {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NamePatch {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub ingredients: Vec<i64>,
}

impl From<RecipePayload> for RecipeFields {
    fn from(p: RecipePayload) -> Self {
        Self {
            title: p.title,
            time_minutes: p.time_minutes,
            price: p.price,
            link: p.link,
            tags: p.tags,
            ingredients: p.ingredients,
        }
    }
}

/// Partial recipe update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

impl RecipePatch {
    pub fn apply(self, current: &Recipe) -> RecipeFields {
        let base = RecipeFields::from(current);
        RecipeFields {
            title: self.title.unwrap_or(base.title),
            time_minutes: self.time_minutes.unwrap_or(base.time_minutes),
            price: self.price.unwrap_or(base.price),
            link: self.link.or(base.link),
            tags: self.tags.unwrap_or(base.tags),
            ingredients: self.ingredients.unwrap_or(base.ingredients),
        }
    }
}

/// `?mine=true` restricts a list to the caller's rows.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub mine: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    #[serde(default)]
    pub mine: bool,
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub image_url: Option<String>,
}

impl RecipeResponse {
    pub fn new(recipe: Recipe, media: &MediaConfig) -> Self {
        let image_url = recipe.image.as_deref().map(|p| media.url_for(p));
        Self { recipe, image_url }
    }
}
