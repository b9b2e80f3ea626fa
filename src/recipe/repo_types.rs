use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Recipe row joined with its tag and ingredient ids (both sorted).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>, // relative to the media root
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Writable recipe columns. Owner and creation time are never part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeFields {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

impl From<&Recipe> for RecipeFields {
    fn from(r: &Recipe) -> Self {
        Self {
            title: r.title.clone(),
            time_minutes: r.time_minutes,
            price: r.price,
            link: r.link.clone(),
            tags: r.tags.clone(),
            ingredients: r.ingredients.clone(),
        }
    }
}

/// Recipe list filter. Empty id lists mean "no constraint"; a non-empty list
/// matches recipes carrying any of the ids.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub owner: Option<Uuid>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        fn any_of(wanted: &[i64], have: &[i64]) -> bool {
            wanted.is_empty() || wanted.iter().any(|id| have.contains(id))
        }
        self.owner.map_or(true, |owner| recipe.user_id == owner)
            && any_of(&self.tags, &recipe.tags)
            && any_of(&self.ingredients, &recipe.ingredients)
    }
}
