use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    error::AppError,
    recipe::repo_types::{Recipe, RecipeFields},
};

#[derive(Debug, Default, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Raw recipe form as posted. Numbers stay strings so a bad value can be
/// echoed back to the user.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecipeForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub time_minutes: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub ingredients: Vec<i64>,
}

impl RecipeForm {
    pub fn from_recipe(r: &Recipe) -> Self {
        Self {
            title: r.title.clone(),
            time_minutes: r.time_minutes.to_string(),
            price: r.price.to_string(),
            link: r.link.clone().unwrap_or_default(),
            tags: r.tags.clone(),
            ingredients: r.ingredients.clone(),
        }
    }

    pub fn to_fields(&self) -> Result<RecipeFields, AppError> {
        let time_minutes = self
            .time_minutes
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::BadRequest("time_minutes: enter a whole number".into()))?;
        let price = Decimal::from_str(self.price.trim())
            .map_err(|_| AppError::BadRequest("price: enter a number".into()))?;
        Ok(RecipeFields {
            title: self.title.clone(),
            time_minutes,
            price,
            link: Some(self.link.clone()),
            tags: self.tags.clone(),
            ingredients: self.ingredients.clone(),
        })
    }
}

/// One checkbox of a multi-select.
#[derive(Debug, Clone)]
pub struct Choice {
    pub id: i64,
    pub label: String,
    pub checked: bool,
}

impl Choice {
    pub fn list<T: ToString>(items: &[T], id_of: impl Fn(&T) -> i64, selected: &[i64]) -> Vec<Self> {
        items
            .iter()
            .map(|item| {
                let id = id_of(item);
                Choice {
                    id,
                    label: item.to_string(),
                    checked: selected.contains(&id),
                }
            })
            .collect()
    }
}
