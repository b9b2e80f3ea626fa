//! Askama page templates. Every page extends `base.html`, which reads
//! `viewer` (the signed-in email, empty for visitors).

use askama::Template;

use crate::{
    auth::repo_types::User,
    recipe::repo_types::{Ingredient, Recipe, Tag},
};

use super::forms::{Choice, RecipeForm};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub viewer: String,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutPage {
    pub viewer: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub viewer: String,
    pub email: String,
    pub next: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    pub viewer: String,
    pub email: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub viewer: String,
    pub status: u16,
    pub message: String,
}

#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct AdminIndexPage {
    pub viewer: String,
    pub users: Vec<User>,
    pub tag_count: usize,
    pub ingredient_count: usize,
    pub recipe_count: usize,
}

// --- tags ---

#[derive(Template)]
#[template(path = "tag/tag_list.html")]
pub struct TagListPage {
    pub viewer: String,
    pub tags: Vec<Tag>,
}

#[derive(Template)]
#[template(path = "tag/tag_detail.html")]
pub struct TagDetailPage {
    pub viewer: String,
    pub tag: Tag,
    pub can_modify: bool,
}

#[derive(Template)]
#[template(path = "tag/tag_create.html")]
pub struct TagCreatePage {
    pub viewer: String,
    pub name: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "tag/tag_update.html")]
pub struct TagUpdatePage {
    pub viewer: String,
    pub tag: Tag,
    pub name: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "tag/tag_delete.html")]
pub struct TagDeletePage {
    pub viewer: String,
    pub tag: Tag,
}

// --- ingredients ---

#[derive(Template)]
#[template(path = "ingredient/ingredient_list.html")]
pub struct IngredientListPage {
    pub viewer: String,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Template)]
#[template(path = "ingredient/ingredient_detail.html")]
pub struct IngredientDetailPage {
    pub viewer: String,
    pub ingredient: Ingredient,
    pub can_modify: bool,
}

#[derive(Template)]
#[template(path = "ingredient/ingredient_create.html")]
pub struct IngredientCreatePage {
    pub viewer: String,
    pub name: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "ingredient/ingredient_update.html")]
pub struct IngredientUpdatePage {
    pub viewer: String,
    pub ingredient: Ingredient,
    pub name: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "ingredient/ingredient_delete.html")]
pub struct IngredientDeletePage {
    pub viewer: String,
    pub ingredient: Ingredient,
}

// --- recipes ---

#[derive(Template)]
#[template(path = "recipe/recipe_list.html")]
pub struct RecipeListPage {
    pub viewer: String,
    pub recipes: Vec<Recipe>,
}

#[derive(Template)]
#[template(path = "recipe/recipe_detail.html")]
pub struct RecipeDetailPage {
    pub viewer: String,
    pub recipe: Recipe,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
    pub image_url: Option<String>,
    pub can_modify: bool,
}

#[derive(Template)]
#[template(path = "recipe/recipe_create.html")]
pub struct RecipeCreatePage {
    pub viewer: String,
    pub form: RecipeForm,
    pub tag_choices: Vec<Choice>,
    pub ingredient_choices: Vec<Choice>,
    pub error: String,
}

#[derive(Template)]
#[template(path = "recipe/recipe_update.html")]
pub struct RecipeUpdatePage {
    pub viewer: String,
    pub recipe: Recipe,
    pub form: RecipeForm,
    pub tag_choices: Vec<Choice>,
    pub ingredient_choices: Vec<Choice>,
    pub error: String,
}

#[derive(Template)]
#[template(path = "recipe/recipe_delete.html")]
pub struct RecipeDeletePage {
    pub viewer: String,
    pub recipe: Recipe,
}
