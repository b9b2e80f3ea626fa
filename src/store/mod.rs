//! Persistence seam between handlers and the database.
//!
//! Handlers only see `Arc<dyn Store>`; production wires in [`pg::PgStore`],
//! handler tests use [`memory::MemoryStore`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    recipe::repo_types::{Ingredient, Recipe, RecipeFields, RecipeFilter, Tag},
};

#[cfg(test)]
pub mod memory;
pub mod pg;

/// Raised by [`Store::insert_user`] when the email is already taken, whether
/// or not the caller checked first.
#[derive(Debug, thiserror::Error)]
#[error("email {0} is already registered")]
pub struct DuplicateEmail(pub String);

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, new: NewUser) -> anyhow::Result<User>;
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;

    /// Tags ordered by id, optionally restricted to one owner.
    async fn list_tags(&self, owner: Option<Uuid>) -> anyhow::Result<Vec<Tag>>;
    async fn find_tag(&self, id: i64) -> anyhow::Result<Option<Tag>>;
    async fn insert_tag(&self, user_id: Uuid, name: &str) -> anyhow::Result<Tag>;
    async fn rename_tag(&self, id: i64, name: &str) -> anyhow::Result<Option<Tag>>;
    async fn delete_tag(&self, id: i64) -> anyhow::Result<bool>;

    async fn list_ingredients(&self, owner: Option<Uuid>) -> anyhow::Result<Vec<Ingredient>>;
    async fn find_ingredient(&self, id: i64) -> anyhow::Result<Option<Ingredient>>;
    async fn insert_ingredient(&self, user_id: Uuid, name: &str) -> anyhow::Result<Ingredient>;
    async fn rename_ingredient(&self, id: i64, name: &str) -> anyhow::Result<Option<Ingredient>>;
    async fn delete_ingredient(&self, id: i64) -> anyhow::Result<bool>;

    async fn list_recipes(&self, filter: &RecipeFilter) -> anyhow::Result<Vec<Recipe>>;
    async fn find_recipe(&self, id: i64) -> anyhow::Result<Option<Recipe>>;
    async fn insert_recipe(&self, user_id: Uuid, fields: &RecipeFields) -> anyhow::Result<Recipe>;
    async fn update_recipe(&self, id: i64, fields: &RecipeFields)
        -> anyhow::Result<Option<Recipe>>;
    async fn set_recipe_image(&self, id: i64, image: Option<&str>)
        -> anyhow::Result<Option<Recipe>>;
    async fn delete_recipe(&self, id: i64) -> anyhow::Result<bool>;
}
