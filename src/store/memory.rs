use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{DuplicateEmail, Store};
use crate::{
    auth::repo_types::{NewUser, User},
    recipe::repo_types::{Ingredient, Recipe, RecipeFields, RecipeFilter, Tag},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tags: BTreeMap<i64, Tag>,
    ingredients: BTreeMap<i64, Ingredient>,
    recipes: BTreeMap<i64, Recipe>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store backed by process memory, used by handler tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))
    }
}

fn sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> anyhow::Result<User> {
        let mut t = self.lock()?;
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(DuplicateEmail(new.email).into());
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            is_active: true,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.lock()?.users.clone())
    }

    async fn list_tags(&self, owner: Option<Uuid>) -> anyhow::Result<Vec<Tag>> {
        Ok(self
            .lock()?
            .tags
            .values()
            .filter(|t| owner.map_or(true, |o| t.user_id == o))
            .cloned()
            .collect())
    }

    async fn find_tag(&self, id: i64) -> anyhow::Result<Option<Tag>> {
        Ok(self.lock()?.tags.get(&id).cloned())
    }

    async fn insert_tag(&self, user_id: Uuid, name: &str) -> anyhow::Result<Tag> {
        let mut t = self.lock()?;
        let tag = Tag {
            id: t.next_id(),
            user_id,
            name: name.to_string(),
            created_on: OffsetDateTime::now_utc(),
        };
        t.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn rename_tag(&self, id: i64, name: &str) -> anyhow::Result<Option<Tag>> {
        let mut t = self.lock()?;
        Ok(t.tags.get_mut(&id).map(|tag| {
            tag.name = name.to_string();
            tag.clone()
        }))
    }

    async fn delete_tag(&self, id: i64) -> anyhow::Result<bool> {
        let mut t = self.lock()?;
        let removed = t.tags.remove(&id).is_some();
        for recipe in t.recipes.values_mut() {
            recipe.tags.retain(|&tag_id| tag_id != id);
        }
        Ok(removed)
    }

    async fn list_ingredients(&self, owner: Option<Uuid>) -> anyhow::Result<Vec<Ingredient>> {
        Ok(self
            .lock()?
            .ingredients
            .values()
            .filter(|i| owner.map_or(true, |o| i.user_id == o))
            .cloned()
            .collect())
    }

    async fn find_ingredient(&self, id: i64) -> anyhow::Result<Option<Ingredient>> {
        Ok(self.lock()?.ingredients.get(&id).cloned())
    }

    async fn insert_ingredient(&self, user_id: Uuid, name: &str) -> anyhow::Result<Ingredient> {
        let mut t = self.lock()?;
        let ingredient = Ingredient {
            id: t.next_id(),
            user_id,
            name: name.to_string(),
            created_on: OffsetDateTime::now_utc(),
        };
        t.ingredients.insert(ingredient.id, ingredient.clone());
        Ok(ingredient)
    }

    async fn rename_ingredient(&self, id: i64, name: &str) -> anyhow::Result<Option<Ingredient>> {
        let mut t = self.lock()?;
        Ok(t.ingredients.get_mut(&id).map(|i| {
            i.name = name.to_string();
            i.clone()
        }))
    }

    async fn delete_ingredient(&self, id: i64) -> anyhow::Result<bool> {
        let mut t = self.lock()?;
        let removed = t.ingredients.remove(&id).is_some();
        for recipe in t.recipes.values_mut() {
            recipe.ingredients.retain(|&i| i != id);
        }
        Ok(removed)
    }

    async fn list_recipes(&self, filter: &RecipeFilter) -> anyhow::Result<Vec<Recipe>> {
        Ok(self
            .lock()?
            .recipes
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn find_recipe(&self, id: i64) -> anyhow::Result<Option<Recipe>> {
        Ok(self.lock()?.recipes.get(&id).cloned())
    }

    async fn insert_recipe(&self, user_id: Uuid, fields: &RecipeFields) -> anyhow::Result<Recipe> {
        let mut t = self.lock()?;
        let recipe = Recipe {
            id: t.next_id(),
            user_id,
            title: fields.title.clone(),
            time_minutes: fields.time_minutes,
            price: fields.price,
            link: fields.link.clone(),
            image: None,
            created_on: OffsetDateTime::now_utc(),
            tags: sorted(fields.tags.clone()),
            ingredients: sorted(fields.ingredients.clone()),
        };
        t.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn update_recipe(
        &self,
        id: i64,
        fields: &RecipeFields,
    ) -> anyhow::Result<Option<Recipe>> {
        let mut t = self.lock()?;
        Ok(t.recipes.get_mut(&id).map(|r| {
            r.title = fields.title.clone();
            r.time_minutes = fields.time_minutes;
            r.price = fields.price;
            r.link = fields.link.clone();
            r.tags = sorted(fields.tags.clone());
            r.ingredients = sorted(fields.ingredients.clone());
            r.clone()
        }))
    }

    async fn set_recipe_image(
        &self,
        id: i64,
        image: Option<&str>,
    ) -> anyhow::Result<Option<Recipe>> {
        let mut t = self.lock()?;
        Ok(t.recipes.get_mut(&id).map(|r| {
            r.image = image.map(str::to_string);
            r.clone()
        }))
    }

    async fn delete_recipe(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.lock()?.recipes.remove(&id).is_some())
    }
}
