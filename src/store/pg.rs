use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{DuplicateEmail, Store};
use crate::{
    auth::repo_types::{NewUser, User},
    recipe::repo_types::{Ingredient, Recipe, RecipeFields, RecipeFilter, Tag},
};

/// Postgres SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str =
    "id, email, password_hash, is_active, is_staff, is_superuser, created_at";

const RECIPE_COLUMNS: &str = r#"
    r.id, r.user_id, r.title, r.time_minutes, r.price, r.link, r.image, r.created_on,
    ARRAY(SELECT tag_id FROM recipe_tags WHERE recipe_id = r.id ORDER BY tag_id) AS tags,
    ARRAY(SELECT ingredient_id FROM recipe_ingredients
           WHERE recipe_id = r.id ORDER BY ingredient_id) AS ingredients
"#;

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // Tags and ingredients share a shape; `table` is always one of two literals.

    async fn list_named<T>(&self, table: &str, owner: Option<Uuid>) -> anyhow::Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(&format!(
            r#"
            SELECT id, user_id, name, created_on
              FROM {table}
             WHERE ($1::uuid IS NULL OR user_id = $1)
             ORDER BY id
            "#
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .with_context(|| format!("list {table}"))
    }

    async fn find_named<T>(&self, table: &str, id: i64) -> anyhow::Result<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(&format!(
            "SELECT id, user_id, name, created_on FROM {table} WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("find {table} {id}"))
    }

    async fn insert_named<T>(&self, table: &str, user_id: Uuid, name: &str) -> anyhow::Result<T>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(&format!(
            r#"
            INSERT INTO {table} (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name, created_on
            "#
        ))
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("insert into {table}"))
    }

    async fn rename_named<T>(&self, table: &str, id: i64, name: &str) -> anyhow::Result<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(&format!(
            r#"
            UPDATE {table} SET name = $2
             WHERE id = $1
            RETURNING id, user_id, name, created_on
            "#
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("rename {table} {id}"))
    }

    async fn delete_row(&self, table: &str, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete {table} {id}"))?;
        Ok(res.rows_affected() > 0)
    }
}

/// Replace the tag and ingredient links of a recipe within a transaction.
async fn link_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    fields: &RecipeFields,
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .context("clear recipe tags")?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .context("clear recipe ingredients")?;

    sqlx::query(
        r#"
        INSERT INTO recipe_tags (recipe_id, tag_id)
        SELECT $1, t FROM UNNEST($2::bigint[]) AS t
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(recipe_id)
    .bind(&fields.tags)
    .execute(&mut **tx)
    .await
    .context("link recipe tags")?;
    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id)
        SELECT $1, i FROM UNNEST($2::bigint[]) AS i
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(recipe_id)
    .bind(&fields.ingredients)
    .execute(&mut **tx)
    .await
    .context("link recipe ingredients")?;
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, new: NewUser) -> anyhow::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.is_staff)
        .bind(new.is_superuser)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                anyhow::Error::new(DuplicateEmail(new.email.clone()))
            }
            _ => anyhow::Error::new(e).context("insert user"),
        })
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.db)
        .await
        .context("list users")
    }

    async fn list_tags(&self, owner: Option<Uuid>) -> anyhow::Result<Vec<Tag>> {
        self.list_named("tags", owner).await
    }

    async fn find_tag(&self, id: i64) -> anyhow::Result<Option<Tag>> {
        self.find_named("tags", id).await
    }

    async fn insert_tag(&self, user_id: Uuid, name: &str) -> anyhow::Result<Tag> {
        self.insert_named("tags", user_id, name).await
    }

    async fn rename_tag(&self, id: i64, name: &str) -> anyhow::Result<Option<Tag>> {
        self.rename_named("tags", id, name).await
    }

    async fn delete_tag(&self, id: i64) -> anyhow::Result<bool> {
        self.delete_row("tags", id).await
    }

    async fn list_ingredients(&self, owner: Option<Uuid>) -> anyhow::Result<Vec<Ingredient>> {
        self.list_named("ingredients", owner).await
    }

    async fn find_ingredient(&self, id: i64) -> anyhow::Result<Option<Ingredient>> {
        self.find_named("ingredients", id).await
    }

    async fn insert_ingredient(&self, user_id: Uuid, name: &str) -> anyhow::Result<Ingredient> {
        self.insert_named("ingredients", user_id, name).await
    }

    async fn rename_ingredient(&self, id: i64, name: &str) -> anyhow::Result<Option<Ingredient>> {
        self.rename_named("ingredients", id, name).await
    }

    async fn delete_ingredient(&self, id: i64) -> anyhow::Result<bool> {
        self.delete_row("ingredients", id).await
    }

    async fn list_recipes(&self, filter: &RecipeFilter) -> anyhow::Result<Vec<Recipe>> {
        sqlx::query_as::<_, Recipe>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
              FROM recipes r
             WHERE ($1::uuid IS NULL OR r.user_id = $1)
               AND (cardinality($2::bigint[]) = 0 OR EXISTS (
                    SELECT 1 FROM recipe_tags rt
                     WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)))
               AND (cardinality($3::bigint[]) = 0 OR EXISTS (
                    SELECT 1 FROM recipe_ingredients ri
                     WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3)))
             ORDER BY r.id
            "#
        ))
        .bind(filter.owner)
        .bind(&filter.tags)
        .bind(&filter.ingredients)
        .fetch_all(&self.db)
        .await
        .context("list recipes")
    }

    async fn find_recipe(&self, id: i64) -> anyhow::Result<Option<Recipe>> {
        sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("find recipe {id}"))
    }

    async fn insert_recipe(&self, user_id: Uuid, fields: &RecipeFields) -> anyhow::Result<Recipe> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO recipes (user_id, title, time_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&fields.title)
        .bind(fields.time_minutes)
        .bind(fields.price)
        .bind(&fields.link)
        .fetch_one(&mut *tx)
        .await
        .context("insert recipe")?;
        link_recipe_tx(&mut tx, id, fields).await?;
        tx.commit().await.context("commit tx")?;

        self.find_recipe(id)
            .await?
            .with_context(|| format!("recipe {id} vanished after insert"))
    }

    async fn update_recipe(
        &self,
        id: i64,
        fields: &RecipeFields,
    ) -> anyhow::Result<Option<Recipe>> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let updated: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE recipes
               SET title = $2, time_minutes = $3, price = $4, link = $5
             WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(fields.time_minutes)
        .bind(fields.price)
        .bind(&fields.link)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("update recipe {id}"))?;
        if updated.is_none() {
            return Ok(None);
        }
        link_recipe_tx(&mut tx, id, fields).await?;
        tx.commit().await.context("commit tx")?;

        self.find_recipe(id).await
    }

    async fn set_recipe_image(
        &self,
        id: i64,
        image: Option<&str>,
    ) -> anyhow::Result<Option<Recipe>> {
        let res = sqlx::query("UPDATE recipes SET image = $2 WHERE id = $1")
            .bind(id)
            .bind(image)
            .execute(&self.db)
            .await
            .with_context(|| format!("set image of recipe {id}"))?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_recipe(id).await
    }

    async fn delete_recipe(&self, id: i64) -> anyhow::Result<bool> {
        self.delete_row("recipes", id).await
    }
}
