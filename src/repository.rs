use crate::{
    error::StoreError,
    models::{Credential, NewCredential, RecipeStep, Role, Salad},
};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

/// CredentialStore Trait
///
/// Persists and retrieves credentials by username. The auth service is the only caller
/// and the only path that creates a credential.
///
/// **Send + Sync + async_trait** make `Arc<dyn CredentialStore>` shareable across
/// Axum's asynchronous task boundaries.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError>;
    // Conflict when the username is already taken.
    async fn insert(&self, credential: NewCredential) -> Result<Uuid, StoreError>;
}

/// RecipeStore Trait
///
/// Entity store adapter for the content the validation pipeline gates, plus the
/// banned keyword table read once at startup.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn create_salad(&self, salad: &Salad) -> Result<Uuid, StoreError>;
    // Owner-Only: returns false when no row with this id belongs to `author_id`.
    async fn update_salad(&self, salad: &Salad) -> Result<bool, StoreError>;
    async fn get_salad(&self, id: Uuid) -> Result<Option<Salad>, StoreError>;

    async fn create_recipe_step(&self, step: &RecipeStep) -> Result<Uuid, StoreError>;
    async fn update_recipe_step(&self, step: &RecipeStep) -> Result<bool, StoreError>;
    async fn get_recipe_step(&self, id: Uuid) -> Result<Option<RecipeStep>, StoreError>;

    async fn get_keywords(&self) -> Result<Vec<String>, StoreError>;
}

pub type CredentialStoreState = Arc<dyn CredentialStore>;
pub type RecipeStoreState = Arc<dyn RecipeStore>;

/// PostgresRepository
///
/// The concrete implementation of both store traits, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Raw `users` row; the role column is plain text.
#[derive(FromRow)]
struct CredentialRow {
    id: Uuid,
    username: String,
    password: String,
    role: String,
}

impl TryFrom<CredentialRow> for Credential {
    type Error = StoreError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(StoreError::Unavailable)?;
        Ok(Credential {
            id: row.id,
            username: row.username,
            hashed_password: row.password,
            role,
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, username, password, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Credential::try_from).transpose()
    }

    /// insert
    ///
    /// A unique violation on `username` surfaces as `StoreError::Conflict`.
    async fn insert(&self, credential: NewCredential) -> Result<Uuid, StoreError> {
        let id: (Uuid,) = sqlx::query_as(
            "INSERT INTO users (id, username, password, role) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&credential.username)
        .bind(&credential.hashed_password)
        .bind(credential.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id.0)
    }
}

#[async_trait]
impl RecipeStore for PostgresRepository {
    async fn create_salad(&self, salad: &Salad) -> Result<Uuid, StoreError> {
        let id: (Uuid,) = sqlx::query_as(
            "INSERT INTO salads (id, author_id, name, description) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(salad.author_id)
        .bind(&salad.name)
        .bind(&salad.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(id.0)
    }

    async fn update_salad(&self, salad: &Salad) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE salads SET name = $1, description = $2 WHERE id = $3 AND author_id = $4",
        )
        .bind(&salad.name)
        .bind(&salad.description)
        .bind(salad.id)
        .bind(salad.author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_salad(&self, id: Uuid) -> Result<Option<Salad>, StoreError> {
        let salad = sqlx::query_as::<_, Salad>(
            "SELECT id, author_id, name, description FROM salads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(salad)
    }

    async fn create_recipe_step(&self, step: &RecipeStep) -> Result<Uuid, StoreError> {
        let id: (Uuid,) = sqlx::query_as(
            r#"INSERT INTO recipe_steps (id, recipe_id, author_id, name, description, step_num)
               VALUES ($1, $2, $3, $4, $5, $6) RETURNING id"#,
        )
        .bind(Uuid::new_v4())
        .bind(step.recipe_id)
        .bind(step.author_id)
        .bind(&step.name)
        .bind(&step.description)
        .bind(step.step_num)
        .fetch_one(&self.pool)
        .await?;

        Ok(id.0)
    }

    async fn update_recipe_step(&self, step: &RecipeStep) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"UPDATE recipe_steps SET name = $1, description = $2, step_num = $3
               WHERE id = $4 AND author_id = $5"#,
        )
        .bind(&step.name)
        .bind(&step.description)
        .bind(step.step_num)
        .bind(step.id)
        .bind(step.author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_recipe_step(&self, id: Uuid) -> Result<Option<RecipeStep>, StoreError> {
        let step = sqlx::query_as::<_, RecipeStep>(
            r#"SELECT id, recipe_id, author_id, name, description, step_num
               FROM recipe_steps WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(step)
    }

    /// get_keywords
    ///
    /// The persisted half of the banned keyword set.
    async fn get_keywords(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT word FROM keywords")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(word,)| word).collect())
    }
}
