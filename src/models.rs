use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Identity ---

/// Role
///
/// The role claim carried by every token. Serialized lowercase ("user" / "admin")
/// both in tokens and in the `role` column of the credentials table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Credential
///
/// The persisted identity record. Only the argon2 hash is ever stored; the hash is
/// compared exclusively through `PasswordHasher::verify`.
#[derive(Clone)]
pub struct Credential {
    pub id: Uuid,
    pub username: String,
    pub hashed_password: String,
    pub role: Role,
}

// Keep the hash out of any log line.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("hashed_password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// NewCredential
///
/// What the auth service hands to the credential store on signup.
#[derive(Clone)]
pub struct NewCredential {
    pub username: String,
    pub hashed_password: String,
    pub role: Role,
}

// --- Content (mapped to database) ---

/// Salad
///
/// A recipe card. `name` and `description` are free text and pass through the
/// validation pipeline on every create/update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Salad {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub description: String,
}

/// RecipeStep
///
/// A single numbered step of a recipe. Same free-text fields as `Salad`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct RecipeStep {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub description: String,
    pub step_num: i32,
}

// --- Request Payloads (Input Schemas) ---

/// SignUpRequest
///
/// Input payload for POST /signup. The plaintext password lives only in this DTO.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
}

/// CreateUserRequest
///
/// Admin variant of signup (POST /admin/users) with an explicit role.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// LogInRequest
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LogInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SaladRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RecipeStepRequest {
    pub recipe_id: Uuid,
    pub name: String,
    pub description: String,
    pub step_num: i32,
}

// --- Responses ---

/// TokenResponse
///
/// Returned by login and signup. The token goes into `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// MeResponse
///
/// The verified claims of the caller (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MeResponse {
    pub id: Uuid,
    pub role: Role,
    #[ts(type = "string")]
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
}
