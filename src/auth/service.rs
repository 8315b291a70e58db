use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth::{password::PasswordHasher, token::TokenService},
    error::{AppError, AppResult, StoreError},
    models::{NewCredential, Role},
    repository::CredentialStoreState,
};

/// AuthService
///
/// Orchestrates signup and login. This is the only path that creates a credential.
/// Hashing and verification run on the blocking pool so a slow KDF never stalls
/// the async workers.
#[derive(Clone)]
pub struct AuthService {
    store: CredentialStoreState,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    // Verified against on unknown usernames so both failure paths cost one KDF run.
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        store: CredentialStoreState,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
    ) -> AppResult<Self> {
        let dummy_secret = Uuid::new_v4().to_string();
        let dummy_hash = hasher.hash(&dummy_secret)?;

        Ok(Self {
            store,
            hasher,
            tokens,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// sign_up
    ///
    /// Hashes the password, persists `{username, hash, role}` and issues a token for the
    /// new identity. Persistence and issuance are not transactional: if signing fails
    /// after the insert, the account exists and the caller logs in again.
    pub async fn sign_up(&self, username: &str, password: &str, role: Role) -> AppResult<String> {
        tracing::info!(username = %username, role = %role, "sign up");
        require_non_empty(username, password)?;

        let hasher = self.hasher.clone();
        let plaintext = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))??;

        let id = self
            .store
            .insert(NewCredential {
                username: username.to_owned(),
                hashed_password,
                role,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict => {
                    tracing::warn!(username = %username, "sign up: username taken");
                    AppError::UsernameTaken
                }
                other => AppError::from(other),
            })?;

        self.tokens.issue(id, role)
    }

    /// log_in
    ///
    /// Verifies the password against the stored hash and issues a token carrying the
    /// stored role. An unknown username still pays for one hash verification, so the
    /// two failure kinds are indistinguishable by timing and by response body.
    pub async fn log_in(&self, username: &str, password: &str) -> AppResult<String> {
        tracing::info!(username = %username, "log in");
        require_non_empty(username, password)?;

        let credential = self.store.find_by_username(username).await?;

        let stored_hash = match &credential {
            Some(c) => c.hashed_password.clone(),
            None => self.dummy_hash.to_string(),
        };

        let hasher = self.hasher.clone();
        let plaintext = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("verify task failed: {e}")))?;

        match credential {
            Some(c) if verified => self.tokens.issue(c.id, c.role),
            Some(_) => Err(AppError::InvalidCredentials),
            None => Err(AppError::UserNotFound),
        }
    }
}

fn require_non_empty(username: &str, password: &str) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::InvalidInput("username must not be empty".into()));
    }
    if password.is_empty() {
        return Err(AppError::InvalidInput("password must not be empty".into()));
    }
    Ok(())
}
