use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    validation::{Outcome, Validator},
};

/// ContentEntity
///
/// An entity whose free-text fields must pass validation before being written.
pub trait ContentEntity: Send + Sync + 'static {
    /// `(field name, text)` pairs, in the order they are validated.
    fn text_fields(&self) -> Vec<(&'static str, &str)>;
}

/// ContentService
///
/// The narrow write/read capability the interactor decorates. Plain entity services
/// and the interactor itself both implement it, so handlers never know whether
/// validation sits in front of the store.
#[async_trait]
pub trait ContentService<E: ContentEntity>: Send + Sync {
    async fn create(&self, entity: E) -> AppResult<Uuid>;
    async fn update(&self, entity: E) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<E>;
}

pub type ValidatorList = Vec<Arc<dyn Validator>>;

/// ContentInteractor
///
/// Runs an ordered list of validators over an entity's text before every create and
/// update, then delegates to the wrapped service unchanged. The first rejection
/// short-circuits: later validators do not run and the wrapped service is not called.
/// Reads pass straight through.
pub struct ContentInteractor<E: ContentEntity> {
    service: Arc<dyn ContentService<E>>,
    validators: ValidatorList,
}

impl<E: ContentEntity> ContentInteractor<E> {
    pub fn new(service: Arc<dyn ContentService<E>>, validators: ValidatorList) -> Self {
        Self {
            service,
            validators,
        }
    }

    /// Fields outer, validators inner, both in configured order.
    async fn validate(&self, entity: &E) -> AppResult<()> {
        for (field, text) in entity.text_fields() {
            for validator in &self.validators {
                match validator.check(text).await {
                    Outcome::Valid => {}
                    Outcome::Invalid { reason } => {
                        tracing::info!(field, validator = validator.name(), reason = %reason, "content rejected");
                        return Err(AppError::ValidationFailed(format!("{field}: {reason}")));
                    }
                    Outcome::TimedOut => {
                        tracing::warn!(field, validator = validator.name(), "content validation timed out");
                        return Err(AppError::ValidatorTimeout);
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<E: ContentEntity> ContentService<E> for ContentInteractor<E> {
    async fn create(&self, entity: E) -> AppResult<Uuid> {
        self.validate(&entity).await?;
        self.service.create(entity).await
    }

    async fn update(&self, entity: E) -> AppResult<()> {
        self.validate(&entity).await?;
        self.service.update(entity).await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<E> {
        self.service.get_by_id(id).await
    }
}
