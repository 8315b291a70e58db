use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    interactor::{ContentEntity, ContentService},
    models::{RecipeStep, Salad},
    repository::RecipeStoreState,
};

impl ContentEntity for Salad {
    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str()), ("description", self.description.as_str())]
    }
}

impl ContentEntity for RecipeStep {
    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str()), ("description", self.description.as_str())]
    }
}

/// SaladService
///
/// Plain entity service: input checks, then the store. No content validation here;
/// that is the interactor's job.
pub struct SaladService {
    store: RecipeStoreState,
}

impl SaladService {
    pub fn new(store: RecipeStoreState) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ContentService<Salad> for SaladService {
    async fn create(&self, salad: Salad) -> AppResult<Uuid> {
        if salad.name.trim().is_empty() {
            return Err(AppError::InvalidInput("salad name must not be empty".into()));
        }
        Ok(self.store.create_salad(&salad).await?)
    }

    async fn update(&self, salad: Salad) -> AppResult<()> {
        if salad.name.trim().is_empty() {
            return Err(AppError::InvalidInput("salad name must not be empty".into()));
        }
        if self.store.update_salad(&salad).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Salad> {
        self.store.get_salad(id).await?.ok_or(AppError::NotFound)
    }
}

/// RecipeStepService
pub struct RecipeStepService {
    store: RecipeStoreState,
}

impl RecipeStepService {
    pub fn new(store: RecipeStoreState) -> Self {
        Self { store }
    }

    fn check(step: &RecipeStep) -> AppResult<()> {
        if step.name.trim().is_empty() {
            return Err(AppError::InvalidInput("step name must not be empty".into()));
        }
        if step.step_num < 1 {
            return Err(AppError::InvalidInput("step number must be positive".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentService<RecipeStep> for RecipeStepService {
    async fn create(&self, step: RecipeStep) -> AppResult<Uuid> {
        Self::check(&step)?;
        Ok(self.store.create_recipe_step(&step).await?)
    }

    async fn update(&self, step: RecipeStep) -> AppResult<()> {
        Self::check(&step)?;
        if self.store.update_recipe_step(&step).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<RecipeStep> {
        self.store.get_recipe_step(id).await?.ok_or(AppError::NotFound)
    }
}
