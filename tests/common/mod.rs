#![allow(dead_code)]

use async_trait::async_trait;
use recipe_gate::{
    AppConfig, AppState, PasswordHasher,
    error::StoreError,
    models::{Credential, NewCredential, RecipeStep, Salad},
    repository::{CredentialStore, CredentialStoreState, RecipeStore, RecipeStoreState},
    validation::{DnsResolver, HostResolver},
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use uuid::Uuid;

// Argon2 costs small enough to keep the suite fast.
pub const TEST_MEMORY_KIB: u32 = 1024;
pub const TEST_ITERATIONS: u32 = 1;

pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_costs(TEST_MEMORY_KIB, TEST_ITERATIONS).unwrap()
}

pub fn test_config() -> AppConfig {
    AppConfig {
        argon2_memory_kib: TEST_MEMORY_KIB,
        argon2_iterations: TEST_ITERATIONS,
        ..AppConfig::default()
    }
}

// --- In-Memory Credential Store ---

#[derive(Default)]
pub struct MemoryCredentialStore {
    pub users: Mutex<HashMap<String, Credential>>,
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    async fn insert(&self, credential: NewCredential) -> Result<Uuid, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&credential.username) {
            return Err(StoreError::Conflict);
        }
        let id = Uuid::new_v4();
        users.insert(
            credential.username.clone(),
            Credential {
                id,
                username: credential.username,
                hashed_password: credential.hashed_password,
                role: credential.role,
            },
        );
        Ok(id)
    }
}

// --- In-Memory Recipe Store ---

// Counts writes so tests can prove a rejected entity never reached the store.
#[derive(Default)]
pub struct MemoryRecipeStore {
    pub salads: Mutex<HashMap<Uuid, Salad>>,
    pub steps: Mutex<HashMap<Uuid, RecipeStep>>,
    pub keywords: Vec<String>,
    pub writes: AtomicUsize,
}

impl MemoryRecipeStore {
    pub fn with_keywords(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn create_salad(&self, salad: &Salad) -> Result<Uuid, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let id = Uuid::new_v4();
        let stored = Salad {
            id,
            ..salad.clone()
        };
        self.salads.lock().unwrap().insert(id, stored);
        Ok(id)
    }

    async fn update_salad(&self, salad: &Salad) -> Result<bool, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut salads = self.salads.lock().unwrap();
        match salads.get_mut(&salad.id) {
            Some(existing) if existing.author_id == salad.author_id => {
                existing.name = salad.name.clone();
                existing.description = salad.description.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_salad(&self, id: Uuid) -> Result<Option<Salad>, StoreError> {
        Ok(self.salads.lock().unwrap().get(&id).cloned())
    }

    async fn create_recipe_step(&self, step: &RecipeStep) -> Result<Uuid, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let id = Uuid::new_v4();
        let stored = RecipeStep {
            id,
            ..step.clone()
        };
        self.steps.lock().unwrap().insert(id, stored);
        Ok(id)
    }

    async fn update_recipe_step(&self, step: &RecipeStep) -> Result<bool, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut steps = self.steps.lock().unwrap();
        match steps.get_mut(&step.id) {
            Some(existing) if existing.author_id == step.author_id => {
                *existing = step.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_recipe_step(&self, id: Uuid) -> Result<Option<RecipeStep>, StoreError> {
        Ok(self.steps.lock().unwrap().get(&id).cloned())
    }

    async fn get_keywords(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.keywords.clone())
    }
}

/// Full state over in-memory stores, plus a handle on the recipe store for assertions.
pub fn build_state(config: AppConfig) -> (AppState, Arc<MemoryRecipeStore>) {
    build_state_with_resolver(config, Arc::new(DnsResolver))
}

pub fn build_state_with_resolver(
    config: AppConfig,
    resolver: Arc<dyn HostResolver>,
) -> (AppState, Arc<MemoryRecipeStore>) {
    let credentials = Arc::new(MemoryCredentialStore::default()) as CredentialStoreState;
    let recipes = Arc::new(MemoryRecipeStore::default());
    let state = AppState::build_with_resolver(
        config,
        credentials,
        recipes.clone() as RecipeStoreState,
        vec![],
        resolver,
    )
    .unwrap();
    (state, recipes)
}
