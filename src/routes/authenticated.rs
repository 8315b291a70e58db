use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every handler here receives an `AuthUser` populated by the gate. Content writes
/// go through the content interactors, so text is validated before it is stored.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // POST /salads
        .route("/salads", post(handlers::create_salad))
        // PUT /salads/{id}
        // Owner-Only update; rows owned by someone else are reported as 404.
        .route("/salads/{id}", put(handlers::update_salad))
        // POST /recipe-steps
        .route("/recipe-steps", post(handlers::create_recipe_step))
        // PUT /recipe-steps/{id}
        .route("/recipe-steps/{id}", put(handlers::update_recipe_step))
}
