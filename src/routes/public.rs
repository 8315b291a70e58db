use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints. Reads here go straight to the services; nothing in this
/// router writes user content.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /signup
        // Always creates a `user`; returns a token for the new account.
        .route("/signup", post(handlers::sign_up))
        // POST /login
        .route("/login", post(handlers::log_in))
        // GET /salads/{id}
        .route("/salads/{id}", get(handlers::get_salad))
        // GET /recipe-steps/{id}
        .route("/recipe-steps/{id}", get(handlers::get_recipe_step))
}
