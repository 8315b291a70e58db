use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Routes exclusively for the `admin` role. The role is enforced by the gate layer
/// before any handler here runs; a valid `user` token gets 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/keywords
        // The banned keyword set the running keyword validator holds.
        .route("/keywords", get(handlers::get_keywords))
        // POST /admin/users
        // Creates an account with an explicit role.
        .route("/users", post(handlers::create_user))
}
