use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// These routes carry the identity flow (register, login, logout) plus the
/// read-only listings that have been explicitly marked as public.
///
/// Security Mandate:
/// The listing handlers must only release approved users, and every user that
/// leaves this module is projected through `PublicUser` so the password hash
/// stays inside the store.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /user/register
        // Creates a pending account and sets the session cookie. Rejects duplicate
        // emails and any attempt to claim the reserved "admin" role.
        .route("/user/register", post(handlers::register))
        // POST /user/login
        // Verifies credentials and refreshes the session cookie.
        .route("/user/login", post(handlers::login))
        // POST /auth/logout
        // Clears the session cookie. No server-side session state exists.
        .route("/auth/logout", post(handlers::logout))
        // GET /users
        // Lists all approved users together with their crime lists.
        .route("/users", get(handlers::list_users))
        // GET /user/{id}
        // Retrieves a single user's public view.
        .route("/user/{id}", get(handlers::get_user))
}
