use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users whose stored role is
/// 'admin': the moderation queue and the approval switch.
///
/// Access Control:
/// This router is wrapped in the same authentication layer as the
/// authenticated module, and every handler re-checks the 'admin' role against
/// the store-resolved identity before touching data. There is exactly one
/// entry point per operation; no unauthenticated variant exists.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/pending-users
        // Lists every user still awaiting approval, oldest registration first.
        .route("/pending-users", get(handlers::list_pending_users))
        // PUT /admin/approve/{id}
        // Flips a user from pending to approved, admitting them to the public
        // listing. The transition is one-way.
        .route("/approve/{id}", put(handlers::approve_user))
}
