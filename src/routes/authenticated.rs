use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user with a valid session cookie:
/// profile updates and the personal crime list.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module. The crime handlers then
/// compare the resolved identity against the path id, so one user can never
/// read or mutate another user's list no matter how valid their token is.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // PUT /user/update
        // Applies a partial profile update. Provided fields only; the "admin"
        // role remains unassignable.
        .route("/user/update", put(handlers::update_profile))
        // GET/POST/DELETE /user/{id}/crimes
        // Owner-only operations on the personal crime list. Append and remove
        // are atomic at the store level.
        .route(
            "/user/{id}/crimes",
            get(handlers::list_crimes)
                .post(handlers::add_crime)
                .delete(handlers::remove_crime),
        )
}
