use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use error::AppError;
pub use repository::{PostgresRepository, RepositoryState};

use crate::models::{NewUser, UserStatus};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::logout,
        handlers::list_users, handlers::get_user, handlers::update_profile,
        handlers::list_crimes, handlers::add_crime, handlers::remove_crime,
        handlers::list_pending_users, handlers::approve_user
    ),
    components(
        schemas(
            models::PublicUser, models::UserStatus, models::RegisterRequest,
            models::LoginRequest, models::UpdateProfileRequest, models::CrimeRequest,
            models::AuthResponse, models::MessageResponse, models::PublicUsersResponse,
            models::PendingUsersResponse, models::ApproveResponse, models::ProfileResponse,
            models::CrimesResponse,
        )
    ),
    tags(
        (name = "mental-group", description = "Mental Group API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding the application's
/// services and configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: abstracts all access to the user store.
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow extractors to selectively pull components from
// the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the authenticated and admin route groups.
///
/// *Mechanism*: It attempts to extract `AuthUser` from the request. Since
/// `AuthUser` implements `FromRequestParts`, a missing cookie rejects the
/// request with 401 and a failed verification with 403 before the handler
/// runs. On success the request proceeds unchanged.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// seed_admin
///
/// Startup-time admin provisioning. The public API unconditionally refuses the
/// "admin" role, so an administrator account can only enter the system here,
/// from `ADMIN_EMAIL`/`ADMIN_PASSWORD` configuration. Idempotent: if the email
/// is already registered nothing is written. Seeded admins are created
/// directly in `approved` status.
pub async fn seed_admin(repo: &RepositoryState, config: &AppConfig) -> Result<(), AppError> {
    let (Some(email), Some(password)) =
        (config.admin_email.as_ref(), config.admin_password.as_ref())
    else {
        tracing::debug!("admin seeding skipped: no admin credentials configured");
        return Ok(());
    };

    let email = email.trim().to_lowercase();
    if repo.find_by_email(&email).await?.is_some() {
        tracing::debug!(email = %email, "admin seeding skipped: account already exists");
        return Ok(());
    }

    let password_hash = auth::hash_password(password)?;
    let user = repo
        .insert_user(NewUser {
            name: config
                .admin_name
                .clone()
                .unwrap_or_else(|| "Administrator".to_string()),
            email,
            password_hash,
            age: 18,
            profile_picture_url: None,
            role: Some("admin".to_string()),
            status: UserStatus::Approved,
        })
        .await?;

    tracing::info!(user_id = %user.id, "admin account seeded");
    Ok(())
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    // The session travels in a cookie, so responses must carry
    // Access-Control-Allow-Credentials and a concrete origin; a wildcard
    // origin is rejected by browsers for credentialed requests.
    let origin = state
        .config
        .frontend_origin
        .parse::<HeaderValue>()
        .expect("FATAL: FRONTEND_ORIGIN is not a valid header value");
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated routes: protected by the `auth_middleware`.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: nested under '/admin', behind the same authentication
        // layer. The 'admin' role check is performed inside the handlers after
        // the request passes this layer.
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle in a
                // tracing span carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation: returns the x-request-id header to
                // the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer.
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation. It extracts the
/// `x-request-id` header (if present) and includes it in the structured
/// logging metadata alongside the HTTP method and URI, so every log line for a
/// single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
