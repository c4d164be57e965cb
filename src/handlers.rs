use crate::{
    AppState,
    auth::{
        AuthUser, SessionKeys, clear_session_cookie, hash_password, is_valid_email,
        session_cookie, verify_password,
    },
    error::AppError,
    models::{
        ApproveResponse, AuthResponse, CrimeRequest, CrimesResponse, LoginRequest,
        MessageResponse, NewUser, PendingUsersResponse, ProfileResponse, PublicUser,
        PublicUsersResponse, RegisterRequest, UpdateProfileRequest, UserStatus,
    },
};
use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use tracing::{info, warn};
use uuid::Uuid;

/// require_admin
///
/// Shared guard for the admin handlers. The role comes from the store via the
/// `AuthUser` extractor, so a token issued before a role change cannot smuggle
/// stale privileges.
fn require_admin(auth: &AuthUser) -> Result<(), AppError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied. Admins only.".to_string()))
    }
}

// --- User Service ---

/// register
///
/// [Public Route] Creates a new account in `pending` status, issues a session
/// token and sets it as the `token` cookie.
///
/// Rejections: invalid input (400), duplicate email (400), and any attempt to
/// claim the "admin" role (400); admin accounts only exist via startup seeding.
#[utoipa::path(
    post,
    path = "/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input, duplicate email, or reserved role")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "register rejected: invalid email");
        return Err(AppError::Validation("Invalid email".to_string()));
    }

    if payload.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    if state.repo.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "register rejected: email already registered");
        return Err(AppError::DuplicateEmail);
    }

    if payload.role.as_deref() == Some("admin") {
        warn!(email = %email, "register rejected: reserved role");
        return Err(AppError::AdminReservation);
    }

    let password_hash = hash_password(&payload.password)?;

    let user = state
        .repo
        .insert_user(NewUser {
            name,
            email,
            password_hash,
            age: payload.age.unwrap_or(18),
            profile_picture_url: payload.profile_picture_url,
            role: payload.role,
            status: UserStatus::Pending,
        })
        .await?;

    let keys = SessionKeys::from_ref(&state);
    let token = keys.issue(user.id)?;
    let jar = jar.add(session_cookie(token, keys.ttl));

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token: None,
            user: user.into(),
        }),
    ))
}

/// login
///
/// [Public Route] Verifies credentials and issues a fresh session token,
/// delivered both as the `token` cookie and in the response body.
#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Wrong password"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = payload.email.trim().to_lowercase();

    let user = state.repo.find_by_email(&email).await?.ok_or_else(|| {
        warn!(email = %email, "login unknown email");
        AppError::NotFound(
            "Mental you are not registered please a create new account to become a mental."
                .to_string(),
        )
    })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::BadCredentials);
    }

    let keys = SessionKeys::from_ref(&state);
    let token = keys.issue(user.id)?;
    let jar = jar.add(session_cookie(token.clone(), keys.ttl));

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            token: Some(token),
            user: user.into(),
        }),
    ))
}

/// logout
///
/// [Public Route] Clears the session cookie. Tokens are stateless, so there is
/// no server-side session to tear down; an already-issued token keeps verifying
/// until its expiry.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        clear_session_cookie(jar),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// list_users
///
/// [Public Route] Lists all approved users with their crime lists. Pending
/// users never appear here; approval is the gate into the public listing.
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "Approved users", body = PublicUsersResponse))
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<PublicUsersResponse>, AppError> {
    let users = state.repo.find_approved().await?;
    Ok(Json(PublicUsersResponse {
        success: true,
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}

/// get_user
///
/// [Public Route] Retrieves a single user by id, always projected through
/// [`PublicUser`] so the password hash cannot leave the store.
#[utoipa::path(
    get,
    path = "/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = PublicUser),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user.into()))
}

/// update_profile
///
/// [Authenticated Route] Applies a partial profile update. Only the fields
/// present in the payload are touched; the email is re-normalized and checked
/// against other accounts, and a provided password is re-hashed. The "admin"
/// role stays unassignable here, same as at registration.
#[utoipa::path(
    put,
    path = "/user/update",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated", body = ProfileResponse),
        (status = 400, description = "Invalid input or reserved role"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn update_profile(
    AuthUser { .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if payload.role.as_deref() == Some("admin") {
        return Err(AppError::AdminReservation);
    }

    let mut user = state
        .repo
        .find_by_id(payload.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
        user.name = name;
    }

    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Invalid email".to_string()));
        }
        if email != user.email && state.repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }
        user.email = email;
    }

    if let Some(age) = payload.age {
        user.age = age;
    }

    if let Some(url) = payload.profile_picture_url {
        user.profile_picture_url = Some(url);
    }

    if let Some(role) = payload.role {
        user.role = Some(role);
    }

    if let Some(password) = payload.password {
        if password.is_empty() {
            return Err(AppError::Validation("Password cannot be empty".to_string()));
        }
        user.password_hash = hash_password(&password)?;
    }

    let updated = state
        .repo
        .update_user(&user)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: updated.into(),
    }))
}

// --- Crime List Service ---

/// list_crimes
///
/// [Authenticated Route] Reads a user's crime list. Only the owning identity
/// may read it; any other authenticated user is rejected outright.
#[utoipa::path(
    get,
    path = "/user/{id}/crimes",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Crimes", body = CrimesResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn list_crimes(
    AuthUser { id: requester, .. }: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CrimesResponse>, AppError> {
    if requester != user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let user = state
        .repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(CrimesResponse {
        message: None,
        crimes: user.crimes,
    }))
}

/// add_crime
///
/// [Authenticated Route] Appends one entry to the caller's own crime list and
/// returns the new full list. The append is a single atomic statement at the
/// store, so concurrent additions cannot overwrite each other.
#[utoipa::path(
    post,
    path = "/user/{id}/crimes",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = CrimeRequest,
    responses(
        (status = 201, description = "Added", body = CrimesResponse),
        (status = 400, description = "Empty crime text"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn add_crime(
    AuthUser { id: requester, .. }: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CrimeRequest>,
) -> Result<(StatusCode, Json<CrimesResponse>), AppError> {
    if requester != user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    if payload.crime.trim().is_empty() {
        return Err(AppError::Validation("Invalid crime description".to_string()));
    }

    let crimes = state
        .repo
        .append_crime(user_id, &payload.crime)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    info!(user_id = %user_id, "crime added");
    Ok((
        StatusCode::CREATED,
        Json(CrimesResponse {
            message: Some("Crime added successfully".to_string()),
            crimes,
        }),
    ))
}

/// remove_crime
///
/// [Authenticated Route] Removes the first exact occurrence of the given text
/// from the caller's own list. Removing a value that is not present is an
/// error and leaves the list untouched.
#[utoipa::path(
    delete,
    path = "/user/{id}/crimes",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = CrimeRequest,
    responses(
        (status = 200, description = "Removed", body = CrimesResponse),
        (status = 400, description = "Empty crime text"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Unknown user or crime")
    )
)]
pub async fn remove_crime(
    AuthUser { id: requester, .. }: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CrimeRequest>,
) -> Result<Json<CrimesResponse>, AppError> {
    if requester != user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    if payload.crime.trim().is_empty() {
        return Err(AppError::Validation("Invalid crime description".to_string()));
    }

    let removed = state.repo.remove_crime(user_id, &payload.crime).await?;
    let crimes = match removed {
        Some(crimes) => crimes,
        // The atomic removal reports "nothing removed" for both a missing user
        // and a missing crime; one extra read tells them apart.
        None => {
            return match state.repo.find_by_id(user_id).await? {
                Some(_) => Err(AppError::NotFound("Crime not found".to_string())),
                None => Err(AppError::NotFound("User not found".to_string())),
            };
        }
    };

    info!(user_id = %user_id, "crime removed");
    Ok(Json(CrimesResponse {
        message: Some("Crime removed successfully".to_string()),
        crimes,
    }))
}

// --- Admin Service ---

/// list_pending_users
///
/// [Admin Route] The moderation queue: every user still awaiting approval,
/// oldest registration first.
#[utoipa::path(
    get,
    path = "/admin/pending-users",
    responses(
        (status = 200, description = "Pending users", body = PendingUsersResponse),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_pending_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PendingUsersResponse>, AppError> {
    require_admin(&auth)?;

    let users = state.repo.find_pending().await?;
    Ok(Json(PendingUsersResponse {
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}

/// approve_user
///
/// [Admin Route] Flips a user from `pending` to `approved`, which admits them
/// to the public listing. The transition is one-way; re-approving an already
/// approved user is a no-op that still returns the record.
#[utoipa::path(
    put,
    path = "/admin/approve/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Approved", body = ApproveResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn approve_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApproveResponse>, AppError> {
    require_admin(&auth)?;

    let user = state
        .repo
        .approve_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    info!(user_id = %user.id, approved_by = %auth.id, "user approved");
    Ok(Json(ApproveResponse { user: user.into() }))
}
