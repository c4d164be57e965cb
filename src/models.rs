use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// UserStatus
///
/// Moderation state of an account. Every self-registered user starts as `Pending`
/// and becomes visible in the public listing only after an administrator flips the
/// record to `Approved`. The transition is one-way.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UserStatus {
    #[default]
    Pending,
    Approved,
}

/// User
///
/// The canonical account record stored in the `users` table. This is the internal
/// representation and includes the password hash; it is never serialized to the
/// wire. Responses go through [`PublicUser`] instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // Login key. Stored lowercased; unique across all users.
    pub email: String,
    // Argon2 PHC string. Never the plaintext password.
    pub password_hash: String,
    pub age: i32,
    pub profile_picture_url: Option<String>,
    // Free-text role. The literal "admin" is privileged and cannot be set
    // through the public API.
    pub role: Option<String>,
    // Personal list of short text entries. Insertion order preserved,
    // duplicates allowed.
    pub crimes: Vec<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PublicUser
///
/// The public projection of a [`User`]: every field except the password hash.
/// All API responses that carry a user carry this shape. Field names follow the
/// frontend's camelCase convention.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub profile_picture_url: Option<String>,
    pub role: Option<String>,
    pub crimes: Vec<String>,
    pub status: UserStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    // Strips the password hash; everything else passes through.
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
            age: user.age,
            profile_picture_url: user.profile_picture_url,
            role: user.role,
            crimes: user.crimes,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// NewUser
///
/// Input to the repository insert. The id and timestamps are assigned at write
/// time; everything else is decided by the caller (handler or admin seeding).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
    pub profile_picture_url: Option<String>,
    pub role: Option<String>,
    pub status: UserStatus,
}

/// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /user/register).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
    pub profile_picture_url: Option<String>,
    pub role: Option<String>,
}

/// LoginRequest
///
/// Input payload for POST /user/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// UpdateProfileRequest
///
/// Partial update payload for PUT /user/update. Every field except `id` is
/// independently optional and applied field-by-field; absent fields leave the
/// stored value untouched. A provided password is re-hashed before persisting.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProfileRequest {
    pub id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// CrimeRequest
///
/// Body for crime append/remove operations. The text is matched by exact string
/// equality on removal.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CrimeRequest {
    pub crime: String,
}

/// --- Response Envelopes (Output Schemas) ---

/// AuthResponse
///
/// Returned by register and login. The session token also travels in the
/// `token` cookie; login additionally echoes it in the body, matching the
/// behavior the frontend already relies on.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user: PublicUser,
}

/// MessageResponse
///
/// Minimal `{ "message": ... }` envelope, used by logout.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// PublicUsersResponse
///
/// Envelope for GET /users: all approved users with their crime lists.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PublicUsersResponse {
    pub success: bool,
    pub users: Vec<PublicUser>,
}

/// PendingUsersResponse
///
/// Envelope for GET /admin/pending-users.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PendingUsersResponse {
    pub users: Vec<PublicUser>,
}

/// ApproveResponse
///
/// Envelope for PUT /admin/approve/{id}: the freshly approved record.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApproveResponse {
    pub user: PublicUser,
}

/// ProfileResponse
///
/// Envelope for PUT /user/update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfileResponse {
    pub message: String,
    pub user: PublicUser,
}

/// CrimesResponse
///
/// Envelope for the crime list operations. `message` is present on mutations
/// and omitted on plain reads.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CrimesResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub crimes: Vec<String>,
}
