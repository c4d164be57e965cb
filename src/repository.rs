use crate::error::RepoError;
use crate::models::{NewUser, User, UserStatus};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository
///
/// Defines the abstract contract for all persistence operations on user records.
/// Handlers interact with the data layer through this trait without knowing the
/// concrete implementation (Postgres in production, in-memory in tests).
///
/// Every operation touches at most one record. A missing record is reported as
/// `Ok(None)`; `Err(RepoError)` is reserved for infrastructure failures, which
/// keeps "not found" and "store unreachable" distinct all the way up the stack.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Lookup ---
    // Email lookups expect the caller to have lowercased the key.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    // --- Listings ---
    // The public listing must only ever contain approved users.
    async fn find_approved(&self) -> Result<Vec<User>, RepoError>;
    // The moderation queue, oldest registration first.
    async fn find_pending(&self) -> Result<Vec<User>, RepoError>;

    // --- Writes ---
    async fn insert_user(&self, new_user: NewUser) -> Result<User, RepoError>;
    // Persists the profile fields of an existing record (name, email, password
    // hash, age, picture, role). Crimes and status have their own operations
    // below and are never written through this path.
    async fn update_user(&self, user: &User) -> Result<Option<User>, RepoError>;

    // --- Crime list ---
    // Both mutations are single atomic statements at the store level, so two
    // concurrent writers on the same user cannot lose an update.
    async fn append_crime(&self, id: Uuid, crime: &str) -> Result<Option<Vec<String>>, RepoError>;
    // Removes the first exact match. `Ok(None)` means the user does not exist
    // or the crime was not present; the caller disambiguates.
    async fn remove_crime(&self, id: Uuid, crime: &str) -> Result<Option<Vec<String>>, RepoError>;

    // --- Moderation ---
    // One-way transition to `approved`. Idempotent for already-approved users.
    async fn approve_user(&self, id: Uuid) -> Result<Option<User>, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// Column list shared by every SELECT/RETURNING on the users table.
const USER_COLUMNS: &str = "id, name, email, password_hash, age, profile_picture_url, role, \
                            crimes, status, created_at, updated_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Queries use runtime-checked bindings (`query_as::<_, User>`), so the crate
/// builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn find_approved(&self) -> Result<Vec<User>, RepoError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE status = $1 ORDER BY created_at DESC"
        ))
        .bind(UserStatus::Approved)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_pending(&self) -> Result<Vec<User>, RepoError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE status = $1 ORDER BY created_at ASC"
        ))
        .bind(UserStatus::Pending)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// insert_user
    ///
    /// Inserts a new record with a fresh UUID and server-assigned timestamps.
    /// The unique index on `email` is the last line of defense behind the
    /// handler's check-then-insert; a violation surfaces as
    /// `RepoError::DuplicateEmail` rather than a generic store error.
    async fn insert_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        let id = Uuid::new_v4();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash, age, profile_picture_url, role, \
                                crimes, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, '{{}}', $8, NOW(), NOW()) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.age)
        .bind(&new_user.profile_picture_url)
        .bind(&new_user.role)
        .bind(new_user.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                RepoError::DuplicateEmail
            } else {
                RepoError::Store(e)
            }
        })?;
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<Option<User>, RepoError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET name = $2, email = $3, password_hash = $4, age = $5, \
                 profile_picture_url = $6, role = $7, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.age)
        .bind(&user.profile_picture_url)
        .bind(&user.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                RepoError::DuplicateEmail
            } else {
                RepoError::Store(e)
            }
        })?;
        Ok(updated)
    }

    /// append_crime
    ///
    /// Single-statement array append; the row is read and written in one
    /// atomic UPDATE.
    async fn append_crime(&self, id: Uuid, crime: &str) -> Result<Option<Vec<String>>, RepoError> {
        let crimes: Option<(Vec<String>,)> = sqlx::query_as(
            "UPDATE users \
             SET crimes = array_append(crimes, $2), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING crimes",
        )
        .bind(id)
        .bind(crime)
        .fetch_optional(&self.pool)
        .await?;
        Ok(crimes.map(|row| row.0))
    }

    /// remove_crime
    ///
    /// Drops the first exact occurrence by splicing around `array_position`.
    /// The WHERE clause makes the statement a no-op when the value is absent,
    /// so an affected row always means a removal happened.
    async fn remove_crime(&self, id: Uuid, crime: &str) -> Result<Option<Vec<String>>, RepoError> {
        let crimes: Option<(Vec<String>,)> = sqlx::query_as(
            "UPDATE users \
             SET crimes = crimes[1:array_position(crimes, $2) - 1] \
                       || crimes[array_position(crimes, $2) + 1:], \
                 updated_at = NOW() \
             WHERE id = $1 AND array_position(crimes, $2) IS NOT NULL \
             RETURNING crimes",
        )
        .bind(id)
        .bind(crime)
        .fetch_optional(&self.pool)
        .await?;
        Ok(crimes.map(|row| row.0))
    }

    async fn approve_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET status = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(UserStatus::Approved)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
