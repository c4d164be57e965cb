use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{AppState, error::AppError, repository::RepositoryState};

/// Name of the session cookie carried by the browser.
pub const SESSION_COOKIE: &str = "token";

/// Claims
///
/// The payload structure signed into every session token. The signature and the
/// embedded expiry are the only session state anywhere; there is no server-side
/// session table, so logout is purely client-side cookie removal and a stolen
/// token stays valid until its natural expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user this token authenticates.
    pub sub: Uuid,
    /// Expiration time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Issued at (iat): timestamp when the token was signed.
    pub iat: usize,
}

/// SessionKeys
///
/// Holds the signing/verification keys and the token lifetime. Built from the
/// application config on demand via `FromRef`, so any handler can issue or
/// verify tokens without threading the secret around.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::new(
            &state.config.jwt_secret,
            state.config.session_ttl_minutes,
        )
    }
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_minutes.max(0) as u64) * 60),
        }
    }

    /// issue
    ///
    /// Signs a token embedding the user id with an absolute expiry of `ttl`
    /// from now.
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + self.ttl.as_secs() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, "session token signing failed");
            AppError::Internal
        })?;
        debug!(user_id = %user_id, "session token issued");
        Ok(token)
    }

    /// verify
    ///
    /// Validates signature and expiry. Leeway is zero: a token is rejected the
    /// second its embedded expiry passes.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// session_cookie
///
/// Builds the HTTP-only, secure, cross-site session cookie the frontend stores.
/// Max-Age matches the token lifetime so the browser drops the cookie around
/// the same time the token stops verifying.
pub fn session_cookie(token: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(time::Duration::seconds(ttl.as_secs() as i64))
        .build()
}

/// clear_session_cookie
///
/// Adds a removal cookie for the session. The path must match the one the
/// cookie was set with or browsers keep the original.
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// hash_password
///
/// Salted, irreversible argon2 hash in PHC string format.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AppError::Internal
        })?
        .to_string();
    Ok(hash)
}

/// verify_password
///
/// A malformed stored hash is an internal error, not a failed login.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        AppError::Internal
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the user's id plus their
/// current role as stored, which admin handlers check against "admin".
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function
/// argument in any authenticated handler.
///
/// The process:
/// 1. Read the session token from the `token` cookie. Missing cookie means the
///    request is unauthenticated (401).
/// 2. Verify signature and expiry. Any failure is a forbidden request (403).
/// 3. Load the user from the store. A token whose subject no longer exists is
///    treated the same as an invalid token, and the lookup also provides the
///    user's *current* role rather than whatever it was at signing time.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let keys = SessionKeys::from_ref(state);

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or(AppError::Unauthenticated)?;

        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "session token rejected");
            AppError::Forbidden("Invalid or expired token".to_string())
        })?;

        let user = repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Forbidden("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod password_tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, AppError::Internal));
    }

    #[test]
    fn email_validation_accepts_plausible_addresses_only() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("spaces in@mail.com"));
        assert!(!is_valid_email("missing@tld"));
    }
}
