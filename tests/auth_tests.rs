use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use mental_group::{
    AppState,
    auth::{AuthUser, Claims, SessionKeys},
    config::AppConfig,
    error::RepoError,
    models::{NewUser, User},
    repository::Repository,
};
use std::sync::Arc;
use uuid::Uuid;

// --- Mock Repository for Auth Logic ---

// The gate only ever calls find_by_id, so a single pre-canned user is enough.
#[derive(Default)]
struct MockAuthRepo {
    user_to_return: Option<User>,
}

#[async_trait]
impl Repository for MockAuthRepo {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.user_to_return.clone())
    }

    // Placeholders for the rest of the contract.
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
        Ok(None)
    }
    async fn find_approved(&self) -> Result<Vec<User>, RepoError> {
        Ok(vec![])
    }
    async fn find_pending(&self) -> Result<Vec<User>, RepoError> {
        Ok(vec![])
    }
    async fn insert_user(&self, _new_user: NewUser) -> Result<User, RepoError> {
        Ok(User::default())
    }
    async fn update_user(&self, _user: &User) -> Result<Option<User>, RepoError> {
        Ok(None)
    }
    async fn append_crime(
        &self,
        _id: Uuid,
        _crime: &str,
    ) -> Result<Option<Vec<String>>, RepoError> {
        Ok(None)
    }
    async fn remove_crime(
        &self,
        _id: Uuid,
        _crime: &str,
    ) -> Result<Option<Vec<String>>, RepoError> {
        Ok(None)
    }
    async fn approve_user(&self, _id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(None)
    }
}

// --- Helper Functions ---

const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn test_keys() -> SessionKeys {
    SessionKeys::new(&AppConfig::default().jwt_secret, 60)
}

// Signs claims with an arbitrary expiry offset (negative = already expired),
// using the same secret the app state verifies with.
fn create_token(user_id: Uuid, exp_offset: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };
    let key = EncodingKey::from_secret(AppConfig::default().jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(repo: MockAuthRepo) -> AppState {
    AppState {
        repo: Arc::new(repo),
        config: AppConfig::default(),
    }
}

fn stored_user(id: Uuid, role: Option<&str>) -> User {
    User {
        id,
        email: "test@example.com".to_string(),
        role: role.map(str::to_string),
        ..User::default()
    }
}

/// Helper to get the mutable Parts struct from a generated Request.
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn parts_with_cookie(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("token={token}")).unwrap(),
    );
    parts
}

// --- Token Service Tests ---

#[tokio::test]
async fn issue_and_verify_roundtrip() {
    let keys = test_keys();
    let user_id = Uuid::new_v4();

    let token = keys.issue(user_id).expect("sign token");
    let claims = keys.verify(&token).expect("verify token");

    assert_eq!(claims.sub, user_id);
    // One-hour lifetime embedded at issuance.
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn token_still_valid_one_minute_before_expiry() {
    // A token issued 59 minutes ago with a one-hour lifetime.
    let token = create_token(TEST_USER_ID, 60);
    let claims = test_keys().verify(&token).expect("not yet expired");
    assert_eq!(claims.sub, TEST_USER_ID);
}

#[tokio::test]
async fn token_invalid_one_minute_after_expiry() {
    // A token issued 61 minutes ago with a one-hour lifetime. Verification
    // runs with zero leeway, so even a single expired minute is rejected.
    let token = create_token(TEST_USER_ID, -60);
    assert!(test_keys().verify(&token).is_err());
}

#[tokio::test]
async fn verify_rejects_wrong_secret() {
    let other_keys = SessionKeys::new("a-completely-different-secret", 60);
    let token = other_keys.issue(TEST_USER_ID).expect("sign token");
    assert!(test_keys().verify(&token).is_err());
}

#[tokio::test]
async fn verify_rejects_malformed_tokens() {
    let keys = test_keys();
    assert!(keys.verify("not-a-jwt").is_err());
    assert!(keys.verify("").is_err());

    // Valid shape, corrupted signature.
    let mut token = keys.issue(TEST_USER_ID).expect("sign token");
    token.pop();
    token.push('x');
    assert!(keys.verify(&token).is_err());
}

// --- Auth Gate Tests ---

#[tokio::test]
async fn gate_accepts_valid_cookie_and_resolves_current_role() {
    let token = create_token(TEST_USER_ID, 3600);
    let app_state = create_app_state(MockAuthRepo {
        user_to_return: Some(stored_user(TEST_USER_ID, Some("admin"))),
    });

    let mut parts = parts_with_cookie(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect("valid session should authenticate");

    assert_eq!(auth_user.id, TEST_USER_ID);
    assert!(auth_user.is_admin());
}

#[tokio::test]
async fn gate_rejects_missing_cookie_as_unauthenticated() {
    let app_state = create_app_state(MockAuthRepo::default());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn gate_rejects_garbage_token_as_forbidden() {
    let app_state = create_app_state(MockAuthRepo {
        user_to_return: Some(stored_user(TEST_USER_ID, None)),
    });

    let mut parts = parts_with_cookie("definitely-not-a-jwt");
    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn gate_rejects_expired_token_as_forbidden() {
    let token = create_token(TEST_USER_ID, -120);
    let app_state = create_app_state(MockAuthRepo {
        user_to_return: Some(stored_user(TEST_USER_ID, None)),
    });

    let mut parts = parts_with_cookie(&token);
    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn gate_rejects_token_for_a_vanished_user() {
    // The token is cryptographically fine, but its subject no longer exists.
    let token = create_token(TEST_USER_ID, 3600);
    let app_state = create_app_state(MockAuthRepo::default());

    let mut parts = parts_with_cookie(&token);
    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}
