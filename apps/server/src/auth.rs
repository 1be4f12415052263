//! JWT authentication and password hashing.
//!
//! Bearer tokens carry the user id and role; every request re-loads the
//! user row so deactivation takes effect immediately, not at token expiry.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use minimart_core::{Capability, Role, User};

// =============================================================================
// JWT
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user_id)
    pub sub: String,

    pub username: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Generate a token for a user.
    pub fn generate_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.user_id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {e}")))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| ApiError::unauthorized("Invalid token."))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from an authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a password with argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash. Bad hashes verify as false
/// rather than erroring; login just fails.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller, extracted from the bearer token.
///
/// ## Usage
/// ```rust,ignore
/// async fn create_sale(user: AuthUser, ...) -> Result<_, ApiError> {
///     user.require(Capability::CreateSales)?;
///     ...
/// }
/// ```
pub struct AuthUser(pub User);

impl AuthUser {
    /// Capability gate: Forbidden unless the caller's role allows it.
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.0.role.allows(capability) {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "Access denied. Insufficient permissions.",
            ))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Access denied. No token provided."))?;

        let token = extract_bearer_token(header_value)
            .ok_or_else(|| ApiError::unauthorized("Access denied. No token provided."))?;

        let claims = state.jwt.validate_token(token)?;

        let user = state
            .db
            .users()
            .get_by_id(&claims.sub)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::unauthorized("Invalid token or user not found."))?;

        if !user.is_active {
            return Err(ApiError::unauthorized("Invalid token or user not found."));
        }

        Ok(AuthUser(user))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user(role: Role) -> User {
        User {
            user_id: "u-1".to_string(),
            username: "tester".to_string(),
            password_hash: String::new(),
            full_name: "Test User".to_string(),
            email: None,
            phone: None,
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_round_trip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let token = manager.generate_token(&sample_user(Role::Cashier)).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.username, "tester");
        assert_eq!(claims.role, Role::Cashier);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let other = JwtManager::new("other-secret".to_string(), 3600);

        let token = manager.generate_token(&sample_user(Role::Admin)).unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }

    #[test]
    fn test_require_capability() {
        let cashier = AuthUser(sample_user(Role::Cashier));
        assert!(cashier.require(Capability::CreateSales).is_ok());
        assert!(cashier.require(Capability::ManageProducts).is_err());
    }
}
