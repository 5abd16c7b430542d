/// Bearer token encoding
///
/// Tokens are HS256-signed JWTs that name a user and a server-side session.
/// A valid signature alone is not enough to authenticate; see
/// [`crate::auth::session::SessionManager::resolve`], which also requires the
/// session row to exist.
///
/// # Claims
///
/// - `sub`: user ID (decimal string)
/// - `sid`: session ID
/// - `iss`: always "taskdesk"
/// - `iat` / `nbf` / `exp`: Unix timestamps
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use taskdesk_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-of-at-least-thirty-two-bytes!";
/// let claims = Claims::new(42, Uuid::new_v4(), Utc::now() + Duration::hours(12));
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.user_id()?, 42);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into and required from every token
pub const ISSUER: &str = "taskdesk";

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token subject: {0}")]
    InvalidSubject(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,

    /// Session ID
    pub sid: Uuid,

    pub iss: String,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,
}

impl Claims {
    /// Claims for `user_id` in `session_id`, valid from now until `expires_at`
    pub fn new(user_id: i64, session_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: user_id.to_string(),
            sid: session_id,
            iss: ISSUER.to_string(),
            iat: now,
            nbf: now,
            exp: expires_at.timestamp(),
        }
    }

    /// Parses `sub` back into a user ID
    pub fn user_id(&self) -> Result<i64, JwtError> {
        self.sub
            .parse()
            .map_err(|_| JwtError::InvalidSubject(self.sub.clone()))
    }
}

/// Signs `claims` with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Checks signature, issuer, `exp` and `nbf`, then returns the claims
///
/// # Errors
///
/// - `JwtError::Expired` once `exp` has passed
/// - `JwtError::ValidationError` for any other defect
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::ValidationError(e.to_string()),
        })
}
