/// Session-backed identity provider
///
/// Signing in creates a session row and hands out a JWT naming it. A token
/// resolves only while the row exists, has not expired, and its user is still
/// present, so signing out (or deleting the user) revokes it immediately.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chrono::Duration;
/// use taskdesk_shared::auth::session::SessionManager;
/// use taskdesk_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sessions = SessionManager::new(
///     Arc::new(MemoryStore::new()),
///     "a-secret-of-at-least-thirty-two-bytes!",
///     Duration::hours(12),
/// );
///
/// let signed_in = sessions.sign_in("alice@example.com", "Launch#2025").await?;
/// let resolved = sessions.resolve(&signed_in.token).await?;
/// sessions.sign_out(resolved.session_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::authorization::CurrentUser;
use super::jwt::{create_token, validate_token, Claims, JwtError};
use super::password::{hash_password, verify_password, PasswordError};
use crate::models::user::UserSummary;
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Token is malformed, expired, revoked, or names a deleted user
    #[error("Invalid or expired session")]
    Unauthenticated,

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful sign-in
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub token: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user: UserSummary,
}

/// A token that resolved to a live session
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session_id: Uuid,
    pub user: CurrentUser,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn Store>,
    secret: String,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn Store>, secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            secret: secret.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verifies credentials and opens a session
    ///
    /// The email is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// `SessionError::InvalidCredentials` for an unknown email or a wrong
    /// password; storage or hashing failures pass through.
    #[tracing::instrument(skip_all)]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, SessionError> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            // Unknown emails pay the same Argon2 cost as known ones
            if let Some(hash) = dummy_hash() {
                let _ = verify_password(password, hash);
            }
            warn!("Sign-in rejected: unknown email");
            return Err(SessionError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "Sign-in rejected: wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        let now = Utc::now();
        match self.store.delete_expired_sessions(now).await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "Expired sessions removed"),
            Err(e) => warn!(error = %e, "Failed to remove expired sessions"),
        }

        let expires_at = now + self.ttl;
        let session = self.store.create_session(user.id, expires_at).await?;
        let token = create_token(&Claims::new(user.id, session.id, expires_at), &self.secret)?;

        info!(user_id = user.id, session_id = %session.id, "User signed in");

        Ok(SignedIn {
            token,
            session_id: session.id,
            expires_at,
            user: user.summary(),
        })
    }

    /// Maps a bearer token to the current user
    ///
    /// Every failure other than a storage error collapses into
    /// `SessionError::Unauthenticated`.
    pub async fn resolve(&self, token: &str) -> Result<ResolvedSession, SessionError> {
        let claims = validate_token(token, &self.secret).map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            SessionError::Unauthenticated
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| SessionError::Unauthenticated)?;

        let session = self
            .store
            .find_session(claims.sid)
            .await
            .map_err(log_store_error)?
            .filter(|s| s.user_id == user_id && !s.is_expired_at(Utc::now()))
            .ok_or(SessionError::Unauthenticated)?;

        let user = self
            .store
            .find_user(user_id)
            .await
            .map_err(log_store_error)?
            .ok_or(SessionError::Unauthenticated)?;

        Ok(ResolvedSession {
            session_id: session.id,
            user: CurrentUser {
                id: user.id,
                email: user.email,
                role: user.role,
            },
        })
    }

    /// Ends a session; signing out twice is not an error
    #[tracing::instrument(skip(self))]
    pub async fn sign_out(&self, session_id: Uuid) -> Result<(), SessionError> {
        if self.store.delete_session(session_id).await? {
            info!("User signed out");
        } else {
            debug!("Session already gone");
        }
        Ok(())
    }
}

/// Hash verified against when the email is unknown
fn dummy_hash() -> Option<&'static str> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| hash_password("taskdesk-unknown-account").ok())
        .as_deref()
}

fn log_store_error(err: StoreError) -> SessionError {
    error!(error = %err, "Session lookup failed");
    SessionError::Store(err)
}
