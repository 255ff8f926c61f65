//! Access / refresh credential lifecycle.
//!
//! A principal holds at most one live refresh credential. It is stored as a
//! SHA-256 digest on the user row and replaced on every login and rotation;
//! logout clears it. Access credentials are never stored: they are checked
//! against their signature and expiry only.
//!
//! ```rust,ignore
//! let sessions = SessionManager::new(Arc::new(SeaPrincipalStore::new(db)), config.session.clone());
//! let issued = sessions.authenticate_by_secret("alice", "hunter22").await?;
//! let next = sessions.rotate(&issued.credentials.refresh_token).await?;
//! let user_id = sessions.verify(&next.access_token)?;
//! sessions.revoke(user_id).await?;
//! ```

use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::jwt::{self, TokenError};
use crate::auth::password::{constant_time_eq, hash_token, verify_password};
use crate::auth::store::PrincipalStore;
use crate::config::SessionConfig;

/// Failures of the session lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No credential supplied")]
    Unauthenticated,

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Refresh credential has been superseded")]
    CredentialReuseDetected,

    #[error("Credential has expired")]
    Expired,

    #[error("User does not exist")]
    NotFound,

    #[error("Session persistence failed: {0}")]
    Internal(String),
}

impl SessionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::Unauthenticated
            | SessionError::InvalidCredential(_)
            | SessionError::CredentialReuseDetected
            | SessionError::Expired => StatusCode::UNAUTHORIZED,
            SessionError::NotFound => StatusCode::NOT_FOUND,
            SessionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::Unauthenticated => "UNAUTHENTICATED",
            SessionError::InvalidCredential(_) => "INVALID_CREDENTIAL",
            SessionError::CredentialReuseDetected => "CREDENTIAL_REUSE_DETECTED",
            SessionError::Expired => "CREDENTIAL_EXPIRED",
            SessionError::NotFound => "NOT_FOUND",
            SessionError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sea_orm::DbErr> for SessionError {
    fn from(e: sea_orm::DbErr) -> Self {
        SessionError::Internal(e.to_string())
    }
}

/// A freshly minted access / refresh pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful password login.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub principal_id: Uuid,
    pub credentials: CredentialPair,
}

/// Issues, verifies, rotates and revokes session credentials.
///
/// Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn PrincipalStore>,
    config: Arc<SessionConfig>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn PrincipalStore>, config: SessionConfig) -> Self {
        SessionManager {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mint a new pair for `principal_id` and make its refresh credential the
    /// only live one.
    pub async fn issue(&self, principal_id: Uuid) -> Result<CredentialPair, SessionError> {
        let pair = self.mint(principal_id)?;

        let stored = self
            .store
            .set_refresh_token_hash(principal_id, Some(&hash_token(&pair.refresh_token)))
            .await?;
        if !stored {
            return Err(SessionError::NotFound);
        }

        tracing::debug!(%principal_id, "issued session credentials");
        Ok(pair)
    }

    /// Exchange the current refresh credential for a new pair.
    pub async fn rotate(&self, presented: &str) -> Result<CredentialPair, SessionError> {
        let presented = presented.trim();
        if presented.is_empty() {
            return Err(SessionError::Unauthenticated);
        }

        let claims = jwt::validate_token(presented, &self.config.refresh_token_secret)
            .map_err(|e| SessionError::InvalidCredential(e.to_string()))?;
        let principal_id = parse_subject(&claims.sub)?;

        let principal = self
            .store
            .find_by_id(principal_id)
            .await?
            .ok_or_else(|| SessionError::InvalidCredential("unknown principal".to_string()))?;

        let presented_hash = hash_token(presented);
        let matches = principal
            .refresh_token_hash
            .as_deref()
            .is_some_and(|stored| constant_time_eq(stored, &presented_hash));
        if !matches {
            return Err(self.reuse_detected(principal_id).await);
        }

        let pair = self.mint(principal_id)?;
        let swapped = self
            .store
            .swap_refresh_token_hash(
                principal_id,
                &presented_hash,
                &hash_token(&pair.refresh_token),
            )
            .await?;
        if !swapped {
            // A concurrent rotation or logout got there first.
            return Err(self.reuse_detected(principal_id).await);
        }

        tracing::debug!(%principal_id, "rotated session credentials");
        Ok(pair)
    }

    /// Check an access credential and return the principal it names.
    ///
    /// Stateless: the store is never consulted.
    pub fn verify(&self, access_token: &str) -> Result<Uuid, SessionError> {
        let claims = jwt::validate_token(access_token, &self.config.access_token_secret)
            .map_err(|e| match e {
                TokenError::Expired => SessionError::Expired,
                other => SessionError::InvalidCredential(other.to_string()),
            })?;
        parse_subject(&claims.sub)
    }

    /// Clear the stored refresh credential. Revoking twice is fine.
    pub async fn revoke(&self, principal_id: Uuid) -> Result<(), SessionError> {
        self.store
            .set_refresh_token_hash(principal_id, None)
            .await?;
        tracing::debug!(%principal_id, "revoked session");
        Ok(())
    }

    /// Password login by username or email.
    pub async fn authenticate_by_secret(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<IssuedSession, SessionError> {
        let principal = self
            .store
            .find_by_username_or_email(identifier)
            .await?
            .ok_or(SessionError::NotFound)?;

        let valid = verify_password(secret, &principal.password_hash)
            .map_err(|e| SessionError::Internal(e.to_string()))?;
        if !valid {
            return Err(SessionError::InvalidCredential(
                "password is incorrect".to_string(),
            ));
        }

        let credentials = self.issue(principal.id).await?;
        Ok(IssuedSession {
            principal_id: principal.id,
            credentials,
        })
    }

    fn mint(&self, principal_id: Uuid) -> Result<CredentialPair, SessionError> {
        let subject = principal_id.to_string();
        let access_token = jwt::create_token(
            &subject,
            &self.config.access_token_secret,
            self.config.access_ttl(),
        )
        .map_err(|e| SessionError::Internal(e.to_string()))?;
        let refresh_token = jwt::create_token(
            &subject,
            &self.config.refresh_token_secret,
            self.config.refresh_ttl(),
        )
        .map_err(|e| SessionError::Internal(e.to_string()))?;

        Ok(CredentialPair {
            access_token,
            refresh_token,
        })
    }

    async fn reuse_detected(&self, principal_id: Uuid) -> SessionError {
        tracing::warn!(%principal_id, "superseded refresh credential presented");
        if self.config.revoke_on_reuse {
            if let Err(e) = self.store.set_refresh_token_hash(principal_id, None).await {
                return SessionError::Internal(e.to_string());
            }
        }
        SessionError::CredentialReuseDetected
    }
}

fn parse_subject(sub: &str) -> Result<Uuid, SessionError> {
    Uuid::parse_str(sub)
        .map_err(|_| SessionError::InvalidCredential("malformed subject".to_string()))
}
