use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ClientSession, FederatedUser, OpenIdProvider, RegisteredUser};
use crate::services::cache::{CacheError, CacheKey, CacheManager};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid identity token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Cache error: {0}")]
    CacheError(CacheError),
}

impl From<CacheError> for SessionError {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::CacheMiss(key) => SessionError::NotFound(key),
            other => SessionError::CacheError(other),
        }
    }
}

/// Claims carried by the identity token the federated provider issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub identity: Option<String>,
    pub exp: usize,
}

/// Verifies identity tokens and keeps client sessions in the cache
pub struct SessionService {
    cache: Arc<CacheManager>,
    decoding_key: DecodingKey,
    validation: Validation,
    admin_users: HashSet<String>,
}

impl SessionService {
    pub fn new(
        jwt_secret: &str,
        issuer: Option<&str>,
        audience: Option<&str>,
        admin_users: &[String],
        cache: Arc<CacheManager>,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            cache,
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            admin_users: admin_users.iter().cloned().collect(),
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_users.contains(user_id)
    }

    /// Check the token signature and expiry, returning the user it names
    pub fn verify_identity_token(&self, token: &str) -> Result<FederatedUser, SessionError> {
        let data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        Ok(FederatedUser {
            admin: self.is_admin(&claims.sub),
            user_id: claims.sub,
            user_name: claims.name,
            email_address: claims.email,
            open_id_provider: OpenIdProvider::from_claim(claims.provider.as_deref()),
            federated_identity: claims.identity,
            authentication_domain: claims.domain,
        })
    }

    /// Create and cache a new session for a logged-in user
    pub async fn establish(
        &self,
        user: FederatedUser,
        registered_user: RegisteredUser,
    ) -> Result<ClientSession, SessionError> {
        let session = ClientSession {
            session_id: Uuid::new_v4().to_string(),
            current_user: Some(user),
            registered_user: Some(registered_user),
            established: Utc::now(),
        };

        self.cache
            .set(&CacheKey::session(&session.session_id), &session)
            .await?;

        tracing::debug!("Established session {}", session.session_id);
        Ok(session)
    }

    pub async fn retrieve(&self, session_id: &str) -> Result<ClientSession, SessionError> {
        Ok(self.cache.get(&CacheKey::session(session_id)).await?)
    }

    pub async fn invalidate(&self, session_id: &str) -> Result<(), SessionError> {
        self.cache.delete(&CacheKey::session(session_id)).await?;
        tracing::debug!("Invalidated session {}", session_id);
        Ok(())
    }
}
