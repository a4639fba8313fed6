use async_trait::async_trait;
use thiserror::Error;

use crate::error::{InvalidDataError, MessageKey, ServiceError};
use crate::models::{
    AuditEvent, AuditEventCriteria, Exchange, ExchangeCriteria, PaginatedResults, Pagination,
    RegisteredUser, RegisteredUserCriteria,
};

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum DaoError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<DaoError> for ServiceError {
    fn from(error: DaoError) -> Self {
        match error {
            DaoError::InvalidInput(message) => {
                InvalidDataError::single(MessageKey::Invalid, "criteria", &message).into()
            }
            DaoError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

/// Exchange search must always be scoped to one user
pub(crate) fn require_user_id(criteria: &ExchangeCriteria) -> Result<&str, DaoError> {
    criteria
        .user_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DaoError::InvalidInput("Must specify user id".to_string()))
}

#[async_trait]
pub trait ExchangeDao: Send + Sync {
    /// Insert a new exchange, returning its generated id
    async fn insert_exchange(&self, exchange: &Exchange) -> Result<i64, DaoError>;

    async fn retrieve_exchange(&self, exchange_id: i64) -> Result<Option<Exchange>, DaoError>;

    /// Fails with `NotFound` when no exchange has this id
    async fn update_exchange(&self, exchange: &Exchange) -> Result<(), DaoError>;

    /// Deleting an exchange that does not exist is not an error
    async fn delete_exchange(&self, exchange: &Exchange) -> Result<(), DaoError>;

    async fn retrieve_exchanges(
        &self,
        criteria: &ExchangeCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<Exchange>, DaoError>;
}

#[async_trait]
pub trait AuditEventDao: Send + Sync {
    async fn insert_audit_event(&self, event: &AuditEvent) -> Result<i64, DaoError>;

    async fn retrieve_audit_events(
        &self,
        criteria: &AuditEventCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<AuditEvent>, DaoError>;
}

#[async_trait]
pub trait RegisteredUserDao: Send + Sync {
    async fn insert_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError>;

    async fn retrieve_registered_user(&self, user_id: &str) -> Result<Option<RegisteredUser>, DaoError>;

    /// Fails with `NotFound` when no user has this id
    async fn update_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError>;

    async fn delete_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError>;

    async fn lock_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError>;

    async fn unlock_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError>;

    async fn retrieve_registered_users(
        &self,
        criteria: &RegisteredUserCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<RegisteredUser>, DaoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_user_id() {
        assert_eq!(require_user_id(&ExchangeCriteria::for_user("me")).unwrap(), "me");
        assert!(require_user_id(&ExchangeCriteria::default()).is_err());
        assert!(require_user_id(&ExchangeCriteria::for_user("")).is_err());
    }

    #[test]
    fn test_conversion_to_service_error() {
        let error = ServiceError::from(DaoError::InvalidInput("Must specify user id".to_string()));
        assert!(matches!(error, ServiceError::InvalidData(_)));

        let error = ServiceError::from(DaoError::NotFound("exchange 4".to_string()));
        assert!(matches!(error, ServiceError::NotFound(_)));

        let cause = serde_json::from_str::<i64>("x").unwrap_err();
        let error = ServiceError::from(DaoError::from(cause));
        assert!(matches!(error, ServiceError::Internal { .. }));
    }
}
