use std::sync::Arc;

use crate::core::validation::validate_audit_criteria;
use crate::error::ServiceError;
use crate::models::{
    AuditEvent, AuditEventCriteria, ClientSession, PaginatedResults, Pagination, RegisteredUser,
    RegisteredUserCriteria,
};
use crate::rpc::{require_admin, rethrow};
use crate::services::audit::AuditEventService;
use crate::services::dao::{AuditEventDao, RegisteredUserDao};

/// Administrative operations; every call requires an admin session
pub struct AdminRpc {
    audit_events: Arc<dyn AuditEventDao>,
    users: Arc<dyn RegisteredUserDao>,
    audit: Arc<AuditEventService>,
}

#[derive(Debug, Clone, Copy)]
enum UserAction {
    Delete,
    Lock,
    Unlock,
}

impl AdminRpc {
    pub fn new(
        audit_events: Arc<dyn AuditEventDao>,
        users: Arc<dyn RegisteredUserDao>,
        audit: Arc<AuditEventService>,
    ) -> Self {
        Self {
            audit_events,
            users,
            audit,
        }
    }

    pub async fn get_audit_events(
        &self,
        session: &ClientSession,
        criteria: &AuditEventCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<AuditEvent>, ServiceError> {
        async {
            require_admin(session)?;
            validate_audit_criteria(criteria)?;
            Ok::<_, ServiceError>(self.audit_events.retrieve_audit_events(criteria, pagination).await?)
        }
        .await
        .map_err(rethrow("Error retrieving audit events"))
    }

    pub async fn get_registered_users(
        &self,
        session: &ClientSession,
        criteria: &RegisteredUserCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<RegisteredUser>, ServiceError> {
        async {
            require_admin(session)?;
            Ok::<_, ServiceError>(self.users.retrieve_registered_users(criteria, pagination).await?)
        }
        .await
        .map_err(rethrow("Error retrieving registered users"))
    }

    async fn apply(
        &self,
        session: &ClientSession,
        records: &[RegisteredUser],
        action: UserAction,
    ) -> Result<(), ServiceError> {
        let admin_id = require_admin(session)?;

        for record in records {
            let event = match action {
                UserAction::Delete => {
                    self.users.delete_registered_user(record).await?;
                    AuditEventService::build_delete_user_event(session, record)
                }
                UserAction::Lock => {
                    self.users.lock_registered_user(record).await?;
                    AuditEventService::build_lock_user_event(session, record)
                }
                UserAction::Unlock => {
                    self.users.unlock_registered_user(record).await?;
                    AuditEventService::build_unlock_user_event(session, record)
                }
            };
            self.audit.log_audit_event(event).await?;
        }

        tracing::info!("Admin {} applied {:?} to {} user(s)", admin_id, action, records.len());
        Ok(())
    }

    pub async fn delete_registered_users(
        &self,
        session: &ClientSession,
        records: &[RegisteredUser],
    ) -> Result<(), ServiceError> {
        self.apply(session, records, UserAction::Delete)
            .await
            .map_err(rethrow("Error deleting registered users"))
    }

    pub async fn lock_registered_users(
        &self,
        session: &ClientSession,
        records: &[RegisteredUser],
    ) -> Result<(), ServiceError> {
        self.apply(session, records, UserAction::Lock)
            .await
            .map_err(rethrow("Error locking registered users"))
    }

    pub async fn unlock_registered_users(
        &self,
        session: &ClientSession,
        records: &[RegisteredUser],
    ) -> Result<(), ServiceError> {
        self.apply(session, records, UserAction::Unlock)
            .await
            .map_err(rethrow("Error unlocking registered users"))
    }
}
