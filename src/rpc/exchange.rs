use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::{
    Assignment, AssignmentSet, ClientSession, EmailMessage, Exchange, ExchangeCriteria, ExchangeState,
    PaginatedResults, Pagination, Participant,
};
use crate::rpc::{require_user, rethrow};
use crate::services::audit::AuditEventService;
use crate::services::dao::ExchangeDao;
use crate::services::exchange::ExchangeOperations;

pub const OWNERSHIP_VIOLATION: &str = "User may only operate on exchanges that they own";

fn validate_owner(user_id: &str, owner: Option<&str>) -> Result<(), ServiceError> {
    if owner == Some(user_id) {
        Ok(())
    } else {
        Err(ServiceError::Security(OWNERSHIP_VIOLATION.to_string()))
    }
}

/// Exchange operations for the logged-in owner
pub struct ExchangeRpc {
    dao: Arc<dyn ExchangeDao>,
    operations: Arc<dyn ExchangeOperations>,
    audit: Arc<AuditEventService>,
}

impl ExchangeRpc {
    pub fn new(
        dao: Arc<dyn ExchangeDao>,
        operations: Arc<dyn ExchangeOperations>,
        audit: Arc<AuditEventService>,
    ) -> Self {
        Self {
            dao,
            operations,
            audit,
        }
    }

    /// The stored copy must belong to the caller too, whatever the request body claims
    async fn guard_stored(&self, user_id: &str, exchange_id: Option<i64>) -> Result<(), ServiceError> {
        if let Some(id) = exchange_id {
            if let Some(stored) = self.dao.retrieve_exchange(id).await? {
                validate_owner(user_id, stored.user_id.as_deref())?;
            }
        }
        Ok(())
    }

    async fn guard(&self, user_id: &str, exchange: &Exchange) -> Result<(), ServiceError> {
        validate_owner(user_id, exchange.user_id.as_deref())?;
        self.guard_stored(user_id, exchange.id).await
    }

    pub async fn retrieve_exchange(
        &self,
        session: &ClientSession,
        exchange_id: i64,
    ) -> Result<Option<Exchange>, ServiceError> {
        async {
            let user_id = require_user(session)?;
            let exchange = self.dao.retrieve_exchange(exchange_id).await?;
            if let Some(exchange) = &exchange {
                validate_owner(user_id, exchange.user_id.as_deref())?;
            }
            Ok::<_, ServiceError>(exchange)
        }
        .await
        .map_err(rethrow("Error retrieving exchange"))
    }

    pub async fn get_exchanges(
        &self,
        session: &ClientSession,
        mut criteria: ExchangeCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<Exchange>, ServiceError> {
        async {
            let user_id = require_user(session)?;
            validate_owner(user_id, criteria.user_id.as_deref())?;
            criteria.user_id = Some(user_id.to_string());
            Ok::<_, ServiceError>(self.dao.retrieve_exchanges(&criteria, pagination).await?)
        }
        .await
        .map_err(rethrow("Error getting exchanges"))
    }

    pub async fn create_exchange(&self, session: &ClientSession, name: &str) -> Result<Exchange, ServiceError> {
        async {
            let user_id = require_user(session)?;

            let mut exchange = Exchange {
                user_id: Some(user_id.to_string()),
                name: Some(name.to_string()),
                exchange_state: Some(ExchangeState::New),
                ..Exchange::default()
            };

            let id = self.dao.insert_exchange(&exchange).await?;
            exchange.id = Some(id);

            let event = AuditEventService::build_create_exchange_event(session, id);
            self.audit.log_audit_event(event).await?;

            tracing::info!("User {} created exchange {}", user_id, id);
            Ok::<_, ServiceError>(exchange)
        }
        .await
        .map_err(rethrow("Error creating exchange"))
    }

    pub async fn delete_exchanges(&self, session: &ClientSession, records: &[Exchange]) -> Result<(), ServiceError> {
        async {
            let user_id = require_user(session)?;
            for record in records {
                self.guard(user_id, record).await?;
            }

            for record in records {
                self.dao.delete_exchange(record).await?;
                let event = AuditEventService::build_delete_exchange_event(session, record.id);
                self.audit.log_audit_event(event).await?;
            }

            tracing::info!("User {} deleted {} exchange(s)", user_id, records.len());
            Ok::<_, ServiceError>(())
        }
        .await
        .map_err(rethrow("Error deleting exchanges"))
    }

    async fn update(&self, mut exchange: Exchange) -> Result<Exchange, ServiceError> {
        if exchange.exchange_state == Some(ExchangeState::New) {
            exchange.exchange_state = Some(ExchangeState::Started);
        }
        self.dao.update_exchange(&exchange).await?;
        Ok(exchange)
    }

    pub async fn save_exchange(&self, session: &ClientSession, exchange: Exchange) -> Result<Exchange, ServiceError> {
        async {
            let user_id = require_user(session)?;
            self.guard(user_id, &exchange).await?;
            self.update(exchange).await
        }
        .await
        .map_err(rethrow("Error saving exchange"))
    }

    /// Assignments prefer no reciprocal pairs, falling back when that is impossible
    fn generate_with_fallback(&self, exchange: &Exchange) -> Result<AssignmentSet, ServiceError> {
        match self.operations.generate_assignments(exchange, true) {
            Err(ServiceError::InvalidData(e)) => {
                tracing::debug!("Retrying without automatic conflicts: {}", e);
                self.operations.generate_assignments(exchange, false)
            }
            result => result,
        }
    }

    pub async fn send_notifications(
        &self,
        session: &ClientSession,
        mut exchange: Exchange,
    ) -> Result<Exchange, ServiceError> {
        async {
            let user_id = require_user(session)?;
            self.guard(user_id, &exchange).await?;

            let assignments = self.generate_with_fallback(&exchange)?;
            exchange.exchange_state = Some(ExchangeState::Generated);

            let recipients = self
                .operations
                .send_messages(&exchange, &assignments, false)
                .await?;

            exchange.assignments = Some(assignments);
            exchange.exchange_state = Some(ExchangeState::Sent);
            let exchange = self.update(exchange).await?;

            let event = AuditEventService::build_exchange_email_event(session, exchange.id, recipients);
            self.audit.log_audit_event(event).await?;

            tracing::info!("Sent {} notification(s) for exchange {:?}", recipients, exchange.id);
            Ok::<_, ServiceError>(exchange)
        }
        .await
        .map_err(rethrow("Error sending notifications"))
    }

    pub async fn resend_notification(
        &self,
        session: &ClientSession,
        exchange: Exchange,
        participants: &[Participant],
    ) -> Result<Exchange, ServiceError> {
        async {
            let user_id = require_user(session)?;
            self.guard(user_id, &exchange).await?;

            let mut resend = AssignmentSet::new();
            if let Some(assignments) = &exchange.assignments {
                for participant in participants {
                    if let Some(receiver) = assignments.gift_receiver(participant) {
                        resend.push(Assignment::new(participant.clone(), receiver.clone()));
                    }
                }
            }

            if !resend.is_empty() {
                let sent = self.operations.send_messages(&exchange, &resend, false).await?;
                let event = AuditEventService::build_resend_emails_event(session, exchange.id, sent);
                self.audit.log_audit_event(event).await?;
                tracing::info!("Resent {} notification(s) for exchange {:?}", sent, exchange.id);
            }

            Ok::<_, ServiceError>(exchange)
        }
        .await
        .map_err(rethrow("Error resending notification"))
    }

    pub async fn generate_preview(
        &self,
        session: &ClientSession,
        exchange: &Exchange,
    ) -> Result<EmailMessage, ServiceError> {
        async {
            let user_id = require_user(session)?;
            self.guard(user_id, exchange).await?;
            self.operations.generate_preview(exchange)
        }
        .await
        .map_err(rethrow("Error generating preview"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_owner() {
        assert!(validate_owner("me", Some("me")).is_ok());

        for owner in [Some("you"), None] {
            match validate_owner("me", owner) {
                Err(ServiceError::Security(message)) => assert_eq!(message, OWNERSHIP_VIOLATION),
                other => panic!("expected security fault, got {:?}", other),
            }
        }
    }
}
