use std::sync::Arc;

use chrono::Utc;

use crate::error::ServiceError;
use crate::models::{AuditEvent, AuditEventType, ClientSession, ExtraData, ExtraDataKey, RegisteredUser};
use crate::services::dao::AuditEventDao;

/// Builds audit events stamped with session context and records them
pub struct AuditEventService {
    dao: Arc<dyn AuditEventDao>,
}

impl AuditEventService {
    pub fn new(dao: Arc<dyn AuditEventDao>) -> Self {
        Self { dao }
    }

    /// Stamp the current time plus the session's user and session ids
    pub fn build_audit_event(
        session: &ClientSession,
        event_type: AuditEventType,
        extra_data: Vec<ExtraData>,
    ) -> AuditEvent {
        AuditEvent {
            event_id: None,
            event_type,
            event_timestamp: Utc::now(),
            user_id: session.user_id().map(str::to_string),
            session_id: Some(session.session_id.clone()),
            extra_data,
        }
    }

    pub fn build_login_event(session: &ClientSession) -> AuditEvent {
        let event_type = if session.is_admin() {
            AuditEventType::AdminLogin
        } else {
            AuditEventType::UserLogin
        };
        Self::build_audit_event(session, event_type, vec![])
    }

    pub fn build_register_user_event(session: &ClientSession) -> AuditEvent {
        let email = session
            .current_user
            .as_ref()
            .and_then(|user| user.email_address.as_deref());
        Self::build_audit_event(
            session,
            AuditEventType::RegisterUser,
            vec![ExtraData::optional(ExtraDataKey::EmailAddress, email)],
        )
    }

    fn user_event(session: &ClientSession, event_type: AuditEventType, user: &RegisteredUser) -> AuditEvent {
        Self::build_audit_event(
            session,
            event_type,
            vec![
                ExtraData::new(ExtraDataKey::UserId, &user.user_id),
                ExtraData::optional(ExtraDataKey::EmailAddress, user.email_address.as_deref()),
            ],
        )
    }

    pub fn build_delete_user_event(session: &ClientSession, user: &RegisteredUser) -> AuditEvent {
        Self::user_event(session, AuditEventType::DeleteUser, user)
    }

    pub fn build_lock_user_event(session: &ClientSession, user: &RegisteredUser) -> AuditEvent {
        Self::user_event(session, AuditEventType::LockUser, user)
    }

    pub fn build_unlock_user_event(session: &ClientSession, user: &RegisteredUser) -> AuditEvent {
        Self::user_event(session, AuditEventType::UnlockUser, user)
    }

    pub fn build_create_exchange_event(session: &ClientSession, exchange_id: i64) -> AuditEvent {
        Self::build_audit_event(
            session,
            AuditEventType::CreateExchange,
            vec![ExtraData::new(ExtraDataKey::ExchangeId, exchange_id)],
        )
    }

    pub fn build_delete_exchange_event(session: &ClientSession, exchange_id: Option<i64>) -> AuditEvent {
        let id = exchange_id.map(|id| id.to_string());
        Self::build_audit_event(
            session,
            AuditEventType::DeleteExchange,
            vec![ExtraData::optional(ExtraDataKey::ExchangeId, id.as_deref())],
        )
    }

    fn email_event(
        session: &ClientSession,
        event_type: AuditEventType,
        exchange_id: Option<i64>,
        recipients: usize,
    ) -> AuditEvent {
        let id = exchange_id.map(|id| id.to_string());
        Self::build_audit_event(
            session,
            event_type,
            vec![
                ExtraData::optional(ExtraDataKey::ExchangeId, id.as_deref()),
                ExtraData::new(ExtraDataKey::Recipients, recipients),
            ],
        )
    }

    pub fn build_exchange_email_event(
        session: &ClientSession,
        exchange_id: Option<i64>,
        recipients: usize,
    ) -> AuditEvent {
        Self::email_event(session, AuditEventType::ExchangeEmail, exchange_id, recipients)
    }

    pub fn build_resend_emails_event(
        session: &ClientSession,
        exchange_id: Option<i64>,
        recipients: usize,
    ) -> AuditEvent {
        Self::email_event(session, AuditEventType::ResendEmails, exchange_id, recipients)
    }

    pub async fn log_audit_event(&self, event: AuditEvent) -> Result<(), ServiceError> {
        let event_type = event.event_type;
        self.dao.insert_audit_event(&event).await?;

        tracing::debug!("Logged audit event {}", event_type.as_str());
        Ok(())
    }
}
