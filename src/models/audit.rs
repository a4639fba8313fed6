use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of events recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    AdminLogin,
    UserLogin,
    RegisterUser,
    DeleteUser,
    LockUser,
    UnlockUser,
    CreateExchange,
    DeleteExchange,
    ExchangeEmail,
    ResendEmails,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::AdminLogin => "ADMIN_LOGIN",
            AuditEventType::UserLogin => "USER_LOGIN",
            AuditEventType::RegisterUser => "REGISTER_USER",
            AuditEventType::DeleteUser => "DELETE_USER",
            AuditEventType::LockUser => "LOCK_USER",
            AuditEventType::UnlockUser => "UNLOCK_USER",
            AuditEventType::CreateExchange => "CREATE_EXCHANGE",
            AuditEventType::DeleteExchange => "DELETE_EXCHANGE",
            AuditEventType::ExchangeEmail => "EXCHANGE_EMAIL",
            AuditEventType::ResendEmails => "RESEND_EMAILS",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let event_type = match value {
            "ADMIN_LOGIN" => AuditEventType::AdminLogin,
            "USER_LOGIN" => AuditEventType::UserLogin,
            "REGISTER_USER" => AuditEventType::RegisterUser,
            "DELETE_USER" => AuditEventType::DeleteUser,
            "LOCK_USER" => AuditEventType::LockUser,
            "UNLOCK_USER" => AuditEventType::UnlockUser,
            "CREATE_EXCHANGE" => AuditEventType::CreateExchange,
            "DELETE_EXCHANGE" => AuditEventType::DeleteExchange,
            "EXCHANGE_EMAIL" => AuditEventType::ExchangeEmail,
            "RESEND_EMAILS" => AuditEventType::ResendEmails,
            _ => return None,
        };
        Some(event_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtraDataKey {
    UserId,
    EmailAddress,
    ExchangeId,
    Recipients,
}

/// Key/value detail attached to an audit event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtraData {
    pub key: ExtraDataKey,
    pub value: Option<String>,
}

impl ExtraData {
    pub fn new(key: ExtraDataKey, value: impl ToString) -> Self {
        Self {
            key,
            value: Some(value.to_string()),
        }
    }

    pub fn optional(key: ExtraDataKey, value: Option<&str>) -> Self {
        Self {
            key,
            value: value.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    #[serde(default)]
    pub event_id: Option<i64>,
    pub event_type: AuditEventType,
    pub event_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub extra_data: Vec<ExtraData>,
}

impl AuditEvent {
    pub fn extra(&self, key: ExtraDataKey) -> Option<&str> {
        self.extra_data
            .iter()
            .find(|data| data.key == key)
            .and_then(|data| data.value.as_deref())
    }
}

/// Search criteria for the audit log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventCriteria {
    #[serde(default)]
    pub event_types: Option<Vec<AuditEventType>>,
    #[serde(default)]
    pub user_ids: Option<Vec<String>>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trip_names() {
        for event_type in [
            AuditEventType::AdminLogin,
            AuditEventType::RegisterUser,
            AuditEventType::ResendEmails,
        ] {
            assert_eq!(AuditEventType::parse(event_type.as_str()), Some(event_type));
        }
        assert_eq!(AuditEventType::parse("BOGUS"), None);
    }

    #[test]
    fn test_extra_lookup() {
        let event = AuditEvent {
            event_id: None,
            event_type: AuditEventType::ExchangeEmail,
            event_timestamp: Utc::now(),
            user_id: Some("user".to_string()),
            session_id: None,
            extra_data: vec![
                ExtraData::new(ExtraDataKey::ExchangeId, 42),
                ExtraData::new(ExtraDataKey::Recipients, 3),
            ],
        };
        assert_eq!(event.extra(ExtraDataKey::Recipients), Some("3"));
        assert_eq!(event.extra(ExtraDataKey::UserId), None);
    }
}
