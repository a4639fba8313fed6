use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::audit::AuditEventCriteria;
use crate::models::domain::{Exchange, ExchangeCriteria, ParticipantSet};
use crate::models::user::{RegisteredUser, RegisteredUserCriteria};

/// Page selection for search calls; pages are 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: usize,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 500))]
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    25
}

/// Login with an identity token issued by the federated provider
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "identity_token", rename = "identityToken")]
    pub identity_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateExchangeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExchangeSearchRequest {
    #[serde(default)]
    pub criteria: ExchangeCriteria,
    #[serde(default)]
    #[validate(nested)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeBatchRequest {
    pub records: Vec<Exchange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendNotificationRequest {
    pub exchange: Exchange,
    pub participants: ParticipantSet,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AuditEventSearchRequest {
    #[serde(default)]
    pub criteria: AuditEventCriteria,
    #[serde(default)]
    #[validate(nested)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisteredUserSearchRequest {
    #[serde(default)]
    pub criteria: RegisteredUserCriteria,
    #[serde(default)]
    #[validate(nested)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUserBatchRequest {
    pub records: Vec<RegisteredUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let request: ExchangeSearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.pagination, Pagination { page: 1, page_size: 25 });
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_pagination_rejects_page_zero() {
        let request: ExchangeSearchRequest =
            serde_json::from_str(r#"{"pagination": {"page": 0, "pageSize": 10}}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_pagination_rejects_huge_page() {
        let json = format!(r#"{{"pagination": {{"page": {}, "pageSize": 25}}}}"#, usize::MAX / 2);
        let request: ExchangeSearchRequest = serde_json::from_str(&json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_login_request_alias() {
        let request: LoginRequest = serde_json::from_str(r#"{"identity_token": "abc"}"#).unwrap();
        assert_eq!(request.identity_token, "abc");
        assert!(LoginRequest { identity_token: String::new() }.validate().is_err());
    }
}
