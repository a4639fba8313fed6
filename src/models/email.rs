use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::EmailFormat;
use crate::models::user::FederatedUser;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl EmailAddress {
    pub fn new(name: Option<&str>, address: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            address: address.map(str::to_string),
        }
    }

    pub fn address_only(address: &str) -> Self {
        Self {
            name: None,
            address: Some(address.to_string()),
        }
    }

    /// RFC 5322 style mailbox, e.g. `Santa <santa@example.com>`
    pub fn mailbox(&self) -> String {
        match (&self.name, &self.address) {
            (Some(name), Some(address)) if !name.is_empty() => format!("{} <{}>", name, address),
            (_, Some(address)) => address.clone(),
            (Some(name), None) => name.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Everything needed to render one email from a named template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub format: EmailFormat,
    pub template_group: String,
    pub template_name: String,
    pub sender: EmailAddress,
    pub reply_to: Option<EmailAddress>,
    pub recipients: Vec<EmailAddress>,
    pub context: serde_json::Value,
}

/// A fully rendered email, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub sender: EmailAddress,
    pub reply_to: Option<EmailAddress>,
    pub recipients: Vec<EmailAddress>,
    pub subject: String,
    pub plaintext: Option<String>,
    pub html: Option<String>,
}

/// Problem report submitted from the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugReport {
    #[serde(default)]
    pub report_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub application_version: Option<String>,
    #[serde(default)]
    pub submitting_user: Option<FederatedUser>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub problem_summary: Option<String>,
    #[serde(default)]
    pub detailed_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_formatting() {
        assert_eq!(
            EmailAddress::new(Some("Santa"), Some("santa@example.com")).mailbox(),
            "Santa <santa@example.com>"
        );
        assert_eq!(EmailAddress::address_only("elf@example.com").mailbox(), "elf@example.com");
        assert_eq!(EmailAddress::new(Some(""), Some("a@b.c")).mailbox(), "a@b.c");
    }
}
