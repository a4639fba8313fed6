use std::sync::Arc;

use serde_json::json;

use crate::error::ServiceError;
use crate::models::{EmailAddress, EmailFormat, EmailTemplate, RegisteredUser};
use crate::services::mailer::EmailService;

/// Template name used when a new user registers
pub const REGISTER_TEMPLATE: &str = "register";

/// Fixed sender and recipients for administrative emails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailingList {
    pub sender: EmailAddress,
    pub reply_to: Option<EmailAddress>,
    pub recipients: Vec<EmailAddress>,
    pub template_group: String,
}

impl MailingList {
    /// Multipart template addressed to this list
    pub fn template(&self, template_name: &str, context: serde_json::Value) -> EmailTemplate {
        EmailTemplate {
            format: EmailFormat::Multipart,
            template_group: self.template_group.clone(),
            template_name: template_name.to_string(),
            sender: self.sender.clone(),
            reply_to: self.reply_to.clone(),
            recipients: self.recipients.clone(),
            context,
        }
    }
}

/// Tells the site administrators about new registrations
pub struct NotificationService {
    list: MailingList,
    email: Arc<dyn EmailService>,
}

impl NotificationService {
    pub fn new(list: MailingList, email: Arc<dyn EmailService>) -> Self {
        Self { list, email }
    }

    pub async fn notify_registered_user(&self, user: &RegisteredUser) -> Result<(), ServiceError> {
        let template = self
            .list
            .template(REGISTER_TEMPLATE, json!({ "registeredUser": user }));

        self.email
            .send_template(&template)
            .await
            .map_err(|e| ServiceError::wrap("Error notifying administrators", e))?;

        tracing::info!("Sent registration notice for user {}", user.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailing_list_template() {
        let list = MailingList {
            sender: EmailAddress::new(Some("Santa"), Some("santa@example.com")),
            reply_to: Some(EmailAddress::address_only("noreply@example.com")),
            recipients: vec![EmailAddress::address_only("admin@example.com")],
            template_group: "notification".to_string(),
        };

        let template = list.template(REGISTER_TEMPLATE, json!({ "registeredUser": { "userId": "u" } }));
        assert_eq!(template.format, EmailFormat::Multipart);
        assert_eq!(template.template_group, "notification");
        assert_eq!(template.template_name, "register");
        assert_eq!(template.recipients, list.recipients);
        assert_eq!(template.context["registeredUser"]["userId"], "u");
    }
}
