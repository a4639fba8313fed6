use std::sync::Arc;

use serde_json::json;

use crate::core::validation::validate_bug_report;
use crate::error::ServiceError;
use crate::models::BugReport;
use crate::services::mailer::EmailService;
use crate::services::notification::MailingList;

/// Emails validated bug reports to the configured recipients
pub struct BugReportService {
    list: MailingList,
    template_name: String,
    email: Arc<dyn EmailService>,
}

impl BugReportService {
    pub fn new(list: MailingList, template_name: String, email: Arc<dyn EmailService>) -> Self {
        Self {
            list,
            template_name,
            email,
        }
    }

    pub async fn submit_bug_report(&self, bug_report: Option<&BugReport>) -> Result<(), ServiceError> {
        validate_bug_report(bug_report)?;

        let template = self
            .list
            .template(&self.template_name, json!({ "bugReport": bug_report }));

        self.email
            .send_template(&template)
            .await
            .map_err(|e| ServiceError::wrap("Error sending bug report", e))?;

        Ok(())
    }
}
