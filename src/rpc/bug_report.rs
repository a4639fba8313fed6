use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::{BugReport, ClientSession};
use crate::rpc::{require_user, rethrow};
use crate::services::bug_report::BugReportService;

pub struct BugReportRpc {
    service: Arc<BugReportService>,
}

impl BugReportRpc {
    pub fn new(service: Arc<BugReportService>) -> Self {
        Self { service }
    }

    pub async fn submit_bug_report(
        &self,
        session: &ClientSession,
        bug_report: Option<&BugReport>,
    ) -> Result<(), ServiceError> {
        async {
            let user_id = require_user(session)?;
            self.service.submit_bug_report(bug_report).await?;
            tracing::info!("Bug report submitted by {}", user_id);
            Ok::<_, ServiceError>(())
        }
        .await
        .map_err(rethrow("Error submitting bug report"))
    }
}
