use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::ServiceError;
use crate::models::BugReport;
use crate::routes::{client_session, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/bug-reports", web::post().to(submit_bug_report));
}

/// Submit bug report endpoint
///
/// POST /api/v1/bug-reports
///
/// A `null` body is accepted here and rejected by validation.
async fn submit_bug_report(
    state: web::Data<AppState>,
    req: web::Json<Option<BugReport>>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let session = client_session(&state, &http_req).await?;
    let bug_report = req.into_inner();
    state
        .bug_reports
        .submit_bug_report(&session, bug_report.as_ref())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
