use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::ServiceError;
use crate::models::{AuditEventSearchRequest, RegisteredUserBatchRequest, RegisteredUserSearchRequest};
use crate::routes::{client_session, validate_request, AppState};

/// Configure administrator routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/audit-events/search", web::post().to(search_audit_events))
        .route("/admin/users/search", web::post().to(search_registered_users))
        .route("/admin/users/delete", web::post().to(delete_registered_users))
        .route("/admin/users/lock", web::post().to(lock_registered_users))
        .route("/admin/users/unlock", web::post().to(unlock_registered_users));
}

async fn search_audit_events(
    state: web::Data<AppState>,
    req: web::Json<AuditEventSearchRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    validate_request(&*req)?;
    let session = client_session(&state, &http_req).await?;
    let results = state
        .admin
        .get_audit_events(&session, &req.criteria, &req.pagination)
        .await?;
    Ok(HttpResponse::Ok().json(results))
}

async fn search_registered_users(
    state: web::Data<AppState>,
    req: web::Json<RegisteredUserSearchRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    validate_request(&*req)?;
    let session = client_session(&state, &http_req).await?;
    let results = state
        .admin
        .get_registered_users(&session, &req.criteria, &req.pagination)
        .await?;
    Ok(HttpResponse::Ok().json(results))
}

async fn delete_registered_users(
    state: web::Data<AppState>,
    req: web::Json<RegisteredUserBatchRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let session = client_session(&state, &http_req).await?;
    state.admin.delete_registered_users(&session, &req.records).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn lock_registered_users(
    state: web::Data<AppState>,
    req: web::Json<RegisteredUserBatchRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let session = client_session(&state, &http_req).await?;
    state.admin.lock_registered_users(&session, &req.records).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn unlock_registered_users(
    state: web::Data<AppState>,
    req: web::Json<RegisteredUserBatchRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let session = client_session(&state, &http_req).await?;
    state.admin.unlock_registered_users(&session, &req.records).await?;
    Ok(HttpResponse::NoContent().finish())
}
