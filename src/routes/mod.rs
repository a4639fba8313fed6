// Route exports
pub mod admin;
pub mod bug_reports;
pub mod exchanges;
pub mod session;

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use std::sync::Arc;
use validator::Validate;

use crate::error::{InvalidDataError, MessageKey, ServiceError, ValidationErrors};
use crate::models::{ClientSession, ErrorResponse, HealthResponse};
use crate::rpc::{AdminRpc, BugReportRpc, ExchangeRpc, SessionRpc};
use crate::services::{CacheManager, PostgresClient};

/// Header carrying the session id returned by login
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRpc>,
    pub exchanges: Arc<ExchangeRpc>,
    pub admin: Arc<AdminRpc>,
    pub bug_reports: Arc<BugReportRpc>,
    pub cache: Arc<CacheManager>,
    /// Present when exchanges are stored in PostgreSQL
    pub postgres: Option<Arc<PostgresClient>>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(session::configure)
            .configure(exchanges::configure)
            .configure(admin::configure)
            .configure(bug_reports::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.is_ok(),
        None => true,
    };

    let status = if db_healthy { "healthy" } else { "degraded" };
    let cache = state.cache.stats();

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        cached_sessions: cache.l1_size,
        redis_enabled: cache.redis_enabled,
    })
}

/// Resolve the caller's session from the `X-Session-Id` header
pub(crate) async fn client_session(
    state: &AppState,
    req: &HttpRequest,
) -> Result<ClientSession, ServiceError> {
    let session_id = session_id(req)?;
    state.sessions.current_session(session_id).await
}

pub(crate) fn session_id(req: &HttpRequest) -> Result<&str, ServiceError> {
    req.headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(ServiceError::NotAuthenticated)
}

/// Run the request's `validator` rules, reporting failures as invalid data
pub(crate) fn validate_request<T: Validate>(request: &T) -> Result<(), ServiceError> {
    request.validate().map_err(|errors| {
        tracing::info!("Request validation failed: {}", errors);

        let mut details = ValidationErrors::new(MessageKey::Invalid, "Request is invalid");
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let text = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                details.add(MessageKey::Invalid, field.as_ref(), text);
            }
        }
        if details.is_empty() {
            details.add_global(MessageKey::Invalid, errors.to_string());
        }

        ServiceError::InvalidData(InvalidDataError::with_details("Request is invalid", details))
    })
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidData(_) => StatusCode::BAD_REQUEST,
            ServiceError::Security(_) => StatusCode::FORBIDDEN,
            ServiceError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error, details) = match self {
            ServiceError::InvalidData(e) => ("invalid_data", serde_json::to_value(&e.details).ok()),
            ServiceError::Security(_) => ("security_violation", None),
            ServiceError::NotAuthenticated => ("not_authenticated", None),
            ServiceError::NotFound(_) => ("not_found", None),
            ServiceError::Internal { .. } => ("internal_error", None),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateExchangeRequest;
    use actix_web::test::TestRequest;

    #[test]
    fn test_status_codes() {
        let invalid = InvalidDataError::single(MessageKey::Required, "name", "Name is required");
        assert_eq!(ServiceError::from(invalid).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::Security("no".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ServiceError::NotAuthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_session_id_header() {
        let req = TestRequest::default()
            .insert_header((SESSION_HEADER, "abc"))
            .to_http_request();
        assert_eq!(session_id(&req).unwrap(), "abc");

        let req = TestRequest::default().to_http_request();
        assert!(matches!(session_id(&req), Err(ServiceError::NotAuthenticated)));
    }

    #[test]
    fn test_validate_request_reports_fields() {
        let request = CreateExchangeRequest { name: String::new() };
        match validate_request(&request) {
            Err(ServiceError::InvalidData(e)) => assert!(e.details.has_field("name")),
            other => panic!("expected invalid data, got {:?}", other),
        }
    }
}
