use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::ServiceError;
use crate::models::{LoginRequest, LoginResponse};
use crate::routes::{client_session, session_id, validate_request, AppState};

/// Configure login and session routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/session/login", web::post().to(login))
        .route("/session/logout", web::post().to(logout))
        .route("/session/current", web::get().to(current));
}

/// Login endpoint
///
/// POST /api/v1/session/login
///
/// Request body:
/// ```json
/// { "identityToken": "<signed JWT from the identity provider>" }
/// ```
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    validate_request(&*req)?;

    let session = state.sessions.login(&req.identity_token).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        session_id: session.session_id.clone(),
        session,
    }))
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let session_id = session_id(&req)?;
    state.sessions.logout(session_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn current(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let session = client_session(&state, &req).await?;
    Ok(HttpResponse::Ok().json(session))
}
