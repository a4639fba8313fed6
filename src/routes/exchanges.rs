use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::{InvalidDataError, MessageKey, ServiceError};
use crate::models::{
    CreateExchangeRequest, Exchange, ExchangeBatchRequest, ExchangeSearchRequest,
    ResendNotificationRequest,
};
use crate::routes::{client_session, validate_request, AppState};

/// Configure all exchange routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/exchanges", web::post().to(create_exchange))
        .route("/exchanges/search", web::post().to(search_exchanges))
        .route("/exchanges/delete", web::post().to(delete_exchanges))
        .route("/exchanges/send", web::post().to(send_notifications))
        .route("/exchanges/resend", web::post().to(resend_notification))
        .route("/exchanges/preview", web::post().to(generate_preview))
        .route("/exchanges/{id}", web::get().to(retrieve_exchange))
        .route("/exchanges/{id}", web::put().to(save_exchange));
}

/// Create exchange endpoint
///
/// POST /api/v1/exchanges
///
/// Request body:
/// ```json
/// { "name": "Office party" }
/// ```
async fn create_exchange(
    state: web::Data<AppState>,
    req: web::Json<CreateExchangeRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    validate_request(&*req)?;
    let session = client_session(&state, &http_req).await?;
    let exchange = state.exchanges.create_exchange(&session, &req.name).await?;
    Ok(HttpResponse::Created().json(exchange))
}

async fn search_exchanges(
    state: web::Data<AppState>,
    req: web::Json<ExchangeSearchRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    validate_request(&*req)?;
    let session = client_session(&state, &http_req).await?;
    let ExchangeSearchRequest { criteria, pagination } = req.into_inner();
    let results = state
        .exchanges
        .get_exchanges(&session, criteria, &pagination)
        .await?;
    Ok(HttpResponse::Ok().json(results))
}

async fn retrieve_exchange(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let exchange_id = path.into_inner();
    let session = client_session(&state, &http_req).await?;

    match state.exchanges.retrieve_exchange(&session, exchange_id).await? {
        Some(exchange) => Ok(HttpResponse::Ok().json(exchange)),
        None => Err(ServiceError::NotFound(format!("Exchange {}", exchange_id))),
    }
}

/// Save exchange endpoint
///
/// PUT /api/v1/exchanges/{id}
///
/// The body id may be omitted; when present it must match the path.
async fn save_exchange(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<Exchange>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let exchange_id = path.into_inner();
    let mut exchange = req.into_inner();

    match exchange.id {
        Some(id) if id != exchange_id => {
            return Err(InvalidDataError::single(
                MessageKey::Invalid,
                "id",
                "Exchange id does not match the request path",
            )
            .into());
        }
        Some(_) => {}
        None => exchange.id = Some(exchange_id),
    }

    let session = client_session(&state, &http_req).await?;
    let saved = state.exchanges.save_exchange(&session, exchange).await?;
    Ok(HttpResponse::Ok().json(saved))
}

async fn delete_exchanges(
    state: web::Data<AppState>,
    req: web::Json<ExchangeBatchRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let session = client_session(&state, &http_req).await?;
    state.exchanges.delete_exchanges(&session, &req.records).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn send_notifications(
    state: web::Data<AppState>,
    req: web::Json<Exchange>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let session = client_session(&state, &http_req).await?;
    let exchange = state
        .exchanges
        .send_notifications(&session, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(exchange))
}

async fn resend_notification(
    state: web::Data<AppState>,
    req: web::Json<ResendNotificationRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let session = client_session(&state, &http_req).await?;
    let ResendNotificationRequest { exchange, participants } = req.into_inner();
    let exchange = state
        .exchanges
        .resend_notification(&session, exchange, &participants)
        .await?;
    Ok(HttpResponse::Ok().json(exchange))
}

async fn generate_preview(
    state: web::Data<AppState>,
    req: web::Json<Exchange>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let session = client_session(&state, &http_req).await?;
    let preview = state.exchanges.generate_preview(&session, &req).await?;
    Ok(HttpResponse::Ok().json(preview))
}
