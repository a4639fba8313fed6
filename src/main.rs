use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use santa_exchange::config::{LoggingSettings, MailTransportKind, Settings, StorageBackend};
use santa_exchange::core::AssignmentGenerator;
use santa_exchange::routes::{self, AppState};
use santa_exchange::rpc::{AdminRpc, BugReportRpc, ExchangeRpc, SessionRpc};
use santa_exchange::services::{
    AuditEventDao, AuditEventService, BugReportService, CacheManager, EmailService, ExchangeDao,
    ExchangeService, HttpMailer, MailTransport, Mailer, MemoryStore, NotificationService,
    PostgresClient, RegisteredUserDao, SessionService, TemplateRenderer,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path parameter errors, e.g. a non-numeric exchange id
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

/// The DAO implementations selected by `storage.backend`
struct Storage {
    exchanges: Arc<dyn ExchangeDao>,
    audit_events: Arc<dyn AuditEventDao>,
    users: Arc<dyn RegisteredUserDao>,
    postgres: Option<Arc<PostgresClient>>,
}

async fn open_storage(settings: &Settings) -> std::io::Result<Storage> {
    match (settings.storage.backend, &settings.database) {
        (StorageBackend::Postgres, Some(database)) => {
            let client = PostgresClient::from_settings(
                &database.url,
                database.max_connections,
                database.min_connections,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            let client = Arc::new(client);
            info!(
                "PostgreSQL storage initialized (max: {} connections)",
                database.max_connections.unwrap_or(10)
            );

            Ok(Storage {
                exchanges: client.clone(),
                audit_events: client.clone(),
                users: client.clone(),
                postgres: Some(client),
            })
        }
        (StorageBackend::Postgres, None) => Err(startup_error(
            "Configuration error",
            "database is not configured for the postgres backend",
        )),
        (StorageBackend::Memory, _) => {
            warn!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            Ok(Storage {
                exchanges: store.clone(),
                audit_events: store.clone(),
                users: store,
                postgres: None,
            })
        }
    }
}

fn open_mailer(settings: &Settings) -> std::io::Result<Arc<dyn EmailService>> {
    let renderer = TemplateRenderer::from_dir(&settings.mail.templates_dir)
        .map_err(|e| startup_error("Failed to load email templates", e))?;

    let transport = match (settings.mail.transport, &settings.mail.endpoint, &settings.mail.api_key) {
        (MailTransportKind::Http, Some(endpoint), Some(api_key)) => {
            let mailer = HttpMailer::new(endpoint.clone(), api_key.clone(), settings.mail.timeout_secs)
                .map_err(|e| startup_error("Failed to build mail client", e))?;
            info!("Mail relay configured at {}", endpoint);
            MailTransport::Http(mailer)
        }
        (MailTransportKind::Http, _, _) => {
            return Err(startup_error(
                "Configuration error",
                "mail.endpoint and mail.api_key are required for the http transport",
            ))
        }
        (MailTransportKind::Log, _, _) => {
            warn!("Mail transport is 'log'; emails will be traced, not delivered");
            MailTransport::Log
        }
    };

    Ok(Arc::new(Mailer::new(renderer, transport)))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Logging is configured from settings, so load them first and report failures afterwards
    let loaded = Settings::load();
    init_logging(&loaded.as_ref().map(|s| s.logging.clone()).unwrap_or_default());

    info!("Starting Santa Exchange service...");

    let settings = loaded.map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let storage = open_storage(&settings).await?;

    // Session cache: Redis is optional, moka always fronts it
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(3600);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(10_000);

    let cache = CacheManager::new(settings.cache.redis_url.as_deref(), l1_cache_size, cache_ttl)
        .await
        .map_err(|e| startup_error("Failed to connect to Redis", e))?;
    let cache = Arc::new(cache);

    info!(
        "Session cache initialized (L1: {} entries, TTL: {}s, redis: {})",
        l1_cache_size,
        cache_ttl,
        cache.has_redis()
    );

    let email = open_mailer(&settings)?;

    let sessions = Arc::new(SessionService::new(
        &settings.auth.jwt_secret,
        settings.auth.issuer.as_deref(),
        settings.auth.audience.as_deref(),
        &settings.auth.admin_users,
        cache.clone(),
    ));

    let audit = Arc::new(AuditEventService::new(storage.audit_events.clone()));
    let notification = Arc::new(NotificationService::new(
        settings.notification.mailing_list(),
        email.clone(),
    ));
    let bug_reports = Arc::new(BugReportService::new(
        settings.bug_report.list.mailing_list(),
        settings.bug_report.template_name.clone(),
        email.clone(),
    ));

    let generator = AssignmentGenerator::new(settings.exchange.max_attempts);
    let operations = Arc::new(ExchangeService::new(
        generator,
        settings.exchange.message_defaults(),
        email,
    ));

    info!(
        "Exchange service initialized (max attempts: {})",
        generator.max_attempts()
    );

    // Build application state
    let app_state = AppState {
        sessions: Arc::new(SessionRpc::new(
            sessions,
            storage.users.clone(),
            audit.clone(),
            notification,
        )),
        exchanges: Arc::new(ExchangeRpc::new(storage.exchanges, operations, audit.clone())),
        admin: Arc::new(AdminRpc::new(storage.audit_events, storage.users, audit)),
        bug_reports: Arc::new(BugReportRpc::new(bug_reports)),
        cache,
        postgres: storage.postgres,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
