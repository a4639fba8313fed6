// Service exports
pub mod audit;
pub mod bug_report;
pub mod cache;
pub mod dao;
pub mod exchange;
pub mod mailer;
pub mod memory;
pub mod notification;
pub mod postgres;
pub mod sessions;

pub use audit::AuditEventService;
pub use bug_report::BugReportService;
pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use dao::{AuditEventDao, DaoError, ExchangeDao, RegisteredUserDao};
pub use exchange::{ExchangeOperations, ExchangeService};
pub use mailer::{EmailService, HttpMailer, MailError, MailTransport, Mailer, TemplateRenderer};
pub use memory::MemoryStore;
pub use notification::{MailingList, NotificationService};
pub use postgres::PostgresClient;
pub use sessions::{IdentityClaims, SessionError, SessionService};
