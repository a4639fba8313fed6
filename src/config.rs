use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::core::templates::MessageDefaults;
use crate::models::{EmailAddress, EmailFormat};
use crate::services::notification::MailingList;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub cache: CacheSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub mail: MailSettings,
    pub exchange: ExchangeSettings,
    pub notification: NotificationSettings,
    pub bug_report: BugReportSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    #[serde(default)]
    pub admin_users: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransportKind {
    Http,
    #[default]
    Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
    #[serde(default)]
    pub transport: MailTransportKind,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            transport: MailTransportKind::default(),
            endpoint: None,
            api_key: None,
            templates_dir: default_templates_dir(),
            timeout_secs: default_mail_timeout(),
        }
    }
}

fn default_templates_dir() -> String { "templates".to_string() }
fn default_mail_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeSettings {
    pub template_group: String,
    pub sender_name: String,
    pub sender_address: String,
    #[serde(default = "default_email_format")]
    pub default_email_format: EmailFormat,
    pub default_template_name: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_email_format() -> EmailFormat { EmailFormat::Multipart }
fn default_max_attempts() -> u32 { 1000 }

impl ExchangeSettings {
    pub fn message_defaults(&self) -> MessageDefaults {
        MessageDefaults {
            sender_name: self.sender_name.clone(),
            sender_address: self.sender_address.clone(),
            template_group: self.template_group.clone(),
            email_format: self.default_email_format,
            template_name: self.default_template_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    pub template_group: String,
    pub sender_name: String,
    pub sender_address: String,
    pub reply_to_address: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl NotificationSettings {
    pub fn mailing_list(&self) -> MailingList {
        MailingList {
            sender: EmailAddress::new(Some(&self.sender_name), Some(&self.sender_address)),
            reply_to: self.reply_to_address.as_deref().map(EmailAddress::address_only),
            recipients: self
                .recipients
                .iter()
                .map(|address| EmailAddress::address_only(address))
                .collect(),
            template_group: self.template_group.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BugReportSettings {
    #[serde(flatten)]
    pub list: NotificationSettings,
    pub template_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

fn environment() -> Environment {
    // e.g., SANTA__SERVER__PORT -> server.port
    Environment::with_prefix("SANTA")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("auth.admin_users")
        .with_list_parse_key("notification.recipients")
        .with_list_parse_key("bug_report.recipients")
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Configuration file (config/default.toml)
    /// 2. Local overrides (config/local.toml)
    /// 3. Environment variables (prefixed with SANTA__)
    ///
    /// A bare `DATABASE_URL` also overrides `database.url`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment());

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations the services cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchange.max_attempts < 1 {
            return Err(ConfigError::Message(
                "exchange.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.notification.recipients.is_empty() {
            return Err(ConfigError::Message(
                "notification.recipients is not configured".to_string(),
            ));
        }

        if self.bug_report.list.recipients.is_empty() {
            return Err(ConfigError::Message(
                "bug_report.recipients is not configured".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Postgres && self.database.is_none() {
            return Err(ConfigError::Message(
                "database is not configured for the postgres backend".to_string(),
            ));
        }

        if self.mail.transport == MailTransportKind::Http
            && (self.mail.endpoint.is_none() || self.mail.api_key.is_none())
        {
            return Err(ConfigError::Message(
                "mail.endpoint and mail.api_key are required for the http transport".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [auth]
        jwt_secret = "secret"
        admin_users = ["boss"]

        [exchange]
        template_group = "exchange"
        sender_name = "Secret Santa"
        sender_address = "santa@example.com"
        default_template_name = "standard"
        max_attempts = 50

        [notification]
        template_group = "notification"
        sender_name = "Secret Santa"
        sender_address = "santa@example.com"
        recipients = ["admin@example.com"]

        [bug_report]
        template_group = "bugreport"
        template_name = "standard"
        sender_name = "Secret Santa"
        sender_address = "santa@example.com"
        reply_to_address = "noreply@example.com"
        recipients = ["bugs@example.com"]
    "#;

    fn parse(source: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_sample_settings() {
        let settings = parse(SAMPLE);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
        assert_eq!(settings.mail.transport, MailTransportKind::Log);
        assert_eq!(settings.mail.templates_dir, "templates");
        assert_eq!(settings.exchange.default_email_format, EmailFormat::Multipart);

        let defaults = settings.exchange.message_defaults();
        assert_eq!(defaults.template_name, "standard");
        assert_eq!(defaults.sender_address, "santa@example.com");

        let list = settings.bug_report.list.mailing_list();
        assert_eq!(list.recipients[0].address.as_deref(), Some("bugs@example.com"));
        assert_eq!(list.reply_to, Some(EmailAddress::address_only("noreply@example.com")));
    }

    #[test]
    fn test_validation_failures() {
        let mut settings = parse(SAMPLE);
        settings.exchange.max_attempts = 0;
        assert!(settings.validate().is_err());

        let mut settings = parse(SAMPLE);
        settings.notification.recipients.clear();
        assert!(settings.validate().is_err());

        let mut settings = parse(SAMPLE);
        settings.storage.backend = StorageBackend::Postgres;
        assert!(settings.validate().is_err());

        let mut settings = parse(SAMPLE);
        settings.mail.transport = MailTransportKind::Http;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }
}
