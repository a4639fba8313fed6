use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use handlebars::Handlebars;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

use crate::models::{EmailAddress, EmailFormat, EmailMessage, EmailTemplate};

/// Errors that can occur while rendering or delivering email
#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Mail relay returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid mail relay API key")]
    Unauthorized,

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl From<handlebars::TemplateError> for MailError {
    fn from(error: handlebars::TemplateError) -> Self {
        MailError::TemplateError(error.to_string())
    }
}

impl From<handlebars::RenderError> for MailError {
    fn from(error: handlebars::RenderError) -> Self {
        MailError::TemplateError(error.to_string())
    }
}

/// Render and deliver templated email
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Render a template into a concrete message without sending it
    fn generate_email(&self, template: &EmailTemplate) -> Result<EmailMessage, MailError>;

    async fn send_email(&self, message: &EmailMessage) -> Result<(), MailError>;

    async fn send_template(&self, template: &EmailTemplate) -> Result<EmailMessage, MailError> {
        let message = self.generate_email(template)?;
        self.send_email(&message).await?;
        Ok(message)
    }
}

/// Handlebars templates laid out as `<group>/<name>/{subject,plain,html}`
pub struct TemplateRenderer {
    text: Handlebars<'static>,
    html: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Load every `.hbs` file under `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, MailError> {
        let dir = dir.as_ref();
        let mut renderer = Self::empty();
        renderer.text.register_templates_directory(".hbs", dir)?;
        renderer.html.register_templates_directory(".hbs", dir)?;

        tracing::info!(
            "Loaded {} email templates from {}",
            renderer.html.get_templates().len(),
            dir.display()
        );
        Ok(renderer)
    }

    /// Build from in-memory `(name, source)` pairs
    pub fn from_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, MailError> {
        let mut renderer = Self::empty();
        for (name, source) in sources {
            renderer.text.register_template_string(name, source)?;
            renderer.html.register_template_string(name, source)?;
        }
        Ok(renderer)
    }

    fn empty() -> Self {
        // Subject and plaintext bodies must not be HTML-escaped
        let mut text = Handlebars::new();
        text.register_escape_fn(handlebars::no_escape);

        Self {
            text,
            html: Handlebars::new(),
        }
    }

    fn render_part(
        registry: &Handlebars<'static>,
        template: &EmailTemplate,
        part: &str,
    ) -> Result<String, MailError> {
        let name = format!("{}/{}/{}", template.template_group, template.template_name, part);
        if !registry.has_template(&name) {
            return Err(MailError::TemplateError(format!("template {} not found", name)));
        }
        Ok(registry.render(&name, &template.context)?)
    }

    pub fn render(&self, template: &EmailTemplate) -> Result<EmailMessage, MailError> {
        if template.recipients.is_empty() {
            return Err(MailError::InvalidMessage("no recipients".to_string()));
        }

        let subject = Self::render_part(&self.text, template, "subject")?
            .trim()
            .to_string();

        let plaintext = match template.format {
            EmailFormat::Plaintext | EmailFormat::Multipart => {
                Some(Self::render_part(&self.text, template, "plain")?)
            }
            EmailFormat::Html => None,
        };

        let html = match template.format {
            EmailFormat::Html | EmailFormat::Multipart => {
                Some(Self::render_part(&self.html, template, "html")?)
            }
            EmailFormat::Plaintext => None,
        };

        Ok(EmailMessage {
            sender: template.sender.clone(),
            reply_to: template.reply_to.clone(),
            recipients: template.recipients.clone(),
            subject,
            plaintext,
            html,
        })
    }
}

/// Client for an HTTP mail relay accepting JSON messages
pub struct HttpMailer {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: String, timeout_secs: u64) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }

    fn payload(message: &EmailMessage) -> serde_json::Value {
        let addresses = |list: &[EmailAddress]| -> Vec<String> {
            list.iter().map(EmailAddress::mailbox).collect()
        };

        json!({
            "from": message.sender.mailbox(),
            "replyTo": message.reply_to.as_ref().map(EmailAddress::mailbox),
            "to": addresses(&message.recipients),
            "subject": message.subject,
            "text": message.plaintext,
            "html": message.html,
        })
    }

    pub async fn deliver(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::debug!(
            "Posting email '{}' to {} recipient(s)",
            message.subject,
            message.recipients.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .json(&Self::payload(message))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MailError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::ApiError(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}

/// Where rendered messages go
pub enum MailTransport {
    Http(HttpMailer),
    /// Trace the message instead of sending it
    Log,
}

/// Template renderer plus delivery transport
pub struct Mailer {
    renderer: TemplateRenderer,
    transport: MailTransport,
}

impl Mailer {
    pub fn new(renderer: TemplateRenderer, transport: MailTransport) -> Self {
        Self {
            renderer,
            transport,
        }
    }
}

#[async_trait]
impl EmailService for Mailer {
    fn generate_email(&self, template: &EmailTemplate) -> Result<EmailMessage, MailError> {
        self.renderer.render(template)
    }

    async fn send_email(&self, message: &EmailMessage) -> Result<(), MailError> {
        match &self.transport {
            MailTransport::Http(mailer) => mailer.deliver(message).await,
            MailTransport::Log => {
                let to: Vec<String> = message.recipients.iter().map(EmailAddress::mailbox).collect();
                tracing::info!(
                    from = %message.sender.mailbox(),
                    to = ?to,
                    subject = %message.subject,
                    "Email not delivered (log transport)"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_renderer() -> TemplateRenderer {
        TemplateRenderer::from_sources([
            ("test/basic/subject", "Hello {{name}}\n"),
            ("test/basic/plain", "Plain {{name}}"),
            ("test/basic/html", "<p>{{name}}</p>"),
        ])
        .unwrap()
    }

    fn create_template(format: EmailFormat) -> EmailTemplate {
        EmailTemplate {
            format,
            template_group: "test".to_string(),
            template_name: "basic".to_string(),
            sender: EmailAddress::new(Some("Santa"), Some("santa@example.com")),
            reply_to: None,
            recipients: vec![EmailAddress::address_only("ann@example.com")],
            context: json!({ "name": "Ann & Bob" }),
        }
    }

    #[test]
    fn test_render_multipart() {
        let message = create_renderer().render(&create_template(EmailFormat::Multipart)).unwrap();
        assert_eq!(message.subject, "Hello Ann & Bob");
        assert_eq!(message.plaintext.as_deref(), Some("Plain Ann & Bob"));
        assert_eq!(message.html.as_deref(), Some("<p>Ann &amp; Bob</p>"));
    }

    #[test]
    fn test_render_single_part() {
        let renderer = create_renderer();
        let plain = renderer.render(&create_template(EmailFormat::Plaintext)).unwrap();
        assert!(plain.html.is_none());
        let html = renderer.render(&create_template(EmailFormat::Html)).unwrap();
        assert!(html.plaintext.is_none());
    }

    #[test]
    fn test_missing_template_and_recipients() {
        let renderer = create_renderer();
        let mut template = create_template(EmailFormat::Plaintext);
        template.template_name = "other".to_string();
        assert!(matches!(renderer.render(&template), Err(MailError::TemplateError(_))));

        let mut template = create_template(EmailFormat::Plaintext);
        template.recipients.clear();
        assert!(matches!(renderer.render(&template), Err(MailError::InvalidMessage(_))));
    }

    #[tokio::test]
    async fn test_log_transport_sends_nothing() {
        let mailer = Mailer::new(create_renderer(), MailTransport::Log);
        let message = mailer
            .send_template(&create_template(EmailFormat::Multipart))
            .await
            .unwrap();
        assert_eq!(message.recipients.len(), 1);
    }

    #[test]
    fn test_payload_uses_mailboxes() {
        let message = create_renderer().render(&create_template(EmailFormat::Plaintext)).unwrap();
        let payload = HttpMailer::payload(&message);
        assert_eq!(payload["from"], "Santa <santa@example.com>");
        assert_eq!(payload["to"][0], "ann@example.com");
        assert!(payload["html"].is_null());
    }
}
