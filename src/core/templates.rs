use crate::models::{Assignment, EmailAddress, EmailFormat, EmailTemplate, Exchange, TemplateConfig};

/// Column at which free-form exchange text is wrapped in emails
pub const WRAP_COLUMN: usize = 75;

/// Notification templates use Windows line endings
pub const TEMPLATE_NEWLINE: &str = "\r\n";

/// Service-wide defaults for exchange notification emails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefaults {
    pub sender_name: String,
    pub sender_address: String,
    pub template_group: String,
    pub email_format: EmailFormat,
    pub template_name: String,
}

/// Fully resolved template settings for one assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub sender_name: String,
    pub email_format: EmailFormat,
    pub template_group: String,
    pub template_name: String,
}

fn pick<T: Clone>(receiver: &Option<T>, exchange: &Option<T>, default: &T) -> T {
    receiver
        .as_ref()
        .or(exchange.as_ref())
        .cloned()
        .unwrap_or_else(|| default.clone())
}

/// Resolve template settings: receiver overrides win over exchange
/// overrides, which win over the service defaults. The template group is
/// never overridden.
pub fn derive_template_config(
    defaults: &MessageDefaults,
    exchange: &Exchange,
    assignment: &Assignment,
) -> ResolvedTemplate {
    let receiver: &TemplateConfig = &assignment.gift_receiver.template_overrides;
    let overrides: &TemplateConfig = &exchange.template_overrides;

    ResolvedTemplate {
        sender_name: pick(&receiver.sender_name, &overrides.sender_name, &defaults.sender_name),
        email_format: pick(&receiver.email_format, &overrides.email_format, &defaults.email_format),
        template_group: defaults.template_group.clone(),
        template_name: pick(&receiver.template_name, &overrides.template_name, &defaults.template_name),
    }
}

/// Word-wrap text at `width` columns, joining lines with `newline`.
///
/// Existing line breaks are kept, a trailing one included; runs of whitespace
/// inside a line collapse to a single space. Words longer than `width` are
/// left intact.
pub fn wrap_line(text: &str, width: usize, newline: &str) -> String {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }

        lines.push(current);
    }

    let mut wrapped = lines.join(newline);
    if text.ends_with('\n') {
        wrapped.push_str(newline);
    }
    wrapped
}

/// Build the notification email for one assignment.
///
/// The exchange is copied before its extra info is wrapped, so the caller's
/// value is left alone. With `organizer_only` the email still names the gift
/// giver but is addressed to the organizer, for dry runs.
pub fn generate_message(
    defaults: &MessageDefaults,
    exchange: &Exchange,
    assignment: &Assignment,
    organizer_only: bool,
) -> EmailTemplate {
    let resolved = derive_template_config(defaults, exchange, assignment);

    let mut exchange = exchange.clone();
    exchange.extra_info = exchange
        .extra_info
        .as_deref()
        .map(|text| wrap_line(text, WRAP_COLUMN, TEMPLATE_NEWLINE));

    let sender = EmailAddress::new(
        Some(&resolved.sender_name),
        Some(&defaults.sender_address),
    );
    let reply_to = EmailAddress::new(
        exchange.organizer.name.as_deref(),
        exchange.organizer.email_address.as_deref(),
    );

    let giver = &assignment.gift_giver;
    let mut recipient = EmailAddress::new(giver.name.as_deref(), giver.email_address.as_deref());
    if organizer_only {
        recipient.address = exchange.organizer.email_address.clone();
    }

    let context = serde_json::json!({
        "exchange": exchange,
        "assignment": assignment,
    });

    EmailTemplate {
        format: resolved.email_format,
        template_group: resolved.template_group,
        template_name: resolved.template_name,
        sender,
        reply_to: Some(reply_to),
        recipients: vec![recipient],
        context,
    }
}
