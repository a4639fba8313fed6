use std::collections::HashSet;

use crate::error::{InvalidDataError, MessageKey, ValidationErrors};
use crate::models::{AuditEventCriteria, BugReport, Exchange, Participant};

#[inline]
fn is_empty(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Check that an exchange has everything needed to generate and send assignments
pub fn validate_exchange(exchange: &Exchange) -> Result<(), InvalidDataError> {
    let mut details = ValidationErrors::new(MessageKey::Invalid, "Exchange is invalid");

    if is_empty(exchange.name.as_deref()) {
        details.add(MessageKey::Required, "name", "Exchange name is required");
    }

    if is_empty(exchange.date_and_time.as_deref()) {
        details.add(MessageKey::Required, "dateAndTime", "Date and time field is required");
    }

    if is_empty(exchange.theme.as_deref()) {
        details.add(MessageKey::Required, "theme", "Theme is required");
    }

    if is_empty(exchange.cost.as_deref()) {
        details.add(MessageKey::Required, "cost", "Suggested cost is required");
    }

    if is_empty(exchange.organizer.name.as_deref()) {
        details.add(MessageKey::Required, "organizerName", "Organizer name is required");
    }

    if is_empty(exchange.organizer.email_address.as_deref())
        && is_empty(exchange.organizer.phone_number.as_deref())
    {
        details.add(
            MessageKey::Required,
            "organizerEmailAddress",
            "Provide either email address, phone number, or both",
        );
    }

    if exchange.participants.len() < 2 {
        details.add(MessageKey::Required, "participants", "At least 2 participants are required");
    }

    validate_participants(&exchange.participants, &mut details);

    details.into_result("Exchange is invalid")
}

fn validate_participants(participants: &[Participant], details: &mut ValidationErrors) {
    let name_invalid = participants.iter().any(|p| is_empty(p.name.as_deref()));
    let nickname_invalid = participants.iter().any(|p| is_empty(p.nickname.as_deref()));
    let email_invalid = participants.iter().any(|p| is_empty(p.email_address.as_deref()));

    if name_invalid {
        details.add(MessageKey::Required, "participantName", "All participants must have a name");
    }

    if nickname_invalid {
        details.add(MessageKey::Required, "participantNickname", "All participants must have a nickname");
    }

    if email_invalid {
        details.add(
            MessageKey::Required,
            "participantEmailAddress",
            "All participants must have an email address",
        );
    }

    // Assignments are keyed on participant id
    if participants.iter().any(|p| p.id.is_none()) {
        details.add(MessageKey::Invalid, "participants", "All participants must have an id");
    } else {
        let mut seen = HashSet::new();
        if !participants.iter().filter_map(|p| p.id).all(|id| seen.insert(id)) {
            details.add(MessageKey::Invalid, "participants", "Participant ids must be unique");
        }
    }
}

pub fn validate_bug_report(bug_report: Option<&BugReport>) -> Result<(), InvalidDataError> {
    let mut details = ValidationErrors::new(MessageKey::Invalid, "Bug report is invalid");

    match bug_report {
        None => details.add_global(MessageKey::Null, "Bug report is null"),
        Some(report) => {
            if report.report_date.is_none() {
                details.add(MessageKey::Required, "reportDate", "Report date is required");
            }

            if is_empty(report.application_version.as_deref()) {
                details.add(MessageKey::Required, "applicationVersion", "Application version is required");
            }

            if report.submitting_user.is_none() {
                details.add(MessageKey::Required, "submittingUser", "Submitting user is required");
            }

            if is_empty(report.problem_summary.as_deref()) {
                details.add(MessageKey::Required, "problemSummary", "Summary is required");
            }

            if is_empty(report.detailed_description.as_deref()) {
                details.add(MessageKey::Required, "detailedDescription", "Description is required");
            }
        }
    }

    details.into_result("Bug report is invalid")
}

pub fn validate_audit_criteria(criteria: &AuditEventCriteria) -> Result<(), InvalidDataError> {
    let mut details = ValidationErrors::new(MessageKey::Invalid, "Search criteria are invalid");

    if criteria.start_date.is_none() && criteria.end_date.is_none() {
        details.add(MessageKey::Required, "startDate", "Provide either start date or end date");
    }

    details.into_result("Search criteria are invalid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FederatedUser, OpenIdProvider, Organizer};
    use chrono::Utc;

    fn valid_exchange() -> Exchange {
        Exchange {
            name: Some("Family".to_string()),
            date_and_time: Some("Dec 24, 6pm".to_string()),
            theme: Some("Books".to_string()),
            cost: Some("$20".to_string()),
            organizer: Organizer::new("Ken", "ken@example.com", "555-1212"),
            participants: vec![
                Participant::new(1, "Ann", "A", "ann@example.com"),
                Participant::new(2, "Bob", "B", "bob@example.com"),
            ],
            ..Exchange::default()
        }
    }

    fn fields(exchange: &Exchange) -> Vec<String> {
        validate_exchange(exchange)
            .unwrap_err()
            .details
            .messages
            .into_iter()
            .filter_map(|m| m.context)
            .collect()
    }

    #[test]
    fn test_valid_exchange() {
        assert!(validate_exchange(&valid_exchange()).is_ok());
    }

    #[test]
    fn test_optional_fields() {
        let mut exchange = valid_exchange();
        exchange.id = None;
        exchange.exchange_state = None;
        exchange.extra_info = None;
        exchange.organizer.phone_number = None;
        assert!(validate_exchange(&exchange).is_ok());

        let mut exchange = valid_exchange();
        exchange.organizer.email_address = None;
        assert!(validate_exchange(&exchange).is_ok());
    }

    #[test]
    fn test_required_fields() {
        let mut exchange = valid_exchange();
        exchange.name = Some("   ".to_string());
        exchange.theme = None;
        exchange.cost = Some(String::new());
        exchange.date_and_time = None;
        exchange.organizer.name = None;
        assert_eq!(fields(&exchange), vec!["name", "dateAndTime", "theme", "cost", "organizerName"]);
    }

    #[test]
    fn test_organizer_contact_required() {
        let mut exchange = valid_exchange();
        exchange.organizer.email_address = None;
        exchange.organizer.phone_number = None;
        assert_eq!(fields(&exchange), vec!["organizerEmailAddress"]);
    }

    #[test]
    fn test_participant_rules() {
        let mut exchange = valid_exchange();
        exchange.participants.truncate(1);
        exchange.participants[0].nickname = None;
        assert_eq!(fields(&exchange), vec!["participants", "participantNickname"]);

        let mut exchange = valid_exchange();
        exchange.participants[1].id = Some(1);
        let error = validate_exchange(&exchange).unwrap_err();
        assert_eq!(error.details.messages[0].text, "Participant ids must be unique");

        let mut exchange = valid_exchange();
        exchange.participants[0].id = None;
        let error = validate_exchange(&exchange).unwrap_err();
        assert_eq!(error.details.messages[0].key, MessageKey::Invalid);
    }

    #[test]
    fn test_bug_report_validation() {
        assert!(validate_bug_report(None).is_err());

        let report = BugReport {
            report_date: Some(Utc::now()),
            application_version: Some("1.0".to_string()),
            submitting_user: Some(FederatedUser {
                user_id: "u".to_string(),
                user_name: None,
                email_address: None,
                open_id_provider: OpenIdProvider::Google,
                federated_identity: None,
                authentication_domain: None,
                admin: false,
            }),
            email_address: None,
            problem_summary: Some("Broken".to_string()),
            detailed_description: Some("It broke".to_string()),
        };
        assert!(validate_bug_report(Some(&report)).is_ok());

        let mut missing = report.clone();
        missing.problem_summary = None;
        let error = validate_bug_report(Some(&missing)).unwrap_err();
        assert!(error.details.has_field("problemSummary"));
    }

    #[test]
    fn test_audit_criteria_needs_a_date() {
        assert!(validate_audit_criteria(&AuditEventCriteria::default()).is_err());
        let criteria = AuditEventCriteria {
            end_date: Some(Utc::now()),
            ..AuditEventCriteria::default()
        };
        assert!(validate_audit_criteria(&criteria).is_ok());
    }
}
