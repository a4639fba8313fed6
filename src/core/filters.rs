use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::{
    AuditEvent, AuditEventCriteria, Exchange, ExchangeCriteria, RegisteredUser,
    RegisteredUserCriteria, RegisteredUserSortColumn, SortDirection,
};

/// An empty or missing list places no restriction
#[inline]
fn in_list<T: PartialEq>(list: &Option<Vec<T>>, value: &T) -> bool {
    match list {
        Some(values) if !values.is_empty() => values.contains(value),
        _ => true,
    }
}

/// Inclusive date range check; open on whichever end is missing
#[inline]
fn in_range(
    value: Option<DateTime<Utc>>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }

    let Some(value) = value else {
        return false;
    };

    start.map_or(true, |s| value >= s) && end.map_or(true, |e| value <= e)
}

pub fn matches_exchange_criteria(criteria: &ExchangeCriteria, exchange: &Exchange) -> bool {
    criteria.user_id == exchange.user_id
        && match (&criteria.exchange_ids, exchange.id) {
            (Some(ids), Some(id)) if !ids.is_empty() => ids.contains(&id),
            (Some(ids), None) if !ids.is_empty() => false,
            _ => true,
        }
}

pub fn matches_audit_criteria(criteria: &AuditEventCriteria, event: &AuditEvent) -> bool {
    in_list(&criteria.event_types, &event.event_type)
        && match &event.user_id {
            Some(user_id) => in_list(&criteria.user_ids, user_id),
            None => criteria.user_ids.as_ref().map_or(true, Vec::is_empty),
        }
        && in_range(Some(event.event_timestamp), criteria.start_date, criteria.end_date)
}

pub fn matches_registered_user_criteria(
    criteria: &RegisteredUserCriteria,
    user: &RegisteredUser,
) -> bool {
    let user_name_ok = match &user.user_name {
        Some(name) => in_list(&criteria.user_names, name),
        None => criteria.user_names.as_ref().map_or(true, Vec::is_empty),
    };

    in_list(&criteria.user_ids, &user.user_id)
        && user_name_ok
        && in_list(&criteria.open_id_providers, &user.open_id_provider)
        && criteria.admin.map_or(true, |admin| user.admin == admin)
        && criteria.locked.map_or(true, |locked| user.locked == locked)
        && in_range(Some(user.registration_date), criteria.start_date, criteria.end_date)
}

fn compare_users(column: RegisteredUserSortColumn, a: &RegisteredUser, b: &RegisteredUser) -> Ordering {
    match column {
        RegisteredUserSortColumn::UserId => a.user_id.cmp(&b.user_id),
        RegisteredUserSortColumn::UserName => a.user_name.cmp(&b.user_name),
        RegisteredUserSortColumn::RegistrationDate => a.registration_date.cmp(&b.registration_date),
        RegisteredUserSortColumn::OpenIdProvider => {
            a.open_id_provider.as_str().cmp(b.open_id_provider.as_str())
        }
        RegisteredUserSortColumn::Logins => a.logins.cmp(&b.logins),
        RegisteredUserSortColumn::LastLogin => a.last_login.cmp(&b.last_login),
        RegisteredUserSortColumn::Admin => a.admin.cmp(&b.admin),
        RegisteredUserSortColumn::Locked => a.locked.cmp(&b.locked),
    }
}

/// Sort users by the criteria's column (user name by default), ties broken by user id
pub fn sort_registered_users(users: &mut [RegisteredUser], criteria: &RegisteredUserCriteria) {
    let column = criteria.sort_column.unwrap_or_default();
    let direction = criteria.sort_direction.unwrap_or_default();

    users.sort_by(|a, b| {
        let ordering = compare_users(column, a, b).then_with(|| a.user_id.cmp(&b.user_id));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditEventType, OpenIdProvider};
    use chrono::Duration;

    fn user(id: &str, name: &str, admin: bool, locked: bool, registered: DateTime<Utc>) -> RegisteredUser {
        RegisteredUser {
            user_id: id.to_string(),
            user_name: Some(name.to_string()),
            registration_date: registered,
            authentication_domain: None,
            open_id_provider: OpenIdProvider::Google,
            federated_identity: None,
            email_address: None,
            logins: 1,
            last_login: None,
            admin,
            locked,
        }
    }

    #[test]
    fn test_exchange_criteria() {
        let exchange = Exchange {
            id: Some(3),
            user_id: Some("me".to_string()),
            ..Exchange::default()
        };

        assert!(matches_exchange_criteria(&ExchangeCriteria::for_user("me"), &exchange));
        assert!(!matches_exchange_criteria(&ExchangeCriteria::for_user("you"), &exchange));

        let mut criteria = ExchangeCriteria::for_user("me");
        criteria.exchange_ids = Some(vec![1, 3]);
        assert!(matches_exchange_criteria(&criteria, &exchange));
        criteria.exchange_ids = Some(vec![1, 2]);
        assert!(!matches_exchange_criteria(&criteria, &exchange));
        criteria.exchange_ids = Some(vec![]);
        assert!(matches_exchange_criteria(&criteria, &exchange));
    }

    #[test]
    fn test_audit_criteria() {
        let now = Utc::now();
        let event = AuditEvent {
            event_id: Some(1),
            event_type: AuditEventType::UserLogin,
            event_timestamp: now,
            user_id: Some("u1".to_string()),
            session_id: None,
            extra_data: vec![],
        };

        let mut criteria = AuditEventCriteria {
            start_date: Some(now - Duration::hours(1)),
            ..AuditEventCriteria::default()
        };
        assert!(matches_audit_criteria(&criteria, &event));

        criteria.event_types = Some(vec![AuditEventType::AdminLogin]);
        assert!(!matches_audit_criteria(&criteria, &event));

        criteria.event_types = Some(vec![AuditEventType::UserLogin]);
        criteria.user_ids = Some(vec!["u2".to_string()]);
        assert!(!matches_audit_criteria(&criteria, &event));

        criteria.user_ids = None;
        criteria.end_date = Some(now - Duration::minutes(1));
        assert!(!matches_audit_criteria(&criteria, &event));
    }

    #[test]
    fn test_registered_user_criteria() {
        let now = Utc::now();
        let admin = user("a", "Alice", true, false, now);
        let locked = user("b", "Bob", false, true, now - Duration::days(10));

        let criteria = RegisteredUserCriteria {
            admin: Some(true),
            ..RegisteredUserCriteria::default()
        };
        assert!(matches_registered_user_criteria(&criteria, &admin));
        assert!(!matches_registered_user_criteria(&criteria, &locked));

        let criteria = RegisteredUserCriteria {
            locked: Some(true),
            start_date: Some(now - Duration::days(20)),
            end_date: Some(now - Duration::days(5)),
            ..RegisteredUserCriteria::default()
        };
        assert!(matches_registered_user_criteria(&criteria, &locked));
        assert!(!matches_registered_user_criteria(&criteria, &admin));

        let criteria = RegisteredUserCriteria {
            user_names: Some(vec!["Bob".to_string()]),
            open_id_providers: Some(vec![OpenIdProvider::Google]),
            ..RegisteredUserCriteria::default()
        };
        assert!(matches_registered_user_criteria(&criteria, &locked));
        assert!(!matches_registered_user_criteria(&criteria, &admin));
    }

    #[test]
    fn test_sort_registered_users() {
        let now = Utc::now();
        let mut users = vec![
            user("c", "Carol", false, false, now),
            user("a", "Alice", false, false, now - Duration::days(1)),
            user("b", "Bob", false, false, now - Duration::days(2)),
        ];

        sort_registered_users(&mut users, &RegisteredUserCriteria::default());
        let names: Vec<_> = users.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let criteria = RegisteredUserCriteria {
            sort_column: Some(RegisteredUserSortColumn::RegistrationDate),
            sort_direction: Some(SortDirection::Descending),
            ..RegisteredUserCriteria::default()
        };
        sort_registered_users(&mut users, &criteria);
        let names: Vec<_> = users.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
