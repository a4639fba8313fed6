use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Federated identity providers we accept logins from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpenIdProvider {
    Google,
    Yahoo,
    Aol,
    MyOpenId,
    Unknown,
}

impl OpenIdProvider {
    pub fn from_claim(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("google") => OpenIdProvider::Google,
            Some("yahoo") => OpenIdProvider::Yahoo,
            Some("aol") => OpenIdProvider::Aol,
            Some("myopenid") => OpenIdProvider::MyOpenId,
            _ => OpenIdProvider::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpenIdProvider::Google => "GOOGLE",
            OpenIdProvider::Yahoo => "YAHOO",
            OpenIdProvider::Aol => "AOL",
            OpenIdProvider::MyOpenId => "MY_OPEN_ID",
            OpenIdProvider::Unknown => "UNKNOWN",
        }
    }

    /// Inverse of `as_str`; anything unrecognised is `Unknown`
    pub fn parse(value: &str) -> Self {
        match value {
            "GOOGLE" => OpenIdProvider::Google,
            "YAHOO" => OpenIdProvider::Yahoo,
            "AOL" => OpenIdProvider::Aol,
            "MY_OPEN_ID" => OpenIdProvider::MyOpenId,
            _ => OpenIdProvider::Unknown,
        }
    }
}

/// Identity established by the federated login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedUser {
    pub user_id: String,
    pub user_name: Option<String>,
    pub email_address: Option<String>,
    pub open_id_provider: OpenIdProvider,
    pub federated_identity: Option<String>,
    pub authentication_domain: Option<String>,
    pub admin: bool,
}

/// A user who has logged in at least once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub registration_date: DateTime<Utc>,
    #[serde(default)]
    pub authentication_domain: Option<String>,
    pub open_id_provider: OpenIdProvider,
    #[serde(default)]
    pub federated_identity: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub logins: i32,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub locked: bool,
}

impl RegisteredUser {
    /// Build the registration record for a first-time login
    pub fn register(user: &FederatedUser, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user.user_id.clone(),
            user_name: user.user_name.clone(),
            registration_date: now,
            authentication_domain: user.authentication_domain.clone(),
            open_id_provider: user.open_id_provider,
            federated_identity: user.federated_identity.clone(),
            email_address: user.email_address.clone(),
            logins: 0,
            last_login: None,
            admin: user.admin,
            locked: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisteredUserSortColumn {
    UserId,
    #[default]
    UserName,
    RegistrationDate,
    OpenIdProvider,
    Logins,
    LastLogin,
    Admin,
    Locked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Search criteria for registered users
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUserCriteria {
    #[serde(default)]
    pub user_ids: Option<Vec<String>>,
    #[serde(default)]
    pub user_names: Option<Vec<String>>,
    #[serde(default)]
    pub open_id_providers: Option<Vec<OpenIdProvider>>,
    #[serde(default)]
    pub admin: Option<bool>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_column: Option<RegisteredUserSortColumn>,
    #[serde(default)]
    pub sort_direction: Option<SortDirection>,
}

/// Server-side session for a logged-in client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSession {
    pub session_id: String,
    pub current_user: Option<FederatedUser>,
    pub registered_user: Option<RegisteredUser>,
    pub established: DateTime<Utc>,
}

impl ClientSession {
    pub fn is_logged_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(|user| user.admin)
    }

    pub fn is_locked(&self) -> bool {
        self.registered_user.as_ref().is_some_and(|user| user.locked)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.current_user.as_ref().map(|user| user.user_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn federated(admin: bool) -> FederatedUser {
        FederatedUser {
            user_id: "abc".to_string(),
            user_name: Some("Ken".to_string()),
            email_address: Some("ken@example.com".to_string()),
            open_id_provider: OpenIdProvider::Google,
            federated_identity: Some("https://id.example.com/abc".to_string()),
            authentication_domain: Some("example.com".to_string()),
            admin,
        }
    }

    #[test]
    fn test_provider_from_claim() {
        assert_eq!(OpenIdProvider::from_claim(Some("Google")), OpenIdProvider::Google);
        assert_eq!(OpenIdProvider::from_claim(Some("other")), OpenIdProvider::Unknown);
        assert_eq!(OpenIdProvider::from_claim(None), OpenIdProvider::Unknown);
    }

    #[test]
    fn test_register_copies_identity() {
        let now = Utc::now();
        let user = RegisteredUser::register(&federated(true), now);
        assert_eq!(user.user_id, "abc");
        assert_eq!(user.registration_date, now);
        assert_eq!(user.logins, 0);
        assert!(user.admin);
        assert!(!user.locked);
    }

    #[test]
    fn test_session_flags() {
        let mut session = ClientSession {
            session_id: "s".to_string(),
            current_user: None,
            registered_user: None,
            established: Utc::now(),
        };
        assert!(!session.is_logged_in());
        assert!(!session.is_admin());
        assert!(!session.is_locked());

        session.current_user = Some(federated(true));
        let mut registered = RegisteredUser::register(&federated(true), Utc::now());
        registered.locked = true;
        session.registered_user = Some(registered);
        assert!(session.is_logged_in());
        assert!(session.is_admin());
        assert!(session.is_locked());
        assert_eq!(session.user_id(), Some("abc"));
    }
}
