//! RPC operations invoked by the HTTP routes.
//!
//! Each operation takes the caller's resolved `ClientSession`. Validation
//! and permission faults pass through unchanged; anything else is logged
//! and wrapped as an internal error naming the operation.

pub mod admin;
pub mod bug_report;
pub mod exchange;
pub mod session;

pub use admin::AdminRpc;
pub use bug_report::BugReportRpc;
pub use exchange::ExchangeRpc;
pub use session::SessionRpc;

use crate::error::ServiceError;
use crate::models::ClientSession;

/// User id of a logged-in session
pub(crate) fn require_user(session: &ClientSession) -> Result<&str, ServiceError> {
    session.user_id().ok_or(ServiceError::NotAuthenticated)
}

/// User id of a logged-in administrator
pub(crate) fn require_admin(session: &ClientSession) -> Result<&str, ServiceError> {
    let user_id = require_user(session)?;
    if !session.is_admin() {
        return Err(ServiceError::Security(
            "Operation is restricted to administrators".to_string(),
        ));
    }
    Ok(user_id)
}

/// Error mapper for an RPC operation: pass known faults through, wrap the rest
pub(crate) fn rethrow(context: &'static str) -> impl FnOnce(ServiceError) -> ServiceError {
    move |error| {
        if error.is_passthrough() {
            return error;
        }
        tracing::error!("{}: {}", context, error);
        ServiceError::wrap(context, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FederatedUser, OpenIdProvider};
    use chrono::Utc;

    fn create_session(user: Option<bool>) -> ClientSession {
        ClientSession {
            session_id: "s".to_string(),
            current_user: user.map(|admin| FederatedUser {
                user_id: "u".to_string(),
                user_name: None,
                email_address: None,
                open_id_provider: OpenIdProvider::Unknown,
                federated_identity: None,
                authentication_domain: None,
                admin,
            }),
            registered_user: None,
            established: Utc::now(),
        }
    }

    #[test]
    fn test_require_user_and_admin() {
        assert!(matches!(require_user(&create_session(None)), Err(ServiceError::NotAuthenticated)));
        assert_eq!(require_user(&create_session(Some(false))).unwrap(), "u");
        assert!(matches!(require_admin(&create_session(Some(false))), Err(ServiceError::Security(_))));
        assert_eq!(require_admin(&create_session(Some(true))).unwrap(), "u");
    }

    #[test]
    fn test_rethrow() {
        let error = rethrow("Error saving exchange")(ServiceError::internal("boom"));
        assert_eq!(error.to_string(), "Error saving exchange: boom");

        let error = rethrow("Error saving exchange")(ServiceError::NotAuthenticated);
        assert!(matches!(error, ServiceError::NotAuthenticated));
    }
}
