use std::sync::Arc;

use chrono::Utc;

use crate::error::ServiceError;
use crate::models::{ClientSession, FederatedUser, RegisteredUser};
use crate::rpc::rethrow;
use crate::services::audit::AuditEventService;
use crate::services::dao::RegisteredUserDao;
use crate::services::notification::NotificationService;
use crate::services::sessions::{SessionError, SessionService};

pub const LOCKED_ACCOUNT: &str = "User account is locked";

impl From<SessionError> for ServiceError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::InvalidToken(e) => {
                tracing::warn!("Rejected identity token: {}", e);
                ServiceError::NotAuthenticated
            }
            SessionError::NotFound(_) => ServiceError::NotAuthenticated,
            other => ServiceError::wrap("Session cache failure", other),
        }
    }
}

/// Login, logout and session lookup
pub struct SessionRpc {
    sessions: Arc<SessionService>,
    users: Arc<dyn RegisteredUserDao>,
    audit: Arc<AuditEventService>,
    notification: Arc<NotificationService>,
}

impl SessionRpc {
    pub fn new(
        sessions: Arc<SessionService>,
        users: Arc<dyn RegisteredUserDao>,
        audit: Arc<AuditEventService>,
        notification: Arc<NotificationService>,
    ) -> Self {
        Self {
            sessions,
            users,
            audit,
            notification,
        }
    }

    /// Find the registered user, registering them on first login
    async fn find_or_register(&self, user: &FederatedUser) -> Result<(RegisteredUser, bool), ServiceError> {
        match self.users.retrieve_registered_user(&user.user_id).await? {
            Some(registered) => Ok((registered, false)),
            None => {
                let registered = RegisteredUser::register(user, Utc::now());
                self.users.insert_registered_user(&registered).await?;
                tracing::info!("Registered new user {}", registered.user_id);
                Ok((registered, true))
            }
        }
    }

    async fn record_new_login(&self, mut registered: RegisteredUser, admin: bool) -> Result<RegisteredUser, ServiceError> {
        registered.logins += 1;
        registered.last_login = Some(Utc::now());
        registered.admin = admin;
        self.users.update_registered_user(&registered).await?;
        Ok(registered)
    }

    pub async fn login(&self, identity_token: &str) -> Result<ClientSession, ServiceError> {
        async {
            let user = self.sessions.verify_identity_token(identity_token)?;
            let (registered, first_login) = self.find_or_register(&user).await?;

            if registered.locked {
                tracing::warn!("Locked user {} attempted to log in", registered.user_id);
                return Err(ServiceError::Security(LOCKED_ACCOUNT.to_string()));
            }

            let registered = self.record_new_login(registered, user.admin).await?;
            let session = self.sessions.establish(user, registered.clone()).await?;

            if first_login {
                let event = AuditEventService::build_register_user_event(&session);
                self.audit.log_audit_event(event).await?;

                // A mail outage should not block the login itself
                if let Err(e) = self.notification.notify_registered_user(&registered).await {
                    tracing::warn!("Registration notice not sent: {}", e);
                }
            }

            self.audit
                .log_audit_event(AuditEventService::build_login_event(&session))
                .await?;

            tracing::info!(
                "Logged in user {} (admin={})",
                registered.user_id,
                session.is_admin()
            );
            Ok::<_, ServiceError>(session)
        }
        .await
        .map_err(rethrow("Error logging in"))
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), ServiceError> {
        self.sessions
            .invalidate(session_id)
            .await
            .map_err(ServiceError::from)
            .map_err(rethrow("Error logging out"))
    }

    /// Look up a live session, rejecting users locked since they logged in
    pub async fn current_session(&self, session_id: &str) -> Result<ClientSession, ServiceError> {
        async {
            let mut session = self.sessions.retrieve(session_id).await?;

            if let Some(user_id) = session.user_id().map(str::to_string) {
                let registered = self.users.retrieve_registered_user(&user_id).await?;
                match registered {
                    Some(registered) if registered.locked => {
                        self.sessions.invalidate(session_id).await?;
                        return Err(ServiceError::Security(LOCKED_ACCOUNT.to_string()));
                    }
                    Some(registered) => session.registered_user = Some(registered),
                    None => {
                        self.sessions.invalidate(session_id).await?;
                        return Err(ServiceError::NotAuthenticated);
                    }
                }
            }

            Ok::<_, ServiceError>(session)
        }
        .await
        .map_err(rethrow("Error retrieving session"))
    }
}
