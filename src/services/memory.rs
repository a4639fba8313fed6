use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::filters::{
    matches_audit_criteria, matches_exchange_criteria, matches_registered_user_criteria,
    sort_registered_users,
};
use crate::models::{
    AuditEvent, AuditEventCriteria, Exchange, ExchangeCriteria, PaginatedResults, Pagination,
    RegisteredUser, RegisteredUserCriteria,
};
use crate::services::dao::{require_user_id, AuditEventDao, DaoError, ExchangeDao, RegisteredUserDao};

#[derive(Default)]
struct Tables {
    next_exchange_id: i64,
    next_event_id: i64,
    exchanges: BTreeMap<i64, Exchange>,
    audit_events: Vec<AuditEvent>,
    registered_users: BTreeMap<String, RegisteredUser>,
}

/// In-process store implementing every DAO trait.
///
/// Used for `storage.backend = memory` and throughout the tests. Ids are
/// handed out sequentially starting at 1.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExchangeDao for MemoryStore {
    async fn insert_exchange(&self, exchange: &Exchange) -> Result<i64, DaoError> {
        let mut tables = self.tables.lock().await;
        tables.next_exchange_id += 1;
        let id = tables.next_exchange_id;

        let mut stored = exchange.clone();
        stored.id = Some(id);
        tables.exchanges.insert(id, stored);

        tracing::debug!("Inserted exchange {}", id);
        Ok(id)
    }

    async fn retrieve_exchange(&self, exchange_id: i64) -> Result<Option<Exchange>, DaoError> {
        let tables = self.tables.lock().await;
        Ok(tables.exchanges.get(&exchange_id).cloned())
    }

    async fn update_exchange(&self, exchange: &Exchange) -> Result<(), DaoError> {
        let id = exchange
            .id
            .ok_or_else(|| DaoError::InvalidInput("Exchange has no id".to_string()))?;

        let mut tables = self.tables.lock().await;
        match tables.exchanges.get_mut(&id) {
            Some(stored) => {
                *stored = exchange.clone();
                Ok(())
            }
            None => Err(DaoError::NotFound(format!("exchange {}", id))),
        }
    }

    async fn delete_exchange(&self, exchange: &Exchange) -> Result<(), DaoError> {
        if let Some(id) = exchange.id {
            self.tables.lock().await.exchanges.remove(&id);
        }
        Ok(())
    }

    async fn retrieve_exchanges(
        &self,
        criteria: &ExchangeCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<Exchange>, DaoError> {
        require_user_id(criteria)?;

        let tables = self.tables.lock().await;
        let rows: Vec<Exchange> = tables
            .exchanges
            .values()
            .filter(|exchange| matches_exchange_criteria(criteria, exchange))
            .cloned()
            .collect();

        Ok(PaginatedResults::from_rows(rows, pagination))
    }
}

#[async_trait]
impl AuditEventDao for MemoryStore {
    async fn insert_audit_event(&self, event: &AuditEvent) -> Result<i64, DaoError> {
        let mut tables = self.tables.lock().await;
        tables.next_event_id += 1;
        let id = tables.next_event_id;

        let mut stored = event.clone();
        stored.event_id = Some(id);
        tables.audit_events.push(stored);
        Ok(id)
    }

    async fn retrieve_audit_events(
        &self,
        criteria: &AuditEventCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<AuditEvent>, DaoError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<AuditEvent> = tables
            .audit_events
            .iter()
            .filter(|event| matches_audit_criteria(criteria, event))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.event_timestamp
                .cmp(&b.event_timestamp)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });

        Ok(PaginatedResults::from_rows(rows, pagination))
    }
}

#[async_trait]
impl RegisteredUserDao for MemoryStore {
    async fn insert_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        let mut tables = self.tables.lock().await;
        if tables.registered_users.contains_key(&user.user_id) {
            return Err(DaoError::InvalidInput(format!(
                "User {} is already registered",
                user.user_id
            )));
        }
        tables.registered_users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn retrieve_registered_user(&self, user_id: &str) -> Result<Option<RegisteredUser>, DaoError> {
        let tables = self.tables.lock().await;
        Ok(tables.registered_users.get(user_id).cloned())
    }

    async fn update_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        let mut tables = self.tables.lock().await;
        match tables.registered_users.get_mut(&user.user_id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(DaoError::NotFound(format!("registered user {}", user.user_id))),
        }
    }

    async fn delete_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        self.tables.lock().await.registered_users.remove(&user.user_id);
        Ok(())
    }

    async fn lock_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        set_locked(&self.tables, &user.user_id, true).await
    }

    async fn unlock_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        set_locked(&self.tables, &user.user_id, false).await
    }

    async fn retrieve_registered_users(
        &self,
        criteria: &RegisteredUserCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<RegisteredUser>, DaoError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<RegisteredUser> = tables
            .registered_users
            .values()
            .filter(|user| matches_registered_user_criteria(criteria, user))
            .cloned()
            .collect();
        sort_registered_users(&mut rows, criteria);

        Ok(PaginatedResults::from_rows(rows, pagination))
    }
}

async fn set_locked(tables: &Mutex<Tables>, user_id: &str, locked: bool) -> Result<(), DaoError> {
    let mut tables = tables.lock().await;
    match tables.registered_users.get_mut(user_id) {
        Some(user) => {
            user.locked = locked;
            Ok(())
        }
        None => Err(DaoError::NotFound(format!("registered user {}", user_id))),
    }
}
