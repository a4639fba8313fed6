use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;

use crate::models::{
    AuditEvent, AuditEventCriteria, AuditEventType, Exchange, ExchangeCriteria, ExtraData,
    OpenIdProvider, PaginatedResults, Pagination, RegisteredUser, RegisteredUserCriteria,
    RegisteredUserSortColumn, SortDirection,
};
use crate::services::dao::{require_user_id, AuditEventDao, DaoError, ExchangeDao, RegisteredUserDao};

/// PostgreSQL-backed implementation of the DAO traits
///
/// Exchanges are kept as JSONB documents with the owning user and state
/// copied into indexed columns. Audit events and registered users are
/// stored relationally.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, DaoError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, DaoError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Check database connectivity
    pub async fn health_check(&self) -> Result<(), DaoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn exchange_from_row(row: &PgRow) -> Result<Exchange, DaoError> {
    let Json(mut exchange): Json<Exchange> = row.try_get("document")?;
    exchange.id = Some(row.try_get("id")?);
    Ok(exchange)
}

fn audit_event_from_row(row: &PgRow) -> Result<AuditEvent, DaoError> {
    let event_type: String = row.try_get("event_type")?;
    let event_type = AuditEventType::parse(&event_type)
        .ok_or_else(|| DaoError::InvalidInput(format!("unknown audit event type {}", event_type)))?;
    let Json(extra_data): Json<Vec<ExtraData>> = row.try_get("extra_data")?;

    Ok(AuditEvent {
        event_id: Some(row.try_get("event_id")?),
        event_type,
        event_timestamp: row.try_get("event_timestamp")?,
        user_id: row.try_get("user_id")?,
        session_id: row.try_get("session_id")?,
        extra_data,
    })
}

fn registered_user_from_row(row: &PgRow) -> Result<RegisteredUser, DaoError> {
    let provider: String = row.try_get("open_id_provider")?;

    Ok(RegisteredUser {
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        registration_date: row.try_get("registration_date")?,
        authentication_domain: row.try_get("authentication_domain")?,
        open_id_provider: OpenIdProvider::parse(&provider),
        federated_identity: row.try_get("federated_identity")?,
        email_address: row.try_get("email_address")?,
        logins: row.try_get("logins")?,
        last_login: row.try_get("last_login")?,
        admin: row.try_get("admin")?,
        locked: row.try_get("locked")?,
    })
}

fn non_empty<T>(list: &Option<Vec<T>>) -> Option<&Vec<T>> {
    list.as_ref().filter(|values| !values.is_empty())
}

fn push_exchange_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    user_id: &'a str,
    criteria: &'a ExchangeCriteria,
) {
    builder.push(" WHERE user_id = ").push_bind(user_id);
    if let Some(ids) = non_empty(&criteria.exchange_ids) {
        builder.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }
}

fn push_audit_filters(builder: &mut QueryBuilder<'_, Postgres>, criteria: &AuditEventCriteria) {
    builder.push(" WHERE TRUE");

    if let Some(types) = non_empty(&criteria.event_types) {
        let names: Vec<String> = types.iter().map(|t| t.as_str().to_string()).collect();
        builder.push(" AND event_type = ANY(").push_bind(names).push(")");
    }

    if let Some(user_ids) = non_empty(&criteria.user_ids) {
        builder.push(" AND user_id = ANY(").push_bind(user_ids.clone()).push(")");
    }

    if let Some(start) = criteria.start_date {
        builder.push(" AND event_timestamp >= ").push_bind(start);
    }

    if let Some(end) = criteria.end_date {
        builder.push(" AND event_timestamp <= ").push_bind(end);
    }
}

fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, criteria: &RegisteredUserCriteria) {
    builder.push(" WHERE TRUE");

    if let Some(user_ids) = non_empty(&criteria.user_ids) {
        builder.push(" AND user_id = ANY(").push_bind(user_ids.clone()).push(")");
    }

    if let Some(user_names) = non_empty(&criteria.user_names) {
        builder.push(" AND user_name = ANY(").push_bind(user_names.clone()).push(")");
    }

    if let Some(providers) = non_empty(&criteria.open_id_providers) {
        let names: Vec<String> = providers.iter().map(|p| p.as_str().to_string()).collect();
        builder.push(" AND open_id_provider = ANY(").push_bind(names).push(")");
    }

    if let Some(admin) = criteria.admin {
        builder.push(" AND admin = ").push_bind(admin);
    }

    if let Some(locked) = criteria.locked {
        builder.push(" AND locked = ").push_bind(locked);
    }

    if let Some(start) = criteria.start_date {
        builder.push(" AND registration_date >= ").push_bind(start);
    }

    if let Some(end) = criteria.end_date {
        builder.push(" AND registration_date <= ").push_bind(end);
    }
}

fn sort_column_name(column: RegisteredUserSortColumn) -> &'static str {
    match column {
        RegisteredUserSortColumn::UserId => "user_id",
        RegisteredUserSortColumn::UserName => "user_name",
        RegisteredUserSortColumn::RegistrationDate => "registration_date",
        RegisteredUserSortColumn::OpenIdProvider => "open_id_provider",
        RegisteredUserSortColumn::Logins => "logins",
        RegisteredUserSortColumn::LastLogin => "last_login",
        RegisteredUserSortColumn::Admin => "admin",
        RegisteredUserSortColumn::Locked => "locked",
    }
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, pagination: &Pagination) {
    let limit = i64::try_from(pagination.page_size.max(1)).unwrap_or(i64::MAX);
    let offset = i64::try_from(PaginatedResults::<()>::offset(pagination)).unwrap_or(i64::MAX);
    builder
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
}

#[async_trait]
impl ExchangeDao for PostgresClient {
    async fn insert_exchange(&self, exchange: &Exchange) -> Result<i64, DaoError> {
        let user_id = exchange
            .user_id
            .as_deref()
            .ok_or_else(|| DaoError::InvalidInput("Exchange has no owner".to_string()))?;

        let query = r#"
            INSERT INTO exchanges (user_id, exchange_state, document)
            VALUES ($1, $2, $3)
            RETURNING id
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .bind(exchange.exchange_state.map(|s| s.as_str()))
            .bind(Json(exchange))
            .fetch_one(&self.pool)
            .await?;

        let id: i64 = row.try_get("id")?;
        tracing::debug!("Inserted exchange {} for user {}", id, user_id);
        Ok(id)
    }

    async fn retrieve_exchange(&self, exchange_id: i64) -> Result<Option<Exchange>, DaoError> {
        let query = "SELECT id, document FROM exchanges WHERE id = $1";

        let row = sqlx::query(query)
            .bind(exchange_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(exchange_from_row).transpose()
    }

    async fn update_exchange(&self, exchange: &Exchange) -> Result<(), DaoError> {
        let id = exchange
            .id
            .ok_or_else(|| DaoError::InvalidInput("Exchange has no id".to_string()))?;

        let query = r#"
            UPDATE exchanges
            SET user_id = COALESCE($2, user_id),
                exchange_state = $3,
                document = $4,
                updated_at = NOW()
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(id)
            .bind(exchange.user_id.as_deref())
            .bind(exchange.exchange_state.map(|s| s.as_str()))
            .bind(Json(exchange))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DaoError::NotFound(format!("exchange {}", id)));
        }

        Ok(())
    }

    async fn delete_exchange(&self, exchange: &Exchange) -> Result<(), DaoError> {
        if let Some(id) = exchange.id {
            sqlx::query("DELETE FROM exchanges WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn retrieve_exchanges(
        &self,
        criteria: &ExchangeCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<Exchange>, DaoError> {
        let user_id = require_user_id(criteria)?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) AS total FROM exchanges");
        push_exchange_filters(&mut count, user_id, criteria);
        let total: i64 = count.build().fetch_one(&self.pool).await?.try_get("total")?;

        let mut select = QueryBuilder::new("SELECT id, document FROM exchanges");
        push_exchange_filters(&mut select, user_id, criteria);
        select.push(" ORDER BY id");
        push_page(&mut select, pagination);

        let rows = select.build().fetch_all(&self.pool).await?;
        let exchanges = rows.iter().map(exchange_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResults::with_total(exchanges, pagination, total as usize))
    }
}

#[async_trait]
impl AuditEventDao for PostgresClient {
    async fn insert_audit_event(&self, event: &AuditEvent) -> Result<i64, DaoError> {
        let query = r#"
            INSERT INTO audit_events (event_type, event_timestamp, user_id, session_id, extra_data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING event_id
        "#;

        let row = sqlx::query(query)
            .bind(event.event_type.as_str())
            .bind(event.event_timestamp)
            .bind(event.user_id.as_deref())
            .bind(event.session_id.as_deref())
            .bind(Json(&event.extra_data))
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("event_id")?)
    }

    async fn retrieve_audit_events(
        &self,
        criteria: &AuditEventCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<AuditEvent>, DaoError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) AS total FROM audit_events");
        push_audit_filters(&mut count, criteria);
        let total: i64 = count.build().fetch_one(&self.pool).await?.try_get("total")?;

        let mut select = QueryBuilder::new(
            "SELECT event_id, event_type, event_timestamp, user_id, session_id, extra_data FROM audit_events",
        );
        push_audit_filters(&mut select, criteria);
        select.push(" ORDER BY event_timestamp, event_id");
        push_page(&mut select, pagination);

        let rows = select.build().fetch_all(&self.pool).await?;
        let events = rows.iter().map(audit_event_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResults::with_total(events, pagination, total as usize))
    }
}

#[async_trait]
impl RegisteredUserDao for PostgresClient {
    async fn insert_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        let query = r#"
            INSERT INTO registered_users (
                user_id, user_name, registration_date, authentication_domain, open_id_provider,
                federated_identity, email_address, logins, last_login, admin, locked
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#;

        sqlx::query(query)
            .bind(&user.user_id)
            .bind(user.user_name.as_deref())
            .bind(user.registration_date)
            .bind(user.authentication_domain.as_deref())
            .bind(user.open_id_provider.as_str())
            .bind(user.federated_identity.as_deref())
            .bind(user.email_address.as_deref())
            .bind(user.logins)
            .bind(user.last_login)
            .bind(user.admin)
            .bind(user.locked)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Registered user {}", user.user_id);
        Ok(())
    }

    async fn retrieve_registered_user(&self, user_id: &str) -> Result<Option<RegisteredUser>, DaoError> {
        let row = sqlx::query("SELECT * FROM registered_users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(registered_user_from_row).transpose()
    }

    async fn update_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        let query = r#"
            UPDATE registered_users
            SET user_name = $2,
                authentication_domain = $3,
                open_id_provider = $4,
                federated_identity = $5,
                email_address = $6,
                logins = $7,
                last_login = $8,
                admin = $9,
                locked = $10
            WHERE user_id = $1
        "#;

        let result = sqlx::query(query)
            .bind(&user.user_id)
            .bind(user.user_name.as_deref())
            .bind(user.authentication_domain.as_deref())
            .bind(user.open_id_provider.as_str())
            .bind(user.federated_identity.as_deref())
            .bind(user.email_address.as_deref())
            .bind(user.logins)
            .bind(user.last_login)
            .bind(user.admin)
            .bind(user.locked)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DaoError::NotFound(format!("registered user {}", user.user_id)));
        }

        Ok(())
    }

    async fn delete_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        sqlx::query("DELETE FROM registered_users WHERE user_id = $1")
            .bind(&user.user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn lock_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        self.set_locked(&user.user_id, true).await
    }

    async fn unlock_registered_user(&self, user: &RegisteredUser) -> Result<(), DaoError> {
        self.set_locked(&user.user_id, false).await
    }

    async fn retrieve_registered_users(
        &self,
        criteria: &RegisteredUserCriteria,
        pagination: &Pagination,
    ) -> Result<PaginatedResults<RegisteredUser>, DaoError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) AS total FROM registered_users");
        push_user_filters(&mut count, criteria);
        let total: i64 = count.build().fetch_one(&self.pool).await?.try_get("total")?;

        let direction = match criteria.sort_direction.unwrap_or_default() {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        let column = sort_column_name(criteria.sort_column.unwrap_or_default());

        let mut select = QueryBuilder::new("SELECT * FROM registered_users");
        push_user_filters(&mut select, criteria);
        select.push(format!(" ORDER BY {} {}, user_id {}", column, direction, direction));
        push_page(&mut select, pagination);

        let rows = select.build().fetch_all(&self.pool).await?;
        let users = rows.iter().map(registered_user_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResults::with_total(users, pagination, total as usize))
    }
}

impl PostgresClient {
    async fn set_locked(&self, user_id: &str, locked: bool) -> Result<(), DaoError> {
        let result = sqlx::query("UPDATE registered_users SET locked = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(locked)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DaoError::NotFound(format!("registered user {}", user_id)));
        }

        tracing::info!("Set locked={} for user {}", locked, user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_column_names() {
        assert_eq!(sort_column_name(RegisteredUserSortColumn::default()), "user_name");
        assert_eq!(sort_column_name(RegisteredUserSortColumn::LastLogin), "last_login");
    }

    #[test]
    fn test_user_filters_sql() {
        let criteria = RegisteredUserCriteria {
            admin: Some(true),
            user_ids: Some(vec![]),
            ..RegisteredUserCriteria::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM registered_users");
        push_user_filters(&mut builder, &criteria);
        assert_eq!(builder.sql(), "SELECT * FROM registered_users WHERE TRUE AND admin = $1");
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_exchange_round_trip() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let client = PostgresClient::new(&url, 2, 1).await.expect("Failed to connect");

        let exchange = Exchange {
            user_id: Some("pg-test-user".to_string()),
            name: Some("Round trip".to_string()),
            ..Exchange::default()
        };

        let id = client.insert_exchange(&exchange).await.unwrap();
        let stored = client.retrieve_exchange(id).await.unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Round trip"));

        client.delete_exchange(&stored).await.unwrap();
        assert!(client.retrieve_exchange(id).await.unwrap().is_none());
    }
}
