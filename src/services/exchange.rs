use std::sync::Arc;

use async_trait::async_trait;

use crate::core::assignments::AssignmentGenerator;
use crate::core::templates::{generate_message, MessageDefaults};
use crate::core::validation::validate_exchange;
use crate::error::ServiceError;
use crate::models::{Assignment, AssignmentSet, EmailMessage, Exchange};
use crate::services::mailer::EmailService;

/// Exchange-level business operations used by the RPC layer
#[async_trait]
pub trait ExchangeOperations: Send + Sync {
    /// Validate the exchange and compute a fresh set of assignments
    fn generate_assignments(
        &self,
        exchange: &Exchange,
        auto_conflict: bool,
    ) -> Result<AssignmentSet, ServiceError>;

    async fn send_message(
        &self,
        exchange: &Exchange,
        assignment: &Assignment,
        organizer_only: bool,
    ) -> Result<(), ServiceError>;

    /// Send one email per assignment, returning how many went out
    async fn send_messages(
        &self,
        exchange: &Exchange,
        assignments: &AssignmentSet,
        organizer_only: bool,
    ) -> Result<usize, ServiceError>;

    /// Render, but do not send, the email the first participant would get
    fn generate_preview(&self, exchange: &Exchange) -> Result<EmailMessage, ServiceError>;
}

pub struct ExchangeService {
    generator: AssignmentGenerator,
    defaults: MessageDefaults,
    email: Arc<dyn EmailService>,
}

impl ExchangeService {
    pub fn new(generator: AssignmentGenerator, defaults: MessageDefaults, email: Arc<dyn EmailService>) -> Self {
        Self {
            generator,
            defaults,
            email,
        }
    }

    async fn deliver(&self, exchange: &Exchange, assignment: &Assignment, organizer_only: bool) -> Result<(), ServiceError> {
        let template = generate_message(&self.defaults, exchange, assignment, organizer_only);
        self.email
            .send_template(&template)
            .await
            .map_err(|e| ServiceError::wrap("Error sending exchange email", e))?;
        Ok(())
    }
}

#[async_trait]
impl ExchangeOperations for ExchangeService {
    fn generate_assignments(
        &self,
        exchange: &Exchange,
        auto_conflict: bool,
    ) -> Result<AssignmentSet, ServiceError> {
        validate_exchange(exchange)?;
        self.generator.generate(&exchange.participants, auto_conflict)
    }

    async fn send_message(
        &self,
        exchange: &Exchange,
        assignment: &Assignment,
        organizer_only: bool,
    ) -> Result<(), ServiceError> {
        validate_exchange(exchange)?;
        self.deliver(exchange, assignment, organizer_only).await
    }

    async fn send_messages(
        &self,
        exchange: &Exchange,
        assignments: &AssignmentSet,
        organizer_only: bool,
    ) -> Result<usize, ServiceError> {
        validate_exchange(exchange)?;

        let mut sent = 0;
        for assignment in assignments {
            self.deliver(exchange, assignment, organizer_only).await?;
            sent += 1;
        }

        tracing::info!("Sent {} exchange emails for exchange {:?}", sent, exchange.id);
        Ok(sent)
    }

    fn generate_preview(&self, exchange: &Exchange) -> Result<EmailMessage, ServiceError> {
        validate_exchange(exchange)?;

        let assignment = Assignment::new(
            exchange.participants[0].clone(),
            exchange.participants[1].clone(),
        );
        let template = generate_message(&self.defaults, exchange, &assignment, false);

        self.email
            .generate_email(&template)
            .map_err(|e| ServiceError::wrap("Error generating preview", e))
    }
}
