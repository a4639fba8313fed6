//! Santa Exchange - Secret Santa gift exchange service
//!
//! Organizers create exchanges, enter participants with their conflicts,
//! and have the service generate a random gift assignment and email every
//! giver their receiver. Sessions come from a federated identity token;
//! administrators can audit activity and manage registered users.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod rpc;
pub mod services;

// Re-export commonly used types
pub use core::{AssignmentGenerator, MessageDefaults};
pub use error::{InvalidDataError, ServiceError};
pub use models::{Assignment, AssignmentSet, ClientSession, Exchange, Participant};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let exchange = Exchange {
            participants: (1..=3).map(Participant::with_id).collect(),
            ..Exchange::default()
        };

        let assignments = AssignmentGenerator::new(10)
            .generate(&exchange.participants, false)
            .unwrap();
        assert_eq!(assignments.len(), 3);
    }
}
