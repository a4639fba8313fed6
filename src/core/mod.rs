// Core algorithm exports
pub mod assignments;
pub mod filters;
pub mod templates;
pub mod validation;

pub use assignments::{assign_once, AssignmentGenerator, AttemptError};
pub use filters::{
    matches_audit_criteria, matches_exchange_criteria, matches_registered_user_criteria,
    sort_registered_users,
};
pub use templates::{derive_template_config, generate_message, wrap_line, MessageDefaults};
pub use validation::{validate_audit_criteria, validate_bug_report, validate_exchange};
