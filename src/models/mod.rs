// Model exports
pub mod audit;
pub mod domain;
pub mod email;
pub mod requests;
pub mod responses;
pub mod user;

pub use audit::{AuditEvent, AuditEventCriteria, AuditEventType, ExtraData, ExtraDataKey};
pub use domain::{
    Assignment, AssignmentSet, EmailFormat, Exchange, ExchangeCriteria, ExchangeState, Organizer,
    Participant, ParticipantSet, TemplateConfig,
};
pub use email::{BugReport, EmailAddress, EmailMessage, EmailTemplate};
pub use requests::{
    AuditEventSearchRequest, CreateExchangeRequest, ExchangeBatchRequest, ExchangeSearchRequest, LoginRequest, Pagination,
    RegisteredUserBatchRequest, RegisteredUserSearchRequest, ResendNotificationRequest,
};
pub use responses::{ErrorResponse, HealthResponse, LoginResponse, PaginatedResults};
pub use user::{
    ClientSession, FederatedUser, OpenIdProvider, RegisteredUser, RegisteredUserCriteria,
    RegisteredUserSortColumn, SortDirection,
};
