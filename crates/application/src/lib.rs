//! Application services and ports for the Taskhive authorization core.

#![forbid(unsafe_code)]

mod audit_service;
mod authorization_service;
mod bootstrap;
mod organization_hierarchy;
mod organization_service;
mod ports;
mod scope_service;
mod task_service;
#[cfg(test)]
mod test_support;
mod user_service;

pub use audit_service::{AUDIT_EXPORT_ROW_CAP, AuditService};
pub use authorization_service::{AccessDecision, AuthorizationService};
pub use bootstrap::{SeedConfig, SeedSummary, seed};
pub use organization_hierarchy::OrganizationHierarchy;
pub use organization_service::{
    CreateOrganizationInput, OrganizationService, UpdateOrganizationInput,
};
pub use ports::{
    AuditLogRepository, AuditQuery, AuditRecord, AuditRecordInput, OrganizationRepository,
    RequestContext, RoleAssignmentRepository, TaskListFilter, TaskPage, TaskRepository,
    UserRepository,
};
pub use scope_service::ScopeService;
pub use task_service::{CreateTaskInput, TaskService, UpdateTaskInput};
pub use user_service::UserService;
