//! Repository ports consumed by the application services.

mod assignments;
mod audit;
mod organizations;
mod tasks;
mod users;

pub use assignments::RoleAssignmentRepository;
pub use audit::{
    AuditLogRepository, AuditQuery, AuditRecord, AuditRecordInput, RequestContext,
};
pub use organizations::OrganizationRepository;
pub use tasks::{TaskListFilter, TaskPage, TaskRepository};
pub use users::UserRepository;
