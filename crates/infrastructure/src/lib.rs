//! Storage adapters for the Taskhive authorization core: in-memory
//! repositories for tests and single-process deployments, PostgreSQL
//! repositories for everything else.

#![forbid(unsafe_code)]

mod in_memory_audit_log_repository;
mod in_memory_organization_repository;
mod in_memory_role_assignment_repository;
mod in_memory_task_repository;
mod in_memory_user_repository;
mod postgres_audit_log_repository;
mod postgres_organization_repository;
mod postgres_role_assignment_repository;
mod postgres_task_repository;
mod postgres_user_repository;

pub use in_memory_audit_log_repository::InMemoryAuditLogRepository;
pub use in_memory_organization_repository::InMemoryOrganizationRepository;
pub use in_memory_role_assignment_repository::InMemoryRoleAssignmentRepository;
pub use in_memory_task_repository::InMemoryTaskRepository;
pub use in_memory_user_repository::InMemoryUserRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_organization_repository::PostgresOrganizationRepository;
pub use postgres_role_assignment_repository::PostgresRoleAssignmentRepository;
pub use postgres_task_repository::PostgresTaskRepository;
pub use postgres_user_repository::PostgresUserRepository;
