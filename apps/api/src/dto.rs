//! Request and response payloads for the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhive_application::AuditRecord;
use taskhive_domain::{
    Organization, RoleAssignment, Task, TaskCategory, TaskPriority, TaskStatus, User,
};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub level: u8,
}

impl From<Organization> for OrganizationResponse {
    fn from(organization: Organization) -> Self {
        Self {
            id: organization.id().as_uuid(),
            name: organization.name().as_str().to_owned(),
            description: organization.description().map(str::to_owned),
            parent_id: organization.parent_id().map(|id| id.as_uuid()),
            level: organization.level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub status: String,
    pub organization_id: Uuid,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id().as_uuid(),
            email: user.email().as_str().to_owned(),
            first_name: user.first_name().as_str().to_owned(),
            last_name: user.last_name().as_str().to_owned(),
            full_name: user.full_name(),
            status: user.status().as_str().to_owned(),
            organization_id: user.organization_id().as_uuid(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: String,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RoleAssignmentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub organization_id: Option<Uuid>,
    pub is_active: bool,
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(assignment: RoleAssignment) -> Self {
        Self {
            id: assignment.id().as_uuid(),
            user_id: assignment.user_id().as_uuid(),
            role: assignment.role().as_str().to_owned(),
            organization_id: assignment.organization_id().map(|id| id.as_uuid()),
            is_active: assignment.is_active(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub organization_id: Uuid,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id().as_uuid(),
            title: task.title().as_str().to_owned(),
            description: task.description().map(str::to_owned),
            status: task.status(),
            priority: task.priority(),
            category: task.category(),
            due_date: task.due_date(),
            completed_at: task.completed_at(),
            assignee_id: task.assignee_id().map(|id| id.as_uuid()),
            created_by: task.created_by().as_uuid(),
            organization_id: task.organization_id().as_uuid(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TaskPageResponse {
    pub tasks: Vec<TaskResponse>,
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Serialize)]
pub struct AuditRecordResponse {
    pub id: Uuid,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub organization_id: Uuid,
    pub details: Option<serde_json::Value>,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditRecord> for AuditRecordResponse {
    fn from(record: AuditRecord) -> Self {
        Self {
            id: record.id.as_uuid(),
            action: record.action.as_str().to_owned(),
            resource: record.resource,
            resource_id: record.resource_id,
            user_id: record.user_id.map(|id| id.as_uuid()),
            organization_id: record.organization_id.as_uuid(),
            details: record.details,
            success: record.success,
            error_message: record.error_message,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditPageResponse {
    pub records: Vec<AuditRecordResponse>,
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
}
