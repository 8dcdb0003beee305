use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use taskhive_core::{AppResult, AuditRecordId, OrganizationId, UserId};
use taskhive_domain::AuditAction;

/// Transport metadata attached to audit records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestContext {
    /// Remote peer address as reported by the adapter.
    pub ip_address: Option<String>,
    /// User agent header as reported by the adapter.
    pub user_agent: Option<String>,
}

/// Payload for one audit record, before id and timestamp are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecordInput {
    /// What happened.
    pub action: AuditAction,
    /// Resource type label, e.g. `task` or `organization`.
    pub resource: String,
    /// Identifier of the touched resource, when one exists.
    pub resource_id: Option<String>,
    /// Acting user, absent for anonymous failures.
    pub user_id: Option<UserId>,
    /// Organization scope of the event.
    pub organization_id: OrganizationId,
    /// Structured detail payload.
    pub details: Option<Value>,
    /// Whether the gated operation was allowed/succeeded.
    pub success: bool,
    /// Human-readable denial or failure reason.
    pub error_message: Option<String>,
    /// Transport metadata.
    pub context: RequestContext,
}

/// One immutable audit log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Stable record identifier.
    pub id: AuditRecordId,
    /// What happened.
    pub action: AuditAction,
    /// Resource type label.
    pub resource: String,
    /// Identifier of the touched resource, when one exists.
    pub resource_id: Option<String>,
    /// Acting user, absent for anonymous failures.
    pub user_id: Option<UserId>,
    /// Organization scope of the event.
    pub organization_id: OrganizationId,
    /// Structured detail payload.
    pub details: Option<Value>,
    /// Whether the gated operation was allowed/succeeded.
    pub success: bool,
    /// Human-readable denial or failure reason.
    pub error_message: Option<String>,
    /// Remote peer address.
    pub ip_address: Option<String>,
    /// User agent header.
    pub user_agent: Option<String>,
    /// Append timestamp; the only cross-request ordering guarantee.
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Materializes a record from an input payload.
    #[must_use]
    pub fn from_input(
        id: AuditRecordId,
        created_at: DateTime<Utc>,
        input: AuditRecordInput,
    ) -> Self {
        Self {
            id,
            action: input.action,
            resource: input.resource,
            resource_id: input.resource_id,
            user_id: input.user_id,
            organization_id: input.organization_id,
            details: input.details,
            success: input.success,
            error_message: input.error_message,
            ip_address: input.context.ip_address,
            user_agent: input.context.user_agent,
            created_at,
        }
    }
}

/// Filters applied to audit log reads before pagination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditQuery {
    /// Keep only records by this actor.
    pub actor_id: Option<UserId>,
    /// Keep only records with this resource label.
    pub resource: Option<String>,
    /// Keep only records with this action.
    pub action: Option<AuditAction>,
    /// Keep only records at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Keep only records at or before this instant.
    pub to: Option<DateTime<Utc>>,
}

/// Repository port for the append-only audit log.
///
/// Implementations never update or delete existing rows.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends one record.
    async fn append(&self, record: AuditRecord) -> AppResult<()>;

    /// Returns matching records newest-first with the total matching count.
    async fn query(
        &self,
        organization_id: OrganizationId,
        query: &AuditQuery,
        limit: usize,
        offset: usize,
    ) -> AppResult<(Vec<AuditRecord>, u64)>;
}
