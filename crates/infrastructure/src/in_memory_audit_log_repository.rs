use async_trait::async_trait;
use taskhive_application::{AuditLogRepository, AuditQuery, AuditRecord};
use taskhive_core::{AppResult, OrganizationId};
use tokio::sync::RwLock;

/// In-memory append-only audit log implementation.
///
/// Rows are only ever pushed; nothing mutates or removes an appended
/// record.
#[derive(Debug, Default)]
pub struct InMemoryAuditLogRepository {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditLogRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append(&self, record: AuditRecord) -> AppResult<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn query(
        &self,
        organization_id: OrganizationId,
        query: &AuditQuery,
        limit: usize,
        offset: usize,
    ) -> AppResult<(Vec<AuditRecord>, u64)> {
        let records = self.records.read().await;
        let matching: Vec<AuditRecord> = records
            .iter()
            .rev()
            .filter(|record| record.organization_id == organization_id)
            .filter(|record| {
                query
                    .actor_id
                    .is_none_or(|actor_id| record.user_id == Some(actor_id))
            })
            .filter(|record| {
                query
                    .resource
                    .as_deref()
                    .is_none_or(|resource| record.resource == resource)
            })
            .filter(|record| query.action.is_none_or(|action| record.action == action))
            .filter(|record| query.from.is_none_or(|from| record.created_at >= from))
            .filter(|record| query.to.is_none_or(|to| record.created_at <= to))
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let window = matching.into_iter().skip(offset).take(limit).collect();
        Ok((window, total))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use taskhive_application::{AuditLogRepository, AuditQuery, AuditRecord};
    use taskhive_core::{AuditRecordId, OrganizationId, UserId};
    use taskhive_domain::AuditAction;

    use super::InMemoryAuditLogRepository;

    fn record(organization_id: OrganizationId, action: AuditAction) -> AuditRecord {
        AuditRecord {
            id: AuditRecordId::new(),
            action,
            resource: "task".to_owned(),
            resource_id: None,
            user_id: Some(UserId::new()),
            organization_id,
            details: None,
            success: action != AuditAction::AccessDenied,
            error_message: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn query_filters_by_organization_and_action() {
        let repository = InMemoryAuditLogRepository::new();
        let organization_id = OrganizationId::new();
        let other_organization_id = OrganizationId::new();

        for action in [AuditAction::Read, AuditAction::AccessDenied, AuditAction::Read] {
            let appended = repository.append(record(organization_id, action)).await;
            assert!(appended.is_ok());
        }
        let appended = repository
            .append(record(other_organization_id, AuditAction::Read))
            .await;
        assert!(appended.is_ok());

        let denied_only = repository
            .query(
                organization_id,
                &AuditQuery {
                    action: Some(AuditAction::AccessDenied),
                    ..Default::default()
                },
                50,
                0,
            )
            .await;
        let Ok((records, total)) = denied_only else {
            return assert!(denied_only.is_ok());
        };
        assert_eq!(total, 1);
        assert_eq!(records.len(), 1);

        let scoped = repository
            .query(organization_id, &AuditQuery::default(), 50, 0)
            .await;
        let Ok((_, scoped_total)) = scoped else {
            return assert!(scoped.is_ok());
        };
        assert_eq!(scoped_total, 3);
    }
}
