use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use taskhive_core::{AppError, AppResult, AuditRecordId, OrganizationId, UserId};

use crate::ports::{AuditLogRepository, AuditQuery, AuditRecord, AuditRecordInput, UserRepository};

/// Upper bound on rows returned by one export.
pub const AUDIT_EXPORT_ROW_CAP: usize = 10_000;

const MAX_PAGE_SIZE: usize = 200;

/// Append-only recorder and read model for authorization decisions and
/// mutating actions.
#[derive(Clone)]
pub struct AuditService {
    repository: Arc<dyn AuditLogRepository>,
    users: Arc<dyn UserRepository>,
}

impl AuditService {
    /// Creates an audit service from repository implementations.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { repository, users }
    }

    /// Persists one audit record synchronously.
    ///
    /// The write is strictly additive; a failure propagates to the caller
    /// instead of being swallowed, so the triggering operation is not
    /// considered complete until the record is durable.
    pub async fn record(&self, input: AuditRecordInput) -> AppResult<AuditRecord> {
        let record = AuditRecord::from_input(AuditRecordId::new(), Utc::now(), input);
        self.repository.append(record.clone()).await?;
        Ok(record)
    }

    /// Returns one page of matching records, newest first, with the total
    /// matching count. Pagination is applied after filtering.
    pub async fn query(
        &self,
        organization_id: OrganizationId,
        query: &AuditQuery,
        page: usize,
        page_size: usize,
    ) -> AppResult<(Vec<AuditRecord>, u64)> {
        if page == 0 {
            return Err(AppError::Validation(
                "page numbering starts at 1".to_owned(),
            ));
        }

        let capped_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * capped_size;

        self.repository
            .query(organization_id, query, capped_size, offset)
            .await
    }

    /// Serializes every matching record (up to [`AUDIT_EXPORT_ROW_CAP`]) as
    /// CSV with one row per record.
    ///
    /// The actor column shows the user's display name, falling back to the
    /// email address and finally to `Unknown` when the user record is gone.
    pub async fn export_csv(
        &self,
        organization_id: OrganizationId,
        query: &AuditQuery,
    ) -> AppResult<Vec<u8>> {
        let (records, _total) = self
            .repository
            .query(organization_id, query, AUDIT_EXPORT_ROW_CAP, 0)
            .await?;

        let mut actor_names: BTreeMap<UserId, String> = BTreeMap::new();
        for record in &records {
            if let Some(user_id) = record.user_id {
                if actor_names.contains_key(&user_id) {
                    continue;
                }
                let name = match self.users.find_user(user_id).await? {
                    Some(user) => user.full_name(),
                    None => "Unknown".to_owned(),
                };
                actor_names.insert(user_id, name);
            }
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "timestamp",
                "actor",
                "action",
                "resource",
                "resource_id",
                "success",
                "error_message",
            ])
            .map_err(|error| AppError::Internal(format!("failed to write csv header: {error}")))?;

        for record in &records {
            let actor = record
                .user_id
                .and_then(|user_id| actor_names.get(&user_id).cloned())
                .unwrap_or_else(|| "Unknown".to_owned());

            writer
                .write_record([
                    record
                        .created_at
                        .format("%Y-%m-%d %H:%M:%S UTC")
                        .to_string()
                        .as_str(),
                    actor.as_str(),
                    record.action.as_str(),
                    record.resource.as_str(),
                    record.resource_id.as_deref().unwrap_or_default(),
                    if record.success { "yes" } else { "no" },
                    record.error_message.as_deref().unwrap_or_default(),
                ])
                .map_err(|error| {
                    AppError::Internal(format!("failed to write csv row: {error}"))
                })?;
        }

        writer
            .into_inner()
            .map_err(|error| AppError::Internal(format!("failed to flush csv export: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use taskhive_core::{OrganizationId, UserId};
    use taskhive_domain::AuditAction;

    use crate::ports::{AuditQuery, AuditRecordInput, RequestContext};
    use crate::test_support::{FakeAuditLogRepository, FakeUserRepository, sample_user};

    use super::AuditService;

    fn denied_input(organization_id: OrganizationId, user_id: UserId) -> AuditRecordInput {
        AuditRecordInput {
            action: AuditAction::AccessDenied,
            resource: "task".to_owned(),
            resource_id: None,
            user_id: Some(user_id),
            organization_id,
            details: None,
            success: false,
            error_message: Some("insufficient permissions".to_owned()),
            context: RequestContext::default(),
        }
    }

    #[tokio::test]
    async fn record_appends_and_returns_the_row() {
        let repository = Arc::new(FakeAuditLogRepository::default());
        let users = Arc::new(FakeUserRepository::default());
        let service = AuditService::new(repository.clone(), users);
        let organization_id = OrganizationId::new();

        let result = service
            .record(denied_input(organization_id, UserId::new()))
            .await;
        assert!(result.is_ok());
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn query_pages_newest_first() {
        let repository = Arc::new(FakeAuditLogRepository::default());
        let users = Arc::new(FakeUserRepository::default());
        let service = AuditService::new(repository.clone(), users);
        let organization_id = OrganizationId::new();

        for _ in 0..3 {
            let appended = service
                .record(denied_input(organization_id, UserId::new()))
                .await;
            assert!(appended.is_ok());
        }

        let page = service
            .query(organization_id, &AuditQuery::default(), 1, 2)
            .await;
        let Ok((records, total)) = page else {
            return assert!(page.is_ok());
        };
        assert_eq!(records.len(), 2);
        assert_eq!(total, 3);
        assert!(records[0].created_at >= records[1].created_at);
    }

    #[tokio::test]
    async fn export_falls_back_to_unknown_actor() {
        let repository = Arc::new(FakeAuditLogRepository::default());
        let users = Arc::new(FakeUserRepository::default());
        let organization_id = OrganizationId::new();
        let known = sample_user(organization_id, "ada@example.com");
        users.put(known.clone()).await;

        let service = AuditService::new(repository, users);

        let known_row = service.record(denied_input(organization_id, known.id())).await;
        assert!(known_row.is_ok());
        let unknown_row = service
            .record(denied_input(organization_id, UserId::new()))
            .await;
        assert!(unknown_row.is_ok());

        let export = service
            .export_csv(organization_id, &AuditQuery::default())
            .await;
        let Ok(bytes) = export else {
            return assert!(export.is_ok());
        };
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains(&known.full_name()));
        assert!(text.contains("Unknown"));
    }
}
