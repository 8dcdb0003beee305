use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskhive_application::{AuditQuery, RequestContext};
use taskhive_core::{OrganizationId, Principal, UserId};
use taskhive_domain::{AuditAction, PermissionAction, PermissionResource};
use uuid::Uuid;

use crate::dto::{AuditPageResponse, AuditRecordResponse};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditListQuery {
    pub organization_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Resolves the target organization and runs the audit-read gate shared by
/// the list and export handlers.
async fn authorize_audit_read(
    state: &AppState,
    principal: &Principal,
    requested: Option<Uuid>,
    context: &RequestContext,
) -> ApiResult<OrganizationId> {
    let organization_id = requested
        .map(OrganizationId::from_uuid)
        .unwrap_or_else(|| principal.organization_id());

    state
        .authorization
        .require_organization_access(principal, organization_id, context)
        .await?;
    state
        .authorization
        .require_permission(
            principal,
            PermissionAction::Read,
            PermissionResource::AuditLog,
            Some(principal.organization_id()),
            context,
        )
        .await?;

    Ok(organization_id)
}

fn filters_from(query: &AuditListQuery) -> ApiResult<AuditQuery> {
    let action = query
        .action
        .as_deref()
        .map(AuditAction::from_str)
        .transpose()?;

    Ok(AuditQuery {
        actor_id: query.actor_id.map(UserId::from_uuid),
        resource: query.resource.clone(),
        action,
        from: query.from,
        to: query.to,
    })
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Query(query): Query<AuditListQuery>,
) -> ApiResult<Json<AuditPageResponse>> {
    let organization_id =
        authorize_audit_read(&state, &principal, query.organization_id, &context).await?;
    let filters = filters_from(&query)?;
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(50).clamp(1, 200);

    let (records, total) = state
        .audit
        .query(organization_id, &filters, page, page_size)
        .await?;

    Ok(Json(AuditPageResponse {
        records: records
            .into_iter()
            .map(AuditRecordResponse::from)
            .collect(),
        total,
        page,
        page_size,
    }))
}

pub async fn export_audit_log_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Query(query): Query<AuditListQuery>,
) -> ApiResult<Response> {
    let organization_id =
        authorize_audit_read(&state, &principal, query.organization_id, &context).await?;
    let filters = filters_from(&query)?;

    let csv = state.audit.export_csv(organization_id, &filters).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"audit-log.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
