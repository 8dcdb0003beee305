use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use taskhive_application::RequestContext;
use taskhive_core::{OrganizationId, Principal, UserId};
use uuid::Uuid;

use crate::dto::{AssignRoleRequest, RoleAssignmentResponse, UserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Returns the organization identifiers the caller's listing queries are
/// scoped to.
pub async fn my_scope_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<Uuid>>> {
    let scope = state
        .scope
        .accessible_organizations(principal.subject_id())
        .await?
        .into_iter()
        .map(|organization_id| organization_id.as_uuid())
        .collect();

    Ok(Json(scope))
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .users
        .list(&principal, &context)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .users
        .get(&principal, UserId::from_uuid(user_id), &context)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    let assignment = state
        .users
        .assign_role(
            &principal,
            UserId::from_uuid(user_id),
            request.role.as_str(),
            request.organization_id.map(OrganizationId::from_uuid),
            &context,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::from(assignment)),
    ))
}

pub async fn revoke_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path((user_id, role)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    state
        .users
        .revoke_role(
            &principal,
            UserId::from_uuid(user_id),
            role.as_str(),
            None,
            &context,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn deactivate_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(context): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .users
        .deactivate(&principal, UserId::from_uuid(user_id), &context)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
